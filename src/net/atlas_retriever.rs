use geojson::GeoJson;

use crate::geo::atlas::{AtlasError, WorldAtlas};

/// Fixed relative path of the country dataset under the base URL.
const ATLAS_PATH: &str = "countries.geo.json";

#[derive(Debug, Clone)]
pub struct AtlasRetriever {
    client: reqwest::Client,
    base_url: String,
}

impl AtlasRetriever {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Asynchronously fetches and parses the world atlas. One shot, no
    /// retry; the caller decides what a failure means.
    pub async fn fetch_atlas(&self) -> Result<WorldAtlas, AtlasError> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), ATLAS_PATH);
        log::info!("fetching world atlas from {url}");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(AtlasError::Status(response.status()));
        }

        let body = response.text().await?;
        let raw: GeoJson = body.parse()?;
        let atlas = WorldAtlas::from_geojson(raw)?;
        log::info!("world atlas loaded: {} features", atlas.feature_count());
        Ok(atlas)
    }
}
