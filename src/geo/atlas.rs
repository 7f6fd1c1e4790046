use geo::{Geometry, MultiPolygon};
use geojson::{GeoJson, JsonObject};
use thiserror::Error;

/// Property keys that may carry a country's display name, in priority
/// order. The first non-empty value wins.
const NAME_KEYS: [&str; 3] = ["NAME", "ADMIN", "name"];

#[derive(Error, Debug)]
pub enum AtlasError {
    #[error("atlas request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("atlas request returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("atlas document is not valid GeoJSON: {0}")]
    Parse(#[from] geojson::Error),
    #[error("atlas document is not a feature collection")]
    NotAFeatureCollection,
}

/// One part of a (multi)polygon: the outer boundary plus any holes cut
/// out of it, in lon/lat degrees. Holes stay attached to their exterior
/// so fills can honor them.
#[derive(Debug, Clone)]
pub struct PolygonRings {
    pub exterior: Vec<(f64, f64)>,
    pub holes: Vec<Vec<(f64, f64)>>,
}

/// One country from the source dataset: resolved display name plus its
/// polygon parts.
#[derive(Debug, Clone)]
pub struct CountryFeature {
    pub name: String,
    pub polygons: Vec<PolygonRings>,
}

#[derive(Debug, Clone, Default)]
pub struct WorldAtlas {
    pub features: Vec<CountryFeature>,
}

impl WorldAtlas {
    /// Flattens a GeoJSON feature collection into named ring sets.
    /// Non-polygonal geometries are skipped; features without any of the
    /// known name keys keep an empty name and still render.
    pub fn from_geojson(raw: GeoJson) -> Result<Self, AtlasError> {
        let GeoJson::FeatureCollection(fc) = raw else {
            return Err(AtlasError::NotAFeatureCollection);
        };

        let mut features = Vec::with_capacity(fc.features.len());
        for feature in fc.features {
            let name = resolve_display_name(feature.properties.as_ref())
                .unwrap_or_default()
                .to_string();

            let Some(gj) = feature.geometry else { continue };
            let geom: Geometry<f64> = gj.value.try_into()?;
            let mp: MultiPolygon<f64> = match geom {
                Geometry::Polygon(p) => p.into(),
                Geometry::MultiPolygon(m) => m,
                _ => continue,
            };

            let mut polygons = Vec::new();
            for poly in &mp.0 {
                let exterior: Vec<(f64, f64)> =
                    poly.exterior().0.iter().map(|c| (c.x, c.y)).collect();
                if exterior.len() < 3 {
                    continue;
                }
                let holes = poly
                    .interiors()
                    .iter()
                    .map(|ring| ring.0.iter().map(|c| (c.x, c.y)).collect::<Vec<_>>())
                    .filter(|coords| coords.len() >= 3)
                    .collect();
                polygons.push(PolygonRings { exterior, holes });
            }
            if !polygons.is_empty() {
                features.push(CountryFeature { name, polygons });
            }
        }

        Ok(Self { features })
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }
}

/// Picks the first non-empty display name out of the property bag.
/// Coloring and tooltips both go through this, so they can never disagree.
pub fn resolve_display_name(props: Option<&JsonObject>) -> Option<&str> {
    let props = props?;
    NAME_KEYS
        .iter()
        .filter_map(|key| props.get(*key).and_then(|v| v.as_str()))
        .find(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: serde_json::Value) -> JsonObject {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn name_key_beats_admin_and_lowercase() {
        let bag = props(json!({ "NAME": "Norway", "ADMIN": "Kingdom of Norway", "name": "norway" }));
        assert_eq!(resolve_display_name(Some(&bag)), Some("Norway"));
    }

    #[test]
    fn empty_names_are_skipped_in_order() {
        let bag = props(json!({ "NAME": "", "ADMIN": "Denmark", "name": "denmark" }));
        assert_eq!(resolve_display_name(Some(&bag)), Some("Denmark"));

        let bag = props(json!({ "NAME": "", "ADMIN": "", "name": "iceland" }));
        assert_eq!(resolve_display_name(Some(&bag)), Some("iceland"));
    }

    #[test]
    fn missing_bag_or_keys_resolve_to_none() {
        assert_eq!(resolve_display_name(None), None);
        let bag = props(json!({ "ISO_A3": "SWE" }));
        assert_eq!(resolve_display_name(Some(&bag)), None);
    }

    #[test]
    fn parses_polygons_and_multipolygons() {
        let raw: GeoJson = json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": { "name": "Squareland" },
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]]]
                    }
                },
                {
                    "type": "Feature",
                    "properties": { "name": "Twin Isles" },
                    "geometry": {
                        "type": "MultiPolygon",
                        "coordinates": [
                            [[[20.0, 0.0], [25.0, 0.0], [25.0, 5.0], [20.0, 0.0]]],
                            [[[30.0, 0.0], [35.0, 0.0], [35.0, 5.0], [30.0, 0.0]]]
                        ]
                    }
                },
                {
                    "type": "Feature",
                    "properties": { "name": "Lone Peak" },
                    "geometry": { "type": "Point", "coordinates": [5.0, 5.0] }
                }
            ]
        })
        .to_string()
        .parse()
        .unwrap();

        let atlas = WorldAtlas::from_geojson(raw).unwrap();
        assert_eq!(atlas.feature_count(), 2);
        assert_eq!(atlas.features[0].name, "Squareland");
        assert_eq!(atlas.features[0].polygons.len(), 1);
        assert!(atlas.features[0].polygons[0].holes.is_empty());
        assert_eq!(atlas.features[1].polygons.len(), 2);
    }

    #[test]
    fn interior_rings_stay_attached_to_their_exterior() {
        let raw: GeoJson = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "name": "Ringland" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [
                        [[0.0, 0.0], [30.0, 0.0], [30.0, 30.0], [0.0, 30.0], [0.0, 0.0]],
                        [[10.0, 10.0], [20.0, 10.0], [20.0, 20.0], [10.0, 20.0], [10.0, 10.0]]
                    ]
                }
            }]
        })
        .to_string()
        .parse()
        .unwrap();

        let atlas = WorldAtlas::from_geojson(raw).unwrap();
        let polygon = &atlas.features[0].polygons[0];
        assert_eq!(polygon.exterior.len(), 5);
        assert_eq!(polygon.holes.len(), 1);
        assert_eq!(polygon.holes[0].len(), 5);
    }

    #[test]
    fn rejects_bare_geometry_documents() {
        let raw: GeoJson = json!({ "type": "Point", "coordinates": [0.0, 0.0] })
            .to_string()
            .parse()
            .unwrap();
        assert!(matches!(
            WorldAtlas::from_geojson(raw),
            Err(AtlasError::NotAFeatureCollection)
        ));
    }
}
