use egui::{Color32, Pos2, Stroke, Vec2};
use thiserror::Error;

use crate::geo::atlas::WorldAtlas;
use crate::geo::microstates::MicroState;
use crate::geo::projection::AzimuthalProjection;
use crate::geo::roster::AllianceRoster;
use crate::map::config::MapConfig;

#[derive(Error, Debug)]
pub enum SceneError {
    #[error("container has zero measured size ({0}x{1})")]
    EmptyContainer(f32, f32),
}

/// One country, fully resolved for painting: projected outline rings for
/// stroking and hit-testing, a flat triangle list (three points each) for
/// filling, and the fill and stroke derived from the alliance roster and
/// home country.
#[derive(Debug, Clone)]
pub struct CountryShape {
    pub name: String,
    pub rings: Vec<Vec<Pos2>>,
    pub triangles: Vec<Pos2>,
    pub fill: Color32,
    pub stroke: Stroke,
}

#[derive(Debug, Clone)]
pub struct MarkerDot {
    pub name: String,
    pub pos: Pos2,
    pub fill: Color32,
}

/// Everything the renderer holds between frames. Owned by the panel,
/// created whole at build time, dropped whole at teardown; rendering
/// functions borrow it instead of reaching for ambient state.
#[derive(Debug, Clone)]
pub struct MapScene {
    pub projection: AzimuthalProjection,
    pub countries: Vec<CountryShape>,
    pub markers: Vec<MarkerDot>,
    pub disc_radius: f32,
    pub disc_fill: Color32,
    pub marker_radius: f32,
    pub size: Vec2,
}

impl MapScene {
    /// Builds the full scene for the given container size. Countries and
    /// markers are always derived from scratch; nothing is patched in
    /// place on later rebuilds.
    pub fn build(
        atlas: &WorldAtlas,
        micro_states: &[MicroState],
        roster: &AllianceRoster,
        config: &MapConfig,
        size: Vec2,
    ) -> Result<Self, SceneError> {
        if size.x <= 0.0 || size.y <= 0.0 {
            return Err(SceneError::EmptyContainer(size.x, size.y));
        }

        let projection = AzimuthalProjection::fit_to_size(config.reference_longitude, size);
        let countries = project_countries(atlas, roster, config, &projection);
        let markers = project_markers(micro_states, roster, config, &projection);
        let disc_radius = projection.clip_radius();

        Ok(Self {
            projection,
            countries,
            markers,
            disc_radius,
            disc_fill: config.ocean_fill,
            marker_radius: config.marker_radius,
            size,
        })
    }

    /// Resolves what the pointer is over, in container-local coordinates.
    /// Markers win over countries since they are painted on top.
    pub fn hovered_name(&self, pos: Pos2) -> Option<&str> {
        let hit_radius = self.marker_radius + 2.0;
        for marker in &self.markers {
            if marker.pos.distance(pos) <= hit_radius {
                return Some(&marker.name);
            }
        }
        self.countries
            .iter()
            .find(|country| {
                // Even-odd over all rings so holes count against the hit.
                let crossings = country
                    .rings
                    .iter()
                    .filter(|ring| point_in_ring(pos, ring))
                    .count();
                crossings % 2 == 1
            })
            .map(|country| country.name.as_str())
    }
}

fn project_countries(
    atlas: &WorldAtlas,
    roster: &AllianceRoster,
    config: &MapConfig,
    projection: &AzimuthalProjection,
) -> Vec<CountryShape> {
    atlas
        .features
        .iter()
        .filter(|feature| feature.name != config.excluded_region)
        .map(|feature| {
            let fill = if roster.is_allied(&feature.name) {
                config.allied_fill
            } else {
                config.base_fill
            };
            let stroke = if feature.name == config.home_country {
                Stroke::new(config.border_width, config.allied_fill)
            } else {
                Stroke::NONE
            };
            let mut rings = Vec::new();
            let mut triangles = Vec::new();
            for polygon in &feature.polygons {
                let exterior = project_ring(&polygon.exterior, projection);
                let holes: Vec<Vec<Pos2>> = polygon
                    .holes
                    .iter()
                    .map(|hole| project_ring(hole, projection))
                    .collect();
                triangles.extend(triangulate_polygon(&exterior, &holes));
                rings.push(exterior);
                rings.extend(holes);
            }
            CountryShape {
                name: feature.name.clone(),
                rings,
                triangles,
                fill,
                stroke,
            }
        })
        .collect()
}

fn project_markers(
    micro_states: &[MicroState],
    roster: &AllianceRoster,
    config: &MapConfig,
    projection: &AzimuthalProjection,
) -> Vec<MarkerDot> {
    micro_states
        .iter()
        .map(|state| {
            let fill = if roster.is_allied(&state.name) {
                config.allied_fill
            } else {
                config.base_fill
            };
            MarkerDot {
                name: state.name.clone(),
                pos: projection.project(state.coordinates[0], state.coordinates[1]),
                fill,
            }
        })
        .collect()
}

fn project_ring(ring: &[(f64, f64)], projection: &AzimuthalProjection) -> Vec<Pos2> {
    let closed = ring.len() > 1 && ring.first() == ring.last();
    let coords = if closed { &ring[..ring.len() - 1] } else { ring };
    coords
        .iter()
        .map(|&(lon, lat)| projection.project(lon, lat))
        .collect()
}

/// Ear-clips one projected polygon, holes included, into a flat triangle
/// list. Country outlines are concave, so the fill has to go through a
/// real triangulation instead of a convex fan.
fn triangulate_polygon(exterior: &[Pos2], holes: &[Vec<Pos2>]) -> Vec<Pos2> {
    if exterior.len() < 3 {
        return Vec::new();
    }

    let hole_points: usize = holes.iter().map(Vec::len).sum();
    let mut data = Vec::with_capacity((exterior.len() + hole_points) * 2);
    for p in exterior {
        data.push(f64::from(p.x));
        data.push(f64::from(p.y));
    }
    let mut hole_indices = Vec::with_capacity(holes.len());
    let mut offset = exterior.len();
    for hole in holes {
        hole_indices.push(offset);
        for p in hole {
            data.push(f64::from(p.x));
            data.push(f64::from(p.y));
        }
        offset += hole.len();
    }

    let vertices: Vec<Pos2> = exterior.iter().chain(holes.iter().flatten()).copied().collect();
    match earcutr::earcut(&data, &hole_indices, 2) {
        Ok(indices) => indices.into_iter().map(|i| vertices[i]).collect(),
        Err(err) => {
            log::warn!("polygon triangulation failed, outline renders unfilled: {err:?}");
            Vec::new()
        }
    }
}

fn point_in_ring(p: Pos2, ring: &[Pos2]) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let t = (p.y - a.y) / (b.y - a.y);
            if p.x < a.x + t * (b.x - a.x) {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}
