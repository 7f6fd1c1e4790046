use std::time::Duration;

use egui::{vec2, Color32, Vec2};
use serde::{Deserialize, Serialize};

/// Build attempts while the container still measures zero.
pub const MAX_BUILD_ATTEMPTS: u32 = 10;
/// Delay between those attempts.
pub const BUILD_RETRY_DELAY: Duration = Duration::from_millis(200);
/// Quiet period before a resize burst triggers one rebuild.
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(150);

/// Static render parameters of the alliance map. Names must match the
/// display names resolved from the atlas.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Central meridian of the pole-centered projection, degrees.
    pub reference_longitude: f64,
    /// The one country drawn with a visible border.
    pub home_country: String,
    /// Region filtered out of the feature set before rendering.
    pub excluded_region: String,
    pub ocean_fill: Color32,
    pub base_fill: Color32,
    pub allied_fill: Color32,
    pub border_width: f32,
    pub marker_radius: f32,
    /// Tooltip offset from the pointer, so it never occludes the cursor.
    pub tooltip_offset: Vec2,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            reference_longitude: 15.0,
            home_country: "Norway".to_owned(),
            excluded_region: "Antarctica".to_owned(),
            ocean_fill: Color32::from_rgb(21, 34, 48),
            base_fill: Color32::from_rgb(88, 97, 108),
            allied_fill: Color32::from_rgb(226, 166, 74),
            border_width: 1.0,
            marker_radius: 3.0,
            tooltip_offset: vec2(14.0, 14.0),
        }
    }
}
