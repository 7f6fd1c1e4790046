use serde::{Deserialize, Serialize};

/// A state too small to survive the low-resolution country dataset.
/// Rendered as a marker dot instead of a polygon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MicroState {
    pub name: String,
    /// [longitude, latitude] in degrees.
    pub coordinates: [f64; 2],
}

impl MicroState {
    pub fn new(name: impl Into<String>, lon: f64, lat: f64) -> Self {
        Self {
            name: name.into(),
            coordinates: [lon, lat],
        }
    }
}

/// Default marker list bundled with the demo app.
pub fn european_micro_states() -> Vec<MicroState> {
    vec![
        MicroState::new("Andorra", 1.52, 42.51),
        MicroState::new("Liechtenstein", 9.55, 47.16),
        MicroState::new("Malta", 14.38, 35.94),
        MicroState::new("Monaco", 7.42, 43.73),
        MicroState::new("San Marino", 12.46, 43.94),
        MicroState::new("Vatican City", 12.45, 41.90),
    ]
}
