use std::f64::consts::{FRAC_PI_2, PI};

use egui::{pos2, Pos2, Vec2};

/// Azimuthal equidistant projection, north-pole-centered.
///
/// The reference longitude is the central meridian and runs from the
/// center of the canvas toward its bottom edge. The whole sphere is
/// visible: the south pole maps to the rim of a circle of radius
/// `scale * PI` around the translate point.
#[derive(Debug, Clone, PartialEq)]
pub struct AzimuthalProjection {
    reference_longitude: f64,
    scale: f64,
    center: Pos2,
}

impl AzimuthalProjection {
    /// Fits the full-globe clip circle into the given container size and
    /// centers the translate point in it.
    pub fn fit_to_size(reference_longitude: f64, size: Vec2) -> Self {
        let scale = 0.5 * f64::from(size.x.min(size.y)) / PI;
        Self {
            reference_longitude,
            scale,
            center: pos2(size.x / 2.0, size.y / 2.0),
        }
    }

    /// Projects a lon/lat pair (degrees) to container-local coordinates.
    pub fn project(&self, lon: f64, lat: f64) -> Pos2 {
        let rho = self.scale * (FRAC_PI_2 - lat.to_radians());
        let theta = (lon - self.reference_longitude).to_radians();
        pos2(
            self.center.x + (rho * theta.sin()) as f32,
            self.center.y + (rho * theta.cos()) as f32,
        )
    }

    /// Linear scale in pixels per radian of angular distance from the pole.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn center(&self) -> Pos2 {
        self.center
    }

    pub fn reference_longitude(&self) -> f64 {
        self.reference_longitude
    }

    /// Radius of the full-globe clip circle.
    pub fn clip_radius(&self) -> f32 {
        (self.scale * PI) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use egui::vec2;

    #[test]
    fn north_pole_projects_to_translate_point() {
        let proj = AzimuthalProjection::fit_to_size(15.0, vec2(800.0, 600.0));
        let pole = proj.project(137.0, 90.0);
        assert_relative_eq!(pole.x, 400.0, epsilon = 1e-4);
        assert_relative_eq!(pole.y, 300.0, epsilon = 1e-4);
    }

    #[test]
    fn clip_radius_is_scale_times_pi() {
        let proj = AzimuthalProjection::fit_to_size(0.0, vec2(1000.0, 700.0));
        assert_relative_eq!(f64::from(proj.clip_radius()), proj.scale() * PI, epsilon = 1e-4);
        // The clip circle inscribes the short container side.
        assert_relative_eq!(f64::from(proj.clip_radius()), 350.0, epsilon = 1e-4);
    }

    #[test]
    fn reference_meridian_runs_straight_down() {
        let proj = AzimuthalProjection::fit_to_size(30.0, vec2(600.0, 600.0));
        for lat in [60.0, 30.0, 0.0, -45.0] {
            let p = proj.project(30.0, lat);
            assert_relative_eq!(p.x, 300.0, epsilon = 1e-3);
            assert!(p.y > 300.0);
        }
    }

    #[test]
    fn south_pole_lands_on_the_rim() {
        let proj = AzimuthalProjection::fit_to_size(0.0, vec2(500.0, 500.0));
        let south = proj.project(42.0, -90.0);
        let rim = south.distance(proj.center());
        assert_relative_eq!(rim, proj.clip_radius(), epsilon = 1e-3);
    }

    #[test]
    fn equator_sits_halfway_to_the_rim() {
        let proj = AzimuthalProjection::fit_to_size(10.0, vec2(400.0, 400.0));
        let p = proj.project(100.0, 0.0);
        assert_relative_eq!(
            f64::from(p.distance(proj.center())),
            proj.scale() * FRAC_PI_2,
            epsilon = 1e-3
        );
    }
}
