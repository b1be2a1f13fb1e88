//! Screen-space label projection and the info panel snapshot.

use std::sync::Arc;

use nalgebra::{Vector2, Vector3};

use crate::camera::OrbitCamera;
use crate::celestial::BodyDescriptor;
use crate::input::Viewport;
use crate::orbit::SpeedMultiplier;

/// Pixel position of a world point, or `None` when it is behind the camera.
pub fn project_label(camera: &OrbitCamera, world: &Vector3<f64>, viewport: &Viewport) -> Option<Vector2<f64>> {
    camera.project(world).map(|(_, ndc)| viewport.to_pixels(ndc))
}

/// What the info panel shows for the selected body. Holds its own copy of the
/// descriptor, so it stays valid whatever happens to the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct InfoPanel {
    descriptor: Arc<BodyDescriptor>,
    fact: usize,
}

impl InfoPanel {
    pub fn new(descriptor: Arc<BodyDescriptor>) -> Self {
        Self { descriptor, fact: 0 }
    }

    pub fn descriptor(&self) -> &BodyDescriptor {
        &self.descriptor
    }

    pub fn fact_index(&self) -> usize {
        self.fact
    }

    pub fn current_fact(&self) -> Option<&'static str> {
        self.descriptor.info.facts.get(self.fact).copied()
    }

    pub fn cycle_fact(&mut self) {
        let len = self.descriptor.info.facts.len();
        if len > 0 {
            self.fact = (self.fact + 1) % len;
        }
    }

    /// Label/value rows for the stats table.
    pub fn stats(&self) -> [(&'static str, String); 6] {
        let info = &self.descriptor.info;
        [
            ("Diameter", info.diameter.to_string()),
            ("Mass", info.mass.to_string()),
            ("Temperature", info.temperature.to_string()),
            ("Day length", info.day_length.to_string()),
            ("Year length", info.year_length.to_string()),
            ("Moons", info.moons.to_string()),
        ]
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Telemetry {
    pub distance: f64,
    pub speed: SpeedMultiplier,
    pub paused: bool,
}

impl Telemetry {
    pub fn distance_text(&self) -> String {
        format!("{:.1} units", self.distance)
    }

    pub fn speed_text(&self) -> String {
        if self.paused {
            format!("Paused ({})", self.speed.label())
        } else {
            self.speed.label().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::celestial::{descriptor, CelestialBody};

    #[test]
    fn facts_cycle_and_wrap() {
        let mut panel = InfoPanel::new(Arc::new(descriptor(CelestialBody::Mars)));
        let len = panel.descriptor().info.facts.len();
        assert!(len > 1);
        let first = panel.current_fact();
        for _ in 0..len {
            panel.cycle_fact();
        }
        assert_eq!(panel.fact_index(), 0);
        assert_eq!(panel.current_fact(), first);
    }

    #[test]
    fn empty_facts_do_not_cycle() {
        let mut d = descriptor(CelestialBody::Venus);
        d.info.facts = &[];
        let mut panel = InfoPanel::new(Arc::new(d));
        panel.cycle_fact();
        assert_eq!(panel.fact_index(), 0);
        assert_eq!(panel.current_fact(), None);
    }

    #[test]
    fn label_behind_camera_is_hidden() {
        let cam = OrbitCamera::default();
        let vp = Viewport::new(0.0, 0.0, 1280.0, 720.0);
        let centre = project_label(&cam, &cam.look_at(), &vp).unwrap();
        assert!((centre - Vector2::new(640.0, 360.0)).norm() < 1e-6);
        let behind = cam.position() * 2.0 - cam.look_at();
        assert_eq!(project_label(&cam, &behind, &vp), None);
    }

    #[test]
    fn telemetry_mentions_pause() {
        let t = Telemetry { distance: 12.345, speed: SpeedMultiplier::Double, paused: true };
        assert_eq!(t.distance_text(), "12.3 units");
        assert_eq!(t.speed_text(), "Paused (2×)");
    }
}
