//! Everything the render loop threads from frame to frame.
//!
//! [`SimulationState`] is passed explicitly into [`SimulationState::apply`] and
//! [`SimulationState::tick`]; nothing is captured in closures, so the whole
//! loop can be driven headless.

use std::sync::Arc;
use std::time::Instant;

use nalgebra::Vector2;

use crate::camera::OrbitCamera;
use crate::celestial::{self, CelestialBody};
use crate::config::VizConfig;
use crate::error::Error;
use crate::generators::TextureAtlas;
use crate::input::{Gesture, Viewport};
use crate::orbit::{BodyInstance, Kinematics, SpeedMultiplier};
use crate::overlay::{project_label, InfoPanel, Telemetry};
use crate::scene::Scene;

#[derive(Clone, Debug, PartialEq)]
pub struct InteractionState {
    pub hovered: Option<CelestialBody>,
    pub selected: Option<InfoPanel>,
    pub speed: SpeedMultiplier,
    pub paused: bool,
    pub show_orbits: bool,
}

#[derive(Clone, Debug)]
pub struct SimulationState {
    pub scene: Scene,
    pub instances: Vec<BodyInstance>,
    pub kinematics: Kinematics,
    pub camera: OrbitCamera,
    pub interaction: InteractionState,
}

/// Two-phase startup: generate every texture, then assemble the scene from
/// them. Runs before the first frame.
pub fn startup(config: &VizConfig) -> Result<SimulationState, Error> {
    config.validate()?;
    let started = Instant::now();
    let atlas = TextureAtlas::generate(config.texture_spec()?);
    let scene = Scene::build(&celestial::descriptors(), atlas, &config.scene)?;
    let state = SimulationState::new(scene, config)?;
    tracing::info!(elapsed_ms = started.elapsed().as_millis() as u64, "startup complete");
    Ok(state)
}

impl SimulationState {
    pub fn new(scene: Scene, config: &VizConfig) -> Result<Self, Error> {
        let instances = scene.spawn_instances();
        Ok(Self {
            instances,
            kinematics: Kinematics::new(config.simulation.dt_scale, config.simulation.cloud_speed),
            camera: OrbitCamera::new(config.camera.clone()),
            interaction: InteractionState {
                hovered: None,
                selected: None,
                speed: config.speed()?,
                paused: config.simulation.paused,
                show_orbits: config.scene.show_orbits,
            },
            scene,
        })
    }

    pub fn apply(&mut self, gesture: Gesture) {
        match gesture {
            Gesture::Rotate { dx, dy } => self.camera.rotate(dx, dy),
            Gesture::Zoom { factor } => self.camera.zoom(factor),
            Gesture::Hover { ndc } => self.interaction.hovered = self.pick(ndc),
            Gesture::Select { ndc } => match self.pick(ndc) {
                Some(body) => self.select(body),
                None => self.deselect(),
            },
            Gesture::Release => {}
        }
    }

    /// One frame: advance the bodies (unless paused), then move the camera
    /// relative to wherever its target body now is.
    pub fn tick(&mut self) {
        self.kinematics.step(&mut self.instances, self.interaction.speed, self.interaction.paused);
        let focus = self
            .camera
            .tracked()
            .and_then(|body| self.scene.body_position(body, &self.instances));
        self.camera.update(focus);
    }

    pub fn pick(&self, ndc: Vector2<f64>) -> Option<CelestialBody> {
        let ray = self.camera.screen_ray(ndc)?;
        self.scene.pick(&ray, &self.instances).map(|hit| hit.body)
    }

    pub fn select(&mut self, body: CelestialBody) {
        let Some(id) = self.scene.body_node(body) else {
            return;
        };
        let node = &self.scene.nodes()[id];
        let descriptor = Arc::clone(&self.instances[node.instance].descriptor);
        let position = self.scene.world_position(id, &self.instances);
        self.camera.fly_to(body, position, node.local.radius);
        tracing::debug!(?body, "selected");
        self.interaction.selected = Some(InfoPanel::new(descriptor));
    }

    pub fn deselect(&mut self) {
        self.interaction.selected = None;
        self.camera.release();
    }

    pub fn selected_body(&self) -> Option<CelestialBody> {
        self.interaction.selected.as_ref().map(|p| p.descriptor().body)
    }

    pub fn toggle_pause(&mut self) {
        self.interaction.paused = !self.interaction.paused;
    }

    pub fn set_speed(&mut self, speed: SpeedMultiplier) {
        self.interaction.speed = speed;
    }

    pub fn toggle_orbits(&mut self) {
        self.interaction.show_orbits = !self.interaction.show_orbits;
    }

    pub fn next_fact(&mut self) {
        if let Some(panel) = self.interaction.selected.as_mut() {
            panel.cycle_fact();
        }
    }

    /// Screen position of the hovered body's label, recomputed per frame.
    pub fn hovered_label(&self, viewport: &Viewport) -> Option<(CelestialBody, Vector2<f64>)> {
        let body = self.interaction.hovered?;
        let world = self.scene.body_position(body, &self.instances)?;
        project_label(&self.camera, &world, viewport).map(|px| (body, px))
    }

    pub fn telemetry(&self) -> Telemetry {
        Telemetry {
            distance: self.camera.telemetry_distance(),
            speed: self.interaction.speed,
            paused: self.interaction.paused,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::TextureKey;
    use crate::texture::{Raster, TextureSpec};

    fn state() -> SimulationState {
        let config = VizConfig::default();
        let atlas = TextureAtlas::from_rasters(
            TextureSpec::default(),
            TextureKey::ALL.map(|k| (k, Raster::new(1, 1, [0, 0, 0, 255]))),
        );
        let scene = Scene::build(&celestial::descriptors(), atlas, &config.scene).unwrap();
        SimulationState::new(scene, &config).unwrap()
    }

    fn ndc_of(state: &SimulationState, body: CelestialBody) -> Vector2<f64> {
        let world = state.scene.body_position(body, &state.instances).unwrap();
        state.camera.project(&world).unwrap().1
    }

    #[test]
    fn clicking_a_body_selects_and_flies() {
        let mut s = state();
        let ndc = ndc_of(&s, CelestialBody::Sun);
        s.apply(Gesture::Select { ndc });
        assert_eq!(s.selected_body(), Some(CelestialBody::Sun));
        assert!(s.camera.is_flying());

        s.apply(Gesture::Select { ndc: Vector2::new(0.99, 0.99) });
        assert_eq!(s.selected_body(), None);
        assert_eq!(s.camera.tracked(), None);
    }

    #[test]
    fn hover_tracks_the_body_under_the_pointer() {
        let mut s = state();
        let ndc = ndc_of(&s, CelestialBody::Sun);
        s.apply(Gesture::Hover { ndc });
        assert_eq!(s.interaction.hovered, Some(CelestialBody::Sun));
        let vp = Viewport::new(0.0, 0.0, 1000.0, 1000.0);
        let (body, px) = s.hovered_label(&vp).unwrap();
        assert_eq!(body, CelestialBody::Sun);
        assert!((vp.to_ndc(px) - ndc).norm() < 1e-9);
    }

    #[test]
    fn pause_keeps_angles_but_camera_still_moves() {
        let mut s = state();
        s.select(CelestialBody::Jupiter);
        s.toggle_pause();
        let angles: Vec<_> = s.instances.iter().map(|i| i.orbit_angle).collect();
        let before = s.camera.position();
        for _ in 0..10 {
            s.tick();
        }
        assert_eq!(angles, s.instances.iter().map(|i| i.orbit_angle).collect::<Vec<_>>());
        assert_ne!(before, s.camera.position());
    }

    #[test]
    fn next_fact_cycles_selected_panel() {
        let mut s = state();
        s.next_fact();
        s.select(CelestialBody::Earth);
        s.next_fact();
        assert_eq!(s.interaction.selected.as_ref().unwrap().fact_index(), 1);
    }

    #[test]
    fn telemetry_reflects_controls() {
        let mut s = state();
        s.set_speed(SpeedMultiplier::Ten);
        s.toggle_pause();
        let t = s.telemetry();
        assert_eq!(t.speed, SpeedMultiplier::Ten);
        assert!(t.paused);
        assert!((t.distance - s.camera.position().norm()).abs() < 1e-12);
    }
}
