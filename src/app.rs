//! Application shell and eframe integration.
//!
//! Owns the simulation state, the GL renderer and the two panels, and wires
//! keyboard shortcuts and repaint scheduling into the eframe update loop.

use std::sync::Arc;

use eframe::{egui, glow};
use egui::mutex::Mutex;

use solar_viz::config::VizConfig;
use solar_viz::error::{Error, SceneInitError};
use solar_viz::sim::{self, SimulationState};

use crate::renderer::SolarRenderer;
use crate::settings::SettingsPanel;
use crate::viewer::Viewer;

struct Running {
    sim: SimulationState,
    viewer: Viewer,
    settings: SettingsPanel,
    renderer: Arc<Mutex<SolarRenderer>>,
}

enum AppState {
    Running(Box<Running>),
    Failed(String),
}

pub(crate) struct App {
    state: AppState,
    animating: bool,
}

impl App {
    pub(crate) fn new(cc: &eframe::CreationContext<'_>, config: &VizConfig) -> Self {
        let state = match Self::start(cc, config) {
            Ok(running) => AppState::Running(Box::new(running)),
            Err(err) => {
                tracing::error!(%err, "startup failed");
                AppState::Failed(err.to_string())
            }
        };
        Self { state, animating: true }
    }

    fn start(cc: &eframe::CreationContext<'_>, config: &VizConfig) -> Result<Running, Error> {
        let gl = cc.gl.as_ref().ok_or(SceneInitError::Gpu {
            what: "context",
            reason: "glow backend required".to_string(),
        })?;
        let sim = sim::startup(config)?;

        let mut renderer = SolarRenderer::new(gl)?;
        if let Err(err) = renderer.upload_atlas(gl, sim.scene.atlas()) {
            renderer.destroy(gl);
            return Err(err.into());
        }
        let renderer = Arc::new(Mutex::new(renderer));
        Ok(Running {
            sim,
            viewer: Viewer::new(Arc::clone(&renderer)),
            settings: SettingsPanel::default(),
            renderer,
        })
    }
}

fn handle_shortcuts(ctx: &egui::Context, sim: &mut SimulationState) {
    if ctx.wants_keyboard_input() {
        return;
    }
    ctx.input(|i| {
        if i.key_pressed(egui::Key::Space) {
            sim.toggle_pause();
        }
        if i.key_pressed(egui::Key::Escape) {
            sim.deselect();
        }
        if i.key_pressed(egui::Key::Plus) || i.key_pressed(egui::Key::Equals) {
            sim.set_speed(sim.interaction.speed.faster());
        }
        if i.key_pressed(egui::Key::Minus) {
            sim.set_speed(sim.interaction.speed.slower());
        }
        if i.key_pressed(egui::Key::O) {
            sim.toggle_orbits();
        }
    });
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut vis = egui::Visuals::dark();
        vis.panel_fill = egui::Color32::from_gray(10);
        vis.extreme_bg_color = egui::Color32::BLACK;
        ctx.set_visuals(vis);

        match &mut self.state {
            AppState::Failed(reason) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(ui.available_height() * 0.4);
                        ui.heading("The solar system could not be started");
                        ui.label(reason.as_str());
                    });
                });
            }
            AppState::Running(running) => {
                handle_shortcuts(ctx, &mut running.sim);
                egui::SidePanel::right("settings").default_width(280.0).show(ctx, |ui| {
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        running.settings.show(ui, &mut running.sim);
                    });
                });
                egui::CentralPanel::default()
                    .frame(egui::Frame::NONE)
                    .show(ctx, |ui| running.viewer.show(ui, &mut running.sim));
                if self.animating {
                    ctx.request_repaint();
                }
            }
        }
    }

    fn on_exit(&mut self, gl: Option<&glow::Context>) {
        self.animating = false;
        if let AppState::Running(running) = &mut self.state {
            running.viewer.detach_input();
            if let Some(gl) = gl {
                running.renderer.lock().destroy(gl);
            }
        }
    }
}
