//! Side panel: playback controls, telemetry, body list and the info panel.

use std::collections::HashMap;

use eframe::egui;

use solar_viz::celestial::CelestialBody;
use solar_viz::math::body_orientation;
use solar_viz::orbit::SpeedMultiplier;
use solar_viz::sim::SimulationState;

const THUMBNAIL_PX: usize = 96;

#[derive(Default)]
pub struct SettingsPanel {
    thumbnails: HashMap<CelestialBody, egui::TextureHandle>,
}

impl SettingsPanel {
    pub fn show(&mut self, ui: &mut egui::Ui, sim: &mut SimulationState) {
        ui.label(egui::RichText::new("Playback").strong());
        ui.horizontal(|ui| {
            let label = if sim.interaction.paused { "▶ Resume" } else { "⏸ Pause" };
            if ui.button(label).clicked() {
                sim.toggle_pause();
            }
        });
        ui.horizontal_wrapped(|ui| {
            ui.label("Speed:");
            for speed in SpeedMultiplier::ALL {
                if ui.selectable_label(sim.interaction.speed == speed, speed.label()).clicked() {
                    sim.set_speed(speed);
                }
            }
        });
        let mut show_orbits = sim.interaction.show_orbits;
        if ui.checkbox(&mut show_orbits, "Show orbits").changed() {
            sim.toggle_orbits();
        }

        ui.separator();
        ui.label(egui::RichText::new("Telemetry").strong());
        let telemetry = sim.telemetry();
        egui::Grid::new("telemetry").num_columns(2).show(ui, |ui| {
            ui.label("Distance");
            ui.label(telemetry.distance_text());
            ui.end_row();
            ui.label("Speed");
            ui.label(telemetry.speed_text());
            ui.end_row();
            ui.label("Hovering");
            ui.label(sim.interaction.hovered.map_or("-", |b| b.label()));
            ui.end_row();
        });

        ui.separator();
        ui.label(egui::RichText::new("Bodies").strong());
        let selected = sim.selected_body();
        ui.horizontal_wrapped(|ui| {
            for body in CelestialBody::ALL {
                if sim.scene.body_node(body).is_none() {
                    continue;
                }
                let [r, g, b] = body.display_color();
                let text = egui::RichText::new(body.label()).color(egui::Color32::from_rgb(r, g, b));
                if ui.selectable_label(selected == Some(body), text).clicked() {
                    if selected == Some(body) {
                        sim.deselect();
                    } else {
                        sim.select(body);
                    }
                }
            }
        });

        if sim.interaction.selected.is_some() {
            ui.separator();
            self.info_panel(ui, sim);
        }

        ui.with_layout(egui::Layout::bottom_up(egui::Align::LEFT), |ui| {
            let build = env!("SOLAR_VIZ_BUILD");
            let version = env!("CARGO_PKG_VERSION");
            let footer = if build.is_empty() { format!("v{version}") } else { format!("v{version} ({build})") };
            ui.label(egui::RichText::new(footer).small().weak());
        });
    }

    fn info_panel(&mut self, ui: &mut egui::Ui, sim: &mut SimulationState) {
        let Some(panel) = sim.interaction.selected.as_ref() else {
            return;
        };
        let descriptor = panel.descriptor();
        let body = descriptor.body;

        ui.horizontal(|ui| {
            if let Some(thumb) = self.thumbnail(ui.ctx(), sim, body) {
                ui.image((thumb.id(), egui::vec2(THUMBNAIL_PX as f32, THUMBNAIL_PX as f32)));
            }
            ui.vertical(|ui| {
                ui.heading(descriptor.name);
                ui.label(egui::RichText::new(descriptor.info.description).italics());
            });
        });

        egui::Grid::new("body_stats").num_columns(2).striped(true).show(ui, |ui| {
            for (label, value) in panel.stats() {
                ui.label(label);
                ui.label(value);
                ui.end_row();
            }
        });

        let mut next = false;
        let mut close = false;
        if let Some(fact) = panel.current_fact() {
            ui.add_space(4.0);
            ui.label(egui::RichText::new("Did you know?").strong());
            ui.label(fact);
        }
        ui.horizontal(|ui| {
            let has_more = panel.descriptor().info.facts.len() > 1;
            next = ui.add_enabled(has_more, egui::Button::new("Next fact")).clicked();
            close = ui.button("Close").clicked();
        });

        if next {
            sim.next_fact();
        }
        if close {
            sim.deselect();
        }
    }

    fn thumbnail(&mut self, ctx: &egui::Context, sim: &SimulationState, body: CelestialBody) -> Option<egui::TextureHandle> {
        if let Some(handle) = self.thumbnails.get(&body) {
            return Some(handle.clone());
        }
        let descriptor = sim.scene.descriptors().iter().find(|d| d.body == body)?;
        let raster = match sim.scene.atlas().get(descriptor.texture) {
            Ok(raster) => raster,
            Err(err) => {
                tracing::warn!(%err, ?body, "no thumbnail");
                return None;
            }
        };
        // Sampling the full-size map at thumbnail scale aliases badly.
        let factor = (raster.width / (THUMBNAIL_PX as u32 * 4)).max(1);
        let image = raster.downscale(factor).render_sphere(THUMBNAIL_PX, &body_orientation(descriptor.tilt_deg, 0.0));
        let handle = ctx.load_texture(format!("thumb_{}", body.label()), image, egui::TextureOptions::LINEAR);
        self.thumbnails.insert(body, handle.clone());
        Some(handle)
    }
}
