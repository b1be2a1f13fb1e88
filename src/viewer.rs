//! The 3D view: input routing, per-frame tick and painting.
//!
//! Starfield, orbit paths, the asteroid belt and labels go through the egui
//! painter; bodies are painted back to front through GL callbacks.

use std::sync::Arc;

use eframe::{egui, egui_glow};
use egui::mutex::Mutex;
use nalgebra::{Vector2, Vector3};

use solar_viz::celestial::CelestialBody;
use solar_viz::input::{GestureAdapter, RawEvent, Viewport};
use solar_viz::scene::NodeId;
use solar_viz::sim::SimulationState;

use crate::renderer::{BodyDraw, SolarRenderer};

/// Bodies smaller than this on screen are drawn as a dot.
const MIN_SPHERE_PX: f64 = 1.5;

pub struct Viewer {
    input: Option<GestureAdapter>,
    renderer: Arc<Mutex<SolarRenderer>>,
    /// Fingers that went down inside the view and have not lifted yet.
    touches: Vec<u64>,
}

fn pos2(v: Vector2<f64>) -> egui::Pos2 {
    egui::pos2(v.x as f32, v.y as f32)
}

fn vec2(p: egui::Pos2) -> Vector2<f64> {
    Vector2::new(p.x as f64, p.y as f64)
}

fn color(rgb: [u8; 3], alpha: u8) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(rgb[0], rgb[1], rgb[2], alpha)
}

impl Viewer {
    pub fn new(renderer: Arc<Mutex<SolarRenderer>>) -> Self {
        Self { input: Some(GestureAdapter::new()), renderer, touches: Vec::new() }
    }

    /// Stops listening to input; later frames only paint.
    pub fn detach_input(&mut self) {
        self.input = None;
    }

    pub fn show(&mut self, ui: &mut egui::Ui, sim: &mut SimulationState) {
        let rect = ui.available_rect_before_wrap();
        let response = ui.allocate_rect(rect, egui::Sense::click_and_drag());
        let viewport = Viewport::new(rect.min.x as f64, rect.min.y as f64, rect.width() as f64, rect.height() as f64);
        sim.camera.set_aspect(viewport.width, viewport.height);

        for event in self.collect_events(ui, rect, response.hovered()) {
            if let Some(input) = self.input.as_mut() {
                if let Some(gesture) = input.handle(event, &viewport, &sim.camera) {
                    sim.apply(gesture);
                }
            }
        }
        if !response.hovered() && self.input.as_ref().is_some_and(GestureAdapter::is_idle) {
            sim.interaction.hovered = None;
        }

        sim.tick();

        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, egui::Color32::BLACK);
        paint_stars(&painter, sim, &viewport);
        if sim.interaction.show_orbits {
            paint_orbits(&painter, sim, &viewport);
        }
        paint_belt(&painter, sim, &viewport);
        self.paint_bodies(ui, rect, sim, &viewport);
        paint_labels(&painter, sim, &viewport);

        if self.input.as_ref().is_some_and(GestureAdapter::is_dragging) {
            ui.ctx().set_cursor_icon(egui::CursorIcon::Grabbing);
        } else if response.hovered() && sim.interaction.hovered.is_some() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
        }
    }

    fn collect_events(&mut self, ui: &egui::Ui, rect: egui::Rect, hovered: bool) -> Vec<RawEvent> {
        let dragging = self.input.as_ref().is_some_and(|i| !i.is_idle());
        ui.input(|i| {
            let mut out = Vec::new();
            let has_touch = i.events.iter().any(|e| matches!(e, egui::Event::Touch { .. }));
            for event in &i.events {
                match event {
                    egui::Event::Touch { id, phase, pos, .. } => {
                        let id = id.0;
                        match phase {
                            egui::TouchPhase::Start if rect.contains(*pos) => {
                                self.touches.push(id);
                                out.push(RawEvent::TouchStart { id, pos: vec2(*pos) });
                            }
                            egui::TouchPhase::Move => out.push(RawEvent::TouchMove { id, pos: vec2(*pos) }),
                            egui::TouchPhase::End | egui::TouchPhase::Cancel => {
                                out.push(RawEvent::TouchEnd { id });
                                self.touches.retain(|t| *t != id);
                            }
                            egui::TouchPhase::Start => {}
                        }
                    }
                    // Touch screens also emit emulated mouse events; those are
                    // ignored while fingers drive the adapter.
                    _ if has_touch || !self.touches.is_empty() => {}
                    egui::Event::PointerButton { pos, button: egui::PointerButton::Primary, pressed, .. } => {
                        if *pressed && rect.contains(*pos) {
                            out.push(RawEvent::PointerDown(vec2(*pos)));
                        } else if !*pressed && dragging {
                            out.push(RawEvent::PointerUp(vec2(*pos)));
                        }
                    }
                    egui::Event::PointerMoved(pos) if rect.contains(*pos) || dragging => {
                        out.push(RawEvent::PointerMove(vec2(*pos)));
                    }
                    _ => {}
                }
            }
            if hovered && i.smooth_scroll_delta.y != 0.0 {
                out.push(RawEvent::Wheel(i.smooth_scroll_delta.y as f64));
            }
            out
        })
    }

    fn paint_bodies(&self, ui: &egui::Ui, clip: egui::Rect, sim: &SimulationState, viewport: &Viewport) {
        let camera = &sim.camera;
        let basis = camera.basis();
        let mut visible: Vec<(f64, NodeId, Vector2<f64>)> = sim
            .scene
            .body_nodes()
            .iter()
            .filter_map(|&id| {
                let world = sim.scene.world_position(id, &sim.instances);
                camera.project(&world).map(|(depth, ndc)| (depth, id, ndc))
            })
            .collect();
        visible.sort_by(|a, b| b.0.total_cmp(&a.0));

        let painter = ui.painter_at(clip);
        for (depth, id, ndc) in visible {
            let node = &sim.scene.nodes()[id];
            let descriptor = &sim.instances[node.instance].descriptor;
            let centre = pos2(viewport.to_pixels(ndc));
            let radius_px = camera.projected_radius(depth, node.local.radius) * viewport.height * 0.5;
            if radius_px < MIN_SPHERE_PX {
                painter.circle_filled(centre, MIN_SPHERE_PX as f32, color(descriptor.body.display_color(), 255));
                continue;
            }

            let layers = sim.scene.layers(id, &sim.instances);
            let extent = layers.extent();
            let half = (radius_px * extent) as f32;
            let body_rect = egui::Rect::from_center_size(centre, egui::vec2(2.0 * half, 2.0 * half));
            if !body_rect.intersects(clip) {
                continue;
            }

            let rotation = sim.scene.rotation(id, &sim.instances);
            let world = sim.scene.world_position(id, &sim.instances);
            let sun_dir = rotation.transpose() * (-world).try_normalize(1e-9).unwrap_or_else(Vector3::z);
            let draw = BodyDraw {
                texture: descriptor.texture,
                inv_rotation: rotation.transpose() * basis,
                sun_dir,
                scale: 1.0 / extent as f32,
                roughness: descriptor.roughness,
                metalness: descriptor.metalness,
                emissive: descriptor.is_emissive(),
                layers,
            };

            let renderer = Arc::clone(&self.renderer);
            let callback = egui::PaintCallback {
                rect: body_rect,
                callback: Arc::new(egui_glow::CallbackFn::new(move |_info, painter| {
                    renderer.lock().paint(painter.gl(), &draw);
                })),
            };
            painter.add(callback);
        }
    }
}

fn paint_stars(painter: &egui::Painter, sim: &SimulationState, viewport: &Viewport) {
    for star in sim.scene.stars() {
        let Some((_, ndc)) = sim.camera.project(&(sim.camera.position() + star.position)) else { continue };
        let [r, g, b] = star.class.color();
        let alpha = (star.brightness * 255.0) as u8;
        painter.circle_filled(pos2(viewport.to_pixels(ndc)), 0.4 + star.brightness, color([r, g, b], alpha));
    }
}

fn paint_orbits(painter: &egui::Painter, sim: &SimulationState, viewport: &Viewport) {
    let selected = sim.selected_body();
    for orbit in sim.scene.orbits() {
        let centre = orbit
            .center
            .map_or_else(Vector3::zeros, |id| sim.scene.world_position(id, &sim.instances));
        let alpha = if selected == Some(orbit.body) { 160 } else { 55 };
        let stroke = egui::Stroke::new(1.0, color(orbit.body.display_color(), alpha));
        let mut run: Vec<egui::Pos2> = Vec::new();
        for p in &orbit.points {
            match sim.camera.project(&(centre + p)) {
                Some((_, ndc)) => run.push(pos2(viewport.to_pixels(ndc))),
                None => {
                    if run.len() > 1 {
                        painter.add(egui::Shape::line(std::mem::take(&mut run), stroke));
                    }
                    run.clear();
                }
            }
        }
        if run.len() > 1 {
            painter.add(egui::Shape::line(run, stroke));
        }
    }
}

fn paint_belt(painter: &egui::Painter, sim: &SimulationState, viewport: &Viewport) {
    let half_height = viewport.height * 0.5;
    for rock in sim.scene.asteroids() {
        let Some((depth, ndc)) = sim.camera.project(&rock.position) else { continue };
        let r = (sim.camera.projected_radius(depth, 0.08 * rock.size as f64) * half_height).max(0.6);
        painter.circle_filled(pos2(viewport.to_pixels(ndc)), r as f32, egui::Color32::from_gray(rock.shade));
    }
}

fn paint_labels(painter: &egui::Painter, sim: &SimulationState, viewport: &Viewport) {
    let font = egui::FontId::proportional(14.0);
    if let Some((body, px)) = sim.hovered_label(viewport) {
        label(painter, body, px, &font);
    }
    if let Some(body) = sim.selected_body().filter(|b| Some(*b) != sim.interaction.hovered) {
        if let Some(world) = sim.scene.body_position(body, &sim.instances) {
            if let Some(px) = solar_viz::overlay::project_label(&sim.camera, &world, viewport) {
                label(painter, body, px, &font);
            }
        }
    }
}

fn label(painter: &egui::Painter, body: CelestialBody, px: Vector2<f64>, font: &egui::FontId) {
    let anchor = pos2(px) + egui::vec2(8.0, -8.0);
    painter.text(anchor, egui::Align2::LEFT_BOTTOM, body.label(), font.clone(), egui::Color32::WHITE);
}
