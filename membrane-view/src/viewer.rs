//! Interactive membrane growth viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns a [`Simulation`] and an RGBA
//! copy of its grid, and implements [`eframe::App`] to render and control the
//! simulation through an egui UI.

use eframe::App;
use glam::{UVec2, Vec2};
use membrane_core::{
    diamond::Diamond, Ambient, Cell, Coord, Result, SimConfig, Simulation, TickReport,
};

/// What a click or drag on the grid does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Brush {
    /// Paint a diamond of membrane.
    Seed,
    /// Add a diamond of stimulation points.
    Zone,
    /// Start a single walk at the cell under the cursor.
    Stimulate,
    /// Clear a diamond back to empty space.
    Erase,
}

/// Grey level of a cell: `80 * state^1.5`, saturating.
fn cell_shade(cell: Cell) -> u8 {
    let level = 80.0 * (cell as u8 as f32).powf(1.5);
    level.min(255.0) as u8
}

/// Main application state for the interactive viewer.
///
/// The typical per-frame update is:
/// 1. Handle keyboard shortcuts and panel widgets.
/// 2. If enough time has passed, call [`Simulation::tick`] (environment only while paused).
/// 3. Repaint the pixels named by the dirty log and upload them.
/// 4. Draw the grid texture and the stimulation overlay.
///
/// ### Fields
/// - `sim` - The automaton being shown.
/// - `cfg` - Configuration the simulation was built from; reused by reset.
/// - `pixels` - RGBA bytes, one texel per cell, row-major.
/// - `texture` - GPU copy of `pixels`, created on the first frame.
///
/// - `brush` / `brush_radius` - Current click action and its diamond radius.
/// - `ambient_draft` - Slider values not yet sent to the simulation.
/// - `nudge_step` - Delta used by the nudge buttons.
/// - `show_zones` - Draw stimulation points and seeds on top of the grid.
///
/// - `zoom` - Screen pixels per cell.
/// - `pan` - Screen-space offset of the grid centre in pixels.
///
/// - `last_report` - Counters from the most recent tick.
/// - `step_interval` - Target time between automatic ticks (seconds).
/// - `last_step_time` - Time stamp of the last tick (egui time).
/// - `last_step_dt` - Actual time between the last two ticks (display only).
pub struct Viewer {
    sim: Simulation,
    cfg: SimConfig,
    pixels: Vec<u8>,
    texture: Option<egui::TextureHandle>,

    brush: Brush,
    brush_radius: u32,
    ambient_draft: Ambient,
    nudge_step: f32,
    show_zones: bool,

    zoom: f32,
    pan: egui::Vec2,

    last_report: TickReport,
    step_interval: f64,
    last_step_time: f64,
    last_step_dt: f64,
}

impl Viewer {
    /// Creates a paused viewer with a membrane blob in the middle of the grid.
    pub fn new(cfg: SimConfig) -> Result<Self> {
        let sim = Self::build_simulation(&cfg)?;
        let cells = sim.size() as usize * sim.size() as usize;
        let ambient_draft = sim.ambient();

        let mut viewer = Self {
            sim,
            cfg,
            pixels: vec![0; cells * 4],
            texture: None,
            brush: Brush::Seed,
            brush_radius: 4,
            ambient_draft,
            nudge_step: 0.1,
            show_zones: true,
            zoom: 3.0,
            pan: egui::vec2(0.0, 0.0),
            last_report: TickReport::default(),
            step_interval: 1.0 / 30.0,
            last_step_time: 0.0,
            last_step_dt: 0.0,
        };
        viewer.refresh_pixels();
        Ok(viewer)
    }

    fn build_simulation(cfg: &SimConfig) -> Result<Simulation> {
        let mut sim = Simulation::new(cfg.clone())?;
        let size = sim.size();
        sim.seed_region(UVec2::splat(size / 2), (size / 8).max(1))?;
        sim.pause();
        Ok(sim)
    }

    /// Rebuilds the simulation from `cfg`, keeping camera and brush settings.
    fn reset(&mut self) -> Result<()> {
        self.sim = Self::build_simulation(&self.cfg)?;
        let cells = self.sim.size() as usize * self.sim.size() as usize;
        self.pixels = vec![0; cells * 4];
        // Texture size may have changed; recreate it on the next frame.
        self.texture = None;
        self.ambient_draft = self.sim.ambient();
        self.last_report = TickReport::default();
        self.refresh_pixels();
        Ok(())
    }

    /// Same as [`Viewer::reset`], with a fresh random seed.
    fn reseed(&mut self) -> Result<()> {
        self.cfg.seed = Some(rand::random());
        tracing::info!(seed = ?self.cfg.seed, "reseeding");
        self.reset()
    }

    fn toggle_pause(&mut self) {
        if self.sim.is_paused() {
            self.sim.resume();
        } else {
            self.sim.pause();
        }
    }

    /// Runs one tick even when paused.
    fn step_once(&mut self) {
        let paused = self.sim.is_paused();
        self.sim.resume();
        self.last_report = self.sim.tick();
        if paused {
            self.sim.pause();
        }
    }

    /// Repaints every pixel named by the dirty log.
    ///
    /// ### Returns
    /// Number of pixels repainted.
    fn refresh_pixels(&mut self) -> usize {
        let size = self.sim.size() as usize;
        let dirty = self.sim.drain_dirty();
        for &c in &dirty {
            let shade = self.sim.grid().cell(c).map_or(0, cell_shade);
            let i = 4 * (c.y as usize * size + c.x as usize);
            self.pixels[i..i + 4].copy_from_slice(&[shade, shade, shade, 255]);
        }
        dirty.len()
    }

    /// Uploads pending pixel changes to the GPU texture.
    fn upload_texture(&mut self, ctx: &egui::Context) {
        let changed = self.refresh_pixels();
        if changed == 0 && self.texture.is_some() {
            return;
        }
        let size = self.sim.size() as usize;
        let image = egui::ColorImage::from_rgba_unmultiplied([size, size], &self.pixels);
        if let Some(texture) = self.texture.as_mut() {
            texture.set(image, egui::TextureOptions::NEAREST);
        } else {
            self.texture =
                Some(ctx.load_texture("membrane-grid", image, egui::TextureOptions::NEAREST));
        }
    }

    /// Screen rectangle covered by the grid.
    fn grid_rect(&self, rect: egui::Rect) -> egui::Rect {
        let side = self.sim.size() as f32 * self.zoom;
        egui::Rect::from_center_size(rect.center() + self.pan, egui::vec2(side, side))
    }

    /// Converts a grid-space position (cells, y down) to screen-space.
    fn grid_to_screen(&self, p: Vec2, rect: egui::Rect) -> egui::Pos2 {
        self.grid_rect(rect).min + egui::vec2(p.x, p.y) * self.zoom
    }

    /// Converts a screen position to the cell under it, if any.
    fn screen_to_grid(&self, p: egui::Pos2, rect: egui::Rect) -> Option<Coord> {
        let local = (p - self.grid_rect(rect).min) / self.zoom;
        if local.x < 0.0 || local.y < 0.0 {
            return None;
        }
        let c = UVec2::new(local.x as u32, local.y as u32);
        self.sim.grid().contains(c).then_some(c)
    }

    /// Applies `brush` at `at`; `zone` forces the zone brush (shift held).
    fn apply_brush(&mut self, at: Coord, zone: bool) -> Result<()> {
        let brush = if zone { Brush::Zone } else { self.brush };
        match brush {
            Brush::Seed => {
                self.sim.seed_region(at, self.brush_radius)?;
            }
            Brush::Zone => {
                self.sim.add_stimulation_zone(at, self.brush_radius)?;
            }
            Brush::Stimulate => {
                self.sim.stimulate(at)?;
            }
            Brush::Erase => {
                let footprint = Diamond::around(at, self.brush_radius as f32, self.sim.size());
                for c in footprint {
                    self.sim.edit_cell(c, Cell::Empty)?;
                }
                self.sim.harden();
            }
        }
        Ok(())
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        let (tab, enter, space, up, down) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Tab),
                i.key_pressed(egui::Key::Enter),
                i.key_pressed(egui::Key::Space),
                i.key_pressed(egui::Key::ArrowUp),
                i.key_pressed(egui::Key::ArrowDown),
            )
        });

        if tab {
            self.sim.stimulate_random();
        }
        if enter {
            let report = self.sim.reharden_all();
            tracing::debug!(changed = report.changed, "full re-harden");
            self.toggle_pause();
        }
        if space {
            self.toggle_pause();
        }
        if up {
            self.brush_radius = (self.brush_radius + 1).min(64);
        }
        if down {
            self.brush_radius = self.brush_radius.saturating_sub(1).max(1);
        }
    }

    /// Builds the top panel UI (run controls, stepping, zoom).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let label = if self.sim.is_paused() { "▶ Run" } else { "⏸ Pause" };
                if ui.button(label).clicked() {
                    self.toggle_pause();
                }

                ui.add(
                    egui::DragValue::new(&mut self.step_interval)
                        .prefix("dt target = ")
                        .range(0.0..=1.0)
                        .speed(0.005),
                );

                if ui.button("Step").clicked() {
                    let now = ctx.input(|i| i.time);
                    if self.last_step_time > 0.0 {
                        self.last_step_dt = now - self.last_step_time;
                    }
                    self.step_once();
                    self.last_step_time = now;
                }

                if ui.button("Reset").clicked()
                    && let Err(e) = self.reset()
                {
                    tracing::warn!(error = %e, "reset failed");
                }

                if ui.button("New seed").clicked()
                    && let Err(e) = self.reseed()
                {
                    tracing::warn!(error = %e, "reseed failed");
                }

                ui.separator();
                ui.add(egui::Slider::new(&mut self.zoom, 0.5..=12.0).text("Zoom"));
            });
        });
    }

    /// Builds the bottom status bar (tick, ambient, derived constants, counts).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("dt last = {:.3} s", self.last_step_dt));
                ui.label(format!(
                    "walks = {} zone / {} random",
                    self.last_report.zone_walks, self.last_report.random_walks
                ));
                ui.separator();

                let k = self.sim.constants();
                ui.label(format!(
                    "rigidity {}  exclusion {:.2}  speed {:.1}  random {:.2}",
                    k.rigidity, k.exclusion_threshold, k.speed, k.random_factor
                ));
                ui.separator();

                let a = self.sim.ambient();
                ui.label(format!(
                    "T {:.2}  P {:.2}  M {:.2}  ({:.0}%)",
                    a.temperature,
                    a.pressure,
                    a.moisture,
                    self.sim.transition_progress() * 100.0
                ));
                ui.separator();

                let grid = self.sim.grid();
                ui.label(format!(
                    "membrane = {}  wall = {}",
                    grid.count(Cell::Membrane),
                    grid.count(Cell::Wall)
                ));
                ui.label(format!(
                    "tick = {}{}",
                    self.sim.tick_count(),
                    if self.sim.is_paused() { " (paused)" } else { "" }
                ));
            });
        });
    }

    fn ambient_slider(ui: &mut egui::Ui, label: &str, value: &mut f32) {
        ui.add(egui::Slider::new(value, 0.0..=1.0).text(label));
    }

    /// Nudge buttons for one ambient component.
    fn nudge_row(&mut self, ui: &mut egui::Ui, label: &str, axis: usize) {
        ui.horizontal(|ui| {
            ui.label(label);
            for sign in [-1.0f32, 1.0] {
                let text = if sign < 0.0 { "−" } else { "+" };
                if ui.button(text).clicked() {
                    let mut delta = [0.0f32; 3];
                    delta[axis] = sign * self.nudge_step;
                    let delta = Ambient::new(delta[0], delta[1], delta[2]);
                    if let Err(e) = self.sim.nudge_environment(delta) {
                        tracing::warn!(error = %e, "nudge rejected");
                    }
                    self.ambient_draft = self.sim.environment().target();
                }
            }
        });
    }

    /// Builds the right-hand panel for environment and brush settings.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(240.0)
            .show(ctx, |ui| {
                ui.heading("Environment");

                Self::ambient_slider(ui, "temperature", &mut self.ambient_draft.temperature);
                Self::ambient_slider(ui, "pressure", &mut self.ambient_draft.pressure);
                Self::ambient_slider(ui, "moisture", &mut self.ambient_draft.moisture);
                if ui.button("Apply").clicked() {
                    let a = self.ambient_draft;
                    if let Err(e) = self.sim.set_environment(a.temperature, a.pressure, a.moisture)
                    {
                        tracing::warn!(error = %e, "ambient rejected");
                    }
                }

                ui.separator();
                ui.add(
                    egui::DragValue::new(&mut self.nudge_step)
                        .prefix("nudge step = ")
                        .range(0.01..=0.5)
                        .speed(0.01),
                );
                self.nudge_row(ui, "temperature", 0);
                self.nudge_row(ui, "pressure", 1);
                self.nudge_row(ui, "moisture", 2);

                ui.separator();
                ui.heading("Brush");
                ui.horizontal(|ui| {
                    ui.label("radius:");
                    ui.add(egui::DragValue::new(&mut self.brush_radius).range(1..=64));
                });
                ui.checkbox(&mut self.show_zones, "Show stimulation zones");
                ui.label(format!(
                    "{} stimulation points",
                    self.sim.stimulation_points().len()
                ));
                if ui.button("Clear zones").clicked() {
                    self.sim.clear_stimulation_zones();
                }
                if ui.button("Re-harden all").clicked() {
                    self.sim.reharden_all();
                }
            });
    }

    /// Builds the small floating toolbar for choosing the brush.
    fn ui_toolbar(&mut self, ctx: &egui::Context) {
        egui::Area::new("toolbar".into())
            .anchor(egui::Align2::LEFT_TOP, egui::vec2(10.0, 100.0))
            .movable(false)
            .show(ctx, |ui| {
                egui::Frame::new()
                    .fill(egui::Color32::from_rgba_unmultiplied(0, 0, 0, 32))
                    .show(ui, |ui| {
                        ui.vertical(|ui| {
                            for (brush, label) in [
                                (Brush::Seed, "◆ Seed"),
                                (Brush::Zone, "◇ Zone"),
                                (Brush::Stimulate, "• Walk"),
                                (Brush::Erase, "✕ Erase"),
                            ] {
                                if ui.selectable_label(self.brush == brush, label).clicked() {
                                    self.brush = brush;
                                }
                            }
                        });
                    });
            });
    }

    /// Draws stimulation points and moving seeds over the grid.
    fn draw_zones(&self, painter: &egui::Painter, rect: egui::Rect) {
        let point_color = egui::Color32::from_rgba_unmultiplied(255, 120, 40, 90);
        for &p in self.sim.stimulation_points() {
            let min = self.grid_to_screen(p.as_vec2(), rect);
            let cell = egui::Rect::from_min_size(min, egui::vec2(self.zoom, self.zoom));
            painter.rect_filled(cell, 0.0, point_color);
        }

        let stroke = egui::Stroke::new(1.5, egui::Color32::YELLOW);
        for seed in self.sim.seeds() {
            let centre = self.grid_to_screen(seed.pos + Vec2::splat(0.5), rect);
            painter.circle_stroke(centre, 4.0, stroke);
            let heading = self.grid_to_screen(seed.pos + seed.vel + Vec2::splat(0.5), rect);
            painter.line_segment([centre, heading], stroke);
        }
    }

    /// Draws the brush footprint under the cursor.
    fn draw_brush_hint(&self, painter: &egui::Painter, rect: egui::Rect, hover: Coord) {
        let stroke = egui::Stroke::new(1.0, egui::Color32::LIGHT_GREEN);
        let r = self.brush_radius.saturating_sub(1) as f32;
        let c = hover.as_vec2() + Vec2::splat(0.5);
        let corners = [
            Vec2::new(c.x, c.y - r - 0.5),
            Vec2::new(c.x + r + 0.5, c.y),
            Vec2::new(c.x, c.y + r + 0.5),
            Vec2::new(c.x - r - 0.5, c.y),
        ];
        let points: Vec<egui::Pos2> = corners
            .iter()
            .map(|&p| self.grid_to_screen(p, rect))
            .collect();
        painter.add(egui::Shape::closed_line(points, stroke));
    }

    /// Builds the central panel where the grid is drawn and painted on.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            // Pan with the secondary button.
            if response.dragged_by(egui::PointerButton::Secondary) {
                self.pan += response.drag_delta();
            }

            let hover = response
                .hover_pos()
                .and_then(|p| self.screen_to_grid(p, rect));
            let painting = response.clicked() || response.dragged_by(egui::PointerButton::Primary);
            if painting && let Some(at) = hover {
                let shift = ctx.input(|i| i.modifiers.shift);
                if let Err(e) = self.apply_brush(at, shift) {
                    tracing::warn!(error = %e, "brush failed");
                }
            }

            // Zoom around the mouse cursor.
            let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let pointer = response.hover_pos().unwrap_or(rect.center());
                let grid_before = (pointer - self.grid_rect(rect).min) / self.zoom;

                let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0);
                self.zoom = (self.zoom * factor).clamp(0.5, 12.0);

                let screen_after = self.grid_to_screen(Vec2::new(grid_before.x, grid_before.y), rect);
                self.pan += pointer - screen_after;
            }

            // Auto-run; paused ticks only move the environment.
            let now = ctx.input(|i| i.time);
            let elapsed = now - self.last_step_time;
            if elapsed >= self.step_interval {
                if self.last_step_time > 0.0 {
                    self.last_step_dt = elapsed;
                }
                self.last_report = self.sim.tick();
                self.last_step_time = now;
            }

            self.upload_texture(ctx);
            if let Some(texture) = &self.texture {
                let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
                painter.image(texture.id(), self.grid_rect(rect), uv, egui::Color32::WHITE);
            }

            if self.show_zones {
                self.draw_zones(&painter, rect);
            }
            if let Some(at) = hover {
                self.draw_brush_hint(&painter, rect, at);
            }

            if !self.sim.is_paused() || !self.sim.environment().is_settled() {
                ctx.request_repaint();
            }
        });
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_keys(ctx);
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
        self.ui_toolbar(ctx);
    }
}
