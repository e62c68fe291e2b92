//! 3D viewport panel: forwards pointer input to the camera navigator and
//! paints the scene through an egui_glow callback.

pub mod gl_engine;
mod gl_renderer;

use std::sync::Arc;

use egui::Ui;
use exhibit_lib::navigation::DragButton;
use exhibit_lib::session::Session;

use gl_engine::SharedRenderer;

/// 3D viewport panel with OpenGL rendering
pub struct ViewportPanel {
    renderer: Option<SharedRenderer>,
    /// Cumulative scale of the current pinch gesture
    pinch: Option<f64>,
}

impl ViewportPanel {
    pub fn new(renderer: Option<SharedRenderer>) -> Self {
        Self {
            renderer,
            pinch: None,
        }
    }

    pub fn show(&mut self, ui: &mut Ui, session: &mut Session) {
        let (rect, response) =
            ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
        let viewport = [rect.width() as f64, rect.height() as f64];

        // ── Camera controls ─────────────────────────────────────
        if response.dragged_by(egui::PointerButton::Primary) {
            let d = response.drag_delta();
            session
                .viewer
                .drag(DragButton::Primary, [d.x as f64, d.y as f64], viewport);
        }
        if response.dragged_by(egui::PointerButton::Middle)
            || response.dragged_by(egui::PointerButton::Secondary)
        {
            let d = response.drag_delta();
            session
                .viewer
                .drag(DragButton::Middle, [d.x as f64, d.y as f64], viewport);
        }
        if response.double_clicked() {
            session.viewer.reset_to_bounds();
        }

        if response.hovered() {
            let (scroll, zoom) = ui.input(|i| (i.smooth_scroll_delta.y, i.zoom_delta()));
            if (zoom - 1.0).abs() > f32::EPSILON {
                let scale = self.pinch.unwrap_or(1.0) * zoom as f64;
                self.pinch = Some(scale);
                session.viewer.pinch(scale);
            } else {
                if self.pinch.take().is_some() {
                    session.viewer.end_pinch();
                }
                if scroll.abs() > 0.1 {
                    // Wheel up brings the camera closer
                    session.viewer.scroll(-(scroll as f64) / 50.0);
                }
            }
        }

        if !ui.is_rect_visible(rect) {
            return;
        }
        self.paint(ui, rect, session);
    }

    fn paint(&self, ui: &mut Ui, rect: egui::Rect, session: &Session) {
        let (Some(renderer), Some(engine)) = (&self.renderer, session.viewer.engine()) else {
            return;
        };
        let renderer = renderer.clone();
        let camera = engine.camera().clone();

        let callback = egui::PaintCallback {
            rect,
            callback: Arc::new(egui_glow::CallbackFn::new(move |info, painter| {
                let px = info.viewport_in_pixels();
                let viewport = [px.left_px, px.from_bottom_px, px.width_px, px.height_px];
                if let Ok(mut r) = renderer.lock() {
                    r.paint(painter.gl(), &camera, viewport);
                }
            })),
        };
        ui.painter().add(callback);
    }

    /// Release GPU resources. Called once at exit.
    pub fn destroy(&self, gl: Option<&glow::Context>) {
        if let (Some(renderer), Some(gl)) = (&self.renderer, gl) {
            if let Ok(mut r) = renderer.lock() {
                r.destroy(gl);
            }
        }
    }
}
