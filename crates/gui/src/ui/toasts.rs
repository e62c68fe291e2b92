//! Transient notifications in the bottom corner of the window

use std::time::{Duration, Instant};

use exhibit_lib::session::{Notice, NoticeLevel};

const TOAST_DURATION: Duration = Duration::from_secs(4);

#[derive(Default)]
pub struct Toasts {
    active: Vec<(Notice, Instant)>,
}

impl Toasts {
    pub fn push_all(&mut self, notices: Vec<Notice>) {
        let now = Instant::now();
        self.active.extend(notices.into_iter().map(|n| (n, now)));
    }

    pub fn show(&mut self, ctx: &egui::Context) {
        self.active.retain(|(_, at)| at.elapsed() < TOAST_DURATION);
        if self.active.is_empty() {
            return;
        }

        egui::Area::new(egui::Id::new("toasts"))
            .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-12.0, -34.0))
            .interactable(false)
            .show(ctx, |ui| {
                for (notice, _) in &self.active {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        let color = match notice.level {
                            NoticeLevel::Info => ui.visuals().text_color(),
                            NoticeLevel::Error => ui.visuals().error_fg_color,
                        };
                        ui.colored_label(color, &notice.message);
                    });
                }
            });
        ctx.request_repaint_after(Duration::from_millis(250));
    }
}
