use egui::Ui;
use exhibit_lib::session::Session;

pub fn show(ui: &mut Ui, session: &Session) {
    ui.horizontal(|ui| {
        match session.files() {
            [] => {
                ui.weak("No model loaded");
            }
            [only] => {
                ui.label(file_name(only));
            }
            [first, rest @ ..] => {
                ui.label(format!("{} (+{})", file_name(first), rest.len()));
            }
        }

        if let Some(engine) = session.viewer.engine() {
            let bounds = engine.scene_bounds();
            if !bounds.is_empty() {
                ui.separator();
                let size = bounds.max - bounds.min;
                ui.weak(format!("{:.3} × {:.3} × {:.3}", size.x, size.y, size.z));
            }
        }

        ui.separator();
        ui.weak(format!("Up {}", session.registry.up()));

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if let Some(engine) = session.viewer.engine() {
                ui.weak(engine.backend_name());
                ui.separator();
            }
            ui.label(session.active_preset().tag());
        });
    });
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
