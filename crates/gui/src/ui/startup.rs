//! Page shown instead of the viewport when there is nothing to draw

use egui::Ui;

/// Why the viewport cannot be shown
pub enum StartupPage {
    /// Renderer ready, no file opened yet
    Empty,
    /// No render backend initialized
    Failed(Vec<String>),
}

/// Returns `true` when the user asked to open a file
pub fn show(ui: &mut Ui, page: &StartupPage) -> bool {
    let mut open = false;
    ui.vertical_centered(|ui| {
        ui.add_space(ui.available_height() * 0.3);
        match page {
            StartupPage::Empty => {
                ui.heading("Exhibit");
                ui.add_space(8.0);
                ui.label("Drop a model here or open one to start.");
                ui.add_space(8.0);
                open = ui.button("Open…").clicked();
            }
            StartupPage::Failed(reasons) => {
                ui.heading("Unable to start the renderer");
                ui.add_space(8.0);
                for reason in reasons {
                    ui.colored_label(ui.visuals().error_fg_color, reason);
                }
                ui.add_space(8.0);
                ui.weak("Check your graphics drivers and OpenGL support.");
            }
        }
    });
    open
}
