//! Application menu bar

use std::path::PathBuf;

use eframe::egui;
use exhibit_lib::model::ModelFormat;
use exhibit_lib::navigation::ViewPreset;
use exhibit_lib::session::{Notice, Session};
use shared::SettingKey;

/// File dialog for models
pub fn pick_models(title: &str) -> Option<Vec<PathBuf>> {
    rfd::FileDialog::new()
        .set_title(title)
        .add_filter("3D models", ModelFormat::extensions())
        .add_filter("All files", &["*"])
        .pick_files()
}

/// Ask where to save a render of the current view, then save it
pub fn save_image(session: &mut Session, size: [u32; 2]) {
    let Some(path) = rfd::FileDialog::new()
        .set_title("Save image")
        .add_filter("PNG", &["png"])
        .set_file_name("render.png")
        .save_file()
    else {
        return;
    };
    if let Err(e) = session.viewer.save_image(&path, size[0], size[1]) {
        tracing::error!("Failed to save image: {e}");
    }
}

/// Show the file menu
pub fn file_menu(ui: &mut egui::Ui, session: &mut Session, size: [u32; 2]) {
    ui.menu_button("File", |ui| {
        if ui.button("Open…").clicked() {
            ui.close_menu();
            if let Some(paths) = pick_models("Open model") {
                session.open_files(&paths);
            }
        }
        let has_files = !session.files().is_empty();
        if ui
            .add_enabled(session.viewer.is_ready(), egui::Button::new("Add to scene…"))
            .clicked()
        {
            ui.close_menu();
            if let Some(paths) = pick_models("Add model") {
                for path in &paths {
                    session.add_file(path);
                }
            }
        }
        if ui
            .add_enabled(has_files, egui::Button::new("Reload"))
            .clicked()
        {
            ui.close_menu();
            session.request_reload();
        }
        ui.separator();
        if ui
            .add_enabled(session.viewer.is_ready(), egui::Button::new("Save image…"))
            .clicked()
        {
            ui.close_menu();
            save_image(session, size);
        }
        ui.separator();
        if ui.button("Quit").clicked() {
            ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
        }
    });
}

/// Show the view menu
pub fn view_menu(ui: &mut egui::Ui, session: &mut Session) {
    ui.menu_button("View", |ui| {
        for (label, preset) in [
            ("Front", ViewPreset::Front),
            ("Right", ViewPreset::Right),
            ("Top", ViewPreset::Top),
            ("Isometric", ViewPreset::Isometric),
        ] {
            if ui.button(label).clicked() {
                session.viewer.view(preset);
                ui.close_menu();
            }
        }
        if ui.button("Reset camera").clicked() {
            session.viewer.reset_to_bounds();
            ui.close_menu();
        }
        ui.separator();
        let mut sidebar = session.registry.bool(SettingKey::SidebarShow);
        if ui.checkbox(&mut sidebar, "Sidebar").changed() {
            session.set(SettingKey::SidebarShow, sidebar);
        }
        let mut ortho = session.registry.bool(SettingKey::Orthographic);
        if ui.checkbox(&mut ortho, "Orthographic").changed() {
            session.set(SettingKey::Orthographic, ortho);
        }
    });
}

/// Show the presets menu
pub fn presets_menu(ui: &mut egui::Ui, session: &mut Session) {
    ui.menu_button("Presets", |ui| {
        let presets: Vec<(String, String)> = session
            .presets
            .iter()
            .map(|p| (p.key.clone(), p.name.clone()))
            .collect();
        let active = session.active_preset().tag().to_string();
        for (key, name) in presets {
            if ui.radio(active == key, name).clicked() {
                if let Err(e) = session.apply_preset(&key) {
                    tracing::error!("{e}");
                }
                ui.close_menu();
            }
        }
        ui.separator();
        if let Some(dir) = session.presets.user_dir().map(|d| d.to_path_buf()) {
            if ui.button("Reload user presets").clicked() {
                session.presets.load_dir(&dir);
                tracing::info!("Reloaded presets from {}", dir.display());
                ui.close_menu();
            }
        } else {
            ui.weak("No user preset directory");
        }
    });
}

/// Show the help menu
pub fn help_menu(ui: &mut egui::Ui, toasts: &mut crate::ui::toasts::Toasts) {
    ui.menu_button("Help", |ui| {
        if ui.button("Keyboard shortcuts").clicked() {
            toasts.push_all(vec![Notice::info(
                "Arrows orbit, Ctrl+arrows pan, Shift+Up/Down dolly, 1/3/7/9 views, Enter resets, \
                 Ctrl+O open, Ctrl+R reload, Ctrl+S save image, Ctrl+G grid, Ctrl+Q quit",
            )]);
            ui.close_menu();
        }
    });
}
