//! Settings sidebar: preset picker and one widget per customizable setting

use egui::Ui;
use exhibit_lib::session::Session;
use exhibit_lib::state::ActivePreset;
use exhibit_lib::thumbnails::HdriLibrary;
use shared::{SettingKey, UpDirection};

/// Sidebar-local UI state
#[derive(Default)]
pub struct SidebarState {
    save_name: String,
    save_formats: String,
    save_open: bool,
    hdri: Option<HdriLibrary>,
    hdri_thumbnails: Vec<(std::path::PathBuf, std::path::PathBuf)>,
}

impl SidebarState {
    pub fn with_hdri(library: Option<HdriLibrary>) -> Self {
        let hdri_thumbnails = library
            .as_ref()
            .map(HdriLibrary::thumbnails)
            .unwrap_or_default();
        Self {
            hdri: library,
            hdri_thumbnails,
            ..Default::default()
        }
    }

    pub fn refresh_hdri(&mut self) {
        if let Some(library) = &self.hdri {
            self.hdri_thumbnails = library.thumbnails();
        }
    }
}

pub fn show(ui: &mut Ui, session: &mut Session, state: &mut SidebarState) {
    egui::ScrollArea::vertical().show(ui, |ui| {
        preset_picker(ui, session, state);
        ui.separator();

        egui::CollapsingHeader::new("Model")
            .default_open(true)
            .show(ui, |ui| {
                color(ui, session, SettingKey::ModelColor, "Color");
                slider(ui, session, SettingKey::ModelOpacity, "Opacity", 0.0..=1.0);
                slider(ui, session, SettingKey::ModelMetallic, "Metallic", 0.0..=1.0);
                slider(ui, session, SettingKey::ModelRoughness, "Roughness", 0.0..=1.0);
                slider(ui, session, SettingKey::NormalScale, "Normal scale", 0.0..=5.0);
                checkbox(ui, session, SettingKey::ShowEdges, "Show edges");
                slider(ui, session, SettingKey::EdgesWidth, "Edge width", 0.5..=10.0);
                checkbox(ui, session, SettingKey::ArmatureEnable, "Armature");
                checkbox(ui, session, SettingKey::UseColor, "Use model colours");
            });

        egui::CollapsingHeader::new("Points")
            .default_open(false)
            .show(ui, |ui| {
                slider(ui, session, SettingKey::PointSize, "Point size", 1.0..=20.0);
                checkbox(ui, session, SettingKey::SpriteEnabled, "Sprites");
                sprites_type(ui, session);
                slider(ui, session, SettingKey::SpritesSize, "Sprite size", 0.1..=20.0);
            });

        egui::CollapsingHeader::new("Lighting")
            .default_open(true)
            .show(ui, |ui| {
                slider(ui, session, SettingKey::LightIntensity, "Intensity", 0.0..=5.0);
                checkbox(ui, session, SettingKey::ToneMapping, "Tone mapping");
                checkbox(ui, session, SettingKey::AmbientOcclusion, "Ambient occlusion");
                checkbox(ui, session, SettingKey::AntiAliasing, "Anti-aliasing");
                checkbox(ui, session, SettingKey::TranslucencySupport, "Translucency");
            });

        egui::CollapsingHeader::new("Background")
            .default_open(false)
            .show(ui, |ui| {
                color(ui, session, SettingKey::BgColor, "Color");
                checkbox(ui, session, SettingKey::HdriAmbient, "HDRI lighting");
                checkbox(ui, session, SettingKey::HdriSkybox, "HDRI skybox");
                checkbox(ui, session, SettingKey::BlurBackground, "Blur");
                slider(ui, session, SettingKey::BlurCoc, "Blur strength", 1.0..=100.0);
                hdri_picker(ui, session, state);
            });

        egui::CollapsingHeader::new("Grid")
            .default_open(false)
            .show(ui, |ui| {
                checkbox(ui, session, SettingKey::Grid, "Show grid");
                checkbox(ui, session, SettingKey::GridAbsolute, "Through origin");
                color(ui, session, SettingKey::GridColor, "Color");
            });

        egui::CollapsingHeader::new("Scientific")
            .default_open(false)
            .show(ui, |ui| {
                checkbox(ui, session, SettingKey::ScivisEnabled, "Color by data");
                int_drag(ui, session, SettingKey::ScivisComponent, "Component", -2..=16);
                checkbox(ui, session, SettingKey::Cells, "Cell data");
                checkbox(ui, session, SettingKey::Volume, "Volume rendering");
                checkbox(ui, session, SettingKey::Inverse, "Inverse opacity");
            });

        egui::CollapsingHeader::new("Camera")
            .default_open(true)
            .show(ui, |ui| {
                up_picker(ui, session);
                checkbox(ui, session, SettingKey::PointUp, "Keep up direction");
                checkbox(ui, session, SettingKey::Orthographic, "Orthographic");
            });

        egui::CollapsingHeader::new("Behaviour")
            .default_open(false)
            .show(ui, |ui| {
                checkbox(ui, session, SettingKey::AutoBest, "Pick preset on open");
                checkbox(ui, session, SettingKey::AutoReload, "Reload on change");
            });
    });
}

fn preset_picker(ui: &mut Ui, session: &mut Session, state: &mut SidebarState) {
    let selected = match session.active_preset() {
        ActivePreset::Preset(key) => session
            .presets
            .get(key)
            .map_or_else(|| key.clone(), |p| p.name.clone()),
        ActivePreset::Custom => "Custom".to_string(),
    };
    let presets: Vec<(String, String)> = session
        .presets
        .iter()
        .map(|p| (p.key.clone(), p.name.clone()))
        .collect();

    let mut chosen = None;
    ui.horizontal(|ui| {
        ui.label("Preset");
        egui::ComboBox::from_id_salt("preset_picker")
            .selected_text(selected)
            .show_ui(ui, |ui| {
                for (key, name) in &presets {
                    if ui.selectable_label(false, name).clicked() {
                        chosen = Some(key.clone());
                    }
                }
            });
        if ui
            .add_enabled(session.presets.user_dir().is_some(), egui::Button::new("Save…"))
            .clicked()
        {
            state.save_open = true;
        }
    });
    if let Some(key) = chosen {
        if let Err(e) = session.apply_preset(&key) {
            tracing::error!("{e}");
        }
    }

    if state.save_open {
        ui.group(|ui| {
            ui.label("Name");
            ui.text_edit_singleline(&mut state.save_name);
            ui.label("File pattern (regex)");
            ui.text_edit_singleline(&mut state.save_formats);
            ui.horizontal(|ui| {
                let can_save = !state.save_name.trim().is_empty();
                if ui.add_enabled(can_save, egui::Button::new("Save")).clicked() {
                    match session.save_preset(state.save_name.trim(), &state.save_formats) {
                        Ok(_) => {
                            state.save_open = false;
                            state.save_name.clear();
                            state.save_formats.clear();
                        }
                        Err(e) => tracing::error!("Failed to save preset: {e}"),
                    }
                }
                if ui.button("Cancel").clicked() {
                    state.save_open = false;
                }
            });
        });
    }
}

fn checkbox(ui: &mut Ui, session: &mut Session, key: SettingKey, label: &str) {
    let mut value = session.registry.bool(key);
    if ui.checkbox(&mut value, label).changed() {
        session.set(key, value);
    }
}

fn slider(
    ui: &mut Ui,
    session: &mut Session,
    key: SettingKey,
    label: &str,
    range: std::ops::RangeInclusive<f64>,
) {
    let mut value = session.registry.f64(key);
    if ui.add(egui::Slider::new(&mut value, range).text(label)).changed() {
        session.set(key, value);
    }
}

fn int_drag(
    ui: &mut Ui,
    session: &mut Session,
    key: SettingKey,
    label: &str,
    range: std::ops::RangeInclusive<i64>,
) {
    let mut value = session.registry.i64(key);
    ui.horizontal(|ui| {
        if ui.add(egui::DragValue::new(&mut value).range(range)).changed() {
            session.set(key, value);
        }
        ui.label(label);
    });
}

fn color(ui: &mut Ui, session: &mut Session, key: SettingKey, label: &str) {
    let [r, g, b] = session.registry.rgb(key);
    let mut rgb = [r as f32, g as f32, b as f32];
    ui.horizontal(|ui| {
        if ui.color_edit_button_rgb(&mut rgb).changed() {
            session.set(key, [rgb[0] as f64, rgb[1] as f64, rgb[2] as f64]);
        }
        ui.label(label);
    });
}

fn sprites_type(ui: &mut Ui, session: &mut Session) {
    let current = session.registry.str(SettingKey::SpritesType).to_string();
    let mut chosen = None;
    egui::ComboBox::from_label("Sprite type")
        .selected_text(&current)
        .show_ui(ui, |ui| {
            for kind in ["sphere", "circle", "gaussian", "cross"] {
                if ui.selectable_label(current == kind, kind).clicked() {
                    chosen = Some(kind);
                }
            }
        });
    if let Some(kind) = chosen {
        session.set(SettingKey::SpritesType, kind);
    }
}

fn up_picker(ui: &mut Ui, session: &mut Session) {
    let current = session.registry.up();
    let mut chosen = None;
    egui::ComboBox::from_label("Up")
        .selected_text(current.as_str())
        .show_ui(ui, |ui| {
            for dir in UpDirection::ALL {
                if ui.selectable_label(current == dir, dir.as_str()).clicked() {
                    chosen = Some(dir);
                }
            }
        });
    if let Some(dir) = chosen {
        session.set(SettingKey::Up, dir.as_str());
    }
}

const THUMBNAIL_WIDTH: f32 = 112.0;

fn hdri_picker(ui: &mut Ui, session: &mut Session, state: &mut SidebarState) {
    let current = session.registry.str(SettingKey::HdriFile).to_string();
    ui.horizontal(|ui| {
        ui.label("HDRI");
        if ui.button("Browse…").clicked() {
            if let Some(path) = rfd::FileDialog::new()
                .add_filter("HDR image", &["hdr", "png", "jpg", "jpeg"])
                .pick_file()
            {
                session.set(SettingKey::HdriFile, path.display().to_string());
            }
        }
        if !current.is_empty() && ui.small_button("✕").clicked() {
            session.set(SettingKey::HdriFile, "");
        }
        if state.hdri.is_some() && ui.small_button("⟳").on_hover_text("Rescan library").clicked() {
            state.refresh_hdri();
        }
    });
    if !current.is_empty() {
        ui.weak(&current);
    }

    if state.hdri_thumbnails.is_empty() {
        return;
    }
    let mut chosen = None;
    ui.horizontal_wrapped(|ui| {
        for (hdri, thumbnail) in &state.hdri_thumbnails {
            let image = egui::Image::new(format!("file://{}", thumbnail.display()))
                .fit_to_exact_size(egui::vec2(THUMBNAIL_WIDTH, THUMBNAIL_WIDTH / 2.0));
            let selected = hdri.display().to_string() == current;
            let response = ui.add(egui::ImageButton::new(image).selected(selected));
            let name = hdri
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            if response.on_hover_text(name).clicked() {
                chosen = Some(hdri.display().to_string());
            }
        }
    });
    if let Some(path) = chosen {
        session.set(SettingKey::HdriFile, path);
    }
}
