//! Main application module

mod keyboard;
mod menus;
mod styles;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use eframe::egui;
use exhibit_lib::engine::init_first_available;
use exhibit_lib::reload::ReloadWorker;
use exhibit_lib::session::Session;
use exhibit_lib::state::{AppPaths, KeyValueStore, PresetCatalog};
use exhibit_lib::thumbnails::HdriLibrary;
use exhibit_lib::viewer::Viewer;
use exhibit_lib::watcher::{FileWatcher, POLL_INTERVAL};
use shared::SettingKey;

use crate::ui::sidebar::{self, SidebarState};
use crate::ui::startup::{self, StartupPage};
use crate::ui::toasts::Toasts;
use crate::ui::status_bar;
use crate::viewport::{gl_engine, ViewportPanel};
use keyboard::ShortcutAction;

/// Main application
pub struct ExhibitApp {
    session: Session,
    viewport: ViewportPanel,
    sidebar: SidebarState,
    toasts: Toasts,
    /// Failures of every render backend, when none initialized
    backend_failures: Option<Vec<String>>,
    /// Last known inner size of the window, saved at exit
    window_size: egui::Vec2,
}

impl ExhibitApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        paths: Option<AppPaths>,
        store: Box<dyn KeyValueStore>,
        files: Vec<PathBuf>,
    ) -> Self {
        egui_extras::install_image_loaders(&cc.egui_ctx);
        styles::configure_styles(&cc.egui_ctx);

        let renderer_slot = Arc::new(Mutex::new(None));
        let (viewer, backend_failures) =
            match init_first_available(gl_engine::candidates(cc.gl.clone(), renderer_slot.clone()))
            {
                Ok(engine) => (Viewer::new(engine), None),
                Err(failures) => (
                    Viewer::inert(),
                    Some(failures.iter().map(ToString::to_string).collect()),
                ),
            };
        let renderer = renderer_slot.lock().ok().and_then(|mut slot| slot.take());

        let presets = PresetCatalog::load(paths.as_ref().map(AppPaths::presets_dir));

        let ctx = cc.egui_ctx.clone();
        let reload = ReloadWorker::new(Arc::new(move || ctx.request_repaint()));

        let mut session = Session::new(viewer, presets, store).with_reload_worker(reload);
        let ctx = cc.egui_ctx.clone();
        match FileWatcher::new(POLL_INTERVAL, move || ctx.request_repaint()) {
            Ok(watcher) => session = session.with_watcher(watcher),
            Err(e) => tracing::warn!("File watching disabled: {e}"),
        }
        session.open_files(&files);

        let hdri = paths.as_ref().map(|p| HdriLibrary::new(p.hdri_dir()));
        let window = session.window_state();
        let window_size = egui::vec2(window.width, window.height);

        Self {
            session,
            viewport: ViewportPanel::new(renderer),
            sidebar: SidebarState::with_hdri(hdri),
            toasts: Toasts::default(),
            backend_failures,
            window_size,
        }
    }

    fn image_size(&self) -> [u32; 2] {
        [
            self.window_size.x.max(1.0) as u32,
            self.window_size.y.max(1.0) as u32,
        ]
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|f| f.path.clone())
                .collect()
        });
        if dropped.is_empty() {
            return;
        }
        // Shift adds to the scene instead of replacing it
        if ctx.input(|i| i.modifiers.shift) && !self.session.files().is_empty() {
            for path in &dropped {
                self.session.add_file(path);
            }
        } else {
            self.session.open_files(&dropped);
        }
    }
}

impl eframe::App for ExhibitApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some(rect) = ctx.input(|i| i.viewport().inner_rect) {
            self.window_size = rect.size();
        }

        self.session.poll_background();
        self.handle_dropped_files(ctx);

        match keyboard::handle_keyboard(ctx, &mut self.session) {
            Some(ShortcutAction::Open) => {
                if let Some(paths) = menus::pick_models("Open model") {
                    self.session.open_files(&paths);
                }
            }
            Some(ShortcutAction::SaveImage) => {
                let size = self.image_size();
                menus::save_image(&mut self.session, size);
            }
            Some(ShortcutAction::Quit) => ctx.send_viewport_cmd(egui::ViewportCommand::Close),
            None => {}
        }

        // ── Menu bar ──────────────────────────────────────────
        let size = self.image_size();
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                menus::file_menu(ui, &mut self.session, size);
                menus::view_menu(ui, &mut self.session);
                menus::presets_menu(ui, &mut self.session);
                menus::help_menu(ui, &mut self.toasts);
            });
        });

        // ── Status bar ───────────────────────────────────────
        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(22.0)
            .frame(
                egui::Frame::side_top_panel(&ctx.style()).inner_margin(egui::Margin::symmetric(8, 2)),
            )
            .show(ctx, |ui| {
                status_bar::show(ui, &self.session);
            });

        // ── Settings sidebar ─────────────────────────────────
        if self.session.registry.bool(SettingKey::SidebarShow) {
            egui::SidePanel::right("sidebar")
                .default_width(290.0)
                .width_range(220.0..=480.0)
                .resizable(true)
                .frame(
                    egui::Frame::side_top_panel(&ctx.style()).inner_margin(egui::Margin::same(6)),
                )
                .show(ctx, |ui| {
                    sidebar::show(ui, &mut self.session, &mut self.sidebar);
                });
        }

        // ── Central panel: 3D viewport or startup page ───────
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let page = match &self.backend_failures {
                    Some(failures) => Some(StartupPage::Failed(failures.clone())),
                    None if self.session.files().is_empty() => Some(StartupPage::Empty),
                    None => None,
                };
                match page {
                    Some(page) => {
                        if startup::show(ui, &page) {
                            if let Some(paths) = menus::pick_models("Open model") {
                                self.session.open_files(&paths);
                            }
                        }
                    }
                    None => self.viewport.show(ui, &mut self.session),
                }
            });

        self.toasts.push_all(self.session.take_notices());
        self.toasts.show(ctx);
    }

    fn on_exit(&mut self, gl: Option<&glow::Context>) {
        self.session
            .save_window_state(self.window_size.x, self.window_size.y);
        self.viewport.destroy(gl);
    }
}

