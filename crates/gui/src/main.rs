mod app;
mod ui;
mod viewport;

use std::path::PathBuf;

use app::ExhibitApp;
use exhibit_lib::state::{AppPaths, JsonFileStore, KeyValueStore, MemoryStore, WindowState};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "exhibit=info,exhibit_lib=info".into()),
        )
        .with_file(true)
        .with_line_number(true)
        .init();

    // Every argument is a model; the first opens, the rest are added
    let files: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();

    let paths = AppPaths::discover();
    let store: Box<dyn KeyValueStore> = match &paths {
        Some(paths) => Box::new(JsonFileStore::open(paths.state_file())),
        None => {
            tracing::warn!("No home directory, settings will not be saved");
            Box::new(MemoryStore::default())
        }
    };
    let window = WindowState::load(store.as_ref());

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Exhibit")
            .with_inner_size([window.width, window.height])
            .with_min_inner_size([480.0, 320.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    if let Err(e) = eframe::run_native(
        "exhibit",
        native_options,
        Box::new(move |cc| Ok(Box::new(ExhibitApp::new(cc, paths, store, files)))),
    ) {
        tracing::error!("Failed to start application: {e}");
    }
}
