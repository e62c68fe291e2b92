// Library crate: everything that can run without a window, so integration
// tests can drive it through the headless harness.
// The eframe shell, widgets and the OpenGL engine live in the binary crate.

pub mod engine;
pub mod harness;
pub mod math;
pub mod model;
pub mod navigation;
pub mod reload;
pub mod session;
pub mod state;
pub mod thumbnails;
pub mod viewer;
pub mod watcher;
