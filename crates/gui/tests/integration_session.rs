//! Integration tests for the viewer session: settings fan-out, presets,
//! drift detection and background reload.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};

use exhibit_lib::harness::TestHarness;
use exhibit_lib::model::load_model;
use exhibit_lib::reload::{Loader, ReloadWorker};
use shared::{EngineOption, SettingKey, SettingValue};

const TRIANGLE_STL: &str = "solid tri
facet normal 0 0 1
  outer loop
    vertex 0 0 0
    vertex 1 0 0
    vertex 0 1 0
  endloop
endfacet
endsolid tri
";

fn write_obj(dir: &Path, name: &str, offset: f32) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(
        &path,
        format!(
            "v {o} 0 0\nv {} 0 0\nv {o} 1 0\nf 1 2 3\n",
            offset + 1.0,
            o = offset
        ),
    )
    .unwrap();
    path
}

#[test]
fn test_stl_open_sends_up_before_preset_settings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.stl");
    std::fs::write(&path, TRIANGLE_STL).unwrap();

    let mut h = TestHarness::new();
    h.option_log().clear();
    assert!(h.open(&path));

    assert_eq!(h.active_preset(), "3d-print");
    let log = h.option_log();
    let up = log.position(EngineOption::UpDirection).expect("up sent");
    let grid_absolute = log
        .position(EngineOption::GridAbsolute)
        .expect("preset setting sent");
    assert!(up < grid_absolute);
    assert_eq!(
        log.last(EngineOption::UpDirection),
        Some(SettingValue::from("+Z"))
    );
    assert_eq!(h.camera().view_up, glam::DVec3::Z);
}

#[test]
fn test_open_without_auto_best_keeps_settings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.stl");
    std::fs::write(&path, TRIANGLE_STL).unwrap();

    let mut h = TestHarness::new();
    h.set(SettingKey::AutoBest, false);
    assert!(h.open(&path));
    assert_eq!(h.get(SettingKey::Up), &SettingValue::from("+Y"));
    assert_eq!(h.active_preset(), "general");
}

#[test]
fn test_studio_drift_and_reapply() {
    let mut h = TestHarness::new();
    assert!(h.apply_preset("studio"));
    assert_eq!(h.active_preset(), "studio");
    assert_eq!(h.engine_option(EngineOption::GridEnable), Some(&SettingValue::Bool(false)));

    h.set(SettingKey::LightIntensity, 3.0);
    assert_eq!(h.active_preset(), "custom");

    // Still custom after restoring the value by hand
    h.set(SettingKey::LightIntensity, 1.5);
    assert_eq!(h.active_preset(), "custom");

    assert!(h.apply_preset("studio"));
    assert_eq!(h.active_preset(), "studio");
}

#[test]
fn test_other_settings_do_not_reach_engine() {
    let mut h = TestHarness::new();
    h.option_log().clear();
    h.set(SettingKey::PointUp, false);
    h.set(SettingKey::ScivisEnabled, true);
    assert!(h.option_log().entries().is_empty());
    assert!(!h.session.viewer.navigator().point_up);
}

#[test]
fn test_no_op_write_publishes_nothing() {
    let mut h = TestHarness::new();
    h.option_log().clear();
    assert!(!h.set(SettingKey::Grid, true));
    assert!(h.option_log().entries().is_empty());

    assert!(h.set(SettingKey::Grid, false));
    assert_eq!(h.option_log().entries().len(), 1);
}

#[test]
fn test_unknown_preset_is_rejected() {
    let mut h = TestHarness::new();
    assert!(!h.apply_preset("does-not-exist"));
    assert_eq!(h.active_preset(), "general");
}

#[test]
fn test_last_matching_user_preset_wins() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("printing.json"),
        r#"{"my-print": {"name": "My print", "formats": "\\.stl$",
            "view-settings": {"model-color": [1.0, 0.0, 0.0]}, "other-settings": {}}}"#,
    )
    .unwrap();
    let model = dir.path().join("part.stl");
    std::fs::write(&model, TRIANGLE_STL).unwrap();

    let mut h = TestHarness::with_user_presets(dir.path());
    assert!(h.open(&model));
    assert_eq!(h.active_preset(), "my-print");
    assert_eq!(
        h.engine_option(EngineOption::ColorRgb),
        Some(&SettingValue::from([1.0, 0.0, 0.0]))
    );
}

#[test]
fn test_saved_preset_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = TestHarness::with_user_presets(dir.path());
    h.set(SettingKey::Grid, false);
    h.set(SettingKey::PointSize, 4.0);
    let key = h.session.save_preset("Dense points", r"\.xyz$").unwrap();
    assert_eq!(h.active_preset(), key);
    assert_eq!(h.take_notices().len(), 1);

    let mut restarted = TestHarness::with_user_presets(dir.path());
    assert!(restarted.apply_preset(&key));
    assert_eq!(restarted.get(SettingKey::PointSize), &SettingValue::Float(4.0));
    assert_eq!(restarted.get(SettingKey::Grid), &SettingValue::Bool(false));
    assert_eq!(
        restarted
            .session
            .presets
            .select_preset_for(Path::new("/scans/room.xyz")),
        key
    );
}

#[test]
fn test_open_many_adds_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_obj(dir.path(), "a.obj", 0.0);
    let b = write_obj(dir.path(), "b.obj", 5.0);

    let mut h = TestHarness::new();
    h.session.open_files(&[a.clone(), b.clone()]);
    assert_eq!(h.files(), vec![a, b]);
    assert!(h.session.viewer.scene_bounds().max.x >= 6.0);
}

#[test]
fn test_failed_load_keeps_session_alive() {
    let mut h = TestHarness::new();
    assert!(!h.open(Path::new("/nonexistent/thing.obj")));
    assert_eq!(h.take_notices().len(), 1);

    let dir = tempfile::tempdir().unwrap();
    let a = write_obj(dir.path(), "a.obj", 0.0);
    assert!(h.open(&a));
}

#[test]
fn test_reload_shows_new_content() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_obj(dir.path(), "a.obj", 0.0);

    let mut h = TestHarness::new();
    assert!(h.open(&a));
    let camera = h.camera();

    write_obj(dir.path(), "a.obj", 10.0);
    assert!(h.reload());
    assert_eq!(h.files(), vec![a]);
    assert!(h.session.viewer.scene_bounds().min.x >= 10.0);
    // Reload keeps the camera where the user left it
    assert_eq!(h.camera(), camera);
}

#[test]
fn test_superseded_reload_is_never_shown() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_obj(dir.path(), "a.obj", 0.0);
    let b = write_obj(dir.path(), "b.obj", 5.0);

    let (gate_tx, gate_rx) = mpsc::channel::<()>();
    let gate = Mutex::new(gate_rx);
    let first = AtomicBool::new(true);
    let loader: Loader = Arc::new(move |path: &Path| {
        if first.swap(false, Ordering::SeqCst) {
            gate.lock().unwrap().recv().unwrap();
        }
        load_model(path)
    });

    let mut h = TestHarness::new().with_reload_worker(ReloadWorker::with_loader(
        loader,
        Arc::new(|| {}),
    ));
    assert!(h.open(&a));

    // First reload blocks with only `a` in the scene
    h.session.request_reload();
    assert!(h.add(&b));
    h.session.request_reload();
    assert!(!h.session.poll_background());
    gate_tx.send(()).unwrap();

    assert!(h.session.finish_reload(std::time::Duration::from_secs(5)));
    assert_eq!(h.files(), vec![a, b]);
}

#[test]
fn test_open_discards_reload_of_previous_scene() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_obj(dir.path(), "a.obj", 0.0);
    let b = write_obj(dir.path(), "b.obj", 5.0);

    let (gate_tx, gate_rx) = mpsc::channel::<()>();
    let gate = Mutex::new(gate_rx);
    let loader: Loader = Arc::new(move |path: &Path| {
        gate.lock().unwrap().recv().unwrap();
        load_model(path)
    });

    let mut h = TestHarness::new().with_reload_worker(ReloadWorker::with_loader(
        loader,
        Arc::new(|| {}),
    ));
    assert!(h.open(&a));
    h.session.request_reload();

    // Opening another file while `a` is still parsing
    assert!(h.open(&b));
    assert_eq!(h.files(), vec![b.clone()]);
    gate_tx.send(()).unwrap();

    assert!(!h.session.finish_reload(std::time::Duration::from_secs(5)));
    assert_eq!(h.files(), vec![b]);
    assert!(h.session.viewer.scene_bounds().min.x >= 5.0);
}

#[test]
fn test_window_state_round_trip() {
    let mut h = TestHarness::new();
    h.set(SettingKey::SidebarShow, false);
    h.session.save_window_state(1024.0, 700.0);
    let state = h.session.window_state();
    assert!(!state.sidebar_show);
    assert_eq!(state.width, 1024.0);
}
