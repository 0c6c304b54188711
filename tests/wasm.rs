#![cfg(target_arch = "wasm32")]

use runebound_core::{default_config, validate_config, RuneEngine};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

#[wasm_bindgen_test]
fn engine_boots_and_reports_playing() {
    let mut engine = RuneEngine::new(None, Some(7)).expect("engine should build");
    assert_eq!(engine.state(), "initializing");

    assert!(engine.tick(0.016));
    assert_eq!(engine.state(), "playing");

    let snapshot = engine.snapshot_json().expect("snapshot json");
    assert!(snapshot.contains("\"runes\""));
    engine.mark_clean();
    assert!(!engine.is_dirty());
}

#[wasm_bindgen_test]
fn bad_config_json_is_rejected() {
    assert!(RuneEngine::new(Some("{\"rows\": 0}".into()), Some(1)).is_err());
    assert!(RuneEngine::new(Some("not json".into()), Some(1)).is_err());
}

#[wasm_bindgen_test]
fn default_config_round_trips_through_validation() {
    let config = default_config(Some("compact".into())).expect("preset config");
    assert!(validate_config(config).is_ok());
    assert!(validate_config(JsValue::from_str("nope")).is_err());
}

#[wasm_bindgen_test]
fn pointer_outside_board_is_ignored() {
    let mut engine = RuneEngine::new(None, Some(3)).expect("engine should build");
    engine.tick(0.0);
    assert!(engine.set_viewport(720.0, 1280.0));
    assert!(!engine.pointer_down(1, -5.0, -5.0));
    engine.pointer_cancel(1);

    let events = engine.drain_events_json().expect("events json");
    assert!(events.contains("BoardFilled"));
    let hint = engine.hint_json(Some("greedy".into())).expect("hint json");
    assert!(!hint.is_empty());
}
