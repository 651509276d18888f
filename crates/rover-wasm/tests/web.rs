//! Browser-side tests for the JS object interface. Run with
//! `wasm-pack test --headless --firefox crates/rover-wasm`.

#![cfg(target_arch = "wasm32")]

use rover_engine::RunResult;
use rover_types::Level;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn run_value_accepts_level_object() {
    let level = Level::open(1, 3).with_target(2, 0);
    let level = serde_wasm_bindgen::to_value(&level).unwrap();
    let result = rover_wasm::run_value(level, "move_right(2)\n").unwrap();
    let result: RunResult = serde_wasm_bindgen::from_value(result).unwrap();
    assert!(result.success);
    assert_eq!(result.trace.unwrap().len(), 2);
}

#[wasm_bindgen_test]
fn run_value_reports_static_error() {
    let level = serde_wasm_bindgen::to_value(&Level::open(1, 1)).unwrap();
    let result = rover_wasm::run_value(level, "speak('x)\n").unwrap();
    let result: RunResult = serde_wasm_bindgen::from_value(result).unwrap();
    assert!(!result.success);
    assert!(result.error.is_some());
}

#[wasm_bindgen_test]
fn version_matches_crate() {
    assert_eq!(rover_wasm::version(), env!("CARGO_PKG_VERSION"));
}
