//! Rover engine as a WASM module for browser lesson players.
//!
//! Exposes the run pipeline and a playback cursor via `wasm-bindgen`. The
//! page runs a program once, then drives a [`PlaybackHandle`] from its own
//! timer; nothing is re-executed during playback.
//!
//! # Usage (JavaScript)
//!
//! ```js
//! import init, { run, PlaybackHandle } from 'rover-wasm';
//!
//! await init();
//!
//! const result = JSON.parse(run(levelJson, "move_right(6)\n"));
//! // { success: true, trace: { initial: {...}, frames: [...], output: "", verdict: {...} } }
//!
//! const pb = new PlaybackHandle(levelJson, source);
//! pb.play();
//! setInterval(() => { if (pb.tick()) render(JSON.parse(pb.current_frame())); }, pb.speed_ms());
//! ```

use rover_engine::{RunConfig, RunResult};
use rover_playback::Playback;
use std::sync::Arc;
use std::time::Duration;
use wasm_bindgen::prelude::*;

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|e| failure_json(&format!("Serialization error: {e}")))
}

/// `{"success":false,"error":{"message":...}}` for failures that happen
/// outside the language, such as unreadable input.
fn failure_json(message: &str) -> String {
    serde_json::json!({
        "success": false,
        "error": { "message": message },
    })
    .to_string()
}

/// Run `source` on the level described by `level_json`.
///
/// Returns a JSON string containing a `RunResult`:
/// ```json
/// { "success": true, "trace": { "frames": [...], "verdict": {...} } }
/// ```
///
/// When the program cannot start (lex, parse or level error), `trace` is
/// absent and `error` holds the structured static error.
#[wasm_bindgen]
pub fn run(level_json: &str, source: &str) -> String {
    to_json(&rover_engine::run_to_result(level_json, source))
}

/// [`run`] with explicit limits, given as a JSON `RunConfig`. Missing fields
/// keep their defaults. An unreadable config runs nothing and returns
/// `{"success":false,"error":{"message":"invalid config: ..."}}`.
#[wasm_bindgen]
pub fn run_with_config(level_json: &str, source: &str, config_json: &str) -> String {
    match rover_engine::parse_config(config_json) {
        Ok(config) => to_json(&rover_engine::run_to_result_with(level_json, source, &config)),
        Err(e) => failure_json(&e.to_string()),
    }
}

/// Like [`run`], but takes the level as a JS object and returns a JS object.
#[wasm_bindgen]
pub fn run_value(level: JsValue, source: &str) -> Result<JsValue, JsValue> {
    let level: rover_types::Level = serde_wasm_bindgen::from_value(level)?;
    let result = match rover_engine::run_source(&level, source, &RunConfig::default()) {
        Ok(trace) => RunResult::from_trace(trace),
        Err(err) => RunResult::from_error(err),
    };
    Ok(serde_wasm_bindgen::to_value(&result)?)
}

/// Lex and parse without running. Returns `{"ok":true}` or
/// `{"ok":false,"error":{...}}`.
///
/// Suitable for live diagnostics while the learner types.
#[wasm_bindgen]
pub fn check(source: &str) -> String {
    match rover_engine::check_source(source) {
        Ok(_) => r#"{"ok":true}"#.to_string(),
        Err(err) => format!(r#"{{"ok":false,"error":{}}}"#, to_json(&err)),
    }
}

/// Return the engine version string.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

// ══════════════════════════════════════════════════════════════════════════════
// Playback
// ══════════════════════════════════════════════════════════════════════════════

/// A finished run plus a cursor over its frames.
#[wasm_bindgen]
pub struct PlaybackHandle {
    result: RunResult,
    playback: Option<Playback>,
}

#[wasm_bindgen]
impl PlaybackHandle {
    /// Run the program and wrap its trace. A static error leaves the handle
    /// without frames; [`PlaybackHandle::result`] carries the error.
    #[wasm_bindgen(constructor)]
    pub fn new(level_json: &str, source: &str) -> PlaybackHandle {
        let result = rover_engine::run_to_result(level_json, source);
        let playback = result
            .trace
            .clone()
            .map(|trace| Playback::new(Arc::new(trace)));
        PlaybackHandle { result, playback }
    }

    /// The full `RunResult` as JSON.
    pub fn result(&self) -> String {
        to_json(&self.result)
    }

    pub fn len(&self) -> usize {
        self.playback.as_ref().map_or(0, Playback::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn play(&mut self) {
        if let Some(pb) = &mut self.playback {
            pb.play();
        }
    }

    pub fn pause(&mut self) {
        if let Some(pb) = &mut self.playback {
            pb.pause();
        }
    }

    pub fn toggle(&mut self) {
        if let Some(pb) = &mut self.playback {
            pb.toggle();
        }
    }

    pub fn step_forward(&mut self) {
        if let Some(pb) = &mut self.playback {
            pb.step_forward();
        }
    }

    pub fn step_backward(&mut self) {
        if let Some(pb) = &mut self.playback {
            pb.step_backward();
        }
    }

    pub fn seek_to(&mut self, index: usize) {
        if let Some(pb) = &mut self.playback {
            pb.seek_to(index);
        }
    }

    pub fn reset(&mut self) {
        if let Some(pb) = &mut self.playback {
            pb.reset();
        }
    }

    pub fn set_speed(&mut self, speed_ms: u32) {
        if let Some(pb) = &mut self.playback {
            pb.set_speed(u64::from(speed_ms));
        }
    }

    pub fn speed_ms(&self) -> u32 {
        self.playback
            .as_ref()
            .map_or(rover_playback::DEFAULT_SPEED_MS, |pb| pb.state().speed_ms)
            .try_into()
            .unwrap_or(u32::MAX)
    }

    /// Advance one frame if playing. Returns whether the cursor moved.
    pub fn tick(&mut self) -> bool {
        self.playback.as_mut().is_some_and(Playback::tick)
    }

    /// Advance by elapsed wall-clock milliseconds. Returns frames advanced.
    pub fn advance_by(&mut self, elapsed_ms: f64) -> usize {
        let elapsed = Duration::try_from_secs_f64(elapsed_ms.max(0.0) / 1000.0).unwrap_or(Duration::MAX);
        self.playback
            .as_mut()
            .map_or(0, |pb| pb.advance_by(elapsed))
    }

    /// `PlaybackState` as JSON (`currentIndex`, `isPlaying`, `speedMs`).
    pub fn state(&self) -> String {
        match &self.playback {
            Some(pb) => to_json(&pb.state()),
            None => r#"{"currentIndex":0,"isPlaying":false,"speedMs":0}"#.to_string(),
        }
    }

    /// The current Frame as JSON, or `null` when there is none.
    pub fn current_frame(&self) -> String {
        let frame = self.playback.as_ref().and_then(Playback::current_frame);
        to_json(&frame)
    }
}
