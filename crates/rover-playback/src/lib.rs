//! Playback controller over a finished [`Trace`].
//!
//! Playback never re-runs the program: it only moves a cursor over the
//! recorded Frames. Every operation is O(1). The host drives timing, either
//! by calling [`Playback::tick`] from its own timer every `speed_ms`, or by
//! feeding elapsed time to [`Playback::advance_by`].

use rover_types::{Frame, Trace};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Default interval between frames.
pub const DEFAULT_SPEED_MS: u64 = 500;
/// Fastest accepted interval.
pub const MIN_SPEED_MS: u64 = 1;

/// Playback settings. Missing JSON fields take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub speed_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            speed_ms: DEFAULT_SPEED_MS,
        }
    }
}

/// Observable cursor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub current_index: usize,
    pub is_playing: bool,
    pub speed_ms: u64,
}

/// A cursor over a shared, immutable Trace.
#[derive(Debug, Clone)]
pub struct Playback {
    trace: Arc<Trace>,
    state: PlaybackState,
    /// Elapsed time not yet converted into frames by `advance_by`.
    pending: Duration,
}

impl Playback {
    pub fn new(trace: Arc<Trace>) -> Self {
        Self::with_config(trace, PlaybackConfig::default())
    }

    pub fn with_config(trace: Arc<Trace>, config: PlaybackConfig) -> Self {
        Self {
            trace,
            state: PlaybackState {
                current_index: 0,
                is_playing: false,
                speed_ms: config.speed_ms.max(MIN_SPEED_MS),
            },
            pending: Duration::ZERO,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn trace(&self) -> &Arc<Trace> {
        &self.trace
    }

    pub fn len(&self) -> usize {
        self.trace.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trace.is_empty()
    }

    /// `None` for an empty trace.
    pub fn current_frame(&self) -> Option<&Frame> {
        self.trace.get(self.state.current_index)
    }

    /// Index of the final frame; 0 for an empty trace.
    fn last_index(&self) -> usize {
        self.trace.len().saturating_sub(1)
    }

    pub fn is_at_end(&self) -> bool {
        self.state.current_index >= self.last_index()
    }

    // ── Transport ─────────────────────────────────────────────────────────

    /// Start playing. From the last frame, rewinds to the first.
    pub fn play(&mut self) {
        if self.is_empty() {
            return;
        }
        if self.is_at_end() {
            self.state.current_index = 0;
        }
        self.state.is_playing = true;
        self.pending = Duration::ZERO;
        tracing::trace!(index = self.state.current_index, "play");
    }

    pub fn pause(&mut self) {
        self.state.is_playing = false;
        self.pending = Duration::ZERO;
    }

    pub fn toggle(&mut self) {
        if self.state.is_playing {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn step_forward(&mut self) {
        self.pause();
        self.state.current_index = (self.state.current_index + 1).min(self.last_index());
    }

    pub fn step_backward(&mut self) {
        self.pause();
        self.state.current_index = self.state.current_index.saturating_sub(1);
    }

    /// Jump to `index`, clamped to the last frame.
    pub fn seek_to(&mut self, index: usize) {
        self.pause();
        self.state.current_index = index.min(self.last_index());
        tracing::trace!(index = self.state.current_index, "seek");
    }

    pub fn reset(&mut self) {
        self.pause();
        self.state.current_index = 0;
    }

    pub fn set_speed(&mut self, speed_ms: u64) {
        self.state.speed_ms = speed_ms.max(MIN_SPEED_MS);
    }

    // ── Timing ────────────────────────────────────────────────────────────

    /// One timer tick: advance a frame while playing. Playback stops on
    /// reaching the last frame. Returns whether the cursor moved.
    pub fn tick(&mut self) -> bool {
        self.advance_frames(1) == 1
    }

    /// Advance by however many whole intervals fit in the accumulated
    /// elapsed time. Returns the number of frames advanced.
    pub fn advance_by(&mut self, elapsed: Duration) -> usize {
        if !self.state.is_playing {
            return 0;
        }
        let interval = Duration::from_millis(self.state.speed_ms);
        self.pending += elapsed;
        let whole = self.pending.as_nanos() / interval.as_nanos();
        self.pending -= interval * u32::try_from(whole).unwrap_or(u32::MAX);
        self.advance_frames(usize::try_from(whole).unwrap_or(usize::MAX))
    }

    fn advance_frames(&mut self, n: usize) -> usize {
        if !self.state.is_playing {
            return 0;
        }
        let remaining = self.last_index() - self.state.current_index.min(self.last_index());
        let moved = n.min(remaining);
        self.state.current_index += moved;
        if self.is_at_end() {
            self.pause();
            tracing::trace!(index = self.state.current_index, "playback finished");
        }
        moved
    }
}
