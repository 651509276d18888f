//! Trace recorder: the append-only Frame log of one run.

use crate::world::World;
use rover_types::{Frame, Snapshot, Trace, Verdict};

/// Collects Frames in order.
///
/// Steps are numbered from 0 with no gaps. Once an error Frame has been
/// recorded the recorder is sealed and ignores further frames.
#[derive(Debug)]
pub struct TraceRecorder {
    initial: Snapshot,
    frames: Vec<Frame>,
    sealed: bool,
}

impl TraceRecorder {
    pub fn new(initial: Snapshot) -> Self {
        Self {
            initial,
            frames: Vec::new(),
            sealed: false,
        }
    }

    /// Snapshot `world` into a new Frame. Returns `None` when sealed.
    pub fn record(
        &mut self,
        world: &World,
        line_no: u32,
        log: Option<String>,
        error: Option<String>,
    ) -> Option<&Frame> {
        if self.sealed {
            tracing::warn!(line = line_no, "frame dropped after terminal error");
            return None;
        }
        self.sealed = error.is_some();
        let frame = Frame {
            step: self.frames.len() as u32,
            snapshot: world.snapshot(),
            log,
            line_no: Some(line_no),
            error,
        };
        tracing::trace!(step = frame.step, line = line_no, "frame");
        self.frames.push(frame);
        self.frames.last()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn finish(self, verdict: Verdict, output: String) -> Trace {
        Trace {
            initial: self.initial,
            frames: self.frames,
            output,
            verdict,
        }
    }
}
