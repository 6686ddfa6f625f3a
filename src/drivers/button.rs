//! Settle-and-resample button debouncer.
//!
//! ## Hardware
//!
//! Active-low momentary switch with external pull-up, shared with the
//! latch flip-flop's SET net.  The line is sampled every poll tick; no
//! edge interrupt is involved.
//!
//! ## Debounce policy
//!
//! On detecting a raw level transition, the debouncer holds the previous
//! accepted level for a fixed settle interval and re-samples.  The new
//! level is accepted only if it is still present after the interval;
//! a flicker shorter than the interval never changes the accepted level.

use crate::fsm::context::LineState;

/// A raw level change waiting out its settle interval.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    level: LineState,
    since_ms: u32,
}

/// Poll-driven debouncer for one digital line.
///
/// Pure state — no hardware access.  The caller samples the raw level
/// (via [`InputPort`](crate::app::ports::InputPort)) and feeds it in
/// together with the current monotonic time.
pub struct Debouncer {
    settle_ms: u32,
    accepted: LineState,
    candidate: Option<Candidate>,
}

impl Debouncer {
    /// `initial` is the level assumed before the first sample.
    pub fn new(settle_ms: u32, initial: LineState) -> Self {
        Self {
            settle_ms,
            accepted: initial,
            candidate: None,
        }
    }

    /// Feed one raw sample; returns the accepted (debounced) level.
    pub fn sample(&mut self, now_ms: u32, raw: LineState) -> LineState {
        if raw == self.accepted {
            // Line returned to the accepted level — any pending
            // transition was noise.
            self.candidate = None;
            return self.accepted;
        }

        match self.candidate {
            None => {
                self.candidate = Some(Candidate {
                    level: raw,
                    since_ms: now_ms,
                });
            }
            Some(c) if c.level != raw => {
                // Still bouncing between levels — restart the clock.
                self.candidate = Some(Candidate {
                    level: raw,
                    since_ms: now_ms,
                });
            }
            Some(c) => {
                if now_ms.wrapping_sub(c.since_ms) >= self.settle_ms {
                    self.accepted = raw;
                    self.candidate = None;
                }
            }
        }

        self.accepted
    }

    /// The currently accepted level.
    pub fn level(&self) -> LineState {
        self.accepted
    }
}
