//! Runtime diagnostics: the state-transition ring log.
//!
//! Keeps the last [`TRANSITION_SLOTS`] FSM transitions in a fixed-capacity
//! ring so a field engineer can ask "what did the monitor do before the
//! rail dropped?" over the console (`d` command).  RAM only — nothing is
//! persisted, since the next event after the interesting one is usually
//! the supply being cut.

use heapless::Deque;

use crate::fsm::StateId;

/// Ring capacity.  Sixteen transitions cover several tap/hold cycles.
pub const TRANSITION_SLOTS: usize = 16;

/// One recorded FSM transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRecord {
    /// Monotonic time of the transition (milliseconds since boot).
    pub at_ms: u32,
    pub from: StateId,
    pub to: StateId,
}

/// Fixed-capacity transition history.  Oldest entries are evicted first.
#[derive(Default)]
pub struct TransitionLog {
    entries: Deque<TransitionRecord, TRANSITION_SLOTS>,
}

impl TransitionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transition, evicting the oldest entry when full.
    pub fn record(&mut self, at_ms: u32, from: StateId, to: StateId) {
        if self.entries.is_full() {
            let _ = self.entries.pop_front();
        }
        // Cannot fail: a slot was just freed if the ring was full.
        let _ = self.entries.push_back(TransitionRecord { at_ms, from, to });
    }

    /// Oldest-first iteration.
    pub fn iter(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order() {
        let mut log = TransitionLog::new();
        log.record(10, StateId::Booting, StateId::ConfirmingPowerOn);
        log.record(520, StateId::ConfirmingPowerOn, StateId::Running);
        assert_eq!(log.len(), 2);
        let first = log.iter().next().unwrap();
        assert_eq!(first.at_ms, 10);
        assert_eq!(first.to, StateId::ConfirmingPowerOn);
    }

    #[test]
    fn full_ring_evicts_oldest() {
        let mut log = TransitionLog::new();
        for i in 0..TRANSITION_SLOTS as u32 + 4 {
            log.record(i, StateId::Running, StateId::Running);
        }
        assert_eq!(log.len(), TRANSITION_SLOTS);
        let oldest = log.iter().next().unwrap();
        assert_eq!(oldest.at_ms, 4, "first four entries must be evicted");
    }
}
