use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use strata_core::{ModuleName, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceKind {
    StageStarted,
    StageCompleted,
    StageFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEvent {
    /// Global order across all modules.
    pub seq: u64,
    pub module: ModuleName,
    pub stage: Stage,
    pub kind: TraceKind,
}

/// Records when each module starts and finishes each stage.
///
/// Shared by every worker during a round.
#[derive(Debug, Default)]
pub struct OrderingTrace {
    next: AtomicU64,
    events: Mutex<Vec<TraceEvent>>,
}

impl OrderingTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, module: &ModuleName, stage: Stage, kind: TraceKind) {
        let mut events = self.events.lock();
        // Taken under the lock so `seq` order matches push order.
        let seq = self.next.fetch_add(1, Ordering::Relaxed);
        events.push(TraceEvent {
            seq,
            module: module.clone(),
            stage,
            kind,
        });
    }

    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().clone()
    }

    /// Sequence number of the first matching event.
    pub fn position(&self, module: &ModuleName, stage: Stage, kind: TraceKind) -> Option<u64> {
        self.events
            .lock()
            .iter()
            .find(|e| &e.module == module && e.stage == stage && e.kind == kind)
            .map(|e| e.seq)
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_follow_recording_order() {
        let trace = OrderingTrace::new();
        let m = ModuleName::from("m");
        trace.record(&m, Stage::Lex, TraceKind::StageStarted);
        trace.record(&m, Stage::Lex, TraceKind::StageCompleted);
        assert_eq!(trace.position(&m, Stage::Lex, TraceKind::StageStarted), Some(0));
        assert_eq!(trace.position(&m, Stage::Lex, TraceKind::StageCompleted), Some(1));
        assert_eq!(trace.position(&m, Stage::Parse, TraceKind::StageStarted), None);
    }
}
