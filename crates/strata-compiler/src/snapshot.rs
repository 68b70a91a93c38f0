//! Tree snapshots around interpretive stages.
//!
//! Payloads are rendered lazily: a disabled sink never pays for formatting
//! the tree.

use std::fmt;

use parking_lot::Mutex;
use strata_core::{ModuleName, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SnapshotPhase {
    Before,
    After,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SnapshotKey {
    pub module: ModuleName,
    pub stage: Stage,
    pub phase: SnapshotPhase,
}

impl SnapshotKey {
    pub fn new(module: ModuleName, stage: Stage, phase: SnapshotPhase) -> Self {
        Self {
            module,
            stage,
            phase,
        }
    }
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self.phase {
            SnapshotPhase::Before => "before",
            SnapshotPhase::After => "after",
        };
        write!(f, "{}/{}/{phase}", self.module, self.stage.abbrev())
    }
}

pub trait SnapshotSink: Send + Sync {
    /// Whether `record` would keep anything.
    fn enabled(&self) -> bool;

    fn record(&self, key: SnapshotKey, render: &dyn Fn() -> String);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSnapshotSink;

impl SnapshotSink for NoopSnapshotSink {
    fn enabled(&self) -> bool {
        false
    }

    fn record(&self, _key: SnapshotKey, _render: &dyn Fn() -> String) {}
}

/// Keeps every snapshot in arrival order.
#[derive(Debug, Default)]
pub struct RecordingSnapshotSink {
    entries: Mutex<Vec<(SnapshotKey, String)>>,
}

impl RecordingSnapshotSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(SnapshotKey, String)> {
        self.entries.lock().clone()
    }

    pub fn get(&self, key: &SnapshotKey) -> Option<String> {
        self.entries
            .lock()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, payload)| payload.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SnapshotSink for RecordingSnapshotSink {
    fn enabled(&self) -> bool {
        true
    }

    fn record(&self, key: SnapshotKey, render: &dyn Fn() -> String) {
        let payload = render();
        self.entries.lock().push((key, payload));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn noop_never_renders() {
        let rendered = Cell::new(false);
        let key = SnapshotKey::new(ModuleName::from("m"), Stage::Export, SnapshotPhase::Before);
        NoopSnapshotSink.record(key, &|| {
            rendered.set(true);
            String::new()
        });
        assert!(!rendered.get());
    }

    #[test]
    fn recording_keeps_order() {
        let sink = RecordingSnapshotSink::new();
        let before = SnapshotKey::new(ModuleName::from("m"), Stage::Run, SnapshotPhase::Before);
        let after = SnapshotKey::new(ModuleName::from("m"), Stage::Run, SnapshotPhase::After);
        sink.record(before.clone(), &|| "(block)".to_string());
        sink.record(after.clone(), &|| "(block 1)".to_string());
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.get(&after).as_deref(), Some("(block 1)"));
        assert_eq!(before.to_string(), "m/R/before");
    }
}
