use std::sync::atomic::{AtomicUsize, Ordering};

use strata_core::{Diagnostic, LogSink, ModuleName};

/// Stamps diagnostics with the module they are about and counts its errors.
///
/// A stage fails exactly when it logged an error through this sink.
pub struct ModuleLog<'a> {
    module: ModuleName,
    inner: &'a dyn LogSink,
    errors: AtomicUsize,
}

impl<'a> ModuleLog<'a> {
    pub fn new(module: ModuleName, inner: &'a dyn LogSink) -> Self {
        Self {
            module,
            inner,
            errors: AtomicUsize::new(0),
        }
    }

    pub fn module(&self) -> &ModuleName {
        &self.module
    }

    pub fn error_count(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }
}

impl LogSink for ModuleLog<'_> {
    fn log(&self, mut diagnostic: Diagnostic) {
        if diagnostic.level.is_error() {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
        if diagnostic.module.is_none() {
            diagnostic.module = Some(self.module.clone());
        }
        self.inner.log(diagnostic);
    }

    fn has_fatal(&self) -> bool {
        self.inner.has_fatal()
    }
}
