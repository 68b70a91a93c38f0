//! Leveled, positioned diagnostic records and the sinks that accept them.
//!
//! Stage failures are reported through a [`LogSink`] rather than by aborting,
//! so one module failing a stage does not stop unrelated modules.
//!
//! # Examples
//!
//! ```
//! use strata_core::{Diagnostic, Diagnostics, Level, LogSink, Span};
//!
//! let sink = Diagnostics::new();
//! sink.log(Diagnostic::new(Level::Error, "undefined name `x`").at(Span::new(3, 5, 1)));
//! assert_eq!(sink.error_count(), 1);
//! ```

use std::fmt;

use parking_lot::Mutex;

use crate::{ModuleName, Span};

/// Severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    Fine,
    Info,
    Warn,
    Error,
    /// Aborts the build.
    Fatal,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Fine => "fine",
            Level::Info => "info",
            Level::Warn => "warning",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }

    pub fn is_error(self) -> bool {
        self >= Level::Error
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single diagnostic message.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    /// The module the diagnostic is about, if any.
    pub module: Option<ModuleName>,
    pub span: Span,
}

impl Diagnostic {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            module: None,
            span: Span::UNKNOWN,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Level::Error, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(Level::Warn, message)
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn in_module(mut self, module: ModuleName) -> Self {
        self.module = Some(module);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(module) = &self.module {
            write!(f, "{module}:")?;
        }
        write!(f, "{}: {}: {}", self.span, self.level, self.message)
    }
}

/// Accepts diagnostic records. Shared between module pipelines.
pub trait LogSink: Send + Sync {
    fn log(&self, diagnostic: Diagnostic);

    /// Whether anything at [`Level::Fatal`] has been logged.
    fn has_fatal(&self) -> bool;
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogSink;

impl LogSink for NullLogSink {
    fn log(&self, _diagnostic: Diagnostic) {}

    fn has_fatal(&self) -> bool {
        false
    }
}

/// Forwards every record to `tracing`.
#[derive(Debug, Default)]
pub struct TracingLogSink {
    fatal: std::sync::atomic::AtomicBool,
}

impl TracingLogSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LogSink for TracingLogSink {
    fn log(&self, diagnostic: Diagnostic) {
        let module = diagnostic
            .module
            .as_ref()
            .map(ModuleName::as_str)
            .unwrap_or("-");
        let span = diagnostic.span;
        let message = diagnostic.message.as_str();
        match diagnostic.level {
            Level::Fine => tracing::trace!(module, %span, "{message}"),
            Level::Info => tracing::info!(module, %span, "{message}"),
            Level::Warn => tracing::warn!(module, %span, "{message}"),
            Level::Error => tracing::error!(module, %span, "{message}"),
            Level::Fatal => {
                self.fatal.store(true, std::sync::atomic::Ordering::Release);
                tracing::error!(module, %span, fatal = true, "{message}")
            }
        }
    }

    fn has_fatal(&self) -> bool {
        self.fatal.load(std::sync::atomic::Ordering::Acquire)
    }
}

/// Thread-safe collector of diagnostics.
#[derive(Debug, Default)]
pub struct Diagnostics {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything logged so far, in logging order.
    pub fn all(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().clone()
    }

    pub fn errors(&self) -> Vec<Diagnostic> {
        self.filtered(|d| d.level.is_error())
    }

    pub fn warnings(&self) -> Vec<Diagnostic> {
        self.filtered(|d| d.level == Level::Warn)
    }

    /// Diagnostics about one module.
    pub fn for_module(&self, module: &ModuleName) -> Vec<Diagnostic> {
        self.filtered(|d| d.module.as_ref() == Some(module))
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .lock()
            .iter()
            .filter(|d| d.level.is_error())
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.lock().len()
    }

    pub fn clear(&self) {
        self.diagnostics.lock().clear();
    }

    fn filtered(&self, keep: impl Fn(&Diagnostic) -> bool) -> Vec<Diagnostic> {
        self.diagnostics
            .lock()
            .iter()
            .filter(|d| keep(d))
            .cloned()
            .collect()
    }
}

impl LogSink for Diagnostics {
    fn log(&self, diagnostic: Diagnostic) {
        self.diagnostics.lock().push(diagnostic);
    }

    fn has_fatal(&self) -> bool {
        self.diagnostics
            .lock()
            .iter()
            .any(|d| d.level == Level::Fatal)
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for diagnostic in self.diagnostics.lock().iter() {
            writeln!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}
