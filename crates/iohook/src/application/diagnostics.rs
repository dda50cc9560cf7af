//! Non-fatal diagnostics reported by the [`HookController`].
//!
//! Misuse of the lifecycle API and panicking subscribers are never returned
//! as errors: the requested transition is skipped or the next callback runs.
//! They are reported here instead, so an application (or a test) can observe
//! them without parsing log output.
//!
//! [`HookController`]: super::controller::HookController

use std::sync::Mutex;

use iohook_core::CallbackFailure;
use tracing::{error, warn};

/// A single reportable condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// `start()` was called while the hook was already started.
    AlreadyStarted,
    /// `stop()` was called while the hook was not started.
    NotStarted,
    /// A subscriber panicked during dispatch.
    CallbackFailed(CallbackFailure),
    /// `start_with()` received a callback; it is held but never invoked.
    StartCallbackIgnored,
}

/// Sink for [`Diagnostic`]s.
///
/// Called from the engine's hook thread for `CallbackFailed`, so
/// implementations must return promptly and must not panic.
pub trait Diagnostics: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

/// Default sink: forwards every diagnostic to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn report(&self, diagnostic: Diagnostic) {
        match diagnostic {
            Diagnostic::AlreadyStarted => warn!("iohook has already started"),
            Diagnostic::NotStarted => warn!("iohook has not yet started"),
            Diagnostic::CallbackFailed(failure) => error!(
                category = %failure.category,
                index = failure.index,
                "event callback panicked: {}",
                failure.message
            ),
            Diagnostic::StartCallbackIgnored => {
                warn!("callback passed to start is not wired into dispatch; use on() instead")
            }
        }
    }
}

/// Sink that keeps every diagnostic in memory.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    entries: Mutex<Vec<Diagnostic>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything reported so far, oldest first.
    pub fn entries(&self) -> Vec<Diagnostic> {
        match self.entries.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of reported diagnostics equal to `diagnostic`.
    pub fn count(&self, diagnostic: &Diagnostic) -> usize {
        self.entries().iter().filter(|d| *d == diagnostic).count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn report(&self, diagnostic: Diagnostic) {
        let mut guard = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push(diagnostic);
    }
}
