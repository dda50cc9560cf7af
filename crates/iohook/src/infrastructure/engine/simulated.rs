//! In-process engine that delivers caller-supplied records.
//!
//! Allows tests (and applications replaying recorded input) to drive the
//! full dispatch path without installing an OS hook.  Delivery happens
//! synchronously on the calling thread.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use iohook_core::RawEventRecord;

use super::{EngineError, EngineStatus, EventSink, NativeEngine};

/// A [`NativeEngine`] driven by [`SimulatedEngine::emit`].
#[derive(Default)]
pub struct SimulatedEngine {
    sink: Mutex<Option<EventSink>>,
    installs: AtomicUsize,
    uninstalls: AtomicUsize,
    fail_next_start: AtomicBool,
}

impl SimulatedEngine {
    /// Creates a new, idle engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new engine already wrapped for sharing with a controller.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Delivers `record` to the installed sink, as if captured from hardware.
    ///
    /// Returns `false` (and delivers nothing) when no hook is installed.
    pub fn emit(&self, record: RawEventRecord) -> bool {
        self.deliver(Some(&record))
    }

    /// Delivers the "no message" sentinel to the installed sink.
    pub fn emit_none(&self) -> bool {
        self.deliver(None)
    }

    /// Makes the next [`NativeEngine::start_hook`] call fail.
    pub fn fail_next_start(&self) {
        self.fail_next_start.store(true, Ordering::SeqCst);
    }

    /// Number of successful hook installations so far.
    pub fn install_count(&self) -> usize {
        self.installs.load(Ordering::SeqCst)
    }

    /// Number of hook removals so far.
    pub fn uninstall_count(&self) -> usize {
        self.uninstalls.load(Ordering::SeqCst)
    }

    pub fn is_installed(&self) -> bool {
        self.slot().is_some()
    }

    fn deliver(&self, record: Option<&RawEventRecord>) -> bool {
        // Clone the sink out so the lock is not held while callbacks run.
        let sink = self.slot().clone();
        match sink {
            Some(sink) => {
                sink(record);
                true
            }
            None => false,
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<EventSink>> {
        match self.sink.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl NativeEngine for SimulatedEngine {
    fn start_hook(&self, sink: EventSink) -> Result<(), EngineError> {
        if self.fail_next_start.swap(false, Ordering::SeqCst) {
            return Err(EngineError::KeyboardHookInstallFailed(
                "simulated install failure".to_string(),
            ));
        }
        let mut slot = self.slot();
        if slot.is_some() {
            return Err(EngineError::AlreadyInstalled);
        }
        *slot = Some(sink);
        self.installs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop_hook(&self) {
        if self.slot().take().is_some() {
            self.uninstalls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn status(&self) -> EngineStatus {
        EngineStatus {
            running: self.is_installed(),
            backend: "simulated",
        }
    }
}
