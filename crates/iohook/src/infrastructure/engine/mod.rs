//! Native hook engines.
//!
//! An engine installs a process-wide keyboard and mouse hook and calls the
//! [`EventSink`] it was started with once per captured event, from its own
//! thread.  The controller never cares which engine it drives:
//!
//! - [`simulated::SimulatedEngine`] delivers records injected by the caller;
//!   used by tests and by applications replaying input.
//! - `windows::WindowsHookEngine` installs `WH_KEYBOARD_LL`/`WH_MOUSE_LL`
//!   hooks on a dedicated Win32 message-loop thread.
//!
//! # Sink contract
//!
//! The sink receives `Some(&record)` for every event and `None` when the
//! engine has nothing to deliver for a wake-up.  The record is borrowed for
//! the duration of the call only.

use std::sync::Arc;

use iohook_core::RawEventRecord;
use thiserror::Error;

use super::storage::config::EngineConfig;

#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
pub(crate) mod input_state;
pub mod simulated;

#[cfg(target_os = "windows")]
pub mod windows;

/// The dispatch entry point handed to an engine at start time.
pub type EventSink = Arc<dyn Fn(Option<&RawEventRecord>) + Send + Sync>;

/// Error type for engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to install keyboard hook: {0}")]
    KeyboardHookInstallFailed(String),
    #[error("failed to install mouse hook: {0}")]
    MouseHookInstallFailed(String),
    #[error("failed to spawn hook thread: {0}")]
    ThreadSpawnFailed(String),
    #[error("a native hook is already installed in this process")]
    AlreadyInstalled,
    #[error("platform not supported: {0}")]
    UnsupportedPlatform(String),
}

/// Engine health as reported by [`NativeEngine::status`].
///
/// Passed through the controller without interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStatus {
    /// `true` while a hook is installed and delivering.
    pub running: bool,
    /// Short backend identifier, e.g. `"windows-ll"` or `"simulated"`.
    pub backend: &'static str,
}

/// Trait abstracting the OS-level input hook.
#[cfg_attr(test, mockall::automock)]
pub trait NativeEngine: Send + Sync {
    /// Installs the hook and begins delivering events to `sink`.
    fn start_hook(&self, sink: EventSink) -> Result<(), EngineError>;
    /// Uninstalls the hook.  No sink invocations happen after this returns.
    fn stop_hook(&self);
    /// Reports engine state.
    fn status(&self) -> EngineStatus;
}

/// Returns the native engine for the current OS with default settings.
///
/// # Errors
///
/// Returns [`EngineError::UnsupportedPlatform`] where no native hook exists.
pub fn platform_engine() -> Result<Arc<dyn NativeEngine>, EngineError> {
    platform_engine_with(&EngineConfig::default())
}

/// Returns the native engine for the current OS configured from `config`.
///
/// # Errors
///
/// Returns [`EngineError::UnsupportedPlatform`] where no native hook exists.
pub fn platform_engine_with(config: &EngineConfig) -> Result<Arc<dyn NativeEngine>, EngineError> {
    #[cfg(target_os = "windows")]
    {
        Ok(Arc::new(windows::WindowsHookEngine::with_config(config)))
    }

    #[cfg(not(target_os = "windows"))]
    {
        let _ = config;
        Err(EngineError::UnsupportedPlatform(
            std::env::consts::OS.to_string(),
        ))
    }
}
