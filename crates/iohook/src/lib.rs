//! iohook library entry point.
//!
//! Subscribe to global keyboard and mouse events and control when the
//! underlying OS hook is engaged:
//!
//! ```no_run
//! use iohook::{platform_engine, EventCategory, HookController};
//!
//! let engine = platform_engine().expect("no native hook on this platform");
//! let mut hook = HookController::new(engine);
//! hook.on(EventCategory::KeyDown, |event| println!("key down: {:?}", event.keycode()));
//! hook.start().expect("hook installation failed");
//! ```
//!
//! Applications that want file-driven settings load them first:
//!
//! ```no_run
//! use iohook::{init_logging, load_config, platform_engine_with, HookController};
//!
//! let config = load_config().unwrap_or_default();
//! init_logging(&config.logging);
//! let hook = HookController::new(platform_engine_with(&config.engine).expect("native hook"));
//! # drop(hook);
//! ```
//!
//! The event vocabulary and callback registry come from `iohook-core` and
//! are re-exported here.

pub mod application;
pub mod infrastructure;

pub use application::controller::{DispatchStats, HookController};
pub use application::diagnostics::{
    Diagnostic, Diagnostics, RecordingDiagnostics, TracingDiagnostics,
};
pub use application::stream::EventStream;
pub use infrastructure::engine::{
    platform_engine, platform_engine_with, simulated::SimulatedEngine, EngineError, EngineStatus,
    EventSink, NativeEngine,
};
pub use infrastructure::logging::init_logging;
pub use infrastructure::storage::config::{load_config, ConfigError, HookConfig};
pub use iohook_core::{
    classify, CallbackFailure, EventCategory, EventPayload, ParseCategoryError, RawEventRecord,
};
