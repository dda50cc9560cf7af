//! Infrastructure layer.
//!
//! Contains OS-facing adapters: native hook engines, configuration file
//! storage, and logging initialisation.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `iohook_core`, but MUST NOT be imported by `iohook_core`.

pub mod engine;
pub mod logging;
pub mod storage;
