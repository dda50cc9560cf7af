//! Application layer: the subscription and lifecycle API.
//!
//! Code here depends on the [`NativeEngine`](crate::infrastructure::engine::NativeEngine)
//! and [`Diagnostics`](diagnostics::Diagnostics) traits, never on a concrete
//! OS hook, so every state transition is unit-testable with an in-process
//! engine.
//!
//! - **`controller`** – [`controller::HookController`]: start/stop state
//!   machine, the pause/resume gate, and the dispatch entry point handed to
//!   the engine.
//! - **`diagnostics`** – The non-fatal reporting channel for misuse and
//!   callback failures.
//! - **`stream`** – An async adapter that turns one category's events into a
//!   `tokio` channel.

pub mod controller;
pub mod diagnostics;
pub mod stream;
