//! # iohook-core
//!
//! Shared library for iohook containing the event vocabulary, the raw record
//! format produced by native hook engines, the type-code classifier, and the
//! callback registry that fans events out to subscribers.
//!
//! This crate has zero dependencies on OS APIs or threads of its own.  Native
//! engines and the lifecycle controller live in the `iohook` crate.
//!
//! # Architecture overview
//!
//! A native engine intercepts global keyboard and mouse input and hands every
//! event over as a [`RawEventRecord`] carrying a numeric type code.  The
//! record flows through two pieces defined here:
//!
//! - **`event`** – The closed [`EventCategory`] enum, the record and payload
//!   types, and [`classify`], which turns a raw type code into a category
//!   exactly once at the edge.
//!
//! - **`dispatch`** – The [`CallbackRegistry`]: per-category ordered lists of
//!   callbacks, invoked synchronously in registration order with per-callback
//!   panic isolation.

pub mod dispatch;
pub mod event;

pub use dispatch::registry::{
    CallbackFailure, CallbackRegistry, DispatchReport, EventCallback,
};
pub use event::category::{EventCategory, ParseCategoryError};
pub use event::classify::classify;
pub use event::record::{EventPayload, RawEventRecord};
