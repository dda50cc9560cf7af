//! Fan-out of classified events to application callbacks.

pub mod registry;
