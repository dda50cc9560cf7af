//! Event vocabulary shared by engines, the registry, and applications.
//!
//! The native engine speaks in numeric type codes; applications speak in
//! [`category::EventCategory`] values.  [`classify::classify`] is the only
//! bridge between the two.

pub mod category;
pub mod classify;
pub mod record;
