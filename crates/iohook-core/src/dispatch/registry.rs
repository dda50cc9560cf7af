//! CallbackRegistry: per-category ordered callback lists.
//!
//! Each [`EventCategory`] owns a `Vec` of callbacks.  Insertion order is the
//! invocation order, duplicates are allowed, and there is no removal of a
//! single callback: the registry only grows via [`CallbackRegistry::subscribe`]
//! or empties completely via [`CallbackRegistry::clear_all`].
//!
//! # Panic isolation
//!
//! Callbacks run on the native engine's thread.  A panic unwinding out of a
//! callback would cross into that thread's hook procedure, so every
//! invocation is wrapped in [`std::panic::catch_unwind`].  A failing
//! callback is recorded in the returned [`DispatchReport`] and the remaining
//! callbacks still run.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::event::category::EventCategory;
use crate::event::record::RawEventRecord;

/// A subscriber.  The return value of the closure is never consulted.
pub type EventCallback = Arc<dyn Fn(&RawEventRecord) + Send + Sync>;

/// A callback that panicked during dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackFailure {
    pub category: EventCategory,
    /// Position of the callback within its category's list.
    pub index: usize,
    /// Panic payload rendered as text.
    pub message: String,
}

impl fmt::Display for CallbackFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} callback #{} panicked: {}",
            self.category, self.index, self.message
        )
    }
}

/// Outcome of one dispatch round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Number of callbacks invoked, failed ones included.
    pub invoked: usize,
    pub failures: Vec<CallbackFailure>,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Mapping from [`EventCategory`] to an ordered list of callbacks.
#[derive(Default, Clone)]
pub struct CallbackRegistry {
    callbacks: HashMap<EventCategory, Vec<EventCallback>>,
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut counts: Vec<(EventCategory, usize)> = self
            .callbacks
            .iter()
            .map(|(category, list)| (*category, list.len()))
            .collect();
        counts.sort();
        f.debug_struct("CallbackRegistry")
            .field("callbacks", &counts)
            .finish()
    }
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `callback` to `category`'s list.
    pub fn subscribe(&mut self, category: EventCategory, callback: EventCallback) {
        self.callbacks.entry(category).or_default().push(callback);
    }

    /// Invokes every callback subscribed to `category`, in registration order.
    ///
    /// A category with no list is a no-op and yields an empty report.
    pub fn dispatch_to(&self, category: EventCategory, record: &RawEventRecord) -> DispatchReport {
        match self.callbacks.get(&category) {
            Some(list) => invoke_all(category, list, record),
            None => DispatchReport::default(),
        }
    }

    /// Drops every subscription in every category.
    pub fn clear_all(&mut self) {
        self.callbacks.clear();
    }

    /// Cloned handles to `category`'s callbacks, in registration order.
    ///
    /// Lets a caller release its lock on the registry before invoking them.
    pub fn snapshot(&self, category: EventCategory) -> Vec<EventCallback> {
        self.callbacks.get(&category).cloned().unwrap_or_default()
    }

    /// Number of callbacks subscribed to `category`.
    pub fn len(&self, category: EventCategory) -> usize {
        self.callbacks.get(&category).map_or(0, Vec::len)
    }

    /// Number of callbacks across all categories.
    pub fn total(&self) -> usize {
        self.callbacks.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Invokes `callbacks` in order with `record`, isolating panics per callback.
pub fn invoke_all(
    category: EventCategory,
    callbacks: &[EventCallback],
    record: &RawEventRecord,
) -> DispatchReport {
    let mut report = DispatchReport::default();
    for (index, callback) in callbacks.iter().enumerate() {
        report.invoked += 1;
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback(record))) {
            report.failures.push(CallbackFailure {
                category,
                index,
                message: panic_message(payload.as_ref()),
            });
        }
    }
    report
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
