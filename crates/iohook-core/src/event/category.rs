//! The closed set of event categories applications can subscribe to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Semantic kind of a global input event.
///
/// The lowercase names (`"keydown"`, `"mousewheel"`, ...) are the canonical
/// string form used by [`fmt::Display`], [`FromStr`], and serde.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    /// A key produced a character (emitted after the matching key-down).
    KeyPress,
    KeyDown,
    KeyUp,
    /// A button was pressed and released without dragging in between.
    MouseClick,
    MouseDown,
    MouseUp,
    MouseMove,
    /// The cursor moved while at least one button was held.
    MouseDrag,
    MouseWheel,
}

/// Error returned when a string does not name an [`EventCategory`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown event category: {0:?}")]
pub struct ParseCategoryError(pub String);

impl EventCategory {
    /// Every category, in type-code order.
    pub const ALL: [EventCategory; 9] = [
        EventCategory::KeyPress,
        EventCategory::KeyDown,
        EventCategory::KeyUp,
        EventCategory::MouseClick,
        EventCategory::MouseDown,
        EventCategory::MouseUp,
        EventCategory::MouseMove,
        EventCategory::MouseDrag,
        EventCategory::MouseWheel,
    ];

    /// Returns the canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            EventCategory::KeyPress => "keypress",
            EventCategory::KeyDown => "keydown",
            EventCategory::KeyUp => "keyup",
            EventCategory::MouseClick => "mouseclick",
            EventCategory::MouseDown => "mousedown",
            EventCategory::MouseUp => "mouseup",
            EventCategory::MouseMove => "mousemove",
            EventCategory::MouseDrag => "mousedrag",
            EventCategory::MouseWheel => "mousewheel",
        }
    }

    /// Returns the raw type code the native engine uses for this category.
    ///
    /// Inverse of [`crate::classify`].
    pub fn type_code(self) -> u16 {
        match self {
            EventCategory::KeyPress => 3,
            EventCategory::KeyDown => 4,
            EventCategory::KeyUp => 5,
            EventCategory::MouseClick => 6,
            EventCategory::MouseDown => 7,
            EventCategory::MouseUp => 8,
            EventCategory::MouseMove => 9,
            EventCategory::MouseDrag => 10,
            EventCategory::MouseWheel => 11,
        }
    }

    /// `true` for the three keyboard categories.
    pub fn is_keyboard(self) -> bool {
        matches!(
            self,
            EventCategory::KeyPress | EventCategory::KeyDown | EventCategory::KeyUp
        )
    }

    /// `true` for the six mouse categories, wheel included.
    pub fn is_mouse(self) -> bool {
        !self.is_keyboard()
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventCategory {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ParseCategoryError(s.to_string()))
    }
}
