//! Raw type code to [`EventCategory`] classification.
//!
//! The table is a fixed contract with the native engine.  Codes outside it
//! (including the engine's own lifecycle notifications) classify to `None`,
//! which the dispatch layer treats as "drop silently".

use super::category::EventCategory;

/// Engine notification emitted once the hook is live.  Never dispatched.
pub const HOOK_ENABLED: u16 = 1;
/// Engine notification emitted as the hook shuts down.  Never dispatched.
pub const HOOK_DISABLED: u16 = 2;

pub const KEY_TYPED: u16 = 3;
pub const KEY_PRESSED: u16 = 4;
pub const KEY_RELEASED: u16 = 5;
pub const MOUSE_CLICKED: u16 = 6;
pub const MOUSE_PRESSED: u16 = 7;
pub const MOUSE_RELEASED: u16 = 8;
pub const MOUSE_MOVED: u16 = 9;
pub const MOUSE_DRAGGED: u16 = 10;
pub const MOUSE_WHEEL: u16 = 11;

/// Maps a raw engine type code to its category.
///
/// Pure and total: every `u16` yields either a category or `None`.
#[inline]
pub fn classify(type_code: u16) -> Option<EventCategory> {
    match type_code {
        KEY_TYPED => Some(EventCategory::KeyPress),
        KEY_PRESSED => Some(EventCategory::KeyDown),
        KEY_RELEASED => Some(EventCategory::KeyUp),
        MOUSE_CLICKED => Some(EventCategory::MouseClick),
        MOUSE_PRESSED => Some(EventCategory::MouseDown),
        MOUSE_RELEASED => Some(EventCategory::MouseUp),
        MOUSE_MOVED => Some(EventCategory::MouseMove),
        MOUSE_DRAGGED => Some(EventCategory::MouseDrag),
        MOUSE_WHEEL => Some(EventCategory::MouseWheel),
        _ => None,
    }
}
