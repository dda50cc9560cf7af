//! Raw event records as produced by native hook engines.
//!
//! A record lives for one synchronous delivery.  Callbacks receive it by
//! reference; anything that needs to keep it clones it.

use serde::{Deserialize, Serialize};

use super::category::EventCategory;
use super::classify::classify;

/// Modifier and button mask bits carried in [`RawEventRecord::mask`].
pub mod mask {
    pub const SHIFT_L: u16 = 1 << 0;
    pub const CTRL_L: u16 = 1 << 1;
    pub const META_L: u16 = 1 << 2;
    pub const ALT_L: u16 = 1 << 3;
    pub const SHIFT_R: u16 = 1 << 4;
    pub const CTRL_R: u16 = 1 << 5;
    pub const META_R: u16 = 1 << 6;
    pub const ALT_R: u16 = 1 << 7;
    pub const BUTTON1: u16 = 1 << 8;
    pub const BUTTON2: u16 = 1 << 9;
    pub const BUTTON3: u16 = 1 << 10;
    pub const BUTTON4: u16 = 1 << 11;
    pub const BUTTON5: u16 = 1 << 12;

    pub const SHIFT: u16 = SHIFT_L | SHIFT_R;
    pub const CTRL: u16 = CTRL_L | CTRL_R;
    pub const META: u16 = META_L | META_R;
    pub const ALT: u16 = ALT_L | ALT_R;
    pub const ANY_BUTTON: u16 = BUTTON1 | BUTTON2 | BUTTON3 | BUTTON4 | BUTTON5;
}

/// Event-specific data attached to a [`RawEventRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EventPayload {
    /// Key events (type codes 3..=5).
    Keyboard {
        /// UTF-16 code unit for keypress events; `0` for down/up.
        keychar: u16,
        /// Engine-neutral virtual key code.
        keycode: u16,
        /// Platform scan/virtual code as reported by the OS.
        rawcode: u16,
    },
    /// Button and motion events (type codes 6..=10).
    Mouse {
        /// 1 = left, 2 = right, 3 = middle, 4/5 = extra; 0 for pure motion.
        button: u16,
        clicks: u16,
        x: i32,
        y: i32,
    },
    /// Wheel events (type code 11).
    Wheel {
        /// Lines (vertical) or characters (horizontal) per notch as
        /// configured by the OS; `1` in page-scroll mode.
        amount: u16,
        clicks: u16,
        /// 3 = vertical, 4 = horizontal.
        direction: u8,
        /// Signed notch rotation; negative is away from the user.
        rotation: i16,
        /// 1 = unit scroll, 2 = block scroll.
        wheel_type: u8,
        x: i32,
        y: i32,
    },
    /// Engine lifecycle notifications and anything the engine left empty.
    None,
}

/// Vertical wheel direction.
pub const WHEEL_VERTICAL: u8 = 3;
/// Horizontal wheel direction.
pub const WHEEL_HORIZONTAL: u8 = 4;

/// One input event as delivered by a native engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEventRecord {
    /// Raw engine type code; see [`crate::event::classify`].
    pub type_code: u16,
    /// Modifier/button bitmask; see [`mask`].
    pub mask: u16,
    /// Engine timestamp in milliseconds.
    pub time: u64,
    pub payload: EventPayload,
}

impl RawEventRecord {
    /// A record with an arbitrary type code and no payload.
    pub fn from_code(type_code: u16) -> Self {
        Self {
            type_code,
            mask: 0,
            time: 0,
            payload: EventPayload::None,
        }
    }

    /// A keyboard record for `category`.
    pub fn keyboard(category: EventCategory, keycode: u16, rawcode: u16, keychar: u16) -> Self {
        Self {
            type_code: category.type_code(),
            mask: 0,
            time: 0,
            payload: EventPayload::Keyboard {
                keychar,
                keycode,
                rawcode,
            },
        }
    }

    /// A mouse button or motion record for `category`.
    pub fn mouse(category: EventCategory, button: u16, clicks: u16, x: i32, y: i32) -> Self {
        Self {
            type_code: category.type_code(),
            mask: 0,
            time: 0,
            payload: EventPayload::Mouse {
                button,
                clicks,
                x,
                y,
            },
        }
    }

    /// A vertical wheel record at (`x`, `y`).
    pub fn wheel(rotation: i16, amount: u16, x: i32, y: i32) -> Self {
        Self {
            type_code: EventCategory::MouseWheel.type_code(),
            mask: 0,
            time: 0,
            payload: EventPayload::Wheel {
                amount,
                clicks: 1,
                direction: WHEEL_VERTICAL,
                rotation,
                wheel_type: 1,
                x,
                y,
            },
        }
    }

    pub fn with_mask(mut self, mask: u16) -> Self {
        self.mask = mask;
        self
    }

    pub fn with_time(mut self, time: u64) -> Self {
        self.time = time;
        self
    }

    /// Classifies this record's type code.
    pub fn category(&self) -> Option<EventCategory> {
        classify(self.type_code)
    }

    /// Cursor position for mouse and wheel records.
    pub fn position(&self) -> Option<(i32, i32)> {
        match self.payload {
            EventPayload::Mouse { x, y, .. } | EventPayload::Wheel { x, y, .. } => Some((x, y)),
            _ => None,
        }
    }

    /// Virtual key code for keyboard records.
    pub fn keycode(&self) -> Option<u16> {
        match self.payload {
            EventPayload::Keyboard { keycode, .. } => Some(keycode),
            _ => None,
        }
    }
}
