//! Platform-neutral bookkeeping shared by native engines.
//!
//! OS hooks only report raw transitions.  [`InputTracker`] derives the
//! events the OS never reports directly (mousedrag, mouseclick, multi-click
//! counts) and keeps the modifier/button mask.  [`SinkSlot`] owns the
//! installed sink and brackets its lifetime with the hook lifecycle records.

use std::sync::{Mutex, MutexGuard};

use iohook_core::event::classify::{HOOK_DISABLED, HOOK_ENABLED};
use iohook_core::event::record::mask;
use iohook_core::{EventCategory, RawEventRecord};

use super::EventSink;

/// Two presses of the same button within this window count as a multi-click.
pub const MULTI_CLICK_MS: u32 = 500;
/// Raw wheel delta of one notch.
pub const WHEEL_DELTA: i16 = 120;
/// Lines per notch when the OS setting cannot be read.
pub const DEFAULT_SCROLL_LINES: u16 = 3;
/// OS "lines per notch" value meaning one page per notch.
pub const PAGE_SCROLL: u32 = u32::MAX;
pub const WHEEL_UNIT_SCROLL: u8 = 1;
pub const WHEEL_BLOCK_SCROLL: u8 = 2;

/// Modifier, button and click state for one hook thread.
#[derive(Debug, Default)]
pub struct InputTracker {
    mask: u16,
    /// Buttons that were held during motion since they were pressed.
    dragged: u16,
    last_button: u16,
    last_press_ms: u32,
    clicks: u16,
}

impl InputTracker {
    /// Current modifier and button mask.
    pub fn mask(&self) -> u16 {
        self.mask
    }

    pub fn set_modifier(&mut self, bit: u16, is_down: bool) {
        if is_down {
            self.mask |= bit;
        } else {
            self.mask &= !bit;
        }
    }

    /// Records a button press and returns its click count.
    pub fn press(&mut self, button: u16, time_ms: u32) -> u16 {
        let repeat = button == self.last_button
            && time_ms.wrapping_sub(self.last_press_ms) <= MULTI_CLICK_MS;
        self.clicks = if repeat { self.clicks.saturating_add(1) } else { 1 };
        self.last_button = button;
        self.last_press_ms = time_ms;

        let bit = button_mask(button);
        self.dragged &= !bit;
        self.mask |= bit;
        self.clicks
    }

    /// Classifies pointer motion: a drag while any button is held.
    pub fn motion(&mut self) -> EventCategory {
        let held = self.mask & mask::ANY_BUTTON;
        if held == 0 {
            EventCategory::MouseMove
        } else {
            self.dragged |= held;
            EventCategory::MouseDrag
        }
    }

    /// Records a button release.
    ///
    /// Returns the click count and whether a mouseclick follows the
    /// mouseup, i.e. the button was not dragged since its press.
    pub fn release(&mut self, button: u16) -> (u16, bool) {
        let bit = button_mask(button);
        let clicked = self.dragged & bit == 0;
        self.dragged &= !bit;
        self.mask &= !bit;
        (self.clicks, clicked)
    }
}

fn button_mask(button: u16) -> u16 {
    match button {
        1 => mask::BUTTON1,
        2 => mask::BUTTON2,
        3 => mask::BUTTON3,
        4 => mask::BUTTON4,
        5 => mask::BUTTON5,
        _ => 0,
    }
}

/// Notches turned for a raw wheel delta; positive is toward the user.
///
/// Partial notches from high-resolution wheels round toward zero.
pub fn wheel_rotation(delta: i16) -> i16 {
    -(delta / WHEEL_DELTA)
}

/// `(amount, wheel_type)` for the OS scroll-per-notch setting.
pub fn scroll_setting(per_notch: Option<u32>) -> (u16, u8) {
    match per_notch {
        Some(PAGE_SCROLL) => (1, WHEEL_BLOCK_SCROLL),
        Some(lines) => (u16::try_from(lines).unwrap_or(u16::MAX), WHEEL_UNIT_SCROLL),
        None => (DEFAULT_SCROLL_LINES, WHEEL_UNIT_SCROLL),
    }
}

/// The sink an engine delivers to, usable from a `static`.
pub struct SinkSlot {
    sink: Mutex<Option<EventSink>>,
}

impl SinkSlot {
    pub const fn new() -> Self {
        Self {
            sink: Mutex::new(None),
        }
    }

    pub fn store(&self, sink: EventSink) {
        *self.guard() = Some(sink);
    }

    /// Drops the sink without notifying it.
    pub fn clear(&self) {
        *self.guard() = None;
    }

    /// Hands one record to the sink, outside the lock.
    pub fn deliver(&self, record: RawEventRecord) {
        let sink = self.guard().clone();
        if let Some(sink) = sink {
            sink(Some(&record));
        }
    }

    pub fn announce_enabled(&self) {
        self.deliver(RawEventRecord::from_code(HOOK_ENABLED));
    }

    /// Delivers the hook-disabled record as the final record, then drops
    /// the sink.  Nothing is delivered when no sink is stored.
    pub fn detach(&self) {
        let sink = self.guard().take();
        if let Some(sink) = sink {
            sink(Some(&RawEventRecord::from_code(HOOK_DISABLED)));
        }
    }

    fn guard(&self) -> MutexGuard<'_, Option<EventSink>> {
        match self.sink.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
