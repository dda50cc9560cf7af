//! Windows low-level keyboard and mouse hook engine.
//!
//! Installs `WH_KEYBOARD_LL` and `WH_MOUSE_LL` hooks on a dedicated Win32
//! message-loop thread and translates every hook message into a
//! [`RawEventRecord`] delivered straight to the installed sink.
//!
//! Derived events follow the engine contract:
//! - a key-down that produces characters is followed by one keypress per
//!   UTF-16 unit (via `ToUnicode`);
//! - motion with a button held is reported as mousedrag, not mousemove;
//! - a button release with no drag since the press is followed by a
//!   mouseclick.
//!
//! The drag/click/wheel decisions live in the `input_state` module; this
//! module only reads the OS structures and forwards.
//!
//! # Safety
//!
//! This module uses `unsafe` code exclusively for Windows API FFI calls.
//! All `unsafe` blocks are annotated with `// SAFETY:` comments.

#![cfg(target_os = "windows")]

use std::cell::RefCell;
use std::ffi::c_void;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::mpsc;
use std::sync::{Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use iohook_core::event::record::{mask, EventPayload, WHEEL_HORIZONTAL, WHEEL_VERTICAL};
use iohook_core::{EventCategory, RawEventRecord};
use tracing::{debug, error, warn};
use windows::Win32::Foundation::{HINSTANCE, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::System::Threading::{
    GetCurrentThread, GetCurrentThreadId, SetThreadPriority, THREAD_PRIORITY_TIME_CRITICAL,
};
use windows::Win32::UI::Input::KeyboardAndMouse::{GetKeyboardState, ToUnicode};
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, GetMessageW, PeekMessageW, PostThreadMessageW,
    SetWindowsHookExW, SystemParametersInfoW, UnhookWindowsHookEx, HC_ACTION, HHOOK,
    KBDLLHOOKSTRUCT, KBDLLHOOKSTRUCT_FLAGS, LLKHF_EXTENDED, MSG, MSLLHOOKSTRUCT, PM_NOREMOVE,
    SPI_GETWHEELSCROLLCHARS, SPI_GETWHEELSCROLLLINES, SYSTEM_PARAMETERS_INFO_ACTION,
    SYSTEM_PARAMETERS_INFO_UPDATE_FLAGS, WH_KEYBOARD_LL, WH_MOUSE_LL, WM_KEYDOWN, WM_KEYUP,
    WM_LBUTTONDOWN, WM_LBUTTONUP, WM_MBUTTONDOWN, WM_MBUTTONUP, WM_MOUSEHWHEEL, WM_MOUSEMOVE,
    WM_MOUSEWHEEL, WM_QUIT, WM_RBUTTONDOWN, WM_RBUTTONUP, WM_SYSKEYDOWN, WM_SYSKEYUP, WM_USER,
    WM_XBUTTONDOWN, WM_XBUTTONUP,
};

use super::input_state::{scroll_setting, wheel_rotation, InputTracker, SinkSlot};
use super::{EngineError, EngineStatus, EventSink, NativeEngine};
use crate::infrastructure::storage::config::EngineConfig;

const XBUTTON1: u16 = 0x0001;
/// Keep the OS keyboard state untouched by `ToUnicode` (dead keys survive).
const TO_UNICODE_NO_STATE_CHANGE: u32 = 0x4;

/// Process-wide guard: only one low-level hook pair may be installed.
static INSTALLED: AtomicBool = AtomicBool::new(false);
/// Win32 thread id of the running message loop; `0` when none.
static HOOK_THREAD_ID: AtomicU32 = AtomicU32::new(0);
/// Sink used by the hook procedures.
static SINK: SinkSlot = SinkSlot::new();

thread_local! {
    /// Modifier, button, and click state.  Only touched on the hook thread.
    static TRACKER: RefCell<InputTracker> = RefCell::new(InputTracker::default());
}

/// Windows low-level input hook engine.
pub struct WindowsHookEngine {
    config: EngineConfig,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl WindowsHookEngine {
    /// Creates a new (unstarted) engine with default settings.
    pub fn new() -> Self {
        Self::with_config(&EngineConfig::default())
    }

    /// Creates a new (unstarted) engine configured from `config`.
    pub fn with_config(config: &EngineConfig) -> Self {
        Self {
            config: config.clone(),
            thread: Mutex::new(None),
        }
    }

    fn thread_slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        match self.thread.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for WindowsHookEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeEngine for WindowsHookEngine {
    fn start_hook(&self, sink: EventSink) -> Result<(), EngineError> {
        if INSTALLED
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(EngineError::AlreadyInstalled);
        }
        SINK.store(sink);

        let (ready_tx, ready_rx) = mpsc::channel::<Result<u32, EngineError>>();
        let raise_priority = self.config.raise_thread_priority;
        let spawned = thread::Builder::new()
            .name(self.config.thread_name.clone())
            .spawn(move || run_hook_message_loop(ready_tx, raise_priority));
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                release_global_state();
                return Err(EngineError::ThreadSpawnFailed(e.to_string()));
            }
        };

        // Block until both hooks are installed or the thread gives up.
        match ready_rx.recv() {
            Ok(Ok(thread_id)) => {
                HOOK_THREAD_ID.store(thread_id, Ordering::SeqCst);
                *self.thread_slot() = Some(handle);
                SINK.announce_enabled();
                debug!(thread_id, "low-level hooks installed");
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                release_global_state();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                release_global_state();
                Err(EngineError::ThreadSpawnFailed(
                    "hook thread exited during startup".to_string(),
                ))
            }
        }
    }

    fn stop_hook(&self) {
        // Only the engine that installed the hooks may remove them.
        let Some(handle) = self.thread_slot().take() else {
            return;
        };

        let thread_id = HOOK_THREAD_ID.swap(0, Ordering::SeqCst);
        if thread_id != 0 {
            // SAFETY: Posting WM_QUIT to a thread that owns a message queue
            // (created by PeekMessageW before the ready signal) is always valid.
            if let Err(e) = unsafe { PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) } {
                warn!("failed to post WM_QUIT to hook thread: {e}");
            }
        }

        // A callback stopping the hook runs on the hook thread itself.
        if handle.thread().id() != thread::current().id() && handle.join().is_err() {
            error!("hook thread panicked during shutdown");
        }

        SINK.detach();
        INSTALLED.store(false, Ordering::SeqCst);
        debug!("low-level hooks removed");
    }

    fn status(&self) -> EngineStatus {
        EngineStatus {
            running: self.thread_slot().is_some(),
            backend: "windows-ll",
        }
    }
}

fn release_global_state() {
    SINK.clear();
    INSTALLED.store(false, Ordering::SeqCst);
}

/// Entry point for the dedicated Win32 message loop thread.
fn run_hook_message_loop(ready: mpsc::Sender<Result<u32, EngineError>>, raise_priority: bool) {
    // SAFETY: All calls below are plain Win32 FFI on the current thread.
    // SetWindowsHookExW requires the calling thread to pump messages, which
    // the GetMessageW loop does until WM_QUIT arrives.
    unsafe {
        if raise_priority {
            if let Err(e) = SetThreadPriority(GetCurrentThread(), THREAD_PRIORITY_TIME_CRITICAL) {
                warn!("could not raise hook thread priority: {e}");
            }
        }

        // Force creation of this thread's message queue so WM_QUIT can be posted.
        let mut msg = MSG::default();
        let _ = PeekMessageW(&mut msg, None, WM_USER, WM_USER, PM_NOREMOVE);

        let instance = GetModuleHandleW(None).ok().map(HINSTANCE::from);

        let kbd_hook: HHOOK =
            match SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_hook_proc), instance, 0) {
                Ok(hook) => hook,
                Err(e) => {
                    let _ = ready.send(Err(EngineError::KeyboardHookInstallFailed(e.to_string())));
                    return;
                }
            };
        let mouse_hook: HHOOK =
            match SetWindowsHookExW(WH_MOUSE_LL, Some(mouse_hook_proc), instance, 0) {
                Ok(hook) => hook,
                Err(e) => {
                    UnhookWindowsHookEx(kbd_hook).ok();
                    let _ = ready.send(Err(EngineError::MouseHookInstallFailed(e.to_string())));
                    return;
                }
            };

        TRACKER.with(|t| *t.borrow_mut() = InputTracker::default());
        let _ = ready.send(Ok(GetCurrentThreadId()));

        // Win32 message loop – blocks until WM_QUIT is posted
        while GetMessageW(&mut msg, None, 0, 0).as_bool() {
            DispatchMessageW(&msg);
        }
        UnhookWindowsHookEx(kbd_hook).ok();
        UnhookWindowsHookEx(mouse_hook).ok();
    }
}

/// Mask bit for a modifier virtual-key code, `None` for other keys.
fn modifier_mask(vk: u32) -> Option<u16> {
    match vk {
        0xA0 => Some(mask::SHIFT_L),
        0xA1 => Some(mask::SHIFT_R),
        0xA2 => Some(mask::CTRL_L),
        0xA3 => Some(mask::CTRL_R),
        0xA4 => Some(mask::ALT_L),
        0xA5 => Some(mask::ALT_R),
        0x5B => Some(mask::META_L),
        0x5C => Some(mask::META_R),
        _ => None,
    }
}

fn key_transition(vk: u32, is_down: bool) -> u16 {
    TRACKER.with(|t| {
        let mut t = t.borrow_mut();
        if let Some(bit) = modifier_mask(vk) {
            t.set_modifier(bit, is_down);
        }
        t.mask()
    })
}

// ── Hook procedures ───────────────────────────────────────────────────────────

/// Low-level keyboard hook callback.
///
/// # Safety
///
/// Called by Windows from the hook message loop thread.  It must return
/// quickly (< ~300ms) to avoid hook removal by the OS.
unsafe extern "system" fn keyboard_hook_proc(
    n_code: i32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    if n_code != HC_ACTION as i32 {
        // SAFETY: Must call CallNextHookEx when n_code < 0.
        return CallNextHookEx(None, n_code, w_param, l_param);
    }

    // SAFETY: l_param points to a KBDLLHOOKSTRUCT when n_code == HC_ACTION.
    let kbs = &*(l_param.0 as *const KBDLLHOOKSTRUCT);
    let is_extended = (kbs.flags & LLKHF_EXTENDED) != KBDLLHOOKSTRUCT_FLAGS(0);
    let keycode = (kbs.scanCode as u16) | if is_extended { 0x0E00 } else { 0 };
    let rawcode = kbs.vkCode as u16;
    let time = u64::from(kbs.time);

    match w_param.0 as u32 {
        WM_KEYDOWN | WM_SYSKEYDOWN => {
            let mask = key_transition(kbs.vkCode, true);
            SINK.deliver(
                RawEventRecord::keyboard(EventCategory::KeyDown, keycode, rawcode, 0)
                    .with_mask(mask)
                    .with_time(time),
            );
            for keychar in typed_chars(kbs.vkCode, kbs.scanCode) {
                SINK.deliver(
                    RawEventRecord::keyboard(EventCategory::KeyPress, 0, rawcode, keychar)
                        .with_mask(mask)
                        .with_time(time),
                );
            }
        }
        WM_KEYUP | WM_SYSKEYUP => {
            let mask = key_transition(kbs.vkCode, false);
            SINK.deliver(
                RawEventRecord::keyboard(EventCategory::KeyUp, keycode, rawcode, 0)
                    .with_mask(mask)
                    .with_time(time),
            );
        }
        _ => {}
    }

    // SAFETY: Forward the event to the next hook in the chain.
    CallNextHookEx(None, n_code, w_param, l_param)
}

/// UTF-16 units produced by a key-down, empty for non-character keys.
fn typed_chars(vk: u32, scan: u32) -> Vec<u16> {
    let mut state = [0u8; 256];
    let mut buffer = [0u16; 8];
    // SAFETY: Both buffers are valid for the duration of the calls.
    let written = unsafe {
        if GetKeyboardState(&mut state).is_err() {
            return Vec::new();
        }
        ToUnicode(vk, scan, Some(&state), &mut buffer, TO_UNICODE_NO_STATE_CHANGE)
    };
    if written > 0 {
        buffer[..written as usize].to_vec()
    } else {
        Vec::new()
    }
}

/// Reads the "lines" (vertical) or "chars" (horizontal) per notch setting.
fn scroll_per_notch(action: SYSTEM_PARAMETERS_INFO_ACTION) -> Option<u32> {
    let mut value: u32 = 0;
    // SAFETY: pvparam points to a live u32, the size both queries write.
    unsafe {
        SystemParametersInfoW(
            action,
            0,
            Some(&mut value as *mut u32 as *mut c_void),
            SYSTEM_PARAMETERS_INFO_UPDATE_FLAGS(0),
        )
    }
    .ok()
    .map(|()| value)
}

/// Low-level mouse hook callback.
///
/// # Safety
///
/// Called by Windows from the hook message loop thread; must return quickly.
unsafe extern "system" fn mouse_hook_proc(
    n_code: i32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    if n_code != HC_ACTION as i32 {
        // SAFETY: Must call CallNextHookEx when n_code < 0.
        return CallNextHookEx(None, n_code, w_param, l_param);
    }

    // SAFETY: l_param points to a MSLLHOOKSTRUCT when n_code == HC_ACTION.
    let mhs = &*(l_param.0 as *const MSLLHOOKSTRUCT);
    let (x, y) = (mhs.pt.x, mhs.pt.y);
    let time_ms = mhs.time;
    let high_word = (mhs.mouseData >> 16) as u16;

    match w_param.0 as u32 {
        WM_MOUSEMOVE => {
            let (category, mask) = TRACKER.with(|t| {
                let mut t = t.borrow_mut();
                (t.motion(), t.mask())
            });
            SINK.deliver(mouse_record(category, 0, 0, x, y, mask, time_ms));
        }
        WM_LBUTTONDOWN => button_down(1, x, y, time_ms),
        WM_RBUTTONDOWN => button_down(2, x, y, time_ms),
        WM_MBUTTONDOWN => button_down(3, x, y, time_ms),
        WM_XBUTTONDOWN => button_down(x_button(high_word), x, y, time_ms),
        WM_LBUTTONUP => button_up(1, x, y, time_ms),
        WM_RBUTTONUP => button_up(2, x, y, time_ms),
        WM_MBUTTONUP => button_up(3, x, y, time_ms),
        WM_XBUTTONUP => button_up(x_button(high_word), x, y, time_ms),
        msg @ (WM_MOUSEWHEEL | WM_MOUSEHWHEEL) => {
            let (direction, setting) = if msg == WM_MOUSEWHEEL {
                (WHEEL_VERTICAL, SPI_GETWHEELSCROLLLINES)
            } else {
                (WHEEL_HORIZONTAL, SPI_GETWHEELSCROLLCHARS)
            };
            let (amount, wheel_type) = scroll_setting(scroll_per_notch(setting));
            let mask = TRACKER.with(|t| t.borrow().mask());
            SINK.deliver(RawEventRecord {
                type_code: EventCategory::MouseWheel.type_code(),
                mask,
                time: u64::from(time_ms),
                payload: EventPayload::Wheel {
                    amount,
                    clicks: 1,
                    direction,
                    rotation: wheel_rotation(high_word as i16),
                    wheel_type,
                    x,
                    y,
                },
            });
        }
        _ => {}
    }

    // SAFETY: Forward to the next hook in the chain.
    CallNextHookEx(None, n_code, w_param, l_param)
}

fn x_button(high_word: u16) -> u16 {
    if high_word == XBUTTON1 {
        4
    } else {
        5
    }
}

fn button_down(button: u16, x: i32, y: i32, time_ms: u32) {
    let (clicks, mask) = TRACKER.with(|t| {
        let mut t = t.borrow_mut();
        let clicks = t.press(button, time_ms);
        (clicks, t.mask())
    });
    SINK.deliver(mouse_record(EventCategory::MouseDown, button, clicks, x, y, mask, time_ms));
}

fn button_up(button: u16, x: i32, y: i32, time_ms: u32) {
    let ((clicks, clicked), mask) = TRACKER.with(|t| {
        let mut t = t.borrow_mut();
        let released = t.release(button);
        (released, t.mask())
    });
    SINK.deliver(mouse_record(EventCategory::MouseUp, button, clicks, x, y, mask, time_ms));
    if clicked {
        SINK.deliver(mouse_record(EventCategory::MouseClick, button, clicks, x, y, mask, time_ms));
    }
}

fn mouse_record(
    category: EventCategory,
    button: u16,
    clicks: u16,
    x: i32,
    y: i32,
    mask: u16,
    time_ms: u32,
) -> RawEventRecord {
    RawEventRecord::mouse(category, button, clicks, x, y)
        .with_mask(mask)
        .with_time(u64::from(time_ms))
}
