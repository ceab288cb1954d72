//! Interrupt-to-main-loop event queues
//!
//! Interrupt handlers never call into the emulator or touch menu state.
//! They push fixed-size events into bounded ring buffers; the main loop
//! takes a snapshot of everything pending under the lock and processes it
//! with the lock released.
//!
//! A full queue rejects the newest event and counts it. Queued events are
//! never overwritten, so a key release that made it into the queue is
//! always delivered. Nothing on the interrupt side logs; drops are reported
//! by whoever drains the queue.
//!
//! The toggle countdown and the pending quick function are plain atomics,
//! so the main loop may touch them without masking interrupts.

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use spin::Mutex;

use crate::joystick::JoyDevice;
use crate::keycodes::KeyCode;
use crate::quick::QuickFunc;
use crate::trap::{ToggleState, ToggleTick};

/// Empty quick function slot
const NO_QUICK_FUNC: u8 = 0;

// ============================================================================
// Queue Capacities
// ============================================================================

/// Pending key events for the menu
pub const UI_KEY_QUEUE_LEN: usize = 16;

/// Pending key events for the emulated keyboard
pub const EMU_KEY_QUEUE_LEN: usize = 16;

/// Pending joystick latch updates
pub const JOY_QUEUE_LEN: usize = 128;

// ============================================================================
// Event Types
// ============================================================================

/// Key press or release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: KeyCode,
    pub pressed: bool,
}

impl KeyEvent {
    pub const fn press(key: KeyCode) -> Self {
        Self { key, pressed: true }
    }

    pub const fn release(key: KeyCode) -> Self {
        Self { key, pressed: false }
    }
}

/// How a joystick event combines with the port's current latch value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoyLatchKind {
    /// Replace the latch
    Absolute,
    /// AND the latch with the value (release bits)
    And,
    /// OR the value into the latch (press bits)
    Or,
}

/// Joystick latch update for one port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoyEvent {
    pub kind: JoyLatchKind,
    pub port: u8,
    pub device: JoyDevice,
    pub value: u32,
}

impl JoyEvent {
    /// Apply this update to a latch value
    #[inline]
    pub fn apply(&self, current: u32) -> u32 {
        match self.kind {
            JoyLatchKind::Absolute => self.value,
            JoyLatchKind::And => current & self.value,
            JoyLatchKind::Or => current | self.value,
        }
    }
}

// ============================================================================
// Bounded Ring Buffer
// ============================================================================

struct Ring<T: Copy, const N: usize> {
    buffer: [Option<T>; N],
    read_idx: usize,
    len: usize,
    dropped: u32,
    /// Drops not yet handed out by `drain`
    unreported: u32,
}

/// Fixed-capacity FIFO shared between interrupt and main-loop context
pub struct EventQueue<T: Copy, const N: usize> {
    ring: Mutex<Ring<T, N>>,
}

impl<T: Copy, const N: usize> EventQueue<T, N> {
    pub const fn new() -> Self {
        Self {
            ring: Mutex::new(Ring {
                buffer: [None; N],
                read_idx: 0,
                len: 0,
                dropped: 0,
                unreported: 0,
            }),
        }
    }

    /// Queue an event (interrupt context)
    ///
    /// Returns false when the queue was full and the event was dropped.
    pub fn enqueue(&self, event: T) -> bool {
        let mut ring = self.ring.lock();
        if ring.len == N {
            ring.dropped = ring.dropped.wrapping_add(1);
            ring.unreported = ring.unreported.wrapping_add(1);
            return false;
        }
        let write_idx = (ring.read_idx + ring.len) % N;
        ring.buffer[write_idx] = Some(event);
        ring.len += 1;
        true
    }

    /// Take everything pending, oldest first (main loop)
    ///
    /// The lock is held only while copying; iterate the returned batch
    /// after the call. The batch also carries the number of events dropped
    /// since the previous drain.
    pub fn drain(&self) -> Batch<T, N> {
        let mut batch = Batch {
            events: [None; N],
            len: 0,
            pos: 0,
            dropped: 0,
        };
        let mut ring = self.ring.lock();
        batch.dropped = core::mem::take(&mut ring.unreported);
        while ring.len > 0 {
            let idx = ring.read_idx;
            batch.events[batch.len] = ring.buffer[idx].take();
            batch.len += 1;
            ring.read_idx = (idx + 1) % N;
            ring.len -= 1;
        }
        batch
    }

    /// Discard everything pending
    pub fn clear(&self) {
        let mut ring = self.ring.lock();
        ring.buffer = [None; N];
        ring.read_idx = 0;
        ring.len = 0;
    }

    pub fn len(&self) -> usize {
        self.ring.lock().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of events rejected because the queue was full
    pub fn dropped(&self) -> u32 {
        self.ring.lock().dropped
    }
}

impl<T: Copy, const N: usize> Default for EventQueue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of drained events
pub struct Batch<T: Copy, const N: usize> {
    events: [Option<T>; N],
    len: usize,
    pos: usize,
    dropped: u32,
}

impl<T: Copy, const N: usize> Batch<T, N> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Events the queue rejected since the previous drain
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Warn about rejected events; call outside the critical section
    pub fn log_dropped(&self, queue: &str) {
        if self.dropped > 0 {
            log::warn!("{} queue full ({} slots), dropped {} events", queue, N, self.dropped);
        }
    }
}

impl<T: Copy, const N: usize> Iterator for Batch<T, N> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        while self.pos < self.len {
            let event = self.events[self.pos];
            self.pos += 1;
            if event.is_some() {
                return event;
            }
        }
        None
    }
}

// ============================================================================
// Event Hub
// ============================================================================

/// Everything shared between interrupt handlers and the main loop
///
/// Lives in a `static` on hardware:
///
/// ```ignore
/// static HUB: EventHub = EventHub::new();
/// ```
pub struct EventHub {
    /// Keys destined for the menu while it is showing
    pub ui_keys: EventQueue<KeyEvent, UI_KEY_QUEUE_LEN>,
    /// Keys destined for the emulated keyboard matrix
    pub emu_keys: EventQueue<KeyEvent, EMU_KEY_QUEUE_LEN>,
    /// Joystick latch updates
    pub joy: EventQueue<JoyEvent, JOY_QUEUE_LEN>,
    ui_enabled: AtomicBool,
    /// `ToggleState` in its raw form
    toggle: AtomicU8,
    /// `QuickFunc` code, or `NO_QUICK_FUNC`
    quick_func: AtomicU8,
}

impl EventHub {
    pub const fn new() -> Self {
        Self {
            ui_keys: EventQueue::new(),
            emu_keys: EventQueue::new(),
            joy: EventQueue::new(),
            ui_enabled: AtomicBool::new(false),
            toggle: AtomicU8::new(ToggleState::Idle.into_raw()),
            quick_func: AtomicU8::new(NO_QUICK_FUNC),
        }
    }

    /// Is the menu (or an OSD) currently taking keys?
    #[inline]
    pub fn ui_enabled(&self) -> bool {
        self.ui_enabled.load(Ordering::Acquire)
    }

    pub fn set_ui_enabled(&self, enabled: bool) {
        self.ui_enabled.store(enabled, Ordering::Release);
    }

    /// Route a key to the menu or the emulator depending on who has focus
    pub fn route_key(&self, event: KeyEvent) -> bool {
        if self.ui_enabled() {
            self.ui_keys.enqueue(event)
        } else {
            self.emu_keys.enqueue(event)
        }
    }

    /// Arm the menu toggle countdown
    pub fn request_toggle(&self) {
        let mut state = ToggleState::Idle;
        state.arm();
        self.toggle.store(state.into_raw(), Ordering::Release);
    }

    pub fn toggle_pending(&self) -> bool {
        ToggleState::from_raw(self.toggle.load(Ordering::Acquire)).is_armed()
    }

    /// Advance the toggle countdown by one main-loop pass
    ///
    /// A request that lands between the load and the store makes the
    /// exchange fail and is counted from the start on the retry.
    pub fn tick_toggle(&self) -> ToggleTick {
        let mut tick = ToggleTick::Idle;
        let _ = self.toggle.fetch_update(Ordering::AcqRel, Ordering::Acquire, |raw| {
            let mut state = ToggleState::from_raw(raw);
            tick = state.tick();
            Some(state.into_raw())
        });
        tick
    }

    /// Ask the main loop to run a quick function
    pub fn request_quick_func(&self, func: QuickFunc) {
        self.quick_func.store(func.code() as u8, Ordering::Release);
    }

    pub fn take_quick_func(&self) -> Option<QuickFunc> {
        match self.quick_func.swap(NO_QUICK_FUNC, Ordering::AcqRel) {
            NO_QUICK_FUNC => None,
            code => QuickFunc::from_code(code as i32),
        }
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}
