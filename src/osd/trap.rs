//! Menu toggle countdown
//!
//! A toggle request from the keyboard ISR does not flip the menu straight
//! away. The emulator gets one more main-loop pass to consume the key
//! events that were queued before the request, otherwise keys would be
//! left held down inside the emulated machine.

/// Main-loop passes between a toggle request and the toggle itself
pub const TOGGLE_COUNTDOWN: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToggleState {
    #[default]
    Idle,
    /// Passes left before the toggle fires
    Armed(u8),
}

/// Outcome of one countdown step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleTick {
    /// Nothing pending
    Idle,
    /// Pending, not yet due
    Counting,
    /// Due now; the state is back to idle
    Fired,
}

impl ToggleState {
    /// Decode from a byte: zero is idle, anything else the passes left
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => ToggleState::Idle,
            left => ToggleState::Armed(left),
        }
    }

    pub const fn into_raw(self) -> u8 {
        match self {
            ToggleState::Idle => 0,
            ToggleState::Armed(left) => left,
        }
    }

    /// (Re)start the countdown
    pub fn arm(&mut self) {
        *self = ToggleState::Armed(TOGGLE_COUNTDOWN);
    }

    #[inline]
    pub fn is_armed(&self) -> bool {
        matches!(self, ToggleState::Armed(_))
    }

    pub fn tick(&mut self) -> ToggleTick {
        match *self {
            ToggleState::Idle => ToggleTick::Idle,
            ToggleState::Armed(left) if left <= 1 => {
                *self = ToggleState::Idle;
                ToggleTick::Fired
            }
            ToggleState::Armed(left) => {
                *self = ToggleState::Armed(left - 1);
                ToggleTick::Counting
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_on_second_tick() {
        let mut state = ToggleState::Idle;
        assert_eq!(state.tick(), ToggleTick::Idle);

        state.arm();
        assert!(state.is_armed());
        assert_eq!(state.tick(), ToggleTick::Counting);
        assert_eq!(state.tick(), ToggleTick::Fired);
        assert_eq!(state, ToggleState::Idle);
        assert_eq!(state.tick(), ToggleTick::Idle);
    }

    #[test]
    fn test_raw_form() {
        assert_eq!(ToggleState::from_raw(0), ToggleState::Idle);
        assert_eq!(ToggleState::from_raw(TOGGLE_COUNTDOWN), ToggleState::Armed(TOGGLE_COUNTDOWN));
        let mut state = ToggleState::Idle;
        state.arm();
        assert_eq!(ToggleState::from_raw(state.into_raw()), state);
    }

    #[test]
    fn test_rearm_restarts_countdown() {
        let mut state = ToggleState::default();
        state.arm();
        state.tick();
        state.arm();
        assert_eq!(state.tick(), ToggleTick::Counting);
        assert_eq!(state.tick(), ToggleTick::Fired);
    }
}
