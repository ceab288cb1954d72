//! Emulator boundary
//!
//! Everything the menu engine asks of the emulated machine goes through
//! [`EmulatorCore`]. Calls are only ever made from the main loop, never
//! from interrupt context.

use alloc::string::String;

use crate::events::JoyEvent;
use crate::joystick::JoyDevice;
use crate::keycodes::KeyCode;

/// Failure reported by the emulator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmuError {
    #[error("Unknown setting {0}")]
    UnknownResource(String),
    #[error("Could not attach {0}")]
    Attach(String),
    #[error("Snapshot failed: {0}")]
    Snapshot(String),
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetKind {
    Soft,
    Hard,
}

/// Datasette transport commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapeControl {
    Stop,
    Play,
    Forward,
    Rewind,
    Record,
    /// Rewind to the start and zero the counter
    Reset,
}

/// Warp mode resource name
pub const RES_WARP_MODE: &str = "WarpMode";

/// Operations the emulated machine exposes to the menu
pub trait EmulatorCore {
    fn get_int(&self, resource: &str) -> Result<i32, EmuError>;
    fn set_int(&mut self, resource: &str, value: i32) -> Result<(), EmuError>;
    fn get_string(&self, resource: &str) -> Result<String, EmuError>;
    fn set_string(&mut self, resource: &str, value: &str) -> Result<(), EmuError>;

    fn attach_disk(&mut self, unit: u8, path: &str) -> Result<(), EmuError>;
    fn detach_disk(&mut self, unit: u8);
    fn attach_tape(&mut self, path: &str) -> Result<(), EmuError>;
    fn detach_tape(&mut self);
    fn attach_cart(&mut self, cart_type: i32, path: &str) -> Result<(), EmuError>;
    fn detach_cart(&mut self);

    fn save_snapshot(&mut self, path: &str) -> Result<(), EmuError>;
    fn load_snapshot(&mut self, path: &str) -> Result<(), EmuError>;

    fn reset(&mut self, kind: ResetKind);
    fn cart_freeze(&mut self);

    fn set_joy_port_device(&mut self, port: u8, device: JoyDevice);
    /// Current latch value of a joystick port
    fn joystick_value(&self, port: u8) -> u32;
    fn set_joystick_value(&mut self, port: u8, value: u32);

    /// Feed a latch update into the port it targets
    fn apply_joy_event(&mut self, event: &JoyEvent) {
        let current = self.joystick_value(event.port);
        self.set_joystick_value(event.port, event.apply(current));
    }

    fn key_pressed(&mut self, key: KeyCode);
    fn key_released(&mut self, key: KeyCode);

    fn tape_control(&mut self, command: TapeControl);

    /// Ask the emulator to call back into the menu's pause trap at the
    /// next safe point of its main loop
    fn schedule_trap(&mut self);
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::collections::BTreeMap;
    use std::vec::Vec;

    /// Records everything asked of it
    #[derive(Default)]
    pub struct MockEmulator {
        pub ints: BTreeMap<String, i32>,
        pub strings: BTreeMap<String, String>,
        pub joy: [u32; 3],
        pub port_devices: Vec<(u8, JoyDevice)>,
        pub keys: Vec<(KeyCode, bool)>,
        pub resets: Vec<ResetKind>,
        pub tape: Vec<TapeControl>,
        pub attached: Vec<String>,
        pub freezes: u32,
        pub traps: u32,
        pub fail_attach: bool,
    }

    impl EmulatorCore for MockEmulator {
        fn get_int(&self, resource: &str) -> Result<i32, EmuError> {
            Ok(self.ints.get(resource).copied().unwrap_or(0))
        }

        fn set_int(&mut self, resource: &str, value: i32) -> Result<(), EmuError> {
            self.ints.insert(resource.into(), value);
            Ok(())
        }

        fn get_string(&self, resource: &str) -> Result<String, EmuError> {
            self.strings
                .get(resource)
                .cloned()
                .ok_or_else(|| EmuError::UnknownResource(resource.into()))
        }

        fn set_string(&mut self, resource: &str, value: &str) -> Result<(), EmuError> {
            self.strings.insert(resource.into(), value.into());
            Ok(())
        }

        fn attach_disk(&mut self, _unit: u8, path: &str) -> Result<(), EmuError> {
            self.attach(path)
        }

        fn detach_disk(&mut self, _unit: u8) {}

        fn attach_tape(&mut self, path: &str) -> Result<(), EmuError> {
            self.attach(path)
        }

        fn detach_tape(&mut self) {}

        fn attach_cart(&mut self, _cart_type: i32, path: &str) -> Result<(), EmuError> {
            self.attach(path)
        }

        fn detach_cart(&mut self) {}

        fn save_snapshot(&mut self, _path: &str) -> Result<(), EmuError> {
            Ok(())
        }

        fn load_snapshot(&mut self, path: &str) -> Result<(), EmuError> {
            Err(EmuError::Snapshot(path.into()))
        }

        fn reset(&mut self, kind: ResetKind) {
            self.resets.push(kind);
        }

        fn cart_freeze(&mut self) {
            self.freezes += 1;
        }

        fn set_joy_port_device(&mut self, port: u8, device: JoyDevice) {
            self.port_devices.push((port, device));
        }

        fn joystick_value(&self, port: u8) -> u32 {
            self.joy[port as usize]
        }

        fn set_joystick_value(&mut self, port: u8, value: u32) {
            self.joy[port as usize] = value;
        }

        fn key_pressed(&mut self, key: KeyCode) {
            self.keys.push((key, true));
        }

        fn key_released(&mut self, key: KeyCode) {
            self.keys.push((key, false));
        }

        fn tape_control(&mut self, command: TapeControl) {
            self.tape.push(command);
        }

        fn schedule_trap(&mut self) {
            self.traps += 1;
        }
    }

    impl MockEmulator {
        fn attach(&mut self, path: &str) -> Result<(), EmuError> {
            if self.fail_attach {
                return Err(EmuError::Attach(path.into()));
            }
            self.attached.push(path.into());
            Ok(())
        }
    }
}
