//! End-to-end menu scenarios driven through the public API

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use osd::config::UiSettings;
use osd::emulator::{ResetKind, TapeControl};
use osd::hal::{MemoryFramebuffer, Platform};
use osd::hotkeys::KeyRouter;
use osd::input::InputEngine;
use osd::joystick::JoyDevice;
use osd::overlay::DisplayMode;
use osd::quick::QuickFunc;
use osd::video::VideoState;
use osd::{Action, EmuError, EmulatorCore, EventHub, ItemKind, KeyCode, KeyEvent, MenuSize, NavigationContext, UiController};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Default)]
struct TestEmulator {
    ints: BTreeMap<String, i32>,
    joy: [u32; 3],
    keys: Vec<(KeyCode, bool)>,
    resets: Vec<ResetKind>,
    tape: Vec<TapeControl>,
    traps: u32,
}

impl EmulatorCore for TestEmulator {
    fn get_int(&self, resource: &str) -> Result<i32, EmuError> {
        Ok(self.ints.get(resource).copied().unwrap_or(0))
    }

    fn set_int(&mut self, resource: &str, value: i32) -> Result<(), EmuError> {
        self.ints.insert(resource.into(), value);
        Ok(())
    }

    fn get_string(&self, resource: &str) -> Result<String, EmuError> {
        Err(EmuError::UnknownResource(resource.into()))
    }

    fn set_string(&mut self, resource: &str, _value: &str) -> Result<(), EmuError> {
        Err(EmuError::UnknownResource(resource.into()))
    }

    fn attach_disk(&mut self, _unit: u8, _path: &str) -> Result<(), EmuError> {
        Ok(())
    }

    fn detach_disk(&mut self, _unit: u8) {}

    fn attach_tape(&mut self, _path: &str) -> Result<(), EmuError> {
        Ok(())
    }

    fn detach_tape(&mut self) {}

    fn attach_cart(&mut self, _cart_type: i32, _path: &str) -> Result<(), EmuError> {
        Ok(())
    }

    fn detach_cart(&mut self) {}

    fn save_snapshot(&mut self, _path: &str) -> Result<(), EmuError> {
        Ok(())
    }

    fn load_snapshot(&mut self, _path: &str) -> Result<(), EmuError> {
        Ok(())
    }

    fn reset(&mut self, kind: ResetKind) {
        self.resets.push(kind);
    }

    fn cart_freeze(&mut self) {}

    fn set_joy_port_device(&mut self, _port: u8, _device: JoyDevice) {}

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

struct Clock(Cell<u64>);

impl Platform for Clock {
    fn ticks(&self) -> u64 {
        self.0.get()
    }

    fn wait_vsync(&self) {
        self.0.set(self.0.get() + 20_000);
    }
}

fn counting_callback(nav: &mut NavigationContext, item: osd::ItemHandle) -> (Rc<Cell<u32>>, Rc<Cell<i32>>) {
    let calls = Rc::new(Cell::new(0));
    let last_id = Rc::new(Cell::new(0));
    let (c, l) = (calls.clone(), last_id.clone());
    nav.item_mut(item).unwrap().on_value_changed = Some(Rc::new(move |nav: &mut NavigationContext, item| {
        c.set(c.get() + 1);
        l.set(nav.item(item).map_or(0, |i| i.id));
    }));
    (calls, last_id)
}

#[test]
fn folder_expands_to_show_toggle() {
    init_logging();
    let mut nav = NavigationContext::new(640, 480);
    let root = nav.push_menu(MenuSize::Chars(40), MenuSize::Chars(25)).unwrap();
    let folder = nav.tree_mut().add_folder(root, "Drive 8").unwrap();
    let toggle = nav.tree_mut().add_toggle(folder, 77, "IEC", false).unwrap();
    let (calls, last_id) = counting_callback(&mut nav, toggle);

    nav.apply_action(Action::Down, &mut ()).unwrap();
    nav.apply_action(Action::Down, &mut ()).unwrap();
    assert_eq!(nav.cursor_item(), Some(folder));
    nav.apply_action(Action::Return, &mut ()).unwrap();
    assert_eq!(nav.max_index(), 2);

    nav.apply_action(Action::Down, &mut ()).unwrap();
    assert_eq!(nav.cursor_item(), Some(toggle));
    nav.apply_action(Action::Return, &mut ()).unwrap();
    assert!(matches!(nav.item(toggle).unwrap().kind, ItemKind::Toggle { on: true, .. }));
    assert_eq!(calls.get(), 1);
    assert_eq!(last_id.get(), 77);
}

#[test]
fn range_clamps_and_steps() {
    init_logging();
    let mut nav = NavigationContext::new(640, 480);
    let root = nav.current_root();
    let volume = nav.tree_mut().add_range(root, 5, "Volume", 0, 1000, 100, 1000).unwrap();
    let (calls, _) = counting_callback(&mut nav, volume);

    nav.apply_action(Action::Right, &mut ()).unwrap();
    assert_eq!(nav.item(volume).unwrap().value(), 1000);
    assert_eq!(calls.get(), 0);

    for _ in 0..5 {
        nav.apply_action(Action::Left, &mut ()).unwrap();
    }
    assert_eq!(nav.item(volume).unwrap().value(), 500);
    assert_eq!(calls.get(), 5);
}

#[test]
fn press_and_release_before_drain_leave_nothing_held() {
    init_logging();
    let hub = EventHub::new();
    let router = KeyRouter::new();
    let mut nav = NavigationContext::new(640, 480);
    let root = nav.current_root();
    for name in ["One", "Two", "Three"] {
        nav.tree_mut().add_button(root, 1, name).unwrap();
    }
    nav.toggle();
    hub.set_ui_enabled(true);

    router.key_pressed(&hub, KeyCode::Down, 0);
    router.key_released(&hub, KeyCode::Down, 0);

    let mut input = InputEngine::default();
    let events: Vec<KeyEvent> = hub.ui_keys.drain().collect();
    assert_eq!(events, [KeyEvent::press(KeyCode::Down), KeyEvent::release(KeyCode::Down)]);
    for event in events {
        input.handle(event, &mut nav, &mut ()).unwrap();
    }
    assert_eq!(nav.cursor(), 1);
    assert_eq!(input.held(), None);

    // no repeat once released
    for _ in 0..100 {
        input.tick(&mut nav, &mut ()).unwrap();
    }
    assert_eq!(nav.cursor(), 1);
}

#[test]
fn swaps_alternate_halves() {
    let mut video = VideoState::new(MemoryFramebuffer::new(64, 32));
    let (first, second) = video.offsets();
    for n in 0..6 {
        video.swap();
        let expected = if n % 2 == 0 { first } else { second };
        assert_eq!(video.framebuffer().scanout_offset(), expected);
    }
    assert_eq!(video.swap_count(), 6);
}

#[test]
fn queued_keys_keep_their_order() {
    let hub = EventHub::new();
    let keys = [KeyCode::A, KeyCode::B, KeyCode::C];
    for key in keys {
        hub.route_key(KeyEvent::press(key));
    }
    let drained: Vec<KeyCode> = hub.emu_keys.drain().map(|e| e.key).collect();
    assert_eq!(drained, keys);
    assert!(hub.emu_keys.is_empty());
}

#[test]
fn tape_hotkey_opens_osd_and_runs_command() {
    init_logging();
    let hub = EventHub::new();
    let router = KeyRouter::new();
    let mut settings = UiSettings::parse("hotkey_cf3=Tape OSD\noverlay=never\n");
    settings.commodore_key = KeyCode::LeftControl;
    let clock = Clock(Cell::new(0));
    let mut ui = UiController::new(&hub, &router, TestEmulator::default(), MemoryFramebuffer::new(320, 200), settings, &clock);

    // Commodore+F3, tape menu waits for the modifier to come up
    router.key_pressed(&hub, KeyCode::LeftControl, 0);
    router.key_pressed(&hub, KeyCode::F3, 0);
    router.key_released(&hub, KeyCode::F3, 0);
    ui.vsync_hook(&clock);
    assert!(!ui.nav().is_enabled());
    router.key_released(&hub, KeyCode::LeftControl, 0);
    ui.vsync_hook(&clock);
    assert!(ui.nav().is_osd_active());
    assert_eq!(ui.emulator().traps, 0);

    // "Play" is the second row
    for key in [KeyCode::Down, KeyCode::Return] {
        router.key_pressed(&hub, key, 0);
        router.key_released(&hub, key, 0);
    }
    ui.vsync_hook(&clock);
    assert_eq!(ui.emulator().tape, [TapeControl::Play]);
    assert!(!ui.nav().is_enabled());
    assert!(!hub.ui_enabled());

    // the modifier reached the machine, the combo key did not
    let keys = &ui.emulator().keys;
    assert!(keys.contains(&(KeyCode::LeftControl, true)));
    assert!(!keys.iter().any(|&(k, _)| k == KeyCode::F3));
}

#[test]
fn menu_key_pauses_machine() {
    init_logging();
    let hub = EventHub::new();
    let router = KeyRouter::new();
    let settings = UiSettings { status_bar: DisplayMode::Never, ..UiSettings::default() };
    let clock = Clock(Cell::new(0));
    let mut ui = UiController::new(&hub, &router, TestEmulator::default(), MemoryFramebuffer::new(320, 200), settings, &clock);

    router.key_pressed(&hub, KeyCode::F12, 0);
    router.key_released(&hub, KeyCode::F12, 0);
    ui.vsync_hook(&clock);
    ui.vsync_hook(&clock);
    assert!(ui.nav().is_enabled());
    assert_eq!(ui.emulator().traps, 1);
    // both F12 events reached the machine before the menu took over
    assert_eq!(ui.emulator().keys, [(KeyCode::F12, true), (KeyCode::F12, false)]);

    // while paused, F12 comes to the menu and closes it
    router.key_pressed(&hub, KeyCode::F12, 0);
    router.key_released(&hub, KeyCode::F12, 0);
    ui.pause_trap(&clock);
    assert!(!ui.nav().is_enabled());
}

#[test]
fn status_toggle_hotkey_forces_bar() {
    let hub = EventHub::new();
    let router = KeyRouter::new();
    let clock = Clock(Cell::new(0));
    let mut ui =
        UiController::new(&hub, &router, TestEmulator::default(), MemoryFramebuffer::new(640, 480), UiSettings::default(), &clock);

    ui.run_quick_func(QuickFunc::StatusToggle, &clock);
    assert!(ui.status_bar_mut().is_forced());
    assert!(ui.status_bar_mut().is_showing());
    ui.run_quick_func(QuickFunc::StatusToggle, &clock);
    assert!(!ui.status_bar_mut().is_showing());
}
