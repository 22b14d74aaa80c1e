// Spec: §4.4 "Keyboard controller"
//
// Design: grounded on the teacher's `Keyboard` ($D000's `keyboard_matrix`
// scan in `zinc64-core/src/io/keyboard.rs`) only for the idea of a small
// piece of latched state serviced through `Peripheral`/dispatcher
// registration; the actual Apple IIe protocol (strobe-and-clear rather than
// a scan matrix) has no teacher analogue and is built fresh from spec §4.4.
//
// `$C000` read (latest keystroke) and `$C000` write (80STORE, owned by
// `AuxMemoryController`) are independent registrations in the dispatcher's
// separate read/write tables, so they coexist without conflict.

use a2e_core::{AccessContext, Peripheral, PeripheralKind, SoftSwitchState};

use crate::io_page::IoHandler;

pub struct KeyboardController {
    last_key: u8,
    strobe: bool,
    key_down: bool,
}

impl KeyboardController {
    pub fn new() -> Self {
        Self {
            last_key: 0,
            strobe: false,
            key_down: false,
        }
    }

    /// Latches a key press, setting the strobe bit (spec §4.4). ASCII value
    /// is expected with its high bit already clear; callers translating raw
    /// scan codes do that before calling in.
    pub fn press(&mut self, ascii: u8) {
        self.last_key = ascii & 0x7f;
        self.strobe = true;
        self.key_down = true;
    }

    pub fn release(&mut self) {
        self.key_down = false;
    }

    fn clear_strobe(&mut self) {
        self.strobe = false;
    }
}

impl Default for KeyboardController {
    fn default() -> Self {
        Self::new()
    }
}

impl Peripheral for KeyboardController {
    fn name(&self) -> &'static str {
        "keyboard"
    }

    fn kind(&self) -> PeripheralKind {
        PeripheralKind::Motherboard
    }

    fn reset(&mut self) {
        self.last_key = 0;
        self.strobe = false;
        self.key_down = false;
    }

    fn soft_switch_states(&self) -> Vec<SoftSwitchState> {
        vec![SoftSwitchState { name: "KBDSTRB", address: 0xc010, value: self.strobe }]
    }
}

impl IoHandler for KeyboardController {
    fn io_read(&mut self, offset: u8, ctx: AccessContext) -> u8 {
        match offset {
            0x00 => {
                let bit7 = if self.strobe { 0x80 } else { 0x00 };
                bit7 | self.last_key
            }
            0x10 => {
                let bit7 = if self.key_down { 0x80 } else { 0x00 };
                if !ctx.no_side_effects {
                    self.clear_strobe();
                }
                bit7 | self.last_key
            }
            _ => 0xff,
        }
    }

    fn io_write(&mut self, offset: u8, _value: u8, ctx: AccessContext) {
        if offset == 0x10 && !ctx.no_side_effects {
            self.clear_strobe();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use a2e_core::AccessIntent;

    fn read_ctx(addr: u16) -> AccessContext {
        AccessContext::new(addr, AccessIntent::DataRead, 0)
    }

    #[test]
    fn press_sets_strobe_and_key_value() {
        let mut keyboard = KeyboardController::new();
        keyboard.press(b'A');
        assert_eq!(0x80 | b'A', keyboard.io_read(0x00, read_ctx(0xc000)));
    }

    #[test]
    fn reading_c010_clears_strobe_but_keeps_key_value() {
        let mut keyboard = KeyboardController::new();
        keyboard.press(b'A');
        keyboard.io_read(0x10, read_ctx(0xc010));
        assert_eq!(b'A', keyboard.io_read(0x00, read_ctx(0xc000)) & 0x7f);
        assert_eq!(0x00, keyboard.io_read(0x00, read_ctx(0xc000)) & 0x80);
    }

    #[test]
    fn debug_read_does_not_clear_strobe() {
        let mut keyboard = KeyboardController::new();
        keyboard.press(b'A');
        keyboard.io_read(0x10, AccessContext::debug_read(0xc010, 0));
        assert_eq!(0x80, keyboard.io_read(0x00, read_ctx(0xc000)) & 0x80);
    }

    #[test]
    fn release_clears_key_down_bit_but_not_strobe() {
        let mut keyboard = KeyboardController::new();
        keyboard.press(b'A');
        keyboard.release();
        assert_eq!(0x00, keyboard.io_read(0x10, read_ctx(0xc010)) & 0x80);
    }
}
