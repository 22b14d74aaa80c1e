// Spec: §4.4 "Character controller"
//
// Design: per spec, this controller has no bus-layer effect at all — it
// only tracks ALTCHAR and the handful of `$C06x`/`$C068-$C06B` game-paddle
// adjacent switches the character generator and annunciators share, for a
// debugger to introspect. Registers with the dispatcher the same way every
// other switch bank here does; it never touches `MemoryBus` directly.

use a2e_core::{AccessContext, Peripheral, PeripheralKind, SoftSwitchState};

use crate::io_page::IoHandler;

pub struct CharacterController {
    altchar: bool,
    an0: bool,
    an1: bool,
    an2: bool,
}

impl CharacterController {
    pub fn new() -> Self {
        Self {
            altchar: false,
            an0: false,
            an1: false,
            an2: false,
        }
    }

    fn handle_write(&mut self, offset: u8) {
        match offset {
            0x0e => self.altchar = false,
            0x0f => self.altchar = true,
            0x58 => self.an0 = false,
            0x59 => self.an0 = true,
            0x5a => self.an1 = false,
            0x5b => self.an1 = true,
            0x5c => self.an2 = false,
            0x5d => self.an2 = true,
            _ => {}
        }
    }
}

impl Default for CharacterController {
    fn default() -> Self {
        Self::new()
    }
}

impl Peripheral for CharacterController {
    fn name(&self) -> &'static str {
        "character-generator"
    }

    fn kind(&self) -> PeripheralKind {
        PeripheralKind::Motherboard
    }

    fn reset(&mut self) {
        self.altchar = false;
        self.an0 = false;
        self.an1 = false;
        self.an2 = false;
    }

    fn soft_switch_states(&self) -> Vec<SoftSwitchState> {
        vec![SoftSwitchState { name: "ALTCHAR", address: 0xc00e, value: self.altchar }]
    }
}

impl IoHandler for CharacterController {
    fn io_read(&mut self, offset: u8, ctx: AccessContext) -> u8 {
        if offset == 0x1e {
            return if self.altchar { 0x80 } else { 0x00 };
        }
        if !ctx.no_side_effects {
            self.handle_write(offset);
        }
        0xff
    }

    fn io_write(&mut self, offset: u8, _value: u8, ctx: AccessContext) {
        if !ctx.no_side_effects {
            self.handle_write(offset);
        }
    }
}
