// Spec: §4.4 "Video mode controller"
//
// Design: a thin soft-switch bank with no bus-layer effect of its own;
// registers directly with the I/O dispatcher the way the teacher's `Vic`
// registers its control registers (`zinc64-core/src/io/vic.rs`), except
// this controller also has to forward `PAGE2`/`HIRES` into the 80-column
// controller's routing recompute (§4.4: "the video-mode controller's PAGE2
// and HIRES switches are observed by the 80-column controller").
//
// `$C01F` (80-column status) is registered by `AuxMemoryController`, not
// here, even though this controller's own status-read range ($C019-$C01F)
// is otherwise contiguous with it: 80COL is that controller's switch, and
// letting it own the read keeps one switch's state in exactly one place.

use a2e_core::{AccessContext, Peripheral, PeripheralKind, Shared, SoftSwitchState};

use crate::io_page::IoHandler;
use crate::switches::aux_memory::AuxMemoryController;

pub struct VideoModeController {
    text: bool,
    mixed: bool,
    page2: bool,
    hires: bool,
    an3: bool,
    vbl_active: bool,
    aux: Shared<AuxMemoryController>,
}

impl VideoModeController {
    pub fn new(aux: Shared<AuxMemoryController>) -> Self {
        Self {
            text: true,
            mixed: false,
            page2: false,
            hires: false,
            an3: false,
            vbl_active: false,
            aux,
        }
    }

    /// Called by whatever consumes the scheduler's `VideoBlankStart`/
    /// `VideoBlankEnd` events (spec §4.7: "VBL enters/exits set a boolean on
    /// the video controller that is observed by `$C019` status reads").
    pub fn set_vbl(&mut self, active: bool) {
        self.vbl_active = active;
    }

    fn set_page2(&mut self, value: bool) {
        self.page2 = value;
        self.aux.borrow_mut().set_page2(value);
    }

    fn set_hires(&mut self, value: bool) {
        self.hires = value;
        self.aux.borrow_mut().set_hires(value);
    }

    fn handle_write(&mut self, offset: u8) {
        match offset {
            0x50 => self.text = false,
            0x51 => self.text = true,
            0x52 => self.mixed = false,
            0x53 => self.mixed = true,
            0x54 => self.set_page2(false),
            0x55 => self.set_page2(true),
            0x56 => self.set_hires(false),
            0x57 => self.set_hires(true),
            0x5e => self.an3 = false,
            0x5f => self.an3 = true,
            _ => {}
        }
    }

    fn status_bit(&self, offset: u8) -> Option<bool> {
        match offset {
            0x19 => Some(!self.vbl_active), // VBL status reads inverted: bit 7 clear during blank
            0x1a => Some(self.text),
            0x1b => Some(self.mixed),
            0x1c => Some(self.page2),
            0x1d => Some(self.hires),
            _ => None,
        }
    }
}

impl Peripheral for VideoModeController {
    fn name(&self) -> &'static str {
        "video-mode"
    }

    fn kind(&self) -> PeripheralKind {
        PeripheralKind::Motherboard
    }

    fn reset(&mut self) {
        self.text = true;
        self.mixed = false;
        self.an3 = false;
        self.vbl_active = false;
        self.set_page2(false);
        self.set_hires(false);
    }

    fn soft_switch_states(&self) -> Vec<SoftSwitchState> {
        vec![
            SoftSwitchState { name: "TEXT", address: 0xc050, value: self.text },
            SoftSwitchState { name: "MIXED", address: 0xc052, value: self.mixed },
            SoftSwitchState { name: "PAGE2", address: 0xc054, value: self.page2 },
            SoftSwitchState { name: "HIRES", address: 0xc056, value: self.hires },
        ]
    }
}

impl IoHandler for VideoModeController {
    fn io_read(&mut self, offset: u8, ctx: AccessContext) -> u8 {
        if let Some(bit) = self.status_bit(offset) {
            if bit {
                0x80
            } else {
                0x00
            }
        } else {
            if !ctx.no_side_effects {
                self.handle_write(offset);
            }
            0xff
        }
    }

    fn io_write(&mut self, offset: u8, _value: u8, ctx: AccessContext) {
        if !ctx.no_side_effects {
            self.handle_write(offset);
        }
    }
}
