// Spec: §3 "80-column / auxiliary memory state", §4.4 "80-column /
// auxiliary-memory controller", §4.6, §9 (push strategy)
//
// Design: no teacher analogue for the routing table itself; the push
// mechanism mirrors the teacher's `IoPort::set_observer`
// (`zinc64-core/src/util/io_port.rs`) callback style, generalized from "one
// observer" to "push into two owned routing structures (page-0 table,
// Cx-ROM routing cell) on every relevant switch write".

use a2e_core::{AccessContext, Peripheral, PeripheralKind, Shared, SoftSwitchState};

use crate::composite_io::CxRomRouting;
use crate::io_page::IoHandler;
use crate::page0::{RoutingEntry, RoutingTable};

pub struct AuxMemoryController {
    store80: bool,
    ramrd: bool,
    ramwrt: bool,
    intcxrom: bool,
    altzp: bool,
    slotc3rom: bool,
    col80: bool,
    page2: bool,
    hires: bool,
    routing: Shared<RoutingTable>,
    cx_routing: a2e_core::SharedCell<CxRomRouting>,
}

impl AuxMemoryController {
    pub fn new(routing: Shared<RoutingTable>, cx_routing: a2e_core::SharedCell<CxRomRouting>) -> Self {
        let mut controller = Self {
            store80: false,
            ramrd: false,
            ramwrt: false,
            intcxrom: false,
            altzp: false,
            slotc3rom: false,
            col80: false,
            page2: false,
            hires: false,
            routing,
            cx_routing,
        };
        controller.recompute();
        controller
    }

    /// Called by the video-mode controller whenever `PAGE2` changes (§4.4).
    pub fn set_page2(&mut self, value: bool) {
        self.page2 = value;
        self.recompute();
    }

    /// Called by the video-mode controller whenever `HIRES` changes.
    pub fn set_hires(&mut self, value: bool) {
        self.hires = value;
        self.recompute();
    }

    fn recompute(&mut self) {
        let zero_page_stack = RoutingEntry { read_aux: self.altzp, write_aux: self.altzp };

        let text_page1 = if self.store80 {
            RoutingEntry { read_aux: self.page2, write_aux: self.page2 }
        } else {
            RoutingEntry { read_aux: self.ramrd, write_aux: self.ramwrt }
        };

        let hires_page1 = if self.store80 && self.hires {
            RoutingEntry { read_aux: self.page2, write_aux: self.page2 }
        } else {
            RoutingEntry { read_aux: self.ramrd, write_aux: self.ramwrt }
        };

        let general = RoutingEntry { read_aux: self.ramrd, write_aux: self.ramwrt };

        *self.routing.borrow_mut() = RoutingTable { zero_page_stack, text_page1, hires_page1, general };
        self.cx_routing.set(CxRomRouting { intcxrom: self.intcxrom, slotc3rom: self.slotc3rom });
    }

    fn handle_write(&mut self, offset: u8) {
        match offset {
            0x00 => self.store80 = false,
            0x01 => self.store80 = true,
            0x02 => self.ramrd = false,
            0x03 => self.ramrd = true,
            0x04 => self.ramwrt = false,
            0x05 => self.ramwrt = true,
            0x06 => self.intcxrom = false,
            0x07 => self.intcxrom = true,
            0x08 => self.altzp = false,
            0x09 => self.altzp = true,
            0x0a => self.slotc3rom = false,
            0x0b => self.slotc3rom = true,
            0x0c => self.col80 = false,
            0x0d => self.col80 = true,
            _ => return,
        }
        self.recompute();
    }

    fn status_bit(&self, offset: u8) -> Option<bool> {
        match offset {
            0x13 => Some(self.ramrd),
            0x14 => Some(self.ramwrt),
            0x15 => Some(self.intcxrom),
            0x16 => Some(self.altzp),
            0x17 => Some(self.slotc3rom),
            0x18 => Some(self.store80),
            0x1f => Some(self.col80),
            _ => None,
        }
    }
}

impl Peripheral for AuxMemoryController {
    fn name(&self) -> &'static str {
        "80-column-card"
    }

    fn kind(&self) -> PeripheralKind {
        PeripheralKind::Motherboard
    }

    fn reset(&mut self) {
        self.store80 = false;
        self.ramrd = false;
        self.ramwrt = false;
        self.intcxrom = false;
        self.altzp = false;
        self.slotc3rom = false;
        self.col80 = false;
        self.page2 = false;
        self.hires = false;
        self.recompute();
    }

    fn soft_switch_states(&self) -> Vec<SoftSwitchState> {
        vec![
            SoftSwitchState { name: "80STORE", address: 0xc000, value: self.store80 },
            SoftSwitchState { name: "RAMRD", address: 0xc002, value: self.ramrd },
            SoftSwitchState { name: "RAMWRT", address: 0xc004, value: self.ramwrt },
            SoftSwitchState { name: "INTCXROM", address: 0xc006, value: self.intcxrom },
            SoftSwitchState { name: "ALTZP", address: 0xc008, value: self.altzp },
            SoftSwitchState { name: "SLOTC3ROM", address: 0xc00a, value: self.slotc3rom },
            SoftSwitchState { name: "80COL", address: 0xc00c, value: self.col80 },
        ]
    }
}

impl IoHandler for AuxMemoryController {
    fn io_read(&mut self, offset: u8, _ctx: AccessContext) -> u8 {
        match self.status_bit(offset) {
            Some(true) => 0x80,
            Some(false) => 0x00,
            None => 0xff,
        }
    }

    fn io_write(&mut self, offset: u8, _value: u8, ctx: AccessContext) {
        if !ctx.no_side_effects {
            self.handle_write(offset);
        }
    }
}
