// Spec: §4.5 "Slot manager and composite I/O target"
//
// Design: one `BusHandler` spanning the whole `$C000-$CFFF` base region,
// routing by sub-range the way the teacher's `Mmio::read`/`write` routes
// `$D000-$DFFF` by sub-range (`zinc64-emu/src/mem/mmio.rs`), but consulting
// pushed routing flags instead of a fixed chip list since the routing here
// depends on soft switches rather than a static chip map.

use a2e_core::{new_shared_cell, AccessContext, PhysicalMemory, Shared, SharedCell};

use crate::bus::BusHandler;
use crate::io_page::IoDispatcher;
use crate::slot_manager::SlotManager;

/// Pushed by the 80-column controller whenever `INTCXROM`/`SLOTC3ROM`
/// change (§9's push strategy, applied here as well as at page 0, since
/// this routing is also consulted on every `$C1xx-$C7xx` access).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CxRomRouting {
    pub intcxrom: bool,
    pub slotc3rom: bool,
}

pub fn new_cx_rom_routing() -> SharedCell<CxRomRouting> {
    new_shared_cell(CxRomRouting::default())
}

/// Routes `$C000-$CFFF`: the I/O dispatcher for `$C0xx`, the internal ROM
/// overlay or slot ROMs for `$C1xx-$C7xx` (with the `$C3xx` special case),
/// and the expansion-ROM latch for `$C8xx-$CFxx`.
pub struct CompositeIoTarget {
    dispatcher: IoDispatcher,
    slots: Shared<SlotManager>,
    routing: SharedCell<CxRomRouting>,
    internal_rom: Option<Shared<PhysicalMemory>>,
}

impl CompositeIoTarget {
    pub fn new(slots: Shared<SlotManager>, routing: SharedCell<CxRomRouting>) -> Self {
        Self {
            dispatcher: IoDispatcher::new(),
            slots,
            routing,
            internal_rom: None,
        }
    }

    pub fn dispatcher_mut(&mut self) -> &mut IoDispatcher {
        &mut self.dispatcher
    }

    /// Installs the motherboard's internal ROM overlay covering
    /// `$C100-$C7FF` (1792 bytes), served when `INTCXROM` is set, or for
    /// `$C300-$C3FF` alone when `SLOTC3ROM` is clear.
    pub fn set_internal_rom(&mut self, rom: Shared<PhysicalMemory>) {
        self.internal_rom = Some(rom);
    }

    fn read_c1_c7(&self, address: u16, no_side_effects: bool) -> u8 {
        let routing = self.routing.get();
        let slot = ((address >> 8) & 0x0f) as u8;

        let use_internal = if address >= 0xc300 && address < 0xc400 {
            routing.intcxrom || !routing.slotc3rom
        } else {
            routing.intcxrom
        };

        if !no_side_effects {
            if address >= 0xc300 && address < 0xc400 && use_internal {
                // Served from internal ROM, not slot 3's hardware: the latch
                // follows what was actually read, not the address's slot bits.
                self.slots.borrow_mut().observe_slot_access(0x0f, 0xff, no_side_effects);
            } else {
                self.slots.borrow_mut().observe_slot_access(slot, (address & 0xff) as u8, no_side_effects);
            }
        }

        if use_internal {
            self.internal_rom
                .as_ref()
                .map(|rom| rom.borrow().read((address - 0xc100) as usize))
                .unwrap_or(0xff)
        } else {
            self.slots.borrow().slot_rom_byte(slot, (address & 0xff) as u8).unwrap_or(0xff)
        }
    }

    fn read_c8_cf(&self, address: u16, no_side_effects: bool) -> u8 {
        if !no_side_effects && address == 0xcfff {
            self.slots.borrow_mut().observe_slot_access(0x0f, 0xff, no_side_effects);
        }
        self.slots.borrow().read_expansion_rom(address - 0xc800)
    }
}

impl BusHandler for CompositeIoTarget {
    fn read8(&mut self, region_offset: u32, ctx: AccessContext) -> u8 {
        let address = 0xc000u16.wrapping_add(region_offset as u16);
        match address {
            0xc000..=0xc0ff => self
                .dispatcher
                .read((address & 0xff) as u8, ctx)
                .unwrap_or(0xff),
            0xc100..=0xc7ff => self.read_c1_c7(address, ctx.no_side_effects),
            _ => self.read_c8_cf(address, ctx.no_side_effects),
        }
    }

    fn write8(&mut self, region_offset: u32, value: u8, ctx: AccessContext) {
        let address = 0xc000u16.wrapping_add(region_offset as u16);
        if let 0xc000..=0xc0ff = address {
            self.dispatcher.write((address & 0xff) as u8, value, ctx);
        }
        // Slot ROMs, the internal overlay and expansion ROMs are read-only
        // from the bus's perspective; writes there are discarded.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use a2e_core::{new_shared, AccessIntent, Peripheral, PeripheralKind, SlotCard};

    fn ctx(addr: u16) -> AccessContext {
        AccessContext::new(addr, AccessIntent::DataRead, 0)
    }

    struct TestCard(u8, Option<u8>);

    impl Peripheral for TestCard {
        fn name(&self) -> &'static str {
            "test"
        }
        fn kind(&self) -> PeripheralKind {
            PeripheralKind::SlotCard
        }
        fn reset(&mut self) {}
    }

    impl SlotCard for TestCard {
        fn read_slot_rom(&self, _offset: u8) -> u8 {
            self.0
        }
        fn has_expansion_rom(&self) -> bool {
            self.1.is_some()
        }
        fn read_expansion_rom(&self, _offset: u16) -> u8 {
            self.1.unwrap_or(0xff)
        }
    }

    fn setup() -> CompositeIoTarget {
        let slots = new_shared(SlotManager::new());
        slots.borrow_mut().install(3, new_shared(TestCard(0x33, None))).unwrap();
        let routing = new_cx_rom_routing();
        CompositeIoTarget::new(slots, routing)
    }

    #[test]
    fn slot_rom_served_when_intcxrom_clear() {
        let mut target = setup();
        assert_eq!(0x33, target.read8(0x0300, ctx(0xc300)));
    }

    #[test]
    fn c300_falls_back_to_internal_when_slotc3rom_clear() {
        let mut target = setup();
        let internal = new_shared(PhysicalMemory::new(0x0700, 0xaa, "internal").unwrap());
        target.set_internal_rom(internal);
        target.routing.set(CxRomRouting { intcxrom: false, slotc3rom: false });
        assert_eq!(0xaa, target.read8(0x0300, ctx(0xc300)));
    }

    #[test]
    fn other_slot_pages_ignore_slotc3rom() {
        let mut target = setup();
        let internal = new_shared(PhysicalMemory::new(0x0700, 0xaa, "internal").unwrap());
        target.set_internal_rom(internal);
        target.routing.set(CxRomRouting { intcxrom: false, slotc3rom: false });
        // $C400 (slot 4, unoccupied) must not be forced internal by slotc3rom=false.
        assert_eq!(0xff, target.read8(0x0400, ctx(0xc400)));
    }

    #[test]
    fn slot3_with_expansion_rom_does_not_latch_when_forced_internal() {
        let slots = new_shared(SlotManager::new());
        slots.borrow_mut().install(3, new_shared(TestCard(0x33, Some(0x77)))).unwrap();
        let routing = new_cx_rom_routing();
        let mut target = CompositeIoTarget::new(slots, routing);
        let internal = new_shared(PhysicalMemory::new(0x0700, 0xaa, "internal").unwrap());
        target.set_internal_rom(internal);
        target.routing.set(CxRomRouting { intcxrom: false, slotc3rom: false }); // forces $C300 internal

        assert_eq!(0xaa, target.read8(0x0300, ctx(0xc300))); // served from internal ROM
        // The latch must still sit on the default source, not slot 3's
        // expansion ROM, even though slot 3 does carry one.
        assert_eq!(0xff, target.read8(0x0800, ctx(0xc800))); // no default source installed, floats
    }
}
