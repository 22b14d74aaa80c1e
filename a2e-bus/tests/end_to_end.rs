// End-to-end scenarios from spec §8, exercised through a real `MemoryBus`
// with `CompositeIoTarget` registered as a handler the way `a2e_system::Machine`
// assembles it, but without a CPU or scheduler — just the bus fabric.

use a2e_bus::{new_cx_rom_routing, AuxMemoryController, CompositeIoTarget, IoDispatcher, Mapping, MemoryBus, RoutingTable, SlotManager};
use a2e_core::{new_shared, new_shared_cell, AccessContext, AccessIntent, BusTarget, PhysicalMemory, Shared};

struct SlotCardStub {
    rom_byte: u8,
    expansion_first_byte: Option<u8>,
}

impl a2e_core::Peripheral for SlotCardStub {
    fn name(&self) -> &'static str {
        "stub"
    }
    fn kind(&self) -> a2e_core::PeripheralKind {
        a2e_core::PeripheralKind::SlotCard
    }
    fn reset(&mut self) {}
}

impl a2e_core::SlotCard for SlotCardStub {
    fn read_slot_rom(&self, _offset: u8) -> u8 {
        self.rom_byte
    }
    fn has_expansion_rom(&self) -> bool {
        self.expansion_first_byte.is_some()
    }
    fn read_expansion_rom(&self, offset: u16) -> u8 {
        if offset == 0 {
            self.expansion_first_byte.unwrap_or(0xff)
        } else {
            0xff
        }
    }
}

struct DefaultExpansionRomStub(u8);

impl a2e_bus::ExpansionRomSource for DefaultExpansionRomStub {
    fn read_default_expansion_rom(&self, offset: u16) -> u8 {
        if offset == 0 {
            self.0
        } else {
            0xff
        }
    }
}

fn write_ctx(addr: u16) -> AccessContext {
    AccessContext::new(addr, AccessIntent::DataWrite, 0)
}

fn read_ctx(addr: u16) -> AccessContext {
    AccessContext::new(addr, AccessIntent::DataRead, 0)
}

/// Assembles a bus with the $C000-$CFFF composite target and the 80-column
/// controller's INTCXROM/SLOTC3ROM switches wired in, mirroring the slice of
/// `Machine::build` those switches need. Slot 3 is left unoccupied and the
/// internal ROM carries a distinct byte at $C300's offset so internal-vs-
/// slot-vs-floating routing are all distinguishable.
fn build_bus() -> Shared<MemoryBus> {
    let bus = new_shared(MemoryBus::new(0xff));
    let routing = new_shared(RoutingTable::default());
    let cx_routing = new_cx_rom_routing();
    let slots = new_shared(SlotManager::new());

    let aux = new_shared(AuxMemoryController::new(routing, cx_routing.clone()));

    let mut dispatcher = IoDispatcher::new();
    for offset in 0x00u8..=0x0d {
        dispatcher.register_write(offset, "80-column-card", aux.clone()).unwrap();
    }
    for &offset in &[0x13u8, 0x14, 0x15, 0x16, 0x17, 0x18, 0x1f] {
        dispatcher.register_read(offset, "80-column-card", aux.clone()).unwrap();
    }

    let mut cio = CompositeIoTarget::new(slots, cx_routing);
    *cio.dispatcher_mut() = dispatcher;
    let internal_rom = new_shared(PhysicalMemory::new(0x0700, 0xaa, "internal").unwrap());
    cio.set_internal_rom(internal_rom);

    let handler_id = bus.borrow_mut().register_handler(new_shared(cio));
    bus.borrow_mut()
        .add_base_mapping(Mapping {
            virtual_base: 0xc000,
            size: 0x1000,
            target: BusTarget::Handler(handler_id),
            region_tag: "io_page",
        })
        .unwrap();

    bus
}

#[test]
fn slot_3_routing_follows_intcxrom_and_slotc3rom() {
    let bus = build_bus();

    // Power on: SLOTC3ROM defaults to 0 -> internal ROM served.
    assert_eq!(0xaa, bus.borrow().read8(0xc300, read_ctx(0xc300)));

    bus.borrow().write8(0xc00b, 0, write_ctx(0xc00b)); // SLOTC3ROM on
    assert_eq!(0xff, bus.borrow().read8(0xc300, read_ctx(0xc300))); // routed to empty slot 3, floats

    bus.borrow().write8(0xc007, 0, write_ctx(0xc007)); // INTCXROM on
    assert_eq!(0xaa, bus.borrow().read8(0xc300, read_ctx(0xc300))); // internal ROM again, regardless of SLOTC3ROM
}

#[test]
fn expansion_rom_latch_follows_slot_access_and_cfff() {
    let bus = new_shared(MemoryBus::new(0xff));
    let routing = new_shared(RoutingTable::default());
    let cx_routing = new_cx_rom_routing();
    let slots = new_shared(SlotManager::new());
    slots.borrow_mut().set_default_expansion_rom(new_shared(DefaultExpansionRomStub(0xd8)));
    slots
        .borrow_mut()
        .install(6, new_shared(SlotCardStub { rom_byte: 0x06, expansion_first_byte: Some(0x66) }))
        .unwrap();

    let cio = CompositeIoTarget::new(slots, cx_routing);
    let handler_id = bus.borrow_mut().register_handler(new_shared(cio));
    bus.borrow_mut()
        .add_base_mapping(Mapping {
            virtual_base: 0xc000,
            size: 0x1000,
            target: BusTarget::Handler(handler_id),
            region_tag: "io_page",
        })
        .unwrap();

    assert_eq!(0xd8, bus.borrow().read8(0xc800, read_ctx(0xc800)));
    bus.borrow().read8(0xc600, read_ctx(0xc600)); // touch slot 6's ROM, latches it
    assert_eq!(0x66, bus.borrow().read8(0xc800, read_ctx(0xc800)));
    bus.borrow().read8(0xcfff, read_ctx(0xcfff)); // resets latch to default
    assert_eq!(0xd8, bus.borrow().read8(0xc800, read_ctx(0xc800)));
}
