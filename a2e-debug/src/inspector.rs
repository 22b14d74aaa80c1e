// Spec: §9 "the disassembler and debugger window read from the bus without
// perturbing the machine", §4.3/§4.4 "no_side_effects"
//
// Design: trimmed from the teacher's `zinc64-debug/src/debugger.rs`
// (`Command::MemRead`/`RegRead`, a TCP-served monitor protocol) down to the
// part that survives this spec's scope: reads that never mutate switch,
// latch, or scheduler state. The 65C02 disassembler and the monitor's
// network/command-line surface are explicitly out of scope here.

use a2e_bus::MemoryBus;
use a2e_core::{AccessContext, Peripheral, Shared, SoftSwitchState};

/// A read-only window onto a running machine's bus and peripherals. Every
/// read goes through `AccessContext::debug_read`, so it never flips a
/// switch, moves the expansion-ROM latch, or perturbs the language-card R×2
/// latch (spec §8 invariant: "`bus.read8(A, debug_read)` is pure").
pub struct Inspector<'a> {
    bus: &'a Shared<MemoryBus>,
}

impl<'a> Inspector<'a> {
    pub fn new(bus: &'a Shared<MemoryBus>) -> Self {
        Self { bus }
    }

    pub fn read_byte(&self, address: u16) -> u8 {
        self.bus.borrow().read8(address, AccessContext::debug_read(address, 0))
    }

    pub fn read_word(&self, address: u16) -> u16 {
        self.bus.borrow().read16(address, AccessContext::debug_read(address, 0))
    }

    /// Reads `len` consecutive bytes starting at `start`, wrapping at the
    /// 64 KiB address boundary the way a memory-dump command would.
    pub fn read_range(&self, start: u16, len: usize) -> Vec<u8> {
        (0..len).map(|i| self.read_byte(start.wrapping_add(i as u16))).collect()
    }

    /// Flattens every peripheral's `soft_switch_states()` into one list, for
    /// a debugger's switch-status pane.
    pub fn soft_switches(&self, peripherals: &[Shared<dyn Peripheral>]) -> Vec<SoftSwitchState> {
        peripherals.iter().flat_map(|p| p.borrow().soft_switch_states()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use a2e_bus::{IoHandler, LanguageCardController, Mapping};
    use a2e_core::{new_shared, AccessIntent, BusTarget, PhysicalMemory};

    fn bus_with_ram() -> Shared<MemoryBus> {
        let bus = new_shared(MemoryBus::new(0xff));
        let block = new_shared(PhysicalMemory::new(0x10000, 0x00, "ram").unwrap());
        let (phys_base, length) = block.borrow().slice(0, 0x10000).unwrap();
        bus.borrow_mut()
            .add_base_mapping(Mapping {
                virtual_base: 0x0000,
                size: 0x10000,
                target: BusTarget::RamSlice { block: block.clone(), phys_base, length },
                region_tag: "ram",
            })
            .unwrap();
        bus
    }

    #[test]
    fn read_byte_matches_a_plain_read() {
        let bus = bus_with_ram();
        bus.borrow().write8(0x1234, 0x42, AccessContext::new(0x1234, AccessIntent::DataWrite, 0));
        let inspector = Inspector::new(&bus);
        assert_eq!(0x42, inspector.read_byte(0x1234));
    }

    #[test]
    fn debug_read_does_not_perturb_language_card_latch() {
        let bus = new_shared(MemoryBus::new(0xff));
        let rom = new_shared(PhysicalMemory::new(0x3000, 0xaa, "rom").unwrap());
        let (phys_base, length) = rom.borrow().slice(0, 0x3000).unwrap();
        bus.borrow_mut()
            .add_base_mapping(Mapping {
                virtual_base: 0xd000,
                size: 0x3000,
                target: BusTarget::RomSlice { block: rom.clone(), phys_base, length },
                region_tag: "rom",
            })
            .unwrap();
        let lc_ram = new_shared(PhysicalMemory::new(0x4000, 0x00, "lc").unwrap());
        let controller = new_shared(LanguageCardController::attach(&bus, &lc_ram, 10).unwrap());

        let inspector = Inspector::new(&bus);
        // A debug read of an odd $C08x offset must never arm the R×2 latch.
        controller.borrow_mut().io_read(0x83, AccessContext::debug_read(0xc083, 0));
        controller.borrow_mut().io_read(0x83, AccessContext::debug_read(0xc083, 0));
        bus.borrow().write8(0xd000, 0x42, AccessContext::new(0xd000, AccessIntent::DataWrite, 0));
        assert_eq!(0xaa, inspector.read_byte(0xd000));
    }

    #[test]
    fn read_range_wraps_at_address_boundary() {
        let bus = bus_with_ram();
        bus.borrow().write8(0xffff, 0x11, AccessContext::new(0xffff, AccessIntent::DataWrite, 0));
        bus.borrow().write8(0x0000, 0x22, AccessContext::new(0x0000, AccessIntent::DataWrite, 0));
        let inspector = Inspector::new(&bus);
        assert_eq!(vec![0x11, 0x22], inspector.read_range(0xffff, 2));
    }
}
