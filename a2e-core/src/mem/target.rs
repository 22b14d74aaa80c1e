// Part of the Apple IIe emulator core.
//
// Spec: §3 "Bus target", §4.2 "Access context", §9 "Polymorphic bus targets"
//
// Design: the source this spec distills used a deep interface hierarchy for
// bus targets (RAM / ROM / memory-mapped handler). We express that instead
// as a small, closed tagged union dispatched with a single match, so the
// hot path (one of these per CPU cycle) never pays for a virtual call.
// `Handler` carries a small integer indexing into the owning machine's
// dispatch table rather than a trait object.

use bit_field::BitField;

use crate::util::Shared;

use super::block::PhysicalMemory;

/// What the CPU intended to do with this access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessIntent {
    DataRead,
    DataWrite,
    InstructionFetch,
    DebugRead,
}

impl AccessIntent {
    pub fn is_write(self) -> bool {
        matches!(self, AccessIntent::DataWrite)
    }

    pub fn is_debug(self) -> bool {
        matches!(self, AccessIntent::DebugRead)
    }
}

/// Where the access originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessSource {
    Cpu,
    Dma,
}

/// Everything the bus and every handler downstream of it need to know about
/// one access. `no_side_effects` must be honored by every soft-switch
/// handler and the composite I/O target: a debugger window must never flip
/// a switch, move the expansion-ROM latch, or perturb the language-card
/// R×2 latch.
#[derive(Debug, Clone, Copy)]
pub struct AccessContext {
    pub address: u16,
    pub intent: AccessIntent,
    pub source: AccessSource,
    pub cycle: u64,
    pub no_side_effects: bool,
}

impl AccessContext {
    pub fn new(address: u16, intent: AccessIntent, cycle: u64) -> Self {
        Self {
            address,
            intent,
            source: AccessSource::Cpu,
            cycle,
            no_side_effects: matches!(intent, AccessIntent::DebugRead),
        }
    }

    pub fn debug_read(address: u16, cycle: u64) -> Self {
        Self::new(address, AccessIntent::DebugRead, cycle)
    }
}

/// Capability flags a bus target (or the permission mask of a layer)
/// carries independently of the mapping that selects it, so "aux RAM
/// readable, writes fall through" is directly expressible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities(u8);

impl Capabilities {
    const READABLE: usize = 0;
    const WRITABLE: usize = 1;
    const EXECUTABLE: usize = 2;
    const SIDE_EFFECT_FREE_READABLE: usize = 3;

    pub const NONE: Capabilities = Capabilities(0);
    pub const READ_WRITE: Capabilities = Capabilities(0b0000_0011);
    pub const READ_ONLY: Capabilities = Capabilities(0b0000_0001);
    pub const WRITE_ONLY: Capabilities = Capabilities(0b0000_0010);
    pub const FULL: Capabilities = Capabilities(0b0000_1111);

    pub fn readable(self) -> bool {
        self.0.get_bit(Self::READABLE)
    }

    pub fn writable(self) -> bool {
        self.0.get_bit(Self::WRITABLE)
    }

    pub fn executable(self) -> bool {
        self.0.get_bit(Self::EXECUTABLE)
    }

    pub fn side_effect_free_readable(self) -> bool {
        self.0.get_bit(Self::SIDE_EFFECT_FREE_READABLE)
    }

    pub fn with_readable(mut self, value: bool) -> Self {
        self.0.set_bit(Self::READABLE, value);
        self
    }

    pub fn with_writable(mut self, value: bool) -> Self {
        self.0.set_bit(Self::WRITABLE, value);
        self
    }

    pub fn permits(self, intent: AccessIntent) -> bool {
        match intent {
            AccessIntent::DataRead | AccessIntent::DebugRead => self.readable(),
            AccessIntent::DataWrite => self.writable(),
            AccessIntent::InstructionFetch => self.executable() || self.readable(),
        }
    }

    /// Bitwise AND of two capability sets — a layer's declared permissions
    /// narrowing what its mappings would otherwise allow (spec: "layers
    /// carry permissions independently of their mappings").
    pub fn intersect(self, other: Self) -> Self {
        Capabilities(self.0 & other.0)
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Capabilities::READ_WRITE
    }
}

/// A windowed, offset-based view into a `PhysicalMemory` block, or a
/// reference to a handler component resolved through the owning machine's
/// dispatch table. Region offsets passed to `read8`/`write8` are zero-based
/// within the target, never absolute addresses.
#[derive(Clone)]
pub enum BusTarget {
    /// A slice `(block, phys_base, length)` that permits reads and writes.
    RamSlice {
        block: Shared<PhysicalMemory>,
        phys_base: usize,
        length: usize,
    },
    /// Same shape as `RamSlice`, but writes are silently discarded.
    RomSlice {
        block: Shared<PhysicalMemory>,
        phys_base: usize,
        length: usize,
    },
    /// A small integer indexing into the owning machine's per-component
    /// dispatch table (I/O dispatcher slot, composite router, peripheral).
    Handler(u32),
}

impl BusTarget {
    pub fn capabilities(&self) -> Capabilities {
        match self {
            BusTarget::RamSlice { .. } => Capabilities::READ_WRITE.with_readable(true),
            BusTarget::RomSlice { .. } => Capabilities::READ_ONLY,
            BusTarget::Handler(_) => Capabilities::READ_WRITE,
        }
    }

    /// Reads through this target at `region_offset`, a zero-based offset
    /// within the target (not an absolute address). `Handler` targets are
    /// not resolvable here; the bus dispatches those to the owning
    /// machine's table directly.
    pub fn read8_direct(&self, region_offset: usize) -> Option<u8> {
        match self {
            BusTarget::RamSlice { block, phys_base, length }
            | BusTarget::RomSlice { block, phys_base, length } => {
                if region_offset >= *length {
                    return None;
                }
                Some(block.borrow().read(phys_base + region_offset))
            }
            BusTarget::Handler(_) => None,
        }
    }

    pub fn write8_direct(&self, region_offset: usize, value: u8) -> bool {
        match self {
            BusTarget::RamSlice { block, phys_base, length } => {
                if region_offset >= *length {
                    return false;
                }
                block.borrow_mut().write(phys_base + region_offset, value);
                true
            }
            BusTarget::RomSlice { .. } => false,
            BusTarget::Handler(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::new_shared;

    #[test]
    fn ram_slice_read_write() {
        let block = new_shared(PhysicalMemory::new(0x100, 0x00, "ram").unwrap());
        let (phys_base, length) = block.borrow().slice(0x10, 0x10).unwrap();
        let target = BusTarget::RamSlice { block: block.clone(), phys_base, length };
        assert!(target.write8_direct(0x00, 0x42));
        assert_eq!(Some(0x42), target.read8_direct(0x00));
        assert_eq!(0x42, block.borrow().read(0x10));
    }

    #[test]
    fn rom_slice_discards_writes() {
        let block = new_shared(PhysicalMemory::new(0x100, 0xAB, "rom").unwrap());
        let (phys_base, length) = block.borrow().slice(0, 0x100).unwrap();
        let target = BusTarget::RomSlice { block: block.clone(), phys_base, length };
        assert!(!target.write8_direct(0x05, 0x99));
        assert_eq!(Some(0xAB), target.read8_direct(0x05));
    }

    #[test]
    fn capabilities_permit_matches_intent() {
        let ro = Capabilities::READ_ONLY;
        assert!(ro.permits(AccessIntent::DataRead));
        assert!(!ro.permits(AccessIntent::DataWrite));
        let wo = Capabilities::WRITE_ONLY;
        assert!(!wo.permits(AccessIntent::DataRead));
        assert!(wo.permits(AccessIntent::DataWrite));
    }

    #[test]
    fn debug_read_is_marked_side_effect_free() {
        let ctx = AccessContext::debug_read(0x1234, 10);
        assert!(ctx.no_side_effects);
        assert!(ctx.intent.is_debug());
    }
}
