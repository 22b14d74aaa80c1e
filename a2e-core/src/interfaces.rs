// Part of the Apple IIe emulator core.
//
// Spec: §6 EXTERNAL INTERFACES
//
// These traits describe the collaborators the bus fabric consumes or is
// consumed by. Their bodies (a 65C02 decoder, disk-bitstream timing,
// keyboard scan-code tables) are explicitly out of scope (spec §1); only
// the contracts live here, mirroring the teacher's `Cpu`/`Chip`/`Tape`
// traits in `zinc64-core/src/factory/types.rs`.

use crate::error::IoError;

/// Run-state a `Cpu::step` reports back to the outer loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Halted,
    StopRequested,
}

/// The CPU core this fabric drives. Every memory operation the CPU performs
/// during `step` must go through `bus.read8`/`write8`/`read16` — the core
/// itself never reaches into memory directly.
pub trait Cpu {
    /// Decodes and executes one instruction, returning the number of cycles
    /// consumed and the resulting run state.
    fn step(&mut self) -> (u32, RunState);

    fn reset(&mut self);

    fn pc(&self) -> u16;
    fn set_pc(&mut self, value: u16);
}

/// What kind of peripheral this is, for `Machine::reset`'s device walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeripheralKind {
    Motherboard,
    SlotCard,
}

/// A `{offset, value}` pair exposed for debugger introspection of a
/// controller's switches (spec §6 "Peripheral registration").
#[derive(Debug, Clone, Copy)]
pub struct SoftSwitchState {
    pub name: &'static str,
    pub address: u16,
    pub value: bool,
}

/// A component attached to the bus: a motherboard controller (language
/// card, 80-column card) or a slot card.
pub trait Peripheral {
    fn name(&self) -> &'static str;
    fn kind(&self) -> PeripheralKind;
    fn slot_number(&self) -> Option<u8> {
        None
    }

    fn reset(&mut self);

    /// Introspection for a debugger; empty by default.
    fn soft_switch_states(&self) -> Vec<SoftSwitchState> {
        Vec::new()
    }
}

/// A card installed in one of the seven numbered slots. Exposes the
/// 256-byte slot ROM at `$Cs00-$CsFF` and, optionally, the 2 KiB expansion
/// ROM latched in at `$C800-$CFFF` while this slot is selected.
pub trait SlotCard: Peripheral {
    fn read_slot_rom(&self, offset: u8) -> u8;

    fn has_expansion_rom(&self) -> bool {
        false
    }

    fn read_expansion_rom(&self, offset: u16) -> u8 {
        let _ = offset;
        0xff
    }
}

/// Synchronous block-device contract for disk/SmartPort peripherals (spec
/// §6). Image parsing and wire protocol are out of scope; this is only the
/// read/write surface a Disk II or SmartPort peripheral would sit behind.
pub trait BlockDevice {
    fn block_count(&self) -> u32;
    fn block_size(&self) -> usize {
        512
    }
    fn is_read_only(&self) -> bool;

    fn read_block(&mut self, block: u32, buf: &mut [u8]) -> Result<(), IoError>;
    fn write_block(&mut self, block: u32, buf: &[u8]) -> Result<(), IoError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullBlockDevice;

    impl BlockDevice for NullBlockDevice {
        fn block_count(&self) -> u32 {
            0
        }
        fn is_read_only(&self) -> bool {
            true
        }
        fn read_block(&mut self, block: u32, _buf: &mut [u8]) -> Result<(), IoError> {
            Err(IoError::BlockOutOfRange {
                block,
                block_count: 0,
            })
        }
        fn write_block(&mut self, _block: u32, _buf: &[u8]) -> Result<(), IoError> {
            Err(IoError::WriteProtected)
        }
    }

    #[test]
    fn block_device_contract_reports_errors() {
        let mut dev = NullBlockDevice;
        let mut buf = [0u8; 512];
        assert!(dev.read_block(0, &mut buf).is_err());
        assert_eq!(Err(IoError::WriteProtected), dev.write_block(0, &buf));
    }
}
