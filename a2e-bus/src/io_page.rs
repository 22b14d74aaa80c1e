// Spec: §4.3 "I/O page dispatcher"
//
// Design: generalizes the teacher's `Mmio::read`/`write`
// (`zinc64-emu/src/mem/mmio.rs`, a single match over six fixed 256-byte
// windows) into a registrable 256-slot table per direction, since this
// machine's I/O page is carved up by soft-switch controllers and slot
// cards rather than six fixed chips. Handlers are held the same way the
// teacher holds its chips (`Shared<dyn Chip>`), so a controller registered
// here can still be owned and driven directly by the machine elsewhere.

use a2e_core::{AccessContext, ConfigurationError, Shared};

/// A component that services one or more `$C0xx` offsets.
pub trait IoHandler {
    fn io_read(&mut self, offset: u8, ctx: AccessContext) -> u8;
    fn io_write(&mut self, offset: u8, value: u8, ctx: AccessContext);
}

struct Slot {
    owner: &'static str,
    handler: Shared<dyn IoHandler>,
}

/// Two 256-entry tables (read, write) indexed by the low byte of any
/// address in `$C000-$C0FF`. Registration is idempotent within a single
/// owner but rejects a second, distinct owner claiming the same slot.
pub struct IoDispatcher {
    read_slots: Vec<Option<Slot>>,
    write_slots: Vec<Option<Slot>>,
}

impl IoDispatcher {
    pub fn new() -> Self {
        Self {
            read_slots: (0..256).map(|_| None).collect(),
            write_slots: (0..256).map(|_| None).collect(),
        }
    }

    pub fn register_read(&mut self, offset: u8, owner: &'static str, handler: Shared<dyn IoHandler>) -> Result<(), ConfigurationError> {
        Self::register(&mut self.read_slots, offset, owner, handler)
    }

    pub fn register_write(&mut self, offset: u8, owner: &'static str, handler: Shared<dyn IoHandler>) -> Result<(), ConfigurationError> {
        Self::register(&mut self.write_slots, offset, owner, handler)
    }

    fn register(slots: &mut [Option<Slot>], offset: u8, owner: &'static str, handler: Shared<dyn IoHandler>) -> Result<(), ConfigurationError> {
        if let Some(existing) = &slots[offset as usize] {
            if existing.owner != owner {
                return Err(ConfigurationError::DuplicateIoRegistration {
                    slot: offset,
                    owner: existing.owner.to_string(),
                });
            }
        }
        slots[offset as usize] = Some(Slot { owner, handler });
        Ok(())
    }

    /// Reads offset `$C0xx`. `None` means the slot is unhandled; the
    /// caller applies the floating-bus value.
    pub fn read(&self, offset: u8, ctx: AccessContext) -> Option<u8> {
        self.read_slots[offset as usize]
            .as_ref()
            .map(|slot| slot.handler.borrow_mut().io_read(offset, ctx))
    }

    /// Writes offset `$C0xx`. Returns whether any handler consumed it.
    pub fn write(&self, offset: u8, value: u8, ctx: AccessContext) -> bool {
        match self.write_slots[offset as usize].as_ref() {
            Some(slot) => {
                slot.handler.borrow_mut().io_write(offset, value, ctx);
                true
            }
            None => false,
        }
    }
}

impl Default for IoDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
