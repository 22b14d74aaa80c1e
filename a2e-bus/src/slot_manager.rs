// Spec: §3 "Slot", "Expansion-ROM latch", §4.5, §9 "Global expansion-ROM latch"
//
// Design: the one piece of genuinely machine-wide state (the expansion-ROM
// latch) goes on the slot manager, per §9's placement guidance — nothing
// else naturally owns it. Structurally this plays the role the teacher's
// `ExpansionPort` plays for cartridge attach/detach
// (`zinc64-core/src/mem/expansion_port.rs`), generalized from "one
// cartridge slot" to "seven numbered slots plus a default source".

use a2e_core::{ConfigurationError, Shared, SlotCard};

/// Source of the `$C800-$CFFF` content when no slot's expansion ROM is
/// latched — normally the 80-column card's built-in firmware.
pub trait ExpansionRomSource {
    fn read_default_expansion_rom(&self, offset: u16) -> u8;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Latch {
    Default,
    Slot(u8),
}

pub struct SlotManager {
    slots: [Option<Shared<dyn SlotCard>>; 7],
    default_source: Option<Shared<dyn ExpansionRomSource>>,
    latch: Latch,
}

impl SlotManager {
    pub fn new() -> Self {
        Self {
            slots: Default::default(),
            default_source: None,
            latch: Latch::Default,
        }
    }

    pub fn install(&mut self, slot: u8, card: Shared<dyn SlotCard>) -> Result<(), ConfigurationError> {
        assert!((1..=7).contains(&slot), "slot must be 1..=7");
        let idx = (slot - 1) as usize;
        if self.slots[idx].is_some() {
            return Err(ConfigurationError::DuplicateSlotAssignment { slot });
        }
        self.slots[idx] = Some(card);
        Ok(())
    }

    pub fn set_default_expansion_rom(&mut self, source: Shared<dyn ExpansionRomSource>) {
        self.default_source = Some(source);
    }

    pub fn card(&self, slot: u8) -> Option<&Shared<dyn SlotCard>> {
        self.slots.get((slot.wrapping_sub(1)) as usize)?.as_ref()
    }

    pub fn reset(&mut self) {
        self.latch = Latch::Default;
    }

    /// Slot ROM byte at `$Cs00-$CsFF` for `slot`, `None` if unoccupied.
    pub fn slot_rom_byte(&self, slot: u8, offset: u8) -> Option<u8> {
        self.card(slot).map(|card| card.borrow().read_slot_rom(offset))
    }

    /// Applies the latch-transition rules (§4.5) for an access to
    /// `$Cs00-$CsFF` belonging to `slot`. Side-effect-free accesses observe
    /// but never mutate the latch.
    pub fn observe_slot_access(&mut self, slot: u8, offset: u8, no_side_effects: bool) {
        if no_side_effects {
            return;
        }
        if slot == 0x0f && offset == 0xff {
            self.latch = Latch::Default;
            return;
        }
        if self.card(slot).is_some_and(|c| c.borrow().has_expansion_rom()) {
            self.latch = Latch::Slot(slot);
        }
    }

    /// Resolves `$C800-$CFFF` through whichever source is currently
    /// latched.
    pub fn read_expansion_rom(&self, offset: u16) -> u8 {
        match self.latch {
            Latch::Default => self
                .default_source
                .as_ref()
                .map(|s| s.borrow().read_default_expansion_rom(offset))
                .unwrap_or(0xff),
            Latch::Slot(slot) => self
                .card(slot)
                .map(|c| c.borrow().read_expansion_rom(offset))
                .unwrap_or(0xff),
        }
    }
}

impl Default for SlotManager {
    fn default() -> Self {
        Self::new()
    }
}
