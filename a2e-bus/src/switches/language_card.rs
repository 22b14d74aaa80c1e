// Spec: §3 "Language-card state", §4.4 "Language-card controller"
//
// Design: the R×2 write-enable protocol and bank-select-by-bit3 decoding
// have no teacher analogue; the bank-switching *mechanism* (activate one
// of two mutually-exclusive same-priority layers, adjust a third layer's
// permissions) follows the teacher's `Pla::switch_banks`
// (`zinc64-emu/src/mem/pla.rs`) in spirit: a soft-switch access recomputes
// a small piece of state and pushes it straight into the bus.
//
// The controller needs to mutate the bus from inside an `IoHandler`
// callback the bus itself (indirectly) owns; storing a strong `Shared`
// back-reference would create an `Rc` cycle, so it holds a `WeakShared`
// instead (see `a2e_core::util::WeakShared`) and upgrades it on each
// access.

use a2e_core::{AccessContext, Capabilities, ConfigurationError, Peripheral, PeripheralKind, Shared, SoftSwitchState, WeakShared};

use crate::bus::MemoryBus;
use crate::io_page::IoHandler;

pub const BANK1_LAYER: &str = "language_card.bank1";
pub const BANK2_LAYER: &str = "language_card.bank2";
pub const HIGH_LAYER: &str = "language_card.high";

pub struct LanguageCardController {
    bus: WeakShared<MemoryBus>,
    ram_read: bool,
    ram_write: bool,
    selected_bank: u8,
    pending_odd_offset: Option<u8>,
}

impl LanguageCardController {
    /// Registers the three bus layers (two mutually-exclusive 4 KiB bank
    /// layers for `$D000-$DFFF`, one 8 KiB layer for `$E000-$FFFF`) over
    /// `lc_ram`, a 16 KiB block laid out as `[bank1 4K][bank2 4K][high
    /// 8K]`, and returns a controller wired to mutate them.
    pub fn attach(bus: &Shared<MemoryBus>, lc_ram: &Shared<a2e_core::PhysicalMemory>, priority: i32) -> Result<Self, ConfigurationError> {
        use a2e_core::BusTarget;
        use crate::layer::Mapping;

        let mut b = bus.borrow_mut();
        let (bank1_base, bank1_len) = lc_ram.borrow().slice(0x0000, 0x1000)?;
        let bank1 = b.create_layer(BANK1_LAYER, priority)?;
        b.add_layered_mapping(
            bank1,
            Mapping {
                virtual_base: 0xd000,
                size: 0x1000,
                target: BusTarget::RamSlice { block: lc_ram.clone(), phys_base: bank1_base, length: bank1_len },
                region_tag: "lc_bank1",
            },
        )?;
        let (bank2_base, bank2_len) = lc_ram.borrow().slice(0x1000, 0x1000)?;
        let bank2 = b.create_layer(BANK2_LAYER, priority)?;
        b.add_layered_mapping(
            bank2,
            Mapping {
                virtual_base: 0xd000,
                size: 0x1000,
                target: BusTarget::RamSlice { block: lc_ram.clone(), phys_base: bank2_base, length: bank2_len },
                region_tag: "lc_bank2",
            },
        )?;
        let (high_base, high_len) = lc_ram.borrow().slice(0x2000, 0x2000)?;
        let high = b.create_layer(HIGH_LAYER, priority)?;
        b.add_layered_mapping(
            high,
            Mapping {
                virtual_base: 0xe000,
                size: 0x2000,
                target: BusTarget::RamSlice { block: lc_ram.clone(), phys_base: high_base, length: high_len },
                region_tag: "lc_high",
            },
        )?;
        drop(b);

        let mut controller = Self {
            bus: a2e_core::downgrade(bus),
            ram_read: false,
            ram_write: false,
            selected_bank: 2,
            pending_odd_offset: None,
        };
        controller.apply()?;
        Ok(controller)
    }

    fn apply(&mut self) -> Result<(), ConfigurationError> {
        let Some(bus) = self.bus.upgrade() else { return Ok(()) };
        let mut bus = bus.borrow_mut();

        let caps = Capabilities::NONE.with_readable(self.ram_read).with_writable(self.ram_write);
        bus.set_layer_permissions(BANK1_LAYER, caps)?;
        bus.set_layer_permissions(BANK2_LAYER, caps)?;
        bus.set_layer_permissions(HIGH_LAYER, caps)?;

        let (active_name, inactive_name) = if self.selected_bank == 1 {
            (BANK1_LAYER, BANK2_LAYER)
        } else {
            (BANK2_LAYER, BANK1_LAYER)
        };
        if !bus.is_layer_active(active_name)? {
            bus.deactivate_layer(inactive_name)?;
            bus.activate_layer(active_name)?;
        }
        if !bus.is_layer_active(HIGH_LAYER)? {
            bus.activate_layer(HIGH_LAYER)?;
        }
        Ok(())
    }

    fn handle_access(&mut self, offset: u8) {
        let nibble = offset & 0x0f;
        let effective = nibble & 0b1011; // fold the $C084-87/$C08C-8F alias bit out
        let bit0 = effective & 0x01;
        let bit1 = (effective >> 1) & 0x01;

        self.ram_read = bit0 == bit1;
        self.selected_bank = if effective & 0x08 != 0 { 1 } else { 2 };

        if bit0 == 0 {
            self.ram_write = false;
            self.pending_odd_offset = None;
        } else {
            self.ram_write = self.pending_odd_offset == Some(effective);
            self.pending_odd_offset = Some(effective);
        }

        let _ = self.apply();
    }
}

impl Peripheral for LanguageCardController {
    fn name(&self) -> &'static str {
        "language-card"
    }

    fn kind(&self) -> PeripheralKind {
        PeripheralKind::Motherboard
    }

    fn reset(&mut self) {
        self.ram_read = false;
        self.ram_write = false;
        self.selected_bank = 2;
        self.pending_odd_offset = None;
        let _ = self.apply();
    }

    fn soft_switch_states(&self) -> Vec<SoftSwitchState> {
        vec![
            SoftSwitchState { name: "LCRAMRD", address: 0xc080, value: self.ram_read },
            SoftSwitchState { name: "LCRAMWRT", address: 0xc080, value: self.ram_write },
            SoftSwitchState { name: "LCBANK1", address: 0xc088, value: self.selected_bank == 1 },
        ]
    }
}

impl IoHandler for LanguageCardController {
    fn io_read(&mut self, offset: u8, ctx: AccessContext) -> u8 {
        if !ctx.no_side_effects {
            self.handle_access(offset);
        }
        // $C080-$C08F hold no readable data of their own; real hardware
        // floats here too.
        0xff
    }

    fn io_write(&mut self, _offset: u8, _value: u8, _ctx: AccessContext) {
        // Writes to $C08x never affect state (§4.4).
    }
}
