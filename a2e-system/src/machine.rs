// Spec: §5 "Machine assembly", §4.7 "Scheduler", §8 scenario 5 "VBL timing"
//
// Design: grounded on the teacher's `C64::build`/`reset`/`step_internal`
// (`zinc64-system/src/c64.rs`) — a single assembly point that constructs
// every physical memory block and controller, wires them into the bus, and
// drives them one CPU step at a time. The CPU core itself is a `Box<dyn
// Cpu>` the caller supplies (spec §1: a 65C02 decoder is out of scope).

use a2e_bus::{
    new_cx_rom_routing, AuxMemoryController, CharacterController, CompositeIoTarget, CxRomRouting, ExpansionRomSource, KeyboardController,
    LanguageCardController, Mapping, Page0CompositeTarget, RoutingTable, SlotManager, VideoModeController,
};
use a2e_core::{
    new_shared, new_shared_cell, AccessContext, AccessIntent, BusTarget, ConfigurationError, ConsumedEvent, Cpu, EventKind, Peripheral, PhysicalMemory,
    RunState, Scheduler, Shared, SharedCell, SlotCard,
};

use crate::config::{MachineConfig, AUX_RAM_SIZE, DEFAULT_EXPANSION_ROM_SIZE, INTERNAL_CX_ROM_SIZE, LANGUAGE_CARD_RAM_SIZE, MAIN_RAM_SIZE, SYSTEM_ROM_SIZE};

const LANGUAGE_CARD_PRIORITY: i32 = 10;

/// Serves `$C800-$CFFF` when no slot's expansion ROM is latched — the
/// motherboard's own firmware image, not a slot card.
struct DefaultExpansionRom(Shared<PhysicalMemory>);

impl ExpansionRomSource for DefaultExpansionRom {
    fn read_default_expansion_rom(&self, offset: u16) -> u8 {
        self.0.borrow().read(offset as usize)
    }
}

fn validate_rom_size(name: &'static str, data: &[u8], expected: usize) -> Result<(), ConfigurationError> {
    if data.len() != expected {
        return Err(ConfigurationError::RomSizeMismatch {
            name: name.to_string(),
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

/// A fully assembled Apple IIe: the bus fabric, every motherboard soft-
/// switch controller, the scheduler, and the CPU core driving it.
pub struct Machine {
    bus: Shared<a2e_bus::MemoryBus>,
    scheduler: Scheduler,
    main_ram: Shared<PhysicalMemory>,
    aux_ram: Shared<PhysicalMemory>,
    lc_ram: Shared<PhysicalMemory>,
    routing: Shared<RoutingTable>,
    cx_routing: SharedCell<CxRomRouting>,
    slots: Shared<SlotManager>,
    language_card: Shared<LanguageCardController>,
    aux_memory: Shared<AuxMemoryController>,
    video_mode: Shared<VideoModeController>,
    character: Shared<CharacterController>,
    keyboard: Shared<KeyboardController>,
    peripherals: Vec<Shared<dyn Peripheral>>,
    cycles_per_frame: u64,
    vbl_duration: u64,
    cpu: Box<dyn Cpu>,
}

impl Machine {
    pub fn build(config: MachineConfig, cpu: Box<dyn Cpu>) -> Result<Self, ConfigurationError> {
        validate_rom_size("system_rom", &config.system_rom, SYSTEM_ROM_SIZE)?;
        validate_rom_size("internal_cx_rom", &config.internal_cx_rom, INTERNAL_CX_ROM_SIZE)?;
        validate_rom_size("default_expansion_rom", &config.default_expansion_rom, DEFAULT_EXPANSION_ROM_SIZE)?;

        let bus = new_shared(a2e_bus::MemoryBus::new(config.floating_bus_value));

        let main_ram = new_shared(PhysicalMemory::new(MAIN_RAM_SIZE, 0x00, "main_ram")?);
        let aux_ram = new_shared(PhysicalMemory::new(AUX_RAM_SIZE, 0x00, "aux_ram")?);
        let lc_ram = new_shared(PhysicalMemory::new(LANGUAGE_CARD_RAM_SIZE, 0x00, "language_card_ram")?);

        let system_rom = new_shared(PhysicalMemory::new(SYSTEM_ROM_SIZE, 0x00, "system_rom")?);
        system_rom.borrow_mut().load(0, &config.system_rom).expect("size validated above");
        let internal_cx_rom = new_shared(PhysicalMemory::new(INTERNAL_CX_ROM_SIZE, 0x00, "internal_cx_rom")?);
        internal_cx_rom.borrow_mut().load(0, &config.internal_cx_rom).expect("size validated above");
        let default_expansion_rom = new_shared(PhysicalMemory::new(DEFAULT_EXPANSION_ROM_SIZE, 0x00, "default_expansion_rom")?);
        default_expansion_rom
            .borrow_mut()
            .load(0, &config.default_expansion_rom)
            .expect("size validated above");

        let routing = new_shared(RoutingTable::default());
        let cx_routing = new_cx_rom_routing();
        let slots = new_shared(SlotManager::new());
        slots.borrow_mut().set_default_expansion_rom(new_shared(DefaultExpansionRom(default_expansion_rom)));

        let language_card = new_shared(LanguageCardController::attach(&bus, &lc_ram, LANGUAGE_CARD_PRIORITY)?);
        let aux_memory = new_shared(AuxMemoryController::new(routing.clone(), cx_routing.clone()));
        let video_mode = new_shared(VideoModeController::new(aux_memory.clone()));
        let character = new_shared(CharacterController::new());
        let keyboard = new_shared(KeyboardController::new());

        let mut cio_target = CompositeIoTarget::new(slots.clone(), cx_routing.clone());
        cio_target.set_internal_rom(internal_cx_rom);
        Self::register_switches(cio_target.dispatcher_mut(), &language_card, &aux_memory, &video_mode, &character, &keyboard)?;

        let cio_handler_id = bus.borrow_mut().register_handler(new_shared(cio_target));
        let page0_target = Page0CompositeTarget::new(main_ram.clone(), aux_ram.clone(), routing.clone());
        let page0_handler_id = bus.borrow_mut().register_handler(new_shared(page0_target));

        {
            let mut b = bus.borrow_mut();
            b.add_base_mapping(Mapping {
                virtual_base: 0x0000,
                size: 0xc000,
                target: BusTarget::Handler(page0_handler_id),
                region_tag: "page0",
            })?;
            b.add_base_mapping(Mapping {
                virtual_base: 0xc000,
                size: 0x1000,
                target: BusTarget::Handler(cio_handler_id),
                region_tag: "io_page",
            })?;
            let (phys_base, length) = system_rom.borrow().slice(0, SYSTEM_ROM_SIZE)?;
            b.add_base_mapping(Mapping {
                virtual_base: 0xd000,
                size: SYSTEM_ROM_SIZE as u32,
                target: BusTarget::RomSlice { block: system_rom.clone(), phys_base, length },
                region_tag: "system_rom",
            })?;
        }

        let peripherals: Vec<Shared<dyn Peripheral>> = vec![
            language_card.clone(),
            aux_memory.clone(),
            video_mode.clone(),
            character.clone(),
            keyboard.clone(),
        ];

        let mut machine = Self {
            bus,
            scheduler: Scheduler::new(),
            main_ram,
            aux_ram,
            lc_ram,
            routing,
            cx_routing,
            slots,
            language_card,
            aux_memory,
            video_mode,
            character,
            keyboard,
            peripherals,
            cycles_per_frame: config.cycles_per_frame,
            vbl_duration: config.vbl_duration,
            cpu,
        };
        machine.reset()?;
        Ok(machine)
    }

    fn register_switches(
        dispatcher: &mut a2e_bus::IoDispatcher,
        language_card: &Shared<LanguageCardController>,
        aux_memory: &Shared<AuxMemoryController>,
        video_mode: &Shared<VideoModeController>,
        character: &Shared<CharacterController>,
        keyboard: &Shared<KeyboardController>,
    ) -> Result<(), ConfigurationError> {
        for offset in 0x80u8..=0x8f {
            dispatcher.register_read(offset, "language-card", language_card.clone())?;
        }

        for offset in 0x00u8..=0x0d {
            dispatcher.register_write(offset, "80-column-card", aux_memory.clone())?;
        }
        for &offset in &[0x13u8, 0x14, 0x15, 0x16, 0x17, 0x18, 0x1f] {
            dispatcher.register_read(offset, "80-column-card", aux_memory.clone())?;
        }

        for &offset in &[0x50u8, 0x51, 0x52, 0x53, 0x54, 0x55, 0x56, 0x57, 0x5e, 0x5f] {
            dispatcher.register_read(offset, "video-mode", video_mode.clone())?;
            dispatcher.register_write(offset, "video-mode", video_mode.clone())?;
        }
        for &offset in &[0x19u8, 0x1a, 0x1b, 0x1c, 0x1d] {
            dispatcher.register_read(offset, "video-mode", video_mode.clone())?;
        }

        for &offset in &[0x0eu8, 0x0f, 0x58, 0x59, 0x5a, 0x5b, 0x5c, 0x5d] {
            dispatcher.register_read(offset, "character-generator", character.clone())?;
            dispatcher.register_write(offset, "character-generator", character.clone())?;
        }
        dispatcher.register_read(0x1e, "character-generator", character.clone())?;

        dispatcher.register_read(0x00, "keyboard", keyboard.clone())?;
        dispatcher.register_read(0x10, "keyboard", keyboard.clone())?;
        dispatcher.register_write(0x10, "keyboard", keyboard.clone())?;

        Ok(())
    }

    fn schedule_vbl(&mut self) {
        let blank_start = self.cycles_per_frame.saturating_sub(self.vbl_duration);
        self.scheduler.schedule_after(blank_start, EventKind::VideoBlankStart, 0);
        self.scheduler.schedule_after(self.cycles_per_frame, EventKind::VideoBlankEnd, 0);
    }

    fn handle_scheduled_event(video_mode: &Shared<VideoModeController>, cycles_per_frame: u64, vbl_duration: u64, scheduler: &mut Scheduler, event: ConsumedEvent) {
        match event.kind {
            EventKind::VideoBlankStart => {
                video_mode.borrow_mut().set_vbl(true);
            }
            EventKind::VideoBlankEnd => {
                video_mode.borrow_mut().set_vbl(false);
                let now = scheduler.current_cycle();
                let next_start = event.deadline_cycle + cycles_per_frame.saturating_sub(vbl_duration);
                let next_end = event.deadline_cycle + cycles_per_frame;
                scheduler.schedule_after(next_start.saturating_sub(now), EventKind::VideoBlankStart, 0);
                scheduler.schedule_after(next_end.saturating_sub(now), EventKind::VideoBlankEnd, 0);
            }
            _ => {}
        }
    }

    /// Resets every motherboard controller and installed slot card to
    /// power-on state, clears the expansion-ROM latch, re-arms the VBL
    /// schedule, and loads the CPU's program counter from the reset vector.
    pub fn reset(&mut self) -> Result<(), ConfigurationError> {
        for peripheral in &self.peripherals {
            peripheral.borrow_mut().reset();
        }
        for slot in 1u8..=7 {
            let card = self.slots.borrow().card(slot).cloned();
            if let Some(card) = card {
                card.borrow_mut().reset();
            }
        }
        self.slots.borrow_mut().reset();

        self.scheduler.reset();
        self.schedule_vbl();

        let reset_ctx = AccessContext::new(0xfffc, AccessIntent::DataRead, 0);
        let reset_vector = self.bus.borrow().read16(0xfffc, reset_ctx);
        self.cpu.reset();
        self.cpu.set_pc(reset_vector);
        Ok(())
    }

    /// Executes one CPU instruction and advances the scheduler by however
    /// many cycles it consumed.
    pub fn step(&mut self) -> RunState {
        let (cycles, run_state) = self.cpu.step();
        let target = self.scheduler.current_cycle().saturating_add(u64::from(cycles));
        let video_mode = self.video_mode.clone();
        let cycles_per_frame = self.cycles_per_frame;
        let vbl_duration = self.vbl_duration;
        self.scheduler.advance(target, move |scheduler, event| {
            Self::handle_scheduled_event(&video_mode, cycles_per_frame, vbl_duration, scheduler, event);
        });
        run_state
    }

    /// Installs a card in one of the seven numbered slots, making its slot
    /// ROM and (if present) expansion ROM reachable through `$C000-$CFFF`.
    pub fn install_card(&mut self, slot: u8, card: Shared<dyn SlotCard>) -> Result<(), ConfigurationError> {
        self.slots.borrow_mut().install(slot, card)
    }

    pub fn bus(&self) -> &Shared<a2e_bus::MemoryBus> {
        &self.bus
    }

    pub fn main_ram(&self) -> &Shared<PhysicalMemory> {
        &self.main_ram
    }

    pub fn aux_ram(&self) -> &Shared<PhysicalMemory> {
        &self.aux_ram
    }

    pub fn lc_ram(&self) -> &Shared<PhysicalMemory> {
        &self.lc_ram
    }

    pub fn keyboard(&self) -> &Shared<KeyboardController> {
        &self.keyboard
    }

    pub fn video_mode(&self) -> &Shared<VideoModeController> {
        &self.video_mode
    }

    pub fn peripherals(&self) -> &[Shared<dyn Peripheral>] {
        &self.peripherals
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use a2e_core::AccessIntent;

    struct StubCpu {
        pc: u16,
        cycles_per_step: u32,
    }

    impl Cpu for StubCpu {
        fn step(&mut self) -> (u32, RunState) {
            (self.cycles_per_step, RunState::Running)
        }
        fn reset(&mut self) {}
        fn pc(&self) -> u16 {
            self.pc
        }
        fn set_pc(&mut self, value: u16) {
            self.pc = value;
        }
    }

    fn build_machine() -> Machine {
        let mut config = MachineConfig::blank();
        config.system_rom[0x2ffc] = 0x00; // $FFFC low byte
        config.system_rom[0x2ffd] = 0xd0; // $FFFD high byte -> PC = $D000
        Machine::build(config, Box::new(StubCpu { pc: 0, cycles_per_step: 10 })).unwrap()
    }

    #[test]
    fn reset_loads_pc_from_reset_vector() {
        let mut machine = build_machine();
        assert_eq!(0xd000, machine.cpu.pc());
        machine.reset().unwrap();
        assert_eq!(0xd000, machine.cpu.pc());
    }

    #[test]
    fn main_ram_is_reachable_through_the_bus_by_default() {
        let machine = build_machine();
        let ctx = AccessContext::new(0x1000, AccessIntent::DataWrite, 0);
        machine.bus().borrow().write8(0x1000, 0x42, ctx);
        assert_eq!(0x42, machine.main_ram().borrow().read(0x1000));
    }

    #[test]
    fn eighty_column_switch_is_reachable_through_the_io_page() {
        let machine = build_machine();
        let write_ctx = AccessContext::new(0xc001, AccessIntent::DataWrite, 0);
        machine.bus().borrow().write8(0xc001, 0, write_ctx); // 80STORE on
        let read_ctx = AccessContext::new(0xc018, AccessIntent::DataRead, 0);
        assert_eq!(0x80, machine.bus().borrow().read8(0xc018, read_ctx));
    }

    #[test]
    fn keyboard_press_is_visible_through_c000() {
        let machine = build_machine();
        machine.keyboard().borrow_mut().press(b'A');
        let ctx = AccessContext::new(0xc000, AccessIntent::DataRead, 0);
        assert_eq!(0x80 | b'A', machine.bus().borrow().read8(0xc000, ctx));
    }

    #[test]
    fn vbl_status_flips_after_blank_start_cycle() {
        let mut machine = build_machine();
        let read_ctx = AccessContext::new(0xc019, AccessIntent::DataRead, 0);
        assert_eq!(0x80, machine.bus().borrow().read8(0xc019, read_ctx));

        let blank_start = machine.cycles_per_frame - machine.vbl_duration;
        let video_mode = machine.video_mode.clone();
        let cpf = machine.cycles_per_frame;
        let vbl = machine.vbl_duration;
        machine
            .scheduler
            .advance(blank_start, move |s, e| Machine::handle_scheduled_event(&video_mode, cpf, vbl, s, e));
        assert_eq!(0x00, machine.bus().borrow().read8(0xc019, read_ctx));
    }

    #[test]
    fn language_card_layer_overrides_system_rom_once_enabled() {
        let machine = build_machine();
        machine.lc_ram().borrow_mut().write(0x1000, 0x77); // bank2 phys offset for $D000
        let enable_ctx = AccessContext::new(0xc080, AccessIntent::DataRead, 0);
        machine.bus().borrow().read8(0xc080, enable_ctx); // enable read, bank 2
        let ctx = AccessContext::new(0xd000, AccessIntent::DataRead, 0);
        assert_eq!(0x77, machine.bus().borrow().read8(0xd000, ctx));
    }
}
