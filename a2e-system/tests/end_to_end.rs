// End-to-end scenarios from spec §8, driven through a fully assembled
// `Machine` the way a front-end would: `Machine::build`, then reads/writes
// straight through the bus.

use a2e_core::{AccessContext, AccessIntent, Cpu, RunState};
use a2e_system::{Machine, MachineConfig};

struct StubCpu {
    pc: u16,
}

impl Cpu for StubCpu {
    fn step(&mut self) -> (u32, RunState) {
        (1, RunState::Running)
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
    let config = MachineConfig::blank();
    Machine::build(config, Box::new(StubCpu { pc: 0 })).unwrap()
}

fn read_ctx(addr: u16) -> AccessContext {
    AccessContext::new(addr, AccessIntent::DataRead, 0)
}

fn write_ctx(addr: u16) -> AccessContext {
    AccessContext::new(addr, AccessIntent::DataWrite, 0)
}

/// Scenario 2: 80-column text flip (spec §8).
#[test]
fn eighty_column_text_flip() {
    let machine = build_machine();
    let bus = machine.bus();

    bus.borrow().write8(0xc001, 0, write_ctx(0xc001)); // 80STORE on
    bus.borrow().read8(0xc055, read_ctx(0xc055)); // PAGE2 on (read-triggered switch)

    bus.borrow().write8(0x0400, 0x41, write_ctx(0x0400));
    assert_eq!(0x41, bus.borrow().read8(0x0400, read_ctx(0x0400)));
    assert_eq!(0x41, machine.aux_ram().borrow().read(0x0400)); // landed in aux

    bus.borrow().read8(0xc054, read_ctx(0xc054)); // PAGE2 off
    bus.borrow().write8(0x0400, 0x42, write_ctx(0x0400));
    assert_eq!(0x42, bus.borrow().read8(0x0400, read_ctx(0x0400)));
    assert_eq!(0x42, machine.main_ram().borrow().read(0x0400)); // landed in main

    bus.borrow().read8(0xc055, read_ctx(0xc055)); // PAGE2 on again
    assert_eq!(0x41, bus.borrow().read8(0x0400, read_ctx(0x0400))); // aux byte reappears
}

/// Scenario 5: VBL timing (spec §8).
#[test]
fn vbl_timing_across_multiple_frames() {
    let mut machine = build_machine();
    let bus = machine.bus();

    let cycles_per_frame = 17_030u32;
    let vbl_duration = 4_550u32;
    assert_eq!(0x80, bus.borrow().read8(0xc019, read_ctx(0xc019))); // not in VBL at cycle 0

    // Drive the CPU stub one cycle at a time up to just before blank start.
    let blank_start = cycles_per_frame - vbl_duration;
    for _ in 0..(blank_start - 1) {
        machine.step();
    }
    assert_eq!(0x80, bus.borrow().read8(0xc019, read_ctx(0xc019)));

    machine.step(); // crosses into blank
    assert_eq!(0x00, bus.borrow().read8(0xc019, read_ctx(0xc019)));

    for _ in 0..vbl_duration {
        machine.step();
    }
    assert_eq!(0x80, bus.borrow().read8(0xc019, read_ctx(0xc019))); // blank cleared
}
