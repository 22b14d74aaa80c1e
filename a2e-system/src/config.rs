// Spec: §6 "Configuration", §9 "Floating-bus value" open question
//
// Design: grounded on the teacher's `Config`/`RomData`
// (`zinc64-system/src/config.rs`) — a plain data bag the assembler consumes,
// with ROM payloads as raw byte vectors the caller supplies. Parsing the
// declarative machine profile itself (§6) is out of scope; this is the
// parsed-in-memory result that scope stops at.

/// `$D000-$FFFF` system ROM, served by the base mapping beneath the
/// language-card overlay layers.
pub const SYSTEM_ROM_SIZE: usize = 0x3000;
/// `$C100-$C7FF` internal ROM overlay, served when `INTCXROM` is set (or for
/// `$C300-$C3FF` alone when `SLOTC3ROM` is clear).
pub const INTERNAL_CX_ROM_SIZE: usize = 0x0700;
/// `$C800-$CFFF` default expansion ROM, served when no slot's expansion ROM
/// is latched.
pub const DEFAULT_EXPANSION_ROM_SIZE: usize = 0x0800;

pub const MAIN_RAM_SIZE: usize = 0x10000;
pub const AUX_RAM_SIZE: usize = 0x10000;
pub const LANGUAGE_CARD_RAM_SIZE: usize = 0x4000;

/// A declarative machine profile: ROM payloads plus the handful of
/// per-machine policy knobs §9 leaves open. Reading this from a file is
/// outside the core's scope (spec §6); this is the parsed result.
pub struct MachineConfig {
    /// Value returned for unmapped or permission-denied reads. Spec §9
    /// allows either a fixed sentinel or "last-latched video byte"; this
    /// implementation pins a fixed value per machine profile.
    pub floating_bus_value: u8,
    pub system_rom: Vec<u8>,
    pub internal_cx_rom: Vec<u8>,
    pub default_expansion_rom: Vec<u8>,
    /// Cycles per video frame at 1.023 MHz (spec §4.7: "period ≈ 17030
    /// cycles").
    pub cycles_per_frame: u64,
    /// Portion of each frame spent in vertical blank.
    pub vbl_duration: u64,
}

impl MachineConfig {
    /// Power-on profile with zero-filled ROMs — useful for tests that don't
    /// care about ROM content, only bus behavior.
    pub fn blank() -> Self {
        Self {
            floating_bus_value: 0xff,
            system_rom: vec![0x00; SYSTEM_ROM_SIZE],
            internal_cx_rom: vec![0x00; INTERNAL_CX_ROM_SIZE],
            default_expansion_rom: vec![0x00; DEFAULT_EXPANSION_ROM_SIZE],
            cycles_per_frame: 17_030,
            vbl_duration: 4_550,
        }
    }
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self::blank()
    }
}
