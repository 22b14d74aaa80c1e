//! Loading support for the files that sit at the emulator's boundary: ROM
//! images consumed by `a2e-system::MachineConfig`, and disk images recognized
//! by format but not parsed (parsing is a peripheral's concern, out of scope
//! here).

pub mod disk_image;
pub mod rom_image;

pub use disk_image::DiskImageFormat;
pub use rom_image::{load_rom_image, RomLoadError, CHARACTER_ROM_SIZE, EXPANSION_ROM_SIZE, SLOT_ROM_SIZE};
