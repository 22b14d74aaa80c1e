// Part of the Apple IIe emulator core.

mod block;
mod target;

pub use self::block::PhysicalMemory;
pub use self::target::{AccessContext, AccessIntent, AccessSource, BusTarget, Capabilities};
