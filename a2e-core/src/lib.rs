//! Physical memory, bus targets, the cycle scheduler, and the external
//! interface contracts (`Cpu`, `Peripheral`, `SlotCard`, `BlockDevice`) the
//! rest of this workspace builds on.

pub mod error;
pub mod interfaces;
pub mod mem;
pub mod scheduler;
pub mod util;

pub use error::{ConfigurationError, IoError, InvalidSlice, MemoryFault};
pub use interfaces::{BlockDevice, Cpu, Peripheral, PeripheralKind, RunState, SlotCard, SoftSwitchState};
pub use mem::{AccessContext, AccessIntent, AccessSource, BusTarget, Capabilities, PhysicalMemory};
pub use scheduler::{ConsumedEvent, EventHandle, EventKind, Scheduler};
pub use util::{downgrade, new_shared, new_shared_cell, Shared, SharedCell, WeakShared};
