// Part of the Apple IIe emulator core.

mod shared;

pub use self::shared::{downgrade, new_shared, new_shared_cell, Shared, SharedCell, WeakShared};
