// Part of the Apple IIe emulator core.
//
// Spec: §7 ERROR HANDLING DESIGN

use thiserror::Error;

/// Fatal at machine construction — overlapping base mappings, duplicate
/// slot assignments, mis-sized ROM images, out-of-range memory slices,
/// equal-priority layer conflicts.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigurationError {
    #[error("physical memory block '{name}' must have a non-zero size")]
    ZeroSizedBlock { name: String },

    #[error("layer '{name}' conflicts with an equal-priority layer at priority {priority}")]
    LayerPriorityConflict { name: String, priority: i32 },

    #[error("layer '{name}' is already registered")]
    DuplicateLayer { name: String },

    #[error("no layer named '{name}' is registered")]
    UnknownLayer { name: String },

    #[error("mapping for layer '{layer}' is not 4 KiB page-aligned (base=${base:04X}, size=${size:04X})")]
    MappingNotPageAligned { layer: String, base: u16, size: u32 },

    #[error("I/O slot ${slot:02X} is already registered to '{owner}'")]
    DuplicateIoRegistration { slot: u8, owner: String },

    #[error("slot {slot} is already occupied")]
    DuplicateSlotAssignment { slot: u8 },

    #[error("ROM image '{name}' has size {actual} bytes, expected {expected}")]
    RomSizeMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error(transparent)]
    InvalidSlice(#[from] InvalidSlice),
}

/// Slicing a physical memory block out of range.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
#[error("slice [{offset}, {offset}+{length}) exceeds block size {block_size}")]
pub struct InvalidSlice {
    pub offset: usize,
    pub length: usize,
    pub block_size: usize,
}

/// Runtime memory-access fault. Never fatal: the bus recovers locally by
/// resolving to the floating-bus value (reads) or discarding (writes). This
/// type exists for diagnostics/logging, not for propagation to the CPU.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum MemoryFault {
    #[error("address ${address:04X} is unmapped after fall-through")]
    Unmapped { address: u16 },

    #[error("address ${address:04X} denied by permissions with no lower layer")]
    PermissionDenied { address: u16 },
}

/// I/O error surfaced through a peripheral's own contract (block device,
/// ROM loader) — never bubbled to the CPU directly.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum IoError {
    #[error("device is write protected")]
    WriteProtected,
    #[error("requested volume is too large for this device")]
    VolumeTooLarge,
    #[error("block {block} is out of range (device has {block_count} blocks)")]
    BlockOutOfRange { block: u32, block_count: u32 },
    #[error("I/O error")]
    IoFailure,
}
