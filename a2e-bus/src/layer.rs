// Spec: §3 "Layer", §4.2 "Memory bus"
//
// Design: the source this was distilled from drove bank switching off a
// fixed enumerated table of whole-machine "modes" (the teacher's own
// `Mode`/`MemoryMap`, `zinc64-emu/src/mem/pla.rs`). That doesn't fit a
// machine where eleven independent soft switches each reshape a slice of
// the map. Here a layer is a runtime-registered, named, prioritized stack
// entry instead, generalizing the teacher's fixed-mode table to an
// open-ended one.

use a2e_core::{BusTarget, Capabilities, ConfigurationError};

/// 4 KiB, the page-alignment grain mappings must respect (§3).
pub const PAGE_SIZE: u32 = 0x1000;

/// Opaque handle returned by `MemoryBus::create_layer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(pub(crate) u32);

/// One covered span within a layer: `{virtual_base, size, target, phys_base,
/// region_tag}`. `phys_base` is folded into `target`'s own `RamSlice`/
/// `RomSlice` fields for RAM/ROM targets, so this struct just needs the
/// virtual window and a label for diagnostics.
#[derive(Clone)]
pub struct Mapping {
    pub virtual_base: u16,
    pub size: u32,
    pub target: BusTarget,
    pub region_tag: &'static str,
}

impl Mapping {
    pub fn covers(&self, address: u16) -> bool {
        let base = u32::from(self.virtual_base);
        let addr = u32::from(address);
        addr >= base && addr < base + self.size
    }

    fn is_page_aligned(&self) -> bool {
        self.virtual_base as u32 % PAGE_SIZE == 0 && self.size % PAGE_SIZE == 0
    }
}

/// A named, prioritized, atomically activatable collection of mappings.
/// `perms` narrows (via `Capabilities::intersect`) whatever each mapping's
/// own target would otherwise permit, so the same RAM slice can be exposed
/// "read-only" under one layer and "read-write" under another without
/// duplicating the mapping.
pub struct Layer {
    id: LayerId,
    name: String,
    priority: i32,
    mappings: Vec<Mapping>,
    perms: Capabilities,
    active: bool,
}

impl Layer {
    pub(crate) fn new(id: LayerId, name: String, priority: i32) -> Self {
        Self {
            id,
            name,
            priority,
            mappings: Vec::new(),
            perms: Capabilities::FULL,
            active: false,
        }
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn perms(&self) -> Capabilities {
        self.perms
    }

    pub(crate) fn add_mapping(&mut self, mapping: Mapping) -> Result<(), ConfigurationError> {
        if !mapping.is_page_aligned() {
            return Err(ConfigurationError::MappingNotPageAligned {
                layer: self.name.clone(),
                base: mapping.virtual_base,
                size: mapping.size,
            });
        }
        self.mappings.push(mapping);
        Ok(())
    }

    pub(crate) fn find_mapping(&self, address: u16) -> Option<&Mapping> {
        self.mappings.iter().find(|m| m.covers(address))
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub(crate) fn set_perms(&mut self, perms: Capabilities) {
        self.perms = perms;
    }

    /// Whether any mapping of `self` shares an address with any mapping of
    /// `other`.
    pub(crate) fn mappings_overlap(&self, other: &Layer) -> bool {
        self.mappings.iter().any(|m| {
            let m_end = u32::from(m.virtual_base) + m.size;
            other.mappings.iter().any(|n| {
                let n_end = u32::from(n.virtual_base) + n.size;
                u32::from(m.virtual_base) < n_end && u32::from(n.virtual_base) < m_end
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use a2e_core::{new_shared, PhysicalMemory};

    fn ram_mapping(virtual_base: u16, size: u32) -> Mapping {
        let block = new_shared(PhysicalMemory::new(0x10000, 0, "ram").unwrap());
        let (phys_base, length) = block.borrow().slice(virtual_base as usize, size as usize).unwrap();
        Mapping {
            virtual_base,
            size,
            target: BusTarget::RamSlice { block: block.clone(), phys_base, length },
            region_tag: "test",
        }
    }

    #[test]
    fn rejects_non_page_aligned_mapping() {
        let mut layer = Layer::new(LayerId(0), "test".into(), 0);
        let err = layer.add_mapping(ram_mapping(0x1800, 0x1000)).unwrap_err();
        assert!(matches!(err, ConfigurationError::MappingNotPageAligned { .. }));
    }

    #[test]
    fn finds_covering_mapping() {
        let mut layer = Layer::new(LayerId(0), "test".into(), 0);
        layer.add_mapping(ram_mapping(0xd000, 0x1000)).unwrap();
        assert!(layer.find_mapping(0xd500).is_some());
        assert!(layer.find_mapping(0xe000).is_none());
    }
}
