// Spec: §4.2 "Memory bus"
//
// Design: ground truth is the teacher's `Memory::read`/`write`
// (`zinc64-emu/src/mem/memory.rs`), a single match over a fixed `Bank`
// enum selected by a `Configuration` table. This generalizes that into a
// runtime priority stack with permission-gated fall-through (§4.2 steps
// 1-4), since the fixed 16-zone table the teacher uses can't express
// eleven independently toggled overlays.

use std::collections::HashMap;

use a2e_core::{AccessContext, AccessIntent, BusTarget, Capabilities, ConfigurationError, MemoryFault, Shared};

use crate::layer::{Layer, LayerId, Mapping, PAGE_SIZE};

/// A component that services `BusTarget::Handler(id)` accesses: the I/O
/// dispatcher, the composite I/O target, the low-RAM routing target, or any
/// future memory-mapped component. `region_offset` is zero-based within
/// whatever span the owning mapping covers, never an absolute address.
pub trait BusHandler {
    fn read8(&mut self, region_offset: u32, ctx: AccessContext) -> u8;
    fn write8(&mut self, region_offset: u32, value: u8, ctx: AccessContext);
}

/// The memory bus: a non-overlapping base mapping plus a priority-ordered
/// stack of overlay layers, and the table `Handler` targets dispatch
/// through.
pub struct MemoryBus {
    base: Vec<Mapping>,
    layers: Vec<Layer>,
    layers_by_name: HashMap<String, LayerId>,
    next_layer_id: u32,
    handlers: Vec<Shared<dyn BusHandler>>,
    floating_bus_value: u8,
}

struct Resolved<'a> {
    target: &'a BusTarget,
    offset: u32,
}

impl MemoryBus {
    pub fn new(floating_bus_value: u8) -> Self {
        Self {
            base: Vec::new(),
            layers: Vec::new(),
            layers_by_name: HashMap::new(),
            next_layer_id: 0,
            handlers: Vec::new(),
            floating_bus_value,
        }
    }

    /// Registers a base-mapping span. The base mapping must partition the
    /// address space (§3 invariant); this only enforces page alignment,
    /// not full coverage, since coverage depends on the whole machine's
    /// assembly order.
    pub fn add_base_mapping(&mut self, mapping: Mapping) -> Result<(), ConfigurationError> {
        if mapping.virtual_base as u32 % PAGE_SIZE != 0 || mapping.size % PAGE_SIZE != 0 {
            return Err(ConfigurationError::MappingNotPageAligned {
                layer: "<base>".to_string(),
                base: mapping.virtual_base,
                size: mapping.size,
            });
        }
        self.base.push(mapping);
        Ok(())
    }

    /// Registers a handler component, returning the id to embed in
    /// `BusTarget::Handler`.
    pub fn register_handler(&mut self, handler: Shared<dyn BusHandler>) -> u32 {
        self.handlers.push(handler);
        (self.handlers.len() - 1) as u32
    }

    pub fn create_layer(&mut self, name: &str, priority: i32) -> Result<LayerId, ConfigurationError> {
        if self.layers_by_name.contains_key(name) {
            return Err(ConfigurationError::DuplicateLayer { name: name.to_string() });
        }
        let id = LayerId(self.next_layer_id);
        self.next_layer_id += 1;
        self.layers.push(Layer::new(id, name.to_string(), priority));
        self.layers_by_name.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn add_layered_mapping(&mut self, layer_id: LayerId, mapping: Mapping) -> Result<(), ConfigurationError> {
        let layer = self.layer_mut_by_id(layer_id)?;
        layer.add_mapping(mapping)
    }

    pub fn activate_layer(&mut self, name: &str) -> Result<(), ConfigurationError> {
        let priority = self.layer_by_name(name)?.priority();
        if let Some(conflict) = self.find_conflicting_active_layer(name, priority) {
            return Err(ConfigurationError::LayerPriorityConflict {
                name: conflict,
                priority,
            });
        }
        self.layer_mut_by_name(name)?.set_active(true);
        Ok(())
    }

    pub fn deactivate_layer(&mut self, name: &str) -> Result<(), ConfigurationError> {
        self.layer_mut_by_name(name)?.set_active(false);
        Ok(())
    }

    pub fn is_layer_active(&self, name: &str) -> Result<bool, ConfigurationError> {
        Ok(self.layer_by_name(name)?.is_active())
    }

    pub fn set_layer_permissions(&mut self, name: &str, perms: Capabilities) -> Result<(), ConfigurationError> {
        self.layer_mut_by_name(name)?.set_perms(perms);
        Ok(())
    }

    /// Two *active* layers at equal priority conflict only if their
    /// mappings actually overlap an address — disjoint same-priority
    /// layers (e.g. language-card bank-select vs. high-RAM layers) are
    /// fine active together.
    fn find_conflicting_active_layer(&self, name: &str, priority: i32) -> Option<String> {
        let candidate = self.layer_by_name(name).ok()?;
        self.layers
            .iter()
            .find(|other| {
                other.is_active()
                    && other.name() != name
                    && other.priority() == priority
                    && candidate.mappings_overlap(other)
            })
            .map(|other| other.name().to_string())
    }

    fn layer_by_name(&self, name: &str) -> Result<&Layer, ConfigurationError> {
        let id = self
            .layers_by_name
            .get(name)
            .ok_or_else(|| ConfigurationError::UnknownLayer { name: name.to_string() })?;
        Ok(self.layers.iter().find(|l| l.id() == *id).expect("layer table consistent"))
    }

    fn layer_mut_by_name(&mut self, name: &str) -> Result<&mut Layer, ConfigurationError> {
        let id = *self
            .layers_by_name
            .get(name)
            .ok_or_else(|| ConfigurationError::UnknownLayer { name: name.to_string() })?;
        Ok(self.layers.iter_mut().find(|l| l.id() == id).expect("layer table consistent"))
    }

    fn layer_mut_by_id(&mut self, id: LayerId) -> Result<&mut Layer, ConfigurationError> {
        self.layers
            .iter_mut()
            .find(|l| l.id() == id)
            .ok_or_else(|| ConfigurationError::UnknownLayer { name: format!("#{}", id.0) })
    }

    /// Resolution algorithm (§4.2): among active layers whose mapping
    /// covers `address`, try the highest-priority one first; if its
    /// effective permissions don't permit `intent`, fall through to the
    /// next-lower one, and finally to the base mapping. `Err` distinguishes
    /// "nothing covers this address at all" from "something covers it but
    /// denies this access, and nothing lower down picks it up" — both
    /// recover the same way at the call site, but the fault is worth naming.
    fn resolve(&self, address: u16, intent: AccessIntent) -> Result<Resolved<'_>, MemoryFault> {
        let mut candidates: Vec<&Layer> = self.layers.iter().filter(|l| l.is_active()).collect();
        candidates.sort_by(|a, b| b.priority().cmp(&a.priority()));

        let mut denied = false;
        for layer in candidates {
            if let Some(mapping) = layer.find_mapping(address) {
                let effective = mapping.target.capabilities().intersect(layer.perms());
                if effective.permits(intent) {
                    let offset = u32::from(address) - u32::from(mapping.virtual_base);
                    return Ok(Resolved { target: &mapping.target, offset });
                }
                denied = true;
            }
        }

        match self.base.iter().find(|m| m.covers(address)) {
            Some(mapping) => {
                let effective = mapping.target.capabilities();
                if !effective.permits(intent) {
                    return Err(MemoryFault::PermissionDenied { address });
                }
                let offset = u32::from(address) - u32::from(mapping.virtual_base);
                Ok(Resolved { target: &mapping.target, offset })
            }
            None if denied => Err(MemoryFault::PermissionDenied { address }),
            None => Err(MemoryFault::Unmapped { address }),
        }
    }

    pub fn read8(&self, address: u16, ctx: AccessContext) -> u8 {
        match self.resolve(address, ctx.intent) {
            Ok(resolved) => self.dispatch_read(resolved, ctx),
            Err(fault) => {
                log::trace!(target: "bus", "{fault}, floating bus");
                self.floating_bus_value
            }
        }
    }

    pub fn write8(&self, address: u16, value: u8, ctx: AccessContext) {
        match self.resolve(address, ctx.intent) {
            Ok(resolved) => self.dispatch_write(resolved, value, ctx),
            Err(fault) => {
                log::trace!(target: "bus", "{fault}, discarded");
            }
        }
    }

    fn dispatch_read(&self, resolved: Resolved<'_>, ctx: AccessContext) -> u8 {
        match resolved.target {
            BusTarget::RamSlice { .. } | BusTarget::RomSlice { .. } => resolved
                .target
                .read8_direct(resolved.offset as usize)
                .unwrap_or(self.floating_bus_value),
            BusTarget::Handler(id) => self.handlers[*id as usize].borrow_mut().read8(resolved.offset, ctx),
        }
    }

    fn dispatch_write(&self, resolved: Resolved<'_>, value: u8, ctx: AccessContext) {
        match resolved.target {
            BusTarget::RamSlice { .. } | BusTarget::RomSlice { .. } => {
                resolved.target.write8_direct(resolved.offset as usize, value);
            }
            BusTarget::Handler(id) => self.handlers[*id as usize].borrow_mut().write8(resolved.offset, value, ctx),
        }
    }

    /// Plain little-endian 16-bit read: `address` then `address+1`. No
    /// wraparound — ordinary absolute/indirect addressing crossing a page
    /// boundary behaves normally.
    pub fn read16(&self, address: u16, ctx: AccessContext) -> u16 {
        let lo = self.read8(address, ctx);
        let hi = self.read8(address.wrapping_add(1), ctx);
        u16::from_le_bytes([lo, hi])
    }

    /// Zero-page pointer dereference: both bytes are read from page 0, and
    /// the high-byte fetch wraps within the page (`$FF` then `$00`, not
    /// `$100`) rather than crossing into page 1 — the form used by
    /// `($zp),Y` / `($zp,X)` indirect addressing.
    pub fn read16_zero_page(&self, zp_offset: u8, ctx: AccessContext) -> u16 {
        let lo = self.read8(u16::from(zp_offset), ctx);
        let hi = self.read8(u16::from(zp_offset.wrapping_add(1)), ctx);
        u16::from_le_bytes([lo, hi])
    }

    /// The `JMP ($xxFF)` indirect-jump bug: when the pointer's low byte is
    /// `$FF`, the high byte is fetched from `$xx00` instead of `$(xx+1)00`.
    /// The CPU decides whether to call this or `read16`.
    pub fn read16_indirect_buggy(&self, address: u16, ctx: AccessContext) -> u16 {
        let lo = self.read8(address, ctx);
        let hi_addr = if address & 0x00ff == 0x00ff {
            address & 0xff00
        } else {
            address.wrapping_add(1)
        };
        let hi = self.read8(hi_addr, ctx);
        u16::from_le_bytes([lo, hi])
    }
}
