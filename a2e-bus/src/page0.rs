// Spec: §4.6 "Page-0 composite target", §9 "Back-reference from page-0
// target to switch controller"
//
// Design: no direct teacher analogue — the C64 has no equivalent
// sub-4 KiB routing requirement. Built fresh, following §9's explicit push
// strategy: the 80-column controller owns this target's routing table and
// writes into it on every contributing switch change; the target itself
// only ever reads the table, avoiding a controller <-> target ownership
// cycle (the controller holds `Shared<RoutingTable>`, the target holds the
// same `Shared`, bus mapping holds a non-owning `BusTarget::Handler` id).

use a2e_core::{AccessContext, PhysicalMemory, Shared};

use crate::bus::BusHandler;

/// Independent read/write routing for one address category, since
/// `RAMRD`/`RAMWRT` route reads and writes asymmetrically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoutingEntry {
    pub read_aux: bool,
    pub write_aux: bool,
}

/// Routing for every sub-range `$0000-$BFFF` touches that general
/// `RAMRD`/`RAMWRT` routing doesn't already cover on its own (§4.4's
/// routing-rules table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoutingTable {
    /// `$0000-$01FF`: zero page and stack, gated by `ALTZP` alone.
    pub zero_page_stack: RoutingEntry,
    /// `$0400-$07FF`: text page 1, gated by `80STORE` ∧ `PAGE2` when
    /// `80STORE` is set, else by `RAMRD`/`RAMWRT`.
    pub text_page1: RoutingEntry,
    /// `$2000-$3FFF`: hi-res page 1, gated by `80STORE` ∧ `HIRES` ∧
    /// `PAGE2` when both `80STORE` and `HIRES` are set, else by
    /// `RAMRD`/`RAMWRT`.
    pub hires_page1: RoutingEntry,
    /// Everything else in `$0200-$BFFF`: plain `RAMRD`/`RAMWRT`.
    pub general: RoutingEntry,
}

impl RoutingTable {
    fn entry_for(&self, address: u16) -> RoutingEntry {
        match address {
            0x0000..=0x01ff => self.zero_page_stack,
            0x0400..=0x07ff => self.text_page1,
            0x2000..=0x3fff => self.hires_page1,
            _ => self.general,
        }
    }
}

/// Consults a pushed `RoutingTable` to pick between the main-RAM and
/// aux-RAM blocks for `$0000-$BFFF`. Both blocks are full 64 KiB images, so
/// the region offset equals the absolute address.
pub struct Page0CompositeTarget {
    main_ram: Shared<PhysicalMemory>,
    aux_ram: Shared<PhysicalMemory>,
    routing: Shared<RoutingTable>,
}

impl Page0CompositeTarget {
    pub fn new(main_ram: Shared<PhysicalMemory>, aux_ram: Shared<PhysicalMemory>, routing: Shared<RoutingTable>) -> Self {
        Self { main_ram, aux_ram, routing }
    }
}

impl BusHandler for Page0CompositeTarget {
    fn read8(&mut self, region_offset: u32, _ctx: AccessContext) -> u8 {
        let address = region_offset as u16;
        let entry = self.routing.borrow().entry_for(address);
        let block = if entry.read_aux { &self.aux_ram } else { &self.main_ram };
        block.borrow().read(address as usize)
    }

    fn write8(&mut self, region_offset: u32, value: u8, _ctx: AccessContext) {
        let address = region_offset as u16;
        let entry = self.routing.borrow().entry_for(address);
        let block = if entry.write_aux { &self.aux_ram } else { &self.main_ram };
        block.borrow_mut().write(address as usize, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use a2e_core::{new_shared, AccessIntent};

    fn ctx(addr: u16) -> AccessContext {
        AccessContext::new(addr, AccessIntent::DataRead, 0)
    }

    #[test]
    fn routes_by_category_independently_for_read_and_write() {
        let main = new_shared(PhysicalMemory::new(0x10000, 0x11, "main").unwrap());
        let aux = new_shared(PhysicalMemory::new(0x10000, 0x22, "aux").unwrap());
        let mut table = RoutingTable::default();
        table.zero_page_stack = RoutingEntry { read_aux: true, write_aux: false };
        let routing = new_shared(table);
        let mut target = Page0CompositeTarget::new(main.clone(), aux.clone(), routing);

        assert_eq!(0x22, target.read8(0x0050, ctx(0x0050)));
        target.write8(0x0050, 0x99, ctx(0x0050));
        assert_eq!(0x99, main.borrow().read(0x0050));
        assert_eq!(0x22, aux.borrow().read(0x0050));
    }

    #[test]
    fn general_range_defaults_to_main() {
        let main = new_shared(PhysicalMemory::new(0x10000, 0xaa, "main").unwrap());
        let aux = new_shared(PhysicalMemory::new(0x10000, 0xbb, "aux").unwrap());
        let routing = new_shared(RoutingTable::default());
        let mut target = Page0CompositeTarget::new(main, aux, routing);
        assert_eq!(0xaa, target.read8(0x6000, ctx(0x6000)));
    }
}
