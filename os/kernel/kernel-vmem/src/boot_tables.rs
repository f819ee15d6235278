use crate::{AddressSpaceManager, PageMap, TABLE_BYTES, TableEntry, TableLevel, VmError};
use kernel_alloc::{PageAllocator, PageWindow};
use kernel_info::memory::{MemoryLayout, PAGE_SIZE};
use kernel_info::process::USER_ENTRY;
use kernel_memory_addresses::{DirectMap, PhysicalAddress, Size2M, VirtualAddress};

/// Boot-time [`AddressSpaceManager`] mapping everything with 2 MiB pages.
///
/// Tables are reached through the direct map, so the allocator's pages can
/// be used for them without any temporary mappings.
#[derive(Debug)]
pub struct BootPageTables {
    direct_map: DirectMap,
    direct_map_size: u64,
    active: Option<PageMap>,
}

impl BootPageTables {
    /// Creates the manager for `layout`.
    ///
    /// # Safety
    /// [`switch_vm`](AddressSpaceManager::switch_vm) loads CR3 on bare metal.
    /// `layout` must describe the running kernel so that maps created by
    /// [`setup_kvm`](AddressSpaceManager::setup_kvm) keep its code, stack and
    /// data reachable.
    #[must_use]
    pub const unsafe fn new(layout: &MemoryLayout) -> Self {
        Self {
            direct_map: DirectMap::new(layout.direct_map_base),
            direct_map_size: layout.direct_map_size(),
            active: None,
        }
    }

    /// The map most recently passed to `switch_vm`.
    #[must_use]
    pub const fn active(&self) -> Option<PageMap> {
        self.active
    }

    /// Resolves `va` in `map` to its physical address and leaf entry.
    #[must_use]
    pub fn translate<W: PageWindow>(
        &self,
        window: &W,
        map: PageMap,
        va: VirtualAddress,
    ) -> Option<(PhysicalAddress, TableEntry)> {
        let mut table = map.root();
        for level in [TableLevel::Pml4, TableLevel::Pdpt, TableLevel::Pd] {
            let entry = TableEntry::from_bits(window.read_u64(self.slot(table, level, va)));
            if !entry.present() {
                return None;
            }
            if entry.huge() {
                let offset = va.as_u64() & (PAGE_SIZE - 1);
                return Some((entry.address() + offset, entry));
            }
            table = entry.address();
        }
        None
    }

    /// Direct-map address of `va`'s entry in the `level` table at `table`.
    fn slot(&self, table: PhysicalAddress, level: TableLevel, va: VirtualAddress) -> VirtualAddress {
        self.direct_map.to_virtual(table) + level.index_of(va) * 8
    }

    fn new_table<W: PageWindow>(
        &self,
        pages: &mut PageAllocator<W>,
    ) -> Result<PhysicalAddress, VmError> {
        let page = pages.allocate()?.ok_or(VmError::OutOfPages)?;
        pages.window_mut().zero(page, TABLE_BYTES);
        Ok(self.direct_map.to_physical(page))
    }

    /// Hands `table` and every table below it back to `pages`.
    fn release_table<W: PageWindow>(
        &self,
        pages: &mut PageAllocator<W>,
        table: PhysicalAddress,
        level: TableLevel,
    ) -> Result<(), VmError> {
        let base = self.direct_map.to_virtual(table);
        if let Some(child) = level.next() {
            for index in 0..TABLE_BYTES / 8 {
                let entry = TableEntry::from_bits(pages.window().read_u64(base + index * 8));
                if entry.present() && !entry.huge() {
                    self.release_table(pages, entry.address(), child)?;
                }
            }
        }
        pages.free(base)?;
        Ok(())
    }

    /// Installs a 2 MiB mapping `va -> pa` below `root`, creating missing
    /// intermediate tables.
    fn map_huge<W: PageWindow>(
        &self,
        pages: &mut PageAllocator<W>,
        root: PhysicalAddress,
        va: VirtualAddress,
        pa: PhysicalAddress,
        user: bool,
    ) -> Result<(), VmError> {
        if !va.is_aligned::<Size2M>() || !pa.is_aligned::<Size2M>() {
            return Err(VmError::Misaligned(va));
        }

        let mut table = root;
        for level in [TableLevel::Pml4, TableLevel::Pdpt] {
            let slot = self.slot(table, level, va);
            let entry = TableEntry::from_bits(pages.window().read_u64(slot));
            table = if entry.present() {
                if entry.huge() {
                    return Err(VmError::AlreadyMapped(va));
                }
                if user && !entry.user() {
                    pages
                        .window_mut()
                        .write_u64(slot, entry.with_user(true).into_bits());
                }
                entry.address()
            } else {
                let next = self.new_table(pages)?;
                pages
                    .window_mut()
                    .write_u64(slot, TableEntry::next_table(next, user).into_bits());
                next
            };
        }

        let slot = self.slot(table, TableLevel::Pd, va);
        if TableEntry::from_bits(pages.window().read_u64(slot)).present() {
            return Err(VmError::AlreadyMapped(va));
        }
        pages
            .window_mut()
            .write_u64(slot, TableEntry::huge_leaf(pa, true, user).into_bits());
        Ok(())
    }
}

impl<W: PageWindow> AddressSpaceManager<W> for BootPageTables {
    fn setup_kvm(&mut self, pages: &mut PageAllocator<W>) -> Result<PageMap, VmError> {
        let root = self.new_table(pages)?;

        let mut offset = 0;
        while offset < self.direct_map_size {
            let pa = PhysicalAddress::new(offset);
            let va = self.direct_map.to_virtual(pa);
            if let Err(err) = self.map_huge(pages, root, va, pa, false) {
                self.release_table(pages, root, TableLevel::Pml4)?;
                return Err(err);
            }
            offset += PAGE_SIZE;
        }

        log::debug!(
            "kernel address space at {root}: {}MB direct map at {}",
            self.direct_map_size >> 20,
            self.direct_map.base()
        );
        Ok(PageMap::from_root(root))
    }

    fn setup_uvm(
        &mut self,
        pages: &mut PageAllocator<W>,
        map: PageMap,
        image: VirtualAddress,
        size: u64,
    ) -> Result<(), VmError> {
        if size > PAGE_SIZE {
            return Err(VmError::ImageTooLarge {
                size,
                capacity: PAGE_SIZE,
            });
        }

        let page = pages.allocate()?.ok_or(VmError::OutOfPages)?;
        pages.window_mut().zero(page, PAGE_SIZE);

        let entry = VirtualAddress::new(USER_ENTRY);
        let backing = self.direct_map.to_physical(page);
        if let Err(err) = self.map_huge(pages, map.root(), entry, backing, true) {
            pages.free(page)?;
            return Err(err);
        }
        pages.window_mut().copy(page, image, size);

        log::debug!("user page at {entry} backed by {page}, {size} bytes copied");
        Ok(())
    }

    fn switch_vm(&mut self, map: PageMap) {
        #[cfg(all(target_arch = "x86_64", target_os = "none"))]
        // SAFETY: guaranteed by the contract of `BootPageTables::new`.
        unsafe {
            crate::Cr3::for_root(map.root()).store();
        }
        self.active = Some(map);
        log::debug!("switched to address space at {}", map.root());
    }
}
