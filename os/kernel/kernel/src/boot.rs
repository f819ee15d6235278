use kernel_alloc::{PageAllocator, PageBounds, PageRangeError, PageWindow, SeedReport, seed};
use kernel_info::boot::E820Entry;
use kernel_info::memory::MemoryLayout;
use kernel_memory_addresses::{DirectMap, VirtualAddress};
use kernel_mmap::{MemoryMapError, UsableRegions};
use kernel_process::{FirstProcess, ProcessError, ProcessTable};
use kernel_vmem::{AddressSpaceManager, VmError};
use log::{info, warn};

/// A fault that stops the boot. There is no recovery; the kernel halts.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BootFault {
    #[error("memory map: {0}")]
    MemoryMap(#[from] MemoryMapError),
    #[error("page allocator: {0}")]
    Page(#[from] PageRangeError),
    #[error("address space: {0}")]
    AddressSpace(#[from] VmError),
    #[error("process: {0}")]
    Process(#[from] ProcessError),
}

/// The physical memory state after [`init_memory`].
#[derive(Debug)]
pub struct BootMemory<W> {
    /// Allocator seeded with every usable page above the kernel image.
    pub pages: PageAllocator<W>,
    /// Usable regions as reported by the firmware.
    pub regions: UsableRegions,
    pub report: SeedReport,
}

/// Scans the firmware map, seeds a page allocator from it and reports the
/// memory ceiling.
///
/// An empty allocator is not a fault here; the first allocation that needs
/// a page reports it.
///
/// # Errors
/// [`BootFault::MemoryMap`] for a malformed map and [`BootFault::Page`] if
/// `layout` and the allocator bounds disagree.
pub fn init_memory<W: PageWindow>(
    window: W,
    layout: &MemoryLayout,
    entries: &[E820Entry],
) -> Result<BootMemory<W>, BootFault> {
    let regions = kernel_mmap::scan(entries)?;

    let mut pages = PageAllocator::new(window, PageBounds::from_layout(layout));
    let report = seed(&mut pages, &DirectMap::new(layout.direct_map_base), &regions)?;

    match report.ceiling {
        Some(ceiling) => info!("memory ceiling: {ceiling}"),
        None => warn!("no usable page above the kernel image"),
    }
    info!("{} pages free", pages.available());

    Ok(BootMemory {
        pages,
        regions,
        report,
    })
}

/// Bootstraps the first process from `memory`, with `image_size` bytes at
/// `image` as its program.
///
/// # Errors
/// [`BootFault::Process`] for any bootstrap failure.
pub fn init_process<W, V>(
    table: &mut ProcessTable,
    memory: &mut BootMemory<W>,
    vm: &mut V,
    image: VirtualAddress,
    image_size: u64,
) -> Result<FirstProcess, BootFault>
where
    W: PageWindow,
    V: AddressSpaceManager<W>,
{
    Ok(table.bootstrap_first_process(&mut memory.pages, vm, image, image_size)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_alloc::testing::SparseMemory;
    use kernel_info::boot::{E820_RESERVED, E820_USABLE, MAX_MEMORY_REGIONS};
    use kernel_info::memory::{DIRECT_MAP_BASE, PAGE_SIZE};

    fn layout() -> MemoryLayout {
        MemoryLayout::with_kernel_end(DIRECT_MAP_BASE + 0x30_0000)
    }

    #[test]
    fn memory_is_seeded_above_the_kernel() {
        let entries = [
            E820Entry::new(0, 0x9_f000, E820_USABLE),
            E820Entry::new(0xf_0000, 0x1_0000, E820_RESERVED),
            E820Entry::new(0x10_0000, 0x90_0000, E820_USABLE),
        ];
        let memory = init_memory(SparseMemory::new(), &layout(), &entries).unwrap();

        assert_eq!(memory.regions.len(), 2);
        // 0x40_0000, 0x60_0000, 0x80_0000
        assert_eq!(memory.report.pages_freed, 3);
        assert_eq!(memory.pages.available(), 3);
        assert_eq!(
            memory.report.ceiling.unwrap().address(),
            VirtualAddress::new(DIRECT_MAP_BASE + 0xa0_0000)
        );
    }

    #[test]
    fn no_usable_memory_is_not_a_fault() {
        let entries = [E820Entry::new(0, 0x20_0000, E820_USABLE)];
        let memory = init_memory(SparseMemory::new(), &layout(), &entries).unwrap();
        assert_eq!(memory.report.ceiling, None);
        assert_eq!(memory.pages.available(), 0);
    }

    #[test]
    fn oversized_map_is_fatal() {
        let entries = [E820Entry::new(0, PAGE_SIZE, E820_USABLE); MAX_MEMORY_REGIONS + 1];
        let fault = init_memory(SparseMemory::new(), &layout(), &entries).unwrap_err();
        assert_eq!(
            fault,
            BootFault::MemoryMap(MemoryMapError::TooManyRegions {
                count: MAX_MEMORY_REGIONS + 1,
                capacity: MAX_MEMORY_REGIONS,
            })
        );
    }
}
