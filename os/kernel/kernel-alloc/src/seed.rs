use crate::{PageAllocator, PageRangeError, PageWindow};
use core::fmt;
use kernel_info::memory::PAGE_SIZE;
use kernel_memory_addresses::{DirectMap, Size2M, VirtualAddress};
use kernel_mmap::UsableRegion;

/// Approximate top of usable memory: the free-list head after seeding plus
/// one page.
///
/// Reported once during boot; nothing enforces it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MemoryCeiling(VirtualAddress);

impl MemoryCeiling {
    #[must_use]
    pub const fn address(&self) -> VirtualAddress {
        self.0
    }
}

impl fmt::Display for MemoryCeiling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Outcome of [`seed`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SeedReport {
    /// Pages pushed onto the free list.
    pub pages_freed: usize,
    /// Whole pages inside usable regions that lie past the allocator ceiling.
    pub pages_skipped: usize,
    /// `None` if no page was freed.
    pub ceiling: Option<MemoryCeiling>,
}

/// Frees every whole page of the usable `regions` that lies past the kernel
/// image into `pages`.
///
/// For each region `[start, end)` (translated through `direct_map`):
/// - entirely below the kernel image end: skipped;
/// - straddling it: only `[kernel_image_end, end)` is used;
/// - otherwise the whole region is used.
///
/// Within the used range every 2 MiB page from the first page boundary up to
/// `end` is freed, in ascending order. Pages reaching past the allocator
/// ceiling are not freed; they are counted in
/// [`pages_skipped`](SeedReport::pages_skipped) and reported with `warn!`.
///
/// # Errors
/// Propagates [`PageRangeError`] from [`PageAllocator::free`], which only
/// happens if the allocator bounds disagree with `direct_map`.
pub fn seed<'a, W, I>(
    pages: &mut PageAllocator<W>,
    direct_map: &DirectMap,
    regions: I,
) -> Result<SeedReport, PageRangeError>
where
    W: PageWindow,
    I: IntoIterator<Item = &'a UsableRegion>,
{
    let kernel_image_end = pages.bounds().kernel_image_end();
    let ceiling = pages.bounds().ceiling();

    let mut pages_freed = 0;
    let mut pages_skipped = 0;

    for region in regions {
        let start = direct_map.to_virtual(region.start);
        let end = virtual_end(direct_map, region);

        let from = if start >= kernel_image_end {
            start
        } else if end > kernel_image_end {
            kernel_image_end
        } else {
            log::debug!("skipping region {start}..{end} below the kernel image");
            continue;
        };

        let mut page = from.align_up::<Size2M>();
        while let Some(next) = page.checked_add(PAGE_SIZE)
            && next <= end
        {
            if next > ceiling {
                let skipped = end.as_u64().saturating_sub(page.as_u64()) / PAGE_SIZE;
                log::warn!(
                    "{skipped} pages ({}MB) at {page}..{end} lie above the allocator ceiling {ceiling}",
                    (skipped * PAGE_SIZE) >> 20
                );
                pages_skipped += usize::try_from(skipped).unwrap_or(usize::MAX);
                break;
            }

            pages.free(page)?;
            pages_freed += 1;
            page = next;
        }
    }

    let ceiling = pages
        .peek()
        .map(|head| MemoryCeiling(head.saturating_add(PAGE_SIZE)));

    Ok(SeedReport {
        pages_freed,
        pages_skipped,
        ceiling,
    })
}

/// Direct-map address just past `region`, saturating at the top of the
/// address space.
fn virtual_end(direct_map: &DirectMap, region: &UsableRegion) -> VirtualAddress {
    direct_map
        .base()
        .checked_add(region.end().as_u64())
        .unwrap_or(VirtualAddress::new(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PageBounds;
    use crate::testing::SparseMemory;
    use kernel_info::memory::{DIRECT_MAP_BASE, DIRECT_MAP_CEILING};
    use kernel_memory_addresses::PhysicalAddress;

    const DM: DirectMap = DirectMap::new(DIRECT_MAP_BASE);

    fn allocator(kernel_end_pa: u64) -> PageAllocator<SparseMemory> {
        PageAllocator::new(
            SparseMemory::new(),
            PageBounds::new(
                VirtualAddress::new(DIRECT_MAP_BASE + kernel_end_pa),
                VirtualAddress::new(DIRECT_MAP_CEILING),
            ),
        )
    }

    fn region(start: u64, length: u64) -> UsableRegion {
        UsableRegion::new(PhysicalAddress::new(start), length)
    }

    fn drain(pages: &mut PageAllocator<SparseMemory>) -> Vec<u64> {
        let mut out = Vec::new();
        while let Some(va) = pages.allocate().unwrap() {
            out.push(DM.to_physical(va).as_u64());
        }
        out.sort_unstable();
        out
    }

    #[test]
    fn region_below_kernel_end_frees_nothing() {
        let mut pages = allocator(0x80_0000);
        let report = seed(&mut pages, &DM, &[region(0, 0x9_F000)]).unwrap();
        assert_eq!(report.pages_freed, 0);
        assert_eq!(report.ceiling, None);
        assert_eq!(pages.available(), 0);
    }

    #[test]
    fn partial_page_past_kernel_end_is_not_freed() {
        // [round_up(0x10_0000), 0x30_0000) is only 1 MiB
        let mut pages = allocator(0x10_0000);
        let report = seed(&mut pages, &DM, &[region(0, 0x30_0000)]).unwrap();
        assert_eq!(report.pages_freed, 0);
        assert_eq!(report.ceiling, None);
        assert_eq!(pages.available(), 0);
    }

    #[test]
    fn straddling_region_starts_at_kernel_end() {
        let mut pages = allocator(0x10_0000);
        let report = seed(&mut pages, &DM, &[region(0, 0x40_0000)]).unwrap();
        assert_eq!(report.pages_freed, 1);
        assert_eq!(drain(&mut pages), [0x20_0000]);
    }

    #[test]
    fn straddling_region_frees_exactly_whole_pages_past_end() {
        let mut pages = allocator(0x45_0000);
        seed(&mut pages, &DM, &[region(0x10_0000, 0xF0_0000)]).unwrap();
        // [round_up(0x45_0000), 0x100_0000) = pages at 6, 8, A, C, E MiB
        assert_eq!(
            drain(&mut pages),
            [0x60_0000, 0x80_0000, 0xA0_0000, 0xC0_0000, 0xE0_0000]
        );
    }

    #[test]
    fn region_above_kernel_end_is_rounded_inward() {
        let mut pages = allocator(0x40_0000);
        seed(&mut pages, &DM, &[region(0x50_0000, 0x50_0000)]).unwrap();
        // [0x50_0000, 0xA0_0000): only 0x60_0000 and 0x80_0000 are whole
        assert_eq!(drain(&mut pages), [0x60_0000, 0x80_0000]);
    }

    #[test]
    fn pages_are_freed_in_ascending_order() {
        let mut pages = allocator(0x40_0000);
        let report = seed(&mut pages, &DM, &[region(0x40_0000, 0x60_0000)]).unwrap();
        assert_eq!(report.pages_freed, 3);
        // LIFO: the highest page comes out first
        assert_eq!(
            pages.allocate().unwrap(),
            Some(DM.to_virtual(PhysicalAddress::new(0x80_0000)))
        );
    }

    #[test]
    fn ceiling_is_head_plus_one_page() {
        let mut pages = allocator(0x40_0000);
        let report = seed(
            &mut pages,
            &DM,
            &[region(0x40_0000, 0x40_0000), region(0x100_0000, 0x20_0000)],
        )
        .unwrap();
        assert_eq!(
            report.ceiling.as_ref().map(MemoryCeiling::address),
            Some(VirtualAddress::new(DIRECT_MAP_BASE + 0x120_0000))
        );
    }

    #[test]
    fn pages_past_ceiling_are_skipped() {
        let mut pages = allocator(0x40_0000);
        // 1 GiB ceiling; region runs from 1 GiB - 4 MiB to 1 GiB + 6 MiB
        let report = seed(&mut pages, &DM, &[region(0x3FC0_0000, 0xA0_0000)]).unwrap();
        assert_eq!(report.pages_freed, 2);
        assert_eq!(report.pages_skipped, 3);
        assert_eq!(drain(&mut pages), [0x3FC0_0000, 0x3FE0_0000]);
    }

    #[test]
    fn region_entirely_past_ceiling_frees_nothing() {
        let mut pages = allocator(0x40_0000);
        let report = seed(&mut pages, &DM, &[region(0x1_0000_0000, 0x1_0000_0000)]).unwrap();
        assert_eq!(report.pages_freed, 0);
        assert_eq!(report.pages_skipped, 2048);
        assert_eq!(report.ceiling, None);
    }

    #[test]
    fn every_seeded_page_satisfies_bounds() {
        let mut pages = allocator(0x25_0000);
        seed(
            &mut pages,
            &DM,
            &[
                region(0, 0x9_F000),
                region(0x10_0000, 0x7EE_0000),
                region(0x3FF0_0000, 0x100_0000),
            ],
        )
        .unwrap();
        let bounds = *pages.bounds();
        while let Some(va) = pages.allocate().unwrap() {
            assert!(bounds.check(va).is_ok());
        }
    }
}
