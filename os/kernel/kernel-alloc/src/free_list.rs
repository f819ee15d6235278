use crate::{PageRangeError, PageWindow};
use kernel_info::memory::{MemoryLayout, PAGE_SIZE};
use kernel_memory_addresses::{Size2M, VirtualAddress};

/// Address constraints every managed page must satisfy.
///
/// A page `p` is acceptable when
/// - `p` is 2 MiB aligned,
/// - `p >= kernel_image_end`, and
/// - `p + PAGE_SIZE <= ceiling`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PageBounds {
    kernel_image_end: VirtualAddress,
    ceiling: VirtualAddress,
}

impl PageBounds {
    #[must_use]
    pub const fn new(kernel_image_end: VirtualAddress, ceiling: VirtualAddress) -> Self {
        Self {
            kernel_image_end,
            ceiling,
        }
    }

    #[must_use]
    pub const fn from_layout(layout: &MemoryLayout) -> Self {
        Self::new(
            VirtualAddress::new(layout.kernel_image_end),
            VirtualAddress::new(layout.direct_map_ceiling),
        )
    }

    /// First address past the static kernel image.
    #[must_use]
    pub const fn kernel_image_end(&self) -> VirtualAddress {
        self.kernel_image_end
    }

    /// First address the allocator never hands out.
    #[must_use]
    pub const fn ceiling(&self) -> VirtualAddress {
        self.ceiling
    }

    /// Validates `page` against the three constraints, in order.
    ///
    /// # Errors
    /// The first constraint `page` violates.
    pub fn check(&self, page: VirtualAddress) -> Result<(), PageRangeError> {
        if !page.is_aligned::<Size2M>() {
            return Err(PageRangeError::Misaligned(page));
        }

        if page < self.kernel_image_end {
            return Err(PageRangeError::BelowKernelImage {
                page,
                kernel_image_end: self.kernel_image_end,
            });
        }

        match page.checked_add(PAGE_SIZE) {
            Some(end) if end <= self.ceiling => Ok(()),
            _ => Err(PageRangeError::AboveCeiling {
                page,
                ceiling: self.ceiling,
            }),
        }
    }
}

/// LIFO free list of 2 MiB pages.
///
/// The list is threaded through the pages themselves: the first word of a
/// free page holds the virtual address of the next free page, or `0` at the
/// tail. All accesses go through the [`PageWindow`] `W`.
///
/// The allocator never looks at page contents beyond that first word and
/// never zeroes pages; callers that need clean memory zero it themselves.
#[derive(Debug)]
pub struct PageAllocator<W> {
    window: W,
    bounds: PageBounds,
    head: Option<VirtualAddress>,
    free_pages: usize,
}

impl<W: PageWindow> PageAllocator<W> {
    /// Creates an empty allocator.
    #[must_use]
    pub const fn new(window: W, bounds: PageBounds) -> Self {
        Self {
            window,
            bounds,
            head: None,
            free_pages: 0,
        }
    }

    /// Hands `page` to the allocator.
    ///
    /// The page becomes the new list head; its first word is overwritten
    /// with the previous head.
    ///
    /// Freeing a page that is already on the list corrupts the list. The
    /// allocator does not detect this.
    ///
    /// # Errors
    /// [`PageRangeError`] if `page` violates the [`PageBounds`]. The list is
    /// left untouched in that case.
    pub fn free(&mut self, page: VirtualAddress) -> Result<(), PageRangeError> {
        self.bounds.check(page)?;

        let next = self.head.map_or(0, VirtualAddress::as_u64);
        self.window.write_u64(page, next);
        self.head = Some(page);
        self.free_pages += 1;

        log::trace!("free page {page}");
        Ok(())
    }

    /// Takes the most recently freed page off the list.
    ///
    /// Returns `Ok(None)` when no page is available; the allocator is not
    /// modified in that case. The contents of a returned page are
    /// unspecified.
    ///
    /// # Errors
    /// [`PageRangeError`] if the head of the list no longer satisfies the
    /// [`PageBounds`], meaning the list was corrupted.
    pub fn allocate(&mut self) -> Result<Option<VirtualAddress>, PageRangeError> {
        let Some(page) = self.head else {
            return Ok(None);
        };
        self.bounds.check(page)?;

        let next = self.window.read_u64(page);
        self.head = (next != 0).then_some(VirtualAddress::new(next));
        self.free_pages = self.free_pages.saturating_sub(1);

        log::trace!("allocate page {page}");
        Ok(Some(page))
    }

    /// The page the next [`allocate`](Self::allocate) would return.
    #[must_use]
    pub const fn peek(&self) -> Option<VirtualAddress> {
        self.head
    }

    /// Number of pages currently on the free list.
    #[must_use]
    pub const fn available(&self) -> usize {
        self.free_pages
    }

    #[must_use]
    pub const fn bounds(&self) -> &PageBounds {
        &self.bounds
    }

    #[must_use]
    pub const fn window(&self) -> &W {
        &self.window
    }

    /// Mutable access to page contents, for owners of allocated pages.
    pub const fn window_mut(&mut self) -> &mut W {
        &mut self.window
    }
}
