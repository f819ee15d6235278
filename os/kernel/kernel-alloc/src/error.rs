use kernel_memory_addresses::VirtualAddress;

/// A page handed to (or found on) the free list violates the allocator's
/// address constraints.
///
/// This is always a programming error; callers treat it as fatal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageRangeError {
    #[error("page {0} is not aligned to the page size")]
    Misaligned(VirtualAddress),
    #[error("page {page} lies below the end of the kernel image at {kernel_image_end}")]
    BelowKernelImage {
        page: VirtualAddress,
        kernel_image_end: VirtualAddress,
    },
    #[error("page {page} extends past the allocator ceiling at {ceiling}")]
    AboveCeiling {
        page: VirtualAddress,
        ceiling: VirtualAddress,
    },
}
