//! # Memory Layout

/// Size of every page handed out by the page allocator (2 MiB).
pub const PAGE_SIZE: u64 = 2 * 1024 * 1024;

/// Number of low bits covered by [`PAGE_SIZE`].
pub const PAGE_SHIFT: u32 = 21;

/// Base of the direct map.
///
/// Physical address `pa` is visible to the kernel at `DIRECT_MAP_BASE + pa`.
pub const DIRECT_MAP_BASE: u64 = 0xffff_8000_0000_0000;

/// Amount of physical memory covered by the direct map.
pub const DIRECT_MAP_SIZE: u64 = 1024 * 1024 * 1024;

/// First virtual address past the direct map.
///
/// Pages at or above this address are never managed by the page allocator;
/// the range is kept free for other virtual memory uses.
pub const DIRECT_MAP_CEILING: u64 = DIRECT_MAP_BASE + DIRECT_MAP_SIZE;

/// Where the kernel executes (VMA), matches the linker script.
///
/// # Kernel Build
/// This information is sourced in the kernel's `build.rs` to configure
/// the linker.
pub const KERNEL_BASE: u64 = DIRECT_MAP_BASE + PHYS_LOAD;

/// Where the loader places the kernel image in *physical* memory (LMA).
pub const PHYS_LOAD: u64 = 0x0020_0000; // 2 MiB

const _: () = {
    assert!(PAGE_SIZE == 1 << PAGE_SHIFT);
    assert!(DIRECT_MAP_BASE.is_multiple_of(PAGE_SIZE));
    assert!(DIRECT_MAP_SIZE.is_multiple_of(PAGE_SIZE));
    assert!(DIRECT_MAP_CEILING > KERNEL_BASE);
    assert!(KERNEL_BASE.is_multiple_of(PAGE_SIZE));
};

/// The memory layout the allocator is seeded against.
///
/// Built once during early boot from the constants in this module and the
/// linker-provided end of the kernel image, then passed by reference.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct MemoryLayout {
    /// Offset added to a physical address to obtain its direct-map address.
    pub direct_map_base: u64,
    /// First virtual address the allocator must never hand out.
    pub direct_map_ceiling: u64,
    /// First virtual address past the loaded kernel image.
    pub kernel_image_end: u64,
}

impl MemoryLayout {
    /// Layout of the running kernel, given the end of its image.
    #[must_use]
    pub const fn with_kernel_end(kernel_image_end: u64) -> Self {
        Self {
            direct_map_base: DIRECT_MAP_BASE,
            direct_map_ceiling: DIRECT_MAP_CEILING,
            kernel_image_end,
        }
    }

    /// Size of the direct-mapped window in bytes.
    #[must_use]
    pub const fn direct_map_size(&self) -> u64 {
        self.direct_map_ceiling - self.direct_map_base
    }
}
