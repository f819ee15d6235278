//! # Kernel Boot Information
//!
//! The loader queries the BIOS (`int 0x15, eax=0xe820`) before entering long
//! mode and leaves the result in low memory:
//!
//! ```text
//! 0x9000  i32        number of records
//! 0x9008  E820Entry  record[0]
//! 0x901c  E820Entry  record[1]
//!  ...
//! ```

/// Physical address of the `i32` record count.
pub const MEMORY_MAP_COUNT_ADDRESS: u64 = 0x9000;

/// Physical address of the first [`E820Entry`].
pub const MEMORY_MAP_ADDRESS: u64 = 0x9008;

/// Maximum number of records the kernel accepts.
pub const MAX_MEMORY_REGIONS: usize = 50;

/// Region type reported for RAM that is free for general use.
pub const E820_USABLE: u32 = 1;

/// Region type reported for firmware-reserved memory.
pub const E820_RESERVED: u32 = 2;

/// One firmware memory map record.
///
/// The layout is fixed by the loader; records are packed back to back
/// (20 bytes each) without padding.
#[repr(C, packed)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct E820Entry {
    /// Physical start address of the region.
    pub address: u64,
    /// Length of the region in bytes.
    pub length: u64,
    /// Region type ([`E820_USABLE`], [`E820_RESERVED`], ...).
    pub kind: u32,
}

impl E820Entry {
    #[must_use]
    pub const fn new(address: u64, length: u64, kind: u32) -> Self {
        Self {
            address,
            length,
            kind,
        }
    }
}

const _: () = {
    assert!(size_of::<E820Entry>() == 20);
    assert!(MEMORY_MAP_ADDRESS > MEMORY_MAP_COUNT_ADDRESS);
};
