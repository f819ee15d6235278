use crate::{PhysicalAddress, VirtualAddress};

/// Fixed-offset translation between physical memory and its direct-mapped
/// virtual window.
///
/// The kernel maps low physical memory at `base + pa`. Both directions are
/// total: no range checks are performed. Translating a virtual address back
/// is only meaningful for addresses that came out of
/// [`to_virtual`](Self::to_virtual).
///
/// ### Examples
/// ```rust
/// # use kernel_memory_addresses::*;
/// let dm = DirectMap::new(0xFFFF_8000_0000_0000);
/// let va = dm.to_virtual(PhysicalAddress::new(0x20_0000));
/// assert_eq!(va.as_u64(), 0xFFFF_8000_0020_0000);
/// assert_eq!(dm.to_physical(va).as_u64(), 0x20_0000);
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DirectMap {
    base: u64,
}

impl DirectMap {
    #[inline]
    #[must_use]
    pub const fn new(base: u64) -> Self {
        Self { base }
    }

    /// The virtual address physical `0` is visible at.
    #[inline]
    #[must_use]
    pub const fn base(&self) -> VirtualAddress {
        VirtualAddress::new(self.base)
    }

    /// Physical → virtual: adds the direct-map offset.
    #[inline]
    #[must_use]
    pub const fn to_virtual(&self, pa: PhysicalAddress) -> VirtualAddress {
        VirtualAddress::new(pa.as_u64().wrapping_add(self.base))
    }

    /// Virtual → physical: subtracts the direct-map offset.
    #[inline]
    #[must_use]
    pub const fn to_physical(&self, va: VirtualAddress) -> PhysicalAddress {
        PhysicalAddress::new(va.as_u64().wrapping_sub(self.base))
    }
}
