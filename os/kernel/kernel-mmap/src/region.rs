use core::fmt;
use kernel_info::boot::{E820_RESERVED, E820_USABLE, E820Entry};
use kernel_memory_addresses::PhysicalAddress;

/// Classification of a firmware memory region.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RegionKind {
    /// RAM free for general use.
    Usable,
    /// Reserved by the firmware.
    Reserved,
    /// Any other firmware type (ACPI, NVS, bad memory, ...).
    Other(u32),
}

impl RegionKind {
    #[must_use]
    pub const fn from_raw(kind: u32) -> Self {
        match kind {
            E820_USABLE => Self::Usable,
            E820_RESERVED => Self::Reserved,
            other => Self::Other(other),
        }
    }

    #[must_use]
    pub const fn into_raw(self) -> u32 {
        match self {
            Self::Usable => E820_USABLE,
            Self::Reserved => E820_RESERVED,
            Self::Other(other) => other,
        }
    }
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usable => f.write_str("usable"),
            Self::Reserved => f.write_str("reserved"),
            Self::Other(kind) => write!(f, "type {kind}"),
        }
    }
}

/// A firmware-reported region, decoded from an [`E820Entry`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MemoryRegion {
    pub start: PhysicalAddress,
    pub length: u64,
    pub kind: RegionKind,
}

impl From<&E820Entry> for MemoryRegion {
    fn from(entry: &E820Entry) -> Self {
        // Copy out of the packed record before use.
        let (address, length, kind) = (entry.address, entry.length, entry.kind);
        Self {
            start: PhysicalAddress::new(address),
            length,
            kind: RegionKind::from_raw(kind),
        }
    }
}

/// A physical range the page allocator may take pages from.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct UsableRegion {
    pub start: PhysicalAddress,
    pub length: u64,
}

impl UsableRegion {
    #[must_use]
    pub const fn new(start: PhysicalAddress, length: u64) -> Self {
        Self { start, length }
    }

    /// First physical address past the region, saturating at `u64::MAX`.
    #[must_use]
    pub const fn end(&self) -> PhysicalAddress {
        PhysicalAddress::new(self.start.as_u64().saturating_add(self.length))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_decode_from_firmware_types() {
        assert_eq!(RegionKind::from_raw(1), RegionKind::Usable);
        assert_eq!(RegionKind::from_raw(2), RegionKind::Reserved);
        assert_eq!(RegionKind::from_raw(3), RegionKind::Other(3));
        assert_eq!(RegionKind::Other(5).into_raw(), 5);
    }

    #[test]
    fn region_from_packed_entry() {
        let e = E820Entry::new(0x10_0000, 0x7EE_0000, 1);
        let r = MemoryRegion::from(&e);
        assert_eq!(r.start, PhysicalAddress::new(0x10_0000));
        assert_eq!(r.length, 0x7EE_0000);
        assert_eq!(r.kind, RegionKind::Usable);
    }

    #[test]
    fn end_saturates() {
        let r = UsableRegion::new(PhysicalAddress::new(u64::MAX - 1), 10);
        assert_eq!(r.end().as_u64(), u64::MAX);
    }
}
