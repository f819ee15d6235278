use bitfield_struct::bitfield;
use kernel_memory_addresses::{PageSize, PhysicalAddress, Size4K, VirtualAddress};

/// Bytes occupied by one table (512 entries of 8 bytes).
pub const TABLE_BYTES: u64 = Size4K::SIZE;

const _: () = assert!(TABLE_BYTES == 512 * 8);

/// One 64-bit entry of a PML4, PDPT or PD.
///
/// | Bits   | Field |
/// |--------|-------|
/// | 0      | present |
/// | 1      | writable |
/// | 2      | user |
/// | 3–4    | write-through, cache-disabled |
/// | 5–6    | accessed, dirty (set by the CPU) |
/// | 7      | huge: in a PD entry, maps a 2 MiB page instead of pointing to a PT |
/// | 8      | global |
/// | 12–51  | physical frame number (address >> 12) |
/// | 63     | no-execute |
#[bitfield(u64)]
pub struct TableEntry {
    pub present: bool,
    pub writable: bool,
    pub user: bool,
    pub write_through: bool,
    pub cache_disabled: bool,
    pub accessed: bool,
    pub dirty: bool,
    pub huge: bool,
    pub global: bool,
    #[bits(3)]
    pub available_low: u8,
    #[bits(40)]
    frame: u64,
    #[bits(11)]
    pub available_high: u16,
    pub no_execute: bool,
}

impl TableEntry {
    /// Entry pointing at the next-level table at `table`.
    ///
    /// Intermediate entries are always writable; `user` must be set on every
    /// level for a user-accessible leaf.
    #[must_use]
    pub const fn next_table(table: PhysicalAddress, user: bool) -> Self {
        Self::new()
            .with_present(true)
            .with_writable(true)
            .with_user(user)
            .with_frame(table.as_u64() >> 12)
    }

    /// Leaf entry mapping the 2 MiB page at `page`.
    #[must_use]
    pub const fn huge_leaf(page: PhysicalAddress, writable: bool, user: bool) -> Self {
        Self::new()
            .with_present(true)
            .with_writable(writable)
            .with_user(user)
            .with_huge(true)
            .with_frame(page.as_u64() >> 12)
    }

    /// Physical address the entry points at.
    #[must_use]
    pub const fn address(&self) -> PhysicalAddress {
        PhysicalAddress::new(self.frame() << 12)
    }
}

/// The table levels a 2 MiB mapping walks through.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TableLevel {
    Pml4,
    Pdpt,
    Pd,
}

impl TableLevel {
    const fn shift(self) -> u32 {
        match self {
            Self::Pml4 => 39,
            Self::Pdpt => 30,
            Self::Pd => 21,
        }
    }

    /// Level of the tables this level's non-leaf entries point to.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Pml4 => Some(Self::Pdpt),
            Self::Pdpt => Some(Self::Pd),
            Self::Pd => None,
        }
    }

    /// Index of `va`'s entry in a table of this level.
    #[must_use]
    pub const fn index_of(self, va: VirtualAddress) -> u64 {
        (va.as_u64() >> self.shift()) & 0x1FF
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_table_bits() {
        let e = TableEntry::next_table(PhysicalAddress::new(0x20_0000), false);
        assert_eq!(e.into_bits(), 0x20_0000 | 0b11);
        let u = TableEntry::next_table(PhysicalAddress::new(0x20_0000), true);
        assert_eq!(u.into_bits(), 0x20_0000 | 0b111);
    }

    #[test]
    fn huge_leaf_bits() {
        let e = TableEntry::huge_leaf(PhysicalAddress::new(0x4000_0000), true, false);
        assert_eq!(e.into_bits(), 0x4000_0000 | 0x83);
        assert!(e.huge());
        assert_eq!(e.address(), PhysicalAddress::new(0x4000_0000));
    }

    #[test]
    fn indices_of_direct_map_base() {
        let va = VirtualAddress::new(0xFFFF_8000_0040_0000);
        assert_eq!(TableLevel::Pml4.index_of(va), 256);
        assert_eq!(TableLevel::Pdpt.index_of(va), 0);
        assert_eq!(TableLevel::Pd.index_of(va), 2);
    }

    #[test]
    fn indices_of_user_entry() {
        let va = VirtualAddress::new(0x40_0000);
        assert_eq!(TableLevel::Pml4.index_of(va), 0);
        assert_eq!(TableLevel::Pdpt.index_of(va), 0);
        assert_eq!(TableLevel::Pd.index_of(va), 2);
    }
}
