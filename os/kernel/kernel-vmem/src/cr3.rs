use bitfield_struct::bitfield;
use kernel_memory_addresses::PhysicalAddress;

/// CR3 with PCID disabled: the PML4 base plus its caching flags.
#[bitfield(u64)]
pub struct Cr3 {
    #[bits(3)]
    _reserved0: u8,
    pub write_through: bool,
    pub cache_disabled: bool,
    #[bits(7)]
    _reserved1: u8,
    /// PML4 physical base >> 12.
    #[bits(40)]
    pml4_frame: u64,
    #[bits(12)]
    _reserved2: u16,
}

impl Cr3 {
    /// CR3 value selecting the PML4 at `root` (4 KiB aligned) with default
    /// caching.
    #[must_use]
    pub const fn for_root(root: PhysicalAddress) -> Self {
        Self::new().with_pml4_frame(root.as_u64() >> 12)
    }

    #[must_use]
    pub const fn root(&self) -> PhysicalAddress {
        PhysicalAddress::new(self.pml4_frame() << 12)
    }

    /// Loads the value into CR3, flushing non-global TLB entries.
    ///
    /// # Safety
    /// Must run in ring 0. The new tables must map the currently executing
    /// code, its stack and every structure the kernel touches afterwards.
    #[cfg(all(target_arch = "x86_64", target_os = "none"))]
    pub unsafe fn store(self) {
        let bits = self.into_bits();
        unsafe {
            core::arch::asm!("mov cr3, {}", in(reg) bits, options(nostack, preserves_flags));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_round_trips() {
        let cr3 = Cr3::for_root(PhysicalAddress::new(0x3FE0_0000));
        assert_eq!(cr3.into_bits(), 0x3FE0_0000);
        assert_eq!(cr3.root(), PhysicalAddress::new(0x3FE0_0000));
    }
}
