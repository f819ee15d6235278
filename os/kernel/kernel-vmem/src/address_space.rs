use crate::VmError;
use kernel_alloc::{PageAllocator, PageWindow};
use kernel_memory_addresses::{PhysicalAddress, VirtualAddress};

/// Handle to one address space: the physical address of its PML4.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PageMap(PhysicalAddress);

impl PageMap {
    #[must_use]
    pub const fn from_root(root: PhysicalAddress) -> Self {
        Self(root)
    }

    /// Physical address of the top-level table, as loaded into CR3.
    #[must_use]
    pub const fn root(&self) -> PhysicalAddress {
        self.0
    }
}

/// Creates and activates address spaces.
///
/// Table pages and user pages are drawn from `pages`; their contents are
/// written through its [`PageWindow`].
pub trait AddressSpaceManager<W: PageWindow> {
    /// Creates a new address space that contains the kernel mappings.
    ///
    /// # Errors
    /// [`VmError::OutOfPages`] if the allocator runs dry.
    fn setup_kvm(&mut self, pages: &mut PageAllocator<W>) -> Result<PageMap, VmError>;

    /// Maps one zeroed page at the user entry address of `map` and copies
    /// `size` bytes starting at `image` into it.
    ///
    /// # Errors
    /// [`VmError::ImageTooLarge`] if `size` exceeds a page,
    /// [`VmError::OutOfPages`] if the allocator runs dry,
    /// [`VmError::AlreadyMapped`] if the entry page already exists.
    fn setup_uvm(
        &mut self,
        pages: &mut PageAllocator<W>,
        map: PageMap,
        image: VirtualAddress,
        size: u64,
    ) -> Result<(), VmError>;

    /// Makes `map` the active address space.
    fn switch_vm(&mut self, map: PageMap);
}
