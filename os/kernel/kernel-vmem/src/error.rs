use kernel_alloc::PageRangeError;
use kernel_memory_addresses::VirtualAddress;

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VmError {
    #[error("no free page for a page table or user page")]
    OutOfPages,
    #[error(transparent)]
    Page(#[from] PageRangeError),
    #[error("address {0} is not aligned to a 2 MiB page")]
    Misaligned(VirtualAddress),
    #[error("address {0} is already mapped")]
    AlreadyMapped(VirtualAddress),
    #[error("program image of {size} bytes does not fit into a {capacity} byte page")]
    ImageTooLarge { size: u64, capacity: u64 },
}
