use kernel_alloc::PageRangeError;
use kernel_vmem::VmError;

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProcessError {
    #[error("process table is full")]
    NoUnusedSlot,
    #[error("first process must occupy slot 0, but slot {index} is the first unused one")]
    NotFirstSlot { index: usize },
    #[error("no free page for the kernel stack")]
    OutOfPages,
    #[error(transparent)]
    Page(#[from] PageRangeError),
    #[error("kernel address space setup failed: {0}")]
    KernelAddressSpace(VmError),
    #[error("user address space setup failed: {0}")]
    UserAddressSpace(VmError),
}
