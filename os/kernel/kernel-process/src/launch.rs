use crate::FirstProcess;
use kernel_alloc::PageWindow;
use kernel_memory_addresses::VirtualAddress;
use kernel_vmem::AddressSpaceManager;

/// The CPU-specific half of entering a process.
pub trait ContextEntry {
    /// Sets the stack the CPU switches to when user code traps into the
    /// kernel (`rsp0` of the TSS on x86-64).
    fn set_privileged_stack(&mut self, top: VirtualAddress);

    /// Restores the [`TrapFrame`](crate::TrapFrame) at `trap_frame` and
    /// returns to user mode.
    fn enter_user(&mut self, trap_frame: VirtualAddress) -> !;
}

/// Runs `process`.
///
/// Sets the privileged stack to the top of the process's kernel stack,
/// switches to its address space, then enters user mode through `cpu`.
pub fn launch<W, V, C>(process: &FirstProcess, vm: &mut V, cpu: &mut C) -> !
where
    W: PageWindow,
    V: AddressSpaceManager<W>,
    C: ContextEntry,
{
    cpu.set_privileged_stack(process.stack_top());
    vm.switch_vm(process.page_map);

    log::info!(
        "entering process {} (trap frame at {})",
        process.pid,
        process.trap_frame
    );
    cpu.enter_user(process.trap_frame)
}
