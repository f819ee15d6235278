//! Descriptor tables and the ring 3 entry of the bootstrap CPU.

use crate::gdt::tss_desc::TssDescriptor;
use crate::gdt::{Gdt, KERNEL_CODE, TSS_SELECTOR};
use crate::tss::Tss64;
use kernel_memory_addresses::VirtualAddress;
use kernel_process::ContextEntry;

/// Pointer format required by `lgdt`.
#[repr(C, packed)]
struct DescTablePtr {
    limit: u16,
    base: VirtualAddress,
}

/// GDT and TSS of the bootstrap CPU.
///
/// Must live in a `static`: the CPU keeps reading both tables after
/// [`install`](Self::install).
pub struct KernelCpu {
    gdt: Gdt,
    tss: Tss64,
}

impl KernelCpu {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            gdt: Gdt::new(TssDescriptor::new(VirtualAddress::zero(), 0)),
            tss: Tss64::new(),
        }
    }

    /// Loads the GDT, reloads the segment registers and loads the task
    /// register.
    ///
    /// # Safety
    /// Must run once, in ring 0, with interrupts disabled. `self` must not
    /// move or be dropped afterwards.
    pub unsafe fn install(&mut self) {
        let tss_base = VirtualAddress::from_ptr(&raw const self.tss);
        self.gdt = Gdt::new(TssDescriptor::new(tss_base, Tss64::limit()));

        let ptr = DescTablePtr {
            limit: Gdt::limit(),
            base: VirtualAddress::from_ptr(&raw const self.gdt),
        };

        unsafe {
            core::arch::asm!(
                "lgdt [{}]",
                in(reg) &raw const ptr,
                options(readonly, nostack, preserves_flags)
            );

            // Null data selectors are valid in ring 0 of long mode.
            core::arch::asm!(
                "mov ds, {0:x}",
                "mov es, {0:x}",
                "mov ss, {0:x}",
                in(reg) 0u16,
                options(nostack, preserves_flags)
            );

            // Far return to reload CS.
            core::arch::asm!(
                "push {cs}",
                "lea rax, [rip + 2f]",
                "push rax",
                "retfq",
                "2:",
                cs = in(reg) u64::from(KERNEL_CODE.into_bits()),
                out("rax") _,
            );

            core::arch::asm!(
                "ltr {0:x}",
                in(reg) TSS_SELECTOR.into_bits(),
                options(nostack, preserves_flags)
            );
        }
        log::debug!("GDT and TSS installed (TSS at {tss_base})");
    }
}

impl Default for KernelCpu {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextEntry for KernelCpu {
    fn set_privileged_stack(&mut self, top: VirtualAddress) {
        self.tss.set_rsp0(top);
    }

    fn enter_user(&mut self, trap_frame: VirtualAddress) -> ! {
        // SAFETY: `launch` passes a trap frame built by the process
        // bootstrap, on a kernel stack mapped in the active address space.
        unsafe { pstart(trap_frame.as_u64()) }
    }
}

/// Restores the trap frame at `trap_frame` and returns to its context.
///
/// Makes the frame the stack, pops the fifteen general-purpose registers,
/// skips the vector number and error code and lets `iretq` consume the rest.
#[unsafe(naked)]
unsafe extern "C" fn pstart(trap_frame: u64) -> ! {
    core::arch::naked_asm!(
        "mov rsp, rdi",
        "pop r15",
        "pop r14",
        "pop r13",
        "pop r12",
        "pop r11",
        "pop r10",
        "pop r9",
        "pop r8",
        "pop rbp",
        "pop rdi",
        "pop rsi",
        "pop rdx",
        "pop rcx",
        "pop rbx",
        "pop rax",
        "add rsp, 16",
        "iretq",
    );
}
