//! # Kernel Entry Point
//!
//! The loader jumps to `_start` in long mode with the direct map in place
//! and the firmware memory map stored at
//! [`MEMORY_MAP_COUNT_ADDRESS`](kernel_info::boot::MEMORY_MAP_COUNT_ADDRESS).
//! From there the kernel switches to its own stack, installs its descriptor
//! tables, sets up memory and the first process and enters it. It never
//! comes back; any fault halts the CPU.

#![cfg_attr(target_os = "none", no_std, no_main)]
#![allow(unsafe_code)]

#[cfg(all(target_arch = "x86_64", target_os = "none"))]
mod entry {
    use core::convert::Infallible;
    use kernel::cpu::KernelCpu;
    use kernel::{BootFault, init_memory, init_process};
    use kernel_alloc::DirectMapWindow;
    use kernel_info::boot::{MEMORY_MAP_ADDRESS, MEMORY_MAP_COUNT_ADDRESS};
    use kernel_info::memory::{MemoryLayout, PAGE_SIZE};
    use kernel_memory_addresses::{DirectMap, PhysicalAddress, VirtualAddress};
    use kernel_process::{ProcessTable, launch};
    use kernel_vmem::BootPageTables;
    use log::{LevelFilter, error, info};

    /// Stack size.
    const BOOT_STACK_SIZE: usize = 64 * 1024;

    /// Direct-map address the first process writes to. Its pages are not
    /// user accessible, so the write faults.
    const USER_FAULT_ADDRESS: u64 = 0xffff_8000_0020_0020;

    /// 16-byte aligned stack
    #[repr(align(16))]
    struct Aligned<const N: usize>([u8; N]);

    #[unsafe(link_section = ".bss.boot")]
    #[unsafe(no_mangle)]
    static mut BOOT_STACK: Aligned<BOOT_STACK_SIZE> = Aligned([0; BOOT_STACK_SIZE]);

    static mut CPU: KernelCpu = KernelCpu::new();

    unsafe extern "C" {
        /// End of the kernel image, from `kernel.ld`.
        static __kernel_end: u8;
    }

    /// The kernel entry point.
    ///
    /// Naked so that it can build the stack before any Rust code runs.
    #[unsafe(no_mangle)]
    #[unsafe(naked)]
    #[unsafe(link_section = ".text.boot")]
    pub extern "C" fn _start() -> ! {
        core::arch::naked_asm!(
            "cli",
            "lea rax, [rip + {stack_sym}]",
            "add rax, {stack_size}",
            "and rax, -16",
            "mov rsp, rax",
            // Emulate a CALL so that RSP % 16 == 8 at entry
            "push 0",
            "xor rbp, rbp",
            "jmp {rust_entry}",
            stack_sym = sym BOOT_STACK,
            stack_size = const BOOT_STACK_SIZE,
            rust_entry = sym kernel_entry,
        );
    }

    extern "C" fn kernel_entry() -> ! {
        kernel_qemu::qemu_trace!("kernel entry at {:p}\n", kernel_entry as *const ());

        // Only fails if a logger is already set, which cannot happen here.
        let _ = kernel_qemu::init(LevelFilter::Info);

        let Err(fault) = kernel_main();
        halt(&fault)
    }

    fn kernel_main() -> Result<Infallible, BootFault> {
        let kernel_end = VirtualAddress::from_ptr(&raw const __kernel_end);
        let layout = MemoryLayout::with_kernel_end(kernel_end.as_u64());
        let direct_map = DirectMap::new(layout.direct_map_base);

        // SAFETY: only reference to CPU; installed once with interrupts off.
        let cpu = unsafe { &mut *(&raw mut CPU) };
        unsafe { cpu.install() };

        // SAFETY: the loader stores the map in low memory, which the direct
        // map covers, and never touches it again.
        let entries = unsafe {
            kernel_mmap::firmware::read_memory_map(
                direct_map.to_virtual(PhysicalAddress::new(MEMORY_MAP_COUNT_ADDRESS)),
                direct_map.to_virtual(PhysicalAddress::new(MEMORY_MAP_ADDRESS)),
            )?
        };

        // SAFETY: the allocator only hands out direct-mapped pages above the
        // kernel image, which nothing else uses.
        let window = unsafe { DirectMapWindow::new() };
        let mut memory = init_memory(window, &layout, entries)?;

        // SAFETY: `layout` describes the running kernel.
        let mut vm = unsafe { BootPageTables::new(&layout) };
        let mut table = ProcessTable::new();
        let image = VirtualAddress::from_ptr(user_main as *const ());
        let process = init_process(&mut table, &mut memory, &mut vm, image, PAGE_SIZE)?;

        info!(
            "process {} ready, {} pages left",
            process.pid,
            memory.pages.available()
        );
        launch::<DirectMapWindow, _, _>(&process, &mut vm, cpu)
    }

    /// The first process. It runs from a copy at the user entry address, so
    /// it must not reference anything by relative address outside itself.
    #[unsafe(naked)]
    extern "C" fn user_main() -> ! {
        core::arch::naked_asm!(
            "movabs rax, {target}",
            "mov byte ptr [rax], 1",
            "2:",
            "jmp 2b",
            target = const USER_FAULT_ADDRESS,
        );
    }

    fn halt(fault: &BootFault) -> ! {
        error!("boot failed: {fault}");
        stop()
    }

    fn stop() -> ! {
        loop {
            // SAFETY: stopping the CPU for good.
            unsafe { core::arch::asm!("cli", "hlt", options(nomem, nostack)) };
        }
    }

    #[panic_handler]
    fn panic(info: &core::panic::PanicInfo) -> ! {
        error!("kernel panic: {info}");
        stop()
    }
}

#[cfg(not(target_os = "none"))]
fn main() {
    eprintln!("the kernel only runs on a bare-metal x86_64 target");
}
