use kernel_alloc::testing::SparseMemory;
use kernel_alloc::{PageAllocator, PageBounds};
use kernel_info::memory::{DIRECT_MAP_BASE, MemoryLayout, PAGE_SIZE};
use kernel_info::process::{USER_ENTRY, USER_STACK_TOP};
use kernel_memory_addresses::{DirectMap, VirtualAddress};
use kernel_process::{ContextEntry, ProcessTable, TrapFrame, launch};
use kernel_vmem::{AddressSpaceManager, BootPageTables};
use std::panic::{self, AssertUnwindSafe};

/// Records what `launch` asked of the CPU; `enter_user` unwinds instead of
/// leaving the kernel.
#[derive(Default)]
struct RecordingCpu {
    privileged_stack: Option<VirtualAddress>,
}

impl ContextEntry for RecordingCpu {
    fn set_privileged_stack(&mut self, top: VirtualAddress) {
        self.privileged_stack = Some(top);
    }

    fn enter_user(&mut self, trap_frame: VirtualAddress) -> ! {
        panic::panic_any(trap_frame)
    }
}

fn seeded_allocator(layout: &MemoryLayout, pages: u64) -> PageAllocator<SparseMemory> {
    let mut alloc = PageAllocator::new(SparseMemory::new(), PageBounds::from_layout(layout));
    for n in 0..pages {
        alloc
            .free(VirtualAddress::new(DIRECT_MAP_BASE + 0x80_0000 + n * PAGE_SIZE))
            .unwrap();
    }
    alloc
}

#[test]
fn launch_switches_stack_and_address_space_then_enters_user_mode() {
    let layout = MemoryLayout::with_kernel_end(DIRECT_MAP_BASE + 0x40_0000);
    let mut pages = seeded_allocator(&layout, 16);
    let mut vm = unsafe { BootPageTables::new(&layout) };

    let image = VirtualAddress::new(DIRECT_MAP_BASE + 0x20_0000);
    pages.window_mut().write_bytes(image, &[0xEB, 0xFE]);

    let mut table = ProcessTable::new();
    let process = table
        .bootstrap_first_process(&mut pages, &mut vm, image, 2)
        .unwrap();

    let mut cpu = RecordingCpu::default();
    let unwound = panic::catch_unwind(AssertUnwindSafe(|| {
        launch::<SparseMemory, _, _>(&process, &mut vm, &mut cpu);
    }))
    .unwrap_err();

    assert_eq!(
        unwound.downcast_ref::<VirtualAddress>(),
        Some(&process.trap_frame)
    );
    assert_eq!(cpu.privileged_stack, Some(process.stack + PAGE_SIZE));
    assert_eq!(vm.active(), Some(process.page_map));

    // The frame the CPU would restore, and the user page it would run
    let tf = TrapFrame::load(pages.window(), process.trap_frame);
    assert_eq!(tf.rip, USER_ENTRY);
    assert_eq!(tf.rsp, USER_STACK_TOP);

    let (pa, leaf) = vm
        .translate(pages.window(), process.page_map, VirtualAddress::new(USER_ENTRY))
        .unwrap();
    assert!(leaf.user());
    let backing = DirectMap::new(DIRECT_MAP_BASE).to_virtual(pa);
    assert_eq!(pages.window().read_bytes(backing, 2), [0xEBu8, 0xFE]);
}

#[test]
fn kernel_stays_mapped_in_the_process_address_space() {
    let layout = MemoryLayout::with_kernel_end(DIRECT_MAP_BASE + 0x40_0000);
    let mut pages = seeded_allocator(&layout, 16);
    let mut vm = unsafe { BootPageTables::new(&layout) };
    let mut table = ProcessTable::new();
    let process = table
        .bootstrap_first_process(
            &mut pages,
            &mut vm,
            VirtualAddress::new(DIRECT_MAP_BASE + 0x20_0000),
            PAGE_SIZE,
        )
        .unwrap();

    // The kernel stack must stay reachable after the CR3 switch
    let (pa, leaf) = vm
        .translate(pages.window(), process.page_map, process.trap_frame)
        .unwrap();
    assert!(!leaf.user());
    assert_eq!(
        DirectMap::new(DIRECT_MAP_BASE).to_virtual(pa),
        process.trap_frame
    );

    AddressSpaceManager::<SparseMemory>::switch_vm(&mut vm, process.page_map);
    assert_eq!(vm.active(), Some(process.page_map));
}
