use crate::{ProcessError, TrapFrame};
use kernel_alloc::{PageAllocator, PageWindow};
use kernel_info::process::{KERNEL_STACK_SIZE, PROCESS_TABLE_SIZE, USER_ENTRY, USER_STACK_TOP};
use kernel_memory_addresses::VirtualAddress;
use kernel_vmem::{AddressSpaceManager, PageMap};

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum ProcessState {
    #[default]
    Unused,
    /// Slot claimed and set up, not yet running.
    Init,
}

/// One process table slot.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Process {
    pub pid: u32,
    pub state: ProcessState,
    /// Base of the kernel stack page.
    pub stack: Option<VirtualAddress>,
    /// Saved user state at the top of the kernel stack.
    pub trap_frame: Option<VirtualAddress>,
    pub page_map: Option<PageMap>,
}

impl Process {
    const UNUSED: Self = Self {
        pid: 0,
        state: ProcessState::Unused,
        stack: None,
        trap_frame: None,
        page_map: None,
    };
}

/// The fully set-up first process, ready for [`launch`](crate::launch).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FirstProcess {
    pub pid: u32,
    pub stack: VirtualAddress,
    pub trap_frame: VirtualAddress,
    pub page_map: PageMap,
}

impl FirstProcess {
    /// Top of the kernel stack; the privileged stack pointer while the
    /// process runs in user mode.
    #[must_use]
    pub fn stack_top(&self) -> VirtualAddress {
        self.stack + KERNEL_STACK_SIZE
    }
}

/// Fixed-size process table.
#[derive(Debug, Clone)]
pub struct ProcessTable {
    slots: [Process; PROCESS_TABLE_SIZE],
    next_pid: u32,
}

impl Default for ProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTable {
    /// An empty table; the first pid handed out is `1`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: [Process::UNUSED; PROCESS_TABLE_SIZE],
            next_pid: 1,
        }
    }

    #[must_use]
    pub const fn slots(&self) -> &[Process] {
        &self.slots
    }

    /// The first slot in state [`ProcessState::Unused`].
    #[must_use]
    pub fn find_unused_slot(&self) -> Option<&Process> {
        self.first_unused().map(|index| &self.slots[index])
    }

    fn first_unused(&self) -> Option<usize> {
        self.slots
            .iter()
            .position(|p| p.state == ProcessState::Unused)
    }

    /// Sets up the first process in slot 0.
    ///
    /// Claims the slot (state [`ProcessState::Init`], next pid), allocates
    /// and zeroes one page as kernel stack, writes a
    /// [`TrapFrame::user_entry`] frame to the top of that stack and builds
    /// the address space: kernel mappings first, then `image_size` bytes
    /// of `image` at the user entry address.
    ///
    /// # Errors
    /// - [`ProcessError::NoUnusedSlot`] if the table is full.
    /// - [`ProcessError::NotFirstSlot`] if slot 0 is already taken, that is
    ///   when called a second time.
    /// - [`ProcessError::OutOfPages`] if no stack page is available.
    /// - [`ProcessError::KernelAddressSpace`] and
    ///   [`ProcessError::UserAddressSpace`] if `vm` fails.
    ///
    /// All of them are fatal; the claimed slot is not released.
    pub fn bootstrap_first_process<W, V>(
        &mut self,
        pages: &mut PageAllocator<W>,
        vm: &mut V,
        image: VirtualAddress,
        image_size: u64,
    ) -> Result<FirstProcess, ProcessError>
    where
        W: PageWindow,
        V: AddressSpaceManager<W>,
    {
        let index = self.first_unused().ok_or(ProcessError::NoUnusedSlot)?;
        if index != 0 {
            return Err(ProcessError::NotFirstSlot { index });
        }

        let pid = self.next_pid;
        self.next_pid += 1;
        let slot = &mut self.slots[index];
        slot.state = ProcessState::Init;
        slot.pid = pid;

        let stack = pages.allocate()?.ok_or(ProcessError::OutOfPages)?;
        pages.window_mut().zero(stack, KERNEL_STACK_SIZE);
        slot.stack = Some(stack);

        let trap_frame = stack + (KERNEL_STACK_SIZE - TrapFrame::SIZE);
        TrapFrame::user_entry(
            VirtualAddress::new(USER_ENTRY),
            VirtualAddress::new(USER_STACK_TOP),
        )
        .store(pages.window_mut(), trap_frame);
        slot.trap_frame = Some(trap_frame);

        let page_map = vm
            .setup_kvm(pages)
            .map_err(ProcessError::KernelAddressSpace)?;
        slot.page_map = Some(page_map);

        vm.setup_uvm(pages, page_map, image, image_size)
            .map_err(ProcessError::UserAddressSpace)?;

        log::info!(
            "process {pid} ready: kernel stack {stack}, address space {}",
            page_map.root()
        );

        Ok(FirstProcess {
            pid,
            stack,
            trap_frame,
            page_map,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_alloc::PageBounds;
    use kernel_alloc::testing::SparseMemory;
    use kernel_info::memory::{DIRECT_MAP_BASE, DIRECT_MAP_CEILING, PAGE_SIZE};
    use kernel_memory_addresses::PhysicalAddress;
    use kernel_vmem::VmError;

    /// Address-space manager that hands out fixed maps and can be told to
    /// fail.
    #[derive(Default)]
    struct ScriptedVm {
        fail_kvm: bool,
        fail_uvm: bool,
        uvm_calls: Vec<(PageMap, VirtualAddress, u64)>,
    }

    impl AddressSpaceManager<SparseMemory> for ScriptedVm {
        fn setup_kvm(
            &mut self,
            _pages: &mut PageAllocator<SparseMemory>,
        ) -> Result<PageMap, VmError> {
            if self.fail_kvm {
                return Err(VmError::OutOfPages);
            }
            Ok(PageMap::from_root(PhysicalAddress::new(0x7000_0000)))
        }

        fn setup_uvm(
            &mut self,
            _pages: &mut PageAllocator<SparseMemory>,
            map: PageMap,
            image: VirtualAddress,
            size: u64,
        ) -> Result<(), VmError> {
            self.uvm_calls.push((map, image, size));
            if self.fail_uvm {
                return Err(VmError::AlreadyMapped(VirtualAddress::new(USER_ENTRY)));
            }
            Ok(())
        }

        fn switch_vm(&mut self, _map: PageMap) {}
    }

    fn page(n: u64) -> VirtualAddress {
        VirtualAddress::new(DIRECT_MAP_BASE + n * PAGE_SIZE)
    }

    fn allocator(pages: &[u64]) -> PageAllocator<SparseMemory> {
        let mut alloc = PageAllocator::new(
            SparseMemory::new(),
            PageBounds::new(page(2), VirtualAddress::new(DIRECT_MAP_CEILING)),
        );
        for &n in pages {
            alloc.free(page(n)).unwrap();
        }
        alloc
    }

    #[test]
    fn first_process_is_built_in_slot_zero() {
        let mut pages = allocator(&[5, 6]);
        pages.window_mut().write_u64(page(6) + 0x1000, 0xDEAD_BEEF);
        let mut vm = ScriptedVm::default();
        let mut table = ProcessTable::new();

        let image = VirtualAddress::new(0xFFFF_8000_0020_0000);
        let p = table
            .bootstrap_first_process(&mut pages, &mut vm, image, PAGE_SIZE)
            .unwrap();

        assert_eq!(p.pid, 1);
        assert_eq!(p.stack, page(6));
        assert_eq!(p.stack_top(), page(7));
        assert_eq!(p.trap_frame, page(7) - TrapFrame::SIZE);
        assert_eq!(p.page_map.root(), PhysicalAddress::new(0x7000_0000));

        let slot = &table.slots()[0];
        assert_eq!(slot.state, ProcessState::Init);
        assert_eq!(slot.pid, 1);
        assert_eq!(slot.stack, Some(page(6)));
        assert_eq!(slot.trap_frame, Some(p.trap_frame));
        assert_eq!(slot.page_map, Some(p.page_map));

        assert_eq!(vm.uvm_calls, [(p.page_map, image, PAGE_SIZE)]);
        assert_eq!(pages.available(), 1);
    }

    #[test]
    fn stack_is_zeroed_below_the_frame() {
        let mut pages = allocator(&[5, 6]);
        pages.window_mut().write_u64(page(6) + 0x1000, 0xDEAD_BEEF);
        let mut table = ProcessTable::new();
        let p = table
            .bootstrap_first_process(&mut pages, &mut ScriptedVm::default(), page(0), 16)
            .unwrap();

        // the free-list link and the scribbled word are gone
        assert!(
            pages
                .window()
                .is_zero(p.stack, KERNEL_STACK_SIZE - TrapFrame::SIZE)
        );
    }

    #[test]
    fn trap_frame_enters_user_mode() {
        let mut pages = allocator(&[3]);
        let mut table = ProcessTable::new();
        let p = table
            .bootstrap_first_process(&mut pages, &mut ScriptedVm::default(), page(0), 16)
            .unwrap();

        let tf = TrapFrame::load(pages.window(), p.trap_frame);
        assert_eq!(tf.rip, 0x40_0000);
        assert_eq!(tf.rsp, 0x40_0000 + PAGE_SIZE);
        assert_eq!(tf.cs, 0x13);
        assert_eq!(tf.ss, 0x1b);
        assert_eq!(tf.cs & 3, 3);
        assert_eq!(tf.ss & 3, 3);
        assert_eq!(tf.rflags, 0x202);
        assert_eq!(tf.rax | tf.rbx | tf.r15 | tf.trapno | tf.errorcode, 0);
    }

    #[test]
    fn second_bootstrap_is_refused() {
        let mut pages = allocator(&[3, 4]);
        let mut vm = ScriptedVm::default();
        let mut table = ProcessTable::new();
        table
            .bootstrap_first_process(&mut pages, &mut vm, page(0), 16)
            .unwrap();

        assert_eq!(
            table.bootstrap_first_process(&mut pages, &mut vm, page(0), 16),
            Err(ProcessError::NotFirstSlot { index: 1 })
        );
        assert_eq!(pages.available(), 1);
        assert_eq!(table.slots()[1].state, ProcessState::Unused);
    }

    #[test]
    fn full_table_has_no_unused_slot() {
        let mut table = ProcessTable::new();
        assert_eq!(table.find_unused_slot(), Some(&table.slots()[0]));
        for slot in &mut table.slots {
            slot.state = ProcessState::Init;
        }
        assert_eq!(table.find_unused_slot(), None);

        let mut pages = allocator(&[3]);
        assert_eq!(
            table.bootstrap_first_process(&mut pages, &mut ScriptedVm::default(), page(0), 16),
            Err(ProcessError::NoUnusedSlot)
        );
    }

    #[test]
    fn exhausted_allocator_is_fatal() {
        let mut pages = allocator(&[]);
        let mut table = ProcessTable::new();
        assert_eq!(
            table.bootstrap_first_process(&mut pages, &mut ScriptedVm::default(), page(0), 16),
            Err(ProcessError::OutOfPages)
        );
    }

    #[test]
    fn address_space_failures_are_distinguished() {
        let mut table = ProcessTable::new();
        let mut vm = ScriptedVm {
            fail_kvm: true,
            ..ScriptedVm::default()
        };
        assert_eq!(
            table.bootstrap_first_process(&mut allocator(&[3]), &mut vm, page(0), 16),
            Err(ProcessError::KernelAddressSpace(VmError::OutOfPages))
        );
        assert!(vm.uvm_calls.is_empty());

        let mut table = ProcessTable::new();
        let mut vm = ScriptedVm {
            fail_uvm: true,
            ..ScriptedVm::default()
        };
        assert!(matches!(
            table.bootstrap_first_process(&mut allocator(&[3]), &mut vm, page(0), 16),
            Err(ProcessError::UserAddressSpace(VmError::AlreadyMapped(_)))
        ));
    }
}
