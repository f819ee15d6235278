//! # First Process Layout

use crate::memory::PAGE_SIZE;

/// Number of slots in the process table.
pub const PROCESS_TABLE_SIZE: usize = 10;

/// Virtual address the first process starts executing at.
pub const USER_ENTRY: u64 = 0x0040_0000;

/// Initial user stack pointer: the top of the page mapped at [`USER_ENTRY`].
pub const USER_STACK_TOP: u64 = USER_ENTRY + PAGE_SIZE;

/// Size of the per-process kernel stack; one allocator page.
pub const KERNEL_STACK_SIZE: u64 = PAGE_SIZE;

/// GDT index of the 64-bit user code segment.
pub const USER_CODE_INDEX: u16 = 2;

/// GDT index of the user data/stack segment.
pub const USER_DATA_INDEX: u16 = 3;

/// RFLAGS for the first entry into user mode: `IF = 1`, `IOPL = 0`
/// (bit 1 is architecturally always set).
pub const USER_RFLAGS: u64 = 0x202;

const _: () = {
    assert!(USER_ENTRY.is_multiple_of(PAGE_SIZE));
    assert!(PROCESS_TABLE_SIZE > 0);
};
