//! # Global Descriptor Table
//!
//! In long mode segmentation is mostly gone, but `iretq` still needs code
//! and data descriptors with the right privilege level, and traps from ring 3
//! need a TSS to find the kernel stack.
//!
//! Index | Selector | Meaning
//! ------|----------|--------
//! 0     | 0x00     | Null
//! 1     | 0x08     | Kernel code (64-bit, DPL 0; [`KERNEL_CODE`])
//! 2     | 0x13     | User code (64-bit, DPL 3; [`USER_CODE`])
//! 3     | 0x1b     | User data (DPL 3; [`USER_DATA`])
//! 4/5   | 0x20     | TSS (16-byte system descriptor; [`TSS_SELECTOR`])
//!
//! The user indices are fixed by the trap frames of new processes.

pub mod descriptors;
pub mod tss_desc;

use crate::gdt::descriptors::SegmentDescriptor;
use crate::gdt::tss_desc::TssDescriptor;
use kernel_info::process::{USER_CODE_INDEX, USER_DATA_INDEX};
use kernel_process::{Rpl, SegmentSelector};

pub use kernel_process::{USER_CODE, USER_DATA};

/// Ring-0 selector of the kernel code segment.
pub const KERNEL_CODE: SegmentSelector = SegmentSelector::gdt(1, Rpl::Ring0);

/// Selector of the TSS descriptor.
pub const TSS_SELECTOR: SegmentSelector = SegmentSelector::gdt(4, Rpl::Ring0);

const _: () = {
    assert!(KERNEL_CODE.into_bits() == 0x08);
    assert!(TSS_SELECTOR.into_bits() == 0x20);
    assert!(USER_CODE_INDEX == 2);
    assert!(USER_DATA_INDEX == 3);
};

/// The GDT of the bootstrap CPU.
#[repr(C, align(16))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Gdt {
    null: SegmentDescriptor,
    kernel_code: SegmentDescriptor,
    user_code: SegmentDescriptor,
    user_data: SegmentDescriptor,
    tss: TssDescriptor,
}

const _: () = assert!(size_of::<Gdt>() == 6 * 8);

impl Gdt {
    /// Table whose TSS descriptor points at `tss`.
    #[must_use]
    pub const fn new(tss: TssDescriptor) -> Self {
        Self {
            null: SegmentDescriptor::new(),
            kernel_code: SegmentDescriptor::code64(Rpl::Ring0),
            user_code: SegmentDescriptor::code64(Rpl::Ring3),
            user_data: SegmentDescriptor::data(Rpl::Ring3),
            tss,
        }
    }

    /// The descriptor `selector` refers to, for the code and data slots.
    #[must_use]
    pub const fn segment(&self, selector: SegmentSelector) -> Option<SegmentDescriptor> {
        match selector.index() {
            0 => Some(self.null),
            1 => Some(self.kernel_code),
            2 => Some(self.user_code),
            3 => Some(self.user_data),
            _ => None,
        }
    }

    #[must_use]
    pub const fn tss(&self) -> TssDescriptor {
        self.tss
    }

    /// Value for the `lgdt` limit field.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn limit() -> u16 {
        (size_of::<Self>() - 1) as u16
    }
}
