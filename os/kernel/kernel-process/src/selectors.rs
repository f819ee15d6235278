//! Segment selectors placed into the user-mode `iretq` frame.
//!
//! ```text
//!  15            3 2  1  0
//! +----------------+--+----+
//! |   Index[12:0]  |TI| RPL|
//! +----------------+--+----+
//! ```

use bitfield_struct::bitfield;
use kernel_info::process::{USER_CODE_INDEX, USER_DATA_INDEX};

/// Requested privilege level.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum Rpl {
    Ring0 = 0,
    Ring1 = 1,
    Ring2 = 2,
    Ring3 = 3,
}

impl Rpl {
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::Ring0,
            1 => Self::Ring1,
            2 => Self::Ring2,
            _ => Self::Ring3,
        }
    }

    #[must_use]
    pub const fn into_bits(self) -> u8 {
        self as u8
    }
}

#[bitfield(u16)]
#[derive(Eq, PartialEq)]
pub struct SegmentSelector {
    #[bits(2)]
    pub rpl: Rpl,
    /// Table indicator: `false` selects the GDT.
    pub local: bool,
    #[bits(13)]
    pub index: u16,
}

impl SegmentSelector {
    /// GDT selector for descriptor `index` requested at `rpl`.
    #[must_use]
    pub const fn gdt(index: u16, rpl: Rpl) -> Self {
        Self::new().with_index(index).with_rpl(rpl)
    }
}

/// Ring-3 selector of the 64-bit user code segment.
pub const USER_CODE: SegmentSelector = SegmentSelector::gdt(USER_CODE_INDEX, Rpl::Ring3);

/// Ring-3 selector of the user data and stack segment.
pub const USER_DATA: SegmentSelector = SegmentSelector::gdt(USER_DATA_INDEX, Rpl::Ring3);

const _: () = {
    assert!(USER_CODE.into_bits() == 0x13);
    assert!(USER_DATA.into_bits() == 0x1b);
};
