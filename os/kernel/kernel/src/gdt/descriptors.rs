//! 64-bit code and data segment descriptors.
//!
//! Base and limit are ignored in long mode; what matters is the type, the
//! DPL, the present bit and, for code, `L = 1` with `DB = 0`.

use bitfield_struct::bitfield;
use kernel_process::Rpl;

#[bitfield(u64)]
#[derive(PartialEq, Eq)]
pub struct SegmentDescriptor {
    pub limit_lo: u16,  // [15:0]   (ignored in long mode)
    pub base_lo: u16,   // [31:16]  (ignored in long mode)
    pub base_mid: u8,   // [39:32]
    pub accessed: bool, // [40]
    /// Readable for code, writable for data.
    pub writable: bool, // [41]
    pub conforming: bool, // [42]
    pub executable: bool, // [43]
    /// `true` for code/data, `false` for system descriptors.
    pub code_or_data: bool, // [44]
    #[bits(2)]
    pub dpl: Rpl, // [46:45]
    pub present: bool, // [47]
    #[bits(4)]
    pub limit_hi: u8, // [51:48]
    pub avl: bool,         // [52]
    pub long_mode: bool,   // [53]
    pub db: bool,          // [54]    must be 0 with L = 1
    pub granularity: bool, // [55]
    pub base_hi: u8,       // [63:56]
}

impl SegmentDescriptor {
    /// 64-bit code segment (execute + read).
    #[must_use]
    pub const fn code64(dpl: Rpl) -> Self {
        Self::new()
            .with_writable(true)
            .with_executable(true)
            .with_code_or_data(true)
            .with_dpl(dpl)
            .with_present(true)
            .with_long_mode(true)
    }

    /// Read/write data and stack segment.
    #[must_use]
    pub const fn data(dpl: Rpl) -> Self {
        Self::new()
            .with_writable(true)
            .with_code_or_data(true)
            .with_dpl(dpl)
            .with_present(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_encodings() {
        assert_eq!(SegmentDescriptor::code64(Rpl::Ring0).into_bits(), 0x0020_9a00_0000_0000);
        assert_eq!(SegmentDescriptor::code64(Rpl::Ring3).into_bits(), 0x0020_fa00_0000_0000);
        assert_eq!(SegmentDescriptor::data(Rpl::Ring3).into_bits(), 0x0000_f200_0000_0000);
    }
}
