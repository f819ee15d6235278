use bitfield_struct::bitfield;
use kernel_memory_addresses::VirtualAddress;

/// Low 8 bytes of a 64-bit *Available TSS* descriptor (type = 0x9, S=0).
#[bitfield(u64)]
#[derive(PartialEq, Eq)]
pub struct TssDescLow {
    pub limit_lo: u16, // [15:0]
    pub base_lo: u16,  // [31:16]

    pub base_mid: u8, // [39:32]
    #[bits(4)]
    pub typ: u8, // [43:40] = 0x9 (Available 64-bit TSS)
    pub s: bool,      // [44]    = 0 (system)
    #[bits(2)]
    pub dpl: u8, // [46:45]
    pub p: bool,      // [47]    = 1

    #[bits(4)]
    pub limit_hi: u8, // [51:48]
    #[bits(3)]
    _zero: u8, // [54:52]
    pub g: bool,     // [55]    byte granularity
    pub base_hi: u8, // [63:56]
}

/// High 8 bytes of a 64-bit TSS descriptor: `base[63:32]`, reserved=0.
#[bitfield(u64)]
#[derive(PartialEq, Eq)]
pub struct TssDescHigh {
    pub base_upper: u32, // [31:0]  base[63:32]
    _reserved: u32,      // [63:32] must be 0
}

/// 16-byte TSS system descriptor (two consecutive GDT entries).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TssDescriptor {
    pub low: TssDescLow,
    pub high: TssDescHigh,
}

impl TssDescriptor {
    /// Present, available 64-bit TSS at `base` spanning `limit + 1` bytes.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn new(base: VirtualAddress, limit: u32) -> Self {
        let base = base.as_u64();
        let low = TssDescLow::new()
            .with_limit_lo((limit & 0xFFFF) as u16)
            .with_base_lo((base & 0xFFFF) as u16)
            .with_base_mid(((base >> 16) & 0xFF) as u8)
            .with_typ(0x9)
            .with_p(true)
            .with_limit_hi(((limit >> 16) & 0xF) as u8)
            .with_base_hi(((base >> 24) & 0xFF) as u8);
        let high = TssDescHigh::new().with_base_upper((base >> 32) as u32);
        Self { low, high }
    }

    /// Base address encoded in the descriptor.
    #[must_use]
    pub const fn base(&self) -> VirtualAddress {
        VirtualAddress::new(
            ((self.high.base_upper() as u64) << 32)
                | ((self.low.base_hi() as u64) << 24)
                | ((self.low.base_mid() as u64) << 16)
                | (self.low.base_lo() as u64),
        )
    }
}

const _: () = assert!(size_of::<TssDescriptor>() == 16);
