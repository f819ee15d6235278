//! # 64-bit Task State Segment
//!
//! Long mode does no hardware task switching, but the CPU still reads the
//! TSS on every interrupt or exception that raises the privilege level:
//! it loads `rsp0` before pushing the user context. Pointing `rsp0` at the
//! top of the running process's kernel stack is what makes traps out of
//! ring 3 land on that stack.
//!
//! The I/O permission bitmap is disabled by placing its offset at the end
//! of the segment.

use core::mem::size_of;
use kernel_memory_addresses::VirtualAddress;

#[repr(C, packed)]
#[derive(Debug, Copy, Clone)]
pub struct Tss64 {
    _reserved0: u32,
    /// Stack loaded on a transition to ring 0.
    pub rsp0: VirtualAddress,
    pub rsp1: VirtualAddress,
    pub rsp2: VirtualAddress,
    _reserved1: u64,
    /// Interrupt Stack Table; unused.
    pub ist: [VirtualAddress; 7],
    _reserved2: u64,
    _reserved3: u16,
    pub iopb_offset: u16,
}

const _: () = assert!(size_of::<Tss64>() == 104);

impl Tss64 {
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn new() -> Self {
        Self {
            _reserved0: 0,
            rsp0: VirtualAddress::zero(),
            rsp1: VirtualAddress::zero(),
            rsp2: VirtualAddress::zero(),
            _reserved1: 0,
            ist: [VirtualAddress::zero(); 7],
            _reserved2: 0,
            _reserved3: 0,
            iopb_offset: size_of::<Self>() as u16,
        }
    }

    /// Value for the limit field of the TSS descriptor.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn limit() -> u32 {
        (size_of::<Self>() - 1) as u32
    }

    /// Sets the stack used on user → kernel transitions.
    pub const fn set_rsp0(&mut self, top: VirtualAddress) {
        self.rsp0 = top;
    }
}

impl Default for Tss64 {
    fn default() -> Self {
        Self::new()
    }
}
