use bitfield_struct::bitfield;

/// RFLAGS as loaded by `iretq`.
///
/// Bit 1 is architecturally always set; [`Rflags::new`] sets it. The other
/// reserved bits stay clear.
#[bitfield(u64)]
pub struct Rflags {
    pub carry: bool, // 0
    #[bits(default = true)]
    _always1: bool, // 1
    pub parity: bool, // 2
    _reserved3: bool,
    pub adjust: bool, // 4
    _reserved5: bool,
    pub zero: bool,             // 6
    pub sign: bool,             // 7
    pub trap: bool,             // 8
    pub interrupt_enable: bool, // 9
    pub direction: bool,        // 10
    pub overflow: bool,         // 11
    /// I/O privilege level; `0` denies ring 3 port I/O.
    #[bits(2)]
    pub iopl: u8, // 12-13
    pub nested_task: bool, // 14
    _reserved15: bool,
    pub resume: bool,                    // 16
    pub virtual_8086: bool,              // 17
    pub alignment_check: bool,           // 18
    pub virtual_interrupt: bool,         // 19
    pub virtual_interrupt_pending: bool, // 20
    pub id: bool,                        // 21
    #[bits(42)]
    _reserved22: u64,
}

impl Rflags {
    /// Flags for the first entry into user mode: interrupts enabled,
    /// IOPL 0.
    #[must_use]
    pub const fn user_entry() -> Self {
        Self::new().with_interrupt_enable(true).with_iopl(0)
    }
}
