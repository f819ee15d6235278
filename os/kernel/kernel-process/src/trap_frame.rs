use crate::{Rflags, USER_CODE, USER_DATA};
use kernel_alloc::PageWindow;
use kernel_memory_addresses::VirtualAddress;

/// Number of 64-bit words in a [`TrapFrame`].
const WORDS: usize = 22;

/// Register state saved on the kernel stack, in the order the entry code
/// pops it.
///
/// The general-purpose registers come first (`r15` at the lowest address),
/// then the vector number and error code, then the five words `iretq`
/// consumes.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct TrapFrame {
    pub r15: u64,
    pub r14: u64,
    pub r13: u64,
    pub r12: u64,
    pub r11: u64,
    pub r10: u64,
    pub r9: u64,
    pub r8: u64,
    pub rbp: u64,
    pub rdi: u64,
    pub rsi: u64,
    pub rdx: u64,
    pub rcx: u64,
    pub rbx: u64,
    pub rax: u64,
    pub trapno: u64,
    pub errorcode: u64,
    pub rip: u64,
    pub cs: u64,
    pub rflags: u64,
    pub rsp: u64,
    pub ss: u64,
}

const _: () = assert!(size_of::<TrapFrame>() == WORDS * 8);

impl TrapFrame {
    /// Size of the frame in bytes.
    pub const SIZE: u64 = 22 * 8;

    /// Byte offset of `rip`, the first word consumed by `iretq`.
    pub const IRET_OFFSET: u64 = 17 * 8;

    /// Frame that enters ring 3 at `entry` with the stack pointer at
    /// `stack_top`. All general-purpose registers are zero.
    #[must_use]
    pub const fn user_entry(entry: VirtualAddress, stack_top: VirtualAddress) -> Self {
        Self {
            r15: 0,
            r14: 0,
            r13: 0,
            r12: 0,
            r11: 0,
            r10: 0,
            r9: 0,
            r8: 0,
            rbp: 0,
            rdi: 0,
            rsi: 0,
            rdx: 0,
            rcx: 0,
            rbx: 0,
            rax: 0,
            trapno: 0,
            errorcode: 0,
            rip: entry.as_u64(),
            cs: USER_CODE.into_bits() as u64,
            rflags: Rflags::user_entry().into_bits(),
            rsp: stack_top.as_u64(),
            ss: USER_DATA.into_bits() as u64,
        }
    }

    #[must_use]
    pub const fn to_words(&self) -> [u64; WORDS] {
        [
            self.r15,
            self.r14,
            self.r13,
            self.r12,
            self.r11,
            self.r10,
            self.r9,
            self.r8,
            self.rbp,
            self.rdi,
            self.rsi,
            self.rdx,
            self.rcx,
            self.rbx,
            self.rax,
            self.trapno,
            self.errorcode,
            self.rip,
            self.cs,
            self.rflags,
            self.rsp,
            self.ss,
        ]
    }

    #[must_use]
    pub const fn from_words(w: [u64; WORDS]) -> Self {
        Self {
            r15: w[0],
            r14: w[1],
            r13: w[2],
            r12: w[3],
            r11: w[4],
            r10: w[5],
            r9: w[6],
            r8: w[7],
            rbp: w[8],
            rdi: w[9],
            rsi: w[10],
            rdx: w[11],
            rcx: w[12],
            rbx: w[13],
            rax: w[14],
            trapno: w[15],
            errorcode: w[16],
            rip: w[17],
            cs: w[18],
            rflags: w[19],
            rsp: w[20],
            ss: w[21],
        }
    }

    /// Writes the frame to `at` through `window`.
    pub fn store<W: PageWindow>(&self, window: &mut W, at: VirtualAddress) {
        let mut va = at;
        for word in self.to_words() {
            window.write_u64(va, word);
            va += 8;
        }
    }

    /// Reads a frame from `at` through `window`.
    #[must_use]
    pub fn load<W: PageWindow>(window: &W, at: VirtualAddress) -> Self {
        let mut words = [0; WORDS];
        let mut va = at;
        for word in &mut words {
            *word = window.read_u64(va);
            va += 8;
        }
        Self::from_words(words)
    }
}
