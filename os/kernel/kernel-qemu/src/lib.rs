//! # QEMU Debug Console
//!
//! Kernel-side output to QEMU's debug console (`-debugcon`), which captures
//! every byte written to I/O port `0x402`.
//!
//! ```text
//! log::info!(..) ──▶ QemuLogger ──┐
//!                                 ├──▶ QemuSink ──▶ out 0x402 ──▶ host
//! qemu_trace!(..) ────────────────┘
//! ```
//!
//! * [`QemuLogger`] is the `log` backend; install it once with [`init`].
//!   Records are written as `"[LEVEL] target: message\n"`.
//! * [`qemu_trace!`] bypasses `log` and formats straight to the port. It is
//!   usable before the logger is installed.
//!
//! Nothing here allocates. Port I/O is compiled in only with the `enabled`
//! feature on bare-metal x86-64; otherwise every write is dropped.
//!
//! ```bash
//! qemu-system-x86_64 ... -debugcon stdio
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod logger;

pub use logger::{QemuLogger, init};

#[doc(hidden)]
pub mod qemu_fmt {
    use core::fmt::{self, Write};

    /// QEMU's debug console port.
    pub const QEMU_DEBUG_PORT: u16 = 0x402;

    /// Writes one byte to the debug console.
    #[allow(clippy::inline_always)]
    #[inline(always)]
    pub fn dbg_putc(c: u8) {
        #[cfg(all(feature = "enabled", target_arch = "x86_64", target_os = "none"))]
        unsafe {
            outb(QEMU_DEBUG_PORT, c);
        }
        #[cfg(not(all(feature = "enabled", target_arch = "x86_64", target_os = "none")))]
        let _ = c;
    }

    #[cfg(all(feature = "enabled", target_arch = "x86_64", target_os = "none"))]
    #[allow(clippy::inline_always)]
    #[inline(always)]
    unsafe fn outb(port: u16, val: u8) {
        unsafe {
            core::arch::asm!(
                "out dx, al",
                in("dx") port,
                in("al") val,
                options(nomem, nostack, preserves_flags)
            );
        }
    }

    /// `fmt::Write` adapter over [`dbg_putc`].
    pub struct QemuSink;

    impl Write for QemuSink {
        #[inline]
        fn write_str(&mut self, s: &str) -> fmt::Result {
            for b in s.bytes() {
                dbg_putc(b);
            }
            Ok(())
        }
    }

    #[inline]
    pub fn qemu_write(args: fmt::Arguments) {
        // Best effort; the sink itself never fails.
        let _ = fmt::write(&mut QemuSink, args);
    }
}

/// Formats straight to the QEMU debug console, like `print!`.
#[macro_export]
macro_rules! qemu_trace {
    ($($arg:tt)*) => {{
        $crate::qemu_fmt::qemu_write(core::format_args!($($arg)*));
    }};
}
