//! # Page Storage Access
//!
//! The allocator stores its links inside the pages it manages, the process
//! bootstrapper zeroes stacks and writes trap frames, and the boot page
//! tables write entries. All of that goes through a [`PageWindow`] so the
//! raw pointer access is confined to [`DirectMapWindow`] and everything else
//! can be exercised against a fake memory in tests.

use kernel_memory_addresses::VirtualAddress;

/// Read/write access to page contents by virtual address.
///
/// Implementations may assume every address passed in lies inside a page
/// the caller currently owns.
pub trait PageWindow {
    /// Reads the 64-bit word at `va`.
    fn read_u64(&self, va: VirtualAddress) -> u64;

    /// Writes the 64-bit word at `va`.
    fn write_u64(&mut self, va: VirtualAddress, value: u64);

    /// Sets `len` bytes starting at `va` to zero.
    fn zero(&mut self, va: VirtualAddress, len: u64);

    /// Copies `len` bytes from `src` to `dst`. The ranges may overlap.
    fn copy(&mut self, dst: VirtualAddress, src: VirtualAddress, len: u64);
}

/// [`PageWindow`] over the kernel's direct map.
///
/// Every access dereferences the virtual address as-is.
#[derive(Debug)]
pub struct DirectMapWindow {
    _private: (),
}

impl DirectMapWindow {
    /// Creates the window.
    ///
    /// # Safety
    /// Every address later passed to the window must be mapped, writable and
    /// not aliased by any live Rust reference. Only one window may exist.
    #[must_use]
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

/// `usize` is 64 bits wide on every target this kernel runs on.
#[allow(clippy::cast_possible_truncation)]
const fn byte_count(len: u64) -> usize {
    len as usize
}

impl PageWindow for DirectMapWindow {
    fn read_u64(&self, va: VirtualAddress) -> u64 {
        // SAFETY: see `DirectMapWindow::new`.
        unsafe { core::ptr::read_volatile(va.as_ptr::<u64>()) }
    }

    fn write_u64(&mut self, va: VirtualAddress, value: u64) {
        // SAFETY: see `DirectMapWindow::new`.
        unsafe { core::ptr::write_volatile(va.as_mut_ptr::<u64>(), value) }
    }

    fn zero(&mut self, va: VirtualAddress, len: u64) {
        // SAFETY: see `DirectMapWindow::new`.
        unsafe { core::ptr::write_bytes(va.as_mut_ptr::<u8>(), 0, byte_count(len)) }
    }

    fn copy(&mut self, dst: VirtualAddress, src: VirtualAddress, len: u64) {
        // SAFETY: see `DirectMapWindow::new`; `copy` permits overlap.
        unsafe {
            core::ptr::copy(
                src.as_ptr::<u8>(),
                dst.as_mut_ptr::<u8>(),
                byte_count(len),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_window_accesses_real_memory() {
        const FILL: u64 = 0xAAAA_AAAA_AAAA_AAAA;
        let mut buf = [FILL; 8];
        let base = VirtualAddress::from_ptr(buf.as_mut_ptr().cast_const());
        let mut window = unsafe { DirectMapWindow::new() };

        window.write_u64(base + 8, 0x1122_3344_5566_7788);
        assert_eq!(window.read_u64(base + 8), 0x1122_3344_5566_7788);

        window.zero(base, 8);
        assert_eq!(window.read_u64(base), 0);

        window.copy(base + 32, base + 8, 8);
        assert_eq!(window.read_u64(base + 32), 0x1122_3344_5566_7788);

        // Nothing outside the touched words changed
        assert_eq!(buf[2], FILL);
        assert_eq!(buf[7], FILL);
    }
}
