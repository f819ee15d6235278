//! # Kernel Page Allocator
//!
//! Manages the pool of free 2 MiB pages the kernel hands out during boot.
//! Pages are addressed through the direct map and kept on an intrusive LIFO
//! free list: the first word of every free page stores the address of the
//! next free page (`0` terminates the list).
//!
//! ```text
//!  head ──▶ ┌────────────┐    ┌────────────┐    ┌────────────┐
//!           │ next ──────┼──▶ │ next ──────┼──▶ │ next = 0   │
//!           │            │    │            │    │            │
//!           └────────────┘    └────────────┘    └────────────┘
//!            last freed                          first freed
//! ```
//!
//! ## Components
//!
//! * [`PageWindow`]: the only way page contents are read or written. The
//!   kernel uses [`DirectMapWindow`]; tests use
//!   `testing::SparseMemory` (feature `testing`).
//! * [`PageAllocator`]: `free` pushes, `allocate` pops. Both validate the
//!   page against [`PageBounds`]: 2 MiB aligned, at or above the end of the
//!   kernel image, and ending at or below the ceiling.
//! * [`seed`]: converts the usable regions reported by `kernel-mmap` into
//!   free pages and reports the [`MemoryCeiling`].
//!
//! ## Ownership
//!
//! The allocator is a plain value created once during boot and passed by
//! `&mut` to whoever needs pages; there is no global instance and no
//! locking. A page returned by [`PageAllocator::allocate`] belongs to the
//! caller until it is handed back with [`PageAllocator::free`].
//!
//! ## Example
//!
//! ```rust
//! use kernel_alloc::{PageAllocator, PageRangeError, PageWindow};
//! use kernel_info::memory::PAGE_SIZE;
//!
//! /// Borrows a page, clears it, and hands it back.
//! fn scrub_one<W: PageWindow>(pages: &mut PageAllocator<W>) -> Result<bool, PageRangeError> {
//!     let Some(page) = pages.allocate()? else {
//!         return Ok(false);
//!     };
//!     pages.window_mut().zero(page, PAGE_SIZE);
//!     pages.free(page)?;
//!     Ok(true)
//! }
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

#[cfg(any(test, feature = "testing"))]
extern crate alloc;

mod error;
mod free_list;
mod page_window;
mod seed;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::PageRangeError;
pub use free_list::{PageAllocator, PageBounds};
pub use page_window::{DirectMapWindow, PageWindow};
pub use seed::{MemoryCeiling, SeedReport, seed};
