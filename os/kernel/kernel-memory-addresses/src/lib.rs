//! # Virtual and Physical Memory Address Types
//!
//! Strongly typed wrappers for raw memory addresses used by the page
//! allocator, the boot page tables and the process bootstrapper.
//!
//! ## Overview
//!
//! | Type | Meaning |
//! |------|---------|
//! | [`MemoryAddress`] | A raw 64-bit address, either physical or virtual. |
//! | [`VirtualAddress`] | Refers to virtual (page-table translated) memory. |
//! | [`PhysicalAddress`] | Refers to physical memory or MMIO regions. |
//! | [`DirectMap`] | Fixed-offset translation between the two. |
//!
//! ## Page Sizes
//!
//! Marker types implementing [`PageSize`]:
//!
//! - [`Size4K`] — 4 KiB, the granularity of page-table frames
//! - [`Size2M`] — 2 MiB, the granularity of the page allocator
//!
//! Rounding is expressed as `align_up::<S>()` / `align_down::<S>()` on every
//! address type.
//!
//! ## Typical Usage
//!
//! ```rust
//! # use kernel_memory_addresses::*;
//! let dm = DirectMap::new(0xFFFF_8000_0000_0000);
//!
//! // A usable region starting in the middle of a 2 MiB page
//! let start = dm.to_virtual(PhysicalAddress::new(0x0010_0000));
//!
//! // First whole page inside the region
//! let first = start.align_up::<Size2M>();
//! assert!(first.is_aligned::<Size2M>());
//! assert_eq!(dm.to_physical(first).as_u64(), 0x0020_0000);
//! ```
//!
//! ## Design Notes
//!
//! - The types are `#[repr(transparent)]` and implement `Copy`, `Eq`, `Ord`
//!   and `Hash`.
//! - All alignment calculations are `const fn`.

#![cfg_attr(not(any(test, doctest)), no_std)]

mod direct_map;
mod memory_address;
mod page_size;
mod physical_address;
mod virtual_address;

pub use direct_map::DirectMap;
pub use memory_address::MemoryAddress;
pub use page_size::{PageSize, Size2M, Size4K};
pub use physical_address::PhysicalAddress;
pub use virtual_address::VirtualAddress;
