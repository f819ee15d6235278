//! # Virtual Memory Support
//!
//! The interface the process bootstrapper uses to obtain address spaces, and
//! the boot-time implementation behind it.
//!
//! ## Interface
//!
//! [`AddressSpaceManager`] has three operations:
//!
//! | Operation | Effect |
//! |-----------|--------|
//! | `setup_kvm` | builds a new top-level table holding the kernel mappings and returns its [`PageMap`] handle |
//! | `setup_uvm` | maps a fresh page at the user entry address of a [`PageMap`] and copies the program image into it |
//! | `switch_vm` | makes a [`PageMap`] the active address space (CR3) |
//!
//! Callers treat [`PageMap`] as opaque.
//!
//! ## Boot implementation
//!
//! [`BootPageTables`] maps everything with 2 MiB leaves, so a walk is only
//! three levels deep:
//!
//! ```text
//! | 47‒39 | 38‒30 | 29‒21 | 20‒0        |
//! |  PML4 |  PDPT |   PD  | page offset |
//! ```
//!
//! Every table is backed by one page from the
//! [`PageAllocator`](kernel_alloc::PageAllocator). Only the first 4 KiB of
//! such a page is used by the table.
//!
//! The kernel part of every address space maps the direct map
//! (`DIRECT_MAP_BASE..DIRECT_MAP_CEILING`) onto physical `0..DIRECT_MAP_SIZE`,
//! supervisor-only and writable. The user part consists of the single page
//! at `USER_ENTRY`.

#![cfg_attr(not(any(test, doctest)), no_std)]

mod address_space;
mod boot_tables;
mod cr3;
mod entry;
mod error;

pub use address_space::{AddressSpaceManager, PageMap};
pub use boot_tables::BootPageTables;
pub use cr3::Cr3;
pub use entry::{TABLE_BYTES, TableEntry, TableLevel};
pub use error::VmError;
