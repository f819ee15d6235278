//! # Kernel Configuration and Boot Interface
//!
//! This crate is the single source of truth for the constants that the loader,
//! the kernel binary, its build script and the memory/process crates have to
//! agree on. Nothing in here performs work at runtime; every value is a
//! `const` and every cross-constant relation is checked at compile time.
//!
//! ## Modules
//!
//! ### Memory Layout ([`memory`])
//! * **Page Size**: the allocator works exclusively on 2 MiB pages.
//! * **Direct Map**: low physical memory is visible at a fixed high offset
//!   ([`DIRECT_MAP_BASE`](memory::DIRECT_MAP_BASE)), up to a fixed ceiling.
//! * **Kernel Image**: where the kernel is linked and loaded.
//! * **Runtime View**: [`MemoryLayout`](memory::MemoryLayout) combines the
//!   constants with the linker-provided end of the kernel image.
//!
//! ### Boot Handoff ([`boot`])
//! * **Firmware Memory Map**: location, capacity and record layout of the
//!   E820 table the loader leaves behind in low memory.
//!
//! ### First Process ([`process`])
//! * **Process Table**: number of slots.
//! * **User Entry**: virtual entry point and user stack top.
//! * **Privilege State**: user selectors and initial RFLAGS.
//!
//! ## Virtual Address Space
//!
//! ```text
//! 0x0000_0000_0000_0000 ┌─────────────────────────────────┐
//!                       │         User Space              │
//! USER_ENTRY            │  first process image (2 MiB)    │ 0x0000_0000_0040_0000
//!                       ├─────────────────────────────────┤
//!                       │         (unused)                │
//! DIRECT_MAP_BASE       ├─────────────────────────────────┤ 0xffff_8000_0000_0000
//!                       │  Direct Map of physical [0, 1G) │
//! KERNEL_BASE           │    ├─ kernel image              │ 0xffff_8000_0020_0000
//!   __kernel_end        │    ├─ free 2 MiB pages          │
//! DIRECT_MAP_CEILING    ├─────────────────────────────────┤ 0xffff_8000_4000_0000
//!                       │  reserved for other mappings    │
//! 0xFFFF_FFFF_FFFF_FFFF └─────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use kernel_info::memory::{DIRECT_MAP_BASE, PAGE_SIZE, MemoryLayout};
//!
//! let layout = MemoryLayout::with_kernel_end(DIRECT_MAP_BASE + 0x30_0000);
//! assert_eq!(layout.kernel_image_end % PAGE_SIZE, 0x10_0000);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod boot;
pub mod memory;
pub mod process;
