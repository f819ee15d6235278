//! # Kernel Boot
//!
//! Everything the kernel binary does between the loader handing over control
//! and the first process running in ring 3, written as host-testable steps:
//!
//! ```text
//!  firmware map ──▶ init_memory ──▶ BootMemory ──▶ init_process ──▶ FirstProcess
//!                   (scan, seed,     (allocator)    (slot 0, stack,       │
//!                    ceiling)                        trap frame, maps)    ▼
//!                                                                  launch (binary)
//! ```
//!
//! Any failure on the way is a [`BootFault`]; the binary logs it and halts.
//!
//! The [`gdt`] and [`tss`] modules describe the descriptor tables the binary
//! installs so that `iretq` into ring 3, and traps back out of it, work.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod boot;
pub mod gdt;
pub mod tss;

#[cfg(all(target_arch = "x86_64", target_os = "none"))]
pub mod cpu;

pub use boot::{BootFault, BootMemory, init_memory, init_process};
