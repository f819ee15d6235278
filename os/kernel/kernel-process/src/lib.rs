//! # First Process Bootstrap
//!
//! Builds the very first process from pages of the boot page allocator and
//! enters it in ring 3.
//!
//! ## Bootstrap
//!
//! [`ProcessTable::bootstrap_first_process`] claims slot 0 of the process
//! table, allocates and zeroes a kernel stack page, places a [`TrapFrame`]
//! at the top of that stack and asks an
//! [`AddressSpaceManager`](kernel_vmem::AddressSpaceManager) for the kernel
//! and user halves of the address space.
//!
//! ```text
//!  stack + KERNEL_STACK_SIZE ┌──────────────┐
//!                            │ ss           │
//!                            │ rsp          │  USER_STACK_TOP
//!                            │ rflags       │  IF=1, IOPL=0
//!                            │ cs           │  user code | RPL 3
//!                            │ rip          │  USER_ENTRY
//!                            │ errorcode    │
//!                            │ trapno       │
//!                            │ rax … r15    │  0
//!  trap_frame ─────────────▶ ├──────────────┤
//!                            │              │
//!                            │   (zeroed)   │
//!                            │              │
//!  stack ──────────────────▶ └──────────────┘
//! ```
//!
//! ## Launch
//!
//! [`launch`] points the privileged stack at the top of the kernel stack,
//! activates the process's address space and hands the trap frame to a
//! [`ContextEntry`], which restores it and returns to user mode. It does not
//! return.

#![cfg_attr(not(any(test, doctest)), no_std)]

mod error;
mod launch;
mod rflags;
mod selectors;
mod table;
mod trap_frame;

pub use error::ProcessError;
pub use launch::{ContextEntry, launch};
pub use rflags::Rflags;
pub use selectors::{Rpl, SegmentSelector, USER_CODE, USER_DATA};
pub use table::{FirstProcess, Process, ProcessState, ProcessTable};
pub use trap_frame::TrapFrame;
