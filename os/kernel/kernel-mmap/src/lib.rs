//! # Kernel Memory Map
//!
//! Turns the firmware (E820) memory map the loader leaves in low memory into
//! the list of usable physical regions the page allocator is seeded from.
//!
//! ```text
//!  0x9000 ┌──────────────┐   firmware::read_memory_map    ┌───────────────┐
//!         │ count, E820  │ ─────────────────────────────▶ │ &[E820Entry]  │
//!         └──────────────┘        (unsafe, once)          └───────┬───────┘
//!                                                                 │ scan
//!                                                         ┌───────▼───────┐
//!                                                         │ UsableRegions │
//!                                                         └───────────────┘
//! ```
//!
//! * [`firmware`] is the only place raw firmware memory is read. It validates
//!   the record count before building a slice.
//! * [`scan`] classifies each record, reports it through `log`, and
//!   aggregates usable regions and the total usable byte count. It does not
//!   touch allocator state.

#![cfg_attr(not(any(test, doctest)), no_std)]

mod error;
pub mod firmware;
mod region;
mod scanner;

pub use error::MemoryMapError;
pub use region::{MemoryRegion, RegionKind, UsableRegion};
pub use scanner::{UsableRegions, scan};
