//! Access to the memory map the loader stores in low physical memory.

use crate::MemoryMapError;
use kernel_info::boot::{E820Entry, MAX_MEMORY_REGIONS};
use kernel_memory_addresses::VirtualAddress;

/// Reads the firmware record count and returns the record array as a slice.
///
/// `count` and `entries` are the virtual addresses (usually in the direct
/// map) of [`MEMORY_MAP_COUNT_ADDRESS`](kernel_info::boot::MEMORY_MAP_COUNT_ADDRESS)
/// and [`MEMORY_MAP_ADDRESS`](kernel_info::boot::MEMORY_MAP_ADDRESS).
///
/// # Errors
/// * [`MemoryMapError::NegativeCount`] if the count is below zero.
/// * [`MemoryMapError::TooManyRegions`] if the count exceeds
///   [`MAX_MEMORY_REGIONS`]. No record is read in that case.
///
/// # Safety
/// Both addresses must be mapped and readable, `count` must hold an `i32`
/// written by the loader, and `entries` must be followed by that many
/// packed records which stay unmodified for `'static`.
pub unsafe fn read_memory_map(
    count: VirtualAddress,
    entries: VirtualAddress,
) -> Result<&'static [E820Entry], MemoryMapError> {
    // SAFETY: caller guarantees the count word is mapped; it may be unaligned.
    let raw = unsafe { core::ptr::read_unaligned(count.as_ptr::<i32>()) };
    let len = validate_count(raw)?;

    // SAFETY: E820Entry is packed (align 1); the caller guarantees `len`
    // records live at `entries`.
    Ok(unsafe { core::slice::from_raw_parts(entries.as_ptr::<E820Entry>(), len) })
}

/// Checks a raw firmware record count against the supported capacity.
///
/// # Errors
/// See [`read_memory_map`].
pub fn validate_count(raw: i32) -> Result<usize, MemoryMapError> {
    let count = usize::try_from(raw).map_err(|_| MemoryMapError::NegativeCount(raw))?;
    if count > MAX_MEMORY_REGIONS {
        return Err(MemoryMapError::TooManyRegions {
            count,
            capacity: MAX_MEMORY_REGIONS,
        });
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_bounds() {
        assert_eq!(validate_count(0), Ok(0));
        assert_eq!(validate_count(50), Ok(50));
        assert_eq!(
            validate_count(51),
            Err(MemoryMapError::TooManyRegions {
                count: 51,
                capacity: 50
            })
        );
        assert_eq!(validate_count(-1), Err(MemoryMapError::NegativeCount(-1)));
    }

    #[test]
    fn reads_loader_layout_from_memory() {
        // count followed by 4 bytes of padding, then packed records
        let mut raw = [0u8; 8 + 2 * 20];
        raw[..4].copy_from_slice(&2i32.to_le_bytes());
        raw[8..16].copy_from_slice(&0x10_0000u64.to_le_bytes());
        raw[16..24].copy_from_slice(&0x70_0000u64.to_le_bytes());
        raw[24..28].copy_from_slice(&1u32.to_le_bytes());
        raw[28..36].copy_from_slice(&0xF_0000u64.to_le_bytes());
        raw[36..44].copy_from_slice(&0x1_0000u64.to_le_bytes());
        raw[44..48].copy_from_slice(&2u32.to_le_bytes());

        let leaked: &'static [u8] = Box::leak(Box::new(raw));
        let base = VirtualAddress::from_ptr(leaked.as_ptr());
        let entries = unsafe { read_memory_map(base, base + 8) }.unwrap();

        assert_eq!(
            entries,
            &[
                E820Entry::new(0x10_0000, 0x70_0000, 1),
                E820Entry::new(0xF_0000, 0x1_0000, 2),
            ]
        );
    }

    #[test]
    fn oversized_count_reads_no_records() {
        let count = Box::leak(Box::new(51i32));
        let base = VirtualAddress::from_ptr(core::ptr::from_ref(count));
        // `entries` is never dereferenced when the count is rejected
        let result = unsafe { read_memory_map(base, VirtualAddress::new(0x9008)) };
        assert!(matches!(result, Err(MemoryMapError::TooManyRegions { .. })));
    }
}
