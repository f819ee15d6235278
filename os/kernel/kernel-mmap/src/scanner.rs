use crate::{MemoryMapError, MemoryRegion, RegionKind, UsableRegion};
use kernel_info::boot::{E820Entry, MAX_MEMORY_REGIONS};
use kernel_memory_addresses::PhysicalAddress;

/// Usable regions collected from one scan, in firmware order.
///
/// Fixed capacity: the firmware map itself never holds more than
/// [`MAX_MEMORY_REGIONS`] records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsableRegions {
    regions: [UsableRegion; MAX_MEMORY_REGIONS],
    len: usize,
    total_bytes: u64,
}

impl UsableRegions {
    const fn new() -> Self {
        Self {
            regions: [UsableRegion::new(PhysicalAddress::zero(), 0); MAX_MEMORY_REGIONS],
            len: 0,
            total_bytes: 0,
        }
    }

    fn push(&mut self, region: UsableRegion) {
        debug_assert!(self.len < MAX_MEMORY_REGIONS);
        self.regions[self.len] = region;
        self.len += 1;
        self.total_bytes = self.total_bytes.saturating_add(region.length);
    }

    #[must_use]
    pub fn as_slice(&self) -> &[UsableRegion] {
        &self.regions[..self.len]
    }

    #[must_use]
    pub fn iter(&self) -> core::slice::Iter<'_, UsableRegion> {
        self.as_slice().iter()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Sum of the lengths of all usable regions.
    #[must_use]
    pub const fn total_bytes(&self) -> u64 {
        self.total_bytes
    }
}

impl<'a> IntoIterator for &'a UsableRegions {
    type Item = &'a UsableRegion;
    type IntoIter = core::slice::Iter<'a, UsableRegion>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Classifies every firmware record and collects the usable ones.
///
/// Each record is reported at `info` level as `start length-in-KiB type`
/// so the boot log shows the complete map. Records are taken in firmware
/// order and are neither sorted nor merged.
///
/// # Errors
/// [`MemoryMapError::TooManyRegions`] if `entries` holds more than
/// [`MAX_MEMORY_REGIONS`] records. Nothing is reported in that case.
pub fn scan(entries: &[E820Entry]) -> Result<UsableRegions, MemoryMapError> {
    if entries.len() > MAX_MEMORY_REGIONS {
        return Err(MemoryMapError::TooManyRegions {
            count: entries.len(),
            capacity: MAX_MEMORY_REGIONS,
        });
    }

    let mut usable = UsableRegions::new();
    for entry in entries {
        let region = MemoryRegion::from(entry);
        log::info!(
            "{:#x} {}KB {}",
            region.start.as_u64(),
            region.length / 1024,
            region.kind.into_raw()
        );

        if region.kind == RegionKind::Usable {
            usable.push(UsableRegion::new(region.start, region.length));
        }
    }

    log::info!("total usable memory: {}MB", usable.total_bytes() / (1024 * 1024));
    Ok(usable)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(address: u64, length: u64, kind: u32) -> E820Entry {
        E820Entry::new(address, length, kind)
    }

    #[test]
    fn collects_usable_regions_in_order() {
        let map = [
            e(0, 0x9_F000, 1),
            e(0x9_F000, 0x1000, 2),
            e(0xF_0000, 0x1_0000, 2),
            e(0x10_0000, 0x7EE_0000, 1),
            e(0x7FE_0000, 0x2_0000, 3),
        ];
        let usable = scan(&map).unwrap();
        assert_eq!(usable.len(), 2);
        assert_eq!(
            usable.as_slice(),
            &[
                UsableRegion::new(PhysicalAddress::new(0), 0x9_F000),
                UsableRegion::new(PhysicalAddress::new(0x10_0000), 0x7EE_0000),
            ]
        );
        assert_eq!(usable.total_bytes(), 0x9_F000 + 0x7EE_0000);
    }

    #[test]
    fn empty_map_yields_nothing() {
        let usable = scan(&[]).unwrap();
        assert!(usable.is_empty());
        assert_eq!(usable.total_bytes(), 0);
    }

    #[test]
    fn map_without_usable_memory() {
        let usable = scan(&[e(0, 0x1000, 2), e(0x1000, 0x1000, 4)]).unwrap();
        assert!(usable.is_empty());
    }

    #[test]
    fn exactly_capacity_is_accepted() {
        let map = [e(0x10_0000, 0x1000, 1); MAX_MEMORY_REGIONS];
        let usable = scan(&map).unwrap();
        assert_eq!(usable.len(), MAX_MEMORY_REGIONS);
        assert_eq!(usable.total_bytes(), 0x1000 * MAX_MEMORY_REGIONS as u64);
    }

    #[test]
    fn over_capacity_is_rejected() {
        let map = [e(0, 0x1000, 1); MAX_MEMORY_REGIONS + 1];
        assert_eq!(
            scan(&map),
            Err(MemoryMapError::TooManyRegions {
                count: MAX_MEMORY_REGIONS + 1,
                capacity: MAX_MEMORY_REGIONS,
            })
        );
    }

    #[test]
    fn zero_length_usable_region_is_kept() {
        let usable = scan(&[e(0x20_0000, 0, 1)]).unwrap();
        assert_eq!(usable.len(), 1);
        assert_eq!(usable.total_bytes(), 0);
    }
}
