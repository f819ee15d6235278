//! Host-side fakes for code that works on page contents.

use crate::PageWindow;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use kernel_memory_addresses::VirtualAddress;

/// A sparse, byte-addressed memory.
///
/// Bytes that were never written read as zero, so a whole 2 MiB page costs
/// nothing until something is stored in it. Covers the full 64-bit virtual
/// address space.
#[derive(Debug, Default, Clone)]
pub struct SparseMemory {
    bytes: BTreeMap<u64, u8>,
}

impl SparseMemory {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bytes: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn read_byte(&self, va: VirtualAddress) -> u8 {
        self.bytes.get(&va.as_u64()).copied().unwrap_or(0)
    }

    pub fn write_bytes(&mut self, va: VirtualAddress, data: &[u8]) {
        let mut addr = va.as_u64();
        for &b in data {
            self.bytes.insert(addr, b);
            addr = addr.wrapping_add(1);
        }
    }

    #[must_use]
    pub fn read_bytes(&self, va: VirtualAddress, len: usize) -> Vec<u8> {
        let mut addr = va.as_u64();
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            out.push(self.bytes.get(&addr).copied().unwrap_or(0));
            addr = addr.wrapping_add(1);
        }
        out
    }

    /// Whether every byte in `[va, va + len)` reads as zero.
    #[must_use]
    pub fn is_zero(&self, va: VirtualAddress, len: u64) -> bool {
        let start = va.as_u64();
        let end = start.saturating_add(len);
        self.bytes.range(start..end).all(|(_, &b)| b == 0)
    }

    /// Number of bytes that hold an explicitly written value.
    #[must_use]
    pub fn touched_bytes(&self) -> usize {
        self.bytes.len()
    }

    fn keys_in(&self, start: u64, len: u64) -> Vec<u64> {
        let end = start.saturating_add(len);
        self.bytes.range(start..end).map(|(&k, _)| k).collect()
    }
}

impl PageWindow for SparseMemory {
    fn read_u64(&self, va: VirtualAddress) -> u64 {
        let mut word = [0u8; 8];
        word.copy_from_slice(&self.read_bytes(va, 8));
        u64::from_le_bytes(word)
    }

    fn write_u64(&mut self, va: VirtualAddress, value: u64) {
        self.write_bytes(va, &value.to_le_bytes());
    }

    fn zero(&mut self, va: VirtualAddress, len: u64) {
        for key in self.keys_in(va.as_u64(), len) {
            self.bytes.remove(&key);
        }
    }

    fn copy(&mut self, dst: VirtualAddress, src: VirtualAddress, len: u64) {
        let (src, dst) = (src.as_u64(), dst.as_u64());
        let data: Vec<(u64, u8)> = self
            .keys_in(src, len)
            .into_iter()
            .filter_map(|k| self.bytes.get(&k).map(|&b| (k - src, b)))
            .collect();

        self.zero(VirtualAddress::new(dst), len);
        for (offset, b) in data {
            self.bytes.insert(dst.wrapping_add(offset), b);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwritten_memory_reads_zero() {
        let mem = SparseMemory::new();
        assert_eq!(mem.read_u64(VirtualAddress::new(0xFFFF_8000_0040_0000)), 0);
        assert!(mem.is_zero(VirtualAddress::new(0), u64::MAX));
    }

    #[test]
    fn words_are_little_endian() {
        let mut mem = SparseMemory::new();
        let va = VirtualAddress::new(0x1000);
        mem.write_u64(va, 0x0102_0304_0506_0708);
        assert_eq!(mem.read_byte(va), 0x08);
        assert_eq!(mem.read_byte(va + 7), 0x01);
        assert_eq!(mem.read_u64(va), 0x0102_0304_0506_0708);
    }

    #[test]
    fn zero_clears_only_the_range() {
        let mut mem = SparseMemory::new();
        mem.write_bytes(VirtualAddress::new(0x100), &[1, 2, 3, 4]);
        mem.zero(VirtualAddress::new(0x101), 2);
        assert_eq!(mem.read_bytes(VirtualAddress::new(0x100), 4), [1u8, 0, 0, 4]);
    }

    #[test]
    fn copy_replaces_destination() {
        let mut mem = SparseMemory::new();
        mem.write_bytes(VirtualAddress::new(0x10), &[0xAA, 0, 0xBB]);
        mem.write_bytes(VirtualAddress::new(0x20), &[9, 9, 9]);
        mem.copy(VirtualAddress::new(0x20), VirtualAddress::new(0x10), 3);
        assert_eq!(mem.read_bytes(VirtualAddress::new(0x20), 3), [0xAAu8, 0, 0xBB]);
    }
}
