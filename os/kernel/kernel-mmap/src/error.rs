/// Fatal problems with the firmware memory map.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoryMapError {
    #[error("firmware reported {count} memory regions, at most {capacity} are supported")]
    TooManyRegions { count: usize, capacity: usize },
    #[error("firmware reported a negative region count ({0})")]
    NegativeCount(i32),
}
