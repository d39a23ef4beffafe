//! Memory run report: blocks allocated against requested, and peak resident size.

use crate::allocator::BLOCK_SIZE;
use std::fmt;
use stress_injector_core::format_size;

/// Final report of one memory stress run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MemoryReport {
    /// Blocks the run was asked to allocate.
    pub requested_blocks: usize,
    /// Blocks actually allocated before completion or cancellation.
    pub blocks_allocated: usize,
    /// Peak resident bytes after allocation, if the host reports it.
    pub peak_resident_bytes: Option<u64>,
    /// Whether the run was cancelled before every block was allocated.
    pub cancelled: bool,
}

impl MemoryReport {
    /// Bytes requested.
    pub fn requested_bytes(&self) -> u64 {
        self.requested_blocks as u64 * BLOCK_SIZE as u64
    }

    /// Bytes actually allocated: blocks times block size.
    pub fn allocated_bytes(&self) -> u64 {
        self.blocks_allocated as u64 * BLOCK_SIZE as u64
    }

    /// Human readable injected volume, `None` when nothing was allocated.
    pub fn injected(&self) -> Option<String> {
        format_size(self.allocated_bytes()).ok()
    }

    /// Human readable peak memory, `None` when unavailable.
    pub fn consumed(&self) -> Option<String> {
        self.peak_resident_bytes
            .and_then(|bytes| format_size(bytes).ok())
    }
}

impl fmt::Display for MemoryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.injected() {
            Some(size) => writeln!(f, "Stress Injected: {size}")?,
            None => writeln!(f, "Stress Injected: nothing")?,
        }
        match self.consumed() {
            Some(size) => write!(f, "Memory Consumed: {size}"),
            None => write!(f, "Memory Consumed: unavailable on this host"),
        }
    }
}
