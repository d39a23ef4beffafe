//! Retained allocation of random-filled blocks.

use rand::RngCore;
use stress_injector_core::size::MIB;

/// Size of one allocation block: 1 MiB.
pub const BLOCK_SIZE: usize = MIB as usize;

/// One block of random bytes.
///
/// The content is random so the pages cannot be deduplicated or compressed
/// away by the operating system.
pub struct AllocationBlock(Box<[u8]>);

impl AllocationBlock {
    /// Allocates a block and fills it from the thread-local generator.
    pub fn random() -> Self {
        let mut bytes = vec![0u8; BLOCK_SIZE].into_boxed_slice();
        rand::rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Block contents.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for AllocationBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AllocationBlock")
            .field("len", &self.0.len())
            .finish()
    }
}

/// Owns every block allocated during a run until it is dropped.
#[derive(Debug, Default)]
pub struct ByteAllocator {
    blocks: Vec<AllocationBlock>,
}

impl ByteAllocator {
    /// Creates an empty allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates and retains one more block.
    pub fn allocate(&mut self) {
        self.blocks.push(AllocationBlock::random());
    }

    /// Number of retained blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if nothing has been allocated.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Bytes held: blocks times [`BLOCK_SIZE`].
    pub fn allocated_bytes(&self) -> u64 {
        self.blocks.len() as u64 * BLOCK_SIZE as u64
    }

    /// Iterates the retained blocks.
    pub fn blocks(&self) -> impl Iterator<Item = &AllocationBlock> {
        self.blocks.iter()
    }
}
