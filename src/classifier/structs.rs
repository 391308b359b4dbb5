/// Default block size, the unit of zero/non-zero classification.
pub const BLOCK_SIZE: usize = 128;
/// Largest block size accepted from configuration.
pub const MAX_BLOCK_SIZE: usize = 1 << 20;
/// Input is read in batches of whole blocks, at least this many bytes each.
pub const BATCH_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Zero,
    NonZero,
}

/// A chunk of the input stream. Every block is `block_size` long except
/// possibly the last one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block<'a> {
    pub bytes: &'a [u8],
    pub kind: BlockKind,
}

impl<'a> Block<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        let kind = if bytes.iter().all(|&b| b == 0) {
            BlockKind::Zero
        } else {
            BlockKind::NonZero
        };
        Self { bytes, kind }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_zero(&self) -> bool {
        self.kind == BlockKind::Zero
    }
}

/// One read from the input: whole blocks, except that the final batch of the
/// stream may end in a partial block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    bytes: Vec<u8>,
    block_size: usize,
}

impl Batch {
    pub(super) fn new(bytes: Vec<u8>, block_size: usize) -> Self {
        Self { bytes, block_size }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn blocks(&self) -> impl Iterator<Item = Block<'_>> {
        self.bytes.chunks(self.block_size).map(Block::new)
    }
}
