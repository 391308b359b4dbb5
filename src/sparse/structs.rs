use std::fmt::{self, Display};
use std::num::NonZeroUsize;

use derive_setters::Setters;
use itertools::Itertools;
use strum::Display;

use crate::classifier::{BLOCK_SIZE, MAX_BLOCK_SIZE};

use super::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum RunKind {
    Write,
    Seek,
}

/// One line of the file map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapEntry {
    pub kind: RunKind,
    pub blk_count: u64,
}

impl MapEntry {
    pub fn new(kind: RunKind, blk_count: u64) -> Self {
        Self { kind, blk_count }
    }
}

impl Display for MapEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} blk_count={}", self.kind, self.blk_count)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileMap {
    entries: Vec<MapEntry>,
}

impl FileMap {
    pub fn push(&mut self, entry: MapEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[MapEntry] {
        &self.entries
    }

    pub fn total_blocks(&self) -> u64 {
        self.entries.iter().map(|e| e.blk_count).sum()
    }

    /// True when no two neighbouring entries share a kind.
    pub fn is_coalesced(&self) -> bool {
        self.entries
            .iter()
            .tuple_windows()
            .all(|(a, b)| a.kind != b.kind)
    }
}

impl Display for FileMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{entry}")?;
        }
        Ok(())
    }
}

/// The run currently being accumulated.
#[derive(Debug)]
pub(super) struct Run {
    pub kind: RunKind,
    pub blk_count: u64,
    pub len: u64,
    /// WRITE bytes not yet handed to the destination.
    pub pending: Vec<u8>,
}

impl Run {
    pub fn new(kind: RunKind) -> Self {
        Self {
            kind,
            blk_count: 0,
            len: 0,
            pending: Vec::new(),
        }
    }
}

/// Outcome of one copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub total_len: u64,
    pub written: u64,
    pub skipped: u64,
    pub map: FileMap,
}

const DEFAULT_BLOCK_SIZE: NonZeroUsize = NonZeroUsize::new(BLOCK_SIZE).unwrap();

#[derive(Debug, Clone, Setters)]
pub struct Config {
    #[setters(generate = false)]
    pub block_size: NonZeroUsize,
    pub create_file_map: bool,
}

impl Config {
    /// Rejects block sizes outside `1..=MAX_BLOCK_SIZE`.
    pub fn new(block_size: usize) -> Result<Self> {
        let block_size = NonZeroUsize::new(block_size)
            .filter(|size| size.get() <= MAX_BLOCK_SIZE)
            .ok_or(Error::InvalidBlockSize(block_size))?;
        Ok(Self {
            block_size,
            create_file_map: false,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            create_file_map: false,
        }
    }
}
