mod destination;
mod structs;

use std::io::{self, SeekFrom};
use std::mem;
use std::path::{Path, PathBuf};

use futures::{TryStreamExt, pin_mut};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncRead, AsyncSeekExt, AsyncWrite, AsyncWriteExt};

use crate::classifier::{self, Block, MAX_BLOCK_SIZE};

pub use destination::*;
pub use structs::*;

/// Input is pulled from stdin through a buffer of this size.
pub const READ_BUFFER_SIZE: usize = 64 * 1024;
/// Pending WRITE bytes are handed to the destination once they reach this size.
pub const WRITE_BUFFER_SIZE: usize = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Block size must be between 1 and {max} bytes, got {0}", max = MAX_BLOCK_SIZE)]
    InvalidBlockSize(usize),
    #[error("Error while opening {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("Error while reading the input stream: {0}")]
    Read(#[source] io::Error),
    #[error("Error while writing to the destination: {0}")]
    Write(#[source] io::Error),
    #[error("Error while seeking in the destination: {0}")]
    Seek(#[source] io::Error),
    #[error("Error while setting the destination length: {0}")]
    Truncate(#[source] io::Error),
    #[error("Error while writing the file map: {0}")]
    Map(#[source] io::Error),
    #[error("Destination offset overflowed")]
    OffsetOverflow,
}

type Result<T> = color_eyre::Result<T, Error>;

/// Creates or truncates `path` for writing.
pub async fn open_destination(path: &Path) -> Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o640);
    options.open(path).await.map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Copies `input` into `dest`, leaving holes for zero runs. When `map_sink` is
/// given, one line per run is written to it after the run hits the
/// destination.
#[tracing::instrument(skip_all, fields(block_size = config.block_size.get()))]
pub async fn sparse_copy<R, D, M>(
    input: R,
    dest: D,
    map_sink: Option<M>,
    config: &Config,
) -> Result<Summary>
where
    R: AsyncRead + Unpin,
    D: Destination,
    M: AsyncWrite + Unpin,
{
    let batches = classifier::batches(input, config.block_size);
    pin_mut!(batches);

    let mut writer = SparseWriter::new(dest, map_sink);
    while let Some(batch) = batches.try_next().await.map_err(Error::Read)? {
        tracing::trace!(len = batch.len(), "batch read");
        for block in batch.blocks() {
            writer.push(block).await?;
        }
    }
    let summary = writer.finish().await?;

    tracing::info!(
        total_len = summary.total_len,
        written = summary.written,
        skipped = summary.skipped,
        blocks = summary.map.total_blocks(),
        runs = summary.map.entries().len(),
        "sparse copy finished"
    );
    Ok(summary)
}

/// Coalesces classified blocks into runs and applies them to a destination.
pub struct SparseWriter<D, M> {
    dest: D,
    map_sink: Option<M>,
    open: Option<Run>,
    cursor: u64,
    summary: Summary,
}

impl<D, M> SparseWriter<D, M>
where
    D: Destination,
    M: AsyncWrite + Unpin,
{
    pub fn new(dest: D, map_sink: Option<M>) -> Self {
        Self {
            dest,
            map_sink,
            open: None,
            cursor: 0,
            summary: Summary::default(),
        }
    }

    pub async fn push(&mut self, block: Block<'_>) -> Result<()> {
        let kind = if block.is_zero() {
            RunKind::Seek
        } else {
            RunKind::Write
        };
        if self.open.as_ref().is_some_and(|run| run.kind != kind) {
            self.close_run().await?;
        }

        let run = self.open.get_or_insert_with(|| Run::new(kind));
        run.blk_count += 1;
        run.len += block.len() as u64;
        if kind == RunKind::Write {
            run.pending.extend_from_slice(block.bytes);
            if run.pending.len() >= WRITE_BUFFER_SIZE {
                let pending = mem::take(&mut run.pending);
                self.write_bytes(&pending).await?;
            }
        }
        Ok(())
    }

    /// Closes the last run and pins the destination length to the cursor,
    /// which is what materializes a trailing hole.
    pub async fn finish(mut self) -> Result<Summary> {
        self.close_run().await?;
        self.dest.flush().await.map_err(Error::Write)?;
        self.dest.set_len(self.cursor).await.map_err(Error::Truncate)?;
        if let Some(sink) = self.map_sink.as_mut() {
            sink.flush().await.map_err(Error::Map)?;
        }
        debug_assert!(self.summary.map.is_coalesced());

        self.summary.total_len = self.cursor;
        Ok(self.summary)
    }

    async fn close_run(&mut self) -> Result<()> {
        let Some(run) = self.open.take() else {
            return Ok(());
        };

        match run.kind {
            RunKind::Write => self.write_bytes(&run.pending).await?,
            RunKind::Seek => {
                let target = self
                    .cursor
                    .checked_add(run.len)
                    .ok_or(Error::OffsetOverflow)?;
                self.dest
                    .seek(SeekFrom::Start(target))
                    .await
                    .map_err(Error::Seek)?;
                self.cursor = target;
                self.summary.skipped += run.len;
            }
        }

        let entry = MapEntry::new(run.kind, run.blk_count);
        tracing::debug!(
            kind = %entry.kind,
            blk_count = entry.blk_count,
            len = run.len,
            offset = self.cursor,
            "run flushed"
        );
        if let Some(sink) = self.map_sink.as_mut() {
            sink.write_all(format!("{entry}\n").as_bytes())
                .await
                .map_err(Error::Map)?;
        }
        self.summary.map.push(entry);
        Ok(())
    }

    async fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.dest.write_all(bytes).await.map_err(Error::Write)?;
        // the write is only confirmed once flushed
        self.dest.flush().await.map_err(Error::Write)?;
        let len = bytes.len() as u64;
        self.cursor = self.cursor.checked_add(len).ok_or(Error::OffsetOverflow)?;
        self.summary.written += len;
        Ok(())
    }
}
