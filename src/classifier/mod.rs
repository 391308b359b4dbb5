//! Splits an input stream into fixed-size blocks and labels each one as
//! all-zero or not.

mod structs;

use std::io;
use std::num::NonZeroUsize;

use futures::{Stream, stream};
use tokio::io::{AsyncRead, AsyncReadExt};

pub use structs::*;

/// Lazily yields `reader` in batches of whole blocks. The stream is one-pass
/// and ends at end of file; read errors are yielded as items.
pub fn batches<R>(reader: R, block_size: NonZeroUsize) -> impl Stream<Item = io::Result<Batch>>
where
    R: AsyncRead + Unpin,
{
    let block_size = block_size.get();
    let batch_len = block_size * (BATCH_SIZE / block_size).max(1);
    stream::try_unfold(reader, move |mut reader| async move {
        let bytes = read_full(&mut reader, batch_len).await?;
        Ok::<_, io::Error>(
            (!bytes.is_empty()).then(|| (Batch::new(bytes, block_size), reader)),
        )
    })
}

/// Reads until `len` bytes are buffered or the reader is exhausted.
/// Pipes hand out short reads, so a single `read` is not enough.
async fn read_full<R>(reader: &mut R, len: usize) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; len];
    let mut filled = 0;
    while filled < len {
        match reader.read(&mut buf[filled..]).await {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    buf.truncate(filled);
    Ok(buf)
}
