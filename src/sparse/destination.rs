use std::io::{self, Cursor};

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncSeek, AsyncWrite};

/// A writable, seekable sink whose length can be set explicitly.
#[async_trait]
pub trait Destination: AsyncWrite + AsyncSeek + Unpin + Send {
    async fn set_len(&mut self, len: u64) -> io::Result<()>;
}

#[async_trait]
impl Destination for File {
    async fn set_len(&mut self, len: u64) -> io::Result<()> {
        File::set_len(&*self, len).await
    }
}

#[async_trait]
impl Destination for Cursor<Vec<u8>> {
    async fn set_len(&mut self, len: u64) -> io::Result<()> {
        let len = usize::try_from(len).map_err(io::Error::other)?;
        self.get_mut().resize(len, 0);
        Ok(())
    }
}

#[async_trait]
impl<'a, T: Destination + ?Sized> Destination for &'a mut T {
    async fn set_len(&mut self, len: u64) -> io::Result<()> {
        (**self).set_len(len).await
    }
}
