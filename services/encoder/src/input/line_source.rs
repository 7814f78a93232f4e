//! Newline-delimited JSON deliveries

use super::{Delivery, TrackSource};
use crate::error::SourceError;
use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use tracing::{debug, trace};

/// Longest accepted line, excluding the newline
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// One delivery per non-blank line of a byte stream.
///
/// Stream sources have no broker-side state, so acknowledgement only logs.
/// Lines longer than [`MAX_LINE_BYTES`] are discarded whole and reported as
/// [`SourceError::LineTooLong`].
pub struct LineSource<R> {
    reader: R,
    name: String,
    next_tag: u64,
    buffer: Vec<u8>,
}

impl<R> LineSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: R, name: impl Into<String>) -> Self {
        Self {
            reader,
            name: name.into(),
            next_tag: 1,
            buffer: Vec::with_capacity(512),
        }
    }

    /// Read the next line into `buffer`, never more than the cap plus its
    /// newline. Returns the bytes read and whether the line was cut short.
    async fn fill_line(&mut self) -> std::io::Result<(usize, bool)> {
        self.buffer.clear();
        let limit = MAX_LINE_BYTES as u64 + 1;
        let read = (&mut self.reader)
            .take(limit)
            .read_until(b'\n', &mut self.buffer)
            .await?;
        let cut = self.buffer.len() > MAX_LINE_BYTES && self.buffer.last() != Some(&b'\n');
        Ok((read, cut))
    }

    /// Consume the remainder of an oversized line
    async fn skip_line(&mut self) -> std::io::Result<()> {
        loop {
            let (read, cut) = self.fill_line().await?;
            if read == 0 || !cut {
                return Ok(());
            }
        }
    }
}

#[async_trait]
impl<R> TrackSource for LineSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn next_delivery(&mut self) -> Option<Result<Delivery, SourceError>> {
        loop {
            match self.fill_line().await {
                Ok((0, _)) => {
                    debug!(source = %self.name, "Track source reached end of stream");
                    return None;
                }
                Ok((_, false)) => {}
                Ok((_, true)) => {
                    if let Err(e) = self.skip_line().await {
                        return Some(Err(SourceError::Io(e)));
                    }
                    return Some(Err(SourceError::LineTooLong {
                        limit: MAX_LINE_BYTES,
                    }));
                }
                Err(e) => return Some(Err(SourceError::Io(e))),
            }

            let body = self.buffer.trim_ascii();
            if body.is_empty() {
                continue;
            }

            let tag = self.next_tag;
            self.next_tag += 1;
            return Some(Ok(Delivery {
                tag,
                body: body.to_vec(),
            }));
        }
    }

    async fn ack(&mut self, tag: u64) -> Result<(), SourceError> {
        trace!(source = %self.name, tag, "Acknowledged delivery");
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
