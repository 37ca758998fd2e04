//! Fan a single-read byte stream out to several independent readers.
//!
//! [`tee`] returns a pump future and one [`TeeBranch`] per reader. The pump
//! forwards each source chunk to every live branch through a bounded channel,
//! so it advances at the pace of the slowest branch that is still reading and
//! memory stays bounded by `capacity` chunks per branch. A dropped branch is
//! removed from the fan-out without stalling the others. A source error is
//! delivered to every live branch and ends the pump.
//!
//! The pump must be polled alongside the branches (for example with
//! `futures::join!`); it does nothing on its own.

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures::channel::mpsc;
use futures::future::join_all;
use futures::{SinkExt, Stream, StreamExt};

use crate::types::SourceStream;

/// Item seen by a branch. The error is shared because every branch gets it.
pub type TeeItem = Result<Bytes, Arc<io::Error>>;

/// Summary of one pump run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeeStats {
    pub chunks: u64,
    pub bytes: u64,
    pub source_failed: bool,
}

/// Split `source` into `branches` readers.
pub fn tee(
    source: SourceStream,
    branches: usize,
    capacity: usize,
) -> (impl std::future::Future<Output = TeeStats> + Send, Vec<TeeBranch>) {
    let (senders, receivers): (Vec<_>, Vec<_>) = (0..branches)
        .map(|_| mpsc::channel::<TeeItem>(capacity))
        .unzip();

    let branches = receivers.into_iter().map(|rx| TeeBranch { rx }).collect();
    (pump(source, senders), branches)
}

async fn pump(mut source: SourceStream, mut senders: Vec<mpsc::Sender<TeeItem>>) -> TeeStats {
    let mut stats = TeeStats::default();

    while let Some(item) = source.next().await {
        match item {
            Ok(chunk) => {
                stats.chunks += 1;
                stats.bytes += chunk.len() as u64;

                let sends = senders.iter_mut().map(|tx| {
                    let chunk = chunk.clone();
                    async move { tx.send(Ok(chunk)).await.is_ok() }
                });
                let delivered = join_all(sends).await;

                let mut delivered = delivered.into_iter();
                senders.retain(|_| delivered.next().unwrap_or(false));

                if senders.is_empty() {
                    tracing::debug!(
                        chunks = stats.chunks,
                        size_bytes = stats.bytes,
                        "Every tee branch closed, stopping source read"
                    );
                    break;
                }
            }
            Err(e) => {
                stats.source_failed = true;
                let err = Arc::new(e);
                for tx in senders.iter_mut() {
                    let _ = tx.send(Err(Arc::clone(&err))).await;
                }
                break;
            }
        }
    }

    // Dropping the senders ends every branch.
    stats
}

/// Why a branch could not be buffered.
#[derive(Debug)]
pub enum CollectError {
    Source(Arc<io::Error>),
    TooLarge { limit: usize },
}

/// One reader of a teed stream.
#[derive(Debug)]
pub struct TeeBranch {
    rx: mpsc::Receiver<TeeItem>,
}

impl TeeBranch {
    /// Read the branch to the end into one buffer of at most `limit` bytes.
    ///
    /// Going over the limit drops the branch, so the remaining siblings keep
    /// receiving the source.
    pub async fn collect_bytes(mut self, limit: usize) -> Result<Bytes, CollectError> {
        let mut buffer = BytesMut::new();
        while let Some(item) = self.rx.next().await {
            let chunk = item.map_err(CollectError::Source)?;
            if buffer.len().saturating_add(chunk.len()) > limit {
                return Err(CollectError::TooLarge { limit });
            }
            buffer.extend_from_slice(&chunk);
        }
        Ok(buffer.freeze())
    }
}

impl Stream for TeeBranch {
    type Item = TeeItem;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.rx).poll_next(cx)
    }
}
