//! Reading process pipes into producer channels.

use crate::streamer::OutputSender;
use futures::stream::{Stream, StreamExt};
use tether_shared::constants::streaming::CHUNK_SIZE;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Chunks read from a pipe as they arrive, ending at EOF or the first read error.
pub(super) fn output_chunks<R>(mut reader: R) -> impl Stream<Item = Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    async_stream::stream! {
        let mut buf = [0u8; CHUNK_SIZE];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => yield buf[..n].to_vec(),
                Err(_) => break,
            }
        }
    }
}

/// Move every chunk into `tx`, waiting for room when the channel is full.
///
/// Returns the number of bytes delivered. Stops early if the receiver is gone.
pub(super) async fn pump<S>(chunks: S, tx: OutputSender) -> usize
where
    S: Stream<Item = Vec<u8>>,
{
    futures::pin_mut!(chunks);
    let mut delivered = 0;

    while let Some(chunk) = chunks.next().await {
        let len = chunk.len();
        if tx.send(chunk).await.is_err() {
            break;
        }
        delivered += len;
    }

    delivered
}
