//! Forwarding and draining of one output channel into a sink.

use super::entry::{OutputKind, OutputReceiver, StreamEntry};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// How a `stream_stdout`/`stream_stderr` call ended.
///
/// None of these are errors: a consumer sees "nothing more to read" in
/// every case.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForwardOutcome {
    /// No sink was supplied.
    NoSink,
    /// The id is not registered (never issued, or already cleaned up).
    UnknownStream,
    /// The stream was stopped; `chunks` buffered chunks were flushed afterwards.
    Drained { chunks: usize },
    /// A write to the sink failed; forwarding ended early.
    SinkClosed,
    /// Every sender was dropped and the channel is empty.
    ProducerClosed,
}

/// Copy chunks from `kind` to `sink` until the stream stops or the sink fails.
pub(super) async fn forward_until_stopped<W>(
    entry: &StreamEntry,
    kind: OutputKind,
    sink: &mut W,
) -> ForwardOutcome
where
    W: AsyncWrite + Unpin,
{
    let mut output = entry.output(kind).lock().await;
    let stopped = entry.stopped();

    loop {
        tokio::select! {
            biased;

            _ = stopped.cancelled() => return drain(&mut output, sink).await,

            chunk = output.recv() => match chunk {
                Some(chunk) => {
                    if write_chunk(sink, &chunk).await.is_err() {
                        return ForwardOutcome::SinkClosed;
                    }
                }
                None => return ForwardOutcome::ProducerClosed,
            },
        }
    }
}

/// Flush the chunks buffered right now, without waiting for more.
async fn drain<W>(output: &mut OutputReceiver, sink: &mut W) -> ForwardOutcome
where
    W: AsyncWrite + Unpin,
{
    let pending = output.len();
    let mut chunks = 0;

    for _ in 0..pending {
        let Ok(chunk) = output.try_recv() else {
            break;
        };
        if write_chunk(sink, &chunk).await.is_err() {
            return ForwardOutcome::SinkClosed;
        }
        chunks += 1;
    }

    ForwardOutcome::Drained { chunks }
}

async fn write_chunk<W>(sink: &mut W, chunk: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    sink.write_all(chunk).await?;
    sink.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn entry_with_stdout(capacity: usize) -> (mpsc::Sender<Vec<u8>>, StreamEntry) {
        let (out_tx, out_rx) = mpsc::channel(capacity);
        let (_err_tx, err_rx) = mpsc::channel(1);
        (out_tx, StreamEntry::new(out_rx, err_rx))
    }

    #[tokio::test]
    async fn drain_flushes_only_buffered_chunks() {
        let (tx, entry) = entry_with_stdout(4);
        tx.send(b"a".to_vec()).await.unwrap();
        tx.send(b"b".to_vec()).await.unwrap();
        entry.stop();

        let mut sink = Vec::new();
        let outcome = forward_until_stopped(&entry, OutputKind::Stdout, &mut sink).await;

        assert_eq!(outcome, ForwardOutcome::Drained { chunks: 2 });
        assert_eq!(sink, b"ab");

        // Chunks sent after the drain are left for a later consumer.
        tx.send(b"c".to_vec()).await.unwrap();
        let mut later = Vec::new();
        let outcome = forward_until_stopped(&entry, OutputKind::Stdout, &mut later).await;
        assert_eq!(outcome, ForwardOutcome::Drained { chunks: 1 });
        assert_eq!(later, b"c");
    }

    #[tokio::test]
    async fn closed_producer_ends_forwarding() {
        let (tx, entry) = entry_with_stdout(2);
        tx.send(b"last".to_vec()).await.unwrap();
        drop(tx);

        let mut sink = Vec::new();
        let outcome = forward_until_stopped(&entry, OutputKind::Stdout, &mut sink).await;

        assert_eq!(outcome, ForwardOutcome::ProducerClosed);
        assert_eq!(sink, b"last");
    }

    #[tokio::test]
    async fn failed_write_ends_forwarding() {
        let (tx, entry) = entry_with_stdout(2);
        let (client, mut server) = tokio::io::duplex(64);
        drop(client);
        tx.send(b"lost".to_vec()).await.unwrap();

        let outcome = forward_until_stopped(&entry, OutputKind::Stdout, &mut server).await;
        assert_eq!(outcome, ForwardOutcome::SinkClosed);
    }
}
