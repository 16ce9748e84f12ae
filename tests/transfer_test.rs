//! End-to-end transfers between a real Sender and Receiver over an in-memory
//! duplex stream.

use std::fs;
use std::io;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

use farsync::{
    PacketStream, ProtocolError, Receiver, ReceiverConfig, Sender, SenderConfig, SyncError,
    TransferStats,
};
use tempfile::TempDir;
use tokio::io::{AsyncRead, ReadBuf};

const NAME: &str = "file.dat";

struct Outcome {
    result: Vec<u8>,
    sent: TransferStats,
    received: TransferStats,
}

async fn run_transfer<D>(
    dir: &Path,
    mut data: D,
    chunk_size: usize,
) -> (farsync::Result<TransferStats>, farsync::Result<TransferStats>)
where
    D: AsyncRead + Unpin,
{
    let (a, b) = tokio::io::duplex(4096);
    let (ar, aw) = tokio::io::split(a);
    let (br, bw) = tokio::io::split(b);

    let sender = Sender::new(SenderConfig {
        display_name: NAME.to_string(),
        chunk_size,
    });
    let receiver = Receiver::new(ReceiverConfig {
        root: dir.to_path_buf(),
        chunk_size,
        window_chunks: 100,
    });

    let send = async move {
        let mut stream = PacketStream::new(ar, aw);
        sender.run(&mut data, &mut stream).await
    };
    let receive = async move {
        let mut stream = PacketStream::new(br, bw);
        receiver.run(&mut stream).await.map(|r| r.stats)
    };
    tokio::join!(send, receive)
}

async fn sync(original: Option<&[u8]>, data: &[u8], chunk_size: usize) -> Outcome {
    let tmp = TempDir::new().unwrap();
    if let Some(original) = original {
        fs::write(tmp.path().join(NAME), original).unwrap();
    }

    let (sent, received) = run_transfer(tmp.path(), data, chunk_size).await;
    let sent = sent.unwrap();
    let received = received.unwrap();
    assert_eq!(sent, received, "endpoints disagree on the exchange");

    Outcome {
        result: fs::read(tmp.path().join(NAME)).unwrap(),
        sent,
        received,
    }
}

/// Deterministic filler so tests don't depend on an RNG crate.
fn pattern(len: usize, seed: u32) -> Vec<u8> {
    let mut x = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    (0..len)
        .map(|_| {
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            x as u8
        })
        .collect()
}

#[tokio::test]
async fn test_identical_content_sends_no_chunk_content() {
    let data = pattern(3000, 1);
    let out = sync(Some(&data[..]), &data, 64).await;

    assert_eq!(out.result, data);
    assert_eq!(out.sent.chunks, 47);
    assert_eq!(out.sent.chunks_reused, 47);
    assert_eq!(out.sent.chunks_fetched, 0);
    assert_eq!(out.sent.bytes_fetched, 0);
}

#[tokio::test]
async fn test_empty_original_fetches_everything() {
    let data = pattern(1000, 2);
    let out = sync(Some(&b""[..]), &data, 64).await;

    assert_eq!(out.result, data);
    assert_eq!(out.sent.chunks_reused, 0);
    assert_eq!(out.sent.chunks_fetched, 16);
    assert_eq!(out.received.bytes_fetched, 1000);
}

#[tokio::test]
async fn test_missing_original_fetches_everything() {
    let data = pattern(200, 3);
    let out = sync(None, &data, 64).await;

    assert_eq!(out.result, data);
    assert_eq!(out.sent.chunks_fetched, 4);
}

#[tokio::test]
async fn test_unrelated_original_fetches_everything() {
    let data = pattern(640, 4);
    let out = sync(Some(&pattern(640, 5)[..]), &data, 64).await;

    assert_eq!(out.result, data);
    assert_eq!(out.sent.chunks_reused, 0);
}

#[tokio::test]
async fn test_missing_leading_chunk() {
    let out = sync(Some(&b"67890"[..]), b"1234567890", 5).await;

    assert_eq!(out.result, b"1234567890");
    assert_eq!(out.sent.chunks_fetched, 1);
    assert_eq!(out.sent.chunks_reused, 1);
    assert_eq!(out.sent.bytes_fetched, 5);
}

#[tokio::test]
async fn test_corrupted_leading_chunk() {
    let out = sync(Some(&b"2232567890"[..]), b"1234567890", 5).await;

    assert_eq!(out.result, b"1234567890");
    assert_eq!(out.sent.chunks_fetched, 1);
    assert_eq!(out.sent.chunks_reused, 1);
}

#[tokio::test]
async fn test_truncated_leading_chunk() {
    let out = sync(Some(&b"2567890"[..]), b"1234567890", 5).await;

    assert_eq!(out.result, b"1234567890");
    assert_eq!(out.sent.chunks_fetched, 1);
    assert_eq!(out.sent.chunks_reused, 1);
}

#[tokio::test]
async fn test_insertion_in_the_middle() {
    let a = pattern(100, 10);
    let b = pattern(100, 11);
    let c = pattern(100, 12);
    let inserted = pattern(100, 13);

    let original = [a.clone(), b.clone(), c.clone()].concat();
    let data = [a, inserted, b, c].concat();
    let out = sync(Some(&original[..]), &data, 100).await;

    assert_eq!(out.result, data);
    assert_eq!(out.sent.chunks_reused, 3);
    assert_eq!(out.sent.chunks_fetched, 1);
}

#[tokio::test]
async fn test_deletion_and_unaligned_shift() {
    let original = pattern(1000, 20);
    // Drop 37 bytes near the front: later chunks only match off-boundary
    let data = [&original[..13], &original[50..]].concat();
    let out = sync(Some(&original[..]), &data, 50).await;

    assert_eq!(out.result, data);
    assert_eq!(out.sent.chunks, 20);
    assert_eq!(out.sent.chunks_reused, 19);
    assert_eq!(out.sent.chunks_fetched, 1);
}

#[tokio::test]
async fn test_swapped_chunks_only_reuse_forward() {
    // The cursor only moves forward: once "AAAAA" is matched at offset 5,
    // "BBBBB" behind it can no longer be found
    let out = sync(Some(&b"BBBBBAAAAA"[..]), b"AAAAABBBBB", 5).await;

    assert_eq!(out.result, b"AAAAABBBBB");
    assert_eq!(out.sent.chunks_reused, 1);
    assert_eq!(out.sent.chunks_fetched, 1);
}

#[tokio::test]
async fn test_short_final_chunk_is_reused() {
    let data: &[u8] = b"1234567890ab";
    let out = sync(Some(data), data, 5).await;

    assert_eq!(out.result, data);
    assert_eq!(out.sent.chunks_reused, 3);
}

#[tokio::test]
async fn test_empty_source_empties_target() {
    let out = sync(Some(&b"old content"[..]), b"", 5).await;

    assert!(out.result.is_empty());
    assert_eq!(out.sent, TransferStats::default());
}

/// Yields its data, then fails like a disk read error.
struct FailAfter {
    data: Vec<u8>,
    pos: usize,
}

impl AsyncRead for FailAfter {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self.pos >= self.data.len() {
            return Poll::Ready(Err(io::Error::other("source went away")));
        }
        let n = buf.remaining().min(self.data.len() - self.pos);
        let start = self.pos;
        buf.put_slice(&self.data[start..start + n]);
        self.pos += n;
        Poll::Ready(Ok(()))
    }
}

#[tokio::test]
async fn test_sender_failure_leaves_original_untouched() {
    let tmp = TempDir::new().unwrap();
    let original = pattern(500, 30);
    fs::write(tmp.path().join(NAME), &original).unwrap();

    let source = FailAfter {
        data: pattern(500, 31),
        pos: 0,
    };
    let (sent, received) = run_transfer(tmp.path(), source, 100).await;

    assert!(matches!(sent, Err(SyncError::Io(_))));
    assert!(matches!(
        received,
        Err(SyncError::Protocol(ProtocolError::TruncatedStream { .. }))
    ));
    assert_eq!(fs::read(tmp.path().join(NAME)).unwrap(), original);

    let leftovers: Vec<_> = fs::read_dir(tmp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(leftovers.len(), 1, "temp output not cleaned up: {:?}", leftovers);
}
