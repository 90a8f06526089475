//! Framed TCP peers.
//!
//! Each peer runs a reader task that splits the byte stream into frames and
//! reports them on a shared event channel, and a writer task that drains an
//! unbounded frame queue into the socket.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use mc_relay_proto::codec::{encode_frame, FrameDecoder};

use crate::error::RelayError;

const READ_BUF_SIZE: usize = 8 * 1024;

/// Which end of the relay a peer is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Client,
    Upstream,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Client => write!(f, "client"),
            Side::Upstream => write!(f, "upstream"),
        }
    }
}

/// Unique identifier for a peer connection within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Atomic generator for monotonically increasing [`ConnectionId`]s.
pub struct IdGenerator {
    next: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    pub fn next_id(&self) -> ConnectionId {
        ConnectionId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Reported by peer reader tasks.
#[derive(Debug)]
pub enum PeerEvent {
    /// One complete frame payload, without its length prefix.
    Frame {
        id: ConnectionId,
        side: Side,
        payload: Bytes,
    },
    /// The peer stopped. `reason` is `None` on a clean end of stream.
    Closed {
        id: ConnectionId,
        side: Side,
        reason: Option<String>,
    },
}

/// Owning handle to a running peer. Dropping it stops the reader and lets
/// the writer flush what is queued before shutting the socket down.
pub struct PeerHandle {
    id: ConnectionId,
    side: Side,
    max_frame: usize,
    tx: mpsc::UnboundedSender<Bytes>,
    reader: JoinHandle<()>,
}

impl PeerHandle {
    pub fn spawn<R, W>(
        id: ConnectionId,
        side: Side,
        reader: R,
        writer: W,
        max_frame: usize,
        events: mpsc::UnboundedSender<PeerEvent>,
    ) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(write_loop(id, side, writer, rx));
        let reader = tokio::spawn(read_loop(id, side, reader, max_frame, events));
        Self {
            id,
            side,
            max_frame,
            tx,
            reader,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Queue one payload, length-prefixed, for writing.
    pub fn send_frame(&self, payload: &[u8]) -> Result<(), RelayError> {
        let frame = encode_frame(payload, self.max_frame)?;
        self.tx
            .send(frame)
            .map_err(|_| RelayError::PeerClosed(self.side))
    }

    pub fn close(self) {
        debug!(id = %self.id, side = %self.side, "closing peer");
    }
}

impl Drop for PeerHandle {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn read_loop<R>(
    id: ConnectionId,
    side: Side,
    mut reader: R,
    max_frame: usize,
    events: mpsc::UnboundedSender<PeerEvent>,
) where
    R: AsyncRead + Unpin,
{
    let mut decoder = FrameDecoder::new(max_frame);
    let mut buf = vec![0u8; READ_BUF_SIZE];

    let reason = 'read: loop {
        match reader.read(&mut buf).await {
            Ok(0) => break None,
            Ok(n) => {
                decoder.extend(&buf[..n]);
                loop {
                    match decoder.next_frame() {
                        Ok(Some(payload)) => {
                            trace!(%id, %side, len = payload.len(), "frame");
                            if events.send(PeerEvent::Frame { id, side, payload }).is_err() {
                                return;
                            }
                        }
                        Ok(None) => break,
                        Err(e) => break 'read Some(e.to_string()),
                    }
                }
            }
            Err(e) => break Some(e.to_string()),
        }
    };

    debug!(%id, %side, reason = reason.as_deref().unwrap_or("end of stream"), "peer closed");
    let _ = events.send(PeerEvent::Closed { id, side, reason });
}

async fn write_loop<W>(
    id: ConnectionId,
    side: Side,
    mut writer: W,
    mut rx: mpsc::UnboundedReceiver<Bytes>,
) where
    W: AsyncWrite + Unpin,
{
    while let Some(frame) = rx.recv().await {
        if let Err(e) = writer.write_all(&frame).await {
            debug!(%id, %side, "write failed: {e}");
            return;
        }
    }
    let _ = writer.shutdown().await;
}
