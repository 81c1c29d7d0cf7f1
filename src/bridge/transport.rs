//! Duplex transports between the host and the rendering surface
//!
//! A [`SurfaceTransport`] moves raw frames (one JSON message each) in both
//! directions. Decoding and dispatch happen in the bridge; transports only
//! handle framing.
//!
//! - [`LineTransport`] frames messages as newline-delimited JSON over any
//!   async reader/writer pair. [`LineTransport::stdio`] is what
//!   `memchat serve` uses.
//! - [`ChannelTransport`] is an in-process pair backed by unbounded
//!   channels, for embedding the bridge and for tests. The
//!   [`ChannelTransportHandle`] plays the surface side.
//!
//! ```text
//! surface ── handle.inbound_tx ──▶ transport.recv()   (intents)
//! surface ◀─ handle.outbound_rx ── transport.send()   (notifications)
//! ```

use async_trait::async_trait;
use bytes::BytesMut;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_util::codec::{Decoder, FramedRead, FramedWrite, LinesCodec, LinesCodecError};

use super::protocol::{HostNotification, SurfaceIntent};
use crate::error::{MemchatError, Result};

/// Upper bound for one inbound frame (context blocks can be large)
pub const MAX_FRAME_BYTES: usize = 8 * 1024 * 1024;

/// One end of the host/surface channel, as seen by the host
#[async_trait]
pub trait SurfaceTransport: Send {
    /// Next inbound frame, or `None` once the surface has gone away
    async fn recv(&mut self) -> Option<String>;

    /// Deliver one outbound frame
    ///
    /// # Errors
    ///
    /// Returns [`MemchatError::Transport`] if the surface can no longer be
    /// reached.
    async fn send(&mut self, frame: String) -> Result<()>;
}

/// One decoded inbound line
#[derive(Debug, Clone, PartialEq, Eq)]
enum InboundLine {
    Frame(String),
    /// A line over the length limit; its bytes are discarded up to the next newline
    Oversized,
}

/// [`LinesCodec`] that reports oversized lines as items instead of errors
///
/// `FramedRead` stops yielding after its decoder returns an error, so a
/// single oversized line would otherwise end the stream.
#[derive(Debug)]
struct BoundedLines {
    inner: LinesCodec,
}

impl BoundedLines {
    fn new(max_length: usize) -> Self {
        Self {
            inner: LinesCodec::new_with_max_length(max_length),
        }
    }

    fn map(
        decoded: std::result::Result<Option<String>, LinesCodecError>,
    ) -> std::result::Result<Option<InboundLine>, LinesCodecError> {
        match decoded {
            Ok(line) => Ok(line.map(InboundLine::Frame)),
            Err(LinesCodecError::MaxLineLengthExceeded) => Ok(Some(InboundLine::Oversized)),
            Err(e) => Err(e),
        }
    }
}

impl Decoder for BoundedLines {
    type Item = InboundLine;
    type Error = LinesCodecError;

    fn decode(
        &mut self,
        buf: &mut BytesMut,
    ) -> std::result::Result<Option<InboundLine>, LinesCodecError> {
        Self::map(self.inner.decode(buf))
    }

    fn decode_eof(
        &mut self,
        buf: &mut BytesMut,
    ) -> std::result::Result<Option<InboundLine>, LinesCodecError> {
        Self::map(self.inner.decode_eof(buf))
    }
}

/// Newline-delimited JSON over an async reader/writer pair
pub struct LineTransport<R, W> {
    reader: FramedRead<R, BoundedLines>,
    writer: FramedWrite<W, LinesCodec>,
    max_frame_bytes: usize,
}

impl<R, W> LineTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Wrap a reader (surface → host) and writer (host → surface)
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_max_frame_bytes(reader, writer, MAX_FRAME_BYTES)
    }

    /// Like [`LineTransport::new`] with a custom inbound frame limit
    ///
    /// Longer lines are dropped with a warning; reading continues with the
    /// next line.
    pub fn with_max_frame_bytes(reader: R, writer: W, max_frame_bytes: usize) -> Self {
        Self {
            reader: FramedRead::new(reader, BoundedLines::new(max_frame_bytes)),
            writer: FramedWrite::new(writer, LinesCodec::new()),
            max_frame_bytes,
        }
    }
}

impl LineTransport<tokio::io::Stdin, tokio::io::Stdout> {
    /// Transport over the process's stdin and stdout
    pub fn stdio() -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout())
    }
}

#[async_trait]
impl<R, W> SurfaceTransport for LineTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn recv(&mut self) -> Option<String> {
        loop {
            match self.reader.next().await? {
                Ok(InboundLine::Frame(line)) if line.trim().is_empty() => continue,
                Ok(InboundLine::Frame(line)) => return Some(line),
                Ok(InboundLine::Oversized) => {
                    tracing::warn!(
                        "Dropping inbound frame larger than {} bytes",
                        self.max_frame_bytes
                    );
                }
                Err(e) => {
                    tracing::error!("Surface transport read failed: {}", e);
                    return None;
                }
            }
        }
    }

    async fn send(&mut self, frame: String) -> Result<()> {
        self.writer
            .send(frame)
            .await
            .map_err(|e| MemchatError::Transport(format!("write to surface failed: {}", e)).into())
    }
}

/// In-process transport backed by unbounded channels
#[derive(Debug)]
pub struct ChannelTransport {
    inbound_rx: mpsc::UnboundedReceiver<String>,
    outbound_tx: mpsc::UnboundedSender<String>,
}

/// Surface side of a [`ChannelTransport`]
#[derive(Debug)]
pub struct ChannelTransportHandle {
    /// Frames pushed here arrive at the host as intents
    pub inbound_tx: mpsc::UnboundedSender<String>,
    /// Frames the host sent
    pub outbound_rx: mpsc::UnboundedReceiver<String>,
}

impl ChannelTransport {
    /// Create a connected `(transport, handle)` pair
    ///
    /// # Examples
    ///
    /// ```
    /// use memchat::bridge::transport::{ChannelTransport, SurfaceTransport};
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let (mut transport, mut handle) = ChannelTransport::new();
    /// transport.send("{\"type\":\"showTyping\"}".to_string()).await.unwrap();
    /// assert_eq!(handle.outbound_rx.recv().await.unwrap(), "{\"type\":\"showTyping\"}");
    /// # }
    /// ```
    pub fn new() -> (Self, ChannelTransportHandle) {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        (
            Self {
                inbound_rx,
                outbound_tx,
            },
            ChannelTransportHandle {
                inbound_tx,
                outbound_rx,
            },
        )
    }
}

#[async_trait]
impl SurfaceTransport for ChannelTransport {
    async fn recv(&mut self) -> Option<String> {
        self.inbound_rx.recv().await
    }

    async fn send(&mut self, frame: String) -> Result<()> {
        self.outbound_tx
            .send(frame)
            .map_err(|_| MemchatError::Transport("surface channel closed".to_string()).into())
    }
}

impl ChannelTransportHandle {
    /// Send a typed intent as the surface would
    ///
    /// # Errors
    ///
    /// Returns error if the intent cannot be encoded or the host side is gone
    pub fn send_intent(&self, intent: &SurfaceIntent) -> Result<()> {
        let frame = serde_json::to_string(intent)?;
        self.send_raw(frame)
    }

    /// Send an arbitrary frame, valid or not
    ///
    /// # Errors
    ///
    /// Returns error if the host side is gone
    pub fn send_raw(&self, frame: impl Into<String>) -> Result<()> {
        self.inbound_tx
            .send(frame.into())
            .map_err(|_| MemchatError::Transport("host channel closed".to_string()).into())
    }

    /// Wait for the next notification from the host and decode it
    ///
    /// Returns `None` once the host side has been dropped.
    ///
    /// # Errors
    ///
    /// Returns error if the host sent a frame that is not a notification
    pub async fn next_notification(&mut self) -> Option<Result<HostNotification>> {
        let frame = self.outbound_rx.recv().await?;
        Some(serde_json::from_str(&frame).map_err(Into::into))
    }
}
