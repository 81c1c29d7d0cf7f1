//! Host ↔ rendering surface bridge
//!
//! - [`protocol`]: the closed set of messages crossing the boundary
//! - [`transport`]: how frames move (stdio NDJSON, in-memory channels)
//! - [`host`]: the event loop that owns the chat session

pub mod host;
pub mod protocol;
pub mod transport;

pub use host::{CommandSender, HostBridge, HostCommand};
pub use protocol::{decode_intent, DecodedIntent, HostNotification, SurfaceIntent};
pub use transport::{ChannelTransport, ChannelTransportHandle, LineTransport, SurfaceTransport};
