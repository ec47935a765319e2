//! Network subsystem for the voice peer connection
//!
//! The session and capture worker only see the [`Transport`] trait. Inbound
//! traffic is delivered by whoever owns the connection, as text frames fed
//! into [`StreamSession::on_transport_message`].
//!
//! [`StreamSession::on_transport_message`]: crate::session::StreamSession::on_transport_message

pub mod mock;
pub mod websocket;

pub use mock::RecordingTransport;
pub use websocket::{InboundEvent, WebSocketTransport};

use crate::error::TransportError;
use crate::protocol::TransportChunk;

/// Outbound half of an ordered, reliable message channel to the peer
pub trait Transport: Send + Sync {
    /// Hand one captured chunk to the peer. Must not block on I/O.
    fn send_chunk(&self, chunk: TransportChunk) -> Result<(), TransportError>;

    /// Close the connection. Idempotent.
    fn close(&self);
}
