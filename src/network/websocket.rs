//! WebSocket transport
//!
//! Upstream chunks go out as JSON text frames through an unbounded queue
//! drained by a writer task, so [`Transport::send_chunk`] can be called from
//! the capture worker thread without blocking. Inbound frames are forwarded
//! as [`InboundEvent`]s.

use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use super::Transport;
use crate::error::TransportError;
use crate::protocol::{TransportChunk, UpstreamMessage};

/// Something that arrived on the connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// A text frame
    Text(String),
    /// The peer closed the connection, with its reason if any
    Closed(Option<String>),
    /// The connection failed
    Failed(TransportError),
}

/// Connected WebSocket
pub struct WebSocketTransport {
    outbound: mpsc::UnboundedSender<Message>,
    closed: AtomicBool,
}

impl WebSocketTransport {
    /// Connect to `url` and spawn the reader and writer tasks on the current
    /// runtime
    pub async fn connect(
        url: &str,
    ) -> Result<(Self, mpsc::UnboundedReceiver<InboundEvent>), TransportError> {
        let (stream, _response) = connect_async(url)
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        tracing::info!("Connected to {}", url);

        let (mut sink, mut source) = stream.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<InboundEvent>();

        let writer_events = in_tx.clone();
        tokio::spawn(async move {
            while let Some(message) = out_rx.recv().await {
                let is_close = matches!(message, Message::Close(_));
                if let Err(e) = sink.send(message).await {
                    let _ = writer_events.send(InboundEvent::Failed(TransportError::SendFailed(
                        e.to_string(),
                    )));
                    break;
                }
                if is_close {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        tokio::spawn(async move {
            while let Some(message) = source.next().await {
                match message {
                    Ok(Message::Text(text)) => {
                        if in_tx.send(InboundEvent::Text(text)).is_err() {
                            return;
                        }
                    }
                    Ok(Message::Close(frame)) => {
                        let reason = frame.map(|f| f.reason.to_string());
                        let _ = in_tx.send(InboundEvent::Closed(reason));
                        return;
                    }
                    Ok(Message::Binary(data)) => {
                        tracing::debug!("Ignoring {} byte binary frame", data.len());
                    }
                    Ok(_) => {}
                    Err(e) => {
                        let _ = in_tx.send(InboundEvent::Failed(TransportError::Closed(
                            e.to_string(),
                        )));
                        return;
                    }
                }
            }
            let _ = in_tx.send(InboundEvent::Closed(None));
        });

        Ok((
            Self {
                outbound: out_tx,
                closed: AtomicBool::new(false),
            },
            in_rx,
        ))
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Transport for WebSocketTransport {
    fn send_chunk(&self, chunk: TransportChunk) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed("transport closed".to_string()));
        }
        let text = UpstreamMessage::from_chunk(&chunk).to_json();
        self.outbound
            .send(Message::Text(text))
            .map_err(|_| TransportError::SendFailed("connection writer stopped".to_string()))
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            let _ = self.outbound.send(Message::Close(None));
        }
    }
}
