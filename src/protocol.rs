//! Wire messages exchanged with the voice peer
//!
//! Upstream, every captured chunk travels as one JSON text frame:
//!
//! ```text
//! { "mime_type": "audio/pcm", "data": "<base64 Int16 LE @ 16 kHz mono>" }
//! ```
//!
//! Downstream frames are tagged by `type`: `audio`, `turn_complete`,
//! `interrupted` and `error`. Unknown types are surfaced as
//! [`DownstreamMessage::Unknown`] so callers can log and ignore them.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::audio::frame::{AudioFrame, Samples};
use crate::codec::pcm::{self, BYTES_PER_SAMPLE};
use crate::constants::PCM_MIME_TYPE;
use crate::error::CodecError;

/// One encoded frame: 16-bit signed little-endian mono PCM at a declared rate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportChunk {
    payload: Bytes,
    sample_rate: u32,
}

impl TransportChunk {
    /// Wrap raw PCM bytes, rejecting odd-length payloads
    pub fn new(payload: Bytes, sample_rate: u32) -> Result<Self, CodecError> {
        if payload.len() % BYTES_PER_SAMPLE != 0 {
            return Err(CodecError::OddLength(payload.len()));
        }
        Ok(Self {
            payload,
            sample_rate,
        })
    }

    /// Encode a frame for the wire
    pub fn encode(frame: &AudioFrame) -> Self {
        let payload = match frame.samples() {
            Samples::Float(s) => pcm::to_int16(s),
            Samples::Int16(s) => s.iter().flat_map(|v| v.to_le_bytes()).collect(),
        };
        Self {
            payload,
            sample_rate: frame.sample_rate(),
        }
    }

    /// Decode a base64 `data` field
    pub fn from_base64(data: &str, sample_rate: u32) -> Result<Self, CodecError> {
        let bytes = STANDARD
            .decode(data.trim())
            .map_err(|e| CodecError::InvalidBase64(e.to_string()))?;
        Self::new(Bytes::from(bytes), sample_rate)
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.payload)
    }

    /// Decode into a float frame at the chunk's rate
    pub fn decode(&self) -> Result<AudioFrame, CodecError> {
        let samples = pcm::to_float(&self.payload)?;
        Ok(AudioFrame::from_float(samples, self.sample_rate))
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn sample_count(&self) -> usize {
        self.payload.len() / BYTES_PER_SAMPLE
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Client -> peer audio message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamMessage {
    pub mime_type: String,
    pub data: String,
}

impl UpstreamMessage {
    pub fn from_chunk(chunk: &TransportChunk) -> Self {
        Self {
            mime_type: PCM_MIME_TYPE.to_string(),
            data: chunk.to_base64(),
        }
    }

    pub fn to_json(&self) -> String {
        // Two string fields cannot fail to serialize
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Decode the payload back into a chunk at `sample_rate`
    pub fn into_chunk(self, sample_rate: u32) -> Result<TransportChunk, CodecError> {
        TransportChunk::from_base64(&self.data, sample_rate)
    }
}

/// Peer -> client message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownstreamMessage {
    /// Base64 PCM at the downstream wire rate
    Audio {
        data: String,
        turn_complete: bool,
    },
    TurnComplete,
    Interrupted,
    Error { message: String },
    /// Unrecognized `type`, kept for logging
    Unknown(String),
}

/// Raw envelope before dispatch on `type`
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    turn_complete: Option<bool>,
}

impl DownstreamMessage {
    /// Parse one downstream JSON text frame
    pub fn parse(text: &str) -> Result<Self, CodecError> {
        let envelope: Envelope = serde_json::from_str(text)
            .map_err(|e| CodecError::MalformedMessage(e.to_string()))?;

        Ok(match envelope.kind.as_str() {
            "audio" => {
                let data = envelope.data.ok_or_else(|| {
                    CodecError::MalformedMessage("audio message without data".to_string())
                })?;
                DownstreamMessage::Audio {
                    data,
                    turn_complete: envelope.turn_complete.unwrap_or(false),
                }
            }
            "turn_complete" => DownstreamMessage::TurnComplete,
            "interrupted" => DownstreamMessage::Interrupted,
            "error" => DownstreamMessage::Error {
                message: envelope.message.unwrap_or_default(),
            },
            _ => DownstreamMessage::Unknown(envelope.kind),
        })
    }

    /// Serialize back to the wire shape
    pub fn to_json(&self) -> String {
        let value = match self {
            DownstreamMessage::Audio {
                data,
                turn_complete,
            } => {
                if *turn_complete {
                    serde_json::json!({ "type": "audio", "data": data, "turn_complete": true })
                } else {
                    serde_json::json!({ "type": "audio", "data": data })
                }
            }
            DownstreamMessage::TurnComplete => serde_json::json!({ "type": "turn_complete" }),
            DownstreamMessage::Interrupted => serde_json::json!({ "type": "interrupted" }),
            DownstreamMessage::Error { message } => {
                serde_json::json!({ "type": "error", "message": message })
            }
            DownstreamMessage::Unknown(kind) => serde_json::json!({ "type": kind }),
        };
        value.to_string()
    }

    /// Build an `audio` message from a chunk
    pub fn audio(chunk: &TransportChunk) -> Self {
        DownstreamMessage::Audio {
            data: chunk.to_base64(),
            turn_complete: false,
        }
    }
}
