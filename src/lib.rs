//! # PCM Voice Bridge
//!
//! Low-latency bidirectional PCM streaming between local audio devices and a
//! network voice peer.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                           CAPTURE PATH                               │
//! │  ┌────────────┐   ┌──────────────┐   ┌────────────┐   ┌───────────┐  │
//! │  │ Microphone │──▶│  FrameSink   │──▶│  Capture   │──▶│ Transport │  │
//! │  │ (callback) │   │ (owned copy) │   │  Worker    │   │  (JSON)   │  │
//! │  └────────────┘   └──────────────┘   │ accumulate │   └─────┬─────┘  │
//! │                                      │ 48k → 16k  │         │        │
//! │                                      │ f32 → i16  │         │        │
//! │                                      └────────────┘         │        │
//! └─────────────────────────────────────────────────────────────┼────────┘
//!                                                               │ WebSocket
//! ┌─────────────────────────────────────────────────────────────┼────────┐
//! │                          PLAYBACK PATH                      ▼        │
//! │  ┌────────────┐   ┌──────────────┐   ┌────────────┐   ┌───────────┐  │
//! │  │  Speaker   │◀──│   Playback   │◀──│  Playback  │◀──│  Stream   │  │
//! │  │ (callback) │   │   Renderer   │   │ Scheduler  │   │  Session  │  │
//! │  └────────────┘   └──────────────┘   │ i16 → f32  │   └───────────┘  │
//! │                     ring buffer or   │ 24k → dev  │                  │
//! │                     clock schedule   └────────────┘                  │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```

pub mod audio;
pub mod codec;
pub mod config;
pub mod error;
pub mod network;
pub mod protocol;
pub mod session;

pub use error::{Error, Result};

/// Application-wide constants
pub mod constants {
    /// Upstream wire rate (microphone to peer)
    pub const WIRE_INPUT_RATE: u32 = 16000;

    /// Downstream wire rate (peer to speaker)
    pub const WIRE_OUTPUT_RATE: u32 = 24000;

    /// Typical native device rate
    pub const DEFAULT_NATIVE_RATE: u32 = 48000;

    /// Default capture accumulation window in milliseconds
    pub const DEFAULT_CHUNK_MS: u32 = 100;

    /// Default playback ring capacity in seconds
    pub const DEFAULT_PLAYBACK_BUFFER_SECONDS: f32 = 60.0;

    /// Default lead-in before the first chunk of a playback run
    pub const DEFAULT_LEAD_IN_MS: u32 = 50;

    /// Default fade length applied when playback is interrupted
    pub const DEFAULT_DECLICK_MS: u32 = 3;

    /// MIME type carried by upstream audio messages
    pub const PCM_MIME_TYPE: &str = "audio/pcm";

    /// Placeholder substituted in the transport URL template
    pub const SESSION_ID_PLACEHOLDER: &str = "{session_id}";

    /// Default transport URL template
    pub const DEFAULT_TRANSPORT_URL: &str = "ws://127.0.0.1:8000/ws/voice/{session_id}";

    /// Capture frames queued between device callback and worker
    pub const CAPTURE_QUEUE_FRAMES: usize = 512;

    /// Minimum spacing between decode-fault warnings
    pub const DECODE_WARNING_INTERVAL_MS: u64 = 1000;
}
