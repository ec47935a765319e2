//! Error types for the voice bridge

use thiserror::Error;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum Error {
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Audio device errors
///
/// Every variant is a device-acquisition or device-stream fault. None of them
/// are retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Failed to open stream: {0}")]
    StreamError(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Device already started")]
    AlreadyStarted,

    #[error("cpal error: {0}")]
    CpalError(String),
}

/// Decode faults on a single chunk or message
///
/// The offending chunk is dropped and playback continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("PCM payload has odd length: {0} bytes")]
    OddLength(usize),

    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(String),

    #[error("Malformed message: {0}")]
    MalformedMessage(String),
}

/// Transport faults
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Connection closed: {0}")]
    Closed(String),

    #[error("Peer reported error: {0}")]
    Peer(String),
}

/// Session lifecycle errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("A session identifier is required to start")]
    MissingSessionId,

    #[error("Cannot {operation} while {state}")]
    InvalidState {
        state: crate::session::SessionState,
        operation: &'static str,
    },

    #[error("Device acquisition failed: {0}")]
    DeviceAcquisition(#[from] AudioError),

    #[error("Device failed: {0}")]
    DeviceFault(AudioError),

    #[error("Transport failed: {0}")]
    Transport(#[from] TransportError),
}

/// Result type alias for the crate
pub type Result<T> = std::result::Result<T, Error>;
