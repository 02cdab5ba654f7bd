//! Error handling for Maestro
//!
//! The taxonomy mirrors the pipeline's failure policy: connectivity
//! failures abort planning, per-track failures are caught at the track
//! boundary, and arbitration failures are downgraded to warnings by the
//! caller.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for Maestro operations
pub type Result<T> = std::result::Result<T, MaestroError>;

/// Main error type for Maestro operations
#[derive(Error, Debug)]
pub enum MaestroError {
    // Chat service errors
    #[error("Chat service unreachable: {reason}")]
    ChatUnreachable { reason: String },

    #[error("Chat service timed out after {timeout_secs}s")]
    ChatTimeout { timeout_secs: u64 },

    #[error("Chat service returned HTTP {status}: {body}")]
    ChatStatus { status: u16, body: String },

    #[error("Chat response carried no message content")]
    EmptyChatResponse,

    // Planning errors
    #[error("Blueprint file invalid: {path}: {reason}")]
    InvalidBlueprint { path: PathBuf, reason: String },

    #[error("No blueprints found in {dir}")]
    NoBlueprints { dir: PathBuf },

    // Audio model errors
    #[error("Audio bridge unreachable: {reason}")]
    BridgeUnreachable { reason: String },

    #[error("Audio render failed: {reason}")]
    RenderFailed { reason: String },

    #[error("Render finished but no audio was captured")]
    NoAudioCaptured,

    // Audio data errors
    #[error("Invalid audio data: {reason}")]
    InvalidAudio { reason: String },

    #[error("Invalid WAV file {path}: {reason}")]
    InvalidWav { path: PathBuf, reason: String },

    // Post-processing errors
    #[error("No track ledgers found in {dir}")]
    NoLedgers { dir: PathBuf },

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MaestroError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            MaestroError::ChatUnreachable { .. } => "CHAT_UNREACHABLE",
            MaestroError::ChatTimeout { .. } => "CHAT_TIMEOUT",
            MaestroError::ChatStatus { .. } => "CHAT_STATUS",
            MaestroError::EmptyChatResponse => "EMPTY_CHAT_RESPONSE",
            MaestroError::InvalidBlueprint { .. } => "INVALID_BLUEPRINT",
            MaestroError::NoBlueprints { .. } => "NO_BLUEPRINTS",
            MaestroError::BridgeUnreachable { .. } => "BRIDGE_UNREACHABLE",
            MaestroError::RenderFailed { .. } => "RENDER_FAILED",
            MaestroError::NoAudioCaptured => "NO_AUDIO_CAPTURED",
            MaestroError::InvalidAudio { .. } => "INVALID_AUDIO",
            MaestroError::InvalidWav { .. } => "INVALID_WAV",
            MaestroError::NoLedgers { .. } => "NO_LEDGERS",
            MaestroError::Io(_) => "IO_ERROR",
            MaestroError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Whether this error aborts the whole album run.
    ///
    /// Connectivity failures during planning abort everything; most other
    /// failures are contained at the track or artifact boundary.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MaestroError::ChatUnreachable { .. }
                | MaestroError::ChatTimeout { .. }
                | MaestroError::NoBlueprints { .. }
        )
    }
}
