//! Error types for W-phase acquisition

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WphaseError {
    // Metadata errors
    #[error("Metadata extraction failed for {channel}: {reason}")]
    MetadataExtraction { channel: String, reason: String },

    #[error("Invalid channel id '{id}': expected NET.STA.LOC.CHA")]
    InvalidChannelId { id: String },

    #[error("Inventory error: {reason}")]
    Inventory { reason: String },

    // Remote archive errors
    #[error("Request to {endpoint} failed: {reason}")]
    RemoteFetch { endpoint: String, reason: String },

    #[error("Request to {endpoint} timed out after {seconds}s")]
    FetchTimeout { endpoint: String, seconds: f64 },

    #[error("Waveform decode error: {reason}")]
    Decode { reason: String },

    // Travel time errors
    #[error("Travel time lookup failed: {reason}")]
    TravelTime { reason: String },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl WphaseError {
    /// Shorthand for a per-channel extraction failure
    pub fn extraction(channel: impl Into<String>, reason: impl Into<String>) -> Self {
        WphaseError::MetadataExtraction { channel: channel.into(), reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, WphaseError>;
