//! W-phase Core - Domain models, configuration, and port definitions
//!
//! This crate contains the shared domain types and collaborator traits for the
//! waveform acquisition pipeline.

pub mod config;
pub mod error;
pub mod models;
pub mod ports;

pub use error::{Result, WphaseError};
