//! Error types for the application.
//!
//! Failures are split in two tiers:
//! - startup failures (configuration, engine provisioning) that end the process
//! - per-URL failures, which never reach these types and are reported as
//!   [`crate::downloader::Dispatch`] values instead

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Reasons the configuration file could not be turned into a [`crate::Config`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{} not found. Please ensure the file exists.", .0.display())]
    NotFound(PathBuf),

    #[error("Configuration is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Missing configuration key: {0}")]
    MissingKey(&'static str),

    #[error("Invalid configuration key {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Failures reported by the external extraction engine.
///
/// `Unavailable` is the engine's own download-specific signal (bad URL,
/// private or removed video). Everything else is a generic failure.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid or unavailable source: {0}")]
    Unavailable(String),

    #[error("yt-dlp exited with {status}: {stderr}")]
    Process { status: String, stderr: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Unreadable engine output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Represents all errors that can escape a component boundary.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Youtube error: {0}")]
    Youtube(#[from] yt_dlp::error::Error),

    #[error("Logging error: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
