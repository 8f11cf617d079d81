//! Interactive video downloader.
//!
//! Downloads single videos, lists of videos or whole playlists through
//! yt-dlp, optionally converting them to MP3.
//!
//! # Architecture
//!
//! - `Config`: configuration loaded once from `config.json`
//! - `Engine`: capability the downloader needs from yt-dlp, with
//!   `YtDlpEngine` as the real implementation
//! - `Downloader`: single downloads, MP3 extraction, playlists and batches
//! - `BatchProgress`: per-batch tally and failure report
//! - `Session`: the interactive prompts
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use tubefetch::{Config, Downloader, YtDlpEngine};
//!
//! async fn example() -> tubefetch::error::Result<()> {
//!     let config = Arc::new(Config::load("config.json")?);
//!     let engine = YtDlpEngine::new(&config.libraries_directory).await?;
//!     let downloader = Downloader::new(Arc::new(engine), config);
//!     let mut out = std::io::stdout();
//!     downloader
//!         .download_videos("https://youtu.be/a, https://youtu.be/b", ".mp4", "videos".as_ref(), &mut out)
//!         .await;
//!     Ok(())
//! }
//! ```
pub mod config;
pub mod downloader;
pub mod engine;
pub mod error;
pub mod logging;
pub mod progress;
pub mod session;
pub mod ytdlp;

#[cfg(test)]
mod testing;

// Re-export commonly used items
pub use config::Config;
pub use downloader::{Dispatch, Downloader};
pub use engine::Engine;
pub use error::AppError;
pub use progress::BatchProgress;
pub use session::{Session, SessionOutcome};
pub use ytdlp::YtDlpEngine;
