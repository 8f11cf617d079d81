//! Contract with the external extraction engine.
//!
//! The downloader only describes what it wants through [`DownloadOptions`];
//! stream selection, transfer and transcoding belong to the engine.

use crate::error::EngineError;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Base URL that playlist entry ids are appended to.
pub const WATCH_URL: &str = "https://www.youtube.com/watch";

/// Step the engine runs after the transfer finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostProcessor {
    /// Extract the audio track and encode it with `codec` at `quality` kbps.
    ExtractAudio { codec: String, quality: String },
}

/// Declarative options bundle for a single download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOptions {
    /// Quality selector, passed through untouched.
    pub format: String,
    /// Output path template using `%(field)s` placeholders.
    pub output_template: PathBuf,
    pub socket_timeout: Duration,
    pub retries: u32,
    pub fragment_retries: u32,
    pub postprocessors: Vec<PostProcessor>,
    pub quiet: bool,
    pub no_warnings: bool,
}

/// Metadata the engine reports for a finished download.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MediaInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// Path the engine wrote to, before any post-processing.
    #[serde(default, rename = "_filename")]
    pub filename: Option<PathBuf>,
}

/// One member of a flat playlist listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlaylistEntry {
    pub id: String,
}

/// Flat playlist listing: identifiers only, no per-video metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PlaylistInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub entries: Vec<PlaylistEntry>,
}

impl PlaylistInfo {
    /// Canonical watch URL for every entry, in listing order.
    pub fn watch_urls(&self) -> Vec<String> {
        self.entries.iter().map(|entry| watch_url(&entry.id)).collect()
    }
}

/// Builds the canonical watch URL for a video id.
pub fn watch_url(id: &str) -> String {
    match Url::parse_with_params(WATCH_URL, [("v", id)]) {
        Ok(url) => url.to_string(),
        Err(_) => format!("{}?v={}", WATCH_URL, id),
    }
}

/// Capability the downloader needs from an extraction engine.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Downloads `url` according to `options` and reports what was fetched.
    ///
    /// # Errors
    /// * `EngineError::Unavailable` when the engine rejects the source itself
    /// * any other variant for generic failures
    async fn download(&self, url: &str, options: &DownloadOptions)
        -> Result<MediaInfo, EngineError>;

    /// Lists the members of a playlist without downloading any media.
    async fn resolve_playlist(&self, url: &str) -> Result<PlaylistInfo, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_url_embeds_id() {
        assert_eq!(
            watch_url("dQw4w9WgXcQ"),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
    }

    #[test]
    fn playlist_listing_maps_every_entry() {
        let info: PlaylistInfo = serde_json::from_str(
            r#"{
                "title": "Mix",
                "_type": "playlist",
                "entries": [
                    {"id": "aaaaaaaaaaa", "url": "https://www.youtube.com/watch?v=aaaaaaaaaaa"},
                    {"id": "bbbbbbbbbbb"},
                    {"id": "ccccccccccc", "title": "third"}
                ]
            }"#,
        )
        .unwrap();

        let urls = info.watch_urls();
        assert_eq!(info.title.as_deref(), Some("Mix"));
        assert_eq!(urls.len(), 3);
        for (url, entry) in urls.iter().zip(&info.entries) {
            assert!(url.contains(&entry.id));
        }
    }

    #[test]
    fn media_info_reads_prepared_filename() {
        let info: MediaInfo = serde_json::from_str(
            r#"{"id": "x", "title": "Clip", "ext": "mp4", "_filename": "out/Clip.mp4"}"#,
        )
        .unwrap();
        assert_eq!(info.title.as_deref(), Some("Clip"));
        assert_eq!(info.filename, Some(PathBuf::from("out/Clip.mp4")));
    }
}
