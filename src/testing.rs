//! In-memory stand-ins for the engine and the sleeper.

use crate::config::Config;
use crate::downloader::Sleeper;
use crate::engine::{DownloadOptions, Engine, MediaInfo, PlaylistInfo};
use crate::error::EngineError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

pub fn test_config(logs_directory: &Path) -> Config {
    let mut config = Config::from_json(
        r#"{
            "delimiter": ",",
            "file_formats": {"1": ".mp3", "2": ".mp4"},
            "quality_formats": {"mp3": "worst", "mp4": "best[ext=mp4]"}
        }"#,
    )
    .unwrap();
    config.logs_directory = logs_directory.to_path_buf();
    config
}

#[derive(Debug, Clone, Copy)]
pub enum Script {
    Unavailable,
    Fail,
}

/// Engine that records every call. URLs succeed unless scripted otherwise;
/// playlists fail unless one was provided.
#[derive(Default)]
pub struct FakeEngine {
    scripts: HashMap<String, Script>,
    playlist: Option<PlaylistInfo>,
    downloads: Mutex<Vec<(String, DownloadOptions)>>,
    resolved: Mutex<Vec<String>>,
}

impl FakeEngine {
    pub fn script(mut self, url: &str, script: Script) -> Self {
        self.scripts.insert(url.to_string(), script);
        self
    }

    pub fn playlist(mut self, playlist: PlaylistInfo) -> Self {
        self.playlist = Some(playlist);
        self
    }

    pub fn downloads(&self) -> Vec<(String, DownloadOptions)> {
        self.downloads.lock().unwrap().clone()
    }

    pub fn downloaded_urls(&self) -> Vec<String> {
        self.downloads().into_iter().map(|(url, _)| url).collect()
    }

    pub fn resolved(&self) -> Vec<String> {
        self.resolved.lock().unwrap().clone()
    }
}

#[async_trait]
impl Engine for FakeEngine {
    async fn download(&self, url: &str, options: &DownloadOptions) -> Result<MediaInfo, EngineError> {
        self.downloads
            .lock()
            .unwrap()
            .push((url.to_string(), options.clone()));

        match self.scripts.get(url) {
            Some(Script::Unavailable) => Err(EngineError::Unavailable(format!("{}: Video unavailable", url))),
            Some(Script::Fail) => Err(EngineError::Process {
                status: "exit status: 2".to_string(),
                stderr: "network unreachable".to_string(),
            }),
            None => {
                let title = format!("title of {}", url);
                let folder = options.output_template.parent().unwrap_or(Path::new(""));
                Ok(MediaInfo {
                    id: Some(url.to_string()),
                    filename: Some(folder.join(format!("{}.mp4", title))),
                    title: Some(title),
                })
            }
        }
    }

    async fn resolve_playlist(&self, url: &str) -> Result<PlaylistInfo, EngineError> {
        self.resolved.lock().unwrap().push(url.to_string());
        self.playlist
            .clone()
            .ok_or_else(|| EngineError::Unavailable(format!("{}: not a playlist", url)))
    }
}

#[derive(Default)]
pub struct RecordingSleeper {
    pauses: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.pauses.lock().unwrap().push(duration);
    }
}
