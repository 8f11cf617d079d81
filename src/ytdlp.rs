use crate::engine::{DownloadOptions, Engine, MediaInfo, PlaylistInfo, PostProcessor};
use crate::error::{EngineError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, instrument, warn};
use yt_dlp::fetcher::deps::Libraries;
use yt_dlp::Youtube;

/// [`Engine`] backed by the yt-dlp and ffmpeg binaries.
///
/// # Fields
/// * `libraries` - Paths of the yt-dlp and ffmpeg executables
pub struct YtDlpEngine {
    libraries: Libraries,
}

impl YtDlpEngine {
    /// Creates an engine using the binaries found in `libraries_dir`
    ///
    /// # Details
    /// Checks for existing yt-dlp and ffmpeg binaries. If either is missing,
    /// both are downloaded. Otherwise the existing binaries are used and
    /// yt-dlp is asked to update itself.
    ///
    /// # Errors
    /// * If the directory cannot be created
    /// * If the binaries cannot be installed
    #[instrument]
    pub async fn new(libraries_dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(libraries_dir).await?;

        if !libraries_dir.join("yt-dlp").exists() || !libraries_dir.join("ffmpeg").exists() {
            let youtube = Youtube::with_new_binaries(libraries_dir.to_path_buf(), libraries_dir.to_path_buf())
                .await?;
            return Ok(Self::with_libraries(youtube.libraries));
        }

        let libraries = Libraries::new(libraries_dir.join("yt-dlp"), libraries_dir.join("ffmpeg"));
        let youtube = Youtube::new(libraries, libraries_dir.to_path_buf())?;
        if let Err(e) = youtube.update_downloader().await {
            warn!("Could not update yt-dlp, continuing with the installed version: {}", e);
        }

        Ok(Self::with_libraries(youtube.libraries))
    }

    pub fn with_libraries(libraries: Libraries) -> Self {
        Self { libraries }
    }

    /// Runs yt-dlp with `args` and parses the last JSON document it prints.
    async fn run<T: DeserializeOwned>(&self, args: Vec<String>) -> std::result::Result<T, EngineError> {
        debug!("yt-dlp {}", args.join(" "));

        let output = Command::new(&self.libraries.youtube)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(classify_failure(&output.status.to_string(), &stderr));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_last_json(&stdout)
    }
}

#[async_trait]
impl Engine for YtDlpEngine {
    async fn download(
        &self,
        url: &str,
        options: &DownloadOptions,
    ) -> std::result::Result<MediaInfo, EngineError> {
        let mut args = download_args(options);
        args.push("--ffmpeg-location".to_string());
        args.push(self.libraries.ffmpeg.to_string_lossy().into_owned());
        args.push(url.to_string());
        self.run(args).await
    }

    async fn resolve_playlist(&self, url: &str) -> std::result::Result<PlaylistInfo, EngineError> {
        self.run(playlist_args(url)).await
    }
}

/// Translates an options bundle into yt-dlp command-line arguments.
///
/// The URL is not included.
pub fn download_args(options: &DownloadOptions) -> Vec<String> {
    let mut args = vec![
        "--format".to_string(),
        options.format.clone(),
        "--output".to_string(),
        options.output_template.to_string_lossy().into_owned(),
        "--socket-timeout".to_string(),
        options.socket_timeout.as_secs().to_string(),
        "--retries".to_string(),
        options.retries.to_string(),
        "--fragment-retries".to_string(),
        options.fragment_retries.to_string(),
        // print the info JSON without skipping the download
        "--dump-json".to_string(),
        "--no-simulate".to_string(),
        "--no-progress".to_string(),
    ];

    for postprocessor in &options.postprocessors {
        match postprocessor {
            PostProcessor::ExtractAudio { codec, quality } => {
                args.push("--extract-audio".to_string());
                args.push("--audio-format".to_string());
                args.push(codec.clone());
                args.push("--audio-quality".to_string());
                args.push(format!("{}K", quality));
            }
        }
    }

    if options.quiet {
        args.push("--quiet".to_string());
    }
    if options.no_warnings {
        args.push("--no-warnings".to_string());
    }

    args
}

/// Arguments for a flat listing of `url`.
pub fn playlist_args(url: &str) -> Vec<String> {
    vec![
        "--flat-playlist".to_string(),
        "--dump-single-json".to_string(),
        "--quiet".to_string(),
        "--no-warnings".to_string(),
        url.to_string(),
    ]
}

/// yt-dlp reports a rejected source as an `ERROR:` line on stderr.
fn classify_failure(status: &str, stderr: &str) -> EngineError {
    match stderr.lines().rev().find(|line| line.starts_with("ERROR:")) {
        Some(line) => EngineError::Unavailable(line.trim_start_matches("ERROR:").trim().to_string()),
        None => EngineError::Process {
            status: status.to_string(),
            stderr: stderr.trim().to_string(),
        },
    }
}

fn parse_last_json<T: DeserializeOwned>(stdout: &str) -> std::result::Result<T, EngineError> {
    let line = stdout
        .lines()
        .rev()
        .find(|line| line.trim_start().starts_with('{'))
        .unwrap_or_default();
    Ok(serde_json::from_str(line)?)
}
