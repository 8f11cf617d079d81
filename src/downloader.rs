use crate::config::Config;
use crate::engine::{DownloadOptions, Engine, MediaInfo, PostProcessor};
use crate::error::{EngineError, Result};
use crate::progress::BatchProgress;
use async_trait::async_trait;
use rand::Rng;
use std::io::Write;
use std::ops::RangeInclusive;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

pub const SOCKET_TIMEOUT: Duration = Duration::from_secs(30);
pub const RETRIES: u32 = 3;
pub const FRAGMENT_RETRIES: u32 = 3;
pub const AUDIO_CODEC: &str = "mp3";
pub const AUDIO_BITRATE: &str = "192";
pub const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Bounds, in seconds, of the pause between two downloads of a batch.
pub const PAUSE_SECONDS: RangeInclusive<u64> = 2..=5;

/// File in the logs directory that collects failed URLs.
pub const FAILURE_REPORT: &str = "failed.txt";

/// Waits between downloads. Swapped out in tests.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Picks a pause uniformly from [`PAUSE_SECONDS`].
pub fn random_pause() -> Duration {
    Duration::from_secs(rand::thread_rng().gen_range(PAUSE_SECONDS))
}

/// Result of handing one URL to the engine.
///
/// Per-URL failures are values so the batch can carry on after them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Completed(MediaInfo),
    /// The engine rejected the source itself (bad URL, removed video...).
    Unavailable,
    Failed(String),
}

/// Operator input split on the delimiter.
///
/// Pieces keep their position so that progress numbering matches what the
/// operator typed, even when some pieces are empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlBatch {
    pieces: Vec<String>,
}

impl UrlBatch {
    /// Trims the input, drops one trailing delimiter and splits the rest.
    pub fn parse(input: &str, delimiter: char) -> Self {
        let input = input.trim();
        if input.is_empty() {
            return Self { pieces: Vec::new() };
        }

        let input = input.strip_suffix(delimiter).unwrap_or(input);
        Self {
            pieces: input
                .split(delimiter)
                .map(|piece| piece.trim().to_string())
                .collect(),
        }
    }

    /// Number of pieces, empty ones included.
    pub fn total(&self) -> usize {
        self.pieces.len()
    }

    /// Non-empty URLs with their 1-based position in the input.
    pub fn urls(&self) -> impl Iterator<Item = (usize, &str)> {
        self.pieces
            .iter()
            .enumerate()
            .filter(|(_, piece)| !piece.is_empty())
            .map(|(index, piece)| (index + 1, piece.as_str()))
    }
}

/// Sequential downloader in front of an [`Engine`].
///
/// # Fields
/// * `engine` - Extraction engine that does the actual work
/// * `sleeper` - Pauses between downloads of a batch
/// * `config` - Application configuration settings
pub struct Downloader {
    engine: Arc<dyn Engine>,
    sleeper: Arc<dyn Sleeper>,
    config: Arc<Config>,
}

impl Downloader {
    /// Creates a downloader that pauses with real timers.
    ///
    /// # Arguments
    /// * `engine` - Engine every download is delegated to
    /// * `config` - Configuration settings for the downloader
    pub fn new(engine: Arc<dyn Engine>, config: Arc<Config>) -> Self {
        Self {
            engine,
            sleeper: Arc::new(TokioSleeper),
            config,
        }
    }

    /// Replaces the pause implementation.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Returns a reference to the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn options(&self, format: &str, folder: &Path, postprocessors: Vec<PostProcessor>) -> DownloadOptions {
        DownloadOptions {
            format: format.to_string(),
            output_template: folder.join(OUTPUT_TEMPLATE),
            socket_timeout: SOCKET_TIMEOUT,
            retries: RETRIES,
            fragment_retries: FRAGMENT_RETRIES,
            postprocessors,
            quiet: true,
            no_warnings: true,
        }
    }

    /// Downloads one URL as MP4 into `folder`.
    ///
    /// # Arguments
    /// * `url` - Video URL handed to the engine
    /// * `folder` - Destination directory
    /// * `out` - Operator console
    ///
    /// # Returns
    /// * `Dispatch::Completed` carrying the engine's filename and title
    /// * `Dispatch::Unavailable` / `Dispatch::Failed` after logging and
    ///   reporting the failure to the operator
    ///
    /// # Errors
    /// Only if writing to `out` fails.
    #[instrument(skip(self, out))]
    pub async fn download_video(&self, url: &str, folder: &Path, out: &mut dyn Write) -> Result<Dispatch> {
        info!("Downloading video from: {}", url);
        let options = self.options(self.config.mp4_quality(), folder, Vec::new());

        match self.engine.download(url, &options).await {
            Ok(media) => {
                let title = media.title.as_deref().unwrap_or("video");
                let id = media.id.as_deref().unwrap_or("-");
                match &media.filename {
                    Some(filename) => info!("Successfully downloaded [{}]: {}", id, filename.display()),
                    None => info!("Successfully downloaded [{}]: {}", id, title),
                }
                writeln!(out, "Downloaded: {}", title)?;
                Ok(Dispatch::Completed(media))
            }
            Err(EngineError::Unavailable(detail)) => {
                error!("Invalid YouTube URL or unavailable: {} ({})", url, detail);
                writeln!(out, "Invalid or unavailable URL")?;
                Ok(Dispatch::Unavailable)
            }
            Err(e) => {
                error!(error = ?e, "Error downloading video from {}: {}", url, e);
                writeln!(out, "Error downloading: {}", e)?;
                Ok(Dispatch::Failed(e.to_string()))
            }
        }
    }

    /// Downloads one URL and has the engine transcode it to MP3.
    ///
    /// Audio does not depend on the picture, so the cheapest stream the
    /// configured selector allows is good enough.
    #[instrument(skip(self, out))]
    pub async fn convert_to_mp3(&self, url: &str, folder: &Path, out: &mut dyn Write) -> Result<Dispatch> {
        info!("Extracting MP3 from: {}", url);
        write!(out, "Extracting MP3...")?;
        out.flush()?;

        let extract = PostProcessor::ExtractAudio {
            codec: AUDIO_CODEC.to_string(),
            quality: AUDIO_BITRATE.to_string(),
        };
        let options = self.options(self.config.mp3_quality(), folder, vec![extract]);

        match self.engine.download(url, &options).await {
            Ok(media) => {
                let title = media.title.as_deref().unwrap_or("audio");
                info!(
                    "Successfully extracted MP3 [{}]: {}",
                    media.id.as_deref().unwrap_or("-"),
                    title
                );
                writeln!(out, " Extracted: {}", title)?;
                Ok(Dispatch::Completed(media))
            }
            Err(EngineError::Unavailable(detail)) => {
                error!("Invalid YouTube URL or unavailable: {} ({})", url, detail);
                writeln!(out, " Invalid or unavailable URL")?;
                Ok(Dispatch::Unavailable)
            }
            Err(e) => {
                error!(error = ?e, "Error extracting MP3 from {}: {}", url, e);
                writeln!(out, " Error: {}", e)?;
                Ok(Dispatch::Failed(e.to_string()))
            }
        }
    }

    /// Processes every URL of a delimiter-joined list, in order
    ///
    /// # Arguments
    /// * `urls` - Operator input, joined by the configured delimiter
    /// * `file_format` - Selected extension; the audio one means MP3 extraction
    /// * `folder` - Destination directory
    /// * `out` - Operator console
    ///
    /// # Returns
    /// * `BatchProgress` - Tally of the batch, with `aborted` set if it stopped early
    ///
    /// # Details
    /// * Routes each URL to [`Self::convert_to_mp3`] when `file_format` is the
    ///   audio extension, to [`Self::download_video`] otherwise
    /// * Pauses for a random [`PAUSE_SECONDS`] interval between two downloads
    /// * A failed URL is recorded and the batch moves on; a console failure
    ///   stops the batch
    /// * Failed URLs are appended to the failure report afterwards
    pub async fn download_videos(
        &self,
        urls: &str,
        file_format: &str,
        folder: &Path,
        out: &mut dyn Write,
    ) -> BatchProgress {
        let batch = UrlBatch::parse(urls, self.config.delimiter);
        let mut progress = BatchProgress::new(batch.total());

        if let Err(e) = self
            .process_batch(&batch, file_format, folder, out, &mut progress)
            .await
        {
            error!(error = ?e, "Error in download_videos: {}", e);
            eprintln!("  Error processing URLs: {}", e);
            progress.aborted = Some(e.to_string());
        }

        info!("{}", progress.summary());
        let report = self.config.logs_directory.join(FAILURE_REPORT);
        if let Err(e) = progress.export_failures(&report) {
            warn!("Could not write failure report {}: {}", report.display(), e);
        }

        progress
    }

    async fn process_batch(
        &self,
        batch: &UrlBatch,
        file_format: &str,
        folder: &Path,
        out: &mut dyn Write,
        progress: &mut BatchProgress,
    ) -> Result<()> {
        info!("Processing {} URL(s)", batch.total());
        writeln!(out, "\n  Processing {} video(s)...\n", batch.total())?;

        let urls: Vec<(usize, &str)> = batch.urls().collect();
        for (n, (position, url)) in urls.iter().enumerate() {
            write!(out, "  [{}/{}] ", position, batch.total())?;

            let dispatch = if self.config.is_audio(file_format) {
                self.convert_to_mp3(url, folder, out).await?
            } else {
                self.download_video(url, folder, out).await?
            };

            match dispatch {
                Dispatch::Completed(_) => progress.record_success(),
                Dispatch::Unavailable => progress.record_failure(url, "Invalid or unavailable URL"),
                Dispatch::Failed(reason) => progress.record_failure(url, reason),
            }

            if n + 1 < urls.len() {
                let pause = random_pause();
                info!("Waiting {} seconds before next download...", pause.as_secs());
                self.sleeper.sleep(pause).await;
            }
        }

        writeln!(out, "\n  {}", progress.summary())?;
        Ok(())
    }

    /// Resolves a playlist to its watch URLs and downloads them as a batch.
    ///
    /// # Arguments
    /// * `url` - Playlist URL
    /// * `file_format` - Selected extension, as for [`Self::download_videos`]
    /// * `folder` - Destination directory
    /// * `out` - Operator console
    ///
    /// # Returns
    /// * `Some(progress)` of the batch
    /// * `None` if the playlist could not be resolved; nothing is downloaded
    ///
    /// # Errors
    /// Only if writing to `out` fails before the batch starts.
    #[instrument(skip(self, out))]
    pub async fn download_playlist(
        &self,
        url: &str,
        file_format: &str,
        folder: &Path,
        out: &mut dyn Write,
    ) -> Result<Option<BatchProgress>> {
        info!("Loading playlist: {}", url);

        let playlist = match self.engine.resolve_playlist(url).await {
            Ok(playlist) => playlist,
            Err(e) => {
                error!(error = ?e, "Error loading playlist {}: {}", url, e);
                writeln!(out, "  Error loading playlist: {}", e)?;
                return Ok(None);
            }
        };

        let video_urls = playlist.watch_urls();
        writeln!(
            out,
            "\n  Playlist: {}",
            playlist.title.as_deref().unwrap_or("Playlist")
        )?;
        writeln!(out, "  Videos in playlist: {}\n", video_urls.len())?;
        info!("Playlist loaded with {} videos", video_urls.len());

        let joined = video_urls.join(&self.config.delimiter.to_string());
        Ok(Some(self.download_videos(&joined, file_format, folder, out).await))
    }
}
