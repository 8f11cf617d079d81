//! Interactive console session.
//!
//! Asks the operator for a destination folder, an output format and a
//! download mode, then hands the work to the [`Downloader`].

use crate::downloader::Downloader;
use crate::error::Result;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::{error, info, warn};

const RULE_WIDTH: usize = 50;

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The session ran to its end. Individual downloads may still have failed.
    Completed,
    /// An unexpected error stopped the session early.
    Failed,
}

/// The platform's downloads folder, or `~/Downloads` when it is unknown.
pub fn default_downloads_folder() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("Downloads"))
}

/// One interactive run over an input and an output stream.
pub struct Session<'a, R, W> {
    downloader: &'a Downloader,
    input: R,
    output: W,
    default_folder: PathBuf,
}

impl<'a, R: BufRead, W: Write> Session<'a, R, W> {
    /// Creates a session.
    ///
    /// # Arguments
    /// * `downloader` - Downloader the selected mode is handed to
    /// * `input` - Operator answers, one per line
    /// * `output` - Prompts and progress
    /// * `default_folder` - Folder used when the operator answers blank
    pub fn new(downloader: &'a Downloader, input: R, output: W, default_folder: PathBuf) -> Self {
        Self {
            downloader,
            input,
            output,
            default_folder,
        }
    }

    /// Runs the session and reports any unexpected error to the operator.
    pub async fn start(&mut self) -> SessionOutcome {
        match self.run().await {
            Ok(()) => SessionOutcome::Completed,
            Err(e) => {
                error!(error = ?e, "Unexpected error in session: {}", e);
                eprintln!("\n  An error occurred: {}", e);
                SessionOutcome::Failed
            }
        }
    }

    /// Runs the prompts and the selected download mode.
    ///
    /// # Errors
    /// Returns error if:
    /// - Reading the operator's input or writing prompts fails
    /// - The download folder cannot be created
    pub async fn run(&mut self) -> Result<()> {
        let downloader = self.downloader;
        let config = downloader.config();
        let rule = "=".repeat(RULE_WIDTH);

        writeln!(self.output, "\n{}", rule)?;
        writeln!(self.output, "{}VIDEO DOWNLOADER", " ".repeat(12))?;
        writeln!(self.output, "{}", rule)?;
        info!("Application started");

        writeln!(self.output, "\n[CURRENT SETTINGS]")?;
        writeln!(self.output, "  Delimiter  : '{}'", config.delimiter)?;
        writeln!(self.output, "  Default Format : {}", config.audio_extension())?;

        writeln!(self.output, "\n[DOWNLOAD FOLDER]")?;
        writeln!(self.output, "  Default: {}", self.default_folder.display())?;
        let custom = self.prompt("  Enter custom download folder (or press Enter for default): ")?;
        let folder = if custom.is_empty() {
            self.default_folder.clone()
        } else {
            PathBuf::from(custom)
        };
        tokio::fs::create_dir_all(&folder).await?;
        info!("Download folder set to: {}", folder.display());
        writeln!(self.output, "  Download folder: {}", folder.display())?;

        writeln!(self.output, "\n[FILE FORMAT SELECTION]")?;
        writeln!(self.output, "  (1) MP3 - Audio only")?;
        writeln!(self.output, "  (2) MP4 - Video with audio")?;
        let choice = self.prompt("\n  Enter your choice (1 or 2): ")?;
        let file_format = config.file_format_for(&choice);
        info!("User selected format: {}", file_format);
        writeln!(self.output, "  Format set to {}", file_format)?;

        writeln!(self.output, "\n[DOWNLOAD MODE SELECTION]")?;
        writeln!(self.output, "  (1) Single/Multiple URLs")?;
        writeln!(self.output, "  (2) Entire Playlist")?;
        let mode = self.prompt("\n  Enter your choice (1 or 2): ")?;

        match mode.as_str() {
            "1" => {
                let d = config.delimiter;
                writeln!(self.output, "\n[SINGLE/MULTIPLE URL MODE]")?;
                writeln!(self.output, "  Enter video URL(s) to download.")?;
                writeln!(self.output, "  For multiple URLs, separate them by '{}'", d)?;
                writeln!(self.output, "  Example: URL1{} URL2{} URL3", d, d)?;
                let urls = self.prompt("\n  URL(s): ")?;

                if urls.is_empty() {
                    warn!("No URLs provided");
                    writeln!(self.output, "  No URLs entered.")?;
                } else {
                    info!("Starting download from URLs");
                    downloader
                        .download_videos(&urls, file_format, &folder, &mut self.output)
                        .await;
                }
            }
            "2" => {
                writeln!(self.output, "\n[PLAYLIST MODE]")?;
                let playlist_url = self.prompt("  Enter playlist URL: ")?;

                if playlist_url.is_empty() {
                    warn!("No playlist URL provided");
                    writeln!(self.output, "  No URL entered.")?;
                } else {
                    info!("Starting playlist download from: {}", playlist_url);
                    downloader
                        .download_playlist(&playlist_url, file_format, &folder, &mut self.output)
                        .await?;
                }
            }
            _ => {
                error!("Invalid selection");
                writeln!(self.output, "\n  Invalid choice. Please enter 1 or 2.")?;
            }
        }

        writeln!(self.output, "\n{}", rule)?;
        writeln!(self.output, "  Download process completed!")?;
        writeln!(self.output, "{}\n", rule)?;
        info!("Application session ended");

        Ok(())
    }

    /// Prints `label` and returns the trimmed answer. End of input reads as blank.
    ///
    /// # Arguments
    /// * `label` - Prompt text, printed without a trailing newline
    ///
    /// # Errors
    /// If writing the prompt or reading the answer fails
    fn prompt(&mut self, label: &str) -> Result<String> {
        write!(self.output, "{}", label)?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim().to_string())
    }
}
