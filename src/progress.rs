use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

/// Tally of one batch run.
///
/// Counts dispatched, successful and failed URLs and remembers why each
/// failure happened so it can be exported after the batch.
///
/// # Examples
///
/// ```
/// use tubefetch::BatchProgress;
///
/// let mut progress = BatchProgress::new(2);
/// progress.record_success();
/// progress.record_failure("https://example.com/x", "Invalid or unavailable URL");
/// assert_eq!(progress.succeeded, 1);
/// assert_eq!(progress.failed(), 1);
/// ```
#[derive(Debug)]
pub struct BatchProgress {
    /// Number of pieces the input split into, empty ones included.
    pub total: usize,
    pub dispatched: usize,
    pub succeeded: usize,
    pub start_time: Instant,
    /// Set when the batch stopped before reaching its last URL.
    pub aborted: Option<String>,
    failed_urls: Vec<(String, String)>, // (URL, reason)
}

impl BatchProgress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            dispatched: 0,
            succeeded: 0,
            start_time: Instant::now(),
            aborted: None,
            failed_urls: Vec::new(),
        }
    }

    pub fn record_success(&mut self) {
        self.dispatched += 1;
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self, url: &str, reason: impl Into<String>) {
        self.dispatched += 1;
        self.failed_urls.push((url.to_string(), reason.into()));
    }

    pub fn failed(&self) -> usize {
        self.failed_urls.len()
    }

    pub fn failures(&self) -> &[(String, String)] {
        &self.failed_urls
    }

    pub fn summary(&self) -> String {
        format!(
            "Finished in {:.1}s - successful: {}, failed: {}",
            self.start_time.elapsed().as_secs_f64(),
            self.succeeded,
            self.failed()
        )
    }

    /// Appends the failed URLs to `path` under a timestamped header.
    ///
    /// Does nothing when every dispatch succeeded.
    pub fn export_failures(&self, path: &Path) -> std::io::Result<()> {
        if self.failed_urls.is_empty() {
            return Ok(());
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = std::io::BufWriter::new(file);

        writeln!(
            writer,
            "\n=== Failed Downloads Report {} ===",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        )?;

        for (url, reason) in &self.failed_urls {
            writeln!(writer, "URL: {}", url)?;
            writeln!(writer, "Error: {}", reason)?;
            writeln!(writer, "---")?;
        }

        writer.flush()?;
        Ok(())
    }
}
