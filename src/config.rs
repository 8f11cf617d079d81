//! Configuration management for the application.
//!
//! The configuration is read once at startup from a fixed JSON file and
//! then handed to every component as an immutable value.

use crate::error::ConfigError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Fixed location of the configuration file, relative to the working directory.
pub const CONFIG_PATH: &str = "config.json";

pub const DEFAULT_LOGS_DIRECTORY: &str = "logs";
pub const DEFAULT_LIBRARIES_DIRECTORY: &str = "libs";

/// Quality selectors used when `quality_formats` has no entry for a media kind.
pub const DEFAULT_MP3_QUALITY: &str = "worst";
pub const DEFAULT_MP4_QUALITY: &str = "best[ext=mp4]";

/// Format choice keys offered to the operator.
pub const AUDIO_CHOICE: &str = "1";
pub const VIDEO_CHOICE: &str = "2";

/// Configuration for the video downloader application.
///
/// # Examples
///
/// ```
/// use tubefetch::Config;
///
/// let config = Config::from_json(r#"{
///     "delimiter": ",",
///     "file_formats": {"1": ".mp3", "2": ".mp4"},
///     "quality_formats": {"mp3": "worst", "mp4": "best[ext=mp4]"}
/// }"#).unwrap();
/// assert_eq!(config.delimiter, ',');
/// assert_eq!(config.audio_extension(), ".mp3");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub delimiter: char,
    pub file_formats: BTreeMap<String, String>,
    pub quality_formats: BTreeMap<String, String>,
    pub logs_directory: PathBuf,
    pub libraries_directory: PathBuf,
}

/// On-disk shape. Every field is optional so that a missing key can be
/// reported by name instead of as a generic parse failure.
#[derive(Debug, Deserialize)]
struct RawConfig {
    delimiter: Option<String>,
    file_formats: Option<BTreeMap<String, String>>,
    quality_formats: Option<BTreeMap<String, String>>,
    logs_directory: Option<PathBuf>,
    libraries_directory: Option<PathBuf>,
}

impl Config {
    /// Reads and validates the configuration file at `path`.
    ///
    /// # Errors
    /// * `NotFound` if the file does not exist
    /// * `Malformed` if it is not valid JSON of the expected shape
    /// * `MissingKey` naming the first required key that is absent
    /// * `Invalid` if the delimiter is not exactly one character
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigError::NotFound(path.to_path_buf()),
            _ => ConfigError::Io(e),
        })?;
        Self::from_json(&content)
    }

    /// Parses and validates configuration from a JSON document.
    ///
    /// # Arguments
    /// * `content` - The raw contents of the configuration file
    ///
    /// # Errors
    /// Same as [`Config::load`], minus `NotFound`.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(content)?;

        let delimiter = raw.delimiter.ok_or(ConfigError::MissingKey("delimiter"))?;
        let mut chars = delimiter.chars();
        let delimiter = match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => {
                return Err(ConfigError::Invalid {
                    key: "delimiter",
                    reason: format!("expected a single character, got {:?}", delimiter),
                })
            }
        };

        let file_formats = raw
            .file_formats
            .ok_or(ConfigError::MissingKey("file_formats"))?;
        if !file_formats.contains_key(AUDIO_CHOICE) {
            return Err(ConfigError::MissingKey("file_formats.1"));
        }

        let quality_formats = raw
            .quality_formats
            .ok_or(ConfigError::MissingKey("quality_formats"))?;

        Ok(Self {
            delimiter,
            file_formats,
            quality_formats,
            logs_directory: raw
                .logs_directory
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOGS_DIRECTORY)),
            libraries_directory: raw
                .libraries_directory
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LIBRARIES_DIRECTORY)),
        })
    }

    /// Extension produced by the audio choice (`file_formats["1"]`).
    pub fn audio_extension(&self) -> &str {
        self.file_formats
            .get(AUDIO_CHOICE)
            .map(String::as_str)
            .unwrap_or(".mp3")
    }

    /// Maps the operator's format choice to a file extension.
    ///
    /// Anything other than a configured `"1"` or `"2"` falls back to the
    /// audio extension.
    pub fn file_format_for(&self, choice: &str) -> &str {
        match choice {
            AUDIO_CHOICE | VIDEO_CHOICE => self
                .file_formats
                .get(choice)
                .map(String::as_str)
                .unwrap_or_else(|| self.audio_extension()),
            _ => self.audio_extension(),
        }
    }

    /// Whether `file_format` is the audio extension, i.e. needs transcoding.
    pub fn is_audio(&self, file_format: &str) -> bool {
        file_format == self.audio_extension()
    }

    /// Quality selector for audio extraction, `"worst"` when unset.
    pub fn mp3_quality(&self) -> &str {
        self.quality_formats
            .get("mp3")
            .map(String::as_str)
            .unwrap_or(DEFAULT_MP3_QUALITY)
    }

    /// Quality selector for video downloads, `"best[ext=mp4]"` when unset.
    pub fn mp4_quality(&self) -> &str {
        self.quality_formats
            .get("mp4")
            .map(String::as_str)
            .unwrap_or(DEFAULT_MP4_QUALITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"{
        "delimiter": ",",
        "file_formats": {"1": ".mp3", "2": ".mp4"},
        "quality_formats": {"mp3": "worst", "mp4": "best[ext=mp4]"}
    }"#;

    #[test]
    fn loads_required_fields_verbatim() {
        let config = Config::from_json(FULL).unwrap();
        assert_eq!(config.delimiter, ',');
        assert_eq!(config.file_formats["1"], ".mp3");
        assert_eq!(config.file_formats["2"], ".mp4");
        assert_eq!(config.quality_formats["mp3"], "worst");
        assert_eq!(config.quality_formats["mp4"], "best[ext=mp4]");
        assert_eq!(config.logs_directory, PathBuf::from("logs"));
        assert_eq!(config.libraries_directory, PathBuf::from("libs"));
    }

    #[test]
    fn optional_directories_are_read() {
        let config = Config::from_json(
            r#"{
                "delimiter": ";",
                "file_formats": {"1": ".mp3"},
                "quality_formats": {},
                "logs_directory": "var/log",
                "libraries_directory": "bin"
            }"#,
        )
        .unwrap();
        assert_eq!(config.logs_directory, PathBuf::from("var/log"));
        assert_eq!(config.libraries_directory, PathBuf::from("bin"));
        assert_eq!(config.mp3_quality(), DEFAULT_MP3_QUALITY);
        assert_eq!(config.mp4_quality(), DEFAULT_MP4_QUALITY);
    }

    #[test]
    fn missing_delimiter_is_named() {
        let err = Config::from_json(
            r#"{"file_formats": {"1": ".mp3"}, "quality_formats": {}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey("delimiter")));
        assert!(err.to_string().contains("delimiter"));
    }

    #[test]
    fn missing_audio_format_is_named() {
        let err = Config::from_json(
            r#"{"delimiter": ",", "file_formats": {"2": ".mp4"}, "quality_formats": {}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey("file_formats.1")));
    }

    #[test]
    fn missing_quality_formats_is_named() {
        let err =
            Config::from_json(r#"{"delimiter": ",", "file_formats": {"1": ".mp3"}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey("quality_formats")));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = Config::from_json("{ delimiter: ").unwrap_err();
        assert!(matches!(err, ConfigError::Malformed(_)));

        let err = Config::from_json(r#"{"delimiter": 4}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed(_)));
    }

    #[test]
    fn delimiter_must_be_one_character() {
        for bad in ["\"\"", "\",,\""] {
            let json = format!(
                r#"{{"delimiter": {}, "file_formats": {{"1": ".mp3"}}, "quality_formats": {{}}}}"#,
                bad
            );
            let err = Config::from_json(&json).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { key: "delimiter", .. }));
        }
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path().join("config.json")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, FULL).unwrap();
        assert_eq!(Config::load(&path).unwrap(), Config::from_json(FULL).unwrap());
    }

    #[test]
    fn format_choice_falls_back_to_audio() {
        let config = Config::from_json(FULL).unwrap();
        assert_eq!(config.file_format_for("1"), ".mp3");
        assert_eq!(config.file_format_for("2"), ".mp4");
        assert_eq!(config.file_format_for(""), ".mp3");
        assert_eq!(config.file_format_for("3"), ".mp3");
        assert_eq!(config.file_format_for("mp4"), ".mp3");
        assert!(config.is_audio(".mp3"));
        assert!(!config.is_audio(".mp4"));
    }
}
