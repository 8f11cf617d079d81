use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tubefetch::config::{CONFIG_PATH, DEFAULT_LOGS_DIRECTORY};
use tubefetch::session::default_downloads_folder;
use tubefetch::{logging, Config, Downloader, Session, SessionOutcome, YtDlpEngine};

/// Configuration could not be loaded.
const EXIT_CONFIG: u8 = 1;
/// Anything unexpected outside a single download.
const EXIT_UNEXPECTED: u8 = 2;

/// Main entry point for the application.
///
/// # Steps
/// 1. Loads `config.json`
/// 2. Initializes logging to the console and a per-run file
/// 3. Prepares the yt-dlp and ffmpeg binaries
/// 4. Runs one interactive session
///
/// # Exit codes
/// - 1 if the configuration is missing, malformed or incomplete
/// - 2 if the engine cannot be prepared or the session fails unexpectedly
/// - 0 otherwise, even when some downloads failed
#[tokio::main]
async fn main() -> ExitCode {
    let loaded = Config::load(CONFIG_PATH);

    // logging goes to the default directory when the config itself is broken
    let logs_directory = match &loaded {
        Ok(config) => config.logs_directory.clone(),
        Err(_) => PathBuf::from(DEFAULT_LOGS_DIRECTORY),
    };
    if let Err(e) = logging::init(&logs_directory) {
        eprintln!("Could not initialize logging: {}", e);
    }

    let config = match loaded {
        Ok(config) => {
            info!("Configuration loaded successfully");
            Arc::new(config)
        }
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    let engine = match YtDlpEngine::new(&config.libraries_directory).await {
        Ok(engine) => engine,
        Err(e) => {
            error!(error = ?e, "Could not prepare yt-dlp: {}", e);
            eprintln!("\n  An error occurred: {}", e);
            return ExitCode::from(EXIT_UNEXPECTED);
        }
    };
    let downloader = Downloader::new(Arc::new(engine), config);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut session = Session::new(
        &downloader,
        stdin.lock(),
        stdout.lock(),
        default_downloads_folder(),
    );

    match session.start().await {
        SessionOutcome::Completed => ExitCode::SUCCESS,
        SessionOutcome::Failed => ExitCode::from(EXIT_UNEXPECTED),
    }
}
