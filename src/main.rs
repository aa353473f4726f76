// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use photoshot::app::CaptureController;
use photoshot::backends::camera::types::{CameraBackendType, CameraFacing};
use photoshot::backends::camera::{self, CameraBackend};
use photoshot::backends::library::DirectoryLibrary;
use photoshot::config::Config;
use photoshot::flash::FlashMode;
use photoshot::storage;
use std::path::PathBuf;
use std::sync::Arc;

mod cli;

#[derive(Parser)]
#[command(name = "photoshot")]
#[command(about = "Single-screen camera: preview, capture and save photos")]
#[command(version = photoshot::constants::app_info::version())]
#[command(subcommand_required = false)]
struct Cli {
    /// Use the synthetic test-pattern camera
    #[arg(long = "virtual", global = true)]
    use_virtual: bool,

    /// Config file (default: ~/.config/photoshot/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    List,

    /// Take a photo
    Photo {
        /// Camera facing (front or back)
        #[arg(long, default_value = "back")]
        facing: CameraFacing,

        /// Capture RAW (DNG) when the camera supports it
        #[arg(long)]
        raw: bool,

        /// Flash mode (off, on, auto)
        #[arg(long, default_value = "off")]
        flash: FlashMode,

        /// Output file, or library directory (default: ~/Pictures/PhotoShot)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // The terminal UI owns stdout, so its logs go to a file
    init_logging(cli.command.is_none());

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let backend_type = if cli.use_virtual {
        CameraBackendType::Virtual
    } else {
        config.backend
    };
    let backend: Arc<dyn CameraBackend> = Arc::from(camera::get_backend(backend_type));

    match cli.command {
        Some(Commands::List) => cli::list_cameras(backend.as_ref())?,
        Some(Commands::Photo {
            facing,
            raw,
            flash,
            output,
        }) => cli::take_photo(
            backend.as_ref(),
            &config,
            cli::PhotoOptions {
                facing,
                raw,
                flash,
                output,
            },
        )?,
        None => run_terminal(backend, &config)?,
    }
    Ok(())
}

fn run_terminal(
    backend: Arc<dyn CameraBackend>,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    let library = Arc::new(DirectoryLibrary::new(config.library_dir()));
    let controller = CaptureController::new(backend, library, runtime.handle().clone(), config);
    photoshot::terminal::run(controller)
}

/// Initialize tracing; `RUST_LOG` controls the level (default `warn`)
///
/// Examples: RUST_LOG=debug, RUST_LOG=photoshot=debug
fn init_logging(to_file: bool) {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };

    if to_file {
        let dir = storage::log_dir();
        let name = format!("photoshot-{}.log", chrono::Local::now().format("%Y%m%d-%H%M%S"));
        // Without a log file the UI runs silently
        if let Ok(file) =
            std::fs::create_dir_all(&dir).and_then(|_| std::fs::File::create(dir.join(name)))
        {
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        return;
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();
}
