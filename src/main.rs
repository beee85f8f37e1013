use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use minemind::chat;
use minemind::config::Settings;
use minemind::extract::DimensionGenerator;
use minemind::logging::{tracing_sink, LogSink};
use minemind::provision::Provisioner;
use minemind::server::ApiServer;

/// Minesweeper grid setup from natural language, powered by a local LLM
#[derive(Parser, Debug)]
#[command(name = "minemind", version)]
struct Cli {
    /// Directory holding default.toml and an optional local.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download and verify the model if it is not present yet
    Fetch,
    /// Show whether the model file is present and intact
    Status,
    /// Extract grid dimensions from a request and print them as JSON
    Dimensions {
        /// Free-form request, e.g. "an expert level game"
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Interactive session that extracts dimensions from each line typed
    Chat,
    /// Serve the extraction API over HTTP
    Serve,
}

/// Installs the global subscriber. The returned guard flushes the file writer on drop.
fn init_logging(settings: &Settings) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.logging.level.to_lowercase()));

    match settings.logging.file.as_deref() {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::RollingFileAppender::new(
                tracing_appender::rolling::Rotation::DAILY,
                dir,
                "minemind",
            );
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            tracing_subscriber::fmt()
                .with_writer(non_blocking)
                // Disable ANSI colors for cleaner log files
                .with_ansi(false)
                .with_line_number(true)
                .with_file(true)
                .with_thread_ids(true)
                .with_target(false)
                .with_env_filter(filter)
                .init();
            Some(guard)
        }
        None => {
            // stdout is reserved for command output
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_env_filter(filter)
                .init();
            None
        }
    }
}

fn build_generator(
    settings: &Settings,
    sink: Arc<dyn LogSink>,
) -> Result<DimensionGenerator, Box<dyn Error + Send + Sync>> {
    let provisioner = Provisioner::http(Arc::clone(&sink))?.with_policy(settings.verify_policy());
    DimensionGenerator::from_settings(settings, &provisioner, sink)
}

fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(dir) => Settings::load_from(dir)?,
        None => Settings::new()?,
    };
    let _guard = init_logging(&settings);

    info!("minemind starting up...");
    info!("Models directory: {}", settings.models.directory.display());

    let sink = tracing_sink();

    match cli.command {
        Command::Fetch => {
            let provisioner = Provisioner::http(Arc::clone(&sink))?.with_policy(settings.verify_policy());
            let path = provisioner.ensure(&settings.artifact_spec())?;
            println!("{}", path.display());
        }
        Command::Status => {
            let spec = settings.artifact_spec();
            let state = spec.state(true)?;
            println!("{}: {}", spec.path.display(), state);
        }
        Command::Dimensions { query } => {
            let mut generator = build_generator(&settings, sink)?;
            let result = generator.generate_dimensions(&query.join(" "));
            let json = match result {
                Some(dims) => serde_json::to_string(&dims)?,
                None => "{}".to_string(),
            };
            println!("{}", json);
        }
        Command::Chat => {
            let mut generator = build_generator(&settings, sink)?;
            chat::chat_loop(&mut generator)?;
        }
        Command::Serve => {
            let generator = build_generator(&settings, sink)?;
            let server = ApiServer::new(generator, settings.server.host.clone(), settings.server.port);
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server.start())?;
        }
    }

    Ok(())
}
