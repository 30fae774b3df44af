use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "logsift")]
#[command(about = "Access log analyzer", long_about = None)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    Run(RunArgs),
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args, Default)]
struct RunArgs {
    /// Log file to analyze
    #[arg(long)]
    input: Option<PathBuf>,

    /// Directory for report files
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Active pattern name
    #[arg(long)]
    format: Option<String>,

    /// Lines normalized per batch
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Target timezone for timestamps
    #[arg(long)]
    timezone: Option<String>,
}

#[derive(Subcommand)]
enum ConfigAction {
    Init {
        #[arg(long)]
        stdout: bool,
    },
    Validate,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "logsift=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config_path = logsift::config::resolve_config_path(cli.config.as_deref());

    match cli.command {
        Some(Commands::Run(args)) => run(config_path, args)?,
        None => run(config_path, RunArgs::default())?,
        Some(Commands::Config { action }) => match action {
            ConfigAction::Init { stdout } => {
                logsift::cli::config::init(stdout)?;
            }
            ConfigAction::Validate => {
                logsift::cli::config::validate(config_path)?;
            }
        },
    }

    Ok(())
}

fn run(config_path: Option<PathBuf>, args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let overrides = logsift::cli::run::Overrides {
        input: args.input,
        output_dir: args.output_dir,
        format: args.format,
        chunk_size: args.chunk_size,
        timezone: args.timezone,
    };
    logsift::cli::run::run(config_path, overrides)
}
