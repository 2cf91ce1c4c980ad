//! Resume Tailor - résumé structuring and optimization through AI command-line agents.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use resume_tailor::ai::{
    AiError, CliSetup, JobRequirements, Provider, ResumeTailor, StreamChunk, StructuredResume,
};
use resume_tailor::config::{ConfigError, ConfigLoader, ProviderKind, TailorConfig};
use resume_tailor::display;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProviderArg {
    Codex,
    Claude,
}

impl From<ProviderArg> for ProviderKind {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Codex => ProviderKind::Codex,
            ProviderArg::Claude => ProviderKind::Claude,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "resume-tailor",
    about = "Structure résumés and tailor them to job descriptions with AI agents",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (defaults to .resume-tailor.toml, then the user config dir).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// AI backend, overriding the configuration.
    #[arg(long, value_enum, global = true)]
    provider: Option<ProviderArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Turn a plain-text résumé into structured JSON.
    Structure {
        /// Text file containing the résumé.
        file: PathBuf,
    },
    /// Extract requirements from a job description.
    ExtractJob {
        /// Text file containing the job description.
        file: PathBuf,
    },
    /// Score a structured résumé against job requirements and rewrite it.
    Optimize {
        /// JSON file produced by `structure`.
        #[arg(long)]
        resume: PathBuf,
        /// JSON file produced by `extract-job`.
        #[arg(long)]
        job: PathBuf,
    },
    /// Check that the AI backend answers.
    TestConnection,
    /// Install and authenticate the AI backend CLI.
    Setup {
        #[command(subcommand)]
        action: SetupAction,
    },
}

#[derive(Subcommand)]
enum SetupAction {
    /// Check whether the backend CLI is on PATH.
    Check,
    /// Install the backend CLI with npm.
    Install,
    /// Log in to the backend.
    Login,
    /// Show whether the backend has a stored login.
    Status,
}

#[derive(Error, Debug)]
enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Ai(#[from] AiError),
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid JSON in {path}: {source}")]
    Input {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to write result: {0}")]
    Output(#[from] serde_json::Error),
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(cli: &Cli) -> Result<TailorConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => ConfigLoader::load_from_path(path)?,
        None => ConfigLoader::new().load()?,
    };
    if let Some(provider) = cli.provider {
        config.ai.provider = provider.into();
    }
    Ok(config)
}

async fn read_text(path: &Path) -> Result<String, CommandError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CommandError::Read {
            path: path.to_path_buf(),
            source,
        })
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CommandError> {
    let text = read_text(path).await?;
    serde_json::from_str(&text).map_err(|source| CommandError::Input {
        path: path.to_path_buf(),
        source,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CommandError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn optimize(
    tailor: &ResumeTailor,
    resume_path: &Path,
    job_path: &Path,
) -> Result<(), CommandError> {
    let resume: StructuredResume = read_json(resume_path).await?;
    let job: JobRequirements = read_json(job_path).await?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(chunk) = rx.recv().await {
            match chunk {
                StreamChunk::Content { content } => display::print_chunk(&content),
                StreamChunk::Done => eprintln!(),
                StreamChunk::Error { .. } => {}
            }
        }
    });

    let result = tailor.optimize(&resume, &job, &tx).await;
    drop(tx);
    let _ = printer.await;

    let result = result?;
    display::print_optimization_summary(&result);
    print_json(&result)
}

async fn run_setup(action: SetupAction, config: &TailorConfig) -> bool {
    let setup = CliSetup::from_config(config);
    match action {
        SetupAction::Check => {
            let installed = setup.is_installed().await;
            display::print_install_status(config.ai.program(), installed);
            installed
        }
        SetupAction::Install => {
            let outcome = setup.install(&mut display::print_progress).await;
            display::print_setup_outcome(&outcome);
            outcome.success
        }
        SetupAction::Login => {
            let outcome = setup.login().await;
            display::print_setup_outcome(&outcome);
            outcome.success
        }
        SetupAction::Status => {
            let status = setup.auth_status().await;
            display::print_auth_status(status);
            status.authenticated
        }
    }
}

async fn run(cli: Cli) -> Result<bool, CommandError> {
    let config = load_config(&cli)?;
    tracing::debug!(provider = ?config.ai.provider, program = config.ai.program(), "Configuration loaded");

    let tailor = ResumeTailor::new(Provider::from_config(&config.ai));

    match cli.command {
        Commands::Structure { file } => {
            let text = read_text(&file).await?;
            print_json(&tailor.structure_resume(&text).await?)?;
        }
        Commands::ExtractJob { file } => {
            let text = read_text(&file).await?;
            print_json(&tailor.extract_job(&text).await?)?;
        }
        Commands::Optimize { resume, job } => optimize(&tailor, &resume, &job).await?,
        Commands::TestConnection => {
            let connected = tailor.test_connection().await;
            display::print_connection_test(config.ai.provider.display_name(), connected);
            return Ok(connected);
        }
        Commands::Setup { action } => return Ok(run_setup(action, &config).await),
    }

    Ok(true)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            display::print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
