mod commands;
mod doctor;
mod server;

use clap::{Parser, Subcommand};
use jobgen::{ConfigManager, GeneratorConfig, Orchestrator, ProcessEnv};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "jobgen", version, about = "Resume, cover letter and job post generation with provider failover")]
struct Cli {
    /// Config file (default: ~/.jobgen/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a raw prompt through the provider chain and print the reply
    Generate {
        /// Prompt text; read from stdin when omitted
        prompt: Option<String>,

        /// Print the answering provider to stderr
        #[arg(long)]
        show_provider: bool,
    },

    /// Tailor a resume to a job description (prints LaTeX)
    Resume {
        /// Profile JSON file
        #[arg(long)]
        profile: PathBuf,

        /// Job description text file
        #[arg(long)]
        job: PathBuf,

        /// Fail instead of printing the template resume
        #[arg(long)]
        no_fallback: bool,
    },

    /// Write a cover letter for a job description (prints LaTeX)
    CoverLetter {
        #[arg(long)]
        profile: PathBuf,

        #[arg(long)]
        job: PathBuf,

        #[arg(long)]
        no_fallback: bool,
    },

    /// Moderate a job board post
    ValidateJob {
        #[arg(long)]
        job: PathBuf,

        #[arg(long)]
        apply_link: Option<String>,

        #[arg(long)]
        apply_email: Option<String>,
    },

    /// Show the provider roster and which providers have credentials
    Doctor {
        /// Also send a short prompt to each configured provider
        #[arg(long)]
        live: bool,
    },

    /// Write the default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8787")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

fn config_manager(path: Option<PathBuf>) -> ConfigManager {
    match path {
        Some(p) => ConfigManager::new(p),
        None => ConfigManager::default_path(),
    }
}

fn load_orchestrator(config: &ConfigManager) -> anyhow::Result<(GeneratorConfig, Orchestrator)> {
    let cfg = config.load()?;
    let orchestrator = Orchestrator::from_config(&cfg, &ProcessEnv);
    Ok((cfg, orchestrator))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is normal.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jobgen=info,jobgen_cli=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = config_manager(cli.config);

    match cli.command {
        Commands::Generate { prompt, show_provider } => {
            let (_, orchestrator) = load_orchestrator(&config)?;
            commands::run_generate(&orchestrator, prompt, show_provider).await?;
        }
        Commands::Resume { profile, job, no_fallback } => {
            let (_, orchestrator) = load_orchestrator(&config)?;
            commands::run_resume(&orchestrator, &profile, &job, no_fallback).await?;
        }
        Commands::CoverLetter { profile, job, no_fallback } => {
            let (_, orchestrator) = load_orchestrator(&config)?;
            commands::run_cover_letter(&orchestrator, &profile, &job, no_fallback).await?;
        }
        Commands::ValidateJob { job, apply_link, apply_email } => {
            let (_, orchestrator) = load_orchestrator(&config)?;
            commands::run_validate_job(&orchestrator, &job, apply_link, apply_email).await?;
        }
        Commands::Doctor { live } => {
            let (cfg, orchestrator) = load_orchestrator(&config)?;
            doctor::run_doctor(&config, &cfg, &orchestrator, live).await?;
        }
        Commands::Init { force } => {
            commands::run_init(&config, force)?;
        }
        Commands::Serve { port, host } => {
            let (_, orchestrator) = load_orchestrator(&config)?;
            server::run_server(&host, port, orchestrator).await?;
        }
    }

    Ok(())
}
