//! adaptest CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;
mod display;

#[derive(Parser)]
#[command(
    name = "adaptest",
    version,
    about = "Adaptive multiple-choice quizzes generated from your study material"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a question bank from a document
    Generate {
        /// Study material (plain text or PDF)
        #[arg(long)]
        document: PathBuf,

        /// Where to write the question bank
        #[arg(long, default_value = "question-bank.json")]
        output: PathBuf,

        /// Model to use (defaults to the configured default model)
        #[arg(long)]
        model: Option<String>,

        /// Provider name from the config (defaults to the configured default provider)
        #[arg(long)]
        provider: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate a question bank file
    Validate {
        /// Path to the question bank JSON
        #[arg(long)]
        bank: PathBuf,
    },

    /// Take an adaptive test interactively
    Take {
        /// Question bank JSON to quiz from
        #[arg(long, conflicts_with = "document", required_unless_present = "document")]
        bank: Option<PathBuf>,

        /// Generate a fresh bank from this document first
        #[arg(long)]
        document: Option<PathBuf>,

        /// Output directory for session reports (defaults to the configured output_dir)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Report formats to save: json, html, markdown, all
        #[arg(long, default_value = "json")]
        format: String,

        /// Do not save session reports
        #[arg(long)]
        no_save: bool,

        /// Model to use when generating from a document
        #[arg(long)]
        model: Option<String>,

        /// Provider to use when generating from a document
        #[arg(long)]
        provider: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show a saved session report
    Report {
        /// Session report JSON
        #[arg(long)]
        input: PathBuf,

        /// Output format: text, markdown, html
        #[arg(long, default_value = "text")]
        format: String,

        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// List models available from the configured providers
    ListModels {
        /// Only this provider
        #[arg(long)]
        provider: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config file
    Init,
}

#[tokio::main]
async fn main() {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("adaptest=warn".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate {
            document,
            output,
            model,
            provider,
            config,
        } => commands::generate::execute(document, output, model, provider, config).await,
        Commands::Validate { bank } => commands::validate::execute(bank),
        Commands::Take {
            bank,
            document,
            output,
            format,
            no_save,
            model,
            provider,
            config,
        } => {
            let source = match (bank, document) {
                (Some(bank), _) => commands::take::BankSource::File(bank),
                (None, Some(document)) => commands::take::BankSource::Document(document),
                (None, None) => unreachable!("clap requires --bank or --document"),
            };
            commands::take::execute(commands::take::TakeOptions {
                source,
                output,
                format,
                no_save,
                model,
                provider,
                config,
            })
            .await
        }
        Commands::Report {
            input,
            format,
            output,
        } => commands::report::execute(input, format, output),
        Commands::ListModels { provider, config } => {
            commands::list_models::execute(provider, config).await
        }
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
