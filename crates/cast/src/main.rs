//! `cast` - wait for the reply to an email notification
//!
//! Reads the `email` section of a JSON config file, polls the IMAP folder
//! until the reply arrives, and prints it to stdout. Logs go to stderr.
//!
//! Exit status: 0 reply printed (or zero-minute wait), 2 configuration
//! problem, 3 no reply before the deadline, 4 IMAP authentication failure.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use cast_core::{EmailConfig, ReplyWaiter, WaitRequest, message_id_for_sender, render};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Exit status for configuration problems found before waiting.
const EXIT_CONFIG: u8 = 2;

#[derive(Parser)]
#[command(name = "cast", version)]
#[command(about = "Wait for and print the reply to an email notification", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wait for the reply to a sent message
    Wait {
        /// JSON config file with an `email` section
        #[arg(short, long, default_value = "cast.json")]
        config: PathBuf,
        /// Message-ID of the sent notification
        #[arg(short, long)]
        message_id: String,
        /// Subject of the sent notification, enables subject matching
        #[arg(short, long, default_value = "")]
        subject: String,
        /// Minutes to wait (default from config)
        #[arg(short = 'w', long)]
        minutes: Option<u32>,
        /// Include HTML parts in the body
        #[arg(long)]
        full: bool,
        /// Print sender, date and subject around the body
        #[arg(short, long)]
        verbose: bool,
    },
    /// Print a fresh Message-ID for a sender address
    MessageId {
        /// Sender address, supplies the domain
        #[arg(short, long)]
        from: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cast=info,cast_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Wait {
            config,
            message_id,
            subject,
            minutes,
            full,
            verbose,
        } => {
            let config = match load_config(&config) {
                Ok(config) => config,
                Err(error) => {
                    eprintln!("Error: {error:#}");
                    return ExitCode::from(EXIT_CONFIG);
                }
            };
            let minutes = config.resolve_wait_minutes(minutes);
            let request = WaitRequest::new(&config, message_id, subject, minutes)
                .full_layout(full || config.wait_for_response_full_layout);
            wait(&config, &request, verbose).await
        }
        Commands::MessageId { from } => {
            println!("{}", message_id_for_sender(&from));
            ExitCode::SUCCESS
        }
    }
}

fn load_config(path: &std::path::Path) -> anyhow::Result<EmailConfig> {
    let config = EmailConfig::load(path)
        .with_context(|| format!("cannot load config from {}", path.display()))?;
    Ok(config.with_defaults())
}

async fn wait(config: &EmailConfig, request: &WaitRequest, verbose: bool) -> ExitCode {
    match ReplyWaiter::new(config).wait(request).await {
        Ok(Some(response)) => {
            print!("{}", render(&response, config.max_lines(), verbose));
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::debug!(?error, "Wait ended without a reply");
            eprintln!("Error: {error}");
            ExitCode::from(u8::try_from(error.exit_code()).unwrap_or(1))
        }
    }
}
