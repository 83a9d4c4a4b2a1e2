//! Pixfeed CLI: run the transform relay and mint signed URLs from a shell.
//!
//! Reads the same environment as the API server (STORAGE_BACKEND, S3_*,
//! LOCAL_*, TRANSFORM_SERVICE_URL, ...). Results are printed as JSON on
//! stdout; failures as JSON on stderr with a non-zero exit status.

use anyhow::Context;
use clap::{Parser, Subcommand};
use pixfeed_cli::{exit_code, init_tracing, FailureOutput, ProcessOutput, SignedUrlOutput};
use pixfeed_core::{Config, ObjectKey, RelayError};
use pixfeed_services::{build_relay, TransformRelay};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "pixfeed", about = "Pixfeed transform relay CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve an uploaded object, optionally replacing it with its transformed version
    Process {
        /// Key of the uploaded object
        source: String,
        /// Key to store the transformed image under (defaults to the source key)
        #[arg(long)]
        dest: Option<String>,
        /// Run the transform service before returning the final URL
        #[arg(long)]
        transform: bool,
    },
    /// Print a signed read (GET) URL for a key
    SignRead {
        key: String,
    },
    /// Print a signed write (PUT) URL for a key
    SignWrite {
        key: String,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

/// Cancelled on Ctrl+C so an in-flight transform or upload is abandoned
fn ctrl_c_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling");
            trigger.cancel();
        }
    });
    token
}

#[derive(Serialize)]
#[serde(untagged)]
enum Output {
    Process(ProcessOutput),
    Signed(SignedUrlOutput),
}

async fn run(relay: &TransformRelay, command: Commands) -> Result<Output, RelayError> {
    let output = match command {
        Commands::Process {
            source,
            dest,
            transform,
        } => {
            let dest = dest.unwrap_or_else(|| source.clone());
            let final_ref = relay
                .process_with_cancellation(&source, &dest, transform, &ctrl_c_token())
                .await?;
            Output::Process(ProcessOutput::from(&final_ref))
        }
        Commands::SignRead { key } => {
            let key = ObjectKey::parse(key)?;
            let url = relay.signer().for_read(&key).await?;
            Output::Signed(SignedUrlOutput::from(&url))
        }
        Commands::SignWrite { key } => {
            let key = ObjectKey::parse(key)?;
            let url = relay.signer().for_write(&key).await?;
            Output::Signed(SignedUrlOutput::from(&url))
        }
    };

    Ok(output)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    let relay = build_relay(&config)?;

    match run(&relay, cli.command).await {
        Ok(output) => print_json(&output),
        Err(err) => {
            let out = serde_json::to_string(&FailureOutput::from(&err))
                .unwrap_or_else(|_| err.to_string());
            eprintln!("{}", out);
            std::process::exit(exit_code(&err));
        }
    }
}
