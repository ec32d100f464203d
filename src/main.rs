//! CLI entry point.
//!
//! One parameterized pipeline serves every operation; the subcommands map
//! onto the remote service's endpoints plus an offline decryption mode for
//! stored webhook envelopes.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use jwe_exchange::client::ApiClient;
use jwe_exchange::config::Settings;
use jwe_exchange::envelope::Envelope;
use jwe_exchange::keys::{DecryptionKey, EncryptionKey};
use jwe_exchange::model::{Document, ProcessRequest};
use jwe_exchange::pipeline::{self, Outcome};
use jwe_exchange::sink;

#[derive(Parser)]
#[command(
    name = "jwe-exchange",
    version,
    about = "JWE-encrypted request/response exchange client"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encrypt a process submission and POST it to the remote service.
    Submit {
        /// Path to the submission payload (JSON).
        payload: PathBuf,

        /// Attach a document file to the submission.
        #[arg(long)]
        document: Option<PathBuf>,
    },

    /// Query the result of a previously submitted process.
    #[command(name = "result")]
    QueryResult {
        /// Process identifier.
        id: String,
    },

    /// Fetch a document by its identifier.
    #[command(name = "document")]
    QueryDocument {
        /// Document identifier.
        id: String,
    },

    /// Decrypt a stored envelope offline (no network).
    Decrypt {
        /// File containing the compact envelope.
        input: PathBuf,

        /// Private key used for decryption.
        #[arg(long, default_value = "private.pem")]
        key: PathBuf,

        /// Output file; defaults to the input path with a .json extension.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match Cli::parse().command {
        Command::Submit { payload, document } => submit(&payload, document.as_deref()),
        Command::QueryResult { id } => query("result_query", &id, ApiClient::query_result),
        Command::QueryDocument { id } => query("document_query", &id, ApiClient::query_document),
        Command::Decrypt { input, key, output } => decrypt_offline(&input, &key, output),
    }
}

fn submit(payload_path: &Path, document: Option<&Path>) -> Result<()> {
    let settings = Settings::from_env()?;
    // Key material first: nothing can proceed without it.
    let private_key = DecryptionKey::from_pem_file(&settings.private_key_path)?;
    let recipient = EncryptionKey::from_pem_file(&settings.public_key_path)?;

    let raw = std::fs::read(payload_path)
        .with_context(|| format!("failed to read {}", payload_path.display()))?;
    let mut request: ProcessRequest = serde_json::from_slice(&raw)
        .with_context(|| format!("{} is not a valid submission", payload_path.display()))?;
    if let Some(path) = document {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".into());
        request.process.documents.push(Document::from_file(name, path)?);
    }

    let payload = serde_json::to_vec(&request).context("failed to serialize submission")?;
    let compact = Envelope::build(&payload, &recipient)?;
    tracing::info!(bytes = compact.len(), "envelope built");

    let client = ApiClient::new(&settings)?;
    let token = client.fetch_token(&settings)?;
    let response = client.submit_process(&token, &compact)?;

    finish("process_submission", &settings, &private_key, &response)
}

fn query(
    operation: &str,
    id: &str,
    call: fn(&ApiClient, &str, &str) -> jwe_exchange::error::Result<String>,
) -> Result<()> {
    let settings = Settings::from_env()?;
    let private_key = DecryptionKey::from_pem_file(&settings.private_key_path)?;

    let client = ApiClient::new(&settings)?;
    let token = client.fetch_token(&settings)?;
    let response = call(&client, &token, id)?;

    finish(operation, &settings, &private_key, &response)
}

/// Persist the raw body, run the response pipeline, persist the outcome.
fn finish(
    operation: &str,
    settings: &Settings,
    private_key: &DecryptionKey,
    response: &str,
) -> Result<()> {
    let out_dir = Path::new(&settings.output_dir);
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    let raw_path = out_dir.join(format!("{operation}.txt"));
    sink::persist_raw(&raw_path, response)?;

    let outcome = pipeline::handle_response(response, private_key).with_context(|| {
        format!(
            "decryption failed; raw response retained at {}",
            raw_path.display()
        )
    })?;
    report(&out_dir.join(format!("{operation}.json")), &outcome)
}

fn decrypt_offline(input: &Path, key_path: &Path, output: Option<PathBuf>) -> Result<()> {
    let private_key = DecryptionKey::from_pem_file(key_path)?;
    let body = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;

    let outcome = pipeline::handle_response(&body, &private_key)?;
    let output = output.unwrap_or_else(|| input.with_extension("json"));
    report(&output, &outcome)
}

fn report(path: &Path, outcome: &Outcome) -> Result<()> {
    match outcome {
        Outcome::Decrypted(_) => tracing::info!("response decrypted"),
        Outcome::Passthrough(_) => tracing::info!("response was not encrypted"),
    }
    sink::persist(path, outcome.payload())?;
    println!("{}", String::from_utf8_lossy(outcome.payload()));
    Ok(())
}
