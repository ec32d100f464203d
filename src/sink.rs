//! Result persistence.
//!
//! Recovered (or passthrough) payloads are normalized before storage: when
//! the payload parses as JSON it is re-serialized pretty-printed with
//! Unicode left unescaped; anything else is stored verbatim. The raw
//! transport body is saved separately before decryption is attempted, so a
//! later failure never costs the evidence.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Pretty-print a JSON payload, or return it unchanged when it is not JSON.
pub fn normalize(payload: &[u8]) -> Vec<u8> {
    match serde_json::from_slice::<serde_json::Value>(payload) {
        Ok(value) => serde_json::to_vec_pretty(&value).unwrap_or_else(|_| payload.to_vec()),
        Err(_) => payload.to_vec(),
    }
}

/// Persist a payload, normalized, to `path`.
pub fn persist(path: &Path, payload: &[u8]) -> Result<()> {
    let bytes = normalize(payload);
    fs::write(path, &bytes).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "result persisted");
    Ok(())
}

/// Persist a raw transport body verbatim to `path`.
pub fn persist_raw(path: &Path, body: &str) -> Result<()> {
    fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::debug!(path = %path.display(), bytes = body.len(), "raw response persisted");
    Ok(())
}
