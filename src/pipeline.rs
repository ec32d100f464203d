//! Response handling: classify, decrypt, fall back.
//!
//! One pipeline serves every operation (process submission, result query,
//! document query, offline webhook decryption). The response body is
//! classified syntactically; envelopes are decrypted with the caller's
//! private key. Classification is only a fast path: a body that looked like
//! an envelope but fails *structurally* is downgraded to plaintext, while
//! cryptographic failures surface with their specific reason and are never
//! retried.

use crate::classify::{classify, Classification};
use crate::envelope::Envelope;
use crate::error::{ExchangeError, Result};
use crate::keys::DecryptionKey;

/// What the exchange produced for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The response was an envelope; these are the recovered payload bytes.
    Decrypted(Vec<u8>),
    /// The response was plaintext (or envelope-shaped but structurally not
    /// an envelope); passed through unmodified.
    Passthrough(String),
}

impl Outcome {
    /// The payload bytes regardless of how they were obtained.
    pub fn payload(&self) -> &[u8] {
        match self {
            Outcome::Decrypted(bytes) => bytes,
            Outcome::Passthrough(text) => text.as_bytes(),
        }
    }
}

/// Classify `response` and decrypt it if it is an envelope.
///
/// The body is trimmed first so trailing transport whitespace cannot flip
/// an envelope to plaintext. `MalformedEnvelope` after an `Encrypted`
/// classification falls through to `Passthrough`; `UnsupportedAlgorithm`,
/// `KeyMismatch` and `AuthenticationFailed` are reported as errors.
pub fn handle_response(response: &str, key: &DecryptionKey) -> Result<Outcome> {
    let body = response.trim();
    match classify(body) {
        Classification::Plaintext => {
            tracing::debug!(len = body.len(), "response classified as plaintext");
            Ok(Outcome::Passthrough(body.to_string()))
        }
        Classification::Encrypted => match Envelope::decrypt(body, key) {
            Ok(payload) => {
                tracing::debug!(len = payload.len(), "envelope decrypted");
                Ok(Outcome::Decrypted(payload))
            }
            Err(ExchangeError::MalformedEnvelope(reason)) => {
                tracing::debug!(reason, "envelope-shaped body is not an envelope");
                Ok(Outcome::Passthrough(body.to_string()))
            }
            Err(e) => {
                tracing::warn!(error = %e, "envelope decryption failed");
                Err(e)
            }
        },
    }
}
