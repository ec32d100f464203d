use thiserror::Error;

/// Failure taxonomy for the exchange pipeline.
///
/// Every core-level failure is returned as a value of this type; nothing in
/// the encryption/decryption path panics or throws across a boundary. The
/// decryption-stage variants (`MalformedEnvelope`, `UnsupportedAlgorithm`,
/// `KeyMismatch`, `AuthenticationFailed`) carry the specific reason for
/// diagnostics even though callers treat them identically at the top level.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Key material could not be read or parsed, or is the wrong type/size.
    /// Fatal: no operation can proceed without a valid key.
    #[error("invalid key material: {0}")]
    Key(String),

    /// Network failure or non-2xx status on the token or business call.
    /// Reported, never retried by the core.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The string does not have the shape of a compact JWE.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(&'static str),

    /// The protected header declares an algorithm this client does not
    /// implement. A mismatch is a hard failure, not a silent pass-through.
    #[error("unsupported algorithm [{0}]")]
    UnsupportedAlgorithm(String),

    /// The encrypted key could not be unwrapped with the caller's private key.
    #[error("encrypted key does not match the decryption key")]
    KeyMismatch,

    /// AEAD tag verification failed; partial plaintext has been discarded.
    #[error("authentication tag didn't verify")]
    AuthenticationFailed,

    /// The payload is not representable as the declared content type.
    #[error("payload encoding error: {0}")]
    Encoding(String),
}

impl From<reqwest::Error> for ExchangeError {
    fn from(e: reqwest::Error) -> Self {
        ExchangeError::Transport(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ExchangeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_reason() {
        let e = ExchangeError::MalformedEnvelope("expected 5 segments");
        assert!(e.to_string().contains("expected 5 segments"));
        let e = ExchangeError::UnsupportedAlgorithm("RSA1_5".into());
        assert!(e.to_string().contains("RSA1_5"));
    }
}
