//! Syntactic classification of response bodies.
//!
//! The remote service answers either with a compact JWE envelope or with a
//! plaintext JSON/status string. Classification is a pure, cheap pre-check;
//! decryption remains authoritative, and a misclassified string is handled
//! by the pipeline's structural-failure fallthrough.

/// What shape a response string has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Looks like a 5-segment compact JWE.
    Encrypted,
    /// Raw content to be passed through as-is.
    Plaintext,
}

/// Classify a response string as envelope or plaintext.
///
/// `Encrypted` requires at least 4 `.` separators (the shape of 5
/// dot-separated segments) and every character to be base64url or a dot.
/// The alphabet check keeps ordinary prose containing four literal dots out
/// of the decryptor; a fully base64url-shaped impostor still classifies
/// `Encrypted` and is caught downstream.
pub fn classify(response: &str) -> Classification {
    let dots = response.bytes().filter(|&b| b == b'.').count();
    if dots >= 4 && !response.is_empty() && response.bytes().all(is_compact_byte) {
        Classification::Encrypted
    } else {
        Classification::Plaintext
    }
}

fn is_compact_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.')
}
