//! Compact JWE envelope construction and decryption.
//!
//! The compact serialization is five base64url segments (no padding) joined
//! with `.`: protected header, encrypted key, IV, ciphertext, authentication
//! tag. Building is structurally deterministic but never byte-for-byte
//! reproducible: a fresh CEK and IV are generated per call.

use ct_codecs::{Base64UrlSafeNoPadding, Decoder, Encoder};

use crate::content::{self, Cek};
use crate::error::{ExchangeError, Result};
use crate::header::{EnvelopeHeader, ALG_RSA_OAEP_256, ENC_A256GCM};
use crate::keys::{DecryptionKey, EncryptionKey};

/// Upper bound on the encoded protected-header segment.
pub const MAX_HEADER_LENGTH: usize = 8192;

/// Header metadata of an envelope, readable without decrypting.
///
/// Lets the caller inspect `kid`/`cty` on an inbound envelope for
/// diagnostics before (or instead of) attempting decryption.
#[derive(Debug, Clone)]
pub struct EnvelopeMetadata {
    header: EnvelopeHeader,
}

impl EnvelopeMetadata {
    pub fn algorithm(&self) -> &str {
        &self.header.algorithm
    }

    pub fn encryption(&self) -> &str {
        &self.header.encryption
    }

    pub fn key_id(&self) -> Option<&str> {
        self.header.key_id.as_deref()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header.content_type.as_deref()
    }
}

/// Compact JWE envelope operations.
pub struct Envelope;

impl Envelope {
    /// Encrypt `payload` to `recipient` with the fixed
    /// RSA-OAEP-256 / A256GCM header.
    pub fn build(payload: &[u8], recipient: &EncryptionKey) -> Result<String> {
        let mut header = EnvelopeHeader::default();
        if let Some(key_id) = recipient.key_id() {
            header.key_id = Some(key_id.to_string());
        }
        Self::build_with_header(payload, recipient, &header)
    }

    /// Encrypt `payload` to `recipient` with a caller-supplied protected
    /// header.
    ///
    /// The CEK is still wrapped with RSA-OAEP/SHA-256 regardless of the
    /// declared `alg`; overriding the header is for callers that need extra
    /// fields (`kid`, `cty`), not for algorithm negotiation.
    pub fn build_with_header(
        payload: &[u8],
        recipient: &EncryptionKey,
        header: &EnvelopeHeader,
    ) -> Result<String> {
        let header_json =
            serde_json::to_string(header).map_err(|e| ExchangeError::Encoding(e.to_string()))?;
        let header_b64 = encode(header_json.as_bytes())?;

        // Fresh CEK and IV per envelope; reuse would void the AEAD
        // confidentiality guarantee.
        let cek = Cek::generate();
        let iv = content::generate_iv();
        let encrypted_key = recipient.wrap_cek(cek.as_bytes())?;

        // AAD is the ASCII bytes of the encoded header segment.
        let (ciphertext, tag) = content::encrypt(&cek, &iv, header_b64.as_bytes(), payload)?;
        drop(cek);

        Ok(format!(
            "{}.{}.{}.{}.{}",
            header_b64,
            encode(&encrypted_key)?,
            encode(&iv)?,
            encode(&ciphertext)?,
            encode(&tag)?,
        ))
    }

    /// Decrypt a compact envelope with the caller's private key and return
    /// the payload bytes unmodified.
    ///
    /// The header must declare `RSA-OAEP-256` / `A256GCM`; anything else is
    /// a hard `UnsupportedAlgorithm` failure. The AAD is the header segment
    /// exactly as transmitted, not a re-encoding.
    pub fn decrypt(compact: &str, key: &DecryptionKey) -> Result<Vec<u8>> {
        let parts: Vec<&str> = compact.split('.').collect();
        if parts.len() != 5 {
            return Err(ExchangeError::MalformedEnvelope("expected 5 segments"));
        }
        let [header_b64, encrypted_key_b64, iv_b64, ciphertext_b64, tag_b64] =
            [parts[0], parts[1], parts[2], parts[3], parts[4]];

        let header = decode_header(header_b64)?;
        if header.algorithm != ALG_RSA_OAEP_256 {
            return Err(ExchangeError::UnsupportedAlgorithm(header.algorithm));
        }
        if header.encryption != ENC_A256GCM {
            return Err(ExchangeError::UnsupportedAlgorithm(header.encryption));
        }
        if let Some(crit) = &header.critical {
            if !crit.is_empty() {
                return Err(ExchangeError::UnsupportedAlgorithm(format!(
                    "critical extensions: {}",
                    crit.join(",")
                )));
            }
        }

        let encrypted_key = decode(encrypted_key_b64, "encrypted key segment")?;
        let iv = decode(iv_b64, "IV segment")?;
        let ciphertext = decode(ciphertext_b64, "ciphertext segment")?;
        let tag = decode(tag_b64, "authentication tag segment")?;

        let cek = Cek::from_bytes(key.unwrap_cek(&encrypted_key)?);
        content::decrypt(&cek, &iv, header_b64.as_bytes(), &ciphertext, &tag)
    }

    /// Decode the protected header of an envelope without decrypting it.
    pub fn decode_metadata(compact: &str) -> Result<EnvelopeMetadata> {
        let header_b64 = compact
            .split('.')
            .next()
            .ok_or(ExchangeError::MalformedEnvelope("empty input"))?;
        Ok(EnvelopeMetadata {
            header: decode_header(header_b64)?,
        })
    }
}

fn decode_header(header_b64: &str) -> Result<EnvelopeHeader> {
    if header_b64.len() > MAX_HEADER_LENGTH {
        return Err(ExchangeError::MalformedEnvelope("header segment too large"));
    }
    let header_bytes = decode(header_b64, "header segment")?;
    serde_json::from_slice(&header_bytes)
        .map_err(|_| ExchangeError::MalformedEnvelope("header is not valid JSON"))
}

fn encode(data: &[u8]) -> Result<String> {
    Base64UrlSafeNoPadding::encode_to_string(data)
        .map_err(|e| ExchangeError::Encoding(e.to_string()))
}

fn decode(segment: &str, what: &'static str) -> Result<Vec<u8>> {
    Base64UrlSafeNoPadding::decode_to_vec(segment, None)
        .map_err(|_| ExchangeError::MalformedEnvelope(what))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::test_key_pair;

    #[test]
    fn round_trip() {
        let sk = test_key_pair();
        let payload = br#"{"cpf":"00000000000","nome":"Test"}"#;
        let compact = Envelope::build(payload, &sk.encryption_key()).unwrap();
        assert_eq!(compact.split('.').count(), 5);
        assert_eq!(Envelope::decrypt(&compact, &sk).unwrap(), payload);
    }

    #[test]
    fn header_segment_decodes_to_fixed_contract() {
        let sk = test_key_pair();
        let compact = Envelope::build(b"x", &sk.encryption_key()).unwrap();
        let header_b64 = compact.split('.').next().unwrap();
        let header = Base64UrlSafeNoPadding::decode_to_vec(header_b64, None).unwrap();
        assert_eq!(header, br#"{"alg":"RSA-OAEP-256","enc":"A256GCM"}"#);
    }

    #[test]
    fn ciphertext_is_never_reproducible() {
        let sk = test_key_pair();
        let pk = sk.encryption_key();
        let a = Envelope::build(b"same payload", &pk).unwrap();
        let b = Envelope::build(b"same payload", &pk).unwrap();
        assert_ne!(a, b);
        assert_eq!(Envelope::decrypt(&a, &sk).unwrap(), b"same payload");
        assert_eq!(Envelope::decrypt(&b, &sk).unwrap(), b"same payload");
    }

    #[test]
    fn tampering_with_ciphertext_fails_authentication() {
        let sk = test_key_pair();
        let compact = Envelope::build(b"payload", &sk.encryption_key()).unwrap();
        let mut parts: Vec<String> = compact.split('.').map(String::from).collect();
        // Flip one character of the ciphertext segment.
        let flipped = if parts[3].starts_with('A') { "B" } else { "A" };
        parts[3].replace_range(0..1, flipped);
        let err = Envelope::decrypt(&parts.join("."), &sk).unwrap_err();
        assert!(matches!(err, ExchangeError::AuthenticationFailed));
    }

    #[test]
    fn tampering_with_tag_fails_authentication() {
        let sk = test_key_pair();
        let compact = Envelope::build(b"payload", &sk.encryption_key()).unwrap();
        let mut parts: Vec<String> = compact.split('.').map(String::from).collect();
        let flipped = if parts[4].starts_with('A') { "B" } else { "A" };
        parts[4].replace_range(0..1, flipped);
        let err = Envelope::decrypt(&parts.join("."), &sk).unwrap_err();
        assert!(matches!(err, ExchangeError::AuthenticationFailed));
    }

    #[test]
    fn wrong_key_never_yields_plaintext() {
        let sk = test_key_pair();
        let other = DecryptionKey::generate(2048).unwrap();
        let compact = Envelope::build(b"secret", &sk.encryption_key()).unwrap();
        let err = Envelope::decrypt(&compact, &other).unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::KeyMismatch | ExchangeError::AuthenticationFailed
        ));
    }

    #[test]
    fn wrong_segment_count_is_malformed() {
        let sk = test_key_pair();
        let err = Envelope::decrypt("a.b.c", &sk).unwrap_err();
        assert!(matches!(err, ExchangeError::MalformedEnvelope(_)));
        let err = Envelope::decrypt("a.b.c.d.e.f", &sk).unwrap_err();
        assert!(matches!(err, ExchangeError::MalformedEnvelope(_)));
    }

    #[test]
    fn undecodable_header_is_malformed() {
        let sk = test_key_pair();
        let err = Envelope::decrypt("!!!.b.c.d.e", &sk).unwrap_err();
        assert!(matches!(err, ExchangeError::MalformedEnvelope(_)));
    }

    #[test]
    fn foreign_algorithm_is_rejected() {
        let sk = test_key_pair();
        let header = EnvelopeHeader::new("RSA-OAEP", ENC_A256GCM);
        let compact =
            Envelope::build_with_header(b"payload", &sk.encryption_key(), &header).unwrap();
        let err = Envelope::decrypt(&compact, &sk).unwrap_err();
        assert!(matches!(err, ExchangeError::UnsupportedAlgorithm(alg) if alg == "RSA-OAEP"));
    }

    #[test]
    fn critical_extensions_are_rejected() {
        let sk = test_key_pair();
        let mut header = EnvelopeHeader::default();
        header.critical = Some(vec!["b64".into()]);
        let compact =
            Envelope::build_with_header(b"payload", &sk.encryption_key(), &header).unwrap();
        assert!(Envelope::decrypt(&compact, &sk).is_err());
    }

    #[test]
    fn metadata_exposes_kid_without_decrypting() {
        let sk = test_key_pair();
        let pk = sk.encryption_key().with_key_id("5d73719a");
        let compact = Envelope::build(b"payload", &pk).unwrap();
        let meta = Envelope::decode_metadata(&compact).unwrap();
        assert_eq!(meta.algorithm(), ALG_RSA_OAEP_256);
        assert_eq!(meta.encryption(), ENC_A256GCM);
        assert_eq!(meta.key_id(), Some("5d73719a"));
        assert_eq!(meta.content_type(), None);
    }
}
