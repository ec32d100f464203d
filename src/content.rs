//! A256GCM content encryption.
//!
//! The exchange contract fixes content encryption to AES-256-GCM (RFC 7518
//! section 5.3): 256-bit content-encryption key, 96-bit IV, 128-bit
//! authentication tag. The base64url-encoded protected header is
//! authenticated as AAD, so tampering with the algorithm choice is caught by
//! tag verification.

use aes_gcm::aead::KeyInit;
use aes_gcm::{AeadInPlace, Aes256Gcm, Nonce, Tag};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroize;

use crate::error::{ExchangeError, Result};

/// Byte length of an A256GCM content-encryption key.
pub const CEK_LEN: usize = 32;

/// Byte length of a GCM initialization vector (96 bits).
pub const IV_LEN: usize = 12;

/// Byte length of a GCM authentication tag (128 bits).
pub const TAG_LEN: usize = 16;

/// A content-encryption key that is zeroized on drop.
///
/// A fresh CEK is generated per envelope and must never be reused with the
/// same IV.
pub struct Cek {
    key: Vec<u8>,
}

impl Cek {
    /// Generate a fresh random CEK from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut key = vec![0u8; CEK_LEN];
        OsRng.fill_bytes(&mut key);
        Cek { key }
    }

    /// Wrap recovered key bytes (e.g. an unwrapped encrypted-key segment).
    pub fn from_bytes(key: Vec<u8>) -> Self {
        Cek { key }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }
}

impl Drop for Cek {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

/// Generate a fresh random 96-bit IV from the OS CSPRNG.
pub fn generate_iv() -> Vec<u8> {
    let mut iv = vec![0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);
    iv
}

/// Encrypt `plaintext` under `cek`/`iv`, authenticating `aad`.
///
/// Returns `(ciphertext, tag)` with the tag detached, as the compact
/// serialization carries it in its own segment.
pub fn encrypt(cek: &Cek, iv: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
    let cipher = cipher_for(cek)?;
    if iv.len() != IV_LEN {
        return Err(ExchangeError::Key("IV must be 96 bits".into()));
    }

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(iv), aad, &mut buffer)
        .map_err(|_| ExchangeError::Encoding("content encryption failed".into()))?;

    Ok((buffer, tag.to_vec()))
}

/// Verify `tag` and decrypt `ciphertext`.
///
/// Tag verification is mandatory; on mismatch the partially decrypted buffer
/// is discarded and `AuthenticationFailed` is returned.
pub fn decrypt(cek: &Cek, iv: &[u8], aad: &[u8], ciphertext: &[u8], tag: &[u8]) -> Result<Vec<u8>> {
    let cipher = cipher_for(cek)?;
    if iv.len() != IV_LEN {
        return Err(ExchangeError::MalformedEnvelope("IV must be 96 bits"));
    }
    if tag.len() != TAG_LEN {
        return Err(ExchangeError::MalformedEnvelope(
            "authentication tag must be 128 bits",
        ));
    }

    let mut buffer = ciphertext.to_vec();
    cipher
        .decrypt_in_place_detached(Nonce::from_slice(iv), aad, &mut buffer, Tag::from_slice(tag))
        .map_err(|_| ExchangeError::AuthenticationFailed)?;

    Ok(buffer)
}

fn cipher_for(cek: &Cek) -> Result<Aes256Gcm> {
    Aes256Gcm::new_from_slice(cek.as_bytes())
        .map_err(|_| ExchangeError::Key(format!("content key must be {CEK_LEN} bytes")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let cek = Cek::generate();
        let iv = generate_iv();
        let aad = b"eyJhbGciOiJSU0EtT0FFUC0yNTYiLCJlbmMiOiJBMjU2R0NNIn0";
        let plaintext = b"{\"status\":\"ok\"}";

        let (ciphertext, tag) = encrypt(&cek, &iv, aad, plaintext).unwrap();
        let decrypted = decrypt(&cek, &iv, aad, &ciphertext, &tag).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let cek = Cek::generate();
        let iv = generate_iv();
        let (mut ciphertext, tag) = encrypt(&cek, &iv, b"aad", b"payload").unwrap();
        ciphertext[0] ^= 0xff;
        let err = decrypt(&cek, &iv, b"aad", &ciphertext, &tag).unwrap_err();
        assert!(matches!(err, ExchangeError::AuthenticationFailed));
    }

    #[test]
    fn tampered_tag_fails() {
        let cek = Cek::generate();
        let iv = generate_iv();
        let (ciphertext, mut tag) = encrypt(&cek, &iv, b"aad", b"payload").unwrap();
        tag[0] ^= 0x01;
        let err = decrypt(&cek, &iv, b"aad", &ciphertext, &tag).unwrap_err();
        assert!(matches!(err, ExchangeError::AuthenticationFailed));
    }

    #[test]
    fn tampered_aad_fails() {
        let cek = Cek::generate();
        let iv = generate_iv();
        let (ciphertext, tag) = encrypt(&cek, &iv, b"aad", b"payload").unwrap();
        let err = decrypt(&cek, &iv, b"other", &ciphertext, &tag).unwrap_err();
        assert!(matches!(err, ExchangeError::AuthenticationFailed));
    }

    #[test]
    fn wrong_key_fails() {
        let cek = Cek::generate();
        let other = Cek::generate();
        let iv = generate_iv();
        let (ciphertext, tag) = encrypt(&cek, &iv, b"aad", b"payload").unwrap();
        let err = decrypt(&other, &iv, b"aad", &ciphertext, &tag).unwrap_err();
        assert!(matches!(err, ExchangeError::AuthenticationFailed));
    }

    #[test]
    fn short_key_rejected() {
        let cek = Cek::from_bytes(vec![0u8; 16]);
        let iv = generate_iv();
        assert!(encrypt(&cek, &iv, b"", b"x").is_err());
    }
}
