//! RSA key material for the exchange.
//!
//! The caller holds one asymmetric key pair: the remote counterparty's
//! public key encrypts outbound envelopes, the caller's own private key
//! decrypts inbound ones. Keys are loaded once from PEM (or DER) and are
//! immutable for the rest of the run. A private key is never required to
//! encrypt; a public key never decrypts.

use std::path::Path;

use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

use crate::content::CEK_LEN;
use crate::error::{ExchangeError, Result};

const MIN_RSA_MODULUS_BITS: usize = 2048;

/// RSA public key used to wrap content-encryption keys (RSA-OAEP-256).
#[derive(Debug, Clone)]
pub struct EncryptionKey {
    pk: RsaPublicKey,
    key_id: Option<String>,
}

impl EncryptionKey {
    /// Parse a PEM-encoded public key (SPKI or PKCS#1).
    pub fn from_pem(pem: &str) -> Result<Self> {
        let pem = pem.trim();
        let pk = RsaPublicKey::from_public_key_pem(pem)
            .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
            .map_err(|e| ExchangeError::Key(e.to_string()))?;
        validate_modulus(pk.size())?;
        Ok(EncryptionKey { pk, key_id: None })
    }

    /// Parse a DER-encoded public key (SPKI or PKCS#1).
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let pk = RsaPublicKey::from_public_key_der(der)
            .or_else(|_| RsaPublicKey::from_pkcs1_der(der))
            .map_err(|e| ExchangeError::Key(e.to_string()))?;
        validate_modulus(pk.size())?;
        Ok(EncryptionKey { pk, key_id: None })
    }

    /// Load a PEM-encoded public key from a file.
    pub fn from_pem_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let pem = std::fs::read_to_string(path)
            .map_err(|e| ExchangeError::Key(format!("{}: {e}", path.display())))?;
        Self::from_pem(&pem)
    }

    /// Set the key ID carried in outbound protected headers.
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    pub fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    /// Wrap a content-encryption key under this public key using RSA-OAEP
    /// with SHA-256.
    pub fn wrap_cek(&self, cek: &[u8]) -> Result<Vec<u8>> {
        self.pk
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), cek)
            .map_err(|e| ExchangeError::Key(e.to_string()))
    }
}

/// RSA private key used to unwrap content-encryption keys (RSA-OAEP-256).
#[derive(Clone)]
pub struct DecryptionKey {
    sk: RsaPrivateKey,
    key_id: Option<String>,
}

impl std::fmt::Debug for DecryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptionKey")
            .field("key_id", &self.key_id)
            .field("modulus_bits", &(self.sk.size() * 8))
            .finish_non_exhaustive()
    }
}

impl DecryptionKey {
    /// Parse a PEM-encoded private key (PKCS#8 or PKCS#1).
    pub fn from_pem(pem: &str) -> Result<Self> {
        let pem = pem.trim();
        let sk = RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map_err(|e| ExchangeError::Key(e.to_string()))?;
        Self::prepare(sk)
    }

    /// Parse a DER-encoded private key (PKCS#8 or PKCS#1).
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let sk = RsaPrivateKey::from_pkcs8_der(der)
            .or_else(|_| RsaPrivateKey::from_pkcs1_der(der))
            .map_err(|e| ExchangeError::Key(e.to_string()))?;
        Self::prepare(sk)
    }

    /// Load a PEM-encoded private key from a file.
    pub fn from_pem_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let pem = std::fs::read_to_string(path)
            .map_err(|e| ExchangeError::Key(format!("{}: {e}", path.display())))?;
        Self::from_pem(&pem)
    }

    /// Generate a fresh key pair. Intended for tests and tooling.
    pub fn generate(modulus_bits: usize) -> Result<Self> {
        match modulus_bits {
            2048 | 3072 | 4096 => {}
            _ => {
                return Err(ExchangeError::Key(format!(
                    "unsupported RSA modulus: {modulus_bits}"
                )))
            }
        }
        let sk = RsaPrivateKey::new(&mut OsRng, modulus_bits)
            .map_err(|e| ExchangeError::Key(e.to_string()))?;
        Self::prepare(sk)
    }

    fn prepare(mut sk: RsaPrivateKey) -> Result<Self> {
        sk.validate().map_err(|e| ExchangeError::Key(e.to_string()))?;
        sk.precompute()
            .map_err(|e| ExchangeError::Key(e.to_string()))?;
        validate_modulus(sk.size())?;
        Ok(DecryptionKey { sk, key_id: None })
    }

    /// Derive the public encryption key for this key pair.
    pub fn encryption_key(&self) -> EncryptionKey {
        EncryptionKey {
            pk: self.sk.to_public_key(),
            key_id: self.key_id.clone(),
        }
    }

    /// Set the key ID.
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    pub fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    /// Unwrap the encrypted-key segment with RSA-OAEP/SHA-256.
    ///
    /// OAEP decryption with the wrong private key fails rather than
    /// returning garbage, so a failure here maps to `KeyMismatch`. The
    /// recovered key must be a valid A256GCM key.
    pub fn unwrap_cek(&self, encrypted_key: &[u8]) -> Result<Vec<u8>> {
        let cek = self
            .sk
            .decrypt(Oaep::new::<Sha256>(), encrypted_key)
            .map_err(|_| ExchangeError::KeyMismatch)?;
        if cek.len() != CEK_LEN {
            return Err(ExchangeError::KeyMismatch);
        }
        Ok(cek)
    }
}

fn validate_modulus(modulus_bytes: usize) -> Result<()> {
    let bits = modulus_bytes * 8;
    if bits < MIN_RSA_MODULUS_BITS {
        return Err(ExchangeError::Key(format!(
            "RSA modulus too small: {bits} bits"
        )));
    }
    Ok(())
}
