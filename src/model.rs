//! Typed process-submission payload.
//!
//! Field names on the wire follow the remote service's (Portuguese)
//! contract; Rust-side names are English with serde renames. The pipeline
//! treats the serialized payload as opaque bytes; these types exist so a
//! submission read from disk is validated before it is encrypted.

use serde::{Deserialize, Serialize};

use crate::error::{ExchangeError, Result};

/// A process-submission request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessRequest {
    /// Redirect target once the remote flow completes.
    #[serde(rename = "callbackUri", default, skip_serializing_if = "Option::is_none")]
    pub callback_uri: Option<String>,

    /// Which remote flow to run (e.g. "complete").
    #[serde(rename = "fluxo")]
    pub flow: String,

    /// The process being submitted.
    #[serde(rename = "processo")]
    pub process: Process,

    /// Webhook notified with the (encrypted) outcome.
    #[serde(rename = "webhookUrl", default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Process {
    #[serde(rename = "pessoa")]
    pub person: Person,

    /// Process expiration, e.g. "3600s".
    #[serde(rename = "expiracao")]
    pub expiration: String,

    #[serde(
        rename = "documentos",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub documents: Vec<Document>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub cpf: String,

    #[serde(rename = "nome")]
    pub name: String,

    #[serde(rename = "telefone", default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "nome")]
    pub name: String,

    /// Document bytes, standard base64 (padded).
    #[serde(rename = "conteudoBase64")]
    pub content_base64: String,
}

impl Document {
    /// Read a file and attach its bytes as base64 content.
    pub fn from_file(name: impl Into<String>, path: impl AsRef<std::path::Path>) -> Result<Self> {
        use ct_codecs::{Base64, Encoder};

        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| ExchangeError::Encoding(format!("{}: {e}", path.display())))?;
        let content_base64 = Base64::encode_to_string(&bytes)
            .map_err(|e| ExchangeError::Encoding(e.to_string()))?;
        Ok(Document {
            name: name.into(),
            content_base64,
        })
    }
}
