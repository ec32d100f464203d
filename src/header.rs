use serde::{Deserialize, Serialize};

/// Key management algorithm implemented by this client.
pub const ALG_RSA_OAEP_256: &str = "RSA-OAEP-256";

/// Content encryption algorithm implemented by this client.
pub const ENC_A256GCM: &str = "A256GCM";

/// JWE protected header.
///
/// Identifies the key-wrap and content-encryption algorithms. The header is
/// authenticated as AAD but is not secret. Outbound headers carry only `alg`
/// and `enc`; inbound headers from the remote service may additionally carry
/// a key identifier and a content type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvelopeHeader {
    /// Key management algorithm ("RSA-OAEP-256").
    #[serde(rename = "alg")]
    pub algorithm: String,

    /// Content encryption algorithm ("A256GCM").
    #[serde(rename = "enc")]
    pub encryption: String,

    /// Key ID identifying which recipient key was used.
    #[serde(rename = "kid", default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,

    /// Media type of the encrypted content.
    #[serde(rename = "cty", default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Critical extensions that must be understood. None are supported.
    #[serde(rename = "crit", default, skip_serializing_if = "Option::is_none")]
    pub critical: Option<Vec<String>>,
}

impl EnvelopeHeader {
    pub fn new(algorithm: impl Into<String>, encryption: impl Into<String>) -> Self {
        EnvelopeHeader {
            algorithm: algorithm.into(),
            encryption: encryption.into(),
            key_id: None,
            content_type: None,
            critical: None,
        }
    }

    /// Set the key ID.
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

impl Default for EnvelopeHeader {
    fn default() -> Self {
        EnvelopeHeader::new(ALG_RSA_OAEP_256, ENC_A256GCM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_header_serializes_to_fixed_contract() {
        let json = serde_json::to_string(&EnvelopeHeader::default()).unwrap();
        assert_eq!(json, r#"{"alg":"RSA-OAEP-256","enc":"A256GCM"}"#);
    }

    #[test]
    fn optional_fields_round_trip() {
        let header = EnvelopeHeader::default()
            .with_key_id("5d73719a")
            .with_content_type("application/json");
        let json = serde_json::to_string(&header).unwrap();
        let parsed: EnvelopeHeader = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.key_id.as_deref(), Some("5d73719a"));
        assert_eq!(parsed.content_type.as_deref(), Some("application/json"));
        assert!(parsed.critical.is_none());
    }

    #[test]
    fn parses_remote_response_header() {
        // Shape the remote service sends back on encrypted responses.
        let json = r#"{"kid":"5d73719a-0bae-4eb9-9f1d-3033626e9ad7","cty":"application/json","enc":"A256GCM","alg":"RSA-OAEP-256"}"#;
        let parsed: EnvelopeHeader = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.algorithm, ALG_RSA_OAEP_256);
        assert_eq!(parsed.encryption, ENC_A256GCM);
        assert!(parsed.key_id.is_some());
    }
}
