//! HTTP collaborators: OAuth2 token endpoint and business API.
//!
//! The pipeline itself performs no I/O; this module owns the two external
//! calls and nothing else. No retries here: transport failures are reported
//! and retry policy, if any, belongs to the operator.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;

use crate::config::Settings;
use crate::error::{ExchangeError, Result};

const TOKEN_PATH: &str = "/protocol/openid-connect/token";
const PROCESS_PATH: &str = "/J17/api/v1/processo";
const RESULT_PATH: &str = "/J17/api/v1/consulta-resultado-processo";
const DOCUMENT_PATH: &str = "/J17/api/v1/consulta-documento";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Blocking HTTP client bound to one base URL.
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client with the configured timeout.
    pub fn new(settings: &Settings) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.http_timeout_secs))
            .build()?;
        Ok(ApiClient {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Obtain a bearer token via the resource-owner-password-credentials
    /// grant. Any status other than 200 is a transport failure.
    pub fn fetch_token(&self, settings: &Settings) -> Result<String> {
        let response = self
            .http
            .post(self.url(TOKEN_PATH))
            .form(&[
                ("grant_type", settings.grant_type.as_str()),
                ("client_id", settings.client_id.as_str()),
                ("username", settings.username.as_str()),
                ("password", settings.password.as_str()),
            ])
            .send()?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(ExchangeError::Transport(format!(
                "token endpoint returned {status}"
            )));
        }

        let token: TokenResponse = response.json().map_err(|_| {
            ExchangeError::Transport("token response carried no access_token".into())
        })?;
        tracing::debug!("bearer token obtained");
        Ok(token.access_token)
    }

    /// POST a compact JWE envelope as `application/jose` and return the
    /// response body.
    pub fn submit_process(&self, token: &str, envelope: &str) -> Result<String> {
        let response = self
            .http
            .post(self.url(PROCESS_PATH))
            .header(CONTENT_TYPE, "application/jose")
            .bearer_auth(token)
            .body(envelope.to_string())
            .send()?;
        Self::read_body(response)
    }

    /// Query the result of a previously submitted process.
    pub fn query_result(&self, token: &str, process_id: &str) -> Result<String> {
        let response = self
            .http
            .get(self.url(RESULT_PATH))
            .query(&[("idProcesso", process_id)])
            .bearer_auth(token)
            .send()?;
        Self::read_body(response)
    }

    /// Fetch a document by its identifier.
    pub fn query_document(&self, token: &str, document_id: &str) -> Result<String> {
        let response = self
            .http
            .get(format!("{}/{document_id}", self.url(DOCUMENT_PATH)))
            .bearer_auth(token)
            .send()?;
        Self::read_body(response)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn read_body(response: reqwest::blocking::Response) -> Result<String> {
        let status = response.status();
        if !status.is_success() {
            return Err(ExchangeError::Transport(format!(
                "business endpoint returned {status}"
            )));
        }
        Ok(response.text()?)
    }
}
