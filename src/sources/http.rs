//! HTTP lookup provider.
//!
//! Every provider is a plain GET endpoint that takes the phone digits
//! as a trailing query parameter and answers with a JSON object:
//!
//! - `https://api.uspeoplesearch.net/tcpa/v1?x=5551234567`
//! - `https://api.uspeoplesearch.net/person/v3?x=5551234567`
//!
//! A URL containing `{phone}` gets the digits substituted instead.
//! Auth: none.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::LookupSource;
use crate::config::LookupConfig;
use crate::types::{PhoneNumber, SourceError, SourcePayload};

const PHONE_PLACEHOLDER: &str = "{phone}";

/// Build the HTTP client shared by every source.
pub fn build_client(cfg: &LookupConfig) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(cfg.timeout_secs))
        .user_agent(cfg.user_agent.as_str())
        .build()
        .context("Failed to build lookup HTTP client")
}

pub struct HttpSource {
    http: Client,
    name: String,
    url: String,
}

impl HttpSource {
    pub fn new(http: Client, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            http,
            name: name.into(),
            url: url.into(),
        }
    }

    /// The request URL for one phone number.
    pub fn url_for(&self, phone: &PhoneNumber) -> String {
        if self.url.contains(PHONE_PLACEHOLDER) {
            self.url.replace(PHONE_PLACEHOLDER, phone.as_str())
        } else {
            format!("{}{}", self.url, phone)
        }
    }
}

#[async_trait]
impl LookupSource for HttpSource {
    async fn fetch(&self, phone: &PhoneNumber) -> Result<Option<SourcePayload>, SourceError> {
        let url = self.url_for(phone);
        debug!(source = %self.name, url = %url, "Fetching");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;

        SourcePayload::from_value(body)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
