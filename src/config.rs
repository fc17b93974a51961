//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every section is optional: a missing file or missing table falls
//! back to the production endpoints and the default retry policy.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::retry::{Backoff, RetryPolicy, DEFAULT_DELAY_MS, DEFAULT_MAX_RETRIES};
use crate::types::{SourceRole, Strategy};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub lookup: LookupConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceSpec>,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LookupConfig {
    pub strategy: Strategy,
    /// Per-request timeout.
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::PremiumFirst,
            timeout_secs: 15,
            user_agent: concat!("phone-lookup/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub delay_ms: u64,
    pub backoff: Backoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay_ms: DEFAULT_DELAY_MS,
            backoff: Backoff::Fixed,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            delay: Duration::from_millis(self.delay_ms),
            backoff: self.backoff,
        }
    }
}

/// One remote provider.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SourceSpec {
    pub name: String,
    /// Endpoint; the phone digits are appended (or replace `{phone}`).
    pub url: String,
    pub role: SourceRole,
    /// Merge precedence: on key collisions the higher rank wins.
    #[serde(default)]
    pub rank: u32,
}

impl SourceSpec {
    pub fn new(name: &str, url: &str, role: SourceRole, rank: u32) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            role,
            rank,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

/// The endpoints the tool shipped with.
pub fn default_sources() -> Vec<SourceSpec> {
    vec![
        SourceSpec::new(
            "premium",
            "https://premium_lookup-1-h4761841.deta.app/person?x=",
            SourceRole::Premium,
            30,
        ),
        SourceSpec::new(
            "tcpa",
            "https://api.uspeoplesearch.net/tcpa/v1?x=",
            SourceRole::Compliance,
            10,
        ),
        SourceSpec::new(
            "person",
            "https://api.uspeoplesearch.net/person/v3?x=",
            SourceRole::Person,
            20,
        ),
    ]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            lookup: LookupConfig::default(),
            retry: RetryConfig::default(),
            sources: default_sources(),
            dashboard: DashboardConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Load `path` if it exists, otherwise use the built-in defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            info!(path, "No config file found, using built-in sources");
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the orchestrator cannot run.
    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            bail!("At least one source must be configured");
        }

        let mut seen = HashSet::new();
        for source in &self.sources {
            if source.name.trim().is_empty() {
                bail!("Source names must not be empty");
            }
            if !seen.insert(source.name.as_str()) {
                bail!("Duplicate source name: {}", source.name);
            }
            if !source.url.starts_with("http://") && !source.url.starts_with("https://") {
                bail!("Source {} has a non-HTTP url: {}", source.name, source.url);
            }
        }

        if self.lookup.strategy == Strategy::PremiumFirst
            && !self.sources.iter().any(|s| s.role.is_standard())
        {
            bail!("premium_first needs at least one compliance or person source to fall back to");
        }

        if self.lookup.timeout_secs == 0 {
            bail!("lookup.timeout_secs must be positive");
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
