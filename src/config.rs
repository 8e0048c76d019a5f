//! File-based client configuration.
//!
//! A single TOML file describes every credential domain the caller uses.
//! Sections are optional; asking for a client whose section is missing
//! fails with `WecomError::Config`.
//!
//! ```toml
//! base_url = "https://qyapi.weixin.qq.com/"
//!
//! [app]
//! corp_id = "ww1234567890"
//! corp_secret = "..."
//!
//! [suite]
//! suite_id = "wwsuite"
//! suite_secret = "..."
//! suite_ticket = "..."   # optional, usually pushed by callback
//!
//! [provider]
//! corp_id = "wwprovider"
//! provider_secret = "..."
//!
//! [http]
//! connect_timeout_secs = 10
//! request_timeout_secs = 60
//!
//! [retry]
//! app = [40001, 40014, 42001]
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::auth::{
    CorpSecretSource, CredentialDomain, ProviderSecretSource, RetryPolicy, SuiteTicketSource,
    TokenProvider, TokenSource,
};
use crate::client::{
    API_CONNECT_TIMEOUT, API_REQUEST_TIMEOUT, DEFAULT_BASE_URL, WecomClient, build_api_client,
};
use crate::error::{Result, WecomError};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub corp_id: String,
    pub corp_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuiteConfig {
    pub suite_id: String,
    pub suite_secret: String,
    #[serde(default)]
    pub suite_ticket: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub corp_id: String,
    pub provider_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            connect_timeout_secs: API_CONNECT_TIMEOUT.as_secs(),
            request_timeout_secs: API_REQUEST_TIMEOUT.as_secs(),
        }
    }
}

/// Stale-token codes per domain. An absent list keeps the built-in codes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub app: Option<Vec<i64>>,
    pub suite: Option<Vec<i64>>,
    pub provider: Option<Vec<i64>>,
}

impl RetryConfig {
    fn policy(&self, domain: CredentialDomain) -> RetryPolicy {
        let codes = match domain {
            CredentialDomain::App => &self.app,
            CredentialDomain::Suite => &self.suite,
            CredentialDomain::Provider => &self.provider,
        };
        match codes {
            Some(codes) => RetryPolicy::with_stale_codes(codes.clone()),
            None => RetryPolicy::for_domain(domain),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub app: Option<AppConfig>,
    #[serde(default)]
    pub suite: Option<SuiteConfig>,
    #[serde(default)]
    pub provider: Option<ProviderConfig>,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: default_base_url(),
            app: None,
            suite: None,
            provider: None,
            http: HttpConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            WecomError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| WecomError::config(format!("invalid config: {e}")))
    }

    fn build(&self, source: Arc<dyn TokenSource>) -> WecomClient {
        let domain = source.domain();
        let http = build_api_client(
            Duration::from_secs(self.http.connect_timeout_secs),
            Duration::from_secs(self.http.request_timeout_secs),
        );
        WecomClient::with_base_url(TokenProvider::new(source), &self.base_url)
            .with_http_client(http)
            .with_retry_policy(self.retry.policy(domain))
    }

    /// Client for the corp's own application.
    pub fn app_client(&self) -> Result<WecomClient> {
        let app = self
            .app
            .as_ref()
            .ok_or_else(|| WecomError::config("missing [app] section"))?;
        let source = CorpSecretSource::new(&app.corp_id, &app.corp_secret)
            .with_base_url(&self.base_url);
        Ok(self.build(Arc::new(source)))
    }

    /// Client for the suite, plus its ticket source so a callback handler
    /// can feed newer tickets into it.
    pub fn suite_client(&self) -> Result<(WecomClient, Arc<SuiteTicketSource>)> {
        let suite = self
            .suite
            .as_ref()
            .ok_or_else(|| WecomError::config("missing [suite] section"))?;
        let source = Arc::new(
            SuiteTicketSource::new(&suite.suite_id, &suite.suite_secret)
                .with_base_url(&self.base_url),
        );
        if let Some(ticket) = &suite.suite_ticket {
            source.set_ticket(ticket);
        }
        let client = self.build(source.clone());
        Ok((client, source))
    }

    pub fn provider_client(&self) -> Result<WecomClient> {
        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| WecomError::config("missing [provider] section"))?;
        let source = ProviderSecretSource::new(&provider.corp_id, &provider.provider_secret)
            .with_base_url(&self.base_url);
        Ok(self.build(Arc::new(source)))
    }
}
