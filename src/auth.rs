//! Credential domains, token sources and the cached token provider.
//!
//! WeCom issues three structurally similar but independently scoped tokens:
//!
//! | Domain | Query parameter | Token endpoint |
//! |--------|-----------------|----------------|
//! | [`CredentialDomain::App`] | `access_token` | GET `cgi-bin/gettoken` |
//! | [`CredentialDomain::Suite`] | `suite_access_token` | POST `cgi-bin/service/get_suite_token` |
//! | [`CredentialDomain::Provider`] | `provider_access_token` | POST `cgi-bin/service/get_provider_token` |
//!
//! An app-domain token can also be issued to an ISV on behalf of an
//! authorized corporation, via the suite's `get_corp_token` endpoint
//! ([`AuthorizedCorpSource`]).
//!
//! A [`TokenSource`] knows how to fetch a fresh token for one domain.
//! [`TokenProvider`] owns the single cached token for a source and is the
//! only place that mutates it. Consumers (e.g. `WecomClient`) read the
//! cached token via `token()` and call `force_refresh()` when the remote
//! side rejects it.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::client::{DEFAULT_BASE_URL, WecomClient};
use crate::envelope::Envelope;
use crate::error::{Result, WecomError};

const APP_TOKEN_PATH: &str = "cgi-bin/gettoken";
const SUITE_TOKEN_PATH: &str = "cgi-bin/service/get_suite_token";
const PROVIDER_TOKEN_PATH: &str = "cgi-bin/service/get_provider_token";

/// Safety buffer subtracted from `expires_in` so a token is refreshed
/// before it actually expires.
pub const EXPIRY_BUFFER: Duration = Duration::from_secs(300);

/// Token requests are small; a short timeout keeps a hung token endpoint
/// from stalling every caller queued on the cache lock.
const TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ── Credential domains ─────────────────────────────────────────────────

/// The scope a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialDomain {
    /// A corporation's own application (or an authorized corp via a suite).
    App,
    /// An ISV application suite.
    Suite,
    /// An ISV service provider (licensing, registration, id translation).
    Provider,
}

impl CredentialDomain {
    /// Name of the query parameter that carries this domain's token.
    pub fn query_param(self) -> &'static str {
        match self {
            CredentialDomain::App => "access_token",
            CredentialDomain::Suite => "suite_access_token",
            CredentialDomain::Provider => "provider_access_token",
        }
    }

    /// Remote `errcode` values meaning "the token you sent is no longer
    /// valid" for this domain.
    pub fn default_stale_codes(self) -> &'static [i64] {
        match self {
            // 40001 invalid credential, 40014 invalid access_token,
            // 42001 access_token expired
            CredentialDomain::App => &[40001, 40014, 42001],
            // 40082 invalid suite_token, 42009 suite_token expired,
            // 40014 token not recognized at all
            CredentialDomain::Suite => &[40082, 42009, 40014],
            CredentialDomain::Provider => &[40014, 42001],
        }
    }
}

impl fmt::Display for CredentialDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CredentialDomain::App => "app",
            CredentialDomain::Suite => "suite",
            CredentialDomain::Provider => "provider",
        };
        f.write_str(name)
    }
}

// ── Retry policy ───────────────────────────────────────────────────────

/// Decides whether a response means the token used was rejected.
///
/// The client retries a rejected call at most once, after a forced
/// refresh. The policy only answers the predicate; the retry bound lives in
/// the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    stale_codes: Vec<i64>,
}

impl RetryPolicy {
    /// Policy using the domain's built-in stale codes.
    pub fn for_domain(domain: CredentialDomain) -> Self {
        RetryPolicy {
            stale_codes: domain.default_stale_codes().to_vec(),
        }
    }

    /// Policy with an explicit set of stale codes.
    pub fn with_stale_codes(codes: impl Into<Vec<i64>>) -> Self {
        RetryPolicy {
            stale_codes: codes.into(),
        }
    }

    pub fn stale_codes(&self) -> &[i64] {
        &self.stale_codes
    }

    /// Returns `true` if the envelope reports a rejected token.
    pub fn is_token_invalid(&self, envelope: &Envelope) -> bool {
        envelope.errcode != 0 && self.stale_codes.contains(&envelope.errcode)
    }
}

// ── Token sources ──────────────────────────────────────────────────────

/// A freshly issued token as returned by a token endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedToken {
    pub access_token: String,
    /// Lifetime in seconds, as reported by the remote side.
    pub expires_in: u64,
}

/// Fetches a fresh token for one credential domain.
///
/// Implementations perform exactly one remote call per `fetch` and hold no
/// cache; caching is [`TokenProvider`]'s job.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// The domain whose tokens this source issues.
    fn domain(&self) -> CredentialDomain;

    /// Requests a new token from the remote side.
    async fn fetch(&self) -> Result<FetchedToken>;
}

/// Token endpoint response. The three domains name the token field
/// differently; the aliases fold them into `access_token`.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub errcode: i64,
    #[serde(default)]
    pub errmsg: String,
    #[serde(
        default,
        alias = "suite_access_token",
        alias = "provider_access_token"
    )]
    pub access_token: String,
    #[serde(default)]
    pub expires_in: u64,
}

fn auth_error(
    domain: CredentialDomain,
    message: impl Into<String>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
) -> WecomError {
    WecomError::Auth {
        domain,
        message: message.into(),
        source,
    }
}

fn build_token_client() -> Client {
    Client::builder()
        .timeout(TOKEN_REQUEST_TIMEOUT)
        .build()
        .unwrap_or_else(|err| {
            tracing::warn!(error = %err, "falling back to default HTTP client for token requests");
            Client::new()
        })
}

/// Sends a token request and turns every failure into `WecomError::Auth`.
///
/// The body is read as text before the status check so a failed response
/// keeps the gateway's diagnostic message.
async fn request_token(
    domain: CredentialDomain,
    request: reqwest::RequestBuilder,
) -> Result<FetchedToken> {
    let response = request
        .send()
        .await
        .map_err(|e| auth_error(domain, "token endpoint unreachable", Some(Box::new(e))))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| auth_error(domain, "failed to read token response", Some(Box::new(e))))?;

    if !status.is_success() {
        return Err(auth_error(domain, format!("HTTP {status}: {body}"), None));
    }

    let resp: TokenResponse = serde_json::from_str(&body)
        .map_err(|e| auth_error(domain, "failed to parse token response", Some(Box::new(e))))?;

    if resp.errcode != 0 {
        return Err(auth_error(
            domain,
            format!("errcode {}: {}", resp.errcode, resp.errmsg),
            None,
        ));
    }
    if resp.access_token.is_empty() {
        return Err(auth_error(domain, "token response carried no token", None));
    }

    Ok(FetchedToken {
        access_token: resp.access_token,
        expires_in: resp.expires_in,
    })
}

fn join_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

/// Issues app tokens from a corp ID and an application secret.
pub struct CorpSecretSource {
    client: Client,
    base_url: String,
    corp_id: String,
    corp_secret: String,
}

impl CorpSecretSource {
    pub fn new(corp_id: &str, corp_secret: &str) -> Self {
        CorpSecretSource {
            client: build_token_client(),
            base_url: DEFAULT_BASE_URL.to_string(),
            corp_id: corp_id.to_string(),
            corp_secret: corp_secret.to_string(),
        }
    }

    /// Points the source at a different API host (tests, proxies).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }
}

#[async_trait]
impl TokenSource for CorpSecretSource {
    fn domain(&self) -> CredentialDomain {
        CredentialDomain::App
    }

    async fn fetch(&self) -> Result<FetchedToken> {
        let request = self
            .client
            .get(join_url(&self.base_url, APP_TOKEN_PATH))
            .query(&[
                ("corpid", self.corp_id.as_str()),
                ("corpsecret", self.corp_secret.as_str()),
            ]);
        request_token(self.domain(), request).await
    }
}

#[derive(Serialize)]
struct SuiteTokenRequest<'a> {
    suite_id: &'a str,
    suite_secret: &'a str,
    suite_ticket: &'a str,
}

/// Issues suite tokens. Needs the latest `suite_ticket`, which WeCom pushes
/// to the suite's callback URL every ten minutes; hand it over with
/// [`set_ticket`](Self::set_ticket).
pub struct SuiteTicketSource {
    client: Client,
    base_url: String,
    suite_id: String,
    suite_secret: String,
    ticket: RwLock<Option<String>>,
}

impl SuiteTicketSource {
    pub fn new(suite_id: &str, suite_secret: &str) -> Self {
        SuiteTicketSource {
            client: build_token_client(),
            base_url: DEFAULT_BASE_URL.to_string(),
            suite_id: suite_id.to_string(),
            suite_secret: suite_secret.to_string(),
            ticket: RwLock::new(None),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    /// Stores the most recent suite ticket. Safe to call from the callback
    /// handler while token fetches are in flight.
    pub fn set_ticket(&self, ticket: &str) {
        *self.ticket.write() = Some(ticket.to_string());
    }

    pub fn ticket(&self) -> Option<String> {
        self.ticket.read().clone()
    }

    pub fn suite_id(&self) -> &str {
        &self.suite_id
    }
}

#[async_trait]
impl TokenSource for SuiteTicketSource {
    fn domain(&self) -> CredentialDomain {
        CredentialDomain::Suite
    }

    async fn fetch(&self) -> Result<FetchedToken> {
        let Some(ticket) = self.ticket() else {
            return Err(auth_error(
                self.domain(),
                "no suite_ticket received yet",
                None,
            ));
        };
        let body = SuiteTokenRequest {
            suite_id: &self.suite_id,
            suite_secret: &self.suite_secret,
            suite_ticket: &ticket,
        };
        let request = self
            .client
            .post(join_url(&self.base_url, SUITE_TOKEN_PATH))
            .json(&body);
        request_token(self.domain(), request).await
    }
}

#[derive(Serialize)]
struct ProviderTokenRequest<'a> {
    corpid: &'a str,
    provider_secret: &'a str,
}

/// Issues service-provider tokens from the provider's corp ID and secret.
pub struct ProviderSecretSource {
    client: Client,
    base_url: String,
    corp_id: String,
    provider_secret: String,
}

impl ProviderSecretSource {
    pub fn new(corp_id: &str, provider_secret: &str) -> Self {
        ProviderSecretSource {
            client: build_token_client(),
            base_url: DEFAULT_BASE_URL.to_string(),
            corp_id: corp_id.to_string(),
            provider_secret: provider_secret.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }
}

#[async_trait]
impl TokenSource for ProviderSecretSource {
    fn domain(&self) -> CredentialDomain {
        CredentialDomain::Provider
    }

    async fn fetch(&self) -> Result<FetchedToken> {
        let body = ProviderTokenRequest {
            corpid: &self.corp_id,
            provider_secret: &self.provider_secret,
        };
        let request = self
            .client
            .post(join_url(&self.base_url, PROVIDER_TOKEN_PATH))
            .json(&body);
        request_token(self.domain(), request).await
    }
}

/// Issues app tokens for a corporation that installed the suite, using the
/// permanent code obtained at authorization time.
pub struct AuthorizedCorpSource {
    suite: Arc<WecomClient>,
    auth_corp_id: String,
    permanent_code: String,
}

impl AuthorizedCorpSource {
    /// `suite` must be a suite-domain client.
    pub fn new(suite: Arc<WecomClient>, auth_corp_id: &str, permanent_code: &str) -> Self {
        AuthorizedCorpSource {
            suite,
            auth_corp_id: auth_corp_id.to_string(),
            permanent_code: permanent_code.to_string(),
        }
    }
}

#[async_trait]
impl TokenSource for AuthorizedCorpSource {
    fn domain(&self) -> CredentialDomain {
        CredentialDomain::App
    }

    async fn fetch(&self) -> Result<FetchedToken> {
        let token =
            crate::suite::get_corp_token(&self.suite, &self.auth_corp_id, &self.permanent_code)
                .await
                .map_err(|e| {
                    auth_error(
                        self.domain(),
                        format!("get_corp_token for {} failed", self.auth_corp_id),
                        Some(Box::new(e)),
                    )
                })?;
        Ok(FetchedToken {
            access_token: token.access_token,
            expires_in: token.expires_in,
        })
    }
}

// ── Token provider ─────────────────────────────────────────────────────

#[derive(Debug)]
struct CachedToken {
    value: String,
    expires_in: u64,
    acquired_at: Instant,
}

impl CachedToken {
    fn is_expired(&self, buffer: Duration) -> bool {
        let lifetime = Duration::from_secs(self.expires_in).saturating_sub(buffer);
        self.acquired_at.elapsed() >= lifetime
    }
}

/// Owns the cached token for one [`TokenSource`].
///
/// Invariants:
/// - The cache is empty until the first successful fetch.
/// - A cached token is handed out only while younger than
///   `expires_in - expiry_buffer`; past that point the next `token()` call
///   refreshes first.
/// - The cache lock is held across the remote fetch, so concurrent callers
///   that find the cache stale queue behind a single fetch and then all
///   observe its result.
pub struct TokenProvider {
    source: Arc<dyn TokenSource>,
    expiry_buffer: Duration,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        TokenProvider {
            source,
            expiry_buffer: EXPIRY_BUFFER,
            cached: Mutex::new(None),
        }
    }

    /// Creates a provider with a pre-set token, treated as freshly acquired
    /// with a two-hour lifetime. The source is only consulted once that
    /// token expires or is rejected.
    pub fn with_token(source: Arc<dyn TokenSource>, token: &str) -> Self {
        TokenProvider {
            source,
            expiry_buffer: EXPIRY_BUFFER,
            cached: Mutex::new(Some(CachedToken {
                value: token.to_string(),
                expires_in: 7200,
                acquired_at: Instant::now(),
            })),
        }
    }

    /// Overrides the safety buffer subtracted from each token's lifetime.
    pub fn with_expiry_buffer(mut self, buffer: Duration) -> Self {
        self.expiry_buffer = buffer;
        self
    }

    pub fn domain(&self) -> CredentialDomain {
        self.source.domain()
    }

    async fn fetch_into(&self, slot: &mut Option<CachedToken>) -> Result<String> {
        let fetched = self.source.fetch().await?;
        tracing::info!(
            domain = %self.domain(),
            expires_in = fetched.expires_in,
            "token refreshed"
        );
        let value = fetched.access_token.clone();
        *slot = Some(CachedToken {
            value: fetched.access_token,
            expires_in: fetched.expires_in,
            acquired_at: Instant::now(),
        });
        Ok(value)
    }

    /// Returns the cached token, fetching a new one first if none is cached
    /// or the cached one has expired.
    ///
    /// # Errors
    ///
    /// `WecomError::Auth` if the fetch fails; the cache is left untouched.
    pub async fn token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        match cached.as_ref() {
            Some(token) if !token.is_expired(self.expiry_buffer) => Ok(token.value.clone()),
            _ => self.fetch_into(&mut cached).await,
        }
    }

    /// Unconditionally fetches a new token and overwrites the cache.
    pub async fn refresh_token(&self) -> Result<()> {
        let mut cached = self.cached.lock().await;
        self.fetch_into(&mut cached).await.map(|_| ())
    }

    /// Replaces a token the remote side rejected.
    ///
    /// If the cache no longer holds `rejected`, another caller already
    /// refreshed it and the newer token is returned without a fetch.
    pub async fn force_refresh(&self, rejected: &str) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.value != rejected && !token.is_expired(self.expiry_buffer) {
                return Ok(token.value.clone());
            }
        }
        self.fetch_into(&mut cached).await
    }

    /// Drops the cached token; the next `token()` call fetches.
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory source that counts fetches and hands out `token-N`.
    struct CountingSource {
        fetches: AtomicUsize,
        delay: Duration,
        fail: bool,
    }

    impl CountingSource {
        fn new() -> Arc<Self> {
            Arc::new(CountingSource {
                fetches: AtomicUsize::new(0),
                delay: Duration::ZERO,
                fail: false,
            })
        }

        fn slow(delay: Duration) -> Arc<Self> {
            Arc::new(CountingSource {
                fetches: AtomicUsize::new(0),
                delay,
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(CountingSource {
                fetches: AtomicUsize::new(0),
                delay: Duration::ZERO,
                fail: true,
            })
        }

        fn count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenSource for CountingSource {
        fn domain(&self) -> CredentialDomain {
            CredentialDomain::App
        }

        async fn fetch(&self) -> Result<FetchedToken> {
            let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(auth_error(self.domain(), "errcode 40001: invalid credential", None));
            }
            Ok(FetchedToken {
                access_token: format!("token-{n}"),
                expires_in: 7200,
            })
        }
    }

    async fn backdate(tp: &TokenProvider, by: Duration) {
        let mut cached = tp.cached.lock().await;
        let token = cached.as_mut().unwrap();
        token.acquired_at = Instant::now() - by;
    }

    // ── CredentialDomain / RetryPolicy ───────────────────────────────

    #[test]
    fn domains_use_distinct_query_params() {
        assert_eq!(CredentialDomain::App.query_param(), "access_token");
        assert_eq!(CredentialDomain::Suite.query_param(), "suite_access_token");
        assert_eq!(
            CredentialDomain::Provider.query_param(),
            "provider_access_token"
        );
    }

    #[test]
    fn retry_policy_flags_only_stale_codes() {
        let policy = RetryPolicy::for_domain(CredentialDomain::App);
        let stale = Envelope {
            errcode: 40014,
            errmsg: "invalid access_token".to_string(),
        };
        let other = Envelope {
            errcode: 60011,
            errmsg: "no privilege".to_string(),
        };
        assert!(policy.is_token_invalid(&stale));
        assert!(!policy.is_token_invalid(&other));
        assert!(!policy.is_token_invalid(&Envelope::default()));
    }

    #[test]
    fn suite_policy_does_not_treat_app_codes_as_stale() {
        let policy = RetryPolicy::for_domain(CredentialDomain::Suite);
        let app_stale = Envelope {
            errcode: 40001,
            errmsg: String::new(),
        };
        assert!(!policy.is_token_invalid(&app_stale));
        for code in [40082, 42009, 40014] {
            let suite_stale = Envelope {
                errcode: code,
                errmsg: String::new(),
            };
            assert!(policy.is_token_invalid(&suite_stale), "{code} should be stale");
        }
    }

    #[test]
    fn custom_stale_codes_replace_defaults() {
        let policy = RetryPolicy::with_stale_codes(vec![99999]);
        assert_eq!(policy.stale_codes(), &[99999]);
        let env = Envelope {
            errcode: 40014,
            errmsg: String::new(),
        };
        assert!(!policy.is_token_invalid(&env));
    }

    // ── TokenResponse ────────────────────────────────────────────────

    #[test]
    fn token_response_reads_each_domain_field_name() {
        let app: TokenResponse =
            serde_json::from_str(r#"{"errcode":0,"errmsg":"ok","access_token":"a","expires_in":7200}"#)
                .unwrap();
        let suite: TokenResponse =
            serde_json::from_str(r#"{"suite_access_token":"s","expires_in":7200}"#).unwrap();
        let provider: TokenResponse =
            serde_json::from_str(r#"{"provider_access_token":"p","expires_in":7200}"#).unwrap();
        assert_eq!(app.access_token, "a");
        assert_eq!(suite.access_token, "s");
        assert_eq!(provider.access_token, "p");
    }

    #[test]
    fn token_response_tolerates_error_shape() {
        let resp: TokenResponse =
            serde_json::from_str(r#"{"errcode":40013,"errmsg":"invalid corpid"}"#).unwrap();
        assert_eq!(resp.errcode, 40013);
        assert!(resp.access_token.is_empty());
    }

    // ── TokenProvider ────────────────────────────────────────────────

    #[tokio::test]
    async fn first_token_call_fetches() {
        let source = CountingSource::new();
        let tp = TokenProvider::new(source.clone());
        assert_eq!(tp.token().await.unwrap(), "token-1");
        assert_eq!(source.count(), 1);
    }

    #[tokio::test]
    async fn repeated_calls_before_expiry_do_not_fetch() {
        let source = CountingSource::new();
        let tp = TokenProvider::new(source.clone());
        for _ in 0..5 {
            assert_eq!(tp.token().await.unwrap(), "token-1");
        }
        assert_eq!(source.count(), 1, "only the first call should fetch");
    }

    #[tokio::test]
    async fn preset_token_is_served_without_fetching() {
        let source = CountingSource::new();
        let tp = TokenProvider::with_token(source.clone(), "preset");
        assert_eq!(tp.token().await.unwrap(), "preset");
        assert_eq!(source.count(), 0);
    }

    #[tokio::test]
    async fn expired_token_triggers_exactly_one_fetch() {
        let source = CountingSource::new();
        let tp = TokenProvider::with_token(source.clone(), "preset");
        backdate(&tp, Duration::from_secs(7200)).await;

        assert_eq!(tp.token().await.unwrap(), "token-1");
        assert_eq!(tp.token().await.unwrap(), "token-1");
        assert_eq!(source.count(), 1);
    }

    #[tokio::test]
    async fn token_inside_buffer_is_treated_as_expired() {
        // 7200s lifetime minus the 300s buffer leaves 6900s.
        let source = CountingSource::new();
        let tp = TokenProvider::with_token(source.clone(), "preset");
        backdate(&tp, Duration::from_secs(6901)).await;
        assert_eq!(tp.token().await.unwrap(), "token-1");
    }

    #[tokio::test]
    async fn token_before_buffer_is_still_served() {
        let source = CountingSource::new();
        let tp = TokenProvider::with_token(source.clone(), "preset");
        backdate(&tp, Duration::from_secs(6000)).await;
        assert_eq!(tp.token().await.unwrap(), "preset");
        assert_eq!(source.count(), 0);
    }

    #[tokio::test]
    async fn custom_buffer_changes_the_boundary() {
        let source = CountingSource::new();
        let tp = TokenProvider::with_token(source.clone(), "preset")
            .with_expiry_buffer(Duration::ZERO);
        backdate(&tp, Duration::from_secs(7000)).await;
        assert_eq!(tp.token().await.unwrap(), "preset");
    }

    #[tokio::test]
    async fn refresh_token_always_fetches() {
        let source = CountingSource::new();
        let tp = TokenProvider::with_token(source.clone(), "preset");
        tp.refresh_token().await.unwrap();
        assert_eq!(tp.token().await.unwrap(), "token-1");
        assert_eq!(source.count(), 1);
    }

    #[tokio::test]
    async fn force_refresh_replaces_the_rejected_token() {
        let source = CountingSource::new();
        let tp = TokenProvider::with_token(source.clone(), "stale");
        assert_eq!(tp.force_refresh("stale").await.unwrap(), "token-1");
        assert_eq!(source.count(), 1);
    }

    #[tokio::test]
    async fn force_refresh_skips_fetch_when_already_replaced() {
        let source = CountingSource::new();
        let tp = TokenProvider::with_token(source.clone(), "stale");
        tp.force_refresh("stale").await.unwrap();
        // A second caller that also saw "stale" rejected gets the new token.
        assert_eq!(tp.force_refresh("stale").await.unwrap(), "token-1");
        assert_eq!(source.count(), 1);
    }

    #[tokio::test]
    async fn invalidate_forces_next_fetch() {
        let source = CountingSource::new();
        let tp = TokenProvider::with_token(source.clone(), "preset");
        tp.invalidate().await;
        assert_eq!(tp.token().await.unwrap(), "token-1");
    }

    #[tokio::test]
    async fn failed_fetch_surfaces_auth_error_and_leaves_cache_empty() {
        let source = CountingSource::failing();
        let tp = TokenProvider::new(source.clone());
        let err = tp.token().await.unwrap_err();
        assert!(matches!(err, WecomError::Auth { .. }), "got {err:?}");
        assert!(tp.cached.lock().await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_share_a_single_fetch() {
        let source = CountingSource::slow(Duration::from_millis(50));
        let tp = Arc::new(TokenProvider::new(source.clone()));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let tp = tp.clone();
                tokio::spawn(async move { tp.token().await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "token-1");
        }
        assert_eq!(source.count(), 1, "concurrent callers must not refetch");
    }

    #[tokio::test]
    async fn suite_source_without_ticket_fails_before_any_request() {
        // The base URL is unroutable; reaching the network would surface as
        // a different message.
        let source = SuiteTicketSource::new("wx-suite", "secret").with_base_url("http://127.0.0.1:1");
        let err = source.fetch().await.unwrap_err();
        match err {
            WecomError::Auth { domain, message, .. } => {
                assert_eq!(domain, CredentialDomain::Suite);
                assert!(message.contains("suite_ticket"));
            }
            other => panic!("expected Auth error, got {other:?}"),
        }
    }

    #[test]
    fn suite_ticket_can_be_replaced() {
        let source = SuiteTicketSource::new("wx-suite", "secret");
        assert!(source.ticket().is_none());
        source.set_ticket("ticket-1");
        source.set_ticket("ticket-2");
        assert_eq!(source.ticket().as_deref(), Some("ticket-2"));
    }
}
