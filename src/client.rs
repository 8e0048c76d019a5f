//! Authenticated HTTP client for the WeCom server API.
//!
//! `WecomClient` wraps a `reqwest::Client`, a [`TokenProvider`] for one
//! credential domain and the [`RetryPolicy`] that recognizes a rejected
//! token. All endpoint modules go through its `get` / `post` helpers.
//!
//! Token lifecycle:
//! - Lazy acquisition: the first request fetches a token through the
//!   provider.
//! - Expiry-aware: the provider refreshes ahead of the reported expiry.
//! - One-shot stale-token retry: WeCom reports a revoked or expired token
//!   in the body (`errcode` 40014, 42001, ...) with HTTP 200, not as a 401.
//!   When the policy flags the envelope, the client forces a refresh and
//!   re-sends the request exactly once with the new token. A second stale
//!   response is returned to the caller as `WecomError::Api`.
//!
//! Transport failures are never retried.

use bytes::Bytes;
use reqwest::multipart::Form;
use reqwest::{Client, Method};
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;

use crate::auth::{CredentialDomain, RetryPolicy, TokenProvider};
use crate::envelope::{self, Envelope};
use crate::error::{Result, WecomError};

/// Public WeCom API host.
pub const DEFAULT_BASE_URL: &str = "https://qyapi.weixin.qq.com/";

/// Connect timeout (TCP + TLS handshake).
pub const API_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall timeout per request, including the body download. Result files
/// fetched through [`WecomClient::download`] share it.
pub const API_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Builds a `reqwest::Client` with explicit timeouts for API calls.
pub fn build_api_client(connect_timeout: Duration, request_timeout: Duration) -> Client {
    Client::builder()
        .connect_timeout(connect_timeout)
        .timeout(request_timeout)
        .build()
        .unwrap_or_else(|err| {
            tracing::warn!(error = %err, "falling back to default HTTP client");
            Client::new()
        })
}

/// Authenticated HTTP client for one credential domain.
///
/// `base_url` is stored as a `String` so tests can point it at a mock
/// server. Cloning is not supported; share it behind an `Arc`.
pub struct WecomClient {
    client: Client,
    base_url: String,
    tokens: TokenProvider,
    policy: RetryPolicy,
}

impl WecomClient {
    pub fn new(tokens: TokenProvider) -> Self {
        Self::with_base_url(tokens, DEFAULT_BASE_URL)
    }

    /// Constructor with a custom base URL, e.g. a local mock server.
    pub fn with_base_url(tokens: TokenProvider, base_url: &str) -> Self {
        let policy = RetryPolicy::for_domain(tokens.domain());
        WecomClient {
            client: build_api_client(API_CONNECT_TIMEOUT, API_REQUEST_TIMEOUT),
            base_url: base_url.to_string(),
            tokens,
            policy,
        }
    }

    /// Replaces the stale-token predicate.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replaces the underlying HTTP client (custom timeouts, proxies).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn domain(&self) -> CredentialDomain {
        self.tokens.domain()
    }

    pub fn tokens(&self) -> &TokenProvider {
        &self.tokens
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Core request path shared by `get` and `post`.
    ///
    /// `query` holds endpoint parameters; the token is appended under
    /// `token_param` on every attempt, so the retry carries the refreshed
    /// token without rewriting a URL string.
    async fn send_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        token_param: &str,
        body: Option<&B>,
    ) -> Result<T> {
        let url = self.url(path);
        let token = self.tokens.token().await?;
        tracing::debug!(%method, path, domain = %self.domain(), "sending request");

        let raw = self
            .execute(method.clone(), &url, query, (token_param, &token), body)
            .await?;

        let envelope = Envelope::parse(&raw)?;
        if self.policy.is_token_invalid(&envelope) {
            tracing::warn!(
                path,
                domain = %self.domain(),
                code = envelope.errcode,
                "token rejected, refreshing and retrying once"
            );
            let fresh = self.replace_rejected(&token).await?;
            let retry = self
                .execute(method, &url, query, (token_param, &fresh), body)
                .await?;
            return envelope::decode(&retry);
        }

        envelope::decode(&raw)
    }

    /// Swaps a token the server rejected for a fresh one.
    ///
    /// If the refresh itself fails, the rejected token is dropped from the
    /// cache so the next call fetches instead of replaying it.
    async fn replace_rejected(&self, rejected: &str) -> Result<String> {
        match self.tokens.force_refresh(rejected).await {
            Ok(fresh) => Ok(fresh),
            Err(err) => {
                self.tokens.invalidate().await;
                Err(err)
            }
        }
    }

    /// Sends one attempt and returns the body bytes of a 2xx response.
    async fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, &str)],
        token: (&str, &str),
        body: Option<&B>,
    ) -> Result<Bytes> {
        let mut req = self
            .client
            .request(method, url)
            .query(query)
            .query(&[token]);
        if let Some(payload) = body {
            req = req.json(payload);
        }
        let resp = req.send().await?;
        read_body(resp).await
    }

    /// Sends an authenticated GET and decodes the JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let param = self.domain().query_param();
        self.send_json::<T, ()>(Method::GET, path, query, param, None)
            .await
    }

    /// Sends an authenticated POST with a JSON body and decodes the response.
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let param = self.domain().query_param();
        self.send_json(Method::POST, path, &[], param, Some(body))
            .await
    }

    /// Like [`post`](Self::post), with extra query parameters.
    pub async fn post_with_query<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: &B,
    ) -> Result<T> {
        let param = self.domain().query_param();
        self.send_json(Method::POST, path, query, param, Some(body))
            .await
    }

    /// Like [`post`](Self::post), but sends the token under `token_param`
    /// instead of the domain's usual parameter name. A few provider
    /// endpoints expect the provider token as `access_token`.
    pub async fn post_with_token_param<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        token_param: &str,
        body: &B,
    ) -> Result<T> {
        self.send_json(Method::POST, path, &[], token_param, Some(body))
            .await
    }

    /// Uploads a multipart form built by `build_form`.
    ///
    /// `reqwest::multipart::Form` is consumed on send, so the form is built
    /// once per attempt. A stale-token response gets the same single
    /// refresh and retry as [`post`](Self::post).
    pub async fn upload_multipart<T, F>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        build_form: F,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn() -> Form,
    {
        let url = self.url(path);
        let param = self.domain().query_param();
        let token = self.tokens.token().await?;
        tracing::debug!(path, domain = %self.domain(), "uploading multipart form");

        let raw = self
            .send_form(&url, query, (param, &token), build_form())
            .await?;

        let envelope = Envelope::parse(&raw)?;
        if self.policy.is_token_invalid(&envelope) {
            tracing::warn!(
                path,
                domain = %self.domain(),
                code = envelope.errcode,
                "token rejected on upload, refreshing and retrying once"
            );
            let fresh = self.replace_rejected(&token).await?;
            let retry = self
                .send_form(&url, query, (param, &fresh), build_form())
                .await?;
            return envelope::decode(&retry);
        }

        envelope::decode(&raw)
    }

    async fn send_form(
        &self,
        url: &str,
        query: &[(&str, &str)],
        token: (&str, &str),
        form: Form,
    ) -> Result<Bytes> {
        let resp = self
            .client
            .post(url)
            .query(query)
            .query(&[token])
            .multipart(form)
            .send()
            .await?;
        read_body(resp).await
    }

    /// Sends a GET without attaching this client's token.
    ///
    /// For endpoints authenticated by a token the caller already holds,
    /// such as the one-off `access_token` handed over at registration.
    pub async fn get_without_token<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let resp = self.client.get(self.url(path)).query(query).send().await?;
        envelope::decode(&read_body(resp).await?)
    }

    /// Downloads raw bytes from an absolute URL, without a token.
    ///
    /// Result files (e.g. translated contact lists) are served from
    /// pre-signed URLs that carry their own authorization.
    pub async fn download(&self, url: &str) -> Result<Bytes> {
        let resp = self.client.get(url).send().await?;
        read_body(resp).await
    }
}

/// Returns the body of a 2xx response, or `WecomError::Http` with the body
/// text preserved.
async fn read_body(resp: reqwest::Response) -> Result<Bytes> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(WecomError::Http { status, body });
    }
    Ok(resp.bytes().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{FetchedToken, TokenSource};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct NoopSource;

    #[async_trait]
    impl TokenSource for NoopSource {
        fn domain(&self) -> CredentialDomain {
            CredentialDomain::Provider
        }

        async fn fetch(&self) -> Result<FetchedToken> {
            Ok(FetchedToken {
                access_token: "t".to_string(),
                expires_in: 7200,
            })
        }
    }

    fn client(base: &str) -> WecomClient {
        WecomClient::with_base_url(TokenProvider::new(Arc::new(NoopSource)), base)
    }

    #[test]
    fn url_joins_with_or_without_slashes() {
        assert_eq!(
            client("https://qyapi.weixin.qq.com/").url("cgi-bin/license/list_order"),
            "https://qyapi.weixin.qq.com/cgi-bin/license/list_order"
        );
        assert_eq!(
            client("http://127.0.0.1:8080").url("/cgi-bin/gettoken"),
            "http://127.0.0.1:8080/cgi-bin/gettoken"
        );
    }

    #[test]
    fn policy_follows_token_domain() {
        let c = client(DEFAULT_BASE_URL);
        assert_eq!(c.domain(), CredentialDomain::Provider);
        assert_eq!(
            c.policy,
            RetryPolicy::for_domain(CredentialDomain::Provider)
        );
    }
}
