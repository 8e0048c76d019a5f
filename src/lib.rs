//! Async Rust client library for the WeCom (enterprise WeChat) server API.
//!
//! Provides cached, single-flight token providers for the three credential
//! domains (app, suite, provider), an authenticated HTTP client that retries
//! once on a rejected token, and typed wrappers for the endpoint families.
//!
//! # Modules
//!
//! - [`auth`] — Credential domains, token sources, cached token provider.
//! - [`client`] — Authenticated HTTP wrapper with the stale-token retry.
//! - [`config`] — TOML configuration and client construction.
//! - [`envelope`] — The `{errcode, errmsg}` envelope and its decode routine.
//! - [`error`] — Typed error hierarchy (`WecomError`).
//! - [`job`] — Background job status and the polling loop.
//! - [`message`] — Message content shared by several families.
//! - [`agent`] — Application details and JS-SDK tickets.
//! - [`approval`] — Approval templates and applications.
//! - [`billing`] — External payment bills.
//! - [`chatdata`] — Conversation-archive program calls.
//! - [`external_contact`] — Customers, tags, group chats, moments, mass messages.
//! - [`intercept_rule`] — Sensitive-word intercept rules.
//! - [`kf`] — WeChat customer service messages.
//! - [`license`] — Interface licensing orders and accounts.
//! - [`living`] — Live streams.
//! - [`suite`] — ISV suite authorization and provider operations.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use wecom_api::auth::{CorpSecretSource, TokenProvider};
//! use wecom_api::client::WecomClient;
//! use wecom_api::external_contact::get_external_contact;
//!
//! let tokens = TokenProvider::new(Arc::new(CorpSecretSource::new("corp_id", "secret")));
//! let client = WecomClient::new(tokens);
//! let detail = get_external_contact(&client, "wmQbmaDQAAuRJ6QQp...").await?;
//! println!("{}", detail.external_contact.name);
//! ```

pub mod agent;
pub mod approval;
pub mod auth;
pub mod billing;
pub mod chatdata;
pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod external_contact;
pub mod intercept_rule;
pub mod job;
pub mod kf;
pub mod license;
pub mod living;
pub mod message;
pub mod suite;
