//! Application details and JS-SDK tickets.

use serde::{Deserialize, Serialize};

use crate::client::WecomClient;
use crate::error::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AllowedUser {
    pub userid: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AllowUserInfos {
    pub user: Vec<AllowedUser>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AllowParties {
    pub partyid: Vec<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AllowTags {
    pub tagid: Vec<i64>,
}

/// An application's settings and visibility scope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Agent {
    pub agentid: i64,
    pub name: String,
    pub square_logo_url: String,
    pub description: String,
    pub allow_userinfos: AllowUserInfos,
    pub allow_partys: AllowParties,
    pub allow_tags: AllowTags,
    /// `1` when the application is disabled.
    pub close: i64,
    pub redirect_domain: String,
    pub report_location_flag: i64,
    pub isreportenter: i64,
    pub home_url: String,
    pub customized_publish_status: i64,
}

/// A JS-SDK ticket and its lifetime in seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ticket {
    pub ticket: String,
    pub expires_in: u64,
}

pub async fn get_agent(client: &WecomClient, agentid: &str) -> Result<Agent> {
    client.get("cgi-bin/agent/get", &[("agentid", agentid)]).await
}

/// Ticket for `wx.agentConfig` signatures.
pub async fn get_agent_ticket(client: &WecomClient) -> Result<Ticket> {
    client
        .get("cgi-bin/ticket/get", &[("type", "agent_config")])
        .await
}

/// Ticket for `wx.config` signatures.
pub async fn get_jsapi_ticket(client: &WecomClient) -> Result<Ticket> {
    client.get("cgi-bin/get_jsapi_ticket", &[]).await
}
