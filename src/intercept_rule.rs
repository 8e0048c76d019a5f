//! Sensitive-word intercept rules for customer chats.
//!
//! A rule blocks or warns on messages members send to customers when they
//! contain configured words or semantic categories.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::client::WecomClient;
use crate::envelope::Envelope;
use crate::error::Result;

/// Members and departments a rule applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicableRange {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub user_list: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub department_list: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterceptRule {
    pub rule_name: String,
    pub word_list: Vec<String>,
    /// `1` phone numbers, `2` email addresses, `3` red packets.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub semantics_list: Vec<i64>,
    /// `1` block and warn, `2` warn only.
    pub intercept_type: i64,
    pub applicable_range: ApplicableRange,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RuleSummary {
    pub rule_id: String,
    pub rule_name: String,
    pub create_time: i64,
}

#[derive(Serialize)]
struct EditRule<'a> {
    rule_id: &'a str,
    #[serde(flatten)]
    rule: &'a InterceptRule,
}

/// Creates a rule and returns its `rule_id`.
pub async fn add_intercept_rule(client: &WecomClient, rule: &InterceptRule) -> Result<String> {
    #[derive(Deserialize)]
    struct Resp {
        rule_id: String,
    }
    let resp: Resp = client
        .post("cgi-bin/externalcontact/add_intercept_rule", rule)
        .await?;
    Ok(resp.rule_id)
}

/// Replaces the definition of an existing rule.
pub async fn edit_intercept_rule(
    client: &WecomClient,
    rule_id: &str,
    rule: &InterceptRule,
) -> Result<()> {
    let _: Envelope = client
        .post(
            "cgi-bin/externalcontact/edit_intercept_rule",
            &EditRule { rule_id, rule },
        )
        .await?;
    Ok(())
}

pub async fn list_intercept_rules(client: &WecomClient) -> Result<Vec<RuleSummary>> {
    #[derive(Deserialize)]
    struct Resp {
        #[serde(default)]
        rule_list: Vec<RuleSummary>,
    }
    let resp: Resp = client
        .get("cgi-bin/externalcontact/get_intercept_rule_list", &[])
        .await?;
    Ok(resp.rule_list)
}

pub async fn get_intercept_rule(client: &WecomClient, rule_id: &str) -> Result<InterceptRule> {
    #[derive(Deserialize)]
    struct Resp {
        rule: InterceptRule,
    }
    let resp: Resp = client
        .post(
            "cgi-bin/externalcontact/get_intercept_rule",
            &json!({ "rule_id": rule_id }),
        )
        .await?;
    Ok(resp.rule)
}

pub async fn delete_intercept_rule(client: &WecomClient, rule_id: &str) -> Result<()> {
    let _: Envelope = client
        .post(
            "cgi-bin/externalcontact/del_intercept_rule",
            &json!({ "rule_id": rule_id }),
        )
        .await?;
    Ok(())
}
