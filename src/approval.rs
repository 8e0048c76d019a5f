//! Approval workflow (`cgi-bin/oa`).
//!
//! Template controls and approval form contents differ per template, so
//! those parts are carried as `serde_json::Value`. The envelope around them
//! (IDs, cursors, approver lists) is typed.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::client::WecomClient;
use crate::error::Result;

/// One approval step: the approvers and how they decide.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Approver {
    /// `1` any one approver decides, `2` all must approve.
    pub attr: i64,
    pub userid: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SummaryLine {
    pub summary_info: Vec<SummaryText>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SummaryText {
    pub text: String,
    pub lang: String,
}

/// Request body for [`apply_event`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplyEventRequest {
    pub creator_userid: String,
    pub template_id: String,
    /// `1` use the approvers configured on the template, `0` use
    /// `approver`.
    pub use_template_approver: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub approver: Vec<Approver>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notifyer: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_type: Option<i64>,
    /// `{"contents": [...]}` with one entry per template control.
    pub apply_data: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub summary_list: Vec<SummaryLine>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApprovalFilter {
    pub key: String,
    pub value: String,
}

/// Request body for [`get_approval_info`]. The window may span at most
/// 31 days.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApprovalInfoRequest {
    pub starttime: i64,
    pub endtime: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub new_cursor: String,
    /// Page size, at most 100.
    pub size: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<ApprovalFilter>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApprovalNumbers {
    pub sp_no_list: Vec<String>,
    pub new_next_cursor: String,
}

/// Copies a template published by a third-party app into the corp and
/// returns the new `template_id`.
pub async fn copy_template(client: &WecomClient, open_template_id: &str) -> Result<String> {
    #[derive(Deserialize)]
    struct Resp {
        template_id: String,
    }
    let resp: Resp = client
        .post(
            "cgi-bin/oa/approval/copytemplate",
            &json!({ "open_template_id": open_template_id }),
        )
        .await?;
    Ok(resp.template_id)
}

/// Returns the full template definition, envelope fields included.
pub async fn get_template_detail(client: &WecomClient, template_id: &str) -> Result<Value> {
    client
        .post(
            "cgi-bin/oa/gettemplatedetail",
            &json!({ "template_id": template_id }),
        )
        .await
}

/// Submits an approval request and returns its `sp_no`.
pub async fn apply_event(client: &WecomClient, request: &ApplyEventRequest) -> Result<String> {
    #[derive(Deserialize)]
    struct Resp {
        sp_no: String,
    }
    let resp: Resp = client.post("cgi-bin/oa/applyevent", request).await?;
    Ok(resp.sp_no)
}

/// Lists approval numbers created in a time window.
pub async fn get_approval_info(
    client: &WecomClient,
    request: &ApprovalInfoRequest,
) -> Result<ApprovalNumbers> {
    client.post("cgi-bin/oa/getapprovalinfo", request).await
}

/// Returns the `info` object of one approval.
pub async fn get_approval_detail(client: &WecomClient, sp_no: &str) -> Result<Value> {
    #[derive(Deserialize)]
    struct Resp {
        #[serde(default)]
        info: Value,
    }
    let resp: Resp = client
        .post("cgi-bin/oa/getapprovaldetail", &json!({ "sp_no": sp_no }))
        .await?;
    Ok(resp.info)
}
