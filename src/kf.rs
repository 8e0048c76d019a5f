//! WeChat customer service (`cgi-bin/kf`).
//!
//! Incoming messages are pulled with [`sync_msg`] after a callback
//! announces new activity; replies go out through [`send_msg`].

use serde::{Deserialize, Serialize};

use crate::client::WecomClient;
use crate::error::Result;
use crate::message::{MediaRef, Text};

#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncMsgRequest {
    /// `next_cursor` of the previous page; empty on the first call.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cursor: String,
    /// The `Token` from the callback event; raises the rate limit.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub token: String,
    /// At most 1000.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    /// `0` AMR, `1` SILK.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_format: Option<i64>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub open_kfid: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KfText {
    pub content: String,
    pub menu_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KfEvent {
    pub event_type: String,
    pub scene: String,
    pub open_kfid: String,
    pub external_userid: String,
    pub welcome_code: String,
}

/// One message or event from the customer service session.
///
/// Only the payload matching `msgtype` is set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KfMessage {
    pub msgid: String,
    pub open_kfid: String,
    pub external_userid: String,
    pub send_time: i64,
    /// `3` from the customer, `4` system event, `5` from a servicer.
    pub origin: i64,
    pub servicer_userid: String,
    pub msgtype: String,
    pub text: Option<KfText>,
    pub image: Option<MediaRef>,
    pub voice: Option<MediaRef>,
    pub video: Option<MediaRef>,
    pub file: Option<MediaRef>,
    pub event: Option<KfEvent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SyncMsgPage {
    pub next_cursor: String,
    pub has_more: i64,
    pub msg_list: Vec<KfMessage>,
}

impl SyncMsgPage {
    pub fn has_more(&self) -> bool {
        self.has_more == 1
    }
}

/// A text reply to a customer.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SendMsgRequest {
    pub touser: String,
    pub open_kfid: String,
    /// Caller-chosen idempotency key; WeCom generates one when empty.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub msgid: String,
    pub msgtype: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Text>,
}

impl SendMsgRequest {
    pub fn text(touser: &str, open_kfid: &str, content: &str) -> Self {
        SendMsgRequest {
            touser: touser.to_string(),
            open_kfid: open_kfid.to_string(),
            msgid: String::new(),
            msgtype: "text".to_string(),
            text: Some(Text::new(content)),
        }
    }
}

pub async fn sync_msg(client: &WecomClient, request: &SyncMsgRequest) -> Result<SyncMsgPage> {
    client.post("cgi-bin/kf/sync_msg", request).await
}

/// Sends a message and returns its `msgid`.
pub async fn send_msg(client: &WecomClient, request: &SendMsgRequest) -> Result<String> {
    #[derive(Deserialize)]
    struct Resp {
        #[serde(default)]
        msgid: String,
    }
    let resp: Resp = client.post("cgi-bin/kf/send_msg", request).await?;
    Ok(resp.msgid)
}
