//! Calls into programs deployed in the conversation-archive secure zone
//! (`cgi-bin/chatdata`).
//!
//! Request and response payloads are opaque strings defined by the
//! program itself; this module only moves them.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::client::WecomClient;
use crate::error::Result;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProgramCall {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub program_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub ability_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub notify_id: String,
    /// Program-defined payload, usually JSON encoded as a string.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub request_data: String,
}

/// Result of an asynchronous program task.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProgramResult {
    /// The program's own status code, independent of the envelope.
    pub response_errcode: i64,
    pub response_data: String,
}

/// Invokes a program synchronously and returns its `response_data`.
pub async fn sync_call_program(client: &WecomClient, call: &ProgramCall) -> Result<String> {
    #[derive(Deserialize)]
    struct Resp {
        #[serde(default)]
        response_data: String,
    }
    let resp: Resp = client
        .post("cgi-bin/chatdata/sync_call_program", call)
        .await?;
    Ok(resp.response_data)
}

/// Starts an asynchronous program task and returns its `jobid`.
pub async fn async_program_task(client: &WecomClient, call: &ProgramCall) -> Result<String> {
    #[derive(Deserialize)]
    struct Resp {
        jobid: String,
    }
    let resp: Resp = client
        .post("cgi-bin/chatdata/async_program_task", call)
        .await?;
    Ok(resp.jobid)
}

pub async fn async_program_result(client: &WecomClient, jobid: &str) -> Result<ProgramResult> {
    client
        .post(
            "cgi-bin/chatdata/async_program_result",
            &json!({ "jobid": jobid }),
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_call_sends_only_set_fields() {
        let call = ProgramCall {
            program_id: "prog".to_string(),
            ability_id: "invoke_sentiment".to_string(),
            request_data: r#"{"input":"x"}"#.to_string(),
            ..Default::default()
        };
        let body = serde_json::to_value(&call).unwrap();
        assert!(body.get("notify_id").is_none());
        assert_eq!(body["request_data"], r#"{"input":"x"}"#);
    }

    #[test]
    fn program_result_keeps_inner_code() {
        let r: ProgramResult = serde_json::from_str(
            r#"{"errcode":0,"errmsg":"ok","response_errcode":1,"response_data":"{}"}"#,
        )
        .unwrap();
        assert_eq!(r.response_errcode, 1);
    }
}
