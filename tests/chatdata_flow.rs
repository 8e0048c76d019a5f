//! Integration tests for conversation-archive program calls using wiremock.

use std::sync::Arc;

use wecom_api::auth::{CorpSecretSource, TokenProvider};
use wecom_api::chatdata::*;
use wecom_api::client::WecomClient;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn mock_client(server: &MockServer) -> WecomClient {
    let source = Arc::new(CorpSecretSource::new("ww1", "secret").with_base_url(&server.uri()));
    WecomClient::with_base_url(TokenProvider::with_token(source, "mock-token"), &server.uri())
}

#[tokio::test]
async fn sync_call_returns_program_payload() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("POST"))
        .and(path("/cgi-bin/chatdata/sync_call_program"))
        .and(body_json(serde_json::json!({
            "program_id": "prog-1",
            "ability_id": "invoke_search_msg",
            "request_data": "{\"query\":\"合同\"}"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errcode": 0,
            "errmsg": "ok",
            "response_data": "{\"hits\":3}"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let call = ProgramCall {
        program_id: "prog-1".to_string(),
        ability_id: "invoke_search_msg".to_string(),
        request_data: r#"{"query":"合同"}"#.to_string(),
        ..Default::default()
    };
    let data = sync_call_program(&client, &call).await.unwrap();
    assert_eq!(data, r#"{"hits":3}"#);
}

#[tokio::test]
async fn async_task_result_keeps_program_code() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("POST"))
        .and(path("/cgi-bin/chatdata/async_program_task"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errcode": 0,
            "errmsg": "ok",
            "jobid": "job-1"
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/cgi-bin/chatdata/async_program_result"))
        .and(body_json(serde_json::json!({"jobid": "job-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errcode": 0,
            "errmsg": "ok",
            "response_errcode": 2,
            "response_data": ""
        })))
        .mount(&server)
        .await;

    let jobid = async_program_task(&client, &ProgramCall::default())
        .await
        .unwrap();
    let result = async_program_result(&client, &jobid).await.unwrap();
    assert_eq!(result.response_errcode, 2);
}
