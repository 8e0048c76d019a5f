//! Integration tests for the approval family using wiremock.
//!
//! Template and form contents are schema-less, so these tests check that
//! they pass through untouched.

use std::sync::Arc;

use wecom_api::approval::*;
use wecom_api::auth::{CorpSecretSource, TokenProvider};
use wecom_api::client::WecomClient;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn mock_client(server: &MockServer) -> WecomClient {
    let source = Arc::new(CorpSecretSource::new("ww1", "secret").with_base_url(&server.uri()));
    WecomClient::with_base_url(TokenProvider::with_token(source, "mock-token"), &server.uri())
}

#[tokio::test]
async fn apply_event_forwards_form_contents() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    let apply_data = serde_json::json!({
        "contents": [{
            "control": "Text",
            "id": "Text-15111111111",
            "value": {"text": "文本填写的内容"}
        }]
    });

    Mock::given(method("POST"))
        .and(path("/cgi-bin/oa/applyevent"))
        .and(body_json(serde_json::json!({
            "creator_userid": "WangXiaoMing",
            "template_id": "3Tka1eD6v6JfzhDMqPd3aMkFdxqtJMc2ZRioeFXk",
            "use_template_approver": 1,
            "apply_data": apply_data
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errcode": 0,
            "errmsg": "ok",
            "sp_no": "202001010001"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = ApplyEventRequest {
        creator_userid: "WangXiaoMing".to_string(),
        template_id: "3Tka1eD6v6JfzhDMqPd3aMkFdxqtJMc2ZRioeFXk".to_string(),
        use_template_approver: 1,
        apply_data,
        ..Default::default()
    };
    assert_eq!(apply_event(&client, &request).await.unwrap(), "202001010001");
}

#[tokio::test]
async fn approval_numbers_then_detail() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("POST"))
        .and(path("/cgi-bin/oa/getapprovalinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errcode": 0,
            "errmsg": "ok",
            "sp_no_list": ["202001010001", "202001010002"],
            "new_next_cursor": "ABC"
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/cgi-bin/oa/getapprovaldetail"))
        .and(body_json(serde_json::json!({"sp_no": "202001010001"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errcode": 0,
            "errmsg": "ok",
            "info": {"sp_no": "202001010001", "sp_name": "报销", "sp_status": 1}
        })))
        .mount(&server)
        .await;

    let request = ApprovalInfoRequest {
        starttime: 1569546000,
        endtime: 1569718800,
        size: 100,
        ..Default::default()
    };
    let numbers = get_approval_info(&client, &request).await.unwrap();
    assert_eq!(numbers.sp_no_list.len(), 2);
    assert_eq!(numbers.new_next_cursor, "ABC");

    let detail = get_approval_detail(&client, &numbers.sp_no_list[0])
        .await
        .unwrap();
    assert_eq!(detail["sp_name"], "报销");
}
