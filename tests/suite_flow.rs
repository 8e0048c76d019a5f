//! Integration tests for the suite and provider endpoints using wiremock.
//!
//! Covers the suite token exchange (ticket based), per-corp app tokens
//! issued through the suite, the provider token parameter quirks and the
//! contact ID translation flow:
//!
//! - POST /cgi-bin/service/get_suite_token       — SuiteTicketSource
//! - POST /cgi-bin/service/get_corp_token        — AuthorizedCorpSource
//! - POST /cgi-bin/service/media/upload          — upload_media
//! - GET  /cgi-bin/service/auth/getuserinfo3rd  — get_user_info_3rd_auth
//! - POST /cgi-bin/service/contact/id_translate  — contact_id_translate
//! - GET  /cgi-bin/service/batch/getresult       — get_job_result

use std::sync::Arc;
use std::time::Duration;

use wecom_api::auth::{AuthorizedCorpSource, SuiteTicketSource, TokenProvider};
use wecom_api::client::WecomClient;
use wecom_api::error::WecomError;
use wecom_api::external_contact::list_external_contacts;
use wecom_api::job::PollConfig;
use wecom_api::suite::*;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ok(extra: serde_json::Value) -> ResponseTemplate {
    let mut body = serde_json::json!({"errcode": 0, "errmsg": "ok"});
    if let (Some(body), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
        body.extend(extra.clone());
    }
    ResponseTemplate::new(200).set_body_json(body)
}

fn suite_source(server: &MockServer) -> Arc<SuiteTicketSource> {
    Arc::new(SuiteTicketSource::new("ww-suite", "suite-secret").with_base_url(&server.uri()))
}

/// Provider client already holding `prov-token`; the source is never hit.
fn provider_client(server: &MockServer) -> WecomClient {
    let source = Arc::new(
        wecom_api::auth::ProviderSecretSource::new("ww-provider", "provider-secret")
            .with_base_url(&server.uri()),
    );
    WecomClient::with_base_url(TokenProvider::with_token(source, "prov-token"), &server.uri())
}

// ── suite token ────────────────────────────────────────────────────────

#[tokio::test]
async fn suite_token_is_exchanged_for_the_pushed_ticket() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/cgi-bin/service/get_suite_token"))
        .and(body_json(serde_json::json!({
            "suite_id": "ww-suite",
            "suite_secret": "suite-secret",
            "suite_ticket": "ticket-1"
        })))
        .respond_with(ok(serde_json::json!({
            "suite_access_token": "suite-token",
            "expires_in": 7200
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/service/get_pre_auth_code"))
        .and(query_param("suite_access_token", "suite-token"))
        .respond_with(ok(serde_json::json!({
            "pre_auth_code": "Cx_Dk6qiBE0Dmx4EmlT3oRfArPvwSQ-oa3NL_fwHM7VI08r52wazoZX2Rhpz1dEw",
            "expires_in": 1200
        })))
        .expect(1)
        .mount(&server)
        .await;

    let source = suite_source(&server);
    source.set_ticket("ticket-1");
    let client = WecomClient::with_base_url(TokenProvider::new(source), &server.uri());

    let url = install_url(&client, "ww-suite", "https://example.com/cb", "st", false)
        .await
        .unwrap();
    assert!(url.starts_with(INSTALL_URL), "{url}");
    assert!(url.contains("suite_id=ww-suite"), "{url}");
    assert!(url.contains("pre_auth_code=Cx_Dk6qiBE0Dmx4EmlT3oRfArPvwSQ-oa3NL_fwHM7VI08r52wazoZX2Rhpz1dEw"));
    assert!(url.contains("redirect_uri=https%3A%2F%2Fexample.com%2Fcb"), "{url}");
}

#[tokio::test]
async fn suite_without_ticket_fails_before_calling_the_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/service/get_pre_auth_code"))
        .respond_with(ok(serde_json::json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let client = WecomClient::with_base_url(TokenProvider::new(suite_source(&server)), &server.uri());
    let err = get_pre_auth_code(&client).await.unwrap_err();
    assert!(matches!(err, WecomError::Auth { .. }), "got {err:?}");
}

#[tokio::test]
async fn expired_suite_token_is_refreshed_with_the_latest_ticket() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/cgi-bin/service/get_suite_token"))
        .and(body_json(serde_json::json!({
            "suite_id": "ww-suite",
            "suite_secret": "suite-secret",
            "suite_ticket": "ticket-2"
        })))
        .respond_with(ok(serde_json::json!({
            "suite_access_token": "suite-fresh",
            "expires_in": 7200
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/cgi-bin/service/get_permanent_code"))
        .and(query_param("suite_access_token", "suite-old"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errcode": 42009,
            "errmsg": "suite_access_token expired"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/cgi-bin/service/get_permanent_code"))
        .and(query_param("suite_access_token", "suite-fresh"))
        .and(body_json(serde_json::json!({"auth_code": "auth-1"})))
        .respond_with(ok(serde_json::json!({
            "permanent_code": "perm-1",
            "auth_corp_info": {"corpid": "ww-customer", "corp_name": "Customer", "subject_type": 1}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let source = suite_source(&server);
    source.set_ticket("ticket-2");
    let client = WecomClient::with_base_url(
        TokenProvider::with_token(source, "suite-old"),
        &server.uri(),
    );

    let info = get_permanent_code(&client, "auth-1").await.unwrap();
    assert_eq!(info.permanent_code, "perm-1");
    assert_eq!(info.auth_corp_info.corpid, "ww-customer");
}

// ── authorized corp tokens ─────────────────────────────────────────────

#[tokio::test]
async fn authorized_corp_client_gets_its_token_through_the_suite() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/cgi-bin/service/get_corp_token"))
        .and(query_param("suite_access_token", "suite-token"))
        .and(body_json(serde_json::json!({
            "auth_corpid": "ww-customer",
            "permanent_code": "perm-1"
        })))
        .respond_with(ok(serde_json::json!({
            "access_token": "corp-token",
            "expires_in": 7200
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/externalcontact/list"))
        .and(query_param("access_token", "corp-token"))
        .and(query_param("userid", "zhangsan"))
        .respond_with(ok(serde_json::json!({
            "external_userid": ["wm1", "wm2"]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let suite = Arc::new(WecomClient::with_base_url(
        TokenProvider::with_token(suite_source(&server), "suite-token"),
        &server.uri(),
    ));
    let corp_source = Arc::new(AuthorizedCorpSource::new(suite, "ww-customer", "perm-1"));
    let corp = WecomClient::with_base_url(TokenProvider::new(corp_source), &server.uri());

    assert_eq!(
        list_external_contacts(&corp, "zhangsan").await.unwrap(),
        vec!["wm1", "wm2"]
    );
    list_external_contacts(&corp, "zhangsan").await.unwrap();
}

#[tokio::test]
async fn corp_token_failure_is_an_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/cgi-bin/service/get_corp_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errcode": 40084,
            "errmsg": "invalid permanent_code"
        })))
        .mount(&server)
        .await;

    let suite = Arc::new(WecomClient::with_base_url(
        TokenProvider::with_token(suite_source(&server), "suite-token"),
        &server.uri(),
    ));
    let corp_source = Arc::new(AuthorizedCorpSource::new(suite, "ww-customer", "bad"));
    let corp = WecomClient::with_base_url(TokenProvider::new(corp_source), &server.uri());

    let err = list_external_contacts(&corp, "zhangsan").await.unwrap_err();
    match err {
        WecomError::Auth { message, .. } => assert!(message.contains("ww-customer"), "{message}"),
        other => panic!("expected Auth error, got {other:?}"),
    }
}

// ── provider endpoints ─────────────────────────────────────────────────

#[tokio::test]
async fn login_info_sends_provider_token_as_access_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/cgi-bin/service/get_login_info"))
        .and(query_param("access_token", "prov-token"))
        .and(body_json(serde_json::json!({"auth_code": "code-1"})))
        .respond_with(ok(serde_json::json!({
            "usertype": 1,
            "user_info": {"userid": "xxxx", "open_userid": "xxx", "name": "xxxx"},
            "corp_info": {"corpid": "wxCorpId"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let info = get_login_info(&provider_client(&server), "code-1").await.unwrap();
    assert_eq!(info.usertype, 1);
    assert_eq!(info.corp_info.corpid, "wxCorpId");
}

#[tokio::test]
async fn contact_sync_success_uses_the_callers_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/sync/contact_sync_success"))
        .and(query_param("access_token", "one-off"))
        .respond_with(ok(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    contact_sync_success(&provider_client(&server), "one-off")
        .await
        .unwrap();
}

#[tokio::test]
async fn translate_contact_ids_runs_upload_job_and_download() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/cgi-bin/service/media/upload"))
        .and(query_param("provider_access_token", "prov-token"))
        .and(query_param("type", "file"))
        .respond_with(ok(serde_json::json!({
            "type": "file",
            "media_id": "media-1",
            "created_at": "1380000000"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/cgi-bin/service/contact/id_translate"))
        .and(body_json(serde_json::json!({
            "auth_corpid": "ww-customer",
            "media_id_list": ["media-1"]
        })))
        .respond_with(ok(serde_json::json!({"jobid": "job-7"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/service/batch/getresult"))
        .and(query_param("jobid", "job-7"))
        .respond_with(ok(serde_json::json!({"status": 2, "type": "contact_id_translate"})))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    let download_url = format!("{}/files/translated.csv", server.uri());
    Mock::given(method("GET"))
        .and(path("/cgi-bin/service/batch/getresult"))
        .and(query_param("jobid", "job-7"))
        .respond_with(ok(serde_json::json!({
            "status": 3,
            "type": "contact_id_translate",
            "result": {"contact_id_translate": {"url": download_url}}
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files/translated.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"userid,name\nzhangsan,Zhang San\n".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let poll = PollConfig::new(Duration::from_millis(10), Duration::from_secs(5));
    let bytes = translate_contact_ids(
        &provider_client(&server),
        "ww-customer",
        "contacts.csv",
        b"$userName=zhangsan$".to_vec(),
        &poll,
    )
    .await
    .unwrap();
    assert_eq!(&bytes[..], b"userid,name\nzhangsan,Zhang San\n");
}

#[tokio::test]
async fn finished_job_without_url_is_a_job_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/cgi-bin/service/media/upload"))
        .respond_with(ok(serde_json::json!({"type": "file", "media_id": "media-1"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cgi-bin/service/contact/id_translate"))
        .respond_with(ok(serde_json::json!({"jobid": "job-8"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/service/batch/getresult"))
        .respond_with(ok(serde_json::json!({"status": 3, "type": "contact_id_translate"})))
        .mount(&server)
        .await;

    let poll = PollConfig::new(Duration::from_millis(10), Duration::from_secs(5));
    let err = translate_contact_ids(&provider_client(&server), "ww-customer", "c.csv", vec![1], &poll)
        .await
        .unwrap_err();
    match err {
        WecomError::Job { job_id, .. } => assert_eq!(job_id, "job-8"),
        other => panic!("expected Job error, got {other:?}"),
    }
}

// ── upload token handling ──────────────────────────────────────────────

/// Provider client holding `token` up front, backed by the mocked provider
/// token endpoint.
fn provider_client_with(server: &MockServer, token: &str) -> WecomClient {
    let source = Arc::new(
        wecom_api::auth::ProviderSecretSource::new("ww-provider", "provider-secret")
            .with_base_url(&server.uri()),
    );
    WecomClient::with_base_url(TokenProvider::with_token(source, token), &server.uri())
}

#[tokio::test]
async fn rejected_upload_is_resent_with_a_fresh_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/cgi-bin/service/get_provider_token"))
        .respond_with(ok(serde_json::json!({
            "provider_access_token": "fresh",
            "expires_in": 7200
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/cgi-bin/service/media/upload"))
        .and(query_param("provider_access_token", "stale"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errcode": 42001,
            "errmsg": "access_token expired"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/cgi-bin/service/media/upload"))
        .and(query_param("provider_access_token", "fresh"))
        .and(query_param("type", "file"))
        .respond_with(ok(serde_json::json!({"type": "file", "media_id": "media-2"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = provider_client_with(&server, "stale");
    let media = upload_media(&client, "contacts.csv", b"$userName=zhangsan$".to_vec())
        .await
        .unwrap();
    assert_eq!(media.media_id, "media-2");
    assert_eq!(client.tokens().token().await.unwrap(), "fresh");
}

#[tokio::test]
async fn failed_refresh_after_rejection_drops_the_rejected_token() {
    let server = MockServer::start().await;

    // Both the refresh after the rejection and the next call's fetch fail.
    Mock::given(method("POST"))
        .and(path("/cgi-bin/service/get_provider_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errcode": 40013,
            "errmsg": "invalid corpid"
        })))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/cgi-bin/service/media/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errcode": 42001,
            "errmsg": "access_token expired"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = provider_client_with(&server, "stale");
    let first = upload_media(&client, "c.csv", vec![1]).await.unwrap_err();
    assert!(matches!(first, WecomError::Auth { .. }), "got {first:?}");

    // The stale token is gone, so this fails at the token fetch instead of
    // sending it to the upload endpoint again.
    let second = upload_media(&client, "c.csv", vec![1]).await.unwrap_err();
    assert!(matches!(second, WecomError::Auth { .. }), "got {second:?}");
}

// ── OAuth identity ─────────────────────────────────────────────────────

#[tokio::test]
async fn user_info_3rd_auth_resolves_code_with_suite_token() {
    let server = MockServer::start().await;
    let source = suite_source(&server);
    let client = WecomClient::with_base_url(
        TokenProvider::with_token(source, "suite-token"),
        &server.uri(),
    );

    Mock::given(method("GET"))
        .and(path("/cgi-bin/service/auth/getuserinfo3rd"))
        .and(query_param("suite_access_token", "suite-token"))
        .and(query_param("code", "CODE"))
        .respond_with(ok(serde_json::json!({
            "corpid": "ww-customer",
            "userid": "lisi",
            "user_ticket": "USER_TICKET",
            "expires_in": 7200,
            "open_userid": "wwopen1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let info = get_user_info_3rd_auth(&client, "CODE").await.unwrap();
    assert_eq!(info.corpid, "ww-customer");
    assert_eq!(info.userid, "lisi");
    assert_eq!(info.open_userid, "wwopen1");
    assert_eq!(info.user_ticket, "USER_TICKET");
}
