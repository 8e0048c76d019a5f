//! Third-party application ("suite") authorization and service-provider
//! endpoints.
//!
//! Two credential domains meet here:
//!
//! - **Suite** (`suite_access_token`): installation and authorization of
//!   the suite by customer corps, permanent codes, per-corp app tokens,
//!   and identifying users who open the app.
//! - **Provider** (`provider_access_token`): provider-level login, the
//!   registration flow, media upload and the contact ID translation job.
//!
//! Each function documents which client it expects. Passing a client of
//! the wrong domain sends the wrong token parameter and WeCom answers with
//! an `Api` error.
//!
//! ## Contact ID translation
//!
//! Translating encrypted contact IDs in a file is a four-step flow, wrapped
//! by [`translate_contact_ids`]:
//!
//! 1. Upload the file ([`upload_media`]) and get a `media_id`.
//! 2. Start the job ([`contact_id_translate`]) and get a `jobid`.
//! 3. Poll [`get_job_result`] until the job reports finished.
//! 4. Download the translated file from the URL in the result. The URL is
//!    pre-signed, so the download carries no token.

use bytes::Bytes;
use reqwest::Url;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::client::WecomClient;
use crate::envelope::Envelope;
use crate::error::{Result, WecomError};
use crate::job::{JobState, JobStatus, PollConfig, poll_job};

/// Page the corp administrator is sent to for installing the suite.
pub const INSTALL_URL: &str = "https://open.work.weixin.qq.com/3rdapp/install";

/// Page that starts the corp registration flow.
pub const REGISTER_URL: &str = "https://open.work.weixin.qq.com/3rdservice/wework/register";

// ── Authorization types ────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PreAuthCode {
    pub pre_auth_code: String,
    pub expires_in: u64,
}

/// An app token for an authorized corp.
#[derive(Debug, Clone, Deserialize)]
pub struct CorpToken {
    pub access_token: String,
    pub expires_in: u64,
}

/// The authorizing corporation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthCorpInfo {
    pub corpid: String,
    pub corp_name: String,
    pub corp_full_name: String,
    pub corp_type: String,
    pub corp_round_logo_url: String,
    pub corp_square_logo_url: String,
    pub corp_user_max: i64,
    pub corp_agent_max: i64,
    pub corp_wxqrcode: String,
    /// Reported as a number by some API versions and a string by others.
    pub subject_type: serde_json::Value,
    pub verified_end_time: serde_json::Value,
}

/// Application fields shared by the authorization and agent endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentBase {
    pub agentid: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub round_logo_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub square_logo_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub redirect_domain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_location_flag: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isreportenter: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthorizedAgent {
    #[serde(flatten)]
    pub agent: AgentBase,
    pub appid: i64,
    pub api_group: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthorizedDepartment {
    pub id: i64,
    pub name: String,
    pub parentid: i64,
    pub writable: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthInfo {
    pub agent: Vec<AuthorizedAgent>,
    pub department: Vec<AuthorizedDepartment>,
}

/// The administrator who performed the authorization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthUser {
    pub userid: String,
    pub open_userid: String,
    pub name: String,
    pub avatar: String,
}

/// Result of exchanging a temporary auth code.
///
/// `permanent_code` must be stored: it is the only way to obtain app
/// tokens for this corp later.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PermanentCodeInfo {
    pub access_token: String,
    pub expires_in: u64,
    pub permanent_code: String,
    pub auth_corp_info: AuthCorpInfo,
    pub auth_info: AuthInfo,
    pub auth_user_info: AuthUser,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CorpAuthInfo {
    pub auth_corp_info: AuthCorpInfo,
    pub auth_info: AuthInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AllowUser {
    pub userid: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AllowUsers {
    pub user: Vec<AllowUser>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AllowParties {
    pub partyid: Vec<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AllowTags {
    pub tagid: Vec<i64>,
}

/// An application as installed in an authorized corp.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CorpAgent {
    #[serde(flatten)]
    pub agent: AgentBase,
    pub allow_userinfos: AllowUsers,
    pub allow_partys: AllowParties,
    pub allow_tags: AllowTags,
    pub close: i64,
}

/// Settings to change on an installed application.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AgentEdit {
    #[serde(flatten)]
    pub agent: AgentBase,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub logo_mediaid: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Admin {
    pub userid: String,
    pub open_userid: String,
    /// `0` send-only, `1` manage.
    pub auth_type: i64,
}

/// Identity of a user who opened the suite's app through OAuth.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserInfo3rd {
    #[serde(rename = "CorpId", alias = "corpid")]
    pub corpid: String,
    #[serde(rename = "UserId", alias = "userid")]
    pub userid: String,
    #[serde(rename = "DeviceId", alias = "deviceid")]
    pub device_id: String,
    /// Exchange for sensitive fields with [`get_user_detail_3rd`].
    pub user_ticket: String,
    pub expires_in: u64,
    pub open_userid: String,
}

/// Identity returned by the OAuth endpoint under `service/auth/`.
///
/// Corp members carry `corpid`, `userid` and `open_userid`; visitors from
/// outside the corp carry `openid` and `external_userid` instead.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserInfo3rdAuth {
    pub corpid: String,
    pub userid: String,
    pub open_userid: String,
    /// Only set when the OAuth scope requested sensitive fields.
    pub user_ticket: String,
    pub expires_in: u64,
    pub openid: String,
    pub external_userid: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserDetail3rd {
    pub corpid: String,
    pub userid: String,
    pub name: String,
    pub gender: String,
    pub avatar: String,
    pub qr_code: String,
}

// ── Provider types ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginUser {
    pub userid: String,
    pub open_userid: String,
    pub name: String,
    pub avatar: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginCorp {
    pub corpid: String,
}

/// A user who signed in to the provider's web portal.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginInfo {
    /// `1` creator, `2` internal admin, `3` external admin, `4` member,
    /// `5` partner admin.
    pub usertype: i64,
    pub user_info: LoginUser,
    pub corp_info: LoginCorp,
    pub agent: Vec<AgentBase>,
    pub auth_info: AuthInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterCode {
    pub register_code: String,
    pub expires_in: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Media {
    #[serde(rename = "type")]
    pub media_type: String,
    pub media_id: String,
    /// Unix seconds, sent as a string.
    pub created_at: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IdTranslateRequest {
    pub auth_corpid: String,
    pub media_id_list: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub output_file_name: String,
    /// Empty for the input format, or `pdf`.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub output_file_format: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranslatedFile {
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JobOutcome {
    pub contact_id_translate: Option<TranslatedFile>,
}

/// Status of a provider batch job.
#[derive(Debug, Clone, Deserialize)]
pub struct JobResult {
    pub status: JobStatus,
    #[serde(default, rename = "type")]
    pub job_type: String,
    #[serde(default)]
    pub result: Option<JobOutcome>,
}

impl JobState for JobResult {
    fn job_status(&self) -> JobStatus {
        self.status
    }
}

impl JobResult {
    /// Download URL of a finished ID translation, if present.
    pub fn translated_url(&self) -> Option<&str> {
        self.result
            .as_ref()
            .and_then(|r| r.contact_id_translate.as_ref())
            .map(|f| f.url.as_str())
            .filter(|u| !u.is_empty())
    }
}

fn page_url(base: &str, params: &[(&str, &str)]) -> Result<String> {
    Url::parse_with_params(base, params)
        .map(String::from)
        .map_err(|e| WecomError::config(format!("invalid page URL {base}: {e}")))
}

// ── Suite endpoints ────────────────────────────────────────────────────

/// Fetches a pre-authorization code (suite client).
pub async fn get_pre_auth_code(client: &WecomClient) -> Result<PreAuthCode> {
    client.get("cgi-bin/service/get_pre_auth_code", &[]).await
}

/// Sets the authorization type for a pre-auth code (suite client).
/// `auth_type` `1` marks a test installation, `0` a formal one.
pub async fn set_session_info(client: &WecomClient, pre_auth_code: &str, auth_type: i64) -> Result<()> {
    let _: Envelope = client
        .post(
            "cgi-bin/service/set_session_info",
            &json!({
                "pre_auth_code": pre_auth_code,
                "session_info": { "auth_type": auth_type },
            }),
        )
        .await?;
    Ok(())
}

/// Builds the install page URL for a corp administrator (suite client).
///
/// Fetches a fresh pre-auth code. With `test_install` the code is first
/// marked as a test authorization, which only works for suites that are
/// still in development.
pub async fn install_url(
    client: &WecomClient,
    suite_id: &str,
    redirect_uri: &str,
    state: &str,
    test_install: bool,
) -> Result<String> {
    let code = get_pre_auth_code(client).await?;
    if test_install {
        set_session_info(client, &code.pre_auth_code, 1).await?;
    }
    page_url(
        INSTALL_URL,
        &[
            ("suite_id", suite_id),
            ("pre_auth_code", code.pre_auth_code.as_str()),
            ("redirect_uri", redirect_uri),
            ("state", state),
        ],
    )
}

/// Exchanges the temporary `auth_code` from the install callback for the
/// corp's permanent code (suite client).
pub async fn get_permanent_code(client: &WecomClient, auth_code: &str) -> Result<PermanentCodeInfo> {
    client
        .post(
            "cgi-bin/service/get_permanent_code",
            &json!({ "auth_code": auth_code }),
        )
        .await
}

pub async fn get_corp_auth_info(
    client: &WecomClient,
    auth_corpid: &str,
    permanent_code: &str,
) -> Result<CorpAuthInfo> {
    client
        .post(
            "cgi-bin/service/get_auth_info",
            &json!({ "auth_corpid": auth_corpid, "permanent_code": permanent_code }),
        )
        .await
}

pub async fn get_corp_agent(
    client: &WecomClient,
    auth_corpid: &str,
    permanent_code: &str,
    agentid: i64,
) -> Result<CorpAgent> {
    client
        .post(
            "cgi-bin/service/get_agent",
            &json!({
                "auth_corpid": auth_corpid,
                "permanent_code": permanent_code,
                "agentid": agentid,
            }),
        )
        .await
}

pub async fn set_corp_agent(
    client: &WecomClient,
    auth_corpid: &str,
    permanent_code: &str,
    agent: &AgentEdit,
) -> Result<()> {
    #[derive(Serialize)]
    struct Body<'a> {
        auth_corpid: &'a str,
        permanent_code: &'a str,
        agent: &'a AgentEdit,
    }
    let _: Envelope = client
        .post(
            "cgi-bin/service/set_agent",
            &Body {
                auth_corpid,
                permanent_code,
                agent,
            },
        )
        .await?;
    Ok(())
}

/// Fetches an app token for an authorized corp (suite client).
///
/// [`crate::auth::AuthorizedCorpSource`] wraps this as a token source, so
/// most callers never call it directly.
pub async fn get_corp_token(
    client: &WecomClient,
    auth_corpid: &str,
    permanent_code: &str,
) -> Result<CorpToken> {
    client
        .post(
            "cgi-bin/service/get_corp_token",
            &json!({ "auth_corpid": auth_corpid, "permanent_code": permanent_code }),
        )
        .await
}

pub async fn get_admin_list(client: &WecomClient, auth_corpid: &str, agentid: i64) -> Result<Vec<Admin>> {
    #[derive(Deserialize)]
    struct Resp {
        #[serde(default)]
        admin: Vec<Admin>,
    }
    let resp: Resp = client
        .post(
            "cgi-bin/service/get_admin_list",
            &json!({ "auth_corpid": auth_corpid, "agentid": agentid }),
        )
        .await?;
    Ok(resp.admin)
}

/// Resolves an OAuth `code` to the visiting user (suite client).
pub async fn get_user_info_3rd(client: &WecomClient, code: &str) -> Result<UserInfo3rd> {
    client
        .get("cgi-bin/service/getuserinfo3rd", &[("code", code)])
        .await
}

/// Resolves an OAuth `code` through the `service/auth/` identity endpoint
/// (suite client). Unlike [`get_user_info_3rd`] this one uses lowercase
/// keys and also identifies non-members.
pub async fn get_user_info_3rd_auth(client: &WecomClient, code: &str) -> Result<UserInfo3rdAuth> {
    client
        .get("cgi-bin/service/auth/getuserinfo3rd", &[("code", code)])
        .await
}

pub async fn get_user_detail_3rd(client: &WecomClient, user_ticket: &str) -> Result<UserDetail3rd> {
    client
        .post(
            "cgi-bin/service/getuserdetail3rd",
            &json!({ "user_ticket": user_ticket }),
        )
        .await
}

// ── Provider endpoints ─────────────────────────────────────────────────

/// Resolves a web-login `auth_code` (provider client).
///
/// This endpoint takes the provider token under `access_token`.
pub async fn get_login_info(client: &WecomClient, auth_code: &str) -> Result<LoginInfo> {
    client
        .post_with_token_param(
            "cgi-bin/service/get_login_info",
            "access_token",
            &json!({ "auth_code": auth_code }),
        )
        .await
}

pub async fn get_register_code(client: &WecomClient, template_id: &str) -> Result<RegisterCode> {
    client
        .post(
            "cgi-bin/service/get_register_code",
            &json!({ "template_id": template_id }),
        )
        .await
}

/// Builds the registration page URL for a fresh register code (provider
/// client).
pub async fn register_url(client: &WecomClient, template_id: &str) -> Result<String> {
    let code = get_register_code(client, template_id).await?;
    page_url(REGISTER_URL, &[("register_code", code.register_code.as_str())])
}

/// Tells WeCom the initial contact sync of a registered corp is done.
///
/// `access_token` is the one-off token delivered in the registration
/// callback, not a token this client manages.
pub async fn contact_sync_success(client: &WecomClient, access_token: &str) -> Result<()> {
    let _: Envelope = client
        .get_without_token(
            "cgi-bin/sync/contact_sync_success",
            &[("access_token", access_token)],
        )
        .await?;
    Ok(())
}

/// Uploads a file for later use by provider jobs (provider client).
pub async fn upload_media(client: &WecomClient, file_name: &str, content: Vec<u8>) -> Result<Media> {
    let build_form = || {
        let part = Part::bytes(content.clone()).file_name(file_name.to_string());
        Form::new().part("media", part)
    };
    client
        .upload_multipart("cgi-bin/service/media/upload", &[("type", "file")], build_form)
        .await
}

/// Starts an ID translation job and returns its `jobid` (provider client).
pub async fn contact_id_translate(client: &WecomClient, request: &IdTranslateRequest) -> Result<String> {
    #[derive(Deserialize)]
    struct Resp {
        jobid: String,
    }
    let resp: Resp = client
        .post("cgi-bin/service/contact/id_translate", request)
        .await?;
    Ok(resp.jobid)
}

pub async fn get_job_result(client: &WecomClient, jobid: &str) -> Result<JobResult> {
    client
        .get("cgi-bin/service/batch/getresult", &[("jobid", jobid)])
        .await
}

/// Runs a contact ID translation end to end and returns the translated
/// file (provider client).
///
/// # Errors
///
/// - `WecomError::Timeout` if the job is still running after
///   `poll.timeout`.
/// - `WecomError::Job` if the finished job carries no download URL.
/// - Any error of the underlying steps, unchanged.
pub async fn translate_contact_ids(
    client: &WecomClient,
    auth_corpid: &str,
    file_name: &str,
    content: Vec<u8>,
    poll: &PollConfig,
) -> Result<Bytes> {
    let media = upload_media(client, file_name, content).await?;
    tracing::debug!(media_id = %media.media_id, "uploaded file for translation");

    let request = IdTranslateRequest {
        auth_corpid: auth_corpid.to_string(),
        media_id_list: vec![media.media_id],
        ..Default::default()
    };
    let jobid = contact_id_translate(client, &request).await?;
    tracing::info!(jobid = %jobid, auth_corpid, "contact id translation started");

    let finished = poll_job(&jobid, poll, || get_job_result(client, &jobid)).await?;
    let url = finished.translated_url().ok_or_else(|| WecomError::Job {
        job_id: jobid.clone(),
        message: "no contact_id_translate url".to_string(),
    })?;

    client.download(url).await
}
