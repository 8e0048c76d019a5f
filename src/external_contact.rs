//! Customer contact ("external contact") endpoints.
//!
//! Covers the `cgi-bin/externalcontact/*` family used by an app-domain
//! client:
//!
//! - Customers: [`get_external_contact`], [`batch_get_by_user`],
//!   [`list_external_contacts`], [`remark_external_contact`],
//!   [`get_new_external_userid`].
//! - "Contact me" configurations: [`add_contact_way`],
//!   [`list_contact_ways`], [`get_contact_way`], [`delete_contact_way`].
//! - Corporate tags: [`get_corp_tag_list`], [`add_corp_tag`], [`mark_tag`].
//! - Customer groups: [`list_group_chats`], [`get_group_chat`],
//!   [`group_chat_statistic`], [`get_user_behavior_data`].
//! - Moments: [`get_moment_list`], [`add_moment_task`],
//!   [`get_moment_task_result`], [`wait_moment_task`].
//! - Mass messaging: [`add_msg_template`], [`get_groupmsg_list`],
//!   [`get_groupmsg_task`], [`get_groupmsg_send_result`],
//!   [`remind_groupmsg_send`], [`send_welcome_msg`].
//! - Acquisition links: [`create_acquisition_link`].
//!
//! Paginated endpoints return `next_cursor`; pass it back in the next
//! request's `cursor` field. An empty `next_cursor` means the last page.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::client::WecomClient;
use crate::envelope::Envelope;
use crate::error::Result;
use crate::job::{JobState, JobStatus, PollConfig, poll_job};
use crate::message::{Attachment, MediaRef, Text};

// ── Customers ──────────────────────────────────────────────────────────

/// Profile of an external (customer) contact.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalContact {
    pub external_userid: String,
    pub name: String,
    pub avatar: String,
    /// `1` WeChat user, `2` WeCom user.
    #[serde(rename = "type")]
    pub contact_type: i64,
    /// `0` unknown, `1` male, `2` female.
    pub gender: i64,
    pub unionid: String,
    pub position: String,
    pub corp_name: String,
    pub corp_full_name: String,
    /// Free-form profile attributes configured by the customer's corp.
    pub external_profile: Option<serde_json::Value>,
}

/// A tag a member attached to a customer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowTag {
    pub group_name: String,
    pub tag_name: String,
    pub tag_id: String,
    /// `1` corp tag, `2` personal tag, `3` rule-group tag.
    #[serde(rename = "type")]
    pub tag_type: i64,
}

/// The relationship between one member and a customer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowUser {
    pub userid: String,
    pub remark: String,
    pub description: String,
    pub createtime: i64,
    pub tags: Vec<FollowTag>,
    pub remark_corp_name: String,
    pub remark_mobiles: Vec<String>,
    pub oper_userid: String,
    /// Source of the add; see the WeCom "add_way" table.
    pub add_way: i64,
    /// The `state` of the "contact me" configuration the customer came
    /// through, if any.
    pub state: String,
}

/// Response of [`get_external_contact`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExternalContactDetail {
    pub external_contact: ExternalContact,
    pub follow_user: Vec<FollowUser>,
    /// Set when the customer has more follow users than fit in one page.
    pub next_cursor: String,
}

/// Follow information as returned by the batch endpoint: the follow user
/// fields plus flat tag IDs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FollowInfo {
    #[serde(flatten)]
    pub follow: FollowUser,
    #[serde(default)]
    pub tag_id: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BatchContact {
    pub external_contact: ExternalContact,
    pub follow_info: FollowInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchGetByUserRequest {
    pub userid_list: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cursor: String,
    /// Page size, at most 100.
    pub limit: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BatchContactPage {
    pub external_contact_list: Vec<BatchContact>,
    pub next_cursor: String,
}

/// Request body of [`remark_external_contact`]. Empty fields are left
/// unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RemarkRequest {
    pub userid: String,
    pub external_userid: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub remark: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub remark_company: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub remark_mobiles: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub remark_pic_mediaid: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExternalUseridMapping {
    pub external_userid: String,
    pub new_external_userid: String,
}

/// Fetches a customer's profile and the members following them.
///
/// # Errors
///
/// - `WecomError::Api` for a non-zero `errcode` (e.g. `84061` when the
///   customer is not a contact of any member).
/// - `WecomError::Auth` / `WecomError::Network` as for any request.
pub async fn get_external_contact(
    client: &WecomClient,
    external_userid: &str,
) -> Result<ExternalContactDetail> {
    client
        .get(
            "cgi-bin/externalcontact/get",
            &[("external_userid", external_userid)],
        )
        .await
}

/// Fetches the customers of several members in one paginated call.
pub async fn batch_get_by_user(
    client: &WecomClient,
    request: &BatchGetByUserRequest,
) -> Result<BatchContactPage> {
    client
        .post("cgi-bin/externalcontact/batch/get_by_user", request)
        .await
}

/// Lists the `external_userid`s of one member's customers.
pub async fn list_external_contacts(client: &WecomClient, userid: &str) -> Result<Vec<String>> {
    #[derive(Deserialize)]
    struct Resp {
        #[serde(default)]
        external_userid: Vec<String>,
    }
    let resp: Resp = client
        .get("cgi-bin/externalcontact/list", &[("userid", userid)])
        .await?;
    Ok(resp.external_userid)
}

/// Updates a member's remark on a customer.
pub async fn remark_external_contact(client: &WecomClient, request: &RemarkRequest) -> Result<()> {
    let _: Envelope = client
        .post("cgi-bin/externalcontact/remark", request)
        .await?;
    Ok(())
}

/// Maps legacy `external_userid`s to the IDs issued after a corp upgrade.
pub async fn get_new_external_userid(
    client: &WecomClient,
    external_userids: &[String],
) -> Result<Vec<ExternalUseridMapping>> {
    #[derive(Deserialize)]
    struct Resp {
        #[serde(default)]
        items: Vec<ExternalUseridMapping>,
    }
    let resp: Resp = client
        .post(
            "cgi-bin/externalcontact/get_new_external_userid",
            &json!({ "external_userid_list": external_userids }),
        )
        .await?;
    Ok(resp.items)
}

// ── "Contact me" ───────────────────────────────────────────────────────

/// Content shown to a customer after a temporary session ends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Conclusions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Text>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<MediaRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<crate::message::Link>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub miniprogram: Option<crate::message::Miniprogram>,
}

/// A "contact me" configuration: a QR code or mini program button that
/// lets customers add one or more members.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactWay {
    /// Assigned by WeCom; leave empty when creating.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub config_id: String,
    /// `1` single member, `2` multiple members.
    #[serde(rename = "type")]
    pub way_type: i64,
    /// `1` mini program, `2` QR code.
    pub scene: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub style: i64,
    pub remark: String,
    pub skip_verify: bool,
    pub state: String,
    pub user: Vec<String>,
    pub party: Vec<i64>,
    pub is_temp: bool,
    #[serde(skip_serializing_if = "is_zero")]
    pub expires_in: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub chat_expires_in: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub unionid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conclusions: Option<Conclusions>,
    /// Only present in responses.
    #[serde(skip_serializing)]
    pub qr_code: String,
}

fn is_zero(v: &i64) -> bool {
    *v == 0
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewContactWay {
    pub config_id: String,
    pub qr_code: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ListContactWaysRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cursor: String,
    /// Page size, at most 1000.
    pub limit: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactWayRef {
    pub config_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactWayPage {
    pub contact_way: Vec<ContactWayRef>,
    pub next_cursor: String,
}

/// Creates a "contact me" configuration.
pub async fn add_contact_way(client: &WecomClient, way: &ContactWay) -> Result<NewContactWay> {
    client
        .post("cgi-bin/externalcontact/add_contact_way", way)
        .await
}

/// Lists configuration IDs created in a time window.
pub async fn list_contact_ways(
    client: &WecomClient,
    request: &ListContactWaysRequest,
) -> Result<ContactWayPage> {
    client
        .post("cgi-bin/externalcontact/list_contact_way", request)
        .await
}

pub async fn get_contact_way(client: &WecomClient, config_id: &str) -> Result<ContactWay> {
    #[derive(Deserialize)]
    struct Resp {
        contact_way: ContactWay,
    }
    let resp: Resp = client
        .post(
            "cgi-bin/externalcontact/get_contact_way",
            &json!({ "config_id": config_id }),
        )
        .await?;
    Ok(resp.contact_way)
}

pub async fn delete_contact_way(client: &WecomClient, config_id: &str) -> Result<()> {
    let _: Envelope = client
        .post(
            "cgi-bin/externalcontact/del_contact_way",
            &json!({ "config_id": config_id }),
        )
        .await?;
    Ok(())
}

// ── Corporate tags ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CorpTag {
    pub id: String,
    pub name: String,
    pub create_time: i64,
    pub order: i64,
    pub deleted: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TagGroup {
    pub group_id: String,
    pub group_name: String,
    pub create_time: i64,
    pub order: i64,
    pub deleted: bool,
    pub tag: Vec<CorpTag>,
}

/// Filter for [`get_corp_tag_list`]. Both lists empty returns every tag;
/// `group_id` takes precedence when both are set.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CorpTagFilter {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tag_id: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub group_id: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewTag {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

/// Adds tags to an existing group (`group_id`) or creates a group
/// (`group_name`).
#[derive(Debug, Clone, Default, Serialize)]
pub struct AddCorpTagRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    pub tag: Vec<NewTag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agentid: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MarkTagRequest {
    pub userid: String,
    pub external_userid: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub add_tag: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub remove_tag: Vec<String>,
}

pub async fn get_corp_tag_list(
    client: &WecomClient,
    filter: &CorpTagFilter,
) -> Result<Vec<TagGroup>> {
    #[derive(Deserialize)]
    struct Resp {
        #[serde(default)]
        tag_group: Vec<TagGroup>,
    }
    let resp: Resp = client
        .post("cgi-bin/externalcontact/get_corp_tag_list", filter)
        .await?;
    Ok(resp.tag_group)
}

/// Returns the group the tags were added to, with the new tag IDs.
pub async fn add_corp_tag(client: &WecomClient, request: &AddCorpTagRequest) -> Result<TagGroup> {
    #[derive(Deserialize)]
    struct Resp {
        tag_group: TagGroup,
    }
    let resp: Resp = client
        .post("cgi-bin/externalcontact/add_corp_tag", request)
        .await?;
    Ok(resp.tag_group)
}

/// Adds and removes corp tags on a customer, as seen by one member.
pub async fn mark_tag(client: &WecomClient, request: &MarkTagRequest) -> Result<()> {
    let _: Envelope = client
        .post("cgi-bin/externalcontact/mark_tag", request)
        .await?;
    Ok(())
}

// ── Customer groups ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize)]
pub struct OwnerFilter {
    pub userid_list: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GroupChatListRequest {
    /// `0` all, `1` leaving, `2` transferred, `3` transfer pending.
    #[serde(skip_serializing_if = "is_zero")]
    pub status_filter: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_filter: Option<OwnerFilter>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cursor: String,
    pub limit: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GroupChatRef {
    pub chat_id: String,
    pub status: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GroupChatPage {
    pub group_chat_list: Vec<GroupChatRef>,
    pub next_cursor: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Invitor {
    pub userid: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GroupMember {
    pub userid: String,
    /// `1` corp member, `2` external contact.
    #[serde(rename = "type")]
    pub member_type: i64,
    pub join_time: i64,
    pub join_scene: i64,
    pub invitor: Option<Invitor>,
    pub group_nickname: String,
    /// Only populated when `need_name` was requested.
    pub name: String,
    pub unionid: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GroupAdmin {
    pub userid: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GroupChat {
    pub chat_id: String,
    pub name: String,
    pub owner: String,
    pub create_time: i64,
    pub notice: String,
    pub member_list: Vec<GroupMember>,
    pub admin_list: Vec<GroupAdmin>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GroupChatStatisticRequest {
    pub day_begin_time: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub day_end_time: i64,
    pub owner_filter: OwnerFilter,
    #[serde(skip_serializing_if = "is_zero")]
    pub order_by: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub order_asc: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub offset: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub limit: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GroupChatStatData {
    pub new_chat_cnt: i64,
    pub chat_total: i64,
    pub chat_has_msg: i64,
    pub new_member_cnt: i64,
    pub member_total: i64,
    pub member_has_msg: i64,
    pub msg_total: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GroupChatStatItem {
    pub owner: String,
    pub data: GroupChatStatData,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GroupChatStatistic {
    pub total: i64,
    pub next_offset: i64,
    pub items: Vec<GroupChatStatItem>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UserBehaviorRequest {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub userid: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub partyid: Vec<i64>,
    pub start_time: i64,
    pub end_time: i64,
}

/// Daily contact statistics for one member or department.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BehaviorData {
    pub stat_time: i64,
    pub chat_cnt: i64,
    pub message_cnt: i64,
    pub reply_percentage: f64,
    pub avg_reply_time: i64,
    pub negative_feedback_cnt: i64,
    pub new_apply_cnt: i64,
    pub new_contact_cnt: i64,
}

pub async fn list_group_chats(
    client: &WecomClient,
    request: &GroupChatListRequest,
) -> Result<GroupChatPage> {
    client
        .post("cgi-bin/externalcontact/groupchat/list", request)
        .await
}

/// Fetches a customer group with its members. `need_name` asks WeCom to
/// fill in member display names.
pub async fn get_group_chat(client: &WecomClient, chat_id: &str, need_name: bool) -> Result<GroupChat> {
    #[derive(Deserialize)]
    struct Resp {
        group_chat: GroupChat,
    }
    let resp: Resp = client
        .post(
            "cgi-bin/externalcontact/groupchat/get",
            &json!({ "chat_id": chat_id, "need_name": i64::from(need_name) }),
        )
        .await?;
    Ok(resp.group_chat)
}

pub async fn group_chat_statistic(
    client: &WecomClient,
    request: &GroupChatStatisticRequest,
) -> Result<GroupChatStatistic> {
    client
        .post("cgi-bin/externalcontact/groupchat/statistic", request)
        .await
}

pub async fn get_user_behavior_data(
    client: &WecomClient,
    request: &UserBehaviorRequest,
) -> Result<Vec<BehaviorData>> {
    #[derive(Deserialize)]
    struct Resp {
        #[serde(default)]
        behavior_data: Vec<BehaviorData>,
    }
    let resp: Resp = client
        .post("cgi-bin/externalcontact/get_user_behavior_data", request)
        .await?;
    Ok(resp.behavior_data)
}

// ── Moments ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize)]
pub struct MomentListRequest {
    pub start_time: i64,
    pub end_time: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub creator: String,
    /// `0` corp posts, `1` personal posts, `2` all.
    #[serde(skip_serializing_if = "is_zero")]
    pub filter_type: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cursor: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub limit: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Moment {
    pub moment_id: String,
    pub creator: String,
    pub create_time: i64,
    pub create_type: i64,
    pub visible_type: i64,
    pub text: Option<Text>,
    pub image: Vec<MediaRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MomentPage {
    pub moment_list: Vec<Moment>,
    pub next_cursor: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SenderList {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub user_list: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub department_list: Vec<i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CustomerTagList {
    pub tag_list: Vec<String>,
}

/// Who may publish the moment and which customers see it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VisibleRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_list: Option<SenderList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_contact_list: Option<CustomerTagList>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MomentTask {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Text>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible_range: Option<VisibleRange>,
}

/// Outcome of a finished moment task.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MomentTaskOutcome {
    pub errcode: i64,
    pub errmsg: String,
    pub moment_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MomentTaskResult {
    pub status: JobStatus,
    #[serde(default, rename = "type")]
    pub task_type: String,
    #[serde(default)]
    pub result: Option<MomentTaskOutcome>,
}

impl JobState for MomentTaskResult {
    fn job_status(&self) -> JobStatus {
        self.status
    }
}

pub async fn get_moment_list(client: &WecomClient, request: &MomentListRequest) -> Result<MomentPage> {
    client
        .post("cgi-bin/externalcontact/get_moment_list", request)
        .await
}

/// Starts publishing a moment. Returns the `jobid`; the moment ID is
/// available from [`get_moment_task_result`] once the job finishes.
pub async fn add_moment_task(client: &WecomClient, task: &MomentTask) -> Result<String> {
    #[derive(Deserialize)]
    struct Resp {
        jobid: String,
    }
    let resp: Resp = client
        .post("cgi-bin/externalcontact/add_moment_task", task)
        .await?;
    Ok(resp.jobid)
}

pub async fn get_moment_task_result(client: &WecomClient, jobid: &str) -> Result<MomentTaskResult> {
    client
        .get(
            "cgi-bin/externalcontact/get_moment_task_result",
            &[("jobid", jobid)],
        )
        .await
}

/// Polls a moment task until it finishes and returns the new `moment_id`.
///
/// # Errors
///
/// - `WecomError::Timeout` if the job doesn't finish within
///   `config.timeout`.
/// - `WecomError::Api` carrying the task's own `errcode` when the job
///   finished but publishing failed.
pub async fn wait_moment_task(
    client: &WecomClient,
    jobid: &str,
    config: &PollConfig,
) -> Result<String> {
    let finished = poll_job(jobid, config, || get_moment_task_result(client, jobid)).await?;
    let outcome = finished.result.unwrap_or_default();
    Envelope {
        errcode: outcome.errcode,
        errmsg: outcome.errmsg,
    }
    .into_result()?;
    Ok(outcome.moment_id)
}

// ── Mass messaging ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize)]
pub struct TagGroupFilter {
    pub tag_list: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TagFilter {
    pub group_list: Vec<TagGroupFilter>,
}

/// A mass-send task for members to deliver to customers or groups.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MsgTemplate {
    /// `single` (customers) or `group` (customer groups).
    #[serde(skip_serializing_if = "String::is_empty")]
    pub chat_type: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub external_userid: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub chat_id_list: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_filter: Option<TagFilter>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sender: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub allow_select: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Text>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MsgTemplateResult {
    /// Customers that could not receive the message.
    pub fail_list: Vec<String>,
    pub msgid: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GroupMsgListRequest {
    pub chat_type: String,
    pub start_time: i64,
    pub end_time: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub creator: String,
    /// `0` corp, `1` personal, `2` all.
    pub filter_type: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub limit: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cursor: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GroupMsg {
    pub msgid: String,
    pub creator: String,
    /// Unix seconds; WeCom sends this one as a string.
    pub create_time: String,
    pub create_type: i64,
    pub text: Option<Text>,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GroupMsgPage {
    pub group_msg_list: Vec<GroupMsg>,
    pub next_cursor: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GroupMsgTask {
    pub userid: String,
    /// `0` not sent, `2` sent.
    pub status: i64,
    pub send_time: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GroupMsgTaskPage {
    pub task_list: Vec<GroupMsgTask>,
    pub next_cursor: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GroupMsgSendResultRequest {
    pub msgid: String,
    pub userid: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub limit: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cursor: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SendResult {
    pub external_userid: String,
    pub chat_id: String,
    pub userid: String,
    /// `0` not sent, `1` sent, `2` not a friend, `3` customer's quota hit.
    pub status: i64,
    pub send_time: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SendResultPage {
    pub send_list: Vec<SendResult>,
    pub next_cursor: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WelcomeMsg {
    pub welcome_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Text>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

pub async fn add_msg_template(
    client: &WecomClient,
    template: &MsgTemplate,
) -> Result<MsgTemplateResult> {
    client
        .post("cgi-bin/externalcontact/add_msg_template", template)
        .await
}

pub async fn get_groupmsg_list(
    client: &WecomClient,
    request: &GroupMsgListRequest,
) -> Result<GroupMsgPage> {
    client
        .post("cgi-bin/externalcontact/get_groupmsg_list_v2", request)
        .await
}

/// Lists which members have executed a mass-send task.
pub async fn get_groupmsg_task(
    client: &WecomClient,
    msgid: &str,
    cursor: &str,
) -> Result<GroupMsgTaskPage> {
    client
        .post(
            "cgi-bin/externalcontact/get_groupmsg_task",
            &json!({ "msgid": msgid, "cursor": cursor }),
        )
        .await
}

pub async fn get_groupmsg_send_result(
    client: &WecomClient,
    request: &GroupMsgSendResultRequest,
) -> Result<SendResultPage> {
    client
        .post("cgi-bin/externalcontact/get_groupmsg_send_result", request)
        .await
}

/// Reminds members who haven't sent a mass message yet.
pub async fn remind_groupmsg_send(client: &WecomClient, msgid: &str) -> Result<()> {
    let _: Envelope = client
        .post(
            "cgi-bin/externalcontact/remind_groupmsg_send",
            &json!({ "msgid": msgid }),
        )
        .await?;
    Ok(())
}

/// Sends the welcome message for a new contact event. `welcome_code` comes
/// from the add-contact callback and is valid for 20 seconds.
pub async fn send_welcome_msg(client: &WecomClient, msg: &WelcomeMsg) -> Result<()> {
    let _: Envelope = client
        .post("cgi-bin/externalcontact/send_welcome_msg", msg)
        .await?;
    Ok(())
}

// ── Acquisition links ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize)]
pub struct LinkRange {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub user_list: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub department_list: Vec<i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateLinkRequest {
    pub link_name: String,
    pub range: LinkRange,
    pub skip_verify: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AcquisitionLink {
    pub link_id: String,
    pub link_name: String,
    pub url: String,
    pub create_time: i64,
}

pub async fn create_acquisition_link(
    client: &WecomClient,
    request: &CreateLinkRequest,
) -> Result<AcquisitionLink> {
    #[derive(Deserialize)]
    struct Resp {
        link: AcquisitionLink,
    }
    let resp: Resp = client
        .post(
            "cgi-bin/externalcontact/customer_acquisition/create_link",
            request,
        )
        .await?;
    Ok(resp.link)
}
