//! Interface licensing (`cgi-bin/license`).
//!
//! All functions expect a provider-domain client. Corps that install a
//! paid suite need one active account per member who uses the app; these
//! endpoints list purchase orders, activate codes and inspect or transfer
//! activated accounts.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::client::WecomClient;
use crate::envelope::Envelope;
use crate::error::Result;

// ── Accounts ───────────────────────────────────────────────────────────

/// A member's activation of one account.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ActiveRecord {
    pub active_code: String,
    /// `1` base account, `2` interworking account.
    #[serde(rename = "type")]
    pub account_type: i64,
    pub userid: String,
    pub active_time: i64,
    pub expire_time: i64,
}

/// Response of [`get_active_info_by_user`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserActiveInfo {
    /// `0` not activated, `1` activated.
    pub active_status: i64,
    pub active_info_list: Vec<ActiveRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MergeInfo {
    pub to_active_code: String,
    pub from_active_code: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShareInfo {
    pub to_corpid: String,
    pub from_corpid: String,
}

/// Details of one activation code.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CodeActiveInfo {
    pub active_code: String,
    #[serde(rename = "type")]
    pub account_type: i64,
    /// `1` unbound, `2` bound and valid, `3` expired, `4` transferred,
    /// `5` merged, `6` shared.
    pub status: i64,
    pub userid: String,
    pub create_time: i64,
    pub active_time: i64,
    pub expire_time: i64,
    pub merge_info: MergeInfo,
    pub share_info: ShareInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ActivatedAccount {
    #[serde(rename = "type")]
    pub account_type: i64,
    pub userid: String,
    pub active_time: i64,
    pub expire_time: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ActivatedAccountPage {
    pub has_more: i64,
    pub next_cursor: String,
    pub account_list: Vec<ActivatedAccount>,
}

impl ActivatedAccountPage {
    pub fn has_more(&self) -> bool {
        self.has_more == 1
    }
}

/// Moves a departing member's account to a successor.
#[derive(Debug, Clone, Serialize)]
pub struct Transfer {
    pub handover_userid: String,
    pub takeover_userid: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TransferResult {
    pub handover_userid: String,
    pub takeover_userid: String,
    /// Per-transfer status; `0` on success.
    pub errcode: i64,
}

/// Trial and purchase state of an app's licensing for one corp.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TrailInfo {
    pub start_time: i64,
    pub end_time: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppLicenseInfo {
    /// `0` none, `1` trial, `2` paid.
    pub license_status: i64,
    pub trail_info: TrailInfo,
    /// `0` license check disabled, `1` enabled.
    pub license_check_time: i64,
}

/// Binds an activation code to a member.
pub async fn active_account(
    client: &WecomClient,
    corpid: &str,
    active_code: &str,
    userid: &str,
) -> Result<()> {
    let _: Envelope = client
        .post(
            "cgi-bin/license/active_account",
            &json!({ "active_code": active_code, "corpid": corpid, "userid": userid }),
        )
        .await?;
    Ok(())
}

pub async fn get_active_info_by_user(
    client: &WecomClient,
    corpid: &str,
    userid: &str,
) -> Result<UserActiveInfo> {
    client
        .post(
            "cgi-bin/license/get_active_info_by_user",
            &json!({ "corpid": corpid, "userid": userid }),
        )
        .await
}

pub async fn get_active_info_by_code(
    client: &WecomClient,
    corpid: &str,
    active_code: &str,
) -> Result<CodeActiveInfo> {
    #[derive(Deserialize)]
    struct Resp {
        active_info: CodeActiveInfo,
    }
    let resp: Resp = client
        .post(
            "cgi-bin/license/get_active_info_by_code",
            &json!({ "corpid": corpid, "active_code": active_code }),
        )
        .await?;
    Ok(resp.active_info)
}

/// Lists a corp's activated accounts, up to 1000 per page.
pub async fn list_actived_account(
    client: &WecomClient,
    corpid: &str,
    cursor: &str,
) -> Result<ActivatedAccountPage> {
    let mut body = json!({ "corpid": corpid, "limit": 1000 });
    if !cursor.is_empty() {
        body["cursor"] = json!(cursor);
    }
    client
        .post("cgi-bin/license/list_actived_account", &body)
        .await
}

/// Transfers accounts between members of one corp. Returns one result per
/// transfer; check each `errcode`.
pub async fn batch_transfer_license(
    client: &WecomClient,
    corpid: &str,
    transfers: &[Transfer],
) -> Result<Vec<TransferResult>> {
    #[derive(Deserialize)]
    struct Resp {
        #[serde(default)]
        transfer_result: Vec<TransferResult>,
    }
    let resp: Resp = client
        .post(
            "cgi-bin/license/batch_transfer_license",
            &json!({ "corpid": corpid, "transfer_list": transfers }),
        )
        .await?;
    Ok(resp.transfer_result)
}

pub async fn get_app_license_info(
    client: &WecomClient,
    corpid: &str,
    suite_id: &str,
) -> Result<AppLicenseInfo> {
    client
        .post(
            "cgi-bin/license/get_app_license_info",
            &json!({ "corpid": corpid, "suite_id": suite_id }),
        )
        .await
}

// ── Orders ─────────────────────────────────────────────────────────────

/// Filter for [`list_order`]. All fields optional; an empty filter lists
/// every order of the provider.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrderFilter {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub corpid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cursor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OrderRef {
    pub order_id: String,
    /// `1` purchase, `2` renewal, `5` history migration.
    pub order_type: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OrderPage {
    pub next_cursor: String,
    pub has_more: i64,
    pub order_list: Vec<OrderRef>,
}

impl OrderPage {
    pub fn has_more(&self) -> bool {
        self.has_more == 1
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AccountCount {
    pub base_count: i64,
    pub external_contact_count: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AccountDuration {
    pub months: i64,
    pub days: i64,
    pub new_expire_time: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Order {
    pub order_id: String,
    pub order_type: i64,
    /// `0` unpaid, `1` paid, `2` cancelled, ...
    pub order_status: i64,
    pub corpid: String,
    /// Price in fen (0.01 CNY).
    pub price: i64,
    pub account_count: AccountCount,
    pub account_duration: AccountDuration,
    pub create_time: i64,
    pub pay_time: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OrderAccount {
    pub active_code: String,
    #[serde(rename = "type")]
    pub account_type: i64,
    pub userid: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OrderAccountPage {
    pub has_more: i64,
    pub next_cursor: String,
    pub account_list: Vec<OrderAccount>,
}

pub async fn list_order(client: &WecomClient, filter: &OrderFilter) -> Result<OrderPage> {
    client.post("cgi-bin/license/list_order", filter).await
}

pub async fn get_order(client: &WecomClient, order_id: &str) -> Result<Order> {
    #[derive(Deserialize)]
    struct Resp {
        order: Order,
    }
    let resp: Resp = client
        .post("cgi-bin/license/get_order", &json!({ "order_id": order_id }))
        .await?;
    Ok(resp.order)
}

/// Lists the activation codes issued by one order.
pub async fn list_order_account(
    client: &WecomClient,
    order_id: &str,
    cursor: &str,
) -> Result<OrderAccountPage> {
    let mut body = json!({ "order_id": order_id, "limit": 1000 });
    if !cursor.is_empty() {
        body["cursor"] = json!(cursor);
    }
    client.post("cgi-bin/license/list_order_account", &body).await
}
