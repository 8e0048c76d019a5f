//! Live streaming (`cgi-bin/living`).

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::client::WecomClient;
use crate::error::Result;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ActivityDetail {
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub image_list: Vec<String>,
}

/// A scheduled live stream.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateLivingRequest {
    pub anchor_userid: String,
    pub theme: String,
    /// Unix seconds.
    pub living_start: i64,
    /// Seconds.
    pub living_duration: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// `0` general, `1` small class, `2` large class, `3` corp training,
    /// `4` activity.
    #[serde(rename = "type")]
    pub living_type: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agentid: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remind_time: Option<i64>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub activity_cover_mediaid: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub activity_share_mediaid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_detail: Option<ActivityDetail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LivingInfo {
    pub theme: String,
    pub living_start: i64,
    pub living_duration: i64,
    /// `0` scheduled, `1` live, `2` ended, `3` expired, `4` cancelled.
    pub status: i64,
    pub reserve_start: i64,
    pub reserve_living_duration: i64,
    pub description: String,
    pub anchor_userid: String,
    pub main_department: i64,
    pub viewer_num: i64,
    pub comment_num: i64,
    pub mic_num: i64,
    pub open_replay: i64,
    pub replay_status: i64,
    #[serde(rename = "type")]
    pub living_type: i64,
    pub online_count: i64,
    pub subscribe_count: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LivingViewer {
    pub userid: String,
    pub watch_time: i64,
    pub is_comment: i64,
    pub is_mic: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LivingExternalViewer {
    pub external_userid: String,
    /// `1` WeChat user, `2` WeCom user.
    #[serde(rename = "type")]
    pub viewer_type: i64,
    pub name: String,
    pub watch_time: i64,
    pub is_comment: i64,
    pub is_mic: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StatInfo {
    pub users: Vec<LivingViewer>,
    pub external_users: Vec<LivingExternalViewer>,
}

/// One page of watch statistics. Keep calling with `next_key` until
/// `ending` is `1`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WatchStat {
    pub ending: i64,
    pub next_key: String,
    pub stat_info: StatInfo,
}

impl WatchStat {
    pub fn is_last_page(&self) -> bool {
        self.ending == 1
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LivingIdPage {
    pub livingid_list: Vec<String>,
    pub next_cursor: String,
}

/// Schedules a live stream and returns its `livingid`.
pub async fn create_living(client: &WecomClient, request: &CreateLivingRequest) -> Result<String> {
    #[derive(Deserialize)]
    struct Resp {
        livingid: String,
    }
    let resp: Resp = client.post("cgi-bin/living/create", request).await?;
    Ok(resp.livingid)
}

pub async fn get_watch_stat(client: &WecomClient, livingid: &str, next_key: &str) -> Result<WatchStat> {
    let mut body = json!({ "livingid": livingid });
    if !next_key.is_empty() {
        body["next_key"] = json!(next_key);
    }
    client.post("cgi-bin/living/get_watch_stat", &body).await
}

/// Lists the streams a member has hosted or scheduled, 20 per page.
pub async fn get_user_all_livingid(
    client: &WecomClient,
    userid: &str,
    cursor: &str,
) -> Result<LivingIdPage> {
    let mut body = json!({ "userid": userid, "limit": 20 });
    if !cursor.is_empty() {
        body["cursor"] = json!(cursor);
    }
    client
        .post("cgi-bin/living/get_user_all_livingid", &body)
        .await
}

/// Returns a code that lets a WeChat user (by `openid`) watch the stream.
pub async fn get_living_code(client: &WecomClient, livingid: &str, openid: &str) -> Result<String> {
    #[derive(Deserialize)]
    struct Resp {
        living_code: String,
    }
    let resp: Resp = client
        .post(
            "cgi-bin/living/get_living_code",
            &json!({ "livingid": livingid, "openid": openid }),
        )
        .await?;
    Ok(resp.living_code)
}

pub async fn get_living_info(client: &WecomClient, livingid: &str) -> Result<LivingInfo> {
    #[derive(Deserialize)]
    struct Resp {
        living_info: LivingInfo,
    }
    let resp: Resp = client
        .get("cgi-bin/living/get_living_info", &[("livingid", livingid)])
        .await?;
    Ok(resp.living_info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_uses_type_key() {
        let req = CreateLivingRequest {
            anchor_userid: "zhangsan".to_string(),
            theme: "Quarterly review".to_string(),
            living_start: 1_600_000_000,
            living_duration: 3600,
            living_type: 4,
            ..Default::default()
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["type"], 4);
        assert!(json.get("agentid").is_none());
        assert!(json.get("activity_detail").is_none());
    }

    #[test]
    fn watch_stat_detects_last_page() {
        let json = r#"{
            "errcode": 0, "errmsg": "ok", "ending": 1, "next_key": "NEXT_KEY",
            "stat_info": {
                "users": [{"userid": "userid", "watch_time": 30, "is_comment": 1, "is_mic": 1}],
                "external_users": [{"external_userid": "external_userid1", "type": 1,
                    "name": "user name", "watch_time": 30, "is_comment": 1, "is_mic": 1}]
            }
        }"#;
        let stat: WatchStat = serde_json::from_str(json).unwrap();
        assert!(stat.is_last_page());
        assert_eq!(stat.stat_info.users[0].watch_time, 30);
        assert_eq!(stat.stat_info.external_users[0].viewer_type, 1);
    }
}
