//! External payment bills (`cgi-bin/externalpay`).

use serde::{Deserialize, Serialize};

use crate::client::WecomClient;
use crate::error::Result;

#[derive(Debug, Clone, Default, Serialize)]
pub struct BillListRequest {
    /// Unix seconds. The window may span at most one month.
    pub begin_time: i64,
    pub end_time: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub payee_userid: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cursor: String,
    /// Page size, at most 1000.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Commodity {
    pub description: String,
    pub amount: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Refund {
    pub out_refund_no: String,
    pub refund_userid: String,
    pub refund_comment: String,
    pub refund_reqtime: i64,
    pub refund_status: i64,
    pub refund_fee: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactInfo {
    pub name: String,
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MiniprogramInfo {
    pub appid: String,
    pub name: String,
}

/// One payment or refund record. Amounts are in fen (0.01 CNY).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Bill {
    pub transaction_id: String,
    /// `0` payment, `1` refund.
    pub bill_type: i64,
    pub trade_state: i64,
    pub pay_time: i64,
    pub out_trade_no: String,
    pub out_refund_no: String,
    pub external_userid: String,
    pub total_fee: i64,
    pub payee_userid: String,
    pub payment_type: i64,
    pub mch_id: String,
    pub remark: String,
    pub commodity_list: Vec<Commodity>,
    pub total_refund_fee: i64,
    pub refund_list: Vec<Refund>,
    pub contact_info: ContactInfo,
    pub miniprogram_info: MiniprogramInfo,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BillPage {
    pub bill_list: Vec<Bill>,
    pub next_cursor: String,
}

/// Lists payment records in a time window.
///
/// # Errors
///
/// `WecomError::Api` when the window is invalid or the app lacks the
/// external payment permission.
pub async fn get_bill_list(client: &WecomClient, request: &BillListRequest) -> Result<BillPage> {
    client
        .post("cgi-bin/externalpay/get_bill_list", request)
        .await
}
