//! The `{errcode, errmsg}` envelope shared by every WeCom response.
//!
//! All response decoding goes through [`decode`], which checks the envelope
//! before the typed payload is handed back. Endpoint functions never call
//! `serde_json` themselves, so the non-zero `errcode` check cannot be skipped.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WecomError};

/// Status fields common to all responses.
///
/// Some endpoints omit `errcode` on success, so both fields default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// `0` on success; anything else is a failure.
    #[serde(default)]
    pub errcode: i64,
    /// Human-readable status message (`"ok"` on success).
    #[serde(default)]
    pub errmsg: String,
}

impl Envelope {
    /// Parses only the envelope fields from a raw body.
    pub fn parse(body: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(body)?)
    }

    pub fn is_ok(&self) -> bool {
        self.errcode == 0
    }

    /// Converts a failed envelope into `WecomError::Api`.
    pub fn into_result(self) -> Result<()> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(WecomError::Api {
                code: self.errcode,
                message: self.errmsg,
            })
        }
    }
}

/// Decodes a raw response body into `T` after checking the envelope.
///
/// A non-zero `errcode` yields `WecomError::Api` and the payload is never
/// deserialized. A body that isn't JSON yields `WecomError::Parse`.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    Envelope::parse(body)?.into_result()?;
    Ok(serde_json::from_slice(body)?)
}
