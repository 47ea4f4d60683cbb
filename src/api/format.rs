use axum::http::StatusCode;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::pagination::{Page, PageMeta};

pub const MESSAGE_SUCCESS: &str = "Success";
pub const MESSAGE_OK: &str = "OK";

/// Response envelope shared by every shaped response:
/// `{ code, data, message, meta?, time }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// HTTP status as a string numeral ("200", "404", "500")
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
    pub time: String,
}

impl Envelope {
    /// Paginated collection with its meta block
    pub fn collection(page: Page<Value>) -> Self {
        Self {
            code: code(StatusCode::OK),
            data: Some(Value::Array(page.items)),
            message: MESSAGE_SUCCESS.to_string(),
            meta: Some(page.meta),
            time: timestamp(),
        }
    }

    /// Single record or unpaginated sub-resource; never carries meta
    pub fn record(data: Value) -> Self {
        Self {
            code: code(StatusCode::OK),
            data: Some(data),
            message: MESSAGE_SUCCESS.to_string(),
            meta: None,
            time: timestamp(),
        }
    }

    pub fn health(data: Value) -> Self {
        Self {
            code: code(StatusCode::OK),
            data: Some(data),
            message: MESSAGE_OK.to_string(),
            meta: None,
            time: timestamp(),
        }
    }

    /// Error envelope without a data field
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: code(status),
            data: None,
            message: message.into(),
            meta: None,
            time: timestamp(),
        }
    }
}

fn code(status: StatusCode) -> String {
    status.as_u16().to_string()
}

/// ISO-8601 UTC with millisecond precision, e.g. 2024-05-01T08:30:00.123Z
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
