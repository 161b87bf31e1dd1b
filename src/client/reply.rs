//! Backend reply shape.
//!
//! Compute backends answer `{"success": true, ...fields}` or
//! `{"success": false, "errorMessage": "..."}`. The code generator uses
//! `message` instead of `errorMessage`. The shape is checked once here so
//! callers match on a closed enum instead of probing JSON keys.

use serde_json::{Map, Value};
use thiserror::Error;

/// Message used when a failure reply carries no text.
pub const UNSPECIFIED_FAILURE: &str = "Server Error";

/// A validated backend reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiReply {
    /// Result fields, with the `success` flag removed.
    Success(Map<String, Value>),
    /// Backend-reported failure.
    Failure { message: String },
}

/// Reply did not have the expected shape.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReplyError {
    #[error("reply is not a JSON object")]
    NotAnObject,

    #[error("reply has no boolean `success` field")]
    MissingSuccessFlag,
}

impl ApiReply {
    pub fn from_value(value: Value) -> Result<Self, ReplyError> {
        let Value::Object(mut fields) = value else {
            return Err(ReplyError::NotAnObject);
        };

        match fields.remove("success") {
            Some(Value::Bool(true)) => Ok(ApiReply::Success(fields)),
            Some(Value::Bool(false)) => {
                let message = ["errorMessage", "message"]
                    .iter()
                    .find_map(|key| fields.get(*key).and_then(Value::as_str))
                    .unwrap_or(UNSPECIFIED_FAILURE)
                    .to_string();
                Ok(ApiReply::Failure { message })
            }
            _ => Err(ReplyError::MissingSuccessFlag),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ApiReply::Success(_))
    }

    /// A string result field, e.g. `code` from the code generator.
    pub fn field_str(&self, key: &str) -> Option<&str> {
        match self {
            ApiReply::Success(fields) => fields.get(key).and_then(Value::as_str),
            ApiReply::Failure { .. } => None,
        }
    }
}
