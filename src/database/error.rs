use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use warp::http::StatusCode;

/// Field name -> list of messages, serialized as a flat JSON object.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn single(field: &str, message: &str) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: &str) {
        self.0
            .entry(field.to_owned())
            .or_default()
            .push(message.to_owned());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(|messages| messages.as_slice())
    }

    /// Ok when nothing was collected, otherwise the collected errors.
    pub fn into_result(self) -> Result<(), Error> {
        if self.is_empty() {
            return Ok(());
        }
        Err(Error::Validation(self))
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation failed: {0:?}")]
    Validation(FieldErrors),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Query(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn validation(field: &str, message: &str) -> Self {
        Self::Validation(FieldErrors::single(field, message))
    }

    pub fn not_found(info: &str) -> Self {
        Self::NotFound(info.to_owned())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::Conflict(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::Query(_) | Error::Cache(_) | Error::Internal(_) | Error::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// JSON body sent to the client. Server-side failures are logged and
    /// replaced with a generic message.
    pub fn body(&self) -> Value {
        match self {
            Error::Validation(errors) => json!(errors),
            Error::Conflict(info) => json!({ "errors": info }),
            Error::NotFound(info) | Error::Unauthorized(info) | Error::Forbidden(info) => {
                json!({ "detail": info })
            }
            err => {
                log::error!("{err}");
                json!({ "detail": "Internal server error" })
            }
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::Internal(format!("{value}"))
    }
}

impl warp::reject::Reject for Error {}
