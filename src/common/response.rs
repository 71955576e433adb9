use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;

use super::status::{HTTP_CODE_INVALID_TOKEN, RS_REQUEST_VALIDATION_FAILED};

/// Standard API response wrapper
///
/// Every JSON body the framework writes has this shape:
///
/// ```json
/// { "code": 0, "response": { "id": "42" }, "timestamp": 1700000000 }
/// ```
///
/// `code` is the application status (see [`crate::common::status`]), the HTTP
/// status travels separately.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub code: i64,
    pub response: Value,
    /// Unix seconds.
    pub timestamp: i64,
}

impl Envelope {
    pub fn new(code: i64, response: Value) -> Self {
        Self {
            code,
            response,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// A canned outcome: HTTP status, application status and message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenericResponse {
    pub code: u16,
    pub status: i64,
    pub message: Cow<'static, str>,
}

impl GenericResponse {
    pub const fn new(code: u16, status: i64, message: &'static str) -> Self {
        Self {
            code,
            status,
            message: Cow::Borrowed(message),
        }
    }

    pub fn with_message(&self, message: impl Into<String>) -> Self {
        Self {
            code: self.code,
            status: self.status,
            message: Cow::Owned(message.into()),
        }
    }

    pub fn http_status(&self) -> StatusCode {
        StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn to_reply(&self) -> Reply {
        Reply::envelope(
            self.http_status(),
            self.status,
            Value::String(self.message.to_string()),
        )
    }
}

impl fmt::Display for GenericResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (status {}, http {})", self.message, self.status, self.code)
    }
}

pub const GR_SUCCESS_NO_CONTENT: GenericResponse = GenericResponse::new(204, 100, "");
pub const GR_INTERNAL_ERROR: GenericResponse = GenericResponse::new(500, 200, "Internal error.");
pub const GR_NOT_IMPLEMENTED: GenericResponse = GenericResponse::new(500, 400, "Not implemented.");
pub const GR_REQUEST_VALIDATION_FAILED: GenericResponse =
    GenericResponse::new(400, RS_REQUEST_VALIDATION_FAILED, "Request validation failed.");
pub const GR_AUTH_UNAUTHORIZED: GenericResponse = GenericResponse::new(401, 600, "Unauthorized.");
pub const GR_AUTH_PASSWORD_WRONG: GenericResponse = GenericResponse::new(401, 800, "Password wrong.");
pub const GR_AUTH_CREDENTIALS_MISSING: GenericResponse =
    GenericResponse::new(401, 1000, "Credentials missing.");
pub const GR_AUTH_USER_NOT_FOUND: GenericResponse =
    GenericResponse::new(404, 1200, "Requested user not found.");
pub const GR_AUTH_REFRESH_TOKEN_INVALID: GenericResponse =
    GenericResponse::new(HTTP_CODE_INVALID_TOKEN, 1400, "Refresh token invalid.");
pub const GR_AUTH_REFRESH_TOKEN_EXPIRED: GenericResponse =
    GenericResponse::new(HTTP_CODE_INVALID_TOKEN, 1600, "Refresh token expired.");
pub const GR_AUTH_USERNAME_TAKEN: GenericResponse =
    GenericResponse::new(401, 1800, "Username already taken.");
pub const GR_AUTH_FORBIDDEN: GenericResponse = GenericResponse::new(403, 2000, "Forbidden.");
pub const GR_RESOURCE_NOT_FOUND: GenericResponse =
    GenericResponse::new(404, 2200, "Requested resource not found.");
pub const GR_RESOURCE_ID_TAKEN: GenericResponse =
    GenericResponse::new(409, 2400, "Identifier for resource already taken.");

#[derive(Debug, Clone, PartialEq)]
pub enum ReplyBody {
    Json(Envelope),
    Text(String),
}

/// The response a request ends with, staged by a controller or produced by
/// the framework when it rejects a request.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: StatusCode,
    pub body: ReplyBody,
}

impl Reply {
    pub fn envelope(status: StatusCode, code: i64, response: Value) -> Self {
        Self {
            status,
            body: ReplyBody::Json(Envelope::new(code, response)),
        }
    }

    pub fn text(status: StatusCode, text: impl Into<String>) -> Self {
        Self {
            status,
            body: ReplyBody::Text(text.into()),
        }
    }

    pub fn envelope_body(&self) -> Option<&Envelope> {
        match &self.body {
            ReplyBody::Json(envelope) => Some(envelope),
            ReplyBody::Text(_) => None,
        }
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self.body {
            ReplyBody::Json(envelope) => (self.status, Json(envelope)).into_response(),
            ReplyBody::Text(text) => (self.status, text).into_response(),
        }
    }
}
