//! Application status codes carried in the `code` field of an envelope, and
//! the non-standard HTTP codes the framework uses.

pub const RS_OK: i64 = 0;
pub const RS_NOT_OK: i64 = 1;

pub const RS_TOKEN_INVALID: i64 = 10;
pub const RS_AUTHENTICATION_FAILED: i64 = 20;
pub const RS_AUTHENTICATION_SUCCEEDED: i64 = 21;
pub const RS_AUTHENTICATION_ERROR: i64 = 22;

pub const RS_REQUEST_VALIDATION_FAILED: i64 = 90;

pub const RS_ENTITY_NOT_FOUND: i64 = 101;
pub const RS_ENTITY_ACCESS_FORBIDDEN: i64 = 102;
pub const RS_ENTITY_DEPENDENCY_NOT_FOUND: i64 = 103;

pub const RS_ERROR_GENERIC: i64 = 999;

/// 498, as used by token-based APIs.
pub const HTTP_CODE_INVALID_TOKEN: u16 = 498;
