use super::{AppError, AppErrorKind};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(i32)]
pub enum ErrorCode {
    RequestTimeout = -32001,
    ParseError = -32700,
    InvalidRequest = -32600,
    MethodNotFound = -32601,
    InvalidParams = -32602,
    InternalError = -32603,
}

impl ErrorCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RpcError {
    pub code: ErrorCode,
    pub message: String,
}

impl RpcError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<&AppError> for RpcError {
    fn from(error: &AppError) -> Self {
        let mut message = format!("{}: {}", error.code, error.message);
        if let Some(hint) = &error.hint {
            message.push_str(&format!(" (hint: {})", hint));
        }
        let code = match error.kind {
            AppErrorKind::InvalidParams => ErrorCode::InvalidParams,
            AppErrorKind::Timeout => ErrorCode::RequestTimeout,
            AppErrorKind::NotFound | AppErrorKind::Conflict => ErrorCode::InvalidRequest,
            _ => ErrorCode::InternalError,
        };
        RpcError::new(code, message)
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RpcError {}
