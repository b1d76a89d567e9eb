mod app_error;
mod rpc_error;

pub use app_error::{AppError, AppErrorKind};
pub use rpc_error::{ErrorCode, RpcError};
