use crate::app::App;
use crate::config::AppConfig;
use crate::errors::{AppError, ErrorCode, RpcError};
use crate::rpc::protocol::{JsonRpcRequest, JsonRpcResponse, JSONRPC_VERSION};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};

const SERVER_NAME: &str = "reqlab";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Newline-delimited JSON-RPC 2.0 front end over the managers.
pub struct RpcServer {
    app: Arc<App>,
}

impl RpcServer {
    pub fn new(app: App) -> Self {
        Self { app: Arc::new(app) }
    }

    /// Handles one input line. Notifications and blank lines produce no response.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }

        let parsed: Value = match serde_json::from_str(trimmed) {
            Ok(value) => value,
            Err(_) => {
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    ErrorCode::ParseError.as_i32(),
                    "Parse error".to_string(),
                    None,
                ))
            }
        };

        let request: JsonRpcRequest = match serde_json::from_value(parsed) {
            Ok(req) => req,
            Err(_) => {
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    ErrorCode::InvalidRequest.as_i32(),
                    "Invalid request".to_string(),
                    None,
                ))
            }
        };

        if request.jsonrpc != JSONRPC_VERSION {
            return request.id.map(|id| {
                JsonRpcResponse::failure(
                    id,
                    ErrorCode::InvalidRequest.as_i32(),
                    format!("Unsupported jsonrpc version '{}'", request.jsonrpc),
                    None,
                )
            });
        }

        let result = self.dispatch(&request.method, request.params).await;
        let id = request.id?;
        Some(match result {
            None => JsonRpcResponse::failure(
                id,
                ErrorCode::MethodNotFound.as_i32(),
                format!("Unknown method: {}", request.method),
                Some(json!({"known_methods": ["workspace", "request", "ping"]})),
            ),
            Some(Ok(value)) => JsonRpcResponse::success(id, value),
            Some(Err(err)) => {
                let data = serde_json::to_value(&err).ok();
                let rpc = RpcError::from(&err);
                JsonRpcResponse::failure(id, rpc.code.as_i32(), rpc.message, data)
            }
        })
    }

    /// `None` means the method does not exist.
    async fn dispatch(&self, method: &str, params: Value) -> Option<Result<Value, AppError>> {
        let result = match method {
            "workspace" => self.app.workspace.handle_action(params).await,
            "request" => self.app.requests.handle_action(params).await,
            "ping" => Ok(json!({
                "name": SERVER_NAME,
                "version": SERVER_VERSION,
                "logs": self.app.logger.stats(),
            })),
            _ => return None,
        };
        Some(result)
    }

    pub async fn run_stdio(&self) -> Result<(), AppError> {
        let stdin = tokio::io::stdin();
        let stdout = tokio::io::stdout();
        let mut reader = BufReader::new(stdin).lines();
        let mut writer = BufWriter::new(stdout);

        self.app.logger.info("Listening on stdio", None);
        while let Some(line) = reader.next_line().await? {
            let Some(response) = self.handle_line(&line).await else {
                continue;
            };
            let payload = serde_json::to_string(&response)?;
            writer.write_all(payload.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
        self.app.logger.info("Input closed; shutting down", None);
        Ok(())
    }
}

pub async fn run_stdio(config: AppConfig) -> Result<(), AppError> {
    let app = App::initialize(config)?;
    RpcServer::new(app).run_stdio().await
}
