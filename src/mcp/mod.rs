//! Model Context Protocol over JSON-RPC.
//!
//! An [`McpServer`] is built for every HTTP request and dropped with it,
//! so no protocol state survives between requests.

pub mod protocol;
pub mod tools;

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::{Error, Result, spotify::SpotifyApi};
use protocol::{JsonRpcMessage, JsonRpcResponse, ProtocolHandler};
use tools::ToolsHandler;

pub struct McpServer {
    handler: ProtocolHandler,
}

impl McpServer {
    pub fn new(spotify: Arc<dyn SpotifyApi>) -> Self {
        Self {
            handler: ProtocolHandler::new(ToolsHandler::new(spotify)),
        }
    }

    /// Handles a raw request body holding one message or a batch.
    ///
    /// Returns `Ok(None)` when nothing needs a reply (notifications and
    /// responses only). A single body that is not JSON-RPC is an error;
    /// inside a batch, each invalid entry gets its own `-32600` reply and
    /// the rest are still handled.
    pub async fn handle_payload(&self, body: &[u8]) -> Result<Option<Value>> {
        let payload: Value = serde_json::from_slice(body)?;

        match payload {
            Value::Array(items) => {
                if items.is_empty() {
                    return Err(Error::InvalidRequest("empty batch".to_string()));
                }
                debug!("Handling batch of {} messages", items.len());

                let mut replies = Vec::new();
                for item in items {
                    let reply = match serde_json::from_value::<JsonRpcMessage>(item) {
                        Ok(msg) => self.handler.handle_message(msg).await,
                        Err(e) => {
                            warn!("Invalid entry in batch: {}", e);
                            let err = Error::InvalidRequest(e.to_string());
                            Some(JsonRpcResponse::from_error(Value::Null, &err))
                        }
                    };
                    if let Some(reply) = reply {
                        replies.push(serde_json::to_value(reply)?);
                    }
                }

                if replies.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(Value::Array(replies)))
                }
            }
            single => {
                let msg: JsonRpcMessage = serde_json::from_value(single)?;
                match self.handler.handle_message(msg).await {
                    Some(reply) => Ok(Some(serde_json::to_value(reply)?)),
                    None => Ok(None),
                }
            }
        }
    }
}
