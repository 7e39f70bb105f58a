//! 思维门面
//!
//! 推理引擎的单点接入：一次调用拿（历史消息，可用工具），返回下一条消息，
//! 其中可能携带工具调用请求。具体后端（OpenAI 兼容 / 脚本化）见 adapters。

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{AgentError, Result};
use crate::message::Message;
use crate::tool::Tool;

/// 暴露给思维的工具：扁平 ID + 描述符
#[derive(Clone, Debug, PartialEq)]
pub struct MindTool {
    pub id: String,
    pub tool: Tool,
}

/// 思维调用入参
#[derive(Clone, Debug, Default)]
pub struct MindCallOptions {
    /// 会话历史，旧→新
    pub messages: Vec<Message>,
    pub tools: Vec<MindTool>,
}

/// 思维调用结果
#[derive(Clone, Debug)]
pub struct MindCallResponse {
    pub message: Message,
}

/// 推理引擎接入点
#[async_trait]
pub trait MindHandler: Send + Sync {
    async fn call(&self, options: &MindCallOptions) -> Result<MindCallResponse>;
}

/// 思维门面：持有可替换的处理器
#[derive(Default)]
pub struct Mind {
    handler: RwLock<Option<Arc<dyn MindHandler>>>,
}

impl Mind {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_handler(&self, handler: Arc<dyn MindHandler>) {
        *self.handler.write() = Some(handler);
    }

    /// 未挂载处理器时报 HandlerNotDefined；处理器返回的错误原样透传
    pub async fn call(&self, options: &MindCallOptions) -> Result<MindCallResponse> {
        let handler = self
            .handler
            .read()
            .clone()
            .ok_or(AgentError::HandlerNotDefined("mind"))?;
        handler.call(options).await
    }
}
