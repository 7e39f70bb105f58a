//! 记忆门面
//!
//! 会话消息存取的单点接入，按 session_id 维护追加式消息日志。
//! 具体后端（进程内 / redb）见 adapters。

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{AgentError, Result};
use crate::message::Message;

/// 会话存储接入点
#[async_trait]
pub trait MemoryHandler: Send + Sync {
    async fn add_message(&self, session_id: &str, message: &Message) -> Result<()>;

    /// 返回最近 limit 条消息，按旧→新排序；limit 为 None 时不限制条数
    async fn list_messages(&self, session_id: &str, limit: Option<usize>) -> Result<Vec<Message>>;

    async fn has_session(&self, session_id: &str) -> Result<bool>;
}

/// 记忆门面：持有可替换的处理器
#[derive(Default)]
pub struct Memory {
    handler: RwLock<Option<Arc<dyn MemoryHandler>>>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_handler(&self, handler: Arc<dyn MemoryHandler>) {
        *self.handler.write() = Some(handler);
    }

    fn handler(&self) -> Result<Arc<dyn MemoryHandler>> {
        self.handler
            .read()
            .clone()
            .ok_or(AgentError::HandlerNotDefined("memory"))
    }

    pub async fn add_message(&self, session_id: &str, message: &Message) -> Result<()> {
        self.handler()?.add_message(session_id, message).await
    }

    /// 逐条追加，遇错即止；已写入的消息不回滚，调用方需容忍部分写入
    pub async fn add_messages(&self, session_id: &str, messages: &[Message]) -> Result<()> {
        let handler = self.handler()?;
        for message in messages {
            handler.add_message(session_id, message).await?;
        }
        Ok(())
    }

    pub async fn list_messages(&self, session_id: &str, limit: Option<usize>) -> Result<Vec<Message>> {
        self.handler()?.list_messages(session_id, limit).await
    }

    pub async fn has_session(&self, session_id: &str) -> Result<bool> {
        self.handler()?.has_session(session_id).await
    }
}
