//! 进程内记忆适配器
//!
//! HashMap 加读写锁的会话存储，适合测试与单机短会话。容量满时滚动淘汰最早的消息。

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::Result;
use crate::memory::MemoryHandler;
use crate::message::Message;

/// 进程内会话存储
pub struct SimpleMemory {
    /// 每会话保留的消息条数上限，0 不限
    max_size: usize,
    store: RwLock<HashMap<String, Vec<Message>>>,
}

impl SimpleMemory {
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            store: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl MemoryHandler for SimpleMemory {
    async fn add_message(&self, session_id: &str, message: &Message) -> Result<()> {
        let mut store = self.store.write();
        let messages = store.entry(session_id.to_string()).or_default();
        if self.max_size > 0 && messages.len() >= self.max_size {
            messages.remove(0);
        }
        messages.push(message.clone());
        Ok(())
    }

    async fn list_messages(&self, session_id: &str, limit: Option<usize>) -> Result<Vec<Message>> {
        let store = self.store.read();
        let messages = match store.get(session_id) {
            Some(messages) => messages,
            None => return Ok(Vec::new()),
        };
        let start = match limit {
            Some(limit) => messages.len().saturating_sub(limit),
            None => 0,
        };
        Ok(messages[start..].to_vec())
    }

    async fn has_session(&self, session_id: &str) -> Result<bool> {
        Ok(self.store.read().contains_key(session_id))
    }
}
