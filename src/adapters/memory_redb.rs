//! redb 持久化记忆适配器
//!
//! 单表按前缀组织：键为 "<会话段>:<seq>"，会话段对 '%' 与 ':' 作百分号转义，
//! seq 零填充到 20 位，字节序即写入序。值为 JSON 序列化的存档消息（含写入时间）。

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::memory::MemoryHandler;
use crate::message::Message;

const MESSAGES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("messages");

/// 落库的消息存档
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredMessage {
    message: Message,
    stored_at: DateTime<Utc>,
}

/// redb 会话存储
pub struct RedbMemory {
    db: Arc<Database>,
}

impl RedbMemory {
    /// 打开（或创建）数据库文件并确保表存在
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let db = Database::create(path)?;
        Self::with_database(Arc::new(db))
    }

    pub fn with_database(db: Arc<Database>) -> anyhow::Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(MESSAGES_TABLE)?;
        write_txn.commit()?;
        Ok(Self { db })
    }

    /// 键中的会话段：'%' 与 ':' 作百分号转义，转义后的段内不含分隔符
    fn encode_session(session_id: &str) -> String {
        session_id.replace('%', "%25").replace(':', "%3A")
    }

    fn message_key(session_id: &str, seq: u64) -> String {
        format!("{}:{seq:020}", Self::encode_session(session_id))
    }

    /// 会话前缀扫描的上界：分隔符 ':' 的下一个字节是 ';'
    fn session_bounds(session_id: &str) -> (String, String) {
        let encoded = Self::encode_session(session_id);
        (format!("{encoded}:"), format!("{encoded};"))
    }

    fn append(&self, session_id: &str, message: &Message) -> anyhow::Result<()> {
        let stored = StoredMessage {
            message: message.clone(),
            stored_at: Utc::now(),
        };
        let data = serde_json::to_vec(&stored)?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(MESSAGES_TABLE)?;
            let (lower, upper) = Self::session_bounds(session_id);
            let seq = match table.range(lower.as_str()..upper.as_str())?.next_back() {
                Some(entry) => {
                    let (key, _) = entry?;
                    parse_seq(key.value()) + 1
                }
                None => 0,
            };
            let key = Self::message_key(session_id, seq);
            table.insert(key.as_str(), data.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    fn list(&self, session_id: &str, limit: Option<usize>) -> anyhow::Result<Vec<Message>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MESSAGES_TABLE)?;
        let (lower, upper) = Self::session_bounds(session_id);
        let mut messages = Vec::new();
        for entry in table.range(lower.as_str()..upper.as_str())? {
            let (_, value) = entry?;
            let stored: StoredMessage = serde_json::from_slice(value.value())?;
            messages.push(stored.message);
        }
        if let Some(limit) = limit {
            let start = messages.len().saturating_sub(limit);
            messages.drain(..start);
        }
        Ok(messages)
    }

    fn has(&self, session_id: &str) -> anyhow::Result<bool> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MESSAGES_TABLE)?;
        let (lower, upper) = Self::session_bounds(session_id);
        let first = table.range(lower.as_str()..upper.as_str())?.next();
        Ok(first.transpose()?.is_some())
    }
}

fn parse_seq(key: &str) -> u64 {
    key.rsplit_once(':')
        .and_then(|(_, seq)| seq.parse().ok())
        .unwrap_or(0)
}

#[async_trait]
impl MemoryHandler for RedbMemory {
    async fn add_message(&self, session_id: &str, message: &Message) -> Result<()> {
        Ok(self.append(session_id, message)?)
    }

    async fn list_messages(&self, session_id: &str, limit: Option<usize>) -> Result<Vec<Message>> {
        Ok(self.list(session_id, limit)?)
    }

    async fn has_session(&self, session_id: &str) -> Result<bool> {
        Ok(self.has(session_id)?)
    }
}
