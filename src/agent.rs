//! 智能体编排器
//!
//! 组合思维 / 记忆 / 能力三个门面，驱动「推理 → 执行工具 → 再推理」循环，
//! 直到思维给出不含工具调用的最终回复。整个 interact 期间持有粗粒度回合锁，
//! 同一实例上任意会话的交互串行执行（能力授予 / 清除同样排队）。

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::ability::{mind_tools, Ability, AbilityHandler, Meta};
use crate::address::ToolAddress;
use crate::error::{AgentError, Result};
use crate::memory::{Memory, MemoryHandler};
use crate::message::{Message, ToolCall};
use crate::mind::{Mind, MindCallOptions, MindHandler};

/// send / talk 每轮推理加载的历史窗口长度
const SEND_MESSAGE_LIMIT: usize = 50;

/// 一次交互的入参
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InteractInput {
    /// 为 None 时由编排器分配新会话
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub messages: Vec<Message>,
    /// 每轮推理加载的历史条数上限；None 不限
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_limit: Option<usize>,
}

/// 一次交互的结果
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InteractOutput {
    pub session_id: String,
    /// 最终回复（不含工具调用的那条思维消息）
    pub message: Message,
    /// 回合内被跳过的工具调用；跳过不影响回合推进
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedToolCall>,
}

/// 被跳过的工具调用及原因（ID 解码失败 / 分发失败 / 结果落库失败）
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SkippedToolCall {
    pub tool_call: ToolCall,
    pub reason: String,
}

/// 智能体：思维 + 记忆 + 能力
pub struct Agent {
    mind: Mind,
    memory: Memory,
    ability: Ability,
    turn: Mutex<()>,
}

impl Agent {
    pub fn new() -> Self {
        Self {
            mind: Mind::new(),
            memory: Memory::new(),
            ability: Ability::new(),
            turn: Mutex::new(()),
        }
    }

    /// 赋予思维
    pub fn grant_mind(&self, handler: Arc<dyn MindHandler>) -> &Self {
        self.mind.set_handler(handler);
        self
    }

    /// 赋予记忆
    pub fn grant_memory(&self, handler: Arc<dyn MemoryHandler>) -> &Self {
        self.memory.set_handler(handler);
        self
    }

    /// 赋予一项能力
    pub async fn grant_ability(&self, handler: Arc<dyn AbilityHandler>) -> Result<&Self> {
        self.grant_abilities(vec![handler]).await
    }

    /// 批量赋予能力；某项注册失败即中止，之前注册成功的保留
    pub async fn grant_abilities(&self, handlers: Vec<Arc<dyn AbilityHandler>>) -> Result<&Self> {
        let _turn = self.turn.lock().await;
        for handler in handlers {
            self.ability.add(handler).await?;
        }
        Ok(self)
    }

    /// 清空后重新赋予能力
    pub async fn reset_abilities(&self, handlers: Vec<Arc<dyn AbilityHandler>>) -> Result<&Self> {
        let _turn = self.turn.lock().await;
        self.ability.clear();
        for handler in handlers {
            self.ability.add(handler).await?;
        }
        Ok(self)
    }

    /// 清除所有能力
    pub async fn clear_abilities(&self) -> &Self {
        let _turn = self.turn.lock().await;
        self.ability.clear();
        self
    }

    /// 获取消息列表（记忆直通）
    pub async fn list_messages(
        &self,
        session_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Message>> {
        self.memory.list_messages(session_id, limit).await
    }

    /// 添加消息（记忆直通）
    pub async fn add_messages(&self, session_id: &str, messages: &[Message]) -> Result<()> {
        self.memory.add_messages(session_id, messages).await
    }

    /// 消息会话是否存在（记忆直通）
    pub async fn has_session(&self, session_id: &str) -> Result<bool> {
        self.memory.has_session(session_id).await
    }

    /// 只取文本回复：返回（会话 ID，依序拼接的文本段）
    pub async fn talk(&self, session_id: Option<String>, text: &str) -> Result<(String, String)> {
        let output = self.send(session_id, text).await?;
        Ok((output.session_id, output.message.text()))
    }

    /// 发送一段文本并返回完整消息结构
    pub async fn send(&self, session_id: Option<String>, text: &str) -> Result<InteractOutput> {
        self.interact(InteractInput {
            session_id,
            message_limit: Some(SEND_MESSAGE_LIMIT),
            messages: vec![Message::user(text)],
        })
        .await
    }

    /// 与智能体交互：完整编排协议
    ///
    /// 1. 无会话 ID 时分配新的
    /// 2. 入参消息落库，失败即中止
    /// 3. 推理步：加载历史（空则报 EmptyConversation）、收集启用的工具、调用思维
    /// 4. 思维回复落库，失败即中止
    /// 5. 回复不含工具调用 → 作为最终结果返回
    /// 6. 否则按思维给出的顺序逐个执行工具调用，单个失败只跳过不中止
    /// 7. 回到第 3 步（历史已包含工具结果）
    pub async fn interact(&self, input: InteractInput) -> Result<InteractOutput> {
        let _turn = self.turn.lock().await;
        let session_id = input
            .session_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        tracing::debug!(session_id = %session_id, "interaction started");
        self.memory.add_messages(&session_id, &input.messages).await?;

        let mut skipped = Vec::new();
        let message = loop {
            let messages = self
                .memory
                .list_messages(&session_id, input.message_limit)
                .await?;
            if messages.is_empty() {
                return Err(AgentError::EmptyConversation);
            }
            let tools = mind_tools(&self.ability.items());
            let response = self.mind.call(&MindCallOptions { messages, tools }).await?;
            if response.message.is_empty() {
                return Err(AgentError::NoResponse);
            }
            self.memory.add_message(&session_id, &response.message).await?;

            if response.message.tool_calls.is_empty() {
                break response.message;
            }
            for tool_call in &response.message.tool_calls {
                if let Err(err) = self.exec_tool_call(&session_id, tool_call).await {
                    tracing::warn!(
                        session_id = %session_id,
                        tool_id = %tool_call.tool_id,
                        error = %err,
                        "tool call skipped"
                    );
                    skipped.push(SkippedToolCall {
                        tool_call: tool_call.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        };
        tracing::debug!(session_id = %session_id, "interaction finished");
        Ok(InteractOutput {
            session_id,
            message,
            skipped,
        })
    }

    /// 执行单个工具调用：解码扁平 ID → 注册表分发 → 结果盖章 tool_call_id → 落库
    async fn exec_tool_call(&self, session_id: &str, tool_call: &ToolCall) -> Result<()> {
        let address = ToolAddress::parse(&tool_call.tool_id)?;
        let mut meta = Meta::new();
        meta.insert(
            "session_id".to_string(),
            Value::String(session_id.to_string()),
        );
        let mut message = self
            .ability
            .call(
                address.item,
                &address.tool,
                tool_call.arguments.clone(),
                meta,
            )
            .await?;
        message.tool_call_id = Some(tool_call.id.clone());
        self.memory.add_message(session_id, &message).await
    }
}

impl Default for Agent {
    fn default() -> Self {
        Self::new()
    }
}
