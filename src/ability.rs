//! 能力注册表
//!
//! 有序的能力绑定列表：注册时快照处理器的身份与工具清单，列表序号即寻址依据，
//! 在任何进行中的交互期间保持稳定。调用按（序号，工具名）分发到对应处理器。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use crate::address::ToolAddress;
use crate::error::{AgentError, Result};
use crate::message::{Message, ToolCallArguments};
use crate::mind::MindTool;
use crate::tool::Tool;

/// 透传给能力处理器的上下文元数据
pub type Meta = HashMap<String, Value>;

/// 一次工具调用的入参
#[derive(Clone, Debug, Default)]
pub struct CallToolOptions {
    pub name: String,
    pub arguments: ToolCallArguments,
    pub meta: Meta,
}

/// 能力处理器：一组可调用工具的提供方
#[async_trait]
pub trait AbilityHandler: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// 为 false 时整个绑定不对思维暴露
    fn enabled(&self) -> bool {
        true
    }

    /// 工具清单；注册时快照一次，之后不自动刷新
    async fn tools(&self) -> Result<Vec<Tool>>;

    async fn call_tool(&self, options: &CallToolOptions) -> Result<Message>;
}

/// 注册表内的一个能力绑定
#[derive(Clone)]
pub struct AbilityItem {
    pub name: String,
    pub description: String,
    pub enabled: bool,
    tools: Vec<Tool>,
    handler: Option<Arc<dyn AbilityHandler>>,
}

impl AbilityItem {
    /// 构造一个未挂载处理器的绑定（如从持久化描述恢复）；对它的调用会报
    /// AbilityHandlerNotDefined
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        enabled: bool,
        tools: Vec<Tool>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            enabled,
            tools,
            handler: None,
        }
    }

    /// 从处理器快照一个绑定；工具清单在此一次性拉取，失败则放弃构造
    pub async fn from_handler(handler: Arc<dyn AbilityHandler>) -> Result<Self> {
        let tools = handler.tools().await?;
        Ok(Self {
            name: handler.name().to_string(),
            description: handler.description().to_string(),
            enabled: handler.enabled(),
            tools,
            handler: Some(handler),
        })
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    /// 处理器侧工具有更新时重新快照
    pub async fn refresh_tools(&mut self) -> Result<()> {
        let handler = self
            .handler
            .clone()
            .ok_or(AgentError::AbilityHandlerNotDefined)?;
        self.tools = handler.tools().await?;
        Ok(())
    }
}

/// 能力注册表
#[derive(Default)]
pub struct Ability {
    items: RwLock<Vec<AbilityItem>>,
}

impl Ability {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一个处理器，追加到列表末尾；工具清单拉取失败时本次注册不生效
    pub async fn add(&self, handler: Arc<dyn AbilityHandler>) -> Result<()> {
        let item = AbilityItem::from_handler(handler).await?;
        self.items.write().push(item);
        Ok(())
    }

    /// 原子地清空列表
    pub fn clear(&self) {
        *self.items.write() = Vec::new();
    }

    /// 就地重新快照指定绑定的工具清单；清单拉取失败时保留原快照
    pub async fn refresh_tools(&self, index: usize) -> Result<()> {
        let handler = {
            let items = self.items.read();
            let item = items
                .get(index)
                .ok_or(AgentError::AbilityItemNotFound(index))?;
            item.handler
                .clone()
                .ok_or(AgentError::AbilityHandlerNotDefined)?
        };
        let tools = handler.tools().await?;
        let mut items = self.items.write();
        let item = items
            .get_mut(index)
            .ok_or(AgentError::AbilityItemNotFound(index))?;
        item.tools = tools;
        Ok(())
    }

    /// 当前绑定列表快照
    pub fn items(&self) -> Vec<AbilityItem> {
        self.items.read().clone()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// 按序号分发一次工具调用；处理器返回的错误原样透传
    pub async fn call(
        &self,
        index: usize,
        tool_name: &str,
        arguments: ToolCallArguments,
        meta: Meta,
    ) -> Result<Message> {
        let handler = {
            let items = self.items.read();
            let item = items
                .get(index)
                .ok_or(AgentError::AbilityItemNotFound(index))?;
            item.handler
                .clone()
                .ok_or(AgentError::AbilityHandlerNotDefined)?
        };
        let options = CallToolOptions {
            name: tool_name.to_string(),
            arguments,
            meta,
        };
        handler.call_tool(&options).await
    }
}

/// 将启用的绑定与工具展开为思维可见的扁平工具列表；
/// 禁用的绑定整体跳过，绑定内禁用的工具单独跳过
pub fn mind_tools(items: &[AbilityItem]) -> Vec<MindTool> {
    let mut res = Vec::new();
    for (index, item) in items.iter().enumerate() {
        if !item.enabled {
            continue;
        }
        for tool in item.tools() {
            if tool.enabled {
                res.push(MindTool {
                    id: ToolAddress::new(index, tool.name.as_str()).id(),
                    tool: tool.clone(),
                });
            }
        }
    }
    res
}
