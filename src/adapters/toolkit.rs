//! 工具包能力适配器
//!
//! 把一组进程内工具聚合成一个能力处理器：注册时汇报工具描述符，调用时按名分发。
//! 适合不经外部协议、直接在本进程实现的工具。

use std::sync::Arc;

use async_trait::async_trait;

use crate::ability::{AbilityHandler, CallToolOptions, Meta};
use crate::error::Result;
use crate::message::{Message, ToolCallArguments};
use crate::tool::{Parameter, Tool};

/// 工具包内的单个工具
#[async_trait]
pub trait ToolkitTool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// 为 false 时不对思维暴露；按名直调不受影响
    fn enabled(&self) -> bool {
        true
    }

    fn parameters(&self) -> Vec<Parameter> {
        Vec::new()
    }

    /// meta 由编排器填充，至少含 session_id
    async fn call(&self, arguments: &ToolCallArguments, meta: &Meta) -> Result<Message>;
}

/// 进程内工具包
pub struct Toolkit {
    name: String,
    description: String,
    enabled: bool,
    tools: Vec<Arc<dyn ToolkitTool>>,
}

impl Toolkit {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            enabled: true,
            tools: Vec::new(),
        }
    }

    pub fn with_tool(mut self, tool: impl ToolkitTool + 'static) -> Self {
        self.tools.push(Arc::new(tool));
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

#[async_trait]
impl AbilityHandler for Toolkit {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    async fn tools(&self) -> Result<Vec<Tool>> {
        Ok(self
            .tools
            .iter()
            .map(|t| {
                let mut tool = Tool::new(t.name(), t.description());
                tool.enabled = t.enabled();
                tool.parameters = t.parameters();
                tool
            })
            .collect())
    }

    async fn call_tool(&self, options: &CallToolOptions) -> Result<Message> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.name() == options.name)
            .ok_or_else(|| anyhow::anyhow!("unknown tool: {}", options.name))?;
        tool.call(&options.arguments, &options.meta).await
    }
}
