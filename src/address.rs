//! 扁平工具 ID 编解码
//!
//! 能力绑定序号 + 工具名 ←→ "<序号>-<工具名>"。解码只在第一个分隔符处切分，
//! 工具名自身含分隔符时仍能精确还原。纯函数，无状态。

use std::fmt;
use std::str::FromStr;

use crate::error::AgentError;

/// 分隔绑定序号与工具名的字符
const SEPARATOR: char = '-';

/// 一个已解码的工具地址：注册表内的绑定序号 + 绑定内工具名
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ToolAddress {
    pub item: usize,
    pub tool: String,
}

impl ToolAddress {
    pub fn new(item: usize, tool: impl Into<String>) -> Self {
        Self {
            item,
            tool: tool.into(),
        }
    }

    /// 编码为暴露给思维的扁平 ID
    pub fn id(&self) -> String {
        self.to_string()
    }

    /// 从扁平 ID 解码；没有分隔符或序号段不是非负整数时报 MalformedToolId
    pub fn parse(id: &str) -> Result<Self, AgentError> {
        let (index, tool) = id
            .split_once(SEPARATOR)
            .ok_or_else(|| AgentError::MalformedToolId(id.to_string()))?;
        let item = index
            .parse::<usize>()
            .map_err(|_| AgentError::MalformedToolId(id.to_string()))?;
        Ok(Self {
            item,
            tool: tool.to_string(),
        })
    }
}

impl fmt::Display for ToolAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.item, SEPARATOR, self.tool)
    }
}

impl FromStr for ToolAddress {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
