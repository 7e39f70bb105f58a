//! 会话数据模型
//!
//! Message / Content / ToolCall 的字段命名与聊天补全约定对齐：content 为多段内容，
//! assistant 消息可携带 tool_calls，tool 角色消息通过 tool_call_id 关联发起它的调用。
//! 消息一经写入记忆即视为不可变（按会话追加式日志）。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 消息角色（与聊天补全 API 一致）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
    System,
}

/// 消息内容段，按 type 区分
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    Text {
        text: String,
    },
    Image {
        /// URL 或 base64 编码
        uri: String,
        /// 图片质量 high / low / auto
        detail: String,
    },
    Resource {
        mime_type: String,
        data: Vec<u8>,
    },
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image(uri: impl Into<String>) -> Self {
        Self::Image {
            uri: uri.into(),
            detail: "auto".to_string(),
        }
    }
}

/// 单条消息
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(rename = "content", default, skip_serializing_if = "Vec::is_empty")]
    pub contents: Vec<Content>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn new(role: Role, contents: Vec<Content>) -> Self {
        Self {
            role,
            contents,
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![Content::text(text)])
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, vec![Content::text(text)])
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, vec![Content::text(text)])
    }

    /// tool 角色消息；tool_call_id 由编排器在落库前盖章
    pub fn tool(text: impl Into<String>) -> Self {
        Self::new(Role::Tool, vec![Content::text(text)])
    }

    /// 依序拼接所有文本段
    pub fn text(&self) -> String {
        self.contents
            .iter()
            .filter_map(|c| match c {
                Content::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// 既无内容也无工具调用
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty() && self.tool_calls.is_empty()
    }
}

/// 思维发起的一次工具调用
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// 由思维后端分配的调用 ID，结果消息靠它关联
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// 扁平工具 ID，见 address 模块
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tool_id: String,
    #[serde(default, skip_serializing_if = "ToolCallArguments::is_empty")]
    pub arguments: ToolCallArguments,
}

/// 工具调用参数：属性名 → JSON 值
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolCallArguments(pub Map<String, Value>);

impl ToolCallArguments {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// 从 JSON 字符串解析；思维给出的参数不可控，解析失败时回退为空参数
    pub fn from_json(raw: &str) -> Self {
        serde_json::from_str(raw).map(Self).unwrap_or_default()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
