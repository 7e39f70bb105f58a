//! OpenAI 兼容思维适配器
//!
//! 直连任意 OpenAI 兼容的 chat/completions 端点（base_url 可配置，支持自建代理）。
//! 消息双向转换：多段内容映射为 multipart content；工具清单映射为 function 定义，
//! function 名即扁平工具 ID，思维发起调用时原样带回，编排器据此寻址。

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::OpenAiSection;
use crate::error::{AgentError, Result};
use crate::message::{Content, Message, Role, ToolCall, ToolCallArguments};
use crate::mind::{MindCallOptions, MindCallResponse, MindHandler, MindTool};

/// OpenAI 兼容客户端
pub struct OpenAiMind {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    request_timeout: Duration,
}

impl OpenAiMind {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: api_key.into(),
            model: "gpt-4o-mini".to_string(),
            request_timeout: Duration::from_secs(60),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// 指向 OpenAI 兼容服务时替换端点
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// 从配置段构造；api_key 未配置时回退读环境变量 OPENAI_API_KEY
    pub fn from_config(config: &OpenAiSection) -> Self {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .unwrap_or_default();
        Self::new(api_key)
            .with_base_url(config.base_url.clone())
            .with_model(config.model.clone())
            .with_timeout(Duration::from_secs(config.request_timeout_secs))
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ChatTool>>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<Vec<ChatMessagePart>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ChatToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Serialize)]
struct ChatMessagePart {
    r#type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_url: Option<ChatImageUrl>,
}

#[derive(Serialize)]
struct ChatImageUrl {
    url: String,
    detail: String,
}

#[derive(Serialize)]
struct ChatToolCall {
    id: String,
    r#type: String,
    function: ChatFunctionCall,
}

#[derive(Serialize, Deserialize)]
struct ChatFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Serialize)]
struct ChatTool {
    r#type: String,
    function: ChatFunction,
}

#[derive(Serialize)]
struct ChatFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ChatResponseToolCall>>,
}

#[derive(Deserialize)]
struct ChatResponseToolCall {
    id: String,
    function: ChatFunctionCall,
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
        Role::System => "system",
    }
}

fn role_from(name: &str) -> Role {
    match name {
        "user" => Role::User,
        "tool" => Role::Tool,
        "system" => Role::System,
        _ => Role::Assistant,
    }
}

fn to_chat_part(content: &Content) -> ChatMessagePart {
    match content {
        Content::Text { text } => ChatMessagePart {
            r#type: "text".to_string(),
            text: Some(text.clone()),
            image_url: None,
        },
        Content::Image { uri, detail } => ChatMessagePart {
            r#type: "image_url".to_string(),
            text: None,
            image_url: Some(ChatImageUrl {
                url: uri.clone(),
                detail: detail.clone(),
            }),
        },
        // 端点不认识的内容段整体序列化为文本段带过去
        other => ChatMessagePart {
            r#type: "text".to_string(),
            text: Some(serde_json::to_string(other).unwrap_or_default()),
            image_url: None,
        },
    }
}

fn to_chat_message(message: &Message) -> ChatMessage {
    let content = if message.contents.is_empty() {
        None
    } else {
        Some(message.contents.iter().map(to_chat_part).collect())
    };
    let tool_calls = if message.tool_calls.is_empty() {
        None
    } else {
        Some(
            message
                .tool_calls
                .iter()
                .map(|t| ChatToolCall {
                    id: t.id.clone(),
                    r#type: "function".to_string(),
                    function: ChatFunctionCall {
                        name: t.tool_id.clone(),
                        arguments: t.arguments.to_json(),
                    },
                })
                .collect(),
        )
    };
    ChatMessage {
        role: role_name(message.role).to_string(),
        content,
        tool_calls,
        tool_call_id: message.tool_call_id.clone(),
    }
}

fn to_chat_tools(tools: &[MindTool]) -> Option<Vec<ChatTool>> {
    if tools.is_empty() {
        return None;
    }
    Some(
        tools
            .iter()
            .map(|t| ChatTool {
                r#type: "function".to_string(),
                function: ChatFunction {
                    name: t.id.clone(),
                    description: t.tool.description.clone(),
                    parameters: t.tool.parameters_schema(),
                },
            })
            .collect(),
    )
}

fn from_response_message(wire: ChatResponseMessage) -> Message {
    let role = wire.role.as_deref().map(role_from).unwrap_or(Role::Assistant);
    let mut message = Message::new(role, Vec::new());
    if let Some(text) = wire.content {
        if !text.is_empty() {
            message.contents.push(Content::text(text));
        }
    }
    for call in wire.tool_calls.unwrap_or_default() {
        message.tool_calls.push(ToolCall {
            id: call.id,
            tool_id: call.function.name,
            arguments: ToolCallArguments::from_json(&call.function.arguments),
        });
    }
    message
}

#[async_trait]
impl MindHandler for OpenAiMind {
    async fn call(&self, options: &MindCallOptions) -> Result<MindCallResponse> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: options.messages.iter().map(to_chat_message).collect(),
            tools: to_chat_tools(&options.tools),
        };
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await
            .context("chat completion request failed")?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AgentError::External(anyhow::anyhow!(
                "chat completion failed with status {status}: {text}"
            )));
        }
        let data: ChatResponse = response
            .json()
            .await
            .context("invalid chat completion response")?;
        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or(AgentError::NoResponse)?;
        Ok(MindCallResponse {
            message: from_response_message(choice.message),
        })
    }
}
