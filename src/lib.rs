//! Waggle - 会话智能体编排核心
//!
//! 模块划分：
//! - **agent**: 编排器（交互协议、回合锁、工具调用分发）
//! - **mind**: 思维门面（可插拔推理引擎）
//! - **memory**: 记忆门面（可插拔会话消息存储）
//! - **ability**: 能力注册表（有序的工具提供方绑定列表）
//! - **address**: 扁平工具 ID 编解码（绑定序号 + 工具名）
//! - **message** / **tool**: 会话数据模型与工具描述符
//! - **adapters**: 开箱适配器（OpenAI 兼容思维、脚本化思维、内存 / redb 记忆、工具包能力）
//! - **config**: 适配器配置加载（TOML + 环境变量）
//! - **observability**: tracing 初始化
//! - **error**: 错误分类

pub mod ability;
pub mod adapters;
pub mod address;
pub mod agent;
pub mod config;
pub mod error;
pub mod memory;
pub mod message;
pub mod mind;
pub mod observability;
pub mod tool;

pub use ability::{Ability, AbilityHandler, AbilityItem, CallToolOptions, Meta};
pub use address::ToolAddress;
pub use agent::{Agent, InteractInput, InteractOutput, SkippedToolCall};
pub use error::{AgentError, Result};
pub use memory::{Memory, MemoryHandler};
pub use message::{Content, Message, Role, ToolCall, ToolCallArguments};
pub use mind::{Mind, MindCallOptions, MindCallResponse, MindHandler, MindTool};
pub use tool::{Parameter, Tool};
