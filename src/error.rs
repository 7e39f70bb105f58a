//! 错误类型
//!
//! 分类：配置缺失（门面未挂载处理器）、寻址失败（注册表越界 / 工具 ID 不合法）、
//! 会话保护（空会话 / 空响应）。外部处理器（思维 / 记忆 / 能力）的错误不做翻译，原样透传。

use thiserror::Error;

/// 编排过程中可能出现的错误
#[derive(Error, Debug)]
pub enum AgentError {
    /// 门面未挂载处理器，载荷为门面名（"mind" / "memory"）
    #[error("{0} handler is not defined")]
    HandlerNotDefined(&'static str),

    #[error("ability item {0} not found")]
    AbilityItemNotFound(usize),

    /// 绑定项缺少可调用的处理器
    #[error("ability handler is not defined")]
    AbilityHandlerNotDefined,

    /// 扁平工具 ID 无法还原为（绑定序号，工具名）
    #[error("malformed tool id: {0}")]
    MalformedToolId(String),

    /// 推理前加载到的会话历史为空；没有上文的调用视为非法请求而非「尚无记忆」
    #[error("messages cannot be empty")]
    EmptyConversation,

    #[error("no response received")]
    NoResponse,

    #[error(transparent)]
    External(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AgentError>;
