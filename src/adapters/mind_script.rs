//! 脚本化思维（用于测试，无需 API）
//!
//! 按预排的脚本依次吐出回复，同时记录每次调用收到的完整入参，
//! 便于对编排循环的轮次与工具暴露做精确断言。

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::Result;
use crate::mind::{MindCallOptions, MindCallResponse, MindHandler};

/// 脚本化思维：第 n 次调用返回脚本里的第 n 条回复
pub struct ScriptMind {
    script: Mutex<VecDeque<MindCallResponse>>,
    calls: Mutex<Vec<MindCallOptions>>,
}

impl ScriptMind {
    pub fn new(responses: Vec<MindCallResponse>) -> Self {
        Self {
            script: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// 已收到的调用入参，按时间顺序
    pub fn calls(&self) -> Vec<MindCallOptions> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl MindHandler for ScriptMind {
    async fn call(&self, options: &MindCallOptions) -> Result<MindCallResponse> {
        self.calls.lock().push(options.clone());
        self.script
            .lock()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("script exhausted").into())
    }
}
