//! 可观测性

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// 初始化结构化日志；重复初始化只生效第一次
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("waggle=info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init();
}
