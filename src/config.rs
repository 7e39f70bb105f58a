//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `WAGGLE__*` 覆盖（双下划线表示嵌套，如 `WAGGLE__OPENAI__MODEL=gpt-4o`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub openai: OpenAiSection,
    #[serde(default)]
    pub memory: MemorySection,
}

/// [openai] 段：思维适配器的连接参数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OpenAiSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// 未设置时从环境变量 OPENAI_API_KEY 读取
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    /// 单次补全请求超时（秒）
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

/// [memory] 段：记忆适配器参数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemorySection {
    /// 内存记忆每会话保留的消息条数上限
    #[serde(default = "default_max_size")]
    pub max_size: usize,
    /// 持久化记忆的数据库文件路径
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

fn default_max_size() -> usize {
    1000
}

fn default_db_path() -> PathBuf {
    PathBuf::from("waggle.redb")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            openai: OpenAiSection::default(),
            memory: MemorySection::default(),
        }
    }
}

impl Default for OpenAiSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            model: default_model(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for MemorySection {
    fn default() -> Self {
        Self {
            max_size: default_max_size(),
            db_path: default_db_path(),
        }
    }
}

/// 从 config 目录加载配置，环境变量 WAGGLE__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 WAGGLE__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("WAGGLE")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
