//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 工作线程数（0 表示使用 CPU 核心数）
    #[serde(default)]
    pub workers: usize,
}

/// API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API Key（为空则不启用认证）
    #[serde(default)]
    pub api_key: String,
    /// 请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// 连接超时时间（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// 行情配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotationConfig {
    /// 默认数据源: sina, qq/tencent, netease
    #[serde(default = "default_provider")]
    pub provider: String,
    /// 全市场股票代码文件
    #[serde(default = "default_stock_codes_path")]
    pub stock_codes_path: String,
    /// 最大并发请求数
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// 连接失败、超时和 5xx 的重试次数
    #[serde(default = "default_retries")]
    pub retries: usize,
    /// 首次重试等待（毫秒）
    #[serde(default = "default_retry_base_millis")]
    pub retry_base_millis: u64,
    /// 单次调用的截止时间（秒），不设置则只受单个请求超时限制
    #[serde(default)]
    pub deadline_secs: Option<u64>,
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// API 配置
    #[serde(default)]
    pub api: ApiConfig,
    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
    /// 行情配置
    #[serde(default)]
    pub quotation: QuotationConfig,
}

// 默认值函数
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_timeout() -> u64 { 30 }
fn default_connect_timeout() -> u64 { 10 }
fn default_log_level() -> String { "info".to_string() }
fn default_provider() -> String { "sina".to_string() }
fn default_stock_codes_path() -> String { "stock_codes.json".to_string() }
fn default_max_concurrency() -> usize { 8 }
fn default_retries() -> usize { 2 }
fn default_retry_base_millis() -> u64 { 200 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for QuotationConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            stock_codes_path: default_stock_codes_path(),
            max_concurrency: default_max_concurrency(),
            retries: default_retries(),
            retry_base_millis: default_retry_base_millis(),
            deadline_secs: None,
        }
    }
}

/// 配置来源
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    File(String),
    /// 未找到可用的配置文件，`failures` 为解析失败的文件
    Defaults { failures: Vec<String> },
}

impl ConfigSource {
    pub fn log(&self) {
        match self {
            Self::File(path) => log::info!("从 {} 加载配置成功", path),
            Self::Defaults { failures } => {
                for failure in failures {
                    log::warn!("{}", failure);
                }
                log::info!("使用默认配置");
            }
        }
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 加载配置，优先从文件，失败则使用默认值
    ///
    /// 日志级别来自配置本身，因此加载结果由调用方在初始化日志后输出。
    pub fn load() -> (Self, ConfigSource) {
        Self::load_from(&["config.json", "config/config.json"])
    }

    /// 依次尝试候选路径，第一个可解析的文件生效
    pub fn load_from<P: AsRef<Path>>(paths: &[P]) -> (Self, ConfigSource) {
        let mut failures = Vec::new();

        for path in paths {
            let path = path.as_ref();
            if !path.exists() {
                continue;
            }
            match Self::from_file(path) {
                Ok(config) => return (config, ConfigSource::File(path.display().to_string())),
                Err(e) => failures.push(format!("加载配置文件 {} 失败: {}", path.display(), e)),
            }
        }

        (Self::default(), ConfigSource::Defaults { failures })
    }

    /// 获取服务器绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
