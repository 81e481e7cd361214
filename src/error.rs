//! 错误类型
//!
//! 单个 URL 请求失败（Fetch）和单条记录解析失败（Parse）只会被记录，不会中断整次调用；
//! 其余错误直接返回给调用方。

use thiserror::Error;

/// 行情获取错误
#[derive(Debug, Error)]
pub enum QuotationError {
    /// 股票代码格式不合法
    #[error("无效的股票代码: {0:?}")]
    InvalidCode(String),
    /// 数据源不支持请求的模式，不可重试
    #[error("数据源 {provider} 不支持 {mode} 模式")]
    UnsupportedMode {
        provider: &'static str,
        mode: &'static str,
    },
    /// 某个 URL 请求失败
    #[error("请求 {url} 失败: {reason}")]
    Fetch { url: String, reason: String },
    /// 某条记录解析失败
    #[error("解析 {provider} 数据失败: {reason}")]
    Parse {
        provider: &'static str,
        reason: String,
    },
    /// 日期区间、数据源名称等配置错误
    #[error("配置错误: {0}")]
    Configuration(String),
}

impl QuotationError {
    pub(crate) fn fetch(url: &str, reason: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn parse(provider: &'static str, reason: impl Into<String>) -> Self {
        Self::Parse {
            provider,
            reason: reason.into(),
        }
    }

    /// 调用方传参有误（对应 HTTP 400）
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCode(_) | Self::UnsupportedMode { .. } | Self::Configuration(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, QuotationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(QuotationError::InvalidCode("abc".into()).is_client_error());
        assert!(QuotationError::UnsupportedMode {
            provider: "sina",
            mode: "history"
        }
        .is_client_error());
        assert!(QuotationError::Configuration("x".into()).is_client_error());
        assert!(!QuotationError::fetch("http://a", "timeout").is_client_error());
        assert!(!QuotationError::parse("sina", "short").is_client_error());
    }

    #[test]
    fn test_display() {
        let err = QuotationError::UnsupportedMode {
            provider: "sina",
            mode: "history",
        };
        assert_eq!(err.to_string(), "数据源 sina 不支持 history 模式");
    }
}
