//! 股票行情服务
//!
//! 从多个免费行情数据源获取实时/历史行情，并统一为 `QuoteRecord`
//!
//! ## 数据来源
//! - 新浪财经：实时行情（`sina`）
//! - 腾讯财经：实时行情及估值指标（`qq` / `tencent`）
//! - 网易财经：实时行情、历史日K线（`netease`）
//!
//! ## 处理流程
//! 股票代码 -> 规范化/分组 -> 构造 URL -> 并发请求 -> 解析为 `ResultMapping`

pub mod batch;
pub mod code;
pub mod common;
pub mod fetcher;
pub mod netease;
pub mod service;
pub mod sina;
pub mod stock_codes;
pub mod tencent;

use encoding_rs::{Encoding, UTF_8};

use crate::error::{QuotationError, Result};
use crate::models::{FetchMode, ResultMapping};

pub use batch::plan_batches;
pub use code::{Exchange, StockCode};
pub use fetcher::{FetchOutcome, Fetcher, FetcherConfig, RequestProfile};
pub use netease::Netease;
pub use service::Quotation;
pub use sina::Sina;
pub use stock_codes::load_stock_codes;
pub use tencent::Tencent;

/// 单个数据源的解析结果，`errors` 为被跳过的记录
#[derive(Debug, Default)]
pub struct ParsedQuotes {
    pub records: ResultMapping,
    pub errors: Vec<QuotationError>,
}

/// 行情数据源
///
/// 每个数据源负责代码前缀、分组上限、URL 构造和响应解析，
/// 网络请求统一由 [`Fetcher`] 完成。
pub trait QuoteProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// 单次请求最多包含的股票数
    fn max_batch_size(&self) -> usize;

    /// 交易所前缀的渲染方式
    fn exchange_prefix(&self, exchange: Exchange) -> &'static str;

    /// 原始代码 -> 带交易所前缀的代码
    fn normalize_code(&self, raw: &str) -> Result<String> {
        let code = StockCode::parse(raw)?;
        Ok(format!("{}{}", self.exchange_prefix(code.exchange), code.digits))
    }

    fn supports(&self, mode: &FetchMode) -> bool {
        matches!(mode, FetchMode::RealTime)
    }

    /// 每个分组生成请求 URL
    fn build_urls(&self, batches: &[String], mode: &FetchMode) -> Result<Vec<String>>;

    /// 解析原始响应，格式错误的记录被跳过并记录在 `errors` 中
    ///
    /// `requested` 为本次请求的规范化代码，带前缀的 key 优先取自这里。
    fn parse(
        &self,
        bodies: &[String],
        mode: &FetchMode,
        prefix: bool,
        requested: &[String],
    ) -> ParsedQuotes;

    /// 响应体编码
    fn encoding(&self, _mode: &FetchMode) -> &'static Encoding {
        UTF_8
    }

    /// 额外的请求头
    fn headers(&self) -> &'static [(&'static str, &'static str)] {
        &[]
    }
}

pub(crate) fn unsupported_mode(provider: &dyn QuoteProvider, mode: &FetchMode) -> QuotationError {
    QuotationError::UnsupportedMode {
        provider: provider.name(),
        mode: mode.name(),
    }
}

/// 按名称获取数据源（区分大小写）
pub fn provider_by_name(name: &str) -> Result<Box<dyn QuoteProvider>> {
    match name {
        "sina" => Ok(Box::new(Sina::new())),
        "qq" | "tencent" => Ok(Box::new(Tencent::new())),
        "netease" => Ok(Box::new(Netease::new())),
        _ => Err(QuotationError::Configuration(format!(
            "数据源 {:?} 未实现",
            name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HistoryRange;

    #[test]
    fn test_provider_by_name() {
        assert_eq!(provider_by_name("sina").unwrap().name(), "sina");
        assert_eq!(provider_by_name("qq").unwrap().name(), "tencent");
        assert_eq!(provider_by_name("tencent").unwrap().name(), "tencent");
        assert_eq!(provider_by_name("netease").unwrap().name(), "netease");

        for name in ["Sina", "boc", "jsl", "hkquote", "daykline", "timekline", ""] {
            let err = provider_by_name(name).err().unwrap();
            assert!(matches!(err, QuotationError::Configuration(_)), "{}", name);
        }
    }

    #[test]
    fn test_normalize_per_provider() {
        let netease = provider_by_name("netease").unwrap();
        assert_eq!(netease.normalize_code("600000").unwrap(), "0600000");
        assert_eq!(netease.normalize_code("000001").unwrap(), "1000001");
        assert_eq!(netease.normalize_code("sh600000").unwrap(), "0600000");

        let sina = provider_by_name("sina").unwrap();
        assert_eq!(sina.normalize_code("600000").unwrap(), "sh600000");
        assert_eq!(sina.normalize_code("sh000001").unwrap(), "sh000001");
        assert!(sina.normalize_code("60000").is_err());
    }

    #[test]
    fn test_history_support() {
        let history = FetchMode::History(HistoryRange::default());
        assert!(!provider_by_name("sina").unwrap().supports(&history));
        assert!(!provider_by_name("qq").unwrap().supports(&history));
        assert!(provider_by_name("netease").unwrap().supports(&history));
        assert!(provider_by_name("sina").unwrap().supports(&FetchMode::RealTime));
    }
}
