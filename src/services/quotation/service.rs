//! 行情服务
//!
//! 把数据源、请求器和全市场代码列表组合在一起，对外提供
//! `real` / `market_snapshot` / `get_stocks_history` 等操作。

use std::sync::Arc;

use tokio::time::Instant;

use super::{plan_batches, unsupported_mode, Fetcher, QuoteProvider, RequestProfile};
use crate::error::{QuotationError, Result};
use crate::models::{FetchMode, HistoryRange, QuoteReport, ResultMapping};

/// 行情服务
///
/// 历史数据的默认日期区间保存在实例上，只能通过 `&mut self` 修改；
/// 需要在并发场景下使用不同区间时，调用 [`Quotation::get_stocks_history_between`]
/// 显式传入区间。
pub struct Quotation {
    provider: Box<dyn QuoteProvider>,
    fetcher: Fetcher,
    /// 全市场股票代码
    stock_codes: Arc<Vec<String>>,
    history_range: HistoryRange,
}

impl Quotation {
    pub fn new(provider: Box<dyn QuoteProvider>, fetcher: Fetcher) -> Self {
        Self {
            provider,
            fetcher,
            stock_codes: Arc::new(Vec::new()),
            history_range: HistoryRange::default(),
        }
    }

    pub fn with_stock_codes(mut self, stock_codes: Arc<Vec<String>>) -> Self {
        self.stock_codes = stock_codes;
        self
    }

    // ==================== 实时行情 ====================

    /// 获取指定股票的实时行情
    ///
    /// `prefix` 为 true 时结果的 key 带交易所前缀
    pub async fn real<S: AsRef<str>>(&self, codes: &[S], prefix: bool) -> Result<ResultMapping> {
        Ok(self.fetch_report(codes, FetchMode::RealTime, prefix).await?.records)
    }

    /// 获取全市场实时行情快照
    pub async fn market_snapshot(&self, prefix: bool) -> Result<ResultMapping> {
        let codes = Arc::clone(&self.stock_codes);
        self.real(codes.as_slice(), prefix).await
    }

    /// 全市场快照，key 带交易所前缀
    pub async fn all_market(&self) -> Result<ResultMapping> {
        self.market_snapshot(true).await
    }

    // ==================== 历史行情 ====================

    /// 设置历史数据的默认日期区间（YYYYMMDD）
    pub fn set_history_date(&mut self, start: &str, end: &str) -> Result<()> {
        self.history_range = HistoryRange::parse(start, end)?;
        log::info!(
            "📅 历史数据区间: {} - {}",
            self.history_range.start_param(),
            self.history_range.end_param()
        );
        Ok(())
    }

    pub fn history_range(&self) -> HistoryRange {
        self.history_range
    }

    /// 按默认日期区间获取单只股票的历史日K线，key 为交易日
    ///
    /// 只支持一只股票，传入多个代码返回配置错误。
    pub async fn get_stocks_history<S: AsRef<str>>(
        &self,
        codes: &[S],
        prefix: bool,
    ) -> Result<ResultMapping> {
        let report = self
            .fetch_report(codes, FetchMode::History(self.history_range), prefix)
            .await?;
        Ok(report.records)
    }

    /// 按指定日期区间获取单只股票的历史日K线
    pub async fn get_stocks_history_between(
        &self,
        code: &str,
        range: HistoryRange,
        prefix: bool,
    ) -> Result<ResultMapping> {
        let report = self
            .fetch_report(&[code], FetchMode::History(range), prefix)
            .await?;
        Ok(report.records)
    }

    // ==================== 通用流程 ====================

    /// 完整的获取流程，返回结果以及被跳过的请求和记录
    ///
    /// 截止时间取自请求器配置的 `deadline`。
    pub async fn fetch_report<S: AsRef<str>>(
        &self,
        codes: &[S],
        mode: FetchMode,
        prefix: bool,
    ) -> Result<QuoteReport> {
        let deadline = self.fetcher.default_deadline();
        self.run(codes, mode, prefix, deadline).await
    }

    /// 同 [`Quotation::fetch_report`]，到达 `deadline` 仍未完成的请求记为失败
    pub async fn fetch_report_until<S: AsRef<str>>(
        &self,
        codes: &[S],
        mode: FetchMode,
        prefix: bool,
        deadline: Instant,
    ) -> Result<QuoteReport> {
        self.run(codes, mode, prefix, Some(deadline)).await
    }

    async fn run<S: AsRef<str>>(
        &self,
        codes: &[S],
        mode: FetchMode,
        prefix: bool,
        deadline: Option<Instant>,
    ) -> Result<QuoteReport> {
        let provider = self.provider.as_ref();

        // 不支持的模式在发出任何请求之前失败
        if !provider.supports(&mode) {
            return Err(unsupported_mode(provider, &mode));
        }
        if matches!(mode, FetchMode::History(_)) && codes.len() != 1 {
            return Err(QuotationError::Configuration(format!(
                "历史数据只支持单只股票查询，传入了 {} 个代码",
                codes.len()
            )));
        }

        let normalized = codes
            .iter()
            .map(|code| provider.normalize_code(code.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let batches = plan_batches(&normalized, provider.max_batch_size());
        if batches.is_empty() {
            return Ok(QuoteReport::default());
        }

        let urls = provider.build_urls(&batches, &mode)?;
        log::info!(
            "📡 {} {} 模式: {} 只股票，{} 个请求",
            provider.name(),
            mode,
            normalized.len(),
            urls.len()
        );

        let profile = RequestProfile {
            encoding: provider.encoding(&mode),
            headers: provider.headers(),
        };
        let fetched = self.fetcher.fetch_all_until(&urls, &profile, deadline).await;
        let parsed = provider.parse(&fetched.bodies, &mode, prefix, &normalized);
        for e in &parsed.errors {
            log::warn!("⚠️ 跳过记录: {}", e);
        }
        log::info!("📊 {} 解析到 {} 条记录", provider.name(), parsed.records.len());

        Ok(QuoteReport {
            records: parsed.records,
            fetch_errors: fetched.errors,
            parse_errors: parsed.errors,
        })
    }
}
