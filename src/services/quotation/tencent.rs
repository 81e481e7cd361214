//! 腾讯财经实时行情
//!
//! 对接 http://qt.gtimg.cn，响应为 GBK 编码，记录以 `;` 分隔，字段以 `~` 分隔：
//! `v_sh600000="1~浦发银行~600000~10.50~10.40~10.45~...";`
//! 成交量和挂单量单位为手，解析时换算为股。

use std::sync::OnceLock;

use encoding_rs::{Encoding, GBK};
use regex::Regex;

use super::common::{
    field, parse_f64, parse_i64, split_timestamp, text_or_null, ASK_LEVELS, BID_LEVELS,
    TENCENT_REALTIME_API,
};
use super::{unsupported_mode, Exchange, ParsedQuotes, QuoteProvider};
use crate::error::{QuotationError, Result};
use crate::models::{FetchMode, FieldValue, QuoteRecord};

/// 字段数必须超过该值
const MIN_FIELDS: usize = 49;
/// 1 手 = 100 股
const LOT_SIZE: i64 = 100;

fn code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"v_(\w+)=").expect("tencent code regex"))
}

/// 腾讯数据源
#[derive(Debug, Clone)]
pub struct Tencent {
    base_url: String,
}

impl Tencent {
    pub fn new() -> Self {
        Self::with_base_url(TENCENT_REALTIME_API)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for Tencent {
    fn default() -> Self {
        Self::new()
    }
}

impl QuoteProvider for Tencent {
    fn name(&self) -> &'static str {
        "tencent"
    }

    fn max_batch_size(&self) -> usize {
        60
    }

    fn exchange_prefix(&self, exchange: Exchange) -> &'static str {
        exchange.letters()
    }

    fn build_urls(&self, batches: &[String], mode: &FetchMode) -> Result<Vec<String>> {
        if !self.supports(mode) {
            return Err(unsupported_mode(self, mode));
        }
        Ok(batches
            .iter()
            .map(|batch| format!("{}{}", self.base_url, batch))
            .collect())
    }

    fn parse(
        &self,
        bodies: &[String],
        mode: &FetchMode,
        prefix: bool,
        _requested: &[String],
    ) -> ParsedQuotes {
        let mut parsed = ParsedQuotes::default();
        if !self.supports(mode) {
            parsed.errors.push(unsupported_mode(self, mode));
            return parsed;
        }

        for detail in bodies.iter().flat_map(|body| body.split(';')) {
            let detail = detail.trim();
            // v_pv_none_match 表示代码无数据
            if detail.is_empty() || detail.contains("none_match") {
                continue;
            }

            let fields: Vec<&str> = detail
                .split('~')
                .map(|f| f.trim().trim_matches('"'))
                .collect();
            if fields.len() <= MIN_FIELDS {
                parsed.errors.push(QuotationError::parse(
                    "tencent",
                    format!("字段不足: {} <= {}", fields.len(), MIN_FIELDS),
                ));
                continue;
            }

            let key = if prefix {
                code_regex()
                    .captures(detail)
                    .map(|cap| cap[1].to_string())
            } else {
                Some(fields[2].to_string()).filter(|code| !code.is_empty())
            };
            let Some(key) = key else {
                parsed
                    .errors
                    .push(QuotationError::parse("tencent", "缺少股票代码"));
                continue;
            };

            parsed.records.insert(key, parse_detail(&fields));
        }
        parsed
    }

    fn encoding(&self, _mode: &FetchMode) -> &'static Encoding {
        GBK
    }
}

fn lots_to_shares(s: &str) -> Option<i64> {
    parse_i64(s).map(|lots| lots * LOT_SIZE)
}

fn parse_detail(fields: &[&str]) -> QuoteRecord {
    let (date, time) = split_timestamp(fields[30], "%Y%m%d%H%M%S").unzip();
    // 35: 最新价/成交量(手)/成交额(元)
    let turnover = fields[35].split('/').nth(2).and_then(parse_f64);

    let mut builder = QuoteRecord::builder()
        .field("name", text_or_null(fields[1]))
        .field("open", parse_f64(fields[5]))
        .field("close", parse_f64(fields[4]))
        .field("now", parse_f64(fields[3]))
        .field("high", parse_f64(fields[33]))
        .field("low", parse_f64(fields[34]))
        .field("turnover", turnover)
        .field("volume", lots_to_shares(fields[6]));

    // 9..18 买一至买五，19..28 卖一至卖五，均为 (价格, 数量)
    for (i, &(price, volume)) in BID_LEVELS.iter().enumerate() {
        builder = builder
            .field(price, parse_f64(fields[9 + i * 2]))
            .field(volume, lots_to_shares(fields[10 + i * 2]));
    }
    for (i, &(price, volume)) in ASK_LEVELS.iter().enumerate() {
        builder = builder
            .field(price, parse_f64(fields[19 + i * 2]))
            .field(volume, lots_to_shares(fields[20 + i * 2]));
    }

    builder
        .field("date", FieldValue::from(date))
        .field("time", FieldValue::from(time))
        .field("pe", parse_f64(fields[39]))
        .field("circulation_market_cap", parse_f64(fields[44]))
        .field("total_market_cap", parse_f64(fields[45]))
        .field("pb", parse_f64(fields[46]))
        .field("volume_ratio", parse_f64(fields[49]))
        // 部分证券只有 50 个字段
        .field("order_diff", parse_f64(field(fields, 50)))
        .field("avg_price", parse_f64(field(fields, 51)))
        .field("pe_dynamic", parse_f64(field(fields, 52)))
        .field("pe_static", parse_f64(field(fields, 53)))
        .build()
}
