//! 新浪财经实时行情
//!
//! 对接 http://hq.sinajs.cn，响应为 GBK 编码的 JS 变量赋值：
//! `var hq_str_sh600000="浦发银行,10.45,10.40,...,2021-04-14,15:00:03,00";`

use std::sync::OnceLock;

use chrono::Utc;
use encoding_rs::{Encoding, GBK};
use regex::Regex;

use super::common::{
    field, parse_f64, parse_i64, text_or_null, ASK_LEVELS, BID_LEVELS, SINA_REALTIME_API,
    SINA_REFERER,
};
use super::{unsupported_mode, Exchange, ParsedQuotes, QuoteProvider};
use crate::error::{QuotationError, Result};
use crate::models::{FetchMode, QuoteRecord};

/// 行情字段数下限（名称 + 29 个数值 + 日期 + 时间）
const MIN_FIELDS: usize = 32;

fn detail_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"hq_str_(\w+)="([^"]*)""#).expect("sina detail regex"))
}

/// 新浪数据源
#[derive(Debug, Clone)]
pub struct Sina {
    base_url: String,
}

impl Sina {
    pub fn new() -> Self {
        Self::with_base_url(SINA_REALTIME_API)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for Sina {
    fn default() -> Self {
        Self::new()
    }
}

impl QuoteProvider for Sina {
    fn name(&self) -> &'static str {
        "sina"
    }

    fn max_batch_size(&self) -> usize {
        800
    }

    fn exchange_prefix(&self, exchange: Exchange) -> &'static str {
        exchange.letters()
    }

    fn build_urls(&self, batches: &[String], mode: &FetchMode) -> Result<Vec<String>> {
        if !self.supports(mode) {
            return Err(unsupported_mode(self, mode));
        }
        let rn = Utc::now().timestamp_millis();
        Ok(batches
            .iter()
            .map(|batch| format!("{}/rn={}&list={}", self.base_url, rn, batch))
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

        for body in bodies {
            for cap in detail_regex().captures_iter(body) {
                let code = &cap[1];
                let payload = cap[2].trim();
                // 停牌或无效代码返回空串
                if payload.is_empty() {
                    continue;
                }
                match parse_detail(payload) {
                    Ok(record) => {
                        let key = if prefix {
                            code.to_string()
                        } else {
                            code.trim_start_matches(|c: char| c.is_ascii_alphabetic())
                                .to_string()
                        };
                        parsed.records.insert(key, record);
                    }
                    Err(reason) => parsed
                        .errors
                        .push(QuotationError::parse("sina", format!("{}: {}", code, reason))),
                }
            }
        }
        parsed
    }

    fn encoding(&self, _mode: &FetchMode) -> &'static Encoding {
        GBK
    }

    fn headers(&self) -> &'static [(&'static str, &'static str)] {
        &[("Referer", SINA_REFERER)]
    }
}

fn parse_detail(payload: &str) -> std::result::Result<QuoteRecord, String> {
    let fields: Vec<&str> = payload.split(',').map(str::trim).collect();
    if fields.len() < MIN_FIELDS {
        return Err(format!("字段不足: {} < {}", fields.len(), MIN_FIELDS));
    }

    let mut builder = QuoteRecord::builder()
        .field("name", text_or_null(fields[0]))
        .field("open", parse_f64(fields[1]))
        .field("close", parse_f64(fields[2]))
        .field("now", parse_f64(fields[3]))
        .field("high", parse_f64(fields[4]))
        .field("low", parse_f64(fields[5]))
        .field("volume", parse_i64(fields[8]))
        .field("turnover", parse_f64(fields[9]));

    // 10..19 买一至买五，20..29 卖一至卖五，均为 (数量, 价格)
    for (i, &(price, volume)) in BID_LEVELS.iter().enumerate() {
        builder = builder
            .field(volume, parse_i64(field(&fields, 10 + i * 2)))
            .field(price, parse_f64(field(&fields, 11 + i * 2)));
    }
    for (i, &(price, volume)) in ASK_LEVELS.iter().enumerate() {
        builder = builder
            .field(volume, parse_i64(field(&fields, 20 + i * 2)))
            .field(price, parse_f64(field(&fields, 21 + i * 2)));
    }

    Ok(builder
        .field("date", text_or_null(fields[30]))
        .field("time", text_or_null(fields[31]))
        .build())
}
