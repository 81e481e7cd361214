//! 行情数据模型
//!
//! 各数据源的原始响应统一解析为 `QuoteRecord`（字段名 -> 值），
//! 一次调用的结果为 `ResultMapping`（股票代码或交易日 -> 记录）。

use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, Utc};
use chrono_tz::Asia::Shanghai;
use serde::{Serialize, Serializer};

use crate::error::{QuotationError, Result};

/// 历史数据默认起始日期
pub const DEFAULT_HISTORY_START: &str = "20200101";

/// 单个字段的值
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Float(f64),
    Int(i64),
    Text(String),
    /// 字段缺失或无法解析
    Null,
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Float(_) | Self::Int(_))
    }
}

impl From<Option<f64>> for FieldValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Null, Self::Float)
    }
}

impl From<Option<i64>> for FieldValue {
    fn from(value: Option<i64>) -> Self {
        value.map_or(Self::Null, Self::Int)
    }
}

impl From<Option<String>> for FieldValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::Null, Self::Text)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// 单只股票的行情快照或单根历史K线
///
/// 构造完成后不可修改。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuoteRecord {
    fields: BTreeMap<&'static str, FieldValue>,
}

impl QuoteRecord {
    pub(crate) fn builder() -> QuoteRecordBuilder {
        QuoteRecordBuilder::default()
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn get_f64(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(FieldValue::as_f64)
    }

    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(FieldValue::as_i64)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for QuoteRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

#[derive(Debug, Default)]
pub(crate) struct QuoteRecordBuilder {
    fields: BTreeMap<&'static str, FieldValue>,
}

impl QuoteRecordBuilder {
    pub(crate) fn field(mut self, name: &'static str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name, value.into());
        self
    }

    pub(crate) fn build(self) -> QuoteRecord {
        QuoteRecord {
            fields: self.fields,
        }
    }
}

/// 股票代码（或交易日） -> 行情记录
pub type ResultMapping = BTreeMap<String, QuoteRecord>;

/// 实时模式下每条记录必须包含的字段
pub const REALTIME_FIELDS: [&str; 30] = [
    "name", "open", "close", "now", "high", "low", "turnover", "volume",
    "bid1", "bid1_volume", "bid2", "bid2_volume", "bid3", "bid3_volume",
    "bid4", "bid4_volume", "bid5", "bid5_volume",
    "ask1", "ask1_volume", "ask2", "ask2_volume", "ask3", "ask3_volume",
    "ask4", "ask4_volume", "ask5", "ask5_volume",
    "date", "time",
];

/// 历史模式下每条记录包含的字段
pub const HISTORY_FIELDS: [&str; 15] = [
    "code", "name", "open", "close", "high", "low", "prev_close", "change", "change_rate",
    "exchange", "volume", "amount", "marketcap", "cmarketcap", "exlots",
];

/// 历史数据日期区间（闭区间）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl HistoryRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(QuotationError::Configuration(format!(
                "开始日期 {} 晚于结束日期 {}",
                start.format("%Y%m%d"),
                end.format("%Y%m%d")
            )));
        }
        Ok(Self { start, end })
    }

    /// 解析 YYYYMMDD 格式的日期区间
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_compact_date(start)?, parse_compact_date(end)?)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn start_param(&self) -> String {
        self.start.format("%Y%m%d").to_string()
    }

    pub fn end_param(&self) -> String {
        self.end.format("%Y%m%d").to_string()
    }
}

impl Default for HistoryRange {
    /// 2020-01-01 至今天（北京时间）
    fn default() -> Self {
        let today = Utc::now().with_timezone(&Shanghai).date_naive();
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or(today);
        Self {
            start: start.min(today),
            end: today,
        }
    }
}

fn parse_compact_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(QuotationError::Configuration(format!(
            "日期 {:?} 不是 YYYYMMDD 格式",
            value
        )));
    }
    NaiveDate::parse_from_str(value, "%Y%m%d")
        .map_err(|e| QuotationError::Configuration(format!("日期 {} 无效: {}", value, e)))
}

/// 请求模式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchMode {
    /// 实时行情快照
    RealTime,
    /// 指定区间的历史日K线
    History(HistoryRange),
}

impl FetchMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RealTime => "realtime",
            Self::History(_) => "history",
        }
    }
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 一次获取的完整结果，包括被吸收的请求/解析错误
#[derive(Debug, Default)]
pub struct QuoteReport {
    pub records: ResultMapping,
    pub fetch_errors: Vec<QuotationError>,
    pub parse_errors: Vec<QuotationError>,
}

impl QuoteReport {
    pub fn warnings(&self) -> Vec<String> {
        self.fetch_errors
            .iter()
            .chain(self.parse_errors.iter())
            .map(ToString::to_string)
            .collect()
    }
}
