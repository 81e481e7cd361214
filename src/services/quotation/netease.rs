//! 网易财经行情
//!
//! - 实时行情（JSONP）：http://api.money.163.com/data/feed/0601398,1000001,money.api
//! - 历史成交数据（CSV，GBK）：http://quotes.money.163.com/service/chddata.html?code=0601398&start=20200101&end=20210414
//!
//! 网易使用一位数字作为交易所前缀：0 为上交所，1 为深交所。

use chrono::NaiveDate;
use encoding_rs::{Encoding, GBK, UTF_8};
use serde_json::{Map, Value};
use url::Url;

use super::code::infer_exchange;
use super::common::{
    field, parse_f64, split_timestamp, text_or_null, ASK_LEVELS, BID_LEVELS,
    NETEASE_HISTORY_API, NETEASE_REALTIME_API,
};
use super::{Exchange, ParsedQuotes, QuoteProvider};
use crate::error::{QuotationError, Result};
use crate::models::{FetchMode, FieldValue, HistoryRange, QuoteRecord};

/// 历史数据 CSV 列：
/// 日期,股票代码,名称,收盘价,最高价,最低价,开盘价,前收盘,涨跌额,涨跌幅,换手率,成交量,成交金额,总市值,流通市值,成交笔数
const HISTORY_NUMERIC_COLUMNS: [(&str, usize); 12] = [
    ("close", 3),
    ("high", 4),
    ("low", 5),
    ("open", 6),
    ("prev_close", 7),
    ("change", 8),
    ("change_rate", 9),
    ("exchange", 10),
    ("volume", 11),
    ("amount", 12),
    ("marketcap", 13),
    ("cmarketcap", 14),
];

/// 网易数据源
#[derive(Debug, Clone)]
pub struct Netease {
    realtime_url: String,
    history_url: String,
}

impl Netease {
    pub fn new() -> Self {
        Self::with_base_urls(NETEASE_REALTIME_API, NETEASE_HISTORY_API)
    }

    pub fn with_base_urls(realtime_url: impl Into<String>, history_url: impl Into<String>) -> Self {
        Self {
            realtime_url: realtime_url.into(),
            history_url: history_url.into(),
        }
    }

    fn history_url(&self, code: &str, range: &HistoryRange) -> Result<String> {
        let url = Url::parse_with_params(
            &self.history_url,
            &[
                ("code", code.to_string()),
                ("start", range.start_param()),
                ("end", range.end_param()),
            ],
        )
        .map_err(|e| {
            QuotationError::Configuration(format!("历史数据地址 {} 无效: {}", self.history_url, e))
        })?;
        Ok(url.to_string())
    }
}

impl Default for Netease {
    fn default() -> Self {
        Self::new()
    }
}

impl QuoteProvider for Netease {
    fn name(&self) -> &'static str {
        "netease"
    }

    fn max_batch_size(&self) -> usize {
        800
    }

    fn exchange_prefix(&self, exchange: Exchange) -> &'static str {
        exchange.digit()
    }

    fn supports(&self, _mode: &FetchMode) -> bool {
        true
    }

    fn build_urls(&self, batches: &[String], mode: &FetchMode) -> Result<Vec<String>> {
        match mode {
            FetchMode::RealTime => Ok(batches
                .iter()
                .map(|batch| format!("{}/{},money.api", self.realtime_url, batch))
                .collect()),
            FetchMode::History(range) => batches
                .iter()
                .map(|code| self.history_url(code, range))
                .collect(),
        }
    }

    fn parse(
        &self,
        bodies: &[String],
        mode: &FetchMode,
        prefix: bool,
        requested: &[String],
    ) -> ParsedQuotes {
        let mut parsed = ParsedQuotes::default();
        for body in bodies {
            match mode {
                FetchMode::RealTime => parse_realtime_body(body, prefix, &mut parsed),
                FetchMode::History(_) => parse_history_body(body, prefix, requested, &mut parsed),
            }
        }
        parsed
    }

    fn encoding(&self, mode: &FetchMode) -> &'static Encoding {
        match mode {
            FetchMode::RealTime => UTF_8,
            FetchMode::History(_) => GBK,
        }
    }
}

// ==================== 实时行情 ====================

/// `_ntes_quote_callback({...});` -> `{...}`
fn strip_jsonp(body: &str) -> Option<&str> {
    let start = body.find('(')?;
    let end = body.rfind(')')?;
    (start < end).then(|| &body[start + 1..end])
}

/// 实时记录必须包含的字段，缺少任意一个即跳过该记录
const REALTIME_REQUIRED_KEYS: [&str; 29] = [
    "name", "open", "yestclose", "price", "high", "low", "volume", "turnover",
    "bid1", "bid2", "bid3", "bid4", "bid5",
    "bidvol1", "bidvol2", "bidvol3", "bidvol4", "bidvol5",
    "ask1", "ask2", "ask3", "ask4", "ask5",
    "askvol1", "askvol2", "askvol3", "askvol4", "askvol5",
    "update",
];

fn json_number(value: Option<&Value>) -> FieldValue {
    match value {
        Some(Value::Number(n)) => match n.as_i64() {
            Some(v) => FieldValue::Int(v),
            None => n.as_f64().into(),
        },
        Some(Value::String(s)) => parse_f64(s).into(),
        _ => FieldValue::Null,
    }
}

fn parse_realtime_body(body: &str, prefix: bool, parsed: &mut ParsedQuotes) {
    let Some(json) = strip_jsonp(body) else {
        parsed
            .errors
            .push(QuotationError::parse("netease", "响应不是 JSONP 格式"));
        return;
    };
    let stocks: Map<String, Value> = match serde_json::from_str(json) {
        Ok(stocks) => stocks,
        Err(e) => {
            parsed
                .errors
                .push(QuotationError::parse("netease", format!("JSON 解析失败: {}", e)));
            return;
        }
    };

    for (code, detail) in stocks {
        let Some(detail) = detail.as_object() else {
            parsed
                .errors
                .push(QuotationError::parse("netease", format!("{}: 不是对象", code)));
            continue;
        };
        let missing: Vec<&str> = REALTIME_REQUIRED_KEYS
            .iter()
            .copied()
            .filter(|key| !detail.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            parsed.errors.push(QuotationError::parse(
                "netease",
                format!("{}: 缺少字段 {}", code, missing.join(",")),
            ));
            continue;
        }

        let key = if prefix {
            code.clone()
        } else {
            code.chars().skip(code.chars().count().saturating_sub(6)).collect()
        };
        parsed.records.insert(key, realtime_record(detail));
    }
}

fn realtime_record(detail: &Map<String, Value>) -> QuoteRecord {
    let (date, time) = detail
        .get("update")
        .and_then(Value::as_str)
        .and_then(|update| split_timestamp(update, "%Y/%m/%d %H:%M:%S"))
        .unzip();

    let mut builder = QuoteRecord::builder()
        .field(
            "name",
            detail
                .get("name")
                .and_then(Value::as_str)
                .map_or(FieldValue::Null, text_or_null),
        )
        .field("open", json_number(detail.get("open")))
        .field("close", json_number(detail.get("yestclose")))
        .field("now", json_number(detail.get("price")))
        .field("high", json_number(detail.get("high")))
        .field("low", json_number(detail.get("low")))
        .field("turnover", json_number(detail.get("turnover")))
        .field("volume", json_number(detail.get("volume")));

    for (i, &(price, volume)) in BID_LEVELS.iter().enumerate() {
        builder = builder
            .field(price, json_number(detail.get(&format!("bid{}", i + 1))))
            .field(volume, json_number(detail.get(&format!("bidvol{}", i + 1))));
    }
    for (i, &(price, volume)) in ASK_LEVELS.iter().enumerate() {
        builder = builder
            .field(price, json_number(detail.get(&format!("ask{}", i + 1))))
            .field(volume, json_number(detail.get(&format!("askvol{}", i + 1))));
    }

    builder
        .field("date", FieldValue::from(date))
        .field("time", FieldValue::from(time))
        .build()
}

// ==================== 历史行情 ====================

fn parse_history_body(body: &str, prefix: bool, requested: &[String], parsed: &mut ParsedQuotes) {
    let mut lines = body
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty());
    // 首行为表头
    lines.next();

    for line in lines {
        match history_record(line, prefix, requested) {
            Ok((date, record)) => {
                parsed.records.insert(date, record);
            }
            Err(reason) => parsed
                .errors
                .push(QuotationError::parse("netease", format!("{:?}: {}", line, reason))),
        }
    }
}

/// 历史数据的带前缀代码
///
/// CSV 只有 6 位代码，交易所取自请求的代码（`sh000001` 为上证指数）；
/// 响应中的代码不在请求列表中时才按代码规则推断。
fn prefixed_history_code(digits: &str, requested: &[String]) -> String {
    requested
        .iter()
        .find(|code| code.len() == digits.len() + 1 && code.ends_with(digits))
        .cloned()
        .unwrap_or_else(|| format!("{}{}", infer_exchange(digits).digit(), digits))
}

fn history_record(
    line: &str,
    prefix: bool,
    requested: &[String],
) -> std::result::Result<(String, QuoteRecord), String> {
    let cols: Vec<&str> = line.split(',').map(str::trim).collect();

    let date = NaiveDate::parse_from_str(cols[0], "%Y-%m-%d")
        .map_err(|_| format!("日期 {:?} 无效", cols[0]))?;

    let digits = field(&cols, 1).trim_start_matches('\'');
    let code = if prefix && !digits.is_empty() {
        prefixed_history_code(digits, requested)
    } else {
        digits.to_string()
    };

    let mut builder = QuoteRecord::builder()
        .field("code", text_or_null(&code))
        .field("name", text_or_null(field(&cols, 2)));
    for &(name, idx) in HISTORY_NUMERIC_COLUMNS.iter() {
        builder = builder.field(name, parse_f64(field(&cols, idx)));
    }
    let record = builder
        .field("exlots", text_or_null(field(&cols, 15)))
        .build();

    Ok((date.format("%Y-%m-%d").to_string(), record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HISTORY_FIELDS, REALTIME_FIELDS};

    const REALTIME_BODY: &str = r#"_ntes_quote_callback({"0601398":{"code":"0601398","percent":0.002,"high":5.05,"askvol3":1201300,"askvol2":1340700,"askvol5":960800,"askvol4":867500,"price":5.03,"open":5.02,"bid5":4.99,"bid4":5.0,"bid3":5.01,"bid2":5.02,"bid1":5.03,"low":5.01,"updown":0.01,"type":"SH","symbol":"601398","status":0,"ask4":5.07,"bidvol3":1554900,"bidvol2":1101200,"bidvol1":1091100,"update":"2021/04/14 15:00:03","bidvol5":1430900,"bidvol4":2056300,"yestclose":5.02,"askvol1":493400,"ask5":5.08,"volume":176311436,"ask1":5.04,"name":"工商银行","ask3":5.06,"ask2":5.05,"arrow":"↑","time":"2021/04/14 15:00:03","turnover":887003215}});"#;

    const HISTORY_BODY: &str = "日期,股票代码,名称,收盘价,最高价,最低价,开盘价,前收盘,涨跌额,涨跌幅,换手率,成交量,成交金额,总市值,流通市值,成交笔数\r\n\
        2021-04-14,'601398,工商银行,5.03,5.05,5.01,5.02,5.02,0.01,0.1992,0.0657,176311436,887003215.0,1.79267e+12,1.34286e+12,None\r\n\
        2021-04-13,'601398,工商银行,5.02,5.04,4.99,5.0,5.01,0.01,0.1996,0.0551,147811001,741118021.0,1.78911e+12,1.34019e+12,12345\r\n\
        2021-04-12,'601398,工商银行,None,5.04,4.99,5.0,5.01,None,None,0.0551,147811001,741118021.0,1.78911e+12,1.34019e+12,\r\n\
        not-a-date,'601398,工商银行\r\n";

    #[test]
    fn test_build_realtime_urls() {
        let urls = Netease::new()
            .build_urls(&["0601398,1000001".to_string()], &FetchMode::RealTime)
            .unwrap();
        assert_eq!(
            urls,
            vec!["http://api.money.163.com/data/feed/0601398,1000001,money.api"]
        );
    }

    #[test]
    fn test_build_history_urls() {
        let range = HistoryRange::parse("20200101", "20210414").unwrap();
        let urls = Netease::new()
            .build_urls(&["0601398".to_string()], &FetchMode::History(range))
            .unwrap();
        assert_eq!(
            urls,
            vec!["http://quotes.money.163.com/service/chddata.html?code=0601398&start=20200101&end=20210414"]
        );
    }

    #[test]
    fn test_parse_realtime() {
        let parsed = Netease::new().parse(&[REALTIME_BODY.to_string()], &FetchMode::RealTime, false, &[]);
        assert!(parsed.errors.is_empty());

        let record = &parsed.records["601398"];
        for name in REALTIME_FIELDS {
            assert!(!record.get(name).unwrap().is_null(), "{} 为空", name);
        }
        assert_eq!(record.get_str("name"), Some("工商银行"));
        assert_eq!(record.get_f64("now"), Some(5.03));
        assert_eq!(record.get_f64("close"), Some(5.02));
        assert_eq!(record.get_i64("volume"), Some(176311436));
        assert_eq!(record.get_i64("bid1_volume"), Some(1091100));
        assert_eq!(record.get_f64("ask5"), Some(5.08));
        assert_eq!(record.get_str("date"), Some("2021-04-14"));
        assert_eq!(record.get_str("time"), Some("15:00:03"));
    }

    #[test]
    fn test_parse_realtime_prefix_and_bad_body() {
        let parsed = Netease::new().parse(
            &[REALTIME_BODY.to_string(), "<html>502</html>".to_string()],
            &FetchMode::RealTime,
            true,
            &[],
        );
        assert!(parsed.records.contains_key("0601398"));
        assert_eq!(parsed.errors.len(), 1);
    }

    #[test]
    fn test_parse_history() {
        let mode = FetchMode::History(HistoryRange::default());
        let parsed = Netease::new().parse(&[HISTORY_BODY.to_string()], &mode, false, &[]);

        assert_eq!(parsed.records.len(), 3);
        assert_eq!(parsed.errors.len(), 1);

        let day = &parsed.records["2021-04-13"];
        for name in HISTORY_FIELDS {
            assert!(day.contains(name), "缺少 {}", name);
        }
        assert_eq!(day.get_str("code"), Some("601398"));
        assert_eq!(day.get_str("name"), Some("工商银行"));
        assert_eq!(day.get_f64("close"), Some(5.02));
        assert_eq!(day.get_f64("open"), Some(5.0));
        assert_eq!(day.get_f64("prev_close"), Some(5.01));
        assert_eq!(day.get_f64("volume"), Some(147811001.0));
        assert_eq!(day.get_f64("marketcap"), Some(1.78911e12));
        assert_eq!(day.get_str("exlots"), Some("12345"));

        // 成交笔数保留为文本
        assert_eq!(parsed.records["2021-04-14"].get_str("exlots"), Some("None"));

        let gap = &parsed.records["2021-04-12"];
        assert!(gap.get("close").unwrap().is_null());
        assert!(gap.get("change").unwrap().is_null());
        assert!(gap.get("exlots").unwrap().is_null());
        assert_eq!(gap.get_f64("high"), Some(5.04));
    }

    #[test]
    fn test_parse_history_with_prefix() {
        let mode = FetchMode::History(HistoryRange::default());
        let parsed = Netease::new().parse(&[HISTORY_BODY.to_string()], &mode, true, &[]);
        assert_eq!(parsed.records["2021-04-14"].get_str("code"), Some("0601398"));
    }

    #[test]
    fn test_history_prefix_follows_requested_exchange() {
        // 上证指数 000001 按代码规则会被推断为深交所
        let body = "日期,股票代码,名称,收盘价,最高价,最低价,开盘价,前收盘,涨跌额,涨跌幅,换手率,成交量,成交金额,总市值,流通市值,成交笔数\r\n\
            2021-04-14,'000001,上证指数,3416.43,3420.65,3387.99,3395.35,3396.47,19.96,0.5877,None,317458633,382512718336.0,None,None,None\r\n";
        let requested = Netease::new().normalize_code("sh000001").unwrap();
        assert_eq!(requested, "0000001");

        let mode = FetchMode::History(HistoryRange::default());
        let parsed = Netease::new().parse(&[body.to_string()], &mode, true, &[requested]);
        assert_eq!(parsed.records["2021-04-14"].get_str("code"), Some("0000001"));

        let parsed = Netease::new().parse(&[body.to_string()], &mode, false, &["0000001".to_string()]);
        assert_eq!(parsed.records["2021-04-14"].get_str("code"), Some("000001"));
    }

    #[test]
    fn test_parse_realtime_skips_incomplete_record() {
        let body = REALTIME_BODY.replace(
            "_ntes_quote_callback({",
            r#"_ntes_quote_callback({"1000001":{"name":"平安银行","price":17.8},"#,
        );
        let parsed = Netease::new().parse(&[body], &FetchMode::RealTime, false, &[]);

        assert_eq!(parsed.records.len(), 1);
        assert!(parsed.records.contains_key("601398"));
        assert_eq!(parsed.errors.len(), 1);
        assert!(parsed.errors[0].to_string().contains("缺少字段"));

        let short = r#"_ntes_quote_callback({"0601398":{"name":"工商银行"}});"#;
        let parsed = Netease::new().parse(&[short.to_string()], &FetchMode::RealTime, false, &[]);
        assert!(parsed.records.is_empty());
        assert_eq!(parsed.errors.len(), 1);
    }
}
