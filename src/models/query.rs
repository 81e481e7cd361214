//! 行情接口查询参数

use serde::Deserialize;

/// 实时行情 / 全市场快照查询参数
#[derive(Debug, Default, Deserialize)]
pub struct QuoteQuery {
    /// 逗号分隔的股票代码，如 `600000,sz000001`
    pub codes: Option<String>,
    /// 返回的 key 是否保留交易所前缀
    #[serde(default)]
    pub prefix: bool,
}

impl QuoteQuery {
    pub fn code_list(&self) -> Vec<String> {
        self.codes
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }
}

/// 历史行情查询参数
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    /// 开始日期（YYYYMMDD）
    pub start_date: Option<String>,
    /// 结束日期（YYYYMMDD）
    pub end_date: Option<String>,
    #[serde(default)]
    pub prefix: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_list() {
        let query = QuoteQuery {
            codes: Some(" 600000, sz000001,,162411 ".to_string()),
            prefix: false,
        };
        assert_eq!(query.code_list(), vec!["600000", "sz000001", "162411"]);
        assert!(QuoteQuery::default().code_list().is_empty());
    }
}
