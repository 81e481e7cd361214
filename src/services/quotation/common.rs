//! 公共常量和辅助函数

use chrono::NaiveDateTime;

use crate::models::FieldValue;

// ==================== 行情 API 常量 ====================

/// 新浪实时行情 API
pub const SINA_REALTIME_API: &str = "http://hq.sinajs.cn";
/// 新浪行情接口要求的 Referer
pub const SINA_REFERER: &str = "https://finance.sina.com.cn/";
/// 腾讯实时行情 API
pub const TENCENT_REALTIME_API: &str = "http://qt.gtimg.cn/q=";
/// 网易实时行情 API
pub const NETEASE_REALTIME_API: &str = "http://api.money.163.com/data/feed";
/// 网易历史成交数据（CSV）
pub const NETEASE_HISTORY_API: &str = "http://quotes.money.163.com/service/chddata.html";

/// 固定的桌面浏览器 User-Agent
pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/54.0.2840.100 Safari/537.36";

/// 五档买盘字段名（价格, 数量）
pub const BID_LEVELS: [(&str, &str); 5] = [
    ("bid1", "bid1_volume"),
    ("bid2", "bid2_volume"),
    ("bid3", "bid3_volume"),
    ("bid4", "bid4_volume"),
    ("bid5", "bid5_volume"),
];

/// 五档卖盘字段名（价格, 数量）
pub const ASK_LEVELS: [(&str, &str); 5] = [
    ("ask1", "ask1_volume"),
    ("ask2", "ask2_volume"),
    ("ask3", "ask3_volume"),
    ("ask4", "ask4_volume"),
    ("ask5", "ask5_volume"),
];

/// 非空文本，空串视为缺失
pub fn text_or_null(s: &str) -> FieldValue {
    let s = s.trim();
    if s.is_empty() {
        FieldValue::Null
    } else {
        FieldValue::Text(s.to_string())
    }
}

/// 解析浮点数，空串和非数字返回 None
pub fn parse_f64(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// 解析整数，兼容 "1200.00" 这种带小数点的写法
pub fn parse_i64(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<i64>()
        .ok()
        .or_else(|| parse_f64(s).map(|v| v.round() as i64))
}

/// 按下标取字段，越界视为空
pub fn field<'a>(fields: &[&'a str], idx: usize) -> &'a str {
    fields.get(idx).copied().unwrap_or("")
}

/// 按给定格式拆分时间戳为 (YYYY-MM-DD, HH:MM:SS)
pub fn split_timestamp(raw: &str, fmt: &str) -> Option<(String, String)> {
    let dt = NaiveDateTime::parse_from_str(raw.trim(), fmt).ok()?;
    Some((
        dt.format("%Y-%m-%d").to_string(),
        dt.format("%H:%M:%S").to_string(),
    ))
}

/// 截取前若干字符，用于日志预览
pub fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
