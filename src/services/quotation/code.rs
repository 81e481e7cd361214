//! 股票代码规范化
//!
//! 根据代码前缀判断所属交易所，再由各数据源渲染成自己的交易所前缀。

use crate::error::{QuotationError, Result};

/// 属于上交所的代码前缀，按顺序匹配
const SH_HEAD: [&str; 12] = [
    "50", "51", "60", "90", "110", "113", "132", "204", "5", "6", "9", "7",
];

/// 交易所
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Exchange {
    /// 上海证券交易所
    Shanghai,
    /// 深圳证券交易所
    Shenzhen,
}

impl Exchange {
    /// 网易风格的一位数字前缀
    pub fn digit(self) -> &'static str {
        match self {
            Self::Shanghai => "0",
            Self::Shenzhen => "1",
        }
    }

    /// 新浪、腾讯风格的字母前缀
    pub fn letters(self) -> &'static str {
        match self {
            Self::Shanghai => "sh",
            Self::Shenzhen => "sz",
        }
    }
}

/// 校验后的股票代码
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockCode {
    pub exchange: Exchange,
    /// 6 位数字代码
    pub digits: String,
}

impl StockCode {
    /// 解析原始代码
    ///
    /// 以 `sh`/`sz` 开头时直接使用该交易所，否则按前缀表推断。
    /// 去掉字母前缀后必须恰好是 6 位数字。
    pub fn parse(raw: &str) -> Result<Self> {
        let code = raw.trim();
        let lower = code.to_ascii_lowercase();

        let (explicit, body) = if let Some(rest) = lower.strip_prefix("sh") {
            (Some(Exchange::Shanghai), rest)
        } else if let Some(rest) = lower.strip_prefix("sz") {
            (Some(Exchange::Shenzhen), rest)
        } else {
            (None, lower.as_str())
        };

        if body.len() != 6 || !body.bytes().all(|b| b.is_ascii_digit()) {
            return Err(QuotationError::InvalidCode(raw.to_string()));
        }

        let exchange = explicit.unwrap_or_else(|| infer_exchange(body));
        Ok(Self {
            exchange,
            digits: body.to_string(),
        })
    }
}

/// 按前缀表判断交易所
pub fn infer_exchange(digits: &str) -> Exchange {
    if SH_HEAD.iter().any(|head| digits.starts_with(head)) {
        Exchange::Shanghai
    } else {
        Exchange::Shenzhen
    }
}
