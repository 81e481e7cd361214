//! 全市场股票代码列表
//!
//! 文件格式：`{"stock": ["600000", "000001", ...]}`

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{QuotationError, Result};

#[derive(Debug, Deserialize)]
struct StockCodeFile {
    stock: Vec<String>,
}

/// 读取股票代码列表
pub fn load_stock_codes<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        QuotationError::Configuration(format!("读取股票代码文件 {} 失败: {}", path.display(), e))
    })?;
    let file: StockCodeFile = serde_json::from_str(&content).map_err(|e| {
        QuotationError::Configuration(format!("解析股票代码文件 {} 失败: {}", path.display(), e))
    })?;
    log::info!("📊 从 {} 加载 {} 个股票代码", path.display(), file.stock.len());
    Ok(file.stock)
}
