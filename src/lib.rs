//! A 股实时行情与历史日K线获取
//!
//! 从新浪、腾讯、网易等公开行情接口批量抓取数据，并规范化为统一的
//! `代码 -> 记录` 映射。
//!
//! ```no_run
//! use quotation_backend::services::quotation::{provider_by_name, Fetcher, FetcherConfig, Quotation};
//!
//! # async fn run() -> quotation_backend::error::Result<()> {
//! let fetcher = Fetcher::new(FetcherConfig::default())?;
//! let quotation = Quotation::new(provider_by_name("sina")?, fetcher);
//! let quotes = quotation.real(&["600000", "000001"], false).await?;
//! println!("{}", quotes.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
