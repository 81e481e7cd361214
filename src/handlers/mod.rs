pub mod health;
pub mod quotation;

use std::sync::Arc;

use actix_web::web;

use crate::config::AppConfig;
use crate::error::Result;
use crate::services::quotation::{provider_by_name, Fetcher, FetcherConfig, Quotation};

/// 各请求共享的状态
#[derive(Debug, Clone)]
pub struct AppState {
    pub fetcher: Fetcher,
    pub stock_codes: Arc<Vec<String>>,
    /// `/quotes` 未指定数据源时使用
    pub default_provider: String,
}

impl AppState {
    pub fn new(fetcher: Fetcher, stock_codes: Vec<String>, default_provider: String) -> Self {
        Self {
            fetcher,
            stock_codes: Arc::new(stock_codes),
            default_provider,
        }
    }

    pub fn from_config(config: &AppConfig, stock_codes: Vec<String>) -> Result<Self> {
        let fetcher = Fetcher::new(FetcherConfig::from_app_config(config))?;
        Ok(Self::new(fetcher, stock_codes, config.quotation.provider.clone()))
    }

    /// 按名称创建行情服务
    pub fn quotation(&self, provider: &str) -> Result<Quotation> {
        let provider = provider_by_name(provider)?;
        Ok(Quotation::new(provider, self.fetcher.clone())
            .with_stock_codes(Arc::clone(&self.stock_codes)))
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(health::config)
            .configure(quotation::config),
    );
}
