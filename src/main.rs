//! 行情后端服务
//!
//! 提供 A 股实时行情、全市场快照和历史日K线的 RESTful API
//! 数据来源：新浪财经、腾讯财经、网易财经

use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use std::env;

use quotation_backend::config::AppConfig;
use quotation_backend::handlers::{self, AppState};
use quotation_backend::middleware::ApiKeyMiddleware;
use quotation_backend::services::quotation::load_stock_codes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let (config, source) = AppConfig::load();

    env_logger::init_from_env(Env::default().default_filter_or(config.log.level.as_str()));
    source.log();

    // 环境变量优先于配置文件
    let api_key = env::var("API_KEY").unwrap_or_else(|_| config.api.api_key.clone());
    if api_key.is_empty() {
        log::warn!("未设置 API Key，认证已关闭");
    }

    let stock_codes = load_stock_codes(&config.quotation.stock_codes_path).unwrap_or_else(|e| {
        log::warn!("{}，全市场快照将为空", e);
        Vec::new()
    });

    let state = AppState::from_config(&config, stock_codes)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    let state = web::Data::new(state);

    let bind_addr = config.bind_addr();
    log::info!(
        "启动行情后端服务: {}，默认数据源 {}",
        bind_addr,
        config.quotation.provider
    );

    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(ApiKeyMiddleware::new(api_key.clone()))
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(handlers::config)
    });
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server.bind(bind_addr)?.run().await
}
