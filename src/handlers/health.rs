use actix_web::{web, HttpResponse, Result};
use serde::Serialize;

use super::AppState;
use crate::models::ApiResponse;

/// 已实现的数据源
const PROVIDERS: [&str; 3] = ["sina", "tencent", "netease"];

#[derive(Debug, Serialize)]
pub struct HealthInfo {
    pub status: &'static str,
    pub providers: [&'static str; 3],
    pub default_provider: String,
    /// 全市场快照包含的股票数
    pub stock_codes: usize,
}

pub async fn health_check(state: web::Data<AppState>) -> Result<HttpResponse> {
    let info = HealthInfo {
        status: "Service is healthy",
        providers: PROVIDERS,
        default_provider: state.default_provider.clone(),
        stock_codes: state.stock_codes.len(),
    };
    Ok(HttpResponse::Ok().json(ApiResponse::success(info)))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}
