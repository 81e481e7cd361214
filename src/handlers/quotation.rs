//! 股票行情接口处理器
//!
//! ## API 列表
//! - GET /quotes?codes=600000,000001&prefix=false - 默认数据源的实时行情
//! - GET /quotes/{provider}?codes=...&prefix=... - 指定数据源的实时行情
//! - GET /quotes/{provider}/snapshot?prefix=... - 全市场快照
//! - GET /quotes/{provider}/history/{code}?start_date=YYYYMMDD&end_date=YYYYMMDD - 历史日K线

use actix_web::{web, HttpResponse, Result};

use super::AppState;
use crate::error::QuotationError;
use crate::models::{
    ApiResponse, FetchMode, HistoryQuery, HistoryRange, QuoteQuery, QuoteReport, ResultMapping,
    DEFAULT_HISTORY_START,
};

fn error_response(e: QuotationError) -> HttpResponse {
    log::warn!("请求失败: {}", e);
    let response = ApiResponse::<ResultMapping>::error(e.to_string());
    if e.is_client_error() {
        HttpResponse::BadRequest().json(response)
    } else {
        HttpResponse::InternalServerError().json(response)
    }
}

fn report_response(report: QuoteReport) -> HttpResponse {
    let warnings = report.warnings();
    HttpResponse::Ok().json(ApiResponse::partial(report.records, warnings))
}

async fn fetch(
    state: &AppState,
    provider: &str,
    codes: &[String],
    mode: FetchMode,
    prefix: bool,
) -> HttpResponse {
    let quotation = match state.quotation(provider) {
        Ok(quotation) => quotation,
        Err(e) => return error_response(e),
    };
    match quotation.fetch_report(codes, mode, prefix).await {
        Ok(report) => report_response(report),
        Err(e) => error_response(e),
    }
}

/// 默认数据源的实时行情
///
/// GET /api/v1/quotes?codes=600000,000001
pub async fn get_default_quotes(
    query: web::Query<QuoteQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let codes = query.code_list();
    Ok(fetch(&state, &state.default_provider, &codes, FetchMode::RealTime, query.prefix).await)
}

/// 指定数据源的实时行情
///
/// GET /api/v1/quotes/{provider}?codes=600000,000001&prefix=true
pub async fn get_real_quotes(
    path: web::Path<String>,
    query: web::Query<QuoteQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let provider = path.into_inner();
    let codes = query.code_list();
    Ok(fetch(&state, &provider, &codes, FetchMode::RealTime, query.prefix).await)
}

/// 全市场快照
///
/// GET /api/v1/quotes/{provider}/snapshot
pub async fn get_market_snapshot(
    path: web::Path<String>,
    query: web::Query<QuoteQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let provider = path.into_inner();
    let codes = state.stock_codes.clone();
    Ok(fetch(&state, &provider, &codes, FetchMode::RealTime, query.prefix).await)
}

/// 单只股票的历史日K线
///
/// GET /api/v1/quotes/{provider}/history/{code}?start_date=20210101&end_date=20210414
///
/// 未指定开始日期时从 2020-01-01 开始，未指定结束日期时截至今天。
pub async fn get_stock_history(
    path: web::Path<(String, String)>,
    query: web::Query<HistoryQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let (provider, code) = path.into_inner();

    let default_end = HistoryRange::default().end_param();
    let range = match HistoryRange::parse(
        query.start_date.as_deref().unwrap_or(DEFAULT_HISTORY_START),
        query.end_date.as_deref().unwrap_or(&default_end),
    ) {
        Ok(range) => range,
        Err(e) => return Ok(error_response(e)),
    };

    Ok(fetch(&state, &provider, &[code], FetchMode::History(range), query.prefix).await)
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/quotes")
            .route("", web::get().to(get_default_quotes))
            .route("/{provider}", web::get().to(get_real_quotes))
            .route("/{provider}/snapshot", web::get().to(get_market_snapshot))
            .route("/{provider}/history/{code}", web::get().to(get_stock_history)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::quotation::{Fetcher, FetcherConfig};
    use actix_web::{http::StatusCode, test, App};
    use serde_json::Value;

    fn state() -> AppState {
        let fetcher = Fetcher::new(FetcherConfig::default()).unwrap();
        AppState::new(fetcher, Vec::new(), "sina".to_string())
    }

    async fn call(uri: &str) -> (StatusCode, Value) {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state()))
                .configure(crate::handlers::config),
        )
        .await;
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }

    #[actix_web::test]
    async fn test_health() {
        let (status, body) = call("/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["default_provider"], "sina");
        assert_eq!(body["data"]["providers"].as_array().unwrap().len(), 3);
    }

    #[actix_web::test]
    async fn test_unknown_provider() {
        let (status, body) = call("/api/v1/quotes/boc?codes=600000").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[actix_web::test]
    async fn test_invalid_code() {
        let (status, body) = call("/api/v1/quotes/sina?codes=600000,abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("无效的股票代码"));
    }

    #[actix_web::test]
    async fn test_history_unsupported_by_provider() {
        let (status, body) = call("/api/v1/quotes/qq/history/600000").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("不支持"));
    }

    #[actix_web::test]
    async fn test_history_bad_date() {
        let (status, _) =
            call("/api/v1/quotes/netease/history/600000?start_date=2021-01-01").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_empty_codes_and_snapshot() {
        let (status, body) = call("/api/v1/quotes?codes=").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"].as_object().unwrap().is_empty());

        let (status, body) = call("/api/v1/quotes/netease/snapshot").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"].as_object().unwrap().is_empty());
    }
}
