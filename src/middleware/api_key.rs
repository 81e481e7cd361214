//! API Key 认证中间件
//!
//! 请求需携带 `Authorization: Bearer <token>`。
//! 配置的 Key 为空时不启用认证，健康检查接口始终放行。

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, HttpResponse,
};
use futures::future::{ok, LocalBoxFuture, Ready};
use std::rc::Rc;

use crate::models::ApiResponse;

/// API Key 中间件
pub struct ApiKeyMiddleware {
    api_key: Rc<String>,
}

impl ApiKeyMiddleware {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Rc::new(api_key.into()),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ApiKeyMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = ApiKeyMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(ApiKeyMiddlewareService {
            service: Rc::new(service),
            api_key: self.api_key.clone(),
        })
    }
}

pub struct ApiKeyMiddlewareService<S> {
    service: Rc<S>,
    api_key: Rc<String>,
}

impl<S> ApiKeyMiddlewareService<S> {
    fn authorized(&self, req: &ServiceRequest) -> bool {
        if self.api_key.is_empty() || req.path().ends_with("/health") {
            return true;
        }
        req.headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map_or(false, |key| key == self.api_key.as_str())
    }
}

impl<S, B> Service<ServiceRequest> for ApiKeyMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if !self.authorized(&req) {
            log::warn!("拒绝未授权请求: {}", req.path());
            let response = HttpResponse::Unauthorized()
                .json(ApiResponse::<()>::error("无效的 Bearer Token".to_string()));
            return Box::pin(async move { Ok(req.into_response(response).map_into_right_body()) });
        }

        let service = self.service.clone();
        Box::pin(async move {
            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, web, App};

    async fn status(api_key: &str, uri: &str, token: Option<&str>) -> StatusCode {
        let app = test::init_service(
            App::new()
                .wrap(ApiKeyMiddleware::new(api_key))
                .route("/api/v1/health", web::get().to(|| async { HttpResponse::Ok().finish() }))
                .route("/api/v1/quotes", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;
        let mut req = test::TestRequest::get().uri(uri);
        if let Some(token) = token {
            req = req.insert_header((AUTHORIZATION, format!("Bearer {}", token)));
        }
        test::call_service(&app, req.to_request()).await.status()
    }

    #[actix_web::test]
    async fn test_empty_key_disables_auth() {
        assert_eq!(status("", "/api/v1/quotes", None).await, StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_bearer_token() {
        assert_eq!(status("secret", "/api/v1/quotes", None).await, StatusCode::UNAUTHORIZED);
        assert_eq!(
            status("secret", "/api/v1/quotes", Some("wrong")).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status("secret", "/api/v1/quotes", Some("secret")).await, StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_health_exempt() {
        assert_eq!(status("secret", "/api/v1/health", None).await, StatusCode::OK);
    }
}
