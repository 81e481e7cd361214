//! 并发请求
//!
//! 每个 URL 发起一次 GET 请求，并发数受 `max_concurrency` 限制。
//! 单个请求失败只记录，不影响其他请求；连接错误、超时和 5xx 按指数退避重试。

use std::fmt;
use std::time::Duration;

use encoding_rs::{Encoding, UTF_8};
use futures::stream::{self, StreamExt};
use reqwest::{header, Client};
use tokio::time::{timeout_at, Instant};
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;

use super::common::{preview, DESKTOP_USER_AGENT};
use crate::config::AppConfig;
use crate::error::{QuotationError, Result};

/// 请求配置
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// 单次请求超时
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// 同时进行的请求数上限
    pub max_concurrency: usize,
    /// 失败后的最大重试次数
    pub retries: usize,
    /// 首次重试的等待时间（毫秒），之后逐次翻倍
    pub retry_base_millis: u64,
    /// 整批请求的截止时间，超时的请求记为失败
    pub deadline: Option<Duration>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_concurrency: 8,
            retries: 2,
            retry_base_millis: 200,
            deadline: None,
        }
    }
}

impl FetcherConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.api.timeout_secs),
            connect_timeout: Duration::from_secs(config.api.connect_timeout_secs),
            max_concurrency: config.quotation.max_concurrency,
            retries: config.quotation.retries,
            retry_base_millis: config.quotation.retry_base_millis,
            deadline: config.quotation.deadline_secs.map(Duration::from_secs),
        }
    }
}

/// 数据源相关的请求参数
#[derive(Debug, Clone, Copy)]
pub struct RequestProfile {
    /// 响应体编码
    pub encoding: &'static Encoding,
    /// 额外请求头
    pub headers: &'static [(&'static str, &'static str)],
}

impl Default for RequestProfile {
    fn default() -> Self {
        Self {
            encoding: UTF_8,
            headers: &[],
        }
    }
}

/// 一批请求的结果
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// 成功的响应体，顺序与 URL 一致
    pub bodies: Vec<String>,
    pub errors: Vec<QuotationError>,
}

/// 单次尝试的错误，区分是否值得重试
#[derive(Debug)]
enum AttemptError {
    Transient(String),
    Permanent(String),
}

impl AttemptError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            Self::Transient(e.to_string())
        } else if e.status().map_or(false, |s| s.is_server_error()) {
            Self::Transient(e.to_string())
        } else {
            Self::Permanent(e.to_string())
        }
    }
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient(reason) | Self::Permanent(reason) => f.write_str(reason),
        }
    }
}

/// HTTP 请求器，内部的 `Client` 可廉价克隆共享连接池
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    config: FetcherConfig,
}

impl Fetcher {
    pub fn new(config: FetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .gzip(true)
            .deflate(true)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| QuotationError::Configuration(format!("创建 HTTP 客户端失败: {}", e)))?;
        Ok(Self { client, config })
    }

    /// 按配置的 `deadline` 从现在起计算的截止时间
    pub(crate) fn default_deadline(&self) -> Option<Instant> {
        self.config.deadline.map(|d| Instant::now() + d)
    }

    /// 并发获取所有 URL，失败的请求记录在 `errors` 中
    pub async fn fetch_all(&self, urls: &[String], profile: &RequestProfile) -> FetchOutcome {
        self.fetch_all_until(urls, profile, self.default_deadline()).await
    }

    /// 同 [`Fetcher::fetch_all`]，`deadline` 为 `None` 时只受单个请求超时限制
    pub async fn fetch_all_until(
        &self,
        urls: &[String],
        profile: &RequestProfile,
        deadline: Option<Instant>,
    ) -> FetchOutcome {
        let results: Vec<Result<String>> = stream::iter(urls)
            .map(|url| self.fetch_before(url, profile, deadline))
            .buffered(self.config.max_concurrency.max(1))
            .collect()
            .await;

        let mut outcome = FetchOutcome::default();
        for result in results {
            match result {
                Ok(body) => outcome.bodies.push(body),
                Err(e) => {
                    log::warn!("⚠️ {}", e);
                    outcome.errors.push(e);
                }
            }
        }
        log::info!(
            "📥 共 {} 个请求，成功 {}，失败 {}",
            urls.len(),
            outcome.bodies.len(),
            outcome.errors.len()
        );
        outcome
    }

    async fn fetch_before(
        &self,
        url: &str,
        profile: &RequestProfile,
        deadline: Option<Instant>,
    ) -> Result<String> {
        match deadline {
            Some(at) => timeout_at(at, self.fetch_with_retry(url, profile))
                .await
                .unwrap_or_else(|_| Err(QuotationError::fetch(url, "超过截止时间"))),
            None => self.fetch_with_retry(url, profile).await,
        }
    }

    async fn fetch_with_retry(&self, url: &str, profile: &RequestProfile) -> Result<String> {
        // 2 * factor = 首次等待时间
        let strategy = ExponentialBackoff::from_millis(2)
            .factor((self.config.retry_base_millis / 2).max(1))
            .max_delay(Duration::from_secs(5))
            .map(jitter)
            .take(self.config.retries);

        RetryIf::spawn(
            strategy,
            || self.fetch_once(url, profile),
            |e: &AttemptError| {
                if e.is_transient() {
                    log::debug!("🔁 重试 {}: {}", url, e);
                }
                e.is_transient()
            },
        )
        .await
        .map_err(|e| QuotationError::fetch(url, e.to_string()))
    }

    async fn fetch_once(
        &self,
        url: &str,
        profile: &RequestProfile,
    ) -> std::result::Result<String, AttemptError> {
        log::debug!("📡 请求行情 URL: {}", url);

        let mut request = self
            .client
            .get(url)
            .header(header::USER_AGENT, DESKTOP_USER_AGENT);
        for (name, value) in profile.headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await.map_err(AttemptError::from_reqwest)?;
        let status = response.status();
        if status.is_server_error() {
            return Err(AttemptError::Transient(format!("HTTP {}", status)));
        }
        if !status.is_success() {
            return Err(AttemptError::Permanent(format!("HTTP {}", status)));
        }

        let bytes = response.bytes().await.map_err(AttemptError::from_reqwest)?;
        let (text, _, had_errors) = profile.encoding.decode(&bytes);
        if had_errors {
            log::debug!("响应含无法解码的字节 ({}): {}", profile.encoding.name(), url);
        }
        log::trace!("原始响应数据: {}", preview(&text, 300));
        Ok(text.into_owned())
    }
}
