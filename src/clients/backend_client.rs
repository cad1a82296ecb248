//! 后端 API 客户端
//!
//! 封装所有与评测后端相关的 HTTP 调用：
//! - `GET  /questions`
//! - `POST /counter/increment`
//! - `POST /responses`

use crate::clients::backend::{ItemPool, SharedCounter, SubmissionGateway};
use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult};
use crate::models::evaluation::Evaluation;
use crate::models::item::Item;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const QUESTIONS_ENDPOINT: &str = "/questions";
const COUNTER_ENDPOINT: &str = "/counter/increment";
const RESPONSES_ENDPOINT: &str = "/responses";

/// 计数器接口响应
#[derive(Debug, Deserialize)]
struct CounterResponse {
    value: i64,
}

/// 后端 API 客户端
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// 创建新的后端客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        Self::with_base_url(&config.api_base_url, config.request_timeout_secs)
    }

    /// 使用指定地址创建客户端
    pub fn with_base_url(base_url: &str, timeout_secs: u64) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| {
                AppError::Api(ApiError::ClientInit {
                    source: Box::new(e),
                })
            })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// 发送请求并检查状态码
    async fn send(
        &self,
        endpoint: &str,
        request: reqwest::RequestBuilder,
    ) -> AppResult<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::api_bad_response(endpoint, status.as_u16()));
        }
        Ok(response)
    }

    async fn parse_json<T: serde::de::DeserializeOwned>(
        endpoint: &str,
        response: reqwest::Response,
    ) -> AppResult<T> {
        response.json::<T>().await.map_err(|e| {
            AppError::Api(ApiError::JsonParseFailed {
                endpoint: endpoint.to_string(),
                source: Box::new(e),
            })
        })
    }
}

#[async_trait]
impl ItemPool for BackendClient {
    async fn fetch_items(&self) -> AppResult<Vec<Item>> {
        let url = self.url(QUESTIONS_ENDPOINT);
        debug!("拉取题库: {}", url);

        let response = self.send(QUESTIONS_ENDPOINT, self.http.get(&url)).await?;
        let items: Vec<Item> = Self::parse_json(QUESTIONS_ENDPOINT, response).await?;

        debug!("题库共 {} 道题目", items.len());
        Ok(items)
    }
}

#[async_trait]
impl SharedCounter for BackendClient {
    async fn increment(&self) -> AppResult<i64> {
        let url = self.url(COUNTER_ENDPOINT);
        debug!("请求共享计数器: {}", url);

        let response = self.send(COUNTER_ENDPOINT, self.http.post(&url)).await?;
        let counter: CounterResponse = Self::parse_json(COUNTER_ENDPOINT, response).await?;

        debug!("共享计数器返回: {}", counter.value);
        Ok(counter.value)
    }
}

#[async_trait]
impl SubmissionGateway for BackendClient {
    async fn submit(&self, evaluation: &Evaluation) -> AppResult<()> {
        let url = self.url(RESPONSES_ENDPOINT);
        debug!("提交评判: 题目 {}", evaluation.item_id);

        // 响应体不做解析
        self.send(RESPONSES_ENDPOINT, self.http.post(&url).json(evaluation))
            .await?;
        Ok(())
    }
}
