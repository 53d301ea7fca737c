//! Request delegate: the collaborator that actually talks to the model.

use std::collections::HashMap;
use std::fmt;
use std::pin::Pin;

use futures_util::future::BoxFuture;
use futures_util::Stream;

use gemini_chat_types::models::GenerateContentRequest;
use gemini_chat_types::response::GenerateContentResponse;

use crate::error::Result;

/// 流式响应 chunk 序列。
pub type ResponseStream = Pin<Box<dyn Stream<Item = Result<GenerateContentResponse>> + Send>>;

/// 解析为完整聚合响应的 future。
pub type ResponseFuture = BoxFuture<'static, Result<GenerateContentResponse>>;

/// 每次请求附带的选项，由 delegate 自行解释。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// 请求超时（毫秒）。
    pub timeout: Option<u64>,
    pub base_url: Option<String>,
    pub api_version: Option<String>,
    pub headers: HashMap<String, String>,
}

impl RequestOptions {
    /// 用 `overrides` 中已设置的字段覆盖当前值；headers 合并。
    #[must_use]
    pub fn merged_with(&self, overrides: &Self) -> Self {
        let mut headers = self.headers.clone();
        headers.extend(
            overrides
                .headers
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        Self {
            timeout: overrides.timeout.or(self.timeout),
            base_url: overrides.base_url.clone().or_else(|| self.base_url.clone()),
            api_version: overrides
                .api_version
                .clone()
                .or_else(|| self.api_version.clone()),
            headers,
        }
    }
}

/// 流式请求结果：调用方消费的 chunk 流 + 后台聚合的完整响应。
pub struct GenerateContentStreamResult {
    pub stream: ResponseStream,
    pub response: ResponseFuture,
}

impl GenerateContentStreamResult {
    #[must_use]
    pub fn new(stream: ResponseStream, response: ResponseFuture) -> Self {
        Self { stream, response }
    }
}

impl fmt::Debug for GenerateContentStreamResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerateContentStreamResult")
            .finish_non_exhaustive()
    }
}

/// 执行实际模型调用的协作者。
///
/// 错误原样返回给会话；重试、超时与认证均由实现方负责。
pub trait RequestDelegate: Send + Sync {
    /// 单次请求，返回完整响应。
    fn generate_content<'a>(
        &'a self,
        api_key: &'a str,
        model: &'a str,
        request: GenerateContentRequest,
        options: &'a RequestOptions,
    ) -> BoxFuture<'a, Result<GenerateContentResponse>>;

    /// 流式请求。返回 `Err` 表示流未能建立。
    fn generate_content_stream<'a>(
        &'a self,
        api_key: &'a str,
        model: &'a str,
        request: GenerateContentRequest,
        options: &'a RequestOptions,
    ) -> BoxFuture<'a, Result<GenerateContentStreamResult>>;
}
