//! Client configuration.

use std::fmt;
use std::sync::Arc;

use http::{HeaderName, HeaderValue};

use crate::delegate::{RequestDelegate, RequestOptions};
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::error::{Error, Result};

/// 默认服务地址。
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/";
/// 默认 API 版本。
pub const DEFAULT_API_VERSION: &str = "v1beta";

/// Gemini 会话客户端。
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    pub config: ClientConfig,
    pub delegate: Arc<dyn RequestDelegate>,
    pub diagnostics: Arc<dyn DiagnosticSink>,
}

/// 客户端配置。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API 密钥，每次请求原样交给 delegate。
    pub api_key: String,
    /// 请求选项（已填充默认值）。
    pub request_options: RequestOptions,
}

impl Client {
    /// 使用 API Key 与 delegate 创建客户端。
    ///
    /// # Errors
    /// 当 API Key 无效时返回错误。
    pub fn new(api_key: impl Into<String>, delegate: Arc<dyn RequestDelegate>) -> Result<Self> {
        Self::builder().api_key(api_key).delegate(delegate).build()
    }

    /// 从环境变量创建客户端。
    ///
    /// 读取 `GEMINI_API_KEY`（回退 `GOOGLE_API_KEY`），
    /// 以及可选的 `GENAI_BASE_URL`/`GEMINI_BASE_URL`、`GENAI_API_VERSION`。
    ///
    /// # Errors
    /// 当环境变量缺失或配置无效时返回错误。
    pub fn from_env(delegate: Arc<dyn RequestDelegate>) -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("GOOGLE_API_KEY"))
            .map_err(|_| Error::InvalidConfig {
                message: "GEMINI_API_KEY or GOOGLE_API_KEY not found".into(),
            })?;
        let mut builder = Self::builder().api_key(api_key).delegate(delegate);
        if let Ok(base_url) =
            std::env::var("GENAI_BASE_URL").or_else(|_| std::env::var("GEMINI_BASE_URL"))
        {
            if !base_url.trim().is_empty() {
                builder = builder.base_url(base_url);
            }
        }
        if let Ok(api_version) = std::env::var("GENAI_API_VERSION") {
            if !api_version.trim().is_empty() {
                builder = builder.api_version(api_version);
            }
        }
        builder.build()
    }

    /// 创建 Builder。
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// 访问 Chats API。
    #[must_use]
    pub fn chats(&self) -> crate::chats::Chats {
        crate::chats::Chats::new(self.inner.clone())
    }

    /// 当前配置。
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("request_options", &self.inner.config.request_options)
            .finish_non_exhaustive()
    }
}

/// 客户端 Builder。
#[derive(Default)]
pub struct ClientBuilder {
    api_key: Option<String>,
    delegate: Option<Arc<dyn RequestDelegate>>,
    diagnostics: Option<Arc<dyn DiagnosticSink>>,
    request_options: RequestOptions,
}

impl ClientBuilder {
    /// 设置 API Key。
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// 设置执行请求的 delegate。
    #[must_use]
    pub fn delegate(mut self, delegate: Arc<dyn RequestDelegate>) -> Self {
        self.delegate = Some(delegate);
        self
    }

    /// 设置诊断输出（默认写入 `tracing`）。
    #[must_use]
    pub fn diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = Some(sink);
        self
    }

    /// 设置请求超时（毫秒）。
    #[must_use]
    pub const fn timeout(mut self, millis: u64) -> Self {
        self.request_options.timeout = Some(millis);
        self
    }

    /// 增加默认请求头。
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.request_options
            .headers
            .insert(key.into(), value.into());
        self
    }

    /// 设置自定义基础 URL。
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.request_options.base_url = Some(base_url.into());
        self
    }

    /// 设置 API 版本。
    #[must_use]
    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.request_options.api_version = Some(api_version.into());
        self
    }

    /// 构建客户端。
    ///
    /// # Errors
    /// 当缺少 API Key 或 delegate、或参数无效时返回错误。
    pub fn build(self) -> Result<Client> {
        let Self {
            api_key,
            delegate,
            diagnostics,
            request_options,
        } = self;

        let api_key = Self::validate_api_key(api_key)?;
        let delegate = delegate.ok_or_else(|| Error::InvalidConfig {
            message: "A request delegate is required".into(),
        })?;
        Self::validate_headers(&request_options)?;

        let request_options = RequestOptions {
            base_url: Some(normalize_base_url(
                request_options
                    .base_url
                    .as_deref()
                    .unwrap_or(DEFAULT_BASE_URL),
            )),
            api_version: Some(
                request_options
                    .api_version
                    .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            ),
            ..request_options
        };

        Ok(Client {
            inner: Arc::new(ClientInner {
                config: ClientConfig {
                    api_key,
                    request_options,
                },
                delegate,
                diagnostics: diagnostics.unwrap_or_else(|| Arc::new(TracingSink)),
            }),
        })
    }

    fn validate_api_key(api_key: Option<String>) -> Result<String> {
        let api_key = api_key.ok_or_else(|| Error::InvalidConfig {
            message: "API key is required".into(),
        })?;
        if api_key.trim().is_empty() {
            return Err(Error::InvalidConfig {
                message: "API key must not be blank".into(),
            });
        }
        HeaderValue::from_str(&api_key).map_err(|_| Error::InvalidConfig {
            message: "Invalid API key value".into(),
        })?;
        Ok(api_key)
    }

    fn validate_headers(options: &RequestOptions) -> Result<()> {
        for (key, value) in &options.headers {
            HeaderName::from_bytes(key.as_bytes()).map_err(|_| Error::InvalidConfig {
                message: format!("Invalid header name: {key}"),
            })?;
            HeaderValue::from_str(value).map_err(|_| Error::InvalidConfig {
                message: format!("Invalid header value for {key}"),
            })?;
        }
        Ok(())
    }
}

fn normalize_base_url(base_url: &str) -> String {
    let mut value = base_url.trim().to_string();
    if !value.ends_with('/') {
        value.push('/');
    }
    value
}
