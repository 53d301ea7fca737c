//! Chats API surface.

use std::fmt;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use gemini_chat_types::content::{Content, Part};
use gemini_chat_types::models::{GenerateContentConfig, GenerateContentRequest};
use gemini_chat_types::response::GenerateContentResponse;

use crate::client::ClientInner;
use crate::delegate::{GenerateContentStreamResult, RequestDelegate, RequestOptions, ResponseStream};
use crate::diagnostics::DiagnosticSink;
use crate::error::Result;

mod validation;

use validation::{block_message, format_new_content, model_turn, validate_history};

#[derive(Clone)]
pub struct Chats {
    pub(crate) inner: Arc<ClientInner>,
}

impl Chats {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// 创建新会话。
    pub fn create(&self, model: impl Into<String>) -> ChatSession {
        ChatSession::new(&self.inner, model.into(), GenerateContentConfig::default(), Vec::new())
    }

    /// 带配置创建会话。
    pub fn create_with_config(
        &self,
        model: impl Into<String>,
        config: GenerateContentConfig,
    ) -> ChatSession {
        ChatSession::new(&self.inner, model.into(), config, Vec::new())
    }

    /// 以已有历史创建会话。
    ///
    /// # Errors
    /// 历史不以 user 开头、某条内容缺少角色或 parts、或 part 类型与角色不符时返回错误。
    pub fn create_with_history(
        &self,
        model: impl Into<String>,
        config: GenerateContentConfig,
        history: Vec<Content>,
    ) -> Result<ChatSession> {
        validate_history(&history)?;
        Ok(ChatSession::new(&self.inner, model.into(), config, history))
    }
}

/// 一条待发送的消息。
#[derive(Debug, Clone, PartialEq)]
pub enum ChatInput {
    Text(String),
    Parts(Vec<Part>),
}

impl From<&str> for ChatInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for ChatInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Part> for ChatInput {
    fn from(part: Part) -> Self {
        Self::Parts(vec![part])
    }
}

impl From<Vec<Part>> for ChatInput {
    fn from(parts: Vec<Part>) -> Self {
        Self::Parts(parts)
    }
}

/// Chat 会话。
///
/// 同一会话上的发送按顺序执行：新的发送会等待上一轮（包括流式发送的后台聚合）
/// 写入或放弃历史之后才开始。克隆出的句柄共享同一份历史。
#[derive(Clone)]
pub struct ChatSession {
    api_key: String,
    model: String,
    config: GenerateContentConfig,
    request_options: RequestOptions,
    delegate: Arc<dyn RequestDelegate>,
    diagnostics: Arc<dyn DiagnosticSink>,
    history: Arc<RwLock<Vec<Content>>>,
    turn_lock: Arc<Mutex<()>>,
}

impl ChatSession {
    fn new(
        inner: &ClientInner,
        model: String,
        config: GenerateContentConfig,
        history: Vec<Content>,
    ) -> Self {
        Self {
            api_key: inner.config.api_key.clone(),
            model,
            config,
            request_options: inner.config.request_options.clone(),
            delegate: Arc::clone(&inner.delegate),
            diagnostics: Arc::clone(&inner.diagnostics),
            history: Arc::new(RwLock::new(history)),
            turn_lock: Arc::new(Mutex::new(())),
        }
    }

    /// 覆盖本会话的请求选项（未设置的字段沿用客户端配置）。
    #[must_use]
    pub fn with_request_options(mut self, options: &RequestOptions) -> Self {
        self.request_options = self.request_options.merged_with(options);
        self
    }

    /// 模型名。
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// 发送消息。
    ///
    /// 成功且响应有效时，用户消息与模型回复一并写入历史。
    /// 响应被拦截（如 `RECITATION`）时仍返回响应，但历史不变。
    ///
    /// # Errors
    /// 消息为空或格式非法，或 delegate 返回错误时（原样传递），历史不变。
    pub async fn send_message(
        &self,
        message: impl Into<ChatInput>,
    ) -> Result<GenerateContentResponse> {
        let _turn = self.turn_lock.lock().await;
        let user_content = format_new_content(message.into())?;
        let request = self.build_request(user_content.clone()).await;
        tracing::debug!(model = %self.model, contents = request.contents.len(), "send_message");

        let response = self
            .delegate
            .generate_content(&self.api_key, &self.model, request, &self.request_options)
            .await?;

        commit_turn(
            &self.history,
            user_content,
            &response,
            self.diagnostics.as_ref(),
            "send_message()",
        )
        .await;
        Ok(response)
    }

    /// 发送消息（兼容别名）。
    ///
    /// # Errors
    /// 同 [`ChatSession::send_message`]。
    pub async fn send(&self, message: impl Into<ChatInput>) -> Result<GenerateContentResponse> {
        self.send_message(message).await
    }

    /// 流式发送消息。
    ///
    /// 流建立后立即返回 chunk 流；完整响应在后台聚合后再决定是否写入历史。
    /// 后台聚合失败不会传递给调用方，只会交给 [`DiagnosticSink::error`]。
    ///
    /// # Errors
    /// 消息格式非法，或 delegate 未能建立流时返回错误。
    pub async fn send_message_stream(
        &self,
        message: impl Into<ChatInput>,
    ) -> Result<ResponseStream> {
        let turn = Arc::clone(&self.turn_lock).lock_owned().await;
        let user_content = format_new_content(message.into())?;
        let request = self.build_request(user_content.clone()).await;
        tracing::debug!(model = %self.model, contents = request.contents.len(), "send_message_stream");

        let GenerateContentStreamResult { stream, response } = self
            .delegate
            .generate_content_stream(&self.api_key, &self.model, request, &self.request_options)
            .await?;

        let history = Arc::clone(&self.history);
        let diagnostics = Arc::clone(&self.diagnostics);
        tokio::spawn(async move {
            // 持有本轮锁直到历史处理完毕。
            let _turn = turn;
            match response.await {
                Ok(response) => {
                    commit_turn(
                        &history,
                        user_content,
                        &response,
                        diagnostics.as_ref(),
                        "send_message_stream()",
                    )
                    .await;
                }
                Err(err) => diagnostics.error(&err),
            }
        });

        Ok(stream)
    }

    /// 流式发送消息（兼容别名）。
    ///
    /// # Errors
    /// 同 [`ChatSession::send_message_stream`]。
    pub async fn send_stream(&self, message: impl Into<ChatInput>) -> Result<ResponseStream> {
        self.send_message_stream(message).await
    }

    /// 等待进行中的发送（包括流式发送的后台聚合）结束。
    pub async fn wait_idle(&self) {
        let _turn = self.turn_lock.lock().await;
    }

    /// 获取历史快照。
    pub async fn history(&self) -> Vec<Content> {
        self.history.read().await.clone()
    }

    /// 清空历史（等待进行中的发送结束）。
    pub async fn clear_history(&self) {
        let _turn = self.turn_lock.lock().await;
        self.history.write().await.clear();
    }

    async fn build_request(&self, user_content: Content) -> GenerateContentRequest {
        let mut contents = self.history.read().await.clone();
        contents.push(user_content);
        GenerateContentRequest::new(contents, &self.config)
    }
}

impl fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatSession")
            .field("model", &self.model)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

async fn commit_turn(
    history: &RwLock<Vec<Content>>,
    user_content: Content,
    response: &GenerateContentResponse,
    diagnostics: &dyn DiagnosticSink,
    operation: &str,
) {
    if let Some(model_content) = model_turn(response) {
        let mut history = history.write().await;
        history.push(user_content);
        history.push(model_content);
        return;
    }

    if let Some(reason) = block_message(response) {
        diagnostics.warn(&format!(
            "{operation} was unsuccessful. {reason}. Inspect response object for details."
        ));
    }
}
