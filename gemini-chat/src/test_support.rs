use std::sync::Mutex;

use futures_util::future::BoxFuture;
use gemini_chat_types::models::GenerateContentRequest;
use gemini_chat_types::response::GenerateContentResponse;

use crate::delegate::{GenerateContentStreamResult, RequestDelegate, RequestOptions};
use crate::error::{Error, Result};

static ENV_LOCK: Mutex<()> = Mutex::new(());

pub fn with_env(vars: &[(&str, Option<&str>)], f: impl FnOnce()) {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    let backup: Vec<(String, Option<String>)> = vars
        .iter()
        .map(|(key, _)| ((*key).to_string(), std::env::var(key).ok()))
        .collect();
    for (key, value) in vars {
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }
    f();
    for (key, value) in backup {
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }
}

/// 永远失败的 delegate，用于只关心配置的测试。
pub struct NoopDelegate;

impl RequestDelegate for NoopDelegate {
    fn generate_content<'a>(
        &'a self,
        _api_key: &'a str,
        _model: &'a str,
        _request: GenerateContentRequest,
        _options: &'a RequestOptions,
    ) -> BoxFuture<'a, Result<GenerateContentResponse>> {
        Box::pin(async { Err(Error::ChannelClosed) })
    }

    fn generate_content_stream<'a>(
        &'a self,
        _api_key: &'a str,
        _model: &'a str,
        _request: GenerateContentRequest,
        _options: &'a RequestOptions,
    ) -> BoxFuture<'a, Result<GenerateContentStreamResult>> {
        Box::pin(async { Err(Error::ChannelClosed) })
    }
}
