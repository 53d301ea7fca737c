#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use futures_util::future::BoxFuture;
use serde::de::DeserializeOwned;
use tokio::sync::oneshot;

use gemini_chat::types::models::GenerateContentRequest;
use gemini_chat::types::response::GenerateContentResponse;
use gemini_chat::{
    Client, DiagnosticSink, Error, GenerateContentStreamResult, RequestDelegate, RequestOptions,
    Result,
};

pub const API_KEY: &str = "MY_API_KEY";
pub const MODEL: &str = "a-model";

/// 读取 `tests/fixtures` 下的 JSON。
pub fn fixture<T: DeserializeOwned>(name: &str) -> T {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    let raw = std::fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("missing fixture {}: {err}", path.display()));
    serde_json::from_str(&raw).unwrap()
}

pub fn fixture_response(name: &str) -> GenerateContentResponse {
    fixture(name)
}

/// 一次脚本化的 delegate 行为。
pub enum Step {
    /// 单次请求成功。
    Reply(GenerateContentResponse),
    /// 请求（或建流）直接失败。
    Fail(String),
    /// 流式 chunk；`Err` 表示该位置产生流错误。
    Stream(Vec<std::result::Result<GenerateContentResponse, String>>),
    /// 手工指定 chunk 与聚合结果，`gate` 放行前聚合不会完成。
    StreamWithAggregate {
        chunks: Vec<GenerateContentResponse>,
        aggregate: std::result::Result<GenerateContentResponse, String>,
        gate: Option<oneshot::Receiver<()>>,
    },
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub api_key: String,
    pub model: String,
    pub request: GenerateContentRequest,
    pub options: RequestOptions,
    pub streaming: bool,
}

#[derive(Default)]
pub struct ScriptedDelegate {
    steps: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedDelegate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, step: Step) {
        self.steps.lock().unwrap().push_back(step);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn take(
        &self,
        api_key: &str,
        model: &str,
        request: GenerateContentRequest,
        options: &RequestOptions,
        streaming: bool,
    ) -> Step {
        self.calls.lock().unwrap().push(RecordedCall {
            api_key: api_key.to_string(),
            model: model.to_string(),
            request,
            options: options.clone(),
            streaming,
        });
        self.steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Step::Fail("no scripted step left".into()))
    }
}

fn api_error(message: String) -> Error {
    Error::ApiError {
        status: 500,
        message,
    }
}

impl RequestDelegate for ScriptedDelegate {
    fn generate_content<'a>(
        &'a self,
        api_key: &'a str,
        model: &'a str,
        request: GenerateContentRequest,
        options: &'a RequestOptions,
    ) -> BoxFuture<'a, Result<GenerateContentResponse>> {
        let step = self.take(api_key, model, request, options, false);
        Box::pin(async move {
            match step {
                Step::Reply(response) => Ok(response),
                Step::Fail(message) => Err(api_error(message)),
                Step::Stream(_) | Step::StreamWithAggregate { .. } => Err(Error::InvalidArgument {
                    message: "streaming step scripted for a unary call".into(),
                }),
            }
        })
    }

    fn generate_content_stream<'a>(
        &'a self,
        api_key: &'a str,
        model: &'a str,
        request: GenerateContentRequest,
        options: &'a RequestOptions,
    ) -> BoxFuture<'a, Result<GenerateContentStreamResult>> {
        let step = self.take(api_key, model, request, options, true);
        Box::pin(async move {
            match step {
                Step::Fail(message) => Err(api_error(message)),
                Step::Reply(response) => Ok(GenerateContentStreamResult::from_chunks(
                    futures_util::stream::iter(vec![Ok(response)]),
                )),
                Step::Stream(items) => {
                    let items: Vec<Result<GenerateContentResponse>> = items
                        .into_iter()
                        .map(|item| item.map_err(|message| Error::Parse { message }))
                        .collect();
                    Ok(GenerateContentStreamResult::from_chunks(
                        futures_util::stream::iter(items),
                    ))
                }
                Step::StreamWithAggregate {
                    chunks,
                    aggregate,
                    gate,
                } => {
                    let stream = futures_util::stream::iter(chunks.into_iter().map(Ok));
                    let response = async move {
                        if let Some(gate) = gate {
                            let _ = gate.await;
                        }
                        aggregate.map_err(|message| Error::Stream { message })
                    };
                    Ok(GenerateContentStreamResult::new(
                        Box::pin(stream),
                        Box::pin(response),
                    ))
                }
            }
        })
    }
}

/// 记录所有诊断输出的 sink。
#[derive(Default)]
pub struct RecordingSink {
    warnings: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl DiagnosticSink for RecordingSink {
    fn warn(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_string());
    }

    fn error(&self, error: &Error) {
        self.errors.lock().unwrap().push(error.to_string());
    }
}

pub fn build_client(delegate: &Arc<ScriptedDelegate>, sink: &Arc<RecordingSink>) -> Client {
    Client::builder()
        .api_key(API_KEY)
        .delegate(delegate.clone())
        .diagnostics(sink.clone())
        .build()
        .unwrap()
}
