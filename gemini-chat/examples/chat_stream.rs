use futures_util::future::BoxFuture;
use futures_util::StreamExt;
use std::sync::Arc;

use gemini_chat::types::content::Content;
use gemini_chat::types::models::GenerateContentRequest;
use gemini_chat::types::response::{Candidate, GenerateContentResponse};
use gemini_chat::{Client, GenerateContentStreamResult, RequestDelegate, RequestOptions, Result};

/// 把最后一条用户消息逐词回显的 delegate。
struct EchoDelegate;

fn reply(text: String) -> GenerateContentResponse {
    GenerateContentResponse {
        candidates: vec![Candidate {
            content: Some(Content::model(text)),
            ..Candidate::default()
        }],
        ..GenerateContentResponse::default()
    }
}

fn last_text(request: &GenerateContentRequest) -> String {
    request
        .last_content()
        .map(Content::joined_text)
        .unwrap_or_default()
}

impl RequestDelegate for EchoDelegate {
    fn generate_content<'a>(
        &'a self,
        _api_key: &'a str,
        _model: &'a str,
        request: GenerateContentRequest,
        _options: &'a RequestOptions,
    ) -> BoxFuture<'a, Result<GenerateContentResponse>> {
        Box::pin(async move { Ok(reply(format!("echo: {}", last_text(&request)))) })
    }

    fn generate_content_stream<'a>(
        &'a self,
        _api_key: &'a str,
        _model: &'a str,
        request: GenerateContentRequest,
        _options: &'a RequestOptions,
    ) -> BoxFuture<'a, Result<GenerateContentStreamResult>> {
        let words: Vec<Result<GenerateContentResponse>> = last_text(&request)
            .split_inclusive(' ')
            .map(|word| Ok(reply(word.to_string())))
            .collect();
        Box::pin(async move {
            Ok(GenerateContentStreamResult::from_chunks(
                futures_util::stream::iter(words),
            ))
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let client = Client::builder()
        .api_key("demo-key")
        .delegate(Arc::new(EchoDelegate))
        .build()?;
    let chat = client.chats().create("gemini-2.5-flash");

    let response = chat.send_message("Hello there").await?;
    println!("{}", response.text().unwrap_or_default());

    let mut stream = chat.send_message_stream("stream these words back").await?;
    while let Some(chunk) = stream.next().await {
        print!("{}", chunk?.text().unwrap_or_default());
    }
    println!();

    chat.wait_idle().await;
    println!("history: {} turns", chat.history().await.len());
    Ok(())
}
