//! Streaming helpers: tee a chunk stream and aggregate chunks into one response.

use futures_util::{Stream, StreamExt};
use tokio::sync::{mpsc, oneshot};

use gemini_chat_types::content::{Content, Part, PartKind, Role};
use gemini_chat_types::response::{Candidate, GenerateContentResponse};

use crate::delegate::GenerateContentStreamResult;
use crate::error::{Error, Result};

/// 单个响应允许的最大候选数（`candidateCount` 上限）。
pub const MAX_CANDIDATES: usize = 8;

impl GenerateContentStreamResult {
    /// 由原始 chunk 流构建结果。
    ///
    /// 后台任务读取整个 chunk 流：每个 chunk 转发给调用方，同时累积用于聚合。
    /// 调用方不消费（或提前丢弃）流时，聚合仍会完成。
    /// 遇到错误 chunk 时转发该错误并停止，聚合结果为 [`Error::Stream`]。
    pub fn from_chunks<S>(chunks: S) -> Self
    where
        S: Stream<Item = Result<GenerateContentResponse>> + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = oneshot::channel();

        tokio::spawn(async move {
            futures_util::pin_mut!(chunks);
            let mut collected = Vec::new();
            let mut failure = None;

            while let Some(item) = chunks.next().await {
                match &item {
                    Ok(chunk) => collected.push(chunk.clone()),
                    Err(err) => failure = Some(err.to_string()),
                }
                // 调用方可能已丢弃流，忽略发送失败。
                let _ = tx.send(item);
                if failure.is_some() {
                    break;
                }
            }

            let aggregated = match failure {
                Some(message) => Err(Error::Stream {
                    message: format!("stream aborted before completion: {message}"),
                }),
                None => aggregate_responses(&collected),
            };
            let _ = done_tx.send(aggregated);
        });

        let stream = futures_util::stream::unfold(rx, |mut rx| async {
            rx.recv().await.map(|item| (item, rx))
        });
        let response = async move {
            match done_rx.await {
                Ok(result) => result,
                Err(_) => Err(Error::ChannelClosed),
            }
        };

        Self::new(Box::pin(stream), Box::pin(response))
    }
}

/// 将流式 chunk 合并为一个完整响应。
///
/// 候选按 `index`（缺省为位置）归并；`finish_reason` 等元数据以最后出现的值为准；
/// parts 按顺序追加，相邻的普通文本片段拼接为一段。
///
/// # Errors
/// 候选索引为负数或超过 [`MAX_CANDIDATES`] 时返回 [`Error::Stream`]。
pub fn aggregate_responses(chunks: &[GenerateContentResponse]) -> Result<GenerateContentResponse> {
    let mut aggregated = GenerateContentResponse::default();

    for chunk in chunks {
        for (position, candidate) in chunk.candidates.iter().enumerate() {
            let slot = candidate_slot(candidate, position)?;
            if aggregated.candidates.len() <= slot {
                aggregated
                    .candidates
                    .resize_with(slot + 1, Candidate::default);
            }
            merge_candidate(&mut aggregated.candidates[slot], candidate);
        }

        if chunk.prompt_feedback.is_some() {
            aggregated.prompt_feedback.clone_from(&chunk.prompt_feedback);
        }
        if chunk.usage_metadata.is_some() {
            aggregated.usage_metadata.clone_from(&chunk.usage_metadata);
        }
        if chunk.model_version.is_some() {
            aggregated.model_version.clone_from(&chunk.model_version);
        }
        if chunk.response_id.is_some() {
            aggregated.response_id.clone_from(&chunk.response_id);
        }
    }

    for (slot, candidate) in aggregated.candidates.iter_mut().enumerate() {
        candidate.index = i32::try_from(slot).ok();
    }

    Ok(aggregated)
}

fn candidate_slot(candidate: &Candidate, position: usize) -> Result<usize> {
    let slot = match candidate.index {
        Some(index) => usize::try_from(index).map_err(|_| Error::Stream {
            message: format!("malformed candidate data: negative candidate index {index}"),
        })?,
        None => position,
    };
    if slot >= MAX_CANDIDATES {
        return Err(Error::Stream {
            message: format!("malformed candidate data: candidate index {slot} out of range"),
        });
    }
    Ok(slot)
}

fn merge_candidate(target: &mut Candidate, chunk: &Candidate) {
    if chunk.finish_reason.is_some() {
        target.finish_reason = chunk.finish_reason;
    }
    if chunk.finish_message.is_some() {
        target.finish_message.clone_from(&chunk.finish_message);
    }
    if !chunk.safety_ratings.is_empty() {
        target.safety_ratings.clone_from(&chunk.safety_ratings);
    }
    if chunk.citation_metadata.is_some() {
        target.citation_metadata.clone_from(&chunk.citation_metadata);
    }
    if chunk.token_count.is_some() {
        target.token_count = chunk.token_count;
    }
    if chunk.avg_logprobs.is_some() {
        target.avg_logprobs = chunk.avg_logprobs;
    }

    let Some(content) = &chunk.content else {
        return;
    };
    if content.parts.is_empty() {
        return;
    }
    let merged = target.content.get_or_insert_with(|| Content {
        role: Some(content.role.unwrap_or(Role::Model)),
        parts: Vec::new(),
    });
    for part in &content.parts {
        append_part(&mut merged.parts, part);
    }
}

fn append_part(parts: &mut Vec<Part>, part: &Part) {
    if part.is_plain_text() {
        if let Some(last) = parts.last_mut().filter(|last| last.is_plain_text()) {
            if let (PartKind::Text { text }, Some(addition)) = (&mut last.kind, part.text_value())
            {
                text.push_str(addition);
                return;
            }
        }
    }
    parts.push(part.clone());
}
