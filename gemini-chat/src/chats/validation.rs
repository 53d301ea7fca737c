use gemini_chat_types::content::{Content, Part, PartKind, Role};
use gemini_chat_types::response::GenerateContentResponse;

use crate::error::{Error, Result};

use super::ChatInput;

/// 将新消息整理为一条带角色的内容。
///
/// 仅含函数响应的消息角色为 `function`，其余为 `user`；两者混合时报错。
pub(super) fn format_new_content(input: ChatInput) -> Result<Content> {
    let parts = match input {
        ChatInput::Text(text) => vec![Part::text(text)],
        ChatInput::Parts(parts) => parts,
    };
    if parts.is_empty() {
        return Err(Error::InvalidArgument {
            message: "No content is provided for sending chat message.".into(),
        });
    }

    let function_responses = parts.iter().filter(|part| part.is_function_response()).count();
    let role = if function_responses == 0 {
        Role::User
    } else if function_responses == parts.len() {
        Role::Function
    } else {
        return Err(Error::InvalidArgument {
            message: "Within a single message, FunctionResponse cannot be mixed with other type of part in the request for sending chat message.".into(),
        });
    };
    Ok(Content::from_parts(parts, role))
}

fn allowed_for_role(role: Role, kind: &PartKind) -> bool {
    match role {
        Role::User => matches!(
            kind,
            PartKind::Text { .. } | PartKind::InlineData { .. } | PartKind::FileData { .. }
        ),
        Role::Function => matches!(kind, PartKind::FunctionResponse { .. }),
        Role::Model => matches!(
            kind,
            PartKind::Text { .. }
                | PartKind::FunctionCall { .. }
                | PartKind::ExecutableCode { .. }
                | PartKind::CodeExecutionResult { .. }
        ),
    }
}

/// 校验会话初始历史。
pub(super) fn validate_history(history: &[Content]) -> Result<()> {
    for (index, content) in history.iter().enumerate() {
        let Some(role) = content.role else {
            return Err(Error::InvalidArgument {
                message: format!("Content at position {index} has no role"),
            });
        };
        if index == 0 && role != Role::User {
            return Err(Error::InvalidArgument {
                message: format!(
                    "First content should be with role 'user', got {}",
                    role.as_str()
                ),
            });
        }
        if content.parts.is_empty() {
            return Err(Error::InvalidArgument {
                message: "Each Content should have at least one part".into(),
            });
        }
        if let Some(part) = content
            .parts
            .iter()
            .find(|part| !allowed_for_role(role, &part.kind))
        {
            return Err(Error::InvalidArgument {
                message: format!(
                    "Content with role '{}' can't contain '{}' part",
                    role.as_str(),
                    part.kind_name()
                ),
            });
        }
    }
    Ok(())
}

/// 返回可写入历史的模型回复；响应被拦截或内容不完整时返回 `None`。
pub(super) fn model_turn(response: &GenerateContentResponse) -> Option<Content> {
    let candidate = response.first_candidate()?;
    if candidate.finish_reason.is_some_and(|reason| reason.is_blocked()) {
        return None;
    }
    let content = candidate.content.as_ref()?;
    if content.parts.is_empty()
        || content
            .parts
            .iter()
            .any(|part| part.text_value().is_some_and(str::is_empty))
    {
        return None;
    }

    let mut content = content.clone();
    content.role.get_or_insert(Role::Model);
    Some(content)
}

/// 描述响应被拦截的原因；未被拦截时返回 `None`。
pub(super) fn block_message(response: &GenerateContentResponse) -> Option<String> {
    match response.first_candidate() {
        None => {
            let feedback = response.prompt_feedback.as_ref()?;
            let mut message = String::from("Response was blocked");
            if let Some(reason) = feedback.block_reason {
                message.push_str(" due to ");
                message.push_str(reason.as_str());
            }
            if let Some(detail) = &feedback.block_reason_message {
                message.push_str(": ");
                message.push_str(detail);
            }
            Some(message)
        }
        Some(candidate) => {
            let reason = candidate.finish_reason.filter(|reason| reason.is_blocked())?;
            let mut message = format!("Candidate was blocked due to {}", reason.as_str());
            if let Some(detail) = &candidate.finish_message {
                message.push_str(": ");
                message.push_str(detail);
            }
            Some(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gemini_chat_types::content::{FunctionCall, FunctionResponse};
    use gemini_chat_types::enums::{BlockedReason, FinishReason};
    use gemini_chat_types::response::{Candidate, PromptFeedback};
    use serde_json::json;

    fn function_response() -> Part {
        Part::function_response(FunctionResponse {
            id: None,
            name: Some("lookup".into()),
            response: Some(json!({"ok": true})),
        })
    }

    fn response_with(candidate: Candidate) -> GenerateContentResponse {
        GenerateContentResponse {
            candidates: vec![candidate],
            ..GenerateContentResponse::default()
        }
    }

    #[test]
    fn text_input_becomes_user_content() {
        let content = format_new_content(ChatInput::from("hello")).unwrap();
        assert_eq!(content.role, Some(Role::User));
        assert_eq!(content.first_text(), Some("hello"));
    }

    #[test]
    fn function_responses_get_function_role() {
        let content = format_new_content(ChatInput::from(vec![function_response()])).unwrap();
        assert_eq!(content.role, Some(Role::Function));
    }

    #[test]
    fn mixed_function_response_is_rejected() {
        let err =
            format_new_content(ChatInput::from(vec![Part::text("hi"), function_response()]))
                .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { message } if message.contains("cannot be mixed")));
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = format_new_content(ChatInput::Parts(Vec::new())).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[test]
    fn history_must_start_with_user() {
        let err = validate_history(&[Content::model("hi")]).unwrap_err();
        assert!(err.to_string().contains("First content should be with role 'user'"));
        assert!(validate_history(&[]).is_ok());
    }

    #[test]
    fn history_rejects_parts_not_allowed_for_role() {
        let call = Part::function_call(FunctionCall {
            id: None,
            name: Some("lookup".into()),
            args: None,
        });
        let history = vec![Content::from_parts(vec![call], Role::User)];
        let err = validate_history(&history).unwrap_err();
        assert!(err
            .to_string()
            .contains("Content with role 'user' can't contain 'functionCall' part"));
    }

    #[test]
    fn history_rejects_empty_parts_and_missing_role() {
        let empty = vec![Content::from_parts(Vec::new(), Role::User)];
        assert!(validate_history(&empty).is_err());

        let no_role = vec![Content {
            role: None,
            parts: vec![Part::text("hi")],
        }];
        assert!(validate_history(&no_role).is_err());
    }

    #[test]
    fn valid_history_passes() {
        let history = vec![
            Content::user("hi"),
            Content::model("hello"),
            Content::from_parts(vec![function_response()], Role::Function),
        ];
        assert!(validate_history(&history).is_ok());
    }

    #[test]
    fn model_turn_defaults_role() {
        let response = response_with(Candidate {
            content: Some(Content {
                role: None,
                parts: vec![Part::text("hi")],
            }),
            ..Candidate::default()
        });
        let content = model_turn(&response).unwrap();
        assert_eq!(content.role, Some(Role::Model));
    }

    #[test]
    fn model_turn_rejects_recitation_and_empty_text() {
        let recitation = response_with(Candidate {
            content: Some(Content::model("copied")),
            finish_reason: Some(FinishReason::Recitation),
            ..Candidate::default()
        });
        assert!(model_turn(&recitation).is_none());

        let empty_text = response_with(Candidate {
            content: Some(Content::model("")),
            ..Candidate::default()
        });
        assert!(model_turn(&empty_text).is_none());

        assert!(model_turn(&GenerateContentResponse::default()).is_none());
        assert!(model_turn(&response_with(Candidate::default())).is_none());
    }

    #[test]
    fn block_message_for_candidate() {
        let response = response_with(Candidate {
            finish_reason: Some(FinishReason::Recitation),
            finish_message: Some("matched a source".into()),
            ..Candidate::default()
        });
        assert_eq!(
            block_message(&response).as_deref(),
            Some("Candidate was blocked due to RECITATION: matched a source")
        );

        let stopped = response_with(Candidate {
            finish_reason: Some(FinishReason::Stop),
            ..Candidate::default()
        });
        assert!(block_message(&stopped).is_none());
    }

    #[test]
    fn block_message_for_prompt() {
        let response = GenerateContentResponse {
            prompt_feedback: Some(PromptFeedback {
                block_reason: Some(BlockedReason::Safety),
                block_reason_message: Some("unsafe prompt".into()),
                ..PromptFeedback::default()
            }),
            ..GenerateContentResponse::default()
        };
        assert_eq!(
            block_message(&response).as_deref(),
            Some("Response was blocked due to SAFETY: unsafe prompt")
        );
        assert!(block_message(&GenerateContentResponse::default()).is_none());
    }

    #[test]
    fn block_message_for_image_safety_prompt() {
        let response: GenerateContentResponse =
            serde_json::from_value(json!({"promptFeedback": {"blockReason": "IMAGE_SAFETY"}}))
                .unwrap();
        assert_eq!(
            block_message(&response).as_deref(),
            Some("Response was blocked due to IMAGE_SAFETY")
        );
        assert!(model_turn(&response).is_none());
    }
}
