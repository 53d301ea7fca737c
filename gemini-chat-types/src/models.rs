use serde::{Deserialize, Serialize};

use crate::config::{GenerationConfig, SafetySetting};
use crate::content::Content;
use crate::tool::{Tool, ToolConfig};

/// 生成配置（会话级，每次请求都会带上）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_settings: Option<Vec<SafetySetting>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_config: Option<ToolConfig>,
    /// 缓存内容名称（`cachedContents/...`）。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_content: Option<String>,
}

/// `GenerateContent` 请求体。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_settings: Option<Vec<SafetySetting>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_config: Option<ToolConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_content: Option<String>,
}

impl GenerateContentRequest {
    /// 以会话配置和完整对话内容构建请求。
    #[must_use]
    pub fn new(contents: Vec<Content>, config: &GenerateContentConfig) -> Self {
        let GenerateContentConfig {
            system_instruction,
            generation_config,
            safety_settings,
            tools,
            tool_config,
            cached_content,
        } = config.clone();
        Self {
            contents,
            system_instruction,
            generation_config,
            safety_settings,
            tools,
            tool_config,
            cached_content,
        }
    }

    /// 最后一条内容（即本轮新消息）。
    #[must_use]
    pub fn last_content(&self) -> Option<&Content> {
        self.contents.last()
    }
}
