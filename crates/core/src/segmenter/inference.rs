use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::{
    config::SegmenterSettings,
    provider::{ApiStyle, Provider, ProviderError},
    types::ChapterBoundary,
};

const TOOL_NAME: &str = "submit_chapters";

static SEGMENTATION_PROMPT: &str = r#"You are an expert editor. Split a lecture transcript into logical chapters with descriptive titles.
Each chapter is defined by its start and end timestamps.

YOUR TASK:
1. Ignore garbage lines (e.g. 'yw'n', 'gats', 'ag ag') that are not valid spoken text.
2. Identify logical topic changes (chapters).
3. For each chapter provide:
   - title: a descriptive title (e.g. "Introduction to Neural Networks")
   - start_timestamp: the exact timestamp where the chapter begins
   - end_timestamp: the exact timestamp where the chapter ends

INSTRUCTIONS:
- Use the timestamps written in the text as [HH:MM:SS.mmm], copied verbatim.
- Start the first chapter at the first timestamp and end the last chapter at the last timestamp.
- Leave no gaps between chapters when the content is continuous."#;

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid API response: {reason}")]
    InvalidResponse { reason: String },
}

/// One chunk's worth of input for the boundary-inference service.
#[derive(Debug, Clone)]
pub struct ChunkRequest {
    pub index: usize,
    pub total: usize,
    /// `[start] text` per line.
    pub rendered: String,
    pub first_start: String,
    pub last_start: String,
}

impl ChunkRequest {
    pub fn prompt(&self) -> String {
        format!(
            "Here is PART {part} of {total} of a lecture transcript, covering {first} to {last}.\n\n\
             Identify the logical chapters within THIS SPECIFIC CHUNK and return them.\n\
             If a chapter seems to start before this chunk or end after it, give only the \
             start/end timestamp that appears IN THIS TEXT.\n\n\
             TRANSCRIPT CHUNK:\n{text}\n",
            part = self.index + 1,
            total = self.total,
            first = self.first_start,
            last = self.last_start,
            text = self.rendered,
        )
    }
}

/// What the service proposes for one chunk.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChunkResponse {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub chapters: Vec<ChapterBoundary>,
}

/// External service that proposes chapter boundaries for a chunk of transcript.
#[async_trait]
pub trait BoundaryInference: Send + Sync {
    async fn infer(&self, request: &ChunkRequest) -> Result<ChunkResponse, InferenceError>;
}

/// [`BoundaryInference`] backed by a hosted LLM.
pub struct LlmBoundaryInference {
    provider: Provider,
    model: String,
    api_key: String,
    max_tokens: u32,
    temperature: f32,
    client: reqwest::Client,
}

impl LlmBoundaryInference {
    pub fn new(provider: Provider, settings: &SegmenterSettings) -> Result<Self, InferenceError> {
        let api_key = provider.validate_api_key()?;
        let model = settings
            .model
            .clone()
            .unwrap_or_else(|| provider.config().model.to_string());
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;

        Ok(Self {
            provider,
            model,
            api_key,
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            client,
        })
    }

    async fn infer_anthropic(&self, request: &ChunkRequest) -> Result<ChunkResponse, InferenceError> {
        let config = self.provider.config();
        let response = self
            .client
            .post(config.api_url)
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&json!({
                "model": self.model,
                "max_tokens": self.max_tokens,
                "temperature": self.temperature,
                "system": SEGMENTATION_PROMPT,
                "tools": [tool_schema()],
                "tool_choice": {"type": "tool", "name": TOOL_NAME},
                "messages": [{"role": "user", "content": request.prompt()}],
            }))
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;

        parse_tool_use_response(&response)
    }

    async fn infer_chat(&self, request: &ChunkRequest) -> Result<ChunkResponse, InferenceError> {
        let config = self.provider.config();
        let system_prompt = format!(
            "{SEGMENTATION_PROMPT}\n\n\
             You MUST output ONLY valid JSON matching this exact structure (no markdown, no explanation):\n\
             {{\"summary\": \"Concise summary of this part\", \"chapters\": [{{\"title\": \"...\", \
             \"start_timestamp\": \"HH:MM:SS.mmm\", \"end_timestamp\": \"HH:MM:SS.mmm\"}}]}}"
        );

        let response = self
            .client
            .post(config.api_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({
                "model": self.model,
                "messages": [
                    {"role": "system", "content": system_prompt},
                    {"role": "user", "content": request.prompt()},
                ],
                "temperature": self.temperature,
            }))
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;

        parse_chat_completion_response(&response)
    }
}

#[async_trait]
impl BoundaryInference for LlmBoundaryInference {
    async fn infer(&self, request: &ChunkRequest) -> Result<ChunkResponse, InferenceError> {
        debug!(
            chunk = request.index + 1,
            total = request.total,
            provider = self.provider.name(),
            "requesting chapter boundaries"
        );

        match self.provider.config().style {
            ApiStyle::AnthropicMessages => self.infer_anthropic(request).await,
            ApiStyle::ChatCompletions => self.infer_chat(request).await,
        }
    }
}

fn tool_schema() -> Value {
    json!({
        "name": TOOL_NAME,
        "description": "Submit identified chapters with time ranges.",
        "input_schema": {
            "type": "object",
            "properties": {
                "summary": {"type": "string", "description": "Concise summary of this part of the lecture."},
                "chapters": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "title": {"type": "string"},
                            "start_timestamp": {"type": "string", "description": "Exact format HH:MM:SS.mmm"},
                            "end_timestamp": {"type": "string", "description": "Exact format HH:MM:SS.mmm"}
                        },
                        "required": ["title", "start_timestamp", "end_timestamp"]
                    }
                }
            },
            "required": ["summary", "chapters"]
        }
    })
}

/// Extract the forced `submit_chapters` tool input from a Messages API response.
pub fn parse_tool_use_response(response: &Value) -> Result<ChunkResponse, InferenceError> {
    let input = response["content"]
        .as_array()
        .and_then(|blocks| {
            blocks
                .iter()
                .find(|block| block["type"] == "tool_use" && block["name"] == TOOL_NAME)
        })
        .map(|block| block["input"].clone())
        .ok_or_else(|| InferenceError::InvalidResponse {
            reason: format!("no {TOOL_NAME} tool call in response: {response}"),
        })?;

    Ok(serde_json::from_value(input)?)
}

/// Extract the JSON payload from a chat-completions response. Accepts either the
/// `{summary, chapters}` object or a bare chapter array, optionally fenced.
pub fn parse_chat_completion_response(response: &Value) -> Result<ChunkResponse, InferenceError> {
    let content = response["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| InferenceError::InvalidResponse {
            reason: format!("Invalid API response structure: {response}"),
        })?;

    let payload: Value = serde_json::from_str(strip_code_fence(content))?;
    if payload.is_array() {
        return Ok(ChunkResponse {
            summary: None,
            chapters: serde_json::from_value(payload)?,
        });
    }
    Ok(serde_json::from_value(payload)?)
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boundary(title: &str, start: &str, end: &str) -> ChapterBoundary {
        ChapterBoundary {
            title: title.to_string(),
            start_timestamp: start.to_string(),
            end_timestamp: end.to_string(),
        }
    }

    #[test]
    fn reads_tool_use_block() {
        let response = json!({
            "content": [
                {"type": "text", "text": "thinking"},
                {"type": "tool_use", "name": "submit_chapters", "input": {
                    "summary": "Backprop",
                    "chapters": [
                        {"title": "Intro", "start_timestamp": "00:00:01.000", "end_timestamp": "00:05:00.000"}
                    ]
                }}
            ]
        });

        let parsed = parse_tool_use_response(&response).unwrap();
        assert_eq!(parsed.summary.as_deref(), Some("Backprop"));
        assert_eq!(
            parsed.chapters,
            [boundary("Intro", "00:00:01.000", "00:05:00.000")]
        );
    }

    #[test]
    fn missing_tool_call_is_an_error() {
        let response = json!({"content": [{"type": "text", "text": "sorry"}]});
        assert!(matches!(
            parse_tool_use_response(&response),
            Err(InferenceError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn missing_chapters_key_reads_as_no_chapters() {
        let response = json!({
            "content": [{"type": "tool_use", "name": "submit_chapters", "input": {"summary": "s"}}]
        });

        let parsed = parse_tool_use_response(&response).unwrap();
        assert_eq!(parsed.summary.as_deref(), Some("s"));
        assert!(parsed.chapters.is_empty());
    }

    #[test]
    fn chapters_missing_fields_are_rejected() {
        let response = json!({
            "content": [{"type": "tool_use", "name": "submit_chapters", "input": {
                "chapters": [{"title": "No times"}]
            }}]
        });
        assert!(matches!(
            parse_tool_use_response(&response),
            Err(InferenceError::Json(_))
        ));
    }

    #[test]
    fn reads_fenced_chat_completion() {
        let content = "```json\n{\"summary\": \"s\", \"chapters\": [{\"title\": \"A\", \
                       \"start_timestamp\": \"00:00:00.000\", \"end_timestamp\": \"00:01:00.000\"}]}\n```";
        let response = json!({"choices": [{"message": {"content": content}}]});

        let parsed = parse_chat_completion_response(&response).unwrap();
        assert_eq!(parsed.chapters.len(), 1);
        assert_eq!(parsed.chapters[0].title, "A");
    }

    #[test]
    fn reads_bare_chapter_array() {
        let content = r#"[{"title": "B", "start_timestamp": "00:00:02.000", "end_timestamp": "00:00:09.000"}]"#;
        let response = json!({"choices": [{"message": {"content": content}}]});

        let parsed = parse_chat_completion_response(&response).unwrap();
        assert_eq!(parsed.summary, None);
        assert_eq!(parsed.chapters, [boundary("B", "00:00:02.000", "00:00:09.000")]);
    }

    #[test]
    fn prompt_names_part_and_range() {
        let request = ChunkRequest {
            index: 1,
            total: 3,
            rendered: "[00:04:10.000] hello".to_string(),
            first_start: "00:04:10.000".to_string(),
            last_start: "00:08:00.000".to_string(),
        };
        let prompt = request.prompt();
        assert!(prompt.contains("PART 2 of 3"));
        assert!(prompt.contains("00:04:10.000 to 00:08:00.000"));
        assert!(prompt.ends_with("[00:04:10.000] hello\n"));
    }
}
