//! OpenAI Chat Completions provider.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use crate::types::OPENAI_DEFAULT_ENDPOINT;
use medrag_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: String,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

/// OpenAI (or OpenAI-compatible) chat completions client.
pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiClient {
    /// Build a client against the public OpenAI API.
    pub fn new(api_key: impl Into<String>) -> AppResult<Self> {
        Self::with_base_url(api_key, OPENAI_DEFAULT_ENDPOINT)
    }

    /// Build a client against an OpenAI-compatible base URL (e.g. `https://host/v1`).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| AppError::Llm(format!("Failed to build OpenAI HTTP client: {}", e)))?;
        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn to_chat_request<'a>(&self, request: &'a LlmRequest) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        ChatRequest {
            model: &request.model,
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }

    fn convert_response(&self, request: &LlmRequest, parsed: ChatResponse) -> AppResult<LlmResponse> {
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Llm("OpenAI returned no choices".to_string()))?;

        let usage = parsed
            .usage
            .map(|u| LlmUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        let model = if parsed.model.is_empty() {
            request.model.clone()
        } else {
            parsed.model
        };

        Ok(LlmResponse {
            content: choice.message.content.unwrap_or_default(),
            model,
            usage,
            done: choice.finish_reason.as_deref() != Some("length"),
        })
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!(model = %request.model, "Sending chat completion request to OpenAI");

        let body = self.to_chat_request(request);
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.trim())
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to call OpenAI chat completions: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(AppError::Llm(format!("OpenAI returned {}: {}", status, text)));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse OpenAI response: {}", e)))?;

        let converted = self.convert_response(request, parsed)?;
        tracing::info!(
            completion_tokens = converted.usage.completion_tokens,
            "Received completion from OpenAI"
        );
        Ok(converted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_message_first() {
        let client = OpenAiClient::new("sk-test").unwrap();
        let request = LlmRequest::new("question", "gpt-4o-mini").with_system("rules");

        let body = client.to_chat_request(&request);
        assert_eq!(body.messages.len(), 2);
        assert_eq!(body.messages[0].role, "system");
        assert_eq!(body.messages[1].content, "question");
    }

    #[test]
    fn test_no_system_message() {
        let client = OpenAiClient::new("sk-test").unwrap();
        let request = LlmRequest::new("question", "gpt-4o-mini");

        let body = client.to_chat_request(&request);
        assert_eq!(body.messages.len(), 1);
        assert_eq!(body.messages[0].role, "user");
    }

    #[test]
    fn test_convert_response() {
        let client = OpenAiClient::new("sk-test").unwrap();
        let request = LlmRequest::new("q", "gpt-4o-mini");
        let parsed: ChatResponse = serde_json::from_str(
            r#"{
                "model": "gpt-4o-mini-2024",
                "choices": [{"message": {"content": "כימותרפיה היא טיפול [מסמך 1]"}, "finish_reason": "stop"}],
                "usage": {"prompt_tokens": 200, "completion_tokens": 12}
            }"#,
        )
        .unwrap();

        let response = client.convert_response(&request, parsed).unwrap();
        assert!(response.content.contains("[מסמך 1]"));
        assert_eq!(response.model, "gpt-4o-mini-2024");
        assert_eq!(response.usage.total_tokens, 212);
        assert!(response.done);
    }

    #[test]
    fn test_empty_choices_is_error() {
        let client = OpenAiClient::new("sk-test").unwrap();
        let request = LlmRequest::new("q", "gpt-4o-mini");
        let parsed: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();

        assert!(matches!(
            client.convert_response(&request, parsed),
            Err(AppError::Llm(_))
        ));
    }
}
