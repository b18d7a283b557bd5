// OpenAI-compatible chat-completions transport.

use serde::{Deserialize, Serialize};

use super::{ChatMessage, CoachError};

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub json_mode: bool,
}

pub(crate) async fn complete(
    http: &reqwest::Client,
    endpoint: &str,
    api_key: &str,
    model: &str,
    messages: &[ChatMessage],
    options: CompletionOptions,
) -> Result<String, CoachError> {
    let request = CompletionRequest {
        model,
        messages,
        temperature: options.temperature,
        max_tokens: options.max_tokens,
        response_format: options.json_mode.then_some(ResponseFormat {
            format_type: "json_object",
        }),
    };

    let response = http
        .post(endpoint)
        .bearer_auth(api_key)
        .json(&request)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        return Err(CoachError::Api {
            status: status.as_u16(),
            message,
        });
    }

    let body: CompletionResponse = response
        .json()
        .await
        .map_err(|e| CoachError::Parse(e.to_string()))?;

    body.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| CoachError::InvalidResponse("no content in completion".to_string()))
}
