use async_trait::async_trait;

use crate::errors::{GridZoomError, GridZoomResult};
use crate::llm::provider::LlmProvider;
use crate::llm::types::{CallConfig, ChatMessage, LlmResponse};

pub struct OpenAiCompatibleProvider {
    id: String,
    api_base: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(id: String, api_base: String, api_key: String) -> Self {
        Self {
            id,
            api_base,
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

/// Request body for `chat/completions`.
pub(crate) fn build_request_body(messages: &[ChatMessage], cfg: &CallConfig) -> GridZoomResult<serde_json::Value> {
    let mut body = serde_json::json!({
        "model": cfg.model,
        "messages": messages,
        "stream": false,
        "temperature": cfg.temperature,
        "max_tokens": cfg.max_tokens,
    });
    if cfg.json_mode {
        body["response_format"] = serde_json::json!({ "type": "json_object" });
    }
    Ok(body)
}

/// Copy of `body` with every `image_url` payload replaced, for logging.
pub(crate) fn sanitize_for_log(body: &serde_json::Value) -> serde_json::Value {
    let mut log_body = body.clone();
    if let Some(msgs) = log_body.get_mut("messages").and_then(|m| m.as_array_mut()) {
        for msg in msgs {
            // content can be string or array of parts; we only touch the array case.
            let Some(parts) = msg.get_mut("content").and_then(|c| c.as_array_mut()) else {
                continue;
            };
            for part in parts {
                if part.get("type").and_then(|t| t.as_str()) != Some("image_url") {
                    continue;
                }
                if let Some(url) = part.get_mut("image_url").and_then(|i| i.get_mut("url")) {
                    *url = serde_json::Value::String("<omitted_base64_image>".to_string());
                }
            }
        }
    }
    log_body
}

/// Pull the assistant text out of a `chat/completions` response.
pub(crate) fn extract_content(json: &serde_json::Value) -> GridZoomResult<String> {
    if let Some(err) = json.get("error") {
        return Err(GridZoomError::LlmProvider(format!("upstream error: {err}")));
    }
    json["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| GridZoomError::LlmProvider("response has no choices[0].message.content".into()))
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.id
    }

    async fn chat(&self, messages: Vec<ChatMessage>, cfg: &CallConfig) -> GridZoomResult<LlmResponse> {
        let body = build_request_body(&messages, cfg)?;

        tracing::debug!(
            provider = %self.id,
            model = %cfg.model,
            messages = messages.len(),
            "sending LLM request"
        );
        tracing::debug!(
            body = %serde_json::to_string(&sanitize_for_log(&body)).unwrap_or_default(),
            "request body (sanitized, base64 omitted)"
        );

        let response = self
            .client
            .post(&self.api_base)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let err_body = response.text().await.unwrap_or_default();
            return Err(GridZoomError::LlmProvider(format!("{}: {}", status, err_body)));
        }

        let json: serde_json::Value = response.json().await?;
        let content = extract_content(&json)?;

        tracing::info!(
            provider = %self.id,
            content_len = content.len(),
            usage = %json["usage"],
            "LLM JSON response received"
        );

        Ok(LlmResponse { content })
    }
}
