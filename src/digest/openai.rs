use crate::digest::config::ApiConfig;
use crate::digest::util::take_chars;
use crate::error::SummarizeError;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::borrow::Cow;
use std::time::Duration;

pub const TRUNCATION_MARKER: &str = "...";

const PROMPT_TEMPLATE: &str = "Summarize the following web page content in 50-150 words. \
Structure the summary as:\n\
• One sentence stating the main topic\n\
• Three to five key points, each on its own line starting with \"• \"\n\
• A closing line starting with \"• Takeaway:\"\n\
Do not add any other headings or preamble.\n\nContent:\n";

/// Seam between the broker and the chat-completion API.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, api_key: &str, prompt: &str) -> Result<String, SummarizeError>;
}

/// Cut `text` to `max_chars`, marking the cut.
pub fn truncate_for_prompt(text: &str, max_chars: usize) -> Cow<'_, str> {
    let kept = take_chars(text, max_chars);
    if kept.len() == text.len() {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(format!("{kept}{TRUNCATION_MARKER}"))
    }
}

pub fn build_prompt(text: &str, max_chars: usize) -> String {
    format!("{PROMPT_TEMPLATE}{}", truncate_for_prompt(text, max_chars))
}

fn upstream_error_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    let message = json.get("error")?.get("message")?.as_str()?.trim();
    (!message.is_empty()).then(|| message.to_string())
}

fn extract_first_choice(json: &Value) -> Option<String> {
    let choices = json.get("choices").and_then(Value::as_array)?;
    let first = choices.first()?;
    let content = first.get("message")?.get("content")?;
    match content {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Array(parts) => {
            let mut chunks = Vec::new();
            for part in parts {
                if let Some(text) = part.get("text").and_then(Value::as_str) {
                    chunks.push(text);
                }
            }
            if chunks.is_empty() {
                None
            } else {
                Some(chunks.join("\n").trim().to_string())
            }
        }
        _ => None,
    }
}

pub struct ChatCompletionsClient {
    client: Client,
    endpoint: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
}

impl ChatCompletionsClient {
    pub fn new(api: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(api.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: api.chat_completions_url(),
            model: api.model.clone(),
            max_tokens: api.max_tokens,
            temperature: api.temperature,
        })
    }
}

#[async_trait]
impl Summarizer for ChatCompletionsClient {
    async fn summarize(&self, api_key: &str, prompt: &str) -> Result<String, SummarizeError> {
        let payload = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "max_tokens": self.max_tokens,
            "temperature": self.temperature
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(SummarizeError::transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = upstream_error_message(&body)
                .unwrap_or_else(|| format!("API request failed: {}", status.as_u16()));
            return Err(SummarizeError::UpstreamHttp {
                status: status.as_u16(),
                message,
            });
        }

        let json: Value = response.json().await.map_err(SummarizeError::transport)?;
        extract_first_choice(&json).ok_or(SummarizeError::UpstreamEmptyResponse)
    }
}
