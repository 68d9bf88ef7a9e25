use log::{debug, warn};
use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{Metadata, RawResponse, ToolCall};

const TOOL_NAME: &str = "Metadata";

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<Value>,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize, Debug)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

/// Chat-completions client for any OpenAI-compatible endpoint.
#[derive(Clone, Debug)]
pub struct LlmClient {
    client: Client,
    url: String,
    api_key: Option<String>,
    model: String,
}

impl LlmClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = ClientBuilder::new().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            url: config.completions_url(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    /// Asks for schema-constrained output first and falls back to a plain
    /// request once. Errors from the plain request are returned as is.
    pub async fn invoke(&self, prompt: &str) -> Result<RawResponse> {
        match self.structured(prompt).await {
            Ok(metadata) => Ok(RawResponse::Structured(metadata)),
            Err(e) => {
                warn!("[WARN] Structured request failed, retrying without schema: {}", e);
                self.unstructured(prompt).await
            }
        }
    }

    async fn structured(&self, prompt: &str) -> Result<Metadata> {
        let message = self
            .send(self.request(prompt, Some(metadata_tool()), Some(forced_tool_choice())))
            .await?;

        let call = message
            .tool_calls
            .as_deref()
            .and_then(|calls| calls.first())
            .ok_or_else(|| AppError::LlmError("Structured response carried no tool call".to_string()))?;

        serde_json::from_str(&call.function.arguments)
            .map_err(|e| AppError::ParseError(format!("Tool call does not match schema: {}", e)))
    }

    async fn unstructured(&self, prompt: &str) -> Result<RawResponse> {
        let message = self.send(self.request(prompt, None, None)).await?;

        Ok(match message.tool_calls {
            Some(calls) if !calls.is_empty() => RawResponse::ToolCalls {
                calls,
                content: message.content,
            },
            _ => RawResponse::Text(message.content.unwrap_or_default()),
        })
    }

    fn request(&self, prompt: &str, tools: Option<Vec<Value>>, tool_choice: Option<Value>) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".into(),
                content: prompt.into(),
            }],
            tools,
            tool_choice,
        }
    }

    async fn send(&self, body: ChatRequest) -> Result<ResponseMessage> {
        let mut request = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        debug!("[DEBUG] POST {} (model {})", self.url, self.model);
        let res = request.send().await?;

        let status = res.status();
        if !status.is_success() {
            let error_text = res.text().await.unwrap_or_default();
            return Err(AppError::LlmError(format!("{}: {}", status, error_text)));
        }

        let json: ChatResponse = res.json().await?;
        json.choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| AppError::LlmError("Invalid response format from LLM".to_string()))
    }
}

fn metadata_tool() -> Vec<Value> {
    let string_list = json!({"type": "array", "items": {"type": "string"}});
    vec![json!({
        "type": "function",
        "function": {
            "name": TOOL_NAME,
            "description": "Metadata extracted from a markdown blog post",
            "parameters": {
                "type": "object",
                "properties": {
                    "tags": string_list,
                    "categories": string_list,
                    "links": string_list,
                },
                "required": ["tags", "categories", "links"],
            },
        },
    })]
}

fn forced_tool_choice() -> Value {
    json!({"type": "function", "function": {"name": TOOL_NAME}})
}
