use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The three-field extraction target.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Metadata {
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub links: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub arguments: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub function: FunctionCall,
}

/// Unprocessed output of a model invocation. The variant is decided once,
/// where the response comes off the wire.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum RawResponse {
    Structured(Metadata),
    ToolCalls {
        calls: Vec<ToolCall>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },
    Text(String),
}

impl RawResponse {
    /// Textual content, if the response carries any.
    pub fn text(&self) -> Option<&str> {
        match self {
            RawResponse::Structured(_) => None,
            RawResponse::ToolCalls { content, .. } => content.as_deref(),
            RawResponse::Text(text) => Some(text),
        }
    }
}

/// Post name to extracted metadata, rewritten in full on every run.
pub type Summary = BTreeMap<String, Metadata>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn metadata_requires_every_field() {
        let partial = json!({"tags": ["a"], "categories": []});
        assert!(serde_json::from_value::<Metadata>(partial).is_err());
    }

    #[test]
    fn raw_response_carries_discriminant() {
        let raw = RawResponse::Text("hello".into());
        let value = serde_json::to_value(&raw).unwrap();
        assert_eq!(value, json!({"kind": "text", "payload": "hello"}));

        let back: RawResponse = serde_json::from_value(value).unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn tool_call_content_is_exposed_as_text() {
        let raw = RawResponse::ToolCalls {
            calls: vec![],
            content: Some("**Tags**".into()),
        };
        assert_eq!(raw.text(), Some("**Tags**"));
        assert_eq!(RawResponse::Structured(Metadata::default()).text(), None);
    }
}
