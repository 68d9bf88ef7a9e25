//! Coerces a model response of unknown shape into [`Metadata`].
//!
//! The strategies run from most to least structured and the first one that
//! yields a complete three-field value wins. Every strategy is a pure
//! function over the raw response, so each can be exercised on its own.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::models::{Metadata, RawResponse};

type Strategy = fn(&RawResponse) -> Option<Metadata>;

/// Cascade order. Do not reorder without updating the tests.
pub const STRATEGIES: &[(&str, Strategy)] = &[
    ("structured", from_structured),
    ("tool_calls", from_tool_calls),
    ("fenced_block", from_fenced_block),
    ("labeled_blocks", from_labeled_blocks),
    ("bare_json", from_bare_json),
    ("loose_sections", from_loose_sections),
];

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?i:json)?[ \t]*\r?\n?(.*?)```").expect("valid fenced block regex")
});

static LABELED_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\*\*(Tags|Categories|Links):?\*\*:?").expect("valid header regex")
});

static BOLD_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*[^*\n]+?\*\*").expect("valid bold regex"));

static QUOTED_BULLET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)(?:^|\s)[*+-]\s*"([^"\n]*)""#).expect("valid bullet regex")
});

static LOOSE_HEADERS: Lazy<[Regex; 3]> = Lazy::new(|| {
    ["tags", "categories", "links"].map(|field| {
        Regex::new(&format!(r"(?i)\*\*\s*{}\s*:?\s*\*\*:?", field)).expect("valid loose header regex")
    })
});

/// Runs the cascade. `None` means no strategy produced a complete result.
pub fn normalize(raw: &RawResponse) -> Option<Metadata> {
    STRATEGIES.iter().find_map(|(name, strategy)| {
        let metadata = strategy(raw)?;
        debug!("Response normalized by the {} strategy", name);
        Some(metadata)
    })
}

pub fn from_structured(raw: &RawResponse) -> Option<Metadata> {
    match raw {
        RawResponse::Structured(metadata) => Some(metadata.clone()),
        _ => None,
    }
}

pub fn from_tool_calls(raw: &RawResponse) -> Option<Metadata> {
    let RawResponse::ToolCalls { calls, .. } = raw else {
        return None;
    };

    calls.iter().find_map(|call| {
        let args: Value = match serde_json::from_str(&call.function.arguments) {
            Ok(args) => args,
            Err(e) => {
                debug!("Skipping tool call with unparseable arguments: {}", e);
                return None;
            }
        };
        serde_json::from_value(unwrap_arguments(args)).ok()
    })
}

/// Models sometimes wrap the payload; peel `function.parameters`, `data` or
/// `value`, in that order.
fn unwrap_arguments(args: Value) -> Value {
    if let Some(parameters) = args.pointer("/function/parameters") {
        return parameters.clone();
    }
    if let Some(data) = args.get("data") {
        return data.clone();
    }
    if let Some(value) = args.get("value") {
        return value.clone();
    }
    args
}

pub fn from_fenced_block(raw: &RawResponse) -> Option<Metadata> {
    let text = raw.text()?;
    let block = FENCED_BLOCK.captures(text)?.get(1)?.as_str();
    serde_json::from_str(block.trim()).ok()
}

pub fn from_labeled_blocks(raw: &RawResponse) -> Option<Metadata> {
    let text = raw.text()?;
    let headers: Vec<_> = LABELED_HEADER.captures_iter(text).collect();

    let (mut tags, mut categories, mut links) = (None, None, None);
    for (i, caps) in headers.iter().enumerate() {
        let (Some(whole), Some(label)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let end = headers
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(text.len(), |m| m.start());
        let slot = match label.as_str() {
            "Tags" => &mut tags,
            "Categories" => &mut categories,
            _ => &mut links,
        };
        if slot.is_none() {
            *slot = labeled_section(&text[whole.end()..end]);
        }
    }

    Some(Metadata {
        tags: tags?,
        categories: categories?,
        links: links?,
    })
}

fn labeled_section(body: &str) -> Option<Vec<String>> {
    if let Some(block) = FENCED_BLOCK.captures(body).and_then(|c| c.get(1)) {
        return serde_json::from_str(block.as_str().trim()).ok();
    }
    if says_none_provided(body) {
        return Some(Vec::new());
    }
    Some(quoted_bullets(body))
}

pub fn from_bare_json(raw: &RawResponse) -> Option<Metadata> {
    let text = raw.text()?;
    let start = text.find('{')?;
    serde_json::Deserializer::from_str(&text[start..])
        .into_iter::<Metadata>()
        .next()?
        .ok()
}

pub fn from_loose_sections(raw: &RawResponse) -> Option<Metadata> {
    let text = raw.text()?;
    let [tags, categories, links] = &*LOOSE_HEADERS;

    Some(Metadata {
        tags: loose_section(text, tags)?,
        categories: loose_section(text, categories)?,
        links: loose_section(text, links)?,
    })
}

fn loose_section(text: &str, header: &Regex) -> Option<Vec<String>> {
    let start = header.find(text)?.end();
    let rest = &text[start..];
    let body = BOLD_TEXT.find(rest).map_or(rest, |next| &rest[..next.start()]);

    let items = quoted_bullets(body);
    if !items.is_empty() {
        Some(items)
    } else if says_none_provided(body) {
        Some(Vec::new())
    } else {
        None
    }
}

fn quoted_bullets(body: &str) -> Vec<String> {
    QUOTED_BULLET
        .captures_iter(body)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

fn says_none_provided(body: &str) -> bool {
    body.to_lowercase().contains("none provided")
}
