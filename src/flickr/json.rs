//! JSON decoding helpers for Flickr responses.
//!
//! Flickr is loose with types: counts arrive as numbers or strings, flags as
//! `0`/`1`, and text fields either bare or wrapped in `{"_content": ...}`. The
//! deserializers here absorb that so the wire structs can stay plain.

use anyhow::Result;
use serde::{Deserialize, Deserializer};

/// Parse a response body; on failure the error names the serde path and shows
/// a snippet of the offending line.
pub fn parse_json_with_context<T: serde::de::DeserializeOwned>(body: &str) -> Result<T> {
    let jd = &mut serde_json::Deserializer::from_str(body);
    serde_path_to_error::deserialize(jd).map_err(|err| {
        let inner = err.inner();
        let (line, column) = (inner.line(), inner.column());
        let path = err.path().to_string();

        let msg = inner.to_string();
        let loc = format!(" at line {line} column {column}");
        let msg = msg.strip_suffix(&loc).unwrap_or(&msg);

        let mut out = String::new();
        if !path.is_empty() && path != "." {
            out.push_str(&format!("at path '{path}': "));
        }
        out.push_str(&format!(
            "{} (line {line} col {column})\n{}",
            describe_mismatch(msg),
            snippet(body, line, column, 20)
        ));
        anyhow::anyhow!(out)
    })
}

/// Turn "invalid type: null, expected a string" into "expected a string, got null".
fn describe_mismatch(msg: &str) -> String {
    if let Some(rest) = msg.strip_prefix("invalid type: ")
        && let Some((actual, expected)) = rest.split_once(", expected ")
    {
        return format!("expected {expected}, got {actual}");
    }
    msg.to_string()
}

fn snippet(body: &str, line: usize, column: usize, width: usize) -> String {
    let text = body.lines().nth(line.saturating_sub(1)).unwrap_or("");
    if text.is_empty() {
        return "(empty line)".to_string();
    }
    let at = column.saturating_sub(1).min(text.len());
    let start = floor_char_boundary(text, at.saturating_sub(width / 2));
    let end = floor_char_boundary(text, (at + width / 2).min(text.len()));
    let marker = " ".repeat(at - start) + "^";
    format!("...{}...\n   {marker}", &text[start..end])
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    String(String),
}

/// Accept `12`, `"12"` or `""` (as zero).
pub fn u32_from_any<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => u32::try_from(n).map_err(serde::de::Error::custom),
        NumberOrString::String(s) if s.trim().is_empty() => Ok(0),
        NumberOrString::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Accept `"72157"` or `72157` as an identifier string.
pub fn string_from_any<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => n.to_string(),
        NumberOrString::String(s) => s,
    })
}

/// Accept `1`/`0`, `"1"`/`"0"` or a JSON boolean.
pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Other(NumberOrString),
    }
    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Other(NumberOrString::Number(n)) => n != 0,
        Flag::Other(NumberOrString::String(s)) => s.trim() == "1",
    })
}

/// A text field that may be bare or wrapped as `{"_content": "..."}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Text {
    Plain(String),
    Wrapped {
        #[serde(rename = "_content", default)]
        content: String,
    },
}

impl Default for Text {
    fn default() -> Self {
        Text::Plain(String::new())
    }
}

impl From<Text> for String {
    fn from(text: Text) -> Self {
        match text {
            Text::Plain(s) | Text::Wrapped { content: s } => s,
        }
    }
}
