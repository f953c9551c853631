//! Structured-update extraction from assistant replies.
//!
//! The model is asked to embed document changes in a fenced block tagged with a
//! fixed label:
//!
//! ~~~text
//! Here is a first pass at the title.
//! ```prd-update
//! {"title": "Todo App"}
//! ```
//! ~~~
//!
//! Extraction runs in two phases. [`UpdateExtractor::locate`] finds complete
//! fenced blocks by their delimiters; the first block's interior is then parsed
//! as a flat JSON object. A malformed block never fails the conversation: it is
//! logged, yields no patch, and is still stripped from the display text.

use std::ops::Range;

use serde_json::Value;
use shared_types::Patch;

pub const DEFAULT_UPDATE_LABEL: &str = "prd-update";

const FENCE: &str = "```";

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("update block is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("update block must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Outcome of scanning one assistant reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Reply text to show the user.
    pub display_text: String,
    pub patch: Option<Patch>,
}

/// Byte offsets of one complete fenced block within a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FencedBlock {
    /// From the opening fence through the closing fence.
    span: Range<usize>,
    body: Range<usize>,
}

#[derive(Debug, Clone)]
pub struct UpdateExtractor {
    opening: String,
}

impl Default for UpdateExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_UPDATE_LABEL)
    }
}

impl UpdateExtractor {
    pub fn new(label: impl AsRef<str>) -> Self {
        Self {
            opening: format!("{FENCE}{}", label.as_ref().trim()),
        }
    }

    pub fn label(&self) -> &str {
        &self.opening[FENCE.len()..]
    }

    pub fn extract(&self, reply: &str) -> Extraction {
        let blocks = self.locate(reply);
        let Some(first) = blocks.first() else {
            return Extraction {
                display_text: reply.to_string(),
                patch: None,
            };
        };

        if blocks.len() > 1 {
            tracing::debug!(
                label = self.label(),
                blocks = blocks.len(),
                "Reply carries more than one update block; only the first is applied"
            );
        }

        let patch = match parse_body(&reply[first.body.clone()]) {
            Ok(patch) => Some(patch),
            Err(e) => {
                tracing::warn!(label = self.label(), error = %e, "Failed to parse update block");
                None
            }
        };

        Extraction {
            display_text: strip_blocks(reply, &blocks).trim().to_string(),
            patch,
        }
    }

    /// Phase one: find every complete block, in order.
    ///
    /// The opening fence must be followed only by whitespace up to the end of
    /// its line; the block closes at the next line that starts with a fence.
    /// An unterminated block ends the scan.
    fn locate(&self, text: &str) -> Vec<FencedBlock> {
        let mut blocks = Vec::new();
        let mut cursor = 0;

        while let Some(found) = text[cursor..].find(&self.opening) {
            let start = cursor + found;
            let after_tag = start + self.opening.len();

            let Some(newline) = text[after_tag..].find('\n') else {
                break;
            };
            let line_end = after_tag + newline;
            if !text[after_tag..line_end].trim().is_empty() {
                // A longer label such as `prd-updates`; keep looking.
                cursor = after_tag;
                continue;
            }

            let body_start = line_end + 1;
            let rest = &text[body_start..];
            let (body_end, end) = if rest.starts_with(FENCE) {
                (body_start, body_start + FENCE.len())
            } else {
                match rest.find(&format!("\n{FENCE}")) {
                    Some(offset) => {
                        let body_end = body_start + offset;
                        (body_end, body_end + 1 + FENCE.len())
                    }
                    None => break,
                }
            };

            blocks.push(FencedBlock {
                span: start..end,
                body: body_start..body_end,
            });
            cursor = end;
        }

        blocks
    }
}

/// Phase two: the block interior as a patch.
fn parse_body(body: &str) -> Result<Patch, ExtractError> {
    let value: Value = serde_json::from_str(body.trim())?;
    let Value::Object(map) = value else {
        return Err(ExtractError::NotAnObject(json_kind(&value)));
    };
    Ok(map
        .into_iter()
        .map(|(key, value)| (key, value_to_text(value)))
        .collect())
}

fn value_to_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn strip_blocks(text: &str, blocks: &[FencedBlock]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for block in blocks {
        out.push_str(&text[cursor..block.span.start]);
        cursor = block.span.end;
    }
    out.push_str(&text[cursor..]);
    out
}
