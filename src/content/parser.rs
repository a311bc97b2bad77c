use serde_json::{Map, Value};

use super::{
    CodeBlock, ContentBlock, HeadingBlock, ImageBlock, LinkBlock, LinkTarget, ListBlock,
    ListStyle, QuoteBlock, TableBlock, TextBlock,
};

pub const EMPTY_CONTENT_MESSAGE: &str = "No content available for this post.";
pub const PARSE_ERROR_MESSAGE: &str =
    "There was an error reading this post's content. Please try again later.";
pub const INVALID_FORMAT_MESSAGE: &str = "This post's content is in an invalid format.";

/// Characters of the raw input included in decode-failure logs.
const PREVIEW_CHARS: usize = 100;
/// Characters on each side of the failure position included in logs.
const CONTEXT_CHARS: usize = 40;

/// Parse stored article text into blocks.
///
/// Never fails: malformed input produces a single explanatory paragraph, and
/// each malformed element of an otherwise valid array is replaced in place, so
/// the output has exactly one block per input element.
pub fn parse(raw: &str) -> Vec<ContentBlock> {
    if raw.trim().is_empty() {
        return vec![ContentBlock::paragraph(EMPTY_CONTENT_MESSAGE)];
    }

    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            let context = error_context(raw, e.line(), e.column());
            tracing::error!(
                error = %e,
                input_len = raw.len(),
                preview = %preview(raw, PREVIEW_CHARS),
                context = %context,
                "Failed to decode post content"
            );
            return vec![ContentBlock::paragraph(PARSE_ERROR_MESSAGE)];
        }
    };

    let elements = match value {
        Value::Array(elements) => elements,
        other => {
            tracing::warn!(
                kind = json_kind(&other),
                "Post content is not an array of blocks"
            );
            return vec![ContentBlock::paragraph(INVALID_FORMAT_MESSAGE)];
        }
    };

    if elements.is_empty() {
        return vec![ContentBlock::paragraph(EMPTY_CONTENT_MESSAGE)];
    }

    elements
        .into_iter()
        .enumerate()
        .map(|(index, element)| parse_block(index, element))
        .collect()
}

/// Encode blocks into the stored text form.
pub fn encode(blocks: &[ContentBlock]) -> String {
    // Every block serialises to plain JSON; failure is impossible for these types.
    serde_json::to_string(blocks).unwrap_or_else(|_| "[]".to_string())
}

fn parse_block(index: usize, element: Value) -> ContentBlock {
    let obj = match element {
        Value::Object(obj) => obj,
        other => {
            tracing::warn!(index, kind = json_kind(&other), "Content block is not an object");
            return placeholder(index, "it is not an object");
        }
    };

    let block_type = match obj.get("type") {
        Some(Value::String(t)) if !t.is_empty() => t.clone(),
        Some(Value::String(_)) | None => {
            tracing::warn!(index, "Content block has no type");
            return placeholder(index, "it has no type");
        }
        Some(other) => {
            tracing::warn!(index, kind = json_kind(other), "Content block type is not a string");
            return placeholder(index, "its type is not a string");
        }
    };

    let fields = Fields {
        index,
        block_type: &block_type,
        obj: &obj,
    };

    match block_type.as_str() {
        "heading" => ContentBlock::Heading(HeadingBlock {
            text: fields.text("text"),
            level: fields.level(),
        }),
        "paragraph" => ContentBlock::Paragraph(TextBlock {
            text: fields.text("text"),
        }),
        "inlineCode" => ContentBlock::InlineCode(TextBlock {
            text: fields.text("text"),
        }),
        "code" => ContentBlock::Code(CodeBlock {
            code: fields.opt_text("code"),
            language: fields.opt_text("language"),
        }),
        "image" => ContentBlock::Image(ImageBlock {
            src: fields.text("src"),
            alt: fields.opt_text("alt"),
            caption: fields.opt_text("caption"),
        }),
        "list" => ContentBlock::List(ListBlock {
            items: fields.string_list("items").unwrap_or_default(),
            style: fields.list_style(),
        }),
        "quote" => ContentBlock::Quote(QuoteBlock {
            text: fields.text("text"),
            author: fields.opt_text("author"),
        }),
        "table" => ContentBlock::Table(TableBlock {
            headers: fields.string_list("headers"),
            rows: fields.rows(),
            caption: fields.opt_text("caption"),
        }),
        "link" => ContentBlock::Link(fields.link()),
        "blockLink" => ContentBlock::BlockLink(fields.link()),
        _ => {
            tracing::warn!(index, block_type = %block_type, "Unknown content block type");
            ContentBlock::Unknown(Value::Object(obj))
        }
    }
}

fn placeholder(index: usize, reason: &str) -> ContentBlock {
    ContentBlock::paragraph(format!(
        "Content block {} could not be displayed because {}.",
        index + 1,
        reason
    ))
}

/// Field accessors for one block that coerce wrong shapes instead of failing.
struct Fields<'a> {
    index: usize,
    block_type: &'a str,
    obj: &'a Map<String, Value>,
}

impl Fields<'_> {
    /// Required text: anything other than a string is coerced.
    fn text(&self, key: &str) -> String {
        match self.obj.get(key) {
            Some(Value::String(s)) => s.clone(),
            other => {
                let coerced = other.map(coerce_scalar).unwrap_or_default();
                self.warn(key, other, "string");
                coerced
            }
        }
    }

    /// Optional text: absent or null stays `None`, other shapes are coerced.
    fn opt_text(&self, key: &str) -> Option<String> {
        match self.obj.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                self.warn(key, Some(other), "string");
                Some(coerce_scalar(other))
            }
        }
    }

    /// A list of strings; a lone scalar becomes a one-element list.
    fn string_list(&self, key: &str) -> Option<Vec<String>> {
        match self.obj.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::Array(values)) => Some(
                values
                    .iter()
                    .map(|v| match v {
                        Value::String(s) => s.clone(),
                        other => {
                            self.warn(key, Some(other), "string element");
                            coerce_scalar(other)
                        }
                    })
                    .collect(),
            ),
            Some(other) => {
                self.warn(key, Some(other), "array");
                match other {
                    Value::Object(_) => Some(Vec::new()),
                    scalar => Some(vec![coerce_scalar(scalar)]),
                }
            }
        }
    }

    fn rows(&self) -> Option<Vec<Vec<String>>> {
        match self.obj.get("rows") {
            None | Some(Value::Null) => None,
            Some(Value::Array(rows)) => Some(
                rows.iter()
                    .map(|row| match row {
                        Value::Array(cells) => cells.iter().map(coerce_scalar).collect(),
                        other => {
                            self.warn("rows", Some(other), "array row");
                            match other {
                                Value::Object(_) => Vec::new(),
                                scalar => vec![coerce_scalar(scalar)],
                            }
                        }
                    })
                    .collect(),
            ),
            Some(other) => {
                self.warn("rows", Some(other), "array");
                Some(Vec::new())
            }
        }
    }

    fn level(&self) -> Option<u8> {
        let raw = self.obj.get("level");
        let level = match raw {
            None | Some(Value::Null) => return None,
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
            Some(_) => None,
        };
        match level {
            Some(level @ 1..=6) => Some(level as u8),
            _ => {
                self.warn("level", raw, "integer 1-6");
                None
            }
        }
    }

    fn list_style(&self) -> Option<ListStyle> {
        let name = self.opt_text("style")?;
        let style = ListStyle::from_name(&name);
        if style.is_none() {
            tracing::warn!(
                index = self.index,
                style = %name,
                "Unknown list style, using bullets"
            );
        }
        style
    }

    fn link(&self) -> LinkBlock {
        let target = self.opt_text("target").and_then(|name| {
            let target = LinkTarget::from_name(&name);
            if target.is_none() {
                tracing::warn!(index = self.index, target = %name, "Unknown link target");
            }
            target
        });

        let is_external = match self.obj.get("isExternal") {
            None | Some(Value::Null) => None,
            Some(Value::Bool(b)) => Some(*b),
            Some(other) => {
                self.warn("isExternal", Some(other), "boolean");
                None
            }
        };

        LinkBlock {
            url: self.text("url"),
            text: self.text("text"),
            target,
            is_external,
            description: self.opt_text("description"),
        }
    }

    fn warn(&self, field: &str, found: Option<&Value>, expected: &str) {
        tracing::warn!(
            index = self.index,
            block_type = %self.block_type,
            field,
            expected,
            found = found.map(json_kind).unwrap_or("missing"),
            "Coerced malformed content block field"
        );
    }
}

fn coerce_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
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

fn preview(raw: &str, max_chars: usize) -> String {
    raw.chars().take(max_chars).collect()
}

/// Text surrounding a 1-based line/column position reported by the decoder.
fn error_context(raw: &str, line: usize, column: usize) -> String {
    if line == 0 {
        return String::new();
    }

    let line_start: usize = raw
        .split_inclusive('\n')
        .take(line - 1)
        .map(str::len)
        .sum();
    // Columns are byte counts
    let mut offset = (line_start + column.saturating_sub(1)).min(raw.len());
    while !raw.is_char_boundary(offset) {
        offset -= 1;
    }

    let before: String = raw[..offset]
        .chars()
        .rev()
        .take(CONTEXT_CHARS)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    let after: String = raw[offset..].chars().take(CONTEXT_CHARS).collect();
    format!("{before}{after}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_blocks() -> Vec<ContentBlock> {
        vec![
            ContentBlock::Heading(HeadingBlock {
                text: "Intro".into(),
                level: Some(1),
            }),
            ContentBlock::paragraph("Use `cargo` and *enjoy*."),
            ContentBlock::Code(CodeBlock {
                code: Some("fn main() {}".into()),
                language: Some("rust".into()),
            }),
            ContentBlock::Image(ImageBlock {
                src: "https://cdn.example.com/a.png".into(),
                alt: Some("diagram".into()),
                caption: None,
            }),
            ContentBlock::List(ListBlock {
                items: vec!["one".into(), "two".into()],
                style: Some(ListStyle::Number),
            }),
            ContentBlock::Quote(QuoteBlock {
                text: "Stay curious".into(),
                author: Some("Someone".into()),
            }),
            ContentBlock::Table(TableBlock {
                headers: Some(vec!["a".into(), "b".into()]),
                rows: Some(vec![vec!["1".into(), "2".into()]]),
                caption: Some("numbers".into()),
            }),
            ContentBlock::InlineCode(TextBlock { text: "x = 1".into() }),
            ContentBlock::Link(LinkBlock {
                url: "https://example.com".into(),
                text: "Example".into(),
                target: Some(LinkTarget::Blank),
                is_external: Some(true),
                description: None,
            }),
            ContentBlock::BlockLink(LinkBlock {
                url: "/blogs/next".into(),
                text: "Next".into(),
                target: None,
                is_external: None,
                description: Some("The follow-up".into()),
            }),
        ]
    }

    #[test]
    fn test_round_trip_valid_blocks() {
        let blocks = sample_blocks();
        assert_eq!(parse(&encode(&blocks)), blocks);
    }

    #[test]
    fn test_empty_input() {
        for raw in ["", "   ", "\n\t"] {
            assert_eq!(parse(raw), vec![ContentBlock::paragraph(EMPTY_CONTENT_MESSAGE)]);
        }
    }

    #[test]
    fn test_empty_array() {
        assert_eq!(parse("[]"), vec![ContentBlock::paragraph(EMPTY_CONTENT_MESSAGE)]);
    }

    #[test]
    fn test_truncated_input() {
        let blocks = parse(r#"[{"type": "paragraph", "text": "hel"#);
        assert_eq!(blocks, vec![ContentBlock::paragraph(PARSE_ERROR_MESSAGE)]);
    }

    #[test]
    fn test_non_array_input() {
        for raw in [r#"{"type": "paragraph"}"#, "42", "\"text\"", "null"] {
            assert_eq!(parse(raw), vec![ContentBlock::paragraph(INVALID_FORMAT_MESSAGE)]);
        }
    }

    #[test]
    fn test_bad_block_replaced_in_place() {
        let raw = json!([
            {"type": "paragraph", "text": "first"},
            {"text": "no type"},
            {"type": "paragraph", "text": "third"},
        ])
        .to_string();

        let blocks = parse(&raw);
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0], ContentBlock::paragraph("first"));
        assert_eq!(blocks[2], ContentBlock::paragraph("third"));
        match &blocks[1] {
            ContentBlock::Paragraph(p) => assert!(p.text.contains("Content block 2")),
            other => panic!("expected fallback paragraph, got {other:?}"),
        }
    }

    #[test]
    fn test_non_object_and_non_string_type() {
        let raw = json!(["loose text", {"type": 7}, {"type": ""}]).to_string();
        let blocks = parse(&raw);
        assert_eq!(blocks.len(), 3);
        assert!(blocks
            .iter()
            .all(|b| matches!(b, ContentBlock::Paragraph(_))));
    }

    #[test]
    fn test_unknown_type_kept_for_renderer() {
        let raw = json!([{"type": "video", "src": "clip.mp4"}]).to_string();
        let blocks = parse(&raw);
        assert_eq!(
            blocks,
            vec![ContentBlock::Unknown(json!({"type": "video", "src": "clip.mp4"}))]
        );
    }

    #[test]
    fn test_text_field_coerced() {
        let raw = json!([
            {"type": "paragraph", "text": 42},
            {"type": "heading"},
            {"type": "quote", "text": true, "author": 3},
        ])
        .to_string();
        let blocks = parse(&raw);
        assert_eq!(blocks[0], ContentBlock::paragraph("42"));
        assert_eq!(
            blocks[1],
            ContentBlock::Heading(HeadingBlock {
                text: String::new(),
                level: None
            })
        );
        assert_eq!(
            blocks[2],
            ContentBlock::Quote(QuoteBlock {
                text: "true".into(),
                author: Some("3".into())
            })
        );
    }

    #[test]
    fn test_array_fields_coerced() {
        let raw = json!([
            {"type": "list", "items": "only one"},
            {"type": "list", "items": {"a": 1}},
            {"type": "list"},
            {"type": "table", "headers": "h", "rows": "bad"},
            {"type": "table", "rows": [["a", 1], "b"]},
        ])
        .to_string();
        let blocks = parse(&raw);

        assert_eq!(
            blocks[0],
            ContentBlock::List(ListBlock {
                items: vec!["only one".into()],
                style: None
            })
        );
        assert_eq!(
            blocks[1],
            ContentBlock::List(ListBlock {
                items: vec![],
                style: None
            })
        );
        assert_eq!(
            blocks[2],
            ContentBlock::List(ListBlock {
                items: vec![],
                style: None
            })
        );
        assert_eq!(
            blocks[3],
            ContentBlock::Table(TableBlock {
                headers: Some(vec!["h".into()]),
                rows: Some(vec![]),
                caption: None
            })
        );
        assert_eq!(
            blocks[4],
            ContentBlock::Table(TableBlock {
                headers: None,
                rows: Some(vec![vec!["a".into(), "1".into()], vec!["b".into()]]),
                caption: None
            })
        );
    }

    #[test]
    fn test_heading_level_tolerance() {
        let raw = json!([
            {"type": "heading", "text": "a", "level": "3"},
            {"type": "heading", "text": "b", "level": 12},
            {"type": "heading", "text": "c", "level": "big"},
            {"type": "heading", "text": "d", "level": 0},
        ])
        .to_string();
        let blocks = parse(&raw);
        let levels: Vec<Option<u8>> = blocks
            .iter()
            .map(|b| match b {
                ContentBlock::Heading(h) => h.level,
                _ => panic!("expected heading"),
            })
            .collect();
        assert_eq!(levels, vec![Some(3), None, None, None]);
    }

    #[test]
    fn test_unknown_list_style_dropped() {
        let raw = json!([{"type": "list", "items": ["a"], "style": "zigzag"}]).to_string();
        assert_eq!(
            parse(&raw),
            vec![ContentBlock::List(ListBlock {
                items: vec!["a".into()],
                style: None
            })]
        );
    }

    #[test]
    fn test_error_context_around_position() {
        let raw = "[\n  {\"type\": oops}\n]";
        let err = serde_json::from_str::<Value>(raw).unwrap_err();
        let context = error_context(raw, err.line(), err.column());
        assert!(context.contains("oops"));
    }

    #[test]
    fn test_error_context_with_multibyte_text_before_error() {
        let raw = format!("[\"{}\", oops, \"{}\"]", "é".repeat(60), "x".repeat(100));
        let err = serde_json::from_str::<Value>(&raw).unwrap_err();
        let context = error_context(&raw, err.line(), err.column());
        assert!(context.contains("oops"), "context was {context:?}");
    }

    #[test]
    fn test_error_context_column_inside_multibyte_char() {
        let raw = "[\"日本\"]";
        // Byte column 3 falls inside the first character
        let context = error_context(raw, 1, 4);
        assert!(context.contains('日'));
    }

    #[test]
    fn test_preview_is_bounded() {
        let raw = "x".repeat(500);
        assert_eq!(preview(&raw, PREVIEW_CHARS).len(), 100);
    }
}
