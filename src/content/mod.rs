//! Article content blocks.
//!
//! A post's `content` column holds a JSON array of typed blocks. This module
//! defines the block model, the tolerant [`parse`] that turns stored text into
//! blocks, the inline splitter applied to running text, and the HTML renderer.
//!
//! ```text
//! stored text → parse → Vec<ContentBlock> → render_article → HTML
//! ```

mod inline;
mod parser;
mod render;

pub use inline::{split_inline, InlineSpan, SpanKind};
pub use parser::{encode, parse, EMPTY_CONTENT_MESSAGE, INVALID_FORMAT_MESSAGE, PARSE_ERROR_MESSAGE};
pub use render::{is_unsafe_url, render_article, render_block, RenderError};

use serde::Serialize;
use serde_json::Value;

/// One renderable unit of an article.
///
/// Serialises back to the stored wire form (`{"type": "...", ...}`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ContentBlock {
    Heading(HeadingBlock),
    Paragraph(TextBlock),
    Code(CodeBlock),
    Image(ImageBlock),
    List(ListBlock),
    Quote(QuoteBlock),
    Table(TableBlock),
    InlineCode(TextBlock),
    Link(LinkBlock),
    BlockLink(LinkBlock),
    /// A block whose `type` names no known variant; kept verbatim so the
    /// renderer can report it.
    #[serde(untagged)]
    Unknown(Value),
}

impl ContentBlock {
    pub fn paragraph(text: impl Into<String>) -> Self {
        ContentBlock::Paragraph(TextBlock { text: text.into() })
    }

    /// The wire name of this block's `type`.
    pub fn type_name(&self) -> &str {
        match self {
            ContentBlock::Heading(_) => "heading",
            ContentBlock::Paragraph(_) => "paragraph",
            ContentBlock::Code(_) => "code",
            ContentBlock::Image(_) => "image",
            ContentBlock::List(_) => "list",
            ContentBlock::Quote(_) => "quote",
            ContentBlock::Table(_) => "table",
            ContentBlock::InlineCode(_) => "inlineCode",
            ContentBlock::Link(_) => "link",
            ContentBlock::BlockLink(_) => "blockLink",
            ContentBlock::Unknown(raw) => raw
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadingBlock {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
}

impl HeadingBlock {
    pub const DEFAULT_LEVEL: u8 = 2;

    /// Level clamped to `1..=6`, defaulting to 2.
    pub fn effective_level(&self) -> u8 {
        self.level.unwrap_or(Self::DEFAULT_LEVEL).clamp(1, 6)
    }
}

/// Body of `paragraph` and `inlineCode` blocks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextBlock {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CodeBlock {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageBlock {
    pub src: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl ImageBlock {
    pub fn is_gif(&self) -> bool {
        self.src.to_ascii_lowercase().ends_with(".gif")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListStyle {
    Bullet,
    Number,
    Disc,
    Circle,
    Square,
    Decimal,
    LowerAlpha,
    UpperAlpha,
    LowerRoman,
    UpperRoman,
}

impl ListStyle {
    pub fn from_name(name: &str) -> Option<Self> {
        let style = match name {
            "bullet" => ListStyle::Bullet,
            "number" => ListStyle::Number,
            "disc" => ListStyle::Disc,
            "circle" => ListStyle::Circle,
            "square" => ListStyle::Square,
            "decimal" => ListStyle::Decimal,
            "lower-alpha" => ListStyle::LowerAlpha,
            "upper-alpha" => ListStyle::UpperAlpha,
            "lower-roman" => ListStyle::LowerRoman,
            "upper-roman" => ListStyle::UpperRoman,
            _ => return None,
        };
        Some(style)
    }

    pub fn is_ordered(self) -> bool {
        matches!(
            self,
            ListStyle::Number
                | ListStyle::Decimal
                | ListStyle::LowerAlpha
                | ListStyle::UpperAlpha
                | ListStyle::LowerRoman
                | ListStyle::UpperRoman
        )
    }

    /// CSS `list-style-type` value.
    pub fn css(self) -> &'static str {
        match self {
            ListStyle::Number | ListStyle::Decimal => "decimal",
            ListStyle::LowerAlpha => "lower-alpha",
            ListStyle::UpperAlpha => "upper-alpha",
            ListStyle::LowerRoman => "lower-roman",
            ListStyle::UpperRoman => "upper-roman",
            ListStyle::Circle => "circle",
            ListStyle::Square => "square",
            ListStyle::Bullet | ListStyle::Disc => "disc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListBlock {
    pub items: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ListStyle>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteBlock {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TableBlock {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LinkTarget {
    #[serde(rename = "_blank")]
    Blank,
    #[serde(rename = "_self")]
    SameTab,
}

impl LinkTarget {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "_blank" => Some(LinkTarget::Blank),
            "_self" => Some(LinkTarget::SameTab),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LinkTarget::Blank => "_blank",
            LinkTarget::SameTab => "_self",
        }
    }
}

/// Body of `link` and `blockLink` blocks.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkBlock {
    pub url: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<LinkTarget>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_external: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl LinkBlock {
    /// Explicit `isExternal`, otherwise true for absolute http(s) URLs.
    pub fn external(&self) -> bool {
        self.is_external.unwrap_or_else(|| {
            url::Url::parse(&self.url)
                .map(|u| matches!(u.scheme(), "http" | "https"))
                .unwrap_or(false)
        })
    }

    /// Explicit target, otherwise a new tab for external links.
    pub fn effective_target(&self) -> LinkTarget {
        self.target.unwrap_or(if self.external() {
            LinkTarget::Blank
        } else {
            LinkTarget::SameTab
        })
    }
}
