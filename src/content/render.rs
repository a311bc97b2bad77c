use std::fmt::Write as _;

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use thiserror::Error;

use super::{
    split_inline, CodeBlock, ContentBlock, HeadingBlock, ImageBlock, LinkBlock, LinkTarget,
    ListBlock, ListStyle, QuoteBlock, SpanKind, TableBlock,
};

/// Schemes that execute script or embed content instead of navigating.
const UNSAFE_SCHEMES: &[&str] = &["javascript:", "data:", "vbscript:"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("unsupported block type `{0}`")]
    UnknownType(String),

    #[error("required field `{0}` is empty")]
    MissingField(&'static str),

    #[error("link uses a blocked URL scheme")]
    UnsafeLink,
}

/// True when `url` starts with a script-execution or data scheme.
///
/// Whitespace and control characters are ignored and case is folded, since
/// browsers do the same when resolving the scheme.
pub fn is_unsafe_url(url: &str) -> bool {
    let normalized: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    UNSAFE_SCHEMES
        .iter()
        .any(|scheme| normalized.starts_with(scheme))
}

/// Render every block; a failing block becomes an inline marker and the
/// remaining blocks still render.
pub fn render_article(blocks: &[ContentBlock]) -> String {
    let mut html = String::from("<article class=\"post-content\">\n");

    for (index, block) in blocks.iter().enumerate() {
        match render_block(block) {
            Ok(fragment) => html.push_str(&fragment),
            Err(e) => {
                let raw = serde_json::to_string(block).unwrap_or_default();
                tracing::error!(
                    index,
                    block_type = %block.type_name(),
                    block = %raw,
                    error = %e,
                    "Failed to render content block"
                );
                html.push_str(&error_marker(index, block.type_name(), &e));
            }
        }
        html.push('\n');
    }

    html.push_str("</article>");
    html
}

/// Render a single block to an HTML fragment.
pub fn render_block(block: &ContentBlock) -> Result<String, RenderError> {
    match block {
        ContentBlock::Heading(h) => Ok(heading(h)),
        ContentBlock::Paragraph(p) => Ok(format!("<p>{}</p>", inline(&p.text))),
        ContentBlock::Code(c) => Ok(code(c)),
        ContentBlock::Image(i) => image(i),
        ContentBlock::List(l) => Ok(list(l)),
        ContentBlock::Quote(q) => Ok(quote(q)),
        ContentBlock::Table(t) => Ok(table(t)),
        ContentBlock::InlineCode(c) => Ok(format!("<code>{}</code>", text(&c.text))),
        ContentBlock::Link(l) => link(l, false),
        ContentBlock::BlockLink(l) => link(l, true),
        ContentBlock::Unknown(_) => Err(RenderError::UnknownType(block.type_name().to_string())),
    }
}

fn error_marker(index: usize, block_type: &str, error: &RenderError) -> String {
    match error {
        RenderError::UnsafeLink => format!(
            "<div class=\"content-error security-error\" data-block-index=\"{index}\">Link blocked for security reasons.</div>"
        ),
        other => format!(
            "<div class=\"content-error\" data-block-index=\"{index}\" data-block-type=\"{}\">Unable to display block {}: {}</div>",
            attr(block_type),
            index + 1,
            text(&other.to_string())
        ),
    }
}

fn inline(content: &str) -> String {
    let mut html = String::new();
    for span in split_inline(content) {
        match span.kind {
            SpanKind::Text => html.push_str(&text(&span.text)),
            SpanKind::Code => {
                let _ = write!(html, "<code>{}</code>", text(&span.text));
            }
            SpanKind::Bold => {
                let _ = write!(html, "<strong>{}</strong>", text(&span.text));
            }
        }
    }
    html
}

fn heading(h: &HeadingBlock) -> String {
    let level = h.effective_level();
    format!("<h{level}>{}</h{level}>", text(&h.text))
}

fn code(c: &CodeBlock) -> String {
    let language = c.language.as_deref().filter(|l| !l.is_empty()).unwrap_or("text");
    format!(
        "<pre><code class=\"language-{}\">{}</code></pre>",
        attr(language),
        text(c.code.as_deref().unwrap_or(""))
    )
}

fn image(i: &ImageBlock) -> Result<String, RenderError> {
    if i.src.trim().is_empty() {
        return Err(RenderError::MissingField("src"));
    }
    if is_unsafe_url(&i.src) && !i.src.trim_start().to_ascii_lowercase().starts_with("data:image/") {
        return Err(RenderError::UnsafeLink);
    }

    let mut html = String::from("<figure class=\"post-image\">");
    let _ = write!(
        html,
        "<img src=\"{}\" alt=\"{}\" loading=\"lazy\">",
        attr(&i.src),
        attr(i.alt.as_deref().unwrap_or(""))
    );
    if i.is_gif() {
        html.push_str("<span class=\"gif-badge\">GIF</span>");
    }
    if let Some(caption) = &i.caption {
        let _ = write!(html, "<figcaption>{}</figcaption>", text(caption));
    }
    html.push_str("</figure>");
    Ok(html)
}

fn list(l: &ListBlock) -> String {
    let style = l.style.unwrap_or(ListStyle::Bullet);
    let tag = if style.is_ordered() { "ol" } else { "ul" };

    let mut html = format!("<{tag} style=\"list-style-type: {}\">", style.css());
    for item in &l.items {
        let _ = write!(html, "<li>{}</li>", inline(item));
    }
    let _ = write!(html, "</{tag}>");
    html
}

fn quote(q: &QuoteBlock) -> String {
    let mut html = format!("<blockquote><p>\u{201c}{}\u{201d}</p>", text(&q.text));
    if let Some(author) = &q.author {
        let _ = write!(html, "<cite>\u{2014} {}</cite>", text(author));
    }
    html.push_str("</blockquote>");
    html
}

fn table(t: &TableBlock) -> String {
    let mut html = String::from("<div class=\"post-table\"><table>");

    if let Some(headers) = t.headers.as_ref().filter(|h| !h.is_empty()) {
        html.push_str("<thead><tr>");
        for header in headers {
            let _ = write!(html, "<th>{}</th>", text(header));
        }
        html.push_str("</tr></thead>");
    }

    html.push_str("<tbody>");
    for row in t.rows.iter().flatten() {
        html.push_str("<tr>");
        for cell in row {
            let _ = write!(html, "<td>{}</td>", text(cell));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");

    if let Some(caption) = &t.caption {
        let _ = write!(html, "<p class=\"table-caption\">{}</p>", text(caption));
    }
    html.push_str("</div>");
    html
}

fn link(l: &LinkBlock, block: bool) -> Result<String, RenderError> {
    if is_unsafe_url(&l.url) {
        return Err(RenderError::UnsafeLink);
    }
    if l.url.trim().is_empty() {
        return Err(RenderError::MissingField("url"));
    }

    let target = l.effective_target();
    let rel = match target {
        LinkTarget::Blank => " rel=\"noopener noreferrer\"",
        LinkTarget::SameTab => "",
    };
    let label = if l.text.is_empty() { &l.url } else { &l.text };

    if !block {
        return Ok(format!(
            "<a href=\"{}\" target=\"{}\"{rel}>{}</a>",
            attr(&l.url),
            target.as_str(),
            text(label)
        ));
    }

    let mut html = format!(
        "<a class=\"block-link\" href=\"{}\" target=\"{}\"{rel}><span class=\"block-link-title\">{}</span>",
        attr(&l.url),
        target.as_str(),
        text(label)
    );
    if let Some(description) = &l.description {
        let _ = write!(
            html,
            "<span class=\"block-link-description\">{}</span>",
            text(description)
        );
    }
    if l.external() {
        html.push_str("<span class=\"block-link-external\">\u{2197}</span>");
    }
    html.push_str("</a>");
    Ok(html)
}
