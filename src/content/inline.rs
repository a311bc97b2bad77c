#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    Text,
    Code,
    Bold,
}

/// A run of inline text with its position in the flattened span list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSpan {
    pub key: usize,
    pub kind: SpanKind,
    pub text: String,
}

/// Split paragraph or list-item text into plain, `` `code` `` and `*bold*` spans.
///
/// Code spans are extracted first; bold is only recognised outside them.
/// A delimiter without a partner on the same run stays literal.
pub fn split_inline(text: &str) -> Vec<InlineSpan> {
    let mut kinds: Vec<(SpanKind, &str)> = Vec::new();

    for (outside, is_code) in split_delimited(text, '`') {
        if is_code {
            kinds.push((SpanKind::Code, outside));
            continue;
        }
        for (part, is_bold) in split_delimited(outside, '*') {
            let kind = if is_bold { SpanKind::Bold } else { SpanKind::Text };
            kinds.push((kind, part));
        }
    }

    kinds
        .into_iter()
        .enumerate()
        .map(|(key, (kind, text))| InlineSpan {
            key,
            kind,
            text: text.to_string(),
        })
        .collect()
}

/// Alternate unmatched text with the inner text of `delim…delim` pairs.
///
/// A pair needs at least one character between its delimiters. Empty
/// outside runs are dropped.
fn split_delimited(text: &str, delim: char) -> Vec<(&str, bool)> {
    let mut parts = Vec::new();
    let mut plain_start = 0;
    let mut search_from = 0;
    let width = delim.len_utf8();

    while let Some(rel) = text[search_from..].find(delim) {
        let open = search_from + rel;
        let inner_start = open + width;
        let Some(close_rel) = text[inner_start..].find(delim) else {
            break;
        };
        let close = inner_start + close_rel;

        if close == inner_start {
            // Adjacent delimiters: the second one may still open a pair.
            search_from = inner_start;
            continue;
        }

        if open > plain_start {
            parts.push((&text[plain_start..open], false));
        }
        parts.push((&text[inner_start..close], true));
        plain_start = close + width;
        search_from = plain_start;
    }

    if plain_start < text.len() {
        parts.push((&text[plain_start..], false));
    }
    parts
}
