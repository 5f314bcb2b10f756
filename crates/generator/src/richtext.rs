//! Structured rich text to HTML.
//!
//! Text is escaped; the markup produced here is inserted into pages as is.

use crate::html_escape;
use spacetraveling_core::{BlockKind, RichTextBlock, Span, SpanKind};
use std::collections::BTreeSet;

/// Render a sequence of rich text blocks as HTML.
///
/// Runs of consecutive `list-item` blocks share one `<ul>`, runs of
/// `o-list-item` blocks one `<ol>`.
pub fn as_html(blocks: &[RichTextBlock]) -> String {
    let mut out = String::new();
    let mut open_list: Option<BlockKind> = None;

    for block in blocks {
        let list = matches!(block.kind, BlockKind::ListItem | BlockKind::OListItem)
            .then_some(block.kind);
        if open_list != list {
            if let Some(kind) = open_list {
                out.push_str(list_tag(kind).1);
            }
            if let Some(kind) = list {
                out.push_str(list_tag(kind).0);
            }
            open_list = list;
        }
        render_block(block, &mut out);
    }

    if let Some(kind) = open_list {
        out.push_str(list_tag(kind).1);
    }
    out
}

fn list_tag(kind: BlockKind) -> (&'static str, &'static str) {
    match kind {
        BlockKind::OListItem => ("<ol>", "</ol>"),
        _ => ("<ul>", "</ul>"),
    }
}

fn render_block(block: &RichTextBlock, out: &mut String) {
    if let Some(level) = block.kind.heading_level() {
        out.push_str(&format!(
            "<h{level}>{}</h{level}>",
            render_spans(&block.text, &block.spans)
        ));
        return;
    }

    match block.kind {
        BlockKind::Paragraph => {
            out.push_str(&format!("<p>{}</p>", render_spans(&block.text, &block.spans)));
        }
        BlockKind::Preformatted => {
            out.push_str(&format!(
                "<pre>{}</pre>",
                render_spans(&block.text, &block.spans)
            ));
        }
        BlockKind::ListItem | BlockKind::OListItem => {
            out.push_str(&format!(
                "<li>{}</li>",
                render_spans(&block.text, &block.spans)
            ));
        }
        BlockKind::Image => {
            if let Some(ref url) = block.url {
                out.push_str(&format!(
                    r#"<p class="block-img"><img src="{}" alt="{}" /></p>"#,
                    html_escape(url),
                    html_escape(block.alt.as_deref().unwrap_or(""))
                ));
            }
        }
        BlockKind::Embed => {
            if let Some(ref url) = block.url {
                let url = html_escape(url);
                out.push_str(&format!(
                    r#"<div data-oembed="{url}" data-oembed-type="embed"><a href="{url}">{url}</a></div>"#
                ));
            }
        }
        _ => {
            if !block.text.is_empty() {
                tracing::debug!(kind = ?block.kind, "Rendering unsupported block as paragraph");
                out.push_str(&format!("<p>{}</p>", render_spans(&block.text, &block.spans)));
            }
        }
    }
}

/// Apply inline spans to `text`.
///
/// Spans are nested outermost-first (earlier start, then longer range).
/// Where two spans overlap without nesting, the inner one is closed and
/// reopened around the boundary so the output stays well-formed.
fn render_spans(text: &str, spans: &[Span]) -> String {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();

    let mut ordered: Vec<&Span> = spans.iter().filter(|s| s.start < s.end.min(len)).collect();
    ordered.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut boundaries: BTreeSet<usize> = BTreeSet::from([0, len]);
    for span in &ordered {
        boundaries.insert(span.start);
        boundaries.insert(span.end.min(len));
    }
    let boundaries: Vec<usize> = boundaries.into_iter().collect();

    let mut out = String::new();
    let mut open: Vec<&Span> = Vec::new();

    for window in boundaries.windows(2) {
        let (pos, next) = (window[0], window[1]);
        let active: Vec<&Span> = ordered
            .iter()
            .copied()
            .filter(|s| s.start <= pos && pos < s.end)
            .collect();

        let keep = open
            .iter()
            .zip(&active)
            .take_while(|(a, b)| std::ptr::eq(**a, **b))
            .count();
        while open.len() > keep {
            if let Some(span) = open.pop() {
                out.push_str(close_tag(&span.kind));
            }
        }
        for &span in &active[keep..] {
            out.push_str(&open_tag(&span.kind));
            open.push(span);
        }

        let segment: String = chars[pos..next].iter().collect();
        out.push_str(&escape_with_breaks(&segment));
    }

    while let Some(span) = open.pop() {
        out.push_str(close_tag(&span.kind));
    }
    out
}

fn open_tag(kind: &SpanKind) -> String {
    match kind {
        SpanKind::Strong => "<strong>".to_string(),
        SpanKind::Em => "<em>".to_string(),
        SpanKind::Hyperlink { url, target } => match target {
            Some(target) => format!(
                r#"<a href="{}" target="{}" rel="noopener">"#,
                html_escape(url),
                html_escape(target)
            ),
            None => format!(r#"<a href="{}">"#, html_escape(url)),
        },
        SpanKind::Label { name } => format!(r#"<span class="{}">"#, html_escape(name)),
        SpanKind::Unknown => "<span>".to_string(),
    }
}

fn close_tag(kind: &SpanKind) -> &'static str {
    match kind {
        SpanKind::Strong => "</strong>",
        SpanKind::Em => "</em>",
        SpanKind::Hyperlink { .. } => "</a>",
        SpanKind::Label { .. } | SpanKind::Unknown => "</span>",
    }
}

fn escape_with_breaks(text: &str) -> String {
    html_escape(text).replace('\n', "<br />")
}
