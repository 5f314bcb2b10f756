//! The one place where backend documents become internal records.
//!
//! Missing strings become `""`, missing lists become empty, missing dates
//! and banners become `None`. Code past this boundary never deals with
//! partially present data.

use crate::raw::{RawContentBlock, RawPost, RawRichText, RawSearchResponse, RawSpan};
use spacetraveling_core::date::parse_timestamp;
use spacetraveling_core::types::{
    BlockKind, ContentBlock, FeedPage, PostDetail, PostSummary, RichTextBlock, Span, SpanKind,
};

/// Convert a search response into a feed page.
///
/// Documents without a uid cannot be linked to, so they are dropped.
pub fn feed_page(response: RawSearchResponse) -> FeedPage {
    let items = response
        .results
        .into_iter()
        .filter_map(post_summary)
        .collect();
    FeedPage {
        cursor: response.next_page.filter(|c| !c.is_empty()),
        items,
    }
}

pub fn post_summary(raw: RawPost) -> Option<PostSummary> {
    post_detail(raw).map(|detail| PostSummary {
        id: detail.id,
        published_at: detail.published_at,
        title: detail.title,
        subtitle: detail.subtitle,
        author: detail.author,
    })
}

pub fn post_detail(raw: RawPost) -> Option<PostDetail> {
    let Some(id) = raw.uid.filter(|uid| !uid.is_empty()) else {
        tracing::warn!("Skipping document without uid");
        return None;
    };

    let published_at = raw.first_publication_date.as_deref().and_then(|ts| {
        let parsed = parse_timestamp(ts);
        if parsed.is_none() {
            tracing::warn!(uid = %id, timestamp = ts, "Unparseable publication date");
        }
        parsed
    });

    let data = raw.data.unwrap_or_default();
    Some(PostDetail {
        id,
        published_at,
        title: data.title.unwrap_or_default(),
        subtitle: data.subtitle.unwrap_or_default(),
        author: data.author.unwrap_or_default(),
        banner_url: data
            .banner
            .and_then(|banner| banner.url)
            .filter(|url| !url.is_empty()),
        content: data.content.into_iter().map(content_block).collect(),
    })
}

fn content_block(raw: RawContentBlock) -> ContentBlock {
    ContentBlock {
        heading: raw.heading.unwrap_or_default(),
        body: raw.body.into_iter().map(rich_text).collect(),
    }
}

fn rich_text(raw: RawRichText) -> RichTextBlock {
    let kind = raw
        .kind
        .as_deref()
        .map(BlockKind::from_type)
        .unwrap_or(BlockKind::Paragraph);
    let text = raw.text.unwrap_or_default();
    let len = text.chars().count();

    let url = match kind {
        BlockKind::Embed => raw.oembed.and_then(|o| o.embed_url),
        _ => raw.url,
    };

    RichTextBlock {
        kind,
        spans: raw
            .spans
            .into_iter()
            .filter_map(|span| self::span(span, len))
            .collect(),
        text,
        url,
        alt: raw.alt,
    }
}

/// Spans with missing or out-of-range offsets are dropped; ends past the
/// text are clamped.
fn span(raw: RawSpan, text_len: usize) -> Option<Span> {
    let start = raw.start?;
    let end = raw.end?.min(text_len);
    if start >= end {
        return None;
    }
    let data = raw.data.unwrap_or_default();
    let kind = match raw.kind.as_deref() {
        Some("strong") => SpanKind::Strong,
        Some("em") => SpanKind::Em,
        Some("hyperlink") => SpanKind::Hyperlink {
            url: data.url?,
            target: data.target,
        },
        Some("label") => SpanKind::Label {
            name: data.label.unwrap_or_default(),
        },
        _ => SpanKind::Unknown,
    };
    Some(Span { start, end, kind })
}
