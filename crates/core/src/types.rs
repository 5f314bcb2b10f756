use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A post as shown on the listing page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    /// CMS uid, also the URL slug
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

impl PostSummary {
    /// Site-relative link to the post view
    pub fn href(&self) -> String {
        post_href(&self.id)
    }
}

/// One page of the post feed. `cursor == None` means there are no more pages.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeedPage {
    pub cursor: Option<String>,
    pub items: Vec<PostSummary>,
}

/// A fully loaded post, built once per page render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetail {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner_url: Option<String>,
    pub content: Vec<ContentBlock>,
}

impl PostDetail {
    pub fn href(&self) -> String {
        post_href(&self.id)
    }

    pub fn summary(&self) -> PostSummary {
        PostSummary {
            id: self.id.clone(),
            published_at: self.published_at,
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            author: self.author.clone(),
        }
    }
}

/// A titled section of a post body
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContentBlock {
    pub heading: String,
    pub body: Vec<RichTextBlock>,
}

/// One block of structured rich text (paragraph, heading, list item, ...)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RichTextBlock {
    pub kind: BlockKind,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub spans: Vec<Span>,
    /// Image source or embed URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Image alt text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

impl RichTextBlock {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Paragraph,
            text: text.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    #[default]
    Paragraph,
    Heading1,
    Heading2,
    Heading3,
    Heading4,
    Heading5,
    Heading6,
    Preformatted,
    ListItem,
    OListItem,
    Image,
    Embed,
    Unknown,
}

impl BlockKind {
    /// Map the backend's block `type` string. Unrecognised types become `Unknown`.
    pub fn from_type(kind: &str) -> Self {
        match kind {
            "paragraph" => BlockKind::Paragraph,
            "heading1" => BlockKind::Heading1,
            "heading2" => BlockKind::Heading2,
            "heading3" => BlockKind::Heading3,
            "heading4" => BlockKind::Heading4,
            "heading5" => BlockKind::Heading5,
            "heading6" => BlockKind::Heading6,
            "preformatted" => BlockKind::Preformatted,
            "list-item" => BlockKind::ListItem,
            "o-list-item" => BlockKind::OListItem,
            "image" => BlockKind::Image,
            "embed" => BlockKind::Embed,
            _ => BlockKind::Unknown,
        }
    }

    /// Heading level, if this is a heading block
    pub fn heading_level(self) -> Option<u8> {
        match self {
            BlockKind::Heading1 => Some(1),
            BlockKind::Heading2 => Some(2),
            BlockKind::Heading3 => Some(3),
            BlockKind::Heading4 => Some(4),
            BlockKind::Heading5 => Some(5),
            BlockKind::Heading6 => Some(6),
            _ => None,
        }
    }
}

/// Inline formatting over a character range of a block's text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// Start offset in characters (inclusive)
    pub start: usize,
    /// End offset in characters (exclusive)
    pub end: usize,
    pub kind: SpanKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink {
        url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        target: Option<String>,
    },
    Label {
        name: String,
    },
    Unknown,
}

pub fn post_href(id: &str) -> String {
    format!("/post/{}", id)
}
