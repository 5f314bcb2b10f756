//! In-memory content source with synthetic cursors (`page:N`).

use crate::{ContentSource, QueryOptions};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use spacetraveling_core::{
    BlockKind, ContentBlock, FeedPage, FetchError, PageSource, PostDetail, RichTextBlock, Span,
    SpanKind,
};

const CURSOR_PREFIX: &str = "page:";

pub struct StaticSource {
    doc_type: String,
    page_size: usize,
    posts: Vec<PostDetail>,
}

impl StaticSource {
    pub fn new(doc_type: impl Into<String>, page_size: usize, posts: Vec<PostDetail>) -> Self {
        Self {
            doc_type: doc_type.into(),
            page_size: page_size.max(1),
            posts,
        }
    }

    /// `None` when the page offset does not fit in `usize`
    fn page(&self, index: usize, page_size: usize) -> Option<FeedPage> {
        let start = index.checked_mul(page_size)?;
        let items = self
            .posts
            .iter()
            .skip(start)
            .take(page_size)
            .map(PostDetail::summary)
            .collect();
        let cursor = (start.saturating_add(page_size) < self.posts.len())
            .then(|| format!("{}{}:{}", CURSOR_PREFIX, index + 1, page_size));
        Some(FeedPage { cursor, items })
    }

    /// Built-in demo posts for offline preview
    pub fn sample(doc_type: impl Into<String>, page_size: usize) -> Self {
        let lorem = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. Nullam dolor sapien, \
                     vulputate eu diam at, condimentum hendrerit tellus. Nam facilisis sodales felis, \
                     pharetra pharetra lectus auctor sed.";
        let paragraph = |text: &str| RichTextBlock::paragraph(text);

        let posts = vec![
            PostDetail {
                id: "como-utilizar-hooks".into(),
                published_at: Utc.with_ymd_and_hms(2021, 3, 15, 19, 25, 28).single(),
                title: "Como utilizar Hooks".into(),
                subtitle: "Pensando em sincronização em vez de ciclos de vida.".into(),
                author: "Joseph Oliveira".into(),
                banner_url: None,
                content: vec![
                    ContentBlock {
                        heading: "Proin et varius".into(),
                        body: vec![
                            RichTextBlock {
                                kind: BlockKind::Paragraph,
                                text: lorem.into(),
                                spans: vec![Span {
                                    start: 0,
                                    end: 11,
                                    kind: SpanKind::Strong,
                                }],
                                ..RichTextBlock::default()
                            },
                            RichTextBlock {
                                kind: BlockKind::ListItem,
                                text: "useState".into(),
                                ..RichTextBlock::default()
                            },
                            RichTextBlock {
                                kind: BlockKind::ListItem,
                                text: "useEffect".into(),
                                ..RichTextBlock::default()
                            },
                        ],
                    },
                    ContentBlock {
                        heading: "Cras laoreet mi".into(),
                        body: vec![paragraph(lorem)],
                    },
                ],
            },
            PostDetail {
                id: "criando-um-app-cra-do-zero".into(),
                published_at: Utc.with_ymd_and_hms(2021, 3, 19, 10, 0, 0).single(),
                title: "Criando um app CRA do zero".into(),
                subtitle: "Tudo sobre como criar a sua primeira aplicação utilizando Create React App".into(),
                author: "Danilo Vieira".into(),
                banner_url: None,
                content: vec![ContentBlock {
                    heading: "Por onde começar".into(),
                    body: vec![paragraph(lorem), paragraph(lorem)],
                }],
            },
            PostDetail {
                id: "mapas-com-react-usando-leaflet".into(),
                published_at: Utc.with_ymd_and_hms(2021, 4, 2, 8, 30, 0).single(),
                title: "Mapas com React usando Leaflet".into(),
                subtitle: "Aprenda como criar mapas interativos.".into(),
                author: "Ana Souza".into(),
                banner_url: None,
                content: vec![ContentBlock {
                    heading: "Instalação".into(),
                    body: vec![RichTextBlock {
                        kind: BlockKind::Preformatted,
                        text: "npm install leaflet react-leaflet".into(),
                        ..RichTextBlock::default()
                    }],
                }],
            },
        ];

        Self::new(doc_type, page_size, posts)
    }
}

#[async_trait]
impl PageSource for StaticSource {
    async fn fetch_page(&self, cursor: &str) -> Result<FeedPage, FetchError> {
        let invalid = || FetchError::Parse(format!("invalid cursor '{}'", cursor));
        let rest = cursor.strip_prefix(CURSOR_PREFIX).ok_or_else(invalid)?;
        let (index, size) = rest.split_once(':').ok_or_else(invalid)?;
        let index: usize = index.parse().map_err(|_| invalid())?;
        let size: usize = size.parse().map_err(|_| invalid())?;
        if size == 0 {
            return Err(invalid());
        }
        self.page(index, size).ok_or_else(invalid)
    }
}

#[async_trait]
impl ContentSource for StaticSource {
    async fn query_by_type(
        &self,
        doc_type: &str,
        options: &QueryOptions,
    ) -> Result<FeedPage, FetchError> {
        if doc_type != self.doc_type {
            return Ok(FeedPage::default());
        }
        let size = if options.page_size == 0 {
            self.page_size
        } else {
            options.page_size as usize
        };
        Ok(self.page(0, size).unwrap_or_default())
    }

    async fn query_by_uid(&self, doc_type: &str, uid: &str) -> Result<PostDetail, FetchError> {
        self.posts
            .iter()
            .find(|post| doc_type == self.doc_type && post.id == uid)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(uid.to_string()))
    }
}
