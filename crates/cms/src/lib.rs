// Content backend access: the query contract, wire types, and clients.

pub mod normalize;
pub mod prismic;
pub mod raw;
pub mod static_source;

use async_trait::async_trait;
use spacetraveling_core::{FeedPage, FetchError, PageSource, PostDetail};

pub use prismic::PrismicClient;
pub use static_source::StaticSource;

/// Safety stop when walking every page of a document type
pub const MAX_PAGES: usize = 1_000;

/// Page size used when enumerating all documents
pub const LIST_PAGE_SIZE: u32 = 100;

/// Whether `uid` has the shape of a document slug.
///
/// Slugs never contain characters that would break out of a query predicate.
pub fn is_valid_uid(uid: &str) -> bool {
    !uid.is_empty()
        && uid
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Field selection and page size for a listing query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    /// Fully qualified field names (`posts.title`). Empty fetches everything.
    pub fetch_fields: Vec<String>,
    pub page_size: u32,
}

impl QueryOptions {
    /// Only the fields the listing page displays
    pub fn listing(doc_type: &str, page_size: u32) -> Self {
        Self {
            fetch_fields: ["title", "subtitle", "author"]
                .iter()
                .map(|field| format!("{}.{}", doc_type, field))
                .collect(),
            page_size,
        }
    }
}

/// Read access to the content backend.
///
/// Implementations are constructed explicitly and handed to whatever needs
/// them; there is no process-wide client.
#[async_trait]
pub trait ContentSource: PageSource {
    /// First page of documents of `doc_type`, newest first
    async fn query_by_type(
        &self,
        doc_type: &str,
        options: &QueryOptions,
    ) -> Result<FeedPage, FetchError>;

    /// A single document by uid. [`FetchError::NotFound`] if it does not exist.
    async fn query_by_uid(&self, doc_type: &str, uid: &str) -> Result<PostDetail, FetchError>;

    /// Every uid of `doc_type`, walking all pages
    async fn list_uids(&self, doc_type: &str) -> Result<Vec<String>, FetchError> {
        let options = QueryOptions {
            fetch_fields: Vec::new(),
            page_size: LIST_PAGE_SIZE,
        };
        let mut page = self.query_by_type(doc_type, &options).await?;
        let mut uids = Vec::new();

        for _ in 0..MAX_PAGES {
            uids.extend(page.items.into_iter().map(|post| post.id));
            match page.cursor {
                Some(cursor) => page = self.fetch_page(&cursor).await?,
                None => return Ok(uids),
            }
        }

        tracing::warn!(
            max_pages = MAX_PAGES,
            found = uids.len(),
            "Stopped listing documents at page limit"
        );
        Ok(uids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_uid() {
        assert!(is_valid_uid("como-utilizar-hooks"));
        assert!(is_valid_uid("criando-um-app-cra-do-zero_2"));
        assert!(!is_valid_uid(""));
        assert!(!is_valid_uid("a\")]]"));
        assert!(!is_valid_uid("a/b"));
    }

    #[test]
    fn test_listing_fields() {
        let options = QueryOptions::listing("posts", 1);
        assert_eq!(
            options.fetch_fields,
            vec!["posts.title", "posts.subtitle", "posts.author"]
        );
        assert_eq!(options.page_size, 1);
    }
}
