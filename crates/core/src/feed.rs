//! Incrementally loaded post feed.
//!
//! [`FeedState`] is the append-only list of post summaries plus the cursor
//! for the next page. [`FeedLoader`] wraps a state for shared use and refuses
//! to start a second page fetch while one is still outstanding.

use crate::error::FetchError;
use crate::types::{FeedPage, PostSummary};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Anything that can resolve a feed cursor into the next page.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, cursor: &str) -> Result<FeedPage, FetchError>;
}

/// Posts loaded so far plus the cursor of the next page.
///
/// Items are only ever appended, never re-sorted or removed. Duplicate ids
/// across pages are kept as received; see [`FeedState::duplicate_ids`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeedState {
    cursor: Option<String>,
    items: Vec<PostSummary>,
}

impl FeedState {
    /// Seed the state from the first page. Performs no fetch.
    pub fn initialize(first: FeedPage) -> Self {
        Self {
            cursor: first.cursor,
            items: first.items,
        }
    }

    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    pub fn items(&self) -> &[PostSummary] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_more(&self) -> bool {
        self.cursor.is_some()
    }

    /// Fetch the page behind the current cursor and return the grown state.
    ///
    /// With no cursor this is a no-op and returns an identical state without
    /// touching `source`. Otherwise exactly one fetch is made. On error
    /// `self` is untouched so the caller can keep it and retry.
    ///
    /// Overlapping calls on the same state are not serialized: each fetches
    /// the same cursor. Shared callers go through [`FeedLoader::load_more`].
    pub async fn load_next<S>(&self, source: &S) -> Result<FeedState, FetchError>
    where
        S: PageSource + ?Sized,
    {
        let Some(cursor) = self.cursor.as_deref() else {
            return Ok(self.clone());
        };

        let page = source.fetch_page(cursor).await?;
        let mut next = self.clone();
        next.append(page);
        Ok(next)
    }

    /// Append a page's items in order and take its cursor
    pub fn append(&mut self, page: FeedPage) {
        let seen: HashSet<&str> = self.items.iter().map(|p| p.id.as_str()).collect();
        let repeated = page
            .items
            .iter()
            .filter(|p| seen.contains(p.id.as_str()))
            .count();
        if repeated > 0 {
            tracing::warn!(
                repeated = repeated,
                "Feed page repeats posts already loaded; keeping them as received"
            );
        }

        tracing::debug!(
            added = page.items.len(),
            total = self.items.len() + page.items.len(),
            has_more = page.cursor.is_some(),
            "Appended feed page"
        );

        self.items.extend(page.items);
        self.cursor = page.cursor;
    }

    /// Ids that occur more than once, in order of first appearance
    pub fn duplicate_ids(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        let mut duplicates = Vec::new();
        for post in &self.items {
            let id = post.id.as_str();
            if !seen.insert(id) && reported.insert(id) {
                duplicates.push(id);
            }
        }
        duplicates
    }
}

/// What happened on a [`FeedLoader::load_more`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was fetched and this many posts were appended
    Loaded(usize),
    /// No cursor; nothing fetched
    Exhausted,
    /// Another load is outstanding; nothing fetched
    InFlight,
    /// The loader was reset while the fetch was running; the page was dropped
    Superseded,
}

/// Shared owner of a [`FeedState`] that serializes "load more" requests.
///
/// Only one fetch runs at a time. A call that arrives while a fetch is
/// outstanding returns [`LoadOutcome::InFlight`] straight away rather than
/// fetching the same cursor twice.
#[derive(Debug, Default)]
pub struct FeedLoader {
    state: Mutex<FeedState>,
    in_flight: AtomicBool,
    generation: AtomicU64,
}

impl FeedLoader {
    pub fn new(state: FeedState) -> Self {
        Self {
            state: Mutex::new(state),
            in_flight: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> FeedState {
        self.lock().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Replace the state outright. A fetch already running will have its
    /// result discarded.
    pub fn reset(&self, state: FeedState) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        *self.lock() = state;
    }

    /// Load the next page if there is one and no other load is running.
    ///
    /// On [`FetchError`] the state is left as it was and the loader is ready
    /// for another attempt.
    pub async fn load_more<S>(&self, source: &S) -> Result<LoadOutcome, FetchError>
    where
        S: PageSource + ?Sized,
    {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Feed load already in flight; ignoring request");
            return Ok(LoadOutcome::InFlight);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let generation = self.generation.load(Ordering::Acquire);
        let current = self.snapshot();
        if !current.has_more() {
            return Ok(LoadOutcome::Exhausted);
        }

        let next = current.load_next(source).await?;
        let added = next.len() - current.len();

        let mut state = self.lock();
        if self.generation.load(Ordering::Acquire) != generation {
            tracing::debug!("Feed was reset during fetch; dropping page");
            return Ok(LoadOutcome::Superseded);
        }
        *state = next;
        Ok(LoadOutcome::Loaded(added))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FeedState> {
        // The state is replaced wholesale, so a poisoned lock still holds a
        // consistent value.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    fn post(id: &str) -> PostSummary {
        PostSummary {
            id: id.to_string(),
            published_at: None,
            title: format!("Post {}", id),
            subtitle: String::new(),
            author: "Autor".to_string(),
        }
    }

    fn page(cursor: Option<&str>, ids: &[&str]) -> FeedPage {
        FeedPage {
            cursor: cursor.map(String::from),
            items: ids.iter().map(|id| post(id)).collect(),
        }
    }

    fn ids(state: &FeedState) -> Vec<&str> {
        state.items().iter().map(|p| p.id.as_str()).collect()
    }

    /// Pages keyed by cursor, counting fetches
    #[derive(Default)]
    struct MapSource {
        pages: HashMap<String, FeedPage>,
        calls: AtomicUsize,
    }

    impl MapSource {
        fn with(mut self, cursor: &str, page: FeedPage) -> Self {
            self.pages.insert(cursor.to_string(), page);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PageSource for MapSource {
        async fn fetch_page(&self, cursor: &str) -> Result<FeedPage, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.pages
                .get(cursor)
                .cloned()
                .ok_or_else(|| FetchError::HttpStatus(500))
        }
    }

    #[tokio::test]
    async fn test_two_page_scenario() {
        let source = MapSource::default().with("p2", page(None, &["C"]));
        let state = FeedState::initialize(page(Some("p2"), &["A", "B"]));
        assert_eq!(source.calls(), 0);

        let state = state.load_next(&source).await.unwrap();
        assert_eq!(ids(&state), vec!["A", "B", "C"]);
        assert_eq!(state.cursor(), None);
        assert_eq!(source.calls(), 1);

        let again = state.load_next(&source).await.unwrap();
        assert_eq!(again, state);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_load_next_without_cursor_is_noop() {
        let source = MapSource::default();
        let state = FeedState::initialize(page(None, &["A"]));
        let next = state.load_next(&source).await.unwrap();
        assert_eq!(next, state);
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_fetch_error_leaves_state_unchanged() {
        let source = MapSource::default();
        let state = FeedState::initialize(page(Some("missing"), &["A"]));
        let before = state.clone();

        let err = state.load_next(&source).await.unwrap_err();
        assert_eq!(err, FetchError::HttpStatus(500));
        assert_eq!(state, before);
    }

    #[test]
    fn test_duplicates_are_kept_and_reported() {
        let mut state = FeedState::initialize(page(Some("p2"), &["A", "B"]));
        state.append(page(None, &["B", "C", "B"]));
        assert_eq!(ids(&state), vec!["A", "B", "B", "C", "B"]);
        assert_eq!(state.duplicate_ids(), vec!["B"]);
    }

    #[tokio::test]
    async fn test_loader_pages_until_exhausted() {
        let source = MapSource::default()
            .with("p2", page(Some("p3"), &["B"]))
            .with("p3", page(None, &["C", "D"]));
        let loader = FeedLoader::new(FeedState::initialize(page(Some("p2"), &["A"])));

        assert_eq!(loader.load_more(&source).await, Ok(LoadOutcome::Loaded(1)));
        assert_eq!(loader.load_more(&source).await, Ok(LoadOutcome::Loaded(2)));
        assert_eq!(loader.load_more(&source).await, Ok(LoadOutcome::Exhausted));
        assert_eq!(ids(&loader.snapshot()), vec!["A", "B", "C", "D"]);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_loader_recovers_after_error() {
        let source = MapSource::default();
        let loader = FeedLoader::new(FeedState::initialize(page(Some("p2"), &["A"])));

        assert!(loader.load_more(&source).await.is_err());
        assert!(!loader.is_loading());
        assert_eq!(ids(&loader.snapshot()), vec!["A"]);

        let source = source.with("p2", page(None, &["B"]));
        assert_eq!(loader.load_more(&source).await, Ok(LoadOutcome::Loaded(1)));
    }

    /// Blocks inside `fetch_page` until released
    struct GatedSource {
        entered: Notify,
        release: Notify,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PageSource for GatedSource {
        async fn fetch_page(&self, _cursor: &str) -> Result<FeedPage, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.entered.notify_one();
            self.release.notified().await;
            Ok(page(None, &["B"]))
        }
    }

    #[tokio::test]
    async fn test_overlapping_loads_fetch_once() {
        let source = Arc::new(GatedSource {
            entered: Notify::new(),
            release: Notify::new(),
            calls: AtomicUsize::new(0),
        });
        let loader = Arc::new(FeedLoader::new(FeedState::initialize(page(
            Some("p2"),
            &["A"],
        ))));

        let first = {
            let source = source.clone();
            let loader = loader.clone();
            tokio::spawn(async move { loader.load_more(source.as_ref()).await })
        };

        source.entered.notified().await;
        assert!(loader.is_loading());
        assert_eq!(
            loader.load_more(source.as_ref()).await,
            Ok(LoadOutcome::InFlight)
        );

        source.release.notify_one();
        assert_eq!(first.await.unwrap(), Ok(LoadOutcome::Loaded(1)));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(ids(&loader.snapshot()), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_reset_during_fetch_discards_page() {
        let source = Arc::new(GatedSource {
            entered: Notify::new(),
            release: Notify::new(),
            calls: AtomicUsize::new(0),
        });
        let loader = Arc::new(FeedLoader::new(FeedState::initialize(page(
            Some("p2"),
            &["A"],
        ))));

        let pending = {
            let source = source.clone();
            let loader = loader.clone();
            tokio::spawn(async move { loader.load_more(source.as_ref()).await })
        };

        source.entered.notified().await;
        loader.reset(FeedState::initialize(page(None, &["X"])));
        source.release.notify_one();

        assert_eq!(pending.await.unwrap(), Ok(LoadOutcome::Superseded));
        assert_eq!(ids(&loader.snapshot()), vec!["X"]);
    }

    proptest! {
        #[test]
        fn prop_items_are_concatenation_of_pages(
            pages in proptest::collection::vec(proptest::collection::vec("[a-z]{1,4}", 0..5), 1..6)
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let count = pages.len();
            let mut source = MapSource::default();
            for (i, items) in pages.iter().enumerate().skip(1) {
                let cursor = (i + 1 < count).then(|| format!("c{}", i + 1));
                let refs: Vec<&str> = items.iter().map(String::as_str).collect();
                source = source.with(&format!("c{}", i), page(cursor.as_deref(), &refs));
            }

            let first: Vec<&str> = pages[0].iter().map(String::as_str).collect();
            let first_cursor = (count > 1).then(|| "c1".to_string());
            let mut state = FeedState::initialize(page(first_cursor.as_deref(), &first));
            for _ in 1..count {
                state = runtime.block_on(state.load_next(&source)).unwrap();
            }

            let expected: Vec<&str> = pages.iter().flatten().map(String::as_str).collect();
            prop_assert_eq!(ids(&state), expected);
            prop_assert_eq!(state.cursor(), None);
            prop_assert_eq!(source.calls(), count - 1);
        }
    }
}
