use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{Path as UrlPath, State},
    http::StatusCode,
    response::{
        Html, IntoResponse, Redirect, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use notify::{Event as NotifyEvent, EventKind, RecursiveMode, Watcher};
use spacetraveling_cms::{ContentSource, StaticSource, is_valid_uid};
use spacetraveling_core::config::BlogConfig;
use spacetraveling_core::{FeedLoader, FeedState, FetchError, LoadOutcome};
use spacetraveling_generator::{
    SiteMeta, render_error, render_listing, render_loading, render_not_found, render_post,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tokio::sync::broadcast;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::{CONFIG_FILE, connect, first_page, load_config};

/// Lookups that fail with something other than "not found" are retried on
/// the next request up to this many times before the slug is shown as missing.
const MAX_LOOKUP_ATTEMPTS: u32 = 3;

/// How often the loading placeholder reloads itself
const LOADING_REFRESH_SECS: u32 = 1;

/// Page cache size above which `Missing` and `Failed` slots are dropped
const MAX_CACHED_PAGES: usize = 1024;

/// Generation state of a post page
#[derive(Debug, Clone)]
enum PageSlot {
    Generating { prior_failures: u32 },
    Ready(String),
    Missing,
    Failed { attempts: u32, error: String },
}

/// Everything the preview server shares between requests
struct Preview {
    root: PathBuf,
    offline: bool,
    config: RwLock<BlogConfig>,
    source: RwLock<Arc<dyn ContentSource>>,
    feed: FeedLoader,
    pages: Mutex<HashMap<String, PageSlot>>,
    /// Bumped on every reload; generation results from an older epoch are dropped
    epoch: AtomicU64,
    reload_tx: broadcast::Sender<()>,
}

impl Preview {
    async fn open(
        root: PathBuf,
        offline: bool,
        config: BlogConfig,
        source: Arc<dyn ContentSource>,
    ) -> Result<Arc<Self>> {
        let first = first_page(&config, source.as_ref()).await?;
        let (reload_tx, _) = broadcast::channel::<()>(100);

        Ok(Arc::new(Self {
            root,
            offline,
            config: RwLock::new(config),
            source: RwLock::new(source),
            feed: FeedLoader::new(FeedState::initialize(first)),
            pages: Mutex::new(HashMap::new()),
            epoch: AtomicU64::new(0),
            reload_tx,
        }))
    }

    fn site(&self) -> SiteMeta {
        let config = self.config.read().unwrap_or_else(|e| e.into_inner());
        SiteMeta::new(config.site.title.clone()).preview()
    }

    fn doc_type(&self) -> String {
        let config = self.config.read().unwrap_or_else(|e| e.into_inner());
        config.cms.document_type.clone()
    }

    fn static_dir(&self) -> Option<PathBuf> {
        let config = self.config.read().unwrap_or_else(|e| e.into_inner());
        config.site.static_dir.as_ref().map(|dir| self.root.join(dir))
    }

    fn source(&self) -> Arc<dyn ContentSource> {
        self.source
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn pages(&self) -> MutexGuard<'_, HashMap<String, PageSlot>> {
        self.pages.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Re-read blog.toml, reconnect, and start the feed and page cache over
    async fn reload(&self) -> Result<()> {
        let config = load_config(&self.root)?;
        let source = make_source(&config, self.offline)?;
        let first = first_page(&config, source.as_ref()).await?;

        *self.config.write().unwrap_or_else(|e| e.into_inner()) = config;
        *self.source.write().unwrap_or_else(|e| e.into_inner()) = source;
        self.feed.reset(FeedState::initialize(first));
        {
            let mut pages = self.pages();
            self.epoch.fetch_add(1, Ordering::AcqRel);
            pages.clear();
        }

        tracing::info!("Reloaded configuration");
        Ok(())
    }
}

fn make_source(config: &BlogConfig, offline: bool) -> Result<Arc<dyn ContentSource>> {
    if offline {
        Ok(Arc::new(StaticSource::sample(
            config.cms.document_type.clone(),
            config.cms.page_size as usize,
        )))
    } else {
        Ok(Arc::new(connect(config)?))
    }
}

/// Start preview server with hot reload for local development.
///
/// This command:
/// - Validates and loads blog.toml
/// - Serves the listing from a server-side feed; "load more" posts back
/// - Generates post pages on first request, showing a loading placeholder
/// - Serves the static directory
/// - Watches blog.toml and triggers hot reload
///
/// # Arguments
///
/// * `path` - Path to blog directory containing blog.toml
/// * `port` - Port to serve on (default: 8080)
/// * `offline` - Serve sample posts instead of querying the CMS
pub async fn run(path: PathBuf, port: u16, offline: bool) -> Result<()> {
    println!("🚀 Starting preview server...");
    println!("   Blog: {}", path.display());

    let config = load_config(&path)?;
    println!("   ✓ Loaded: {}", config.site.title);
    if offline {
        println!("   ✓ Offline: serving sample posts");
    } else {
        println!("   ✓ CMS: {}", config.cms.endpoint);
    }

    let source = make_source(&config, offline)?;
    let preview = Preview::open(path.clone(), offline, config, source).await?;
    println!("   ✓ Posts on first page: {}", preview.feed.snapshot().len());

    let watcher_preview = preview.clone();
    tokio::spawn(async move {
        if let Err(e) = watch_config(watcher_preview).await {
            eprintln!("File watcher error: {}", e);
        }
    });

    let app = router(preview);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    println!("\n🌐 Preview ready at: http://localhost:{}", port);
    println!("   Press Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to port")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn router(preview: Arc<Preview>) -> Router {
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/more", post(more_handler))
        .route("/post/{slug}", get(post_handler))
        .route("/_reload", get(sse_handler));

    let app = match preview.static_dir() {
        Some(dir) => app.fallback_service(ServeDir::new(dir)),
        None => app.fallback(not_found_handler),
    };

    app.layer(TraceLayer::new_for_http()).with_state(preview)
}

/// Watch blog.toml and reload on change
async fn watch_config(preview: Arc<Preview>) -> Result<()> {
    let (tx, mut rx) = tokio::sync::mpsc::channel(100);

    let mut watcher =
        notify::recommended_watcher(move |res: Result<NotifyEvent, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.blocking_send(event);
            }
        })?;

    watcher.watch(&preview.root, RecursiveMode::NonRecursive)?;

    while let Some(event) = rx.recv().await {
        match event.kind {
            EventKind::Modify(_) | EventKind::Create(_) => {
                let config_changed = event
                    .paths
                    .iter()
                    .any(|p| p.file_name().is_some_and(|name| name == CONFIG_FILE));
                if !config_changed {
                    continue;
                }

                println!("   📝 {} changed, reloading...", CONFIG_FILE);
                match preview.reload().await {
                    Ok(()) => {
                        let _ = preview.reload_tx.send(());
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Reload failed; keeping previous configuration");
                        eprintln!("   ⚠ Reload failed: {:#}", e);
                    }
                }
            }
            _ => {}
        }
    }

    Ok(())
}

/// SSE endpoint for hot reload
async fn sse_handler(
    State(preview): State<Arc<Preview>>,
) -> Sse<impl futures::Stream<Item = Result<Event, std::convert::Infallible>>> {
    let mut rx = preview.reload_tx.subscribe();

    let stream = async_stream::stream! {
        loop {
            if rx.recv().await.is_ok() {
                yield Ok(Event::default().data("reload"));
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Listing of every post loaded so far
async fn index_handler(State(preview): State<Arc<Preview>>) -> Html<String> {
    Html(render_listing(&preview.site(), &preview.feed.snapshot()))
}

/// "Load more": append the next page, then show the listing again.
///
/// A request arriving while another page fetch is running does not start a
/// second fetch.
async fn more_handler(State(preview): State<Arc<Preview>>) -> Response {
    let source = preview.source();
    match preview.feed.load_more(source.as_ref()).await {
        Ok(outcome) => {
            if outcome == LoadOutcome::InFlight {
                tracing::debug!("Load more ignored; fetch already running");
            }
            Redirect::to("/").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load next feed page");
            (
                StatusCode::BAD_GATEWAY,
                Html(render_error(
                    &preview.site(),
                    "Falha ao carregar mais posts",
                    &e.to_string(),
                )),
            )
                .into_response()
        }
    }
}

/// Post page, generated on first request
async fn post_handler(
    State(preview): State<Arc<Preview>>,
    UrlPath(slug): UrlPath<String>,
) -> Response {
    let site = preview.site();
    if !is_valid_uid(&slug) {
        return not_found(&site, &slug);
    }

    let start_generation = {
        let mut pages = preview.pages();
        let prior_failures = match pages.get(&slug) {
            Some(PageSlot::Ready(html)) => return Html(html.clone()).into_response(),
            Some(PageSlot::Missing) => return not_found(&site, &slug),
            Some(PageSlot::Failed { attempts, error }) if *attempts >= MAX_LOOKUP_ATTEMPTS => {
                tracing::warn!(slug = %slug, attempts = attempts, error = %error, "Giving up on post lookup");
                return not_found(&site, &slug);
            }
            Some(PageSlot::Generating { .. }) => None,
            Some(PageSlot::Failed { attempts, .. }) => Some(*attempts),
            None => Some(0),
        };
        prior_failures.map(|prior_failures| {
            make_room(&mut pages);
            pages.insert(slug.clone(), PageSlot::Generating { prior_failures });
            (prior_failures, preview.epoch.load(Ordering::Acquire))
        })
    };

    if let Some((prior_failures, epoch)) = start_generation {
        tokio::spawn(generate_post(preview.clone(), slug, prior_failures, epoch));
    }

    (
        StatusCode::ACCEPTED,
        Html(render_loading(&site, LOADING_REFRESH_SECS)),
    )
        .into_response()
}

/// Drop settled lookups that produced no page once the cache is full
fn make_room(pages: &mut HashMap<String, PageSlot>) {
    if pages.len() < MAX_CACHED_PAGES {
        return;
    }
    let before = pages.len();
    pages.retain(|_, slot| matches!(slot, PageSlot::Ready(_) | PageSlot::Generating { .. }));
    tracing::debug!(evicted = before - pages.len(), "Evicted cached lookup results");
}

async fn generate_post(preview: Arc<Preview>, slug: String, prior_failures: u32, epoch: u64) {
    let source = preview.source();
    let doc_type = preview.doc_type();

    tracing::debug!(slug = %slug, "Generating post page on demand");
    let slot = match source.query_by_uid(&doc_type, &slug).await {
        Ok(post) => PageSlot::Ready(render_post(&preview.site(), &post)),
        Err(FetchError::NotFound(_)) => {
            tracing::info!(slug = %slug, "No post with this uid");
            PageSlot::Missing
        }
        Err(e) => {
            tracing::warn!(slug = %slug, error = %e, "Post lookup failed");
            PageSlot::Failed {
                attempts: prior_failures + 1,
                error: e.to_string(),
            }
        }
    };

    let mut pages = preview.pages();
    if preview.epoch.load(Ordering::Acquire) != epoch {
        tracing::debug!(slug = %slug, "Configuration reloaded during generation; dropping page");
        return;
    }
    pages.insert(slug, slot);
}

async fn not_found_handler(State(preview): State<Arc<Preview>>) -> Response {
    (
        StatusCode::NOT_FOUND,
        Html(render_not_found(&preview.site(), None)),
    )
        .into_response()
}

fn not_found(site: &SiteMeta, slug: &str) -> Response {
    (StatusCode::NOT_FOUND, Html(render_not_found(site, Some(slug)))).into_response()
}
