use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use spacetraveling_cms::ContentSource;
use spacetraveling_core::config::BlogConfig;
use spacetraveling_core::{FeedState, FetchError, PostDetail};
use spacetraveling_generator::{SiteMeta, generate_site};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{connect, first_page, load_config};

/// Concurrent post lookups during a build
const POST_FETCH_CONCURRENCY: usize = 4;

/// What a build produced
#[derive(Debug, Default)]
pub struct BuildReport {
    pub listed: usize,
    pub posts_written: usize,
    /// Posts whose lookup failed: (uid, error)
    pub posts_skipped: Vec<(String, String)>,
    pub static_files: usize,
}

/// Build static site
pub async fn run(path: PathBuf, output: PathBuf) -> Result<()> {
    println!("🔨 Building static site...");
    println!("   Source: {}", path.display());
    println!("   Output: {}", output.display());
    println!();

    let config = load_config(&path)?;
    println!("✓ Loaded: {}", config.site.title);
    println!("  CMS: {}", config.cms.endpoint);
    println!();

    let client = connect(&config)?;
    let report = build_site(&config, &client, &path, &output).await?;

    println!("   ✓ Listing: {} posts on first page", report.listed);
    println!("   ✓ Generated {} post pages", report.posts_written);
    for (uid, error) in &report.posts_skipped {
        eprintln!("   ⚠ Warning: skipped post '{}': {}", uid, error);
    }
    println!("   ✓ Copied {} static files", report.static_files);

    println!();
    println!("✅ Build complete!");
    println!("   Output: {}", output.display());
    if !report.posts_skipped.is_empty() {
        println!(
            "   {} post(s) skipped; 'spacetraveling preview' resolves them on demand",
            report.posts_skipped.len()
        );
    }
    println!();

    Ok(())
}

/// Fetch everything the site needs from `source` and write it under `output`.
///
/// A post whose lookup fails is skipped and reported rather than failing the
/// whole build.
pub async fn build_site(
    config: &BlogConfig,
    source: &dyn ContentSource,
    root: &Path,
    output: &Path,
) -> Result<BuildReport> {
    let doc_type = config.cms.document_type.as_str();

    println!("📡 Fetching posts...");
    let feed = FeedState::initialize(first_page(config, source).await?);
    for id in feed.duplicate_ids() {
        tracing::warn!(uid = id, "Post appears more than once in the listing");
    }
    if feed.has_more() && config.cms.access_token().is_some() {
        tracing::warn!(
            "Access token is not published; \"load more\" in the built site needs a public repository"
        );
        eprintln!(
            "   ⚠ Warning: {} is set; the built \"load more\" button queries the CMS without it",
            config.cms.access_token_env
        );
    }

    let uids = source
        .list_uids(doc_type)
        .await
        .context("Failed to enumerate post paths")?;
    tracing::info!(count = uids.len(), "Enumerated post paths");

    let results: Vec<(String, Result<PostDetail, FetchError>)> = stream::iter(uids)
        .map(|uid| async move {
            let result = source.query_by_uid(doc_type, &uid).await;
            (uid, result)
        })
        .buffered(POST_FETCH_CONCURRENCY)
        .collect()
        .await;

    let mut report = BuildReport {
        listed: feed.len(),
        ..BuildReport::default()
    };
    let mut posts = Vec::with_capacity(results.len());
    for (uid, result) in results {
        match result {
            Ok(post) => posts.push(post),
            Err(e) => {
                tracing::warn!(uid = %uid, error = %e, "Skipping post");
                report.posts_skipped.push((uid, e.to_string()));
            }
        }
    }
    report.posts_written = posts.len();

    println!("📄 Generating pages...");
    let meta = SiteMeta::new(&config.site.title).with_base_url(config.site.base_url.clone());
    let site = generate_site(&meta, &feed, &posts);

    fs::create_dir_all(output).context("Failed to create output directory")?;
    for (rel_path, html) in &site.pages {
        write_file(&output.join(rel_path), html.as_bytes())?;
    }
    for (rel_path, data) in &site.assets {
        write_file(&output.join(rel_path), data)?;
    }

    if let Some(ref static_dir) = config.site.static_dir {
        println!("🎨 Copying static files...");
        report.static_files = copy_static_dir(&root.join(static_dir), output)?;
    }

    Ok(report)
}

fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, data).with_context(|| format!("Failed to write {}", path.display()))
}

/// Copy every file under `src` into `output`, keeping relative paths
fn copy_static_dir(src: &Path, output: &Path) -> Result<usize> {
    if !src.exists() {
        eprintln!("   ⚠ Warning: static directory not found: {}", src.display());
        return Ok(0);
    }

    let mut copied = 0;
    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.context("Failed to read static directory")?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(src)
            .context("Static file outside static directory")?;
        let dst = output.join(rel);
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(entry.path(), &dst)
            .with_context(|| format!("Failed to copy {}", entry.path().display()))?;
        copied += 1;
    }
    Ok(copied)
}
