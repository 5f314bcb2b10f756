use anyhow::{Context, Result};
use spacetraveling_cms::ContentSource;
use spacetraveling_core::config::BlogConfig;
use spacetraveling_core::date::format_publication_date;
use spacetraveling_core::{FeedLoader, FeedState, LoadOutcome};
use std::path::PathBuf;

use super::{connect, first_page, load_config};

/// Print the post feed, loading up to `pages` pages
pub async fn run(path: PathBuf, pages: usize, json: bool) -> Result<()> {
    let config = load_config(&path)?;
    let client = connect(&config)?;

    let feed = collect_feed(&config, &client, pages).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&feed).context("Failed to serialize feed")?
        );
        return Ok(());
    }

    print!("{}", format_feed(&feed));
    Ok(())
}

/// Load the first page and then follow the cursor until `pages` pages are
/// loaded or the feed runs out.
pub async fn collect_feed(
    config: &BlogConfig,
    source: &dyn ContentSource,
    pages: usize,
) -> Result<FeedState> {
    let loader = FeedLoader::new(FeedState::initialize(first_page(config, source).await?));

    for page in 1..pages.max(1) {
        match loader
            .load_more(source)
            .await
            .with_context(|| format!("Failed to load feed page {}", page + 1))?
        {
            LoadOutcome::Loaded(count) => {
                tracing::debug!(page = page + 1, count = count, "Loaded feed page");
            }
            LoadOutcome::Exhausted => break,
            LoadOutcome::InFlight | LoadOutcome::Superseded => break,
        }
    }

    Ok(loader.snapshot())
}

fn format_feed(feed: &FeedState) -> String {
    let mut out = String::new();
    for post in feed.items() {
        let date = format_publication_date(post.published_at);
        out.push_str(&format!(
            "{:<11}  {}\n             {} · {}\n",
            date, post.title, post.author, post.href()
        ));
    }

    out.push_str(&format!("\n{} post(s)", feed.len()));
    if feed.has_more() {
        out.push_str(" · more available (use --pages)");
    }
    out.push('\n');
    out
}
