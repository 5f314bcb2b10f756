pub mod build;
pub mod init;
pub mod posts;
pub mod preview;
pub mod validate;

use anyhow::{Context, Result};
use spacetraveling_cms::{ContentSource, PrismicClient, QueryOptions};
use spacetraveling_core::config::{BlogConfig, parse_blog_toml};
use spacetraveling_core::FeedPage;
use std::path::Path;

pub const CONFIG_FILE: &str = "blog.toml";

/// Load and validate blog.toml from a blog directory
pub fn load_config(path: &Path) -> Result<BlogConfig> {
    if !path.exists() {
        anyhow::bail!(
            "Blog directory does not exist: {}\nRun 'spacetraveling init {}' first",
            path.display(),
            path.display()
        );
    }

    let config_path = path.join(CONFIG_FILE);
    if !config_path.exists() {
        anyhow::bail!(
            "{} not found in {}\nRun 'spacetraveling init {}' first",
            CONFIG_FILE,
            path.display(),
            path.display()
        );
    }

    parse_blog_toml(&config_path).with_context(|| format!("Failed to parse {}", CONFIG_FILE))
}

/// Content API client for this invocation
pub fn connect(config: &BlogConfig) -> Result<PrismicClient> {
    PrismicClient::new(&config.cms).context("Failed to create content API client")
}

/// First page of the listing as the home page shows it
pub async fn first_page(config: &BlogConfig, source: &dyn ContentSource) -> Result<FeedPage> {
    let options = QueryOptions::listing(&config.cms.document_type, config.cms.page_size);
    source
        .query_by_type(&config.cms.document_type, &options)
        .await
        .with_context(|| {
            format!(
                "Failed to query '{}' documents from {}",
                config.cms.document_type, config.cms.endpoint
            )
        })
}

#[cfg(test)]
pub(crate) mod testing {
    use spacetraveling_core::config::{BlogConfig, parse_blog_toml_str};

    pub fn config(extra_site: &str) -> BlogConfig {
        parse_blog_toml_str(&format!(
            r#"
[site]
title = "spacetraveling"
{}

[cms]
endpoint = "https://spacetraveling.cdn.prismic.io/api/v2"
page_size = 1
"#,
            extra_site
        ))
        .unwrap()
    }
}
