use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use super::CONFIG_FILE;

const DEFAULT_ENDPOINT: &str = "https://your-repo.cdn.prismic.io/api/v2";

const LOGO_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="239" height="26" viewBox="0 0 239 26"><text x="0" y="20" fill="#f8f8f8" font-family="sans-serif" font-size="22">spacetraveling<tspan fill="#ff57b2">.</tspan></text></svg>
"##;

/// Escape a string for safe inclusion in a TOML basic string
///
/// The template is written by hand to keep its comments, so values are
/// escaped here instead of going through the toml serializer.
///
/// See: https://toml.io/en/v1.0.0#string
fn toml_escape_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\x08', "\\b")
        .replace('\x0C', "\\f")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

fn config_template(title: &str, endpoint: &str) -> String {
    format!(
        r#"# spacetraveling blog configuration

[site]
title = "{}"
# Public URL of the deployed site
# base_url = "https://blog.example.com"
# Files copied as-is into the build (logo.svg, favicon, ...)
static_dir = "public"

[cms]
# Content API endpoint of your repository
endpoint = "{}"
# Custom type holding the posts
document_type = "posts"
# Posts per listing page ("load more" fetches the next page)
page_size = 1
# Environment variable holding the API access token, if the repository is private
access_token_env = "PRISMIC_ACCESS_TOKEN"
timeout_secs = 30
"#,
        toml_escape_string(title),
        toml_escape_string(endpoint)
    )
}

/// Create a blog directory with a starter blog.toml and static assets
pub async fn run(path: PathBuf, title: String, endpoint: Option<String>) -> Result<()> {
    println!("📝 Initializing blog at: {}", path.display());

    let config_path = path.join(CONFIG_FILE);
    if config_path.exists() {
        anyhow::bail!(
            "{} already exists in {}; refusing to overwrite",
            CONFIG_FILE,
            path.display()
        );
    }

    let endpoint = endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
    fs::create_dir_all(path.join("public")).context("Failed to create public directory")?;
    fs::write(&config_path, config_template(&title, &endpoint))
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    let logo_path = path.join("public").join("logo.svg");
    if !logo_path.exists() {
        fs::write(&logo_path, LOGO_SVG).context("Failed to write logo.svg")?;
    }

    println!("   ✓ Created {}", CONFIG_FILE);
    println!("   ✓ Created public/logo.svg");
    println!();
    println!("Next steps:");
    println!("   1. Set cms.endpoint in {}", config_path.display());
    println!("   2. spacetraveling preview {} --offline", path.display());
    println!("   3. spacetraveling build {} --output dist", path.display());

    Ok(())
}
