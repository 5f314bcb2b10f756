use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_DOCUMENT_TYPE: &str = "posts";
pub const DEFAULT_PAGE_SIZE: u32 = 1;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_ACCESS_TOKEN_ENV: &str = "PRISMIC_ACCESS_TOKEN";
const MAX_PAGE_SIZE: u32 = 100;

/// Complete blog configuration (blog.toml)
#[derive(Debug, Clone, Serialize)]
pub struct BlogConfig {
    pub site: SiteConfig,
    pub cms: CmsConfig,
}

/// Site presentation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Directory copied verbatim into the built site (logo, favicon, css)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub static_dir: Option<PathBuf>,
}

/// Content backend settings
#[derive(Debug, Clone, Serialize)]
pub struct CmsConfig {
    pub endpoint: String,
    pub document_type: String,
    pub page_size: u32,
    pub access_token_env: String,
    pub timeout: Duration,
}

impl CmsConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            document_type: DEFAULT_DOCUMENT_TYPE.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            access_token_env: DEFAULT_ACCESS_TOKEN_ENV.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Build-time credential, read from the configured environment variable
    pub fn access_token(&self) -> Option<String> {
        std::env::var(&self.access_token_env)
            .ok()
            .filter(|token| !token.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    site: RawSite,
    cms: RawCms,
}

#[derive(Debug, Deserialize)]
struct RawSite {
    title: String,
    base_url: Option<String>,
    static_dir: Option<String>, // Convert to PathBuf
}

#[derive(Debug, Deserialize)]
struct RawCms {
    endpoint: String,
    document_type: Option<String>,
    page_size: Option<u32>,
    access_token_env: Option<String>,
    timeout_secs: Option<u64>,
}

/// Parse blog.toml from a file path
pub fn parse_blog_toml<P: AsRef<Path>>(path: P) -> Result<BlogConfig> {
    let content = fs::read_to_string(path)?;
    parse_blog_toml_str(&content)
}

/// Parse blog.toml from a string (useful for testing)
pub fn parse_blog_toml_str(content: &str) -> Result<BlogConfig> {
    let raw: RawConfig = toml::from_str(content)?;

    if raw.site.title.trim().is_empty() {
        return Err(Error::ConfigParse("site.title must not be empty".into()));
    }
    if let Some(ref base_url) = raw.site.base_url {
        validate_http_url(base_url, "site.base_url")?;
    }
    let static_dir = match raw.site.static_dir {
        Some(dir) => Some(validate_path(&dir, "site.static_dir")?),
        None => None,
    };

    validate_http_url(&raw.cms.endpoint, "cms.endpoint")?;

    let document_type = raw
        .cms
        .document_type
        .unwrap_or_else(|| DEFAULT_DOCUMENT_TYPE.to_string());
    if document_type.trim().is_empty() {
        return Err(Error::ConfigParse(
            "cms.document_type must not be empty".into(),
        ));
    }

    let page_size = raw.cms.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(Error::ConfigParse(format!(
            "cms.page_size must be between 1 and {}, got {}",
            MAX_PAGE_SIZE, page_size
        )));
    }

    let timeout_secs = raw.cms.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(Error::ConfigParse("cms.timeout_secs must be > 0".into()));
    }

    Ok(BlogConfig {
        site: SiteConfig {
            title: raw.site.title,
            base_url: raw.site.base_url,
            static_dir,
        },
        cms: CmsConfig {
            endpoint: raw.cms.endpoint.trim_end_matches('/').to_string(),
            document_type,
            page_size,
            access_token_env: raw
                .cms
                .access_token_env
                .unwrap_or_else(|| DEFAULT_ACCESS_TOKEN_ENV.to_string()),
            timeout: std::time::Duration::from_secs(timeout_secs),
        },
    })
}

fn validate_http_url(value: &str, field_name: &str) -> Result<()> {
    let parsed = url::Url::parse(value).map_err(|e| {
        Error::ConfigParse(format!("Invalid URL in '{}': '{}' ({})", field_name, value, e))
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(Error::ConfigParse(format!(
            "Unsupported scheme '{}' in '{}': expected http or https",
            other, field_name
        ))),
    }
}

/// Validate and convert a path string to PathBuf.
///
/// Rejects absolute paths and parent directory references (`..`) so a
/// blog.toml cannot point the build at files outside the blog directory.
fn validate_path(path_str: &str, field_name: &str) -> Result<PathBuf> {
    let path = Path::new(path_str);

    if path_str.trim().is_empty() {
        return Err(Error::ConfigParse(format!(
            "Empty path in '{}' field",
            field_name
        )));
    }

    if path.is_absolute() {
        return Err(Error::ConfigParse(format!(
            "Absolute paths not allowed in '{}': '{}'. Use relative paths only.",
            field_name, path_str
        )));
    }

    for component in path.components() {
        if component == std::path::Component::ParentDir {
            return Err(Error::ConfigParse(format!(
                "Parent directory references (..) not allowed in '{}': '{}'",
                field_name, path_str
            )));
        }
    }

    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r##"
[site]
title = "spacetraveling"

[cms]
endpoint = "https://spacetraveling.cdn.prismic.io/api/v2"
"##;

    #[test]
    fn test_parse_minimal_config_applies_defaults() {
        let config = parse_blog_toml_str(MINIMAL).unwrap();
        assert_eq!(config.site.title, "spacetraveling");
        assert_eq!(config.site.static_dir, None);
        assert_eq!(config.cms.document_type, "posts");
        assert_eq!(config.cms.page_size, 1);
        assert_eq!(config.cms.access_token_env, "PRISMIC_ACCESS_TOKEN");
        assert_eq!(config.cms.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r##"
[site]
title = "Blog"
base_url = "https://blog.example.com"
static_dir = "public"

[cms]
endpoint = "https://repo.cdn.prismic.io/api/v2/"
document_type = "articles"
page_size = 20
access_token_env = "BLOG_TOKEN"
timeout_secs = 5
"##;
        let config = parse_blog_toml_str(toml).unwrap();
        assert_eq!(config.site.static_dir, Some(PathBuf::from("public")));
        assert_eq!(config.cms.endpoint, "https://repo.cdn.prismic.io/api/v2");
        assert_eq!(config.cms.document_type, "articles");
        assert_eq!(config.cms.page_size, 20);
        assert_eq!(config.cms.access_token_env, "BLOG_TOKEN");
        assert_eq!(config.cms.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_rejects_bad_endpoint() {
        let toml = MINIMAL.replace("https://spacetraveling", "ftp://spacetraveling");
        let err = parse_blog_toml_str(&toml).unwrap_err();
        assert!(err.to_string().contains("cms.endpoint"));

        let toml = MINIMAL.replace("https://spacetraveling.cdn.prismic.io/api/v2", "not a url");
        assert!(parse_blog_toml_str(&toml).is_err());
    }

    #[test]
    fn test_rejects_page_size_out_of_range() {
        let toml = format!("{}page_size = 0\n", MINIMAL);
        let err = parse_blog_toml_str(&toml).unwrap_err();
        assert!(err.to_string().contains("page_size"));

        let toml = format!("{}page_size = 101\n", MINIMAL);
        assert!(parse_blog_toml_str(&toml).is_err());
    }

    #[test]
    fn test_rejects_empty_title() {
        let toml = MINIMAL.replace("title = \"spacetraveling\"", "title = \"  \"");
        assert!(parse_blog_toml_str(&toml).is_err());
    }

    #[test]
    fn test_validate_path_rejects_traversal() {
        let result = validate_path("../../etc", "site.static_dir");
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Parent directory references")
        );
        let result = validate_path("/var/www", "site.static_dir");
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Absolute paths not allowed")
        );
        assert!(validate_path("   ", "site.static_dir").is_err());
        assert!(validate_path("public/img", "site.static_dir").is_ok());
    }

    #[test]
    fn test_static_dir_traversal_in_config() {
        let toml = MINIMAL.replace(
            "title = \"spacetraveling\"",
            "title = \"spacetraveling\"\nstatic_dir = \"../secrets\"",
        );
        let err = parse_blog_toml_str(&toml).unwrap_err();
        assert!(err.to_string().contains("site.static_dir"));
    }

    #[test]
    fn test_missing_cms_section() {
        let err = parse_blog_toml_str("[site]\ntitle = \"x\"\n").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }
}
