use anyhow::Result;
use std::path::PathBuf;

use super::{connect, first_page, load_config};

pub async fn run(path: PathBuf, online: bool) -> Result<()> {
    println!("Validating blog at: {}", path.display());

    let config = load_config(&path)?;

    println!("✓ blog.toml valid");
    println!("  Site: {}", config.site.title);
    println!(
        "  CMS: {} (type '{}', {} per page)",
        config.cms.endpoint, config.cms.document_type, config.cms.page_size
    );

    if let Some(ref static_dir) = config.site.static_dir
        && !path.join(static_dir).is_dir()
    {
        println!("  ⚠ static_dir '{}' does not exist", static_dir.display());
    }

    if config.cms.access_token().is_none() {
        println!(
            "  ℹ {} not set; querying without an access token",
            config.cms.access_token_env
        );
    }

    if online {
        let client = connect(&config)?;
        let page = first_page(&config, &client).await?;
        println!("✓ CMS reachable");
        println!(
            "  First page: {} post(s){}",
            page.items.len(),
            if page.cursor.is_some() {
                ", more available"
            } else {
                ""
            }
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn test_validate_offline_accepts_initialized_blog() {
        let dir = tempfile::tempdir().unwrap();
        crate::commands::init::run(dir.path().to_path_buf(), "Blog".into(), None)
            .await
            .unwrap();
        run(dir.path().to_path_buf(), false).await.unwrap();
    }

    #[tokio::test]
    async fn test_validate_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("blog.toml"),
            "[site]\ntitle = \"Blog\"\n\n[cms]\nendpoint = \"ftp://nope\"\n",
        )
        .unwrap();
        let err = run(dir.path().to_path_buf(), false).await.unwrap_err();
        assert!(format!("{:#}", err).contains("cms.endpoint"));
    }
}
