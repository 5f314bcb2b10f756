// Static site generation: rich text rendering, page templates, site assembly

pub mod feed_js;
pub mod richtext;
pub mod templates;

use spacetraveling_core::{FeedState, PostDetail};

pub use feed_js::generate_feed_js;
pub use templates::{
    SiteMeta, render_error, render_listing, render_loading, render_not_found, render_post,
};

pub struct GeneratedSite {
    pub pages: Vec<(String, String)>,   // (path, html)
    pub assets: Vec<(String, Vec<u8>)>, // (path, data)
}

/// Output path of a post page
pub fn post_page_path(id: &str) -> String {
    format!("post/{}/index.html", id)
}

/// Render the listing, every given post, and the 404 page.
///
/// Posts not given here have no page in the output; a static host serves
/// `404.html` for them.
pub fn generate_site(site: &SiteMeta, feed: &FeedState, posts: &[PostDetail]) -> GeneratedSite {
    let mut pages = Vec::with_capacity(posts.len() + 2);
    pages.push(("index.html".to_string(), render_listing(site, feed)));

    for post in posts {
        pages.push((post_page_path(&post.id), render_post(site, post)));
    }

    pages.push(("404.html".to_string(), render_not_found(site, None)));

    tracing::info!(pages = pages.len(), posts = posts.len(), "Generated site");

    GeneratedSite {
        pages,
        assets: vec![("feed.js".to_string(), generate_feed_js().as_bytes().to_vec())],
    }
}

/// HTML-escape a string to prevent XSS attacks
///
/// Escapes: & < > " '
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
