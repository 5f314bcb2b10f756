use crate::{html_escape, richtext};
use spacetraveling_core::date::format_publication_date;
use spacetraveling_core::reading_time::estimate_reading_time;
use spacetraveling_core::{FeedState, PostDetail, PostSummary};

/// Site-wide values every page needs
#[derive(Debug, Clone)]
pub struct SiteMeta {
    pub title: String,
    /// Public origin of the deployed site, used for canonical links
    pub base_url: Option<String>,
    /// Served by the local preview server (hot reload, server-side "load more")
    pub preview: bool,
}

impl SiteMeta {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            base_url: None,
            preview: false,
        }
    }

    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn preview(mut self) -> Self {
        self.preview = true;
        self
    }

    /// `<link rel="canonical">` for a site-relative path, empty without a base URL
    fn canonical(&self, path: &str) -> String {
        match self.base_url {
            Some(ref base) => format!(
                r#"<link rel="canonical" href="{}{}">"#,
                html_escape(base.trim_end_matches('/')),
                html_escape(path)
            ),
            None => String::new(),
        }
    }
}

/// `cursor` with any `access_token` query parameter removed.
///
/// The CMS echoes the request query into `next_page`, so a cursor obtained
/// with a build-time token carries it. Cursors that are not URLs pass through.
pub fn public_cursor(cursor: &str) -> String {
    let Ok(mut url) = url::Url::parse(cursor) else {
        return cursor.to_string();
    };
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| *key != "access_token")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    if kept.len() == url.query_pairs().count() {
        return cursor.to_string();
    }

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }
    url.to_string()
}

const LOAD_MORE_LABEL: &str = "Carregar mais posts";
const LOADING_LABEL: &str = "Carregando...";

const STYLES: &str = r#"
        :root {
            --background: #1a1d23;
            --heading: #f8f8f8;
            --body: #d7d7d7;
            --info: #bbbbbb;
            --highlight: #ff57b2;
        }

        * { margin: 0; padding: 0; box-sizing: border-box; }

        body {
            font-family: Inter, -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
            line-height: 1.6;
            color: var(--body);
            background: var(--background);
        }

        a { color: inherit; text-decoration: none; }

        .container {
            max-width: 720px;
            margin: 0 auto;
            padding: 0 1rem;
        }

        .header, .logo { padding: 2.5rem 0 4rem; }

        .preview-badge {
            background: var(--highlight);
            color: #000;
            padding: 0.25rem 0.75rem;
            border-radius: 4px;
            display: inline-block;
            margin-top: 1rem;
            font-weight: bold;
        }

        .posts a { display: block; margin-bottom: 3rem; }
        .posts strong { display: block; font-size: 1.75rem; color: var(--heading); }
        .posts p { margin: 0.5rem 0 1.5rem; font-size: 1.125rem; }

        .post-info { display: flex; gap: 1.5rem; color: var(--info); font-size: 0.875rem; }

        .load-more {
            background: none;
            border: 0;
            color: var(--highlight);
            font-size: 1.125rem;
            font-weight: 600;
            cursor: pointer;
            margin-bottom: 4rem;
        }
        .load-more:disabled { opacity: 0.5; cursor: wait; }

        .post-image { width: 100%; max-height: 400px; object-fit: cover; }

        .post h1 { font-size: 3rem; color: var(--heading); margin: 5rem 0 1.5rem; }
        .post article { margin-top: 4rem; }
        .post article h2 { font-size: 2.25rem; color: var(--heading); margin-bottom: 2rem; }
        .post-content p, .post-content li { margin-bottom: 1rem; font-size: 1.125rem; }
        .post-content ul, .post-content ol { padding-left: 1.5rem; }
        .post-content pre { overflow-x: auto; padding: 1rem; background: #000; }
        .post-content img { max-width: 100%; }

        .message { padding: 4rem 0; font-size: 1.5rem; color: var(--heading); }
"#;

const RELOAD_SCRIPT: &str = r#"<script>
        // Hot reload via Server-Sent Events
        const eventSource = new EventSource('/_reload');
        eventSource.onmessage = () => {
            console.log('Reloading...');
            location.reload();
        };
        eventSource.onerror = () => {
            console.log('Preview server disconnected');
            eventSource.close();
        };
    </script>"#;

fn layout(site: &SiteMeta, page_title: &str, head_extra: &str, body: &str, scripts: &str) -> String {
    let (badge, reload) = if site.preview {
        (
            r#"<div class="preview-badge">PREVIEW</div>"#,
            RELOAD_SCRIPT,
        )
    } else {
        ("", "")
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{}</title>
    {}
    <style>{}</style>
</head>
<body>
    {}
    {}
    {}
    {}
</body>
</html>"#,
        html_escape(page_title),
        head_extra,
        STYLES,
        badge,
        body,
        scripts,
        reload
    )
}

fn logo(site: &SiteMeta) -> String {
    format!(
        r#"<a href="/"><img src="/logo.svg" alt="{}" width="239" height="26"></a>"#,
        html_escape(&site.title)
    )
}

/// One entry of the post listing
pub fn render_post_card(post: &PostSummary) -> String {
    format!(
        r#"<a href="{}">
                <strong>{}</strong>
                <p>{}</p>
                <div class="post-info">
                    <time>{}</time>
                    <span>{}</span>
                </div>
            </a>"#,
        html_escape(&post.href()),
        html_escape(&post.title),
        html_escape(&post.subtitle),
        format_publication_date(post.published_at),
        html_escape(&post.author)
    )
}

/// The home page: every post loaded so far and, while the feed has a
/// cursor, the "load more" control.
///
/// In the built site the control carries the cursor and `feed.js` fetches
/// the next page in the browser. In preview it posts back to the server,
/// which owns the feed state.
pub fn render_listing(site: &SiteMeta, feed: &FeedState) -> String {
    let cards: String = feed.items().iter().map(render_post_card).collect();

    let (load_more, scripts) = match feed.cursor() {
        Some(_) if site.preview => (
            format!(
                r#"<form method="post" action="/more"><button type="submit" class="load-more">{}</button></form>"#,
                LOAD_MORE_LABEL
            ),
            String::new(),
        ),
        Some(cursor) => (
            format!(
                r#"<button type="button" class="load-more" data-next-page="{}">{}</button>"#,
                html_escape(&public_cursor(cursor)),
                LOAD_MORE_LABEL
            ),
            r#"<script src="/feed.js"></script>"#.to_string(),
        ),
        None => (String::new(), String::new()),
    };

    let body = format!(
        r#"<main class="container">
        <div class="logo">{}</div>
        <div class="posts">
            {}
        </div>
        {}
    </main>"#,
        logo(site),
        cards,
        load_more
    );

    layout(site, &site.title, &site.canonical("/"), &body, &scripts)
}

/// A single post with banner, meta line, reading time, and content sections
pub fn render_post(site: &SiteMeta, post: &PostDetail) -> String {
    let banner = match post.banner_url {
        Some(ref url) => format!(
            r#"<img src="{}" alt="imagem" class="post-image">"#,
            html_escape(url)
        ),
        None => String::new(),
    };

    let sections: String = post
        .content
        .iter()
        .map(|block| {
            format!(
                r#"<article>
                <h2>{}</h2>
                <div class="post-content">{}</div>
            </article>"#,
                html_escape(&block.heading),
                richtext::as_html(&block.body)
            )
        })
        .collect();

    let body = format!(
        r#"<div class="container"><div class="header">{}</div></div>
    {}
    <main class="container post">
        <h1>{}</h1>
        <div class="post-info">
            <time>{}</time>
            <span>{}</span>
            <span>{} min</span>
        </div>
        {}
    </main>"#,
        logo(site),
        banner,
        html_escape(&post.title),
        format_publication_date(post.published_at),
        html_escape(&post.author),
        estimate_reading_time(&post.content),
        sections
    );

    let title = format!("{} | {}", post.title, site.title);
    layout(site, &title, &site.canonical(&post.href()), &body, "")
}

/// Placeholder shown while a post page is generated on demand. It reloads
/// itself every `refresh_secs` to pick up the result.
pub fn render_loading(site: &SiteMeta, refresh_secs: u32) -> String {
    let head = format!(r#"<meta http-equiv="refresh" content="{}">"#, refresh_secs);
    let body = format!(
        r#"<div class="container"><div class="header">{}</div><div class="message">{}</div></div>"#,
        logo(site),
        LOADING_LABEL
    );
    layout(site, &site.title, &head, &body, "")
}

pub fn render_not_found(site: &SiteMeta, slug: Option<&str>) -> String {
    let detail = match slug {
        Some(slug) => format!("Post <code>{}</code> não encontrado.", html_escape(slug)),
        None => "Página não encontrada.".to_string(),
    };
    let body = format!(
        r#"<div class="container"><div class="header">{}</div><div class="message">{}</div></div>"#,
        logo(site),
        detail
    );
    layout(site, &format!("404 | {}", site.title), "", &body, "")
}

/// Error page for the preview server
pub fn render_error(site: &SiteMeta, heading: &str, detail: &str) -> String {
    let body = format!(
        r#"<div class="container"><div class="header">{}</div><h1>{}</h1><pre>{}</pre></div>"#,
        logo(site),
        html_escape(heading),
        html_escape(detail)
    );
    layout(site, &format!("Erro | {}", site.title), "", &body, "")
}
