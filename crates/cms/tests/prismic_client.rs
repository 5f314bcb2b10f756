//! Integration tests for the content API client against a mock server.

use pretty_assertions::assert_eq;
use serde_json::json;
use spacetraveling_cms::{ContentSource, PrismicClient, QueryOptions};
use spacetraveling_core::config::CmsConfig;
use spacetraveling_core::{FeedState, FetchError, PageSource};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn doc(uid: &str, title: &str) -> serde_json::Value {
    json!({
        "id": format!("id-{}", uid),
        "uid": uid,
        "type": "posts",
        "first_publication_date": "2021-03-15T19:25:28+0000",
        "data": {
            "title": title,
            "subtitle": "Pensando em sincronização em vez de ciclos de vida",
            "author": "Joseph Oliveira"
        }
    })
}

async fn mock_api() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "refs": [{"id": "master", "ref": "MASTER", "label": "Master", "isMasterRef": true}]
        })))
        .mount(&server)
        .await;
    server
}

fn client(server: &MockServer) -> PrismicClient {
    PrismicClient::new(&CmsConfig::new(format!("{}/api/v2", server.uri())))
        .unwrap()
        .with_access_token(None)
}

#[tokio::test]
async fn test_query_by_type_and_paginate() {
    let server = mock_api().await;
    let next_page = format!("{}/api/v2/documents/search?ref=MASTER&page=2", server.uri());

    Mock::given(method("GET"))
        .and(path("/api/v2/documents/search"))
        .and(query_param("q", "[[at(document.type,\"posts\")]]"))
        .and(query_param("ref", "MASTER"))
        .and(query_param("pageSize", "1"))
        .and(query_param("fetch", "posts.title,posts.subtitle,posts.author"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 1,
            "next_page": next_page,
            "results": [doc("como-utilizar-hooks", "Como utilizar Hooks")]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v2/documents/search"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 2,
            "next_page": null,
            "results": [doc("criando-um-app-cra-do-zero", "Criando um app CRA do zero")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let first = client
        .query_by_type("posts", &QueryOptions::listing("posts", 1))
        .await
        .unwrap();
    assert_eq!(first.cursor.as_deref(), Some(next_page.as_str()));

    let state = FeedState::initialize(first);
    let state = state.load_next(&client).await.unwrap();
    let ids: Vec<&str> = state.items().iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["como-utilizar-hooks", "criando-um-app-cra-do-zero"]);
    assert!(!state.has_more());

    // Exhausted: no further request reaches the server
    let again = state.load_next(&client).await.unwrap();
    assert_eq!(again, state);
}

#[tokio::test]
async fn test_query_by_uid_found() {
    let server = mock_api().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/documents/search"))
        .and(query_param("q", "[[at(my.posts.uid,\"como-utilizar-hooks\")]]"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "next_page": null,
            "results": [{
                "uid": "como-utilizar-hooks",
                "first_publication_date": "2021-03-15T19:25:28+0000",
                "data": {
                    "title": "Como utilizar Hooks",
                    "author": "Joseph Oliveira",
                    "banner": {"url": "https://images.prismic.io/banner.png"},
                    "content": [{"heading": "Intro", "body": [{"type": "paragraph", "text": "Olá mundo", "spans": []}]}]
                }
            }]
        })))
        .mount(&server)
        .await;

    let post = client(&server)
        .query_by_uid("posts", "como-utilizar-hooks")
        .await
        .unwrap();
    assert_eq!(post.title, "Como utilizar Hooks");
    assert_eq!(post.subtitle, "");
    assert_eq!(post.content[0].body[0].text, "Olá mundo");
}

#[tokio::test]
async fn test_query_by_uid_not_found() {
    let server = mock_api().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/documents/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"next_page": null, "results": []})),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .query_by_uid("posts", "nao-existe")
        .await
        .unwrap_err();
    assert_eq!(err, FetchError::NotFound("nao-existe".into()));
}

#[tokio::test]
async fn test_http_error_status() {
    let server = mock_api().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/documents/search"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client(&server)
        .query_by_type("posts", &QueryOptions::listing("posts", 1))
        .await
        .unwrap_err();
    assert_eq!(err, FetchError::HttpStatus(500));
}

#[tokio::test]
async fn test_invalid_json_is_parse_error() {
    let server = mock_api().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/documents/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client(&server)
        .fetch_page(&format!("{}/api/v2/documents/search?page=2", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Parse(_)));
}

#[tokio::test]
async fn test_failed_page_keeps_feed_state() {
    let server = mock_api().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/documents/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = client(&server);
    let state = FeedState::initialize(spacetraveling_core::FeedPage {
        cursor: Some(format!("{}/api/v2/documents/search?page=2", server.uri())),
        items: Vec::new(),
    });
    let before = state.clone();
    assert_eq!(
        state.load_next(&client).await.unwrap_err(),
        FetchError::HttpStatus(503)
    );
    assert_eq!(state, before);
}

#[tokio::test]
async fn test_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let mut config = CmsConfig::new(format!("{}/api/v2", server.uri()));
    config.timeout = Duration::from_millis(100);
    let client = PrismicClient::new(&config).unwrap().with_access_token(None);

    let err = client.fetch_page(&server.uri()).await.unwrap_err();
    assert_eq!(err, FetchError::Timeout);
}

#[tokio::test]
async fn test_list_uids_walks_every_page() {
    let server = mock_api().await;
    let next_page = format!("{}/api/v2/documents/search?ref=MASTER&page=2", server.uri());

    Mock::given(method("GET"))
        .and(path("/api/v2/documents/search"))
        .and(query_param("pageSize", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "next_page": next_page,
            "results": [doc("a", "A"), doc("b", "B")]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/documents/search"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "next_page": null,
            "results": [doc("c", "C")]
        })))
        .mount(&server)
        .await;

    let uids = client(&server).list_uids("posts").await.unwrap();
    assert_eq!(uids, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_access_token_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2"))
        .and(query_param("access_token", "s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "refs": [{"ref": "MASTER", "isMasterRef": true}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/documents/search"))
        .and(query_param("access_token", "s3cret"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"next_page": null, "results": []})),
        )
        .mount(&server)
        .await;

    let client = client(&server).with_access_token(Some("s3cret".into()));
    let page = client
        .query_by_type("posts", &QueryOptions::listing("posts", 1))
        .await
        .unwrap();
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn test_master_ref_resolved_once_per_client() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "refs": [{"ref": "MASTER", "isMasterRef": true}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/documents/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"next_page": null, "results": []})),
        )
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server);
    let options = QueryOptions::listing("posts", 1);
    client.query_by_type("posts", &options).await.unwrap();
    client.query_by_type("posts", &options).await.unwrap();
}

#[tokio::test]
async fn test_missing_master_ref_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"refs": []})))
        .mount(&server)
        .await;

    let err = client(&server)
        .query_by_type("posts", &QueryOptions::listing("posts", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Parse(_)));
}
