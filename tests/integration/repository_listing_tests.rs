use super::test_helpers::*;
use bitbucket_reporter::ReporterError;
use serde_json::json;

/// Cloud pages chain through the `next` URL until a page omits it
#[tokio::test]
async fn test_cloud_repositories_follow_next_link() {
    let mut server = mockito::Server::new_async().await;
    let next = format!("{}/2.0/repositories/acme?pagelen=2&page=2", server.url());

    let first = mock_page(
        &mut server,
        "/2.0/repositories/acme",
        "pagelen=2",
        json!({
            "values": [cloud_repo_json("acme/web"), cloud_repo_json("acme/api")],
            "pagelen": 2,
            "page": 1,
            "next": next
        }),
        1,
    )
    .await;
    let second = mock_page(
        &mut server,
        "/2.0/repositories/acme",
        "pagelen=2&page=2",
        json!({
            "values": [cloud_repo_json("acme/docs")],
            "pagelen": 2,
            "page": 2
        }),
        1,
    )
    .await;

    let requester = cloud_requester(&server);
    let repositories = requester.list_repositories(Some("acme")).await.unwrap();

    let names: Vec<_> = repositories
        .iter()
        .map(|r| r.identifier().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["acme/web", "acme/api", "acme/docs"]);

    first.assert_async().await;
    second.assert_async().await;
}

/// `links.next.href` is honoured when the top-level `next` is absent
#[tokio::test]
async fn test_cloud_repositories_follow_nested_next_link() {
    let mut server = mockito::Server::new_async().await;
    let next = format!("{}/2.0/repositories/acme?pagelen=2&page=2", server.url());

    let _first = mock_page(
        &mut server,
        "/2.0/repositories/acme",
        "pagelen=2",
        json!({
            "values": [cloud_repo_json("acme/web"), cloud_repo_json("acme/api")],
            "links": {"next": {"href": next}}
        }),
        1,
    )
    .await;
    let _second = mock_page(
        &mut server,
        "/2.0/repositories/acme",
        "pagelen=2&page=2",
        json!({"values": [cloud_repo_json("acme/docs")]}),
        1,
    )
    .await;

    let repositories = cloud_requester(&server)
        .list_repositories(Some("acme"))
        .await
        .unwrap();
    assert_eq!(repositories.len(), 3);
}

/// Server pages keyed on `repositories` are accepted like `values`
#[tokio::test]
async fn test_server_repositories_under_repositories_key() {
    let mut server = mockito::Server::new_async().await;
    let page = mock_page(
        &mut server,
        "/rest/api/2.0/projects/OPS/repos",
        "limit=2",
        json!({
            "repositories": [server_repo_json("OPS", "web")],
            "isLastPage": true
        }),
        1,
    )
    .await;

    let repositories = server_requester(&server)
        .list_repositories(Some("OPS"))
        .await
        .unwrap();

    assert_eq!(repositories.len(), 1);
    assert_eq!(repositories[0].slug.as_deref(), Some("web"));
    assert_eq!(repositories[0].resolve_identity().unwrap().owner, "OPS");
    page.assert_async().await;
}

/// A failing API 2.0 listing is retried once against API 1.0
#[tokio::test]
async fn test_server_falls_back_to_api_1() {
    let mut server = mockito::Server::new_async().await;
    let v2 = mock_failure(&mut server, "/rest/api/2.0/repos", "limit=2", 404, 1).await;
    let v1 = mock_page(
        &mut server,
        "/rest/api/1.0/repos",
        "limit=2",
        json!({
            "values": [server_repo_json("OPS", "web")],
            "isLastPage": true,
            "start": 0,
            "size": 1
        }),
        1,
    )
    .await;

    let repositories = server_requester(&server)
        .list_repositories(None)
        .await
        .unwrap();

    assert_eq!(repositories.len(), 1);
    v2.assert_async().await;
    v1.assert_async().await;
}

/// Items gathered from API 2.0 before it failed are discarded on fallback
#[tokio::test]
async fn test_fallback_discards_partial_results() {
    let mut server = mockito::Server::new_async().await;
    let _v2_first = mock_page(
        &mut server,
        "/rest/api/2.0/projects/OPS/repos",
        "limit=2",
        json!({
            "values": [server_repo_json("OPS", "a"), server_repo_json("OPS", "b")],
            "isLastPage": false,
            "nextPageStart": 2
        }),
        1,
    )
    .await;
    let _v2_second =
        mock_failure(&mut server, "/rest/api/2.0/projects/OPS/repos", "limit=2&start=2", 500, 1)
            .await;
    let _v1 = mock_page(
        &mut server,
        "/rest/api/1.0/projects/OPS/repos",
        "limit=2",
        json!({"values": [server_repo_json("OPS", "only")], "isLastPage": true}),
        1,
    )
    .await;

    let repositories = server_requester(&server)
        .list_repositories(Some("OPS"))
        .await
        .unwrap();

    let slugs: Vec<_> = repositories.iter().filter_map(|r| r.slug.clone()).collect();
    assert_eq!(slugs, vec!["only"]);
}

/// The fallback is tried once; a second failure propagates
#[tokio::test]
async fn test_server_fallback_failure_propagates() {
    let mut server = mockito::Server::new_async().await;
    let _v2 = mock_failure(&mut server, "/rest/api/2.0/repos", "limit=2", 404, 1).await;
    let v1 = mock_failure(&mut server, "/rest/api/1.0/repos", "limit=2", 403, 1).await;

    let err = server_requester(&server)
        .list_repositories(None)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(403));
    v1.assert_async().await;
}

/// Cloud has no fallback; the error carries URL, status and pretty JSON body
#[tokio::test]
async fn test_cloud_failure_is_enriched() {
    let mut server = mockito::Server::new_async().await;
    let _mock = mock_failure(&mut server, "/2.0/repositories/acme", "pagelen=2", 500, 1).await;

    let err = cloud_requester(&server)
        .list_repositories(Some("acme"))
        .await
        .unwrap_err();

    match &err {
        ReporterError::Transport { url, status, body } => {
            assert!(url.ends_with("/2.0/repositories/acme?pagelen=2"));
            assert_eq!(*status, 500);
            assert!(body.contains("\"message\": \"endpoint unavailable\""));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

/// Non-JSON error bodies are kept as text and truncated
#[tokio::test]
async fn test_text_error_body_is_truncated() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/2.0/repositories/acme")
        .match_query(mockito::Matcher::Any)
        .with_status(502)
        .with_header("content-type", "text/html")
        .with_body("x".repeat(5000))
        .create_async()
        .await;

    let err = cloud_requester(&server)
        .list_repositories(Some("acme"))
        .await
        .unwrap_err();
    match err {
        ReporterError::Transport { body, .. } => {
            assert!(body.ends_with("... (truncated)"));
            assert!(body.len() < 5000);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

/// Requests carry the bearer token and ask for JSON
#[tokio::test]
async fn test_requests_are_authenticated() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/rest/api/2.0/repos")
        .match_query(mockito::Matcher::Any)
        .match_header("authorization", format!("Bearer {TOKEN}").as_str())
        .match_header("accept", "application/json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"values": [], "isLastPage": true}).to_string())
        .expect(1)
        .create_async()
        .await;

    let repositories = server_requester(&server)
        .list_repositories(None)
        .await
        .unwrap();

    assert!(repositories.is_empty());
    mock.assert_async().await;
}

/// The shared transport also posts JSON and reports failures the same way
#[tokio::test]
async fn test_client_post_round_trip() {
    use bitbucket_reporter::bitbucket::BitbucketClient;
    use bitbucket_reporter::config::{BitbucketSettings, FetchPolicy};

    let mut server = mockito::Server::new_async().await;
    let ok = server
        .mock("POST", "/rest/api/1.0/search")
        .match_header("content-type", "application/json")
        .match_body(mockito::Matcher::Json(json!({"query": "web"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"values": [server_repo_json("OPS", "web")]}).to_string())
        .expect(1)
        .create_async()
        .await;
    let _denied = server
        .mock("POST", "/rest/api/1.0/forbidden")
        .with_status(403)
        .with_header("content-type", "text/plain")
        .with_body("no access")
        .create_async()
        .await;

    let client =
        BitbucketClient::new(BitbucketSettings::new(server.url(), TOKEN), &FetchPolicy::default())
            .unwrap();

    let found: serde_json::Value = client
        .post(
            &format!("{}/rest/api/1.0/search", server.url()),
            &json!({"query": "web"}),
        )
        .await
        .unwrap();
    assert_eq!(found["values"][0]["slug"], "web");
    ok.assert_async().await;

    let err = client
        .post::<_, serde_json::Value>(
            &format!("{}/rest/api/1.0/forbidden", server.url()),
            &json!({}),
        )
        .await
        .unwrap_err();
    match err {
        ReporterError::Transport { status, body, .. } => {
            assert_eq!(status, 403);
            assert_eq!(body, "no access");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
