use super::test_helpers::*;
use bitbucket_reporter::bitbucket::PullRequestState;
use bitbucket_reporter::ReporterError;
use serde_json::json;

/// Cloud asks for merged pull requests and still filters client-side
#[tokio::test]
async fn test_cloud_merged_pull_requests() {
    let mut server = mockito::Server::new_async().await;
    let mock = mock_page(
        &mut server,
        "/2.0/repositories/acme/web/pullrequests",
        "state=MERGED&pagelen=2",
        json!({
            "values": [cloud_pr_json(1, "MERGED"), cloud_pr_json(2, "DECLINED")],
            "pagelen": 2
        }),
        1,
    )
    .await;
    // Full page without `next` or `page`: nothing more to guess from
    let repo = repository(cloud_repo_json("acme/web"));

    let prs = cloud_requester(&server)
        .list_merged_pull_requests(&repo)
        .await
        .unwrap();

    assert_eq!(prs.len(), 1);
    assert_eq!(prs[0].id, 1);
    assert_eq!(prs[0].state, PullRequestState::Merged);
    assert_eq!(prs[0].author, "Cloud Author");
    assert_eq!(
        prs[0].url.as_deref(),
        Some("https://bitbucket.org/acme/web/pull-requests/1")
    );
    assert!(prs[0].closed_at.is_some());
    mock.assert_async().await;
}

/// `isLastPage=false` pages through pull requests by `nextPageStart`
#[tokio::test]
async fn test_server_pull_requests_paginate() {
    let mut server = mockito::Server::new_async().await;
    let path = "/rest/api/2.0/projects/OPS/repos/web/pull-requests";
    let _first = mock_page(
        &mut server,
        path,
        "state=MERGED&limit=2",
        json!({
            "values": [server_pr_json(1, "MERGED", true), server_pr_json(2, "MERGED", true)],
            "isLastPage": false,
            "nextPageStart": 2
        }),
        1,
    )
    .await;
    let last = mock_page(
        &mut server,
        path,
        "state=MERGED&limit=2&start=2",
        json!({
            "values": [server_pr_json(3, "MERGED", true)],
            "isLastPage": true
        }),
        1,
    )
    .await;

    let repo = repository(server_repo_json("OPS", "web"));
    let prs = server_requester(&server)
        .list_merged_pull_requests(&repo)
        .await
        .unwrap();

    let ids: Vec<u64> = prs.iter().map(|pr| pr.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert!(prs.iter().all(|pr| pr.author == "Server Author"));
    last.assert_async().await;
}

/// API 2.0 failure on Server falls back to unfiltered API 1.0 and filters locally
#[tokio::test]
async fn test_server_pull_requests_fall_back_to_api_1() {
    let mut server = mockito::Server::new_async().await;
    let v2 = mock_failure(
        &mut server,
        "/rest/api/2.0/projects/OPS/repos/web/pull-requests",
        "state=MERGED&limit=2",
        404,
        1,
    )
    .await;
    let v1 = mock_page(
        &mut server,
        "/rest/api/1.0/projects/OPS/repos/web/pull-requests",
        "state=ALL&limit=2",
        json!({
            "values": [
                server_pr_json(10, "MERGED", true),
                server_pr_json(11, "OPEN", true),
                server_pr_json(12, "DECLINED", true),
                server_pr_json(13, "OPEN", false)
            ],
            "isLastPage": true
        }),
        1,
    )
    .await;

    let repo = repository(server_repo_json("OPS", "web"));
    let prs = server_requester(&server)
        .list_merged_pull_requests(&repo)
        .await
        .unwrap();

    let ids: Vec<u64> = prs.iter().map(|pr| pr.id).collect();
    assert_eq!(ids, vec![10, 11]);
    assert!(prs.iter().all(|pr| pr.is_merged()));
    v2.assert_async().await;
    v1.assert_async().await;
}

/// Once API 2.0 has served a page, a later page failure propagates instead of
/// restarting on API 1.0
#[tokio::test]
async fn test_server_later_page_failure_does_not_fall_back() {
    let mut server = mockito::Server::new_async().await;
    let path = "/rest/api/2.0/projects/OPS/repos/web/pull-requests";
    let first = mock_page(
        &mut server,
        path,
        "state=MERGED&limit=2",
        json!({
            "values": [server_pr_json(1, "MERGED", true), server_pr_json(2, "MERGED", true)],
            "isLastPage": false,
            "nextPageStart": 2
        }),
        1,
    )
    .await;
    let second = mock_failure(&mut server, path, "state=MERGED&limit=2&start=2", 500, 1).await;
    let v1 = mock_page(
        &mut server,
        "/rest/api/1.0/projects/OPS/repos/web/pull-requests",
        "state=ALL&limit=2",
        json!({"values": [server_pr_json(9, "MERGED", true)], "isLastPage": true}),
        0,
    )
    .await;

    let repo = repository(server_repo_json("OPS", "web"));
    let err = server_requester(&server)
        .list_merged_pull_requests(&repo)
        .await
        .unwrap_err();

    assert!(matches!(err, ReporterError::Transport { status: 500, .. }));
    first.assert_async().await;
    second.assert_async().await;
    v1.assert_async().await;
}

/// A single-repository call propagates transport errors
#[tokio::test]
async fn test_single_repository_failure_propagates() {
    let mut server = mockito::Server::new_async().await;
    let _mock = mock_failure(
        &mut server,
        "/2.0/repositories/acme/web/pullrequests",
        "state=MERGED&pagelen=2",
        500,
        1,
    )
    .await;

    let repo = repository(cloud_repo_json("acme/web"));
    let err = cloud_requester(&server)
        .list_merged_pull_requests(&repo)
        .await
        .unwrap_err();

    assert!(matches!(err, ReporterError::Transport { status: 500, .. }));
}

/// Identity is taken from the self link when `full_name` is absent
#[tokio::test]
async fn test_identity_from_self_link_addresses_requests() {
    let mut server = mockito::Server::new_async().await;
    let mock = mock_page(
        &mut server,
        "/rest/api/2.0/projects/P/repos/R/pull-requests",
        "state=MERGED&limit=2",
        json!({"values": [], "isLastPage": true}),
        1,
    )
    .await;

    let repo = repository(json!({
        "name": "R",
        "links": {"self": {"href": "https://x/rest/api/1.0/projects/P/repos/R"}}
    }));
    let prs = server_requester(&server)
        .list_merged_pull_requests(&repo)
        .await
        .unwrap();

    assert!(prs.is_empty());
    mock.assert_async().await;
}
