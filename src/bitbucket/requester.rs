//! Repository and merged pull request enumeration across both Bitbucket
//! dialects, with an in-memory cache for batch fetches.

use crate::bitbucket::cache::{PullRequestCache, RepositoryPullRequests};
use crate::bitbucket::client::BitbucketClient;
use crate::bitbucket::dialect::{ApiShape, Dialect};
use crate::bitbucket::pagination::{
    derive_next_url, extract_items, set_query_param, Continuation, PageMeta,
};
use crate::bitbucket::pull_request::PullRequest;
use crate::bitbucket::repository::{Repository, RepositoryIdentity};
use crate::config::{FetchPolicy, SettingsSource};
use crate::errors::{ReporterError, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

/// Where in a page walk a failed API 2.0 request may still fall back to 1.0
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FallbackPoint {
    /// Any page; repository listings restart from scratch on 1.0
    AnyPage,
    /// Only the first page; later failures on pull requests propagate
    FirstPage,
}

/// A failed page walk and how many pages had already been fetched
struct WalkFailure {
    pages: usize,
    error: ReporterError,
}

/// Fetches repositories and merged pull requests, caching batch results per
/// repository set.
///
/// Settings are loaded from the [`SettingsSource`] at the start of every
/// operation. Operations that touch the cache take `&mut self`; share an
/// instance between tasks behind a `tokio::sync::Mutex`.
pub struct BitbucketRequester {
    source: SettingsSource,
    policy: FetchPolicy,
    cache: PullRequestCache,
}

impl BitbucketRequester {
    pub fn new(source: SettingsSource) -> Self {
        Self {
            source,
            policy: FetchPolicy::default(),
            cache: PullRequestCache::new(),
        }
    }

    /// Requester reading `BITBUCKET_*` variables on every call
    pub fn from_env() -> Self {
        Self::new(SettingsSource::Environment)
    }

    pub fn with_policy(mut self, policy: FetchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn cache(&self) -> &PullRequestCache {
        &self.cache
    }

    fn connect(&self) -> Result<BitbucketClient> {
        let settings = self.source.load()?;
        BitbucketClient::new(settings, &self.policy)
    }

    /// List every repository in a workspace (Cloud) or project (Server).
    ///
    /// Without a workspace, Server lists all repositories visible to the
    /// token and Cloud requires the domain to point at a repository collection.
    pub async fn list_repositories(&self, workspace: Option<&str>) -> Result<Vec<Repository>> {
        let client = self.connect()?;
        let base = client.base_url().to_string();
        let dialect = client.dialect();
        let page_size = self.policy.repository_page_size;

        let items = self
            .collect_with_fallback(
                &client,
                "repositories",
                page_size,
                Continuation::Links,
                FallbackPoint::AnyPage,
                |shape| repositories_url(&base, dialect, shape, workspace, page_size),
            )
            .await?;

        let repositories: Vec<Repository> = items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<Repository>(item) {
                Ok(repository) => Some(repository),
                Err(e) => {
                    warn!("Skipping unreadable repository record: {}", e);
                    None
                }
            })
            .collect();

        info!("Found {} repositories", repositories.len());
        Ok(repositories)
    }

    /// All merged pull requests of one repository. Identity and transport
    /// failures propagate.
    pub async fn list_merged_pull_requests(
        &self,
        repository: &Repository,
    ) -> Result<Vec<PullRequest>> {
        let client = self.connect()?;
        self.fetch_merged(&client, repository).await
    }

    /// Merged pull requests for each repository, in input order.
    ///
    /// A repository that fails is logged and reported with no pull requests;
    /// the rest of the batch continues. Results are cached under the
    /// repository set and served from the cache when `use_cache` is set.
    pub async fn list_merged_pull_requests_for_repositories(
        &mut self,
        repositories: &[Repository],
        use_cache: bool,
    ) -> Result<Vec<RepositoryPullRequests>> {
        if use_cache {
            if let Some(entry) = self.cache.get(repositories) {
                info!(
                    "Using cached pull requests for {} repositories (fetched {})",
                    repositories.len(),
                    entry.fetched_at
                );
                return Ok(entry.results.clone());
            }
        }

        let client = self.connect()?;
        let mut results = Vec::with_capacity(repositories.len());

        for repository in repositories {
            let pull_requests = match self.fetch_merged(&client, repository).await {
                Ok(pull_requests) => pull_requests,
                Err(e) => {
                    error!(
                        "Failed to fetch pull requests for {}: {}",
                        repository.identifier().unwrap_or(&repository.name),
                        e
                    );
                    Vec::new()
                }
            };
            results.push(RepositoryPullRequests {
                repository: repository.clone(),
                pull_requests,
            });
        }

        self.cache.insert(repositories, results.clone(), Utc::now());
        Ok(results)
    }

    /// When the cached batch for this repository set was fetched
    pub fn cached_timestamp(&self, repositories: &[Repository]) -> Option<DateTime<Utc>> {
        self.cache.timestamp(repositories)
    }

    /// Forget the cached batch for this repository set
    pub fn invalidate_cache(&mut self, repositories: &[Repository]) -> bool {
        self.cache.invalidate(repositories)
    }

    async fn fetch_merged(
        &self,
        client: &BitbucketClient,
        repository: &Repository,
    ) -> Result<Vec<PullRequest>> {
        let identity = repository.resolve_identity()?;
        let base = client.base_url().to_string();
        let dialect = client.dialect();
        let page_size = self.policy.pull_request_page_size;

        let items = self
            .collect_with_fallback(
                client,
                "pull requests",
                page_size,
                Continuation::LastPageFlag,
                FallbackPoint::FirstPage,
                |shape| Ok(pull_requests_url(&base, dialect, shape, &identity, page_size)),
            )
            .await?;

        let merged: Vec<PullRequest> = items
            .iter()
            .filter_map(|item| {
                let pr = PullRequest::from_json(item);
                if pr.is_none() {
                    debug!("Skipping pull request record without an id");
                }
                pr
            })
            .filter(PullRequest::is_merged)
            .collect();

        debug!(
            "{}/{}: {} merged pull requests out of {} fetched",
            identity.owner,
            identity.slug,
            merged.len(),
            items.len()
        );
        Ok(merged)
    }

    /// Run a paged enumeration, retrying once against the API 1.0 endpoints
    /// when a Server API 2.0 request fails at an allowed `fallback_point`.
    async fn collect_with_fallback<F>(
        &self,
        client: &BitbucketClient,
        what: &str,
        page_size: usize,
        mode: Continuation,
        fallback_point: FallbackPoint,
        build_url: F,
    ) -> Result<Vec<Value>>
    where
        F: Fn(ApiShape) -> Result<String>,
    {
        let mut shape = ApiShape::V2;
        let mut fallback_tried = client.dialect() == Dialect::Cloud;

        loop {
            let start_url = build_url(shape)?;
            match self
                .collect_pages(client, start_url, page_size, mode, what)
                .await
            {
                Ok(items) => return Ok(items),
                Err(WalkFailure { pages, error })
                    if !fallback_tried
                        && error.is_fallback_candidate()
                        && (fallback_point == FallbackPoint::AnyPage || pages == 0) =>
                {
                    warn!(
                        "Listing {} via API {} failed ({}), retrying with API {}",
                        what,
                        shape.path_segment(),
                        error,
                        ApiShape::V1.path_segment()
                    );
                    shape = ApiShape::V1;
                    fallback_tried = true;
                }
                Err(WalkFailure { error, .. }) => return Err(error),
            }
        }
    }

    /// Follow continuation links from `start_url`, concatenating page items.
    /// Cycles and the page ceiling end the walk early with what was gathered.
    async fn collect_pages(
        &self,
        client: &BitbucketClient,
        start_url: String,
        page_size: usize,
        mode: Continuation,
        what: &str,
    ) -> std::result::Result<Vec<Value>, WalkFailure> {
        let mut items = Vec::new();
        let mut seen = HashSet::new();
        let mut pages = 0usize;
        let mut next = Some(start_url);

        while let Some(url) = next.take() {
            if pages >= self.policy.max_pages {
                warn!(
                    "Stopped listing {} after {} pages; results are partial",
                    what, pages
                );
                break;
            }
            if !seen.insert(url.clone()) {
                warn!("Pagination for {} revisited {}; stopping", what, url);
                break;
            }

            let page: Value = client
                .get(&url)
                .await
                .map_err(|error| WalkFailure { pages, error })?;
            pages += 1;

            let page_items = extract_items(&page);
            let count = page_items.len();
            items.extend(page_items);

            let meta = PageMeta::from_json(&page);
            next = derive_next_url(&url, &meta, count, page_size, mode)
                .map_err(|error| WalkFailure { pages, error })?;
        }

        debug!("Fetched {} {} over {} pages", items.len(), what, pages);
        Ok(items)
    }
}

/// Cloud endpoints live under the API root, before any `/repositories` path
fn cloud_api_root(base: &str) -> &str {
    match base.find("/repositories") {
        Some(index) => &base[..index],
        None => base,
    }
}

/// First page of the repository listing
pub fn repositories_url(
    base: &str,
    dialect: Dialect,
    shape: ApiShape,
    workspace: Option<&str>,
    page_size: usize,
) -> Result<String> {
    let workspace = workspace.map(str::trim).filter(|w| !w.is_empty());
    let size = page_size.to_string();
    let size_param = dialect.page_size_param();

    match dialect {
        Dialect::Cloud => match workspace {
            Some(workspace) => Ok(format!(
                "{}/repositories/{}?{}={}",
                cloud_api_root(base),
                workspace,
                size_param,
                size
            )),
            None if base.contains("/repositories/") => set_query_param(base, size_param, &size),
            None => Err(ReporterError::config(
                "A workspace is required to list Bitbucket Cloud repositories",
            )),
        },
        Dialect::Server => {
            let api = format!("{}/rest/api/{}", base, shape.path_segment());
            Ok(match workspace {
                Some(project) => {
                    format!("{}/projects/{}/repos?{}={}", api, project, size_param, size)
                }
                None => format!("{}/repos?{}={}", api, size_param, size),
            })
        }
    }
}

/// First page of a repository's pull requests. API 1.0 cannot be trusted to
/// filter by state, so it asks for everything.
pub fn pull_requests_url(
    base: &str,
    dialect: Dialect,
    shape: ApiShape,
    identity: &RepositoryIdentity,
    page_size: usize,
) -> String {
    let size_param = dialect.page_size_param();
    match dialect {
        Dialect::Cloud => format!(
            "{}/repositories/{}/{}/pullrequests?state=MERGED&{}={}",
            cloud_api_root(base),
            identity.owner,
            identity.slug,
            size_param,
            page_size
        ),
        Dialect::Server => {
            let state = match shape {
                ApiShape::V2 => "MERGED",
                ApiShape::V1 => "ALL",
            };
            format!(
                "{}/rest/api/{}/projects/{}/repos/{}/pull-requests?state={}&{}={}",
                base,
                shape.path_segment(),
                identity.owner,
                identity.slug,
                state,
                size_param,
                page_size
            )
        }
    }
}
