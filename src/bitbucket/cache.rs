use crate::bitbucket::pull_request::PullRequest;
use crate::bitbucket::repository::Repository;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Merged pull requests of one repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryPullRequests {
    pub repository: Repository,
    pub pull_requests: Vec<PullRequest>,
}

/// Snapshot of one batch fetch
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub results: Vec<RepositoryPullRequests>,
    pub fetched_at: DateTime<Utc>,
    /// Sorted identifiers that produced the key
    pub repository_ids: Vec<String>,
}

/// In-memory batch results keyed by repository set. Entries never expire;
/// callers refresh by invalidating.
#[derive(Debug, Default)]
pub struct PullRequestCache {
    entries: HashMap<String, CacheEntry>,
}

impl PullRequestCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sorted identifiers of a repository set
    pub fn repository_ids(repositories: &[Repository]) -> Vec<String> {
        let mut ids: Vec<String> = repositories
            .iter()
            .map(|r| r.identifier().unwrap_or_default().to_string())
            .collect();
        ids.sort();
        ids
    }

    /// Cache key for a repository set, independent of input order
    pub fn fingerprint(repositories: &[Repository]) -> String {
        Self::repository_ids(repositories).join(",")
    }

    pub fn get(&self, repositories: &[Repository]) -> Option<&CacheEntry> {
        self.entries.get(&Self::fingerprint(repositories))
    }

    pub fn insert(
        &mut self,
        repositories: &[Repository],
        results: Vec<RepositoryPullRequests>,
        fetched_at: DateTime<Utc>,
    ) -> &CacheEntry {
        let repository_ids = Self::repository_ids(repositories);
        let key = repository_ids.join(",");
        debug!("Caching {} repositories under key '{}'", results.len(), key);

        self.entries.insert(
            key.clone(),
            CacheEntry {
                results,
                fetched_at,
                repository_ids,
            },
        );
        &self.entries[&key]
    }

    /// Drop the entry for a repository set; returns whether one existed
    pub fn invalidate(&mut self, repositories: &[Repository]) -> bool {
        let key = Self::fingerprint(repositories);
        let removed = self.entries.remove(&key).is_some();
        if removed {
            debug!("Invalidated cache entry '{}'", key);
        }
        removed
    }

    pub fn timestamp(&self, repositories: &[Repository]) -> Option<DateTime<Utc>> {
        self.get(repositories).map(|entry| entry.fetched_at)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
