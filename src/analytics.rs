//! Aggregations over batch pull request results.

use crate::bitbucket::{PullRequest, RepositoryPullRequests};
use std::collections::{BTreeMap, HashMap};

fn merged(results: &[RepositoryPullRequests]) -> impl Iterator<Item = &PullRequest> {
    results
        .iter()
        .flat_map(|r| r.pull_requests.iter())
        .filter(|pr| pr.is_merged())
}

/// Merged pull requests per `YYYY-MM` of their merge time. Pull requests
/// without a merge time are not counted.
pub fn monthly_merge_counts(results: &[RepositoryPullRequests]) -> BTreeMap<String, usize> {
    let mut months = BTreeMap::new();
    for closed_at in merged(results).filter_map(|pr| pr.closed_at) {
        *months
            .entry(closed_at.format("%Y-%m").to_string())
            .or_insert(0) += 1;
    }
    months
}

/// Mean hours from creation to merge
pub fn average_resolution_hours(results: &[RepositoryPullRequests]) -> Option<f64> {
    let durations: Vec<i64> = merged(results)
        .filter_map(PullRequest::resolution_time)
        .map(|d| d.num_seconds())
        .collect();

    if durations.is_empty() {
        return None;
    }

    let total: i64 = durations.iter().sum();
    Some(total as f64 / durations.len() as f64 / 3600.0)
}

/// Merge count per author, most active first (ties by name)
pub fn merges_by_author(results: &[RepositoryPullRequests]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for pr in merged(results) {
        *counts.entry(pr.author.as_str()).or_insert(0) += 1;
    }

    let mut authors: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(name, count)| (name.to_string(), count))
        .collect();
    authors.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    authors
}
