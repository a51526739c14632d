//! Bitbucket integration module
//!
//! This module provides read access to Bitbucket Cloud and Bitbucket Server for:
//! - Repository enumeration across both API dialects
//! - Merged pull request enumeration with API 1.0 fallback
//! - Cached batch fetches keyed by repository set

pub mod cache;
pub mod client;
pub mod dialect;
pub mod pagination;
pub mod pull_request;
pub mod repository;
pub mod requester;

pub use cache::{CacheEntry, PullRequestCache, RepositoryPullRequests};
pub use client::BitbucketClient;
pub use dialect::{ApiShape, Dialect};
pub use pull_request::{PullRequest, PullRequestState};
pub use repository::{Repository, RepositoryIdentity};
pub use requester::BitbucketRequester;
