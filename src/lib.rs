pub mod analytics;
pub mod bitbucket;
pub mod cli;
pub mod config;
pub mod errors;

pub use bitbucket::BitbucketRequester;
pub use errors::ReporterError;
