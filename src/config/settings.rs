use crate::bitbucket::Dialect;
use crate::errors::{ReporterError, Result};
use base64::Engine;
use std::time::Duration;

pub const ENV_DOMAIN: &str = "BITBUCKET_DOMAIN";
pub const ENV_API_TOKEN: &str = "BITBUCKET_API_TOKEN";
pub const ENV_USERNAME: &str = "BITBUCKET_USERNAME";
pub const ENV_DIALECT: &str = "BITBUCKET_DIALECT";

/// Connection settings for one Bitbucket instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitbucketSettings {
    /// Base URL, e.g. `https://api.bitbucket.org/2.0` or `https://bitbucket.example.com`
    pub domain: String,
    pub token: String,
    /// When set, the token is sent as an app password with HTTP Basic auth
    pub username: Option<String>,
    pub dialect_override: Option<Dialect>,
}

impl BitbucketSettings {
    pub fn new<D: Into<String>, T: Into<String>>(domain: D, token: T) -> Self {
        Self {
            domain: domain.into(),
            token: token.into(),
            username: None,
            dialect_override: None,
        }
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect_override = Some(dialect);
        self
    }

    pub fn with_username<S: Into<String>>(mut self, username: S) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Read settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup, treating blank values as missing
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let domain = read(ENV_DOMAIN)
            .ok_or_else(|| ReporterError::config(format!("{ENV_DOMAIN} is not set")))?;
        let token = read(ENV_API_TOKEN)
            .ok_or_else(|| ReporterError::config(format!("{ENV_API_TOKEN} is not set")))?;

        let dialect_override = match read(ENV_DIALECT) {
            Some(value) => Some(value.parse::<Dialect>()?),
            None => None,
        };

        Ok(Self {
            domain,
            token,
            username: read(ENV_USERNAME),
            dialect_override,
        })
    }

    /// Validate that the settings can be used before any request is made
    pub fn validate(&self) -> Result<()> {
        if self.domain.trim().is_empty() {
            return Err(ReporterError::config("Bitbucket domain is empty"));
        }
        if self.token.trim().is_empty() {
            return Err(ReporterError::config("Bitbucket API token is empty"));
        }
        Ok(())
    }

    /// Domain without trailing slashes
    pub fn base_url(&self) -> &str {
        self.domain.trim().trim_end_matches('/')
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect_override
            .unwrap_or_else(|| Dialect::detect(&self.domain))
    }

    /// Value for the `Authorization` header
    pub fn auth_header(&self) -> String {
        match &self.username {
            Some(username) => {
                let auth_string = format!("{}:{}", username, self.token);
                let auth_encoded = base64::engine::general_purpose::STANDARD.encode(auth_string);
                format!("Basic {}", auth_encoded)
            }
            None => format!("Bearer {}", self.token),
        }
    }
}

/// Where a requester obtains its settings on each operation
#[derive(Debug, Clone, Default)]
pub enum SettingsSource {
    /// Re-read the process environment on every call
    #[default]
    Environment,
    Fixed(BitbucketSettings),
}

impl SettingsSource {
    pub fn load(&self) -> Result<BitbucketSettings> {
        let settings = match self {
            SettingsSource::Environment => BitbucketSettings::from_env()?,
            SettingsSource::Fixed(settings) => settings.clone(),
        };
        settings.validate()?;
        Ok(settings)
    }
}

/// Limits applied while paging through Bitbucket collections
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    /// Hard ceiling on pages fetched by one enumeration
    pub max_pages: usize,
    pub repository_page_size: usize,
    pub pull_request_page_size: usize,
    pub request_timeout: Duration,
    /// Maximum characters of a non-JSON error body kept in error messages
    pub error_body_limit: usize,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            max_pages: 1000,
            repository_page_size: 100,
            pull_request_page_size: 50,
            request_timeout: Duration::from_secs(30),
            error_body_limit: 2000,
        }
    }
}
