use crate::errors::{ReporterError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Host that identifies Bitbucket Cloud's REST API
pub const CLOUD_API_HOST: &str = "api.bitbucket.org";

/// Which Bitbucket API family a domain speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Bitbucket Cloud, API 2.0
    Cloud,
    /// Self-hosted Bitbucket Server / Data Center
    Server,
}

impl Dialect {
    /// Anything that is not the Cloud API host is treated as Server.
    pub fn detect(domain: &str) -> Self {
        if domain.to_ascii_lowercase().contains(CLOUD_API_HOST) {
            Dialect::Cloud
        } else {
            Dialect::Server
        }
    }

    /// Query parameter carrying the requested page size
    pub fn page_size_param(&self) -> &'static str {
        match self {
            Dialect::Cloud => "pagelen",
            Dialect::Server => "limit",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Cloud => "cloud",
            Dialect::Server => "server",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = ReporterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cloud" => Ok(Dialect::Cloud),
            "server" | "datacenter" | "data-center" => Ok(Dialect::Server),
            other => Err(ReporterError::config(format!(
                "Unknown Bitbucket dialect '{other}' (expected 'cloud' or 'server')"
            ))),
        }
    }
}

/// REST endpoint family used against a Server domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiShape {
    /// `/rest/api/2.0/...`, tried first
    V2,
    /// `/rest/api/1.0/...`, the fallback
    V1,
}

impl ApiShape {
    pub fn path_segment(&self) -> &'static str {
        match self {
            ApiShape::V2 => "2.0",
            ApiShape::V1 => "1.0",
        }
    }
}
