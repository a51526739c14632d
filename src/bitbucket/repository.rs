use crate::errors::{ReporterError, Result};
use serde::{Deserialize, Serialize};

/// Strategies tried by [`Repository::resolve_identity`], in order
pub const IDENTITY_STRATEGIES: [&str; 3] = ["full_name", "links.self", "project.key + slug"];

/// A repository as returned by either Bitbucket dialect
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    /// Cloud: `workspace/slug`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Cloud visibility flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_private: Option<bool>,
    /// Server visibility flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<Project>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<RepositoryLinks>,
}

/// Server project (or Cloud project) a repository belongs to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryLinks {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<LinkSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<LinkSet>,
}

/// Cloud sends `{"href": ..}`, Server sends `[{"href": ..}]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LinkSet {
    One(Link),
    Many(Vec<Link>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
}

impl LinkSet {
    pub fn href(&self) -> Option<&str> {
        match self {
            LinkSet::One(link) => Some(link.href.as_str()),
            LinkSet::Many(links) => links.first().map(|l| l.href.as_str()),
        }
    }
}

/// The `(project or workspace, slug)` pair used to address a repository
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryIdentity {
    pub owner: String,
    pub slug: String,
}

impl Repository {
    /// Stable identifier: `full_name`, then `uuid`, then `slug`
    pub fn identifier(&self) -> Option<&str> {
        [&self.full_name, &self.uuid, &self.slug]
            .into_iter()
            .find_map(|field| field.as_deref().filter(|s| !s.is_empty()))
    }

    pub fn is_private(&self) -> bool {
        match (self.is_private, self.public) {
            (Some(private), _) => private,
            (None, Some(public)) => !public,
            (None, None) => true,
        }
    }

    fn self_href(&self) -> Option<&str> {
        self.links.as_ref()?.self_link.as_ref()?.href()
    }

    /// Browser URL, preferring `links.html` over `links.self`
    pub fn display_url(&self) -> Option<&str> {
        let links = self.links.as_ref()?;
        links
            .html
            .as_ref()
            .and_then(LinkSet::href)
            .or_else(|| links.self_link.as_ref().and_then(LinkSet::href))
    }

    /// Derive the owner/slug pair needed for pull request URLs.
    pub fn resolve_identity(&self) -> Result<RepositoryIdentity> {
        self.full_name
            .as_deref()
            .and_then(identity_from_full_name)
            .or_else(|| self.self_href().and_then(identity_from_href))
            .or_else(|| self.identity_from_project())
            .ok_or_else(|| {
                let record = serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"));
                ReporterError::identity(IDENTITY_STRATEGIES.to_vec(), record)
            })
    }

    fn identity_from_project(&self) -> Option<RepositoryIdentity> {
        let key = self.project.as_ref()?.key.as_deref().filter(|k| !k.is_empty())?;
        let slug = self.slug.as_deref().filter(|s| !s.is_empty())?;
        Some(RepositoryIdentity {
            owner: key.to_string(),
            slug: slug.to_string(),
        })
    }
}

fn identity_from_full_name(full_name: &str) -> Option<RepositoryIdentity> {
    let (owner, slug) = full_name.split_once('/')?;
    if owner.is_empty() || slug.is_empty() || slug.contains('/') {
        return None;
    }
    Some(RepositoryIdentity {
        owner: owner.to_string(),
        slug: slug.to_string(),
    })
}

/// Recognises `.../repositories/{owner}/{slug}` and `.../projects/{key}/repos/{slug}`
fn identity_from_href(href: &str) -> Option<RepositoryIdentity> {
    let path = href.split(['?', '#']).next().unwrap_or(href);
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    segments
        .windows(3)
        .find_map(|w| match w {
            ["repositories", owner, slug] => Some((*owner, *slug)),
            _ => None,
        })
        .or_else(|| {
            segments.windows(4).find_map(|w| match w {
                ["projects", key, "repos", slug] => Some((*key, *slug)),
                _ => None,
            })
        })
        .map(|(owner, slug)| RepositoryIdentity {
            owner: owner.to_string(),
            slug: slug.to_string(),
        })
}
