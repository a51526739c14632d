pub mod merged;
pub mod repos;
pub mod summary;
pub mod version;

use crate::bitbucket::{BitbucketRequester, Repository};
use crate::cli::RepositorySelection;
use crate::errors::{ReporterError, Result};

/// Repositories named by a selection; all repositories in the workspace when
/// no `--repo` filter was given
pub(crate) async fn select_repositories(
    requester: &BitbucketRequester,
    selection: &RepositorySelection,
) -> Result<Vec<Repository>> {
    let repositories = requester
        .list_repositories(selection.workspace.as_deref())
        .await?;

    if selection.repos.is_empty() {
        return Ok(repositories);
    }

    let selected = filter_repositories(repositories, &selection.repos);
    if selected.is_empty() {
        return Err(ReporterError::validation(format!(
            "None of the requested repositories were found: {}",
            selection.repos.join(", ")
        )));
    }
    Ok(selected)
}

/// Keep repositories whose slug, name or full name matches one of `wanted`
pub(crate) fn filter_repositories(
    repositories: Vec<Repository>,
    wanted: &[String],
) -> Vec<Repository> {
    repositories
        .into_iter()
        .filter(|repo| {
            wanted.iter().any(|w| {
                repo.full_name.as_deref() == Some(w.as_str())
                    || repo.slug.as_deref() == Some(w.as_str())
                    || repo.name == *w
            })
        })
        .collect()
}
