use crate::bitbucket::BitbucketRequester;
use crate::cli::output::Output;
use crate::errors::Result;

/// List repositories in a workspace or project
pub async fn run(workspace: Option<&str>, json: bool) -> Result<()> {
    let requester = BitbucketRequester::from_env();
    let repositories = requester.list_repositories(workspace).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&repositories)?);
        return Ok(());
    }

    Output::section(format!("Repositories ({})", repositories.len()));
    for repo in &repositories {
        Output::repository(
            repo.identifier().unwrap_or(&repo.name),
            repo.is_private(),
            repo.display_url(),
        );
        if let Some(description) = repo.description.as_deref().filter(|d| !d.is_empty()) {
            Output::sub_item(description);
        }
    }

    Ok(())
}
