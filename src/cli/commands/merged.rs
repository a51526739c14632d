use crate::bitbucket::BitbucketRequester;
use crate::cli::commands::select_repositories;
use crate::cli::output::Output;
use crate::cli::RepositorySelection;
use crate::errors::Result;

/// List merged pull requests for the selected repositories
pub async fn run(selection: &RepositorySelection, json: bool) -> Result<()> {
    let mut requester = BitbucketRequester::from_env();
    let repositories = select_repositories(&requester, selection).await?;
    let results = requester
        .list_merged_pull_requests_for_repositories(&repositories, false)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    for result in &results {
        let id = result
            .repository
            .identifier()
            .unwrap_or(&result.repository.name);
        Output::section(format!("{} ({} merged)", id, result.pull_requests.len()));

        if result.pull_requests.is_empty() {
            Output::info("No merged pull requests");
            continue;
        }

        for pr in &result.pull_requests {
            let merged_on = pr
                .closed_at
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "unknown".to_string());
            Output::sub_item(format!("#{} {} ({}, {})", pr.id, pr.title, pr.author, merged_on));
        }
    }

    Ok(())
}
