use crate::analytics::{average_resolution_hours, merges_by_author, monthly_merge_counts};
use crate::bitbucket::BitbucketRequester;
use crate::cli::commands::select_repositories;
use crate::cli::output::Output;
use crate::cli::RepositorySelection;
use crate::errors::Result;

const TOP_AUTHORS: usize = 10;

/// Print merge analytics for the selected repositories
pub async fn run(selection: &RepositorySelection) -> Result<()> {
    let mut requester = BitbucketRequester::from_env();
    let repositories = select_repositories(&requester, selection).await?;
    let results = requester
        .list_merged_pull_requests_for_repositories(&repositories, true)
        .await?;

    let failed = results
        .iter()
        .filter(|r| r.pull_requests.is_empty())
        .count();
    Output::success(format!(
        "Fetched merged pull requests for {} repositories",
        results.len()
    ));
    if failed > 0 {
        Output::warning(format!(
            "{} repositories returned no merged pull requests (see log for errors)",
            failed
        ));
    }

    Output::section("Merged per month");
    for (month, count) in monthly_merge_counts(&results) {
        Output::sub_item(format!("{}: {}", month, count));
    }

    Output::section("Resolution time");
    match average_resolution_hours(&results) {
        Some(hours) => Output::sub_item(format!("Average: {:.1} hours", hours)),
        None => Output::info("No pull requests with both creation and merge times"),
    }

    Output::section("Top authors");
    for (rank, (author, count)) in merges_by_author(&results)
        .into_iter()
        .take(TOP_AUTHORS)
        .enumerate()
    {
        Output::numbered_item(rank + 1, format!("{} ({})", author, count));
    }

    Ok(())
}
