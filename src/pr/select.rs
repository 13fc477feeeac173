use tracing::{debug, info, instrument};

use super::types::{PageQuery, PullRequestRecord, RepoRef, SelectionPolicy};
use super::{PageFetcher, PrError};

pub const PAGE_SIZE: u32 = 100;

/// Retrieve every pull request matching `policy`, in the order the host
/// returned them (newest created first).
///
/// Pages are fetched strictly one after another. Pagination stops on an empty
/// page, or when the first item of a page has a relevant date older than the
/// lower bound: the host sorts by creation time descending, so no later page
/// can satisfy the window either. Any fetch error aborts the whole selection.
#[instrument(skip(repo, policy, fetcher), fields(repo = %repo, state = %policy.state, lower = %policy.lower_bound))]
pub async fn select(
    repo: &RepoRef,
    policy: &SelectionPolicy,
    fetcher: &dyn PageFetcher,
) -> Result<Vec<PullRequestRecord>, PrError> {
    let mut selected = Vec::new();
    let mut page = 1;

    loop {
        let query = PageQuery {
            repo: repo.clone(),
            base: policy.branch.clone(),
            state: policy.state,
            per_page: PAGE_SIZE,
            page,
        };
        let items = fetcher.fetch_page(&query).await?;

        let Some(newest) = items.first() else {
            debug!(page, "empty page, pagination exhausted");
            break;
        };
        if newest
            .relevant_date()
            .is_some_and(|date| date < policy.lower_bound)
        {
            debug!(page, "newest item predates window, stopping");
            break;
        }

        let before = selected.len();
        selected.extend(items.into_iter().filter(|pr| policy.matches(pr)));
        debug!(page, matched = selected.len() - before, "page filtered");

        page += 1;
    }

    // Every break happens before the increment, so `page` is the fetch count.
    info!(selected = selected.len(), pages_fetched = page, "selection complete");
    Ok(selected)
}
