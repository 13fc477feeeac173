use chrono::{DateTime, Utc};

/// Lifecycle state of a pull request as seen by the changelog pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrState {
    Open,
    /// Closed with a merge commit (`merged_at` is set)
    Merged,
    /// Closed without being merged
    ClosedUnmerged,
}

/// A pull request fetched from the GitHub API.
/// Not Deserialize: built from the wire response in pr/mod.rs so the
/// lifecycle state can be derived from `state` + `merged_at`.
#[derive(Debug, Clone)]
pub struct PullRequestRecord {
    /// PR title
    pub title: String,
    /// Browser URL of the PR (html_url)
    pub url: String,
    /// Free-text description, absent when the author left it empty
    pub body: Option<String>,
    pub state: PrState,
    pub created_at: DateTime<Utc>,
    /// Only present once merged
    pub merged_at: Option<DateTime<Utc>>,
    /// Target (base) branch name
    pub base_branch: String,
}

impl PullRequestRecord {
    /// The date compared against the selection window: `created_at` while
    /// open, `merged_at` otherwise. Closed-unmerged PRs have none.
    pub fn relevant_date(&self) -> Option<DateTime<Utc>> {
        match self.state {
            PrState::Open => Some(self.created_at),
            PrState::Merged | PrState::ClosedUnmerged => self.merged_at,
        }
    }
}

/// Lifecycle-state policy requested by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StateFilter {
    Open,
    #[default]
    Closed,
    All,
}

impl StateFilter {
    /// Value of the `state` query parameter on the pulls endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            StateFilter::Open => "open",
            StateFilter::Closed => "closed",
            StateFilter::All => "all",
        }
    }

    /// `closed` only admits merged PRs; `all` is the union of the other two.
    pub fn admits(&self, pr: &PullRequestRecord) -> bool {
        let is_open = pr.state == PrState::Open;
        let is_merged = pr.state == PrState::Merged && pr.merged_at.is_some();
        match self {
            StateFilter::Open => is_open,
            StateFilter::Closed => is_merged,
            StateFilter::All => is_open || is_merged,
        }
    }
}

impl std::fmt::Display for StateFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StateFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(StateFilter::Open),
            "closed" => Ok(StateFilter::Closed),
            "all" => Ok(StateFilter::All),
            other => Err(other.to_string()),
        }
    }
}

/// Resolved selection window and filters for one run.
///
/// Built once from configuration and passed to the selector by reference.
/// An inverted window (`lower_bound > upper_bound`) is allowed and simply
/// matches nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPolicy {
    pub lower_bound: DateTime<Utc>,
    pub upper_bound: Option<DateTime<Utc>>,
    pub state: StateFilter,
    /// Restrict retrieval to PRs targeting this base branch
    pub branch: Option<String>,
}

impl SelectionPolicy {
    pub fn in_window(&self, date: DateTime<Utc>) -> bool {
        date >= self.lower_bound && self.upper_bound.is_none_or(|upper| date <= upper)
    }

    /// Combined per-item predicate: state policy and date window.
    pub fn matches(&self, pr: &PullRequestRecord) -> bool {
        self.state.admits(pr) && pr.relevant_date().is_some_and(|d| self.in_window(d))
    }
}

/// Owner/name pair identifying a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// One page request against the pulls listing.
/// Sort is always creation time, newest first.
#[derive(Debug, Clone)]
pub struct PageQuery {
    pub repo: RepoRef,
    pub base: Option<String>,
    pub state: StateFilter,
    pub per_page: u32,
    pub page: u32,
}
