pub mod select;
pub mod types;

pub use types::{PageQuery, PrState, PullRequestRecord, RepoRef, SelectionPolicy, StateFilter};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

#[derive(Debug, Error)]
pub enum PrError {
    #[error("GitHub API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("GitHub API returned {status}: {message}")]
    ApiStatus { status: u16, message: String },

    #[error("Failed to decode pull request fixture: {0}")]
    Fixture(#[from] serde_json::Error),
}

/// Source of pull request pages.
///
/// The selector only ever asks for one page at a time and decides whether to
/// ask for the next one after inspecting the current page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, query: &PageQuery) -> Result<Vec<PullRequestRecord>, PrError>;
}

#[derive(Debug, Deserialize)]
struct BaseRef {
    #[serde(rename = "ref")]
    name: String,
}

/// Subset of the pulls listing payload we care about.
#[derive(Debug, Deserialize)]
struct PullResponse {
    title: String,
    html_url: String,
    body: Option<String>,
    state: String,
    created_at: DateTime<Utc>,
    merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    base: Option<BaseRef>,
}

#[derive(Debug, Deserialize)]
struct GitHubErrorBody {
    message: String,
}

impl From<PullResponse> for PullRequestRecord {
    fn from(pull: PullResponse) -> Self {
        let state = match (pull.state.as_str(), pull.merged_at) {
            ("open", _) => PrState::Open,
            (_, Some(_)) => PrState::Merged,
            (_, None) => PrState::ClosedUnmerged,
        };
        PullRequestRecord {
            title: pull.title,
            url: pull.html_url,
            body: pull.body,
            state,
            created_at: pull.created_at,
            merged_at: pull.merged_at,
            base_branch: pull.base.map(|b| b.name).unwrap_or_default(),
        }
    }
}

/// Pulls listing client for the GitHub REST API.
pub struct GitHubClient {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl GitHubClient {
    pub fn new(api_url: &str, token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }
}

#[async_trait]
impl PageFetcher for GitHubClient {
    #[instrument(skip(self, query), fields(repo = %query.repo, page = query.page, state = %query.state))]
    async fn fetch_page(&self, query: &PageQuery) -> Result<Vec<PullRequestRecord>, PrError> {
        let url = format!(
            "{}/repos/{}/{}/pulls",
            self.api_url, query.repo.owner, query.repo.repo
        );
        let mut params = vec![
            ("state", query.state.as_str().to_string()),
            ("sort", "created".to_string()),
            ("direction", "desc".to_string()),
            ("per_page", query.per_page.to_string()),
            ("page", query.page.to_string()),
        ];
        if let Some(base) = &query.base {
            params.push(("base", base.clone()));
        }

        debug!(%url, "fetching pull request page");
        let response = self
            .client
            .get(&url)
            .query(&params)
            .header("User-Agent", "pr-changelog")
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await?;
            let message = serde_json::from_str::<GitHubErrorBody>(&text)
                .map(|e| e.message)
                .unwrap_or(text);
            return Err(PrError::ApiStatus {
                status: status.as_u16(),
                message,
            });
        }

        let pulls = response.json::<Vec<PullResponse>>().await?;
        debug!(count = pulls.len(), "received pull request page");
        Ok(pulls.into_iter().map(PullRequestRecord::from).collect())
    }
}

/// Serves pages from an embedded JSON listing, for demo runs without a token.
///
/// Dates are shifted so the most recent timestamp in the fixture lands on
/// `now`, which keeps the demo inside any sensible lookback window.
pub struct FixtureFetcher {
    records: Vec<PullRequestRecord>,
}

impl FixtureFetcher {
    pub fn from_json(json: &str, now: DateTime<Utc>) -> Result<Self, PrError> {
        let pulls: Vec<PullResponse> = serde_json::from_str(json)?;
        let mut records: Vec<PullRequestRecord> =
            pulls.into_iter().map(PullRequestRecord::from).collect();

        let newest = records
            .iter()
            .flat_map(|r| std::iter::once(r.created_at).chain(r.merged_at))
            .max();
        if let Some(newest) = newest {
            let shift = now - newest;
            for record in &mut records {
                record.created_at += shift;
                record.merged_at = record.merged_at.map(|m| m + shift);
            }
        }

        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(Self { records })
    }
}

#[async_trait]
impl PageFetcher for FixtureFetcher {
    async fn fetch_page(&self, query: &PageQuery) -> Result<Vec<PullRequestRecord>, PrError> {
        let per_page = query.per_page.max(1) as usize;
        let skip = (query.page.saturating_sub(1) as usize) * per_page;
        let page = self
            .records
            .iter()
            .filter(|r| match query.state {
                StateFilter::Open => r.state == PrState::Open,
                StateFilter::Closed => r.state != PrState::Open,
                StateFilter::All => true,
            })
            .filter(|r| query.base.as_ref().is_none_or(|b| &r.base_branch == b))
            .skip(skip)
            .take(per_page)
            .cloned()
            .collect();
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LISTING: &str = r#"[
        {
            "title": "Add login",
            "html_url": "https://github.com/org/repo/pull/2",
            "body": "<added>\nSupport SSO\n</added>",
            "state": "closed",
            "created_at": "2025-03-02T10:00:00Z",
            "merged_at": "2025-03-03T10:00:00Z",
            "base": { "ref": "main" }
        },
        {
            "title": "Draft idea",
            "html_url": "https://github.com/org/repo/pull/1",
            "body": null,
            "state": "closed",
            "created_at": "2025-03-01T10:00:00Z",
            "merged_at": null,
            "base": { "ref": "develop" }
        }
    ]"#;

    fn query(page: u32) -> PageQuery {
        PageQuery {
            repo: RepoRef {
                owner: "org".to_string(),
                repo: "repo".to_string(),
            },
            base: None,
            state: StateFilter::All,
            per_page: 100,
            page,
        }
    }

    #[tokio::test]
    async fn test_fetch_page_decodes_listing() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/org/repo/pulls"))
            .and(query_param("sort", "created"))
            .and(query_param("direction", "desc"))
            .and(query_param("per_page", "100"))
            .and(query_param("page", "1"))
            .and(query_param("state", "all"))
            .and(header("User-Agent", "pr-changelog"))
            .and(header("Authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LISTING))
            .mount(&mock_server)
            .await;

        let client = GitHubClient::new(&mock_server.uri(), "secret");
        let page = client.fetch_page(&query(1)).await.unwrap();

        assert_eq!(page.len(), 2);
        assert_eq!(page[0].title, "Add login");
        assert_eq!(page[0].state, PrState::Merged);
        assert_eq!(page[0].base_branch, "main");
        assert_eq!(
            page[0].merged_at,
            Some(Utc.with_ymd_and_hms(2025, 3, 3, 10, 0, 0).unwrap())
        );
        assert_eq!(page[1].state, PrState::ClosedUnmerged);
        assert!(page[1].body.is_none());
    }

    #[tokio::test]
    async fn test_fetch_page_sends_base_branch() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/org/repo/pulls"))
            .and(query_param("base", "release"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = GitHubClient::new(&mock_server.uri(), "secret");
        let mut q = query(1);
        q.base = Some("release".to_string());
        assert!(client.fetch_page(&q).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_page_reports_api_message() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/org/repo/pulls"))
            .respond_with(
                ResponseTemplate::new(401).set_body_string(r#"{"message": "Bad credentials"}"#),
            )
            .mount(&mock_server)
            .await;

        let client = GitHubClient::new(&mock_server.uri(), "wrong");
        let err = client.fetch_page(&query(1)).await.unwrap_err();
        match err {
            PrError::ApiStatus { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Bad credentials");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_page_rejects_malformed_json() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/org/repo/pulls"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let client = GitHubClient::new(&mock_server.uri(), "secret");
        assert!(matches!(
            client.fetch_page(&query(1)).await,
            Err(PrError::ApiRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_fixture_fetcher_shifts_and_pages() {
        let now = Utc.with_ymd_and_hms(2026, 1, 10, 0, 0, 0).unwrap();
        let fetcher = FixtureFetcher::from_json(LISTING, now).unwrap();

        let first = fetcher.fetch_page(&query(1)).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].merged_at, Some(now));
        assert!(first[0].created_at > first[1].created_at);

        assert!(fetcher.fetch_page(&query(2)).await.unwrap().is_empty());

        let mut develop = query(1);
        develop.base = Some("develop".to_string());
        let only = fetcher.fetch_page(&develop).await.unwrap();
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].title, "Draft idea");
    }

    #[test]
    fn test_fixture_rejects_bad_json() {
        assert!(matches!(
            FixtureFetcher::from_json("{", Utc::now()),
            Err(PrError::Fixture(_))
        ));
    }
}
