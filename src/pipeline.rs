use std::path::Path;
use tracing::{info, instrument};

use crate::changelog::{self, Extraction};
use crate::pr::{select, PageFetcher, PrError, RepoRef, SelectionPolicy};
use crate::report::{self, RenderedChangelog};

/// Result of one select → extract → render pass.
#[derive(Debug)]
pub struct Generated {
    pub selected: usize,
    pub extraction: Extraction,
    pub rendered: RenderedChangelog,
}

/// Run the whole changelog pipeline except the file write.
#[instrument(skip_all, fields(repo = %repo))]
pub async fn generate(
    repo: &RepoRef,
    policy: &SelectionPolicy,
    fetcher: &dyn PageFetcher,
    output_path: &Path,
) -> Result<Generated, PrError> {
    info!("selecting pull requests");
    let records = select::select(repo, policy, fetcher).await?;

    info!(records = records.len(), "extracting tagged sections");
    let extraction = changelog::extract(&records);

    info!("rendering changelog");
    let rendered = report::render(&extraction, output_path);

    Ok(Generated {
        selected: records.len(),
        extraction,
        rendered,
    })
}
