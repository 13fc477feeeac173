pub mod tags;
pub mod types;

pub use types::{Category, Extraction, TaggedSection};

use crate::pr::PullRequestRecord;
use tracing::debug;

/// Pull tagged sections out of every PR body.
///
/// For each category, PRs are visited in selection order. A PR contributes a
/// section only when at least one of its matching blocks has a non-blank
/// line; all matching blocks of one body are concatenated into that section.
/// A missing body behaves like an empty one. Never fails: any text is valid.
pub fn extract(records: &[PullRequestRecord]) -> Extraction {
    let mut extraction = Extraction::default();

    for category in Category::ALL {
        for pr in records {
            let body = pr.body.as_deref().unwrap_or_default();
            let lines: Vec<String> = tags::scan_blocks(body, category)
                .into_iter()
                .flat_map(tags::block_lines)
                .map(str::to_string)
                .collect();

            if lines.is_empty() {
                continue;
            }
            debug!(%category, title = %pr.title, lines = lines.len(), "extracted section");
            extraction.push(TaggedSection {
                category,
                title: pr.title.clone(),
                url: pr.url.clone(),
                lines,
            });
        }
    }

    extraction
}
