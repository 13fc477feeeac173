pub mod outcome;
pub mod types;

pub use types::{ChangelogDocument, LineKind, RenderedChangelog};

use crate::changelog::{Category, Extraction};
use colored::Colorize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, instrument};

/// Leading whitespace for list elements copied from PR bodies.
const LIST_INDENT: &str = "   ";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write changelog file: {0}")]
    FileWrite(#[from] std::io::Error),
}

/// Turn extracted sections into the final markdown document.
///
/// Every category gets a `## name` heading even when empty, followed by its
/// lines and one blank separator. Pure: writing is left to [`write`].
pub fn render(extraction: &Extraction, path: &Path) -> RenderedChangelog {
    let sections = Category::ALL
        .iter()
        .map(|&category| {
            let mut lines = vec![format!("## {category}")];
            for line in extraction.lines(category) {
                match LineKind::classify(&line) {
                    LineKind::Heading => {
                        lines.push(String::new());
                        lines.push(line);
                    }
                    LineKind::ListItem => lines.push(format!("{LIST_INDENT}{line}")),
                    LineKind::Plain => lines.push(format!("- {line}")),
                }
            }
            lines.push(String::new());
            (category, lines)
        })
        .collect();

    let document = ChangelogDocument { sections };
    let text = document.to_text();
    RenderedChangelog {
        document,
        text,
        path: path.to_path_buf(),
    }
}

/// Write the rendered changelog to its output path.
#[instrument(skip(rendered), fields(path = %rendered.path.display()))]
pub fn write(rendered: &RenderedChangelog) -> Result<PathBuf, ReportError> {
    debug!(bytes = rendered.text.len(), "writing changelog file");
    std::fs::write(&rendered.path, &rendered.text)?;
    Ok(rendered.path.clone())
}

/// Print a short per-category summary to the terminal.
pub fn print_summary(extraction: &Extraction, destination: &str) {
    println!();
    println!("{} {}", "Changelog written to".green().bold(), destination);
    for (category, count) in extraction.counts() {
        let count = if count == 0 {
            "none".dimmed()
        } else {
            format!("{count} PR(s)").normal()
        };
        println!("  {:<8} {}", category.as_str().bold(), count);
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changelog::TaggedSection;

    fn section(category: Category, title: &str, lines: &[&str]) -> TaggedSection {
        TaggedSection {
            category,
            title: title.to_string(),
            url: format!("https://github.com/org/repo/pull/{}", title.len()),
            lines: lines.iter().map(|l| l.to_string()).collect(),
        }
    }

    #[test]
    fn test_render_empty_extraction_has_bare_headings() {
        let rendered = render(&Extraction::default(), Path::new("CHANGELOG.md"));
        assert_eq!(rendered.text, "## added\n\n## changed\n\n## fixed\n");
        assert_eq!(rendered.path, PathBuf::from("CHANGELOG.md"));
    }

    #[test]
    fn test_render_classifies_lines() {
        let mut extraction = Extraction::default();
        extraction.push(section(
            Category::Changed,
            "Rework auth",
            &["Token refresh", "- keeps sessions", "1. step one", "b. step b"],
        ));
        let rendered = render(&extraction, Path::new("out.md"));
        let expected = "## added\n\
                        \n\
                        ## changed\n\
                        \n\
                        ### [Rework auth](https://github.com/org/repo/pull/11)\n\
                        - Token refresh\n   - keeps sessions\n   1. step one\n   b. step b\n\
                        \n\
                        ## fixed\n";
        assert_eq!(rendered.text, expected);
    }

    #[test]
    fn test_render_separates_consecutive_attributions() {
        let mut extraction = Extraction::default();
        extraction.push(section(Category::Fixed, "One", &["a"]));
        extraction.push(section(Category::Fixed, "Three", &["b"]));
        let rendered = render(&extraction, Path::new("out.md"));

        let (_, fixed) = &rendered.document.sections[2];
        assert_eq!(
            fixed,
            &vec![
                "## fixed".to_string(),
                String::new(),
                "### [One](https://github.com/org/repo/pull/3)".to_string(),
                "- a".to_string(),
                String::new(),
                "### [Three](https://github.com/org/repo/pull/5)".to_string(),
                "- b".to_string(),
                String::new(),
            ]
        );
    }

    #[test]
    fn test_render_keeps_body_indentation() {
        use crate::pr::{PrState, PullRequestRecord};
        use chrono::Utc;

        let record = PullRequestRecord {
            title: "Nested".to_string(),
            url: "https://github.com/org/repo/pull/9".to_string(),
            body: Some("<added>\n- top\n    - nested\n  #42 hashtag\n</added>".to_string()),
            state: PrState::Merged,
            created_at: Utc::now(),
            merged_at: Some(Utc::now()),
            base_branch: "main".to_string(),
        };
        let extraction = crate::changelog::extract(&[record]);
        let rendered = render(&extraction, Path::new("out.md"));

        let (_, added) = &rendered.document.sections[0];
        assert_eq!(
            added,
            &vec![
                "## added".to_string(),
                String::new(),
                "### [Nested](https://github.com/org/repo/pull/9)".to_string(),
                "   - top".to_string(),
                "-     - nested".to_string(),
                "-   #42 hashtag".to_string(),
                String::new(),
            ]
        );
    }

    #[test]
    fn test_render_does_not_escape_or_dedupe() {
        let mut extraction = Extraction::default();
        extraction.push(section(Category::Added, "Dup", &["*bold* <b>", "*bold* <b>"]));
        let rendered = render(&extraction, Path::new("out.md"));
        assert_eq!(rendered.text.matches("- *bold* <b>").count(), 2);
    }

    #[test]
    fn test_write_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CHANGELOG.md");
        let rendered = render(&Extraction::default(), &path);

        let written = write(&rendered).unwrap();
        assert_eq!(written, path);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), rendered.text);
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("CHANGELOG.md");
        let rendered = render(&Extraction::default(), &path);
        assert!(matches!(write(&rendered), Err(ReportError::FileWrite(_))));
    }

    #[test]
    fn test_print_summary_does_not_panic() {
        let mut extraction = Extraction::default();
        extraction.push(section(Category::Added, "One", &["a"]));
        print_summary(&extraction, "CHANGELOG.md");
    }
}
