use crate::changelog::Category;
use std::path::PathBuf;

/// How a content line is emitted by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Starts with `#`: emitted after a blank line
    Heading,
    /// Already a list element (`- `, `1. `, `a. `): emitted indented
    ListItem,
    /// Anything else: emitted as a top-level bullet
    Plain,
}

impl LineKind {
    pub fn classify(line: &str) -> LineKind {
        if line.starts_with('#') {
            LineKind::Heading
        } else if is_list_element(line) {
            LineKind::ListItem
        } else {
            LineKind::Plain
        }
    }
}

/// `- x`, `12. x` or `b. x` (single ASCII letter, either case).
pub fn is_list_element(line: &str) -> bool {
    if line.starts_with("- ") {
        return true;
    }
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    let marker_len = match line.as_bytes().first() {
        Some(_) if digits > 0 => digits,
        Some(b) if b.is_ascii_alphabetic() => 1,
        _ => return false,
    };
    let mut rest = line[marker_len..].chars();
    rest.next() == Some('.') && rest.next().is_some_and(char::is_whitespace)
}

/// Render-ready lines per category, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogDocument {
    pub sections: Vec<(Category, Vec<String>)>,
}

impl ChangelogDocument {
    pub fn to_text(&self) -> String {
        self.sections
            .iter()
            .flat_map(|(_, lines)| lines.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Final output of the renderer, ready to hand to the file writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedChangelog {
    pub document: ChangelogDocument,
    pub text: String,
    pub path: PathBuf,
}
