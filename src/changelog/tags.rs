use super::types::Category;

/// Scan `body` for every `<tag>...</tag>` block of `category`, matching the
/// delimiters ASCII case-insensitively, and return the enclosed text of each
/// block in order of appearance.
///
/// Blocks never overlap: scanning resumes after the closing delimiter. An
/// opening delimiter with no closing delimiter after it yields nothing, and
/// since no later opening delimiter can have one either, scanning ends there.
/// A block runs to the *first* closing delimiter, so a repeated opening tag
/// inside a block is treated as plain content.
pub fn scan_blocks<'a>(body: &'a str, category: Category) -> Vec<&'a str> {
    let open = category.open_tag();
    let close = category.close_tag();
    // ASCII lowercasing keeps byte offsets identical to `body`.
    let haystack = body.to_ascii_lowercase();

    let mut blocks = Vec::new();
    let mut cursor = 0;
    while let Some(start) = haystack[cursor..].find(&open) {
        let content_start = cursor + start + open.len();
        let Some(len) = haystack[content_start..].find(&close) else {
            break;
        };
        let content_end = content_start + len;
        blocks.push(&body[content_start..content_end]);
        cursor = content_end + close.len();
    }
    blocks
}

/// Trim a block and split it into its non-blank lines. Lines keep their
/// indentation; `lines()` already drops the `\r` of CRLF bodies.
pub fn block_lines(block: &str) -> impl Iterator<Item = &str> {
    block.trim().lines().filter(|line| !line.trim().is_empty())
}
