/// Changelog category. Declaration order is document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Added,
    Changed,
    Fixed,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Added, Category::Changed, Category::Fixed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Added => "added",
            Category::Changed => "changed",
            Category::Fixed => "fixed",
        }
    }

    pub fn open_tag(&self) -> String {
        format!("<{}>", self.as_str())
    }

    pub fn close_tag(&self) -> String {
        format!("</{}>", self.as_str())
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lines one pull request contributed to one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedSection {
    pub category: Category,
    /// Title of the source PR
    pub title: String,
    /// URL of the source PR
    pub url: String,
    /// Non-blank lines from every matching block, in body order
    pub lines: Vec<String>,
}

impl TaggedSection {
    /// Heading line identifying the source PR.
    pub fn attribution(&self) -> String {
        format!("### [{}]({})", self.title, self.url)
    }
}

/// Extractor output: sections per category, in selection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    sections: [Vec<TaggedSection>; 3],
}

impl Extraction {
    pub fn push(&mut self, section: TaggedSection) {
        self.sections[section.category as usize].push(section);
    }

    pub fn sections(&self, category: Category) -> &[TaggedSection] {
        &self.sections[category as usize]
    }

    /// Attribution headings and content lines for `category`, flattened.
    pub fn lines(&self, category: Category) -> Vec<String> {
        self.sections(category)
            .iter()
            .flat_map(|s| std::iter::once(s.attribution()).chain(s.lines.iter().cloned()))
            .collect()
    }

    /// Number of contributing PRs per category.
    pub fn counts(&self) -> Vec<(Category, usize)> {
        Category::ALL
            .iter()
            .map(|&c| (c, self.sections(c).len()))
            .collect()
    }
}
