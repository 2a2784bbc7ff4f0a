//! Table of contents.

use serde::Serialize;

/// A heading as it appears in a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Heading {
    /// Heading level (1-6).
    pub level: u8,
    /// Anchor id, if the heading has one.
    pub id: Option<String>,
    /// Plain-text title.
    pub title: String,
}

/// Node in a table of contents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    /// Plain-text title.
    pub title: String,
    /// Anchor id.
    pub id: String,
    /// Nested entries, in document order.
    pub children: Vec<TocEntry>,
}

impl TocEntry {
    /// Create a leaf entry.
    #[must_use]
    pub fn new(title: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            id: id.into(),
            children: Vec::new(),
        }
    }
}

/// Nest headings into a forest.
///
/// Each heading becomes a child of the nearest preceding heading with a
/// strictly lower level; headings with no such predecessor are roots.
/// Headings without an anchor id are dropped without affecting the nesting of
/// the headings around them. Runs in linear time.
#[must_use]
pub fn build_toc(headings: &[Heading]) -> Vec<TocEntry> {
    let mut roots: Vec<TocEntry> = Vec::new();
    // Levels along the rightmost path, root first.
    let mut levels: Vec<u8> = Vec::new();

    for heading in headings {
        let Some(id) = &heading.id else {
            continue;
        };

        while levels.last().is_some_and(|&level| level >= heading.level) {
            levels.pop();
        }

        let entry = TocEntry::new(heading.title.clone(), id.clone());
        match rightmost(&mut roots, levels.len()) {
            Some(parent) => parent.children.push(entry),
            None => roots.push(entry),
        }
        levels.push(heading.level);
    }

    roots
}

/// Entry at `depth` along the rightmost path (1 = last root).
fn rightmost(roots: &mut [TocEntry], depth: usize) -> Option<&mut TocEntry> {
    if depth == 0 {
        return None;
    }
    let mut node = roots.last_mut()?;
    for _ in 1..depth {
        node = node.children.last_mut()?;
    }
    Some(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn heading(level: u8, id: &str) -> Heading {
        Heading {
            level,
            id: Some(id.to_owned()),
            title: id.to_uppercase(),
        }
    }

    fn unanchored(level: u8, title: &str) -> Heading {
        Heading {
            level,
            id: None,
            title: title.to_owned(),
        }
    }

    fn entry(id: &str, children: Vec<TocEntry>) -> TocEntry {
        TocEntry {
            title: id.to_uppercase(),
            id: id.to_owned(),
            children,
        }
    }

    #[test]
    fn test_empty() {
        assert!(build_toc(&[]).is_empty());
    }

    #[test]
    fn test_nesting_levels_1_2_2_3_2() {
        let headings = vec![
            heading(1, "a"),
            heading(2, "b"),
            heading(2, "c"),
            heading(3, "d"),
            heading(2, "e"),
        ];

        assert_eq!(
            build_toc(&headings),
            vec![entry(
                "a",
                vec![
                    entry("b", vec![]),
                    entry("c", vec![entry("d", vec![])]),
                    entry("e", vec![]),
                ],
            )]
        );
    }

    #[test]
    fn test_multiple_roots() {
        let headings = vec![heading(2, "a"), heading(3, "b"), heading(2, "c")];

        assert_eq!(
            build_toc(&headings),
            vec![entry("a", vec![entry("b", vec![])]), entry("c", vec![])]
        );
    }

    #[test]
    fn test_skipped_level_nests_under_nearest_lower() {
        let headings = vec![heading(1, "a"), heading(4, "b"), heading(2, "c")];

        assert_eq!(
            build_toc(&headings),
            vec![entry("a", vec![entry("b", vec![]), entry("c", vec![])])]
        );
    }

    #[test]
    fn test_starting_below_top_level() {
        let headings = vec![heading(3, "a"), heading(1, "b"), heading(2, "c")];

        assert_eq!(
            build_toc(&headings),
            vec![entry("a", vec![]), entry("b", vec![entry("c", vec![])])]
        );
    }

    #[test]
    fn test_missing_id_does_not_disconnect() {
        let headings = vec![
            heading(1, "a"),
            unanchored(2, "No anchor"),
            heading(3, "b"),
            heading(2, "c"),
        ];

        assert_eq!(
            build_toc(&headings),
            vec![entry("a", vec![entry("b", vec![]), entry("c", vec![])])]
        );
    }

    #[test]
    fn test_all_missing_ids() {
        let headings = vec![unanchored(1, "x"), unanchored(2, "y")];
        assert!(build_toc(&headings).is_empty());
    }

    #[test]
    fn test_deep_chain() {
        let headings: Vec<Heading> = (1..=6).map(|l| heading(l, &format!("h{l}"))).collect();
        let toc = build_toc(&headings);

        let mut depth = 0;
        let mut node = toc.first();
        while let Some(n) = node {
            depth += 1;
            node = n.children.first();
        }
        assert_eq!(depth, 6);
    }
}
