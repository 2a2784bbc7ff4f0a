//! URL-safe slugs.

use std::collections::HashMap;

/// Maximum slug length in bytes.
pub const MAX_SLUG_LEN: usize = 100;

/// Convert text to a URL-safe slug.
///
/// Non-ASCII characters are transliterated, everything is lowercased, and
/// runs of anything other than ASCII letters and digits collapse to a single
/// hyphen. Leading and trailing hyphens are removed and the result is capped
/// at [`MAX_SLUG_LEN`].
///
/// # Examples
///
/// ```
/// use folio_markdown::slugify;
///
/// assert_eq!(slugify("Hello, World!"), "hello-world");
/// assert_eq!(slugify("Café Crème"), "cafe-creme");
/// ```
#[must_use]
pub fn slugify(text: &str) -> String {
    let ascii = deunicode::deunicode(text);
    let mut slug = String::with_capacity(ascii.len());
    let mut pending_hyphen = false;

    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        while slug.ends_with('-') {
            slug.pop();
        }
    }
    slug
}

/// Allocates unique heading anchor ids within one document.
#[derive(Debug, Default)]
pub(crate) struct HeadingIds {
    seen: HashMap<String, usize>,
}

impl HeadingIds {
    /// Record an author-supplied id so generated ids avoid it.
    pub(crate) fn reserve(&mut self, id: &str) {
        self.seen.entry(id.to_owned()).or_insert(0);
    }

    /// Generate an id from heading text, suffixing `-1`, `-2`... on repeats.
    pub(crate) fn generate(&mut self, text: &str) -> String {
        let mut base = slugify(text);
        if base.is_empty() {
            base = "section".to_owned();
        }

        let Some(&last) = self.seen.get(&base) else {
            self.seen.insert(base.clone(), 0);
            return base;
        };

        let mut count = last;
        loop {
            count += 1;
            let candidate = format!("{base}-{count}");
            if !self.seen.contains_key(&candidate) {
                self.seen.insert(base, count);
                self.seen.insert(candidate.clone(), 0);
                return candidate;
            }
        }
    }
}
