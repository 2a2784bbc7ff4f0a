//! Relative link resolution.

use std::borrow::Cow;

/// Rewrites file-relative link targets into site-absolute paths.
///
/// The base is `url_root` joined with the source file's directory relative to
/// the content root. A leading `../` climbs one segment (never above the
/// empty path), a leading `./` is dropped, and the remainder is appended.
#[derive(Clone, Debug)]
pub struct PathResolver {
    leading_slash: bool,
    segments: Vec<String>,
}

impl PathResolver {
    /// Create a resolver for files under `relative_dir`.
    ///
    /// Both arguments accept `/` or `\` separators; empty segments are
    /// ignored.
    #[must_use]
    pub fn new(url_root: &str, relative_dir: &str) -> Self {
        let segments = split_segments(url_root)
            .chain(split_segments(relative_dir))
            .map(str::to_owned)
            .collect();
        Self {
            leading_slash: url_root.starts_with('/'),
            segments,
        }
    }

    /// The base path targets are resolved against.
    #[must_use]
    pub fn base(&self) -> String {
        self.join(&self.segments)
    }

    /// Resolve a link or image target.
    ///
    /// Targets that [`is_rewritable`] rejects are returned unchanged.
    #[must_use]
    pub fn resolve<'a>(&self, target: &'a str) -> Cow<'a, str> {
        if !is_rewritable(target) {
            return Cow::Borrowed(target);
        }

        let mut segments: Vec<&str> = self.segments.iter().map(String::as_str).collect();
        let mut rest = target;
        loop {
            if let Some(stripped) = rest.strip_prefix("../") {
                segments.pop();
                rest = stripped;
            } else if let Some(stripped) = rest.strip_prefix("./") {
                rest = stripped;
            } else {
                break;
            }
        }
        if !rest.is_empty() {
            segments.push(rest);
        }

        Cow::Owned(self.join(&segments))
    }

    fn join<S: AsRef<str>>(&self, segments: &[S]) -> String {
        let joined = segments
            .iter()
            .map(AsRef::<str>::as_ref)
            .collect::<Vec<_>>()
            .join("/");
        if self.leading_slash {
            format!("/{joined}")
        } else {
            joined
        }
    }
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(['/', '\\']).filter(|s| !s.is_empty() && *s != ".")
}

/// Whether a link target is file-relative and should be rewritten.
///
/// Rejects empty targets, anchors, targets carrying a query or fragment,
/// root-absolute and protocol-relative paths, and anything with a URL scheme
/// (`https:`, `mailto:`, `data:`...).
#[must_use]
pub fn is_rewritable(target: &str) -> bool {
    !(target.is_empty()
        || target.starts_with('/')
        || target.contains(['#', '?'])
        || has_scheme(target))
}

fn has_scheme(target: &str) -> bool {
    let Some((scheme, _)) = target.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base() {
        assert_eq!(PathResolver::new("blog", "2024/04").base(), "blog/2024/04");
        assert_eq!(PathResolver::new("/media/", "2024").base(), "/media/2024");
        assert_eq!(PathResolver::new("", "").base(), "");
        assert_eq!(PathResolver::new("blog", "2024\\04").base(), "blog/2024/04");
    }

    #[test]
    fn test_resolve_parent_segments() {
        let resolver = PathResolver::new("blog", "2024/04");
        assert_eq!(resolver.resolve("../../media/a.png"), "blog/media/a.png");
        assert_eq!(resolver.resolve("../x.md"), "blog/2024/x.md");
    }

    #[test]
    fn test_resolve_plain_relative() {
        let resolver = PathResolver::new("blog", "2024/04");
        assert_eq!(resolver.resolve("sub/img.png"), "blog/2024/04/sub/img.png");
        assert_eq!(resolver.resolve("./img.png"), "blog/2024/04/img.png");
    }

    #[test]
    fn test_resolve_never_climbs_above_root() {
        let resolver = PathResolver::new("blog", "");
        assert_eq!(resolver.resolve("../../../../a.png"), "a.png");
    }

    #[test]
    fn test_resolve_keeps_leading_slash() {
        let resolver = PathResolver::new("/blog", "2024");
        assert_eq!(resolver.resolve("../a.png"), "/blog/a.png");
    }

    #[test]
    fn test_unchanged_targets() {
        let resolver = PathResolver::new("blog", "2024/04");
        for target in [
            "https://example.com/a.png",
            "http://example.com",
            "mailto:me@example.com",
            "tel:+123",
            "ftp://files.example.com/a",
            "data:image/png;base64,AAAA",
            "//cdn.example.com/a.js",
            "/absolute/path.png",
            "#section",
            "page.md#section",
            "search?q=rust",
            "",
        ] {
            assert!(
                matches!(resolver.resolve(target), Cow::Borrowed(t) if t == target),
                "{target} should be unchanged"
            );
        }
    }

    #[test]
    fn test_is_rewritable() {
        assert!(is_rewritable("img.png"));
        assert!(is_rewritable("../img.png"));
        assert!(!is_rewritable("HTTPS://EXAMPLE.COM"));
        assert!(is_rewritable("2024:notes.md"));
    }
}
