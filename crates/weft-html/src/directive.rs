//! Import directive scanning.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

/// `<!-- @import: PATH -->` with PATH limited to ASCII word characters, `.`, `/`, `-` and `@`.
static IMPORT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!--\s*@import:\s*([A-Za-z0-9_./@-]+)\s*-->").unwrap());

/// An import directive found in a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Directive<'a> {
    /// Byte range of the whole `<!-- ... -->` marker.
    pub span: Range<usize>,
    /// Import path as written.
    pub path: &'a str,
}

/// Collect every import directive in document order.
///
/// Directives whose path contains characters outside the allowed set are
/// not recognized and stay in the document as ordinary comments.
pub fn scan_directives(document: &str) -> Vec<Directive<'_>> {
    IMPORT_PATTERN
        .captures_iter(document)
        .filter_map(|caps| {
            let marker = caps.get(0)?;
            let path = caps.get(1)?;
            Some(Directive {
                span: marker.range(),
                path: path.as_str(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_no_directives() {
        assert!(scan_directives("<p>plain</p><!-- comment -->").is_empty());
    }

    #[test]
    fn test_scan_single_directive() {
        let doc = "<main><!-- @import: header.html --></main>";
        let directives = scan_directives(doc);

        assert_eq!(directives.len(), 1);
        assert_eq!(directives[0].path, "header.html");
        assert_eq!(&doc[directives[0].span.clone()], "<!-- @import: header.html -->");
    }

    #[test]
    fn test_scan_preserves_document_order() {
        let doc = "<!-- @import: a.html -->x<!-- @import: b.html -->y<!-- @import: c.html -->";
        let paths: Vec<_> = scan_directives(doc).iter().map(|d| d.path).collect();

        assert_eq!(paths, vec!["a.html", "b.html", "c.html"]);
    }

    #[test]
    fn test_scan_whitespace_insignificant() {
        let doc = "<!--@import:a.html-->|<!--   @import:   b.html   -->|<!--\n@import:\nc.html\n-->";
        let paths: Vec<_> = scan_directives(doc).iter().map(|d| d.path).collect();

        assert_eq!(paths, vec!["a.html", "b.html", "c.html"]);
    }

    #[test]
    fn test_scan_alias_and_nested_paths() {
        let doc = "<!-- @import: @components/nav/menu-item.html --><!-- @import: ../shared/foot_er.html -->";
        let paths: Vec<_> = scan_directives(doc).iter().map(|d| d.path).collect();

        assert_eq!(
            paths,
            vec!["@components/nav/menu-item.html", "../shared/foot_er.html"]
        );
    }

    #[test]
    fn test_scan_rejects_disallowed_characters() {
        let doc = "<!-- @import: my file.html --><!-- @import: a?b.html --><!-- @import: \"x.html\" -->";

        assert!(scan_directives(doc).is_empty());
    }

    #[test]
    fn test_scan_requires_closing_marker() {
        assert!(scan_directives("<!-- @import: a.html").is_empty());
    }
}
