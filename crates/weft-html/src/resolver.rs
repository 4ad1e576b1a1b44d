//! Recursive import expansion.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::directive::{Directive, scan_directives};
use crate::path::normalize;

/// Import path prefix that resolves against the component directory.
pub const COMPONENT_ALIAS: &str = "@components";

/// Default component directory name under the source root.
pub const DEFAULT_COMPONENTS_DIR: &str = "components";

/// Error reading an entry page.
///
/// Only the page handed to [`TemplateResolver::expand_file`] can fail this
/// way. Unreadable imports below it become [`ImportDiagnostic::Missing`].
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A broken import that was replaced by an inline comment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImportDiagnostic {
    /// Target file does not exist or could not be read.
    Missing {
        /// Resolved path that was attempted.
        path: PathBuf,
    },
    /// Target file is already an ancestor in the current import chain.
    Circular {
        /// Resolved path of the ancestor.
        path: PathBuf,
    },
}

impl ImportDiagnostic {
    /// Resolved path the diagnostic refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Missing { path } | Self::Circular { path } => path,
        }
    }

    /// HTML comment spliced into the document in place of the directive.
    ///
    /// Runs of `-` in the path are broken up, since `--` may not appear
    /// inside a comment.
    #[must_use]
    pub fn to_comment(&self) -> String {
        format!("<!-- {} -->", comment_safe(&self.to_string()))
    }
}

fn comment_safe(text: &str) -> String {
    let mut safe = String::with_capacity(text.len());
    let mut previous = None;
    for c in text.chars() {
        if c == '-' && previous == Some('-') {
            safe.push(' ');
        }
        safe.push(c);
        previous = Some(c);
    }
    safe
}

impl fmt::Display for ImportDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { path } => write!(f, "Import not found: {}", path.display()),
            Self::Circular { path } => {
                write!(f, "Circular import detected: {}", path.display())
            }
        }
    }
}

/// Result of expanding a document.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Expansion {
    /// Document with every resolvable directive replaced by its content.
    pub html: String,
    /// Broken imports, in document order, each already rendered inline.
    pub diagnostics: Vec<ImportDiagnostic>,
}

impl Expansion {
    /// Whether every import resolved.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Expands `<!-- @import: PATH -->` directives recursively.
///
/// The resolver holds no per-call state: the ancestry set travels with each
/// expansion branch, so one resolver can serve concurrent callers.
#[derive(Clone, Debug)]
pub struct TemplateResolver {
    source_root: Option<PathBuf>,
    components_dir: String,
}

impl TemplateResolver {
    /// Create a resolver.
    ///
    /// `source_root` is the project source directory that `@components/`
    /// imports resolve under. Without it, aliased imports resolve like plain
    /// relative paths and end up reported as missing.
    #[must_use]
    pub fn new(source_root: Option<PathBuf>) -> Self {
        Self {
            source_root: source_root.map(|root| normalize(&root)),
            components_dir: DEFAULT_COMPONENTS_DIR.to_owned(),
        }
    }

    /// Use a different component directory name under the source root.
    #[must_use]
    pub fn with_components_dir(mut self, components_dir: impl Into<String>) -> Self {
        self.components_dir = components_dir.into();
        self
    }

    /// Configured source root, normalized.
    #[must_use]
    pub fn source_root(&self) -> Option<&Path> {
        self.source_root.as_deref()
    }

    /// Directory that `@components/` maps to, if a source root is configured.
    #[must_use]
    pub fn components_root(&self) -> Option<PathBuf> {
        self.source_root
            .as_ref()
            .map(|root| root.join(&self.components_dir))
    }

    /// Resolve an import path to the absolute file it refers to.
    #[must_use]
    pub fn resolve_target(&self, import_path: &str, base_dir: &Path) -> PathBuf {
        let aliased = import_path
            .strip_prefix(COMPONENT_ALIAS)
            .and_then(|rest| rest.strip_prefix('/'))
            .zip(self.components_root());

        match aliased {
            Some((rest, components_root)) => normalize(&components_root.join(rest)),
            None => normalize(&base_dir.join(import_path)),
        }
    }

    /// Read a page and expand it.
    ///
    /// The page itself is part of the ancestry, so a page that imports
    /// itself (directly or through partials) is reported as circular.
    pub fn expand_file(&self, path: &Path) -> Result<Expansion, ResolveError> {
        let path = normalize(path);
        let document = std::fs::read_to_string(&path).map_err(|source| ResolveError::Read {
            path: path.clone(),
            source,
        })?;

        let base_dir = path.parent().unwrap_or(Path::new("/")).to_path_buf();
        let ancestry = HashSet::from([path]);
        Ok(self.expand(&document, &base_dir, &ancestry))
    }

    /// Expand every import directive in `document`.
    ///
    /// `base_dir` is the directory relative imports resolve against.
    /// `ancestry` holds the absolute paths of the files that (transitively)
    /// imported this document; importing any of them again is a cycle.
    #[must_use]
    pub fn expand(
        &self,
        document: &str,
        base_dir: &Path,
        ancestry: &HashSet<PathBuf>,
    ) -> Expansion {
        let mut diagnostics = Vec::new();
        let html =
            self.expand_document(document, &normalize(base_dir), ancestry, &mut diagnostics);
        Expansion { html, diagnostics }
    }

    fn expand_document(
        &self,
        document: &str,
        base_dir: &Path,
        ancestry: &HashSet<PathBuf>,
        diagnostics: &mut Vec<ImportDiagnostic>,
    ) -> String {
        // Collect every match before producing output; spans index the original text
        let directives = scan_directives(document);
        if directives.is_empty() {
            return document.to_owned();
        }

        let mut output = String::with_capacity(document.len());
        let mut cursor = 0;
        for directive in &directives {
            output.push_str(&document[cursor..directive.span.start]);
            output.push_str(&self.replacement(directive, base_dir, ancestry, diagnostics));
            cursor = directive.span.end;
        }
        output.push_str(&document[cursor..]);
        output
    }

    /// Content that replaces a single directive.
    fn replacement(
        &self,
        directive: &Directive<'_>,
        base_dir: &Path,
        ancestry: &HashSet<PathBuf>,
        diagnostics: &mut Vec<ImportDiagnostic>,
    ) -> String {
        let target = self.resolve_target(directive.path, base_dir);

        if ancestry.contains(&target) {
            tracing::warn!(import = directive.path, path = %target.display(), "Circular import");
            return record(diagnostics, ImportDiagnostic::Circular { path: target });
        }

        let content = match std::fs::read_to_string(&target) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!(
                    import = directive.path,
                    path = %target.display(),
                    error = %err,
                    "Import not found"
                );
                return record(diagnostics, ImportDiagnostic::Missing { path: target });
            }
        };

        tracing::debug!(path = %target.display(), "Expanding import");

        let child_base = target.parent().unwrap_or(base_dir).to_path_buf();
        let mut branch = ancestry.clone();
        branch.insert(target);
        self.expand_document(&content, &child_base, &branch, diagnostics)
    }
}

/// Record a diagnostic and return its inline comment.
fn record(diagnostics: &mut Vec<ImportDiagnostic>, diagnostic: ImportDiagnostic) -> String {
    let comment = diagnostic.to_comment();
    diagnostics.push(diagnostic);
    comment
}
