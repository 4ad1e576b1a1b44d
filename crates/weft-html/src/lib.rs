//! HTML import resolution for weft.
//!
//! Pages are composed from partials with import directives embedded as HTML
//! comments:
//!
//! ```html
//! <body>
//!   <!-- @import: partials/header.html -->
//!   <!-- @import: @components/card.html -->
//! </body>
//! ```
//!
//! Plain paths resolve relative to the importing file's directory. Paths
//! starting with `@components/` resolve against the component directory of
//! the configured project source root, wherever the importing file lives.
//!
//! Expansion never fails on a broken include. A missing target or a cycle in
//! the import chain is replaced by an inline diagnostic comment and recorded
//! in [`Expansion::diagnostics`]; the rest of the page still expands.
//!
//! # Example
//!
//! ```ignore
//! use std::path::PathBuf;
//! use weft_html::TemplateResolver;
//!
//! let resolver = TemplateResolver::new(Some(PathBuf::from("src")));
//! let expansion = resolver.expand_file(std::path::Path::new("src/index.html"))?;
//! for diagnostic in &expansion.diagnostics {
//!     eprintln!("{diagnostic}");
//! }
//! ```

mod directive;
mod path;
mod resolver;

pub use directive::{Directive, scan_directives};
pub use resolver::{
    COMPONENT_ALIAS, DEFAULT_COMPONENTS_DIR, Expansion, ImportDiagnostic, ResolveError,
    TemplateResolver,
};
