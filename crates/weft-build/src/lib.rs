//! Production build for weft sites.
//!
//! Compiles the icon sprite and writes every page under the source root,
//! with its imports expanded, into the output directory.

mod builder;

pub use builder::{BuildConfig, BuildError, BuildReport, PageDiagnostic, build_site};
