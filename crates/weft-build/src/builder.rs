//! Static site builder.

use std::path::{Path, PathBuf};
use std::time::Instant;

use weft_config::Config;
use weft_html::{ImportDiagnostic, ResolveError, TemplateResolver};
use weft_sprite::{SpriteCompiler, SpriteError, SpriteReport, SvgOptimizer};

/// Page file extension.
const PAGE_EXTENSION: &str = "html";

/// Configuration for a production build.
#[derive(Clone, Debug)]
pub struct BuildConfig {
    /// Project source root.
    pub source_dir: PathBuf,
    /// Component directory name under `source_dir`. Its files are partials, not pages.
    pub components_dir: String,
    /// Output directory.
    pub out_dir: PathBuf,
    /// Directory scanned for `.svg` icons.
    pub icons_dir: PathBuf,
    /// URL path of the sprite, mirrored under `out_dir`.
    pub sprite_url_path: String,
    /// Attributes stripped from every icon.
    pub strip_attributes: Vec<String>,
}

impl BuildConfig {
    /// Build settings from a loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            source_dir: config.project_resolved.source_dir.clone(),
            components_dir: config.project_resolved.components_dir.clone(),
            out_dir: config.project_resolved.out_dir.clone(),
            icons_dir: config.sprite_resolved.icons_dir.clone(),
            sprite_url_path: config.sprite_resolved.url_path.clone(),
            strip_attributes: config.sprite_resolved.strip_attributes.clone(),
        }
    }

    /// Where the sprite lands in the output directory.
    #[must_use]
    pub fn sprite_output(&self) -> PathBuf {
        self.out_dir
            .join(self.sprite_url_path.trim_start_matches('/'))
    }

    fn components_root(&self) -> PathBuf {
        self.source_dir.join(&self.components_dir)
    }
}

/// Error returned by the site builder.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Source directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),
    #[error("Invalid source directory {}: {source}", path.display())]
    Pattern {
        path: PathBuf,
        #[source]
        source: glob::PatternError,
    },
    #[error(transparent)]
    Sprite(#[from] SpriteError),
    #[error(transparent)]
    Page(#[from] ResolveError),
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An import problem found while building a page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageDiagnostic {
    /// Page path relative to the source root.
    pub page: PathBuf,
    /// What went wrong.
    pub diagnostic: ImportDiagnostic,
}

/// Outcome of a build.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Written pages, relative to the output directory, in build order.
    pub pages: Vec<PathBuf>,
    /// Sprite compilation outcome.
    pub sprite: SpriteReport,
    /// Import diagnostics across all pages.
    pub diagnostics: Vec<PageDiagnostic>,
}

/// Build the site described by `config`.
pub fn build_site(config: &BuildConfig) -> Result<BuildReport, BuildError> {
    let start = Instant::now();

    if !config.source_dir.is_dir() {
        return Err(BuildError::SourceNotFound(config.source_dir.clone()));
    }

    let sprite = SpriteCompiler::new(&config.icons_dir, config.sprite_output())
        .with_optimizer(SvgOptimizer::with_stripped_attributes(
            config.strip_attributes.iter().cloned(),
        ))
        .compile()?;

    let resolver = TemplateResolver::new(Some(config.source_dir.clone()))
        .with_components_dir(config.components_dir.clone());

    let mut report = BuildReport {
        sprite,
        ..BuildReport::default()
    };

    for relative in find_pages(config)? {
        let expansion = resolver.expand_file(&config.source_dir.join(&relative))?;

        report
            .diagnostics
            .extend(expansion.diagnostics.into_iter().map(|diagnostic| PageDiagnostic {
                page: relative.clone(),
                diagnostic,
            }));

        write_page(&config.out_dir.join(&relative), &expansion.html)?;
        tracing::debug!(page = %relative.display(), "Wrote page");
        report.pages.push(relative);
    }

    tracing::info!(
        pages = report.pages.len(),
        symbols = report.sprite.symbols.len(),
        diagnostics = report.diagnostics.len(),
        elapsed_ms = start.elapsed().as_millis(),
        "Site built"
    );

    Ok(report)
}

/// Pages under the source root, relative to it, sorted.
///
/// Files inside the component directory and the output directory are skipped.
fn find_pages(config: &BuildConfig) -> Result<Vec<PathBuf>, BuildError> {
    let pattern = format!(
        "{}/**/*.{PAGE_EXTENSION}",
        glob::Pattern::escape(&config.source_dir.to_string_lossy())
    );
    let entries = glob::glob(&pattern).map_err(|source| BuildError::Pattern {
        path: config.source_dir.clone(),
        source,
    })?;

    let components_root = config.components_root();
    let mut pages: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(err) => {
                tracing::warn!(error = %err, "Skipping unreadable page path");
                None
            }
        })
        .filter(|path| path.is_file())
        .filter(|path| !path.starts_with(&components_root) && !path.starts_with(&config.out_dir))
        .filter_map(|path| path.strip_prefix(&config.source_dir).ok().map(Path::to_path_buf))
        .collect();

    pages.sort();
    Ok(pages)
}

fn write_page(path: &Path, html: &str) -> Result<(), BuildError> {
    let write_error = |source| BuildError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_error)?;
    }
    std::fs::write(path, html).map_err(write_error)
}
