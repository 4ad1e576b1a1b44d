//! Sprite compilation.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use quick_xml::escape::escape;

use crate::extract::{check_standalone, extract_root};
use crate::optimize::SvgOptimizer;
use crate::scan::{IconEntry, scan_icons};

/// Opening tag of the sprite container. Hidden until symbols are referenced.
const SPRITE_OPEN: &str = concat!(
    r#"<svg xmlns="http://www.w3.org/2000/svg" "#,
    r#"xmlns:xlink="http://www.w3.org/1999/xlink" style="display: none">"#
);
const SPRITE_CLOSE: &str = "</svg>";

/// Error that prevents the sprite from being produced at all.
#[derive(Debug, thiserror::Error)]
pub enum SpriteError {
    #[error("Invalid icons directory {}: {source}", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: glob::PatternError,
    },
    #[error("Failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write sprite {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why an icon was left out of the sprite.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// File could not be read as UTF-8 text.
    Read(String),
    /// Optimizer or extraction rejected the markup.
    Optimize(String),
    /// Document has no root `<svg>` element.
    NoSvgRoot,
    /// Symbol markup relies on declarations outside the icon's root element.
    Markup(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(err) => write!(f, "read failed: {err}"),
            Self::Optimize(err) => write!(f, "optimization failed: {err}"),
            Self::NoSvgRoot => f.write_str("no root <svg> element"),
            Self::Markup(err) => write!(f, "unusable outside its document: {err}"),
        }
    }
}

/// An icon that was left out of the sprite.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedIcon {
    /// Icon source path.
    pub path: PathBuf,
    /// Reason it was skipped.
    pub reason: SkipReason,
}

/// Two icon files sharing one identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IconCollision {
    /// Shared identifier.
    pub id: String,
    /// File whose symbol was replaced.
    pub replaced: PathBuf,
    /// File whose symbol was kept.
    pub kept: PathBuf,
}

/// Outcome of a compile run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpriteReport {
    /// Identifiers of emitted symbols, in sprite order.
    pub symbols: Vec<String>,
    /// Icons left out of the sprite.
    pub skipped: Vec<SkippedIcon>,
    /// Identifier collisions between icon files.
    pub collisions: Vec<IconCollision>,
    /// Whether the sprite file was written (false when there are no icons).
    pub written: bool,
}

/// A single sprite entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Symbol {
    /// Symbol identifier, referenced as `sprite.svg#id`.
    pub id: String,
    /// Coordinate box of the source icon, if it declared one.
    pub view_box: Option<String>,
    /// Drawable markup.
    pub content: String,
    /// Prefixed namespaces declared on the source root, as `(prefix, uri)`.
    pub namespaces: Vec<(String, String)>,
}

impl Symbol {
    /// Render as a `<symbol>` element.
    #[must_use]
    pub fn to_markup(&self) -> String {
        let mut markup = format!(r#"<symbol id="{}""#, escape(self.id.as_str()));
        if let Some(view_box) = &self.view_box {
            markup.push_str(&format!(r#" viewBox="{}""#, escape(view_box.as_str())));
        }
        for (prefix, uri) in &self.namespaces {
            markup.push_str(&format!(r#" xmlns:{prefix}="{}""#, escape(uri.as_str())));
        }
        markup.push('>');
        markup.push_str(&self.content);
        markup.push_str("</symbol>");
        markup
    }
}

/// Wrap symbols in the hidden sprite container.
#[must_use]
pub fn render_sprite(symbols: &[Symbol]) -> String {
    let body: String = symbols.iter().map(Symbol::to_markup).collect();
    format!("{SPRITE_OPEN}{body}{SPRITE_CLOSE}")
}

/// Compiles a directory of icons into one sprite file.
#[derive(Clone, Debug)]
pub struct SpriteCompiler {
    icons_dir: PathBuf,
    output_path: PathBuf,
    optimizer: SvgOptimizer,
}

impl SpriteCompiler {
    /// Create a compiler with the default optimizer.
    #[must_use]
    pub fn new(icons_dir: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            icons_dir: icons_dir.into(),
            output_path: output_path.into(),
            optimizer: SvgOptimizer::default(),
        }
    }

    /// Use a custom optimizer.
    #[must_use]
    pub fn with_optimizer(mut self, optimizer: SvgOptimizer) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Icons source directory.
    #[must_use]
    pub fn icons_dir(&self) -> &Path {
        &self.icons_dir
    }

    /// Sprite output path.
    #[must_use]
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Regenerate the sprite from scratch.
    ///
    /// Does nothing when the icons directory holds no `.svg` files, so an
    /// existing sprite is never replaced by an empty one.
    pub fn compile(&self) -> Result<SpriteReport, SpriteError> {
        let start = Instant::now();
        let icons = scan_icons(&self.icons_dir).map_err(|source| SpriteError::Scan {
            path: self.icons_dir.clone(),
            source,
        })?;

        if icons.is_empty() {
            tracing::debug!(
                icons_dir = %self.icons_dir.display(),
                "No icons found, sprite not written"
            );
            return Ok(SpriteReport::default());
        }

        let (symbols, mut report) = self.build_symbols(&icons);
        self.write(&render_sprite(&symbols))?;
        report.written = true;

        tracing::info!(
            output = %self.output_path.display(),
            symbols = report.symbols.len(),
            skipped = report.skipped.len(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Sprite compiled"
        );

        Ok(report)
    }

    /// Build one symbol per icon, in icon order.
    ///
    /// A later icon with an already-used identifier replaces the earlier
    /// symbol in place.
    fn build_symbols(&self, icons: &[IconEntry]) -> (Vec<Symbol>, SpriteReport) {
        let mut symbols: Vec<Symbol> = Vec::with_capacity(icons.len());
        let mut sources: Vec<&Path> = Vec::with_capacity(icons.len());
        let mut index_by_id: HashMap<String, usize> = HashMap::new();
        let mut report = SpriteReport::default();

        for icon in icons {
            let symbol = match self.build_symbol(icon) {
                Ok(symbol) => symbol,
                Err(reason) => {
                    tracing::warn!(path = %icon.path.display(), %reason, "Skipping icon");
                    report.skipped.push(SkippedIcon {
                        path: icon.path.clone(),
                        reason,
                    });
                    continue;
                }
            };

            if let Some(&index) = index_by_id.get(&symbol.id) {
                tracing::warn!(
                    id = %symbol.id,
                    replaced = %sources[index].display(),
                    kept = %icon.path.display(),
                    "Duplicate icon identifier"
                );
                report.collisions.push(IconCollision {
                    id: symbol.id.clone(),
                    replaced: sources[index].to_path_buf(),
                    kept: icon.path.clone(),
                });
                symbols[index] = symbol;
                sources[index] = icon.path.as_path();
            } else {
                index_by_id.insert(symbol.id.clone(), symbols.len());
                symbols.push(symbol);
                sources.push(icon.path.as_path());
            }
        }

        report.symbols = symbols.iter().map(|s| s.id.clone()).collect();
        (symbols, report)
    }

    fn build_symbol(&self, icon: &IconEntry) -> Result<Symbol, SkipReason> {
        let source =
            std::fs::read_to_string(&icon.path).map_err(|e| SkipReason::Read(e.to_string()))?;
        let optimized = self
            .optimizer
            .optimize(&source)
            .map_err(|e| SkipReason::Optimize(e.to_string()))?;
        let root = extract_root(&optimized)
            .map_err(|e| SkipReason::Optimize(e.to_string()))?
            .ok_or(SkipReason::NoSvgRoot)?;

        let symbol = Symbol {
            id: icon.id.clone(),
            view_box: root.view_box,
            content: root.inner,
            namespaces: root.namespaces,
        };
        // Checked inside the container so its own declarations are in scope
        check_standalone(&render_sprite(std::slice::from_ref(&symbol)))
            .map_err(|e| SkipReason::Markup(e.to_string()))?;

        Ok(symbol)
    }

    fn write(&self, sprite: &str) -> Result<(), SpriteError> {
        if let Some(parent) = self.output_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|source| SpriteError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&self.output_path, sprite).map_err(|source| SpriteError::Write {
            path: self.output_path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn write_icon(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn symbol_count(sprite: &str) -> usize {
        sprite.matches("<symbol ").count()
    }

    #[test]
    fn test_compile_three_valid_one_broken() {
        let dir = tempfile::tempdir().unwrap();
        let icons = dir.path().join("icons");
        write_icon(&icons, "arrow.svg", r#"<svg viewBox="0 0 24 24"><path d="M1 1"/></svg>"#);
        write_icon(&icons, "close.svg", r#"<svg viewBox="0 0 16 16"><path d="M2 2"/></svg>"#);
        write_icon(&icons, "ui/star.svg", r#"<svg viewBox="0 0 20 20"><path d="M3 3"/></svg>"#);
        write_icon(&icons, "broken.svg", "<svg><g></svg>");
        let output = dir.path().join("out/sprite.svg");

        let report = SpriteCompiler::new(&icons, &output).compile().unwrap();
        let sprite = fs::read_to_string(&output).unwrap();

        assert!(report.written);
        assert_eq!(report.symbols, vec!["arrow", "close", "star"]);
        assert_eq!(symbol_count(&sprite), 3);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].path, icons.join("broken.svg"));
        assert!(matches!(report.skipped[0].reason, SkipReason::Optimize(_)));
        assert!(!sprite.contains("broken"));
    }

    #[test]
    fn test_compile_full_output() {
        let dir = tempfile::tempdir().unwrap();
        let icons = dir.path().join("icons");
        write_icon(
            &icons,
            "home.svg",
            "<?xml version=\"1.0\"?>\n<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 24 24\" data-name=\"Layer 1\">\n  <path data-name=\"roof\" d=\"M0 12L12 0\"/>\n</svg>\n",
        );
        write_icon(&icons, "dot.svg", "<svg><circle r=\"1\"/></svg>");
        let output = dir.path().join("sprite.svg");

        SpriteCompiler::new(&icons, &output).compile().unwrap();

        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            concat!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" "#,
                r#"xmlns:xlink="http://www.w3.org/1999/xlink" style="display: none">"#,
                r#"<symbol id="dot"><circle r="1"/></symbol>"#,
                r#"<symbol id="home" viewBox="0 0 24 24"><path d="M0 12L12 0"/></symbol>"#,
                "</svg>"
            )
        );
    }

    #[test]
    fn test_view_box_propagation() {
        let dir = tempfile::tempdir().unwrap();
        let icons = dir.path().join("icons");
        write_icon(&icons, "with.svg", r#"<svg viewBox="0 0 24 24"><g/></svg>"#);
        write_icon(&icons, "without.svg", r#"<svg width="24" height="24"><g/></svg>"#);
        let output = dir.path().join("sprite.svg");

        SpriteCompiler::new(&icons, &output).compile().unwrap();
        let sprite = fs::read_to_string(&output).unwrap();

        assert!(sprite.contains(r#"<symbol id="with" viewBox="0 0 24 24">"#));
        assert!(sprite.contains(r#"<symbol id="without">"#));
        assert_eq!(sprite.matches("viewBox").count(), 1);
    }

    #[test]
    fn test_empty_icon_dir_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let icons = dir.path().join("icons");
        fs::create_dir_all(&icons).unwrap();
        fs::write(icons.join("readme.txt"), "no icons here").unwrap();
        let output = dir.path().join("out/sprite.svg");

        let report = SpriteCompiler::new(&icons, &output).compile().unwrap();

        assert!(!report.written);
        assert!(!output.exists());
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_empty_icon_dir_keeps_previous_sprite() {
        let dir = tempfile::tempdir().unwrap();
        let icons = dir.path().join("icons");
        fs::create_dir_all(&icons).unwrap();
        let output = dir.path().join("sprite.svg");
        fs::write(&output, "previous").unwrap();

        SpriteCompiler::new(&icons, &output).compile().unwrap();

        assert_eq!(fs::read_to_string(&output).unwrap(), "previous");
    }

    #[test]
    fn test_compile_overwrites_previous_sprite() {
        let dir = tempfile::tempdir().unwrap();
        let icons = dir.path().join("icons");
        write_icon(&icons, "a.svg", "<svg><g/></svg>");
        let output = dir.path().join("sprite.svg");
        fs::write(&output, "stale content").unwrap();

        SpriteCompiler::new(&icons, &output).compile().unwrap();

        assert!(!fs::read_to_string(&output).unwrap().contains("stale"));
    }

    #[test]
    fn test_non_svg_root_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let icons = dir.path().join("icons");
        write_icon(&icons, "odd.svg", "<div><svg/></div>");
        write_icon(&icons, "ok.svg", "<svg><g/></svg>");
        let output = dir.path().join("sprite.svg");

        let report = SpriteCompiler::new(&icons, &output).compile().unwrap();

        assert_eq!(report.symbols, vec!["ok"]);
        assert_eq!(report.skipped[0].reason, SkipReason::NoSvgRoot);
    }

    #[test]
    fn test_all_icons_broken_writes_empty_container() {
        let dir = tempfile::tempdir().unwrap();
        let icons = dir.path().join("icons");
        write_icon(&icons, "bad.svg", "<svg>");
        let output = dir.path().join("sprite.svg");

        let report = SpriteCompiler::new(&icons, &output).compile().unwrap();

        assert!(report.written);
        assert!(report.symbols.is_empty());
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            format!("{SPRITE_OPEN}{SPRITE_CLOSE}")
        );
    }

    #[test]
    fn test_identifier_collision_last_wins_and_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let icons = dir.path().join("icons");
        write_icon(&icons, "a/logo.svg", "<svg><g id=\"first\"/></svg>");
        write_icon(&icons, "b/logo.svg", "<svg><g id=\"second\"/></svg>");
        write_icon(&icons, "c.svg", "<svg><g/></svg>");
        let output = dir.path().join("sprite.svg");

        let report = SpriteCompiler::new(&icons, &output).compile().unwrap();
        let sprite = fs::read_to_string(&output).unwrap();

        assert_eq!(report.symbols, vec!["logo", "c"]);
        assert_eq!(
            report.collisions,
            vec![IconCollision {
                id: "logo".to_owned(),
                replaced: icons.join("a/logo.svg"),
                kept: icons.join("b/logo.svg"),
            }]
        );
        assert_eq!(sprite.matches(r#"id="logo""#).count(), 1);
        assert!(sprite.contains("second"));
        assert!(!sprite.contains("first"));
    }

    #[test]
    fn test_custom_optimizer() {
        let dir = tempfile::tempdir().unwrap();
        let icons = dir.path().join("icons");
        write_icon(&icons, "x.svg", r#"<svg><path class="fill" d="M0"/></svg>"#);
        let output = dir.path().join("sprite.svg");

        SpriteCompiler::new(&icons, &output)
            .with_optimizer(SvgOptimizer::with_stripped_attributes(["class"]))
            .compile()
            .unwrap();

        assert!(!fs::read_to_string(&output).unwrap().contains("class"));
    }

    fn assert_namespace_well_formed(sprite: &str) {
        let mut reader = quick_xml::NsReader::from_str(sprite);
        loop {
            let (namespace, event) = reader.read_resolved_event().unwrap();
            assert!(
                !matches!(namespace, quick_xml::name::ResolveResult::Unknown(_)),
                "unbound element prefix in {sprite}"
            );
            match event {
                quick_xml::events::Event::Start(element)
                | quick_xml::events::Event::Empty(element) => {
                    for attribute in element.attributes() {
                        let attribute = attribute.unwrap();
                        let (namespace, _) = reader.resolve_attribute(attribute.key);
                        assert!(
                            !matches!(namespace, quick_xml::name::ResolveResult::Unknown(_)),
                            "unbound attribute prefix in {sprite}"
                        );
                        attribute.unescape_value().unwrap();
                    }
                }
                quick_xml::events::Event::Eof => break,
                _ => {}
            }
        }
    }

    #[test]
    fn test_xlink_icon_keeps_sprite_well_formed() {
        let dir = tempfile::tempdir().unwrap();
        let icons = dir.path().join("icons");
        write_icon(&icons, "good.svg", r#"<svg viewBox="0 0 24 24"><path d="M1 1"/></svg>"#);
        write_icon(
            &icons,
            "grad.svg",
            r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" viewBox="0 0 24 24"><defs><path id="p" d="M0 0"/></defs><use xlink:href="#p"/></svg>"##,
        );
        let output = dir.path().join("sprite.svg");

        let report = SpriteCompiler::new(&icons, &output).compile().unwrap();
        let sprite = fs::read_to_string(&output).unwrap();

        assert_eq!(report.symbols, vec!["good", "grad"]);
        assert!(report.skipped.is_empty());
        assert!(sprite.contains(r##"<use xlink:href="#p"/>"##));
        assert_namespace_well_formed(&sprite);
    }

    #[test]
    fn test_custom_prefix_redeclared_on_symbol() {
        let dir = tempfile::tempdir().unwrap();
        let icons = dir.path().join("icons");
        write_icon(
            &icons,
            "brand.svg",
            r#"<svg xmlns:sketch="http://www.bohemiancoding.com/sketch/ns"><g sketch:type="MSPage"/></svg>"#,
        );
        let output = dir.path().join("sprite.svg");

        let report = SpriteCompiler::new(&icons, &output).compile().unwrap();
        let sprite = fs::read_to_string(&output).unwrap();

        assert_eq!(report.symbols, vec!["brand"]);
        assert!(sprite.contains(
            r#"<symbol id="brand" xmlns:sketch="http://www.bohemiancoding.com/sketch/ns">"#
        ));
        assert_namespace_well_formed(&sprite);
    }

    #[test]
    fn test_dtd_dependent_icon_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let icons = dir.path().join("icons");
        write_icon(&icons, "good.svg", "<svg><g/></svg>");
        write_icon(
            &icons,
            "illustrator.svg",
            concat!(
                "<?xml version=\"1.0\"?>\n",
                "<!DOCTYPE svg [<!ENTITY ns_extend \"http://ns.adobe.com/Extensibility/1.0/\">]>\n",
                r#"<svg xmlns:x="&ns_extend;"><g x:type="layer"/></svg>"#
            ),
        );
        write_icon(&icons, "text.svg", "<svg><text>&ns_ai;</text></svg>");
        let output = dir.path().join("sprite.svg");

        let report = SpriteCompiler::new(&icons, &output).compile().unwrap();
        let sprite = fs::read_to_string(&output).unwrap();

        assert_eq!(report.symbols, vec!["good"]);
        assert_eq!(report.skipped.len(), 2);
        assert!(
            report
                .skipped
                .iter()
                .all(|s| matches!(s.reason, SkipReason::Markup(_)))
        );
        assert_namespace_well_formed(&sprite);
    }

    #[test]
    fn test_symbol_markup_escapes_attributes() {
        let symbol = Symbol {
            id: "a\"b".to_owned(),
            view_box: Some("0 0 1 1".to_owned()),
            content: "<g/>".to_owned(),
            namespaces: Vec::new(),
        };

        assert_eq!(
            symbol.to_markup(),
            r#"<symbol id="a&quot;b" viewBox="0 0 1 1"><g/></symbol>"#
        );
    }
}
