//! Streaming SVG optimizer.
//!
//! Applies a list of [`Transform`]s in one pass over `quick-xml` events and
//! serializes the surviving events back to text. Markup that does not parse
//! as well-formed XML is rejected with an [`OptimizeError`].

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, BytesText, Event};

/// Editor-origin name hint stripped by default.
pub const DEFAULT_STRIPPED_ATTRIBUTE: &str = "data-name";

/// Error optimizing a single icon.
#[derive(Debug, thiserror::Error)]
pub enum OptimizeError {
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("Invalid attribute: {0}")]
    Attribute(#[from] AttrError),
    #[error("Failed to serialize: {0}")]
    Write(#[from] std::io::Error),
    #[error("Unclosed element at end of document")]
    Unclosed,
    #[error("Output is not valid UTF-8")]
    Encoding,
}

/// A single optimization step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transform {
    /// Drop every attribute with this exact (qualified) name.
    RemoveAttribute(String),
    /// Drop `<!-- -->` comments.
    RemoveComments,
    /// Drop the XML declaration, doctype and processing instructions.
    RemoveProlog,
    /// Drop `<metadata>` elements and everything inside them.
    RemoveMetadata,
    /// Drop whitespace-only text that spans a line break (indentation).
    CollapseWhitespace,
}

/// Structural SVG optimizer.
#[derive(Clone, Debug)]
pub struct SvgOptimizer {
    transforms: Vec<Transform>,
}

impl Default for SvgOptimizer {
    fn default() -> Self {
        Self::new(vec![
            Transform::RemoveProlog,
            Transform::RemoveComments,
            Transform::RemoveMetadata,
            Transform::CollapseWhitespace,
            Transform::RemoveAttribute(DEFAULT_STRIPPED_ATTRIBUTE.to_owned()),
        ])
    }
}

impl SvgOptimizer {
    /// Create an optimizer with an explicit transform list.
    #[must_use]
    pub fn new(transforms: Vec<Transform>) -> Self {
        Self { transforms }
    }

    /// Default transforms, stripping `attributes` instead of `data-name`.
    #[must_use]
    pub fn with_stripped_attributes<I, S>(attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut optimizer = Self::default();
        optimizer
            .transforms
            .retain(|t| !matches!(t, Transform::RemoveAttribute(_)));
        optimizer.transforms.extend(
            attributes
                .into_iter()
                .map(|name| Transform::RemoveAttribute(name.into())),
        );
        optimizer
    }

    /// Configured transforms.
    #[must_use]
    pub fn transforms(&self) -> &[Transform] {
        &self.transforms
    }

    fn has(&self, transform: &Transform) -> bool {
        self.transforms.contains(transform)
    }

    fn strips_attribute(&self, key: &[u8]) -> bool {
        self.transforms.iter().any(|t| match t {
            Transform::RemoveAttribute(name) => name.as_bytes() == key,
            _ => false,
        })
    }

    fn drops_element(&self, element: &BytesStart<'_>) -> bool {
        self.has(&Transform::RemoveMetadata) && element.local_name().as_ref() == b"metadata"
    }

    /// Optimize SVG markup.
    pub fn optimize(&self, source: &str) -> Result<String, OptimizeError> {
        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text(false);

        let mut writer = Writer::new(Vec::with_capacity(source.len()));
        let mut depth = 0usize;
        // Depth of the dropped element we are inside, if any
        let mut dropped_at: Option<usize> = None;

        loop {
            match reader.read_event()? {
                Event::Eof => break,
                Event::Start(element) => {
                    depth += 1;
                    if dropped_at.is_some() {
                        continue;
                    }
                    if self.drops_element(&element) {
                        dropped_at = Some(depth);
                        continue;
                    }
                    writer.write_event(Event::Start(self.filter_attributes(&element)?))?;
                }
                Event::End(element) => {
                    let closing = depth;
                    depth = depth.saturating_sub(1);
                    if let Some(level) = dropped_at {
                        if level == closing {
                            dropped_at = None;
                        }
                        continue;
                    }
                    writer.write_event(Event::End(element))?;
                }
                Event::Empty(element) => {
                    if dropped_at.is_some() || self.drops_element(&element) {
                        continue;
                    }
                    writer.write_event(Event::Empty(self.filter_attributes(&element)?))?;
                }
                Event::Comment(_) if self.has(&Transform::RemoveComments) => {}
                Event::Decl(_) | Event::PI(_) | Event::DocType(_)
                    if self.has(&Transform::RemoveProlog) => {}
                Event::Text(text)
                    if self.has(&Transform::CollapseWhitespace) && is_indentation(&text) => {}
                event => {
                    if dropped_at.is_none() {
                        writer.write_event(event)?;
                    }
                }
            }
        }

        if depth != 0 {
            return Err(OptimizeError::Unclosed);
        }

        String::from_utf8(writer.into_inner()).map_err(|_| OptimizeError::Encoding)
    }

    /// Copy an element, dropping stripped attributes.
    fn filter_attributes(
        &self,
        element: &BytesStart<'_>,
    ) -> Result<BytesStart<'static>, OptimizeError> {
        let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();
        let mut filtered = BytesStart::new(name);
        for attribute in element.attributes() {
            let attribute = attribute?;
            if self.strips_attribute(attribute.key.as_ref()) {
                continue;
            }
            filtered.push_attribute(attribute);
        }
        Ok(filtered)
    }
}

/// Whitespace-only text containing a line break.
fn is_indentation(text: &BytesText<'_>) -> bool {
    let bytes: &[u8] = text;
    bytes.contains(&b'\n') && bytes.iter().all(u8::is_ascii_whitespace)
}
