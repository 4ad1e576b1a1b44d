//! Root element extraction.
//!
//! Finds the outermost `<svg>` element of an icon document and returns its
//! inner markup, `viewBox` and prefixed namespace declarations. Works on
//! parsed events, so `>` inside attribute values or nested `<svg>` elements
//! cannot confuse it.

use std::borrow::Cow;

use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::{NsReader, Reader, Writer};

use crate::optimize::OptimizeError;

/// Reason a fragment cannot be parsed outside its source document.
#[derive(Debug, thiserror::Error)]
pub enum MarkupError {
    #[error("Undeclared namespace prefix `{0}`")]
    UndeclaredPrefix(String),
    #[error("Undefined entity `&{0};`")]
    UndefinedEntity(String),
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("Invalid attribute: {0}")]
    Attribute(#[from] AttrError),
}

/// Drawable content of an icon document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SvgRoot {
    /// Unescaped `viewBox` attribute of the root element, if present.
    pub view_box: Option<String>,
    /// Markup between the root's opening and closing tags.
    pub inner: String,
    /// `xmlns:prefix` declarations of the root as `(prefix, uri)` pairs.
    ///
    /// Declarations whose value does not resolve without a DTD are left out.
    pub namespaces: Vec<(String, String)>,
}

/// Extract the root `<svg>` element.
///
/// Returns `Ok(None)` when the first element of the document is not `<svg>`
/// (or there is no element at all).
pub fn extract_root(source: &str) -> Result<Option<SvgRoot>, OptimizeError> {
    let mut reader = Reader::from_str(source);
    reader.config_mut().trim_text(false);

    loop {
        match reader.read_event()? {
            Event::Start(element) => {
                if !is_svg(&element) {
                    return Ok(None);
                }
                let view_box = view_box(&element)?;
                let namespaces = namespaces(&element)?;
                let inner = read_inner(&mut reader)?;
                return Ok(Some(SvgRoot {
                    view_box,
                    inner,
                    namespaces,
                }));
            }
            Event::Empty(element) => {
                if !is_svg(&element) {
                    return Ok(None);
                }
                return Ok(Some(SvgRoot {
                    view_box: view_box(&element)?,
                    inner: String::new(),
                    namespaces: namespaces(&element)?,
                }));
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

fn is_svg(element: &BytesStart<'_>) -> bool {
    element.local_name().as_ref() == b"svg"
}

fn view_box(element: &BytesStart<'_>) -> Result<Option<String>, OptimizeError> {
    for attribute in element.attributes() {
        let attribute = attribute?;
        if attribute.key.as_ref() == b"viewBox" {
            let raw = String::from_utf8_lossy(&attribute.value).into_owned();
            let value = unescape(&raw).map(Cow::into_owned).unwrap_or(raw);
            return Ok(Some(value));
        }
    }
    Ok(None)
}

fn namespaces(element: &BytesStart<'_>) -> Result<Vec<(String, String)>, OptimizeError> {
    let mut declarations = Vec::new();
    for attribute in element.attributes() {
        let attribute = attribute?;
        let Some(prefix) = attribute.key.as_ref().strip_prefix(b"xmlns:") else {
            continue;
        };
        let prefix = String::from_utf8_lossy(prefix).into_owned();
        match attribute.unescape_value() {
            Ok(uri) => declarations.push((prefix, uri.into_owned())),
            Err(err) => {
                tracing::debug!(%prefix, %err, "Dropping unresolvable namespace declaration");
            }
        }
    }
    Ok(declarations)
}

/// Check that a markup fragment parses on its own.
///
/// Every namespace prefix must be declared inside the fragment and every
/// entity reference must be a character reference or one of the five XML
/// predefines.
pub fn check_standalone(markup: &str) -> Result<(), MarkupError> {
    let mut reader = NsReader::from_str(markup);
    reader.config_mut().trim_text(false);

    loop {
        let (namespace, event) = reader.read_resolved_event()?;
        if let Some(prefix) = unknown_prefix(namespace) {
            return Err(MarkupError::UndeclaredPrefix(prefix));
        }
        match event {
            Event::Start(element) | Event::Empty(element) => {
                for attribute in element.attributes() {
                    let attribute = attribute?;
                    let (namespace, _) = reader.resolve_attribute(attribute.key);
                    if let Some(prefix) = unknown_prefix(namespace) {
                        return Err(MarkupError::UndeclaredPrefix(prefix));
                    }
                    attribute.unescape_value()?;
                }
            }
            Event::GeneralRef(reference) => {
                let name = String::from_utf8_lossy(&reference).into_owned();
                if !reference.is_char_ref() && resolve_predefined_entity(&name).is_none() {
                    return Err(MarkupError::UndefinedEntity(name));
                }
            }
            Event::Eof => return Ok(()),
            _ => {}
        }
    }
}

fn unknown_prefix(result: ResolveResult<'_>) -> Option<String> {
    match result {
        ResolveResult::Unknown(prefix) => Some(String::from_utf8_lossy(&prefix).into_owned()),
        ResolveResult::Bound(_) | ResolveResult::Unbound => None,
    }
}

/// Re-serialize everything up to the end tag matching the already-read root.
fn read_inner(reader: &mut Reader<&[u8]>) -> Result<String, OptimizeError> {
    let mut writer = Writer::new(Vec::new());
    let mut depth = 1usize;

    loop {
        let event = reader.read_event()?;
        match &event {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Event::Eof => return Err(OptimizeError::Unclosed),
            _ => {}
        }
        writer.write_event(event)?;
    }

    String::from_utf8(writer.into_inner()).map_err(|_| OptimizeError::Encoding)
}
