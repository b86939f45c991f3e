//! HTML fragment parser
//!
//! Two modes share one tokenizer. [`ParseMode::Strict`] rejects markup a
//! structured parse cannot represent faithfully (unbalanced end tags,
//! unterminated tags, unclosed elements). [`ParseMode::Lenient`] recovers from
//! the same input the way a permissive HTML parser does, so it never fails.

use thiserror::Error;

/// Elements that never have content or an end tag
pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose content is raw text up to the matching end tag
pub(crate) const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Structured parse failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// An end tag closed a different element than the innermost open one
    #[error("mismatched end tag </{found}> at offset {offset}, expected </{expected}>")]
    MismatchedEndTag {
        /// Innermost open element
        expected: String,
        /// End tag that was found
        found: String,
        /// Byte offset of the end tag
        offset: usize,
    },

    /// An end tag with no open element of that name
    #[error("unexpected end tag </{tag}> at offset {offset}")]
    UnexpectedEndTag {
        /// End tag that was found
        tag: String,
        /// Byte offset of the end tag
        offset: usize,
    },

    /// A tag, comment or declaration ran to the end of input
    #[error("unterminated markup starting at offset {offset}")]
    Unterminated {
        /// Byte offset where the construct started
        offset: usize,
    },

    /// Input ended while an element was still open
    #[error("element <{0}> is never closed")]
    UnclosedElement(String),
}

/// Parser behaviour on malformed input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParseMode {
    Strict,
    Lenient,
}

/// Parsed node, detached from any document
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ParsedNode {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
        children: Vec<ParsedNode>,
    },
    Text(String),
    Comment(String),
}

struct OpenElement {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<ParsedNode>,
}

struct TreeBuilder {
    roots: Vec<ParsedNode>,
    stack: Vec<OpenElement>,
}

impl TreeBuilder {
    const fn new() -> Self {
        Self {
            roots: Vec::new(),
            stack: Vec::new(),
        }
    }

    fn push(&mut self, node: ParsedNode) {
        let siblings = match self.stack.last_mut() {
            Some(open) => &mut open.children,
            None => &mut self.roots,
        };
        if let (ParsedNode::Text(text), Some(ParsedNode::Text(previous))) = (&node, siblings.last_mut()) {
            previous.push_str(text);
            return;
        }
        siblings.push(node);
    }

    fn close_top(&mut self) {
        if let Some(open) = self.stack.pop() {
            self.push(ParsedNode::Element {
                tag: open.tag,
                attributes: open.attributes,
                children: open.children,
            });
        }
    }

    fn is_open(&self, tag: &str) -> bool {
        self.stack.iter().any(|open| open.tag == tag)
    }
}

/// Parse markup, failing on the first structural error
pub(crate) fn parse_strict(markup: &str) -> Result<Vec<ParsedNode>, ParseError> {
    parse(markup, ParseMode::Strict)
}

/// Parse markup, recovering from every structural error
pub(crate) fn parse_lenient(markup: &str) -> Vec<ParsedNode> {
    // Lenient mode has no error paths.
    parse(markup, ParseMode::Lenient).unwrap_or_default()
}

#[allow(clippy::too_many_lines)]
fn parse(markup: &str, mode: ParseMode) -> Result<Vec<ParsedNode>, ParseError> {
    let strict = mode == ParseMode::Strict;
    let mut builder = TreeBuilder::new();
    let mut pos = 0;

    while pos < markup.len() {
        let rest = &markup[pos..];

        if let Some(body) = rest.strip_prefix("<!--") {
            if let Some(end) = body.find("-->") {
                builder.push(ParsedNode::Comment(body[..end].to_string()));
                pos += 4 + end + 3;
            } else if strict {
                return Err(ParseError::Unterminated { offset: pos });
            } else {
                builder.push(ParsedNode::Comment(body.to_string()));
                pos = markup.len();
            }
            continue;
        }

        if rest.starts_with("<!") || rest.starts_with("<?") {
            // Doctype and processing instructions carry no content.
            match rest.find('>') {
                Some(end) => pos += end + 1,
                None if strict => return Err(ParseError::Unterminated { offset: pos }),
                None => pos = markup.len(),
            }
            continue;
        }

        if let Some(after) = rest.strip_prefix("</") {
            let name_len = tag_name_len(after);
            let Some(close) = after.find('>') else {
                if strict {
                    return Err(ParseError::Unterminated { offset: pos });
                }
                builder.push(ParsedNode::Text(rest.to_string()));
                break;
            };
            let tag = after[..name_len].to_ascii_lowercase();
            pos += 2 + close + 1;

            if tag.is_empty() {
                if strict {
                    return Err(ParseError::UnexpectedEndTag { tag, offset: pos });
                }
                continue;
            }

            let top = builder.stack.last().map(|open| open.tag.clone());
            match top {
                Some(expected) if expected == tag => builder.close_top(),
                Some(expected) if builder.is_open(&tag) => {
                    if strict {
                        return Err(ParseError::MismatchedEndTag {
                            expected,
                            found: tag,
                            offset: pos,
                        });
                    }
                    while builder.stack.last().is_some_and(|open| open.tag != tag) {
                        builder.close_top();
                    }
                    builder.close_top();
                }
                _ => {
                    if strict {
                        return Err(ParseError::UnexpectedEndTag { tag, offset: pos });
                    }
                }
            }
            continue;
        }

        if rest.starts_with('<') && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
            let Some(tag) = read_start_tag(&rest[1..]) else {
                if strict {
                    return Err(ParseError::Unterminated { offset: pos });
                }
                builder.push(ParsedNode::Text(rest.to_string()));
                break;
            };
            pos += 1 + tag.consumed;

            if VOID_ELEMENTS.contains(&tag.name.as_str()) || tag.self_closing {
                builder.push(ParsedNode::Element {
                    tag: tag.name,
                    attributes: tag.attributes,
                    children: Vec::new(),
                });
                continue;
            }

            if RAW_TEXT_ELEMENTS.contains(&tag.name.as_str()) {
                let body = &markup[pos..];
                let needle = format!("</{}", tag.name);
                let (content, advance) = match body.to_ascii_lowercase().find(&needle) {
                    Some(end) => {
                        let after_end = body[end..].find('>').map_or(body.len(), |gt| end + gt + 1);
                        (&body[..end], after_end)
                    }
                    None if strict => return Err(ParseError::UnclosedElement(tag.name)),
                    None => (body, body.len()),
                };
                let children = if content.is_empty() {
                    Vec::new()
                } else {
                    vec![ParsedNode::Text(content.to_string())]
                };
                builder.push(ParsedNode::Element {
                    tag: tag.name,
                    attributes: tag.attributes,
                    children,
                });
                pos += advance;
                continue;
            }

            builder.stack.push(OpenElement {
                tag: tag.name,
                attributes: tag.attributes,
                children: Vec::new(),
            });
            continue;
        }

        // Text runs to the next '<' (a stray '<' is literal text).
        let search_from = usize::from(rest.starts_with('<'));
        let end = rest[search_from..].find('<').map_or(rest.len(), |i| i + search_from);
        builder.push(ParsedNode::Text(decode_entities(&rest[..end])));
        pos += end;
    }

    if let Some(open) = builder.stack.last() {
        if strict {
            return Err(ParseError::UnclosedElement(open.tag.clone()));
        }
        while !builder.stack.is_empty() {
            builder.close_top();
        }
    }

    Ok(builder.roots)
}

struct StartTag {
    name: String,
    attributes: Vec<(String, String)>,
    self_closing: bool,
    consumed: usize,
}

fn tag_name_len(input: &str) -> usize {
    input
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':'))
        .unwrap_or(input.len())
}

/// Read a start tag after its `<`; `None` if the input ends before `>`
fn read_start_tag(input: &str) -> Option<StartTag> {
    let name_len = tag_name_len(input);
    let name = input[..name_len].to_ascii_lowercase();
    let bytes = input.as_bytes();
    let mut pos = name_len;
    let mut attributes = Vec::new();

    loop {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        match bytes.get(pos)? {
            b'>' => {
                return Some(StartTag {
                    name,
                    attributes,
                    self_closing: false,
                    consumed: pos + 1,
                })
            }
            b'/' if bytes.get(pos + 1) == Some(&b'>') => {
                return Some(StartTag {
                    name,
                    attributes,
                    self_closing: true,
                    consumed: pos + 2,
                })
            }
            b'/' => {
                pos += 1;
                continue;
            }
            _ => {}
        }

        let attr_start = pos;
        while pos < bytes.len() && !matches!(bytes[pos], b'=' | b'>' | b'/') && !bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let attr_name = input[attr_start..pos].to_ascii_lowercase();

        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let mut value = String::new();
        if bytes.get(pos) == Some(&b'=') {
            pos += 1;
            while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
            match bytes.get(pos)? {
                quote @ (b'"' | b'\'') => {
                    let close = input[pos + 1..].find(char::from(*quote))?;
                    value = decode_entities(&input[pos + 1..pos + 1 + close]);
                    pos += close + 2;
                }
                _ => {
                    let start = pos;
                    while pos < bytes.len() && bytes[pos] != b'>' && !bytes[pos].is_ascii_whitespace() {
                        pos += 1;
                    }
                    value = decode_entities(&input[start..pos]);
                }
            }
        }

        if !attr_name.is_empty() && !attributes.iter().any(|(existing, _)| *existing == attr_name) {
            attributes.push((attr_name, value));
        }
    }
}

/// Decode character references
pub(crate) fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest[1..]
            .find(';')
            .filter(|semi| *semi <= 10)
            .and_then(|semi| decode_reference(&rest[1..=semi]).map(|c| (c, semi + 2)));
        match decoded {
            Some((c, len)) => {
                out.push(c);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Escape text content for serialization
pub(crate) fn escape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape an attribute value for serialization
pub(crate) fn escape_attribute(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
    out
}
