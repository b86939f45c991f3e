//! CSS selector subset
//!
//! Supports `*`, type, `#id`, `.class`, `[attr]`, `[attr=value]`, compound
//! combinations of those, the descendant combinator and comma-separated
//! selector lists. Anything else is rejected at parse time.

use thiserror::Error;

/// Selector parse failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    /// The selector (or one of its comma-separated parts) is empty
    #[error("empty selector")]
    Empty,

    /// An unsupported or invalid character was found
    #[error("unexpected '{found}' at offset {offset} in selector '{selector}'")]
    Unexpected {
        /// The full selector text
        selector: String,
        /// Offending character
        found: char,
        /// Byte offset within the compound
        offset: usize,
    },

    /// An attribute selector was not closed with `]`
    #[error("unterminated attribute selector in '{0}'")]
    UnterminatedAttribute(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttributeMatch {
    name: String,
    value: Option<String>,
}

/// One compound selector (no combinators)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeMatch>,
}

/// Element view the matcher needs
pub(crate) trait Matchable {
    fn local_name(&self) -> &str;
    fn attribute(&self, name: &str) -> Option<&str>;
}

impl Compound {
    pub(crate) fn matches(&self, element: &impl Matchable) -> bool {
        if self.tag.as_deref().is_some_and(|tag| tag != element.local_name()) {
            return false;
        }
        if let Some(id) = &self.id {
            if element.attribute("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let class_attr = element.attribute("class").unwrap_or_default();
            if !self
                .classes
                .iter()
                .all(|class| class_attr.split_ascii_whitespace().any(|c| c == class))
            {
                return false;
            }
        }
        self.attributes.iter().all(|attr| match (element.attribute(&attr.name), &attr.value) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(actual), Some(expected)) => actual == expected,
        })
    }
}

/// Parsed selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    /// Each alternative is a chain of compounds joined by descendant combinators
    alternatives: Vec<Vec<Compound>>,
}

impl Selector {
    /// Parse a selector list
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError`] if the selector is empty or uses syntax
    /// outside the supported subset.
    pub fn parse(selector: &str) -> Result<Self, SelectorError> {
        let alternatives = split_outside_brackets(selector, |c| c == ',')
            .into_iter()
            .map(|part| {
                let compounds = split_outside_brackets(part, char::is_whitespace)
                    .into_iter()
                    .filter(|token| !token.is_empty())
                    .map(|token| parse_compound(selector, token))
                    .collect::<Result<Vec<_>, _>>()?;
                if compounds.is_empty() {
                    Err(SelectorError::Empty)
                } else {
                    Ok(compounds)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { alternatives })
    }

    /// Match `element` given a way to walk its ancestors
    ///
    /// `ancestors` yields the element's ancestors from the nearest outwards.
    pub(crate) fn matches_with<E, I>(&self, element: &E, ancestors: I) -> bool
    where
        E: Matchable,
        I: Fn() -> Vec<E>,
    {
        self.alternatives.iter().any(|chain| {
            let Some((last, rest)) = chain.split_last() else {
                return false;
            };
            if !last.matches(element) {
                return false;
            }
            if rest.is_empty() {
                return true;
            }
            let lineage = ancestors();
            let mut remaining = rest.iter().rev().peekable();
            for ancestor in &lineage {
                if let Some(compound) = remaining.peek() {
                    if compound.matches(ancestor) {
                        remaining.next();
                    }
                }
            }
            remaining.peek().is_none()
        })
    }
}

fn split_outside_brackets(input: &str, is_separator: impl Fn(char) -> bool) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 && is_separator(c) => {
                parts.push(input[start..i].trim());
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(input[start..].trim());
    parts
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

fn read_ident(input: &str) -> &str {
    let end = input.find(|c: char| !is_ident_char(c)).unwrap_or(input.len());
    &input[..end]
}

fn parse_compound(selector: &str, token: &str) -> Result<Compound, SelectorError> {
    let unexpected = |offset: usize, found: char| SelectorError::Unexpected {
        selector: selector.to_string(),
        found,
        offset,
    };

    let mut compound = Compound::default();
    let mut pos = 0;

    while pos < token.len() {
        let rest = &token[pos..];
        let Some(c) = rest.chars().next() else { break };
        match c {
            '*' if pos == 0 => pos += 1,
            '#' | '.' => {
                let ident = read_ident(&rest[1..]);
                match ident.chars().next() {
                    None => return Err(unexpected(pos, c)),
                    Some(first) if first.is_ascii_digit() => return Err(unexpected(pos + 1, first)),
                    Some(_) => {}
                }
                if c == '#' {
                    compound.id = Some(ident.to_string());
                } else {
                    compound.classes.push(ident.to_string());
                }
                pos += 1 + ident.len();
            }
            '[' => {
                let close = rest
                    .find(']')
                    .ok_or_else(|| SelectorError::UnterminatedAttribute(selector.to_string()))?;
                let inner = rest[1..close].trim();
                let (name, value) = match inner.split_once('=') {
                    Some((name, value)) => {
                        let value = value.trim().trim_matches(|q: char| q == '"' || q == '\'');
                        (name.trim(), Some(value.to_string()))
                    }
                    None => (inner, None),
                };
                if name.is_empty() || read_ident(name) != name {
                    return Err(unexpected(pos, '['));
                }
                compound.attributes.push(AttributeMatch {
                    name: name.to_ascii_lowercase(),
                    value,
                });
                pos += close + 1;
            }
            _ if pos == 0 && (c.is_ascii_alphabetic() || c == '-' || c == '_') => {
                let ident = read_ident(rest);
                compound.tag = Some(ident.to_ascii_lowercase());
                pos += ident.len();
            }
            _ => return Err(unexpected(pos, c)),
        }
    }

    Ok(compound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct Fake {
        tag: &'static str,
        attrs: Vec<(&'static str, &'static str)>,
    }

    impl Matchable for Fake {
        fn local_name(&self) -> &str {
            self.tag
        }

        fn attribute(&self, name: &str) -> Option<&str> {
            self.attrs.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
        }
    }

    fn fake(tag: &'static str, attrs: &[(&'static str, &'static str)]) -> Fake {
        Fake {
            tag,
            attrs: attrs.to_vec(),
        }
    }

    #[test]
    fn test_simple_selectors() {
        let button = fake("button", &[("id", "play"), ("class", "btn primary"), ("data-role", "go")]);

        for selector in [
            "button",
            "#play",
            ".btn",
            ".btn.primary",
            "button#play.primary",
            "[data-role]",
            "[data-role=go]",
            "[data-role=\"go\"]",
            "*",
            "span, .primary",
        ] {
            let parsed = Selector::parse(selector).unwrap();
            assert!(parsed.matches_with(&button, Vec::new), "{selector} should match");
        }

        for selector in ["div", "#stop", ".secondary", "[data-role=stop]", "[hidden]"] {
            let parsed = Selector::parse(selector).unwrap();
            assert!(!parsed.matches_with(&button, Vec::new), "{selector} should not match");
        }
    }

    #[test]
    fn test_descendant_combinator() {
        let span = fake("span", &[]);
        let lineage = || vec![fake("li", &[]), fake("ul", &[("class", "menu")]), fake("nav", &[])];

        assert!(Selector::parse("nav span").unwrap().matches_with(&span, lineage));
        assert!(Selector::parse(".menu li span").unwrap().matches_with(&span, lineage));
        assert!(!Selector::parse("li nav span").unwrap().matches_with(&span, lineage));
    }

    #[test]
    fn test_invalid_selectors() {
        assert_eq!(Selector::parse("").unwrap_err(), SelectorError::Empty);
        assert_eq!(Selector::parse("a,").unwrap_err(), SelectorError::Empty);
        assert!(matches!(Selector::parse("#1abc"), Err(SelectorError::Unexpected { found: '1', .. })));
        assert!(matches!(Selector::parse("ul > li"), Err(SelectorError::Unexpected { found: '>', .. })));
        assert!(matches!(
            Selector::parse("[data-x"),
            Err(SelectorError::UnterminatedAttribute(_))
        ));
    }
}
