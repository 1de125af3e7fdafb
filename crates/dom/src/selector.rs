//! CSS-subset selector engine.
//!
//! Supports compound selectors over a tag name, `.class`, `[attr]` and
//! `[attr=value]` (value optionally quoted), e.g.
//! `textarea.overflow-auto[data-scrollbar]`. Combinators and
//! pseudo-classes are rejected at parse time; matching never panics.

use std::fmt;
use std::str::FromStr;

use crate::errors::DomError;
use crate::model::Element;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Part {
    AnyTag,
    Tag(String),
    Class(String),
    AttrPresent(String),
    AttrEquals(String, String),
}

#[derive(Clone, Debug)]
pub struct Selector {
    source: String,
    parts: Vec<Part>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self, DomError> {
        let source = input.trim();
        if source.is_empty() {
            return Err(DomError::selector(input, "empty selector"));
        }

        let mut parts = Vec::new();
        let mut chars = source.char_indices().peekable();

        // Leading tag (or universal) before any class/attribute part.
        match chars.peek() {
            Some((_, '*')) => {
                chars.next();
                parts.push(Part::AnyTag);
            }
            Some((_, c)) if is_ident_char(*c) => {
                parts.push(Part::Tag(take_ident(&mut chars).to_ascii_lowercase()));
            }
            _ => {}
        }

        while let Some((idx, c)) = chars.peek().copied() {
            match c {
                '.' => {
                    chars.next();
                    let class = take_ident(&mut chars);
                    if class.is_empty() {
                        return Err(DomError::selector(source, "empty class name"));
                    }
                    parts.push(Part::Class(class));
                }
                '[' => {
                    chars.next();
                    parts.push(parse_attr(source, &mut chars)?);
                }
                ' ' | '>' | '+' | '~' | ',' => {
                    return Err(DomError::selector(
                        source,
                        "combinators and selector lists are not supported",
                    ));
                }
                _ => {
                    return Err(DomError::selector(
                        source,
                        format!("unexpected character at offset {idx}"),
                    ));
                }
            }
        }

        if parts.is_empty() {
            return Err(DomError::selector(source, "no simple selector parts"));
        }
        Ok(Self {
            source: source.to_string(),
            parts,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, element: &Element) -> bool {
        self.parts.iter().all(|part| match part {
            Part::AnyTag => true,
            Part::Tag(tag) => element.tag_name().eq_ignore_ascii_case(tag),
            Part::Class(class) => element.has_class(class),
            Part::AttrPresent(name) => element.has_attribute(name),
            Part::AttrEquals(name, value) => element.attribute(name).as_deref() == Some(value),
        })
    }
}

impl FromStr for Selector {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn take_ident(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>) -> String {
    let mut out = String::new();
    while let Some((_, c)) = chars.peek().copied() {
        if is_ident_char(c) {
            out.push(c);
            chars.next();
        } else {
            break;
        }
    }
    out
}

fn parse_attr(
    source: &str,
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
) -> Result<Part, DomError> {
    let name = take_ident(chars);
    if name.is_empty() {
        return Err(DomError::selector(source, "empty attribute name"));
    }
    match chars.next() {
        Some((_, ']')) => Ok(Part::AttrPresent(name)),
        Some((_, '=')) => {
            let value = parse_attr_value(source, chars)?;
            match chars.next() {
                Some((_, ']')) => Ok(Part::AttrEquals(name, value)),
                _ => Err(DomError::selector(source, "unterminated attribute selector")),
            }
        }
        _ => Err(DomError::selector(source, "unterminated attribute selector")),
    }
}

fn parse_attr_value(
    source: &str,
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
) -> Result<String, DomError> {
    match chars.peek().copied() {
        Some((_, quote @ ('"' | '\''))) => {
            chars.next();
            let mut out = String::new();
            for (_, c) in chars.by_ref() {
                if c == quote {
                    return Ok(out);
                }
                out.push(c);
            }
            Err(DomError::selector(source, "unterminated quoted value"))
        }
        _ => {
            let value = take_ident(chars);
            if value.is_empty() {
                return Err(DomError::selector(source, "empty attribute value"));
            }
            Ok(value)
        }
    }
}
