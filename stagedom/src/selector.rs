//! A small CSS selector subset.
//!
//! Supported: comma-separated lists of compound selectors made of `*`, a tag
//! name, `#id`, `.class`, `[attr]` and `[attr="value"]`. Combinators are not
//! supported. Attribute names resolve as follows: `id` and `class` address the
//! node's identity and class list, `data-<key>` addresses data key `<key>`.

use std::borrow::Cow;
use std::iter::Peekable;
use std::str::{CharIndices, FromStr};

use thiserror::Error;

use crate::element::{Document, Node, NodeId};

/// Errors produced while parsing a selector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,

    #[error("unexpected '{ch}' at offset {offset} in selector '{input}'")]
    Unexpected {
        input: String,
        ch: char,
        offset: usize,
    },

    #[error("expected a name at offset {offset} in selector '{input}'")]
    MissingName { input: String, offset: usize },

    #[error("unterminated attribute selector in '{0}'")]
    UnterminatedAttribute(String),

    #[error("combinators are not supported in selector '{0}'")]
    Combinator(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrMatch {
    Present(String),
    Equals(String, String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrMatch>,
}

impl Compound {
    fn matches(&self, node: &Node) -> bool {
        if self.tag.as_ref().is_some_and(|tag| !tag.eq_ignore_ascii_case(&node.tag)) {
            return false;
        }
        if self.id.as_ref().is_some_and(|id| *id != node.id) {
            return false;
        }
        if !self.classes.iter().all(|class| node.has_class(class)) {
            return false;
        }
        self.attrs.iter().all(|attr| match attr {
            AttrMatch::Present(name) => attr_value(node, name).is_some(),
            AttrMatch::Equals(name, value) => {
                attr_value(node, name).is_some_and(|actual| actual == value.as_str())
            }
        })
    }
}

fn attr_value<'a>(node: &'a Node, name: &str) -> Option<Cow<'a, str>> {
    match name {
        "id" => Some(Cow::Borrowed(node.id.as_str())),
        "class" if !node.classes.is_empty() => Some(Cow::Owned(node.classes.join(" "))),
        _ => name
            .strip_prefix("data-")
            .and_then(|key| node.data.get(key))
            .map(|v| Cow::Borrowed(v.as_str())),
    }
}

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    alternatives: Vec<Compound>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(SelectorError::Empty);
        }

        let mut alternatives = Vec::new();
        let mut offset = input.len() - input.trim_start().len();
        for part in trimmed.split(',') {
            let lead = part.len() - part.trim_start().len();
            let compound = part.trim();
            if compound.is_empty() {
                return Err(SelectorError::Empty);
            }
            alternatives.push(parse_compound(input, compound, offset + lead)?);
            offset += part.len() + 1;
        }

        Ok(Self {
            source: trimmed.to_string(),
            alternatives,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        doc.get(id)
            .is_some_and(|node| self.alternatives.iter().any(|c| c.matches(node)))
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

type Cursor<'a> = Peekable<CharIndices<'a>>;

fn is_name_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '-' || ch == '_'
}

fn parse_compound(input: &str, src: &str, base: usize) -> Result<Compound, SelectorError> {
    let mut compound = Compound::default();
    let mut cursor = src.char_indices().peekable();

    while let Some(&(pos, ch)) = cursor.peek() {
        match ch {
            '*' if pos == 0 => {
                cursor.next();
            }
            '#' => {
                cursor.next();
                compound.id = Some(take_name(input, &mut cursor, base)?);
            }
            '.' => {
                cursor.next();
                compound.classes.push(take_name(input, &mut cursor, base)?);
            }
            '[' => {
                cursor.next();
                compound.attrs.push(parse_attr(input, &mut cursor, base)?);
            }
            c if c.is_whitespace() || matches!(c, '>' | '+' | '~') => {
                return Err(SelectorError::Combinator(input.to_string()));
            }
            c if is_name_char(c) && pos == 0 => {
                compound.tag = Some(take_name(input, &mut cursor, base)?);
            }
            c => {
                return Err(SelectorError::Unexpected {
                    input: input.to_string(),
                    ch: c,
                    offset: base + pos,
                });
            }
        }
    }

    Ok(compound)
}

fn take_name(input: &str, cursor: &mut Cursor<'_>, base: usize) -> Result<String, SelectorError> {
    let start = cursor.peek().map(|&(pos, _)| pos);
    let mut name = String::new();
    while let Some(&(_, ch)) = cursor.peek() {
        if !is_name_char(ch) {
            break;
        }
        name.push(ch);
        cursor.next();
    }

    if name.is_empty() {
        return Err(SelectorError::MissingName {
            input: input.to_string(),
            offset: start.map_or(input.len(), |pos| base + pos),
        });
    }
    Ok(name)
}

fn skip_whitespace(cursor: &mut Cursor<'_>) {
    while cursor.next_if(|&(_, ch)| ch.is_whitespace()).is_some() {}
}

fn parse_attr(input: &str, cursor: &mut Cursor<'_>, base: usize) -> Result<AttrMatch, SelectorError> {
    let unterminated = || SelectorError::UnterminatedAttribute(input.to_string());

    skip_whitespace(cursor);
    let name = take_name(input, cursor, base)?;
    skip_whitespace(cursor);

    match cursor.next() {
        Some((_, ']')) => Ok(AttrMatch::Present(name)),
        Some((_, '=')) => {
            skip_whitespace(cursor);
            let value = match cursor.peek() {
                Some(&(_, quote @ ('"' | '\''))) => {
                    cursor.next();
                    let mut value = String::new();
                    loop {
                        match cursor.next() {
                            Some((_, ch)) if ch == quote => break,
                            Some((_, ch)) => value.push(ch),
                            None => return Err(unterminated()),
                        }
                    }
                    value
                }
                Some(_) => take_name(input, cursor, base)?,
                None => return Err(unterminated()),
            };
            skip_whitespace(cursor);
            match cursor.next() {
                Some((_, ']')) => Ok(AttrMatch::Equals(name, value)),
                Some((pos, ch)) => Err(SelectorError::Unexpected {
                    input: input.to_string(),
                    ch,
                    offset: base + pos,
                }),
                None => Err(unterminated()),
            }
        }
        Some((pos, ch)) => Err(SelectorError::Unexpected {
            input: input.to_string(),
            ch,
            offset: base + pos,
        }),
        None => Err(unterminated()),
    }
}
