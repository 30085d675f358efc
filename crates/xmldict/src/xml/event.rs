//! Events consumed by the tree builder

use crate::error::Pos;

/// One `name="value"` pair of a start tag, entity-decoded
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Normalized SAX-style event
///
/// A well-behaved source nests `StartElement`/`EndElement` pairs properly and
/// reports a malformed document with a single terminal `ParseError`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseEvent {
    StartElement {
        name: String,
        attributes: Vec<Attribute>,
    },
    /// A run of character data; one element may receive several
    CharacterData(String),
    EndElement {
        name: String,
    },
    ParseError {
        reason: String,
        pos: Pos,
    },
}

impl ParseEvent {
    pub fn start(name: impl Into<String>) -> Self {
        Self::StartElement {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    pub fn start_with(name: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        Self::StartElement {
            name: name.into(),
            attributes,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::CharacterData(text.into())
    }

    pub fn end(name: impl Into<String>) -> Self {
        Self::EndElement { name: name.into() }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::ParseError { .. })
    }
}
