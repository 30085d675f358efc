//! Stack-based tree builder
//!
//! Folds a [`ParseEvent`] stream into a single [`Node`]. One [`Frame`] is
//! kept per open element. Character data is buffered on the frame and the
//! element's shape is only decided when it closes: an element with neither
//! attributes nor children becomes a text leaf, anything else becomes an
//! object that may carry its text under the configured text key.

use tracing::warn;

use crate::config::{CollisionPolicy, Config, WhitespacePolicy};
use crate::error::{Error, Pos, Result};
use crate::lexer::cursor::is_whitespace;
use crate::node::{Node, Object};
use crate::xml::event::{Attribute, ParseEvent};

/// Builder state for one open element
#[derive(Debug)]
struct Frame {
    name: String,
    object: Object,
    /// Keys of `object` currently holding attribute values
    attribute_keys: Vec<String>,
    text: String,
}

/// Incremental event-to-tree builder
///
/// ```
/// use xmldict::{Node, ParseEvent, TreeBuilder};
///
/// let mut builder = TreeBuilder::new();
/// builder.feed(ParseEvent::start("a"))?;
/// builder.feed(ParseEvent::text("hi"))?;
/// builder.feed(ParseEvent::end("a"))?;
/// let node = builder.finish()?;
/// assert_eq!(node.get("a"), Some(&Node::from("hi")));
/// # Ok::<(), xmldict::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct TreeBuilder {
    config: Config,
    stack: Vec<Frame>,
    root: Object,
    complete: bool,
    /// First error seen; once set every later call reports it
    failed: Option<Error>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Number of currently open elements
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// True once the document element has closed
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Apply one event
    ///
    /// Any error leaves the builder unusable: the partial tree is dropped and
    /// later calls to `feed` or `finish` return the same error. Structural
    /// errors found here have no source position, only `ParseError` events
    /// carry one.
    pub fn feed(&mut self, event: ParseEvent) -> Result<()> {
        if let Some(err) = &self.failed {
            return Err(err.clone());
        }
        let result = match event {
            ParseEvent::StartElement { name, attributes } => self.start_element(name, attributes),
            ParseEvent::CharacterData(text) => self.character_data(&text),
            ParseEvent::EndElement { name } => self.end_element(name),
            ParseEvent::ParseError { reason, pos } => Err(Error::malformed(reason, pos)),
        };
        if let Err(err) = &result {
            self.stack.clear();
            self.root.0.clear();
            self.complete = false;
            self.failed = Some(err.clone());
        }
        result
    }

    /// Hand out the finished tree
    ///
    /// The result is an object with exactly one entry, keyed by the name of
    /// the document element.
    pub fn finish(self) -> Result<Node> {
        if let Some(err) = self.failed {
            return Err(err);
        }
        if !self.stack.is_empty() || !self.complete {
            return Err(Error::unexpected_eof());
        }
        Ok(Node::Object(self.root))
    }

    fn start_element(&mut self, name: String, attributes: Vec<Attribute>) -> Result<()> {
        if self.complete {
            return Err(malformed(format!("element <{name}> after document element")));
        }

        let mut object = Object::with_capacity(attributes.len());
        let mut attribute_keys = Vec::with_capacity(attributes.len());
        for attr in attributes {
            let key = self.config.attribute_key(&attr.name);
            if object.contains_key(&key) {
                return Err(malformed(format!("duplicate attribute: {}", attr.name)));
            }
            object.insert(key.clone(), Node::Text(attr.value));
            attribute_keys.push(key);
        }

        self.stack.push(Frame {
            name,
            object,
            attribute_keys,
            text: String::new(),
        });
        Ok(())
    }

    fn character_data(&mut self, text: &str) -> Result<()> {
        match self.stack.last_mut() {
            Some(frame) => {
                frame.text.push_str(text);
                Ok(())
            }
            None if is_blank(text) => Ok(()),
            None => Err(malformed("character data outside document element")),
        }
    }

    fn end_element(&mut self, name: String) -> Result<()> {
        let Some(frame) = self.stack.pop() else {
            return Err(malformed(format!("unexpected closing tag </{name}>")));
        };
        if frame.name != name {
            return Err(malformed(format!(
                "mismatched closing tag: expected </{}>, found </{name}>",
                frame.name
            )));
        }

        let value = resolve(&self.config, frame)?;
        match self.stack.last_mut() {
            Some(parent) => insert_child(&self.config, parent, name, value),
            None => {
                self.root.insert(name, value);
                self.complete = true;
                Ok(())
            }
        }
    }
}

/// Build a tree from a complete event sequence
pub fn build<I>(events: I, config: &Config) -> Result<Node>
where
    I: IntoIterator<Item = ParseEvent>,
{
    let mut builder = TreeBuilder::with_config(config.clone());
    for event in events {
        builder.feed(event)?;
    }
    builder.finish()
}

/// Decide the shape of a closed element
fn resolve(config: &Config, frame: Frame) -> Result<Node> {
    let Frame {
        name,
        mut object,
        text,
        ..
    } = frame;

    if object.is_empty() {
        let text = match config.whitespace {
            WhitespacePolicy::Trim if is_blank(&text) => String::new(),
            _ => text,
        };
        return Ok(Node::Text(text));
    }

    if !is_blank(&text) {
        if object.contains_key(&config.text_key) {
            match config.collisions {
                CollisionPolicy::Error => return Err(Error::collision(config.text_key.clone())),
                CollisionPolicy::Overwrite => warn!(
                    element = %name,
                    key = %config.text_key,
                    "explicit value shadows element text, text dropped"
                ),
            }
        } else {
            object.insert(config.text_key.clone(), Node::Text(text));
        }
    }

    Ok(Node::Object(object))
}

/// Store a closed child under its parent, promoting repeats to an array
fn insert_child(config: &Config, parent: &mut Frame, name: String, value: Node) -> Result<()> {
    if let Some(idx) = parent.attribute_keys.iter().position(|key| *key == name) {
        match config.collisions {
            CollisionPolicy::Error => return Err(Error::collision(name)),
            CollisionPolicy::Overwrite => {
                warn!(
                    element = %parent.name,
                    key = %name,
                    "child element replaces attribute of the same name"
                );
                parent.attribute_keys.swap_remove(idx);
                parent.object.insert(name, value);
                return Ok(());
            }
        }
    }

    match parent.object.get_mut(&name) {
        Some(existing) => existing.push_sibling(value),
        None => {
            parent.object.insert(name, value);
        }
    }
    Ok(())
}

fn is_blank(text: &str) -> bool {
    text.bytes().all(is_whitespace)
}

fn malformed(reason: impl Into<String>) -> Error {
    Error::malformed(reason, Pos::default())
}
