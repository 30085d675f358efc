//! xmldict - XML documents as nested dictionaries
//!
//! Converts a well-formed XML document into a [`Node`] tree for
//! dictionary-style access:
//!
//! - attributes and child elements become keys of the element's object
//! - an element with only character data collapses to its text
//! - character data next to attributes or children lands under `"text"`
//! - repeated child names are grouped into an array in document order
//!
//! # Quick Start
//!
//! ```
//! use xmldict::from_str;
//! # fn main() -> Result<(), xmldict::Error> {
//! let node = from_str(r#"<a x="1"><b>hi</b><c>1</c><c>2</c></a>"#)?;
//! assert_eq!(node.pointer(&["a", "x"]).and_then(|n| n.as_text()), Some("1"));
//! assert_eq!(node.pointer(&["a", "b"]).and_then(|n| n.as_text()), Some("hi"));
//! assert_eq!(node.pointer(&["a", "c"]).map(|n| n.as_slice().len()), Some(2));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

use std::io::Read;
use std::path::Path;

use tracing::{debug, error, info, instrument};

pub mod builder;
pub use builder::{build, TreeBuilder};

pub mod config;
pub use config::{CollisionPolicy, Config, WhitespacePolicy, DEFAULT_TEXT_KEY};

pub mod error;
pub use error::{Error, ErrorKind, Pos, Result, Span};

pub mod input;
pub use input::Input;

pub mod lexer;

pub mod node;
pub use node::{Array, Node, Object};

pub mod xml;
pub use xml::{Attribute, ParseEvent, Tokenizer};

/// Convert XML text
pub fn from_str(s: &str) -> Result<Node> {
    from_str_with_config(s, &Config::default())
}

/// Convert XML text with custom configuration
///
/// A leading byte order mark left behind by the decoder is ignored.
pub fn from_str_with_config(s: &str, config: &Config) -> Result<Node> {
    let s = s.strip_prefix('\u{FEFF}').unwrap_or(s);
    build(Tokenizer::with_config(s.as_bytes(), config), config)
}

/// Convert XML bytes in any encoding the document declares
pub fn from_bytes(bytes: &[u8]) -> Result<Node> {
    from_bytes_with_config(bytes, &Config::default())
}

/// Convert XML bytes with custom configuration
pub fn from_bytes_with_config(bytes: &[u8], config: &Config) -> Result<Node> {
    convert_input(&Input::from_bytes(bytes), config)
}

/// Read everything from `reader` and convert it
pub fn from_reader<R: Read>(reader: R) -> Result<Node> {
    from_reader_with_config(reader, &Config::default())
}

/// Read everything from `reader` and convert it with custom configuration
pub fn from_reader_with_config<R: Read>(mut reader: R, config: &Config) -> Result<Node> {
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer).map_err(|e| {
        error!("Failed to read input: {}", e);
        Error::from(e)
    })?;
    from_bytes_with_config(&buffer, config)
}

/// Read and convert an XML file
pub fn from_file(path: impl AsRef<Path>) -> Result<Node> {
    from_file_with_config(path, &Config::default())
}

/// Read and convert an XML file with custom configuration
#[instrument(skip(path, config), fields(file = %path.as_ref().display()))]
pub fn from_file_with_config(path: impl AsRef<Path>, config: &Config) -> Result<Node> {
    let path = path.as_ref();
    debug!("Reading file");

    let bytes = std::fs::read(path).map_err(|e| {
        error!("Failed to read file: {}", e);
        Error::from(e)
    })?;

    info!(bytes = bytes.len(), "File read successfully");
    let name = path.to_string_lossy();
    convert_input(&Input::from_bytes(&bytes).with_filename(&name), config)
}

#[instrument(level = "debug", skip_all, fields(filename = input.filename(), len = input.len()))]
fn convert_input(input: &Input<'_>, config: &Config) -> Result<Node> {
    let text = input
        .encoding()
        .and_then(|encoding| {
            debug!(encoding = encoding.name(), "Detected encoding");
            input.decode()
        })
        .map_err(|e| {
            error!("Failed to decode input: {}", e);
            e
        })?;

    let result = build(Tokenizer::with_config(text.as_bytes(), config), config);
    match &result {
        Ok(_) => debug!("Conversion completed"),
        Err(e) => error!("Conversion failed: {}", e),
    }
    result
}
