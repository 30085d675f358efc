//! Tokenizer adapter: XML text to a flat event stream

pub mod event;
pub mod tokenizer;

pub use event::{Attribute, ParseEvent};
pub use tokenizer::Tokenizer;
