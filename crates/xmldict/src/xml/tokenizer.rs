//! Pull-based XML tokenizer
//!
//! Walks UTF-8 input once and yields [`ParseEvent`]s. Comments, processing
//! instructions and the DOCTYPE are skipped; CDATA sections come out as
//! character data. The first well-formedness violation is reported as a
//! single `ParseError`, after which the stream ends.

use std::iter::FusedIterator;

use crate::config::Config;
use crate::error::{Error, ErrorKind, Pos, Result};
use crate::lexer::cursor::{is_whitespace, Cursor};
use crate::xml::event::{Attribute, ParseEvent};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// Before the document element
    Prolog,
    /// Inside the document element
    Content,
    /// After the document element closed
    Epilog,
    Done,
}

/// Streaming XML tokenizer
#[derive(Debug)]
pub struct Tokenizer<'a> {
    cursor: Cursor<'a>,
    len: usize,
    max_depth: u16,
    max_size: usize,
    /// Names of currently open elements
    open: Vec<String>,
    state: State,
    /// End event owed for a self-closing tag
    pending_end: Option<String>,
}

impl<'a> Tokenizer<'a> {
    /// Create a tokenizer without depth or size limits
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_config(input, &Config::default())
    }

    /// Create a tokenizer enforcing the limits in `config`
    pub fn with_config(input: &'a [u8], config: &Config) -> Self {
        Self {
            cursor: Cursor::new(input),
            len: input.len(),
            max_depth: config.max_depth,
            max_size: config.max_size,
            open: Vec::new(),
            state: State::Prolog,
            pending_end: None,
        }
    }

    /// Current element nesting depth
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Get the next event, `Ok(None)` at end of input
    ///
    /// End of input inside an open element is not an error here; the
    /// consumer sees the stream stop with elements still open.
    pub fn next_event(&mut self) -> Result<Option<ParseEvent>> {
        if let Some(name) = self.pending_end.take() {
            return Ok(Some(ParseEvent::EndElement { name }));
        }

        if self.max_size > 0 && self.len > self.max_size {
            return Err(Error::malformed(
                format!("input exceeds max size of {} bytes", self.max_size),
                Pos::new(0, 1, 1),
            ));
        }

        loop {
            match self.state {
                State::Done => return Ok(None),
                State::Prolog | State::Epilog => {
                    self.cursor.skip_whitespace();
                    if self.cursor.is_eof() {
                        self.state = State::Done;
                        return Ok(None);
                    }
                    if self.cursor.current() != Some(b'<') {
                        return Err(self.error_here(self.outside_root_message()));
                    }
                    if self.skip_markup()? {
                        continue;
                    }
                    if self.cursor.peek(1) == Some(b'/') {
                        return Err(self.error_here("unexpected closing tag"));
                    }
                    if self.state == State::Epilog {
                        return Err(self.error_here(self.outside_root_message()));
                    }
                    return self.start_tag().map(Some);
                }
                State::Content => {
                    if self.cursor.is_eof() {
                        self.state = State::Done;
                        return Ok(None);
                    }
                    if self.cursor.current() != Some(b'<') {
                        return self.text().map(Some);
                    }
                    if self.cursor.peek(1) == Some(b'/') {
                        return self.end_tag().map(Some);
                    }
                    if self.cursor.starts_with(b"<![CDATA[") {
                        return self.cdata().map(Some);
                    }
                    if self.skip_markup()? {
                        continue;
                    }
                    return self.start_tag().map(Some);
                }
            }
        }
    }

    fn outside_root_message(&self) -> &'static str {
        if self.state == State::Epilog {
            "content after document element"
        } else {
            "content before document element"
        }
    }

    fn start_tag(&mut self) -> Result<ParseEvent> {
        self.cursor.advance();
        let name = self.parse_name()?;
        let attributes = self.parse_attributes()?;

        if self.max_depth > 0 && self.open.len() >= usize::from(self.max_depth) {
            return Err(self.error_here(format!("max depth of {} exceeded", self.max_depth)));
        }

        if self.cursor.consume(b'/') {
            self.expect_byte(b'>')?;
            if self.open.is_empty() {
                self.state = State::Epilog;
            }
            self.pending_end = Some(name.clone());
        } else {
            self.expect_byte(b'>')?;
            self.open.push(name.clone());
            self.state = State::Content;
        }

        Ok(ParseEvent::StartElement { name, attributes })
    }

    fn end_tag(&mut self) -> Result<ParseEvent> {
        let tag_pos = self.cursor.position();
        self.cursor.advance_by(2);
        let name = self.parse_name()?;
        self.cursor.skip_whitespace();
        self.expect_byte(b'>')?;

        match self.open.pop() {
            Some(open) if open == name => {
                if self.open.is_empty() {
                    self.state = State::Epilog;
                }
                Ok(ParseEvent::EndElement { name })
            }
            Some(open) => Err(Error::malformed(
                format!("mismatched closing tag: expected </{open}>, found </{name}>"),
                tag_pos,
            )),
            None => Err(Error::malformed("unexpected closing tag", tag_pos)),
        }
    }

    fn text(&mut self) -> Result<ParseEvent> {
        let pos = self.cursor.position();
        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == b'<' {
                break;
            }
            self.cursor.advance();
        }

        let raw = bytes_to_string(self.cursor.slice_from(start), pos)?;
        if raw.contains("]]>") {
            return Err(Error::malformed("']]>' not allowed in character data", pos));
        }
        let text = decode_entities(&normalize_newlines(&raw), pos)?;
        Ok(ParseEvent::CharacterData(text))
    }

    fn cdata(&mut self) -> Result<ParseEvent> {
        let pos = self.cursor.position();
        self.cursor.advance_by(b"<![CDATA[".len());
        let start = self.cursor.pos();
        while !self.cursor.is_eof() {
            if self.cursor.starts_with(b"]]>") {
                let raw = bytes_to_string(self.cursor.slice_from(start), pos)?;
                self.cursor.advance_by(3);
                return Ok(ParseEvent::CharacterData(normalize_newlines(&raw)));
            }
            self.cursor.advance();
        }
        Err(Error::malformed("unterminated cdata section", pos))
    }

    /// Skip a comment, processing instruction or DOCTYPE at the cursor
    ///
    /// Returns false when the cursor is at something else.
    fn skip_markup(&mut self) -> Result<bool> {
        let pos = self.cursor.position();
        if self.cursor.consume_bytes(b"<?") {
            self.skip_until(b"?>", "unterminated processing instruction", pos)?;
            return Ok(true);
        }
        if self.cursor.consume_bytes(b"<!--") {
            self.skip_until(b"-->", "unterminated comment", pos)?;
            return Ok(true);
        }
        if self.cursor.starts_with(b"<!DOCTYPE") {
            if self.state != State::Prolog {
                return Err(self.error_here("doctype not allowed here"));
            }
            self.skip_doctype(pos)?;
            return Ok(true);
        }
        if self.cursor.starts_with(b"<!") {
            return Err(self.error_here("unexpected markup declaration"));
        }
        Ok(false)
    }

    fn skip_doctype(&mut self, pos: Pos) -> Result<()> {
        self.cursor.advance_by(b"<!DOCTYPE".len());
        let mut depth = 0usize;
        let mut quote = None;
        while let Some(b) = self.cursor.current() {
            self.cursor.advance();
            match (quote, b) {
                (Some(q), _) if b == q => quote = None,
                (Some(_), _) => {}
                (None, b'"' | b'\'') => quote = Some(b),
                (None, b'[') => depth += 1,
                (None, b']') => depth = depth.saturating_sub(1),
                (None, b'>') if depth == 0 => return Ok(()),
                _ => {}
            }
        }
        Err(Error::malformed("unterminated doctype", pos))
    }

    fn skip_until(&mut self, pattern: &[u8], message: &str, pos: Pos) -> Result<()> {
        while !self.cursor.is_eof() {
            if self.cursor.consume_bytes(pattern) {
                return Ok(());
            }
            self.cursor.advance();
        }
        Err(Error::malformed(message, pos))
    }

    fn parse_attributes(&mut self) -> Result<Vec<Attribute>> {
        let mut attrs: Vec<Attribute> = Vec::new();

        loop {
            self.cursor.skip_whitespace();
            match self.cursor.current() {
                Some(b'/' | b'>') => break,
                Some(_) => {}
                None => return Err(self.error_here("unterminated start tag")),
            }

            let pos = self.cursor.position();
            let name = self.parse_name()?;
            self.cursor.skip_whitespace();
            self.expect_byte(b'=')?;
            self.cursor.skip_whitespace();
            let value = self.parse_attribute_value()?;

            if attrs.iter().any(|attr| attr.name == name) {
                return Err(Error::malformed(format!("duplicate attribute: {name}"), pos));
            }
            attrs.push(Attribute { name, value });

            match self.cursor.current() {
                Some(b) if is_whitespace(b) || b == b'/' || b == b'>' => {}
                Some(_) => return Err(self.error_here("expected whitespace between attributes")),
                None => return Err(self.error_here("unterminated start tag")),
            }
        }

        Ok(attrs)
    }

    fn parse_attribute_value(&mut self) -> Result<String> {
        let quote = match self.cursor.current() {
            Some(b'"') => b'"',
            Some(b'\'') => b'\'',
            _ => return Err(self.error_here("expected quoted attribute value")),
        };
        self.cursor.advance();

        let pos = self.cursor.position();
        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == quote {
                let raw = bytes_to_string(self.cursor.slice_from(start), pos)?;
                self.cursor.advance();
                return decode_entities(&normalize_attribute(&raw), pos);
            }
            if b == b'<' {
                return Err(self.error_here("'<' not allowed in attribute value"));
            }
            self.cursor.advance();
        }

        Err(Error::malformed("unterminated attribute value", pos))
    }

    fn parse_name(&mut self) -> Result<String> {
        let pos = self.cursor.position();
        let start = self.cursor.pos();

        match self.cursor.current() {
            Some(first) if is_name_start(first) => self.cursor.advance(),
            Some(_) => return Err(self.error_here("invalid name")),
            None => return Err(self.error_here("expected name")),
        }

        while let Some(b) = self.cursor.current() {
            if is_name_char(b) {
                self.cursor.advance();
            } else {
                break;
            }
        }

        bytes_to_string(self.cursor.slice_from(start), pos)
    }

    fn expect_byte(&mut self, expected: u8) -> Result<()> {
        if self.cursor.consume(expected) {
            Ok(())
        } else if self.cursor.is_eof() {
            Err(self.error_here("unexpected end of input inside markup"))
        } else {
            Err(self.error_here(format!("expected '{}'", char::from(expected))))
        }
    }

    fn error_here(&self, reason: impl Into<String>) -> Error {
        Error::malformed(reason, self.cursor.position())
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = ParseEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_event() {
            Ok(Some(event)) => Some(event),
            Ok(None) => None,
            Err(err) => {
                self.state = State::Done;
                self.pending_end = None;
                Some(into_parse_error(err))
            }
        }
    }
}

impl FusedIterator for Tokenizer<'_> {}

fn into_parse_error(err: Error) -> ParseEvent {
    let pos = err.span().start;
    let reason = match err.kind() {
        ErrorKind::Malformed { reason } => reason.clone(),
        other => other.to_string(),
    };
    ParseEvent::ParseError { reason, pos }
}

fn bytes_to_string(bytes: &[u8], pos: Pos) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| Error::malformed("invalid utf-8", pos))
}

fn is_name_start(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

fn is_name_char(b: u8) -> bool {
    is_name_start(b) || matches!(b, b'0'..=b'9' | b'-' | b'.')
}

/// `\r\n` and lone `\r` become `\n`
fn normalize_newlines(input: &str) -> String {
    if !input.contains('\r') {
        return input.to_string();
    }
    input.replace("\r\n", "\n").replace('\r', "\n")
}

/// Literal tab, CR and LF in attribute values become spaces; a CRLF pair
/// counts as one
fn normalize_attribute(input: &str) -> String {
    normalize_newlines(input).replace(['\n', '\t'], " ")
}

fn decode_entities(input: &str, pos: Pos) -> Result<String> {
    if !input.contains('&') {
        return Ok(input.to_string());
    }

    let mut result = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        let (before, after) = rest.split_at(amp);
        result.push_str(before);

        let Some(semi) = after.find(';') else {
            return Err(Error::malformed("unterminated entity reference", pos));
        };
        let entity = after.get(1..semi).unwrap_or_default();
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => decode_numeric_entity(entity),
        };

        match decoded {
            Some(ch) => result.push(ch),
            None if entity.starts_with('#') => {
                return Err(Error::malformed(
                    format!("invalid character reference: &{entity};"),
                    pos,
                ));
            }
            None => {
                return Err(Error::malformed(format!("unknown entity: &{entity};"), pos));
            }
        }
        rest = after.get(semi + 1..).unwrap_or_default();
    }
    result.push_str(rest);

    Ok(result)
}

fn decode_numeric_entity(entity: &str) -> Option<char> {
    let code = if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        entity.strip_prefix('#')?.parse::<u32>().ok()?
    };
    char::from_u32(code).filter(|&c| is_xml_char(c))
}

/// The XML `Char` production
fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n'
            | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Debug;

    fn fail<T>(message: String) -> Result<T> {
        Err(Error::malformed(message, Pos::default()))
    }

    fn ensure_eq<T: PartialEq + Debug>(left: T, right: T) -> Result<()> {
        if left == right {
            Ok(())
        } else {
            fail(format!("assertion failed: left={left:?} right={right:?}"))
        }
    }

    fn events(input: &str) -> Vec<ParseEvent> {
        Tokenizer::new(input.as_bytes()).collect()
    }

    fn last_error(input: &str) -> Result<String> {
        match events(input).pop() {
            Some(ParseEvent::ParseError { reason, .. }) => Ok(reason),
            other => fail(format!("expected parse error, got {other:?}")),
        }
    }

    #[test]
    fn test_simple_element() -> Result<()> {
        ensure_eq(
            events("<root>hi</root>"),
            vec![
                ParseEvent::start("root"),
                ParseEvent::text("hi"),
                ParseEvent::end("root"),
            ],
        )
    }

    #[test]
    fn test_attributes() -> Result<()> {
        ensure_eq(
            events("<root id=\"1\" name='test'/>"),
            vec![
                ParseEvent::start_with(
                    "root",
                    vec![Attribute::new("id", "1"), Attribute::new("name", "test")],
                ),
                ParseEvent::end("root"),
            ],
        )
    }

    #[test]
    fn test_self_closing_child() -> Result<()> {
        ensure_eq(
            events("<a><b /></a>"),
            vec![
                ParseEvent::start("a"),
                ParseEvent::start("b"),
                ParseEvent::end("b"),
                ParseEvent::end("a"),
            ],
        )
    }

    #[test]
    fn test_prolog_and_epilog_skipped() -> Result<()> {
        let input = "<?xml version=\"1.0\"?>\n<!DOCTYPE a [<!ELEMENT a (#PCDATA)>]>\n<!-- c --><a/>\n<!-- tail -->\n";
        ensure_eq(
            events(input),
            vec![ParseEvent::start("a"), ParseEvent::end("a")],
        )
    }

    #[test]
    fn test_cdata_and_text_fragments() -> Result<()> {
        ensure_eq(
            events("<a>x &amp; <![CDATA[<y>]]> z</a>"),
            vec![
                ParseEvent::start("a"),
                ParseEvent::text("x & "),
                ParseEvent::text("<y>"),
                ParseEvent::text(" z"),
                ParseEvent::end("a"),
            ],
        )
    }

    #[test]
    fn test_comment_splits_text() -> Result<()> {
        ensure_eq(
            events("<a>x<!-- c -->y</a>"),
            vec![
                ParseEvent::start("a"),
                ParseEvent::text("x"),
                ParseEvent::text("y"),
                ParseEvent::end("a"),
            ],
        )
    }

    #[test]
    fn test_entities_and_char_refs() -> Result<()> {
        ensure_eq(
            events("<a t=\"&lt;&#65;&#x42;&quot;\">&apos;&gt;</a>"),
            vec![
                ParseEvent::start_with("a", vec![Attribute::new("t", "<AB\"")]),
                ParseEvent::text("'>"),
                ParseEvent::end("a"),
            ],
        )
    }

    #[test]
    fn test_newline_normalization() -> Result<()> {
        ensure_eq(
            events("<a v=\"x\r\ny\tz&#10;\">1\r\n2\r3</a>"),
            vec![
                ParseEvent::start_with("a", vec![Attribute::new("v", "x y z\n")]),
                ParseEvent::text("1\n2\n3"),
                ParseEvent::end("a"),
            ],
        )
    }

    #[test]
    fn test_non_ascii_names() -> Result<()> {
        ensure_eq(
            events("<größe>1</größe>"),
            vec![
                ParseEvent::start("größe"),
                ParseEvent::text("1"),
                ParseEvent::end("größe"),
            ],
        )
    }

    #[test]
    fn test_truncated_input_just_ends() -> Result<()> {
        ensure_eq(
            events("<a><b>"),
            vec![ParseEvent::start("a"), ParseEvent::start("b")],
        )
    }

    #[test]
    fn test_mismatched_close() -> Result<()> {
        let reason = last_error("<a><b></a></b>")?;
        ensure_eq(reason.contains("mismatched closing tag"), true)
    }

    #[test]
    fn test_error_position() -> Result<()> {
        match events("<a>\n  <b></c>\n</a>").pop() {
            Some(ParseEvent::ParseError { pos, .. }) => {
                ensure_eq(pos.line, 2)?;
                ensure_eq(pos.col, 6)
            }
            other => fail(format!("expected parse error, got {other:?}")),
        }
    }

    #[test]
    fn test_stream_stops_after_error() -> Result<()> {
        let mut tokenizer = Tokenizer::new(b"<a></b><c/>");
        ensure_eq(tokenizer.next(), Some(ParseEvent::start("a")))?;
        ensure_eq(tokenizer.next().map(|e| e.is_error()), Some(true))?;
        ensure_eq(tokenizer.next(), None)?;
        ensure_eq(tokenizer.next(), None)
    }

    #[test]
    fn test_duplicate_attribute() -> Result<()> {
        let reason = last_error("<a x=\"1\" x=\"2\"/>")?;
        ensure_eq(reason, "duplicate attribute: x".to_string())
    }

    #[test]
    fn test_missing_attribute_separator() -> Result<()> {
        let reason = last_error("<a x=\"1\"y=\"2\"/>")?;
        ensure_eq(reason, "expected whitespace between attributes".to_string())
    }

    #[test]
    fn test_unknown_entity() -> Result<()> {
        let reason = last_error("<a>&nbsp;</a>")?;
        ensure_eq(reason, "unknown entity: &nbsp;".to_string())
    }

    #[test]
    fn test_invalid_char_reference() -> Result<()> {
        ensure_eq(last_error("<a>&#0;</a>")?, "invalid character reference: &#0;".to_string())?;
        ensure_eq(
            last_error("<a v=\"&#x1F;\"/>")?,
            "invalid character reference: &#x1F;".to_string(),
        )?;
        ensure_eq(
            last_error("<a>&#xFFFE;</a>")?,
            "invalid character reference: &#xFFFE;".to_string(),
        )?;
        ensure_eq(
            events("<a>&#9;&#x1F600;</a>"),
            vec![
                ParseEvent::start("a"),
                ParseEvent::text("\t\u{1F600}"),
                ParseEvent::end("a"),
            ],
        )
    }

    #[test]
    fn test_cdata_end_in_text() -> Result<()> {
        ensure_eq(
            last_error("<a>x]]>y</a>")?,
            "']]>' not allowed in character data".to_string(),
        )?;
        ensure_eq(
            events("<a>x]]y</a>"),
            vec![ParseEvent::start("a"), ParseEvent::text("x]]y"), ParseEvent::end("a")],
        )
    }

    #[test]
    fn test_content_after_root() -> Result<()> {
        ensure_eq(
            last_error("<a/><b/>")?,
            "content after document element".to_string(),
        )?;
        ensure_eq(
            last_error("<a/>tail")?,
            "content after document element".to_string(),
        )
    }

    #[test]
    fn test_text_before_root() -> Result<()> {
        ensure_eq(
            last_error("junk<a/>")?,
            "content before document element".to_string(),
        )
    }

    #[test]
    fn test_unterminated_markup() -> Result<()> {
        ensure_eq(last_error("<a><!-- open")?, "unterminated comment".to_string())?;
        ensure_eq(
            last_error("<a><![CDATA[open")?,
            "unterminated cdata section".to_string(),
        )?;
        ensure_eq(
            last_error("<a x=\"1")?,
            "unterminated attribute value".to_string(),
        )
    }

    #[test]
    fn test_max_depth() -> Result<()> {
        let config = Config::with_limits(2, 0);
        let mut tokenizer = Tokenizer::with_config(b"<a><b><c/></b></a>", &config);
        ensure_eq(tokenizer.next(), Some(ParseEvent::start("a")))?;
        ensure_eq(tokenizer.next(), Some(ParseEvent::start("b")))?;
        ensure_eq(tokenizer.depth(), 2)?;
        match tokenizer.next() {
            Some(ParseEvent::ParseError { reason, .. }) => {
                ensure_eq(reason, "max depth of 2 exceeded".to_string())
            }
            other => fail(format!("expected depth error, got {other:?}")),
        }
    }

    #[test]
    fn test_max_size() -> Result<()> {
        let config = Config::with_limits(0, 4);
        let mut tokenizer = Tokenizer::with_config(b"<root/>", &config);
        ensure_eq(tokenizer.next().map(|e| e.is_error()), Some(true))
    }

    #[test]
    fn test_empty_input() -> Result<()> {
        ensure_eq(events("  \n"), Vec::new())
    }
}
