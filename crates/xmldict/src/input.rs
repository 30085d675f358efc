//! Input sources and character decoding
//!
//! The tokenizer only understands UTF-8. `Input` figures out what the bytes
//! actually are (byte order mark, UTF-16 layout, or the `encoding` of the XML
//! declaration) and decodes them.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};

use crate::error::{Error, ErrorKind, Pos, Result, Span};

/// How far into the input the XML declaration may end
const DECLARATION_WINDOW: usize = 1024;

/// Input source abstraction
#[derive(Clone, Debug)]
pub struct Input<'a> {
    source: &'a [u8],
    filename: Option<&'a str>,
}

impl<'a> Input<'a> {
    /// Create from byte slice
    pub const fn from_bytes(source: &'a [u8]) -> Self {
        Self {
            source,
            filename: None,
        }
    }

    /// Create from string
    pub const fn from_str(source: &'a str) -> Self {
        Self {
            source: source.as_bytes(),
            filename: None,
        }
    }

    /// Set filename for diagnostics
    pub const fn with_filename(mut self, filename: &'a str) -> Self {
        self.filename = Some(filename);
        self
    }

    pub const fn as_bytes(&self) -> &[u8] {
        self.source
    }

    pub const fn filename(&self) -> Option<&str> {
        self.filename
    }

    pub const fn len(&self) -> usize {
        self.source.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Encoding the document is written in
    pub fn encoding(&self) -> Result<&'static Encoding> {
        self.detect().map(|(encoding, _)| encoding)
    }

    /// Decode to UTF-8 text, borrowing when the input already is UTF-8
    pub fn decode(&self) -> Result<Cow<'a, str>> {
        let (encoding, bom_len) = self.detect()?;
        let body: &'a [u8] = self.source.get(bom_len..).unwrap_or_default();

        if encoding == UTF_8 {
            return std::str::from_utf8(body).map(Cow::Borrowed).map_err(|err| {
                Error::new(
                    ErrorKind::InvalidEncoding {
                        encoding: UTF_8.name().to_string(),
                    },
                    Span::at(Pos::new(bom_len + err.valid_up_to(), 0, 0)),
                )
            });
        }

        let (text, had_errors) = encoding.decode_without_bom_handling(body);
        if had_errors {
            return Err(Error::new(
                ErrorKind::InvalidEncoding {
                    encoding: encoding.name().to_string(),
                },
                Span::empty(),
            ));
        }
        Ok(text)
    }

    /// Detected encoding and the length of its byte order mark
    fn detect(&self) -> Result<(&'static Encoding, usize)> {
        if let Some(found) = Encoding::for_bom(self.source) {
            return Ok(found);
        }

        match self.source {
            [0x00, b'<', ..] => return Ok((UTF_16BE, 0)),
            [b'<', 0x00, ..] => return Ok((UTF_16LE, 0)),
            _ => {}
        }

        match declared_encoding(self.source) {
            // an ASCII-compatible declaration cannot honestly claim UTF-16
            Some(label) => Encoding::for_label(label)
                .map(|encoding| (encoding.output_encoding(), 0))
                .ok_or_else(|| {
                    Error::new(
                        ErrorKind::UnsupportedEncoding {
                            label: String::from_utf8_lossy(label).into_owned(),
                        },
                        Span::empty(),
                    )
                }),
            None => Ok((UTF_8, 0)),
        }
    }
}

impl<'a> From<&'a str> for Input<'a> {
    fn from(s: &'a str) -> Self {
        Self::from_str(s)
    }
}

impl<'a> From<&'a [u8]> for Input<'a> {
    fn from(b: &'a [u8]) -> Self {
        Self::from_bytes(b)
    }
}

/// Value of the `encoding` pseudo-attribute of a leading `<?xml ...?>`
fn declared_encoding(source: &[u8]) -> Option<&[u8]> {
    let rest = source.strip_prefix(b"<?xml")?;
    if !rest.first().is_some_and(u8::is_ascii_whitespace) {
        return None;
    }
    let window = rest.get(..DECLARATION_WINDOW.min(rest.len()))?;
    let decl = window.get(..find(window, b"?>")?)?;

    let after_key = decl.get(find(decl, b"encoding")? + b"encoding".len()..)?;
    let after_eq = trim_start(after_key).strip_prefix(b"=")?;
    let value = trim_start(after_eq);
    let quote = *value.first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let value = value.get(1..)?;
    let end = value.iter().position(|&b| b == quote)?;
    value.get(..end)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn trim_start(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    bytes.get(start..).unwrap_or_default()
}
