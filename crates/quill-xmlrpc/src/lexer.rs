//! XML tokenizer for the codec.
//!
//! A minimal pull lexer over the subset of XML that XML-RPC envelopes
//! use: elements without meaningful attributes, character data, CDATA
//! sections, comments, and processing instructions. Document type
//! declarations are rejected outright so entity-expansion tricks never
//! reach the parser.

use crate::error::DoctypeRejectedSnafu;
use crate::error::MalformedSnafu;
use crate::error::Result;
use crate::error::UnexpectedEofSnafu;

/// One lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `<name>` (attributes, if any, are discarded).
    Open(String),
    /// `</name>`
    Close(String),
    /// `<name/>`
    Empty(String),
    /// Character data between tags, entity-decoded. CDATA content is
    /// yielded verbatim as its own token.
    Text(String),
}

pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Byte offset of the next unread input, for error reporting.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Pull the next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Result<Option<Token>> {
        loop {
            let rest = &self.input[self.pos..];
            if rest.is_empty() {
                return Ok(None);
            }

            if !rest.starts_with('<') {
                return self.read_text().map(Some);
            }

            if rest.starts_with("<?") {
                self.skip_past("?>")?;
                continue;
            }
            if rest.starts_with("<!--") {
                self.skip_past("-->")?;
                continue;
            }
            if rest.starts_with("<![CDATA[") {
                return self.read_cdata().map(Some);
            }
            if rest.len() >= 9 && rest.as_bytes()[..9].eq_ignore_ascii_case(b"<!doctype") {
                return DoctypeRejectedSnafu.fail();
            }
            if rest.starts_with("<!") {
                return MalformedSnafu {
                    position: self.pos,
                    reason: "unsupported markup declaration".to_string(),
                }
                .fail();
            }
            if rest.starts_with("</") {
                return self.read_close_tag().map(Some);
            }
            return self.read_open_tag().map(Some);
        }
    }

    fn read_text(&mut self) -> Result<Token> {
        let start = self.pos;
        let bytes = self.input.as_bytes();
        while self.pos < bytes.len() && bytes[self.pos] != b'<' {
            self.pos += 1;
        }
        let raw = &self.input[start..self.pos];
        decode_entities(raw, start).map(Token::Text)
    }

    fn read_cdata(&mut self) -> Result<Token> {
        let content_start = self.pos + "<![CDATA[".len();
        let rest = &self.input[content_start..];
        let end = rest.find("]]>").ok_or_else(|| UnexpectedEofSnafu { position: self.pos }.build())?;
        let content = rest[..end].to_string();
        self.pos = content_start + end + "]]>".len();
        Ok(Token::Text(content))
    }

    fn read_close_tag(&mut self) -> Result<Token> {
        self.pos += 2;
        let name = self.read_name()?;
        self.skip_whitespace();
        match self.current_byte() {
            Some(b'>') => {
                self.pos += 1;
                Ok(Token::Close(name))
            }
            Some(_) => MalformedSnafu {
                position: self.pos,
                reason: format!("junk in closing tag </{name}>"),
            }
            .fail(),
            None => UnexpectedEofSnafu { position: self.pos }.fail(),
        }
    }

    fn read_open_tag(&mut self) -> Result<Token> {
        self.pos += 1;
        let name = self.read_name()?;

        // Scan past any attributes; XML-RPC gives them no meaning.
        let mut in_quote: Option<u8> = None;
        loop {
            let byte = self
                .current_byte()
                .ok_or_else(|| UnexpectedEofSnafu { position: self.pos }.build())?;
            match in_quote {
                Some(quote) => {
                    if byte == quote {
                        in_quote = None;
                    }
                    self.pos += 1;
                }
                None => match byte {
                    b'"' | b'\'' => {
                        in_quote = Some(byte);
                        self.pos += 1;
                    }
                    b'/' if self.peek_byte(1) == Some(b'>') => {
                        self.pos += 2;
                        return Ok(Token::Empty(name));
                    }
                    b'>' => {
                        self.pos += 1;
                        return Ok(Token::Open(name));
                    }
                    _ => self.pos += 1,
                },
            }
        }
    }

    fn read_name(&mut self) -> Result<String> {
        let start = self.pos;
        let bytes = self.input.as_bytes();
        while self.pos < bytes.len() && is_name_byte(bytes[self.pos]) {
            self.pos += 1;
        }
        if self.pos == start {
            return MalformedSnafu {
                position: start,
                reason: "missing tag name".to_string(),
            }
            .fail();
        }
        Ok(self.input[start..self.pos].to_string())
    }

    fn skip_past(&mut self, terminator: &str) -> Result<()> {
        let rest = &self.input[self.pos..];
        match rest.find(terminator) {
            Some(idx) => {
                self.pos += idx + terminator.len();
                Ok(())
            }
            None => UnexpectedEofSnafu { position: self.pos }.fail(),
        }
    }

    fn skip_whitespace(&mut self) {
        let bytes = self.input.as_bytes();
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn current_byte(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn peek_byte(&self, offset: usize) -> Option<u8> {
        self.input.as_bytes().get(self.pos + offset).copied()
    }
}

fn is_name_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'_' | b'-' | b':')
}

/// Decode the predefined entities and numeric character references.
fn decode_entities(raw: &str, at: usize) -> Result<String> {
    if !raw.contains('&') {
        return Ok(raw.to_string());
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(idx) = rest.find('&') {
        out.push_str(&rest[..idx]);
        let after = &rest[idx + 1..];
        let semi = after.find(';').ok_or_else(|| {
            MalformedSnafu {
                position: at,
                reason: "unterminated entity reference",
            }
            .build()
        })?;
        let name = &after[..semi];
        let decoded = match name {
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "quot" => '"',
            "apos" => '\'',
            _ => char_reference(name).ok_or_else(|| {
                MalformedSnafu {
                    position: at,
                    reason: format!("unknown entity &{name};"),
                }
                .build()
            })?,
        };
        out.push(decoded);
        rest = &after[semi + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn char_reference(name: &str) -> Option<char> {
    let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok()?
    } else if let Some(dec) = name.strip_prefix('#') {
        dec.parse::<u32>().ok()?
    } else {
        return None;
    };
    char::from_u32(code)
}
