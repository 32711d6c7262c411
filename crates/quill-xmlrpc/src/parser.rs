//! Recursive-descent parser for XML-RPC envelopes.
//!
//! Consumes the token stream from [`Lexer`](crate::lexer::Lexer) and
//! produces [`Value`] trees. Value nesting is bounded by
//! [`MAX_VALUE_DEPTH`]; the parser never recurses deeper than that no
//! matter what the document claims.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use snafu::ensure;

use quill_api::cast::parse_datetime_text;
use quill_api::limits::MAX_CALL_PARAMS;
use quill_api::limits::MAX_METHOD_NAME_LEN;
use quill_api::limits::MAX_VALUE_DEPTH;
use quill_api::Fault;
use quill_api::StructValue;
use quill_api::Value;

use crate::error::DepthExceededSnafu;
use crate::error::InvalidScalarSnafu;
use crate::error::MalformedSnafu;
use crate::error::MethodNameTooLongSnafu;
use crate::error::Result;
use crate::error::TooManyParamsSnafu;
use crate::error::UnexpectedEofSnafu;
use crate::error::UnexpectedElementSnafu;
use crate::error::UnknownValueTagSnafu;
use crate::lexer::Lexer;
use crate::lexer::Token;

/// One decoded `methodCall` envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub method_name: String,
    pub params: Vec<Value>,
}

/// One decoded `methodResponse` envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodResponse {
    Success(Value),
    Fault(Fault),
}

/// Parse a `methodCall` document.
pub fn parse_method_call(input: &str) -> Result<MethodCall> {
    let mut parser = Parser::new(input);
    parser.expect_open("methodCall")?;
    parser.expect_open("methodName")?;
    let method_name = parser.read_text_until_close("methodName")?.trim().to_string();
    ensure!(
        method_name.len() <= MAX_METHOD_NAME_LEN,
        MethodNameTooLongSnafu {
            limit: MAX_METHOD_NAME_LEN
        }
    );
    if method_name.is_empty() {
        return MalformedSnafu {
            position: parser.pos(),
            reason: "empty method name".to_string(),
        }
        .fail();
    }

    let mut params = Vec::new();
    match parser.next_structural()? {
        Token::Open(tag) if tag == "params" => {
            loop {
                match parser.next_structural()? {
                    Token::Open(tag) if tag == "param" => {
                        ensure!(
                            params.len() < MAX_CALL_PARAMS,
                            TooManyParamsSnafu {
                                limit: MAX_CALL_PARAMS
                            }
                        );
                        let value = parser.parse_value(0)?;
                        parser.expect_close("param")?;
                        params.push(value);
                    }
                    Token::Close(tag) if tag == "params" => break,
                    other => return unexpected("param", &other),
                }
            }
            parser.expect_close("methodCall")?;
        }
        Token::Empty(tag) if tag == "params" => {
            parser.expect_close("methodCall")?;
        }
        Token::Close(tag) if tag == "methodCall" => {}
        other => return unexpected("params", &other),
    }
    parser.expect_end()?;

    Ok(MethodCall { method_name, params })
}

/// Parse a `methodResponse` document.
pub fn parse_method_response(input: &str) -> Result<MethodResponse> {
    let mut parser = Parser::new(input);
    parser.expect_open("methodResponse")?;
    let response = match parser.next_structural()? {
        Token::Open(tag) if tag == "params" => {
            parser.expect_open("param")?;
            let value = parser.parse_value(0)?;
            parser.expect_close("param")?;
            parser.expect_close("params")?;
            MethodResponse::Success(value)
        }
        Token::Open(tag) if tag == "fault" => {
            let value = parser.parse_value(0)?;
            parser.expect_close("fault")?;
            let fields = match value.as_struct() {
                Some(fields) => fields,
                None => {
                    return MalformedSnafu {
                        position: parser.pos(),
                        reason: "fault payload is not a struct".to_string(),
                    }
                    .fail();
                }
            };
            let code = match fields.get("faultCode").and_then(Value::as_i64) {
                Some(code) => code,
                None => {
                    return MalformedSnafu {
                        position: parser.pos(),
                        reason: "fault struct has no integer faultCode".to_string(),
                    }
                    .fail();
                }
            };
            let message = fields.get("faultString").and_then(Value::as_str).unwrap_or_default().to_string();
            MethodResponse::Fault(Fault::new(code, message))
        }
        other => return unexpected("params", &other),
    };
    parser.expect_close("methodResponse")?;
    parser.expect_end()?;
    Ok(response)
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    peeked: Option<Token>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            lexer: Lexer::new(input),
            peeked: None,
        }
    }

    fn pos(&self) -> usize {
        self.lexer.pos()
    }

    fn next_raw(&mut self) -> Result<Option<Token>> {
        match self.peeked.take() {
            Some(token) => Ok(Some(token)),
            None => self.lexer.next_token(),
        }
    }

    /// Next token that matters structurally: whitespace-only character
    /// data between elements is insignificant and skipped.
    fn next_structural(&mut self) -> Result<Token> {
        loop {
            match self.next_raw()? {
                None => return UnexpectedEofSnafu { position: self.pos() }.fail(),
                Some(Token::Text(text)) if text.trim().is_empty() => continue,
                Some(Token::Text(_)) => {
                    return MalformedSnafu {
                        position: self.pos(),
                        reason: "unexpected character data".to_string(),
                    }
                    .fail();
                }
                Some(token) => return Ok(token),
            }
        }
    }

    fn expect_open(&mut self, name: &str) -> Result<()> {
        match self.next_structural()? {
            Token::Open(tag) if tag == name => Ok(()),
            other => unexpected(name, &other),
        }
    }

    fn expect_close(&mut self, name: &str) -> Result<()> {
        match self.next_structural()? {
            Token::Close(tag) if tag == name => Ok(()),
            other => unexpected_closing(name, &other),
        }
    }

    /// Collect character data verbatim until the matching close tag.
    fn read_text_until_close(&mut self, name: &str) -> Result<String> {
        let mut text = String::new();
        loop {
            match self.next_raw()? {
                None => return UnexpectedEofSnafu { position: self.pos() }.fail(),
                Some(Token::Text(chunk)) => text.push_str(&chunk),
                Some(Token::Close(tag)) if tag == name => return Ok(text),
                Some(other) => {
                    return MalformedSnafu {
                        position: self.pos(),
                        reason: format!("unexpected {} inside <{name}>", describe(&other)),
                    }
                    .fail();
                }
            }
        }
    }

    /// Parse one `<value>` element, including its close tag.
    fn parse_value(&mut self, depth: usize) -> Result<Value> {
        match self.next_structural()? {
            Token::Open(tag) if tag == "value" => self.parse_value_contents(depth),
            Token::Empty(tag) if tag == "value" => Ok(Value::String(String::new())),
            other => unexpected("value", &other),
        }
    }

    /// Parse what follows an already-consumed `<value>` open tag.
    fn parse_value_contents(&mut self, depth: usize) -> Result<Value> {
        ensure!(depth < MAX_VALUE_DEPTH, DepthExceededSnafu { limit: MAX_VALUE_DEPTH });

        let mut text = String::new();
        loop {
            match self.next_raw()? {
                None => return UnexpectedEofSnafu { position: self.pos() }.fail(),
                Some(Token::Text(chunk)) => text.push_str(&chunk),
                // An untagged value is a string per the protocol.
                Some(Token::Close(tag)) if tag == "value" => return Ok(Value::String(text)),
                Some(Token::Close(tag)) => {
                    return MalformedSnafu {
                        position: self.pos(),
                        reason: format!("mismatched </{tag}> inside <value>"),
                    }
                    .fail();
                }
                Some(Token::Open(tag)) => {
                    if !text.trim().is_empty() {
                        return MalformedSnafu {
                            position: self.pos(),
                            reason: "character data beside element inside <value>".to_string(),
                        }
                        .fail();
                    }
                    let value = self.parse_typed(&tag, depth)?;
                    self.expect_close("value")?;
                    return Ok(value);
                }
                Some(Token::Empty(tag)) => {
                    if !text.trim().is_empty() {
                        return MalformedSnafu {
                            position: self.pos(),
                            reason: "character data beside element inside <value>".to_string(),
                        }
                        .fail();
                    }
                    let value = match tag.as_str() {
                        "array" => Value::Array(Vec::new()),
                        "struct" => Value::Struct(StructValue::new()),
                        scalar => scalar_from_text(scalar, String::new())?,
                    };
                    self.expect_close("value")?;
                    return Ok(value);
                }
            }
        }
    }

    fn parse_typed(&mut self, tag: &str, depth: usize) -> Result<Value> {
        match tag {
            "array" => self.parse_array(depth),
            "struct" => self.parse_struct(depth),
            scalar => {
                let text = self.read_text_until_close(scalar)?;
                scalar_from_text(scalar, text)
            }
        }
    }

    fn parse_array(&mut self, depth: usize) -> Result<Value> {
        match self.next_structural()? {
            Token::Open(tag) if tag == "data" => {}
            Token::Empty(tag) if tag == "data" => {
                self.expect_close("array")?;
                return Ok(Value::Array(Vec::new()));
            }
            other => return unexpected("data", &other),
        }

        let mut items = Vec::new();
        loop {
            match self.next_structural()? {
                Token::Open(tag) if tag == "value" => items.push(self.parse_value_contents(depth + 1)?),
                Token::Empty(tag) if tag == "value" => items.push(Value::String(String::new())),
                Token::Close(tag) if tag == "data" => break,
                other => return unexpected("value", &other),
            }
        }
        self.expect_close("array")?;
        Ok(Value::Array(items))
    }

    fn parse_struct(&mut self, depth: usize) -> Result<Value> {
        let mut fields = StructValue::new();
        loop {
            match self.next_structural()? {
                Token::Open(tag) if tag == "member" => {
                    let name = match self.next_structural()? {
                        Token::Open(tag) if tag == "name" => self.read_text_until_close("name")?,
                        Token::Empty(tag) if tag == "name" => String::new(),
                        other => return unexpected("name", &other),
                    };
                    let value = self.parse_value(depth + 1)?;
                    self.expect_close("member")?;
                    fields.insert(name, value);
                }
                Token::Close(tag) if tag == "struct" => break,
                other => return unexpected("member", &other),
            }
        }
        Ok(Value::Struct(fields))
    }

    /// Verify only insignificant content remains.
    fn expect_end(&mut self) -> Result<()> {
        loop {
            match self.next_raw()? {
                None => return Ok(()),
                Some(Token::Text(text)) if text.trim().is_empty() => continue,
                Some(other) => {
                    return MalformedSnafu {
                        position: self.pos(),
                        reason: format!("trailing {} after document end", describe(&other)),
                    }
                    .fail();
                }
            }
        }
    }
}

fn scalar_from_text(tag: &str, text: String) -> Result<Value> {
    match tag {
        "i4" | "int" | "i8" => text.trim().parse::<i64>().map(Value::Int).map_err(|_| {
            InvalidScalarSnafu {
                kind: "int",
                text: text.clone(),
            }
            .build()
        }),
        "boolean" => match text.trim() {
            "1" | "true" => Ok(Value::Bool(true)),
            "0" | "false" => Ok(Value::Bool(false)),
            _ => InvalidScalarSnafu {
                kind: "boolean",
                text,
            }
            .fail(),
        },
        "string" => Ok(Value::String(text)),
        "double" => match text.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(Value::Double(value)),
            _ => InvalidScalarSnafu {
                kind: "double",
                text,
            }
            .fail(),
        },
        "dateTime.iso8601" => match parse_datetime_text(text.trim()) {
            Some(value) => Ok(Value::DateTime(value)),
            None => InvalidScalarSnafu {
                kind: "dateTime",
                text,
            }
            .fail(),
        },
        "base64" => {
            let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
            match STANDARD.decode(cleaned.as_bytes()) {
                Ok(bytes) => Ok(Value::Base64(bytes)),
                Err(_) => InvalidScalarSnafu {
                    kind: "base64",
                    text,
                }
                .fail(),
            }
        }
        other => UnknownValueTagSnafu {
            tag: other.to_string(),
        }
        .fail(),
    }
}

fn unexpected<T>(expected: &str, found: &Token) -> Result<T> {
    UnexpectedElementSnafu {
        expected: expected.to_string(),
        found: describe(found),
    }
    .fail()
}

fn unexpected_closing<T>(expected: &str, found: &Token) -> Result<T> {
    UnexpectedElementSnafu {
        expected: format!("/{expected}"),
        found: describe(found),
    }
    .fail()
}

fn describe(token: &Token) -> String {
    match token {
        Token::Open(tag) => format!("<{tag}>"),
        Token::Close(tag) => format!("</{tag}>"),
        Token::Empty(tag) => format!("<{tag}/>"),
        Token::Text(_) => "character data".to_string(),
    }
}
