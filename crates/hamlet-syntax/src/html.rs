//! Inline-HTML sub-parser.
//!
//! Literal HTML tags embedded in a document: `<name …>`, with plain
//! attributes and `on*` event attributes whose unquoted values are
//! parsed with the JavaScript expression grammar. Like the expression
//! sub-parsers this is a standalone entry point over a text fragment;
//! the structural dispatcher never delegates here.

use hamlet_source::Span;
use serde::Serialize;

use crate::error::ParseError;
use crate::js;
use crate::js::JsExpr;
use crate::scan::is_word;
use crate::scan::Cursor;

/// A quoted attribute value; `content_span` excludes the delimiters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StrValue {
    pub content_span: Span,
    pub span: Span,
}

/// The value of an `on*` event attribute.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum EventHandler {
    Str(StrValue),
    /// Unquoted handler, parsed as a JavaScript expression.
    Script(JsExpr),
}

/// One item in an HTML tag's attribute run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum HtmlAttr {
    /// `key` or `key="value"`.
    Attribute {
        name: String,
        name_span: Span,
        value: Option<StrValue>,
        span: Span,
    },
    /// `on<event>=value`; the value is required.
    Event {
        name: String,
        name_span: Span,
        handler: EventHandler,
        span: Span,
    },
}

impl HtmlAttr {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            HtmlAttr::Attribute { span, .. } | HtmlAttr::Event { span, .. } => *span,
        }
    }
}

/// An inline HTML tag: `<name attr… >`, `</name>`, or `<name… />`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HtmlTag {
    pub name: String,
    pub name_span: Span,
    /// Leading `/`: a closing tag.
    pub closing: bool,
    /// Trailing `/` before `>`.
    pub self_closing: bool,
    pub attrs: Vec<HtmlAttr>,
    pub span: Span,
}

/// Parse an HTML tag at the start of `source`.
///
/// Returns the tag and the number of bytes consumed; trailing input is
/// left to the caller.
pub fn parse_tag(source: &str) -> Result<(HtmlTag, usize), ParseError> {
    let mut cursor = Cursor::new(source);
    cursor.skip_spaces();
    let tag = tag(&mut cursor)?;
    Ok((tag, cursor.pos()))
}

fn tag(cursor: &mut Cursor<'_>) -> Result<HtmlTag, ParseError> {
    let start = cursor.pos();
    if !cursor.eat_str("<") {
        return Err(ParseError::ExpectedHtmlTag {
            span: Span::empty_at(start),
        });
    }
    let closing = cursor.eat_str("/");

    let name_start = cursor.pos();
    let Some(name) = cursor.eat_while1(|ch| is_word(ch) || ch == ':') else {
        return Err(ParseError::ExpectedHtmlTag {
            span: cursor.span_from(start),
        });
    };
    let name = name.to_string();
    let name_span = cursor.span_from(name_start);

    let mut attrs = Vec::new();
    loop {
        cursor.skip_whitespace();
        if cursor.eat_str("/") {
            // a trailing slash is only valid immediately before the close
            if cursor.eat_str(">") {
                return Ok(HtmlTag {
                    name,
                    name_span,
                    closing,
                    self_closing: true,
                    attrs,
                    span: cursor.span_from(start),
                });
            }
            return Err(ParseError::UnterminatedHtmlTag {
                span: cursor.span_from(start),
            });
        }
        if cursor.eat_str(">") {
            return Ok(HtmlTag {
                name,
                name_span,
                closing,
                self_closing: false,
                attrs,
                span: cursor.span_from(start),
            });
        }
        if cursor.is_at_end() {
            return Err(ParseError::UnterminatedHtmlTag {
                span: cursor.span_from(start),
            });
        }
        attrs.push(attr(cursor)?);
    }
}

fn attr(cursor: &mut Cursor<'_>) -> Result<HtmlAttr, ParseError> {
    let start = cursor.pos();
    let Some(name) = cursor.eat_while1(|ch| is_word(ch) || ch == '-') else {
        return Err(ParseError::MalformedAttribute {
            span: Span::empty_at(start),
        });
    };
    let name = name.to_string();
    let name_span = cursor.span_from(start);

    if is_event_name(&name) {
        if !cursor.eat_str("=") {
            return Err(ParseError::MalformedAttribute {
                span: cursor.span_from(start),
            });
        }
        let handler = match cursor.eat_quoted_string()? {
            Some(string) => EventHandler::Str(StrValue {
                content_span: string.content_span,
                span: string.span,
            }),
            None => EventHandler::Script(js::expression(cursor, 0)?),
        };
        return Ok(HtmlAttr::Event {
            name,
            name_span,
            handler,
            span: cursor.span_from(start),
        });
    }

    let value = if cursor.eat_str("=") {
        match cursor.eat_quoted_string()? {
            Some(string) => Some(StrValue {
                content_span: string.content_span,
                span: string.span,
            }),
            None => {
                return Err(ParseError::MalformedAttribute {
                    span: cursor.span_from(start),
                })
            }
        }
    } else {
        None
    };

    Ok(HtmlAttr::Attribute {
        name,
        name_span,
        value,
        span: cursor.span_from(start),
    })
}

/// `on` followed by at least one word character, like `onclick`. A
/// dashed name such as `on-load` is an ordinary attribute.
fn is_event_name(name: &str) -> bool {
    match name.strip_prefix("on") {
        Some(rest) => !rest.is_empty() && rest.chars().all(is_word),
        None => false,
    }
}
