//! Ruby-like expression sub-parser.
//!
//! Covers the expression subset needed for attribute values and script
//! payloads: method calls with argument lists, sigiled variables,
//! literals, and a fixed binary-operator token set. The operator family
//! is deliberately flat — an operator node records the matched token
//! and the spans of the operands adjacent to it, with no precedence or
//! associativity. Callers that need evaluation semantics must layer
//! precedence on top themselves.

use hamlet_source::Span;
use serde::Serialize;

use crate::error::ParseError;
use crate::scan::is_word;
use crate::scan::Cursor;
use crate::MAX_EXPRESSION_DEPTH;

/// Operator tokens, longest first so `==` wins over `=`.
const OPERATORS: &[&str] = &[
    "==", "!=", "<=", ">=", "&&", "||", "=", "<", ">", "+", "-", "*", "/", "%", "!",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum LiteralKind {
    /// Quoted string; the payload is the content between the quotes.
    Str { content_span: Span },
    Number,
    True,
    False,
    Nil,
}

/// A Ruby-like expression.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum RubyExpr {
    /// Identifier with an optional parenthesized argument list. A bare
    /// identifier is a zero-argument call (the grammar tries calls
    /// before variables).
    MethodCall {
        name: String,
        name_span: Span,
        args: Vec<RubyExpr>,
        span: Span,
    },
    /// `@`- or `$`-sigiled word.
    Variable {
        sigil: char,
        name: String,
        span: Span,
    },
    Literal {
        kind: LiteralKind,
        span: Span,
    },
    /// Flat operator application: the token plus the spans of whatever
    /// operands sit beside it. Operand association is the caller's
    /// responsibility.
    BinaryOperator {
        op: &'static str,
        op_span: Span,
        lhs: Option<Span>,
        rhs: Option<Span>,
        span: Span,
    },
}

impl RubyExpr {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            RubyExpr::MethodCall { span, .. }
            | RubyExpr::Variable { span, .. }
            | RubyExpr::Literal { span, .. }
            | RubyExpr::BinaryOperator { span, .. } => *span,
        }
    }
}

/// Parse a Ruby-like expression at the start of `source`.
///
/// Returns the expression and the number of bytes consumed; trailing
/// input is left to the caller.
pub fn parse_expression(source: &str) -> Result<(RubyExpr, usize), ParseError> {
    let mut cursor = Cursor::new(source);
    cursor.skip_spaces();
    let expr = expression(&mut cursor, 0)?;
    Ok((expr, cursor.pos()))
}

pub(crate) fn expression(cursor: &mut Cursor<'_>, depth: usize) -> Result<RubyExpr, ParseError> {
    if depth >= MAX_EXPRESSION_DEPTH {
        return Err(ParseError::DepthExceeded {
            span: Span::empty_at(cursor.pos()),
        });
    }

    // A lone operator token is itself a valid (operand-less) expression.
    if let Some((op, op_span)) = eat_operator(cursor) {
        return Ok(finish_operator(cursor, depth, op, op_span, None));
    }

    let lhs = primary(cursor, depth)?;

    let mut lookahead = *cursor;
    lookahead.skip_spaces();
    if let Some((op, op_span)) = eat_operator(&mut lookahead) {
        *cursor = lookahead;
        return Ok(finish_operator(cursor, depth, op, op_span, Some(lhs.span())));
    }

    Ok(lhs)
}

/// Complete an operator node by trying to attach a right-hand operand.
/// A missing right operand is not an error; the node just records what
/// is there.
fn finish_operator(
    cursor: &mut Cursor<'_>,
    depth: usize,
    op: &'static str,
    op_span: Span,
    lhs: Option<Span>,
) -> RubyExpr {
    let mut lookahead = *cursor;
    lookahead.skip_spaces();
    let rhs = match primary(&mut lookahead, depth) {
        Ok(expr) => {
            *cursor = lookahead;
            Some(expr.span())
        }
        Err(_) => None,
    };

    let mut span = op_span;
    if let Some(lhs) = lhs {
        span = span.cover(lhs);
    }
    if let Some(rhs) = rhs {
        span = span.cover(rhs);
    }
    RubyExpr::BinaryOperator {
        op,
        op_span,
        lhs,
        rhs,
        span,
    }
}

fn eat_operator(cursor: &mut Cursor<'_>) -> Option<(&'static str, Span)> {
    let start = cursor.pos();
    for op in OPERATORS {
        if cursor.eat_str(op) {
            return Some((op, cursor.span_from(start)));
        }
    }
    None
}

fn primary(cursor: &mut Cursor<'_>, depth: usize) -> Result<RubyExpr, ParseError> {
    let start = cursor.pos();

    if let Some(string) = cursor.eat_quoted_string()? {
        return Ok(RubyExpr::Literal {
            kind: LiteralKind::Str {
                content_span: string.content_span,
            },
            span: string.span,
        });
    }

    if cursor.eat_number().is_some() {
        return Ok(RubyExpr::Literal {
            kind: LiteralKind::Number,
            span: cursor.span_from(start),
        });
    }

    if let Some(sigil @ ('@' | '$')) = cursor.peek() {
        let mut lookahead = *cursor;
        lookahead.bump();
        if let Some(name) = lookahead.eat_while1(is_word) {
            let name = name.to_string();
            *cursor = lookahead;
            return Ok(RubyExpr::Variable {
                sigil,
                name,
                span: cursor.span_from(start),
            });
        }
        return Err(ParseError::ExpectedExpression {
            span: Span::empty_at(start),
        });
    }

    if matches!(cursor.peek(), Some(ch) if ch.is_alphabetic() || ch == '_') {
        let name = cursor
            .eat_while1(is_word)
            .unwrap_or_default()
            .to_string();
        let name_span = cursor.span_from(start);

        match name.as_str() {
            "true" => {
                return Ok(RubyExpr::Literal {
                    kind: LiteralKind::True,
                    span: name_span,
                })
            }
            "false" => {
                return Ok(RubyExpr::Literal {
                    kind: LiteralKind::False,
                    span: name_span,
                })
            }
            "nil" => {
                return Ok(RubyExpr::Literal {
                    kind: LiteralKind::Nil,
                    span: name_span,
                })
            }
            _ => {}
        }

        let args = if cursor.starts_with("(") {
            arguments(cursor, depth)?
        } else {
            Vec::new()
        };

        return Ok(RubyExpr::MethodCall {
            name,
            name_span,
            args,
            span: cursor.span_from(start),
        });
    }

    Err(ParseError::ExpectedExpression {
        span: Span::empty_at(start),
    })
}

/// Parse a parenthesized, comma-separated argument list. The cursor
/// must be at `(`.
fn arguments(cursor: &mut Cursor<'_>, depth: usize) -> Result<Vec<RubyExpr>, ParseError> {
    let open = cursor.pos();
    cursor.eat_str("(");
    cursor.skip_spaces();

    let mut args = Vec::new();
    if cursor.eat_str(")") {
        return Ok(args);
    }

    loop {
        args.push(expression(cursor, depth + 1)?);
        cursor.skip_spaces();
        if cursor.eat_str(",") {
            cursor.skip_spaces();
            continue;
        }
        if cursor.eat_str(")") {
            return Ok(args);
        }
        return Err(ParseError::UnterminatedArguments {
            span: cursor.span_from(open),
        });
    }
}
