//! JavaScript-like expression sub-parser.
//!
//! Postfix-chain parsing: a primary expression followed by a loop of
//! trailers, so `a.b.c(1)[2]` nests left-to-right with each trailer
//! wrapping the previous result. Template strings reinvoke the parser
//! for every `${ … }` substitution, which makes this the one place with
//! genuinely unbounded grammar recursion — guarded by the shared depth
//! limit.

use hamlet_source::Span;
use serde::Serialize;

use crate::error::ParseError;
use crate::scan::is_word;
use crate::scan::Cursor;
use crate::MAX_EXPRESSION_DEPTH;

/// The closed keyword set. Lexically these are ordinary identifiers;
/// they are recognized by set membership and surfaced as a distinct
/// node kind, never folded into `Identifier`.
pub const KEYWORDS: &[&str] = &[
    "if", "else", "switch", "for", "while", "do", "break", "continue", "function", "return",
    "with", "try", "catch", "finally", "throw", "typeof", "instanceof", "new", "delete", "await",
    "yield",
];

/// One piece of a template string: a literal run or a `${ … }`
/// substitution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum TemplatePart {
    Chars { span: Span },
    Substitution { expr: Box<JsExpr>, span: Span },
}

/// A JavaScript-like expression.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum JsExpr {
    /// Quoted string; `content_span` excludes the delimiters.
    Str { content_span: Span, span: Span },
    /// Backtick-delimited sequence of literal runs and substitutions.
    TemplateString { parts: Vec<TemplatePart>, span: Span },
    Number { span: Span },
    Identifier { name: String, span: Span },
    /// A member of the closed keyword set.
    Keyword { name: String, span: Span },
    /// `base.property`
    MemberAccess {
        base: Box<JsExpr>,
        property: String,
        property_span: Span,
        span: Span,
    },
    /// `callee(args…)`
    Call {
        callee: Box<JsExpr>,
        args: Vec<JsExpr>,
        span: Span,
    },
    /// `base[index]`
    Index {
        base: Box<JsExpr>,
        index: Box<JsExpr>,
        span: Span,
    },
}

impl JsExpr {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            JsExpr::Str { span, .. }
            | JsExpr::TemplateString { span, .. }
            | JsExpr::Number { span }
            | JsExpr::Identifier { span, .. }
            | JsExpr::Keyword { span, .. }
            | JsExpr::MemberAccess { span, .. }
            | JsExpr::Call { span, .. }
            | JsExpr::Index { span, .. } => *span,
        }
    }
}

/// Parse a JavaScript-like expression at the start of `source`.
///
/// Returns the expression and the number of bytes consumed; trailing
/// input is left to the caller.
pub fn parse_expression(source: &str) -> Result<(JsExpr, usize), ParseError> {
    let mut cursor = Cursor::new(source);
    cursor.skip_spaces();
    let expr = expression(&mut cursor, 0)?;
    Ok((expr, cursor.pos()))
}

pub(crate) fn expression(cursor: &mut Cursor<'_>, depth: usize) -> Result<JsExpr, ParseError> {
    if depth >= MAX_EXPRESSION_DEPTH {
        return Err(ParseError::DepthExceeded {
            span: Span::empty_at(cursor.pos()),
        });
    }

    let mut expr = primary(cursor, depth)?;
    if matches!(expr, JsExpr::Keyword { .. }) {
        // Keywords are complete on their own; they head statements, not
        // member/call/index chains.
        return Ok(expr);
    }

    loop {
        let checkpoint = *cursor;
        cursor.skip_spaces();

        if cursor.eat_str(".") {
            cursor.skip_spaces();
            let prop_start = cursor.pos();
            let Some(property) = eat_identifier(cursor) else {
                return Err(ParseError::ExpectedPropertyName {
                    span: Span::empty_at(cursor.pos()),
                });
            };
            let property_span = cursor.span_from(prop_start);
            let span = expr.span().cover(property_span);
            expr = JsExpr::MemberAccess {
                base: Box::new(expr),
                property: property.to_string(),
                property_span,
                span,
            };
        } else if cursor.starts_with("(") {
            let args = arguments(cursor, depth)?;
            let span = expr.span().cover(cursor.span_from(cursor.pos()));
            expr = JsExpr::Call {
                callee: Box::new(expr),
                args,
                span,
            };
        } else if cursor.starts_with("[") {
            let open = cursor.pos();
            cursor.eat_str("[");
            cursor.skip_spaces();
            let index = expression(cursor, depth + 1)?;
            cursor.skip_spaces();
            if !cursor.eat_str("]") {
                return Err(ParseError::UnterminatedIndex {
                    span: cursor.span_from(open),
                });
            }
            let span = expr.span().cover(cursor.span_from(cursor.pos()));
            expr = JsExpr::Index {
                base: Box::new(expr),
                index: Box::new(index),
                span,
            };
        } else {
            *cursor = checkpoint;
            break;
        }
    }

    Ok(expr)
}

fn primary(cursor: &mut Cursor<'_>, depth: usize) -> Result<JsExpr, ParseError> {
    let start = cursor.pos();

    if let Some(string) = cursor.eat_quoted_string()? {
        return Ok(JsExpr::Str {
            content_span: string.content_span,
            span: string.span,
        });
    }

    if cursor.starts_with("`") {
        return template_string(cursor, depth);
    }

    if let Some(span) = cursor.eat_number() {
        return Ok(JsExpr::Number { span });
    }

    if let Some(name) = eat_identifier(cursor) {
        let span = cursor.span_from(start);
        if KEYWORDS.contains(&name) {
            return Ok(JsExpr::Keyword {
                name: name.to_string(),
                span,
            });
        }
        return Ok(JsExpr::Identifier {
            name: name.to_string(),
            span,
        });
    }

    Err(ParseError::ExpectedExpression {
        span: Span::empty_at(start),
    })
}

/// `[a-zA-Z_$][\w$]*`
fn eat_identifier<'src>(cursor: &mut Cursor<'src>) -> Option<&'src str> {
    match cursor.peek() {
        Some(ch) if ch.is_alphabetic() || ch == '_' || ch == '$' => {}
        _ => return None,
    }
    cursor.eat_while1(|ch| is_word(ch) || ch == '$')
}

/// Parse a parenthesized, comma-separated argument list. The cursor
/// must be at `(`.
fn arguments(cursor: &mut Cursor<'_>, depth: usize) -> Result<Vec<JsExpr>, ParseError> {
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

/// Backtick template: alternating literal runs and `${ … }`
/// substitutions, each substitution reinvoking the expression parser.
fn template_string(cursor: &mut Cursor<'_>, depth: usize) -> Result<JsExpr, ParseError> {
    let start = cursor.pos();
    cursor.eat_str("`");

    let mut parts = Vec::new();
    loop {
        if cursor.eat_str("`") {
            return Ok(JsExpr::TemplateString {
                parts,
                span: cursor.span_from(start),
            });
        }
        if cursor.is_at_end() {
            return Err(ParseError::UnterminatedTemplateString {
                span: cursor.span_from(start),
            });
        }

        if cursor.starts_with("${") {
            let sub_start = cursor.pos();
            cursor.eat_str("${");
            cursor.skip_spaces();
            let expr = expression(cursor, depth + 1)?;
            cursor.skip_spaces();
            if !cursor.eat_str("}") {
                return Err(ParseError::UnterminatedSubstitution {
                    span: cursor.span_from(sub_start),
                });
            }
            parts.push(TemplatePart::Substitution {
                expr: Box::new(expr),
                span: cursor.span_from(sub_start),
            });
        } else {
            // Literal run up to the next backtick or substitution. A `$`
            // not followed by `{` is ordinary content.
            let run_start = cursor.pos();
            while !cursor.is_at_end() && !cursor.starts_with("`") && !cursor.starts_with("${") {
                cursor.bump();
            }
            parts.push(TemplatePart::Chars {
                span: cursor.span_from(run_start),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> (JsExpr, usize) {
        parse_expression(source).unwrap()
    }

    #[test]
    fn identifier_and_consumed_length() {
        let (expr, consumed) = parse("foo bar");
        assert_eq!(consumed, 3);
        assert!(matches!(expr, JsExpr::Identifier { ref name, .. } if name == "foo"));
    }

    #[test]
    fn dollar_identifiers() {
        let (expr, _) = parse("$el");
        assert!(matches!(expr, JsExpr::Identifier { ref name, .. } if name == "$el"));
    }

    #[test]
    fn keywords_are_distinct_nodes() {
        for keyword in KEYWORDS {
            let (expr, consumed) = parse(keyword);
            assert_eq!(consumed, keyword.len());
            assert!(
                matches!(expr, JsExpr::Keyword { ref name, .. } if name == keyword),
                "{keyword} should parse as a keyword"
            );
        }
    }

    #[test]
    fn keywords_take_no_trailers() {
        let (expr, consumed) = parse("new.target");
        assert!(matches!(expr, JsExpr::Keyword { ref name, .. } if name == "new"));
        assert_eq!(consumed, 3);
    }

    #[test]
    fn chain_nests_left_to_right() {
        // a.b.c(1)[2]  ⇒  Index(Call(Member(Member(a,b),c),[1]),2)
        let (expr, consumed) = parse("a.b.c(1)[2]");
        assert_eq!(consumed, 11);

        let JsExpr::Index { base, index, .. } = expr else {
            panic!("outermost should be Index");
        };
        assert!(matches!(*index, JsExpr::Number { .. }));

        let JsExpr::Call { callee, args, .. } = *base else {
            panic!("then Call");
        };
        assert_eq!(args.len(), 1);

        let JsExpr::MemberAccess { base, property, .. } = *callee else {
            panic!("then MemberAccess .c");
        };
        assert_eq!(property, "c");

        let JsExpr::MemberAccess { base, property, .. } = *base else {
            panic!("then MemberAccess .b");
        };
        assert_eq!(property, "b");
        assert!(matches!(*base, JsExpr::Identifier { ref name, .. } if name == "a"));
    }

    #[test]
    fn chain_spans_grow_outward() {
        let (expr, _) = parse("obj.field[0]");
        assert_eq!(expr.span(), Span::from_bounds(0, 12));
        let JsExpr::Index { base, .. } = expr else {
            panic!("expected Index");
        };
        assert_eq!(base.span(), Span::from_bounds(0, 9));
    }

    #[test]
    fn whitespace_around_trailers() {
        let (expr, _) = parse("a . b (1)");
        assert!(matches!(expr, JsExpr::Call { .. }));
    }

    #[test]
    fn call_argument_lists() {
        let (expr, _) = parse("f()");
        let JsExpr::Call { args, .. } = expr else {
            panic!("expected Call");
        };
        assert!(args.is_empty());

        let (expr, _) = parse("f(a, \"b\", 3)");
        let JsExpr::Call { args, .. } = expr else {
            panic!("expected Call");
        };
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn template_parts_alternate() {
        let source = "`hi ${name}!`";
        let (expr, consumed) = parse(source);
        assert_eq!(consumed, source.len());
        let JsExpr::TemplateString { parts, span } = expr else {
            panic!("expected TemplateString");
        };
        assert_eq!(span, Span::from_bounds(0, 13));
        assert_eq!(parts.len(), 3);
        assert!(matches!(&parts[0], TemplatePart::Chars { span } if span.text(source) == "hi "));
        let TemplatePart::Substitution { expr, span } = &parts[1] else {
            panic!("middle part should be a substitution");
        };
        assert_eq!(span.text(source), "${name}");
        assert!(matches!(**expr, JsExpr::Identifier { ref name, .. } if name == "name"));
        assert!(matches!(&parts[2], TemplatePart::Chars { span } if span.text(source) == "!"));
    }

    #[test]
    fn templates_nest() {
        let (expr, _) = parse("`a${`b${c}`}d`");
        let JsExpr::TemplateString { parts, .. } = expr else {
            panic!("expected TemplateString");
        };
        let TemplatePart::Substitution { expr, .. } = &parts[1] else {
            panic!("expected substitution");
        };
        assert!(matches!(**expr, JsExpr::TemplateString { .. }));
    }

    #[test]
    fn lone_dollar_is_literal_content() {
        let source = "`cost: $5`";
        let (expr, _) = parse(source);
        let JsExpr::TemplateString { parts, .. } = expr else {
            panic!("expected TemplateString");
        };
        assert_eq!(parts.len(), 1);
        assert!(
            matches!(&parts[0], TemplatePart::Chars { span } if span.text(source) == "cost: $5")
        );
    }

    #[test]
    fn substitution_may_contain_chains() {
        let (expr, _) = parse("`${user.names[0]}`");
        let JsExpr::TemplateString { parts, .. } = expr else {
            panic!("expected TemplateString");
        };
        let TemplatePart::Substitution { expr, .. } = &parts[0] else {
            panic!("expected substitution");
        };
        assert!(matches!(**expr, JsExpr::Index { .. }));
    }

    #[test]
    fn unterminated_template_is_an_error() {
        let err = parse_expression("`oops").unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedTemplateString { .. }));
    }

    #[test]
    fn unterminated_substitution_is_an_error() {
        let err = parse_expression("`${a`").unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedSubstitution { .. }));
    }

    #[test]
    fn missing_property_name_is_an_error() {
        let err = parse_expression("a.").unwrap_err();
        assert!(matches!(err, ParseError::ExpectedPropertyName { .. }));
    }

    #[test]
    fn unterminated_index_is_an_error() {
        let err = parse_expression("a[1").unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedIndex { .. }));
    }

    #[test]
    fn deep_substitution_nesting_fails_closed() {
        let source = format!("{}x{}", "`${".repeat(80), "}`".repeat(80));
        let err = parse_expression(&source).unwrap_err();
        assert!(matches!(err, ParseError::DepthExceeded { .. }));
    }

    #[test]
    fn number_literals() {
        let (expr, consumed) = parse("3.14");
        assert_eq!(consumed, 4);
        assert!(matches!(expr, JsExpr::Number { .. }));
    }
}
