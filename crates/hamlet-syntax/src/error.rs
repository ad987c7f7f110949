use hamlet_source::Diagnostic;
use hamlet_source::Severity;
use hamlet_source::Span;
use serde::Serialize;
use thiserror::Error;

/// Everything that can go wrong while parsing.
///
/// Every variant carries the span of the offending input so tooling can
/// underline the exact location. Errors never abort the whole document
/// parse; they surface both in the returned diagnostic list and as
/// `Node::Error` leaves covering the consumed input.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize)]
pub enum ParseError {
    #[error("unterminated string literal")]
    UnterminatedString { span: Span },

    #[error("unterminated attribute list")]
    UnterminatedAttributes { span: Span },

    #[error("malformed attribute")]
    MalformedAttribute { span: Span },

    #[error("expected a string after '&='")]
    ExpectedString { span: Span },

    #[error("'<%' interpolation is not closed before end of line")]
    UnterminatedErb { span: Span },

    #[error("'%' is not followed by a tag name")]
    MissingTagName { span: Span },

    #[error("explicit error marker")]
    ErrorMarker { span: Span },

    #[error("expected an html tag")]
    ExpectedHtmlTag { span: Span },

    #[error("html tag is not closed by '>'")]
    UnterminatedHtmlTag { span: Span },

    #[error("expected an expression")]
    ExpectedExpression { span: Span },

    #[error("expected a property name after '.'")]
    ExpectedPropertyName { span: Span },

    #[error("unterminated argument list")]
    UnterminatedArguments { span: Span },

    #[error("unterminated index expression")]
    UnterminatedIndex { span: Span },

    #[error("unterminated template string")]
    UnterminatedTemplateString { span: Span },

    #[error("template substitution is missing its closing '}}'")]
    UnterminatedSubstitution { span: Span },

    #[error("expression nesting exceeds the depth limit")]
    DepthExceeded { span: Span },
}

impl ParseError {
    /// The span of the offending input.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnterminatedString { span }
            | ParseError::UnterminatedAttributes { span }
            | ParseError::MalformedAttribute { span }
            | ParseError::ExpectedString { span }
            | ParseError::UnterminatedErb { span }
            | ParseError::MissingTagName { span }
            | ParseError::ErrorMarker { span }
            | ParseError::ExpectedHtmlTag { span }
            | ParseError::UnterminatedHtmlTag { span }
            | ParseError::ExpectedExpression { span }
            | ParseError::ExpectedPropertyName { span }
            | ParseError::UnterminatedArguments { span }
            | ParseError::UnterminatedIndex { span }
            | ParseError::UnterminatedTemplateString { span }
            | ParseError::UnterminatedSubstitution { span }
            | ParseError::DepthExceeded { span } => *span,
        }
    }

    /// Stable diagnostic code: `H1xx` for structural errors, `H2xx` for
    /// expression errors.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            ParseError::UnterminatedString { .. } => "H100",
            ParseError::UnterminatedAttributes { .. } => "H101",
            ParseError::MalformedAttribute { .. } => "H102",
            ParseError::ExpectedString { .. } => "H103",
            ParseError::UnterminatedErb { .. } => "H104",
            ParseError::MissingTagName { .. } => "H105",
            ParseError::ErrorMarker { .. } => "H106",
            ParseError::ExpectedHtmlTag { .. } => "H107",
            ParseError::UnterminatedHtmlTag { .. } => "H108",
            ParseError::ExpectedExpression { .. } => "H200",
            ParseError::ExpectedPropertyName { .. } => "H201",
            ParseError::UnterminatedArguments { .. } => "H202",
            ParseError::UnterminatedIndex { .. } => "H203",
            ParseError::UnterminatedTemplateString { .. } => "H204",
            ParseError::UnterminatedSubstitution { .. } => "H205",
            ParseError::DepthExceeded { .. } => "H206",
        }
    }

    /// Bind this error to the document it came from, ready for a
    /// [`hamlet_source::DiagnosticRenderer`].
    #[must_use]
    pub fn to_diagnostic<'src>(&self, source: &'src str, path: &'src str) -> Diagnostic<'src> {
        Diagnostic::new(
            source,
            path,
            self.code(),
            self.to_string(),
            Severity::Error,
            self.span(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_accessor_matches_payload() {
        let span = Span::from_bounds(4, 9);
        let err = ParseError::UnterminatedString { span };
        assert_eq!(err.span(), span);
    }

    #[test]
    fn codes_are_grouped_by_family() {
        let span = Span::empty_at(0);
        assert!(ParseError::MissingTagName { span }.code().starts_with("H1"));
        assert!(ParseError::DepthExceeded { span }.code().starts_with("H2"));
    }

    #[test]
    fn messages_are_short_and_lowercase() {
        let span = Span::empty_at(0);
        let msg = ParseError::UnterminatedAttributes { span }.to_string();
        assert_eq!(msg, "unterminated attribute list");
    }

    #[test]
    fn diagnostics_carry_code_message_and_span() {
        let source = "%div(title=\"oops";
        let err = ParseError::UnterminatedString {
            span: Span::from_bounds(11, 16),
        };
        let diag = err.to_diagnostic(source, "views/card.haml");
        assert_eq!(diag.code, "H100");
        assert_eq!(diag.message, "unterminated string literal");
        assert_eq!(diag.span, err.span());
        assert_eq!(diag.severity, Severity::Error);
    }
}
