use annotate_snippets::AnnotationKind;
use annotate_snippets::Level;
use annotate_snippets::Renderer;
use annotate_snippets::Snippet;

use crate::Span;

/// Severity of a rendered diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// One parse diagnostic bound to the document it came from: a stable
/// code, a message, and the span to underline.
///
/// Parser error types convert themselves into this; the renderer never
/// sees parser internals.
#[derive(Debug)]
pub struct Diagnostic<'src> {
    pub source: &'src str,
    pub path: &'src str,
    pub code: &'static str,
    pub message: String,
    pub severity: Severity,
    pub span: Span,
}

impl<'src> Diagnostic<'src> {
    #[must_use]
    pub fn new(
        source: &'src str,
        path: &'src str,
        code: &'static str,
        message: String,
        severity: Severity,
        span: Span,
    ) -> Self {
        Self {
            source,
            path,
            code,
            message,
            severity,
            span,
        }
    }
}

/// Renders diagnostics as formatted text via `annotate-snippets`.
///
/// Plain mode emits no ANSI escapes (tests, piped output); styled mode
/// colors for terminal display.
#[derive(Debug)]
pub struct DiagnosticRenderer {
    renderer: Renderer,
}

impl DiagnosticRenderer {
    #[must_use]
    pub fn plain() -> Self {
        Self {
            renderer: Renderer::plain(),
        }
    }

    #[must_use]
    pub fn styled() -> Self {
        Self {
            renderer: Renderer::styled(),
        }
    }

    /// Render one diagnostic to a string, underlining its span.
    #[must_use]
    pub fn render(&self, diagnostic: &Diagnostic<'_>) -> String {
        let level = match diagnostic.severity {
            Severity::Error => Level::ERROR,
            Severity::Warning => Level::WARNING,
        };

        let underline = diagnostic.span.start_usize()..diagnostic.span.end_usize();
        let snippet = Snippet::source(diagnostic.source)
            .path(diagnostic.path)
            .line_start(1)
            .annotation(AnnotationKind::Primary.span(underline));

        let report = &[level
            .primary_title(diagnostic.message.as_str())
            .id(diagnostic.code)
            .element(snippet)];
        self.renderer.render(report).clone()
    }
}
