//! Source-text primitives shared by every tool that consumes a parse:
//! byte spans, line/column conversion, and diagnostic rendering.

mod position;
mod render;
mod span;

pub use position::LineCol;
pub use position::LineIndex;
pub use render::Diagnostic;
pub use render::DiagnosticRenderer;
pub use render::Severity;
pub use span::Span;
