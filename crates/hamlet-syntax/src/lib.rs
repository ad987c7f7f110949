//! Lossless parser for HAML-style templates.
//!
//! The parser builds a concrete syntax tree in which every node records
//! the exact byte range it consumed, so the tree can reconstruct the
//! input verbatim and tooling can map any node back to its source. It
//! never rejects a document: input no rule claims becomes one-character
//! plain nodes, and constructs that fail mid-way degrade to [`cst::Node::Error`]
//! leaves while the rest of the document keeps parsing.
//!
//! Structure and code are split deliberately. The structural layer
//! ([`parse`]) recognizes tags, attributes, filters, and comments, and
//! carries embedded host-language code as opaque spans. The [`ruby`] and
//! [`js`] modules parse those spans on demand into shallow expression
//! trees, and [`html`] does the same for inline HTML tags (whose `on*`
//! event handlers embed JavaScript).
//!
//! ```
//! let source = "%div.card(title=\"hi\")";
//! let (document, errors) = hamlet_syntax::parse(source);
//! assert!(errors.is_empty());
//! assert_eq!(document.nodes[0].text(source), source);
//! ```

mod cst;
mod error;
pub mod html;
pub mod js;
mod parser;
pub mod ruby;
mod scan;

pub use cst::Document;
pub use cst::FilterKind;
pub use cst::Node;
pub use cst::NodeKind;
pub use cst::ScriptMarker;
pub use error::ParseError;
pub use parser::Parser;

/// Recursion ceiling for the expression sub-parsers. Nesting beyond
/// this yields [`ParseError::DepthExceeded`] instead of unbounded stack
/// growth.
pub const MAX_EXPRESSION_DEPTH: usize = 64;

/// Parse a template into its syntax tree plus every diagnostic raised.
///
/// Always returns a tree; errors degrade locally to `Error` nodes.
#[must_use]
pub fn parse(source: &str) -> (Document, Vec<ParseError>) {
    Parser::new(source).parse()
}
