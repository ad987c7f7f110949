use hamlet_source::Span;

use crate::cst::Document;
use crate::cst::FilterKind;
use crate::cst::Node;
use crate::cst::ScriptMarker;
use crate::error::ParseError;
use crate::scan::is_word;
use crate::scan::Cursor;

/// The structural parser: one pass over the input, producing the
/// document's ordered top-level nodes plus every diagnostic raised
/// along the way.
///
/// The dispatcher tries the line-anchored rules first (doctype,
/// comment, html-comment, filter), then the position-free ones, and
/// falls back to consuming a single character. Each successful rule
/// consumes exactly the range its node spans, so the top-level nodes
/// tile the input and the tree round-trips byte for byte.
pub struct Parser<'src> {
    cursor: Cursor<'src>,
    errors: Vec<ParseError>,
}

impl<'src> Parser<'src> {
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            errors: Vec::new(),
        }
    }

    pub fn parse(mut self) -> (Document, Vec<ParseError>) {
        let mut nodes = Vec::new();
        while !self.cursor.is_at_end() {
            let before = self.cursor.pos();
            let node = self.next_node();
            debug_assert!(self.cursor.pos() > before, "dispatcher must make progress");
            nodes.push(node);
        }
        let span = Span::from_bounds(0, self.cursor.source().len());
        (Document { nodes, span }, self.errors)
    }

    /// Select and run exactly one node rule at the current position.
    /// First match wins; the order is fixed and the constructs are
    /// mutually exclusive by their first characters.
    fn next_node(&mut self) -> Node {
        if self.cursor.at_line_anchor() {
            if self.cursor.starts_with("!!!") {
                return self.doctype();
            }
            if self.cursor.starts_with("-#") {
                return self.comment();
            }
            if self.cursor.starts_with("/") {
                return self.html_comment();
            }
            if self.cursor.starts_with(":") {
                if let Some(node) = self.try_filter() {
                    return node;
                }
            }
        }

        if self.cursor.starts_with("%") {
            return self.tag_or_error();
        }
        if self.cursor.starts_with("/") {
            return self.self_closing();
        }
        if self.cursor.starts_with("<>") {
            return self.despacer();
        }
        if let Some(node) = self.try_script_line() {
            return node;
        }
        if self.cursor.starts_with("&=") {
            return self.interpolation();
        }
        if self.cursor.starts_with("<%") {
            return self.erb_interpolation();
        }
        if self.cursor.starts_with("$") {
            return self.error_marker();
        }

        // The `\` escape and the final fallback both consume exactly one
        // character, so a malformed line never blocks the rest of the
        // document.
        self.plain_char()
    }

    fn doctype(&mut self) -> Node {
        let start = self.cursor.pos();
        self.cursor.eat_str("!!!");
        self.cursor.eat_line();
        Node::Doctype {
            span: self.cursor.span_from(start),
        }
    }

    fn comment(&mut self) -> Node {
        let start = self.cursor.pos();
        self.cursor.eat_str("-#");
        self.cursor.eat_line();
        Node::Comment {
            span: self.cursor.span_from(start),
        }
    }

    fn html_comment(&mut self) -> Node {
        let start = self.cursor.pos();
        self.cursor.eat_str("/");
        self.cursor.eat_line();
        Node::HtmlComment {
            span: self.cursor.span_from(start),
        }
    }

    fn despacer(&mut self) -> Node {
        let start = self.cursor.pos();
        self.cursor.eat_str("<>");
        Node::Despacer {
            span: self.cursor.span_from(start),
        }
    }

    fn error_marker(&mut self) -> Node {
        let start = self.cursor.pos();
        self.cursor.eat_str("$");
        let span = self.cursor.span_from(start);
        self.emit_error(ParseError::ErrorMarker { span }, start)
    }

    fn plain_char(&mut self) -> Node {
        let start = self.cursor.pos();
        self.cursor.bump();
        Node::PlainChar {
            span: self.cursor.span_from(start),
        }
    }

    /// Record a diagnostic and produce an `Error` node covering
    /// everything consumed since `start`.
    fn emit_error(&mut self, error: ParseError, start: usize) -> Node {
        self.errors.push(error.clone());
        Node::Error {
            error,
            span: self.cursor.span_from(start),
        }
    }

    // ---- tags ----------------------------------------------------------

    fn tag_or_error(&mut self) -> Node {
        let start = self.cursor.pos();
        if let Some(node) = self.try_tag() {
            return node;
        }
        self.cursor.eat_str("%");
        let span = self.cursor.span_from(start);
        self.emit_error(ParseError::MissingTagName { span }, start)
    }

    /// `%name`, then any interleaving of one attribute list and class/id
    /// decorations, then an optional script suffix on the same line.
    /// Rewinds and yields `None` when no tag name follows the `%`.
    fn try_tag(&mut self) -> Option<Node> {
        let checkpoint = self.cursor;
        let start = self.cursor.pos();
        self.cursor.eat_str("%");

        let name_start = self.cursor.pos();
        let Some(name) = self.cursor.eat_while1(|ch| is_word(ch) || ch == ':') else {
            self.cursor = checkpoint;
            return None;
        };
        let name = name.to_string();
        let name_span = self.cursor.span_from(name_start);

        let mut children = Vec::new();
        let mut has_attributes = false;
        loop {
            if !has_attributes && self.cursor.starts_with("(") {
                has_attributes = true;
                let attrs_start = self.cursor.pos();
                match self.attributes() {
                    Ok(node) => children.push(node),
                    Err(error) => {
                        let node = self.emit_error(error, attrs_start);
                        children.push(node);
                    }
                }
            } else if let Some(node) = self.try_decoration() {
                children.push(node);
            } else {
                break;
            }
        }

        if let Some(script) = self.try_script_line() {
            children.push(script);
        }

        Some(Node::Tag {
            name,
            name_span,
            children,
            span: self.cursor.span_from(start),
        })
    }

    fn try_decoration(&mut self) -> Option<Node> {
        let checkpoint = self.cursor;
        let start = self.cursor.pos();

        if self.cursor.eat_str(".") {
            if let Some(name) = self.cursor.eat_while1(|ch| is_word(ch) || ch == '-' || ch == ':')
            {
                return Some(Node::ClassDecoration {
                    name: name.to_string(),
                    span: self.cursor.span_from(start),
                });
            }
            self.cursor = checkpoint;
            return None;
        }

        if self.cursor.eat_str("#") {
            if let Some(name) = self.cursor.eat_while1(|ch| is_word(ch) || ch == '-') {
                return Some(Node::IdDecoration {
                    name: name.to_string(),
                    span: self.cursor.span_from(start),
                });
            }
            self.cursor = checkpoint;
        }

        None
    }

    // ---- attributes ----------------------------------------------------

    /// Parenthesized, whitespace-separated attributes and embedded
    /// script fragments. A missing close paren, a malformed pair, or an
    /// unterminated string aborts the whole list; the caller degrades
    /// the consumed prefix to an `Error` node rather than silently
    /// closing the list.
    fn attributes(&mut self) -> Result<Node, ParseError> {
        let start = self.cursor.pos();
        self.cursor.eat_str("(");

        let mut children = Vec::new();
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.eat_str(")") {
                return Ok(Node::Attributes {
                    children,
                    span: self.cursor.span_from(start),
                });
            }
            if self.cursor.is_at_end() {
                return Err(ParseError::UnterminatedAttributes {
                    span: self.cursor.span_from(start),
                });
            }
            if let Some(node) = self.try_script_fragment() {
                children.push(node);
                continue;
            }
            children.push(self.attribute()?);
        }
    }

    fn attribute(&mut self) -> Result<Node, ParseError> {
        let start = self.cursor.pos();
        let Some(key) = self.cursor.eat_while1(|ch| is_word(ch) || ch == '-') else {
            return Err(ParseError::MalformedAttribute {
                span: Span::empty_at(start),
            });
        };
        let key = key.to_string();
        let key_span = self.cursor.span_from(start);

        if !self.cursor.eat_str("=") {
            return Err(ParseError::MalformedAttribute {
                span: self.cursor.span_from(start),
            });
        }

        let value = if let Some(node) = self.try_script_fragment() {
            node
        } else {
            match self.cursor.eat_quoted_string()? {
                Some(string) => Node::Str {
                    content_span: string.content_span,
                    span: string.span,
                },
                None => {
                    return Err(ParseError::MalformedAttribute {
                        span: self.cursor.span_from(start),
                    })
                }
            }
        };

        Ok(Node::Attribute {
            key,
            key_span,
            children: vec![value],
            span: self.cursor.span_from(start),
        })
    }

    /// A script fragment inside an attribute list: marker plus a run
    /// bounded by whitespace or the closing paren, so the fragment
    /// cannot swallow the rest of the list.
    fn try_script_fragment(&mut self) -> Option<Node> {
        let checkpoint = self.cursor;
        let start = self.cursor.pos();
        let marker = self.try_script_marker()?;

        let code_start = self.cursor.pos();
        let code = self
            .cursor
            .eat_while(|ch| !ch.is_whitespace() && ch != ')');
        if code.is_empty() {
            self.cursor = checkpoint;
            return None;
        }

        Some(Node::ScriptLine {
            marker,
            code_span: Span::from_bounds(code_start, self.cursor.pos()),
            span: self.cursor.span_from(start),
        })
    }

    // ---- script lines --------------------------------------------------

    fn try_script_marker(&mut self) -> Option<ScriptMarker> {
        // `!=` before `=`; a bare `!` is not a marker.
        for (text, marker) in [
            ("!=", ScriptMarker::BangEquals),
            ("=", ScriptMarker::Equals),
            ("~", ScriptMarker::Tilde),
            ("-", ScriptMarker::Dash),
        ] {
            if self.cursor.eat_str(text) {
                return Some(marker);
            }
        }
        None
    }

    /// Marker plus a non-empty remainder of the line, carried opaquely.
    fn try_script_line(&mut self) -> Option<Node> {
        let checkpoint = self.cursor;
        let start = self.cursor.pos();
        let marker = self.try_script_marker()?;

        let code_start = self.cursor.pos();
        let code = self.cursor.eat_line();
        if code.is_empty() {
            self.cursor = checkpoint;
            return None;
        }

        Some(Node::ScriptLine {
            marker,
            code_span: Span::from_bounds(code_start, self.cursor.pos()),
            span: self.cursor.span_from(start),
        })
    }

    // ---- interpolations ------------------------------------------------

    fn interpolation(&mut self) -> Node {
        let start = self.cursor.pos();
        match self.interpolation_inner() {
            Ok(node) => node,
            Err(error) => self.emit_error(error, start),
        }
    }

    fn interpolation_inner(&mut self) -> Result<Node, ParseError> {
        let start = self.cursor.pos();
        self.cursor.eat_str("&=");
        self.cursor.skip_spaces();

        match self.cursor.eat_quoted_string()? {
            Some(string) => Ok(Node::Interpolation {
                children: vec![Node::Str {
                    content_span: string.content_span,
                    span: string.span,
                }],
                span: self.cursor.span_from(start),
            }),
            None => Err(ParseError::ExpectedString {
                span: self.cursor.span_from(start),
            }),
        }
    }

    fn erb_interpolation(&mut self) -> Node {
        let start = self.cursor.pos();
        match self.erb_interpolation_inner() {
            Ok(node) => node,
            Err(error) => self.emit_error(error, start),
        }
    }

    /// `<%`, optional `=` and `-`, then opaque content up to the first
    /// `%>` on the same line.
    fn erb_interpolation_inner(&mut self) -> Result<Node, ParseError> {
        let start = self.cursor.pos();
        self.cursor.eat_str("<%");
        self.cursor.eat_str("=");
        self.cursor.eat_str("-");

        let rest = self.cursor.rest();
        let line = &rest[..memchr::memchr(b'\n', rest.as_bytes()).unwrap_or(rest.len())];
        match line.find("%>") {
            Some(idx) => {
                self.cursor.advance_by(idx + 2);
                Ok(Node::ErbInterpolation {
                    span: self.cursor.span_from(start),
                })
            }
            None => {
                self.cursor.eat_line();
                Err(ParseError::UnterminatedErb {
                    span: self.cursor.span_from(start),
                })
            }
        }
    }

    // ---- filters -------------------------------------------------------

    /// `:keyword` for a known filter keyword, then recursively collected
    /// content. Rewinds when the keyword is unknown so the `:` falls
    /// through to the plain-character fallback.
    fn try_filter(&mut self) -> Option<Node> {
        let checkpoint = self.cursor;
        let start = self.cursor.pos();
        self.cursor.eat_str(":");

        let kind = self
            .cursor
            .eat_while1(is_word)
            .and_then(FilterKind::from_keyword);
        let Some(kind) = kind else {
            self.cursor = checkpoint;
            return None;
        };

        let mut children = Vec::new();
        self.collect_filter_content(&mut children);

        Some(Node::Filter {
            kind,
            children,
            span: self.cursor.span_from(start),
        })
    }

    /// Repeatedly try the filter-content capability set, skipping
    /// whitespace between items into the filter's span. Stops — with
    /// any skipped whitespace rewound — as soon as nothing matches,
    /// leaving the position for the outer dispatcher.
    ///
    /// Content is reparsed as structure, not preserved as opaque text:
    /// a `%p` line inside `:plain` becomes a tag node.
    fn collect_filter_content(&mut self, children: &mut Vec<Node>) {
        loop {
            let checkpoint = self.cursor;
            self.cursor.skip_whitespace();
            match self.try_filter_item() {
                Some(node) => children.push(node),
                None => {
                    self.cursor = checkpoint;
                    return;
                }
            }
        }
    }

    fn try_filter_item(&mut self) -> Option<Node> {
        if self.cursor.at_line_anchor() && self.cursor.starts_with("/") {
            return Some(self.html_comment());
        }
        if self.cursor.starts_with("&=") {
            return self.try_interpolation();
        }
        if self.cursor.starts_with("<%") {
            return self.try_erb_interpolation();
        }
        if let Some(node) = self.try_script_line() {
            return Some(node);
        }
        if self.cursor.starts_with("%") {
            return self.try_tag();
        }
        None
    }

    fn try_interpolation(&mut self) -> Option<Node> {
        let checkpoint = self.cursor;
        match self.interpolation_inner() {
            Ok(node) => Some(node),
            Err(_) => {
                self.cursor = checkpoint;
                None
            }
        }
    }

    fn try_erb_interpolation(&mut self) -> Option<Node> {
        let checkpoint = self.cursor;
        match self.erb_interpolation_inner() {
            Ok(node) => Some(node),
            Err(_) => {
                self.cursor = checkpoint;
                None
            }
        }
    }

    fn self_closing(&mut self) -> Node {
        let start = self.cursor.pos();
        self.cursor.eat_str("/");
        let mut children = Vec::new();
        if let Some(script) = self.try_script_line() {
            children.push(script);
        }
        Node::SelfClosing {
            children,
            span: self.cursor.span_from(start),
        }
    }
}
