use hamlet_source::Span;
use serde::Serialize;

use crate::error::ParseError;

/// Marker introducing a script line or script fragment: host-language
/// code carried opaquely by the structural layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ScriptMarker {
    /// `=`
    Equals,
    /// `!=`
    BangEquals,
    /// `~`
    Tilde,
    /// `-`
    Dash,
}

impl ScriptMarker {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ScriptMarker::Equals => "=",
            ScriptMarker::BangEquals => "!=",
            ScriptMarker::Tilde => "~",
            ScriptMarker::Dash => "-",
        }
    }
}

/// The filter keywords the language defines. One variant per keyword;
/// anything else after a line-anchored `:` is not a filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum FilterKind {
    Plain,
    Preserve,
    Redcloth,
    Textile,
    Markdown,
    Maruku,
    Escaped,
    Cdata,
    Erb,
    Ruby,
    Javascript,
    Css,
}

impl FilterKind {
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "plain" => FilterKind::Plain,
            "preserve" => FilterKind::Preserve,
            "redcloth" => FilterKind::Redcloth,
            "textile" => FilterKind::Textile,
            "markdown" => FilterKind::Markdown,
            "maruku" => FilterKind::Maruku,
            "escaped" => FilterKind::Escaped,
            "cdata" => FilterKind::Cdata,
            "erb" => FilterKind::Erb,
            "ruby" => FilterKind::Ruby,
            "javascript" => FilterKind::Javascript,
            "css" => FilterKind::Css,
            _ => return None,
        })
    }

    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            FilterKind::Plain => "plain",
            FilterKind::Preserve => "preserve",
            FilterKind::Redcloth => "redcloth",
            FilterKind::Textile => "textile",
            FilterKind::Markdown => "markdown",
            FilterKind::Maruku => "maruku",
            FilterKind::Escaped => "escaped",
            FilterKind::Cdata => "cdata",
            FilterKind::Erb => "erb",
            FilterKind::Ruby => "ruby",
            FilterKind::Javascript => "javascript",
            FilterKind::Css => "css",
        }
    }
}

/// Discriminant of a [`Node`], for consumers that dispatch on kind
/// without destructuring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    Doctype,
    Tag,
    Attributes,
    Attribute,
    ClassDecoration,
    IdDecoration,
    ScriptLine,
    Comment,
    HtmlComment,
    Filter,
    Interpolation,
    ErbInterpolation,
    Str,
    SelfClosing,
    Despacer,
    PlainChar,
    Error,
}

/// One node of the concrete syntax tree.
///
/// The variant set is closed; every node records the exact input range
/// it consumed. Child sequences are ordered by span, and a node's span
/// always contains its children's spans. Leaf variants exist precisely
/// to cover characters no structural rule claims, so a document's
/// top-level nodes tile the input exactly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Node {
    /// `!!!` plus the remainder of the line.
    Doctype { span: Span },
    /// `%name`, then any mix of one attribute list and class/id
    /// decorations, then an optional trailing script suffix. Children
    /// appear in source order.
    Tag {
        name: String,
        name_span: Span,
        children: Vec<Node>,
        span: Span,
    },
    /// Parenthesized list of attributes and embedded script fragments.
    Attributes { children: Vec<Node>, span: Span },
    /// `key=value`; the single child is the value (`Str` or `ScriptLine`).
    Attribute {
        key: String,
        key_span: Span,
        children: Vec<Node>,
        span: Span,
    },
    /// `.name`
    ClassDecoration { name: String, span: Span },
    /// `#name`
    IdDecoration { name: String, span: Span },
    /// Marker plus opaque host-language code. At the top level the code
    /// runs to end of line; inside attribute lists it is a bounded
    /// fragment.
    ScriptLine {
        marker: ScriptMarker,
        code_span: Span,
        span: Span,
    },
    /// `-#` plus the remainder of the line.
    Comment { span: Span },
    /// `/` (line-anchored) plus the remainder of the line.
    HtmlComment { span: Span },
    /// `:keyword` plus recursively collected content nodes.
    Filter {
        kind: FilterKind,
        children: Vec<Node>,
        span: Span,
    },
    /// `&=` wrapping a quoted string (the single child).
    Interpolation { children: Vec<Node>, span: Span },
    /// `<% … %>` on one line, consumed opaquely.
    ErbInterpolation { span: Span },
    /// Quoted string; `content_span` excludes the delimiters.
    Str { content_span: Span, span: Span },
    /// `/` with an optional trailing script suffix as its child.
    SelfClosing { children: Vec<Node>, span: Span },
    /// `<>`
    Despacer { span: Span },
    /// A single character claimed by no other rule.
    PlainChar { span: Span },
    /// Input consumed by a construct that failed to parse. The error is
    /// also recorded in the document's diagnostic list.
    Error { error: ParseError, span: Span },
}

const NO_CHILDREN: &[Node] = &[];

impl Node {
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Doctype { .. } => NodeKind::Doctype,
            Node::Tag { .. } => NodeKind::Tag,
            Node::Attributes { .. } => NodeKind::Attributes,
            Node::Attribute { .. } => NodeKind::Attribute,
            Node::ClassDecoration { .. } => NodeKind::ClassDecoration,
            Node::IdDecoration { .. } => NodeKind::IdDecoration,
            Node::ScriptLine { .. } => NodeKind::ScriptLine,
            Node::Comment { .. } => NodeKind::Comment,
            Node::HtmlComment { .. } => NodeKind::HtmlComment,
            Node::Filter { .. } => NodeKind::Filter,
            Node::Interpolation { .. } => NodeKind::Interpolation,
            Node::ErbInterpolation { .. } => NodeKind::ErbInterpolation,
            Node::Str { .. } => NodeKind::Str,
            Node::SelfClosing { .. } => NodeKind::SelfClosing,
            Node::Despacer { .. } => NodeKind::Despacer,
            Node::PlainChar { .. } => NodeKind::PlainChar,
            Node::Error { .. } => NodeKind::Error,
        }
    }

    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Node::Doctype { span }
            | Node::Tag { span, .. }
            | Node::Attributes { span, .. }
            | Node::Attribute { span, .. }
            | Node::ClassDecoration { span, .. }
            | Node::IdDecoration { span, .. }
            | Node::ScriptLine { span, .. }
            | Node::Comment { span }
            | Node::HtmlComment { span }
            | Node::Filter { span, .. }
            | Node::Interpolation { span, .. }
            | Node::ErbInterpolation { span }
            | Node::Str { span, .. }
            | Node::SelfClosing { span, .. }
            | Node::Despacer { span }
            | Node::PlainChar { span }
            | Node::Error { span, .. } => *span,
        }
    }

    /// Ordered children; empty for leaves.
    #[must_use]
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Tag { children, .. }
            | Node::Attributes { children, .. }
            | Node::Attribute { children, .. }
            | Node::Filter { children, .. }
            | Node::Interpolation { children, .. }
            | Node::SelfClosing { children, .. } => children,
            _ => NO_CHILDREN,
        }
    }

    /// The exact input text this node consumed.
    #[must_use]
    pub fn text<'src>(&self, source: &'src str) -> &'src str {
        self.span().text(source)
    }
}

/// Root of the tree: the ordered top-level nodes of a document.
///
/// Concatenating the children's spans in order reproduces the input
/// exactly.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Document {
    pub nodes: Vec<Node>,
    pub span: Span,
}

impl Document {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_keywords_round_trip() {
        for kind in [
            FilterKind::Plain,
            FilterKind::Preserve,
            FilterKind::Redcloth,
            FilterKind::Textile,
            FilterKind::Markdown,
            FilterKind::Maruku,
            FilterKind::Escaped,
            FilterKind::Cdata,
            FilterKind::Erb,
            FilterKind::Ruby,
            FilterKind::Javascript,
            FilterKind::Css,
        ] {
            assert_eq!(FilterKind::from_keyword(kind.keyword()), Some(kind));
        }
        assert_eq!(FilterKind::from_keyword("sass"), None);
    }

    #[test]
    fn leaves_have_no_children() {
        let leaf = Node::Despacer {
            span: Span::from_bounds(0, 2),
        };
        assert!(leaf.children().is_empty());
        assert_eq!(leaf.kind(), NodeKind::Despacer);
    }

    #[test]
    fn node_text_slices_by_span() {
        let source = "%div";
        let node = Node::Tag {
            name: "div".to_string(),
            name_span: Span::from_bounds(1, 4),
            children: Vec::new(),
            span: Span::from_bounds(0, 4),
        };
        assert_eq!(node.text(source), "%div");
    }
}
