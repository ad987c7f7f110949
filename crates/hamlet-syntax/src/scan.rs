use hamlet_source::Span;

use crate::error::ParseError;

/// A quoted string recognized by [`Cursor::eat_quoted_string`].
///
/// `span` includes the delimiters, `content_span` is the raw run of
/// characters between them. No escape processing: content is everything
/// up to the next occurrence of the opening delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct QuotedString {
    pub span: Span,
    pub content_span: Span,
}

/// Position cursor over the source text.
///
/// Tracks the offset of the current line's start explicitly so that
/// line-anchored rules can ask "is everything before me on this line
/// whitespace?" without global lookbehind. Copy so callers can
/// checkpoint and rewind by value.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cursor<'src> {
    source: &'src str,
    pos: usize,
    line_start: usize,
}

impl<'src> Cursor<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            pos: 0,
            line_start: 0,
        }
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    pub fn rest(&self) -> &'src str {
        &self.source[self.pos..]
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    /// Whether only whitespace precedes the cursor on the current line.
    pub fn at_line_anchor(&self) -> bool {
        self.source[self.line_start..self.pos]
            .chars()
            .all(char::is_whitespace)
    }

    pub fn span_from(&self, start: usize) -> Span {
        Span::from_bounds(start, self.pos)
    }

    /// Advance past one character.
    pub fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line_start = self.pos;
        }
        Some(ch)
    }

    /// Advance to `new_pos`, which must be a char boundary at or after
    /// the current position. Keeps the line-start offset in sync.
    fn advance_to(&mut self, new_pos: usize) {
        debug_assert!(new_pos >= self.pos && self.source.is_char_boundary(new_pos));
        if let Some(nl) = memchr::memrchr(b'\n', &self.source.as_bytes()[self.pos..new_pos]) {
            self.line_start = self.pos + nl + 1;
        }
        self.pos = new_pos;
    }

    /// Advance `bytes` forward; the destination must be a char boundary.
    pub fn advance_by(&mut self, bytes: usize) {
        self.advance_to(self.pos + bytes);
    }

    /// Consume `prefix` if the input starts with it.
    pub fn eat_str(&mut self, prefix: &str) -> bool {
        if self.starts_with(prefix) {
            self.advance_to(self.pos + prefix.len());
            true
        } else {
            false
        }
    }

    /// Consume the maximal run of characters matching `pred`.
    pub fn eat_while(&mut self, pred: impl Fn(char) -> bool) -> &'src str {
        let start = self.pos;
        let len = self
            .rest()
            .char_indices()
            .find(|&(_, ch)| !pred(ch))
            .map_or(self.rest().len(), |(idx, _)| idx);
        self.advance_to(start + len);
        &self.source[start..self.pos]
    }

    /// Like [`Self::eat_while`] but fails (without moving) on an empty run.
    pub fn eat_while1(&mut self, pred: impl Fn(char) -> bool) -> Option<&'src str> {
        let text = self.eat_while(pred);
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Consume up to (not including) the next newline.
    pub fn eat_line(&mut self) -> &'src str {
        let start = self.pos;
        let end = memchr::memchr(b'\n', self.rest().as_bytes())
            .map_or(self.source.len(), |idx| self.pos + idx);
        self.advance_to(end);
        &self.source[start..end]
    }

    /// Skip spaces and tabs, staying on the current line.
    pub fn skip_spaces(&mut self) {
        self.eat_while(|ch| ch == ' ' || ch == '\t');
    }

    /// Skip any whitespace, including newlines.
    pub fn skip_whitespace(&mut self) {
        self.eat_while(char::is_whitespace);
    }

    /// Consume a single- or double-quoted string at the cursor.
    ///
    /// Returns `Ok(None)` without moving when the cursor is not at a
    /// quote. An unterminated string consumes the remaining input and
    /// reports a dedicated error so the enclosing construct can decide
    /// how to degrade.
    pub fn eat_quoted_string(&mut self) -> Result<Option<QuotedString>, ParseError> {
        let quote = match self.peek() {
            Some(ch @ ('\'' | '"')) => ch,
            _ => return Ok(None),
        };
        let start = self.pos;
        self.bump();

        let content_start = self.pos;
        match memchr::memchr(quote as u8, self.rest().as_bytes()) {
            Some(idx) => {
                let content_end = self.pos + idx;
                self.advance_to(content_end + 1);
                Ok(Some(QuotedString {
                    span: self.span_from(start),
                    content_span: Span::from_bounds(content_start, content_end),
                }))
            }
            None => {
                self.advance_to(self.source.len());
                Err(ParseError::UnterminatedString {
                    span: self.span_from(start),
                })
            }
        }
    }

    /// Consume a numeric literal: digits with an optional fractional part.
    /// The dot is only consumed when a digit follows it.
    pub fn eat_number(&mut self) -> Option<Span> {
        let start = self.pos;
        self.eat_while1(|ch| ch.is_ascii_digit())?;
        let mut lookahead = *self;
        if lookahead.eat_str(".") && lookahead.eat_while1(|ch| ch.is_ascii_digit()).is_some() {
            *self = lookahead;
        }
        Some(self.span_from(start))
    }
}

/// Word characters: letters, digits, underscore (the `\w` class).
pub(crate) fn is_word(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_anchor_tracks_newlines() {
        let mut cursor = Cursor::new("ab\n  cd");
        assert!(cursor.at_line_anchor());
        cursor.bump();
        assert!(!cursor.at_line_anchor());
        cursor.bump(); // 'b'
        cursor.bump(); // newline
        assert!(cursor.at_line_anchor());
        cursor.bump(); // ' '
        cursor.bump(); // ' '
        assert!(cursor.at_line_anchor(), "whitespace prefix keeps the anchor");
        cursor.bump(); // 'c'
        assert!(!cursor.at_line_anchor());
    }

    #[test]
    fn eat_str_tracks_line_start_across_newlines() {
        let mut cursor = Cursor::new("a\nb");
        assert!(cursor.eat_str("a\nb"));
        assert!(cursor.is_at_end());
        // line_start points just past the newline, so 'b' precedes the cursor
        assert!(!cursor.at_line_anchor());
    }

    #[test]
    fn eat_line_stops_at_newline() {
        let mut cursor = Cursor::new("hello\nworld");
        assert_eq!(cursor.eat_line(), "hello");
        assert_eq!(cursor.peek(), Some('\n'));
    }

    #[test]
    fn eat_line_without_newline_consumes_all() {
        let mut cursor = Cursor::new("tail");
        assert_eq!(cursor.eat_line(), "tail");
        assert!(cursor.is_at_end());
    }

    #[test]
    fn quoted_string_spans_exclude_and_include_quotes() {
        let mut cursor = Cursor::new("\"abc\" rest");
        let qs = cursor.eat_quoted_string().unwrap().unwrap();
        assert_eq!(qs.span, Span::from_bounds(0, 5));
        assert_eq!(qs.content_span, Span::from_bounds(1, 4));
        assert_eq!(cursor.pos(), 5);
    }

    #[test]
    fn quoted_string_has_no_escapes() {
        // A backslash does not protect the closing quote.
        let mut cursor = Cursor::new(r#""a\" tail"#);
        let qs = cursor.eat_quoted_string().unwrap().unwrap();
        assert_eq!(qs.content_span.text(cursor.source()), r"a\");
    }

    #[test]
    fn quoted_string_may_span_newlines() {
        let mut cursor = Cursor::new("'a\nb'");
        let qs = cursor.eat_quoted_string().unwrap().unwrap();
        assert_eq!(qs.content_span.text(cursor.source()), "a\nb");
    }

    #[test]
    fn unterminated_string_consumes_to_end() {
        let mut cursor = Cursor::new("\"oops");
        let err = cursor.eat_quoted_string().unwrap_err();
        assert_eq!(
            err,
            ParseError::UnterminatedString {
                span: Span::from_bounds(0, 5)
            }
        );
        assert!(cursor.is_at_end());
    }

    #[test]
    fn not_a_quote_is_none() {
        let mut cursor = Cursor::new("abc");
        assert_eq!(cursor.eat_quoted_string().unwrap(), None);
        assert_eq!(cursor.pos(), 0);
    }

    #[test]
    fn numbers_with_and_without_fraction() {
        let mut cursor = Cursor::new("42.5");
        assert_eq!(cursor.eat_number(), Some(Span::from_bounds(0, 4)));

        let mut cursor = Cursor::new("42.x");
        assert_eq!(cursor.eat_number(), Some(Span::from_bounds(0, 2)));
        assert_eq!(cursor.peek(), Some('.'), "dot without digits stays");

        let mut cursor = Cursor::new("x");
        assert_eq!(cursor.eat_number(), None);
    }

    #[test]
    fn eat_while1_rejects_empty_run() {
        let mut cursor = Cursor::new("!abc");
        assert_eq!(cursor.eat_while1(is_word), None);
        assert_eq!(cursor.pos(), 0);
        cursor.bump();
        assert_eq!(cursor.eat_while1(is_word), Some("abc"));
    }
}
