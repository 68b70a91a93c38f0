/// A cursor over source text that tracks position.
///
/// Characters are read with peek/advance; byte offset, line and column
/// follow along so tokens can carry exact spans.
pub struct Cursor<'src> {
    /// Whole input, kept for slicing out lexemes.
    source: &'src str,
    /// Remaining source text (slice starting at current position).
    rest: &'src str,
    /// Byte offset of `rest` within `source`.
    offset: u32,
    /// Current line number (1-indexed).
    line: u32,
    /// Current column number (1-indexed, byte-based).
    column: u32,
}

impl<'src> Cursor<'src> {
    /// Start at the first byte of `source`, on line 1 column 1.
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            rest: source,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// Byte offset of the next unread character.
    #[inline]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    #[inline]
    pub fn line(&self) -> u32 {
        self.line
    }

    #[inline]
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Whether all input has been consumed.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.rest.is_empty()
    }

    /// Peek at the current character without consuming it.
    ///
    /// ASCII is read straight from the byte; anything else decodes the
    /// full UTF-8 sequence.
    #[inline]
    pub fn peek(&self) -> Option<char> {
        let first = *self.rest.as_bytes().first()?;
        if first < 128 {
            Some(first as char)
        } else {
            self.rest.chars().next()
        }
    }

    /// Peek at the nth character ahead (0 = current).
    #[inline]
    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest.chars().nth(n)
    }

    /// Whether the current character satisfies `f`. False at end of input.
    #[inline]
    pub fn check(&self, f: impl Fn(char) -> bool) -> bool {
        self.peek().is_some_and(f)
    }

    /// Whether the unread input starts with `s`.
    #[inline]
    pub fn check_str(&self, s: &str) -> bool {
        self.rest.starts_with(s)
    }

    /// Consume the current character and advance.
    ///
    /// Returns `None` at end of input. A newline moves to column 1 of the
    /// next line; any other character advances the column by its UTF-8
    /// length.
    #[inline]
    pub fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        let len = ch.len_utf8();
        self.rest = &self.rest[len..];
        self.offset += len as u32;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += len as u32;
        }
        Some(ch)
    }

    /// Consume if the current character matches.
    #[inline]
    pub fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume characters while the predicate matches; returns the consumed slice.
    pub fn eat_while(&mut self, f: impl Fn(char) -> bool) -> &'src str {
        let start = self.offset as usize;
        while self.check(&f) {
            self.advance();
        }
        &self.source[start..self.offset as usize]
    }

    /// Slice of source from a starting offset to the current position.
    #[inline]
    pub fn slice_from(&self, start: u32) -> &'src str {
        &self.source[start as usize..self.offset as usize]
    }
}

/// Check if a character can start an identifier.
#[inline]
pub fn is_ident_start(c: char, unicode: bool) -> bool {
    c.is_ascii_alphabetic() || c == '_' || (unicode && c.is_alphabetic())
}

/// Check if a character can continue an identifier.
#[inline]
pub fn is_ident_continue(c: char, unicode: bool) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || (unicode && c.is_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_basics() {
        let mut cursor = Cursor::new("hello");
        assert_eq!(cursor.peek(), Some('h'));
        assert_eq!(cursor.advance(), Some('h'));
        assert_eq!(cursor.peek(), Some('e'));
        assert_eq!(cursor.offset(), 1);
    }

    #[test]
    fn cursor_tracks_lines() {
        let mut cursor = Cursor::new("a\nbc");
        cursor.advance();
        cursor.advance();
        assert_eq!((cursor.line(), cursor.column()), (2, 1));
        cursor.advance();
        assert_eq!((cursor.line(), cursor.column()), (2, 2));
    }

    #[test]
    fn cursor_multibyte() {
        let mut cursor = Cursor::new("é1");
        assert_eq!(cursor.advance(), Some('é'));
        assert_eq!(cursor.offset(), 2);
        assert_eq!(cursor.column(), 3);
    }

    #[test]
    fn eat_while_returns_slice() {
        let mut cursor = Cursor::new("abc123 rest");
        let word = cursor.eat_while(|c| is_ident_continue(c, false));
        assert_eq!(word, "abc123");
        assert_eq!(cursor.slice_from(0), "abc123");
        assert!(!cursor.is_eof());
    }

    #[test]
    fn checks_are_false_at_end_of_input() {
        let mut cursor = Cursor::new("=>");
        assert!(cursor.check_str("=>"));
        assert!(cursor.eat('='));
        assert!(cursor.check(|c| c == '>'));
        cursor.advance();
        assert!(cursor.is_eof());
        assert!(!cursor.check(|_| true));
        assert_eq!(cursor.advance(), None);
        assert_eq!(cursor.offset(), 2);
    }

    #[test]
    fn unicode_identifiers_are_opt_in() {
        assert!(!is_ident_start('ü', false));
        assert!(is_ident_start('ü', true));
    }
}
