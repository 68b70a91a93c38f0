//! Main lexer implementation.
//!
//! The [`Lexer`] converts source text into [`Token`]s, dispatching on the
//! first character of each token. Errors are recorded and surface as
//! [`TokenKind::Error`] tokens so scanning always reaches the end of input.

use strata_core::{Diagnostic, LexError, Level, LogSink, Span};

use super::config::LanguageConfig;
use super::cursor::{Cursor, is_ident_continue, is_ident_start};
use super::token::{Token, TokenKind, lookup_keyword};

pub struct Lexer<'src, 'cfg> {
    cursor: Cursor<'src>,
    config: &'cfg LanguageConfig,
    errors: Vec<LexError>,
}

impl<'src, 'cfg> Lexer<'src, 'cfg> {
    pub fn new(source: &'src str, config: &'cfg LanguageConfig) -> Self {
        Self {
            cursor: Cursor::new(source),
            config,
            errors: Vec::new(),
        }
    }

    /// Tokenize a whole source, logging every lexical error to `log`.
    ///
    /// The result never contains error tokens and always ends with
    /// [`TokenKind::Eof`].
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn tokenize(source: &str, config: &LanguageConfig, log: &dyn LogSink) -> Vec<Token> {
        let mut lexer = Lexer::new(source, config);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            match token.kind {
                TokenKind::Error => continue,
                TokenKind::Eof => {
                    tokens.push(token);
                    break;
                }
                _ => tokens.push(token),
            }
        }
        for error in lexer.take_errors() {
            log.log(Diagnostic::new(Level::Error, error.to_string()).at(error.span()));
        }
        tokens
    }

    /// Take accumulated errors, leaving an empty vec.
    pub fn take_errors(&mut self) -> Vec<LexError> {
        std::mem::take(&mut self.errors)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_trivia();

        if self.cursor.is_eof() {
            return Token::new(
                TokenKind::Eof,
                "",
                Span::point(self.cursor.line(), self.cursor.column()),
            );
        }

        let start = Start {
            line: self.cursor.line(),
            col: self.cursor.column(),
            offset: self.cursor.offset(),
        };
        let unicode = self.config.allow_unicode_identifiers;

        match self.cursor.peek() {
            Some('"') => self.scan_string(start),
            Some(c) if c.is_ascii_digit() => self.scan_number(start),
            Some(c) if is_ident_start(c, unicode) => self.scan_identifier(start),
            _ => self.scan_operator(start),
        }
    }

    // =========================================
    // Internal: helpers
    // =========================================

    /// Skip whitespace and comments. Unterminated block comments are recorded.
    fn skip_trivia(&mut self) {
        loop {
            self.cursor.eat_while(|c| c.is_whitespace());
            if self.cursor.check_str("//") {
                self.cursor.eat_while(|c| c != '\n');
            } else if self.cursor.check_str("/*") {
                let span = Span::point(self.cursor.line(), self.cursor.column());
                self.cursor.advance();
                self.cursor.advance();
                loop {
                    if self.cursor.is_eof() {
                        self.errors.push(LexError::UnterminatedComment { span });
                        return;
                    }
                    if self.cursor.check_str("*/") {
                        self.cursor.advance();
                        self.cursor.advance();
                        break;
                    }
                    self.cursor.advance();
                }
            } else {
                return;
            }
        }
    }

    fn span_from(&self, start: Start) -> Span {
        Span::new(start.line, start.col, self.cursor.offset() - start.offset)
    }

    fn make_token(&self, kind: TokenKind, start: Start) -> Token {
        Token::new(
            kind,
            self.cursor.slice_from(start.offset),
            self.span_from(start),
        )
    }

    fn make_error(&mut self, error: LexError) -> Token {
        let span = error.span();
        self.errors.push(error);
        Token::new(TokenKind::Error, "", span)
    }

    // =========================================
    // Scanning
    // =========================================

    fn scan_string(&mut self, start: Start) -> Token {
        self.cursor.advance(); // opening quote
        loop {
            match self.cursor.peek() {
                None | Some('\n') => {
                    let span = self.span_from(start);
                    return self.make_error(LexError::UnterminatedString { span });
                }
                Some('\\') => {
                    self.cursor.advance();
                    self.cursor.advance();
                }
                Some('"') => {
                    self.cursor.advance();
                    return self.make_token(TokenKind::StringLiteral, start);
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    fn scan_number(&mut self, start: Start) -> Token {
        self.cursor.eat_while(|c| c.is_ascii_digit() || c == '_');
        let mut is_float = false;

        if self.cursor.peek() == Some('.') && self.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) {
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_digit() || c == '_');
            is_float = true;
        }

        if let Some('e' | 'E') = self.cursor.peek() {
            self.cursor.advance();
            if matches!(self.cursor.peek(), Some('+' | '-')) {
                self.cursor.advance();
            }
            let digits = self.cursor.eat_while(|c| c.is_ascii_digit());
            if digits.is_empty() {
                let span = self.span_from(start);
                return self.make_error(LexError::InvalidNumber {
                    span,
                    detail: "missing exponent digits".into(),
                });
            }
            is_float = true;
        }

        if self.cursor.check_str("i64") {
            if is_float {
                self.cursor.eat_while(|c| c.is_ascii_alphanumeric());
                let span = self.span_from(start);
                return self.make_error(LexError::InvalidNumber {
                    span,
                    detail: "`i64` suffix on a float".into(),
                });
            }
            self.cursor.advance();
            self.cursor.advance();
            self.cursor.advance();
            return self.make_token(TokenKind::Int64Literal, start);
        }

        if self.cursor.check(|c| is_ident_continue(c, self.config.allow_unicode_identifiers)) {
            self.cursor.eat_while(|c| c.is_alphanumeric() || c == '_');
            let span = self.span_from(start);
            return self.make_error(LexError::InvalidNumber {
                span,
                detail: "unknown literal suffix".into(),
            });
        }

        let kind = if is_float {
            TokenKind::FloatLiteral
        } else {
            TokenKind::IntLiteral
        };
        self.make_token(kind, start)
    }

    fn scan_identifier(&mut self, start: Start) -> Token {
        let unicode = self.config.allow_unicode_identifiers;
        let lexeme = self.cursor.eat_while(|c| is_ident_continue(c, unicode));
        if lexeme.len() > self.config.max_identifier_len {
            let span = self.span_from(start);
            return self.make_error(LexError::IdentifierTooLong {
                max: self.config.max_identifier_len,
                span,
            });
        }
        let kind = lookup_keyword(lexeme).unwrap_or(TokenKind::Identifier);
        self.make_token(kind, start)
    }

    fn scan_operator(&mut self, start: Start) -> Token {
        let Some(c) = self.cursor.advance() else {
            return self.make_token(TokenKind::Eof, start);
        };
        let next = self.cursor.peek();

        let kind = match (c, next) {
            ('(', _) => TokenKind::LeftParen,
            (')', _) => TokenKind::RightParen,
            ('{', _) => TokenKind::LeftBrace,
            ('}', _) => TokenKind::RightBrace,
            (',', _) => TokenKind::Comma,
            (';', _) => TokenKind::Semicolon,
            ('+', _) => TokenKind::Plus,
            ('*', _) => TokenKind::Star,
            ('/', _) => TokenKind::Slash,
            ('%', _) => TokenKind::Percent,

            (':', Some('=')) => { self.cursor.advance(); TokenKind::ColonEqual }
            (':', _) => TokenKind::Colon,

            ('-', Some('>')) => { self.cursor.advance(); TokenKind::Arrow }
            ('-', _) => TokenKind::Minus,

            ('=', Some('=')) => { self.cursor.advance(); TokenKind::EqualEqual }
            ('=', Some('>')) => { self.cursor.advance(); TokenKind::FatArrow }
            ('=', _) => TokenKind::Equal,

            ('!', Some('=')) => { self.cursor.advance(); TokenKind::BangEqual }
            ('!', _) => TokenKind::Bang,

            ('<', Some('=')) => { self.cursor.advance(); TokenKind::LessEqual }
            ('<', _) => TokenKind::Less,

            ('>', Some('=')) => { self.cursor.advance(); TokenKind::GreaterEqual }
            ('>', _) => TokenKind::Greater,

            ('&', Some('&')) => { self.cursor.advance(); TokenKind::AmpAmp }
            ('|', Some('|')) => { self.cursor.advance(); TokenKind::PipePipe }

            _ => {
                let span = self.span_from(start);
                return self.make_error(LexError::UnexpectedChar { ch: c, span });
            }
        };

        self.make_token(kind, start)
    }
}

impl Iterator for Lexer<'_, '_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            None
        } else {
            Some(token)
        }
    }
}

#[derive(Clone, Copy)]
struct Start {
    line: u32,
    col: u32,
    offset: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::Diagnostics;

    fn token_kinds(source: &str) -> Vec<TokenKind> {
        let config = LanguageConfig::default();
        Lexer::new(source, &config).map(|t| t.kind).collect()
    }

    #[test]
    fn empty_source() {
        assert!(token_kinds("").is_empty());
        assert!(token_kinds("  \n\t ").is_empty());
    }

    #[test]
    fn declarations() {
        use TokenKind::*;
        assert_eq!(
            token_kinds("export let x: Int32 = 1;"),
            vec![Export, Let, Identifier, Colon, Identifier, Equal, IntLiteral, Semicolon]
        );
    }

    #[test]
    fn number_literals() {
        use TokenKind::*;
        assert_eq!(
            token_kinds("1 2i64 3.5 1e3 10_000"),
            vec![IntLiteral, Int64Literal, FloatLiteral, FloatLiteral, IntLiteral]
        );
    }

    #[test]
    fn operators() {
        use TokenKind::*;
        assert_eq!(
            token_kinds(":= : -> => == != <= >= && || ! - ="),
            vec![
                ColonEqual, Colon, Arrow, FatArrow, EqualEqual, BangEqual, LessEqual,
                GreaterEqual, AmpAmp, PipePipe, Bang, Minus, Equal
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        use TokenKind::*;
        assert_eq!(
            token_kinds("a // line\n /* block\n */ b"),
            vec![Identifier, Identifier]
        );
    }

    #[test]
    fn spans_are_one_indexed() {
        let config = LanguageConfig::default();
        let tokens: Vec<Token> = Lexer::new("let\n  foo", &config).collect();
        assert_eq!(tokens[1].span, Span::new(2, 3, 3));
        assert_eq!(tokens[1].lexeme, "foo");
    }

    #[test]
    fn errors_are_logged_not_returned() {
        let log = Diagnostics::new();
        let tokens = Lexer::tokenize("let # = \"open", &LanguageConfig::default(), &log);
        assert_eq!(log.error_count(), 2);
        assert!(tokens.iter().all(|t| t.kind != TokenKind::Error));
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
    }

    #[test]
    fn identifier_length_limit() {
        let config = LanguageConfig::default().with_max_identifier_len(3);
        let mut lexer = Lexer::new("abcd", &config);
        assert_eq!(lexer.next_token().kind, TokenKind::Error);
        assert!(matches!(
            lexer.take_errors().as_slice(),
            [LexError::IdentifierTooLong { max: 3, .. }]
        ));
    }

    #[test]
    fn unicode_identifiers() {
        let strict = LanguageConfig::default();
        let mut lexer = Lexer::new("größe", &strict);
        lexer.by_ref().for_each(drop);
        assert!(lexer.has_errors());

        let lenient = LanguageConfig::default().with_unicode_identifiers(true);
        let kinds: Vec<TokenKind> = Lexer::new("größe", &lenient).map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TokenKind::Identifier]);
    }

    #[test]
    fn unterminated_comment() {
        let config = LanguageConfig::default();
        let mut lexer = Lexer::new("/* never closed", &config);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
        assert!(matches!(
            lexer.take_errors().as_slice(),
            [LexError::UnterminatedComment { .. }]
        ));
    }
}
