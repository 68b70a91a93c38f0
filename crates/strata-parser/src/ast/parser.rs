//! Parser state, token helpers and entry points.

use strata_core::{Diagnostic, Level, LogSink, ModuleName, ParseError, Span};

use super::expr::Expr;
use super::node::Block;
use crate::lexer::{LanguageConfig, Lexer, Token, TokenKind};

/// Recursive-descent parser over a token vector.
///
/// Parsing is lenient at statement granularity: an error skips to the next
/// statement boundary and parsing continues, so one bad statement does not
/// hide diagnostics in the rest of the module.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    pub(super) module: ModuleName,
    pub(super) errors: Vec<ParseError>,
}

impl Parser {
    /// Create a parser. `tokens` must end with [`TokenKind::Eof`].
    pub fn new(mut tokens: Vec<Token>, module: ModuleName) -> Self {
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            let span = tokens.last().map_or(Span::point(1, 1), |t| t.span.right_edge());
            tokens.push(Token::new(TokenKind::Eof, "", span));
        }
        Self {
            tokens,
            pos: 0,
            module,
            errors: Vec::new(),
        }
    }

    /// Parse a whole module body, collecting errors instead of stopping at the first.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn parse_module(tokens: Vec<Token>, module: ModuleName) -> (Block, Vec<ParseError>) {
        let mut parser = Parser::new(tokens, module);
        let start = parser.peek().span;
        let stmts = parser.parse_stmts_until(TokenKind::Eof);
        let block = Block::new(stmts, start.merge(parser.peek().span));
        (block, parser.errors)
    }

    /// Tokenize and parse `source`, logging every error to `log`.
    pub fn parse_source(
        source: &str,
        module: ModuleName,
        config: &LanguageConfig,
        log: &dyn LogSink,
    ) -> Block {
        let tokens = Lexer::tokenize(source, config, log);
        let (block, errors) = Parser::parse_module(tokens, module.clone());
        for error in errors {
            log.log(
                Diagnostic::new(Level::Error, error.to_string())
                    .at(error.span)
                    .in_module(module.clone()),
            );
        }
        block
    }

    /// Parse a single expression; the whole input must be consumed.
    pub fn expression(source: &str) -> Result<Expr, ParseError> {
        let config = LanguageConfig::default();
        let mut lexer = Lexer::new(source, &config);
        let tokens: Vec<Token> = lexer.by_ref().collect();
        if let Some(error) = lexer.take_errors().into_iter().next() {
            return Err(ParseError::new(
                strata_core::ParseErrorKind::UnexpectedToken,
                error.span(),
                error.to_string(),
            ));
        }
        let mut parser = Parser::new(tokens, ModuleName::from("<expr>"));
        let expr = parser.parse_expr(0)?;
        if !parser.check(TokenKind::Eof) {
            let token = parser.peek().clone();
            return Err(ParseError::expected_token(
                token.span,
                "end of input",
                token.kind.description(),
            ));
        }
        Ok(expr)
    }

    // =========================================
    // Token helpers
    // =========================================

    pub(super) fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub(super) fn peek_nth(&self, n: usize) -> &Token {
        &self.tokens[(self.pos + n).min(self.tokens.len() - 1)]
    }

    pub(super) fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    /// Index of the next token; used to detect lack of progress.
    pub(super) fn position(&self) -> usize {
        self.pos
    }

    pub(super) fn is_eof(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    pub(super) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    pub(super) fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    pub(super) fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        let token = self.peek();
        if token.kind == TokenKind::Eof {
            return Err(ParseError::unexpected_eof(token.span));
        }
        Err(ParseError::expected_token(
            token.span,
            kind.description(),
            token.kind.description(),
        ))
    }

    /// Span of the most recently consumed token.
    pub(super) fn prev_span(&self) -> Span {
        self.tokens[self.pos.saturating_sub(1)].span
    }

    /// Skip to just after the next `;` or to the next `}` at the current depth.
    pub(super) fn synchronize(&mut self) {
        let mut depth = 0usize;
        while !self.is_eof() {
            match self.peek().kind {
                TokenKind::LeftBrace => depth += 1,
                TokenKind::RightBrace if depth == 0 => return,
                TokenKind::RightBrace => depth -= 1,
                TokenKind::Semicolon if depth == 0 => {
                    self.advance();
                    return;
                }
                _ => {}
            }
            self.advance();
        }
    }
}
