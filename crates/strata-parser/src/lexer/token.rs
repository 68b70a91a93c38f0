//! Token types for the strata lexer.

use std::fmt;

use strata_core::Span;

/// A token from the source code. Lexemes are owned so the source text may be
/// dropped once lexing completes.
#[derive(Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    #[inline]
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            span,
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?} @ {:?})", self.kind, self.lexeme, self.span)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // =========================================
    // Literals
    // =========================================
    /// `42`
    IntLiteral,
    /// `42i64`
    Int64Literal,
    /// `3.5`, `1e9`
    FloatLiteral,
    /// `"text"`
    StringLiteral,

    Identifier,

    // =========================================
    // Keywords
    // =========================================
    Import,
    From,
    Export,
    Let,
    Var,
    Fn,
    Type,
    Extern,
    Await,
    Async,
    Comptime,
    If,
    Else,
    Match,
    True,
    False,

    // =========================================
    // Punctuation and operators
    // =========================================
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Semicolon,
    Colon,
    /// `:=`
    ColonEqual,
    Equal,
    EqualEqual,
    BangEqual,
    Bang,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    AmpAmp,
    PipePipe,
    /// `->`
    Arrow,
    /// `=>`
    FatArrow,

    // =========================================
    // Special
    // =========================================
    Eof,
    /// Recorded lexer error; the parser skips these.
    Error,
}

impl TokenKind {
    pub fn description(self) -> &'static str {
        use TokenKind::*;
        match self {
            IntLiteral | Int64Literal => "integer literal",
            FloatLiteral => "float literal",
            StringLiteral => "string literal",
            Identifier => "identifier",
            Import => "'import'",
            From => "'from'",
            Export => "'export'",
            Let => "'let'",
            Var => "'var'",
            Fn => "'fn'",
            Type => "'type'",
            Extern => "'extern'",
            Await => "'await'",
            Async => "'async'",
            Comptime => "'comptime'",
            If => "'if'",
            Else => "'else'",
            Match => "'match'",
            True => "'true'",
            False => "'false'",
            LeftParen => "'('",
            RightParen => "')'",
            LeftBrace => "'{'",
            RightBrace => "'}'",
            Comma => "','",
            Semicolon => "';'",
            Colon => "':'",
            ColonEqual => "':='",
            Equal => "'='",
            EqualEqual => "'=='",
            BangEqual => "'!='",
            Bang => "'!'",
            Less => "'<'",
            LessEqual => "'<='",
            Greater => "'>'",
            GreaterEqual => "'>='",
            Plus => "'+'",
            Minus => "'-'",
            Star => "'*'",
            Slash => "'/'",
            Percent => "'%'",
            AmpAmp => "'&&'",
            PipePipe => "'||'",
            Arrow => "'->'",
            FatArrow => "'=>'",
            Eof => "end of file",
            Error => "invalid token",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Look up a keyword from an identifier string.
pub fn lookup_keyword(ident: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match ident {
        "import" => Import,
        "from" => From,
        "export" => Export,
        "let" => Let,
        "var" => Var,
        "fn" => Fn,
        "type" => Type,
        "extern" => Extern,
        "await" => Await,
        "async" => Async,
        "comptime" => Comptime,
        "if" => If,
        "else" => Else,
        "match" => Match,
        "true" => True,
        "false" => False,
        _ => return None,
    })
}
