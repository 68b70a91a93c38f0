//! Statement and declaration parsing.

use strata_core::{ExportedName, ParseError, ParseErrorKind, Span};

use super::expr::{FnExpr, Param};
use super::node::{
    Ambiguous, Assign, AwaitStmt, Block, Decl, DeclFlags, FnDef, Import, Name, Stmt, TypeDef,
    TypeRef, params_shape,
};
use super::parser::Parser;
use crate::lexer::TokenKind;
use strata_core::TypeShape;

impl Parser {
    /// Parse statements until `end` (not consumed) or end of file.
    pub(super) fn parse_stmts_until(&mut self, end: TokenKind) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        while !self.check(end) && !self.is_eof() {
            let before = self.position();
            match self.parse_stmt(end) {
                Ok(stmt) => stmts.push(stmt),
                Err(error) => {
                    self.errors.push(error);
                    self.synchronize();
                    // A stray `}` at top level would otherwise stall the loop.
                    if self.position() == before {
                        self.advance();
                    }
                }
            }
        }
        stmts
    }

    /// `{ stmt* }`
    pub(super) fn parse_block(&mut self) -> Result<Block, ParseError> {
        let open = self.expect(TokenKind::LeftBrace)?;
        let stmts = self.parse_stmts_until(TokenKind::RightBrace);
        let close = self.expect(TokenKind::RightBrace)?;
        Ok(Block::new(stmts, open.span.merge(close.span)))
    }

    fn parse_stmt(&mut self, end: TokenKind) -> Result<Stmt, ParseError> {
        match self.peek().kind {
            TokenKind::Import => self.parse_import(),
            TokenKind::Export => self.parse_exported(),
            TokenKind::Let | TokenKind::Var => self.parse_let(None),
            TokenKind::Fn if self.peek_nth(1).kind == TokenKind::Identifier => {
                self.parse_fn_def(None)
            }
            TokenKind::Type => self.parse_type_def(None),
            TokenKind::Extern => self.parse_extern(),
            TokenKind::Await => {
                let start = self.advance().span;
                let promise = self.parse_expr(0)?;
                let semi = self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::Await(AwaitStmt {
                    bind: None,
                    promise,
                    span: start.merge(semi.span),
                }))
            }
            TokenKind::Identifier
                if matches!(
                    self.peek_nth(1).kind,
                    TokenKind::Equal | TokenKind::ColonEqual
                ) =>
            {
                self.parse_assignment_like()
            }
            _ => {
                let expr = self.parse_expr(0)?;
                if self.eat(TokenKind::Semicolon).is_none()
                    && !expr.ends_with_block()
                    && !self.check(end)
                    && !self.is_eof()
                {
                    let token = self.peek();
                    return Err(ParseError::expected_token(
                        token.span,
                        "';'",
                        token.kind.description(),
                    ));
                }
                Ok(Stmt::Expr(expr))
            }
        }
    }

    /// `import a, b from "specifier";`
    fn parse_import(&mut self) -> Result<Stmt, ParseError> {
        let start = self.expect(TokenKind::Import)?.span;
        let mut names = vec![self.parse_name()?];
        while self.eat(TokenKind::Comma).is_some() {
            names.push(self.parse_name()?);
        }
        self.expect(TokenKind::From)?;
        let spec = self.expect(TokenKind::StringLiteral)?;
        let specifier = unescape(&spec.lexeme, spec.span)?;
        let semi = self.expect(TokenKind::Semicolon)?;
        Ok(Stmt::Import(Import {
            names,
            specifier,
            module: None,
            span: start.merge(semi.span),
        }))
    }

    fn parse_exported(&mut self) -> Result<Stmt, ParseError> {
        let start = self.expect(TokenKind::Export)?.span;
        match self.peek().kind {
            TokenKind::Let | TokenKind::Var => self.parse_let(Some(start)),
            TokenKind::Fn => self.parse_fn_def(Some(start)),
            TokenKind::Type => self.parse_type_def(Some(start)),
            _ => {
                let token = self.peek();
                Err(ParseError::new(
                    ParseErrorKind::ExpectedStatement,
                    token.span,
                    format!(
                        "expected 'let', 'var', 'fn' or 'type' after 'export', found {}",
                        token.kind.description()
                    ),
                ))
            }
        }
    }

    fn exported_name(&self, name: &Name) -> ExportedName {
        ExportedName::new(self.module.clone(), name.text.clone())
    }

    /// `let x [: T] [= e];`, `var ...`, or `let x = await e;`
    fn parse_let(&mut self, export: Option<Span>) -> Result<Stmt, ParseError> {
        let keyword = self.advance();
        let start = export.unwrap_or(keyword.span);
        let mutable = keyword.kind == TokenKind::Var;
        let name = self.parse_name()?;
        let ty = if self.eat(TokenKind::Colon).is_some() {
            Some(self.parse_type()?)
        } else {
            None
        };

        let mut init = None;
        if self.eat(TokenKind::Equal).is_some() {
            if self.check(TokenKind::Await) {
                let await_span = self.advance().span;
                if mutable || export.is_some() || ty.is_some() {
                    return Err(ParseError::new(
                        ParseErrorKind::MisplacedAwait,
                        await_span,
                        "only a plain `let` may bind the result of `await`",
                    ));
                }
                let promise = self.parse_expr(0)?;
                let semi = self.expect(TokenKind::Semicolon)?;
                return Ok(Stmt::Await(AwaitStmt {
                    bind: Some(name),
                    promise,
                    span: start.merge(semi.span),
                }));
            }
            init = Some(self.parse_expr(0)?);
        }
        let semi = self.expect(TokenKind::Semicolon)?;

        let mut flags = DeclFlags::empty();
        if mutable {
            flags |= DeclFlags::MUTABLE;
        }
        let mut decl = Decl::new(name, init, flags, start.merge(semi.span));
        decl.ty = ty;
        if export.is_some() {
            decl.export = Some(self.exported_name(&decl.name));
        }
        Ok(Stmt::Decl(decl))
    }

    /// `fn name(params) [-> T] { ... }`
    fn parse_fn_def(&mut self, export: Option<Span>) -> Result<Stmt, ParseError> {
        let keyword = self.expect(TokenKind::Fn)?;
        let start = export.unwrap_or(keyword.span);
        let name = self.parse_name()?;
        let params = self.parse_params()?;
        let ret = self.parse_return_type()?;
        let body = self.parse_block()?;
        let span = start.merge(body.span);
        let export = export.map(|_| self.exported_name(&name));
        Ok(Stmt::FnDef(FnDef {
            func: FnExpr {
                name: Some(name.text.clone()),
                params,
                ret,
                body,
            },
            name,
            export,
            span,
        }))
    }

    /// `type Name = T;`
    fn parse_type_def(&mut self, export: Option<Span>) -> Result<Stmt, ParseError> {
        let keyword = self.expect(TokenKind::Type)?;
        let start = export.unwrap_or(keyword.span);
        let name = self.parse_name()?;
        self.expect(TokenKind::Equal)?;
        let ty = self.parse_type()?;
        let semi = self.expect(TokenKind::Semicolon)?;
        let export = export.map(|_| self.exported_name(&name));
        Ok(Stmt::TypeDef(TypeDef {
            name,
            export,
            ty,
            span: start.merge(semi.span),
        }))
    }

    /// `extern fn name(params) [-> T];`
    fn parse_extern(&mut self) -> Result<Stmt, ParseError> {
        let start = self.expect(TokenKind::Extern)?.span;
        self.expect(TokenKind::Fn)?;
        let name = self.parse_name()?;
        let params = self.parse_params()?;
        let ret = self.parse_return_type()?;
        let semi = self.expect(TokenKind::Semicolon)?;
        let span = start.merge(semi.span);
        let shape = TypeShape::function(
            params_shape(&params),
            ret.map_or(TypeShape::VOID, |t| t.shape),
        );
        let mut decl = Decl::new(name, None, DeclFlags::EXTERN, span);
        decl.ty = Some(TypeRef::new(shape, span));
        Ok(Stmt::Decl(decl))
    }

    /// `x = e;` or `x := e;`
    fn parse_assignment_like(&mut self) -> Result<Stmt, ParseError> {
        let name = self.parse_name()?;
        let op = self.advance();
        let value = self.parse_expr(0)?;
        let semi = self.expect(TokenKind::Semicolon)?;
        let span = name.span.merge(semi.span);
        Ok(if op.kind == TokenKind::ColonEqual {
            Stmt::Assign(Assign {
                target: name,
                value,
                span,
            })
        } else {
            Stmt::Ambiguous(Ambiguous { name, value, span })
        })
    }

    pub(super) fn parse_name(&mut self) -> Result<Name, ParseError> {
        if self.check(TokenKind::Identifier) {
            let token = self.advance();
            return Ok(Name::new(token.lexeme, token.span));
        }
        let token = self.peek();
        Err(ParseError::expected_identifier(
            token.span,
            token.kind.description(),
        ))
    }

    /// `( [name [: T] (, name [: T])*] )`
    pub(super) fn parse_params(&mut self) -> Result<Vec<Param>, ParseError> {
        self.expect(TokenKind::LeftParen)?;
        let mut params = Vec::new();
        if self.eat(TokenKind::RightParen).is_some() {
            return Ok(params);
        }
        loop {
            let name = self.parse_name()?;
            let ty = if self.eat(TokenKind::Colon).is_some() {
                Some(self.parse_type()?)
            } else {
                None
            };
            params.push(Param { name, ty });
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RightParen)?;
        Ok(params)
    }

    pub(super) fn parse_return_type(&mut self) -> Result<Option<TypeRef>, ParseError> {
        if self.eat(TokenKind::Arrow).is_some() {
            Ok(Some(self.parse_type()?))
        } else {
            Ok(None)
        }
    }
}

/// Decode a string literal lexeme including its quotes.
pub(super) fn unescape(lexeme: &str, span: Span) -> Result<String, ParseError> {
    let inner = lexeme
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidLiteral, span, "malformed string"))?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            other => {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidLiteral,
                    span,
                    format!("invalid escape sequence `\\{}`", other.unwrap_or(' ')),
                ));
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{LanguageConfig, Lexer};
    use strata_core::{Diagnostics, ModuleName};

    fn parse(source: &str) -> (Block, Vec<ParseError>) {
        let log = Diagnostics::new();
        let tokens = Lexer::tokenize(source, &LanguageConfig::default(), &log);
        Parser::parse_module(tokens, ModuleName::from("m"))
    }

    fn render(source: &str) -> String {
        let (block, errors) = parse(source);
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        block.to_string()
    }

    #[test]
    fn let_and_var() {
        assert_eq!(render("let x = 1; var y: Int64;"), "(block (let x 1) (var y: Int64))");
    }

    #[test]
    fn export_records_external_name() {
        assert_eq!(render("export let x = 1;"), "(block (let x 1 @export(m.x)))");
        let (block, _) = parse("export fn f() { 1 }");
        match &block.stmts[0] {
            Stmt::FnDef(def) => {
                assert_eq!(def.export.as_ref().map(|e| e.to_string()), Some("m.f".into()))
            }
            other => panic!("expected fn definition, got {other}"),
        }
    }

    #[test]
    fn ambiguous_and_explicit_assignment() {
        assert_eq!(render("x = 1; x := 2;"), "(block (= x 1) (:= x 2))");
    }

    #[test]
    fn imports() {
        assert_eq!(
            render("import a, b from \"lib/util\";"),
            "(block (import \"lib/util\" a b))"
        );
    }

    #[test]
    fn fn_definition_needs_no_semicolon() {
        assert_eq!(
            render("fn f(x: Int32) -> Int32 { x } f(1)"),
            "(block (fndef f (fn f (x: Int32) -> Int32 (block x))) (call f 1))"
        );
    }

    #[test]
    fn extern_becomes_typed_declaration() {
        assert_eq!(
            render("extern fn now() -> Int64;"),
            "(block (extern now: fn() -> Int64))"
        );
    }

    #[test]
    fn type_definitions() {
        assert_eq!(
            render("type Pair = fn(Int32) -> Bool;"),
            "(block (typedef Pair fn(Int32) -> Bool))"
        );
    }

    #[test]
    fn await_statements() {
        assert_eq!(
            render("await p; let v = await q;"),
            "(block (await p) (let v (await q)))"
        );
    }

    #[test]
    fn await_in_expression_position_is_rejected() {
        let (_, errors) = parse("let x = 1 + await p;");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ParseErrorKind::MisplacedAwait);
    }

    #[test]
    fn missing_semicolon_between_expressions() {
        let (_, errors) = parse("f() g()");
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn stray_closing_brace_does_not_stall() {
        let (block, errors) = parse("} let x = 1;");
        assert!(!errors.is_empty());
        assert_eq!(block.to_string(), "(block (let x 1))");
    }

    #[test]
    fn string_escapes() {
        assert_eq!(unescape(r#""a\n\"b\"""#, Span::UNKNOWN).as_deref(), Ok("a\n\"b\""));
        assert!(unescape(r#""\q""#, Span::UNKNOWN).is_err());
    }
}
