//! Expression parsing using Pratt parsing (precedence climbing).
//!
//! Binary operators carry their binding powers in [`BinaryOp::binding_power`];
//! calls bind tighter than any prefix or infix operator.

use strata_core::{ParseError, ParseErrorKind, Span, Value};

use super::expr::{Expr, ExprKind, FnExpr, MatchArm, Pattern};
use super::node::Block;
use super::ops::{BinaryOp, UnaryOp};
use super::parser::Parser;
use super::stmt_parser::unescape;
use crate::lexer::{Token, TokenKind};

/// Binding power of a call suffix `f(...)`.
const CALL_BP: u8 = 30;

impl Parser {
    /// Parse an expression with a minimum binding power.
    pub(super) fn parse_expr(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_prefix()?;

        loop {
            if self.check(TokenKind::LeftParen) {
                if CALL_BP < min_bp {
                    break;
                }
                lhs = self.parse_call(lhs)?;
                continue;
            }

            if let Some(op) = BinaryOp::from_token(self.peek().kind) {
                let (l_bp, r_bp) = op.binding_power();
                if l_bp < min_bp {
                    break;
                }
                self.advance();
                let rhs = self.parse_expr(r_bp)?;
                let span = lhs.span.merge(rhs.span);
                lhs = Expr::new(
                    ExprKind::Binary {
                        op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    },
                    span,
                );
                continue;
            }

            break;
        }

        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        if let Some(op) = UnaryOp::from_token(self.peek().kind) {
            let start = self.advance().span;
            let operand = self.parse_expr(UnaryOp::binding_power())?;
            let span = start.merge(operand.span);
            return Ok(Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            ));
        }

        let token = self.peek().clone();
        match token.kind {
            TokenKind::IntLiteral
            | TokenKind::Int64Literal
            | TokenKind::FloatLiteral
            | TokenKind::StringLiteral
            | TokenKind::True
            | TokenKind::False => {
                self.advance();
                Ok(Expr::value(literal_value(&token)?, token.span))
            }
            TokenKind::Identifier => {
                let name = self.parse_name()?;
                Ok(Expr::name(name))
            }
            TokenKind::LeftParen => {
                let open = self.advance().span;
                let mut inner = self.parse_expr(0)?;
                let close = self.expect(TokenKind::RightParen)?;
                inner.span = open.merge(close.span);
                Ok(inner)
            }
            TokenKind::LeftBrace => {
                let block = self.parse_block()?;
                let span = block.span;
                Ok(Expr::new(ExprKind::Block(block), span))
            }
            TokenKind::Fn => self.parse_fn_expr(),
            TokenKind::If => self.parse_if(),
            TokenKind::Match => self.parse_match(),
            TokenKind::Async => {
                let start = self.advance().span;
                let body = self.parse_block()?;
                let span = start.merge(body.span);
                Ok(Expr::new(ExprKind::Async(body), span))
            }
            TokenKind::Comptime => {
                let start = self.advance().span;
                self.expect(TokenKind::LeftParen)?;
                let inner = self.parse_expr(0)?;
                let close = self.expect(TokenKind::RightParen)?;
                Ok(Expr::new(
                    ExprKind::Comptime(Box::new(inner)),
                    start.merge(close.span),
                ))
            }
            TokenKind::Await => Err(ParseError::new(
                ParseErrorKind::MisplacedAwait,
                token.span,
                "`await` may only appear as a statement or as the whole initializer of a `let`",
            )),
            TokenKind::Eof => Err(ParseError::unexpected_eof(token.span)),
            other => Err(ParseError::expected_expression(
                token.span,
                other.description(),
            )),
        }
    }

    /// `callee(arg, ...)`
    fn parse_call(&mut self, callee: Expr) -> Result<Expr, ParseError> {
        self.expect(TokenKind::LeftParen)?;
        let mut args = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                args.push(self.parse_expr(0)?);
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        let close = self.expect(TokenKind::RightParen)?;
        let span = callee.span.merge(close.span);
        Ok(Expr::new(
            ExprKind::Call {
                callee: Box::new(callee),
                args,
            },
            span,
        ))
    }

    /// `fn(params) [-> T] { ... }`
    fn parse_fn_expr(&mut self) -> Result<Expr, ParseError> {
        let start = self.expect(TokenKind::Fn)?.span;
        let params = self.parse_params()?;
        let ret = self.parse_return_type()?;
        let body = self.parse_block()?;
        let span = start.merge(body.span);
        Ok(Expr::new(
            ExprKind::Fn(FnExpr {
                name: None,
                params,
                ret,
                body,
            }),
            span,
        ))
    }

    /// `if (cond) { ... } [else { ... } | else if ...]`
    fn parse_if(&mut self) -> Result<Expr, ParseError> {
        let start = self.expect(TokenKind::If)?.span;
        self.expect(TokenKind::LeftParen)?;
        let cond = self.parse_expr(0)?;
        self.expect(TokenKind::RightParen)?;
        let then = self.parse_block()?;
        let mut span = start.merge(then.span);

        let otherwise = if self.eat(TokenKind::Else).is_some() {
            let branch = if self.check(TokenKind::If) {
                self.parse_if()?
            } else {
                let block: Block = self.parse_block()?;
                let span = block.span;
                Expr::new(ExprKind::Block(block), span)
            };
            span = span.merge(branch.span);
            Some(Box::new(branch))
        } else {
            None
        };

        Ok(Expr::new(
            ExprKind::If {
                cond: Box::new(cond),
                then,
                otherwise,
            },
            span,
        ))
    }

    /// `match (scrutinee) { pattern => expr, ... }`
    fn parse_match(&mut self) -> Result<Expr, ParseError> {
        let start = self.expect(TokenKind::Match)?.span;
        self.expect(TokenKind::LeftParen)?;
        let scrutinee = self.parse_expr(0)?;
        self.expect(TokenKind::RightParen)?;
        self.expect(TokenKind::LeftBrace)?;

        let mut arms = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_eof() {
            let pattern = self.parse_pattern()?;
            self.expect(TokenKind::FatArrow)?;
            let body = self.parse_expr(0)?;
            let span = pattern.span().merge(body.span);
            arms.push(MatchArm {
                pattern,
                body,
                span,
            });
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        let close = self.expect(TokenKind::RightBrace)?;

        Ok(Expr::new(
            ExprKind::Match {
                scrutinee: Box::new(scrutinee),
                arms,
            },
            start.merge(close.span),
        ))
    }

    /// A literal, a negated numeric literal, or `_`.
    fn parse_pattern(&mut self) -> Result<Pattern, ParseError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Identifier if token.lexeme == "_" => {
                self.advance();
                Ok(Pattern::Wildcard(token.span))
            }
            TokenKind::Minus => {
                self.advance();
                let literal = self.advance();
                let span = token.span.merge(literal.span);
                let value = match literal.kind {
                    TokenKind::IntLiteral | TokenKind::Int64Literal | TokenKind::FloatLiteral => {
                        negate(literal_value(&literal)?, span)?
                    }
                    _ => return Err(expected_pattern(&literal)),
                };
                Ok(Pattern::Value(value, span))
            }
            TokenKind::IntLiteral
            | TokenKind::Int64Literal
            | TokenKind::FloatLiteral
            | TokenKind::StringLiteral
            | TokenKind::True
            | TokenKind::False => {
                self.advance();
                Ok(Pattern::Value(literal_value(&token)?, token.span))
            }
            _ => Err(expected_pattern(&token)),
        }
    }
}

fn expected_pattern(token: &Token) -> ParseError {
    ParseError::new(
        ParseErrorKind::ExpectedPattern,
        token.span,
        format!("expected a literal or `_`, found {}", token.kind.description()),
    )
}

fn invalid_literal(token: &Token, detail: impl std::fmt::Display) -> ParseError {
    ParseError::new(
        ParseErrorKind::InvalidLiteral,
        token.span,
        format!("invalid literal `{}`: {detail}", token.lexeme),
    )
}

/// Convert a literal token into its value.
fn literal_value(token: &Token) -> Result<Value, ParseError> {
    let digits = token.lexeme.replace('_', "");
    Ok(match token.kind {
        TokenKind::IntLiteral => Value::Int32(
            digits
                .parse::<i32>()
                .map_err(|e| invalid_literal(token, e))?,
        ),
        TokenKind::Int64Literal => Value::Int64(
            digits
                .trim_end_matches("i64")
                .parse::<i64>()
                .map_err(|e| invalid_literal(token, e))?,
        ),
        TokenKind::FloatLiteral => {
            Value::float(digits.parse::<f64>().map_err(|e| invalid_literal(token, e))?)
        }
        TokenKind::StringLiteral => Value::str(unescape(&token.lexeme, token.span)?),
        TokenKind::True => Value::Bool(true),
        TokenKind::False => Value::Bool(false),
        _ => return Err(invalid_literal(token, "not a literal")),
    })
}

fn negate(value: Value, span: Span) -> Result<Value, ParseError> {
    let overflow = || ParseError::new(ParseErrorKind::InvalidLiteral, span, "literal out of range");
    Ok(match value {
        Value::Int32(v) => Value::Int32(v.checked_neg().ok_or_else(overflow)?),
        Value::Int64(v) => Value::Int64(v.checked_neg().ok_or_else(overflow)?),
        Value::Float64(v) => Value::float(-v.into_inner()),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(source: &str) -> String {
        match Parser::expression(source) {
            Ok(expr) => expr.to_string(),
            Err(error) => panic!("failed to parse {source:?}: {error}"),
        }
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(render("1 + 2 * 3"), "(+ 1 (* 2 3))");
        assert_eq!(render("1 - 2 - 3"), "(- (- 1 2) 3)");
        assert_eq!(render("a || b && c == d"), "(|| a (&& b (== c d)))");
        assert_eq!(render("(1 + 2) * 3"), "(* (+ 1 2) 3)");
    }

    #[test]
    fn unary_binds_tighter_than_binary() {
        assert_eq!(render("-a * b"), "(* (- a) b)");
        assert_eq!(render("!a == b"), "(== (! a) b)");
    }

    #[test]
    fn calls_chain() {
        assert_eq!(render("f(1, g(2))(3)"), "(call (call f 1 (call g 2)) 3)");
        assert_eq!(render("-f(x)"), "(- (call f x))");
    }

    #[test]
    fn literals() {
        assert_eq!(render("1_000"), "1000");
        assert_eq!(render("7i64"), "7i64");
        assert_eq!(render("true"), "true");
        assert_eq!(render("\"hi\\n\""), "\"hi\\n\"");
        assert!(Parser::expression("99999999999").is_err());
        assert!(Parser::expression("99999999999i64").is_ok());
    }

    #[test]
    fn function_expressions() {
        assert_eq!(
            render("fn(x: Int32, y) -> Bool { x == y }"),
            "(fn (x: Int32 y) -> Bool (block (== x y)))"
        );
    }

    #[test]
    fn if_else_chains() {
        assert_eq!(
            render("if (a) { 1 } else if (b) { 2 } else { 3 }"),
            "(if a (block 1) (if b (block 2) (block 3)))"
        );
    }

    #[test]
    fn match_arms() {
        assert_eq!(
            render("match (x) { 1 => a, -2 => b, _ => c }"),
            "(match x (1 a) (-2 b) (_ c))"
        );
        let error = Parser::expression("match (x) { y => 1 }").unwrap_err();
        assert_eq!(error.kind, ParseErrorKind::ExpectedPattern);
    }

    #[test]
    fn async_and_comptime() {
        assert_eq!(render("async { f() }"), "(async (block (call f)))");
        assert_eq!(render("comptime(1 + 2)"), "(comptime (+ 1 2))");
    }

    #[test]
    fn await_is_not_an_expression() {
        let error = Parser::expression("await p").unwrap_err();
        assert_eq!(error.kind, ParseErrorKind::MisplacedAwait);
    }

    #[test]
    fn missing_operand() {
        let error = Parser::expression("1 * )").unwrap_err();
        assert_eq!(error.kind, ParseErrorKind::ExpectedExpression);
    }
}
