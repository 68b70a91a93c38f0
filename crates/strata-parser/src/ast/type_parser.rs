//! Type expression parsing.
//!
//! ```text
//! type := Int32 | Int64 | Float64 | Bool | String | Void | Any
//!       | fn ( [type (, type)*] ) [-> type]
//!       | Identifier
//! ```

use strata_core::{ParseError, PrimitiveKind, TypeShape};

use super::node::TypeRef;
use super::parser::Parser;
use crate::lexer::TokenKind;

impl Parser {
    /// Parse a written type. Unknown identifiers stay [`TypeShape::Named`]
    /// until Define resolves them.
    pub(super) fn parse_type(&mut self) -> Result<TypeRef, ParseError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Fn => {
                self.advance();
                self.expect(TokenKind::LeftParen)?;
                let mut params = Vec::new();
                if !self.check(TokenKind::RightParen) {
                    loop {
                        params.push(self.parse_type()?.shape);
                        if self.eat(TokenKind::Comma).is_none() {
                            break;
                        }
                    }
                }
                let close = self.expect(TokenKind::RightParen)?;
                let mut span = token.span.merge(close.span);
                let result = match self.parse_return_type()? {
                    Some(ret) => {
                        span = span.merge(ret.span);
                        ret.shape
                    }
                    None => TypeShape::VOID,
                };
                Ok(TypeRef::new(TypeShape::function(params, result), span))
            }
            TokenKind::Identifier => {
                self.advance();
                let shape = match token.lexeme.as_str() {
                    "Any" => TypeShape::Any,
                    "Type" => TypeShape::Type,
                    name => match PrimitiveKind::from_name(name) {
                        Some(kind) => TypeShape::Primitive(kind),
                        None => TypeShape::Named(name.into()),
                    },
                };
                Ok(TypeRef::new(shape, token.span))
            }
            _ => Err(ParseError::expected_type(
                token.span,
                token.kind.description(),
            )),
        }
    }
}
