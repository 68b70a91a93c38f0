//! Operator definitions along with precedence for the Pratt parser.

use std::fmt;

use crate::lexer::TokenKind;

/// Binary operators, lowest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `||`
    Or,
    /// `&&`
    And,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
}

impl BinaryOp {
    pub const ALL: [BinaryOp; 13] = [
        BinaryOp::Or,
        BinaryOp::And,
        BinaryOp::Eq,
        BinaryOp::Ne,
        BinaryOp::Lt,
        BinaryOp::Le,
        BinaryOp::Gt,
        BinaryOp::Ge,
        BinaryOp::Add,
        BinaryOp::Sub,
        BinaryOp::Mul,
        BinaryOp::Div,
        BinaryOp::Rem,
    ];

    /// Returns (left_bp, right_bp); all binary operators are left-associative.
    pub fn binding_power(self) -> (u8, u8) {
        use BinaryOp::*;
        match self {
            Or => (3, 4),
            And => (5, 6),
            Eq | Ne => (7, 8),
            Lt | Le | Gt | Ge => (9, 10),
            Add | Sub => (11, 12),
            Mul | Div | Rem => (13, 14),
        }
    }

    pub fn from_token(token: TokenKind) -> Option<Self> {
        use TokenKind::*;
        Some(match token {
            PipePipe => BinaryOp::Or,
            AmpAmp => BinaryOp::And,
            EqualEqual => BinaryOp::Eq,
            BangEqual => BinaryOp::Ne,
            Less => BinaryOp::Lt,
            LessEqual => BinaryOp::Le,
            Greater => BinaryOp::Gt,
            GreaterEqual => BinaryOp::Ge,
            Plus => BinaryOp::Add,
            Minus => BinaryOp::Sub,
            Star => BinaryOp::Mul,
            Slash => BinaryOp::Div,
            Percent => BinaryOp::Rem,
            _ => return None,
        })
    }

    /// Operator symbol; also the overload registry key for dispatched operators.
    pub fn symbol(self) -> &'static str {
        use BinaryOp::*;
        match self {
            Or => "||",
            And => "&&",
            Eq => "==",
            Ne => "!=",
            Lt => "<",
            Le => "<=",
            Gt => ">",
            Ge => ">=",
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Rem => "%",
        }
    }

    /// `&&` and `||` evaluate their right operand conditionally and are not
    /// dispatched through overloads.
    pub fn is_short_circuit(self) -> bool {
        matches!(self, BinaryOp::Or | BinaryOp::And)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `-`
    Neg,
    /// `!`
    Not,
}

impl UnaryOp {
    pub fn binding_power() -> u8 {
        20
    }

    pub fn from_token(token: TokenKind) -> Option<Self> {
        match token {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Bang => Some(UnaryOp::Not),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplicative_binds_tighter_than_additive() {
        assert!(BinaryOp::Mul.binding_power().0 > BinaryOp::Add.binding_power().1);
        assert!(BinaryOp::And.binding_power().0 > BinaryOp::Or.binding_power().1);
    }

    #[test]
    fn every_operator_round_trips_through_its_token() {
        for op in BinaryOp::ALL {
            let kind = match op.symbol() {
                "||" => TokenKind::PipePipe,
                "&&" => TokenKind::AmpAmp,
                "==" => TokenKind::EqualEqual,
                "!=" => TokenKind::BangEqual,
                "<" => TokenKind::Less,
                "<=" => TokenKind::LessEqual,
                ">" => TokenKind::Greater,
                ">=" => TokenKind::GreaterEqual,
                "+" => TokenKind::Plus,
                "-" => TokenKind::Minus,
                "*" => TokenKind::Star,
                "/" => TokenKind::Slash,
                _ => TokenKind::Percent,
            };
            assert_eq!(BinaryOp::from_token(kind), Some(op));
        }
    }
}
