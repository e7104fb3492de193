use std::fmt;

use super::Expression;
use crate::types::{self, TypeShape};

/// Wraps an expression so it is inspectable as a node rather than only
/// invocable.
///
/// Declarative operators accept lambda arguments quoted; their concrete
/// counterparts usually expect the plain function shape. The quote
/// normalizer unwraps layers until the argument fits the target parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteExpr {
    pub operand: Box<Expression>,
}

impl QuoteExpr {
    pub fn shape(&self) -> TypeShape {
        types::quoted(self.operand.result_shape())
    }
}

impl fmt::Display for QuoteExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "quote({})", self.operand)
    }
}
