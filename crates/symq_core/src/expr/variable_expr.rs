use std::fmt;

use crate::types::TypeShape;

/// A free variable. Returned unchanged by the rewriter; evaluating one in a
/// compiled graph is an error.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableExpr {
    pub name: String,
    pub shape: TypeShape,
}

impl fmt::Display for VariableExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
