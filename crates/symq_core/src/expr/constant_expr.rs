use std::fmt;

use crate::runtime::value::Value;
use crate::types::TypeShape;

/// A literal value with a static shape.
///
/// Constants may embed deferred query handles (`Value::Query`); the rewriter
/// inlines or materializes those. Everything else passes through rewriting
/// unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantExpr {
    pub value: Value,
    pub shape: TypeShape,
}

impl fmt::Display for ConstantExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}
