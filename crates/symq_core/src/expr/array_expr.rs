use std::fmt;

use super::Expression;
use crate::types::{self, TypeShape};

/// An array literal.
///
/// Kept as a node (rather than folded to a constant) because quoting
/// attaches per element: an array of quoted lambdas has to be rebuilt
/// element by element when normalized against a plain function-array
/// parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayExpr {
    pub element: TypeShape,
    pub elements: Vec<Expression>,
}

impl ArrayExpr {
    pub fn shape(&self) -> TypeShape {
        types::array(self.element.clone())
    }
}

impl fmt::Display for ArrayExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (idx, element) in self.elements.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{element}")?;
        }
        write!(f, "]")
    }
}
