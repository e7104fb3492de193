use std::fmt;

use super::Expression;
use crate::operators::ResolvedOperator;
use crate::types::TypeShape;

/// A call to a named operator.
///
/// The receiver, when present, is the sequence the operator applies to and
/// participates in signature matching as the first parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub target: CallTarget,
    pub receiver: Option<Box<Expression>>,
    pub args: Vec<Expression>,
}

/// What a call node points at.
#[derive(Debug, Clone, PartialEq)]
pub enum CallTarget {
    /// A declarative operator, identified by name and defining surface. Built
    /// by request builders; resolved away by the rewriter.
    Declared(DeclaredOperator),

    /// A concrete operator closed over its type arguments, ready to compile.
    Resolved(ResolvedOperator),
}

/// Reference to an operator on a declarative surface.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclaredOperator {
    pub name: String,

    /// Name of the surface the operator was declared on. The registry maps
    /// this to the implementation-bearing surface during resolution.
    pub surface: &'static str,

    /// Explicit type arguments, empty for non-generic operators.
    pub type_args: Vec<TypeShape>,

    /// Declared result shape of the call.
    pub ret: TypeShape,
}

impl CallExpr {
    pub fn name(&self) -> &str {
        match &self.target {
            CallTarget::Declared(op) => &op.name,
            CallTarget::Resolved(op) => &op.name,
        }
    }

    pub fn result_shape(&self) -> TypeShape {
        match &self.target {
            CallTarget::Declared(op) => op.ret.clone(),
            CallTarget::Resolved(op) => op.ret.clone(),
        }
    }

    /// Receiver followed by arguments, in matching order.
    pub fn input_nodes(&self) -> Vec<&Expression> {
        let mut nodes = Vec::with_capacity(self.args.len() + 1);
        if let Some(receiver) = &self.receiver {
            nodes.push(receiver.as_ref());
        }
        nodes.extend(self.args.iter());
        nodes
    }
}

impl fmt::Display for CallExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            CallTarget::Declared(op) => {
                write!(f, "{}.{}", op.surface, op.name)?;
                if !op.type_args.is_empty() {
                    write!(f, "<")?;
                    for (idx, arg) in op.type_args.iter().enumerate() {
                        if idx > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    write!(f, ">")?;
                }
            }
            CallTarget::Resolved(op) => write!(f, "{}", op.name)?,
        }

        write!(f, "(")?;
        for (idx, node) in self.input_nodes().iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{node}")?;
        }
        write!(f, ")")
    }
}
