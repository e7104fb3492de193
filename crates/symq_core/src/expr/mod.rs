pub mod array_expr;
pub mod call_expr;
pub mod constant_expr;
pub mod lambda_expr;
pub mod quote_expr;
pub mod variable_expr;

use std::fmt;

pub use array_expr::ArrayExpr;
pub use call_expr::{CallExpr, CallTarget, DeclaredOperator};
pub use constant_expr::ConstantExpr;
pub use lambda_expr::LambdaExpr;
pub use quote_expr::QuoteExpr;
pub use variable_expr::VariableExpr;

use crate::runtime::value::Value;
use crate::types::TypeShape;

/// A node in a symbolic query graph.
///
/// Nodes are persistent; rewriting never mutates a node, it produces new
/// ones. Every node carries a static result shape used for applicability
/// checks during resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Constant(ConstantExpr),
    Call(CallExpr),
    Lambda(LambdaExpr),
    Quote(QuoteExpr),
    Variable(VariableExpr),
    ArrayLiteral(ArrayExpr),
}

impl Expression {
    /// Static result shape of this node.
    pub fn result_shape(&self) -> TypeShape {
        match self {
            Self::Constant(constant) => constant.shape.clone(),
            Self::Call(call) => call.result_shape(),
            Self::Lambda(lambda) => lambda.shape(),
            Self::Quote(quote) => quote.shape(),
            Self::Variable(variable) => variable.shape.clone(),
            Self::ArrayLiteral(array) => array.shape(),
        }
    }

    /// Child nodes in order, receiver before arguments for calls.
    pub fn children(&self) -> Vec<&Expression> {
        match self {
            Self::Call(call) => call.input_nodes(),
            Self::ArrayLiteral(array) => array.elements.iter().collect(),
            Self::Quote(quote) => vec![&quote.operand],
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(constant) => constant.fmt(f),
            Self::Call(call) => call.fmt(f),
            Self::Lambda(lambda) => lambda.fmt(f),
            Self::Quote(quote) => quote.fmt(f),
            Self::Variable(variable) => variable.fmt(f),
            Self::ArrayLiteral(array) => array.fmt(f),
        }
    }
}

impl From<ConstantExpr> for Expression {
    fn from(expr: ConstantExpr) -> Self {
        Expression::Constant(expr)
    }
}

impl From<CallExpr> for Expression {
    fn from(expr: CallExpr) -> Self {
        Expression::Call(expr)
    }
}

impl From<LambdaExpr> for Expression {
    fn from(expr: LambdaExpr) -> Self {
        Expression::Lambda(expr)
    }
}

impl From<QuoteExpr> for Expression {
    fn from(expr: QuoteExpr) -> Self {
        Expression::Quote(expr)
    }
}

impl From<VariableExpr> for Expression {
    fn from(expr: VariableExpr) -> Self {
        Expression::Variable(expr)
    }
}

impl From<ArrayExpr> for Expression {
    fn from(expr: ArrayExpr) -> Self {
        Expression::ArrayLiteral(expr)
    }
}

/// Create a constant node.
pub fn constant(value: Value, shape: TypeShape) -> Expression {
    ConstantExpr { value, shape }.into()
}

/// Create a lambda node from a host closure.
pub fn lambda(
    params: impl IntoIterator<Item = TypeShape>,
    ret: TypeShape,
    body: impl Fn(&[Value]) -> symq_error::Result<Value> + Send + Sync + 'static,
) -> LambdaExpr {
    LambdaExpr::new(params.into_iter().collect(), ret, body)
}

/// Quote an expression, making it inspectable by shape rather than only
/// invocable.
pub fn quote(operand: impl Into<Expression>) -> Expression {
    QuoteExpr {
        operand: Box::new(operand.into()),
    }
    .into()
}

/// Create a free variable node.
pub fn variable(name: impl Into<String>, shape: TypeShape) -> Expression {
    VariableExpr {
        name: name.into(),
        shape,
    }
    .into()
}

/// Create an array literal node.
pub fn array_literal(
    element: TypeShape,
    elements: impl IntoIterator<Item = Expression>,
) -> Expression {
    ArrayExpr {
        element,
        elements: elements.into_iter().collect(),
    }
    .into()
}

/// Shorthand for an int32 literal constant.
pub fn lit_i32(v: i32) -> Expression {
    constant(Value::Int32(v), TypeShape::Int32)
}

/// Wrap a lambda the way declarative request builders pass them: quoted.
pub fn quoted_lambda(lambda: LambdaExpr) -> Expression {
    quote(lambda)
}
