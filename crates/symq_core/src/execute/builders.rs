use symq_error::{Result, SymqError};

use super::handle::{DeferredQuery, ExecutableQuery};
use crate::expr::{self, CallExpr, CallTarget, DeclaredOperator, Expression, LambdaExpr};
use crate::operators::surface::QUERY_SURFACE;
use crate::runtime::value::Value;
use crate::types::{self, TypeShape};

/// Declarative request builders.
///
/// Each builder validates its arguments, composes exactly one declarative
/// call node, and delegates to the core: sequence operators produce a new
/// handle, terminal operators produce an execution form. Lambdas are always
/// embedded quoted; resolution unwraps them to whatever the concrete
/// operator expects.
impl DeferredQuery {
    pub fn select(&self, result: TypeShape, projection: LambdaExpr) -> Result<DeferredQuery> {
        check_lambda("select", &projection, &[self.element_shape().clone()], &result)?;

        let node = self.sequence_call(
            "select",
            vec![self.element_shape().clone(), result.clone()],
            result.clone(),
            vec![expr::quoted_lambda(projection)],
        );
        Ok(DeferredQuery::from_node(node, result))
    }

    pub fn filter(&self, predicate: LambdaExpr) -> Result<DeferredQuery> {
        let element = self.element_shape().clone();
        check_lambda("where", &predicate, &[element.clone()], &TypeShape::Bool)?;

        let node = self.sequence_call(
            "where",
            vec![element.clone()],
            element.clone(),
            vec![expr::quoted_lambda(predicate)],
        );
        Ok(DeferredQuery::from_node(node, element))
    }

    /// Concatenate another query onto this one.
    ///
    /// The second source is embedded as a query-handle constant; the
    /// rewriter inlines it (or materializes it, if it already ran).
    pub fn concat(&self, other: &DeferredQuery) -> Result<DeferredQuery> {
        let element = self.element_shape().clone();
        if *other.element_shape() != element {
            return Err(SymqError::new(format!(
                "Cannot concat sequences of different element shapes: {element} and {}",
                other.element_shape()
            )));
        }

        let second = expr::constant(
            Value::Query(other.clone()),
            types::query(element.clone()),
        );
        let node = self.sequence_call(
            "concat",
            vec![element.clone()],
            element.clone(),
            vec![second],
        );
        Ok(DeferredQuery::from_node(node, element))
    }

    pub fn group_by(&self, key: TypeShape, key_selector: LambdaExpr) -> Result<DeferredQuery> {
        let element = self.element_shape().clone();
        check_lambda("group_by", &key_selector, &[element.clone()], &key)?;

        let group = types::grouping(key.clone(), element.clone());
        let node = self.sequence_call(
            "group_by",
            vec![element, key],
            group.clone(),
            vec![expr::quoted_lambda(key_selector)],
        );
        Ok(DeferredQuery::from_node(node, group))
    }

    pub fn count(&self) -> ExecutableQuery {
        self.terminal_call(
            "count",
            vec![self.element_shape().clone()],
            TypeShape::Int64,
        )
    }

    pub fn first(&self) -> ExecutableQuery {
        let element = self.element_shape().clone();
        self.terminal_call("first", vec![element.clone()], element)
    }

    pub fn to_list(&self) -> ExecutableQuery {
        let element = self.element_shape().clone();
        self.terminal_call("to_list", vec![element.clone()], types::array(element))
    }

    /// Sum of a numeric sequence. The result shape follows the element
    /// shape; there is no overload for other elements.
    pub fn sum(&self) -> Result<ExecutableQuery> {
        let result = match self.element_shape() {
            TypeShape::Int32 => TypeShape::Int32,
            TypeShape::Int64 => TypeShape::Int64,
            TypeShape::Float64 => TypeShape::Float64,
            other => {
                return Err(SymqError::new(format!(
                    "No sum operator for element shape {other}"
                )));
            }
        };
        Ok(self.terminal_call("sum", Vec::new(), result))
    }

    /// Mean of a numeric sequence. Nullable elements average to a nullable
    /// result.
    pub fn average(&self) -> Result<ExecutableQuery> {
        let result = match self.element_shape() {
            TypeShape::Int32 | TypeShape::Int64 | TypeShape::Float64 => TypeShape::Float64,
            TypeShape::Nullable(inner) if **inner == TypeShape::Int32 => {
                types::nullable(TypeShape::Float64)
            }
            other => {
                return Err(SymqError::new(format!(
                    "No average operator for element shape {other}"
                )));
            }
        };
        Ok(self.terminal_call("average", Vec::new(), result))
    }

    fn sequence_call(
        &self,
        name: &str,
        type_args: Vec<TypeShape>,
        result_element: TypeShape,
        args: Vec<Expression>,
    ) -> Expression {
        CallExpr {
            target: CallTarget::Declared(DeclaredOperator {
                name: name.to_string(),
                surface: QUERY_SURFACE,
                type_args,
                ret: types::query(result_element),
            }),
            receiver: Some(Box::new(self.node().clone())),
            args,
        }
        .into()
    }

    fn terminal_call(
        &self,
        name: &str,
        type_args: Vec<TypeShape>,
        result: TypeShape,
    ) -> ExecutableQuery {
        let node: Expression = CallExpr {
            target: CallTarget::Declared(DeclaredOperator {
                name: name.to_string(),
                surface: QUERY_SURFACE,
                type_args,
                ret: types::task(result.clone()),
            }),
            receiver: Some(Box::new(self.node().clone())),
            args: Vec::new(),
        }
        .into();
        ExecutableQuery::new(node, result)
    }

}

fn check_lambda(
    operator: &str,
    lambda: &LambdaExpr,
    params: &[TypeShape],
    ret: &TypeShape,
) -> Result<()> {
    if lambda.params != params || lambda.ret != *ret {
        return Err(SymqError::new(format!(
            "Invalid lambda for '{operator}': expected {}, got {}",
            types::func(params.iter().cloned(), ret.clone()),
            lambda.shape()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_source() -> DeferredQuery {
        DeferredQuery::from_values(
            TypeShape::Int32,
            vec![Value::Int32(1), Value::Int32(2), Value::Int32(3)],
        )
    }

    #[test]
    fn select_composes_one_declared_call() {
        let source = int_source();
        let query = source
            .select(
                TypeShape::Utf8,
                expr::lambda([TypeShape::Int32], TypeShape::Utf8, |args| {
                    Ok(Value::Utf8(args[0].to_string()))
                }),
            )
            .unwrap();

        assert_eq!(TypeShape::Utf8, *query.element_shape());
        match query.node() {
            Expression::Call(call) => {
                assert_eq!("select", call.name());
                assert!(matches!(call.target, CallTarget::Declared(_)));
                assert_eq!(1, call.args.len());
                assert!(matches!(call.args[0], Expression::Quote(_)));
            }
            other => panic!("expected call node, got {other}"),
        }
    }

    #[test]
    fn mismatched_lambda_rejected_at_the_call_site() {
        let source = int_source();
        let wrong = expr::lambda([TypeShape::Int64], TypeShape::Utf8, |args| {
            Ok(Value::Utf8(args[0].to_string()))
        });
        assert!(source.select(TypeShape::Utf8, wrong).is_err());
    }

    #[test]
    fn sum_of_non_numeric_rejected() {
        let source = DeferredQuery::from_values(TypeShape::Utf8, Vec::new());
        assert!(source.sum().is_err());
        assert!(source.average().is_err());
    }

    #[test]
    fn concat_requires_matching_elements() {
        let ints = int_source();
        let strings = DeferredQuery::from_values(TypeShape::Utf8, Vec::new());
        assert!(ints.concat(&strings).is_err());
    }
}
