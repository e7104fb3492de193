use crate::expr::{ArrayExpr, Expression};
use crate::types::TypeShape;

/// Adjust a lambda-valued argument to the representation the closed
/// parameter shape expects.
///
/// Repeatedly unwraps one quoting layer while the argument's current shape
/// is not assignable to the parameter, stopping as soon as assignability
/// holds or no further unwrapping is possible. Array literals of quoted
/// lambdas are rebuilt element by element, since quoting attaches per
/// element rather than to the array as a whole.
pub fn normalize_argument(param: &TypeShape, mut arg: Expression) -> Expression {
    let param = param.deref_shape();

    loop {
        if param.is_assignable_from(&arg.result_shape()) {
            return arg;
        }

        match arg {
            Expression::Quote(quote) => arg = *quote.operand,
            Expression::ArrayLiteral(array)
                if matches!(param, TypeShape::Array(_))
                    && array
                        .elements
                        .iter()
                        .any(|e| matches!(e, Expression::Quote(_))) =>
            {
                let want = match param {
                    TypeShape::Array(element) => element.as_ref(),
                    _ => unreachable!("param variant checked in guard"),
                };
                let elements = array
                    .elements
                    .into_iter()
                    .map(|element| normalize_argument(want, element))
                    .collect();
                arg = ArrayExpr {
                    element: want.clone(),
                    elements,
                }
                .into();
            }
            // Nothing left to unwrap.
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr;
    use crate::runtime::value::Value;
    use crate::types::{self, quoted};

    fn bool_lambda() -> Expression {
        expr::lambda([TypeShape::Int32], TypeShape::Bool, |_| Ok(Value::Bool(true))).into()
    }

    #[test]
    fn quoted_lambda_round_trips_to_parameter_shape() {
        let param = types::func([TypeShape::Int32], TypeShape::Bool);
        let arg = expr::quote(bool_lambda());

        let normalized = normalize_argument(&param, arg);
        assert_eq!(param, normalized.result_shape());
    }

    #[test]
    fn double_quoting_unwraps_fully() {
        let param = types::func([TypeShape::Int32], TypeShape::Bool);
        let arg = expr::quote(expr::quote(bool_lambda()));

        let normalized = normalize_argument(&param, arg);
        assert_eq!(param, normalized.result_shape());
    }

    #[test]
    fn already_assignable_argument_untouched() {
        let param = types::quoted(types::func([TypeShape::Int32], TypeShape::Bool));
        let arg = expr::quote(bool_lambda());

        let normalized = normalize_argument(&param, arg.clone());
        assert_eq!(arg, normalized);
    }

    #[test]
    fn array_of_quoted_lambdas_rebuilt_per_element() {
        let func_shape = types::func([TypeShape::Int32], TypeShape::Bool);
        let param = types::array(func_shape.clone());
        let arg = expr::array_literal(
            quoted(func_shape.clone()),
            [expr::quote(bool_lambda()), expr::quote(bool_lambda())],
        );

        let normalized = normalize_argument(&param, arg);
        assert_eq!(param, normalized.result_shape());

        match normalized {
            Expression::ArrayLiteral(array) => {
                assert_eq!(2, array.elements.len());
                for element in &array.elements {
                    assert_eq!(func_shape, element.result_shape());
                }
            }
            other => panic!("expected array literal, got {other}"),
        }
    }

    #[test]
    fn byref_parameter_compared_by_inner_shape() {
        let param = types::byref(types::func([TypeShape::Int32], TypeShape::Bool));
        let arg = expr::quote(bool_lambda());

        let normalized = normalize_argument(&param, arg);
        assert_eq!(
            types::func([TypeShape::Int32], TypeShape::Bool),
            normalized.result_shape(),
        );
    }
}
