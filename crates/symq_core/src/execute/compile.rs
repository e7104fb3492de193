use symq_error::{Result, SymqError};

use crate::expr::{CallTarget, Expression};
use crate::operators::OperatorImpl;
use crate::runtime::sequence::Sequence;
use crate::runtime::value::{TaskThunk, Value};

/// Fold a fully rewritten graph into a runtime value.
///
/// Sequence operators build their (lazy) result sequence immediately;
/// terminal operators become task thunks that run when invoked with a
/// cancellation token. Declarative calls, free variables, and embedded query
/// handles must not survive rewriting, and hitting one here is an internal
/// error.
pub fn evaluate(expr: &Expression) -> Result<Value> {
    match expr {
        Expression::Constant(constant) => match &constant.value {
            Value::Query(query) => Err(SymqError::new(format!(
                "Query handle constant survived rewriting: {query}"
            ))),
            other => Ok(other.clone()),
        },
        Expression::Call(call) => {
            let resolved = match &call.target {
                CallTarget::Resolved(resolved) => resolved,
                CallTarget::Declared(op) => {
                    return Err(SymqError::new(format!(
                        "Declarative call to '{}' survived rewriting",
                        op.name
                    )));
                }
            };

            let inputs = call
                .input_nodes()
                .into_iter()
                .map(evaluate)
                .collect::<Result<Vec<_>>>()?;

            match resolved.implementation {
                OperatorImpl::Sequence(f) => f(resolved, inputs),
                OperatorImpl::Terminal(f) => {
                    let resolved = resolved.clone();
                    Ok(Value::Task(TaskThunk::new(move |cancel| {
                        f(&resolved, inputs.clone(), cancel)
                    })))
                }
            }
        }
        Expression::Lambda(lambda) => Ok(Value::Func(lambda.body.clone())),
        // A quote remaining at execution degrades to its operand; concrete
        // operators only ever receive the executable representation.
        Expression::Quote(quote) => evaluate(&quote.operand),
        Expression::Variable(variable) => Err(SymqError::new(format!(
            "Free variable '{}' in compiled graph",
            variable.name
        ))),
        Expression::ArrayLiteral(array) => {
            let elements = array
                .elements
                .iter()
                .map(evaluate)
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::Array(elements))
        }
    }
}

/// Compile the enumeration form: produce the concrete sequence for a
/// rewritten producer expression.
pub fn compile_sequence(expr: &Expression) -> Result<Sequence> {
    evaluate(expr)?.into_sequence()
}
