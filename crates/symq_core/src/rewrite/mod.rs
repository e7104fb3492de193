pub mod normalize;

use normalize::normalize_argument;
use symq_error::{Result, SymqError};
use tracing::debug;

use crate::expr::{self, CallExpr, CallTarget, ConstantExpr, Expression};
use crate::operators::surface::{BUILTIN_REGISTRY, SEQUENCE_SURFACE, SurfaceRegistry};
use crate::operators::{ResolvedOperator, matcher};
use crate::runtime::value::Value;

/// Depth-first tree transformer turning declarative call graphs into
/// concrete, directly-invocable ones.
///
/// Owns no state beyond a reference to the surface registry; a rewrite is a
/// single synchronous pass with no suspension points.
#[derive(Debug, Clone, Copy)]
pub struct Rewriter<'a> {
    registry: &'a SurfaceRegistry,
}

impl Rewriter<'static> {
    /// Rewriter over the process-wide builtin registry.
    pub fn builtin() -> Self {
        Rewriter {
            registry: &BUILTIN_REGISTRY,
        }
    }
}

impl<'a> Rewriter<'a> {
    pub fn new(registry: &'a SurfaceRegistry) -> Self {
        Rewriter { registry }
    }

    /// Rewrite a symbolic node to a concrete one.
    ///
    /// Rewriting an already-concrete graph returns a structurally identical
    /// graph.
    pub fn rewrite(&self, expr: Expression) -> Result<Expression> {
        match expr {
            Expression::Constant(constant) => self.rewrite_constant(constant),
            Expression::Call(call) => self.rewrite_call(call),
            Expression::ArrayLiteral(array) => {
                let elements = array
                    .elements
                    .into_iter()
                    .map(|element| self.rewrite(element))
                    .collect::<Result<Vec<_>>>()?;
                Ok(expr::array_literal(array.element, elements))
            }
            // Lambda bodies are opaque and the surfaces are assumed
            // compatible at the lambda level; free variables pass through.
            other @ (Expression::Lambda(_) | Expression::Quote(_) | Expression::Variable(_)) => {
                Ok(other)
            }
        }
    }

    fn rewrite_constant(&self, constant: ConstantExpr) -> Result<Expression> {
        match &constant.value {
            Value::Query(query) => match query.materialized() {
                // Already materialized: re-enter the graph as a constant of
                // the sequence's most specific publicly nameable shape.
                Some(seq) => {
                    let shape = seq.shape();
                    debug!(%shape, "replacing materialized query handle with sequence constant");
                    Ok(expr::constant(Value::Seq(seq), shape))
                }
                // Unmaterialized nested query: inline its own (recursively
                // rewritten) node.
                None => {
                    debug!("inlining unmaterialized nested query");
                    self.rewrite(query.node().clone())
                }
            },
            _ => Ok(constant.into()),
        }
    }

    fn rewrite_call(&self, call: CallExpr) -> Result<Expression> {
        let CallExpr {
            target,
            receiver,
            args,
        } = call;

        let mut changed = false;

        let receiver = match receiver {
            Some(receiver) => {
                let rewritten = self.rewrite((*receiver).clone())?;
                changed |= rewritten != *receiver;
                Some(Box::new(rewritten))
            }
            None => None,
        };

        let args = args
            .into_iter()
            .map(|arg| {
                let rewritten = self.rewrite(arg.clone())?;
                changed |= rewritten != arg;
                Ok(rewritten)
            })
            .collect::<Result<Vec<_>>>()?;

        let call = CallExpr {
            target,
            receiver,
            args,
        };

        // Fast path: nothing changed underneath and the call is already
        // concrete and still type-checks. Returning it unchanged is an
        // optimization; resolution below would produce an equivalent call.
        if !changed {
            if let CallTarget::Resolved(resolved) = &call.target {
                if still_applicable(resolved, &call.input_nodes()) {
                    return Ok(call.into());
                }
            }
        }

        self.resolve_call(call)
    }

    fn resolve_call(&self, call: CallExpr) -> Result<Expression> {
        let (surface, name, type_args) = match &call.target {
            CallTarget::Declared(op) => (op.surface, op.name.clone(), op.type_args.clone()),
            // A concrete call that no longer type-checks is retried directly
            // against the concrete surface.
            CallTarget::Resolved(op) => (SEQUENCE_SURFACE, op.name.clone(), op.type_args.clone()),
        };

        let table = self.registry.implementation_table(surface).ok_or_else(|| {
            SymqError::new(format!(
                "Unable to resolve call to '{name}': no implementation surface registered for '{surface}'"
            ))
        })?;

        let inputs = call.input_nodes();
        let resolved = matcher::find_first_match(table.candidates(&name), &inputs, &type_args)
            .ok_or_else(|| {
                SymqError::new(format!(
                    "No operator '{name}' on surface '{surface}' accepts the given argument shapes"
                ))
            })?;
        drop(inputs);

        debug!(%name, surface, "resolved call against concrete surface");

        let had_receiver = call.receiver.is_some();
        let inputs: Vec<Expression> = call
            .receiver
            .map(|r| *r)
            .into_iter()
            .chain(call.args)
            .collect();

        // Parameter and input counts agree; the matcher checked arity.
        let mut normalized = resolved
            .params
            .iter()
            .zip(inputs)
            .map(|(param, input)| normalize_argument(param, input))
            .collect::<Vec<_>>()
            .into_iter();

        let receiver = if had_receiver {
            normalized.next().map(Box::new)
        } else {
            None
        };
        let args = normalized.collect();

        Ok(CallExpr {
            target: CallTarget::Resolved(resolved),
            receiver,
            args,
        }
        .into())
    }
}

fn still_applicable(resolved: &ResolvedOperator, inputs: &[&Expression]) -> bool {
    resolved.params.len() == inputs.len()
        && resolved
            .params
            .iter()
            .zip(inputs.iter())
            .all(|(param, node)| {
                param
                    .deref_shape()
                    .is_assignable_from(&node.result_shape())
            })
}
