pub mod builtin;
pub mod matcher;
pub mod surface;

use futures::future::BoxFuture;
use symq_error::Result;

use crate::runtime::cancel::CancelToken;
use crate::runtime::value::Value;
use crate::types::TypeShape;

/// Describes one concrete operator implementation.
///
/// Parameter shapes may contain `Generic` placeholders (closed by the
/// matcher from explicit type arguments) and `ByRef` wrappers (compared by
/// their referenced shape). The receiver, when an operator takes one, is the
/// first parameter.
#[derive(Debug, Clone)]
pub struct OperatorDescriptor {
    pub name: &'static str,

    /// Names of the generic parameters. Empty for non-generic operators.
    pub generic_params: &'static [&'static str],

    pub params: Vec<TypeShape>,
    pub ret: TypeShape,
    pub implementation: OperatorImpl,
}

impl OperatorDescriptor {
    pub fn sequence(
        name: &'static str,
        generic_params: &'static [&'static str],
        params: Vec<TypeShape>,
        ret: TypeShape,
        implementation: SequenceFn,
    ) -> Self {
        OperatorDescriptor {
            name,
            generic_params,
            params,
            ret,
            implementation: OperatorImpl::Sequence(implementation),
        }
    }

    pub fn terminal(
        name: &'static str,
        generic_params: &'static [&'static str],
        params: Vec<TypeShape>,
        ret: TypeShape,
        implementation: TerminalFn,
    ) -> Self {
        OperatorDescriptor {
            name,
            generic_params,
            params,
            ret,
            implementation: OperatorImpl::Terminal(implementation),
        }
    }

    pub fn generic_arity(&self) -> usize {
        self.generic_params.len()
    }

    pub fn is_generic(&self) -> bool {
        !self.generic_params.is_empty()
    }
}

/// Synchronously builds the operator's result value, typically a lazy
/// sequence chained onto its inputs.
pub type SequenceFn = fn(&ResolvedOperator, Vec<Value>) -> Result<Value>;

/// Runs a terminal operator's asynchronous work against its inputs.
pub type TerminalFn =
    fn(&ResolvedOperator, Vec<Value>, CancelToken) -> BoxFuture<'static, Result<Value>>;

/// Concrete execution entry point of an operator.
#[derive(Debug, Clone, Copy)]
pub enum OperatorImpl {
    Sequence(SequenceFn),
    Terminal(TerminalFn),
}

/// A descriptor closed over concrete type arguments.
///
/// Produced fresh for every rewritten call site; the closed parameter list
/// is also what the quote normalizer adjusts arguments against.
#[derive(Debug, Clone)]
pub struct ResolvedOperator {
    pub name: String,

    /// Closed parameter shapes, receiver first when present.
    pub params: Vec<TypeShape>,

    /// Closed result shape.
    pub ret: TypeShape,

    /// Type arguments the descriptor was closed over. Empty for non-generic
    /// operators.
    pub type_args: Vec<TypeShape>,

    pub implementation: OperatorImpl,
}

impl ResolvedOperator {
    /// Element shape of the sequence this operator produces, if it produces
    /// one.
    pub fn result_element(&self) -> Option<&TypeShape> {
        self.ret.sequence_element()
    }
}

/// Two resolutions with the same name, shapes, and type arguments refer to
/// the same operator implementation.
impl PartialEq for ResolvedOperator {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.params == other.params
            && self.ret == other.ret
            && self.type_args == other.type_args
    }
}
