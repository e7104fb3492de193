use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use symq_error::{Result, SymqError};

use super::cancel::CancelToken;
use super::sequence::Sequence;
use crate::execute::DeferredQuery;

/// Host closure backing an executable lambda.
pub type LambdaFn = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// Runtime value flowing through compiled graphs and concrete operators.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    Utf8(String),

    /// A concrete, re-enumerable sequence.
    Seq(Sequence),

    /// A keyed group of elements produced by a grouping operator.
    Group(GroupValue),

    /// An opaque executable function.
    Func(LambdaFn),

    Array(Vec<Value>),

    /// A deferred asynchronous result. Invoking the thunk runs the underlying
    /// computation; nothing is cached here.
    Task(TaskThunk),

    /// A deferred query handle embedded as a constant. The rewriter inlines
    /// or materializes these; they never survive into a compiled graph.
    Query(DeferredQuery),
}

impl Value {
    pub fn into_sequence(self) -> Result<Sequence> {
        match self {
            Value::Seq(seq) => Ok(seq),
            Value::Group(group) => Ok(group.values),
            other => Err(SymqError::new(format!(
                "Expected a sequence value, got {other}"
            ))),
        }
    }

    pub fn into_func(self) -> Result<LambdaFn> {
        match self {
            Value::Func(f) => Ok(f),
            other => Err(SymqError::new(format!(
                "Expected a function value, got {other}"
            ))),
        }
    }

    pub fn try_as_bool(&self) -> Result<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(SymqError::new(format!(
                "Expected a bool value, got {other}"
            ))),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Value::Int32(v) => f.debug_tuple("Int32").field(v).finish(),
            Value::Int64(v) => f.debug_tuple("Int64").field(v).finish(),
            Value::Float64(v) => f.debug_tuple("Float64").field(v).finish(),
            Value::Utf8(v) => f.debug_tuple("Utf8").field(v).finish(),
            Value::Seq(seq) => f.debug_tuple("Seq").field(seq).finish(),
            Value::Group(group) => f.debug_tuple("Group").field(group).finish(),
            Value::Func(_) => f.debug_struct("Func").finish_non_exhaustive(),
            Value::Array(elements) => f.debug_tuple("Array").field(elements).finish(),
            Value::Task(task) => f.debug_tuple("Task").field(task).finish(),
            Value::Query(query) => f.debug_tuple("Query").field(query).finish(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Float64(a), Value::Float64(b)) => a == b,
            (Value::Utf8(a), Value::Utf8(b)) => a == b,
            (Value::Seq(a), Value::Seq(b)) => a.ptr_eq(b),
            (Value::Group(a), Value::Group(b)) => a == b,
            (Value::Func(a), Value::Func(b)) => Arc::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Task(a), Value::Task(b)) => a.ptr_eq(b),
            (Value::Query(a), Value::Query(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Utf8(v) => write!(f, "'{v}'"),
            Value::Seq(seq) => write!(f, "{seq}"),
            Value::Group(group) => write!(f, "group({} => {})", group.key, group.values),
            Value::Func(_) => write!(f, "<fn>"),
            Value::Array(elements) => {
                write!(f, "[")?;
                for (idx, element) in elements.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{element}")?;
                }
                write!(f, "]")
            }
            Value::Task(_) => write!(f, "<task>"),
            Value::Query(query) => write!(f, "{query}"),
        }
    }
}

/// A single keyed group. Groups are the elements of the sequence a grouping
/// operator produces.
#[derive(Debug, Clone)]
pub struct GroupValue {
    pub key: Box<Value>,
    pub values: Sequence,
}

impl PartialEq for GroupValue {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.values.ptr_eq(&other.values)
    }
}

/// Deferred asynchronous computation. Each invocation re-runs the underlying
/// work with the supplied cancellation token.
#[derive(Clone)]
pub struct TaskThunk {
    run: Arc<dyn Fn(CancelToken) -> BoxFuture<'static, Result<Value>> + Send + Sync>,
}

impl TaskThunk {
    pub fn new(
        run: impl Fn(CancelToken) -> BoxFuture<'static, Result<Value>> + Send + Sync + 'static,
    ) -> Self {
        TaskThunk { run: Arc::new(run) }
    }

    pub fn invoke(&self, cancel: CancelToken) -> BoxFuture<'static, Result<Value>> {
        (self.run)(cancel)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.run, &other.run)
    }
}

impl fmt::Debug for TaskThunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskThunk").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_renders_opaque_variants() {
        let func: Value = Value::Func(Arc::new(|_| Ok(Value::Null)));
        assert_eq!("Func { .. }", format!("{func:?}"));

        let task = Value::Task(TaskThunk::new(|_| Box::pin(async { Ok(Value::Null) })));
        assert_eq!("Task(TaskThunk { .. })", format!("{task:?}"));

        let got = format!("{:?}", Value::Array(vec![Value::Int32(3), Value::Null]));
        assert_eq!("Array([Int32(3), Null])", got);
    }
}
