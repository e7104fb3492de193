use std::fmt;
use std::sync::Arc;

use futures::FutureExt;
use futures::TryStreamExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use symq_error::{Result, SymqError};
use tracing::debug;

use super::compile;
use crate::expr::{self, Expression};
use crate::rewrite::Rewriter;
use crate::runtime::cancel::CancelToken;
use crate::runtime::sequence::{Sequence, ValueStream};
use crate::runtime::value::Value;
use crate::types::TypeShape;

/// A composed, unexecuted query.
///
/// Pairs a symbolic node with its element shape. The first enumeration
/// rewrites, compiles, and runs the graph; the produced sequence is cached
/// for the handle's lifetime and every later enumeration opens an
/// independent cursor over it.
///
/// Cloning shares the handle, including the materialization cache.
#[derive(Debug, Clone)]
pub struct DeferredQuery {
    inner: Arc<QueryInner>,
}

#[derive(Debug)]
struct QueryInner {
    node: Expression,
    element: TypeShape,
    materialized: Mutex<Option<Sequence>>,
}

impl DeferredQuery {
    /// Create a handle over a composed symbolic node.
    pub fn from_node(node: Expression, element: TypeShape) -> Self {
        DeferredQuery {
            inner: Arc::new(QueryInner {
                node,
                element,
                materialized: Mutex::new(None),
            }),
        }
    }

    /// Wrap an existing concrete sequence.
    ///
    /// The node is a constant of the sequence and the materialization cache
    /// is pre-populated, so enumerating never recomputes anything.
    pub fn wrap(sequence: Sequence) -> Self {
        let element = sequence.element_shape();
        let node = expr::constant(Value::Seq(sequence.clone()), sequence.shape());
        DeferredQuery {
            inner: Arc::new(QueryInner {
                node,
                element,
                materialized: Mutex::new(Some(sequence)),
            }),
        }
    }

    /// Wrap already-realized values as a query source.
    pub fn from_values(element: TypeShape, values: Vec<Value>) -> Self {
        Self::wrap(Sequence::from_values(element, values))
    }

    /// The symbolic node this handle was composed from.
    pub fn node(&self) -> &Expression {
        &self.inner.node
    }

    pub fn element_shape(&self) -> &TypeShape {
        &self.inner.element
    }

    /// The cached concrete sequence, if this handle has been enumerated.
    pub fn materialized(&self) -> Option<Sequence> {
        self.inner.materialized.lock().clone()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Open a cursor over the query's results, materializing on first use.
    pub fn enumerate(&self, cancel: &CancelToken) -> Result<ValueStream> {
        let sequence = self.materialize()?;
        Ok(sequence.cursor(cancel))
    }

    /// Enumerate and collect all elements.
    pub async fn collect(&self, cancel: &CancelToken) -> Result<Vec<Value>> {
        self.enumerate(cancel)?.try_collect().await
    }

    fn materialize(&self) -> Result<Sequence> {
        if let Some(sequence) = self.materialized() {
            return Ok(sequence);
        }

        debug!(element = %self.inner.element, "materializing deferred query");
        let rewritten = Rewriter::builtin().rewrite(self.inner.node.clone())?;
        let sequence = compile::compile_sequence(&rewritten)?;

        // First writer wins; materialization is deterministic for a given
        // graph, so a losing race produced an equivalent sequence.
        let mut slot = self.inner.materialized.lock();
        Ok(slot.get_or_insert(sequence).clone())
    }
}

impl PartialEq for DeferredQuery {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Display for DeferredQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Unmaterialized handles render their symbolic graph; materialized
        // ones delegate to the sequence's own rendering.
        match self.materialized() {
            Some(sequence) => write!(f, "{sequence}"),
            None => write!(f, "{}", self.inner.node),
        }
    }
}

/// Compiled entry point for the execution form. Each invocation re-runs the
/// rewritten computation.
pub type CompiledExec = Arc<dyn Fn(CancelToken) -> BoxFuture<'static, Result<Value>> + Send + Sync>;

/// The execution form of a terminal operator call.
///
/// Rewriting and compilation happen once, on first run, and the compiled
/// callable is cached. The result is not cached: running again re-executes
/// the rewritten computation with the new cancellation token.
pub struct ExecutableQuery {
    expr: Expression,
    result: TypeShape,
    compiled: Mutex<Option<CompiledExec>>,
}

impl ExecutableQuery {
    /// Create an execution form for a terminal call expression whose
    /// rewritten shape must be `task<result>`.
    pub fn new(expr: Expression, result: TypeShape) -> Self {
        ExecutableQuery {
            expr,
            result,
            compiled: Mutex::new(None),
        }
    }

    pub fn expression(&self) -> &Expression {
        &self.expr
    }

    pub fn result_shape(&self) -> &TypeShape {
        &self.result
    }

    /// Run the terminal computation.
    pub async fn run(&self, cancel: &CancelToken) -> Result<Value> {
        let exec = self.compiled_callable()?;
        exec(cancel.clone()).await
    }

    fn compiled_callable(&self) -> Result<CompiledExec> {
        {
            let compiled = self.compiled.lock();
            if let Some(exec) = compiled.as_ref() {
                return Ok(exec.clone());
            }
        }

        debug!(result = %self.result, "compiling terminal query");
        let rewritten = Rewriter::builtin().rewrite(self.expr.clone())?;

        // Contract check before compilation: the rewritten expression must
        // produce a task whose value fits the requested result shape.
        let produced = match rewritten.result_shape() {
            TypeShape::Task(inner) => *inner,
            other => {
                return Err(SymqError::new(format!(
                    "Rewritten terminal expression has non-task shape {other}"
                )));
            }
        };
        if !self.result.is_assignable_from(&produced) {
            return Err(SymqError::new(format!(
                "Requested result shape {} cannot be assigned from rewritten result {produced}",
                self.result
            )));
        }

        let exec: CompiledExec = Arc::new(move |cancel| {
            let rewritten = rewritten.clone();
            async move {
                match compile::evaluate(&rewritten)? {
                    Value::Task(thunk) => thunk.invoke(cancel).await,
                    other => Err(SymqError::new(format!(
                        "Expected a task from terminal operator, got {other}"
                    ))),
                }
            }
            .boxed()
        });

        let mut compiled = self.compiled.lock();
        Ok(compiled.get_or_insert(exec).clone())
    }
}

impl fmt::Debug for ExecutableQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutableQuery")
            .field("expr", &self.expr)
            .field("result", &self.result)
            .field("compiled", &self.compiled.lock().is_some())
            .finish()
    }
}

impl fmt::Display for ExecutableQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)
    }
}
