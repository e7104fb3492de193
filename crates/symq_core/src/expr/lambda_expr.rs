use std::fmt;
use std::sync::Arc;

use symq_error::Result;

use crate::runtime::value::{LambdaFn, Value};
use crate::types::{self, TypeShape};

/// A function literal whose body is opaque to the rewriter.
///
/// The declarative and concrete operator surfaces are assumed compatible at
/// the lambda level, so rewriting never looks inside a body. Equality is by
/// shape plus body identity.
#[derive(Clone)]
pub struct LambdaExpr {
    pub params: Vec<TypeShape>,
    pub ret: TypeShape,
    pub body: LambdaFn,
}

impl LambdaExpr {
    pub fn new(
        params: Vec<TypeShape>,
        ret: TypeShape,
        body: impl Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        LambdaExpr {
            params,
            ret,
            body: Arc::new(body),
        }
    }

    pub fn shape(&self) -> TypeShape {
        types::func(self.params.iter().cloned(), self.ret.clone())
    }
}

impl fmt::Debug for LambdaExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LambdaExpr")
            .field("params", &self.params)
            .field("ret", &self.ret)
            .finish_non_exhaustive()
    }
}

impl PartialEq for LambdaExpr {
    fn eq(&self, other: &Self) -> bool {
        self.params == other.params && self.ret == other.ret && Arc::ptr_eq(&self.body, &other.body)
    }
}

impl fmt::Display for LambdaExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.shape())
    }
}
