use std::fmt;

/// Static type of a symbolic node or operator parameter.
///
/// Every node in a symbolic graph carries one of these, and applicability
/// checks during resolution compare them structurally. There is intentionally
/// no implicit numeric conversion anywhere; overload families over numeric
/// element types are distinguished purely by exact shape equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeShape {
    Bool,
    Int32,
    Int64,
    Float64,
    Utf8,

    /// A value of the inner shape that may also be null.
    Nullable(Box<TypeShape>),

    /// Concrete asynchronous sequence of elements.
    Seq(Box<TypeShape>),

    /// Declarative (symbolic) sequence of elements.
    ///
    /// Assignable to `Seq` of the same element, never the reverse.
    Query(Box<TypeShape>),

    /// Keyed grouping of elements. A grouping is itself enumerable, so it's
    /// assignable to `Seq` of its element shape.
    Grouping {
        key: Box<TypeShape>,
        element: Box<TypeShape>,
    },

    /// Opaque callable shape. Compared exactly, parameters and return.
    Func {
        params: Vec<TypeShape>,
        ret: Box<TypeShape>,
    },

    /// Quoted (inspectable) wrapper around a function shape.
    Quoted(Box<TypeShape>),

    /// Array of elements.
    Array(Box<TypeShape>),

    /// Asynchronous result, produced by terminal operators.
    Task(Box<TypeShape>),

    /// By-reference parameter shape. Only valid on the parameter side of an
    /// operator descriptor; argument nodes never carry it.
    ByRef(Box<TypeShape>),

    /// Unbound type parameter within an operator descriptor, closed by
    /// substitution when the descriptor is matched.
    Generic(usize),
}

impl TypeShape {
    /// Check if a value of shape `arg` can be used where `self` is expected.
    ///
    /// Assignability is reflexive and otherwise limited to the declarative
    /// and grouping widenings into concrete sequences. Sequence elements are
    /// covariant.
    pub fn is_assignable_from(&self, arg: &TypeShape) -> bool {
        if self == arg {
            return true;
        }

        match (self, arg) {
            (TypeShape::Seq(want), TypeShape::Seq(have)) => want.is_assignable_from(have),
            (TypeShape::Seq(want), TypeShape::Query(have)) => want.is_assignable_from(have),
            (TypeShape::Seq(want), TypeShape::Grouping { element, .. }) => {
                want.is_assignable_from(element)
            }
            _ => false,
        }
    }

    /// Substitute generic parameters with the given type arguments, closing
    /// the shape.
    ///
    /// Generic indices without a corresponding argument are left as-is; the
    /// matcher checks arity before substituting.
    pub fn substitute(&self, type_args: &[TypeShape]) -> TypeShape {
        match self {
            TypeShape::Generic(idx) => match type_args.get(*idx) {
                Some(shape) => shape.clone(),
                None => self.clone(),
            },
            TypeShape::Nullable(inner) => nullable(inner.substitute(type_args)),
            TypeShape::Seq(inner) => seq(inner.substitute(type_args)),
            TypeShape::Query(inner) => query(inner.substitute(type_args)),
            TypeShape::Grouping { key, element } => grouping(
                key.substitute(type_args),
                element.substitute(type_args),
            ),
            TypeShape::Func { params, ret } => TypeShape::Func {
                params: params.iter().map(|p| p.substitute(type_args)).collect(),
                ret: Box::new(ret.substitute(type_args)),
            },
            TypeShape::Quoted(inner) => quoted(inner.substitute(type_args)),
            TypeShape::Array(inner) => array(inner.substitute(type_args)),
            TypeShape::Task(inner) => task(inner.substitute(type_args)),
            TypeShape::ByRef(inner) => byref(inner.substitute(type_args)),
            other => other.clone(),
        }
    }

    /// Get the element shape if this is a sequence-like shape.
    pub fn sequence_element(&self) -> Option<&TypeShape> {
        match self {
            TypeShape::Seq(inner) | TypeShape::Query(inner) => Some(inner),
            TypeShape::Grouping { element, .. } => Some(element),
            _ => None,
        }
    }

    /// Strip the by-reference wrapper if present.
    pub fn deref_shape(&self) -> &TypeShape {
        match self {
            TypeShape::ByRef(inner) => inner,
            other => other,
        }
    }
}

pub fn nullable(inner: TypeShape) -> TypeShape {
    TypeShape::Nullable(Box::new(inner))
}

pub fn seq(element: TypeShape) -> TypeShape {
    TypeShape::Seq(Box::new(element))
}

pub fn query(element: TypeShape) -> TypeShape {
    TypeShape::Query(Box::new(element))
}

pub fn grouping(key: TypeShape, element: TypeShape) -> TypeShape {
    TypeShape::Grouping {
        key: Box::new(key),
        element: Box::new(element),
    }
}

pub fn func(params: impl IntoIterator<Item = TypeShape>, ret: TypeShape) -> TypeShape {
    TypeShape::Func {
        params: params.into_iter().collect(),
        ret: Box::new(ret),
    }
}

pub fn quoted(inner: TypeShape) -> TypeShape {
    TypeShape::Quoted(Box::new(inner))
}

pub fn array(element: TypeShape) -> TypeShape {
    TypeShape::Array(Box::new(element))
}

pub fn task(inner: TypeShape) -> TypeShape {
    TypeShape::Task(Box::new(inner))
}

pub fn byref(inner: TypeShape) -> TypeShape {
    TypeShape::ByRef(Box::new(inner))
}

pub fn generic(idx: usize) -> TypeShape {
    TypeShape::Generic(idx)
}

impl fmt::Display for TypeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeShape::Bool => write!(f, "bool"),
            TypeShape::Int32 => write!(f, "int32"),
            TypeShape::Int64 => write!(f, "int64"),
            TypeShape::Float64 => write!(f, "float64"),
            TypeShape::Utf8 => write!(f, "utf8"),
            TypeShape::Nullable(inner) => write!(f, "{inner}?"),
            TypeShape::Seq(inner) => write!(f, "seq<{inner}>"),
            TypeShape::Query(inner) => write!(f, "query<{inner}>"),
            TypeShape::Grouping { key, element } => write!(f, "grouping<{key}, {element}>"),
            TypeShape::Func { params, ret } => {
                write!(f, "fn(")?;
                for (idx, param) in params.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{param}")?;
                }
                write!(f, ") -> {ret}")
            }
            TypeShape::Quoted(inner) => write!(f, "quoted<{inner}>"),
            TypeShape::Array(inner) => write!(f, "array<{inner}>"),
            TypeShape::Task(inner) => write!(f, "task<{inner}>"),
            TypeShape::ByRef(inner) => write!(f, "ref {inner}"),
            TypeShape::Generic(idx) => write!(f, "T{idx}"),
        }
    }
}
