use std::fmt;
use std::sync::Arc;

use futures::StreamExt;
use futures::stream::{self, BoxStream};
use symq_error::{Result, SymqError};

use super::cancel::CancelToken;
use super::value::Value;
use crate::types::{self, TypeShape};

/// Cursor over a sequence. Yields elements until exhausted, cancelled, or an
/// error is produced; nothing is yielded past the first error.
pub type ValueStream = BoxStream<'static, Result<Value>>;

/// Source of elements backing a [`Sequence`].
///
/// Opening a source produces a fresh, independent stream; sources must be
/// re-openable so a cached sequence can be enumerated repeatedly.
pub trait SequenceSource: fmt::Debug + Send + Sync {
    /// Shape of the elements this source yields.
    fn element_shape(&self) -> TypeShape;

    /// Open a new stream over the elements.
    fn open(&self, cancel: CancelToken) -> ValueStream;

    /// Human-readable rendering of the source.
    fn describe(&self) -> String {
        format!("seq<{}>", self.element_shape())
    }
}

/// A concrete, re-enumerable sequence of values.
///
/// Cloning is cheap and shares the source. Two clones of the same sequence
/// compare pointer-equal, which is what the materialization cache relies on.
#[derive(Debug, Clone)]
pub struct Sequence {
    source: Arc<dyn SequenceSource>,
}

impl Sequence {
    pub fn new(source: impl SequenceSource + 'static) -> Self {
        Sequence {
            source: Arc::new(source),
        }
    }

    /// Create a sequence over already-realized values.
    pub fn from_values(element: TypeShape, values: Vec<Value>) -> Self {
        Sequence::new(ValuesSource { element, values })
    }

    pub fn element_shape(&self) -> TypeShape {
        self.source.element_shape()
    }

    /// The most specific publicly nameable shape of this sequence.
    pub fn shape(&self) -> TypeShape {
        types::seq(self.element_shape())
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.source, &other.source)
    }

    /// Open an independent cursor over the sequence.
    ///
    /// A token cancelled before the first step yields an immediately
    /// cancelled cursor; otherwise the token is re-checked between elements.
    pub fn cursor(&self, cancel: &CancelToken) -> ValueStream {
        if cancel.is_cancelled() {
            return stream::once(async { Err(cancelled_error()) }).boxed();
        }

        let cancel = cancel.clone();
        let inner = self.source.open(cancel.clone());

        stream::unfold(
            (inner, cancel, false),
            |(mut inner, cancel, done)| async move {
                if done {
                    return None;
                }
                if cancel.is_cancelled() {
                    return Some((Err(cancelled_error()), (inner, cancel, true)));
                }
                match inner.next().await {
                    Some(item) => {
                        let done = item.is_err();
                        Some((item, (inner, cancel, done)))
                    }
                    None => None,
                }
            },
        )
        .boxed()
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source.describe())
    }
}

fn cancelled_error() -> SymqError {
    SymqError::new("Enumeration cancelled")
}

#[derive(Debug)]
struct ValuesSource {
    element: TypeShape,
    values: Vec<Value>,
}

impl SequenceSource for ValuesSource {
    fn element_shape(&self) -> TypeShape {
        self.element.clone()
    }

    fn open(&self, _cancel: CancelToken) -> ValueStream {
        stream::iter(self.values.clone().into_iter().map(Ok)).boxed()
    }

    fn describe(&self) -> String {
        let rendered: Vec<_> = self.values.iter().map(|v| v.to_string()).collect();
        format!("seq<{}>[{}]", self.element, rendered.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt;
    use futures::executor::block_on;

    use super::*;

    fn int_seq(values: impl IntoIterator<Item = i32>) -> Sequence {
        Sequence::from_values(
            TypeShape::Int32,
            values.into_iter().map(Value::Int32).collect(),
        )
    }

    #[test]
    fn cursors_are_independent() {
        let seq = int_seq([1, 2, 3]);
        let cancel = CancelToken::new();

        let first: Vec<_> = block_on(seq.cursor(&cancel).try_collect()).unwrap();
        let second: Vec<_> = block_on(seq.cursor(&cancel).try_collect()).unwrap();

        assert_eq!(first, second);
        assert_eq!(vec![Value::Int32(1), Value::Int32(2), Value::Int32(3)], first);
    }

    #[test]
    fn pre_cancelled_cursor_errors_immediately() {
        let seq = int_seq([1, 2, 3]);
        let cancel = CancelToken::new();
        cancel.cancel();

        let result: Result<Vec<_>> = block_on(seq.cursor(&cancel).try_collect());
        assert!(result.is_err());
    }

    #[test]
    fn cancel_between_elements_stops_cursor() {
        let seq = int_seq([1, 2, 3]);
        let cancel = CancelToken::new();

        block_on(async {
            let mut cursor = seq.cursor(&cancel);
            let first = cursor.try_next().await.unwrap();
            assert_eq!(Some(Value::Int32(1)), first);

            cancel.cancel();
            let next = cursor.try_next().await;
            assert!(next.is_err());

            // Nothing yielded past the error.
            let after = cursor.try_next().await.unwrap();
            assert_eq!(None, after);
        });
    }
}
