use std::fmt;

use futures::StreamExt;
use futures::stream::{self};
use futures::TryStreamExt;
use symq_error::{Result, SymqError};

use crate::operators::ResolvedOperator;
use crate::runtime::cancel::CancelToken;
use crate::runtime::sequence::{Sequence, SequenceSource, ValueStream};
use crate::runtime::value::{GroupValue, LambdaFn, Value};
use crate::types::{self, TypeShape};

/// `select<T, R>(seq<T>, fn(T) -> R) -> seq<R>`
pub fn select(op: &ResolvedOperator, inputs: Vec<Value>) -> Result<Value> {
    let (source, projection) = sequence_and_func(inputs)?;
    let element = result_element(op)?;
    Ok(Value::Seq(Sequence::new(SelectSource {
        input: source,
        projection,
        element,
    })))
}

/// `where<T>(seq<T>, fn(T) -> bool) -> seq<T>`
pub fn filter(_op: &ResolvedOperator, inputs: Vec<Value>) -> Result<Value> {
    let (source, predicate) = sequence_and_func(inputs)?;
    Ok(Value::Seq(Sequence::new(FilterSource {
        input: source,
        predicate,
    })))
}

/// `concat<T>(seq<T>, seq<T>) -> seq<T>`
pub fn concat(_op: &ResolvedOperator, inputs: Vec<Value>) -> Result<Value> {
    let mut inputs = inputs.into_iter();
    let first = next_input(&mut inputs, "concat")?.into_sequence()?;
    let second = next_input(&mut inputs, "concat")?.into_sequence()?;
    Ok(Value::Seq(Sequence::new(ConcatSource { first, second })))
}

/// `group_by<T, K>(seq<T>, fn(T) -> K) -> seq<grouping<K, T>>`
pub fn group_by(op: &ResolvedOperator, inputs: Vec<Value>) -> Result<Value> {
    let (source, key_fn) = sequence_and_func(inputs)?;
    let group_shape = result_element(op)?;
    let (key_shape, element) = match &group_shape {
        TypeShape::Grouping { key, element } => ((**key).clone(), (**element).clone()),
        other => {
            return Err(SymqError::new(format!(
                "Expected a grouping result shape for group_by, got {other}"
            )));
        }
    };
    Ok(Value::Seq(Sequence::new(GroupBySource {
        input: source,
        key_fn,
        key_shape,
        element,
    })))
}

fn next_input(inputs: &mut impl Iterator<Item = Value>, operator: &str) -> Result<Value> {
    inputs
        .next()
        .ok_or_else(|| SymqError::new(format!("Missing input for operator '{operator}'")))
}

fn sequence_and_func(inputs: Vec<Value>) -> Result<(Sequence, LambdaFn)> {
    let mut inputs = inputs.into_iter();
    let source = next_input(&mut inputs, "sequence")?.into_sequence()?;
    let func = next_input(&mut inputs, "sequence")?.into_func()?;
    Ok((source, func))
}

fn result_element(op: &ResolvedOperator) -> Result<TypeShape> {
    op.result_element().cloned().ok_or_else(|| {
        SymqError::new(format!(
            "Operator '{}' resolved to non-sequence result shape {}",
            op.name, op.ret
        ))
    })
}

struct SelectSource {
    input: Sequence,
    projection: LambdaFn,
    element: TypeShape,
}

impl fmt::Debug for SelectSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectSource")
            .field("input", &self.input)
            .field("element", &self.element)
            .finish_non_exhaustive()
    }
}

impl SequenceSource for SelectSource {
    fn element_shape(&self) -> TypeShape {
        self.element.clone()
    }

    fn open(&self, cancel: CancelToken) -> ValueStream {
        let projection = self.projection.clone();
        self.input
            .cursor(&cancel)
            .map(move |item| item.and_then(|value| (projection)(&[value])))
            .boxed()
    }

    fn describe(&self) -> String {
        format!("select({})", self.input)
    }
}

struct FilterSource {
    input: Sequence,
    predicate: LambdaFn,
}

impl fmt::Debug for FilterSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterSource")
            .field("input", &self.input)
            .finish_non_exhaustive()
    }
}

impl SequenceSource for FilterSource {
    fn element_shape(&self) -> TypeShape {
        self.input.element_shape()
    }

    fn open(&self, cancel: CancelToken) -> ValueStream {
        let predicate = self.predicate.clone();
        self.input
            .cursor(&cancel)
            .filter_map(move |item| {
                let out = match item {
                    Ok(value) => {
                        match (predicate)(&[value.clone()]).and_then(|keep| keep.try_as_bool()) {
                            Ok(true) => Some(Ok(value)),
                            Ok(false) => None,
                            Err(e) => Some(Err(e)),
                        }
                    }
                    Err(e) => Some(Err(e)),
                };
                async move { out }
            })
            .boxed()
    }

    fn describe(&self) -> String {
        format!("where({})", self.input)
    }
}

#[derive(Debug)]
struct ConcatSource {
    first: Sequence,
    second: Sequence,
}

impl SequenceSource for ConcatSource {
    fn element_shape(&self) -> TypeShape {
        self.first.element_shape()
    }

    fn open(&self, cancel: CancelToken) -> ValueStream {
        self.first
            .cursor(&cancel)
            .chain(self.second.cursor(&cancel))
            .boxed()
    }

    fn describe(&self) -> String {
        format!("concat({}, {})", self.first, self.second)
    }
}

struct GroupBySource {
    input: Sequence,
    key_fn: LambdaFn,
    key_shape: TypeShape,
    element: TypeShape,
}

impl fmt::Debug for GroupBySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupBySource")
            .field("input", &self.input)
            .field("key_shape", &self.key_shape)
            .field("element", &self.element)
            .finish_non_exhaustive()
    }
}

impl SequenceSource for GroupBySource {
    fn element_shape(&self) -> TypeShape {
        types::grouping(self.key_shape.clone(), self.element.clone())
    }

    fn open(&self, cancel: CancelToken) -> ValueStream {
        let input = self.input.clone();
        let key_fn = self.key_fn.clone();
        let element = self.element.clone();

        // Grouping requires the whole input; collect on first poll, then
        // stream the groups.
        let groups = async move {
            let mut cursor = input.cursor(&cancel);
            let mut groups: Vec<(Value, Vec<Value>)> = Vec::new();
            while let Some(item) = cursor.next().await {
                let value = item?;
                let key = (key_fn)(&[value.clone()])?;
                match groups.iter_mut().find(|(k, _)| *k == key) {
                    Some((_, members)) => members.push(value),
                    None => groups.push((key, vec![value])),
                }
            }

            let out: Vec<Result<Value>> = groups
                .into_iter()
                .map(|(key, members)| {
                    Ok(Value::Group(GroupValue {
                        key: Box::new(key),
                        values: Sequence::from_values(element.clone(), members),
                    }))
                })
                .collect();

            Ok(stream::iter(out))
        };

        stream::once(groups).try_flatten().boxed()
    }

    fn describe(&self) -> String {
        format!("group_by({})", self.input)
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;

    fn int_seq(values: impl IntoIterator<Item = i32>) -> Sequence {
        Sequence::from_values(
            TypeShape::Int32,
            values.into_iter().map(Value::Int32).collect(),
        )
    }

    fn collect(seq: &Sequence) -> Vec<Value> {
        let cancel = CancelToken::new();
        block_on(seq.cursor(&cancel).try_collect()).unwrap()
    }

    #[test]
    fn group_by_preserves_first_seen_key_order() {
        let source = int_seq([1, 2, 3, 4, 5, 6]);
        let key_fn: LambdaFn = std::sync::Arc::new(|args| match &args[0] {
            Value::Int32(v) => Ok(Value::Int32(v % 2)),
            other => Err(SymqError::new(format!("unexpected element {other}"))),
        });

        let seq = Sequence::new(GroupBySource {
            input: source,
            key_fn,
            key_shape: TypeShape::Int32,
            element: TypeShape::Int32,
        });

        let groups = collect(&seq);
        assert_eq!(2, groups.len());

        match &groups[0] {
            Value::Group(group) => {
                assert_eq!(Value::Int32(1), *group.key);
                assert_eq!(
                    vec![Value::Int32(1), Value::Int32(3), Value::Int32(5)],
                    collect(&group.values),
                );
            }
            other => panic!("expected group, got {other}"),
        }
    }

    #[test]
    fn concat_chains_in_order() {
        let seq = Sequence::new(ConcatSource {
            first: int_seq([1, 2]),
            second: int_seq([3]),
        });
        assert_eq!(
            vec![Value::Int32(1), Value::Int32(2), Value::Int32(3)],
            collect(&seq),
        );
    }
}
