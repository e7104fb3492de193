use futures::StreamExt;
use futures::future::BoxFuture;
use symq_error::{Result, SymqError};

use crate::operators::ResolvedOperator;
use crate::runtime::cancel::CancelToken;
use crate::runtime::sequence::Sequence;
use crate::runtime::value::Value;

pub fn count(
    _op: &ResolvedOperator,
    inputs: Vec<Value>,
    cancel: CancelToken,
) -> BoxFuture<'static, Result<Value>> {
    Box::pin(async move {
        let source = one_sequence(inputs)?;
        let mut cursor = source.cursor(&cancel);
        let mut count = 0_i64;
        while let Some(item) = cursor.next().await {
            item?;
            count += 1;
        }
        Ok(Value::Int64(count))
    })
}

pub fn first(
    _op: &ResolvedOperator,
    inputs: Vec<Value>,
    cancel: CancelToken,
) -> BoxFuture<'static, Result<Value>> {
    Box::pin(async move {
        let source = one_sequence(inputs)?;
        let mut cursor = source.cursor(&cancel);
        match cursor.next().await {
            Some(item) => item,
            None => Err(empty_sequence()),
        }
    })
}

pub fn to_list(
    _op: &ResolvedOperator,
    inputs: Vec<Value>,
    cancel: CancelToken,
) -> BoxFuture<'static, Result<Value>> {
    Box::pin(async move {
        let source = one_sequence(inputs)?;
        let mut cursor = source.cursor(&cancel);
        let mut out = Vec::new();
        while let Some(item) = cursor.next().await {
            out.push(item?);
        }
        Ok(Value::Array(out))
    })
}

pub fn sum_int32(
    _op: &ResolvedOperator,
    inputs: Vec<Value>,
    cancel: CancelToken,
) -> BoxFuture<'static, Result<Value>> {
    Box::pin(async move {
        let mut sum = 0_i32;
        fold_elements(inputs, cancel, |value| {
            sum = sum
                .checked_add(expect_int32(&value)?)
                .ok_or_else(sum_overflow)?;
            Ok(())
        })
        .await?;
        Ok(Value::Int32(sum))
    })
}

pub fn sum_int64(
    _op: &ResolvedOperator,
    inputs: Vec<Value>,
    cancel: CancelToken,
) -> BoxFuture<'static, Result<Value>> {
    Box::pin(async move {
        let mut sum = 0_i64;
        fold_elements(inputs, cancel, |value| {
            match value {
                Value::Int64(v) => sum = sum.checked_add(v).ok_or_else(sum_overflow)?,
                other => return Err(unexpected_element(&other)),
            }
            Ok(())
        })
        .await?;
        Ok(Value::Int64(sum))
    })
}

pub fn sum_float64(
    _op: &ResolvedOperator,
    inputs: Vec<Value>,
    cancel: CancelToken,
) -> BoxFuture<'static, Result<Value>> {
    Box::pin(async move {
        let mut sum = 0.0_f64;
        fold_elements(inputs, cancel, |value| {
            match value {
                Value::Float64(v) => sum += v,
                other => return Err(unexpected_element(&other)),
            }
            Ok(())
        })
        .await?;
        Ok(Value::Float64(sum))
    })
}

pub fn average_int32(
    _op: &ResolvedOperator,
    inputs: Vec<Value>,
    cancel: CancelToken,
) -> BoxFuture<'static, Result<Value>> {
    Box::pin(async move {
        let mut sum = 0.0_f64;
        let mut count = 0_usize;
        fold_elements(inputs, cancel, |value| {
            sum += f64::from(expect_int32(&value)?);
            count += 1;
            Ok(())
        })
        .await?;
        finish_average(sum, count)
    })
}

pub fn average_int64(
    _op: &ResolvedOperator,
    inputs: Vec<Value>,
    cancel: CancelToken,
) -> BoxFuture<'static, Result<Value>> {
    Box::pin(async move {
        let mut sum = 0.0_f64;
        let mut count = 0_usize;
        fold_elements(inputs, cancel, |value| {
            match value {
                Value::Int64(v) => sum += v as f64,
                other => return Err(unexpected_element(&other)),
            }
            count += 1;
            Ok(())
        })
        .await?;
        finish_average(sum, count)
    })
}

pub fn average_float64(
    _op: &ResolvedOperator,
    inputs: Vec<Value>,
    cancel: CancelToken,
) -> BoxFuture<'static, Result<Value>> {
    Box::pin(async move {
        let mut sum = 0.0_f64;
        let mut count = 0_usize;
        fold_elements(inputs, cancel, |value| {
            match value {
                Value::Float64(v) => sum += v,
                other => return Err(unexpected_element(&other)),
            }
            count += 1;
            Ok(())
        })
        .await?;
        finish_average(sum, count)
    })
}

/// Nulls are skipped; an all-null or empty input averages to null.
pub fn average_nullable_int32(
    _op: &ResolvedOperator,
    inputs: Vec<Value>,
    cancel: CancelToken,
) -> BoxFuture<'static, Result<Value>> {
    Box::pin(async move {
        let mut sum = 0.0_f64;
        let mut count = 0_usize;
        fold_elements(inputs, cancel, |value| {
            match value {
                Value::Null => (),
                Value::Int32(v) => {
                    sum += f64::from(v);
                    count += 1;
                }
                other => return Err(unexpected_element(&other)),
            }
            Ok(())
        })
        .await?;
        if count == 0 {
            Ok(Value::Null)
        } else {
            Ok(Value::Float64(sum / count as f64))
        }
    })
}

async fn fold_elements(
    inputs: Vec<Value>,
    cancel: CancelToken,
    mut f: impl FnMut(Value) -> Result<()>,
) -> Result<()> {
    let source = one_sequence(inputs)?;
    let mut cursor = source.cursor(&cancel);
    while let Some(item) = cursor.next().await {
        f(item?)?;
    }
    Ok(())
}

fn one_sequence(inputs: Vec<Value>) -> Result<Sequence> {
    let mut inputs = inputs.into_iter();
    let source = inputs
        .next()
        .ok_or_else(|| SymqError::new("Missing sequence input for terminal operator"))?;
    source.into_sequence()
}

fn expect_int32(value: &Value) -> Result<i32> {
    match value {
        Value::Int32(v) => Ok(*v),
        other => Err(unexpected_element(other)),
    }
}

fn unexpected_element(value: &Value) -> SymqError {
    SymqError::new(format!("Unexpected element in numeric sequence: {value}"))
}

fn empty_sequence() -> SymqError {
    SymqError::new("Sequence contains no elements")
}

fn sum_overflow() -> SymqError {
    SymqError::new("Sum overflowed its element type")
}

fn finish_average(sum: f64, count: usize) -> Result<Value> {
    if count == 0 {
        return Err(empty_sequence());
    }
    Ok(Value::Float64(sum / count as f64))
}
