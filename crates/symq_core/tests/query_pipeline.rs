use futures::executor::block_on;
use futures::TryStreamExt;
use symq_core::execute::DeferredQuery;
use symq_core::execute::ExecutableQuery;
use symq_core::expr;
use symq_core::expr::{CallExpr, CallTarget, DeclaredOperator, Expression};
use symq_core::operators::surface::QUERY_SURFACE;
use symq_core::runtime::cancel::CancelToken;
use symq_core::runtime::value::Value;
use symq_core::types::{self, TypeShape};
use symq_error::Result;

fn ints(values: impl IntoIterator<Item = i32>) -> DeferredQuery {
    DeferredQuery::from_values(
        TypeShape::Int32,
        values.into_iter().map(Value::Int32).collect(),
    )
}

fn collect(query: &DeferredQuery) -> Result<Vec<Value>> {
    block_on(query.collect(&CancelToken::new()))
}

#[test]
fn select_then_filter_end_to_end() -> Result<()> {
    let doubled = ints([1, 2, 3, 4])
        .select(
            TypeShape::Int32,
            expr::lambda([TypeShape::Int32], TypeShape::Int32, |args| {
                match &args[0] {
                    Value::Int32(v) => Ok(Value::Int32(v * 2)),
                    other => panic!("unexpected element {other}"),
                }
            }),
        )?
        .filter(expr::lambda([TypeShape::Int32], TypeShape::Bool, |args| {
            match &args[0] {
                Value::Int32(v) => Ok(Value::Bool(*v > 4)),
                other => panic!("unexpected element {other}"),
            }
        }))?;

    let got = collect(&doubled)?;
    assert_eq!(vec![Value::Int32(6), Value::Int32(8)], got);
    Ok(())
}

#[test]
fn enumeration_materializes_once() -> Result<()> {
    let query = ints([1, 2]).select(
        TypeShape::Int64,
        expr::lambda([TypeShape::Int32], TypeShape::Int64, |args| {
            match &args[0] {
                Value::Int32(v) => Ok(Value::Int64(i64::from(*v))),
                other => panic!("unexpected element {other}"),
            }
        }),
    )?;

    assert!(query.materialized().is_none());
    collect(&query)?;
    let first = query.materialized().unwrap();
    collect(&query)?;
    let second = query.materialized().unwrap();
    assert!(first.ptr_eq(&second));
    Ok(())
}

#[test]
fn concat_inlines_the_embedded_handle() -> Result<()> {
    let left = ints([1, 2]);
    let right = ints([3, 4]).filter(expr::lambda(
        [TypeShape::Int32],
        TypeShape::Bool,
        |args| match &args[0] {
            Value::Int32(v) => Ok(Value::Bool(*v != 3)),
            other => panic!("unexpected element {other}"),
        },
    ))?;

    let got = collect(&left.concat(&right)?)?;
    assert_eq!(vec![Value::Int32(1), Value::Int32(2), Value::Int32(4)], got);
    Ok(())
}

#[test]
fn concat_reuses_a_materialized_handle() -> Result<()> {
    let right = ints([5, 6]);
    collect(&right)?;
    let before = right.materialized().unwrap();

    let got = collect(&ints([4]).concat(&right)?)?;
    assert_eq!(vec![Value::Int32(4), Value::Int32(5), Value::Int32(6)], got);

    // Still the same cached sequence afterwards.
    assert!(before.ptr_eq(&right.materialized().unwrap()));
    Ok(())
}

#[test]
fn group_by_preserves_first_seen_key_order() -> Result<()> {
    let grouped = ints([1, 2, 3, 4, 5]).group_by(
        TypeShape::Int32,
        expr::lambda([TypeShape::Int32], TypeShape::Int32, |args| {
            match &args[0] {
                Value::Int32(v) => Ok(Value::Int32(v % 2)),
                other => panic!("unexpected element {other}"),
            }
        }),
    )?;

    let groups = collect(&grouped)?;
    assert_eq!(2, groups.len());

    let mut seen = Vec::new();
    for group in groups {
        let group = match group {
            Value::Group(g) => g,
            other => panic!("expected group, got {other}"),
        };
        let members: Vec<_> = block_on(
            group
                .values
                .cursor(&CancelToken::new())
                .try_collect::<Vec<_>>(),
        )?;
        seen.push((*group.key, members));
    }

    assert_eq!(
        vec![
            (
                Value::Int32(1),
                vec![Value::Int32(1), Value::Int32(3), Value::Int32(5)]
            ),
            (Value::Int32(0), vec![Value::Int32(2), Value::Int32(4)]),
        ],
        seen
    );
    Ok(())
}

#[test]
fn terminal_count_runs_without_caching_the_result() -> Result<()> {
    let exec = ints([7, 8, 9]).count();
    let cancel = CancelToken::new();
    assert_eq!(Value::Int64(3), block_on(exec.run(&cancel))?);
    // Running again replays the pipeline rather than a cached value.
    assert_eq!(Value::Int64(3), block_on(exec.run(&cancel))?);
    Ok(())
}

#[test]
fn terminal_first_and_sum() -> Result<()> {
    let cancel = CancelToken::new();
    assert_eq!(
        Value::Int32(7),
        block_on(ints([7, 8]).first().run(&cancel))?
    );
    assert_eq!(
        Value::Int32(24),
        block_on(ints([7, 8, 9]).sum()?.run(&cancel))?
    );
    assert!(block_on(ints([7]).first().run(&cancel)).is_ok());
    assert!(block_on(ints([]).first().run(&cancel)).is_err());
    Ok(())
}

#[test]
fn average_over_nullable_elements_skips_nulls() -> Result<()> {
    let source = DeferredQuery::from_values(
        types::nullable(TypeShape::Int32),
        vec![Value::Int32(2), Value::Null, Value::Int32(4)],
    );
    let got = block_on(source.average()?.run(&CancelToken::new()))?;
    assert_eq!(Value::Float64(3.0), got);

    let all_null = DeferredQuery::from_values(types::nullable(TypeShape::Int32), vec![Value::Null]);
    assert_eq!(
        Value::Null,
        block_on(all_null.average()?.run(&CancelToken::new()))?
    );
    Ok(())
}

#[test]
fn pre_cancelled_enumeration_fails_immediately() {
    let query = ints([1, 2, 3]);
    let cancel = CancelToken::new();
    cancel.cancel();
    assert!(block_on(query.collect(&cancel)).is_err());
}

#[test]
fn cancelling_mid_run_aborts_the_terminal() {
    let exec = ints([1, 2, 3]).count();
    let cancel = CancelToken::new();
    cancel.cancel();
    assert!(block_on(exec.run(&cancel)).is_err());
}

#[test]
fn result_shape_guard_rejects_a_lying_request() {
    // A count call declared to produce utf8 must fail before execution.
    let source = ints([1]);
    let node: Expression = CallExpr {
        target: CallTarget::Declared(DeclaredOperator {
            name: "count".to_string(),
            surface: QUERY_SURFACE,
            type_args: vec![TypeShape::Int32],
            ret: types::task(TypeShape::Int64),
        }),
        receiver: Some(Box::new(source.node().clone())),
        args: Vec::new(),
    }
    .into();

    let exec = ExecutableQuery::new(node, TypeShape::Utf8);
    let err = block_on(exec.run(&CancelToken::new())).unwrap_err();
    assert!(err.to_string().contains("utf8"), "unexpected error: {err}");
}

#[test]
fn unknown_operator_error_names_operator_and_surface() {
    let source = ints([1]);
    let node: Expression = CallExpr {
        target: CallTarget::Declared(DeclaredOperator {
            name: "frobnicate".to_string(),
            surface: QUERY_SURFACE,
            type_args: Vec::new(),
            ret: types::query(TypeShape::Int32),
        }),
        receiver: Some(Box::new(source.node().clone())),
        args: Vec::new(),
    }
    .into();

    let query = DeferredQuery::from_node(node, TypeShape::Int32);
    let err = block_on(query.collect(&CancelToken::new())).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("frobnicate"), "unexpected error: {msg}");
    assert!(msg.contains("query"), "unexpected error: {msg}");
}
