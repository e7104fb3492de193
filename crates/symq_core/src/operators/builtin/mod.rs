pub mod sequence_ops;
pub mod terminal_ops;

use super::OperatorDescriptor;
use super::surface::SurfaceTable;
use crate::types::{TypeShape, array, func, generic, grouping, nullable, seq, task};

/// Build the builtin concrete operator surface.
///
/// This is a representative catalog, not the full one: enough operators to
/// exercise resolution end to end. Declaration order here is observable —
/// resolution is first-fit — so within a name, more specific overloads come
/// first.
pub fn sequence_surface() -> SurfaceTable {
    let mut table = SurfaceTable::new();

    table.push(OperatorDescriptor::sequence(
        "select",
        &["T", "R"],
        vec![seq(generic(0)), func([generic(0)], generic(1))],
        seq(generic(1)),
        sequence_ops::select,
    ));
    table.push(OperatorDescriptor::sequence(
        "where",
        &["T"],
        vec![seq(generic(0)), func([generic(0)], TypeShape::Bool)],
        seq(generic(0)),
        sequence_ops::filter,
    ));
    table.push(OperatorDescriptor::sequence(
        "concat",
        &["T"],
        vec![seq(generic(0)), seq(generic(0))],
        seq(generic(0)),
        sequence_ops::concat,
    ));
    table.push(OperatorDescriptor::sequence(
        "group_by",
        &["T", "K"],
        vec![seq(generic(0)), func([generic(0)], generic(1))],
        seq(grouping(generic(1), generic(0))),
        sequence_ops::group_by,
    ));

    // Numeric terminal families. Distinguished by exact element shape, no
    // implicit conversion between them.
    table.push(OperatorDescriptor::terminal(
        "sum",
        &[],
        vec![seq(TypeShape::Int32)],
        task(TypeShape::Int32),
        terminal_ops::sum_int32,
    ));
    table.push(OperatorDescriptor::terminal(
        "sum",
        &[],
        vec![seq(TypeShape::Int64)],
        task(TypeShape::Int64),
        terminal_ops::sum_int64,
    ));
    table.push(OperatorDescriptor::terminal(
        "sum",
        &[],
        vec![seq(TypeShape::Float64)],
        task(TypeShape::Float64),
        terminal_ops::sum_float64,
    ));
    table.push(OperatorDescriptor::terminal(
        "average",
        &[],
        vec![seq(TypeShape::Int32)],
        task(TypeShape::Float64),
        terminal_ops::average_int32,
    ));
    table.push(OperatorDescriptor::terminal(
        "average",
        &[],
        vec![seq(TypeShape::Int64)],
        task(TypeShape::Float64),
        terminal_ops::average_int64,
    ));
    table.push(OperatorDescriptor::terminal(
        "average",
        &[],
        vec![seq(TypeShape::Float64)],
        task(TypeShape::Float64),
        terminal_ops::average_float64,
    ));
    table.push(OperatorDescriptor::terminal(
        "average",
        &[],
        vec![seq(nullable(TypeShape::Int32))],
        task(nullable(TypeShape::Float64)),
        terminal_ops::average_nullable_int32,
    ));

    table.push(OperatorDescriptor::terminal(
        "count",
        &["T"],
        vec![seq(generic(0))],
        task(TypeShape::Int64),
        terminal_ops::count,
    ));
    table.push(OperatorDescriptor::terminal(
        "first",
        &["T"],
        vec![seq(generic(0))],
        task(generic(0)),
        terminal_ops::first,
    ));
    table.push(OperatorDescriptor::terminal(
        "to_list",
        &["T"],
        vec![seq(generic(0))],
        task(array(generic(0))),
        terminal_ops::to_list,
    ));

    table
}
