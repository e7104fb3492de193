use super::{OperatorDescriptor, ResolvedOperator};
use crate::expr::Expression;
use crate::types::TypeShape;

/// Find the first descriptor accepting the given argument nodes.
///
/// Candidates are tried strictly in the order the iterator yields them; the
/// first applicable one wins even if a later candidate would fit more
/// tightly. This first-fit policy is observable behavior and deliberate.
pub fn find_first_match<'a>(
    candidates: impl Iterator<Item = &'a OperatorDescriptor>,
    args: &[&Expression],
    type_args: &[TypeShape],
) -> Option<ResolvedOperator> {
    for candidate in candidates {
        if let Some(resolved) = match_descriptor(candidate, args, type_args) {
            return Some(resolved);
        }
    }
    None
}

/// Check a single descriptor against argument nodes and explicit type
/// arguments, producing the closed descriptor on success.
pub fn match_descriptor(
    descriptor: &OperatorDescriptor,
    args: &[&Expression],
    type_args: &[TypeShape],
) -> Option<ResolvedOperator> {
    if descriptor.params.len() != args.len() {
        return None;
    }

    // Explicit type arguments must agree with the descriptor's genericness:
    // a non-generic descriptor takes none, a generic one takes exactly its
    // arity. No inference.
    let (params, ret, type_args) = if descriptor.is_generic() {
        if type_args.len() != descriptor.generic_arity() {
            return None;
        }
        let params = descriptor
            .params
            .iter()
            .map(|p| p.substitute(type_args))
            .collect::<Vec<_>>();
        let ret = descriptor.ret.substitute(type_args);
        (params, ret, type_args.to_vec())
    } else {
        if !type_args.is_empty() {
            return None;
        }
        (descriptor.params.clone(), descriptor.ret.clone(), Vec::new())
    };

    for (param, arg) in params.iter().zip(args.iter()) {
        if !argument_matches(param, arg) {
            return None;
        }
    }

    Some(ResolvedOperator {
        name: descriptor.name.to_string(),
        params,
        ret,
        type_args,
        implementation: descriptor.implementation,
    })
}

/// Check one argument node against one closed parameter shape.
///
/// By-reference parameters are compared by their referenced shape. If direct
/// assignability fails, quoting layers are stripped off the argument's shape
/// one at a time; for array parameters, one quoting layer is also stripped
/// off the element shapes before giving up.
fn argument_matches(param: &TypeShape, arg: &Expression) -> bool {
    let param = param.deref_shape();
    let mut arg_shape = arg.result_shape();

    loop {
        if param.is_assignable_from(&arg_shape) {
            return true;
        }
        match arg_shape {
            TypeShape::Quoted(inner) => arg_shape = *inner,
            _ => break,
        }
    }

    // Quoting attaches per element for arrays, so the array shapes never
    // compare equal directly.
    if let (TypeShape::Array(want), TypeShape::Array(have)) = (param, &arg.result_shape()) {
        if let TypeShape::Quoted(inner) = have.as_ref() {
            return want.is_assignable_from(inner);
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{self, lit_i32};
    use crate::operators::OperatorImpl;
    use crate::runtime::value::Value;
    use crate::types::{self, generic, quoted, seq, task};

    fn dummy_sequence_impl(
        _op: &ResolvedOperator,
        _inputs: Vec<Value>,
    ) -> symq_error::Result<Value> {
        unreachable!("matcher tests never invoke implementations")
    }

    fn descriptor(
        name: &'static str,
        generics: &'static [&'static str],
        params: Vec<TypeShape>,
        ret: TypeShape,
    ) -> OperatorDescriptor {
        OperatorDescriptor {
            name,
            generic_params: generics,
            params,
            ret,
            implementation: OperatorImpl::Sequence(dummy_sequence_impl),
        }
    }

    fn int_seq_arg() -> Expression {
        expr::constant(
            Value::Seq(crate::runtime::sequence::Sequence::from_values(
                TypeShape::Int32,
                Vec::new(),
            )),
            seq(TypeShape::Int32),
        )
    }

    #[test]
    fn arity_mismatch_rejected() {
        let desc = descriptor("first", &["T"], vec![seq(generic(0))], task(generic(0)));
        let source = int_seq_arg();
        let extra = lit_i32(1);
        assert!(match_descriptor(&desc, &[&source, &extra], &[TypeShape::Int32]).is_none());
    }

    #[test]
    fn non_generic_rejects_explicit_type_args() {
        let desc = descriptor(
            "average",
            &[],
            vec![seq(TypeShape::Int32)],
            task(TypeShape::Float64),
        );
        let source = int_seq_arg();
        assert!(match_descriptor(&desc, &[&source], &[TypeShape::Int32]).is_none());
        assert!(match_descriptor(&desc, &[&source], &[]).is_some());
    }

    #[test]
    fn generic_requires_exact_type_arg_count() {
        let desc = descriptor("first", &["T"], vec![seq(generic(0))], task(generic(0)));
        let source = int_seq_arg();
        assert!(match_descriptor(&desc, &[&source], &[]).is_none());
        assert!(
            match_descriptor(&desc, &[&source], &[TypeShape::Int32, TypeShape::Int32]).is_none()
        );

        let resolved = match_descriptor(&desc, &[&source], &[TypeShape::Int32]).unwrap();
        assert_eq!(task(TypeShape::Int32), resolved.ret);
        assert_eq!(vec![seq(TypeShape::Int32)], resolved.params);
    }

    #[test]
    fn select_closes_over_explicit_type_args() {
        // select<T, R>(seq<T>, fn(T) -> R) -> seq<R>.
        let desc = descriptor(
            "select",
            &["T", "R"],
            vec![seq(generic(0)), types::func([generic(0)], generic(1))],
            seq(generic(1)),
        );

        let source = int_seq_arg();
        let projection = expr::quoted_lambda(expr::lambda([TypeShape::Int32], TypeShape::Utf8, |_| {
            Ok(Value::Utf8(String::new()))
        }));

        let resolved = match_descriptor(
            &desc,
            &[&source, &projection],
            &[TypeShape::Int32, TypeShape::Utf8],
        )
        .unwrap();

        assert_eq!(
            vec![
                seq(TypeShape::Int32),
                types::func([TypeShape::Int32], TypeShape::Utf8),
            ],
            resolved.params,
        );
        assert_eq!(seq(TypeShape::Utf8), resolved.ret);
    }

    #[test]
    fn quoted_lambda_matches_plain_function_parameter() {
        let desc = descriptor(
            "keep_if",
            &[],
            vec![types::func([TypeShape::Int32], TypeShape::Bool)],
            TypeShape::Bool,
        );
        let arg = expr::quoted_lambda(expr::lambda([TypeShape::Int32], TypeShape::Bool, |_| {
            Ok(Value::Bool(true))
        }));
        assert!(match_descriptor(&desc, &[&arg], &[]).is_some());
    }

    #[test]
    fn mismatched_lambda_shape_rejected() {
        let desc = descriptor(
            "keep_if",
            &[],
            vec![types::func([TypeShape::Int32], TypeShape::Bool)],
            TypeShape::Bool,
        );
        let arg = expr::quoted_lambda(expr::lambda([TypeShape::Int64], TypeShape::Bool, |_| {
            Ok(Value::Bool(true))
        }));
        assert!(match_descriptor(&desc, &[&arg], &[]).is_none());
    }

    #[test]
    fn byref_parameter_compared_by_referenced_shape() {
        let desc = descriptor(
            "drain_into",
            &[],
            vec![types::byref(TypeShape::Int32)],
            TypeShape::Int32,
        );
        let arg = lit_i32(4);
        assert!(match_descriptor(&desc, &[&arg], &[]).is_some());
    }

    #[test]
    fn array_of_quoted_lambdas_matches_function_array_parameter() {
        let func_shape = types::func([TypeShape::Int32], TypeShape::Int32);
        let desc = descriptor(
            "apply_all",
            &[],
            vec![types::array(func_shape.clone())],
            TypeShape::Int32,
        );

        let element = expr::quoted_lambda(expr::lambda([TypeShape::Int32], TypeShape::Int32, |_| {
            Ok(Value::Int32(0))
        }));
        let arg = expr::array_literal(quoted(func_shape), [element]);

        assert!(match_descriptor(&desc, &[&arg], &[]).is_some());
    }

    #[test]
    fn first_fit_takes_earlier_candidate() {
        // Both candidates accept seq<int32>; enumeration order decides, and
        // it decides the same way every time.
        let first = descriptor("pick", &[], vec![seq(TypeShape::Int32)], TypeShape::Int32);
        let second = descriptor("pick", &[], vec![seq(TypeShape::Int32)], TypeShape::Int64);
        let source = int_seq_arg();

        for _ in 0..8 {
            let resolved =
                find_first_match([&first, &second].into_iter(), &[&source], &[]).unwrap();
            assert_eq!(TypeShape::Int32, resolved.ret);
        }

        // Swapping declaration order swaps the winner.
        let resolved = find_first_match([&second, &first].into_iter(), &[&source], &[]).unwrap();
        assert_eq!(TypeShape::Int64, resolved.ret);
    }

    #[test]
    fn no_numeric_promotion_between_overloads() {
        let desc = descriptor(
            "sum",
            &[],
            vec![seq(TypeShape::Int64)],
            task(TypeShape::Int64),
        );
        let source = int_seq_arg();
        assert!(match_descriptor(&desc, &[&source], &[]).is_none());
    }
}
