// SPDX-License-Identifier: Unlicense
//! Post-fixpoint check that the tree only holds constructs the next stage can
//! consume.

use crate::{
    ast::{Arena, Id, Kind, Role},
    error::{NodePath, OptimizeError, UnreducedReason},
};

/// Composites that hold their operator as a child.
const OPERATOR_OWNERS: &[Kind] = &[
    Kind::UnaryExpression,
    Kind::BinaryExpression,
    Kind::ComparisonExpression,
];

/// Fails on the first leftover the next stage cannot consume, in pre-order.
pub fn validate(arena: &Arena, root: Id) -> Result<(), OptimizeError> {
    validate_impl(arena, root, None, NodePath::default())
}

fn validate_impl(
    arena: &Arena,
    id: Id,
    parent: Option<Kind>,
    path: NodePath,
) -> Result<(), OptimizeError> {
    let node = &arena[id];

    let reason = if node.has_role(&[Role::Primitive]) {
        Some(UnreducedReason::Provisional)
    } else if node.has_role(&[Role::Punctuation]) {
        Some(UnreducedReason::Punctuation)
    } else if node.has_role(&[Role::Keyword]) {
        // every keyword is consumed by the construct it introduces
        Some(UnreducedReason::Keyword)
    } else if node.has_role(&[Role::Operator])
        && !parent.is_some_and(|kind| OPERATOR_OWNERS.contains(&kind))
    {
        Some(UnreducedReason::Operator)
    } else if node.has_role(&[Role::LiteralValue])
        && node.value().is_some_and(|value| value.is_raw())
    {
        Some(UnreducedReason::RawLiteral)
    } else {
        None
    };

    if let Some(reason) = reason {
        return Err(OptimizeError::Unreduced {
            kind: node.kind(),
            path,
            reason,
        });
    }

    for (index, child) in node.children().into_iter().enumerate() {
        validate_impl(arena, child, Some(node.kind()), path.child(index))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::*;
    use rstest::rstest;

    use crate::{optimizer, parser};

    #[test]
    fn raw_tree_fails_at_the_first_leftover() -> Result<()> {
        let (arena, root) = parser::parse("raw.sketch", "(Program (Statement let x ';'))")?;

        let err = validate(&arena, root).unwrap_err();
        assert_eq!(
            err,
            OptimizeError::Unreduced {
                kind: Kind::Statement,
                path: NodePath(vec![0]),
                reason: UnreducedReason::Provisional,
            }
        );
        Ok(())
    }

    #[test]
    fn stray_punctuation_is_reported_with_its_path() -> Result<()> {
        let (mut arena, root) = parser::parse(
            "stray.sketch",
            "(Program (Statement let x '=' 1 ';') (ExpressionList a '.' b))",
        )?;

        let err = optimizer::optimize(&mut arena, root).unwrap_err();
        assert_eq!(
            err,
            OptimizeError::Unreduced {
                kind: Kind::Dot,
                path: NodePath(vec![1, 1]),
                reason: UnreducedReason::Punctuation,
            }
        );
        Ok(())
    }

    #[test]
    fn uncoerced_literal_is_reported() -> Result<()> {
        let (mut arena, root) = parser::parse("nan.sketch", "(Program (ExpressionList 1 2))")?;
        let mut optimizer = optimizer::Optimizer::new(
            &mut arena,
            optimizer::OptimizerConfig {
                validate: false,
                ..Default::default()
            },
        );
        optimizer.optimize_program(root)?;
        validate(&arena, root)?;

        // Nothing has been coerced before the structure phase runs
        let (arena, root) = parser::parse("nan.sketch", "(Program (ExpressionList \"1\"))")?;
        let err = validate(&arena, root).unwrap_err();
        assert!(matches!(
            err,
            OptimizeError::Unreduced {
                reason: UnreducedReason::RawLiteral,
                ..
            }
        ));
        Ok(())
    }

    #[test]
    fn reduced_program_passes() -> Result<()> {
        let (mut arena, root) = parser::parse(
            "ok.sketch",
            "(Program (Statement let x '=' (Expression '(' (Expression 1 '+' 2) ')') ';'))",
        )?;

        let mut optimizer = optimizer::Optimizer::new(
            &mut arena,
            optimizer::OptimizerConfig {
                validate: false,
                ..Default::default()
            },
        );
        optimizer.optimize_program(root)?;
        validate(&arena, root)?;
        Ok(())
    }

    #[rstest]
    #[case::bare_let("(Program let x)", Kind::KeywordLiteral, vec![0], UnreducedReason::Keyword)]
    #[case::keyword_in_block("(Program (Block return))", Kind::KeywordLiteral, vec![0, 0], UnreducedReason::Keyword)]
    #[case::bare_infix("(Program a '+' b)", Kind::PlusOperator, vec![1], UnreducedReason::Operator)]
    #[case::operator_in_block(
        "(Program (Statement while '(' x ')' '{' (Block '-' y) '}'))",
        Kind::MinusOperator,
        vec![0, 1, 0],
        UnreducedReason::Operator
    )]
    #[case::operator_as_callee(
        "(Program (Expression '+' '(' (ExpressionList 1) ')'))",
        Kind::PlusOperator,
        vec![0, 0],
        UnreducedReason::Operator
    )]
    fn leftover_leaves_are_rejected(
        #[case] sketch: &str,
        #[case] kind: Kind,
        #[case] path: Vec<usize>,
        #[case] reason: UnreducedReason,
    ) -> Result<()> {
        let (mut arena, root) = parser::parse("leftover.sketch", sketch)?;

        let err = optimizer::optimize(&mut arena, root).unwrap_err();
        assert_eq!(
            err,
            OptimizeError::Unreduced {
                kind,
                path: NodePath(path),
                reason,
            }
        );
        Ok(())
    }

    #[test]
    fn operators_inside_their_expressions_pass() -> Result<()> {
        let (mut arena, root) = parser::parse(
            "ops.sketch",
            "(Program (Expression '-' (Expression a '<' (Expression b '*' 2))))",
        )?;

        optimizer::optimize(&mut arena, root)?;
        Ok(())
    }
}
