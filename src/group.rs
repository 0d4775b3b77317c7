// SPDX-License-Identifier: Unlicense
//! Promotion rules run bottom-up. Each one matches an exact child count plus
//! positional kinds and assembles a typed construct from the children. The
//! catalog is ordered; the first rule that matches wins.

use std::time::Instant;

use crate::{
    ast::{promote, Arena, Id, Kind, Node, NodeKind, Role, Value},
    optimizer::{Rewrite, Rule},
};

/// Roles accepted wherever a value is expected.
const OPERAND: &[Role] = &[Role::Expression, Role::LiteralValue];

const RULES: &[(&str, Rule)] = &[
    ("unary expression", unary_expression),
    ("binary expression", binary_expression),
    ("comparison expression", comparison_expression),
    ("variable assignment", variable_assignment),
    ("array index write", array_index_write),
    ("variable declaration", variable_declaration),
    ("variable initialisation", variable_initialisation),
    ("call expression", call_expression),
    ("member expression", member_expression),
    ("class literal", class_literal),
    ("function literal", function_literal),
    ("unwrap if statement", unwrap_if_statement),
    ("if statement", if_statement),
    ("if else statement", if_else_statement),
    ("elseif chain", elseif_chain),
    ("while statement", while_statement),
    ("function definition", function_definition),
    ("class definition", class_definition),
    ("unwrap settled statement", unwrap_settled),
    ("drop empty statement", drop_empty_statement),
];

/// Applies the first matching promotion rule to `id`.
pub fn rewrite(arena: &mut Arena, id: Id) -> Option<(&'static str, Rewrite)> {
    let started = Instant::now();
    let allocated = arena.len();
    let (name, rewrite) = RULES
        .iter()
        .find_map(|(name, rule)| rule(arena, id).map(|rewrite| (*name, rewrite)))?;

    // Unwrapping rules hand back an existing child, which keeps its own time
    if let Rewrite::Replace(new) = rewrite {
        if new.index() >= allocated {
            arena[new].build_time = Some(started.elapsed());
        }
    }

    Some((name, rewrite))
}

/// Positional view over the children of a node under test.
struct Shape<'a> {
    arena: &'a Arena,
    ids: Vec<Id>,
}

impl<'a> Shape<'a> {
    /// Children of a provisional node. Containers and promoted nodes never
    /// match, so no rule can fire again on its own output.
    fn of(arena: &'a Arena, id: Id) -> Option<Self> {
        let node = &arena[id];
        node.has_role(&[Role::Primitive]).then(|| Self {
            arena,
            ids: node.children(),
        })
    }

    /// Children of a node of exactly `kind`.
    fn of_kind(arena: &'a Arena, id: Id, kind: Kind) -> Option<Self> {
        let node = &arena[id];
        node.has_exact_kind(&[kind]).then(|| Self {
            arena,
            ids: node.children(),
        })
    }

    fn node(&self, index: usize) -> Option<&'a Node> {
        let arena = self.arena;
        self.ids.get(index).map(|id| &arena[*id])
    }

    fn kind(&self, index: usize, kinds: &[Kind]) -> bool {
        self.node(index).is_some_and(|node| node.has_exact_kind(kinds))
    }

    fn role(&self, index: usize, roles: &[Role]) -> bool {
        self.node(index).is_some_and(|node| node.has_role(roles))
    }

    fn keyword(&self, index: usize, word: &str) -> bool {
        self.node(index).is_some_and(|node| node.is_keyword(word))
    }

    /// `keyword ( test ) { block }` over the first seven children.
    fn conditional_head(&self, word: &str) -> Option<(Id, Id)> {
        let matches = self.keyword(0, word)
            && self.kind(1, &[Kind::LeftParen])
            && self.role(2, OPERAND)
            && self.kind(3, &[Kind::RightParen])
            && self.braced_block(4);
        matches.then(|| (self.ids[2], self.ids[5]))
    }

    /// `{ block }` starting at `index`.
    fn braced_block(&self, index: usize) -> bool {
        self.kind(index, &[Kind::LeftCurly])
            && self.kind(index + 1, &[Kind::Block])
            && self.kind(index + 2, &[Kind::RightCurly])
    }
}

fn unary_expression(arena: &mut Arena, id: Id) -> Option<Rewrite> {
    let shape = Shape::of(arena, id)?;
    let [operator, operand] = shape.ids[..] else {
        return None;
    };
    let matches = shape.kind(
        0,
        &[Kind::MinusOperator, Kind::PlusOperator, Kind::NotOperator],
    ) && shape.role(1, OPERAND);
    if !matches {
        return None;
    }

    let unary = promote(arena, NodeKind::Unary { operator, operand });
    Some(Rewrite::Replace(unary))
}

/// `operand operator operand` where the operator belongs to `class`.
fn infix_operands(arena: &Arena, id: Id, class: Role) -> Option<(Id, Id, Id)> {
    let shape = Shape::of(arena, id)?;
    let [left, operator, right] = shape.ids[..] else {
        return None;
    };
    let matches = shape.role(1, &[class]) && shape.role(0, OPERAND) && shape.role(2, OPERAND);
    matches.then_some((left, operator, right))
}

fn binary_expression(arena: &mut Arena, id: Id) -> Option<Rewrite> {
    let (left, operator, right) = infix_operands(arena, id, Role::ArithmeticOperator)?;
    let binary = promote(
        arena,
        NodeKind::Binary {
            operator,
            left,
            right,
        },
    );
    Some(Rewrite::Replace(binary))
}

fn comparison_expression(arena: &mut Arena, id: Id) -> Option<Rewrite> {
    let (left, operator, right) = infix_operands(arena, id, Role::ComparisonOperator)?;
    let comparison = promote(
        arena,
        NodeKind::Comparison {
            operator,
            left,
            right,
        },
    );
    Some(Rewrite::Replace(comparison))
}

/// `target = value` where the target is one of `targets`.
fn assignment_parts(arena: &Arena, id: Id, targets: &[Kind]) -> Option<(Id, Id)> {
    let shape = Shape::of(arena, id)?;
    let [target, _, value] = shape.ids[..] else {
        return None;
    };
    let matches = shape.kind(1, &[Kind::AssignmentOperator])
        && (shape.role(2, OPERAND) || shape.kind(2, &[Kind::MemberExpression]))
        && shape.kind(0, targets);
    matches.then_some((target, value))
}

fn variable_assignment(arena: &mut Arena, id: Id) -> Option<Rewrite> {
    let (target, value) = assignment_parts(
        arena,
        id,
        &[Kind::IdentifierLiteral, Kind::MemberExpression],
    )?;
    let assignment = promote(arena, NodeKind::VariableAssignment { target, value });
    Some(Rewrite::Replace(assignment))
}

/// `a(i) = v`: the call's callee is the array and its arguments the index.
fn array_index_write(arena: &mut Arena, id: Id) -> Option<Rewrite> {
    let (target, value) = assignment_parts(arena, id, &[Kind::CallExpression])?;
    let NodeKind::Call { callee, arguments } = arena[target].kind else {
        return None;
    };

    let write = promote(
        arena,
        NodeKind::ArrayIndexWrite {
            array: callee,
            index: arguments,
            value,
        },
    );
    Some(Rewrite::Replace(write))
}

fn variable_declaration(arena: &mut Arena, id: Id) -> Option<Rewrite> {
    let shape = Shape::of(arena, id)?;
    let [_, identifier] = shape.ids[..] else {
        return None;
    };
    if !(shape.keyword(0, "let") && shape.kind(1, &[Kind::IdentifierLiteral])) {
        return None;
    }

    let declaration = promote(arena, NodeKind::VariableDeclaration { identifier });
    Some(Rewrite::Replace(declaration))
}

fn variable_initialisation(arena: &mut Arena, id: Id) -> Option<Rewrite> {
    let shape = Shape::of(arena, id)?;
    let [_, identifier, _, expression] = shape.ids[..] else {
        return None;
    };
    let matches = shape.keyword(0, "let")
        && shape.kind(1, &[Kind::IdentifierLiteral])
        && shape.kind(2, &[Kind::AssignmentOperator])
        && shape.role(3, OPERAND);
    if !matches {
        return None;
    }

    let initialisation = promote(
        arena,
        NodeKind::VariableInitialisation {
            identifier,
            expression,
        },
    );
    Some(Rewrite::Replace(initialisation))
}

fn call_expression(arena: &mut Arena, id: Id) -> Option<Rewrite> {
    let shape = Shape::of(arena, id)?;
    let [callee, _, arguments, _] = shape.ids[..] else {
        return None;
    };
    let matches = shape.kind(1, &[Kind::LeftParen])
        && shape.kind(2, &[Kind::ExpressionList])
        && shape.kind(3, &[Kind::RightParen]);
    if !matches {
        return None;
    }

    let call = promote(arena, NodeKind::Call { callee, arguments });
    Some(Rewrite::Replace(call))
}

fn member_expression(arena: &mut Arena, id: Id) -> Option<Rewrite> {
    let shape = Shape::of(arena, id)?;
    let [object, _, property] = shape.ids[..] else {
        return None;
    };
    let matches = shape.role(0, OPERAND)
        && shape.kind(1, &[Kind::Dot])
        && shape.kind(2, &[Kind::IdentifierLiteral]);
    if !matches {
        return None;
    }

    let member = promote(arena, NodeKind::Member { object, property });
    Some(Rewrite::Replace(member))
}

fn is_function_named(arena: &Arena, function: Id, wanted: &str) -> bool {
    match arena[function].kind {
        NodeKind::FunctionLiteral {
            name: Some(name), ..
        } => arena[name].value().and_then(Value::as_str) == Some(wanted),
        _ => false,
    }
}

/// Detaches the function literal named `constructor` from a class body.
fn take_constructor(arena: &mut Arena, body: Id) -> Option<Id> {
    let view: &Arena = arena;
    let (position, function) =
        view[body]
            .children()
            .into_iter()
            .enumerate()
            .find_map(|(position, statement)| {
                let function = match view[statement].kind {
                    NodeKind::FunctionDefinition { function } => function,
                    NodeKind::FunctionLiteral { .. } => statement,
                    _ => return None,
                };
                is_function_named(view, function, "constructor").then_some((position, function))
            })?;

    arena[body].kind.sequence_mut()?.remove(position);
    Some(function)
}

fn class_literal(arena: &mut Arena, id: Id) -> Option<Rewrite> {
    let shape = Shape::of(arena, id)?;
    let [_, name, _, body, _] = shape.ids[..] else {
        return None;
    };
    let matches = shape.keyword(0, "class")
        && shape.kind(1, &[Kind::IdentifierLiteral])
        && shape.braced_block(2);
    if !matches {
        return None;
    }

    let constructor = take_constructor(arena, body);
    let class = promote(
        arena,
        NodeKind::ClassLiteral {
            name,
            constructor,
            body,
        },
    );
    Some(Rewrite::Replace(class))
}

/// `func [name] ( params ) { body }`
fn function_literal(arena: &mut Arena, id: Id) -> Option<Rewrite> {
    let shape = Shape::of(arena, id)?;
    let (name, rest) = match shape.ids.len() {
        8 if shape.kind(1, &[Kind::IdentifierLiteral]) => (Some(shape.ids[1]), 2),
        7 => (None, 1),
        _ => return None,
    };
    let matches = shape.keyword(0, "func")
        && shape.kind(rest, &[Kind::LeftParen])
        && shape.kind(rest + 1, &[Kind::ArgumentList])
        && shape.kind(rest + 2, &[Kind::RightParen])
        && shape.braced_block(rest + 3);
    if !matches {
        return None;
    }

    let parameters = shape.ids[rest + 1];
    let body = shape.ids[rest + 4];
    let function = promote(
        arena,
        NodeKind::FunctionLiteral {
            name,
            parameters,
            body,
        },
    );
    Some(Rewrite::Replace(function))
}

/// The only child of a `Statement`.
fn sole_statement_child(arena: &Arena, id: Id) -> Option<Id> {
    let shape = Shape::of_kind(arena, id, Kind::Statement)?;
    match shape.ids[..] {
        [child] => Some(child),
        _ => None,
    }
}

fn unwrap_if_statement(arena: &mut Arena, id: Id) -> Option<Rewrite> {
    let child = sole_statement_child(arena, id)?;
    arena[child]
        .has_exact_kind(&[Kind::IfStatementPrimitive, Kind::IfStatement])
        .then_some(Rewrite::Replace(child))
}

fn if_statement(arena: &mut Arena, id: Id) -> Option<Rewrite> {
    let shape = Shape::of_kind(arena, id, Kind::IfStatementPrimitive)?;
    if shape.ids.len() != 7 {
        return None;
    }
    let (test, consequent) = shape.conditional_head("if")?;

    let statement = promote(
        arena,
        NodeKind::If {
            test,
            consequent,
            alternate: None,
        },
    );
    Some(Rewrite::Replace(statement))
}

fn if_else_statement(arena: &mut Arena, id: Id) -> Option<Rewrite> {
    let shape = Shape::of_kind(arena, id, Kind::IfStatementPrimitive)?;
    if shape.ids.len() != 11 {
        return None;
    }
    let (test, consequent) = shape.conditional_head("if")?;
    if !(shape.keyword(7, "else") && shape.braced_block(8)) {
        return None;
    }

    let alternate = Some(shape.ids[9]);
    let statement = promote(
        arena,
        NodeKind::If {
            test,
            consequent,
            alternate,
        },
    );
    Some(Rewrite::Replace(statement))
}

fn elseif_chain(arena: &mut Arena, id: Id) -> Option<Rewrite> {
    let shape = Shape::of_kind(arena, id, Kind::IfStatementPrimitive)?;
    if shape.ids.len() != 9 {
        return None;
    }
    let (test, consequent) = shape.conditional_head("if")?;
    if !(shape.keyword(7, "else") && shape.kind(8, &[Kind::IfStatement])) {
        return None;
    }

    let alternate = Some(shape.ids[8]);
    let statement = promote(
        arena,
        NodeKind::If {
            test,
            consequent,
            alternate,
        },
    );
    Some(Rewrite::Replace(statement))
}

fn while_statement(arena: &mut Arena, id: Id) -> Option<Rewrite> {
    let shape = Shape::of_kind(arena, id, Kind::Statement)?;
    if shape.ids.len() != 7 {
        return None;
    }
    let (test, consequent) = shape.conditional_head("while")?;

    let statement = promote(arena, NodeKind::While { test, consequent });
    Some(Rewrite::Replace(statement))
}

fn function_definition(arena: &mut Arena, id: Id) -> Option<Rewrite> {
    let function = sole_statement_child(arena, id)?;
    if !arena[function].has_exact_kind(&[Kind::FunctionLiteral]) {
        return None;
    }

    let definition = promote(arena, NodeKind::FunctionDefinition { function });
    Some(Rewrite::Replace(definition))
}

fn class_definition(arena: &mut Arena, id: Id) -> Option<Rewrite> {
    let class = sole_statement_child(arena, id)?;
    if !arena[class].has_exact_kind(&[Kind::ClassLiteral]) {
        return None;
    }

    let definition = promote(arena, NodeKind::ClassDefinition { class });
    Some(Rewrite::Replace(definition))
}

/// A statement or temporary wrapping a single construct that is already
/// settled stands for that construct.
fn unwrap_settled(arena: &mut Arena, id: Id) -> Option<Rewrite> {
    if !arena[id].has_exact_kind(&[Kind::Statement, Kind::Temporary]) {
        return None;
    }
    let [child] = arena[id].children()[..] else {
        return None;
    };

    let child_node = &arena[child];
    let settled = child_node.has_role(&[Role::Expression, Role::Statement, Role::LiteralValue])
        && !child_node.has_role(&[Role::Primitive]);
    settled.then_some(Rewrite::Replace(child))
}

fn drop_empty_statement(arena: &mut Arena, id: Id) -> Option<Rewrite> {
    let shape = Shape::of_kind(arena, id, Kind::Statement)?;
    shape.ids.is_empty().then_some(Rewrite::Remove)
}
