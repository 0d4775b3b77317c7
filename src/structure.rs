// SPDX-License-Identifier: Unlicense
//! Normalization rules run top-down before any grouping happens: literal
//! coercion, redundant wrapper elision and punctuation stripping.

use crate::{
    ast::{self, Arena, Id, Kind, NodeKind, Role, Value},
    optimizer::{Rewrite, Rule},
};

const RULES: &[(&str, Rule)] = &[
    ("coerce numeric literal", coerce_numeric),
    ("coerce boolean literal", coerce_boolean),
    ("coerce text literal", coerce_text),
    ("elide expression wrapper", elide_expression_wrapper),
    ("elide parentheses", elide_parentheses),
    ("elide literal wrapper", elide_literal_wrapper),
    ("strip punctuation", strip_punctuation),
];

/// Repairs the child links of `id`, then applies the first matching rule.
pub fn rewrite(arena: &mut Arena, id: Id) -> Option<(&'static str, Rewrite)> {
    ast::adopt(arena, id);

    RULES
        .iter()
        .find_map(|(name, rule)| rule(arena, id).map(|rewrite| (*name, rewrite)))
}

fn raw_payload_mut<'a>(arena: &'a mut Arena, id: Id, kinds: &[Kind]) -> Option<&'a mut Value> {
    match &mut arena[id].kind {
        NodeKind::Terminal(t) if kinds.contains(&t.kind) && t.value.is_raw() => Some(&mut t.value),
        _ => None,
    }
}

fn coerce_numeric(arena: &mut Arena, id: Id) -> Option<Rewrite> {
    let value = raw_payload_mut(arena, id, &[Kind::NumericLiteral])?;
    let number = value.as_str()?.trim().parse::<f64>().ok()?;
    *value = Value::Number(number);
    Some(Rewrite::Unchanged)
}

fn coerce_boolean(arena: &mut Arena, id: Id) -> Option<Rewrite> {
    let value = raw_payload_mut(arena, id, &[Kind::BooleanLiteral])?;
    let boolean = match value.as_str()? {
        "true" => true,
        "false" => false,
        _ => return None,
    };
    *value = Value::Boolean(boolean);
    Some(Rewrite::Unchanged)
}

fn coerce_text(arena: &mut Arena, id: Id) -> Option<Rewrite> {
    let kind = arena[id].kind();
    let value = raw_payload_mut(
        arena,
        id,
        &[Kind::StringLiteral, Kind::IdentifierLiteral, Kind::KeywordLiteral],
    )?;
    let raw = value.as_str()?;

    *value = if kind == Kind::StringLiteral {
        let unquoted = raw
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(raw);
        Value::Text(unquoted.to_owned())
    } else {
        Value::Name(raw.to_owned())
    };
    Some(Rewrite::Unchanged)
}

/// The only child of an expression-like node, if the node is one.
fn sole_child_of_expression(arena: &Arena, id: Id) -> Option<Id> {
    let node = &arena[id];
    if !node.has_role(&[Role::Expression]) {
        return None;
    }
    match node.children()[..] {
        [child] => Some(child),
        _ => None,
    }
}

fn elide_expression_wrapper(arena: &mut Arena, id: Id) -> Option<Rewrite> {
    let child = sole_child_of_expression(arena, id)?;
    arena[child]
        .has_role(&[Role::Expression])
        .then_some(Rewrite::Replace(child))
}

fn elide_parentheses(arena: &mut Arena, id: Id) -> Option<Rewrite> {
    let node = &arena[id];
    if !node.has_role(&[Role::Expression]) {
        return None;
    }
    let [open, inner, close] = node.children()[..] else {
        return None;
    };

    let matches = arena[open].has_exact_kind(&[Kind::LeftParen])
        && arena[close].has_exact_kind(&[Kind::RightParen])
        && arena[inner].has_role(&[Role::Expression]);
    matches.then_some(Rewrite::Replace(inner))
}

fn elide_literal_wrapper(arena: &mut Arena, id: Id) -> Option<Rewrite> {
    let child = sole_child_of_expression(arena, id)?;
    arena[child]
        .has_role(&[Role::LiteralValue])
        .then_some(Rewrite::Replace(child))
}

fn strip_punctuation(arena: &mut Arena, id: Id) -> Option<Rewrite> {
    arena[id]
        .has_exact_kind(&[
            Kind::Comma,
            Kind::Semicolon,
            Kind::LeftBracket,
            Kind::RightBracket,
        ])
        .then_some(Rewrite::Remove)
}
