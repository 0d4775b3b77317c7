// SPDX-License-Identifier: Unlicense
//! Reader for sketches: a textual form of the shallow tree the language's
//! parser hands to the optimizer.
//!
//! ```text
//! # comment
//! (Program
//!   (Statement let x '=' (Expression 1 '+' 2) ';'))
//! ```
//!
//! `(Kind ...)` is a provisional grouping, a container or the program. Bare
//! numbers, `"strings"`, `true`/`false`, keywords and identifiers are leaves,
//! and punctuation or operators are quoted marks such as `'('` or `'<='`.
use crate::ast::{self, Kind, Node, NodeKind};
use anyhow::{anyhow, Result};
use std::cell::RefCell;

const KEYWORDS: &[&str] = &["let", "func", "class", "if", "else", "while", "return"];

#[derive(Debug)]
pub struct Context {
    pub file: String,
    pub arena: RefCell<ast::Arena>,
}

fn mark_kind(mark: &str) -> Option<Kind> {
    let kind = match mark {
        "(" => Kind::LeftParen,
        ")" => Kind::RightParen,
        "{" => Kind::LeftCurly,
        "}" => Kind::RightCurly,
        "[" => Kind::LeftBracket,
        "]" => Kind::RightBracket,
        "," => Kind::Comma,
        ";" => Kind::Semicolon,
        "." => Kind::Dot,
        "+" => Kind::PlusOperator,
        "-" => Kind::MinusOperator,
        "*" => Kind::MultOperator,
        "/" => Kind::DivdOperator,
        "%" => Kind::ModOperator,
        "^" => Kind::PowOperator,
        "<" => Kind::SmallerOperator,
        ">" => Kind::GreaterOperator,
        "<=" => Kind::SmallerEqualOperator,
        ">=" => Kind::GreaterEqualOperator,
        "==" => Kind::EqualOperator,
        "!=" => Kind::NotEqualOperator,
        "!" => Kind::NotOperator,
        "=" => Kind::AssignmentOperator,
        _ => return None,
    };
    Some(kind)
}

fn word_kind(word: &str) -> Kind {
    match word {
        "true" | "false" => Kind::BooleanLiteral,
        _ if KEYWORDS.contains(&word) => Kind::KeywordLiteral,
        _ => Kind::IdentifierLiteral,
    }
}

fn group_node(context: &Context, name: &str, children: Vec<ast::Id>) -> Result<Node, &'static str> {
    let kind = name.parse::<Kind>().map_err(|_| "group kind")?;
    let node_kind = match kind {
        Kind::Temporary
        | Kind::Expression
        | Kind::Statement
        | Kind::IfStatementPrimitive
        | Kind::MemberAccess => NodeKind::Primitive { kind, children },
        Kind::Block => NodeKind::Block(children),
        Kind::ArgumentList => NodeKind::ArgumentList(children),
        Kind::ExpressionList => NodeKind::ExpressionList(children),
        Kind::Program => NodeKind::Program(ast::Program {
            file: context.file.clone(),
            should_execute: true,
            body: children,
        }),
        _ => return Err("provisional, container or program kind"),
    };
    Ok(Node::new(node_kind))
}

peg::parser! {
    grammar sketch_parser(context: &Context) for str {
        #[cache]
        rule _() = quiet!{([' '|'\t'|'\r'|'\n'] / "#" [^'\n']*)*}

        rule node(r: rule<Node>) -> ast::Id = n: r() {
            let mut arena = context.arena.borrow_mut();
            let id = arena.alloc(n);
            ast::adopt(&mut arena, id);
            id
        }

        rule word() -> &'input str
            = $(['a'..='z' | 'A'..='Z' | '_'] ['a'..='z' | 'A'..='Z' | '0'..='9' | '_']*)

        rule number() -> &'input str = $(['0'..='9']+ ("." ['0'..='9']+)?)

        rule string() -> &'input str = "\"" s:$([^'"']*) "\"" { s }

        rule mark() -> &'input str = "'" m:$([^'\'']+) "'" { m }

        rule leaf() -> Node
            = s:string() { Node::terminal(Kind::StringLiteral, s) }
            / n:number() { Node::terminal(Kind::NumericLiteral, n) }
            / m:mark() {? mark_kind(m).map(|kind| Node::terminal(kind, m)).ok_or("punctuation or operator") }
            / w:word() { Node::terminal(word_kind(w), w) }

        rule group() -> Node
            = "(" _ name:word() _ children:(item() ** _) _ ")" {? group_node(context, name, children) }

        rule item() -> ast::Id = node(<group()>) / node(<leaf()>)

        pub rule tree() -> ast::Id = _ n:node(<group()>) _ { n }
    }
}

pub fn parse(file: &str, source: &str) -> Result<(ast::Arena, ast::Id)> {
    let context = Context {
        file: file.to_owned(),
        arena: RefCell::new(ast::Arena::new()),
    };
    let root = sketch_parser::tree(source, &context)
        .map_err(|e| anyhow!("failed to parse {}: {}", file, e))?;

    Ok((context.arena.take(), root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Role, Value};

    #[test]
    fn parser_should_read_nested_groups() -> Result<()> {
        let (arena, root) = parse(
            "main.sketch",
            r#"
            # a declaration
            (Program
              (Statement let x '=' (Expression 1.5 '<=' y) ';')
              (Statement print '(' (ExpressionList "hi") ')'))
            "#,
        )?;

        let NodeKind::Program(program) = &arena[root].kind else {
            return Err(anyhow!("root is not a program"));
        };
        assert_eq!(program.file, "main.sketch");
        assert_eq!(program.body.len(), 2);

        let kinds = arena[program.body[0]]
            .children()
            .into_iter()
            .map(|id| arena[id].kind())
            .collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![
                Kind::KeywordLiteral,
                Kind::IdentifierLiteral,
                Kind::AssignmentOperator,
                Kind::Expression,
                Kind::Semicolon,
            ]
        );
        Ok(())
    }

    #[test]
    fn parser_should_link_parents() -> Result<()> {
        let (arena, root) = parse("links.sketch", "(Program (Expression a '+' 2))")?;

        let expression = arena[root].children()[0];
        assert_eq!(arena[expression].parent, Some(root));
        for child in arena[expression].children() {
            assert_eq!(arena[child].parent, Some(expression));
        }
        assert_eq!(arena[root].parent, None);
        Ok(())
    }

    #[test]
    fn parser_should_keep_leaf_text_raw() -> Result<()> {
        let (arena, root) = parse("raw.sketch", "(Program 42 true \"s\" while)")?;

        let leaves = arena[root].children();
        assert_eq!(arena[leaves[0]].value(), Some(&Value::Raw("42".into())));
        assert_eq!(arena[leaves[1]].kind(), Kind::BooleanLiteral);
        assert_eq!(arena[leaves[2]].value(), Some(&Value::Raw("s".into())));
        assert!(arena[leaves[3]].has_role(&[Role::Keyword]));
        Ok(())
    }

    #[test]
    fn parser_should_reject_unknown_input() {
        assert!(parse("bad.sketch", "(Program '@')").is_err());
        assert!(parse("bad.sketch", "(Program (NumericLiteral 1))").is_err());
        assert!(parse("bad.sketch", "(Program (Statement x)").is_err());
        assert!(parse("bad.sketch", "(Nonsense)").is_err());
    }
}
