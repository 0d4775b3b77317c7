// SPDX-License-Identifier: Unlicense
use std::{fmt, time::Duration};

/// Concrete construct a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
pub enum Kind {
    // Terminals
    NumericLiteral,
    StringLiteral,
    BooleanLiteral,
    IdentifierLiteral,
    KeywordLiteral,
    LeftParen,
    RightParen,
    LeftCurly,
    RightCurly,
    LeftBracket,
    RightBracket,
    Comma,
    Semicolon,
    Dot,
    PlusOperator,
    MinusOperator,
    MultOperator,
    DivdOperator,
    ModOperator,
    PowOperator,
    SmallerOperator,
    GreaterOperator,
    SmallerEqualOperator,
    GreaterEqualOperator,
    EqualOperator,
    NotEqualOperator,
    NotOperator,
    AssignmentOperator,

    // Provisional groupings handed over by the parser
    Temporary,
    Expression,
    Statement,
    IfStatementPrimitive,
    MemberAccess,

    // Containers
    Block,
    Program,
    ArgumentList,
    ExpressionList,

    // Promoted constructs
    UnaryExpression,
    BinaryExpression,
    ComparisonExpression,
    VariableDeclaration,
    VariableInitialisation,
    VariableAssignment,
    ArrayIndexWrite,
    CallExpression,
    MemberExpression,
    FunctionLiteral,
    FunctionDefinition,
    ClassLiteral,
    ClassDefinition,
    IfStatement,
    WhileStatement,
}

/// Overlapping classifications a kind can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
pub enum Role {
    Terminal,
    LiteralValue,
    Keyword,
    Punctuation,
    Operator,
    ArithmeticOperator,
    ComparisonOperator,
    Primitive,
    Expression,
    Statement,
}

impl Kind {
    pub fn is(self, role: Role) -> bool {
        use Kind::*;

        match role {
            Role::Terminal => {
                self.is(Role::LiteralValue)
                    || self.is(Role::Keyword)
                    || self.is(Role::Punctuation)
                    || self.is(Role::Operator)
            }
            Role::LiteralValue => matches!(
                self,
                NumericLiteral | StringLiteral | BooleanLiteral | IdentifierLiteral
            ),
            Role::Keyword => self == KeywordLiteral,
            Role::Punctuation => matches!(
                self,
                LeftParen
                    | RightParen
                    | LeftCurly
                    | RightCurly
                    | LeftBracket
                    | RightBracket
                    | Comma
                    | Semicolon
                    | Dot
            ),
            Role::Operator => {
                self.is(Role::ArithmeticOperator)
                    || self.is(Role::ComparisonOperator)
                    || matches!(self, NotOperator | AssignmentOperator)
            }
            Role::ArithmeticOperator => matches!(
                self,
                PlusOperator | MinusOperator | MultOperator | DivdOperator | ModOperator | PowOperator
            ),
            Role::ComparisonOperator => matches!(
                self,
                SmallerOperator
                    | GreaterOperator
                    | SmallerEqualOperator
                    | GreaterEqualOperator
                    | EqualOperator
                    | NotEqualOperator
            ),
            Role::Primitive => matches!(
                self,
                Temporary | Expression | Statement | IfStatementPrimitive | MemberAccess
            ),
            Role::Expression => matches!(
                self,
                Expression
                    | MemberAccess
                    | UnaryExpression
                    | BinaryExpression
                    | ComparisonExpression
                    | VariableAssignment
                    | ArrayIndexWrite
                    | CallExpression
                    | MemberExpression
                    | FunctionLiteral
                    | ClassLiteral
            ),
            Role::Statement => matches!(
                self,
                Statement
                    | IfStatementPrimitive
                    | IfStatement
                    | WhileStatement
                    | VariableDeclaration
                    | VariableInitialisation
                    | FunctionDefinition
                    | ClassDefinition
            ),
        }
    }
}

/// Leaf payload. Starts out as the raw token text and is coerced by the
/// structure phase.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Raw(String),
    Number(f64),
    Boolean(bool),
    Text(String),
    Name(String),
}

impl Value {
    pub fn is_raw(&self) -> bool {
        matches!(self, Value::Raw(_))
    }

    /// Textual form of raw, string and name payloads.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Raw(s) | Value::Text(s) | Value::Name(s) => Some(s),
            Value::Number(_) | Value::Boolean(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Raw(s) | Value::Text(s) | Value::Name(s) => f.write_str(s),
            Value::Number(n) => write!(f, "{n}"),
            Value::Boolean(b) => write!(f, "{b}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Terminal {
    pub kind: Kind,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub file: String,
    pub should_execute: bool,
    pub body: Vec<Id>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Terminal(Terminal),
    /// Provisional grouping, addressed only by position until promoted.
    Primitive {
        kind: Kind,
        children: Vec<Id>,
    },
    Block(Vec<Id>),
    Program(Program),
    ArgumentList(Vec<Id>),
    ExpressionList(Vec<Id>),
    Unary {
        operator: Id,
        operand: Id,
    },
    Binary {
        operator: Id,
        left: Id,
        right: Id,
    },
    Comparison {
        operator: Id,
        left: Id,
        right: Id,
    },
    VariableDeclaration {
        identifier: Id,
    },
    VariableInitialisation {
        identifier: Id,
        expression: Id,
    },
    VariableAssignment {
        target: Id,
        value: Id,
    },
    ArrayIndexWrite {
        array: Id,
        index: Id,
        value: Id,
    },
    Call {
        callee: Id,
        arguments: Id,
    },
    Member {
        object: Id,
        property: Id,
    },
    FunctionLiteral {
        name: Option<Id>,
        parameters: Id,
        body: Id,
    },
    FunctionDefinition {
        function: Id,
    },
    ClassLiteral {
        name: Id,
        constructor: Option<Id>,
        body: Id,
    },
    ClassDefinition {
        class: Id,
    },
    If {
        test: Id,
        consequent: Id,
        /// A block, or a nested if statement for `elseif` chains
        alternate: Option<Id>,
    },
    While {
        test: Id,
        consequent: Id,
    },
}

enum SlotMut<'a> {
    One(&'a mut Id),
    Maybe(&'a mut Option<Id>),
    Many(&'a mut Vec<Id>),
}

impl NodeKind {
    pub fn kind(&self) -> Kind {
        match self {
            NodeKind::Terminal(t) => t.kind,
            NodeKind::Primitive { kind, .. } => *kind,
            NodeKind::Block(_) => Kind::Block,
            NodeKind::Program(_) => Kind::Program,
            NodeKind::ArgumentList(_) => Kind::ArgumentList,
            NodeKind::ExpressionList(_) => Kind::ExpressionList,
            NodeKind::Unary { .. } => Kind::UnaryExpression,
            NodeKind::Binary { .. } => Kind::BinaryExpression,
            NodeKind::Comparison { .. } => Kind::ComparisonExpression,
            NodeKind::VariableDeclaration { .. } => Kind::VariableDeclaration,
            NodeKind::VariableInitialisation { .. } => Kind::VariableInitialisation,
            NodeKind::VariableAssignment { .. } => Kind::VariableAssignment,
            NodeKind::ArrayIndexWrite { .. } => Kind::ArrayIndexWrite,
            NodeKind::Call { .. } => Kind::CallExpression,
            NodeKind::Member { .. } => Kind::MemberExpression,
            NodeKind::FunctionLiteral { .. } => Kind::FunctionLiteral,
            NodeKind::FunctionDefinition { .. } => Kind::FunctionDefinition,
            NodeKind::ClassLiteral { .. } => Kind::ClassLiteral,
            NodeKind::ClassDefinition { .. } => Kind::ClassDefinition,
            NodeKind::If { .. } => Kind::IfStatement,
            NodeKind::While { .. } => Kind::WhileStatement,
        }
    }

    /// Children in source order.
    pub fn children(&self) -> Vec<Id> {
        match self {
            NodeKind::Terminal(_) => vec![],
            NodeKind::Primitive { children, .. }
            | NodeKind::Block(children)
            | NodeKind::ArgumentList(children)
            | NodeKind::ExpressionList(children) => children.clone(),
            NodeKind::Program(program) => program.body.clone(),
            NodeKind::Unary { operator, operand } => vec![*operator, *operand],
            NodeKind::Binary {
                operator,
                left,
                right,
            }
            | NodeKind::Comparison {
                operator,
                left,
                right,
            } => vec![*left, *operator, *right],
            NodeKind::VariableDeclaration { identifier } => vec![*identifier],
            NodeKind::VariableInitialisation {
                identifier,
                expression,
            } => vec![*identifier, *expression],
            NodeKind::VariableAssignment { target, value } => vec![*target, *value],
            NodeKind::ArrayIndexWrite {
                array,
                index,
                value,
            } => vec![*array, *index, *value],
            NodeKind::Call { callee, arguments } => vec![*callee, *arguments],
            NodeKind::Member { object, property } => vec![*object, *property],
            NodeKind::FunctionLiteral {
                name,
                parameters,
                body,
            } => name.iter().copied().chain([*parameters, *body]).collect(),
            NodeKind::FunctionDefinition { function } => vec![*function],
            NodeKind::ClassLiteral {
                name,
                constructor,
                body,
            } => std::iter::once(*name)
                .chain(*constructor)
                .chain([*body])
                .collect(),
            NodeKind::ClassDefinition { class } => vec![*class],
            NodeKind::If {
                test,
                consequent,
                alternate,
            } => [*test, *consequent].into_iter().chain(*alternate).collect(),
            NodeKind::While { test, consequent } => vec![*test, *consequent],
        }
    }

    fn slots_mut(&mut self) -> Vec<SlotMut<'_>> {
        use SlotMut::*;

        match self {
            NodeKind::Terminal(_) => vec![],
            NodeKind::Primitive { children, .. }
            | NodeKind::Block(children)
            | NodeKind::ArgumentList(children)
            | NodeKind::ExpressionList(children) => vec![Many(children)],
            NodeKind::Program(program) => vec![Many(&mut program.body)],
            NodeKind::Unary { operator, operand } => vec![One(operator), One(operand)],
            NodeKind::Binary {
                operator,
                left,
                right,
            }
            | NodeKind::Comparison {
                operator,
                left,
                right,
            } => vec![One(left), One(operator), One(right)],
            NodeKind::VariableDeclaration { identifier } => vec![One(identifier)],
            NodeKind::VariableInitialisation {
                identifier,
                expression,
            } => vec![One(identifier), One(expression)],
            NodeKind::VariableAssignment { target, value } => vec![One(target), One(value)],
            NodeKind::ArrayIndexWrite {
                array,
                index,
                value,
            } => vec![One(array), One(index), One(value)],
            NodeKind::Call { callee, arguments } => vec![One(callee), One(arguments)],
            NodeKind::Member { object, property } => vec![One(object), One(property)],
            NodeKind::FunctionLiteral {
                name,
                parameters,
                body,
            } => vec![Maybe(name), One(parameters), One(body)],
            NodeKind::FunctionDefinition { function } => vec![One(function)],
            NodeKind::ClassLiteral {
                name,
                constructor,
                body,
            } => vec![One(name), Maybe(constructor), One(body)],
            NodeKind::ClassDefinition { class } => vec![One(class)],
            NodeKind::If {
                test,
                consequent,
                alternate,
            } => vec![One(test), One(consequent), Maybe(alternate)],
            NodeKind::While { test, consequent } => vec![One(test), One(consequent)],
        }
    }

    /// Writes back visited children, aligned with [`NodeKind::children`].
    /// `None` excises the child: sequences are compacted and optional fields
    /// cleared. A required field cannot be vacated and keeps its old child.
    pub fn set_children(&mut self, visited: Vec<Option<Id>>) {
        let mut visited = visited.into_iter();

        for slot in self.slots_mut() {
            match slot {
                SlotMut::One(id) => {
                    if let Some(Some(new)) = visited.next() {
                        *id = new;
                    }
                }
                SlotMut::Maybe(id) => {
                    if id.is_some() {
                        *id = visited.next().flatten();
                    }
                }
                SlotMut::Many(ids) => {
                    let len = ids.len();
                    *ids = visited.by_ref().take(len).flatten().collect();
                }
            }
        }
    }

    /// Mutable access to the positional child list of provisional nodes and
    /// containers.
    pub fn sequence_mut(&mut self) -> Option<&mut Vec<Id>> {
        match self {
            NodeKind::Primitive { children, .. }
            | NodeKind::Block(children)
            | NodeKind::ArgumentList(children)
            | NodeKind::ExpressionList(children) => Some(children),
            NodeKind::Program(program) => Some(&mut program.body),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<Id>,
    pub build_time: Option<Duration>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            build_time: None,
        }
    }

    pub fn terminal(kind: Kind, raw: impl Into<String>) -> Self {
        Self::new(NodeKind::Terminal(Terminal {
            kind,
            value: Value::Raw(raw.into()),
        }))
    }

    pub fn primitive(kind: Kind, children: Vec<Id>) -> Self {
        Self::new(NodeKind::Primitive { kind, children })
    }

    pub fn kind(&self) -> Kind {
        self.kind.kind()
    }

    pub fn children(&self) -> Vec<Id> {
        self.kind.children()
    }

    pub fn value(&self) -> Option<&Value> {
        match &self.kind {
            NodeKind::Terminal(t) => Some(&t.value),
            _ => None,
        }
    }

    /// True if the node belongs to any of the given classifications.
    pub fn has_role(&self, roles: &[Role]) -> bool {
        let kind = self.kind();
        roles.iter().any(|role| kind.is(*role))
    }

    /// True if the node's discriminant is any of the given kinds.
    pub fn has_exact_kind(&self, kinds: &[Kind]) -> bool {
        kinds.contains(&self.kind())
    }

    /// True for a keyword literal spelling `word`.
    pub fn is_keyword(&self, word: &str) -> bool {
        self.kind() == Kind::KeywordLiteral && self.value().and_then(Value::as_str) == Some(word)
    }
}

pub type Id = id_arena::Id<Node>;
pub type Arena = id_arena::Arena<Node>;

/// Points every child of `parent` back at it.
pub fn adopt(arena: &mut Arena, parent: Id) {
    for child in arena[parent].children() {
        arena[child].parent = Some(parent);
    }
}

/// Allocates a composite node and links its children to it.
pub fn promote(arena: &mut Arena, kind: NodeKind) -> Id {
    let id = arena.alloc(Node::new(kind));
    adopt(arena, id);
    id
}
