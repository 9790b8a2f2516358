use serde::Serialize;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ValueNode {
    Number(i64),
    /// `$name`, read from the variable store at evaluation time
    Identifier(Rc<str>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ComparisonOp {
    Equals,
    NotEquals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogicalOp {
    Or,
    And,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ExprNode {
    Comparison {
        op: ComparisonOp,
        left: ValueNode,
        right: ValueNode,
    },
    /// Both sides are always evaluated; there is no short-circuiting.
    Logical {
        op: LogicalOp,
        left: Box<ExprNode>,
        right: Box<ExprNode>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ModificationOp {
    Add,
    Subtract,
    Multiply,
    Assign,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Stmt {
    Print,
    Delete {
        name: Rc<str>,
    },
    Call {
        name: Rc<str>,
    },
    Modify {
        op: ModificationOp,
        name: Rc<str>,
        value: ValueNode,
    },
    FunctionDeclaration {
        name: Rc<str>,
        body: Chain,
    },
    Condition {
        condition: ExprNode,
        body: Chain,
    },
    Loop {
        count: ValueNode,
        body: Chain,
    },
}

/// A sequence of statements: the whole program, or the body of a block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Chain {
    pub statements: Vec<Stmt>,
}

impl Chain {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}
