//! Typed syntax tree produced by the transpiler.

use smol_str::SmolStr;

/// Operators with two operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    Xor,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl BinaryOp {
    /// Symbol in the rendered snippet.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::Xor => "^",
            BinaryOp::And => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "EXPT",
        }
    }

    #[must_use]
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    #[must_use]
    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::Or | BinaryOp::Xor | BinaryOp::And)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    Plus,
}

/// One step after the root of a place.
#[derive(Debug, Clone, PartialEq)]
pub enum Access {
    Field(SmolStr),
    Index(Box<Expr>),
}

/// Assignable location: a variable followed by field and index accesses.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub root: SmolStr,
    pub path: Vec<Access>,
}

impl Place {
    pub fn var(root: impl Into<SmolStr>) -> Self {
        Self {
            root: root.into(),
            path: Vec::new(),
        }
    }
}

/// Call argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Positional(Expr),
    /// `NAME := value`
    Named { name: SmolStr, value: Expr },
    /// `NAME => target`
    Output { name: SmolStr, target: Place },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Bool(bool),
    Int(i64),
    Real(f64),
    Str(SmolStr),
    /// Duration literal in milliseconds.
    Duration(i64),
    /// DATE, TOD and DT literals in 100 ns ticks.
    Ticks(i64),
    /// `Type#Member`, already resolved to its ordinal.
    EnumMember {
        type_name: SmolStr,
        member: SmolStr,
        ordinal: i32,
    },
    Place(Place),
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        name: SmolStr,
        args: Vec<Arg>,
    },
    /// Construct that could not be translated; reported when compiling.
    Invalid(SmolStr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaseLabel {
    Single(Expr),
    Range(Expr, Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseArm {
    pub labels: Vec<CaseLabel>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Assign {
        target: Place,
        value: Expr,
    },
    /// Function block invocation or function call used as a statement.
    Call {
        callee: Place,
        args: Vec<Arg>,
    },
    If {
        branches: Vec<(Expr, Vec<Stmt>)>,
        else_body: Vec<Stmt>,
    },
    Case {
        selector: Expr,
        arms: Vec<CaseArm>,
        else_body: Vec<Stmt>,
    },
    For {
        var: Place,
        from: Expr,
        to: Expr,
        by: Option<Expr>,
        body: Vec<Stmt>,
    },
    While {
        cond: Expr,
        body: Vec<Stmt>,
    },
    Repeat {
        body: Vec<Stmt>,
        until: Expr,
    },
    Exit,
    Continue,
    Return,
    Invalid(SmolStr),
}

/// Statement with the 1-based source line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub line: usize,
    pub kind: StmtKind,
}

impl Stmt {
    pub fn new(line: usize, kind: StmtKind) -> Self {
        Self { line, kind }
    }
}
