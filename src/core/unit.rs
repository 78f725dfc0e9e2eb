//! Normalized representation of the asynchronous code shapes the rules inspect.
//!
//! A [`CodeUnit`] is a closed set of shapes: a promise call chain, a function
//! body, a loop body, a reject call, an error-first callback declaration or a
//! promise constructor call. Units are produced by a front end (see
//! [`crate::analyzers::javascript`]) or built by hand, and are never mutated by
//! the classifier.
//!
//! The expression and statement trees keep only what the rules need. Anything
//! else collapses into [`ExprKind::Opaque`] or [`StmtKind::Other`], which still
//! carry their children so traversals see nested `await`s and calls.

use super::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Number(String),
    Bool(bool),
    Null,
    Undefined,
    Template,
    Regex,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignOp {
    /// `=`
    Plain,
    /// `+=`, `-=`, `??=` and friends; holds the operator text.
    Compound(String),
}

impl AssignOp {
    pub fn is_compound(&self) -> bool {
        matches!(self, AssignOp::Compound(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Ident(String),
    Literal(Literal),
    Array(Vec<Expr>),
    Object(Vec<Expr>),
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Member {
        object: Box<Expr>,
        property: String,
    },
    New {
        constructor: Box<Expr>,
        args: Vec<Expr>,
    },
    Await(Box<Expr>),
    Function(Box<FunctionBody>),
    Assign {
        target: Box<Expr>,
        op: AssignOp,
        value: Box<Expr>,
    },
    Binary {
        op: String,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: String,
        operand: Box<Expr>,
    },
    Opaque(Vec<Expr>),
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn ident(name: impl Into<String>, span: Span) -> Self {
        Self::new(ExprKind::Ident(name.into()), span)
    }

    pub fn as_ident(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionBody> {
        match &self.kind {
            ExprKind::Function(f) => Some(f),
            _ => None,
        }
    }

    /// `Promise.resolve(..)` style call: returns the property name when the
    /// callee is a member access on the identifier `object`.
    pub fn static_call_on(&self, object: &str) -> Option<&str> {
        let ExprKind::Call { callee, .. } = &self.kind else {
            return None;
        };
        match &callee.kind {
            ExprKind::Member {
                object: receiver,
                property,
            } if receiver.as_ident() == Some(object) => Some(property),
            _ => None,
        }
    }

    /// Name of the called identifier for a plain `name(..)` call.
    pub fn called_ident(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Call { callee, .. } => callee.as_ident(),
            _ => None,
        }
    }

    /// Leftmost identifier of a member chain (`a` in `a.b.c`).
    pub fn root_ident(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Ident(name) => Some(name),
            ExprKind::Member { object, .. } => object.root_ident(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Expr(Expr),
    /// One `let`/`const`/`var` declarator.
    Declare {
        name: String,
        init: Option<Expr>,
    },
    Return(Option<Expr>),
    Throw(Expr),
    If {
        condition: Expr,
        consequence: Vec<Stmt>,
        alternative: Vec<Stmt>,
    },
    Loop(Box<LoopBody>),
    Try {
        block: Vec<Stmt>,
        handler_param: Option<String>,
        handler: Vec<Stmt>,
        finalizer: Vec<Stmt>,
    },
    Block(Vec<Stmt>),
    Switch {
        discriminant: Expr,
        cases: Vec<SwitchCase>,
    },
    Break,
    Other {
        exprs: Vec<Expr>,
        stmts: Vec<Stmt>,
    },
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// One `case` clause; `test` is `None` for `default`.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub test: Option<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Concise arrow body; its value is returned implicitly.
    Expression(Expr),
    Block(Vec<Stmt>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionBody {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub is_async: bool,
    pub body: Body,
    pub span: Span,
}

impl FunctionBody {
    pub fn block(&self) -> Option<&[Stmt]> {
        match &self.body {
            Body::Block(stmts) => Some(stmts),
            Body::Expression(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopKind {
    For,
    ForIn,
    ForOf,
    ForAwaitOf,
    While,
    DoWhile,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoopBody {
    pub kind: LoopKind,
    /// Names bound by the loop header (`x` in `for (const x of xs)`).
    pub bindings: Vec<String>,
    /// Header expressions: init, condition, update or iterated value.
    pub header: Vec<Expr>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageKind {
    Then,
    Catch,
    Finally,
    Other(String),
}

impl StageKind {
    pub fn from_method(name: &str) -> Self {
        match name {
            "then" => StageKind::Then,
            "catch" => StageKind::Catch,
            "finally" => StageKind::Finally,
            other => StageKind::Other(other.to_string()),
        }
    }
}

/// One `.method(args)` link of a call chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainStage {
    pub kind: StageKind,
    pub args: Vec<Expr>,
    pub span: Span,
}

impl ChainStage {
    /// The handler functions written inline in this stage.
    pub fn inline_handlers(&self) -> impl Iterator<Item = &FunctionBody> {
        self.args.iter().filter_map(Expr::as_function)
    }
}

/// `receiver.then(..).catch(..)`; stages in call order.
#[derive(Debug, Clone, PartialEq)]
pub struct CallChain {
    pub receiver: Expr,
    pub stages: Vec<ChainStage>,
    pub span: Span,
    /// The chain's promise is returned, awaited, assigned or passed on, so
    /// rejection handling is the consumer's job.
    pub value_used: bool,
}

impl CallChain {
    /// Stages of the given kind together with their position in the chain.
    pub fn stages_of(&self, kind: StageKind) -> impl Iterator<Item = (usize, &ChainStage)> + '_ {
        self.stages
            .iter()
            .enumerate()
            .filter(move |(_, stage)| stage.kind == kind)
    }
}

/// `new Promise(executor)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorCall {
    pub constructor: String,
    pub executor: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectCallee {
    /// The executor's reject parameter, by name.
    ExecutorParam(String),
    /// `Promise.reject`
    PromiseReject,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RejectCall {
    pub callee: RejectCallee,
    pub argument: Option<Expr>,
    pub span: Span,
}

/// Function declared with the error-first callback convention.
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackDecl {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: Body,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    Chain,
    Function,
    Loop,
    RejectCall,
    Callback,
    ConstructorCall,
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            UnitKind::Chain => "chain",
            UnitKind::Function => "function",
            UnitKind::Loop => "loop",
            UnitKind::RejectCall => "reject-call",
            UnitKind::Callback => "callback",
            UnitKind::ConstructorCall => "constructor-call",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CodeUnit {
    Chain(CallChain),
    Function(FunctionBody),
    Loop(LoopBody),
    RejectCall(RejectCall),
    Callback(CallbackDecl),
    ConstructorCall(ConstructorCall),
}

impl CodeUnit {
    pub fn kind(&self) -> UnitKind {
        match self {
            CodeUnit::Chain(_) => UnitKind::Chain,
            CodeUnit::Function(_) => UnitKind::Function,
            CodeUnit::Loop(_) => UnitKind::Loop,
            CodeUnit::RejectCall(_) => UnitKind::RejectCall,
            CodeUnit::Callback(_) => UnitKind::Callback,
            CodeUnit::ConstructorCall(_) => UnitKind::ConstructorCall,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            CodeUnit::Chain(c) => c.span,
            CodeUnit::Function(f) => f.span,
            CodeUnit::Loop(l) => l.span,
            CodeUnit::RejectCall(r) => r.span,
            CodeUnit::Callback(c) => c.span,
            CodeUnit::ConstructorCall(c) => c.span,
        }
    }
}
