//! Immutable expression tree
//!
//! Front ends build this tree once; the evaluator only reads it. Children
//! are shared through `Arc`, so a continuation can hold on to the part of
//! the tree it still has to evaluate without copying it.

use std::fmt;
use std::sync::Arc;

use crate::value::{Fqn, Symbol, Value};

/// Shared reference to an expression.
pub type ExprRef = Arc<Expr>;

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `&&`, short-circuit
    And,
    /// `||`, short-circuit
    Or,
    /// `&`: bitwise and, set intersection, dict key intersection
    BitAnd,
    /// `|`: bitwise or, set union, dict union
    BitOr,
    /// `^`: bitwise xor, set and dict symmetric difference
    BitXor,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `++` sequence join
    Join,
    /// `<:` element onto the front of a sequence
    ConsLeft,
    /// `:>` element onto the back of a sequence
    ConsRight,
    /// `in` membership
    In,
}

impl BinaryOp {
    /// Source spelling of the operator.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Join => "++",
            BinaryOp::ConsLeft => "<:",
            BinaryOp::ConsRight => ":>",
            BinaryOp::In => "in",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `-`
    Neg,
    /// `!`
    Not,
    /// `~`
    BitNot,
}

impl UnaryOp {
    /// Source spelling of the operator.
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
        }
    }
}

/// Where a call appears in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// Source name
    pub source: Arc<str>,
    /// 1-based line
    pub line: u32,
    /// 1-based column
    pub column: u32,
}

impl SourceLocation {
    /// Create a location.
    pub fn new(source: &str, line: u32, column: u32) -> Self {
        Self {
            source: Arc::from(source),
            line,
            column,
        }
    }
}

/// An expression.
#[derive(Debug)]
pub enum Expr {
    /// A constant value
    Literal(Value),

    /// A name looked up in scope
    Identifier(String),

    /// `(a, b)`; elements are not forced
    Tuple(Vec<ExprRef>),

    /// `[a, b]`; elements are not forced
    Sequence(Vec<ExprRef>),

    /// `{a, b}`; waits for pending elements
    Set(Vec<ExprRef>),

    /// `{k = v}`; waits for pending keys and values
    Dict(Vec<(ExprRef, ExprRef)>),

    /// `left op right`
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        left: ExprRef,
        /// Right operand
        right: ExprRef,
    },

    /// `op operand`
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: ExprRef,
    },

    /// `if c then a else b`
    If {
        /// Condition, must be a boolean
        condition: ExprRef,
        /// Taken when true
        then_branch: ExprRef,
        /// Taken when false
        else_branch: ExprRef,
    },

    /// `let p1 = e1; p2 = e2 in body`
    Let {
        /// Bindings, evaluated in order
        bindings: Arc<[LetBinding]>,
        /// Body evaluated with all bindings in scope
        body: ExprRef,
    },

    /// `do step; step; ... end`
    Do(Arc<[DoStep]>),

    /// `case scrutinee of arms`
    Case {
        /// Matched value
        scrutinee: ExprRef,
        /// Arms in source order
        arms: Arc<[CaseArm]>,
    },

    /// `\params -> body`
    Lambda(Arc<Lambda>),

    /// `callee arg1 arg2`
    Call {
        /// Function expression
        callee: ExprRef,
        /// Arguments
        args: Vec<ExprRef>,
        /// Call site, for stack traces
        location: Option<SourceLocation>,
    },

    /// A module declaration
    Module(Arc<ModuleDecl>),

    /// A module looked up by name in the registry
    ModuleRef(Fqn),

    /// `module.function`
    FunctionRef {
        /// Module expression
        module: ExprRef,
        /// Function name
        name: String,
    },

    /// `async fn`: run a zero-argument function on a worker
    Async(ExprRef),

    /// `raise :tag message`
    Raise {
        /// Error tag
        tag: Symbol,
        /// Message expression, must produce text
        message: ExprRef,
    },

    /// `try body catch arms`; arms match `(tag, message, stack)`
    Try {
        /// Protected expression
        body: ExprRef,
        /// Handlers
        arms: Arc<[CaseArm]>,
    },
}

/// A `let` or `do` binding.
#[derive(Debug, Clone)]
pub struct LetBinding {
    /// Pattern the value must match
    pub pattern: Pattern,
    /// Bound expression
    pub value: ExprRef,
}

impl LetBinding {
    /// Create a binding.
    pub fn new(pattern: Pattern, value: ExprRef) -> Self {
        Self { pattern, value }
    }
}

/// One step of a `do` block.
#[derive(Debug, Clone)]
pub enum DoStep {
    /// `pattern = expr`
    Bind(LetBinding),
    /// A plain expression
    Eval(ExprRef),
}

/// One `case` or `catch` arm.
#[derive(Debug, Clone)]
pub struct CaseArm {
    /// Pattern matched against the scrutinee
    pub pattern: Pattern,
    /// What runs on a match
    pub body: ArmBody,
}

/// Right-hand side of an arm.
#[derive(Debug, Clone)]
pub enum ArmBody {
    /// `pattern -> body`
    Expr(ExprRef),
    /// `pattern | g1 -> b1 | g2 -> b2`; the first true guard wins
    Guarded(Vec<GuardedBody>),
}

/// A guard with its body.
#[derive(Debug, Clone)]
pub struct GuardedBody {
    /// Boolean guard
    pub guard: ExprRef,
    /// Body when the guard holds
    pub body: ExprRef,
}

impl CaseArm {
    /// `pattern -> body`
    pub fn new(pattern: Pattern, body: ExprRef) -> Self {
        Self {
            pattern,
            body: ArmBody::Expr(body),
        }
    }

    /// `pattern | guard -> body | ...`
    pub fn guarded(pattern: Pattern, alternatives: Vec<(ExprRef, ExprRef)>) -> Self {
        Self {
            pattern,
            body: ArmBody::Guarded(
                alternatives
                    .into_iter()
                    .map(|(guard, body)| GuardedBody { guard, body })
                    .collect(),
            ),
        }
    }
}

/// A lambda expression.
#[derive(Debug)]
pub struct Lambda {
    /// Name, when bound by `let` (enables recursion)
    pub name: Option<String>,
    /// Parameter names
    pub params: Vec<String>,
    /// Body
    pub body: ExprRef,
}

/// A function inside a module declaration.
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    /// Function name
    pub name: String,
    /// Parameter names
    pub params: Vec<String>,
    /// Body
    pub body: ExprRef,
}

impl FunctionDecl {
    /// Create a declaration.
    pub fn new(name: &str, params: &[&str], body: ExprRef) -> Self {
        Self {
            name: name.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
            body,
        }
    }
}

/// A module declaration.
#[derive(Debug)]
pub struct ModuleDecl {
    /// Fully-qualified name
    pub fqn: Fqn,
    /// Exported function names
    pub exports: Vec<String>,
    /// Declared functions
    pub functions: Vec<FunctionDecl>,
}

/// A structural pattern.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Matches an equal value
    Literal(Value),

    /// `_`
    Wildcard,

    /// A name; binds, or compares when the name is already bound
    Binding(String),

    /// `name@(sub)`
    Alias(String, Box<Pattern>),

    /// `(p1, p2)` with exact arity
    Tuple(Vec<Pattern>),

    /// `[p1, p2]` with exact length
    Sequence(Vec<Pattern>),

    /// `h1 <: h2 <: rest :> t1 :> t2`
    Cons {
        /// Heads taken from the front
        front: Vec<Pattern>,
        /// Pattern for the remaining middle
        rest: Box<Pattern>,
        /// Heads taken from the back, in sequence order
        back: Vec<Pattern>,
    },

    /// `{k1 = p1, k2 = p2}`; `{}` matches only an empty dict
    Dict(Vec<(ExprRef, Pattern)>),

    /// `pattern | guard`
    Guarded(Box<Pattern>, ExprRef),
}

// ═══════════════════════════════════════════════════════════════════════
// Builders
// ═══════════════════════════════════════════════════════════════════════

impl Expr {
    /// A literal.
    pub fn lit(value: impl Into<Value>) -> ExprRef {
        Arc::new(Expr::Literal(value.into()))
    }

    /// An integer literal.
    pub fn int(n: i64) -> ExprRef {
        Self::lit(Value::Integer(n))
    }

    /// A text literal.
    pub fn text(s: &str) -> ExprRef {
        Self::lit(Value::string(s))
    }

    /// An identifier.
    pub fn ident(name: &str) -> ExprRef {
        Arc::new(Expr::Identifier(name.to_string()))
    }

    /// A tuple constructor.
    pub fn tuple(items: Vec<ExprRef>) -> ExprRef {
        Arc::new(Expr::Tuple(items))
    }

    /// A sequence constructor.
    pub fn seq(items: Vec<ExprRef>) -> ExprRef {
        Arc::new(Expr::Sequence(items))
    }

    /// A set constructor.
    pub fn set(items: Vec<ExprRef>) -> ExprRef {
        Arc::new(Expr::Set(items))
    }

    /// A dictionary constructor.
    pub fn dict(pairs: Vec<(ExprRef, ExprRef)>) -> ExprRef {
        Arc::new(Expr::Dict(pairs))
    }

    /// A binary operation.
    pub fn binary(op: BinaryOp, left: ExprRef, right: ExprRef) -> ExprRef {
        Arc::new(Expr::Binary { op, left, right })
    }

    /// A unary operation.
    pub fn unary(op: UnaryOp, operand: ExprRef) -> ExprRef {
        Arc::new(Expr::Unary { op, operand })
    }

    /// A conditional.
    pub fn if_else(condition: ExprRef, then_branch: ExprRef, else_branch: ExprRef) -> ExprRef {
        Arc::new(Expr::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    /// A `let` expression.
    pub fn let_in(bindings: Vec<LetBinding>, body: ExprRef) -> ExprRef {
        Arc::new(Expr::Let {
            bindings: bindings.into(),
            body,
        })
    }

    /// A `do` block.
    pub fn do_block(steps: Vec<DoStep>) -> ExprRef {
        Arc::new(Expr::Do(steps.into()))
    }

    /// A `case` expression.
    pub fn case(scrutinee: ExprRef, arms: Vec<CaseArm>) -> ExprRef {
        Arc::new(Expr::Case {
            scrutinee,
            arms: arms.into(),
        })
    }

    /// An anonymous lambda.
    pub fn lambda(params: &[&str], body: ExprRef) -> ExprRef {
        Arc::new(Expr::Lambda(Arc::new(Lambda {
            name: None,
            params: params.iter().map(|p| p.to_string()).collect(),
            body,
        })))
    }

    /// A call without location.
    pub fn call(callee: ExprRef, args: Vec<ExprRef>) -> ExprRef {
        Arc::new(Expr::Call {
            callee,
            args,
            location: None,
        })
    }

    /// A call with a source location.
    pub fn call_at(callee: ExprRef, args: Vec<ExprRef>, location: SourceLocation) -> ExprRef {
        Arc::new(Expr::Call {
            callee,
            args,
            location: Some(location),
        })
    }

    /// A module declaration.
    pub fn module(fqn: &str, exports: &[&str], functions: Vec<FunctionDecl>) -> ExprRef {
        Arc::new(Expr::Module(Arc::new(ModuleDecl {
            fqn: Fqn::parse(fqn),
            exports: exports.iter().map(|e| e.to_string()).collect(),
            functions,
        })))
    }

    /// A module looked up by name.
    pub fn module_ref(fqn: &str) -> ExprRef {
        Arc::new(Expr::ModuleRef(Fqn::parse(fqn)))
    }

    /// A qualified function reference.
    pub fn function_ref(module: ExprRef, name: &str) -> ExprRef {
        Arc::new(Expr::FunctionRef {
            module,
            name: name.to_string(),
        })
    }

    /// An `async` block.
    pub fn spawn(function: ExprRef) -> ExprRef {
        Arc::new(Expr::Async(function))
    }

    /// A `raise` expression.
    pub fn raise(tag: &str, message: ExprRef) -> ExprRef {
        Arc::new(Expr::Raise {
            tag: Symbol::intern(tag),
            message,
        })
    }

    /// A `try`/`catch` expression.
    pub fn try_catch(body: ExprRef, arms: Vec<CaseArm>) -> ExprRef {
        Arc::new(Expr::Try {
            body,
            arms: arms.into(),
        })
    }

    /// Human-readable node kind, used in traces.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Literal(_) => "literal",
            Expr::Identifier(_) => "identifier",
            Expr::Tuple(_) => "tuple",
            Expr::Sequence(_) => "sequence",
            Expr::Set(_) => "set",
            Expr::Dict(_) => "dict",
            Expr::Binary { .. } => "binary operation",
            Expr::Unary { .. } => "unary operation",
            Expr::If { .. } => "if",
            Expr::Let { .. } => "let",
            Expr::Do(_) => "do",
            Expr::Case { .. } => "case",
            Expr::Lambda(_) => "lambda",
            Expr::Call { .. } => "call",
            Expr::Module(_) => "module",
            Expr::ModuleRef(_) => "module reference",
            Expr::FunctionRef { .. } => "function reference",
            Expr::Async(_) => "async",
            Expr::Raise { .. } => "raise",
            Expr::Try { .. } => "try",
        }
    }
}

impl Pattern {
    /// A literal pattern.
    pub fn lit(value: impl Into<Value>) -> Self {
        Pattern::Literal(value.into())
    }

    /// A binding pattern.
    pub fn bind(name: &str) -> Self {
        Pattern::Binding(name.to_string())
    }

    /// `name@(pattern)`
    pub fn alias(name: &str, pattern: Pattern) -> Self {
        Pattern::Alias(name.to_string(), Box::new(pattern))
    }

    /// A tuple pattern.
    pub fn tuple(items: Vec<Pattern>) -> Self {
        Pattern::Tuple(items)
    }

    /// An exact-length sequence pattern.
    pub fn seq(items: Vec<Pattern>) -> Self {
        Pattern::Sequence(items)
    }

    /// `h1 <: h2 <: tail`
    pub fn head_tail(heads: Vec<Pattern>, tail: Pattern) -> Self {
        Self::cons(heads, tail, Vec::new())
    }

    /// `tail :> t1 :> t2`
    pub fn tail_head(tail: Pattern, heads: Vec<Pattern>) -> Self {
        Self::cons(Vec::new(), tail, heads)
    }

    /// `h <: rest :> t`
    pub fn cons(front: Vec<Pattern>, rest: Pattern, back: Vec<Pattern>) -> Self {
        Pattern::Cons {
            front,
            rest: Box::new(rest),
            back,
        }
    }

    /// A dictionary pattern.
    pub fn dict(entries: Vec<(ExprRef, Pattern)>) -> Self {
        Pattern::Dict(entries)
    }

    /// `pattern | guard`
    pub fn guarded(pattern: Pattern, guard: ExprRef) -> Self {
        Pattern::Guarded(Box::new(pattern), guard)
    }
}
