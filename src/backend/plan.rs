//! Host-neutral form of a translated program: per function, a tree of
//! scopes whose definitions bind one variable per node.

use std::fmt;

use crate::graph::Pattern;
use crate::morphism::Value;
use crate::scope::Block;
use crate::types::Type;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Var(String),
    Lit(Value),
    /// `func` applied to `args` in parameter order. `None` is a hole; holes
    /// and missing trailing arguments make the result a function.
    Call {
        func: String,
        arity: usize,
        args: Vec<Option<Expr>>,
    },
    Tuple(Vec<Expr>),
    Lambda {
        param: String,
        body: Box<Expr>,
    },
}

impl Expr {
    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var(name.into())
    }

    pub fn call(func: impl Into<String>, args: Vec<Expr>) -> Self {
        let args: Vec<Option<Expr>> = args.into_iter().map(Some).collect();
        Expr::Call {
            func: func.into(),
            arity: args.len(),
            args,
        }
    }

    /// Number of parameters a call still waits for.
    pub fn missing(&self) -> usize {
        match self {
            Expr::Call { arity, args, .. } => {
                let holes = args.iter().filter(|arg| arg.is_none()).count();
                holes + arity.saturating_sub(args.len())
            }
            _ => 0,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Var(name) => write!(f, "{name}"),
            Expr::Lit(value) => write!(f, "{value}"),
            Expr::Call { func, args, .. } => {
                write!(f, "{func}(")?;
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    match arg {
                        Some(arg) => write!(f, "{arg}")?,
                        None => write!(f, "_")?,
                    }
                }
                write!(f, ")")
            }
            Expr::Tuple(items) => {
                write!(f, "(")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
            Expr::Lambda { param, body } => write!(f, "\\{param} -> {body}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Bind { var: String, ty: Type, expr: Expr },
    /// Names the components of a tuple variable `vN` as `vN_0`, `vN_1`, ...
    Unpack {
        tuple: String,
        vars: Vec<String>,
        ty: Type,
    },
    Return(Expr),
}

/// How a child block is selected; the subject is the branching node's
/// variable.
#[derive(Debug, Clone, PartialEq)]
pub enum BranchLabel {
    Otherwise,
    Pattern {
        subject: String,
        pattern: Pattern,
        ty: Type,
    },
    Guard(Expr),
}

impl BranchLabel {
    pub fn is_irrefutable(&self) -> bool {
        match self {
            BranchLabel::Otherwise => true,
            BranchLabel::Pattern { pattern, .. } => pattern.is_irrefutable(),
            BranchLabel::Guard(_) => false,
        }
    }
}

pub type Body = Block<Step, BranchLabel>;

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionPlan {
    pub name: String,
    /// `None` for `main`, whose roots take no input.
    pub param: Option<String>,
    pub param_type: Type,
    pub result_type: Type,
    pub body: Body,
}

impl FunctionPlan {
    pub fn is_main(&self) -> bool {
        self.param.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgramPlan {
    pub functions: Vec<FunctionPlan>,
    /// Host libraries to include or link.
    pub libraries: Vec<String>,
    /// Host modules to import.
    pub imports: Vec<String>,
}

impl ProgramPlan {
    pub fn function(&self, name: &str) -> Option<&FunctionPlan> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn main(&self) -> Option<&FunctionPlan> {
        self.functions.iter().find(|f| f.is_main())
    }
}

/// Variable holding the value of node `index`.
pub fn node_var(index: usize) -> String {
    format!("v{index}")
}

pub fn component_var(tuple: &str, index: usize) -> String {
    format!("{tuple}_{index}")
}
