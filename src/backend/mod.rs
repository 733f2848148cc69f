//! # Backend
//!
//! Translation of a cooked [`Program`] into host source code happens in two
//! steps:
//!
//! 1. [`plan_program`] walks the graph once per function and lets the
//!    scope builder nest the definitions, producing a [`ProgramPlan`];
//! 2. a [`Backend`] renders the plan as text.
//!
//! The reference evaluator in [`crate::interpreter`] runs the same plan.

pub mod cpp;
pub mod haskell;
pub mod plan;
pub mod toolchain;
mod walk;
mod writer;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::info;

use crate::graph::{NodeId, Program};
use crate::scope::ScopeError;
use crate::types::{MatchError, Type};

pub use cpp::CppBackend;
pub use haskell::HaskellBackend;
pub use plan::{BranchLabel, Expr, FunctionPlan, ProgramPlan, Step};
pub use toolchain::{RunOutput, ToolError};
pub use walk::{MAIN, plan_program};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TranslateError {
    #[error("cannot type {context}: {source}")]
    TypeDeduction { context: String, source: MatchError },
    #[error("node {node}: brancher has {found} component(s), the node type has {expected}")]
    BrancherArity {
        node: NodeId,
        expected: usize,
        found: usize,
    },
    #[error("node {node}: the last pin must match every value")]
    NonExhaustive { node: NodeId },
    #[error("node {node}: pin {pin} leads nowhere")]
    DanglingPin { node: NodeId, pin: usize },
    #[error("node {node} is reachable from both `{first}` and `{second}`")]
    SharedNode {
        node: NodeId,
        first: String,
        second: String,
    },
    #[error("node {node} is defined where no scope is open")]
    Orphan { node: NodeId },
    #[error("node {node} joins inputs that can hold at the same time")]
    AmbiguousJoin { node: NodeId },
    #[error("unnamed root {node} has type {found}, expected ()")]
    MainInput { node: NodeId, found: Type },
    #[error("in `{function}`: {source}")]
    Scope { function: String, source: ScopeError },
}

/// Renders plans in one host language.
pub trait Backend {
    fn name(&self) -> &'static str;

    fn render(&self, plan: &ProgramPlan) -> String;

    /// File extension of rendered sources, without the dot.
    fn extension(&self) -> &'static str;

    /// Shell command building the source; `{input}` and `{output}` are
    /// replaced by the source file and the binary to produce.
    fn build_command(&self) -> &'static str;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub source: String,
    pub extension: String,
    pub build_command: String,
}

/// The built-in backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Target {
    #[default]
    Cpp,
    Haskell,
}

impl Target {
    pub fn backend(self) -> Box<dyn Backend> {
        match self {
            Target::Cpp => Box::new(CppBackend),
            Target::Haskell => Box::new(HaskellBackend),
        }
    }
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cpp" | "c++" => Ok(Target::Cpp),
            "haskell" | "hs" => Ok(Target::Haskell),
            other => Err(format!("unknown backend `{other}`")),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Target::Cpp => write!(f, "cpp"),
            Target::Haskell => write!(f, "haskell"),
        }
    }
}

pub fn translate(plan: &ProgramPlan, backend: &dyn Backend) -> Translation {
    let source = backend.render(plan);
    info!(
        backend = backend.name(),
        functions = plan.functions.len(),
        bytes = source.len(),
        "translated program"
    );
    Translation {
        source,
        extension: backend.extension().to_string(),
        build_command: backend.build_command().to_string(),
    }
}

/// Plan `program` with the given host libraries and imports, then render it.
pub fn compile(
    program: &Program,
    backend: &dyn Backend,
    libraries: &[String],
    imports: &[String],
) -> Result<Translation, TranslateError> {
    let mut plan = plan_program(program)?;
    plan.libraries = libraries.to_vec();
    plan.imports = imports.to_vec();
    Ok(translate(&plan, backend))
}
