//! # morphc - compiler backend for typed dataflow graphs
//!
//! Programs are graphs of typed nodes joined by arrows that carry small
//! transformation expressions (morphisms). Output pins labelled with
//! patterns or guards express branching. `morphc` turns such a graph into
//! structured source code, either C++17 or Haskell.
//!
//! ## Pipeline
//!
//! ```text
//! layout JSON ──[layout]──> RawGraph
//!     ↓
//! [cook] resolve types and symbols, parse morphisms, match types ──> Program
//!     ↓
//! [backend::plan_program] graph walk + scope builder ──> ProgramPlan
//!     ↓                                 ↓
//! [Backend::render] ──> Translation     [interpreter] ──> RValue
//!     ↓
//! [backend::toolchain] build and run
//! ```
//!
//! ## Key Design Decisions
//!
//! ### Matching, not unification
//! Types flow one way. A morphism's parameter types are patterns matched
//! against the concrete types of the nodes it connects ([`types::match_types`]),
//! so polymorphic builtins specialize without a global inference pass.
//!
//! ### Conditions drive scopes
//! Every definition carries the path condition of the pin it leaves. The
//! [`scope::ScopeBuilder`] copies it into every open block whose own
//! condition implies it, which reconstructs properly nested `if`/`case`
//! code from an unstructured graph.
//!
//! ## Module Structure
//!
//! - [`lexer`] / [`parser`] - tokens and combinators for type signatures
//! - [`types`] - structural types, substitution, matching
//! - [`morphism`] - the morphism algebra and partial application
//! - [`graph`] - raw and typed program graphs, DOT export
//! - [`cook`] - raw → typed, with symbol tables and the live oracle
//! - [`condition`] / [`scope`] - path conditions and block nesting
//! - [`backend`] - graph walk, plans, renderers, toolchain
//! - [`interpreter`] - reference evaluator for plans
//! - [`layout`] - the editor's JSON document

pub mod backend;
pub mod condition;
pub mod cook;
pub mod graph;
pub mod interpreter;
pub mod layout;
pub mod lexer;
pub mod morphism;
pub mod parser;
pub mod scope;
pub mod types;

use thiserror::Error;

/// Any failure of the pipeline, one variant per stage.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] parser::ParseError),
    #[error(transparent)]
    Match(#[from] types::MatchError),
    #[error(transparent)]
    Morphism(#[from] morphism::MorphismError),
    #[error(transparent)]
    Graph(#[from] graph::GraphError),
    #[error(transparent)]
    Cook(#[from] cook::CookError),
    #[error(transparent)]
    Scope(#[from] scope::ScopeError),
    #[error(transparent)]
    Translate(#[from] backend::TranslateError),
    #[error(transparent)]
    Eval(#[from] interpreter::EvalError),
    #[error(transparent)]
    Tool(#[from] backend::ToolError),
    #[error(transparent)]
    Oracle(#[from] cook::OracleError),
    #[error(transparent)]
    Layout(#[from] layout::LayoutError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Cook `raw` against `resolver` and plan every function.
pub fn plan(
    raw: &graph::RawGraph,
    resolver: &dyn cook::SymbolResolver,
) -> Result<backend::ProgramPlan> {
    let program = cook::cook(raw, resolver)?;
    Ok(backend::plan_program(&program)?)
}
