//! # Type/Unification Engine
//!
//! Structural types ([`Type`]), substitution ([`Mapping`]), one-directional
//! matching ([`match_types`]) and the signature text grammar ([`parse_type`]).

pub mod parse;
pub mod subst;
pub mod ty;
pub mod unify;

pub use parse::{TypeExpr, parse_declaration, parse_type};
pub use subst::Mapping;
pub use ty::{Atom, Type, TypeVar};
pub use unify::{MatchError, match_types};
