//! Token-level parsing infrastructure.
//!
//! A small combinator layer over [`ParseState`], shared by the type
//! signature grammar in [`crate::types::parse`].

mod combinators;
mod state;

pub use combinators::*;
pub use state::*;
