//! Core data structures for the K language compiler.
//!
//! Kept separate from `klang-compiler` so that future consumers (a code
//! generator, a language server) can depend on the cheap, allocation-light
//! pieces — string interning and source coordinates — without pulling in
//! the whole front-end.

mod interner;
mod span;

pub use interner::{Interner, Symbol};
pub use span::{SourceCoord, Span};
