//! Semantic model (spec §3.5, §4.4): namespaces, structures, functions,
//! statements and expressions, each carrying a parent pointer back toward
//! the unit root. The AST is immutable input; the model is what the
//! builder populates and the resolver later mutates in place (attaching
//! types, binding symbols, injecting casts and `load_value` nodes).
//!
//! Entities live in flat per-kind arenas (`Vec<_>` indexed by a newtype
//! id), the same shape the rest of this crate's arenas use, rather than
//! an object graph of `Rc<RefCell<_>>` nodes.

mod builder;
mod entities;

pub use builder::build_model;
pub use entities::*;
