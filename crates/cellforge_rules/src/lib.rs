//! # Cellforge Rules
//!
//! Rule compilation for two-dimensional cellular automata.
//!
//! This crate provides:
//! - The text compiler turning rule strings into immutable [`RuleSpec`]s
//! - Grammar strategies for lifelike, Generations, LtL/HROT, MAP, block and
//!   Wolfram rules
//! - `@TABLE`/`@TREE` body interpreters for arbitrary transition functions
//! - Neighbourhood geometry shared with the stepping engine

/// Community rule-name aliases
pub mod aliases;
/// Bounded-grid descriptor parsing (`:T40,20` and friends)
pub mod bounded;
/// The compiler pipeline in front of the grammar strategies
pub mod compiler;
/// Error types and result alias for rule compilation
pub mod error;
/// Neighbourhood shapes, profiles and custom-shape descriptors
pub mod neighbourhood;
/// Rotation/reflection orbits for non-totalistic letters
pub mod orbits;
/// Grammar strategies, one per rule dialect
pub mod parsers;
/// Birth/survival predicate representations
pub mod predicate;
/// The compiled rule representation
pub mod spec;
/// `@TABLE` body interpreter
pub mod table;
/// Line tokenizer shared by the table and tree interpreters
pub mod tokens;
/// `@TREE` body interpreter
pub mod tree;

pub use compiler::RuleCompiler;
pub use error::{Result, RuleError};
pub use predicate::{CountSet, PatternSet, RulePredicate};
pub use spec::{
    BoundedGrid, GridTopology, Neighbourhood, Overlay, RuleFamily, RuleSpec, TriangularVariant,
};
pub use table::{decode_table, LookupTable};
pub use tree::{decode_tree, DecisionTree};
