//! Ordered parser strategies for the rule grammars.
//!
//! Each grammar is a closed unit exposing "does this look like mine" plus
//! "parse it"; the compiler walks the strategies in priority order. Adding a
//! dialect means adding a strategy, not growing a branching function.

use crate::error::Result;
use crate::spec::RuleSpec;

mod block;
mod lifelike;
mod ltl;
mod map;
mod wolfram;

pub use block::BlockStrategy;
pub use lifelike::LifelikeStrategy;
pub use ltl::LtlHrotStrategy;
pub use map::MapStrategy;
pub use wolfram::WolframStrategy;

/// One rule grammar.
pub trait ParserStrategy: Send + Sync {
    /// Grammar name for diagnostics.
    fn name(&self) -> &'static str;

    /// Cheap structural check; a match claims the text for this grammar.
    fn matches(&self, text: &str) -> bool;

    /// Full parse; errors are final (no fallback to later strategies).
    fn parse(&self, text: &str) -> Result<RuleSpec>;
}
