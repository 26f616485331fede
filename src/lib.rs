//! # Cellforge
//!
//! Rule compilation and generation stepping for 2-D cellular automata.
//!
//! The facade re-exports the three member crates:
//! - [`rules`] — rule-text compiler, table/tree interpreter
//! - [`engine`] — grid, memory provider, stepping engine
//! - [`net`] — remote rule fetching and the process-wide cache
//!
//! ## Quick start
//!
//! ```
//! use cellforge_lib::engine::{CellGrid, StepEngine, TrackingPool};
//! use cellforge_lib::rules::RuleCompiler;
//!
//! let rule = RuleCompiler::new().compile("B3/S23").unwrap();
//! let mut grid = CellGrid::new(64, 64, TrackingPool::new());
//! for (x, y) in [(31, 31), (32, 31), (33, 31)] {
//!     grid.set(x, y, 1);
//! }
//! let mut engine = StepEngine::new(TrackingPool::new());
//! let summary = engine.step(&mut grid, &rule, 0).unwrap();
//! assert_eq!(summary.population, 3);
//! ```

pub use cellforge_engine as engine;
pub use cellforge_net as net;
pub use cellforge_rules as rules;

pub use cellforge_engine::{CellGrid, StepEngine, StepError, StepSummary, TrackingPool};
pub use cellforge_net::{HttpRuleFetcher, RuleCache, RuleRepositoryConfig};
pub use cellforge_rules::{RuleCompiler, RuleError, RuleSpec};

/// Installs the default tracing subscriber.
///
/// Filter comes from `RUST_LOG`, falling back to `cellforge=info`. Call once
/// from the host; repeated calls are ignored.
pub fn init_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "cellforge=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
