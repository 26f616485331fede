//! Compiled rule representation.
//!
//! A [`RuleSpec`] is produced once by the compiler (or the rule cache for
//! table/tree rules) and is read-only afterwards; changing the rule or its
//! range replaces the spec rather than mutating it.

use serde::{Deserialize, Serialize};

use crate::predicate::RulePredicate;

/// Hard ceiling on the neighbourhood range.
pub const MAX_RANGE: u32 = 500;

/// Hard ceiling on the number of cell states.
pub const MAX_STATES: u32 = 256;

/// Rule family inferred from the grammar that matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleFamily {
    /// 2-state outer-totalistic or isotropic non-totalistic rules.
    ClassicLifelike,
    /// Multi-state decaying rules.
    Generations,
    /// Larger-than-Life: range-parameterized, contiguous count spans.
    LargerThanLife,
    /// Higher-range outer-totalistic: arbitrary count lists and shapes.
    HigherRangeOuterTotalistic,
    /// Arbitrary transition function decoded from a `@TABLE` body.
    RuleTable,
    /// Arbitrary transition function decoded from a `@TREE` body.
    RuleTree,
    /// 2x2-block partitioning rule.
    Margolus,
    /// Partitioned cellular automaton block rule.
    Pca,
    /// 1-D elementary rule `W<n>`.
    WolframElementary,
    /// No executable rule. The compiler never emits this; a host uses it as
    /// the placeholder for text that failed to compile or load.
    None,
}

/// Triangular neighbourhood variants selected by the `L`/`LE`/`LV`/`LI`/`LO`
/// postfixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriangularVariant {
    All,
    Edges,
    Vertices,
    Inner,
    Outer,
}

/// Neighbourhood shape tag.
///
/// Custom shapes carry their explicit cell offsets so the engine can build a
/// row profile without re-parsing the rule text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Neighbourhood {
    Moore,
    VonNeumann,
    Hexagonal,
    Tripod,
    Triangular(TriangularVariant),
    Circular,
    Cross,
    Saltire,
    Star,
    L2,
    Checkerboard,
    Hash,
    Asterisk,
    Gaussian,
    /// Arbitrary cell set from a `N@<hex>` bitmask, as `(dx, dy)` offsets.
    CustomBitmask(Vec<(i32, i32)>),
    /// Arbitrary weighted cells from a `NW<hex>` grid, as `(dx, dy, weight)`.
    CustomWeighted(Vec<(i32, i32, u8)>),
}

/// Bounded-grid topology selected by the letter of a `:<grid>` suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridTopology {
    Plane,
    Torus,
    Klein,
    CrossSurface,
    Sphere,
}

/// Parsed bounded-grid descriptor (`:T40,20+5` and friends).
///
/// A width or height of zero leaves that axis unbounded. Shifts and twists
/// are mutually exclusive per axis and validated at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundedGrid {
    pub topology: GridTopology,
    pub width: u32,
    pub height: u32,
    pub horizontal_shift: i32,
    pub vertical_shift: i32,
    pub horizontal_twist: bool,
    pub vertical_twist: bool,
}

/// `History`/`Super` canonical-name suffixes.
///
/// The overlay states themselves are a rendering concern; the compiler only
/// strips the suffix before the core grammar runs and reattaches it to the
/// canonical name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Overlay {
    History,
    Super,
}

impl Overlay {
    /// Canonical suffix text.
    #[must_use]
    pub fn suffix(&self) -> &'static str {
        match self {
            Overlay::History => "History",
            Overlay::Super => "Super",
        }
    }
}

/// A compiled, immutable rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub family: RuleFamily,
    pub neighbourhood: Neighbourhood,
    /// Neighbourhood range; 1 for the fixed small neighbourhoods.
    pub range: u32,
    /// Number of cell states, `2..=256`.
    pub state_count: u32,
    pub birth: RulePredicate,
    pub survival: RulePredicate,
    /// Whether survival counts include the centre cell (LtL `M1`).
    pub middle_included: bool,
    /// 2x2-block transition table for Margolus/PCA rules.
    pub block_transitions: Option<[u8; 16]>,
    /// Elementary rule number for `W<n>` rules.
    pub wolfram_code: Option<u8>,
    /// Minimal round-trip-stable name; recompiling it reproduces this spec.
    pub canonical_name: String,
    pub overlay: Option<Overlay>,
    /// Second rule applied on odd generations, same shape as this one.
    pub alternate: Option<Box<RuleSpec>>,
    pub bounded_grid: Option<BoundedGrid>,
}

impl RuleSpec {
    /// Whether a dead cell with zero neighbours can be born.
    #[must_use]
    pub fn has_birth_on_zero(&self) -> bool {
        self.birth.admits_zero()
    }

    /// The fully-alive state value.
    #[must_use]
    pub fn max_state(&self) -> u8 {
        (self.state_count - 1) as u8
    }

    /// Whether this is a decaying (Generations-style) rule.
    #[must_use]
    pub fn is_decaying(&self) -> bool {
        self.state_count > 2
    }
}
