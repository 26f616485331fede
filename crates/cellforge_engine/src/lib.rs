//! # Cellforge Engine
//!
//! Generation stepping for compiled cellular-automaton rules.
//!
//! This crate provides:
//! - The byte-per-cell [`CellGrid`] with incremental population tracking
//! - [`StepEngine`] with summed-area Moore counting and profile-based
//!   counting for every other neighbourhood shape
//! - Torus/plane bounded-grid handling
//! - The [`MemoryProvider`] capability for buffer allocation

/// The cell grid and bounding box
pub mod grid;
/// Buffer allocation capability and the default tracking pool
pub mod memory;
/// The generation stepper
pub mod step;

pub use grid::{BoundingBox, CellGrid};
pub use memory::{MemoryProvider, MemoryStats, TrackingPool};
pub use step::{StepEngine, StepError, StepSummary};
