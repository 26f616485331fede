//! Generation stepping.
//!
//! One step is two passes over the active region: a counting pass that fills
//! a neighbour-count (or neighbour-pattern) buffer, then an in-place
//! transition pass that rewrites cells and retallies population, births,
//! deaths and a tight bounding box. The active region is the live bounding
//! box expanded by the rule range, or the whole bounded area for rules that
//! give birth on zero neighbours.
//!
//! Moore counting runs on a summed-area table, O(1) per cell at any range;
//! every other shape walks its precomputed offset profile. Torus wrapping
//! copies opposite borders into a ghost margin before counting and clears it
//! afterwards.

use std::sync::Arc;

use cellforge_rules::neighbourhood::{build_profile, pattern_offsets, Profile};
use cellforge_rules::spec::{BoundedGrid, GridTopology, RuleFamily, RuleSpec};
use cellforge_rules::{Neighbourhood, RulePredicate};
use thiserror::Error;

use crate::grid::{BoundingBox, CellGrid};
use crate::memory::MemoryProvider;

#[derive(Debug, Error)]
pub enum StepError {
    #[error("rule family {0:?} has no stepping path")]
    UnsupportedFamily(RuleFamily),
    #[error("{0:?} topology has no stepping path")]
    UnsupportedTopology(GridTopology),
    #[error("pattern predicates step only on range-1 Moore, hexagonal or von Neumann grids")]
    UnsupportedPredicate,
    #[error("allocation dimension {dimension} cannot hold the wrap margin for range {range}")]
    GridTooSmall { dimension: u32, range: u32 },
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

/// Tallies of one generation step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepSummary {
    pub population: u64,
    pub births: u64,
    pub deaths: u64,
    pub bounding_box: Option<BoundingBox>,
}

/// Inclusive cell rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rect {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

impl Rect {
    fn width(&self) -> u32 {
        self.x1 - self.x0 + 1
    }

    fn height(&self) -> u32 {
        self.y1 - self.y0 + 1
    }
}

/// Axis wrapping derived from the bounded grid.
#[derive(Debug, Clone, Copy, Default)]
struct Wrap {
    x: bool,
    y: bool,
    /// Horizontal shear applied when wrapping vertically.
    horizontal_shift: i32,
    /// Vertical shear applied when wrapping horizontally.
    vertical_shift: i32,
}

pub struct StepEngine {
    provider: Arc<dyn MemoryProvider>,
    counts: Vec<u32>,
    sat: Vec<u32>,
    profile_key: Option<(Neighbourhood, u32)>,
    offsets_even: Vec<(i32, i32, u32)>,
    offsets_odd: Vec<(i32, i32, u32)>,
    parity_split: bool,
}

impl StepEngine {
    pub fn new(provider: Arc<dyn MemoryProvider>) -> Self {
        Self {
            provider,
            counts: Vec::new(),
            sat: Vec::new(),
            profile_key: None,
            offsets_even: Vec::new(),
            offsets_odd: Vec::new(),
            parity_split: false,
        }
    }

    /// Advances the grid by one generation.
    pub fn step(
        &mut self,
        grid: &mut CellGrid,
        rule: &RuleSpec,
        generation: u64,
    ) -> Result<StepSummary, StepError> {
        let rule = match &rule.alternate {
            Some(odd) if generation % 2 == 1 => odd.as_ref(),
            _ => rule,
        };
        match rule.family {
            RuleFamily::ClassicLifelike
            | RuleFamily::Generations
            | RuleFamily::LargerThanLife
            | RuleFamily::HigherRangeOuterTotalistic => {}
            other => return Err(StepError::UnsupportedFamily(other)),
        }

        let (area, wrap) = bounded_area(grid, rule)?;
        let Some(region) = active_region(grid, rule, area, wrap) else {
            grid.population = 0;
            grid.bounding_box = None;
            return Ok(StepSummary::default());
        };

        if wrap.x || wrap.y {
            fill_ghost(grid, area, rule.range, wrap);
        }

        match (&rule.birth, &rule.survival) {
            (RulePredicate::Counts(_), RulePredicate::Counts(_)) => {
                if rule.neighbourhood == Neighbourhood::Moore {
                    self.count_moore(grid, rule, region);
                } else {
                    self.count_profile(grid, rule, region);
                }
            }
            (RulePredicate::Patterns(_), RulePredicate::Patterns(_)) => {
                self.count_patterns(grid, rule, region)?;
            }
            _ => return Err(StepError::UnsupportedPredicate),
        }

        let summary = self.transition(grid, rule, region)?;

        if wrap.x || wrap.y {
            clear_ghost(grid, area, rule.range, wrap);
        }

        grid.population = summary.population;
        grid.bounding_box = summary.bounding_box;
        tracing::trace!(
            population = summary.population,
            births = summary.births,
            deaths = summary.deaths,
            "stepped generation"
        );
        Ok(summary)
    }

    fn counts_buffer(&mut self, needed: usize) {
        if self.counts.len() < needed {
            self.counts = self.provider.allocate_words(needed, "counts");
        }
    }

    /// Summed-area counting for the Moore neighbourhood, O(1) per cell.
    fn count_moore(&mut self, grid: &CellGrid, rule: &RuleSpec, region: Rect) {
        let r = rule.range as i64;
        let max = rule.max_state();
        let rw = region.width() as usize;
        let rh = region.height() as usize;
        self.counts_buffer(rw * rh);

        // Extended rectangle with a zero top row / left column for the
        // inclusion-exclusion query.
        let ew = rw + 2 * rule.range as usize;
        let eh = rh + 2 * rule.range as usize;
        let stride = ew + 1;
        if self.sat.len() < stride * (eh + 1) {
            self.sat = self.provider.allocate_words(stride * (eh + 1), "sat");
        }
        self.sat[..stride].fill(0);
        for j in 0..eh {
            let row = (j + 1) * stride;
            self.sat[row] = 0;
            let gy = region.y0 as i64 - r + j as i64;
            for i in 0..ew {
                let gx = region.x0 as i64 - r + i as i64;
                let alive = alive_at(grid, gx, gy, max);
                self.sat[row + i + 1] = alive + self.sat[row + i] + self.sat[row - stride + i + 1]
                    - self.sat[row - stride + i];
            }
        }

        let d = 2 * rule.range as usize + 1;
        for j in 0..rh {
            let top = j * stride;
            let bottom = (j + d) * stride;
            for i in 0..rw {
                // Ordered so no intermediate term underflows.
                let sum = self.sat[bottom + i + d] - self.sat[top + i + d] + self.sat[top + i]
                    - self.sat[bottom + i];
                let centre = alive_at(
                    grid,
                    region.x0 as i64 + i as i64,
                    region.y0 as i64 + j as i64,
                    max,
                );
                self.counts[j * rw + i] = sum - centre;
            }
        }
    }

    /// Direct per-cell summation over the shape's offset profile.
    fn count_profile(&mut self, grid: &CellGrid, rule: &RuleSpec, region: Rect) {
        self.refresh_profile(&rule.neighbourhood, rule.range);
        let max = rule.max_state();
        let rw = region.width() as usize;
        let rh = region.height() as usize;
        self.counts_buffer(rw * rh);

        for j in 0..rh {
            let y = region.y0 as i64 + j as i64;
            for i in 0..rw {
                let x = region.x0 as i64 + i as i64;
                let offsets = if self.parity_split && (x + y) % 2 != 0 {
                    &self.offsets_odd
                } else {
                    &self.offsets_even
                };
                let mut sum = 0u32;
                for &(dx, dy, weight) in offsets {
                    sum += weight * alive_at(grid, x + i64::from(dx), y + i64::from(dy), max);
                }
                self.counts[j * rw + i] = sum;
            }
        }
    }

    /// Packs each cell's neighbour states into a pattern bitmask.
    fn count_patterns(
        &mut self,
        grid: &CellGrid,
        rule: &RuleSpec,
        region: Rect,
    ) -> Result<(), StepError> {
        if rule.range != 1 {
            return Err(StepError::UnsupportedPredicate);
        }
        let offsets =
            pattern_offsets(&rule.neighbourhood).ok_or(StepError::UnsupportedPredicate)?;
        let bits = offsets.len();
        let max = rule.max_state();
        let rw = region.width() as usize;
        let rh = region.height() as usize;
        self.counts_buffer(rw * rh);

        for j in 0..rh {
            let y = region.y0 as i64 + j as i64;
            for i in 0..rw {
                let x = region.x0 as i64 + i as i64;
                let mut mask = 0u32;
                for (k, &(dx, dy)) in offsets.iter().enumerate() {
                    if alive_at(grid, x + i64::from(dx), y + i64::from(dy), max) != 0 {
                        mask |= 1 << (bits - 1 - k);
                    }
                }
                self.counts[j * rw + i] = mask;
            }
        }
        Ok(())
    }

    /// In-place transition over the region, tallying as it writes.
    fn transition(
        &mut self,
        grid: &mut CellGrid,
        rule: &RuleSpec,
        region: Rect,
    ) -> Result<StepSummary, StepError> {
        let max = rule.max_state();
        let decaying = rule.is_decaying();
        let rw = region.width() as usize;
        let mut summary = StepSummary::default();

        for j in 0..region.height() {
            let y = region.y0 + j;
            for i in 0..region.width() as u32 {
                let x = region.x0 + i;
                let idx = grid.index(x, y);
                let old = grid.cells[idx];
                let value = self.counts[j as usize * rw + i as usize];

                let new = if old == 0 {
                    if admits(&rule.birth, value, false, rule)? {
                        max
                    } else {
                        0
                    }
                } else if old == max {
                    if admits(&rule.survival, value, true, rule)? {
                        max
                    } else if decaying {
                        max - 1
                    } else {
                        0
                    }
                } else {
                    old - 1
                };

                grid.cells[idx] = new;
                if old == 0 && new == max {
                    summary.births += 1;
                }
                if old == max && new != max {
                    summary.deaths += 1;
                }
                if new != 0 {
                    summary.population += 1;
                    match &mut summary.bounding_box {
                        Some(bbox) => bbox.include(x, y),
                        None => summary.bounding_box = Some(BoundingBox::at(x, y)),
                    }
                }
            }
        }
        Ok(summary)
    }

    fn refresh_profile(&mut self, shape: &Neighbourhood, range: u32) {
        if self.profile_key.as_ref() == Some(&(shape.clone(), range)) {
            return;
        }
        let profile = build_profile(shape, range);
        self.parity_split = matches!(profile, Profile::Split { .. });
        self.offsets_even = profile.offsets(0);
        self.offsets_odd = profile.offsets(1);
        self.profile_key = Some((shape.clone(), range));
    }
}

/// Tests a predicate against a neighbour count or pattern mask.
fn admits(
    predicate: &RulePredicate,
    value: u32,
    centre_alive: bool,
    rule: &RuleSpec,
) -> Result<bool, StepError> {
    match predicate {
        RulePredicate::Counts(set) => {
            let count = value + u32::from(centre_alive && rule.middle_included);
            if count > set.max() {
                return Err(StepError::InvariantViolation(format!(
                    "neighbour count {count} above predicate maximum {}",
                    set.max()
                )));
            }
            Ok(set.contains(count))
        }
        RulePredicate::Patterns(set) => Ok(set.contains(value as u16)),
    }
}

#[inline]
fn alive_at(grid: &CellGrid, x: i64, y: i64, max: u8) -> u32 {
    if x < 0 || y < 0 || x >= i64::from(grid.width()) || y >= i64::from(grid.height()) {
        return 0;
    }
    u32::from(grid.get(x as u32, y as u32) == max)
}

/// The bounded area centred in the allocation, plus axis wrap flags.
fn bounded_area(grid: &CellGrid, rule: &RuleSpec) -> Result<(Rect, Wrap), StepError> {
    let full = Rect {
        x0: 0,
        y0: 0,
        x1: grid.width() - 1,
        y1: grid.height() - 1,
    };
    let Some(bounds) = rule.bounded_grid else {
        return Ok((full, Wrap::default()));
    };
    match bounds.topology {
        GridTopology::Plane | GridTopology::Torus => {}
        other => return Err(StepError::UnsupportedTopology(other)),
    }

    let axis = |declared: u32, allocated: u32| {
        if declared == 0 || declared > allocated {
            (0, allocated - 1)
        } else {
            let start = (allocated - declared) / 2;
            (start, start + declared - 1)
        }
    };
    let (x0, x1) = axis(bounds.width, grid.width());
    let (y0, y1) = axis(bounds.height, grid.height());
    let area = Rect { x0, y0, x1, y1 };

    let wrap = wrap_for(&bounds, grid, area, rule.range)?;
    Ok((area, wrap))
}

fn wrap_for(
    bounds: &BoundedGrid,
    grid: &CellGrid,
    area: Rect,
    range: u32,
) -> Result<Wrap, StepError> {
    if bounds.topology != GridTopology::Torus {
        return Ok(Wrap::default());
    }
    let mut wrap = Wrap {
        x: bounds.width != 0,
        y: bounds.height != 0,
        horizontal_shift: bounds.horizontal_shift,
        vertical_shift: bounds.vertical_shift,
    };
    // The ghost margin must fit inside the allocation on wrapped axes.
    if wrap.x && (area.x0 < range || grid.width() - 1 - area.x1 < range) {
        return Err(StepError::GridTooSmall {
            dimension: grid.width(),
            range,
        });
    }
    if wrap.y && (area.y0 < range || grid.height() - 1 - area.y1 < range) {
        return Err(StepError::GridTooSmall {
            dimension: grid.height(),
            range,
        });
    }
    if !wrap.x {
        wrap.vertical_shift = 0;
    }
    if !wrap.y {
        wrap.horizontal_shift = 0;
    }
    Ok(wrap)
}

/// Live bounding box expanded by the range and clamped to the area, or the
/// whole area for birth-on-zero rules. `None` means nothing can change.
fn active_region(grid: &CellGrid, rule: &RuleSpec, area: Rect, wrap: Wrap) -> Option<Rect> {
    if rule.has_birth_on_zero() {
        return Some(area);
    }
    let bbox = grid.bounding_box()?;
    // A wrapped edge can seed births across the seam.
    if wrap.x || wrap.y {
        return Some(area);
    }
    let region = Rect {
        x0: bbox.min_x.saturating_sub(rule.range).max(area.x0),
        y0: bbox.min_y.saturating_sub(rule.range).max(area.y0),
        x1: (bbox.max_x + rule.range).min(area.x1),
        y1: (bbox.max_y + rule.range).min(area.y1),
    };
    (region.x0 <= region.x1 && region.y0 <= region.y1).then_some(region)
}

/// Copies opposite borders into the ghost margin, shearing for shifts.
fn fill_ghost(grid: &mut CellGrid, area: Rect, range: u32, wrap: Wrap) {
    let w = i64::from(area.width());
    let h = i64::from(area.height());

    if wrap.x {
        // Left/right ghost columns, sheared vertically.
        for y in area.y0..=area.y1 {
            for d in 1..=range {
                let shear = |shift: i64| {
                    let wrapped = (i64::from(y - area.y0) + shift).rem_euclid(h);
                    area.y0 + wrapped as u32
                };
                let left_src = grid.get(area.x1 + 1 - d, shear(-i64::from(wrap.vertical_shift)));
                let right_src = grid.get(area.x0 + d - 1, shear(i64::from(wrap.vertical_shift)));
                let left = grid.index(area.x0 - d, y);
                let right = grid.index(area.x1 + d, y);
                grid.cells[left] = left_src;
                grid.cells[right] = right_src;
            }
        }
    }
    if wrap.y {
        // Top/bottom ghost rows over the full extended width, sheared
        // horizontally; reads go straight to area cells via modular x.
        let (gx0, gx1) = if wrap.x {
            (area.x0 - range, area.x1 + range)
        } else {
            (area.x0, area.x1)
        };
        for d in 1..=range {
            for x in gx0..=gx1 {
                let shear = |shift: i64| {
                    let wrapped =
                        (i64::from(x) - i64::from(area.x0) + shift).rem_euclid(w);
                    area.x0 + wrapped as u32
                };
                let top_src = grid.get(
                    shear(-i64::from(wrap.horizontal_shift)),
                    area.y1 + 1 - d,
                );
                let bottom_src = grid.get(
                    shear(i64::from(wrap.horizontal_shift)),
                    area.y0 + d - 1,
                );
                let top = grid.index(x, area.y0 - d);
                let bottom = grid.index(x, area.y1 + d);
                grid.cells[top] = top_src;
                grid.cells[bottom] = bottom_src;
            }
        }
    }
}

fn clear_ghost(grid: &mut CellGrid, area: Rect, range: u32, wrap: Wrap) {
    if wrap.x {
        for y in area.y0..=area.y1 {
            for d in 1..=range {
                let left = grid.index(area.x0 - d, y);
                let right = grid.index(area.x1 + d, y);
                grid.cells[left] = 0;
                grid.cells[right] = 0;
            }
        }
    }
    if wrap.y {
        let (gx0, gx1) = if wrap.x {
            (area.x0 - range, area.x1 + range)
        } else {
            (area.x0, area.x1)
        };
        for d in 1..=range {
            for x in gx0..=gx1 {
                let top = grid.index(x, area.y0 - d);
                let bottom = grid.index(x, area.y1 + d);
                grid.cells[top] = 0;
                grid.cells[bottom] = 0;
            }
        }
    }
}
