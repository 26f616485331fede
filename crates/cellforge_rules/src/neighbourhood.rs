//! Neighbourhood geometry.
//!
//! Every shape is reduced to an explicit cell set around the origin, from
//! which the engine derives per-row run profiles and the compiler derives
//! `max_neighbours` for predicate validation. Triangular shapes depend on the
//! parity of the target cell (up/down triangle), so they produce a split
//! profile.

use crate::error::{Result, RuleError};
use crate::spec::{Neighbourhood, TriangularVariant};

/// Weighted and custom shapes are capped well below [`crate::spec::MAX_RANGE`]
/// because their descriptors carry one hex digit per cell.
pub const MAX_CUSTOM_RANGE: u32 = 25;

/// Contiguous runs of neighbourhood cells in one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRow {
    pub dy: i32,
    /// Inclusive `(x0, x1)` spans.
    pub runs: Vec<(i32, i32)>,
}

/// Precomputed per-offset description of a neighbourhood, rebuilt only when
/// shape or range change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Profile {
    /// Unweighted cells as per-row runs.
    Rows(Vec<ProfileRow>),
    /// Weighted cells as explicit `(dx, dy, weight)` offsets.
    Weighted(Vec<(i32, i32, u32)>),
    /// Parity-dependent rows for triangular shapes.
    Split {
        even: Vec<ProfileRow>,
        odd: Vec<ProfileRow>,
    },
}

impl Profile {
    /// Flattens the profile into `(dx, dy, weight)` offsets for the given
    /// cell parity. Used by the direct-counting path and by tests.
    #[must_use]
    pub fn offsets(&self, parity: u8) -> Vec<(i32, i32, u32)> {
        match self {
            Profile::Rows(rows) => rows_to_offsets(rows),
            Profile::Weighted(cells) => cells.clone(),
            Profile::Split { even, odd } => {
                if parity == 0 {
                    rows_to_offsets(even)
                } else {
                    rows_to_offsets(odd)
                }
            }
        }
    }
}

fn rows_to_offsets(rows: &[ProfileRow]) -> Vec<(i32, i32, u32)> {
    let mut out = Vec::new();
    for row in rows {
        for &(x0, x1) in &row.runs {
            for dx in x0..=x1 {
                out.push((dx, row.dy, 1));
            }
        }
    }
    out
}

/// Builds the profile for `shape` at `range`.
#[must_use]
pub fn build_profile(shape: &Neighbourhood, range: u32) -> Profile {
    match shape {
        Neighbourhood::Gaussian => Profile::Weighted(gaussian_cells(range)),
        Neighbourhood::CustomWeighted(cells) => Profile::Weighted(
            cells
                .iter()
                .map(|&(dx, dy, w)| (dx, dy, u32::from(w)))
                .collect(),
        ),
        Neighbourhood::Triangular(variant) => Profile::Split {
            even: runs_from_cells(&triangular_cells(*variant, range, 0)),
            odd: runs_from_cells(&triangular_cells(*variant, range, 1)),
        },
        _ => Profile::Rows(runs_from_cells(&plain_cells(shape, range))),
    }
}

/// Largest possible neighbour count (sum of weights) for `shape` at `range`.
#[must_use]
pub fn max_neighbours(shape: &Neighbourhood, range: u32) -> u32 {
    match shape {
        Neighbourhood::Moore => (2 * range + 1) * (2 * range + 1) - 1,
        Neighbourhood::VonNeumann => 2 * range * (range + 1),
        Neighbourhood::Hexagonal => 3 * range * (range + 1),
        Neighbourhood::Cross | Neighbourhood::Saltire => 4 * range,
        Neighbourhood::Star | Neighbourhood::Hash => 8 * range,
        Neighbourhood::Checkerboard => 2 * range * (range + 1),
        Neighbourhood::Tripod => 3 * range,
        Neighbourhood::Asterisk => 6 * range,
        // Weight sum is ((r+1)^2)^2 - (r+1)^2; summed in u64 because the
        // closed form exceeds u32 well inside the generic range limit.
        // Gaussian rules are capped at MAX_CUSTOM_RANGE at parse time.
        Neighbourhood::Gaussian => gaussian_cells(range)
            .iter()
            .map(|c| u64::from(c.2))
            .sum::<u64>()
            .min(u64::from(u32::MAX)) as u32,
        Neighbourhood::CustomWeighted(cells) => {
            cells.iter().map(|&(_, _, w)| u32::from(w)).sum()
        }
        Neighbourhood::CustomBitmask(cells) => cells.len() as u32,
        Neighbourhood::Triangular(variant) => {
            triangular_cells(*variant, range, 0).len() as u32
        }
        Neighbourhood::Circular | Neighbourhood::L2 => {
            plain_cells(shape, range).len() as u32
        }
    }
}

/// Whether the shape admits range-1 non-totalistic letters / MAP patterns.
#[must_use]
pub fn pattern_bits(shape: &Neighbourhood) -> Option<u32> {
    match shape {
        Neighbourhood::Moore => Some(8),
        Neighbourhood::Hexagonal => Some(6),
        Neighbourhood::VonNeumann => Some(4),
        _ => None,
    }
}

/// `(dx, dy)` per hexagonal pattern bit, bit 5 first. The hexagon is the
/// Moore square minus the NW and SE corners (`|dx + dy| <= r`).
pub const HEX_PATTERN_OFFSETS: [(i32, i32); 6] = [
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
];

/// `(dx, dy)` per von Neumann pattern bit, bit 3 first.
pub const VON_NEUMANN_PATTERN_OFFSETS: [(i32, i32); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];

/// Pattern-bit offsets for a shape, highest bit first.
#[must_use]
pub fn pattern_offsets(shape: &Neighbourhood) -> Option<&'static [(i32, i32)]> {
    match shape {
        Neighbourhood::Moore => Some(&MOORE_PATTERN_OFFSETS),
        Neighbourhood::Hexagonal => Some(&HEX_PATTERN_OFFSETS),
        Neighbourhood::VonNeumann => Some(&VON_NEUMANN_PATTERN_OFFSETS),
        _ => None,
    }
}

/// Moore pattern bits follow the ring layout of [`crate::orbits`], bit 7
/// (NW) first down to bit 0 (N).
pub const MOORE_PATTERN_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
];

fn plain_cells(shape: &Neighbourhood, range: u32) -> Vec<(i32, i32)> {
    let r = range as i32;
    let mut cells = Vec::new();
    for dy in -r..=r {
        for dx in -r..=r {
            if (dx, dy) == (0, 0) {
                continue;
            }
            if in_shape(shape, dx, dy, r) {
                cells.push((dx, dy));
            }
        }
    }
    cells
}

fn in_shape(shape: &Neighbourhood, dx: i32, dy: i32, r: i32) -> bool {
    match shape {
        Neighbourhood::Moore => true,
        Neighbourhood::VonNeumann => dx.abs() + dy.abs() <= r,
        Neighbourhood::Hexagonal => (-r..=r).contains(&(dx + dy)),
        Neighbourhood::Circular => dx * dx + dy * dy <= r * r + r,
        Neighbourhood::L2 => dx * dx + dy * dy <= r * r,
        Neighbourhood::Cross => dx == 0 || dy == 0,
        Neighbourhood::Saltire => dx.abs() == dy.abs(),
        Neighbourhood::Star => dx == 0 || dy == 0 || dx.abs() == dy.abs(),
        Neighbourhood::Checkerboard => (dx + dy).rem_euclid(2) == 1,
        Neighbourhood::Hash => dx.abs() == 1 || dy.abs() == 1,
        Neighbourhood::Tripod => {
            (dx == 0 && dy < 0) || (dy == 0 && dx < 0) || (dx == dy && dx > 0)
        }
        Neighbourhood::Asterisk => {
            dx == 0 || dy == 0 || (dx == dy)
        }
        Neighbourhood::CustomBitmask(cells) => cells.contains(&(dx, dy)),
        _ => false,
    }
}

fn gaussian_cells(range: u32) -> Vec<(i32, i32, u32)> {
    let r = range as i32;
    let mut cells = Vec::new();
    for dy in -r..=r {
        for dx in -r..=r {
            if (dx, dy) == (0, 0) {
                continue;
            }
            let w = ((r + 1 - dx.abs()) * (r + 1 - dy.abs())) as u32;
            cells.push((dx, dy, w));
        }
    }
    cells
}

/// Base adjacency offsets for one triangle orientation.
///
/// `up` is the orientation of parity-0 cells; moving by `(dx, dy)` flips the
/// orientation whenever `dx + dy` is odd.
fn triangular_adjacency(variant: TriangularVariant, up: bool) -> Vec<(i32, i32)> {
    let edges_up = vec![(-1, 0), (1, 0), (0, 1)];
    let vertices_up = vec![
        (-1, -1),
        (0, -1),
        (1, -1),
        (-2, 0),
        (2, 0),
        (-2, 1),
        (-1, 1),
        (1, 1),
        (2, 1),
    ];
    let inner_up = vec![(-1, 0), (1, 0), (0, 1), (0, -1), (-1, 1), (1, 1)];
    let outer_up = vec![(-1, -1), (1, -1), (-2, 0), (2, 0), (-2, 1), (2, 1)];

    let base = match variant {
        TriangularVariant::All => {
            let mut v = edges_up.clone();
            v.extend(vertices_up.iter().copied());
            v
        }
        TriangularVariant::Edges => edges_up,
        TriangularVariant::Vertices => vertices_up,
        TriangularVariant::Inner => inner_up,
        TriangularVariant::Outer => outer_up,
    };
    if up {
        base
    } else {
        base.into_iter().map(|(dx, dy)| (dx, -dy)).collect()
    }
}

/// Cells within `range` steps of the origin on the triangular lattice,
/// walking the variant's adjacency relation. `parity` is the parity of the
/// target cell's `x + y`.
fn triangular_cells(variant: TriangularVariant, range: u32, parity: u8) -> Vec<(i32, i32)> {
    use std::collections::{HashSet, VecDeque};

    let mut seen: HashSet<(i32, i32)> = HashSet::new();
    let mut queue: VecDeque<((i32, i32), u32)> = VecDeque::new();
    seen.insert((0, 0));
    queue.push_back(((0, 0), 0));

    while let Some(((x, y), depth)) = queue.pop_front() {
        if depth == range {
            continue;
        }
        let up = (x + y + i32::from(parity)).rem_euclid(2) == 0;
        for (dx, dy) in triangular_adjacency(variant, up) {
            let next = (x + dx, y + dy);
            if seen.insert(next) {
                queue.push_back((next, depth + 1));
            }
        }
    }

    seen.remove(&(0, 0));
    let mut cells: Vec<(i32, i32)> = seen.into_iter().collect();
    cells.sort_by_key(|&(x, y)| (y, x));
    cells
}

fn runs_from_cells(cells: &[(i32, i32)]) -> Vec<ProfileRow> {
    let mut sorted = cells.to_vec();
    sorted.sort_by_key(|&(x, y)| (y, x));

    let mut rows: Vec<ProfileRow> = Vec::new();
    for (dx, dy) in sorted {
        match rows.last_mut() {
            Some(row) if row.dy == dy => {
                let last = row.runs.last_mut().unwrap();
                if dx == last.1 + 1 {
                    last.1 = dx;
                } else {
                    row.runs.push((dx, dx));
                }
            }
            _ => rows.push(ProfileRow {
                dy,
                runs: vec![(dx, dx)],
            }),
        }
    }
    rows
}

/// Decodes a `N@<hex>` bitmask descriptor into cell offsets.
///
/// Hex digits cover the `(2r+1)x(2r+1)` box row-major, four cells per digit,
/// most significant bit first; the centre bit is ignored.
pub fn decode_bitmask(hex: &str, range: u32) -> Result<Vec<(i32, i32)>> {
    if range > MAX_CUSTOM_RANGE {
        return Err(RuleError::RangeOutOfRange(range));
    }
    let side = 2 * range as usize + 1;
    let cell_count = side * side;
    let expected = cell_count.div_ceil(4);
    if hex.len() != expected {
        return Err(RuleError::Grid(format!(
            "custom neighbourhood needs {expected} hex digits, got {}",
            hex.len()
        )));
    }
    let mut cells = Vec::new();
    for (i, ch) in hex.chars().enumerate() {
        let digit = ch
            .to_digit(16)
            .ok_or_else(|| RuleError::UnknownToken(ch.to_string()))?;
        for bit in 0..4 {
            let idx = i * 4 + bit;
            if idx >= cell_count {
                break;
            }
            if digit & (8 >> bit) != 0 {
                let dx = (idx % side) as i32 - range as i32;
                let dy = (idx / side) as i32 - range as i32;
                if (dx, dy) != (0, 0) {
                    cells.push((dx, dy));
                }
            }
        }
    }
    if cells.is_empty() {
        return Err(RuleError::Grid("custom neighbourhood is empty".into()));
    }
    Ok(cells)
}

/// Re-encodes custom bitmask cells into canonical hex digits.
#[must_use]
pub fn encode_bitmask(cells: &[(i32, i32)], range: u32) -> String {
    let side = 2 * range as usize + 1;
    let cell_count = side * side;
    let mut out = String::new();
    let mut digit = 0u32;
    for idx in 0..cell_count {
        let dx = (idx % side) as i32 - range as i32;
        let dy = (idx / side) as i32 - range as i32;
        digit <<= 1;
        if cells.contains(&(dx, dy)) {
            digit |= 1;
        }
        if idx % 4 == 3 {
            out.push(char::from_digit(digit, 16).unwrap());
            digit = 0;
        }
    }
    let rem = cell_count % 4;
    if rem != 0 {
        digit <<= 4 - rem as u32;
        out.push(char::from_digit(digit, 16).unwrap());
    }
    out
}

/// Decodes a `NW<hex>` weighted descriptor: one hex digit per cell,
/// row-major over the `(2r+1)x(2r+1)` box; the centre weight is forced to 0.
pub fn decode_weights(hex: &str, range: u32) -> Result<Vec<(i32, i32, u8)>> {
    if range > MAX_CUSTOM_RANGE {
        return Err(RuleError::RangeOutOfRange(range));
    }
    let side = 2 * range as usize + 1;
    let expected = side * side;
    if hex.len() != expected {
        return Err(RuleError::Grid(format!(
            "weighted neighbourhood needs {expected} hex digits, got {}",
            hex.len()
        )));
    }
    let mut cells = Vec::new();
    for (idx, ch) in hex.chars().enumerate() {
        let w = ch
            .to_digit(16)
            .ok_or_else(|| RuleError::UnknownToken(ch.to_string()))? as u8;
        let dx = (idx % side) as i32 - range as i32;
        let dy = (idx / side) as i32 - range as i32;
        if w > 0 && (dx, dy) != (0, 0) {
            cells.push((dx, dy, w));
        }
    }
    if cells.is_empty() {
        return Err(RuleError::Grid("weighted neighbourhood is empty".into()));
    }
    Ok(cells)
}

/// Re-encodes weighted cells into canonical hex digits.
#[must_use]
pub fn encode_weights(cells: &[(i32, i32, u8)], range: u32) -> String {
    let side = 2 * range as usize + 1;
    let mut out = String::new();
    for idx in 0..side * side {
        let dx = (idx % side) as i32 - range as i32;
        let dy = (idx / side) as i32 - range as i32;
        let w = cells
            .iter()
            .find(|&&(x, y, _)| (x, y) == (dx, dy))
            .map_or(0, |&(_, _, w)| u32::from(w));
        out.push(char::from_digit(w, 16).unwrap());
    }
    out
}
