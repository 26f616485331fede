//! Rotation/reflection orbits for per-count neighbourhood letters.
//!
//! The Moore range-1 neighbourhood is packed as a ring mask: bit 0 = N and
//! the remaining bits clockwise (NE, E, SE, S, SW, W, NW). Each letter names
//! a representative mask; its orbit under the eight square symmetries is the
//! full set of neighbour patterns that letter activates. Letters for counts
//! five through seven are the bit complements of their low-count partners,
//! so only counts one through four carry explicit representatives.

/// Grid offsets `(dx, dy)` for each ring bit, y growing downwards.
///
/// Index `i` is the cell contributing bit `1 << i` of a packed pattern; the
/// engine and the MAP decoder both assemble patterns through this table.
pub const RING_OFFSETS: [(i32, i32); 8] = [
    (0, -1),  // N
    (1, -1),  // NE
    (1, 0),   // E
    (1, 1),   // SE
    (0, 1),   // S
    (-1, 1),  // SW
    (-1, 0),  // W
    (-1, -1), // NW
];

/// Ring bit index for each compass direction, clockwise from north.
pub const N: u8 = 1;
pub const NE: u8 = 1 << 1;
pub const E: u8 = 1 << 2;
pub const SE: u8 = 1 << 3;
pub const S: u8 = 1 << 4;
pub const SW: u8 = 1 << 5;
pub const W: u8 = 1 << 6;
pub const NW: u8 = 1 << 7;

/// Letters valid for each neighbour count, in canonical order.
pub const LETTERS_BY_COUNT: [&str; 9] = [
    "",
    "ce",
    "cekain",
    "cekainyqjr",
    "cekainyqjrtwz",
    "cekainyqjr",
    "cekain",
    "ce",
    "",
];

const REPS_1: &[(char, u8)] = &[('c', NE), ('e', N)];

const REPS_2: &[(char, u8)] = &[
    ('c', NW | NE),
    ('e', N | E),
    ('k', N | SE),
    ('a', N | NE),
    ('i', N | S),
    ('n', NE | SW),
];

const REPS_3: &[(char, u8)] = &[
    ('c', NW | NE | SE),
    ('e', N | E | S),
    ('k', N | E | SW),
    ('a', N | NE | E),
    ('i', NW | N | NE),
    ('n', NW | NE | E),
    ('y', NW | NE | S),
    ('q', NW | N | E),
    ('j', NW | SE | N),
    ('r', N | S | NE),
];

const REPS_4: &[(char, u8)] = &[
    ('c', NW | NE | SE | SW),
    ('e', N | E | S | W),
    ('k', NW | NE | SE | S),
    ('a', NW | NE | N | E),
    ('i', N | E | S | NE),
    ('n', NW | NE | SE | N),
    ('y', NW | SE | E | S),
    ('q', NW | NE | E | S),
    ('j', N | E | S | NW),
    ('r', NW | NE | N | S),
    ('t', NW | NE | E | W),
    ('w', NW | SE | N | E),
    ('z', NW | SE | N | S),
];

/// Rotates a ring mask a quarter turn clockwise.
#[must_use]
pub fn rotate(mask: u8) -> u8 {
    mask.rotate_left(2)
}

/// Reflects a ring mask across the vertical axis.
#[must_use]
pub fn reflect(mask: u8) -> u8 {
    let mut out = 0u8;
    for bit in 0..8u32 {
        if mask & (1 << bit) != 0 {
            out |= 1 << ((8 - bit) % 8);
        }
    }
    out
}

/// Full rotation/reflection orbit of a mask, deduplicated and sorted.
#[must_use]
pub fn orbit(mask: u8) -> Vec<u8> {
    let mut members = Vec::with_capacity(8);
    let mut m = mask;
    for _ in 0..4 {
        members.push(m);
        members.push(reflect(m));
        m = rotate(m);
    }
    members.sort_unstable();
    members.dedup();
    members
}

/// Representative mask for `(count, letter)`, or None for an invalid pair.
#[must_use]
pub fn representative(count: u32, letter: char) -> Option<u8> {
    let lookup = |reps: &[(char, u8)], complement: bool| {
        reps.iter()
            .find(|&&(l, _)| l == letter)
            .map(|&(_, m)| if complement { !m } else { m })
    };
    match count {
        1 => lookup(REPS_1, false),
        2 => lookup(REPS_2, false),
        3 => lookup(REPS_3, false),
        4 => lookup(REPS_4, false),
        5 => lookup(REPS_3, true),
        6 => lookup(REPS_2, true),
        7 => lookup(REPS_1, true),
        _ => None,
    }
}

/// All neighbour patterns a letter activates: the orbit of its
/// representative. Pure function of `(count, letter)`.
#[must_use]
pub fn expand_letter(count: u32, letter: char) -> Option<Vec<u8>> {
    representative(count, letter).map(orbit)
}

/// Every pattern with exactly `count` bits set (the bare-digit case).
#[must_use]
pub fn all_patterns(count: u32) -> Vec<u8> {
    (0u16..=255)
        .filter(|p| p.count_ones() == count)
        .map(|p| p as u8)
        .collect()
}

/// Valid letters for a count, in canonical order.
#[must_use]
pub fn letters_for(count: u32) -> &'static str {
    LETTERS_BY_COUNT.get(count as usize).copied().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn orbit_sizes_divide_eight() {
        for count in 1..=7u32 {
            for letter in letters_for(count).chars() {
                let orbit = expand_letter(count, letter).unwrap();
                assert!(
                    [1, 2, 4, 8].contains(&orbit.len()),
                    "count {count} letter {letter} orbit size {}",
                    orbit.len()
                );
            }
        }
    }

    #[test]
    fn letters_partition_patterns_of_each_count() {
        for count in 1..=7u32 {
            let mut seen: HashSet<u8> = HashSet::new();
            let mut total = 0usize;
            for letter in letters_for(count).chars() {
                let orbit = expand_letter(count, letter).unwrap();
                for &p in &orbit {
                    assert_eq!(
                        p.count_ones(),
                        count,
                        "count {count} letter {letter} pattern {p:#010b}"
                    );
                    assert!(
                        seen.insert(p),
                        "count {count} letter {letter} overlaps at {p:#010b}"
                    );
                }
                total += orbit.len();
            }
            let expected = all_patterns(count).len();
            assert_eq!(total, expected, "count {count} misses patterns");
        }
    }

    #[test]
    fn orbit_is_closed_under_symmetry() {
        for count in 1..=4u32 {
            for letter in letters_for(count).chars() {
                let orbit = expand_letter(count, letter).unwrap();
                let set: HashSet<u8> = orbit.iter().copied().collect();
                for &p in &orbit {
                    assert!(set.contains(&rotate(p)));
                    assert!(set.contains(&reflect(p)));
                }
            }
        }
    }

    #[test]
    fn complement_letters_mirror_low_counts() {
        let five_c = representative(5, 'c').unwrap();
        let three_c = representative(3, 'c').unwrap();
        assert_eq!(five_c, !three_c);
        assert_eq!(five_c.count_ones(), 5);
    }
}
