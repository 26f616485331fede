//! Bounded-grid descriptor (`:T40,20` and friends).
//!
//! The descriptor names a topology letter, a width and an optional height,
//! each dimension optionally carrying a shift (`+n`/`-n`) or a twist (`*`).
//! `P` plane, `T` torus, `K` Klein bottle, `C` cross-surface, `S` sphere;
//! the sphere takes a single dimension. A dimension of zero leaves the axis
//! unbounded.

use crate::error::{Result, RuleError};
use crate::spec::{BoundedGrid, GridTopology};

/// Parses the text after the `:` separator.
pub fn parse_grid(text: &str) -> Result<BoundedGrid> {
    let bad = |why: &str| RuleError::Grid(format!("{why} in :{text}"));
    let mut chars = text.chars();
    let topology = match chars.next().map(|c| c.to_ascii_uppercase()) {
        Some('P') => GridTopology::Plane,
        Some('T') => GridTopology::Torus,
        Some('K') => GridTopology::Klein,
        Some('C') => GridTopology::CrossSurface,
        Some('S') => GridTopology::Sphere,
        _ => return Err(bad("unknown topology")),
    };
    let rest = chars.as_str();
    if rest.is_empty() {
        return Err(bad("missing dimensions"));
    }

    let mut axes = rest.split(',');
    let first = axes.next().unwrap_or_default();
    let second = axes.next();
    if axes.next().is_some() {
        return Err(bad("more than two dimensions"));
    }

    let (width, horizontal_shift, horizontal_twist) = parse_axis(first, &bad)?;
    let (height, vertical_shift, vertical_twist) = match second {
        Some(axis) => parse_axis(axis, &bad)?,
        // A single dimension is square for surfaces, exact for the sphere.
        None => (width, 0, false),
    };

    if topology == GridTopology::Sphere && second.is_some() {
        return Err(bad("sphere takes a single dimension"));
    }
    let shifted = horizontal_shift != 0 || vertical_shift != 0;
    let twisted = horizontal_twist || vertical_twist;
    if shifted && !matches!(topology, GridTopology::Torus | GridTopology::Klein) {
        return Err(bad("shift is only valid on torus and Klein grids"));
    }
    if horizontal_shift != 0 && vertical_shift != 0 {
        return Err(bad("shift on both axes"));
    }
    if twisted && topology != GridTopology::Klein {
        return Err(bad("twist is only valid on Klein grids"));
    }
    if horizontal_twist && vertical_twist {
        return Err(bad("twist on both axes"));
    }
    if (horizontal_shift != 0 && horizontal_twist) || (vertical_shift != 0 && vertical_twist) {
        return Err(bad("shift and twist on the same axis"));
    }
    if (horizontal_shift != 0 && width == 0) || (vertical_shift != 0 && height == 0) {
        return Err(bad("shift on an unbounded axis"));
    }

    Ok(BoundedGrid {
        topology,
        width,
        height,
        horizontal_shift,
        vertical_shift,
        horizontal_twist,
        vertical_twist,
    })
}

fn parse_axis(
    axis: &str,
    bad: &dyn Fn(&str) -> RuleError,
) -> Result<(u32, i32, bool)> {
    let digits = axis.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return Err(bad("missing dimension"));
    }
    let size: u32 = axis[..digits]
        .parse()
        .map_err(|_| bad("dimension overflow"))?;
    let modifier = &axis[digits..];
    match modifier.as_bytes() {
        [] => Ok((size, 0, false)),
        [b'*'] => Ok((size, 0, true)),
        [b'+' | b'-', ..] => {
            let shift: i32 = modifier
                .parse()
                .map_err(|_| bad("malformed shift"))?;
            if shift == 0 {
                return Err(bad("zero shift"));
            }
            Ok((size, shift, false))
        }
        _ => Err(bad("malformed dimension modifier")),
    }
}

/// Canonical text of a parsed grid, without the leading `:`.
#[must_use]
pub fn canonical_grid(grid: &BoundedGrid) -> String {
    let letter = match grid.topology {
        GridTopology::Plane => 'P',
        GridTopology::Torus => 'T',
        GridTopology::Klein => 'K',
        GridTopology::CrossSurface => 'C',
        GridTopology::Sphere => 'S',
    };
    let axis = |size: u32, shift: i32, twist: bool| {
        let mut out = size.to_string();
        if twist {
            out.push('*');
        } else if shift != 0 {
            out.push_str(&format!("{shift:+}"));
        }
        out
    };
    let first = axis(grid.width, grid.horizontal_shift, grid.horizontal_twist);
    if grid.topology == GridTopology::Sphere {
        return format!("{letter}{first}");
    }
    let second = axis(grid.height, grid.vertical_shift, grid.vertical_twist);
    format!("{letter}{first},{second}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_torus_with_shift() {
        let grid = parse_grid("T40,20+5").unwrap();
        assert_eq!(grid.topology, GridTopology::Torus);
        assert_eq!((grid.width, grid.height), (40, 20));
        assert_eq!(grid.vertical_shift, 5);
        assert_eq!(canonical_grid(&grid), "T40,20+5");
    }

    #[test]
    fn single_dimension_is_square() {
        let grid = parse_grid("P30").unwrap();
        assert_eq!((grid.width, grid.height), (30, 30));
        assert_eq!(canonical_grid(&grid), "P30,30");
    }

    #[test]
    fn sphere_takes_one_dimension() {
        let grid = parse_grid("S25").unwrap();
        assert_eq!(grid.topology, GridTopology::Sphere);
        assert_eq!((grid.width, grid.height), (25, 25));
        assert_eq!(canonical_grid(&grid), "S25");
        assert!(parse_grid("S25,30").is_err());
    }

    #[test]
    fn klein_twist() {
        let grid = parse_grid("K30*,20").unwrap();
        assert!(grid.horizontal_twist);
        assert!(!grid.vertical_twist);
        assert_eq!(canonical_grid(&grid), "K30*,20");
        assert!(parse_grid("T30*,20").is_err());
        assert!(parse_grid("K30*,20*").is_err());
    }

    #[test]
    fn shift_rules() {
        assert!(parse_grid("P40+2,20").is_err());
        assert!(parse_grid("T40+2,20+3").is_err());
        assert!(parse_grid("K40+2*,20").is_err());
        assert!(parse_grid("T0+2,20").is_err());
        let negative = parse_grid("T40-3,20").unwrap();
        assert_eq!(negative.horizontal_shift, -3);
    }

    #[test]
    fn unbounded_axis() {
        let grid = parse_grid("T0,40").unwrap();
        assert_eq!(grid.width, 0);
        assert_eq!(grid.height, 40);
    }

    #[test]
    fn malformed_descriptors_fail() {
        for text in ["", "Q30", "T", "T40,20,10", "Tx", "T40,20!", "T40,20+0"] {
            assert!(parse_grid(text).is_err(), "{text}");
        }
    }
}
