//! Summed-area counting must agree with direct window counting.
//!
//! The engine uses a prefix-sum table for Moore neighbourhoods; this checks
//! the stepped grid against a naive O(range^2)-per-cell reference over
//! randomized soups, ranges and predicates.

use proptest::prelude::*;

use cellforge_lib::engine::{CellGrid, StepEngine, TrackingPool};
use cellforge_lib::rules::RuleCompiler;

const WIDTH: u32 = 16;
const HEIGHT: u32 = 16;

/// Naive reference: count alive cells in the (2r+1)^2 window minus the
/// centre, then apply birth/survival with the centre added back for `M1`.
fn reference_step(cells: &[Vec<u8>], range: i64, survival: &[u32], birth: &[u32]) -> Vec<Vec<u8>> {
    let mut next = vec![vec![0u8; WIDTH as usize]; HEIGHT as usize];
    for y in 0..HEIGHT as i64 {
        for x in 0..WIDTH as i64 {
            let mut count = 0u32;
            for dy in -range..=range {
                for dx in -range..=range {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let (nx, ny) = (x + dx, y + dy);
                    if (0..WIDTH as i64).contains(&nx)
                        && (0..HEIGHT as i64).contains(&ny)
                        && cells[ny as usize][nx as usize] == 1
                    {
                        count += 1;
                    }
                }
            }
            let alive = cells[y as usize][x as usize] == 1;
            let next_state = if alive {
                // Positional grammar always includes the middle cell.
                u8::from(survival.contains(&(count + 1)))
            } else {
                u8::from(birth.contains(&count))
            };
            next[y as usize][x as usize] = next_state;
        }
    }
    next
}

fn span_strategy(max: u32) -> impl Strategy<Value = (u32, u32)> {
    (1..=max).prop_flat_map(move |lo| (Just(lo), lo..=max))
}

/// Range plus survival/birth spans that fit its neighbourhood.
fn rule_strategy() -> impl Strategy<Value = (u32, (u32, u32), (u32, u32))> {
    (1u32..=4).prop_flat_map(|range| {
        let window = (2 * range + 1) * (2 * range + 1);
        // Survival counts include the middle cell; birth counts cannot.
        (Just(range), span_strategy(window), span_strategy(window - 1))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prefix_sum_matches_direct_counting(
        rule_shape in rule_strategy(),
        seed_cells in proptest::collection::vec(any::<bool>(), (WIDTH * HEIGHT) as usize),
    ) {
        let (range, (s_lo, s_hi), (b_lo, b_hi)) = rule_shape;
        // Positional form: range, then survival and birth bounds, middle
        // included, Moore.
        let rule = RuleCompiler::new()
            .compile(&format!("{range},{s_lo},{s_hi},{b_lo},{b_hi}"))
            .unwrap();

        let mut grid = CellGrid::new(WIDTH, HEIGHT, TrackingPool::new());
        let mut cells = vec![vec![0u8; WIDTH as usize]; HEIGHT as usize];
        for (i, &on) in seed_cells.iter().enumerate() {
            if on {
                let (x, y) = (i as u32 % WIDTH, i as u32 / WIDTH);
                grid.set(x, y, 1);
                cells[y as usize][x as usize] = 1;
            }
        }

        let survival: Vec<u32> = (s_lo..=s_hi).collect();
        let birth: Vec<u32> = (b_lo..=b_hi).collect();
        let expected = reference_step(&cells, i64::from(range), &survival, &birth);

        let mut engine = StepEngine::new(TrackingPool::new());
        let summary = engine.step(&mut grid, &rule, 0).unwrap();

        let mut expected_population = 0u64;
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                let want = expected[y as usize][x as usize];
                prop_assert_eq!(grid.get(x, y), want, "cell ({}, {})", x, y);
                expected_population += u64::from(want);
            }
        }
        prop_assert_eq!(summary.population, expected_population);

        // Every live cell sits inside the returned bounding box.
        if let Some(bbox) = summary.bounding_box {
            for y in 0..HEIGHT {
                for x in 0..WIDTH {
                    if grid.get(x, y) != 0 {
                        prop_assert!(
                            (bbox.min_x..=bbox.max_x).contains(&x)
                                && (bbox.min_y..=bbox.max_y).contains(&y)
                        );
                    }
                }
            }
        } else {
            prop_assert_eq!(summary.population, 0);
        }
    }
}
