//! End-to-end stepping scenarios through the public facade.

use cellforge_lib::engine::{CellGrid, StepEngine, TrackingPool};
use cellforge_lib::rules::spec::{GridTopology, RuleFamily};
use cellforge_lib::rules::RuleCompiler;

fn grid(width: u32, height: u32) -> CellGrid {
    CellGrid::new(width, height, TrackingPool::new())
}

#[test]
fn blinker_oscillates_with_period_two() {
    let rule = RuleCompiler::new().compile("B3/S23").unwrap();
    assert_eq!(rule.family, RuleFamily::ClassicLifelike);

    let mut g = grid(16, 16);
    for x in 6..9 {
        g.set(x, 8, 1);
    }
    let mut engine = StepEngine::new(TrackingPool::new());

    let first = engine.step(&mut g, &rule, 0).unwrap();
    assert_eq!(first.population, 3);
    // Horizontal triple becomes vertical.
    assert_eq!(g.get(7, 7), 1);
    assert_eq!(g.get(7, 8), 1);
    assert_eq!(g.get(7, 9), 1);
    assert_eq!(g.get(6, 8), 0);

    let second = engine.step(&mut g, &rule, 1).unwrap();
    assert_eq!(second.population, 3);
    for x in 6..9 {
        assert_eq!(g.get(x, 8), 1);
    }
}

#[test]
fn generations_trail_decays_step_by_step() {
    let rule = RuleCompiler::new().compile("345/2/4").unwrap();
    assert_eq!(rule.family, RuleFamily::Generations);
    assert_eq!(rule.state_count, 4);

    let mut g = grid(12, 12);
    g.set(5, 5, 3);
    let mut engine = StepEngine::new(TrackingPool::new());

    // An isolated cell fails survival and fades through the trail states.
    for expected in [2u8, 1, 0] {
        engine.step(&mut g, &rule, 0).unwrap();
        assert_eq!(g.get(5, 5), expected);
    }
}

#[test]
fn torus_width_ten_wraps_at_range_two() {
    // Birth on exactly one neighbour makes the wrapped contribution visible.
    let rule = RuleCompiler::new()
        .compile("R2,C0,M1,S1..25,B1..1,NM:T10,10")
        .unwrap();
    assert_eq!(
        rule.bounded_grid.unwrap().topology,
        GridTopology::Torus
    );

    // The 10x10 area sits centred in a 16x16 allocation, so area column 0
    // is x=3 and columns 8..9 are x=11..12.
    let mut g = grid(16, 16);
    g.set(3, 8, 1);
    let mut engine = StepEngine::new(TrackingPool::new());
    engine.step(&mut g, &rule, 0).unwrap();

    // Columns 8 and 9 saw the cell through the wrap.
    assert_eq!(g.get(11, 8), 1);
    assert_eq!(g.get(12, 8), 1);
    // The ghost border is dead once the step completes.
    for x in 13..16 {
        for y in 0..16 {
            assert_eq!(g.get(x, y), 0, "ghost at ({x}, {y})");
        }
    }
}

#[test]
fn alternate_halves_swap_by_generation_parity() {
    let rule = RuleCompiler::new().compile("B2/S|B1/S1").unwrap();
    assert!(rule.alternate.is_some());

    let mut g = grid(16, 16);
    g.set(8, 8, 1);
    let mut engine = StepEngine::new(TrackingPool::new());

    // Even generation: B2/S kills the singleton and births nothing.
    let even = engine.step(&mut g, &rule, 0).unwrap();
    assert_eq!(even.population, 0);

    g.set(8, 8, 1);
    // Odd generation: B1/S1 rings the singleton.
    let odd = engine.step(&mut g, &rule, 1).unwrap();
    assert_eq!(odd.population, 8);
    assert_eq!(g.get(8, 8), 0);
    assert_eq!(g.get(7, 7), 1);
}

#[test]
fn history_overlay_never_changes_the_core_rule() {
    let compiler = RuleCompiler::new();
    let plain = compiler.compile("B3/S23").unwrap();
    let history = compiler.compile("B3/S23History").unwrap();
    assert_eq!(history.canonical_name, "B3/S23History");
    assert_eq!(history.birth, plain.birth);
    assert_eq!(history.survival, plain.survival);

    // Stepping is identical to the plain rule.
    let mut g = grid(16, 16);
    for x in 6..9 {
        g.set(x, 8, 1);
    }
    let mut engine = StepEngine::new(TrackingPool::new());
    let summary = engine.step(&mut g, &history, 0).unwrap();
    assert_eq!(summary.population, 3);
    assert_eq!(g.get(7, 7), 1);
}
