//! Canonical-name stability across the whole grammar surface.
//!
//! Compiling the canonical name of any produced spec must reproduce the spec
//! exactly, and the canonical form must be a fixed point.

use cellforge_lib::rules::RuleCompiler;

const RULES: &[&str] = &[
    // Classic and Generations
    "B3/S23",
    "b3/s23",
    "23/3",
    "B36/S23",
    "345/2/4",
    "B2/S34/G5",
    // Non-totalistic letters
    "B2-a/S12",
    "B3/S2-i34q",
    "B2ce/S",
    // Alternate neighbourhoods
    "B2/S34H",
    "B2/S34V",
    "B456/S45L",
    // Larger than Life / HROT
    "R2,C0,M1,S6..9,B7..8,NM",
    "R2,C2,S6-9,11,B7-8,NH",
    "R3,C0,M0,S10..20,B15..20,NC",
    "R2,B6T9,S7T8",
    "5,34,58,34,45",
    "R2B9S2",
    // MAP, block, Wolfram
    "W110",
    "M0,8,4,3,2,5,9,7,1,6,10,11,12,13,14,15",
    // Aliases resolve to canonical community names
    "Life",
    "HighLife",
    "Seeds",
    // Bounded grids, overlays, alternates
    "B3/S23:T40,20",
    "B3/S23:P50,50",
    "B3/S23:T40+5,20",
    "B3/S23History",
    "B36/S23Super:T60,60",
    "B2/S|B1/S1",
];

#[test]
fn recompiling_canonical_reproduces_the_spec() {
    let compiler = RuleCompiler::new();
    for text in RULES {
        let spec = compiler
            .compile(text)
            .unwrap_or_else(|e| panic!("{text}: {e}"));
        let again = compiler
            .compile(&spec.canonical_name)
            .unwrap_or_else(|e| panic!("{}: {e}", spec.canonical_name));
        assert_eq!(again, spec, "round trip of {text}");
    }
}

#[test]
fn canonical_form_is_a_fixed_point() {
    let compiler = RuleCompiler::new();
    for text in RULES {
        let spec = compiler.compile(text).unwrap();
        let again = compiler.compile(&spec.canonical_name).unwrap();
        assert_eq!(again.canonical_name, spec.canonical_name, "{text}");
    }
}

#[test]
fn equivalent_spellings_share_one_canonical_name() {
    let compiler = RuleCompiler::new();
    for (a, b) in [
        ("B3/S23", "23/3"),
        ("B3/S23", "Life"),
        ("b36/s23", "HighLife"),
        ("R2,C2,S6-9,B7-8,NM", "R2,C0,M0,S6..9,B7..8,NM"),
    ] {
        let left = compiler.compile(a).unwrap();
        let right = compiler.compile(b).unwrap();
        assert_eq!(left.canonical_name, right.canonical_name, "{a} vs {b}");
    }
}
