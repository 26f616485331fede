//! Community rule-name aliases.
//!
//! Aliases are expanded before any grammar dispatch, so `HighLife` compiles
//! exactly like `B36/S23`. Matching is case-insensitive on the trimmed name.

const ALIASES: &[(&str, &str)] = &[
    ("life", "B3/S23"),
    ("conway's life", "B3/S23"),
    ("highlife", "B36/S23"),
    ("antilife", "B0123478/S01234678"),
    ("seeds", "B2/S"),
    ("long life", "B345/S5"),
    ("longlife", "B345/S5"),
    ("day & night", "B3678/S34678"),
    ("day and night", "B3678/S34678"),
    ("2x2", "B36/S125"),
    ("diamoeba", "B35678/S5678"),
    ("morley", "B368/S245"),
    ("move", "B368/S245"),
    ("replicator", "B1357/S1357"),
    ("anneal", "B4678/S35678"),
    ("34 life", "B34/S34"),
    ("34life", "B34/S34"),
    ("coagulations", "B378/S235678"),
    ("maze", "B3/S12345"),
    ("mazectric", "B3/S1234"),
    ("coral", "B3/S45678"),
    ("pseudo life", "B357/S238"),
    ("walled cities", "B45678/S2345"),
    ("assimilation", "B345/S4567"),
    ("gnarl", "B1/S1"),
    ("stains", "B3678/S235678"),
    ("star wars", "345/2/4"),
    ("brian's brain", "/2/3"),
    ("lifehistory", "B3/S23History"),
    ("lifesuper", "B3/S23Super"),
    ("tlife", "B3/S2-i34q"),
    ("bugs", "R5,C0,M1,S34..58,B34..45,NM"),
    ("waffle", "W110"),
];

/// Expands a community alias, or returns the input unchanged.
#[must_use]
pub fn expand(text: &str) -> &str {
    let key = text.trim().to_ascii_lowercase();
    for (alias, expansion) in ALIASES {
        if *alias == key {
            return expansion;
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_aliases_expand() {
        assert_eq!(expand("HighLife"), "B36/S23");
        assert_eq!(expand("  day & night "), "B3678/S34678");
    }

    #[test]
    fn unknown_names_pass_through() {
        assert_eq!(expand("B3/S23"), "B3/S23");
        assert_eq!(expand("Rule:Foo"), "Rule:Foo");
        // Empty text is not a rule; it must fall through to a syntax error.
        assert_eq!(expand(""), "");
    }
}
