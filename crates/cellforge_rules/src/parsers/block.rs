//! Margolus and PCA block rules.
//!
//! Both grammars list sixteen values in `[0, 15]`: the output block for each
//! of the sixteen 2x2 input blocks, cells packed top-left, top-right,
//! bottom-left, bottom-right from bit 0 upward.

use crate::error::{Result, RuleError};
use crate::parsers::ParserStrategy;
use crate::predicate::{CountSet, RulePredicate};
use crate::spec::{Neighbourhood, RuleFamily, RuleSpec};

pub struct BlockStrategy;

impl ParserStrategy for BlockStrategy {
    fn name(&self) -> &'static str {
        "block"
    }

    fn matches(&self, text: &str) -> bool {
        prefix_family(text).is_some()
    }

    fn parse(&self, text: &str) -> Result<RuleSpec> {
        let (family, rest) = prefix_family(text)
            .ok_or_else(|| RuleError::UnknownToken(text.to_string()))?;

        let mut transitions = [0u8; 16];
        let mut count = 0usize;
        for token in rest.split(',') {
            let value: u32 = token
                .trim()
                .parse()
                .map_err(|_| RuleError::InvalidNumber(token.to_string()))?;
            if value > 15 {
                return Err(RuleError::InvalidNumber(format!(
                    "block transition {value} above 15"
                )));
            }
            if count == 16 {
                return Err(RuleError::unsupported("more than 16 block transitions"));
            }
            transitions[count] = value as u8;
            count += 1;
        }
        if count != 16 {
            return Err(RuleError::unsupported(format!(
                "block rule needs 16 transitions, got {count}"
            )));
        }

        let prefix = match family {
            RuleFamily::Pca => "2PCA",
            _ => "M",
        };
        let canonical_name = format!(
            "{prefix}{}",
            transitions
                .iter()
                .map(u8::to_string)
                .collect::<Vec<_>>()
                .join(",")
        );

        Ok(RuleSpec {
            family,
            neighbourhood: Neighbourhood::Moore,
            range: 1,
            state_count: 2,
            birth: RulePredicate::Counts(CountSet::new(8)),
            survival: RulePredicate::Counts(CountSet::new(8)),
            middle_included: false,
            block_transitions: Some(transitions),
            wolfram_code: None,
            canonical_name,
            overlay: None,
            alternate: None,
            bounded_grid: None,
        })
    }
}

fn prefix_family(text: &str) -> Option<(RuleFamily, &str)> {
    let upper4 = text.get(..4).map(str::to_ascii_uppercase);
    if upper4.as_deref() == Some("2PCA") {
        let rest = &text[4..];
        return rest
            .starts_with(|c: char| c.is_ascii_digit())
            .then_some((RuleFamily::Pca, rest));
    }
    if text.starts_with(['M', 'm']) {
        let rest = &text[1..];
        // Distinguish from LtL section grammars: a block rule is a bare
        // comma-separated value list with no letters anywhere.
        let bare_list = rest.contains(',')
            && rest
                .split(',')
                .all(|t| !t.trim().is_empty() && t.trim().bytes().all(|b| b.is_ascii_digit()));
        if bare_list {
            return Some((RuleFamily::Margolus, rest));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_margolus() {
        // BBM: swaps diagonal pairs, identity elsewhere.
        let spec = BlockStrategy
            .parse("M0,8,4,3,2,5,9,7,1,6,10,11,12,13,14,15")
            .unwrap();
        assert_eq!(spec.family, RuleFamily::Margolus);
        let transitions = spec.block_transitions.unwrap();
        assert_eq!(transitions[1], 8);
        assert_eq!(transitions[15], 15);
        assert_eq!(
            spec.canonical_name,
            "M0,8,4,3,2,5,9,7,1,6,10,11,12,13,14,15"
        );
    }

    #[test]
    fn parses_pca() {
        let spec = BlockStrategy
            .parse("2PCA0,2,8,10,1,3,9,11,4,6,12,14,5,7,13,15")
            .unwrap();
        assert_eq!(spec.family, RuleFamily::Pca);
        assert!(spec.canonical_name.starts_with("2PCA0,2"));
    }

    #[test]
    fn rejects_bad_counts_and_values() {
        assert!(BlockStrategy.parse("M0,1,2").is_err());
        assert!(BlockStrategy
            .parse("M0,8,4,3,2,5,9,7,1,6,10,11,12,13,14,16")
            .is_err());
        assert!(BlockStrategy
            .parse("M0,8,4,3,2,5,9,7,1,6,10,11,12,13,14,15,0")
            .is_err());
    }

    #[test]
    fn does_not_claim_lifelike_text() {
        assert!(!BlockStrategy.matches("B3/S23"));
        assert!(!BlockStrategy.matches("M1,S2..3,B3..3"));
    }
}
