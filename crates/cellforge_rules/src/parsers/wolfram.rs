//! `W<n>` Wolfram elementary rules.

use crate::error::{Result, RuleError};
use crate::parsers::ParserStrategy;
use crate::predicate::{CountSet, RulePredicate};
use crate::spec::{Neighbourhood, RuleFamily, RuleSpec};

pub struct WolframStrategy;

impl ParserStrategy for WolframStrategy {
    fn name(&self) -> &'static str {
        "wolfram"
    }

    fn matches(&self, text: &str) -> bool {
        let mut chars = text.chars();
        matches!(chars.next(), Some('w' | 'W'))
            && text.len() > 1
            && chars.all(|c| c.is_ascii_digit())
    }

    fn parse(&self, text: &str) -> Result<RuleSpec> {
        let code: u32 = text[1..]
            .parse()
            .map_err(|_| RuleError::InvalidNumber(text.to_string()))?;
        if code > 254 {
            return Err(RuleError::InvalidNumber(format!(
                "Wolfram rule {code} above 254"
            )));
        }
        // Odd rules turn an all-dead neighbourhood alive everywhere.
        if code % 2 != 0 {
            return Err(RuleError::unsupported(format!(
                "Wolfram rule {code} must be even"
            )));
        }
        Ok(RuleSpec {
            family: RuleFamily::WolframElementary,
            neighbourhood: Neighbourhood::Moore,
            range: 1,
            state_count: 2,
            birth: RulePredicate::Counts(CountSet::new(2)),
            survival: RulePredicate::Counts(CountSet::new(2)),
            middle_included: false,
            block_transitions: None,
            wolfram_code: Some(code as u8),
            canonical_name: format!("W{code}"),
            overlay: None,
            alternate: None,
            bounded_grid: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_even_codes() {
        let spec = WolframStrategy.parse("W110").unwrap();
        assert_eq!(spec.family, RuleFamily::WolframElementary);
        assert_eq!(spec.wolfram_code, Some(110));
        assert_eq!(spec.canonical_name, "W110");
    }

    #[test]
    fn rejects_odd_and_oversized() {
        assert!(WolframStrategy.parse("W30").is_ok());
        assert!(WolframStrategy.parse("W31").is_err());
        assert!(WolframStrategy.parse("W256").is_err());
    }

    #[test]
    fn match_is_structural() {
        assert!(WolframStrategy.matches("W0"));
        assert!(!WolframStrategy.matches("W"));
        assert!(!WolframStrategy.matches("W3a"));
    }
}
