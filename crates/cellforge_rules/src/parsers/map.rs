//! `MAP<base64>` explicit truth tables.
//!
//! The payload is a base64 bit stream with one output bit per neighbourhood
//! configuration: 2^9 bits (86 chars) for Moore, 2^7 (22 chars) for
//! hexagonal, 2^5 (6 chars) for von Neumann. Configuration index bits run
//! row-major through the neighbourhood with the centre in the middle, most
//! significant first. An optional `/<gens>` suffix adds decaying states.

use crate::error::{Result, RuleError};
use crate::orbits;
use crate::parsers::ParserStrategy;
use crate::predicate::{PatternSet, RulePredicate};
use crate::spec::{Neighbourhood, RuleFamily, RuleSpec, MAX_STATES};

const MOORE_CHARS: usize = 86;
const HEX_CHARS: usize = 22;
const VON_NEUMANN_CHARS: usize = 6;

const BASE64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

pub struct MapStrategy;

impl ParserStrategy for MapStrategy {
    fn name(&self) -> &'static str {
        "map"
    }

    fn matches(&self, text: &str) -> bool {
        let upper = text.get(..3).map(str::to_ascii_uppercase);
        upper.as_deref() == Some("MAP") && text.len() > 3
    }

    fn parse(&self, text: &str) -> Result<RuleSpec> {
        let body = &text[3..];
        let (payload, state_count) = match body.split_once('/') {
            Some((payload, gens)) => {
                let n: u32 = gens
                    .parse()
                    .map_err(|_| RuleError::InvalidNumber(gens.to_string()))?;
                if !(2..=MAX_STATES).contains(&n) {
                    return Err(RuleError::StatesOutOfRange(n));
                }
                (payload, n)
            }
            None => (body, 2),
        };
        let payload = payload.trim_end_matches('=');

        let (neighbourhood, index_bits) = match payload.len() {
            MOORE_CHARS => (Neighbourhood::Moore, 9u32),
            HEX_CHARS => (Neighbourhood::Hexagonal, 7),
            VON_NEUMANN_CHARS => (Neighbourhood::VonNeumann, 5),
            n => {
                return Err(RuleError::unsupported(format!(
                    "MAP payload of {n} chars is not a Moore, hexagonal or von Neumann table"
                )))
            }
        };

        let bits = decode_base64(payload)?;
        let configs = 1usize << index_bits;
        let pattern_bits = index_bits - 1;
        let mut birth = PatternSet::new(pattern_bits);
        let mut survival = PatternSet::new(pattern_bits);

        for index in 0..configs {
            if !bits[index] {
                continue;
            }
            let (pattern, centre) = split_index(index as u16, index_bits, &neighbourhood);
            if centre {
                survival.insert(pattern);
            } else {
                birth.insert(pattern);
            }
        }

        let family = if state_count > 2 {
            RuleFamily::Generations
        } else {
            RuleFamily::ClassicLifelike
        };
        let canonical_name = if state_count > 2 {
            format!("MAP{payload}/{state_count}")
        } else {
            format!("MAP{payload}")
        };

        Ok(RuleSpec {
            family,
            neighbourhood,
            range: 1,
            state_count,
            birth: RulePredicate::Patterns(birth),
            survival: RulePredicate::Patterns(survival),
            middle_included: false,
            block_transitions: None,
            wolfram_code: None,
            canonical_name,
            overlay: None,
            alternate: None,
            bounded_grid: None,
        })
    }
}

/// Expands base64 chars into a most-significant-first bit stream.
fn decode_base64(payload: &str) -> Result<Vec<bool>> {
    let mut bits = Vec::with_capacity(payload.len() * 6);
    for ch in payload.bytes() {
        let value = BASE64
            .iter()
            .position(|&b| b == ch)
            .ok_or_else(|| RuleError::UnknownToken(format!("base64 char {:?}", ch as char)))?;
        for shift in (0..6).rev() {
            bits.push(value >> shift & 1 != 0);
        }
    }
    Ok(bits)
}

/// Splits a configuration index into `(packed neighbour pattern, centre)`.
///
/// Moore indexes read NW, N, NE, W, C, E, SW, S, SE most significant first
/// and are repacked into the ring-mask layout; the hexagonal and von Neumann
/// orderings already match their pattern-bit layouts once the centre bit is
/// removed.
fn split_index(index: u16, index_bits: u32, shape: &Neighbourhood) -> (u16, bool) {
    let centre_shift = index_bits / 2;
    let centre = index >> centre_shift & 1 != 0;
    match shape {
        Neighbourhood::Moore => {
            let bit = |shift: u32| index >> shift & 1;
            let mut mask = 0u16;
            for (shift, ring) in [
                (8, orbits::NW),
                (7, orbits::N),
                (6, orbits::NE),
                (5, orbits::W),
                (3, orbits::E),
                (2, orbits::SW),
                (1, orbits::S),
                (0, orbits::SE),
            ] {
                if bit(shift) != 0 {
                    mask |= u16::from(ring);
                }
            }
            (mask, centre)
        }
        _ => {
            let high = index >> (centre_shift + 1) << centre_shift;
            let low = index & ((1 << centre_shift) - 1);
            (high | low, centre)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A Moore payload with exactly one bit set: bit 0 of the first base64
    /// char, which is configuration index 5 (SW and SE live, centre dead).
    const ONE_BIRTH: &str = "MAPBAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

    #[test]
    fn decodes_single_moore_configuration() {
        let spec = MapStrategy.parse(ONE_BIRTH).unwrap();
        assert_eq!(spec.neighbourhood, Neighbourhood::Moore);
        assert_eq!(spec.state_count, 2);
        let RulePredicate::Patterns(birth) = &spec.birth else {
            panic!("expected pattern predicate");
        };
        assert_eq!(birth.len(), 1);
        assert!(birth.contains(u16::from(orbits::SW | orbits::SE)));
        let RulePredicate::Patterns(survival) = &spec.survival else {
            panic!("expected pattern predicate");
        };
        assert!(survival.is_empty());
    }

    #[test]
    fn centre_bit_routes_to_survival() {
        // Index 16 = centre bit alone: a live cell with no neighbours.
        // Bit 16 of the stream is bit 1 of the third base64 char.
        let mut payload = vec![b'A'; 86];
        payload[2] = b'C';
        let text = format!("MAP{}", String::from_utf8(payload).unwrap());
        let spec = MapStrategy.parse(&text).unwrap();
        let RulePredicate::Patterns(survival) = &spec.survival else {
            panic!("expected pattern predicate");
        };
        assert_eq!(survival.len(), 1);
        assert!(survival.contains(0));
    }

    #[test]
    fn generations_suffix_sets_states() {
        let text = format!("{ONE_BIRTH}/4");
        let spec = MapStrategy.parse(&text).unwrap();
        assert_eq!(spec.family, RuleFamily::Generations);
        assert_eq!(spec.state_count, 4);
        assert!(spec.canonical_name.ends_with("/4"));
    }

    #[test]
    fn payload_length_selects_neighbourhood() {
        let hex = format!("MAP{}", "A".repeat(22));
        assert_eq!(
            MapStrategy.parse(&hex).unwrap().neighbourhood,
            Neighbourhood::Hexagonal
        );
        let von = format!("MAP{}", "A".repeat(6));
        assert_eq!(
            MapStrategy.parse(&von).unwrap().neighbourhood,
            Neighbourhood::VonNeumann
        );
        assert!(MapStrategy.parse("MAPAAAA").is_err());
    }

    #[test]
    fn rejects_bad_chars_and_states() {
        let bad = format!("MAP{}!", "A".repeat(85));
        assert!(MapStrategy.parse(&bad).is_err());
        assert!(MapStrategy.parse(&format!("{ONE_BIRTH}/1")).is_err());
        assert!(MapStrategy.parse(&format!("{ONE_BIRTH}/257")).is_err());
    }
}
