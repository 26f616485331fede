//! Larger-than-Life and higher-range outer-totalistic grammars.
//!
//! All sub-grammars share one compiled form: a range, a state count, a
//! middle-cell flag, birth/survival count sets and a neighbourhood shape.
//! Accepted spellings:
//!
//! * dotted sections `R2,C0,M1,S6..9,B7..8,NM`
//! * list sections `R2,C2,S6-9,B7-8,NH` with bare-number continuations
//! * `T`-span sections `R2,B6T9,S7T8`
//! * positional `r,smin,smax,bmin,bmax`
//! * compressed hex `R<r>B<hex>S<hex>`, each digit covering four counts with
//!   bit 0 the lowest
//!
//! The rule compiles as Larger-than-Life when both predicates end up as
//! non-empty contiguous spans, and as HROT otherwise; the canonical name
//! mirrors that split (dotted form versus list form).

use crate::error::{Result, RuleError};
use crate::neighbourhood::{
    decode_bitmask, decode_weights, encode_bitmask, encode_weights, max_neighbours,
    MAX_CUSTOM_RANGE,
};
use crate::parsers::ParserStrategy;
use crate::predicate::{CountSet, RulePredicate};
use crate::spec::{
    Neighbourhood, RuleFamily, RuleSpec, TriangularVariant, MAX_RANGE, MAX_STATES,
};

pub struct LtlHrotStrategy;

impl ParserStrategy for LtlHrotStrategy {
    fn name(&self) -> &'static str {
        "ltl-hrot"
    }

    fn matches(&self, text: &str) -> bool {
        let bytes = text.as_bytes();
        match bytes.first() {
            Some(b'R' | b'r') => bytes.get(1).is_some_and(u8::is_ascii_digit),
            Some(b) if b.is_ascii_digit() => is_positional(text),
            _ => false,
        }
    }

    fn parse(&self, text: &str) -> Result<RuleSpec> {
        if is_positional(text) {
            return parse_positional(text);
        }
        if let Some(result) = try_compressed(text) {
            return result;
        }
        parse_sections(text)
    }
}

fn is_positional(text: &str) -> bool {
    let tokens: Vec<&str> = text.split(',').collect();
    tokens.len() == 5
        && tokens
            .iter()
            .all(|t| !t.is_empty() && t.bytes().all(|b| b.is_ascii_digit()))
}

/// `r,smin,smax,bmin,bmax`; the survival count includes the middle cell.
fn parse_positional(text: &str) -> Result<RuleSpec> {
    let mut numbers = [0u32; 5];
    for (slot, token) in numbers.iter_mut().zip(text.split(',')) {
        *slot = token
            .parse()
            .map_err(|_| RuleError::InvalidNumber(token.to_string()))?;
    }
    let [range, smin, smax, bmin, bmax] = numbers;
    build(Sections {
        range: Some(range),
        states: 2,
        middle: true,
        shape: Some(Neighbourhood::Moore),
        survival: vec![(smin, smax)],
        birth: vec![(bmin, bmax)],
    })
}

/// `R<r>B<hex>S<hex>` with no commas; digit `i` covers counts `4i..4i+3`.
fn try_compressed(text: &str) -> Option<Result<RuleSpec>> {
    if text.contains(',') {
        return None;
    }
    let rest = &text[1..];
    let range_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    let after_range = &rest[range_len..];
    if range_len == 0 || !after_range.starts_with(['B', 'b']) {
        return None;
    }
    let (birth_hex, survival_hex) = after_range[1..].split_once(['S', 's'])?;
    if birth_hex.is_empty()
        || survival_hex.is_empty()
        || !birth_hex.bytes().all(|b| b.is_ascii_hexdigit())
        || !survival_hex.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return None;
    }
    let range: u32 = match rest[..range_len].parse() {
        Ok(r) => r,
        Err(_) => return Some(Err(RuleError::InvalidNumber(rest[..range_len].to_string()))),
    };
    Some(build(Sections {
        range: Some(range),
        states: 2,
        middle: false,
        shape: None,
        survival: hex_spans(survival_hex),
        birth: hex_spans(birth_hex),
    }))
}

fn hex_spans(hex: &str) -> Vec<(u32, u32)> {
    let mut spans = Vec::new();
    for (i, ch) in hex.chars().enumerate() {
        let digit = ch.to_digit(16).unwrap_or(0);
        for bit in 0..4u32 {
            if digit & (1 << bit) != 0 {
                let count = 4 * i as u32 + bit;
                spans.push((count, count));
            }
        }
    }
    spans
}

struct Sections {
    range: Option<u32>,
    states: u32,
    middle: bool,
    shape: Option<Neighbourhood>,
    survival: Vec<(u32, u32)>,
    birth: Vec<(u32, u32)>,
}

#[derive(Clone, Copy)]
enum Target {
    Survival,
    Birth,
}

fn parse_sections(text: &str) -> Result<RuleSpec> {
    let mut sections = Sections {
        range: None,
        states: 2,
        middle: false,
        shape: None,
        survival: Vec::new(),
        birth: Vec::new(),
    };
    let mut active: Option<Target> = None;

    for token in text.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let head = token.chars().next().unwrap_or_default();
        let rest = &token[head.len_utf8()..];
        match head.to_ascii_uppercase() {
            'R' => {
                sections.range = Some(
                    rest.parse()
                        .map_err(|_| RuleError::InvalidNumber(token.to_string()))?,
                );
                active = None;
            }
            'C' => {
                let n: u32 = rest
                    .parse()
                    .map_err(|_| RuleError::InvalidNumber(token.to_string()))?;
                if n > MAX_STATES {
                    return Err(RuleError::StatesOutOfRange(n));
                }
                sections.states = n.max(2);
                active = None;
            }
            'M' => {
                sections.middle = match rest {
                    "0" => false,
                    "1" => true,
                    _ => return Err(RuleError::InvalidNumber(token.to_string())),
                };
                active = None;
            }
            'S' => {
                if !rest.is_empty() {
                    sections.survival.push(parse_span(rest)?);
                }
                active = Some(Target::Survival);
            }
            'B' => {
                if !rest.is_empty() {
                    sections.birth.push(parse_span(rest)?);
                }
                active = Some(Target::Birth);
            }
            'N' => {
                let range = sections
                    .range
                    .ok_or_else(|| RuleError::unsupported("neighbourhood before range"))?;
                sections.shape = Some(parse_shape(rest, range)?);
                active = None;
            }
            c if c.is_ascii_digit() => {
                let span = parse_span(token)?;
                match active {
                    Some(Target::Survival) => sections.survival.push(span),
                    Some(Target::Birth) => sections.birth.push(span),
                    None => return Err(RuleError::UnknownToken(token.to_string())),
                }
            }
            _ => return Err(RuleError::UnknownToken(token.to_string())),
        }
    }

    build(sections)
}

/// One count item: `6..9`, `6-9`, `6T9` or a single number.
fn parse_span(item: &str) -> Result<(u32, u32)> {
    let bad = || RuleError::InvalidNumber(item.to_string());
    let parse_pair = |lo: &str, hi: &str| -> Result<(u32, u32)> {
        Ok((
            lo.parse().map_err(|_| bad())?,
            hi.parse().map_err(|_| bad())?,
        ))
    };
    if let Some((lo, hi)) = item.split_once("..") {
        parse_pair(lo, hi)
    } else if let Some((lo, hi)) = item.split_once(['-', 'T', 't']) {
        parse_pair(lo, hi)
    } else {
        let n: u32 = item.parse().map_err(|_| bad())?;
        Ok((n, n))
    }
}

fn parse_shape(token: &str, range: u32) -> Result<Neighbourhood> {
    let mut chars = token.chars();
    let head = chars
        .next()
        .ok_or_else(|| RuleError::unsupported("empty neighbourhood"))?;
    let tail = &token[head.len_utf8()..];
    let shape = match head.to_ascii_uppercase() {
        'W' => return decode_weights(tail, range).map(Neighbourhood::CustomWeighted),
        '@' => return decode_bitmask(tail, range).map(Neighbourhood::CustomBitmask),
        'M' => Neighbourhood::Moore,
        'N' => Neighbourhood::VonNeumann,
        'C' => Neighbourhood::Circular,
        '2' => Neighbourhood::L2,
        'H' => Neighbourhood::Hexagonal,
        'X' => Neighbourhood::Saltire,
        '+' => Neighbourhood::Cross,
        '*' => Neighbourhood::Star,
        'B' => Neighbourhood::Checkerboard,
        '#' => Neighbourhood::Hash,
        '3' => Neighbourhood::Tripod,
        'A' => Neighbourhood::Asterisk,
        'G' => Neighbourhood::Gaussian,
        'L' | 'T' => Neighbourhood::Triangular(TriangularVariant::All),
        _ => return Err(RuleError::UnknownToken(format!("neighbourhood N{token}"))),
    };
    if !tail.is_empty() {
        return Err(RuleError::UnknownToken(format!("neighbourhood N{token}")));
    }
    Ok(shape)
}

fn build(sections: Sections) -> Result<RuleSpec> {
    let range = sections
        .range
        .ok_or_else(|| RuleError::unsupported("missing range"))?;
    if range == 0 || range > MAX_RANGE {
        return Err(RuleError::RangeOutOfRange(range));
    }
    let shape = sections.shape.unwrap_or(Neighbourhood::Moore);
    // Gaussian weight sums grow with the fourth power of the range; cap it
    // like the custom shapes so the count predicate stays addressable.
    if shape == Neighbourhood::Gaussian && range > MAX_CUSTOM_RANGE {
        return Err(RuleError::RangeOutOfRange(range));
    }
    let max = max_neighbours(&shape, range);

    let mut birth = CountSet::new(max);
    for &(lo, hi) in &sections.birth {
        if !birth.try_insert_span(lo, hi) {
            return Err(RuleError::CountOutOfRange {
                count: hi.max(lo),
                max,
            });
        }
    }
    let survival_max = max + u32::from(sections.middle);
    let mut survival = CountSet::new(survival_max);
    for &(lo, hi) in &sections.survival {
        if !survival.try_insert_span(lo, hi) {
            return Err(RuleError::CountOutOfRange {
                count: hi.max(lo),
                max: survival_max,
            });
        }
    }

    let spanning = !birth.is_empty()
        && !survival.is_empty()
        && birth.is_contiguous()
        && survival.is_contiguous();
    let family = if spanning {
        RuleFamily::LargerThanLife
    } else {
        RuleFamily::HigherRangeOuterTotalistic
    };

    let canonical_name = format!(
        "R{range},C{},M{},S{},B{},N{}",
        if sections.states == 2 {
            0
        } else {
            sections.states
        },
        u8::from(sections.middle),
        format_counts(&survival, spanning),
        format_counts(&birth, spanning),
        shape_token(&shape, range),
    );

    Ok(RuleSpec {
        family,
        neighbourhood: shape,
        range,
        state_count: sections.states,
        birth: RulePredicate::Counts(birth),
        survival: RulePredicate::Counts(survival),
        middle_included: sections.middle,
        block_transitions: None,
        wolfram_code: None,
        canonical_name,
        overlay: None,
        alternate: None,
        bounded_grid: None,
    })
}

fn format_counts(set: &CountSet, dotted: bool) -> String {
    if dotted {
        let (lo, hi) = set.spans()[0];
        return if lo == hi {
            lo.to_string()
        } else {
            format!("{lo}..{hi}")
        };
    }
    set.spans()
        .iter()
        .map(|&(lo, hi)| {
            if lo == hi {
                lo.to_string()
            } else {
                format!("{lo}-{hi}")
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn shape_token(shape: &Neighbourhood, range: u32) -> String {
    match shape {
        Neighbourhood::Moore => "M".into(),
        Neighbourhood::VonNeumann => "N".into(),
        Neighbourhood::Circular => "C".into(),
        Neighbourhood::L2 => "2".into(),
        Neighbourhood::Hexagonal => "H".into(),
        Neighbourhood::Saltire => "X".into(),
        Neighbourhood::Cross => "+".into(),
        Neighbourhood::Star => "*".into(),
        Neighbourhood::Checkerboard => "B".into(),
        Neighbourhood::Hash => "#".into(),
        Neighbourhood::Tripod => "3".into(),
        Neighbourhood::Asterisk => "A".into(),
        Neighbourhood::Gaussian => "G".into(),
        Neighbourhood::Triangular(_) => "L".into(),
        Neighbourhood::CustomWeighted(cells) => format!("W{}", encode_weights(cells, range)),
        Neighbourhood::CustomBitmask(cells) => format!("@{}", encode_bitmask(cells, range)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(predicate: &RulePredicate) -> Vec<u32> {
        match predicate {
            RulePredicate::Counts(set) => set.iter().collect(),
            RulePredicate::Patterns(_) => panic!("expected count predicate"),
        }
    }

    #[test]
    fn dotted_form_compiles_as_larger_than_life() {
        let spec = LtlHrotStrategy.parse("R2,C0,M1,S6..9,B7..8,NM").unwrap();
        assert_eq!(spec.family, RuleFamily::LargerThanLife);
        assert_eq!(spec.range, 2);
        assert_eq!(spec.state_count, 2);
        assert!(spec.middle_included);
        assert_eq!(counts(&spec.survival), vec![6, 7, 8, 9]);
        assert_eq!(counts(&spec.birth), vec![7, 8]);
        assert_eq!(spec.canonical_name, "R2,C0,M1,S6..9,B7..8,NM");
    }

    #[test]
    fn bugs_rule_round_trips() {
        let spec = LtlHrotStrategy.parse("R5,C0,M1,S34..58,B34..45,NM").unwrap();
        assert_eq!(spec.family, RuleFamily::LargerThanLife);
        assert_eq!(spec.canonical_name, "R5,C0,M1,S34..58,B34..45,NM");
        let again = LtlHrotStrategy.parse(&spec.canonical_name).unwrap();
        assert_eq!(again, spec);
    }

    #[test]
    fn list_form_compiles_as_hrot() {
        let spec = LtlHrotStrategy.parse("R2,C2,S6-9,11,B7-8,NH").unwrap();
        assert_eq!(spec.family, RuleFamily::HigherRangeOuterTotalistic);
        assert_eq!(spec.neighbourhood, Neighbourhood::Hexagonal);
        assert_eq!(counts(&spec.survival), vec![6, 7, 8, 9, 11]);
        assert_eq!(spec.canonical_name, "R2,C0,M0,S6-9,11,B7-8,NH");
    }

    #[test]
    fn t_span_form() {
        let spec = LtlHrotStrategy.parse("R2,B6T9,S7T8").unwrap();
        assert_eq!(counts(&spec.birth), vec![6, 7, 8, 9]);
        assert_eq!(counts(&spec.survival), vec![7, 8]);
    }

    #[test]
    fn positional_form_includes_middle() {
        let spec = LtlHrotStrategy.parse("5,34,58,34,45").unwrap();
        assert_eq!(spec.family, RuleFamily::LargerThanLife);
        assert!(spec.middle_included);
        assert_eq!(spec.canonical_name, "R5,C0,M1,S34..58,B34..45,NM");
    }

    #[test]
    fn compressed_hex_form() {
        // B digit "9" = bits 0 and 3 -> counts 0 and 3; S digit "2" = count 1.
        let spec = LtlHrotStrategy.parse("R2B9S2").unwrap();
        assert_eq!(counts(&spec.birth), vec![0, 3]);
        assert_eq!(counts(&spec.survival), vec![1]);
        assert_eq!(spec.family, RuleFamily::HigherRangeOuterTotalistic);
    }

    #[test]
    fn count_above_shape_maximum_fails() {
        // von Neumann range 2 has 12 cells.
        let err = LtlHrotStrategy.parse("R2,C0,S0..3,B13,NN").unwrap_err();
        assert!(matches!(
            err,
            RuleError::CountOutOfRange { count: 13, max: 12 }
        ));
    }

    #[test]
    fn survival_maximum_grows_with_middle() {
        assert!(LtlHrotStrategy.parse("R1,C0,M1,S9,B3,NM").is_ok());
        assert!(LtlHrotStrategy.parse("R1,C0,M0,S9,B3,NM").is_err());
    }

    #[test]
    fn range_bounds_enforced() {
        assert!(LtlHrotStrategy.parse("R0,C0,S1,B1,NM").is_err());
        assert!(LtlHrotStrategy.parse("R501,C0,S1,B1,NM").is_err());
        assert!(LtlHrotStrategy.parse("R500,C0,S1,B1,NM").is_ok());
    }

    #[test]
    fn gaussian_range_is_capped() {
        assert!(LtlHrotStrategy.parse("R25,C0,S1,B1,NG").is_ok());
        let err = LtlHrotStrategy.parse("R500,C0,S1,B1,NG").unwrap_err();
        assert!(matches!(err, RuleError::RangeOutOfRange(500)));
        // Closed-form weight sum ((r+1)^2)^2 - (r+1)^2: 81 - 9 at range 2.
        let spec = LtlHrotStrategy.parse("R2,C0,S1,B1,NG").unwrap();
        let RulePredicate::Counts(set) = &spec.birth else {
            panic!("expected count predicate");
        };
        assert_eq!(set.max(), 72);
    }

    #[test]
    fn custom_weighted_neighbourhood_round_trips() {
        let spec = LtlHrotStrategy.parse("R1,C0,S2,B2,NW121202121").unwrap();
        let Neighbourhood::CustomWeighted(cells) = &spec.neighbourhood else {
            panic!("expected weighted shape");
        };
        assert_eq!(cells.len(), 8);
        assert_eq!(spec.canonical_name, "R1,C0,M0,S2,B2,NW121202121");
    }

    #[test]
    fn unknown_tokens_fail() {
        assert!(LtlHrotStrategy.parse("R2,Q4,S2,B3,NM").is_err());
        assert!(LtlHrotStrategy.parse("R2,C0,S2,B3,NZ").is_err());
        assert!(LtlHrotStrategy.parse("R2,7,S2,B3,NM").is_err());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn spans(max: u32) -> impl Strategy<Value = (u32, u32)> {
            (1..=max).prop_flat_map(move |lo| (Just(lo), lo..=max))
        }

        proptest! {
            #[test]
            fn canonical_round_trips_over_random_parameters(
                params in (1u32..=8).prop_flat_map(|range| {
                    let window = (2 * range + 1) * (2 * range + 1);
                    (Just(range), spans(window), spans(window - 1), 2u32..=16)
                }),
            ) {
                let (range, (s_lo, s_hi), (b_lo, b_hi), states) = params;
                let text =
                    format!("R{range},C{states},M1,S{s_lo}..{s_hi},B{b_lo}..{b_hi},NM");
                let spec = LtlHrotStrategy.parse(&text).unwrap();
                let again = LtlHrotStrategy.parse(&spec.canonical_name).unwrap();
                prop_assert_eq!(&again, &spec);
                prop_assert_eq!(&again.canonical_name, &spec.canonical_name);
            }
        }
    }
}
