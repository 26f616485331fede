//! Lifelike and Generations grammars, including non-totalistic letters.
//!
//! Accepted spellings: `B3/S23` (either order, either case), the bare `S/B`
//! form `23/3`, the Generations triple `S/B/G` (`345/2/4`) and `G<n>`
//! prefixes/suffixes, per-count letter groups with optional negation
//! (`B3/S2-i34q`), and a trailing neighbourhood selector: `H` hexagonal,
//! `HT` hexagonal tripod, `V` von Neumann, `L`/`LE`/`LV`/`LI`/`LO`
//! triangular variants.
//!
//! Letter groups expand through the orbit table in [`crate::orbits`] and are
//! valid on the Moore neighbourhood only; triangular rules spell counts ten
//! through twelve as `x`, `y`, `z`.

use crate::error::{Result, RuleError};
use crate::neighbourhood::max_neighbours;
use crate::orbits;
use crate::parsers::ParserStrategy;
use crate::predicate::{CountSet, PatternSet, RulePredicate};
use crate::spec::{Neighbourhood, RuleFamily, RuleSpec, TriangularVariant, MAX_STATES};

pub struct LifelikeStrategy;

impl ParserStrategy for LifelikeStrategy {
    fn name(&self) -> &'static str {
        "lifelike"
    }

    fn matches(&self, text: &str) -> bool {
        !text.is_empty()
            && text
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'/' || b == b'-')
            && text.bytes().any(|b| b.is_ascii_digit() || b == b'/')
    }

    fn parse(&self, text: &str) -> Result<RuleSpec> {
        let (body, shape) = strip_postfix(text);
        let (body, outer_states) = strip_generations(body)?;

        let (survival_text, birth_text, third) = split_parts(body)?;
        let states = match (outer_states, third) {
            (Some(_), Some(_)) => {
                return Err(RuleError::Duplicate("generations count".into()))
            }
            (Some(n), None) | (None, Some(n)) => {
                if !(2..=MAX_STATES).contains(&n) {
                    return Err(RuleError::StatesOutOfRange(n));
                }
                n
            }
            (None, None) => 2,
        };

        let mode = GroupMode::for_shape(&shape);
        let birth_groups = parse_groups(birth_text, mode)?;
        let survival_groups = parse_groups(survival_text, mode)?;
        let lettered = birth_groups.iter().chain(&survival_groups).any(Group::has_letters);

        let (birth, survival) = if lettered {
            (
                RulePredicate::Patterns(expand_patterns(&birth_groups)?),
                RulePredicate::Patterns(expand_patterns(&survival_groups)?),
            )
        } else {
            let max = max_neighbours(&shape, 1);
            (
                RulePredicate::Counts(collect_counts(&birth_groups, max)?),
                RulePredicate::Counts(collect_counts(&survival_groups, max)?),
            )
        };

        let canonical_name = canonical(&birth, &survival, &birth_groups, &survival_groups, states, &shape);
        let family = if states > 2 {
            RuleFamily::Generations
        } else {
            RuleFamily::ClassicLifelike
        };

        Ok(RuleSpec {
            family,
            neighbourhood: shape,
            range: 1,
            state_count: states,
            birth,
            survival,
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

fn strip_postfix(text: &str) -> (&str, Neighbourhood) {
    use TriangularVariant::*;
    let two = [
        ("ht", Neighbourhood::Tripod),
        ("le", Neighbourhood::Triangular(Edges)),
        ("lv", Neighbourhood::Triangular(Vertices)),
        ("li", Neighbourhood::Triangular(Inner)),
        ("lo", Neighbourhood::Triangular(Outer)),
    ];
    let lower = text.to_ascii_lowercase();
    for (suffix, shape) in two {
        if lower.ends_with(suffix) {
            return (&text[..text.len() - 2], shape);
        }
    }
    let one = [
        ("h", Neighbourhood::Hexagonal),
        ("v", Neighbourhood::VonNeumann),
        ("l", Neighbourhood::Triangular(All)),
    ];
    for (suffix, shape) in one {
        if lower.ends_with(suffix) {
            return (&text[..text.len() - 1], shape);
        }
    }
    (text, Neighbourhood::Moore)
}

/// Peels one leading or trailing `G<n>` generations marker.
fn strip_generations(body: &str) -> Result<(&str, Option<u32>)> {
    if let Some(rest) = body.strip_prefix(['G', 'g']) {
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits > 0 {
            let n = rest[..digits]
                .parse()
                .map_err(|_| RuleError::InvalidNumber(body.to_string()))?;
            let tail = rest[digits..].strip_prefix('/').unwrap_or(&rest[digits..]);
            return Ok((tail, Some(n)));
        }
    }
    let trailing = body.bytes().rev().take_while(u8::is_ascii_digit).count();
    if trailing > 0 && trailing + 1 < body.len() {
        let split = body.len() - trailing;
        // A `/G4` tail is a slash part, not a suffix marker.
        if body[..split].ends_with(['G', 'g']) && !body[..split - 1].ends_with('/') {
            let n = body[split..]
                .parse()
                .map_err(|_| RuleError::InvalidNumber(body.to_string()))?;
            return Ok((&body[..split - 1], Some(n)));
        }
    }
    Ok((body, None))
}

/// Splits the slash parts into `(survival, birth, states)` raw texts.
fn split_parts(body: &str) -> Result<(&str, &str, Option<u32>)> {
    let parts: Vec<&str> = body.split('/').collect();
    let prefixed = parts
        .iter()
        .any(|p| p.starts_with(['B', 'b', 'S', 's']));
    if prefixed {
        let mut birth: Option<&str> = None;
        let mut survival: Option<&str> = None;
        let mut states: Option<u32> = None;
        for part in parts {
            if part.is_empty() {
                continue;
            }
            if let Some(rest) = part.strip_prefix(['B', 'b']) {
                if birth.replace(rest).is_some() {
                    return Err(RuleError::Duplicate("birth section".into()));
                }
            } else if let Some(rest) = part.strip_prefix(['S', 's']) {
                if survival.replace(rest).is_some() {
                    return Err(RuleError::Duplicate("survival section".into()));
                }
            } else {
                let digits = part.strip_prefix(['G', 'g']).unwrap_or(part);
                let n = digits
                    .parse()
                    .map_err(|_| RuleError::UnknownToken(part.to_string()))?;
                if states.replace(n).is_some() {
                    return Err(RuleError::Duplicate("generations count".into()));
                }
            }
        }
        Ok((survival.unwrap_or(""), birth.unwrap_or(""), states))
    } else {
        match parts.as_slice() {
            [survival, birth] => Ok((survival, birth, None)),
            [survival, birth, states] => {
                let n = states
                    .parse()
                    .map_err(|_| RuleError::InvalidNumber((*states).to_string()))?;
                Ok((survival, birth, Some(n)))
            }
            _ => Err(RuleError::UnknownToken(body.to_string())),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum GroupMode {
    /// Digits plus per-count Hensel letters.
    Moore,
    /// Digits only.
    Digits,
    /// Digits plus `x`/`y`/`z` for counts ten through twelve.
    Triangular,
}

impl GroupMode {
    fn for_shape(shape: &Neighbourhood) -> Self {
        match shape {
            Neighbourhood::Moore => GroupMode::Moore,
            Neighbourhood::Triangular(_) => GroupMode::Triangular,
            _ => GroupMode::Digits,
        }
    }
}

struct Group {
    count: u32,
    negated: bool,
    letters: Vec<char>,
}

impl Group {
    fn has_letters(&self) -> bool {
        !self.letters.is_empty()
    }
}

fn parse_groups(text: &str, mode: GroupMode) -> Result<Vec<Group>> {
    let mut groups: Vec<Group> = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        let count = match c.to_ascii_lowercase() {
            d @ '0'..='9' => d as u32 - '0' as u32,
            'x' if mode == GroupMode::Triangular => 10,
            'y' if mode == GroupMode::Triangular => 11,
            'z' if mode == GroupMode::Triangular => 12,
            _ => return Err(RuleError::UnknownToken(c.to_string())),
        };
        if groups.iter().any(|g| g.count == count) {
            return Err(RuleError::Duplicate(format!("count {count}")));
        }
        let mut negated = false;
        let mut letters = Vec::new();
        if mode == GroupMode::Moore {
            if chars.peek() == Some(&'-') {
                chars.next();
                negated = true;
            }
            let valid = orbits::letters_for(count);
            while let Some(&next) = chars.peek() {
                let letter = next.to_ascii_lowercase();
                if !letter.is_ascii_alphabetic() || !valid.contains(letter) {
                    break;
                }
                chars.next();
                if letters.contains(&letter) {
                    return Err(RuleError::Duplicate(format!("letter {count}{letter}")));
                }
                letters.push(letter);
            }
            if negated && letters.is_empty() {
                return Err(RuleError::UnknownToken(format!("{count}-")));
            }
        }
        groups.push(Group {
            count,
            negated,
            letters,
        });
    }
    Ok(groups)
}

fn collect_counts(groups: &[Group], max: u32) -> Result<CountSet> {
    let mut set = CountSet::new(max);
    for group in groups {
        if !set.try_insert(group.count) {
            return Err(RuleError::CountOutOfRange {
                count: group.count,
                max,
            });
        }
    }
    Ok(set)
}

fn expand_patterns(groups: &[Group]) -> Result<PatternSet> {
    let mut set = PatternSet::new(8);
    for group in groups {
        for pattern in group_patterns(group)? {
            set.insert(u16::from(pattern));
        }
    }
    Ok(set)
}

/// Neighbour patterns one group activates.
fn group_patterns(group: &Group) -> Result<Vec<u8>> {
    if group.count > 8 {
        return Err(RuleError::CountOutOfRange {
            count: group.count,
            max: 8,
        });
    }
    if group.letters.is_empty() {
        return Ok(orbits::all_patterns(group.count));
    }
    let mut chosen = Vec::new();
    for &letter in &group.letters {
        let orbit = orbits::expand_letter(group.count, letter)
            .ok_or_else(|| RuleError::UnknownToken(format!("{}{letter}", group.count)))?;
        chosen.extend(orbit);
    }
    if group.negated {
        Ok(orbits::all_patterns(group.count)
            .into_iter()
            .filter(|p| !chosen.contains(p))
            .collect())
    } else {
        Ok(chosen)
    }
}

fn canonical(
    birth: &RulePredicate,
    survival: &RulePredicate,
    birth_groups: &[Group],
    survival_groups: &[Group],
    states: u32,
    shape: &Neighbourhood,
) -> String {
    use TriangularVariant::*;
    let postfix = match shape {
        Neighbourhood::Moore => "",
        Neighbourhood::Hexagonal => "H",
        Neighbourhood::VonNeumann => "V",
        Neighbourhood::Tripod => "HT",
        Neighbourhood::Triangular(All) => "L",
        Neighbourhood::Triangular(Edges) => "LE",
        Neighbourhood::Triangular(Vertices) => "LV",
        Neighbourhood::Triangular(Inner) => "LI",
        Neighbourhood::Triangular(Outer) => "LO",
        _ => "",
    };

    match (birth, survival) {
        (RulePredicate::Counts(b), RulePredicate::Counts(s)) => {
            if states > 2 {
                format!(
                    "{}/{}/{states}{postfix}",
                    count_digits(s),
                    count_digits(b)
                )
            } else {
                format!("B{}/S{}{postfix}", count_digits(b), count_digits(s))
            }
        }
        _ => {
            let gens = if states > 2 {
                format!("/{states}")
            } else {
                String::new()
            };
            format!(
                "B{}/S{}{gens}",
                letter_digits(birth_groups),
                letter_digits(survival_groups)
            )
        }
    }
}

fn count_digits(set: &CountSet) -> String {
    set.iter().map(count_char).collect()
}

fn count_char(count: u32) -> char {
    match count {
        10 => 'x',
        11 => 'y',
        12 => 'z',
        d => char::from_digit(d, 10).unwrap_or('?'),
    }
}

/// Letter groups in ascending count order, each spelled the shorter of the
/// positive and negated forms.
fn letter_digits(groups: &[Group]) -> String {
    let mut sorted: Vec<&Group> = groups.iter().collect();
    sorted.sort_by_key(|g| g.count);
    let mut out = String::new();
    for group in sorted {
        let available = orbits::letters_for(group.count);
        let (included, excluded): (Vec<char>, Vec<char>) = if group.negated {
            available
                .chars()
                .partition(|c| !group.letters.contains(c))
        } else {
            available.chars().partition(|c| group.letters.contains(c))
        };
        out.push(count_char(group.count));
        if group.letters.is_empty() || excluded.is_empty() {
            continue;
        }
        if included.is_empty() {
            // Group admits nothing; keep the spelled-out positive form.
            out.pop();
            continue;
        }
        if excluded.len() < included.len() {
            out.push('-');
            out.extend(excluded);
        } else {
            out.extend(included);
        }
    }
    out
}
