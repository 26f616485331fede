//! `@TABLE` body interpreter.
//!
//! Decodes variable declarations and transition lines into a packed bit-plane
//! lookup: for every input position and candidate state a bitmask records
//! which transitions accept that state, 32 transitions per slot, so a full
//! neighbourhood test is a handful of AND operations.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::{Result, RuleError};
use crate::tokens::RuleTokenizer;

/// Cap on expanded transitions; pathological tables fail instead of
/// exhausting memory.
const MAX_EXPANDED: usize = 1 << 20;

/// Neighbourhood declared in the table header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableNeighborhood {
    Moore,
    VonNeumann,
    Hexagonal,
    OneDimensional,
}

impl TableNeighborhood {
    /// Number of neighbour positions (excluding the centre).
    #[must_use]
    pub fn neighbour_count(&self) -> usize {
        match self {
            TableNeighborhood::Moore => 8,
            TableNeighborhood::VonNeumann => 4,
            TableNeighborhood::Hexagonal => 6,
            TableNeighborhood::OneDimensional => 2,
        }
    }

    /// Inputs per transition: centre plus neighbours.
    #[must_use]
    pub fn input_count(&self) -> usize {
        self.neighbour_count() + 1
    }

    fn parse(token: &str) -> Result<Self> {
        match token.to_ascii_lowercase().as_str() {
            "moore" => Ok(TableNeighborhood::Moore),
            "vonneumann" => Ok(TableNeighborhood::VonNeumann),
            "hexagonal" => Ok(TableNeighborhood::Hexagonal),
            "onedimensional" => Ok(TableNeighborhood::OneDimensional),
            other => Err(RuleError::table(format!("unknown neighborhood {other}"))),
        }
    }
}

/// Declared symmetry of the transition set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSymmetry {
    None,
    Permute,
    Rotate4,
    Rotate8,
    Rotate4Reflect,
    Rotate8Reflect,
    Rotate6,
    Rotate6Reflect,
}

impl TableSymmetry {
    fn parse(token: &str) -> Result<Self> {
        match token.to_ascii_lowercase().as_str() {
            "none" => Ok(TableSymmetry::None),
            "permute" => Ok(TableSymmetry::Permute),
            "rotate4" => Ok(TableSymmetry::Rotate4),
            "rotate8" => Ok(TableSymmetry::Rotate8),
            "rotate4reflect" => Ok(TableSymmetry::Rotate4Reflect),
            "rotate8reflect" => Ok(TableSymmetry::Rotate8Reflect),
            "rotate6" => Ok(TableSymmetry::Rotate6),
            "rotate6reflect" => Ok(TableSymmetry::Rotate6Reflect),
            other => Err(RuleError::table(format!("unknown symmetry {other}"))),
        }
    }
}

/// Packed transition lookup decoded from a `@TABLE` body.
#[derive(Debug, Clone)]
pub struct LookupTable {
    pub n_states: u16,
    pub neighborhood: TableNeighborhood,
    pub symmetry: TableSymmetry,
    /// `masks[position][state][slot]`: bit `t % 32` of slot `t / 32` is set
    /// when transition `t` accepts `state` at `position`.
    masks: Vec<Vec<Vec<u32>>>,
    outputs: Vec<u16>,
}

impl LookupTable {
    /// Number of expanded transitions.
    #[must_use]
    pub fn transition_count(&self) -> usize {
        self.outputs.len()
    }

    /// Looks up the output state for `inputs` (centre first, then
    /// neighbours in declaration order). Returns `None` when no transition
    /// matches, meaning the cell keeps its current state.
    #[must_use]
    pub fn lookup(&self, inputs: &[u16]) -> Option<u16> {
        let n_inputs = self.neighborhood.input_count();
        if inputs.len() != n_inputs {
            return None;
        }
        let slots = self.outputs.len().div_ceil(32);
        for slot in 0..slots {
            let mut acc = u32::MAX;
            for (pos, &state) in inputs.iter().enumerate() {
                if state >= self.n_states {
                    return None;
                }
                acc &= self.masks[pos][state as usize][slot];
                if acc == 0 {
                    break;
                }
            }
            if acc != 0 {
                let idx = slot * 32 + acc.trailing_zeros() as usize;
                return Some(self.outputs[idx]);
            }
        }
        None
    }
}

#[derive(Debug, Clone)]
enum Entry {
    Literal(u16),
    Var(String),
}

/// Decodes a `@TABLE` body from the tokenizer.
pub fn decode_table(tokens: &mut dyn RuleTokenizer) -> Result<LookupTable> {
    let mut n_states: Option<u16> = None;
    let mut neighborhood: Option<TableNeighborhood> = None;
    let mut symmetry = TableSymmetry::None;
    let mut vars: HashMap<String, Vec<u16>> = HashMap::new();
    let mut expanded: Vec<(Vec<u16>, u16)> = Vec::new();
    let mut seen: HashSet<Vec<u16>> = HashSet::new();

    while let Some(line) = tokens.next_line() {
        match line[0].as_str() {
            "n_states" => {
                let n: u32 = parse_num(&line, 1)?;
                if !(2..=256).contains(&n) {
                    return Err(RuleError::StatesOutOfRange(n));
                }
                n_states = Some(n as u16);
            }
            "neighborhood" => {
                neighborhood = Some(TableNeighborhood::parse(
                    line.get(1).map(String::as_str).unwrap_or(""),
                )?);
            }
            "symmetries" => {
                symmetry = TableSymmetry::parse(line.get(1).map(String::as_str).unwrap_or(""))?;
            }
            "var" => {
                let states =
                    n_states.ok_or_else(|| RuleError::table("var before n_states"))?;
                let name = line
                    .get(1)
                    .ok_or_else(|| RuleError::table("var without a name"))?
                    .clone();
                let mut values = Vec::new();
                for token in &line[2..] {
                    if let Ok(v) = token.parse::<u16>() {
                        if v >= states {
                            return Err(RuleError::table(format!(
                                "state {v} out of range in var {name}"
                            )));
                        }
                        values.push(v);
                    } else if let Some(prev) = vars.get(token) {
                        values.extend_from_slice(prev);
                    } else {
                        return Err(RuleError::table(format!(
                            "unknown variable {token} in var {name}"
                        )));
                    }
                }
                if values.is_empty() {
                    return Err(RuleError::table(format!("var {name} has no values")));
                }
                values.sort_unstable();
                values.dedup();
                vars.insert(name, values);
            }
            _ => {
                let states =
                    n_states.ok_or_else(|| RuleError::table("transition before n_states"))?;
                let nbhd = neighborhood
                    .ok_or_else(|| RuleError::table("transition before neighborhood"))?;
                expand_transition(
                    &line, states, nbhd, symmetry, &vars, &mut expanded, &mut seen,
                )?;
            }
        }
    }

    let neighborhood =
        neighborhood.ok_or_else(|| RuleError::table("missing neighborhood header"))?;
    let n_states = n_states.ok_or_else(|| RuleError::table("missing n_states header"))?;
    if expanded.is_empty() {
        return Err(RuleError::table("no transitions"));
    }

    Ok(pack(n_states, neighborhood, symmetry, &expanded))
}

fn parse_num(line: &[String], idx: usize) -> Result<u32> {
    line.get(idx)
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| RuleError::table(format!("expected number in {line:?}")))
}

fn expand_transition(
    line: &[String],
    n_states: u16,
    neighborhood: TableNeighborhood,
    symmetry: TableSymmetry,
    vars: &HashMap<String, Vec<u16>>,
    expanded: &mut Vec<(Vec<u16>, u16)>,
    seen: &mut HashSet<Vec<u16>>,
) -> Result<()> {
    let n_inputs = neighborhood.input_count();
    if line.len() != n_inputs + 1 {
        return Err(RuleError::table(format!(
            "expected {} entries, got {}",
            n_inputs + 1,
            line.len()
        )));
    }

    let mut entries = Vec::with_capacity(line.len());
    for token in line {
        if let Ok(v) = token.parse::<u16>() {
            if v >= n_states {
                return Err(RuleError::table(format!("state {v} out of range")));
            }
            entries.push(Entry::Literal(v));
        } else if vars.contains_key(token) {
            entries.push(Entry::Var(token.clone()));
        } else {
            return Err(RuleError::table(format!("unknown variable {token}")));
        }
    }

    // A variable repeated across positions is bound: one concrete value per
    // distinct variable, so the expansion is over the cross-product of
    // distinct variables.
    let mut distinct: Vec<&String> = Vec::new();
    for entry in &entries {
        if let Entry::Var(name) = entry {
            if !distinct.contains(&name) {
                distinct.push(name);
            }
        }
    }
    if let Entry::Var(name) = &entries[n_inputs] {
        if !entries[..n_inputs]
            .iter()
            .any(|e| matches!(e, Entry::Var(n) if n == name))
            && vars[name].len() != 1
        {
            return Err(RuleError::table(format!(
                "output variable {name} is unbound"
            )));
        }
    }

    let perms = symmetry_group(neighborhood, symmetry)?;
    let mut indices = vec![0usize; distinct.len()];
    loop {
        let assignment: HashMap<&String, u16> = distinct
            .iter()
            .zip(&indices)
            .map(|(name, &i)| (*name, vars[*name][i]))
            .collect();
        let concrete: Vec<u16> = entries
            .iter()
            .map(|e| match e {
                Entry::Literal(v) => *v,
                Entry::Var(name) => assignment[name],
            })
            .collect();
        let output = concrete[n_inputs];
        let inputs = &concrete[..n_inputs];

        for tuple in apply_symmetry(inputs, &perms, symmetry) {
            if expanded.len() >= MAX_EXPANDED {
                return Err(RuleError::table("transition expansion too large"));
            }
            // Duplicate expansions are suppressed; the first wins.
            if seen.insert(tuple.clone()) {
                expanded.push((tuple, output));
            }
        }

        // Advance the cross-product odometer.
        let mut done = true;
        for (i, name) in distinct.iter().enumerate().rev() {
            indices[i] += 1;
            if indices[i] < vars[*name].len() {
                done = false;
                break;
            }
            indices[i] = 0;
        }
        if done || distinct.is_empty() {
            break;
        }
    }
    Ok(())
}

/// Index permutations over the neighbour positions for a symmetry.
fn symmetry_group(
    neighborhood: TableNeighborhood,
    symmetry: TableSymmetry,
) -> Result<Vec<Vec<usize>>> {
    let n = neighborhood.neighbour_count();
    let rotate = |by: usize| -> Vec<usize> { (0..n).map(|i| (i + by) % n).collect() };
    let reflect: Vec<usize> = (0..n).map(|i| (n - i) % n).collect();

    let generators: Vec<Vec<usize>> = match (neighborhood, symmetry) {
        (_, TableSymmetry::None | TableSymmetry::Permute) => vec![],
        (TableNeighborhood::Moore, TableSymmetry::Rotate4) => vec![rotate(2)],
        (TableNeighborhood::Moore, TableSymmetry::Rotate8) => vec![rotate(1)],
        (TableNeighborhood::Moore, TableSymmetry::Rotate4Reflect) => {
            vec![rotate(2), reflect]
        }
        (TableNeighborhood::Moore, TableSymmetry::Rotate8Reflect) => {
            vec![rotate(1), reflect]
        }
        (TableNeighborhood::VonNeumann, TableSymmetry::Rotate4) => vec![rotate(1)],
        (TableNeighborhood::VonNeumann, TableSymmetry::Rotate4Reflect) => {
            vec![rotate(1), reflect]
        }
        (TableNeighborhood::Hexagonal, TableSymmetry::Rotate6) => vec![rotate(1)],
        (TableNeighborhood::Hexagonal, TableSymmetry::Rotate6Reflect) => {
            vec![rotate(1), reflect]
        }
        (nbhd, sym) => {
            return Err(RuleError::table(format!(
                "symmetry {sym:?} not valid for {nbhd:?}"
            )))
        }
    };

    // Close the generator set into the full group.
    let identity: Vec<usize> = (0..n).collect();
    let mut group: HashSet<Vec<usize>> = HashSet::new();
    let mut queue = VecDeque::new();
    group.insert(identity.clone());
    queue.push_back(identity);
    while let Some(p) = queue.pop_front() {
        for g in &generators {
            let composed: Vec<usize> = (0..n).map(|i| p[g[i]]).collect();
            if group.insert(composed.clone()) {
                queue.push_back(composed);
            }
        }
    }
    Ok(group.into_iter().collect())
}

/// Expands one concrete input tuple into its symmetry orbit. The centre
/// (position 0) is fixed; permutations act on the neighbour positions.
fn apply_symmetry(
    inputs: &[u16],
    perms: &[Vec<usize>],
    symmetry: TableSymmetry,
) -> Vec<Vec<u16>> {
    let centre = inputs[0];
    let neighbours = &inputs[1..];

    if symmetry == TableSymmetry::Permute {
        // Orbit under all arrangements, generated by transpositions on the
        // concrete tuple (bounded by the multiset permutation count).
        let mut seen: HashSet<Vec<u16>> = HashSet::new();
        let mut queue = VecDeque::new();
        seen.insert(neighbours.to_vec());
        queue.push_back(neighbours.to_vec());
        while let Some(t) = queue.pop_front() {
            for i in 0..t.len().saturating_sub(1) {
                let mut next = t.clone();
                next.swap(i, i + 1);
                if seen.insert(next.clone()) {
                    queue.push_back(next);
                }
            }
        }
        return seen
            .into_iter()
            .map(|nbrs| {
                let mut tuple = Vec::with_capacity(nbrs.len() + 1);
                tuple.push(centre);
                tuple.extend(nbrs);
                tuple
            })
            .collect();
    }

    perms
        .iter()
        .map(|perm| {
            let mut tuple = Vec::with_capacity(inputs.len());
            tuple.push(centre);
            for i in 0..neighbours.len() {
                tuple.push(neighbours[perm[i]]);
            }
            tuple
        })
        .collect::<HashSet<_>>()
        .into_iter()
        .collect()
}

fn pack(
    n_states: u16,
    neighborhood: TableNeighborhood,
    symmetry: TableSymmetry,
    expanded: &[(Vec<u16>, u16)],
) -> LookupTable {
    let n_inputs = neighborhood.input_count();
    let slots = expanded.len().div_ceil(32);
    let mut masks =
        vec![vec![vec![0u32; slots]; n_states as usize]; n_inputs];
    let mut outputs = Vec::with_capacity(expanded.len());

    for (t, (inputs, output)) in expanded.iter().enumerate() {
        for (pos, &state) in inputs.iter().enumerate() {
            masks[pos][state as usize][t / 32] |= 1 << (t % 32);
        }
        outputs.push(*output);
    }

    tracing::debug!(
        transitions = outputs.len(),
        states = n_states,
        "packed rule table"
    );

    LookupTable {
        n_states,
        neighborhood,
        symmetry,
        masks,
        outputs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::TextTokenizer;

    fn decode(text: &str) -> Result<LookupTable> {
        decode_table(&mut TextTokenizer::new(text))
    }

    #[test]
    fn decodes_simple_von_neumann_table() {
        let table = decode(
            "n_states:2\n\
             neighborhood:vonNeumann\n\
             symmetries:none\n\
             0,1,0,0,0,1\n",
        )
        .unwrap();
        assert_eq!(table.transition_count(), 1);
        assert_eq!(table.lookup(&[0, 1, 0, 0, 0]), Some(1));
        assert_eq!(table.lookup(&[0, 0, 1, 0, 0]), None);
    }

    #[test]
    fn rotate4_expands_the_orbit() {
        let table = decode(
            "n_states:2\n\
             neighborhood:vonNeumann\n\
             symmetries:rotate4\n\
             0,1,0,0,0,1\n",
        )
        .unwrap();
        assert_eq!(table.transition_count(), 4);
        assert_eq!(table.lookup(&[0, 0, 1, 0, 0]), Some(1));
        assert_eq!(table.lookup(&[0, 0, 0, 0, 1]), Some(1));
        assert_eq!(table.lookup(&[0, 1, 1, 0, 0]), None);
    }

    #[test]
    fn bound_variable_repeats_one_value() {
        let table = decode(
            "n_states:3\n\
             neighborhood:vonNeumann\n\
             symmetries:none\n\
             var a={1,2}\n\
             0,a,a,0,0,a\n",
        )
        .unwrap();
        // Two expansions: a=1 everywhere and a=2 everywhere.
        assert_eq!(table.transition_count(), 2);
        assert_eq!(table.lookup(&[0, 1, 1, 0, 0]), Some(1));
        assert_eq!(table.lookup(&[0, 2, 2, 0, 0]), Some(2));
        // Mixed assignment is not admitted by a bound variable.
        assert_eq!(table.lookup(&[0, 1, 2, 0, 0]), None);
    }

    #[test]
    fn independent_variables_cross_product() {
        let table = decode(
            "n_states:3\n\
             neighborhood:vonNeumann\n\
             symmetries:none\n\
             var a={1,2}\n\
             var b=a\n\
             0,a,b,0,0,0\n",
        )
        .unwrap();
        assert_eq!(table.transition_count(), 4);
        assert_eq!(table.lookup(&[0, 1, 2, 0, 0]), Some(0));
    }

    #[test]
    fn duplicate_expansions_are_suppressed() {
        let table = decode(
            "n_states:2\n\
             neighborhood:vonNeumann\n\
             symmetries:rotate4\n\
             0,1,1,1,1,1\n",
        )
        .unwrap();
        // All four rotations coincide.
        assert_eq!(table.transition_count(), 1);
    }

    #[test]
    fn permute_symmetry_covers_arrangements() {
        let table = decode(
            "n_states:2\n\
             neighborhood:vonNeumann\n\
             symmetries:permute\n\
             0,1,1,0,0,1\n",
        )
        .unwrap();
        // C(4,2) arrangements of two live neighbours.
        assert_eq!(table.transition_count(), 6);
        assert_eq!(table.lookup(&[0, 0, 1, 0, 1]), Some(1));
    }

    #[test]
    fn rejects_out_of_range_state() {
        let err = decode(
            "n_states:2\n\
             neighborhood:vonNeumann\n\
             0,2,0,0,0,1\n",
        )
        .unwrap_err();
        assert!(matches!(err, RuleError::Table(_)));
    }

    #[test]
    fn rejects_wrong_arity() {
        let err = decode(
            "n_states:2\n\
             neighborhood:Moore\n\
             0,1,0,1\n",
        )
        .unwrap_err();
        assert!(matches!(err, RuleError::Table(_)));
    }

    #[test]
    fn rejects_unknown_variable() {
        let err = decode(
            "n_states:2\n\
             neighborhood:vonNeumann\n\
             0,q,0,0,0,1\n",
        )
        .unwrap_err();
        assert!(matches!(err, RuleError::Table(_)));
    }
}
