//! `@TREE` body interpreter.
//!
//! A rule tree is a flat array of node rows. A non-leaf row at level `L`
//! holds `num_states` child indices one level down; a leaf row (level 1)
//! holds `num_states` output states. The final row is the root at level
//! `num_neighbors + 1`.

use crate::error::{Result, RuleError};
use crate::tokens::RuleTokenizer;

#[derive(Debug, Clone)]
struct TreeNode {
    level: u32,
    entries: Vec<u32>,
}

/// Decision tree decoded from a `@TREE` body.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    pub n_states: u16,
    pub n_neighbors: u32,
    nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Walks the tree for `cells`: `n_neighbors` neighbour states in
    /// declaration order followed by the centre state.
    #[must_use]
    pub fn lookup(&self, cells: &[u16]) -> Option<u16> {
        if cells.len() != self.n_neighbors as usize + 1 {
            return None;
        }
        let mut node = self.nodes.last()?;
        for (i, &state) in cells.iter().enumerate() {
            if state >= self.n_states {
                return None;
            }
            let entry = *node.entries.get(state as usize)?;
            if i == cells.len() - 1 {
                return Some(entry as u16);
            }
            node = self.nodes.get(entry as usize)?;
        }
        None
    }
}

/// Decodes a `@TREE` body from the tokenizer.
pub fn decode_tree(tokens: &mut dyn RuleTokenizer) -> Result<DecisionTree> {
    let mut n_states: Option<u16> = None;
    let mut n_neighbors: Option<u32> = None;
    let mut declared_nodes: Option<usize> = None;
    let mut nodes: Vec<TreeNode> = Vec::new();

    while let Some(line) = tokens.next_line() {
        match line[0].as_str() {
            "num_states" => {
                let n: u32 = parse_num(&line)?;
                if !(2..=256).contains(&n) {
                    return Err(RuleError::StatesOutOfRange(n));
                }
                n_states = Some(n as u16);
            }
            "num_neighbors" => {
                let n: u32 = parse_num(&line)?;
                if n != 4 && n != 8 {
                    return Err(RuleError::tree(format!("num_neighbors {n} not 4 or 8")));
                }
                n_neighbors = Some(n);
            }
            "num_nodes" => {
                declared_nodes = Some(parse_num(&line)? as usize);
            }
            _ => {
                let states = n_states.ok_or_else(|| RuleError::tree("node before num_states"))?;
                let neighbors =
                    n_neighbors.ok_or_else(|| RuleError::tree("node before num_neighbors"))?;
                let node = parse_node(&line, states, neighbors, &nodes)?;
                nodes.push(node);
            }
        }
    }

    let n_states = n_states.ok_or_else(|| RuleError::tree("missing num_states"))?;
    let n_neighbors = n_neighbors.ok_or_else(|| RuleError::tree("missing num_neighbors"))?;
    let declared = declared_nodes.ok_or_else(|| RuleError::tree("missing num_nodes"))?;

    if nodes.len() != declared {
        return Err(RuleError::tree(format!(
            "declared {declared} nodes, found {}",
            nodes.len()
        )));
    }
    match nodes.last() {
        Some(root) if root.level == n_neighbors + 1 => {}
        Some(root) => {
            return Err(RuleError::tree(format!(
                "final node at level {}, expected root level {}",
                root.level,
                n_neighbors + 1
            )))
        }
        None => return Err(RuleError::tree("no nodes")),
    }

    tracing::debug!(nodes = nodes.len(), states = n_states, "decoded rule tree");

    Ok(DecisionTree {
        n_states,
        n_neighbors,
        nodes,
    })
}

fn parse_num(line: &[String]) -> Result<u32> {
    line.get(1)
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| RuleError::tree(format!("expected number in {line:?}")))
}

fn parse_node(
    line: &[String],
    n_states: u16,
    n_neighbors: u32,
    nodes: &[TreeNode],
) -> Result<TreeNode> {
    if line.len() != n_states as usize + 1 {
        return Err(RuleError::tree(format!(
            "node row needs level plus {n_states} entries, got {}",
            line.len()
        )));
    }
    let level: u32 = line[0]
        .parse()
        .map_err(|_| RuleError::tree(format!("bad level {}", line[0])))?;
    if level < 1 || level > n_neighbors + 1 {
        return Err(RuleError::tree(format!("level {level} out of range")));
    }

    let mut entries = Vec::with_capacity(n_states as usize);
    for token in &line[1..] {
        let value: u32 = token
            .parse()
            .map_err(|_| RuleError::tree(format!("bad entry {token}")))?;
        if level == 1 {
            if value >= u32::from(n_states) {
                return Err(RuleError::tree(format!("leaf output {value} out of range")));
            }
        } else {
            // Every pointer must reference a node exactly one level below.
            match nodes.get(value as usize) {
                Some(child) if child.level == level - 1 => {}
                Some(child) => {
                    return Err(RuleError::tree(format!(
                        "node at level {level} points to level {}",
                        child.level
                    )))
                }
                None => {
                    return Err(RuleError::tree(format!(
                        "forward reference to node {value}"
                    )))
                }
            }
        }
        entries.push(value);
    }
    Ok(TreeNode { level, entries })
}
