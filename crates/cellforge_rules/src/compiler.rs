//! Rule text compiler.
//!
//! Runs the shared pipeline in front of the grammar strategies: trim, alias
//! expansion, the `:<grid>` suffix, the `History`/`Super` overlay suffix and
//! the `|` alternating-rule split. The output [`RuleSpec`] is immutable;
//! recompiling its canonical name reproduces an identical spec.

use crate::aliases;
use crate::bounded::{canonical_grid, parse_grid};
use crate::error::{Result, RuleError};
use crate::parsers::{
    BlockStrategy, LifelikeStrategy, LtlHrotStrategy, MapStrategy, ParserStrategy,
    WolframStrategy,
};
use crate::spec::{Overlay, RuleSpec};

pub struct RuleCompiler {
    strategies: Vec<Box<dyn ParserStrategy>>,
}

impl Default for RuleCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleCompiler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            strategies: vec![
                Box::new(MapStrategy),
                Box::new(BlockStrategy),
                Box::new(LtlHrotStrategy),
                Box::new(WolframStrategy),
                Box::new(LifelikeStrategy),
            ],
        }
    }

    /// Compiles rule text into an executable spec.
    pub fn compile(&self, text: &str) -> Result<RuleSpec> {
        let text = aliases::expand(text.trim());

        let (text, grid) = match text.rsplit_once(':') {
            Some((head, tail)) => (head, Some(parse_grid(tail)?)),
            None => (text, None),
        };
        // A grid suffix may have been attached to an alias name.
        let text = aliases::expand(text);
        let (text, overlay) = strip_overlay(text);

        let mut spec = match text.split_once('|') {
            Some((first, second)) => {
                if second.contains('|') {
                    return Err(RuleError::AlternateMismatch(
                        "more than two alternating rules".into(),
                    ));
                }
                let even = self.dispatch(first.trim())?;
                let odd = self.dispatch(second.trim())?;
                pair_alternates(even, odd)?
            }
            None => self.dispatch(text)?,
        };

        if let Some(overlay) = overlay {
            spec.overlay = Some(overlay);
            spec.canonical_name.push_str(overlay.suffix());
        }
        if let Some(grid) = grid {
            check_grid_fits(&grid, spec.range)?;
            spec.canonical_name = format!("{}:{}", spec.canonical_name, canonical_grid(&grid));
            spec.bounded_grid = Some(grid);
            // Both halves of an alternating rule step inside the same bounds.
            if let Some(alternate) = &mut spec.alternate {
                alternate.bounded_grid = Some(grid);
            }
        }

        tracing::debug!(rule = %spec.canonical_name, family = ?spec.family, "compiled rule");
        Ok(spec)
    }

    fn dispatch(&self, text: &str) -> Result<RuleSpec> {
        for strategy in &self.strategies {
            if strategy.matches(text) {
                tracing::trace!(strategy = strategy.name(), rule = text, "grammar matched");
                return strategy.parse(text);
            }
        }
        Err(RuleError::UnknownToken(text.to_string()))
    }
}

fn strip_overlay(text: &str) -> (&str, Option<Overlay>) {
    let lower = text.to_ascii_lowercase();
    if lower.ends_with("history") {
        (&text[..text.len() - "history".len()], Some(Overlay::History))
    } else if lower.ends_with("super") {
        (&text[..text.len() - "super".len()], Some(Overlay::Super))
    } else {
        (text, None)
    }
}

/// Joins the two halves of an alternating rule after compatibility checks.
fn pair_alternates(even: RuleSpec, odd: RuleSpec) -> Result<RuleSpec> {
    let mismatch = |what: &str| {
        Err(RuleError::AlternateMismatch(format!(
            "{what} differs between alternating rules"
        )))
    };
    if even.family != odd.family {
        return mismatch("family");
    }
    if even.neighbourhood != odd.neighbourhood {
        return mismatch("neighbourhood");
    }
    if even.range != odd.range {
        return mismatch("range");
    }
    if even.state_count != odd.state_count {
        return mismatch("state count");
    }
    if even.has_birth_on_zero() || odd.has_birth_on_zero() {
        return Err(RuleError::AlternateMismatch(
            "birth on zero neighbours is not allowed in alternating rules".into(),
        ));
    }
    let mut spec = even;
    spec.canonical_name = format!("{}|{}", spec.canonical_name, odd.canonical_name);
    spec.alternate = Some(Box::new(odd));
    Ok(spec)
}

/// Every finite grid dimension must hold the full neighbourhood ring.
fn check_grid_fits(grid: &crate::spec::BoundedGrid, range: u32) -> Result<()> {
    let needed = 2 * range + 1;
    for dimension in [grid.width, grid.height] {
        if dimension != 0 && dimension < needed {
            return Err(RuleError::GridTooSmall { dimension, range });
        }
    }
    Ok(())
}
