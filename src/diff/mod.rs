pub mod semantic;
pub mod unified;

pub use semantic::{DocumentDiff, DocumentStatus, FieldChange};

use crate::error::Error;

/// Which diff algorithm to run, selected by `--semantic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffStrategy {
    Unified,
    Semantic,
}

/// The outcome of either strategy. Empty means "no differences" under both
/// forms, and the two forms always agree on that boolean.
#[derive(Debug)]
pub enum DiffResult {
    Unified(String),
    Semantic(Vec<DocumentDiff>),
}

impl DiffResult {
    pub fn has_differences(&self) -> bool {
        match self {
            DiffResult::Unified(text) => !text.is_empty(),
            DiffResult::Semantic(docs) => !docs.is_empty(),
        }
    }
}

/// Run the selected strategy over the two rendered streams. An absent side
/// arrives here as an empty string and reports as purely additive or purely
/// subtractive.
pub fn compute(
    strategy: DiffStrategy,
    target_text: &str,
    local_text: &str,
    target_label: &str,
    local_label: &str,
) -> Result<DiffResult, Error> {
    match strategy {
        DiffStrategy::Unified => Ok(DiffResult::Unified(unified::compute(
            target_text,
            local_text,
            target_label,
            local_label,
        ))),
        DiffStrategy::Semantic => Ok(DiffResult::Semantic(semantic::compute(
            target_text,
            local_text,
        )?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: &str = "replicas: 2\n";
    const B: &str = "replicas: 3\n";

    #[test]
    fn strategies_agree_on_equal_inputs() {
        for strategy in [DiffStrategy::Unified, DiffStrategy::Semantic] {
            let result = compute(strategy, A, A, "target", "local").unwrap();
            assert!(!result.has_differences());
        }
    }

    #[test]
    fn strategies_agree_on_unequal_inputs() {
        for strategy in [DiffStrategy::Unified, DiffStrategy::Semantic] {
            let result = compute(strategy, A, B, "target", "local").unwrap();
            assert!(result.has_differences());
        }
    }
}
