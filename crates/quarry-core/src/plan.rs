//! DDL plans
//!
//! Objects that cannot be altered in place are replaced through a plan of
//! separate statements. Steps are not atomic: between the step that drops
//! the original and the step that creates the replacement the object does
//! not exist, and a failure there leaves it missing.

use serde::{Deserialize, Serialize};

/// One statement of a [`DdlPlan`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    pub sql: String,
    /// Whether the statement may be split on semicolons before running.
    /// Routine and trigger bodies contain semicolons and must not be split.
    pub split: bool,
    /// Short label used in logs and errors
    pub purpose: String,
}

/// Ordered DDL steps, executed one at a time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DdlPlan {
    pub steps: Vec<PlanStep>,
}

impl DdlPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-statement plan
    pub fn single(sql: impl Into<String>, split: bool, purpose: impl Into<String>) -> Self {
        Self::new().step(sql, split, purpose)
    }

    /// Append a step
    pub fn step(mut self, sql: impl Into<String>, split: bool, purpose: impl Into<String>) -> Self {
        self.steps.push(PlanStep {
            sql: sql.into(),
            split,
            purpose: purpose.into(),
        });
        self
    }

    /// Append every step of `other`
    pub fn extend(mut self, other: DdlPlan) -> Self {
        self.steps.extend(other.steps);
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn statements(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.sql.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_keep_order() {
        let plan = DdlPlan::single("CREATE VIEW a AS SELECT 1", true, "create")
            .step("DROP VIEW a", true, "drop");

        assert_eq!(plan.len(), 2);
        assert_eq!(
            plan.statements().collect::<Vec<_>>(),
            vec!["CREATE VIEW a AS SELECT 1", "DROP VIEW a"]
        );
        assert_eq!(plan.steps[1].purpose, "drop");
    }
}
