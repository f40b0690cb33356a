//! Table-level options

use serde::{Deserialize, Serialize};

/// Table-level options. On a [`crate::TableDiff`] only the options being
/// changed are set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableOptions {
    pub comment: Option<String>,
    /// Storage engine (InnoDB, MyISAM, etc.)
    pub engine: Option<String>,
    pub collation: Option<String>,
    /// AUTO_INCREMENT seed
    pub auto_increment: Option<u64>,
}

impl TableOptions {
    /// Check if any option is set
    pub fn has_options(&self) -> bool {
        self.comment.is_some()
            || self.engine.is_some()
            || self.collation.is_some()
            || self.auto_increment.is_some()
    }

    /// InnoDB with a utf8mb4 collation
    pub fn mysql() -> Self {
        Self {
            engine: Some("InnoDB".to_string()),
            collation: Some("utf8mb4_unicode_ci".to_string()),
            ..Default::default()
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    pub fn with_collation(mut self, collation: impl Into<String>) -> Self {
        self.collation = Some(collation.into());
        self
    }

    pub fn with_auto_increment(mut self, seed: u64) -> Self {
        self.auto_increment = Some(seed);
        self
    }
}
