//! Physical table naming.
//!
//! Log tables are addressed by their logical name everywhere in the planner
//! (aliases, predicates, select fields). Only the table reference after
//! `FROM` / `JOIN` goes through a [`TablePrefix`], so installations that share
//! a schema can keep their tables apart.

/// Maps a logical table name to the identifier used in FROM and JOIN.
pub trait TablePrefix: Send + Sync {
    fn prefix(&self, table: &str) -> String;
}

/// Use table names unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoPrefix;

impl TablePrefix for NoPrefix {
    fn prefix(&self, table: &str) -> String {
        table.to_string()
    }
}

/// Prepend a fixed string, e.g. `matomo_` turns `log_visit` into `matomo_log_visit`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticPrefix(pub String);

impl StaticPrefix {
    pub fn new(prefix: &str) -> Self {
        Self(prefix.to_string())
    }
}

impl TablePrefix for StaticPrefix {
    fn prefix(&self, table: &str) -> String {
        format!("{}{}", self.0, table)
    }
}
