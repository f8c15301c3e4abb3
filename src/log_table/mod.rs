//! Registry of the log tables that can take part in a segmented query.
//!
//! The set is fixed and small. A registry is built once and only read
//! afterwards, so one instance can serve any number of concurrent builds.

mod table;

pub use table::{LogTable, SubselectRule};

use once_cell::sync::Lazy;

static DEFAULT_REGISTRY: Lazy<LogTableRegistry> = Lazy::new(LogTableRegistry::default);

/// Knobs for the few capabilities that vary between installations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryOptions {
    /// Whether `log_conversion_item` may be joined directly on `idvisit`.
    pub conversion_item_joins_on_visit: bool,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            conversion_item_joins_on_visit: true,
        }
    }
}

/// Ordered catalog of known log tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTableRegistry {
    tables: Vec<LogTable>,
}

impl LogTableRegistry {
    pub fn new(options: RegistryOptions) -> Self {
        Self {
            tables: vec![
                LogTable::visit(),
                LogTable::link_visit_action(),
                LogTable::action(),
                LogTable::conversion(),
                LogTable::conversion_item(options.conversion_item_joins_on_visit),
            ],
        }
    }

    #[cfg(test)]
    pub(crate) fn from_tables(tables: Vec<LogTable>) -> Self {
        Self { tables }
    }

    /// Shared registry built with default options.
    pub fn global() -> &'static LogTableRegistry {
        &DEFAULT_REGISTRY
    }

    pub fn find(&self, name: &str) -> Option<&LogTable> {
        self.tables.iter().find(|table| table.name() == name)
    }

    pub fn tables(&self) -> &[LogTable] {
        &self.tables
    }

    /// Table names in registry order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tables.iter().map(LogTable::name)
    }
}

impl Default for LogTableRegistry {
    fn default() -> Self {
        Self::new(RegistryOptions::default())
    }
}
