//! Items of a requested table list.

/// A caller-supplied join that bypasses automatic predicate derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualJoin {
    pub table: String,
    pub alias: Option<String>,
    pub join_on: String,
}

impl ManualJoin {
    pub fn new(table: &str, join_on: &str) -> Self {
        Self {
            table: table.to_string(),
            alias: None,
            join_on: join_on.to_string(),
        }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    /// The name the joined table is known by in the rest of the query.
    pub fn alias_or_table(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }

    /// Whether this joins `table` under its own name (no alias, or an alias equal to the name).
    pub fn joins_table(&self, table: &str) -> bool {
        self.table == table && self.alias_or_table() == table
    }
}

/// One entry of a requested table list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableSpec {
    /// A log table resolved against the registry.
    Name(String),
    /// A join the caller spelled out.
    Manual(ManualJoin),
}

impl TableSpec {
    pub fn table(&self) -> &str {
        match self {
            TableSpec::Name(name) => name,
            TableSpec::Manual(join) => &join.table,
        }
    }

    pub fn is_manual(&self) -> bool {
        matches!(self, TableSpec::Manual(_))
    }

    pub fn is_name(&self, table: &str) -> bool {
        matches!(self, TableSpec::Name(name) if name == table)
    }
}

impl From<&str> for TableSpec {
    fn from(name: &str) -> Self {
        TableSpec::Name(name.to_string())
    }
}

impl From<String> for TableSpec {
    fn from(name: String) -> Self {
        TableSpec::Name(name)
    }
}

impl From<ManualJoin> for TableSpec {
    fn from(join: ManualJoin) -> Self {
        TableSpec::Manual(join)
    }
}
