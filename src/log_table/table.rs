//! Log table descriptors: a table's name and the keys it can be joined on.

/// When joining another table against this one forces the wrapped-subquery strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubselectRule {
    /// Joining against this table never requires wrapping.
    Never,
    /// Any table joined on visit against this one requires wrapping.
    Always,
    /// Only joining the named table against this one requires wrapping.
    With(&'static str),
}

/// Static join capabilities of one log table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTable {
    name: &'static str,
    joins_on_visit: bool,
    visit_column: &'static str,
    action_column: Option<&'static str>,
    link_table: Option<&'static str>,
    subselect: SubselectRule,
}

impl LogTable {
    pub const VISIT: &'static str = "log_visit";
    pub const LINK_VISIT_ACTION: &'static str = "log_link_visit_action";
    pub const ACTION: &'static str = "log_action";
    pub const CONVERSION: &'static str = "log_conversion";
    pub const CONVERSION_ITEM: &'static str = "log_conversion_item";

    const DEFAULT_VISIT_COLUMN: &'static str = "idvisit";

    fn new(name: &'static str) -> Self {
        Self {
            name,
            joins_on_visit: false,
            visit_column: Self::DEFAULT_VISIT_COLUMN,
            action_column: None,
            link_table: None,
            subselect: SubselectRule::Never,
        }
    }

    /// One row per visit. Everything joined on visit against it gets wrapped.
    pub fn visit() -> Self {
        Self {
            joins_on_visit: true,
            subselect: SubselectRule::Always,
            ..Self::new(Self::VISIT)
        }
    }

    /// The bridge between visits and actions.
    pub fn link_visit_action() -> Self {
        Self {
            joins_on_visit: true,
            action_column: Some("idaction_url"),
            ..Self::new(Self::LINK_VISIT_ACTION)
        }
    }

    /// Action dictionary. Reaches visits only through `log_link_visit_action`.
    pub fn action() -> Self {
        Self {
            action_column: Some("idaction"),
            link_table: Some(Self::LINK_VISIT_ACTION),
            ..Self::new(Self::ACTION)
        }
    }

    pub fn conversion() -> Self {
        Self {
            joins_on_visit: true,
            subselect: SubselectRule::With(Self::VISIT),
            ..Self::new(Self::CONVERSION)
        }
    }

    pub fn conversion_item(joins_on_visit: bool) -> Self {
        Self {
            joins_on_visit,
            ..Self::new(Self::CONVERSION_ITEM)
        }
    }

    /// Same table without an action key.
    #[cfg(test)]
    pub(crate) fn without_action_key(self) -> Self {
        Self {
            action_column: None,
            ..self
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn can_join_on_visit(&self) -> bool {
        self.joins_on_visit
    }

    pub fn can_join_on_action(&self) -> bool {
        self.action_column.is_some()
    }

    pub fn visit_column(&self) -> &'static str {
        self.visit_column
    }

    /// Column holding the action id, empty when the table has none.
    pub fn action_column(&self) -> &'static str {
        self.action_column.unwrap_or("")
    }

    /// Name of the table to go through when this one can't join on visit.
    pub fn link_table(&self) -> Option<&'static str> {
        self.link_table
    }

    pub fn subselect_rule(&self) -> SubselectRule {
        self.subselect
    }

    /// Whether joining `other` against this table requires wrapping the query.
    pub fn requires_subselect_with(&self, other: &str) -> bool {
        match self.subselect {
            SubselectRule::Never => false,
            SubselectRule::Always => true,
            SubselectRule::With(table) => table == other,
        }
    }
}
