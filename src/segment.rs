//! Interface to the segmentation subsystem.
//!
//! A segment is a user-facing visitor filter. Parsing it is not this crate's
//! job: the builder only needs to know which tables the filter touches and
//! the WHERE fragment plus bound values it compiles to.

use crate::bind::BindValue;
use crate::planner::TableSpec;

/// Compiled form of a segment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentSql {
    pub where_clause: String,
    pub bind: Vec<BindValue>,
}

/// What the query builder needs from a segment expression.
pub trait SegmentExpression {
    /// Whether there is no segment to apply.
    fn is_empty(&self) -> bool;

    /// Append the tables the segment's predicates reference.
    fn expand_tables(&self, tables: &mut Vec<TableSpec>);

    /// The WHERE fragment and its bound values, in placeholder order.
    fn to_sql(&self) -> SegmentSql;
}

/// No segment: every request sees all visits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSegment;

impl SegmentExpression for NoSegment {
    fn is_empty(&self) -> bool {
        true
    }

    fn expand_tables(&self, _tables: &mut Vec<TableSpec>) {}

    fn to_sql(&self) -> SegmentSql {
        SegmentSql::default()
    }
}

/// A segment that has already been compiled elsewhere.
///
/// # Example
///
/// ```
/// use logquery::segment::{CompiledSegment, SegmentExpression};
///
/// let segment = CompiledSegment::new("actionUrl=@shop", "log_action.name LIKE ?")
///     .bind("%shop%")
///     .requires_table("log_action");
/// assert!(!segment.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledSegment {
    definition: String,
    where_clause: String,
    bind: Vec<BindValue>,
    tables: Vec<String>,
}

impl CompiledSegment {
    pub fn new(definition: &str, where_clause: &str) -> Self {
        Self {
            definition: definition.to_string(),
            where_clause: where_clause.to_string(),
            ..Default::default()
        }
    }

    pub fn bind(mut self, value: impl Into<BindValue>) -> Self {
        self.bind.push(value.into());
        self
    }

    pub fn requires_table(mut self, table: &str) -> Self {
        self.tables.push(table.to_string());
        self
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }
}

impl SegmentExpression for CompiledSegment {
    fn is_empty(&self) -> bool {
        self.definition.trim().is_empty()
    }

    fn expand_tables(&self, tables: &mut Vec<TableSpec>) {
        for table in &self.tables {
            if !tables.iter().any(|spec| spec.is_name(table)) {
                tables.push(TableSpec::Name(table.clone()));
            }
        }
    }

    fn to_sql(&self) -> SegmentSql {
        SegmentSql {
            where_clause: self.where_clause.clone(),
            bind: self.bind.clone(),
        }
    }
}
