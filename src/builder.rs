//! The query builder: one call from requested tables and clause fragments to SQL.
//!
//! ```text
//! SelectRequest + SegmentExpression
//!          │
//!          ▼ [segment]   tables expanded, WHERE and binds merged
//!          ▼ [resolver]  FROM clause with LEFT JOINs, wrapping flag
//!          ▼ [rewriter]  only when the joins fan out rows
//!     BuiltQuery { sql, bind }
//! ```
//!
//! # Example
//!
//! ```
//! use logquery::builder::{LogQueryBuilder, SelectRequest};
//! use logquery::segment::CompiledSegment;
//!
//! let segment = CompiledSegment::new("visitCount>1", "log_visit.visitor_count_visits > ?")
//!     .bind(1)
//!     .requires_table("log_visit");
//! let request = SelectRequest::new("log_link_visit_action.idaction_url", ["log_link_visit_action"])
//!     .filter("log_link_visit_action.idsite = ?", vec![1.into()]);
//!
//! let query = LogQueryBuilder::new().build_select(&segment, request)?;
//! assert!(query.sql.contains("LEFT JOIN log_visit AS log_visit"));
//! assert_eq!(query.bind.len(), 2);
//! # Ok::<(), logquery::error::QueryError>(())
//! ```

use log::trace;
use serde::Serialize;

use crate::bind::BindValue;
use crate::config::{Settings, SettingsError};
use crate::error::{QueryError, QueryResult};
use crate::log_table::{LogTable, LogTableRegistry};
use crate::planner::{FieldScanner, JoinResolver, RegexFieldScanner, SubqueryRewriter, TableSpec};
use crate::segment::{SegmentExpression, SegmentSql};
use crate::sql::{LimitOffset, NoPrefix, SelectQuery, TablePrefix};

/// Inner grouping key for conversions joined through the action link table,
/// so rows of different goals of one visit are not collapsed together.
const CONVERSION_GOAL_GROUP_BY: &str =
    "CONCAT(log_conversion.idvisit, '_', log_conversion.idgoal, '_', log_conversion.buster)";

/// Everything a caller supplies for one SELECT.
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct SelectRequest {
    pub select: String,
    pub from: Vec<TableSpec>,
    pub where_clause: String,
    pub bind: Vec<BindValue>,
    pub group_by: String,
    pub order_by: String,
    /// Raw pagination input such as `"5"` or `"10, 5"`.
    pub limit: String,
}

impl SelectRequest {
    pub fn new<T>(select: &str, from: impl IntoIterator<Item = T>) -> Self
    where
        T: Into<TableSpec>,
    {
        Self {
            select: select.to_string(),
            from: from.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Select from one table.
    pub fn single(select: &str, table: impl Into<TableSpec>) -> Self {
        Self::new(select, [table])
    }

    pub fn join(mut self, table: impl Into<TableSpec>) -> Self {
        self.from.push(table.into());
        self
    }

    /// Set the WHERE clause and the values bound to its placeholders.
    pub fn filter(mut self, where_clause: &str, bind: Vec<BindValue>) -> Self {
        self.where_clause = where_clause.to_string();
        self.bind = bind;
        self
    }

    pub fn group_by(mut self, group_by: &str) -> Self {
        self.group_by = group_by.to_string();
        self
    }

    pub fn order_by(mut self, order_by: &str) -> Self {
        self.order_by = order_by.to_string();
        self
    }

    pub fn limit(mut self, limit: &str) -> Self {
        self.limit = limit.to_string();
        self
    }
}

/// Generated SQL and the values to bind to its placeholders, in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuiltQuery {
    pub sql: String,
    pub bind: Vec<BindValue>,
}

/// Builds segmented SELECT statements over the log tables.
///
/// Holds only read-only collaborators, so one builder can serve concurrent calls.
pub struct LogQueryBuilder {
    registry: LogTableRegistry,
    prefix: Box<dyn TablePrefix>,
    scanner: Box<dyn FieldScanner>,
}

impl LogQueryBuilder {
    pub fn new() -> Self {
        Self::with_registry(LogTableRegistry::global().clone())
    }

    pub fn with_registry(registry: LogTableRegistry) -> Self {
        let scanner = RegexFieldScanner::new(&registry);
        Self {
            registry,
            prefix: Box::new(NoPrefix),
            scanner: Box::new(scanner),
        }
    }

    /// Build from loaded settings (table prefix and registry options).
    pub fn from_settings(settings: &Settings) -> Result<Self, SettingsError> {
        let prefix = settings.prefix()?;
        Ok(Self::with_registry(settings.registry()).with_prefix(prefix))
    }

    pub fn with_prefix(mut self, prefix: impl TablePrefix + 'static) -> Self {
        self.prefix = Box::new(prefix);
        self
    }

    pub fn with_field_scanner(mut self, scanner: impl FieldScanner + 'static) -> Self {
        self.scanner = Box::new(scanner);
        self
    }

    pub fn registry(&self) -> &LogTableRegistry {
        &self.registry
    }

    /// Build the SELECT statement for `request`, filtered by `segment`.
    ///
    /// The SQL is returned unexecuted together with the bound values: the
    /// caller's values first, then the segment's.
    pub fn build_select(
        &self,
        segment: &dyn SegmentExpression,
        request: SelectRequest,
    ) -> QueryResult<BuiltQuery> {
        let SelectRequest {
            select,
            from,
            mut where_clause,
            mut bind,
            group_by,
            order_by,
            limit,
        } = request;

        let requested = from.clone();
        let mut tables = from;

        let segmented = !segment.is_empty();
        if segmented {
            segment.expand_tables(&mut tables);
            let SegmentSql {
                where_clause: segment_where,
                bind: segment_bind,
            } = segment.to_sql();
            where_clause = match_both(&where_clause, &segment_where)?;
            bind.extend(segment_bind);
        }

        let plan = JoinResolver::new(&self.registry, self.prefix.as_ref()).resolve(tables)?;

        let query = SelectQuery::new(&select, &plan.from_sql)
            .filter(&where_clause)
            .group_by(&group_by)
            .order_by(&order_by)
            .limit(LimitOffset::parse(&limit));

        let rewriter = SubqueryRewriter::new(self.scanner.as_ref());
        let sql = if segmented && groups_conversions_by_goal(&requested, &group_by, &plan.from_sql) {
            rewriter.wrap(&query, Some(CONVERSION_GOAL_GROUP_BY))?.to_sql()
        } else if plan.requires_wrapping {
            rewriter.wrap(&query, None)?.to_sql()
        } else {
            query.to_sql()
        };

        trace!("built log query:\n{}", sql);
        Ok(BuiltQuery { sql, bind })
    }
}

impl Default for LogQueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Combine the caller's WHERE with the segment's; both must not be empty.
fn match_both(where_clause: &str, segment_where: &str) -> QueryResult<String> {
    let where_clause = where_clause.trim();
    let segment_where = segment_where.trim();

    match (where_clause.is_empty(), segment_where.is_empty()) {
        (true, true) => Err(QueryError::EmptyFilterClause),
        (false, true) => Ok(where_clause.to_string()),
        (true, false) => Ok(segment_where.to_string()),
        (false, false) => Ok(format!("({}) AND ({})", where_clause, segment_where)),
    }
}

/// Conversions requested on their own, grouped by goal, that ended up joined
/// to the action link table.
fn groups_conversions_by_goal(requested: &[TableSpec], group_by: &str, from_sql: &str) -> bool {
    matches!(requested, [only] if only.is_name(LogTable::CONVERSION))
        && group_by.contains("log_conversion.idgoal")
        && from_sql.contains(LogTable::LINK_VISIT_ACTION)
}
