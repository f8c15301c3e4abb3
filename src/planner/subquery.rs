//! Wrapping a query into a derived table so GROUP BY survives one-to-many joins.
//!
//! The inner query selects the table-qualified fields, applies the WHERE
//! clause and collapses the join fan-out by grouping on a key. The outer query
//! then aggregates over `log_inner`.

use log::debug;

use crate::error::{QueryError, QueryResult};
use crate::log_table::LogTable;
use crate::planner::field_scanner::FieldScanner;
use crate::sql::query::{indent, SelectQuery};

/// Alias of the derived table the outer query selects from.
pub const INNER_ALIAS: &str = "log_inner";

pub struct SubqueryRewriter<'a> {
    scanner: &'a dyn FieldScanner,
}

impl<'a> SubqueryRewriter<'a> {
    pub fn new(scanner: &'a dyn FieldScanner) -> Self {
        Self { scanner }
    }

    /// Rewrite `query` into `SELECT … FROM (inner) AS log_inner`.
    ///
    /// `inner_group_by` overrides the grouping key of the inner query. Without
    /// it the inner query groups by visit, which requires `log_visit` in FROM.
    ///
    /// With a LIMIT the inner query is not grouped at all: grouping before
    /// limiting is too slow on large sites, so the limit is applied to the raw
    /// joined rows, ordered like the outer query.
    pub fn wrap(&self, query: &SelectQuery, inner_group_by: Option<&str>) -> QueryResult<SelectQuery> {
        let fields = self.scanner.qualified_fields(&query.select);
        if fields.is_empty() {
            return Err(QueryError::NoQualifiedFields);
        }

        let group_by = match inner_group_by {
            Some(group_by) => group_by.to_string(),
            None if self.scanner.mentions_table(&query.from, LogTable::VISIT) => {
                format!("{}.idvisit", LogTable::VISIT)
            }
            None => return Err(QueryError::NoGroupingKey),
        };

        let limited = query.limit.is_some();
        let order_by = match &query.order_by {
            Some(order_by) if limited => order_by.clone(),
            _ => "NULL".to_string(),
        };

        let inner = SelectQuery {
            select: fields.join(",\n"),
            from: query.from.clone(),
            where_clause: query.where_clause.clone(),
            group_by: (!limited).then_some(group_by),
            order_by: Some(order_by),
            limit: query.limit,
        };
        debug!("wrapping query, inner query selects {} fields", fields.len());

        let requalify = |fragment: &Option<String>| {
            fragment
                .as_deref()
                .map(|text| self.scanner.requalify(text, INNER_ALIAS))
        };

        Ok(SelectQuery {
            select: self.scanner.requalify(&query.select, INNER_ALIAS),
            from: format!("(\n{}\n) AS {}", indent(&inner.to_sql(), 2), INNER_ALIAS),
            where_clause: None,
            group_by: requalify(&query.group_by),
            order_by: requalify(&query.order_by),
            limit: None,
        })
    }
}
