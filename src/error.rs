//! Errors raised while building a log query.
//!
//! Every variant is a request-construction fault: the requested table or
//! field set cannot be turned into SQL. None of them are transient.

use thiserror::Error;

/// Errors that can occur while resolving joins or assembling SQL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// A table is unknown, or shares no join key with any table joined before it.
    #[error("Table '{table}' can't be joined for segmentation: {reason}")]
    UnjoinableTable { table: String, reason: String },

    /// A table's declared link table cannot itself be joined on an action.
    #[error("The link table '{link}' to join '{table}' on visit is not joinable by an action")]
    UnjoinableLinkTable { link: String, table: String },

    /// Wrapping was required but the select list has no table-qualified field.
    #[error("No needed fields found in select expression. Please use a table prefix.")]
    NoQualifiedFields,

    /// Wrapping was required but there is nothing to group the inner query by.
    #[error("Cannot use subselect for join as no group by rule is specified")]
    NoGroupingKey,

    /// A non-empty segment produced no WHERE fragment and the caller supplied none.
    #[error("Segment where clause should be non empty")]
    EmptyFilterClause,
}

impl QueryError {
    pub(crate) fn unjoinable(table: &str, reason: impl Into<String>) -> Self {
        QueryError::UnjoinableTable {
            table: table.to_string(),
            reason: reason.into(),
        }
    }
}

pub type QueryResult<T> = Result<T, QueryError>;
