//! # logquery
//!
//! Builds segmented SELECT statements over analytics log tables.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        SelectRequest + SegmentExpression (caller)        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [builder]
//! ┌─────────────────────────────────────────────────────────┐
//! │   WHERE + binds merged, table list expanded by segment   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [planner::join_resolver + log_table]
//! ┌─────────────────────────────────────────────────────────┐
//! │     FROM clause: anchor table, LEFT JOINs, link tables   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [planner::subquery] (fan-out only)
//! ┌─────────────────────────────────────────────────────────┐
//! │           SQL string + ordered bound values              │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here executes SQL. Results are strings with `?` placeholders and
//! the values to bind to them, in order.

pub mod bind;
pub mod builder;
pub mod config;
pub mod error;
pub mod log_table;
pub mod planner;
pub mod segment;
pub mod sql;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::bind::BindValue;
    pub use crate::builder::{BuiltQuery, LogQueryBuilder, SelectRequest};
    pub use crate::error::{QueryError, QueryResult};
    pub use crate::log_table::{LogTable, LogTableRegistry, RegistryOptions};
    pub use crate::planner::{ManualJoin, TableSpec};
    pub use crate::segment::{CompiledSegment, NoSegment, SegmentExpression, SegmentSql};
    pub use crate::sql::{NoPrefix, StaticPrefix, TablePrefix};
}

// Also export at crate root for convenience
pub use bind::BindValue;
pub use builder::{BuiltQuery, LogQueryBuilder, SelectRequest};
pub use error::{QueryError, QueryResult};
pub use planner::{ManualJoin, TableSpec};
