//! Join planning for log queries.
//!
//! Two steps, both pure:
//! 1. Join resolution: requested tables → join order, ON predicates and a wrapping flag
//! 2. Subquery rewriting: a flat query → `SELECT … FROM (inner) AS log_inner`

pub mod field_scanner;
pub mod join_resolver;
pub mod subquery;
pub mod table_spec;

pub use field_scanner::{FieldScanner, RegexFieldScanner};
pub use join_resolver::{JoinPlan, JoinResolver};
pub use subquery::{SubqueryRewriter, INNER_ALIAS};
pub use table_spec::{ManualJoin, TableSpec};
