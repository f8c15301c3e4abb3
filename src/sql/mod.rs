//! SQL rendering.
//!
//! - [`query`] - SELECT assembler and LIMIT/OFFSET coercion
//! - [`prefix`] - physical table naming

pub mod prefix;
pub mod query;


pub use prefix::{NoPrefix, StaticPrefix, TablePrefix};
pub use query::{coerce_int, LimitOffset, SelectQuery};
