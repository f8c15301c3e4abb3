//! Join path resolution over the log table registry.
//!
//! Given the requested tables, decide the join order and the ON predicate of
//! every join. Tables that can't reach a visit directly pull in their link
//! table, and joining against a table with a subselect rule flags the plan so
//! the builder wraps the query.

use log::debug;

use crate::error::{QueryError, QueryResult};
use crate::log_table::{LogTable, LogTableRegistry};
use crate::planner::table_spec::{ManualJoin, TableSpec};
use crate::sql::prefix::TablePrefix;

/// Join order priority for bare table names. Unknown names sort last.
fn join_priority(table: &str) -> u32 {
    match table {
        LogTable::LINK_VISIT_ACTION => 0,
        LogTable::ACTION => 1,
        LogTable::VISIT => 2,
        LogTable::CONVERSION => 3,
        LogTable::CONVERSION_ITEM => 4,
        _ => 999,
    }
}

/// Result of resolving a table list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinPlan {
    /// The requested tables in join order, including injected link tables.
    pub tables: Vec<TableSpec>,
    /// FROM clause body: the anchor table followed by its LEFT JOINs.
    pub from_sql: String,
    /// Whether a one-to-many join requires wrapping the query.
    pub requires_wrapping: bool,
}

/// A requested table, resolved against the registry when it isn't a manual join.
#[derive(Debug, Clone)]
struct Candidate<'r> {
    spec: TableSpec,
    table: Option<&'r LogTable>,
    merged: bool,
}

impl<'r> Candidate<'r> {
    fn bare(table: &'r LogTable) -> Self {
        Self {
            spec: TableSpec::Name(table.name().to_string()),
            table: Some(table),
            merged: false,
        }
    }

    /// The manual join, unless it has been folded into a derived join.
    fn manual(&self) -> Option<&ManualJoin> {
        match &self.spec {
            TableSpec::Manual(join) if !self.merged => Some(join),
            _ => None,
        }
    }

    fn sort_key(&self) -> (u8, u32) {
        match self.table {
            None => (0, 0),
            Some(table) => (1, join_priority(table.name())),
        }
    }
}

/// Predicates joining a table to its link table on the action key, per ordered pair.
///
/// Each table keeps only its most recent pairing.
#[derive(Debug, Default)]
struct ActionJoins(Vec<(&'static str, &'static str, String)>);

impl ActionJoins {
    fn insert(&mut self, table: &'static str, link: &'static str, predicate: String) {
        self.set(table, link, predicate.clone());
        self.set(link, table, predicate);
    }

    fn set(&mut self, owner: &'static str, other: &'static str, predicate: String) {
        self.0.retain(|(existing, _, _)| *existing != owner);
        self.0.push((owner, other, predicate));
    }

    fn get(&self, owner: &str, other: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(o, t, _)| *o == owner && *t == other)
            .map(|(_, _, predicate)| predicate.as_str())
    }
}

/// The join chosen for a table against one already available.
struct JoinChoice {
    predicate: String,
    mirrored: Option<String>,
    requires_wrapping: bool,
}

/// Whether a manual join already joins `table` with exactly `join_on`.
fn joined_manually(candidates: &[Candidate<'_>], table: &str, join_on: &str) -> bool {
    candidates
        .iter()
        .filter_map(Candidate::manual)
        .any(|join| join.joins_table(table) && join.join_on == join_on)
}

fn action_predicate(left: &LogTable, right: &LogTable) -> String {
    format!(
        "{}.{} = {}.{}",
        left.name(),
        left.action_column(),
        right.name(),
        right.action_column()
    )
}

fn visit_predicate(left: &LogTable, right: &LogTable) -> String {
    format!(
        "{}.{} = {}.{}",
        left.name(),
        left.visit_column(),
        right.name(),
        right.visit_column()
    )
}

pub struct JoinResolver<'a> {
    registry: &'a LogTableRegistry,
    prefix: &'a dyn TablePrefix,
}

impl<'a> JoinResolver<'a> {
    pub fn new(registry: &'a LogTableRegistry, prefix: &'a dyn TablePrefix) -> Self {
        Self { registry, prefix }
    }

    /// Resolve a requested table list into a join plan.
    ///
    /// The first table anchors the FROM clause and is never reordered. The
    /// returned plan lists every table that ended up in the query, including
    /// link tables added on the way.
    pub fn resolve(&self, tables: Vec<TableSpec>) -> QueryResult<JoinPlan> {
        if tables.is_empty() {
            return Err(QueryError::unjoinable("", "no tables requested"));
        }

        let mut candidates = tables
            .into_iter()
            .map(|spec| self.candidate(spec))
            .collect::<QueryResult<Vec<_>>>()?;

        let action_joins = self.link_tables(&mut candidates)?;
        candidates.retain(|c| !c.merged);

        // The anchor stays first; manual joins go before any bare table.
        candidates[1..].sort_by_key(Candidate::sort_key);

        let (from_sql, requires_wrapping) = self.render_joins(&candidates, &action_joins)?;

        Ok(JoinPlan {
            tables: candidates.into_iter().map(|c| c.spec).collect(),
            from_sql,
            requires_wrapping,
        })
    }

    fn candidate(&self, spec: TableSpec) -> QueryResult<Candidate<'a>> {
        let table = match &spec {
            TableSpec::Manual(_) => None,
            TableSpec::Name(name) => Some(
                self.registry
                    .find(name)
                    .ok_or_else(|| QueryError::unjoinable(name, "not a known log table"))?,
            ),
        };
        Ok(Candidate {
            spec,
            table,
            merged: false,
        })
    }

    fn link_table_for(&self, table: &LogTable) -> QueryResult<&'a LogTable> {
        let link = table
            .link_table()
            .and_then(|name| self.registry.find(name))
            .ok_or_else(|| {
                QueryError::unjoinable(table.name(), "it can't be joined on visit and has no link table")
            })?;

        if !link.can_join_on_action() {
            return Err(QueryError::UnjoinableLinkTable {
                link: link.name().to_string(),
                table: table.name().to_string(),
            });
        }

        Ok(link)
    }

    /// Add the link tables needed to reach a visit and derive their action joins.
    ///
    /// A manual join of the same table is folded into the derived predicate
    /// so the table is joined only once.
    fn link_tables(&self, candidates: &mut Vec<Candidate<'a>>) -> QueryResult<ActionJoins> {
        let mut action_joins = ActionJoins::default();
        let requested = candidates.len();

        for index in 0..requested {
            let Some(table) = candidates[index].table else {
                continue;
            };
            if table.can_join_on_visit() {
                continue;
            }

            let link = self.link_table_for(table)?;
            if !candidates.iter().any(|c| c.spec.is_name(link.name())) {
                debug!("adding link table {} to join {}", link.name(), table.name());
                candidates.push(Candidate::bare(link));
            }

            let default_join = action_predicate(link, table);
            let mirrored_join = action_predicate(table, link);
            let mut predicate = default_join.clone();

            if index > 0
                && !joined_manually(candidates, table.name(), &default_join)
                && !joined_manually(candidates, table.name(), &mirrored_join)
            {
                let manual = candidates
                    .iter_mut()
                    .find(|c| c.manual().is_some_and(|join| join.joins_table(table.name())));
                if let Some(candidate) = manual {
                    if let TableSpec::Manual(join) = &candidate.spec {
                        debug!("merging manual join of {} into its link join", table.name());
                        predicate = format!("({} AND {})", join.join_on, default_join);
                    }
                    candidate.merged = true;
                }
            }

            action_joins.insert(table.name(), link.name(), predicate);
        }

        Ok(action_joins)
    }

    fn render_joins(
        &self,
        candidates: &[Candidate<'a>],
        action_joins: &ActionJoins,
    ) -> QueryResult<(String, bool)> {
        let mut sql = String::new();
        let mut available: Vec<&LogTable> = Vec::new();
        let mut requires_wrapping = false;

        for (index, candidate) in candidates.iter().enumerate() {
            let Some(table) = candidate.table else {
                let join = candidate.manual().ok_or_else(|| {
                    QueryError::unjoinable(candidate.spec.table(), "unresolved table")
                })?;
                if index == 0 {
                    return Err(QueryError::unjoinable(
                        &join.table,
                        "a manual join can't anchor the FROM clause",
                    ));
                }
                sql.push_str(&format!(
                    "\nLEFT JOIN {} AS {} ON {}",
                    self.prefix.prefix(&join.table),
                    join.alias_or_table(),
                    join.join_on
                ));
                // Joined under its own name, later tables can join against it.
                if join.joins_table(&join.table) {
                    if let Some(table) = self.registry.find(&join.table) {
                        if !available.iter().any(|t| t.name() == table.name()) {
                            available.push(table);
                        }
                    }
                }
                continue;
            };

            let table_sql = format!("{} AS {}", self.prefix.prefix(table.name()), table.name());

            if index == 0 {
                sql.push_str(&table_sql);
                available.push(table);
                continue;
            }

            let choice = Self::choose_join(table, &available, action_joins)?;
            if choice.requires_wrapping {
                debug!("joining {} requires wrapping the query", table.name());
                requires_wrapping = true;
            }

            let already_joined = joined_manually(candidates, table.name(), &choice.predicate)
                || choice
                    .mirrored
                    .as_deref()
                    .is_some_and(|mirrored| joined_manually(candidates, table.name(), mirrored));

            if already_joined {
                debug!("{} is already joined manually, skipping", table.name());
            } else {
                sql.push_str(&format!("\nLEFT JOIN {} ON {}", table_sql, choice.predicate));
            }

            if !available.iter().any(|t| t.name() == table.name()) {
                available.push(table);
            }
        }

        Ok((sql, requires_wrapping))
    }

    /// Pick the first available table sharing a join key with `table`, preferring visits.
    fn choose_join(
        table: &LogTable,
        available: &[&LogTable],
        action_joins: &ActionJoins,
    ) -> QueryResult<JoinChoice> {
        for other in available {
            if table.can_join_on_visit() && other.can_join_on_visit() {
                return Ok(JoinChoice {
                    predicate: visit_predicate(table, other),
                    mirrored: Some(visit_predicate(other, table)),
                    requires_wrapping: other.requires_subselect_with(table.name()),
                });
            }

            if table.can_join_on_action() && other.can_join_on_action() {
                let predicate = action_joins.get(table.name(), other.name()).ok_or_else(|| {
                    QueryError::unjoinable(
                        table.name(),
                        format!("no action join derived towards '{}'", other.name()),
                    )
                })?;
                return Ok(JoinChoice {
                    predicate: predicate.to_string(),
                    mirrored: None,
                    requires_wrapping: false,
                });
            }
        }

        Err(QueryError::unjoinable(
            table.name(),
            "no joined table shares a visit or action key with it",
        ))
    }
}
