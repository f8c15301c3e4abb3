//! SELECT assembler - renders already-resolved clause fragments into one SQL string.
//!
//! Fragments are raw SQL text supplied by the planner and by callers. The only
//! part this layer parses is LIMIT/OFFSET, which is coerced to integers so that
//! the pagination input can never carry SQL.

use std::fmt;

// =============================================================================
// LIMIT / OFFSET
// =============================================================================

/// A LIMIT clause, optionally with a leading offset (`LIMIT offset, count`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitOffset {
    pub offset: Option<i64>,
    pub limit: i64,
}

impl LimitOffset {
    pub fn new(limit: i64) -> Self {
        Self {
            offset: None,
            limit,
        }
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Parse caller input such as `"5"` or `"10, 5"` (offset 10, count 5).
    ///
    /// Returns `None` when no LIMIT clause should be emitted: a single count
    /// below 1, including empty and non-numeric input.
    pub fn parse(input: &str) -> Option<Self> {
        let parts: Vec<&str> = input.split(',').collect();

        if let [offset, limit] = parts.as_slice() {
            return Some(Self::new(coerce_int(limit)).with_offset(coerce_int(offset)));
        }

        let limit = coerce_int(input);
        (limit >= 1).then(|| Self::new(limit))
    }

    pub fn to_sql(&self) -> String {
        match self.offset {
            Some(offset) => format!("LIMIT {}, {}", offset, self.limit),
            None => format!("LIMIT {}", self.limit),
        }
    }
}

/// Read an optional sign and the leading digits of `value`; anything else is 0.
pub fn coerce_int(value: &str) -> i64 {
    let value = value.trim_start();
    let (negative, digits) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let number = digits[..end].bytes().fold(0i64, |acc, digit| {
        acc.saturating_mul(10).saturating_add(i64::from(digit - b'0'))
    });

    if negative {
        -number
    } else {
        number
    }
}

// =============================================================================
// Select Query
// =============================================================================

/// A SELECT statement made of raw clause fragments.
///
/// Empty fragments are treated as absent, so callers can pass through
/// whatever they were given without checking first.
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use = "SelectQuery has no effect until converted to SQL with to_sql()"]
pub struct SelectQuery {
    pub select: String,
    pub from: String,
    pub where_clause: Option<String>,
    pub group_by: Option<String>,
    pub order_by: Option<String>,
    pub limit: Option<LimitOffset>,
}

impl SelectQuery {
    pub fn new(select: &str, from: &str) -> Self {
        Self {
            select: select.to_string(),
            from: from.to_string(),
            ..Default::default()
        }
    }

    /// Set the WHERE clause.
    pub fn filter(mut self, condition: &str) -> Self {
        self.where_clause = non_empty(condition);
        self
    }

    /// Set the GROUP BY clause.
    pub fn group_by(mut self, group_by: &str) -> Self {
        self.group_by = non_empty(group_by);
        self
    }

    /// Set the ORDER BY clause.
    pub fn order_by(mut self, order_by: &str) -> Self {
        self.order_by = non_empty(order_by);
        self
    }

    pub fn limit(mut self, limit: Option<LimitOffset>) -> Self {
        self.limit = limit;
        self
    }

    /// Render the statement. Each keyword sits on its own line with the
    /// clause body indented beneath it.
    pub fn to_sql(&self) -> String {
        let mut sql = String::from("SELECT\n");
        sql.push_str(&indent(&self.select, 2));
        push_clause(&mut sql, "FROM", Some(&self.from));
        push_clause(&mut sql, "WHERE", self.where_clause.as_deref());
        push_clause(&mut sql, "GROUP BY", self.group_by.as_deref());
        push_clause(&mut sql, "ORDER BY", self.order_by.as_deref());

        if let Some(limit) = &self.limit {
            sql.push('\n');
            sql.push_str(&limit.to_sql());
        }

        sql
    }
}

impl fmt::Display for SelectQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

fn push_clause(sql: &mut String, keyword: &str, body: Option<&str>) {
    if let Some(body) = body {
        sql.push('\n');
        sql.push_str(keyword);
        sql.push('\n');
        sql.push_str(&indent(body, 2));
    }
}

fn non_empty(fragment: &str) -> Option<String> {
    let trimmed = fragment.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Indent every non-blank line of `text` by `width` spaces.
pub(crate) fn indent(text: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    text.lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{}{}", pad, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// =============================================================================
// Tests
// =============================================================================
