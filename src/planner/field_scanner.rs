//! Detection of table-qualified fields in raw SQL fragments.
//!
//! This is a textual heuristic: it looks for `<log table>.<column>` tokens and
//! does not understand aliases, string literals or computed expressions. It is
//! kept behind [`FieldScanner`] so a real tokenizer can replace it without
//! touching the resolver or the assembler.

use regex::{NoExpand, Regex};

use crate::log_table::LogTableRegistry;

/// Finds and rewrites log-table qualifiers in SQL fragments.
pub trait FieldScanner: Send + Sync {
    /// Every `table.column` token in `text`, deduplicated, in first-seen order.
    fn qualified_fields(&self, text: &str) -> Vec<String>;

    /// Whether `table` appears as a table-name token in `text`.
    fn mentions_table(&self, text: &str, table: &str) -> bool;

    /// Replace every `table.` qualifier in `text` with `alias.`.
    fn requalify(&self, text: &str, alias: &str) -> String;
}

/// Regex-based [`FieldScanner`] over the names of a registry.
#[derive(Debug, Clone)]
pub struct RegexFieldScanner {
    tables: Regex,
    qualifiers: Regex,
    fields: Regex,
}

impl RegexFieldScanner {
    pub fn new(registry: &LogTableRegistry) -> Self {
        // Longest first, so `log_conversion_item` is never read as `log_conversion`.
        let mut names: Vec<&str> = registry.names().collect();
        names.sort_by_key(|name| std::cmp::Reverse(name.len()));
        let alternation = names
            .iter()
            .map(|name| regex::escape(name))
            .collect::<Vec<_>>()
            .join("|");

        Self {
            tables: compile(&format!("(?:{})", alternation)),
            qualifiers: compile(&format!(r"(?:{})\.", alternation)),
            fields: compile(&format!(r"(?:{})\.[a-z0-9_*]+", alternation)),
        }
    }
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("escaped table names always form a valid pattern")
}

impl FieldScanner for RegexFieldScanner {
    fn qualified_fields(&self, text: &str) -> Vec<String> {
        let mut fields: Vec<String> = Vec::new();
        for found in self.fields.find_iter(text) {
            if !fields.iter().any(|field| field == found.as_str()) {
                fields.push(found.as_str().to_string());
            }
        }
        fields
    }

    fn mentions_table(&self, text: &str, table: &str) -> bool {
        self.tables.find_iter(text).any(|found| found.as_str() == table)
    }

    fn requalify(&self, text: &str, alias: &str) -> String {
        let replacement = format!("{}.", alias);
        self.qualifiers
            .replace_all(text, NoExpand(&replacement))
            .into_owned()
    }
}
