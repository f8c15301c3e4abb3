//! logquery CLI - build segmented SELECT statements over the log tables
//!
//! Usage:
//!   logquery build --select <fields> --from <table>... [options]
//!   logquery tables
//!
//! Examples:
//!   logquery build --select "log_visit.idvisit" --from log_visit --from log_action
//!   logquery build --select "log_conversion.idgoal, COUNT(*)" --from log_conversion \
//!       --segment-where "log_link_visit_action.idaction_url = ?" --segment-bind 12 \
//!       --segment-table log_link_visit_action --group-by log_conversion.idgoal --format json

use clap::{Parser, Subcommand, ValueEnum};
use logquery::bind::BindValue;
use logquery::builder::{LogQueryBuilder, SelectRequest};
use logquery::config::Settings;
use logquery::planner::{ManualJoin, TableSpec};
use logquery::segment::{CompiledSegment, NoSegment, SegmentExpression};
use logquery::sql::StaticPrefix;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "logquery")]
#[command(about = "logquery - Build segmented SQL over analytics log tables")]
#[command(version)]
struct Cli {
    /// Path to a logquery.toml (default: LOGQUERY_CONFIG, ./logquery.toml, user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log resolver decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a SELECT statement
    Build {
        /// Select list, e.g. "log_visit.idvisit, COUNT(*) AS hits"
        #[arg(short, long)]
        select: String,

        /// Log table to query; the first one anchors the FROM clause
        #[arg(short, long = "from", required = true)]
        from: Vec<String>,

        /// Manual join as table:alias:predicate (alias may be empty)
        #[arg(short, long = "join", value_parser = parse_manual_join)]
        join: Vec<ManualJoin>,

        /// WHERE clause
        #[arg(short, long = "where", default_value = "")]
        where_clause: String,

        /// Value bound to the WHERE clause placeholders, in order
        #[arg(short, long = "bind", value_parser = parse_bind)]
        bind: Vec<BindValue>,

        /// Segment definition, as shown to users (defaults to --segment-where)
        #[arg(long, default_value = "")]
        segment: String,

        /// Compiled WHERE fragment of the segment
        #[arg(long, default_value = "")]
        segment_where: String,

        /// Value bound to the segment placeholders, in order
        #[arg(long = "segment-bind", value_parser = parse_bind)]
        segment_bind: Vec<BindValue>,

        /// Table the segment's predicates reference
        #[arg(long = "segment-table")]
        segment_table: Vec<String>,

        #[arg(short, long, default_value = "")]
        group_by: String,

        #[arg(short, long, default_value = "")]
        order_by: String,

        /// LIMIT as "count" or "offset, count"
        #[arg(short, long, default_value = "")]
        limit: String,

        /// Table prefix, overrides the configured one
        #[arg(long)]
        prefix: Option<String>,

        /// Output format
        #[arg(long, default_value = "sql")]
        format: OutputFormat,
    },

    /// List the known log tables and their join keys
    Tables,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// SQL, followed by the bound values as comments
    Sql,
    /// {"sql": ..., "bind": [...]}
    Json,
}

fn parse_manual_join(s: &str) -> Result<ManualJoin, String> {
    let mut parts = s.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(table), Some(alias), Some(join_on)) if !table.is_empty() && !join_on.is_empty() => {
            let join = ManualJoin::new(table, join_on);
            Ok(if alias.is_empty() {
                join
            } else {
                join.with_alias(alias)
            })
        }
        _ => Err(format!("expected table:alias:predicate, got '{}'", s)),
    }
}

fn parse_bind(s: &str) -> Result<BindValue, String> {
    s.parse().map_err(|e| format!("{:?}", e))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Build {
            select,
            from,
            join,
            where_clause,
            bind,
            segment,
            segment_where,
            segment_bind,
            segment_table,
            group_by,
            order_by,
            limit,
            prefix,
            format,
        } => {
            // A bare WHERE fragment doubles as the segment definition.
            let definition = if segment.trim().is_empty() {
                &segment_where
            } else {
                &segment
            };
            let mut compiled = CompiledSegment::new(definition, &segment_where);
            for value in segment_bind {
                compiled = compiled.bind(value);
            }
            for table in &segment_table {
                compiled = compiled.requires_table(table);
            }

            let tables = from
                .into_iter()
                .map(TableSpec::Name)
                .chain(join.into_iter().map(TableSpec::Manual));
            let request = SelectRequest::new(&select, tables)
                .filter(&where_clause, bind)
                .group_by(&group_by)
                .order_by(&order_by)
                .limit(&limit);

            cmd_build(&settings, prefix, &compiled, request, format)
        }
        Commands::Tables => cmd_tables(&settings),
    }
}

fn cmd_build(
    settings: &Settings,
    prefix: Option<String>,
    segment: &CompiledSegment,
    request: SelectRequest,
    format: OutputFormat,
) -> ExitCode {
    let builder = match LogQueryBuilder::from_settings(settings) {
        Ok(builder) => builder,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let builder = match prefix {
        Some(prefix) => builder.with_prefix(StaticPrefix(prefix)),
        None => builder,
    };

    let segment: &dyn SegmentExpression = if segment.is_empty() {
        &NoSegment
    } else {
        segment
    };

    let built = match builder.build_select(segment, request) {
        Ok(built) => built,
        Err(e) => {
            eprintln!("Query error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match format {
        OutputFormat::Sql => {
            println!("{}", built.sql);
            for (i, value) in built.bind.iter().enumerate() {
                println!("-- bind {}: {}", i + 1, value);
            }
        }
        OutputFormat::Json => match serde_json::to_string_pretty(&built) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Serialization error: {}", e);
                return ExitCode::FAILURE;
            }
        },
    }

    ExitCode::SUCCESS
}

fn cmd_tables(settings: &Settings) -> ExitCode {
    let registry = settings.registry();

    println!("Log tables:");
    for table in registry.tables() {
        let mut keys = Vec::new();
        if table.can_join_on_visit() {
            keys.push(format!("visit ({})", table.visit_column()));
        }
        if table.can_join_on_action() {
            keys.push(format!("action ({})", table.action_column()));
        }
        if let Some(link) = table.link_table() {
            keys.push(format!("via {}", link));
        }
        println!("  - {} [{}]", table.name(), keys.join(", "));
    }

    ExitCode::SUCCESS
}
