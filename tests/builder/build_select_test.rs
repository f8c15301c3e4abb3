use insta::assert_snapshot;
use logquery::builder::{BuiltQuery, LogQueryBuilder, SelectRequest};
use logquery::config::{Settings, TableSettings};
use logquery::error::{QueryError, QueryResult};
use logquery::planner::ManualJoin;
use logquery::segment::{CompiledSegment, NoSegment, SegmentExpression};
use logquery::BindValue;
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;

fn build(segment: &dyn SegmentExpression, request: SelectRequest) -> QueryResult<BuiltQuery> {
    LogQueryBuilder::new().build_select(segment, request)
}

fn assert_parses(sql: &str) {
    if let Err(e) = Parser::parse_sql(&MySqlDialect {}, sql) {
        panic!("Invalid SQL: {}\nSQL: {}", e, sql);
    }
}

fn browser_segment() -> CompiledSegment {
    CompiledSegment::new("browserCode==ff", "log_visit.config_browser_code = ?")
        .bind("ff")
        .requires_table("log_visit")
}

#[test]
fn test_single_table_has_no_join() {
    let request = SelectRequest::single("log_visit.idvisit", "log_visit")
        .filter("log_visit.idsite = ?", vec![1.into()]);

    let query = build(&NoSegment, request).unwrap();
    assert_eq!(
        query.sql,
        "SELECT\n  log_visit.idvisit\nFROM\n  log_visit AS log_visit\nWHERE\n  log_visit.idsite = ?"
    );
    assert_eq!(query.bind, vec![BindValue::Int(1)]);
    assert!(!query.sql.contains("JOIN"));
    assert_parses(&query.sql);
}

#[test]
fn test_segment_where_and_binds_follow_caller() {
    let request = SelectRequest::single("log_visit.idvisit", "log_visit")
        .filter("log_visit.idsite = ?", vec![1.into()]);

    let query = build(&browser_segment(), request).unwrap();
    assert!(query
        .sql
        .contains("WHERE\n  (log_visit.idsite = ?) AND (log_visit.config_browser_code = ?)"));
    assert_eq!(
        query.bind,
        vec![BindValue::Int(1), BindValue::Str("ff".to_string())]
    );
    // The segment table was already requested.
    assert!(!query.sql.contains("JOIN"));
}

#[test]
fn test_segment_only_where() {
    let request = SelectRequest::single("log_visit.idvisit", "log_visit");
    let query = build(&browser_segment(), request).unwrap();
    assert!(query
        .sql
        .ends_with("WHERE\n  log_visit.config_browser_code = ?"));
    assert_eq!(query.bind, vec![BindValue::from("ff")]);
}

#[test]
fn test_action_pulls_in_link_table() {
    let request = SelectRequest::new("log_visit.idvisit, log_action.name", ["log_visit", "log_action"])
        .group_by("log_action.name");

    let query = build(&NoSegment, request).unwrap();
    assert!(query.sql.contains(
        "LEFT JOIN log_link_visit_action AS log_link_visit_action ON log_link_visit_action.idvisit = log_visit.idvisit"
    ));
    assert!(query.sql.contains(
        "LEFT JOIN log_action AS log_action ON log_link_visit_action.idaction_url = log_action.idaction"
    ));
    // Actions fan out visits, so the aggregation runs over a grouped inner query.
    assert!(query.sql.contains(") AS log_inner"));
    assert!(query
        .sql
        .starts_with("SELECT\n  log_inner.idvisit, log_inner.name\nFROM\n  (\n"));
    assert!(query
        .sql
        .contains("    SELECT\n      log_visit.idvisit,\n      log_action.name\n    FROM\n"));
    assert!(query.sql.contains("    GROUP BY\n      log_visit.idvisit\n"));
    assert!(query.sql.ends_with("GROUP BY\n  log_inner.name"));
    assert_parses(&query.sql);
}

#[test]
fn test_conversion_then_visit_wraps() {
    let request = SelectRequest::new(
        "log_conversion.idgoal, COUNT(log_visit.idvisit) AS visits",
        ["log_conversion", "log_visit"],
    )
    .group_by("log_conversion.idgoal");

    let query = build(&NoSegment, request).unwrap();
    assert_snapshot!(query.sql, @r"
    SELECT
      log_inner.idgoal, COUNT(log_inner.idvisit) AS visits
    FROM
      (
        SELECT
          log_conversion.idgoal,
          log_visit.idvisit
        FROM
          log_conversion AS log_conversion
          LEFT JOIN log_visit AS log_visit ON log_visit.idvisit = log_conversion.idvisit
        GROUP BY
          log_visit.idvisit
        ORDER BY
          NULL
      ) AS log_inner
    GROUP BY
      log_inner.idgoal
    ");
    assert_parses(&query.sql);
}

#[test]
fn test_conversions_by_goal_through_actions() {
    let segment = CompiledSegment::new("pageUrl==12", "log_link_visit_action.idaction_url = ?")
        .bind(12)
        .requires_table("log_link_visit_action");
    let request = SelectRequest::single("log_conversion.idgoal, COUNT(*) AS conversions", "log_conversion")
        .group_by("log_conversion.idgoal");

    let query = build(&segment, request).unwrap();
    assert_snapshot!(query.sql, @r"
    SELECT
      log_inner.idgoal, COUNT(*) AS conversions
    FROM
      (
        SELECT
          log_conversion.idgoal
        FROM
          log_conversion AS log_conversion
          LEFT JOIN log_link_visit_action AS log_link_visit_action ON log_link_visit_action.idvisit = log_conversion.idvisit
        WHERE
          log_link_visit_action.idaction_url = ?
        GROUP BY
          CONCAT(log_conversion.idvisit, '_', log_conversion.idgoal, '_', log_conversion.buster)
        ORDER BY
          NULL
      ) AS log_inner
    GROUP BY
      log_inner.idgoal
    ");
    assert_eq!(query.bind, vec![BindValue::Int(12)]);
    assert_parses(&query.sql);
}

#[test]
fn test_conversions_without_segment_stay_flat() {
    let request = SelectRequest::new("log_conversion.idgoal", ["log_conversion", "log_link_visit_action"])
        .group_by("log_conversion.idgoal");

    let query = build(&NoSegment, request).unwrap();
    assert!(!query.sql.contains("log_inner"));
    assert!(query.sql.ends_with("GROUP BY\n  log_conversion.idgoal"));
}

#[test]
fn test_limit_forms() {
    let build_limit = |limit: &str| {
        build(
            &NoSegment,
            SelectRequest::single("log_visit.idvisit", "log_visit").limit(limit),
        )
        .unwrap()
        .sql
    };

    assert!(build_limit("10, 5").ends_with("\nLIMIT 10, 5"));
    assert!(build_limit("10,5").ends_with("\nLIMIT 10, 5"));
    assert!(build_limit("5").ends_with("\nLIMIT 5"));
    assert!(build_limit("5; DROP TABLE log_visit").ends_with("\nLIMIT 5"));
    assert!(!build_limit("0").contains("LIMIT"));
    assert!(!build_limit("abc").contains("LIMIT"));
    assert!(!build_limit("").contains("LIMIT"));
}

#[test]
fn test_wrapped_query_with_limit_skips_inner_grouping() {
    let request = SelectRequest::new("log_visit.idvisit", ["log_visit", "log_conversion"])
        .order_by("log_visit.idvisit DESC")
        .limit("100");

    let query = build(&NoSegment, request).unwrap();
    assert!(query.sql.contains("ORDER BY\n      log_visit.idvisit DESC\n    LIMIT 100"));
    assert!(!query.sql.contains("GROUP BY"));
    assert!(query.sql.ends_with("ORDER BY\n  log_inner.idvisit DESC"));
}

#[test]
fn test_wrapped_query_with_unusable_limit_keeps_inner_grouping() {
    for limit in ["abc", "-5", "0"] {
        let request = SelectRequest::new("log_visit.idvisit", ["log_visit", "log_conversion"])
            .order_by("log_visit.idvisit DESC")
            .limit(limit);

        let query = build(&NoSegment, request).unwrap();
        assert!(
            query.sql.contains("    GROUP BY\n      log_visit.idvisit\n    ORDER BY\n      NULL\n  ) AS log_inner"),
            "limit {:?} produced:\n{}",
            limit,
            query.sql
        );
        assert!(!query.sql.contains("LIMIT"));
    }
}

#[test]
fn test_manual_join_merged_with_link_join() {
    let segment = CompiledSegment::new("pageTitle==Home", "log_action.name = ?")
        .bind("Home")
        .requires_table("log_action");
    let request = SelectRequest::single("log_link_visit_action.idvisit", "log_link_visit_action").join(
        ManualJoin::new(
            "log_action",
            "log_action.idaction = log_link_visit_action.idaction_name",
        ),
    );

    let query = build(&segment, request).unwrap();
    assert_eq!(query.sql.matches("LEFT JOIN log_action").count(), 1);
    assert!(query.sql.contains(
        "LEFT JOIN log_action AS log_action ON (log_action.idaction = log_link_visit_action.idaction_name AND log_link_visit_action.idaction_url = log_action.idaction)"
    ));
    assert_parses(&query.sql);
}

#[test]
fn test_unknown_table() {
    let request = SelectRequest::new("log_visit.idvisit", ["log_visit", "log_profile"]);
    let err = build(&NoSegment, request).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Table 'log_profile' can't be joined for segmentation: not a known log table"
    );
}

#[test]
fn test_empty_segment_where() {
    let segment = CompiledSegment::new("visitCount>1", "");
    let request = SelectRequest::single("log_visit.idvisit", "log_visit");
    assert_eq!(
        build(&segment, request),
        Err(QueryError::EmptyFilterClause)
    );
}

#[test]
fn test_wrapping_needs_qualified_fields() {
    let request = SelectRequest::new("COUNT(*)", ["log_visit", "log_conversion"]);
    assert_eq!(
        build(&NoSegment, request),
        Err(QueryError::NoQualifiedFields)
    );
}

#[test]
fn test_prefix_from_settings() {
    let settings = Settings {
        tables: TableSettings {
            prefix: "matomo_".to_string(),
            ..Default::default()
        },
    };
    let builder = LogQueryBuilder::from_settings(&settings).unwrap();
    let query = builder
        .build_select(
            &NoSegment,
            SelectRequest::new("log_visit.idvisit", ["log_visit", "log_link_visit_action"]),
        )
        .unwrap();

    assert!(query.sql.contains("FROM\n      matomo_log_visit AS log_visit"));
    assert!(query.sql.contains(
        "LEFT JOIN matomo_log_link_visit_action AS log_link_visit_action ON log_link_visit_action.idvisit = log_visit.idvisit"
    ));
    // Qualifiers in the select list keep the unprefixed name.
    assert!(query.sql.contains("log_visit.idvisit"));
    assert!(!query.sql.contains("matomo_log_visit.idvisit"));
}

#[test]
fn test_built_query_json() {
    let query = build(&browser_segment(), SelectRequest::single("log_visit.idvisit", "log_visit")).unwrap();
    let json = serde_json::to_value(&query).unwrap();
    assert_eq!(json["bind"], serde_json::json!(["ff"]));
    assert!(json["sql"].as_str().unwrap().starts_with("SELECT"));
}

#[test]
fn test_builder_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<LogQueryBuilder>();
    assert_send_sync::<logquery::log_table::LogTableRegistry>();
}
