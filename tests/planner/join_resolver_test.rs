use logquery::error::QueryError;
use logquery::log_table::{LogTableRegistry, RegistryOptions};
use logquery::planner::{JoinPlan, JoinResolver, ManualJoin, TableSpec};
use logquery::sql::{NoPrefix, StaticPrefix};

fn resolve(tables: Vec<TableSpec>) -> JoinPlan {
    JoinResolver::new(LogTableRegistry::global(), &NoPrefix)
        .resolve(tables)
        .unwrap()
}

fn lines(plan: &JoinPlan) -> Vec<&str> {
    plan.from_sql.lines().collect()
}

#[test]
fn test_anchor_is_never_reordered() {
    let plan = resolve(vec!["log_conversion_item".into(), "log_visit".into()]);
    assert_eq!(plan.tables[0].table(), "log_conversion_item");
    assert_eq!(
        lines(&plan),
        vec![
            "log_conversion_item AS log_conversion_item",
            "LEFT JOIN log_visit AS log_visit ON log_visit.idvisit = log_conversion_item.idvisit",
        ]
    );
}

#[test]
fn test_bare_tables_sorted_by_priority() {
    let plan = resolve(vec![
        "log_visit".into(),
        "log_conversion_item".into(),
        "log_conversion".into(),
        "log_link_visit_action".into(),
    ]);
    let order: Vec<&str> = plan.tables.iter().map(TableSpec::table).collect();
    assert_eq!(
        order,
        vec![
            "log_visit",
            "log_link_visit_action",
            "log_conversion",
            "log_conversion_item"
        ]
    );
}

#[test]
fn test_manual_joins_go_before_bare_tables() {
    let plan = resolve(vec![
        "log_visit".into(),
        "log_conversion".into(),
        ManualJoin::new("log_action", "visit_entry.idaction = log_visit.visit_entry_idaction_url")
            .with_alias("visit_entry")
            .into(),
    ]);
    assert_eq!(
        lines(&plan),
        vec![
            "log_visit AS log_visit",
            "LEFT JOIN log_action AS visit_entry ON visit_entry.idaction = log_visit.visit_entry_idaction_url",
            "LEFT JOIN log_conversion AS log_conversion ON log_conversion.idvisit = log_visit.idvisit",
        ]
    );
}

#[test]
fn test_manual_join_is_not_repeated() {
    let plan = resolve(vec![
        "log_visit".into(),
        ManualJoin::new("log_conversion", "log_conversion.idvisit = log_visit.idvisit").into(),
        "log_conversion".into(),
    ]);
    assert_eq!(plan.from_sql.matches("LEFT JOIN").count(), 1);
    assert!(plan.requires_wrapping);
}

#[test]
fn test_mirrored_manual_join_is_not_repeated() {
    let plan = resolve(vec![
        "log_visit".into(),
        ManualJoin::new("log_conversion", "log_visit.idvisit = log_conversion.idvisit").into(),
        "log_conversion".into(),
    ]);
    assert_eq!(plan.from_sql.matches("LEFT JOIN").count(), 1);
}

#[test]
fn test_manual_action_join_folded_into_link_join() {
    let plan = resolve(vec![
        "log_link_visit_action".into(),
        ManualJoin::new(
            "log_action",
            "log_action.idaction = log_link_visit_action.idaction_name",
        )
        .into(),
        "log_action".into(),
    ]);

    assert_eq!(
        lines(&plan),
        vec![
            "log_link_visit_action AS log_link_visit_action",
            "LEFT JOIN log_action AS log_action ON (log_action.idaction = log_link_visit_action.idaction_name AND log_link_visit_action.idaction_url = log_action.idaction)",
        ]
    );
    assert!(plan.tables.iter().all(|spec| !spec.is_manual()));
    assert!(!plan.requires_wrapping);
}

#[test]
fn test_aliased_manual_join_is_kept_next_to_link_join() {
    let plan = resolve(vec![
        "log_link_visit_action".into(),
        ManualJoin::new(
            "log_action",
            "title.idaction = log_link_visit_action.idaction_name",
        )
        .with_alias("title")
        .into(),
        "log_action".into(),
    ]);

    assert_eq!(plan.from_sql.matches("LEFT JOIN log_action").count(), 2);
    assert!(plan
        .from_sql
        .contains("LEFT JOIN log_action AS log_action ON log_link_visit_action.idaction_url = log_action.idaction"));
}

#[test]
fn test_conversion_item_without_visit_key() {
    let registry = LogTableRegistry::new(RegistryOptions {
        conversion_item_joins_on_visit: false,
    });
    let err = JoinResolver::new(&registry, &NoPrefix)
        .resolve(vec!["log_visit".into(), "log_conversion_item".into()])
        .unwrap_err();
    assert!(
        matches!(err, QueryError::UnjoinableTable { ref table, .. } if table == "log_conversion_item")
    );
}

#[test]
fn test_prefixed_manual_join() {
    let prefix = StaticPrefix::new("piwik_");
    let plan = JoinResolver::new(LogTableRegistry::global(), &prefix)
        .resolve(vec![
            "log_visit".into(),
            ManualJoin::new("log_action", "entry.idaction = log_visit.visit_entry_idaction_url")
                .with_alias("entry")
                .into(),
        ])
        .unwrap();
    assert!(plan
        .from_sql
        .ends_with("LEFT JOIN piwik_log_action AS entry ON entry.idaction = log_visit.visit_entry_idaction_url"));
}
