use rowloom::error::RowloomError;
use rowloom::executor::SqliteExecutor;
use rowloom::query::Condition;
use rowloom::record::{Record, Repository};
use rowloom::registry::{RecordSchema, TypeRegistry};
use rowloom::scalar::{Scalar, ScalarKind};

fn setup() -> Repository<SqliteExecutor> {
    let executor = SqliteExecutor::in_memory().expect("in-memory store");
    executor
        .connection()
        .execute_batch(
            "create table crews (
                id integer primary key,
                name text not null,
                wage real not null,
                active integer not null
            );",
        )
        .expect("schema ok");
    let mut registry = TypeRegistry::new();
    registry.register_record(
        RecordSchema::new("Crew")
            .column("id", ScalarKind::Long)
            .column("name", ScalarKind::Text)
            .column("wage", ScalarKind::Double)
            .column("active", ScalarKind::Boolean),
    );
    Repository::new(registry, executor)
}

fn saved_crew(repository: &Repository<SqliteExecutor>, name: &str, wage: f64, active: bool) -> Record {
    let mut crew = repository
        .create(
            "Crew",
            &[
                ("name", name.into()),
                ("wage", wage.into()),
                ("active", active.into()),
            ],
        )
        .expect("create ok");
    repository.save(&mut crew).expect("save ok");
    crew
}

#[test]
fn saving_assigns_the_primary_key() {
    let repository = setup();
    let crew = saved_crew(&repository, "Jones", 52.5, true);
    assert!(!crew.is_new(), "a saved record is no longer new");
    match crew.get("id") {
        Some(Scalar::Long(id)) => assert!(*id > 0, "the store assigned a positive key"),
        other => panic!("expected a Long key, got {other:?}"),
    }
}

#[test]
fn found_records_match_what_was_saved() {
    let repository = setup();
    let crew = saved_crew(&repository, "Amos", 61.0, true);
    let key = crew.get("id").cloned().expect("key present");
    let found = repository.find("Crew", key, false).expect("find ok");
    assert_eq!(found.get("name"), Some(&Scalar::Text(String::from("Amos"))));
    assert_eq!(found.get("wage"), Some(&Scalar::Double(61.0)));
    assert_eq!(
        found.get("active"),
        Some(&Scalar::Boolean(true)),
        "a stored 1 narrows back into a boolean"
    );
    assert!(!found.is_new());
}

#[test]
fn stored_reals_beyond_float_range_are_rejected() {
    let executor = SqliteExecutor::in_memory().expect("in-memory store");
    executor
        .connection()
        .execute_batch(
            "create table gauges (id integer primary key, reading real not null);
             insert into gauges (id, reading) values (1, 0.25), (2, 1e300);",
        )
        .expect("seed ok");
    let mut registry = TypeRegistry::new();
    registry.register_record(
        RecordSchema::new("Gauge")
            .column("id", ScalarKind::Long)
            .column("reading", ScalarKind::Float),
    );
    let repository = Repository::new(registry, executor);

    let fine = repository.find("Gauge", 1i64, false).expect("find ok");
    assert_eq!(fine.get("reading"), Some(&Scalar::Float(0.25)));

    // 1e300 would cast to infinity rather than narrow
    let err = repository.find("Gauge", 2i64, false).unwrap_err();
    let msg = format!("{}", err);
    assert!(
        msg.contains("column 'reading'") && msg.contains("does not fit declared kind Float"),
        "got: {msg}"
    );
}

#[test]
fn updates_change_the_stored_row() {
    let repository = setup();
    let mut crew = saved_crew(&repository, "Naomi", 70.0, true);
    let key = crew.get("id").cloned().expect("key present");
    crew.set("wage", 84.5);
    crew.set("active", false);
    repository.save(&mut crew).expect("second save ok");
    let found = repository.find("Crew", key, false).expect("find ok");
    assert_eq!(found.get("wage"), Some(&Scalar::Double(84.5)));
    assert_eq!(found.get("active"), Some(&Scalar::Boolean(false)));
}

#[test]
fn underscore_columns_never_reach_the_store() {
    let repository = setup();
    let mut crew = repository
        .create(
            "Crew",
            &[
                ("name", "Alex".into()),
                ("wage", 55.0.into()),
                ("active", true.into()),
            ],
        )
        .expect("create ok");
    // the crews table has no such column; the save succeeds only because
    // reserved columns are skipped on the way out
    crew.set("_scratch", "local only");
    repository.save(&mut crew).expect("insert skips reserved columns");
    crew.set("_scratch", "still local");
    repository.save(&mut crew).expect("update skips reserved columns");
    let key = crew.get("id").cloned().expect("key present");
    let found = repository.find("Crew", key, false).expect("find ok");
    assert_eq!(found.get("_scratch"), None);
}

#[test]
fn missing_records_are_not_found() {
    let repository = setup();
    let err = repository.find("Crew", 123456i64, false).unwrap_err();
    assert!(matches!(err, RowloomError::NotFound(_)), "got {err}");
}

#[test]
fn queries_honor_limit_and_condition() {
    let repository = setup();
    saved_crew(&repository, "Amos", 61.0, true);
    saved_crew(&repository, "Naomi", 70.0, true);
    saved_crew(&repository, "Clarissa", 48.0, false);

    let capped = repository
        .query("Crew", 2, Condition::new(), false)
        .expect("query ok");
    assert_eq!(capped.len(), 2);

    let active = repository
        .query("Crew", -1, Condition::new().equals("active", true), false)
        .expect("query ok");
    assert_eq!(active.len(), 2, "negative limit means unbounded");
    assert!(active
        .iter()
        .all(|crew| crew.get("active") == Some(&Scalar::Boolean(true))));
}

#[test]
fn find_where_takes_arbitrary_conditions() {
    let repository = setup();
    saved_crew(&repository, "Amos", 61.0, true);
    let found = repository
        .find_where("Crew", Condition::new().equals("name", "Amos"), false)
        .expect("find_where ok");
    assert_eq!(found.get("wage"), Some(&Scalar::Double(61.0)));
}

#[test]
fn deleting_removes_the_row() {
    let repository = setup();
    let mut crew = saved_crew(&repository, "Miller", 44.0, false);
    let key = crew.get("id").cloned().expect("key present");
    repository.delete(&mut crew).expect("delete ok");
    assert!(crew.is_deleted());
    let err = repository.find("Crew", key, false).unwrap_err();
    assert!(matches!(err, RowloomError::NotFound(_)), "got {err}");
}

#[test]
fn deleted_records_refuse_further_writes() {
    let repository = setup();
    let mut crew = saved_crew(&repository, "Miller", 44.0, false);
    repository.delete(&mut crew).expect("delete ok");

    let err = repository.save(&mut crew).unwrap_err();
    assert!(
        format!("{}", err).contains("cannot save deleted"),
        "got: {err}"
    );
    let err = repository.delete(&mut crew).unwrap_err();
    assert!(format!("{}", err).contains("already deleted"), "got: {err}");
}

#[test]
fn unsaved_records_cannot_be_deleted() {
    let repository = setup();
    let mut crew = repository
        .create("Crew", &[("name", "Ghost".into())])
        .expect("create ok");
    let err = repository.delete(&mut crew).unwrap_err();
    assert!(
        format!("{}", err).contains("no usable primary key"),
        "got: {err}"
    );
}

#[test]
fn create_rejects_unregistered_types() {
    let repository = setup();
    let err = repository.create("Ghost", &[]).unwrap_err();
    assert!(matches!(err, RowloomError::NotFound(_)), "got {err}");
}

#[test]
fn json_view_carries_all_columns() {
    let repository = setup();
    let crew = saved_crew(&repository, "Bobbie", 90.0, true);
    let json = crew.to_json();
    assert_eq!(json["name"], serde_json::json!("Bobbie"));
    assert_eq!(json["wage"], serde_json::json!(90.0));
    assert_eq!(json["active"], serde_json::json!(true));
    assert!(json["id"].is_i64());
}
