use rowloom::executor::{QueryExecutor, SqliteExecutor};
use rowloom::query::{Condition, Direction, QueryBuilder, QueryKind};
use rowloom::scalar::Scalar;

#[test]
fn select_descriptors_carry_the_full_shape() {
    let descriptor = QueryBuilder::select("ships")
        .filter("docked", true)
        .order_by("class", Direction::Ascending)
        .limit(10)
        .build();
    assert_eq!(descriptor.kind(), QueryKind::Select);
    assert_eq!(descriptor.table(), "ships");
    assert_eq!(
        descriptor.condition().pairs(),
        &[(String::from("docked"), Scalar::Boolean(true))]
    );
    assert_eq!(descriptor.order().len(), 1);
    assert_eq!(descriptor.order()[0].column(), "class");
    assert_eq!(descriptor.order()[0].direction(), Direction::Ascending);
    assert_eq!(descriptor.limit(), Some(10));
}

#[test]
fn negative_limits_mean_unbounded() {
    let descriptor = QueryBuilder::select("ships").limit(-1).build();
    assert_eq!(descriptor.limit(), None);
    let descriptor = QueryBuilder::select("ships").limit(0).build();
    assert_eq!(descriptor.limit(), Some(0), "zero is a real cap, not unbounded");
}

#[test]
fn matching_replaces_accumulated_constraints() {
    let descriptor = QueryBuilder::select("ships")
        .filter("docked", true)
        .matching(Condition::new().equals("class", "Vagrant"))
        .build();
    assert_eq!(descriptor.condition().pairs().len(), 1);
    assert_eq!(descriptor.condition().pairs()[0].0, "class");
}

#[test]
fn raw_fragments_ride_alongside_pairs() {
    let descriptor = QueryBuilder::select("ships")
        .filter("docked", true)
        .raw("\"shield\" > 0.5")
        .build();
    assert_eq!(descriptor.condition().pairs().len(), 1);
    assert_eq!(descriptor.condition().raw_fragment(), Some("\"shield\" > 0.5"));
}

#[test]
fn mutation_builders_set_their_kinds() {
    let insert = QueryBuilder::insert("ships").set("class", "Vagrant").build();
    assert_eq!(insert.kind(), QueryKind::Insert);
    assert_eq!(insert.assignments().len(), 1);
    let update = QueryBuilder::update("ships").set("class", "Vagrant").build();
    assert_eq!(update.kind(), QueryKind::Update);
    let delete = QueryBuilder::delete("ships").build();
    assert_eq!(delete.kind(), QueryKind::Delete);
}

fn seeded_executor() -> SqliteExecutor {
    let executor = SqliteExecutor::in_memory().expect("in-memory store");
    executor
        .connection()
        .execute_batch(
            "create table ships (id integer primary key, class text not null, docked integer not null);
             insert into ships (id, class, docked) values
                 (1, 'Vagrant', 1), (2, 'Leonov', 1), (3, 'Piranha', 0);",
        )
        .expect("seed ok");
    executor
}

#[test]
fn fetching_respects_condition_order_and_limit() {
    let executor = seeded_executor();
    let descriptor = QueryBuilder::select("ships")
        .filter("docked", true)
        .order_by("class", Direction::Descending)
        .limit(1)
        .build();
    let rows = executor.fetch(descriptor).expect("fetch ok");
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].get("class"),
        Some(&Scalar::Text(String::from("Vagrant"))),
        "descending by class puts Vagrant first"
    );
}

#[test]
fn raw_fragments_reach_the_store() {
    let executor = seeded_executor();
    let descriptor = QueryBuilder::select("ships")
        .raw("\"id\" > 1")
        .build();
    let rows = executor.fetch(descriptor).expect("fetch ok");
    assert_eq!(rows.len(), 2);
}

#[test]
fn mutations_report_affected_rows_and_keys() {
    let executor = seeded_executor();
    let ack = executor
        .execute(
            QueryBuilder::insert("ships")
                .set("class", "Redshift")
                .set("docked", false)
                .build(),
        )
        .expect("insert ok");
    assert_eq!(ack.rows_affected, 1);
    assert_eq!(ack.inserted_key, Some(4), "rowids continue from the seeded ones");

    let ack = executor
        .execute(
            QueryBuilder::update("ships")
                .set("docked", true)
                .filter("class", "Redshift")
                .build(),
        )
        .expect("update ok");
    assert_eq!(ack.rows_affected, 1);
    assert_eq!(ack.inserted_key, None, "only inserts carry a key");

    let ack = executor
        .execute(QueryBuilder::delete("ships").filter("docked", false).build())
        .expect("delete ok");
    assert_eq!(ack.rows_affected, 1, "only the Piranha was still undocked");
}

#[test]
fn executors_reject_mismatched_descriptors() {
    let executor = seeded_executor();
    let err = executor.fetch(QueryBuilder::delete("ships").build()).unwrap_err();
    assert!(
        format!("{}", err).contains("fetch takes select descriptors"),
        "got: {err}"
    );
    let err = executor.execute(QueryBuilder::select("ships").build()).unwrap_err();
    assert!(
        format!("{}", err).contains("execute takes mutation descriptors"),
        "got: {err}"
    );
}

#[test]
fn empty_mutations_are_rejected_before_the_store() {
    let executor = seeded_executor();
    let err = executor.execute(QueryBuilder::insert("ships").build()).unwrap_err();
    assert!(format!("{}", err).contains("carries no assignments"), "got: {err}");
    let err = executor.execute(QueryBuilder::update("ships").build()).unwrap_err();
    assert!(format!("{}", err).contains("carries no assignments"), "got: {err}");
}
