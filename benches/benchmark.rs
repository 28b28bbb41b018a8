use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use rowloom::executor::SqliteExecutor;
use rowloom::query::Condition;
use rowloom::record::Repository;
use rowloom::registry::{RecordSchema, TypeRegistry};
use rowloom::relation::RelationSpec;
use rowloom::scalar::ScalarKind;

fn registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry.register_record(
        RecordSchema::new("Hangar")
            .column("id", ScalarKind::Long)
            .column("capacity", ScalarKind::Long)
            .relation(
                RelationSpec::has_many("Ship")
                    .local_key("id")
                    .foreign_key("hangar_id")
                    .display_name("ships"),
            ),
    );
    registry.register_record(
        RecordSchema::new("Ship")
            .column("id", ScalarKind::Long)
            .column("hangar_id", ScalarKind::Long)
            .column("class", ScalarKind::Text)
            .column("docked", ScalarKind::Boolean),
    );
    registry
}

fn seeded_repository(ships: usize) -> Repository<SqliteExecutor> {
    let executor = SqliteExecutor::in_memory().expect("in-memory store");
    executor
        .connection()
        .execute_batch(
            "create table hangars (id integer primary key, capacity integer not null);
             create table ships (
                 id integer primary key,
                 hangar_id integer not null,
                 class text not null,
                 docked integer not null
             );
             insert into hangars (id, capacity) values (1, 1000000);",
        )
        .expect("schema ok");
    for n in 0..ships {
        executor
            .connection()
            .execute(
                "insert into ships (hangar_id, class, docked) values (1, 'Vagrant', ?1)",
                [(n % 2) as i64],
            )
            .expect("seed ok");
    }
    Repository::new(registry(), executor)
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let repository = seeded_repository(0);
    let arguments = ["7", "1", "Vagrant", "true"];
    c.bench_function("instantiate ship", |b| {
        b.iter(|| {
            repository
                .registry()
                .instantiate("Ship", black_box(&arguments))
                .unwrap()
        })
    });
    for fleet in [10usize, 100, 1000] {
        let repository = seeded_repository(fleet);
        c.bench_function(&format!("resolve hangar of {fleet}"), |b| {
            b.iter(|| repository.find("Hangar", 1i64, true).unwrap())
        });
    }
    let repository = seeded_repository(1000);
    c.bench_function("query docked of 1k", |b| {
        b.iter(|| {
            repository
                .query("Ship", -1, Condition::new().equals("docked", true), false)
                .unwrap()
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
