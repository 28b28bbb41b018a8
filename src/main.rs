use config::{Config, Environment, File};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rowloom::error::{Result, RowloomError};
use rowloom::executor::SqliteExecutor;
use rowloom::query::Condition;
use rowloom::record::Repository;
use rowloom::registry::{ConstructorShape, RecordSchema, TypeRegistry};
use rowloom::relation::RelationSpec;
use rowloom::scalar::{Scalar, ScalarKind};

/// Settings read from an optional `rowloom` config file, overridable with
/// `ROWLOOM_*` environment variables. No database path means in-memory.
#[derive(Debug, Deserialize, Default)]
struct Settings {
    database: Option<String>,
    log: Option<String>,
}

fn load_settings() -> Result<Settings> {
    Config::builder()
        .add_source(File::with_name("rowloom").required(false))
        .add_source(Environment::with_prefix("ROWLOOM"))
        .build()
        .and_then(|settings| settings.try_deserialize::<Settings>())
        .map_err(|e| RowloomError::Config(e.to_string()))
}

fn open_executor(settings: &Settings) -> Result<SqliteExecutor> {
    match &settings.database {
        Some(path) => SqliteExecutor::open(path),
        None => SqliteExecutor::in_memory(),
    }
}

/// The demo universe: an account owning a hangar full of ships. Ship and
/// Hangar point back and forth, which is what exercises the cycle guard.
fn demo_registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry.register_record(
        RecordSchema::new("Account")
            .column("id", ScalarKind::Long)
            .column("name", ScalarKind::Text)
            .column("gold", ScalarKind::Long)
            .column("hangar_id", ScalarKind::Long)
            .relation(
                RelationSpec::has_one("Hangar")
                    .local_key("hangar_id")
                    .cascade(true),
            ),
    );
    registry.register_record(
        RecordSchema::new("Hangar")
            .column("id", ScalarKind::Long)
            .column("capacity", ScalarKind::Long)
            .relation(
                RelationSpec::has_many("Ship")
                    .local_key("id")
                    .foreign_key("hangar_id")
                    .display_name("ships")
                    .cascade(true),
            ),
    );
    registry.register_record(
        RecordSchema::new("Ship")
            .column("id", ScalarKind::Long)
            .column("hangar_id", ScalarKind::Long)
            .column("class", ScalarKind::Text)
            .column("shield", ScalarKind::Double)
            .column("docked", ScalarKind::Boolean)
            .relation(
                RelationSpec::has_one("Hangar")
                    .local_key("hangar_id")
                    .cascade(true),
            )
            .on_instance(|record| {
                let label = match (record.get("class"), record.get("id")) {
                    (Some(class), Some(id)) => format!("{}-{}", class, id),
                    _ => String::from("unlabeled"),
                };
                record.set("_label", label);
            }),
    );
    // shapes do not have to describe records; any type can register one
    registry.register_shape(
        "Coordinates",
        ConstructorShape::new(vec![ScalarKind::Int, ScalarKind::Int], |values| {
            // the registry already coerced both arguments to Int
            let x = values[0].as_i64().unwrap_or_default() as i32;
            let y = values[1].as_i64().unwrap_or_default() as i32;
            Box::new(Coordinates { x, y })
        }),
    );
    registry
}

struct Coordinates {
    x: i32,
    y: i32,
}

fn main() -> Result<()> {
    let settings = load_settings()?;
    let filter = settings.log.clone().unwrap_or_else(|| String::from("rowloom=info"));
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
    info!(database = settings.database.as_deref().unwrap_or(":memory:"), "starting");

    let executor = open_executor(&settings)?;
    executor.connection().execute_batch(
        "create table if not exists accounts (
            id integer primary key,
            name text not null,
            gold integer not null,
            hangar_id integer
        );
        create table if not exists hangars (
            id integer primary key,
            capacity integer not null
        );
        create table if not exists ships (
            id integer primary key,
            hangar_id integer not null,
            class text not null,
            shield real not null,
            docked integer not null
        );",
    )?;

    let registry = demo_registry();
    info!(types = registry.len(), "registry primed");
    let repository = Repository::new(registry, executor);

    // a full round trip: hangar, three ships, one account pointing at the hangar
    let mut hangar = repository.create("Hangar", &[("capacity", 12i64.into())])?;
    repository.save(&mut hangar)?;
    let hangar_id = hangar.get("id").cloned().unwrap_or(Scalar::Null);

    for (class, shield, docked) in [
        ("Vagrant", 0.8, true),
        ("Leonov", 0.55, true),
        ("Piranha", 0.2, false),
    ] {
        let mut ship = repository.create(
            "Ship",
            &[
                ("hangar_id", hangar_id.clone()),
                ("class", class.into()),
                ("shield", shield.into()),
                ("docked", docked.into()),
            ],
        )?;
        repository.save(&mut ship)?;
    }

    let mut account = repository.create(
        "Account",
        &[
            ("name", "Nadira".into()),
            ("gold", 1250i64.into()),
            ("hangar_id", hangar_id.clone()),
        ],
    )?;
    repository.save(&mut account)?;
    let account_id = account.get("id").cloned().unwrap_or(Scalar::Null);

    // resolve the whole graph; the Ship -> Hangar backlink is truncated by
    // the visited set, so the account comes back partially resolved
    let graph = repository.find("Account", account_id.clone(), true)?;
    info!(state = ?graph.resolution(), "account graph resolved");
    println!("{}", serde_json::to_string_pretty(&graph.to_json()).unwrap_or_default());

    // plain queries skip resolution entirely
    let docked = repository.query(
        "Ship",
        -1,
        Condition::new().equals("docked", true),
        false,
    )?;
    println!("{} ships are docked", docked.len());

    // reflective construction from untyped strings
    let any = repository
        .registry()
        .instantiate("Coordinates", &["3", "-4"])?;
    if let Some(point) = any.downcast_ref::<Coordinates>() {
        println!("coordinates parsed from strings: ({}, {})", point.x, point.y);
    }

    // update and delete round out the lifecycle
    let mut account = repository.find("Account", account_id, false)?;
    account.set("gold", 980i64);
    repository.save(&mut account)?;

    let mut scrapped = repository.find_where(
        "Ship",
        Condition::new().equals("class", "Piranha"),
        false,
    )?;
    repository.delete(&mut scrapped)?;
    match repository.find_where("Ship", Condition::new().equals("class", "Piranha"), false) {
        Err(RowloomError::NotFound(_)) => println!("Piranha scrapped"),
        other => println!("unexpected lookup outcome: {:?}", other.map(|r| r.to_json())),
    }

    Ok(())
}
