//! Rowloom – a reflective record mapper and relation resolver.
//!
//! Rowloom centers on two ideas:
//! * *Reflective construction*: a [`registry::TypeRegistry`] holds named
//!   constructor shapes (ordered parameter kinds plus a build closure) and
//!   can instantiate any registered type from a type name and a list of
//!   untyped string arguments, coercing each argument to its declared
//!   [`scalar::ScalarKind`] along the way.
//! * *Relation resolution*: record types declare [`relation::RelationSpec`]s
//!   (has-one / has-many) as static schema metadata, and a resolution pass
//!   expands them into an in-memory object graph, guarding cyclic
//!   declarations with a visited set instead of recursing forever.
//!
//! Between the two sits the record model: a [`record::Record`] is one row in
//! object form, and the [`record::Repository`] maps records in and out of a
//! store through the [`executor::QueryExecutor`] contract. Statements travel
//! as immutable [`query::QueryDescriptor`] values produced by a consuming
//! fluent builder, so a descriptor can neither be mutated after building nor
//! run twice.
//!
//! ## Modules
//! * [`scalar`] – Scalar kinds and values, the fixed string coercion table.
//! * [`inflect`] – The conventional type-name to table-name derivation.
//! * [`registry`] – Constructor shapes, record schemas and instantiation.
//! * [`query`] – The fluent builder and the descriptors it produces.
//! * [`executor`] – The store collaborator contract and its SQLite implementation.
//! * [`record`] – Records and the repository operations over them.
//! * [`relation`] – Relation metadata and the recursive resolver.
//! * [`error`] – The crate error taxonomy.
//!
//! ## Storage
//! The engine never talks SQL itself; it hands descriptors to whatever
//! implements [`executor::QueryExecutor`]. The bundled
//! [`executor::SqliteExecutor`] renders descriptors to deterministic SQL
//! over rusqlite and is what the tests and the demo binary run against.
//!
//! ## Quick Start
//! ```
//! use rowloom::executor::SqliteExecutor;
//! use rowloom::record::Repository;
//! use rowloom::registry::{RecordSchema, TypeRegistry};
//! use rowloom::scalar::ScalarKind;
//!
//! let executor = SqliteExecutor::in_memory().unwrap();
//! executor
//!     .connection()
//!     .execute_batch("create table accounts (id integer primary key, name text not null);")
//!     .unwrap();
//! let mut registry = TypeRegistry::new();
//! registry.register_record(
//!     RecordSchema::new("Account")
//!         .column("id", ScalarKind::Long)
//!         .column("name", ScalarKind::Text),
//! );
//! let repository = Repository::new(registry, executor);
//! let mut alice = repository
//!     .create("Account", &[("name", "Alice".into())])
//!     .unwrap();
//! repository.save(&mut alice).unwrap();
//! let found = repository
//!     .find("Account", alice.get("id").cloned().unwrap(), false)
//!     .unwrap();
//! assert_eq!(found.get("name"), alice.get("name"));
//! ```
//!
//! ## Concurrency
//! Operations are synchronous and single-threaded per call; waiting happens
//! as blocking I/O inside the executor. There are no transactions and no
//! retries, so concurrent saves of the same row are last-write-wins at the
//! store.

pub mod error;
pub mod scalar;
pub mod inflect;
pub mod query;
pub mod registry;
pub mod executor;
pub mod record;
pub mod relation;
