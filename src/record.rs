//! Records and the repository that moves them in and out of the store.
//!
//! A [`Record`] is one persisted row in object form: a column map, the
//! new/stored flag steering what `save` does, and whatever related records a
//! resolution pass attached. The [`Repository`] wires a [`TypeRegistry`]
//! together with a [`QueryExecutor`] and exposes the per-type operations
//! (`find`, `find_where`, `query`, `create`) and the per-record ones
//! (`save`, `delete`, `resolve_relations`).
//!
//! Everything here is synchronous; a call blocks until the store has
//! answered. There are no transactions: two repositories saving the same
//! row concurrently is last-write-wins at the store.

use std::collections::HashMap;

use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::debug;

use crate::error::{Result, RowloomError};
use crate::executor::QueryExecutor;
use crate::query::{Condition, QueryBuilder};
use crate::registry::{RegistryHasher, TypeRegistry};
use crate::relation::Resolver;
use crate::scalar::Scalar;

// ------------- ResolutionState -------------
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ResolutionState {
    Unresolved,
    Resolving,
    Resolved,
    PartiallyResolved,
}

// ------------- Related -------------
/// Records attached under a relation's display name.
#[derive(Clone, Debug)]
pub enum Related {
    One(Box<Record>),
    Many(Vec<Record>),
}

// ------------- Record -------------
#[derive(Clone, Debug)]
pub struct Record {
    type_name: String,
    columns: HashMap<String, Scalar, RegistryHasher>,
    is_new: bool,
    deleted: bool,
    resolution: ResolutionState,
    related: HashMap<String, Related, RegistryHasher>,
}

impl Record {
    /// A record that does not exist in the store yet; `save` will insert it.
    pub fn fresh(type_name: &str) -> Self {
        Self::blank(type_name, true)
    }
    /// A record instantiated from stored data; `save` will update it.
    pub fn stored(type_name: &str) -> Self {
        Self::blank(type_name, false)
    }
    fn blank(type_name: &str, is_new: bool) -> Self {
        Self {
            type_name: type_name.to_owned(),
            columns: HashMap::default(),
            is_new,
            deleted: false,
            resolution: ResolutionState::Unresolved,
            related: HashMap::default(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }
    pub fn is_new(&self) -> bool {
        self.is_new
    }
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }
    pub fn resolution(&self) -> ResolutionState {
        self.resolution
    }

    pub fn set(&mut self, column: &str, value: impl Into<Scalar>) {
        self.columns.insert(column.to_owned(), value.into());
    }
    pub fn get(&self, column: &str) -> Option<&Scalar> {
        self.columns.get(column)
    }
    pub fn columns(&self) -> &HashMap<String, Scalar, RegistryHasher> {
        &self.columns
    }

    pub fn related(&self) -> &HashMap<String, Related, RegistryHasher> {
        &self.related
    }
    pub fn related_one(&self, name: &str) -> Option<&Record> {
        match self.related.get(name) {
            Some(Related::One(record)) => Some(record),
            _ => None,
        }
    }
    pub fn related_many(&self, name: &str) -> Option<&[Record]> {
        match self.related.get(name) {
            Some(Related::Many(records)) => Some(records),
            _ => None,
        }
    }

    pub(crate) fn set_resolution(&mut self, state: ResolutionState) {
        self.resolution = state;
    }
    // replaces any previous attachment under the same name, which is what
    // makes repeated resolution idempotent
    pub(crate) fn attach(&mut self, name: &str, related: Related) {
        self.related.insert(name.to_owned(), related);
    }
    pub(crate) fn detach(&mut self, name: &str) {
        self.related.remove(name);
    }
    pub(crate) fn mark_saved(&mut self) {
        self.is_new = false;
    }
    pub(crate) fn mark_deleted(&mut self) {
        self.deleted = true;
    }

    /// Columns and resolved relations as a JSON object. Related records nest
    /// under their display names; keys come out sorted.
    pub fn to_json(&self) -> JsonValue {
        let mut object = JsonMap::new();
        for (column, value) in &self.columns {
            object.insert(column.clone(), value.as_json());
        }
        for (name, related) in &self.related {
            let value = match related {
                Related::One(record) => record.to_json(),
                Related::Many(records) => {
                    JsonValue::Array(records.iter().map(Record::to_json).collect())
                }
            };
            object.insert(name.clone(), value);
        }
        JsonValue::Object(object)
    }
}

// ------------- Repository -------------
/// The entry point: owns the registry of schemas and the executor, and maps
/// between records and rows.
pub struct Repository<X: QueryExecutor> {
    registry: TypeRegistry,
    executor: X,
}

impl<X: QueryExecutor> Repository<X> {
    pub fn new(registry: TypeRegistry, executor: X) -> Self {
        Self { registry, executor }
    }
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }
    pub fn registry_mut(&mut self) -> &mut TypeRegistry {
        &mut self.registry
    }
    pub fn executor(&self) -> &X {
        &self.executor
    }

    /// Fetches the one record keyed by `key`. Zero matching rows is
    /// [`RowloomError::NotFound`], never an empty record.
    pub fn find(&self, type_name: &str, key: impl Into<Scalar>, resolve: bool) -> Result<Record> {
        let schema = self.registry.schema(type_name)?;
        let condition = Condition::new().equals(schema.primary_key_column(), key);
        self.find_where(type_name, condition, resolve)
    }

    /// Fetches the first record matching an explicit condition.
    pub fn find_where(
        &self,
        type_name: &str,
        condition: Condition,
        resolve: bool,
    ) -> Result<Record> {
        let schema = self.registry.schema(type_name)?;
        let descriptor = QueryBuilder::select(&schema.table_name())
            .matching(condition)
            .limit(1)
            .build();
        let rows = self.executor.fetch(descriptor)?;
        let row = rows.first().ok_or_else(|| {
            RowloomError::NotFound(format!("no '{}' record matched", type_name))
        })?;
        let mut record = self.registry.record_from_row(type_name, row)?;
        if resolve {
            self.resolve_relations(&mut record)?;
        }
        Ok(record)
    }

    /// Fetches up to `limit` records matching `condition`, in store order.
    /// A negative limit means unbounded.
    pub fn query(
        &self,
        type_name: &str,
        limit: i64,
        condition: Condition,
        resolve: bool,
    ) -> Result<Vec<Record>> {
        let schema = self.registry.schema(type_name)?;
        let descriptor = QueryBuilder::select(&schema.table_name())
            .matching(condition)
            .limit(limit)
            .build();
        let rows = self.executor.fetch(descriptor)?;
        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            records.push(self.registry.record_from_row(type_name, row)?);
        }
        if resolve {
            for record in records.iter_mut() {
                self.resolve_relations(record)?;
            }
        }
        Ok(records)
    }

    /// Builds a new record of a registered type without touching the store.
    pub fn create(&self, type_name: &str, columns: &[(&str, Scalar)]) -> Result<Record> {
        let _ = self.registry.schema(type_name)?;
        let mut record = Record::fresh(type_name);
        for (column, value) in columns {
            record.set(column, value.clone());
        }
        Ok(record)
    }

    /// Inserts the record when it is new, otherwise updates the stored row
    /// keyed by its primary key. Columns whose names start with `_` are
    /// reserved for in-memory bookkeeping and never reach the store. After
    /// an insert the record stops being new, and a missing primary key is
    /// backfilled from the store-assigned key.
    pub fn save(&self, record: &mut Record) -> Result<()> {
        if record.is_deleted() {
            return Err(RowloomError::InvalidRecordState(format!(
                "cannot save deleted '{}' record",
                record.type_name()
            )));
        }
        let schema = self.registry.schema(record.type_name())?;
        let table = schema.table_name();
        let primary_key = schema.primary_key_column();
        if record.is_new() {
            let mut builder = QueryBuilder::insert(&table);
            for (column, value) in record.columns() {
                if column.starts_with('_') {
                    continue;
                }
                builder = builder.set(column, value.clone());
            }
            let acknowledgment = self.executor.execute(builder.build())?;
            record.mark_saved();
            let key_missing = record.get(primary_key).is_none_or(Scalar::is_null);
            if key_missing {
                if let (Some(key), Some(kind)) = (
                    acknowledgment.inserted_key,
                    schema.column_kind(primary_key),
                ) {
                    record.set(primary_key, kind.refit(Scalar::Long(key))?);
                }
            }
            debug!(type_name = %record.type_name(), "record inserted");
        } else {
            let key = self.usable_key(record, primary_key)?;
            let mut builder = QueryBuilder::update(&table).filter(primary_key, key);
            for (column, value) in record.columns() {
                if column.starts_with('_') {
                    continue;
                }
                builder = builder.set(column, value.clone());
            }
            let acknowledgment = self.executor.execute(builder.build())?;
            debug!(
                type_name = %record.type_name(),
                rows = acknowledgment.rows_affected,
                "record updated"
            );
        }
        Ok(())
    }

    /// Deletes the stored row keyed by the record's primary key and marks
    /// the record deleted. Saving it afterwards is an error.
    pub fn delete(&self, record: &mut Record) -> Result<()> {
        if record.is_deleted() {
            return Err(RowloomError::InvalidRecordState(format!(
                "'{}' record is already deleted",
                record.type_name()
            )));
        }
        let schema = self.registry.schema(record.type_name())?;
        let primary_key = schema.primary_key_column();
        let key = self.usable_key(record, primary_key)?;
        let descriptor = QueryBuilder::delete(&schema.table_name())
            .filter(primary_key, key)
            .build();
        let acknowledgment = self.executor.execute(descriptor)?;
        record.mark_deleted();
        debug!(
            type_name = %record.type_name(),
            rows = acknowledgment.rows_affected,
            "record deleted"
        );
        Ok(())
    }

    /// Expands the record's declared relations into attached records,
    /// recursing where specs cascade. Returns the state the record finished
    /// in: `Resolved`, or `PartiallyResolved` when a cyclic cascade was
    /// truncated somewhere beneath it.
    pub fn resolve_relations(&self, record: &mut Record) -> Result<ResolutionState> {
        let mut resolver = Resolver::new(&self.registry, &self.executor);
        resolver.resolve(record)
    }

    fn usable_key(&self, record: &Record, primary_key: &str) -> Result<Scalar> {
        record
            .get(primary_key)
            .filter(|value| !value.is_null())
            .cloned()
            .ok_or_else(|| {
                RowloomError::InvalidRecordState(format!(
                    "'{}' record has no usable primary key '{}'",
                    record.type_name(),
                    primary_key
                ))
            })
    }
}
