//! Declared relationships and their resolution into an object graph.
//!
//! A [`RelationSpec`] is static per-type metadata: it names a target type and
//! how the owner's columns point at it. The [`Resolver`] walks the specs of a
//! record in declaration order, fetches the related rows through the
//! executor, instantiates them through the registry and attaches them under
//! the relation's display name. Cascading resolution recurses through the
//! same path, with a visited set of type names keeping cyclic declarations
//! from recursing forever: a branch whose target type is already on the
//! current path is fetched and attached but not descended into, and the
//! record that observed the truncation finishes partially resolved.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::executor::QueryExecutor;
use crate::query::QueryBuilder;
use crate::record::{Record, Related, ResolutionState};
use crate::registry::{RegistryHasher, TypeRegistry};

// ------------- RelationKind -------------
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RelationKind {
    HasOne,
    HasMany,
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            RelationKind::HasOne => "has one",
            RelationKind::HasMany => "has many",
        };
        write!(f, "{}", name)
    }
}

/// Client-side predicate applied to fetched has-many candidates.
pub type RelationFilter = Arc<dyn Fn(&Record) -> bool + Send + Sync>;

// ------------- RelationSpec -------------
/// One declared relationship from an owner type to a target type.
///
/// Only the target type and the kind are mandatory; everything else has a
/// convention-driven default resolved at resolution time:
///
/// * local key: `<owner table>_id`
/// * foreign key: `id`
/// * display name: the lower-cased target type name
/// * limit: unbounded (has-many only)
/// * cascade: off
#[derive(Clone)]
pub struct RelationSpec {
    target_type: String,
    kind: RelationKind,
    local_key: Option<String>,
    foreign_key: Option<String>,
    display_name: Option<String>,
    limit: i64,
    cascade: bool,
    filter: Option<RelationFilter>,
}

impl RelationSpec {
    fn new(target_type: &str, kind: RelationKind) -> Self {
        Self {
            target_type: target_type.to_owned(),
            kind,
            local_key: None,
            foreign_key: None,
            display_name: None,
            limit: -1,
            cascade: false,
            filter: None,
        }
    }
    pub fn has_one(target_type: &str) -> Self {
        Self::new(target_type, RelationKind::HasOne)
    }
    pub fn has_many(target_type: &str) -> Self {
        Self::new(target_type, RelationKind::HasMany)
    }
    pub fn local_key(mut self, column: &str) -> Self {
        self.local_key = Some(column.to_owned());
        self
    }
    pub fn foreign_key(mut self, column: &str) -> Self {
        self.foreign_key = Some(column.to_owned());
        self
    }
    pub fn display_name(mut self, name: &str) -> Self {
        self.display_name = Some(name.to_owned());
        self
    }
    /// Caps how many records a has-many fetch may return. Negative means
    /// unbounded. Ignored by has-one, which always fetches at most one row.
    pub fn limit(mut self, rows: i64) -> Self {
        self.limit = rows;
        self
    }
    pub fn cascade(mut self, resolve_related: bool) -> Self {
        self.cascade = resolve_related;
        self
    }
    /// Installs a predicate applied in memory after the fetch, so a filtered
    /// relation may carry fewer records than `limit` even when more matching
    /// rows exist in the store. Has-many only; has-one ignores it.
    pub fn filter(mut self, predicate: impl Fn(&Record) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Arc::new(predicate));
        self
    }

    // accessors used during resolution, with defaults applied
    pub fn target_type(&self) -> &str {
        &self.target_type
    }
    pub fn kind(&self) -> RelationKind {
        self.kind
    }
    pub fn local_key_in(&self, owner_table: &str) -> String {
        match &self.local_key {
            Some(column) => column.clone(),
            None => format!("{}_id", owner_table),
        }
    }
    pub fn foreign_key_column(&self) -> &str {
        self.foreign_key.as_deref().unwrap_or("id")
    }
    pub fn attachment_name(&self) -> String {
        match &self.display_name {
            Some(name) => name.clone(),
            None => self.target_type.to_lowercase(),
        }
    }
    pub fn row_limit(&self) -> i64 {
        self.limit
    }
    pub fn cascades(&self) -> bool {
        self.cascade
    }
    pub fn filter_fn(&self) -> Option<&RelationFilter> {
        self.filter.as_ref()
    }
}

// ------------- Resolver -------------
/// Walks the declared relations of a record, wiring fetched target records
/// into it. One resolver instance covers one resolution pass; its visited
/// set spans the whole recursion.
pub struct Resolver<'a, X: QueryExecutor> {
    registry: &'a TypeRegistry,
    executor: &'a X,
    visited: HashSet<String, RegistryHasher>,
}

impl<'a, X: QueryExecutor> Resolver<'a, X> {
    pub fn new(registry: &'a TypeRegistry, executor: &'a X) -> Self {
        Self {
            registry,
            executor,
            visited: HashSet::default(),
        }
    }

    /// Resolves the relations of `record`, recursing where specs cascade.
    /// The record's own type seeds the visited set so that a relation chain
    /// leading back to it is truncated rather than followed.
    pub fn resolve(&mut self, record: &mut Record) -> Result<ResolutionState> {
        self.visited.insert(record.type_name().to_owned());
        self.resolve_at(record, 0)
    }

    fn resolve_at(&mut self, record: &mut Record, depth: usize) -> Result<ResolutionState> {
        record.set_resolution(ResolutionState::Resolving);
        let mut state = ResolutionState::Resolved;
        let schema = self.registry.schema(record.type_name())?;
        let owner_table = schema.table_name();
        for spec in schema.relations() {
            let local_key = spec.local_key_in(&owner_table);
            // a record without the local key column simply does not take
            // part in this relation
            let Some(value) = record.get(&local_key) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            let value = value.clone();

            let target = spec.target_type();
            let target_schema = self.registry.schema(target)?;
            let fetch_limit = match spec.kind() {
                RelationKind::HasOne => 1,
                RelationKind::HasMany => spec.row_limit(),
            };
            let descriptor = QueryBuilder::select(&target_schema.table_name())
                .filter(spec.foreign_key_column(), value)
                .limit(fetch_limit)
                .build();
            let rows = self.executor.fetch(descriptor)?;
            let mut related = Vec::with_capacity(rows.len());
            for row in &rows {
                related.push(self.registry.record_from_row(target, row)?);
            }
            if spec.kind() == RelationKind::HasMany {
                if let Some(predicate) = spec.filter_fn() {
                    related.retain(|candidate| predicate(candidate));
                }
            }

            let name = spec.attachment_name();
            if spec.cascades() && !related.is_empty() {
                if self.visited.contains(target) {
                    // already on the current path: attach without descending
                    debug!(depth, target, relation = %name, "cascade truncated");
                    state = ResolutionState::PartiallyResolved;
                } else {
                    self.visited.insert(target.to_owned());
                    for child in related.iter_mut() {
                        if self.resolve_at(child, depth + 1)? == ResolutionState::PartiallyResolved
                        {
                            state = ResolutionState::PartiallyResolved;
                        }
                    }
                    self.visited.remove(target);
                }
            }
            debug!(
                depth,
                owner = %record.type_name(),
                relation = %name,
                records = related.len(),
                "relation resolved"
            );
            match spec.kind() {
                RelationKind::HasOne => {
                    // absence of the related row is not an error, the
                    // relation just carries no value; an attachment from an
                    // earlier pass is dropped rather than left stale
                    match related.into_iter().next() {
                        Some(child) => record.attach(&name, Related::One(Box::new(child))),
                        None => record.detach(&name),
                    }
                }
                RelationKind::HasMany => {
                    record.attach(&name, Related::Many(related));
                }
            }
        }
        record.set_resolution(state);
        Ok(state)
    }
}
