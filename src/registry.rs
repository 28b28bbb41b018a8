use std::any::Any;
use std::sync::Arc;

// registries use HashMap keyed by type name
use core::hash::BuildHasherDefault;
use std::collections::HashMap;
use seahash::SeaHasher;

// our own stuff that we need
use crate::error::{Result, RowloomError};
use crate::executor::Row;
use crate::inflect;
use crate::record::Record;
use crate::relation::RelationSpec;
use crate::scalar::{Scalar, ScalarKind};

// type names are hashed often enough to warrant the fast hasher
pub type RegistryHasher = BuildHasherDefault<SeaHasher>;

// ------------- ConstructorShape -------------
/// One way of building a type: an ordered parameter list plus the closure
/// that turns coerced arguments into a value. Shapes are selected by arity
/// alone, so a type registering two shapes of the same arity renders that
/// arity unusable (the registry fails closed rather than guessing).
pub struct ConstructorShape {
    parameters: Vec<ScalarKind>,
    construct: Box<dyn Fn(Vec<Scalar>) -> Box<dyn Any> + Send + Sync>,
}

impl ConstructorShape {
    pub fn new(
        parameters: Vec<ScalarKind>,
        construct: impl Fn(Vec<Scalar>) -> Box<dyn Any> + Send + Sync + 'static,
    ) -> Self {
        Self {
            parameters,
            construct: Box::new(construct),
        }
    }
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }
    pub fn parameters(&self) -> &[ScalarKind] {
        &self.parameters
    }
    fn build(&self, values: Vec<Scalar>) -> Box<dyn Any> {
        (self.construct)(values)
    }
}

// ------------- RecordSchema -------------
/// Hook run on every record instantiated from stored data.
pub type InstanceHook = Arc<dyn Fn(&mut Record) + Send + Sync>;

/// Static description of a record type: where it lives, which column keys
/// it, the declared columns in order, and its relations. Built fluently and
/// registered once.
pub struct RecordSchema {
    name: String,
    table: Option<String>,
    primary_key: String,
    columns: Vec<(String, ScalarKind)>,
    relations: Vec<RelationSpec>,
    on_instance: Option<InstanceHook>,
}

impl RecordSchema {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            table: None,
            primary_key: String::from("id"),
            columns: Vec::new(),
            relations: Vec::new(),
            on_instance: None,
        }
    }
    /// Overrides the conventional table name.
    pub fn table(mut self, table: &str) -> Self {
        self.table = Some(table.to_owned());
        self
    }
    pub fn primary_key(mut self, column: &str) -> Self {
        self.primary_key = column.to_owned();
        self
    }
    pub fn column(mut self, name: &str, kind: ScalarKind) -> Self {
        self.columns.push((name.to_owned(), kind));
        self
    }
    pub fn relation(mut self, spec: RelationSpec) -> Self {
        self.relations.push(spec);
        self
    }
    pub fn on_instance(mut self, hook: impl Fn(&mut Record) + Send + Sync + 'static) -> Self {
        self.on_instance = Some(Arc::new(hook));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    /// The explicit table override, or the conventional name.
    pub fn table_name(&self) -> String {
        match &self.table {
            Some(table) => table.clone(),
            None => inflect::table_name(&self.name),
        }
    }
    pub fn primary_key_column(&self) -> &str {
        &self.primary_key
    }
    pub fn columns(&self) -> &[(String, ScalarKind)] {
        &self.columns
    }
    pub fn column_kind(&self, name: &str) -> Option<ScalarKind> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, kind)| *kind)
    }
    pub fn relations(&self) -> &[RelationSpec] {
        &self.relations
    }
    pub fn run_instance_hook(&self, record: &mut Record) {
        if let Some(hook) = &self.on_instance {
            hook(record);
        }
    }
}

// ------------- TypeEntry -------------
pub struct TypeEntry {
    name: String,
    shapes: Vec<ConstructorShape>,
    schema: Option<RecordSchema>,
}

impl TypeEntry {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            shapes: Vec::new(),
            schema: None,
        }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn shapes(&self) -> &[ConstructorShape] {
        &self.shapes
    }
    pub fn schema(&self) -> Option<&RecordSchema> {
        self.schema.as_ref()
    }
}

// ------------- TypeRegistry -------------
/// The registry of everything instantiable: constructor shapes for arbitrary
/// types, and record schemas for the types that live in the store. Lookups
/// are by type name.
pub struct TypeRegistry {
    entries: HashMap<String, TypeEntry, RegistryHasher>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self {
            entries: HashMap::default(),
        }
    }

    /// Registers one constructor shape under a type name. Any type can take
    /// part, record or not.
    pub fn register_shape(&mut self, type_name: &str, shape: ConstructorShape) {
        self.entries
            .entry(type_name.to_owned())
            .or_insert_with(|| TypeEntry::new(type_name))
            .shapes
            .push(shape);
    }

    /// Registers a record schema, deriving a constructor shape from its
    /// declared columns so the type is also buildable through
    /// [`TypeRegistry::instantiate`]. Records built that way count as stored
    /// data and run the schema's instance hook.
    pub fn register_record(&mut self, schema: RecordSchema) {
        let type_name = schema.name().to_owned();
        let parameters: Vec<ScalarKind> = schema.columns().iter().map(|(_, kind)| *kind).collect();
        let columns: Vec<String> = schema
            .columns()
            .iter()
            .map(|(column, _)| column.clone())
            .collect();
        let hook = schema.on_instance.clone();
        let shape_type = type_name.clone();
        let shape = ConstructorShape::new(parameters, move |values| {
            let mut record = Record::stored(&shape_type);
            for (column, value) in columns.iter().zip(values) {
                record.set(column, value);
            }
            if let Some(hook) = &hook {
                hook(&mut record);
            }
            Box::new(record)
        });
        self.register_shape(&type_name, shape);
        if let Some(entry) = self.entries.get_mut(&type_name) {
            entry.schema = Some(schema);
        }
    }

    /// Builds an instance of `type_name` from ordered textual arguments.
    ///
    /// Shape selection is by arity: no shape with a matching parameter count
    /// is [`RowloomError::NoMatchingConstructor`], more than one is
    /// [`RowloomError::AmbiguousConstructor`]. Each argument is then coerced
    /// to its parameter kind per the fixed table; the first failure aborts
    /// with the argument's position in the error.
    pub fn instantiate(&self, type_name: &str, arguments: &[&str]) -> Result<Box<dyn Any>> {
        let entry = self.entries.get(type_name).ok_or_else(|| {
            RowloomError::NotFound(format!("no type registered under '{}'", type_name))
        })?;
        let arity = arguments.len();
        let mut matching = entry.shapes.iter().filter(|shape| shape.arity() == arity);
        let shape = match (matching.next(), matching.next()) {
            (Some(only), None) => only,
            (Some(_), Some(_)) => {
                return Err(RowloomError::AmbiguousConstructor {
                    type_name: type_name.to_owned(),
                    arity,
                });
            }
            (None, _) => {
                return Err(RowloomError::NoMatchingConstructor {
                    type_name: type_name.to_owned(),
                    arity,
                });
            }
        };
        let mut values = Vec::with_capacity(arity);
        for (index, (kind, raw)) in shape.parameters().iter().zip(arguments).enumerate() {
            values.push(kind.coerce(index, raw)?);
        }
        Ok(shape.build(values))
    }

    /// The record schema of a type, or [`RowloomError::NotFound`] when the
    /// type is unregistered or registered without one.
    pub fn schema(&self, type_name: &str) -> Result<&RecordSchema> {
        self.entries
            .get(type_name)
            .and_then(|entry| entry.schema())
            .ok_or_else(|| {
                RowloomError::NotFound(format!(
                    "no record schema registered for type '{}'",
                    type_name
                ))
            })
    }

    /// Turns one fetched row into a record, walking the schema's declared
    /// column order. Columns the row does not carry become null; values the
    /// row does carry are narrowed to their declared kinds. Runs the
    /// schema's instance hook last.
    pub fn record_from_row(&self, type_name: &str, row: &Row) -> Result<Record> {
        let schema = self.schema(type_name)?;
        let mut record = Record::stored(type_name);
        for (column, kind) in schema.columns() {
            let value = match row.get(column) {
                Some(stored) => kind.refit(stored.clone()).map_err(|e| match e {
                    RowloomError::StoreExecution(msg) => {
                        RowloomError::StoreExecution(format!("column '{}': {}", column, msg))
                    }
                    other => other,
                })?,
                None => Scalar::Null,
            };
            record.set(column, value);
        }
        schema.run_instance_hook(&mut record);
        Ok(record)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
