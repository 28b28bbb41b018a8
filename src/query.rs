// used to print out readable forms of a descriptor
use std::fmt;

use crate::scalar::Scalar;

// ------------- QueryKind -------------
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum QueryKind {
    Select,
    Insert,
    Update,
    Delete,
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            QueryKind::Select => "select",
            QueryKind::Insert => "insert",
            QueryKind::Update => "update",
            QueryKind::Delete => "delete",
        };
        write!(f, "{}", name)
    }
}

// ------------- Condition -------------
/// Column equality pairs, optionally extended with one raw SQL fragment.
/// All pairs and the fragment are conjoined when the executor renders them.
#[derive(Clone, Debug, Default)]
pub struct Condition {
    pairs: Vec<(String, Scalar)>,
    fragment: Option<String>,
}

impl Condition {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn equals(mut self, column: &str, value: impl Into<Scalar>) -> Self {
        self.pairs.push((column.to_owned(), value.into()));
        self
    }
    pub fn fragment(mut self, sql: &str) -> Self {
        self.fragment = Some(sql.to_owned());
        self
    }
    pub fn pairs(&self) -> &[(String, Scalar)] {
        &self.pairs
    }
    pub fn raw_fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty() && self.fragment.is_none()
    }
}

// ------------- Order -------------
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Clone, Debug)]
pub struct Order {
    column: String,
    direction: Direction,
}

impl Order {
    pub fn column(&self) -> &str {
        &self.column
    }
    pub fn direction(&self) -> Direction {
        self.direction
    }
}

// ------------- QueryDescriptor -------------
/// A finished description of one statement. Immutable once built and handed
/// to the executor by value, so a descriptor runs at most once.
#[derive(Debug)]
pub struct QueryDescriptor {
    kind: QueryKind,
    table: String,
    assignments: Vec<(String, Scalar)>,
    condition: Condition,
    order: Vec<Order>,
    limit: Option<i64>,
}

impl QueryDescriptor {
    pub fn kind(&self) -> QueryKind {
        self.kind
    }
    pub fn table(&self) -> &str {
        &self.table
    }
    pub fn assignments(&self) -> &[(String, Scalar)] {
        &self.assignments
    }
    pub fn condition(&self) -> &Condition {
        &self.condition
    }
    pub fn order(&self) -> &[Order] {
        &self.order
    }
    pub fn limit(&self) -> Option<i64> {
        self.limit
    }
}

// ------------- QueryBuilder -------------
/// Fluent construction of a [`QueryDescriptor`]. Every method takes the
/// builder by value and `build` consumes it, so a half-built descriptor can
/// never be observed and a built one can never be extended.
///
/// The builder performs no validation and touches no storage; descriptors
/// that make no sense for their kind (an insert without assignments, say)
/// are rejected by the executor.
pub struct QueryBuilder {
    descriptor: QueryDescriptor,
}

impl QueryBuilder {
    fn new(kind: QueryKind, table: &str) -> Self {
        Self {
            descriptor: QueryDescriptor {
                kind,
                table: table.to_owned(),
                assignments: Vec::new(),
                condition: Condition::new(),
                order: Vec::new(),
                limit: None,
            },
        }
    }
    pub fn select(table: &str) -> Self {
        Self::new(QueryKind::Select, table)
    }
    pub fn insert(table: &str) -> Self {
        Self::new(QueryKind::Insert, table)
    }
    pub fn update(table: &str) -> Self {
        Self::new(QueryKind::Update, table)
    }
    pub fn delete(table: &str) -> Self {
        Self::new(QueryKind::Delete, table)
    }
    /// Adds one column assignment (insert and update kinds).
    pub fn set(mut self, column: &str, value: impl Into<Scalar>) -> Self {
        self.descriptor
            .assignments
            .push((column.to_owned(), value.into()));
        self
    }
    /// Adds one equality constraint to the condition.
    pub fn filter(mut self, column: &str, value: impl Into<Scalar>) -> Self {
        self.descriptor.condition = self.descriptor.condition.equals(column, value);
        self
    }
    /// Installs a raw SQL fragment into the condition, conjoined with any
    /// equality constraints. The fragment is trusted as written.
    pub fn raw(mut self, fragment: &str) -> Self {
        self.descriptor.condition = self.descriptor.condition.fragment(fragment);
        self
    }
    /// Replaces the whole condition with a prepared one.
    pub fn matching(mut self, condition: Condition) -> Self {
        self.descriptor.condition = condition;
        self
    }
    pub fn order_by(mut self, column: &str, direction: Direction) -> Self {
        self.descriptor.order.push(Order {
            column: column.to_owned(),
            direction,
        });
        self
    }
    /// Caps the number of rows. A negative cap means unbounded, which is
    /// also the default.
    pub fn limit(mut self, rows: i64) -> Self {
        self.descriptor.limit = if rows < 0 { None } else { Some(rows) };
        self
    }
    pub fn build(self) -> QueryDescriptor {
        self.descriptor
    }
}
