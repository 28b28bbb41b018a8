// used for the storage collaborator
use rusqlite::{Connection, params_from_iter};

use std::time::Instant;

use tracing::debug;

use crate::error::{Result, RowloomError};
use crate::query::{Condition, Direction, QueryDescriptor, QueryKind};
use crate::scalar::Scalar;

// ------------- Row -------------
/// One fetched row: column names paired with values, in select order.
/// Values carry the widest kinds the store distinguishes; narrowing to the
/// declared kinds happens on the registry side.
#[derive(Clone, Debug)]
pub struct Row {
    columns: Vec<(String, Scalar)>,
}

impl Row {
    pub fn new(columns: Vec<(String, Scalar)>) -> Self {
        Self { columns }
    }
    pub fn get(&self, column: &str) -> Option<&Scalar> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }
    pub fn columns(&self) -> &[(String, Scalar)] {
        &self.columns
    }
    pub fn len(&self) -> usize {
        self.columns.len()
    }
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

// ------------- Acknowledgment -------------
/// What the store reports back for a mutation. `inserted_key` is only
/// populated for inserts, carrying the store-assigned key of the new row.
#[derive(Clone, Copy, Debug)]
pub struct Acknowledgment {
    pub rows_affected: usize,
    pub inserted_key: Option<i64>,
}

// ------------- QueryExecutor -------------
/// The storage collaborator contract. Descriptors arrive by value and are
/// consumed; `fetch` serves selects, `execute` serves mutations, and handing
/// a descriptor to the wrong side is a store execution error. All calls
/// block until the store answers.
pub trait QueryExecutor {
    fn fetch(&self, descriptor: QueryDescriptor) -> Result<Vec<Row>>;
    fn execute(&self, descriptor: QueryDescriptor) -> Result<Acknowledgment>;
}

// ------------- SqliteExecutor -------------
/// Faithful [`QueryExecutor`] over a SQLite database. Rendered statement
/// text is deterministic (assignment and condition columns sort by name) so
/// the prepared statement cache actually gets hits.
pub struct SqliteExecutor {
    connection: Connection,
}

impl SqliteExecutor {
    pub fn open(path: &str) -> Result<Self> {
        let connection = Connection::open(path)?;
        connection.execute_batch("pragma journal_mode = wal;")?;
        Self::configure(connection)
    }
    pub fn in_memory() -> Result<Self> {
        Self::configure(Connection::open_in_memory()?)
    }
    fn configure(connection: Connection) -> Result<Self> {
        connection.execute_batch("pragma foreign_keys = on;")?;
        Ok(Self { connection })
    }
    /// The underlying connection, for schema setup and direct inspection.
    pub fn connection(&self) -> &Connection {
        &self.connection
    }
}

impl QueryExecutor for SqliteExecutor {
    fn fetch(&self, descriptor: QueryDescriptor) -> Result<Vec<Row>> {
        if descriptor.kind() != QueryKind::Select {
            return Err(RowloomError::StoreExecution(format!(
                "fetch takes select descriptors, got {}",
                descriptor.kind()
            )));
        }
        let started = Instant::now();
        let (sql, values) = render_select(&descriptor);
        let mut statement = self.connection.prepare_cached(&sql)?;
        let column_names: Vec<String> = statement
            .column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        let mut rows = statement.query(params_from_iter(values))?;
        let mut fetched = Vec::new();
        while let Some(row) = rows.next()? {
            let mut columns = Vec::with_capacity(column_names.len());
            for (index, name) in column_names.iter().enumerate() {
                columns.push((name.clone(), Scalar::from_sql(row.get_ref(index)?)?));
            }
            fetched.push(Row::new(columns));
        }
        debug!(
            ms = started.elapsed().as_secs_f64() * 1000.0,
            rows = fetched.len(),
            %sql,
            "fetch complete"
        );
        Ok(fetched)
    }

    fn execute(&self, descriptor: QueryDescriptor) -> Result<Acknowledgment> {
        let started = Instant::now();
        let (sql, values) = match descriptor.kind() {
            QueryKind::Select => {
                return Err(RowloomError::StoreExecution(
                    "execute takes mutation descriptors, got select".to_owned(),
                ));
            }
            QueryKind::Insert => render_insert(&descriptor)?,
            QueryKind::Update => render_update(&descriptor)?,
            QueryKind::Delete => render_delete(&descriptor),
        };
        let mut statement = self.connection.prepare_cached(&sql)?;
        let rows_affected = statement.execute(params_from_iter(values))?;
        let inserted_key = (descriptor.kind() == QueryKind::Insert)
            .then(|| self.connection.last_insert_rowid());
        debug!(
            ms = started.elapsed().as_secs_f64() * 1000.0,
            rows_affected,
            %sql,
            "execute complete"
        );
        Ok(Acknowledgment {
            rows_affected,
            inserted_key,
        })
    }
}

// ------------- Statement rendering -------------
fn quoted(identifier: &str) -> String {
    format!("\"{}\"", identifier)
}

fn sorted_pairs(pairs: &[(String, Scalar)]) -> Vec<&(String, Scalar)> {
    let mut sorted: Vec<&(String, Scalar)> = pairs.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    sorted
}

fn render_condition<'a>(condition: &'a Condition, sql: &mut String, values: &mut Vec<&'a Scalar>) {
    if condition.is_empty() {
        return;
    }
    sql.push_str(" where ");
    let mut first = true;
    for (column, value) in sorted_pairs(condition.pairs()) {
        if !first {
            sql.push_str(" and ");
        }
        sql.push_str(&quoted(column));
        sql.push_str(" = ?");
        values.push(value);
        first = false;
    }
    if let Some(fragment) = condition.raw_fragment() {
        if !first {
            sql.push_str(" and ");
        }
        sql.push('(');
        sql.push_str(fragment);
        sql.push(')');
    }
}

fn render_select(descriptor: &QueryDescriptor) -> (String, Vec<&Scalar>) {
    let mut sql = format!("select * from {}", quoted(descriptor.table()));
    let mut values = Vec::new();
    render_condition(descriptor.condition(), &mut sql, &mut values);
    if !descriptor.order().is_empty() {
        sql.push_str(" order by ");
        for (index, order) in descriptor.order().iter().enumerate() {
            if index > 0 {
                sql.push_str(", ");
            }
            sql.push_str(&quoted(order.column()));
            sql.push_str(match order.direction() {
                Direction::Ascending => " asc",
                Direction::Descending => " desc",
            });
        }
    }
    if let Some(limit) = descriptor.limit() {
        sql.push_str(&format!(" limit {}", limit));
    }
    (sql, values)
}

fn render_insert(descriptor: &QueryDescriptor) -> Result<(String, Vec<&Scalar>)> {
    if descriptor.assignments().is_empty() {
        return Err(RowloomError::StoreExecution(format!(
            "insert into '{}' carries no assignments",
            descriptor.table()
        )));
    }
    let assignments = sorted_pairs(descriptor.assignments());
    let columns: Vec<String> = assignments
        .iter()
        .map(|(column, _)| quoted(column))
        .collect();
    let placeholders = vec!["?"; assignments.len()];
    let sql = format!(
        "insert into {} ({}) values ({})",
        quoted(descriptor.table()),
        columns.join(", "),
        placeholders.join(", ")
    );
    let values = assignments.into_iter().map(|(_, value)| value).collect();
    Ok((sql, values))
}

fn render_update(descriptor: &QueryDescriptor) -> Result<(String, Vec<&Scalar>)> {
    if descriptor.assignments().is_empty() {
        return Err(RowloomError::StoreExecution(format!(
            "update of '{}' carries no assignments",
            descriptor.table()
        )));
    }
    let mut sql = format!("update {} set ", quoted(descriptor.table()));
    let mut values = Vec::new();
    for (index, (column, value)) in sorted_pairs(descriptor.assignments()).iter().enumerate() {
        if index > 0 {
            sql.push_str(", ");
        }
        sql.push_str(&quoted(column));
        sql.push_str(" = ?");
        values.push(value);
    }
    render_condition(descriptor.condition(), &mut sql, &mut values);
    Ok((sql, values))
}

fn render_delete(descriptor: &QueryDescriptor) -> (String, Vec<&Scalar>) {
    let mut sql = format!("delete from {}", quoted(descriptor.table()));
    let mut values = Vec::new();
    render_condition(descriptor.condition(), &mut sql, &mut values);
    (sql, values)
}
