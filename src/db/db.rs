use crate::libs::config::Config;
use crate::libs::data_storage::DataStorage;
use crate::msg_debug;
use crate::orm::error::Result;
use crate::orm::sql::{Dialect, Statement};
use crate::orm::value::Value;
use parking_lot::Mutex;
use rusqlite::{params_from_iter, Connection};
use std::path::Path;

pub const DB_FILE_NAME: &str = "microrm.db";
pub const IN_MEMORY: &str = ":memory:";

/// One result row: column names paired with owned values, in select order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.push(name, value.into());
        self
    }

    pub fn push(&mut self, name: &str, value: Value) {
        self.columns.push((name.to_string(), value));
    }

    /// Looks a column up by name; SQL identifiers compare case-insensitively.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns.iter().find(|(column, _)| column.eq_ignore_ascii_case(name)).map(|(_, value)| value)
    }

    pub fn value_at(&self, index: usize) -> Option<&Value> {
        self.columns.get(index).map(|(_, value)| value)
    }
}

/// Runs compiled statements against a database.
pub trait Executor {
    /// Runs a statement for its side effect and returns the affected row count.
    fn execute(&self, statement: &Statement) -> Result<usize>;

    /// Runs a statement and returns every row it produced.
    fn query(&self, statement: &Statement) -> Result<Vec<Row>>;

    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }
}

impl<E: Executor + ?Sized> Executor for &E {
    fn execute(&self, statement: &Statement) -> Result<usize> {
        (**self).execute(statement)
    }

    fn query(&self, statement: &Statement) -> Result<Vec<Row>> {
        (**self).query(statement)
    }

    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }
}

/// SQLite-backed executor.
pub struct Db {
    conn: Mutex<Connection>,
}

impl Db {
    /// Opens the database named by `config`.
    pub fn open(config: &Config) -> anyhow::Result<Db> {
        let conn = if config.database == IN_MEMORY {
            Connection::open_in_memory()?
        } else if Path::new(&config.database).is_absolute() {
            Connection::open(&config.database)?
        } else {
            Connection::open(DataStorage::new().get_path(&config.database)?)?
        };

        if config.foreign_keys {
            conn.pragma_update(None, "foreign_keys", true)?;
        }
        msg_debug!(format!("Opened database {}", config.database));

        Ok(Db { conn: Mutex::new(conn) })
    }

    pub fn open_in_memory() -> Result<Db> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(Db { conn: Mutex::new(conn) })
    }
}

impl Executor for Db {
    fn execute(&self, statement: &Statement) -> Result<usize> {
        msg_debug!(statement);
        let conn = self.conn.lock();
        let mut prepared = conn.prepare(statement.sql())?;

        // Statements with RETURNING produce rows that must be stepped through.
        if prepared.column_count() > 0 {
            let mut rows = prepared.query(params_from_iter(statement.params()))?;
            let mut affected = 0;
            while rows.next()?.is_some() {
                affected += 1;
            }
            return Ok(affected);
        }

        Ok(prepared.execute(params_from_iter(statement.params()))?)
    }

    fn query(&self, statement: &Statement) -> Result<Vec<Row>> {
        msg_debug!(statement);
        let conn = self.conn.lock();
        let mut prepared = conn.prepare(statement.sql())?;
        let names: Vec<String> = prepared.column_names().into_iter().map(String::from).collect();

        let mut rows = prepared.query(params_from_iter(statement.params()))?;
        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            let mut mapped = Row::new();
            for (index, name) in names.iter().enumerate() {
                mapped.push(name, Value::from_sql_ref(row.get_ref(index)?)?);
            }
            result.push(mapped);
        }

        Ok(result)
    }
}
