// pooled listings database over sqlx any (postgres, sqlite, mysql)

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{AnyPool, Column, Row, ValueRef};

use crate::Error;

const POOL_SIZE: u32 = 5;

pub struct Db {
    pool: AnyPool,
    dialect: Dialect,
    database: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
    Mysql,
}

impl Dialect {
    /// Guess from the url scheme; anything unrecognised is sqlite.
    pub fn from_url(url: &str) -> Self {
        match url.split(':').next().unwrap_or_default() {
            "postgres" | "postgresql" => Dialect::Postgres,
            "mysql" | "mariadb" => Dialect::Mysql,
            _ => Dialect::Sqlite,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Dialect::Postgres => "PostgreSQL",
            Dialect::Sqlite => "SQLite",
            Dialect::Mysql => "MySQL",
        }
    }

    // (table, column, type) rows; sqlite has no information_schema
    fn columns_query(self) -> Option<&'static str> {
        match self {
            Dialect::Postgres => Some(
                r#"SELECT table_name::text, column_name::text, data_type::text
                   FROM information_schema.columns
                   WHERE table_schema = 'public'
                   ORDER BY table_name, ordinal_position"#,
            ),
            Dialect::Mysql => Some(
                r#"SELECT table_name, column_name, data_type
                   FROM information_schema.columns
                   WHERE table_schema = DATABASE()
                   ORDER BY table_name, ordinal_position"#,
            ),
            Dialect::Sqlite => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub row_count: usize,
}

impl QueryResult {
    fn from_rows(rows: &[AnyRow]) -> Self {
        let Some(first) = rows.first() else {
            return Self::default();
        };

        let columns: Vec<String> = first
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        let rows: Vec<Vec<Value>> = rows
            .iter()
            .map(|row| (0..columns.len()).map(|i| cell(row, i)).collect())
            .collect();

        Self {
            row_count: rows.len(),
            columns,
            rows,
        }
    }

    /// Keep the first `max` rows; true when some were dropped.
    pub fn truncate(&mut self, max: usize) -> bool {
        if self.rows.len() <= max {
            return false;
        }
        self.rows.truncate(max);
        self.row_count = self.rows.len();
        true
    }

    /// Index of a column, ignoring case.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.eq_ignore_ascii_case(name))
    }
}

impl Db {
    pub async fn connect(url: &str) -> Result<Self, Error> {
        sqlx::any::install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(POOL_SIZE)
            .connect(url)
            .await?;

        Ok(Self {
            pool,
            dialect: Dialect::from_url(url),
            database: database_name(url),
        })
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn dialect_name(&self) -> &'static str {
        self.dialect.name()
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    /// Tables and columns as text the model can read.
    pub async fn schema(&self) -> Result<String, Error> {
        let columns = match self.dialect.columns_query() {
            Some(sql) => sqlx::query_as(sql).fetch_all(&self.pool).await?,
            None => self.sqlite_columns().await?,
        };
        Ok(format_schema(columns))
    }

    async fn sqlite_columns(&self) -> Result<Vec<(String, String, String)>, Error> {
        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut columns = Vec::new();
        for table in tables {
            let sql = format!(
                "SELECT name, type FROM pragma_table_info('{}') ORDER BY cid",
                table.replace('\'', "''")
            );
            let cols: Vec<(String, String)> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
            columns.extend(cols.into_iter().map(|(name, ty)| (table.clone(), name, ty)));
        }
        Ok(columns)
    }

    pub async fn execute(&self, sql: &str) -> Result<QueryResult, Error> {
        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;
        Ok(QueryResult::from_rows(&rows))
    }
}

// "dubai" for postgres://h/dubai?ssl=1, the file name for sqlite
fn database_name(url: &str) -> String {
    let path = url.split('?').next().unwrap_or(url);
    let rest = path.split_once("://").map_or(path, |(_, r)| r);

    match rest.rsplit('/').next() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => "memory".to_string(),
    }
}

fn format_schema(columns: Vec<(String, String, String)>) -> String {
    let mut tables: Vec<(String, Vec<String>)> = Vec::new();

    for (table, column, ty) in columns {
        let line = format!("  {column} {ty}");
        let same_table = tables.last().is_some_and(|(name, _)| *name == table);
        match tables.last_mut() {
            Some((_, lines)) if same_table => lines.push(line),
            _ => tables.push((table, vec![line])),
        }
    }

    tables
        .into_iter()
        .map(|(name, lines)| format!("TABLE {name} (\n{}\n)", lines.join("\n")))
        .collect::<Vec<_>>()
        .join("\n\n")
}

// types the any driver can't decode (numeric, dates) come back as a marker
fn cell(row: &AnyRow, i: usize) -> Value {
    match row.try_get_raw(i) {
        Ok(raw) if !raw.is_null() => {}
        _ => return Value::Null,
    }

    row.try_get::<String, _>(i)
        .map(Value::String)
        .or_else(|_| row.try_get::<i64, _>(i).map(Value::from))
        .or_else(|_| row.try_get::<i32, _>(i).map(Value::from))
        .or_else(|_| {
            row.try_get::<f64, _>(i)
                .map(|f| serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number))
        })
        .or_else(|_| row.try_get::<bool, _>(i).map(Value::Bool))
        .unwrap_or_else(|_| Value::String("<unsupported>".to_string()))
}
