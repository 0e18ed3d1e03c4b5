use crate::{Backend, Error, Result, Row, RowSet, Value};
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, Row as _, TypeInfo, ValueRef};
use tokio::runtime::Runtime;

/// Blocking [`Backend`] over a sqlx MySQL pool.
///
/// Statements go through the text protocol unprepared, so the rendered SQL is
/// exactly what the server sees.
///
/// MySQL has no array literal: binding a [`Value::Array`] renders `[1, 2]` or
/// `[ 'a', 'b' ]`, which the server rejects as a syntax error. Bind scalars only.
///
/// ```rust,no_run
/// use literal_bind::mysql::MySqlBackend;
/// use literal_bind::Statement;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MySqlBackend::connect("mysql://localhost/test")?;
///
/// let mut stmt = Statement::new("SELECT id, name FROM users WHERE name = :name");
/// stmt.bind_value("name", "O'Neil")?;
/// stmt.execute(&backend)?;
/// for row in stmt.fetch_all()? {
///     println!("{:?}", row);
/// }
/// # Ok(())
/// # }
/// ```
pub struct MySqlBackend {
    pool: MySqlPool,
    runtime: Runtime,
}

impl MySqlBackend {
    /// Connects a new pool on a runtime owned by the backend.
    pub fn connect(url: &str) -> Result<Self> {
        let runtime = new_runtime()?;
        let pool = runtime.block_on(MySqlPoolOptions::new().connect(url))?;
        Ok(Self { pool, runtime })
    }

    /// Wraps an existing pool. Must not be called from inside an async context.
    pub fn from_pool(pool: MySqlPool) -> Result<Self> {
        Ok(Self {
            pool,
            runtime: new_runtime()?,
        })
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

fn new_runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(Error::execution)
}

impl Backend for MySqlBackend {
    fn run_query(&self, sql: &str) -> Result<RowSet> {
        let rows = self
            .runtime
            .block_on(sqlx::raw_sql(sql).fetch_all(&self.pool))?;
        rows.iter().map(decode_row).collect()
    }

    fn run_command(&self, sql: &str) -> Result<RowSet> {
        let result = self
            .runtime
            .block_on(sqlx::raw_sql(sql).execute(&self.pool))?;
        log::debug!("{} rows affected", result.rows_affected());
        Ok(Vec::new())
    }

    fn quote_literal(&self, value: &str) -> String {
        quote_mysql(value)
    }
}

fn decode_row(row: &MySqlRow) -> Result<Row> {
    let mut decoded = Row::new();
    for column in row.columns() {
        let i = column.ordinal();
        let value = if row.try_get_raw(i)?.is_null() {
            Value::Null
        } else {
            match column.type_info().name() {
                "BOOLEAN" => Value::Bool(row.try_get(i)?),
                "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
                    Value::Int(row.try_get(i)?)
                }
                "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED"
                | "INT UNSIGNED" | "BIGINT UNSIGNED" => unsigned_value(row.try_get(i)?),
                "FLOAT" | "DOUBLE" => Value::Float(row.try_get(i)?),
                _ => {
                    let bytes: Vec<u8> = row.try_get_unchecked(i)?;
                    Value::String(String::from_utf8_lossy(&bytes).into_owned())
                }
            }
        };
        decoded.push(column.name(), value);
    }
    Ok(decoded)
}

/// Unsigned values beyond `i64` come back as their decimal text.
fn unsigned_value(value: u64) -> Value {
    i64::try_from(value).map_or_else(|_| Value::String(value.to_string()), Value::Int)
}

/// MySQL string literal, escaped like `mysql_real_escape_string`.
fn quote_mysql(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\0' => out.push_str("\\0"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x1a' => out.push_str("\\Z"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}
