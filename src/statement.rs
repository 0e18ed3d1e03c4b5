use crate::backend::{Backend, BackendQuoter};
use crate::builder::{build_query, Bindings};
use crate::fetch::{project, FetchMode, Fetched};
use crate::{Error, FromRow, Key, ParamType, Result, Row, RowSet, Value};
use std::cell::RefCell;
use std::fmt::{self, Display, Formatter};
use std::rc::Rc;

/// Execution path of a rendered statement, chosen by its leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// `SELECT`, `SHOW` and `DESCRIBE`: rows are expected back
    Read,
    /// Everything else
    Write,
}

impl StatementKind {
    /// Classifies `sql` by its first keyword, ignoring case and leading whitespace.
    pub fn classify(sql: &str) -> Self {
        let sql = sql.trim_start();
        let end = sql
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(sql.len());
        let keyword = &sql[..end];
        if ["select", "show", "describe"]
            .iter()
            .any(|k| keyword.eq_ignore_ascii_case(k))
        {
            StatementKind::Read
        } else {
            StatementKind::Write
        }
    }
}

impl Display for StatementKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StatementKind::Read => "query",
            StatementKind::Write => "command",
        })
    }
}

/// Rows of the last execution together with the read position into them.
#[derive(Debug)]
struct ResultSet {
    kind: StatementKind,
    rows: RowSet,
    position: usize,
}

/// An emulated prepared statement.
///
/// The template keeps its placeholders; bound values are rendered into literal
/// SQL on every [`execute`](Statement::execute) and the resulting rows are read
/// back through a forward-only cursor. Bindings persist across executions.
///
/// A statement is meant for one caller at a time: it owns mutable bindings, rows
/// and cursor state.
///
/// # Examples
///
/// ```
/// use literal_bind::{Backend, FetchMode, Result, Row, RowSet, Statement, Value};
///
/// struct Echo;
///
/// impl Backend for Echo {
///     fn run_query(&self, sql: &str) -> Result<RowSet> {
///         Ok(vec![[("sql", Value::from(sql))].into_iter().collect::<Row>()])
///     }
///
///     fn run_command(&self, _sql: &str) -> Result<RowSet> {
///         Ok(Vec::new())
///     }
/// }
///
/// let mut stmt = Statement::new("SELECT * FROM users WHERE id = :id AND name = :name");
/// stmt.bind_value("id", 42)?.bind_value("name", "Ann")?;
/// stmt.execute(&Echo)?;
///
/// let row = stmt.fetch_with(FetchMode::Numeric)?.and_then(|f| f.into_numeric());
/// assert_eq!(
///     row,
///     Some(vec![Value::from("SELECT * FROM users WHERE id = 42 AND name = 'Ann'")])
/// );
/// assert!(stmt.fetch()?.is_none());
/// # Ok::<(), literal_bind::Error>(())
/// ```
#[derive(Debug)]
pub struct Statement {
    sql: String,
    bindings: Bindings,
    fetch_mode: FetchMode,
    result: Option<ResultSet>,
}

impl Statement {
    /// Creates a statement from an SQL template with `?` or `:name` placeholders.
    pub fn new<T>(template: T) -> Self
    where
        T: Into<String>,
    {
        Self {
            sql: template.into(),
            bindings: Bindings::new(),
            fetch_mode: FetchMode::default(),
            result: None,
        }
    }

    /// Sets the default fetch mode at construction.
    pub fn with_fetch_mode(mut self, mode: FetchMode) -> Self {
        self.fetch_mode = mode;
        self
    }

    /// The original template, never the rendered SQL.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Binds a value with an inferred type.
    pub fn bind_value(
        &mut self,
        key: impl Into<Key>,
        value: impl Into<Value>,
    ) -> Result<&mut Self> {
        self.bindings.insert(key.into(), value.into(), None)?;
        Ok(self)
    }

    /// Binds a value with a declared type, which overrides inference.
    pub fn bind_value_as(
        &mut self,
        key: impl Into<Key>,
        value: impl Into<Value>,
        ty: ParamType,
    ) -> Result<&mut Self> {
        self.bindings.insert(key.into(), value.into(), Some(ty))?;
        Ok(self)
    }

    /// Binds an accessor whose result is read once per execution.
    pub fn bind_param<F, V>(&mut self, key: impl Into<Key>, accessor: F) -> Result<&mut Self>
    where
        F: Fn() -> V + 'static,
        V: Into<Value>,
    {
        self.bindings
            .insert_deferred(key.into(), move || accessor().into(), None)?;
        Ok(self)
    }

    /// Binds an accessor with a declared type.
    pub fn bind_param_as<F, V>(
        &mut self,
        key: impl Into<Key>,
        accessor: F,
        ty: ParamType,
    ) -> Result<&mut Self>
    where
        F: Fn() -> V + 'static,
        V: Into<Value>,
    {
        self.bindings
            .insert_deferred(key.into(), move || accessor().into(), Some(ty))?;
        Ok(self)
    }

    /// Binds a shared cell; its content at execute time is what gets rendered.
    pub fn bind_param_cell<V>(
        &mut self,
        key: impl Into<Key>,
        cell: Rc<RefCell<V>>,
    ) -> Result<&mut Self>
    where
        V: Clone + Into<Value> + 'static,
    {
        self.bind_param(key, move || cell.borrow().clone())
    }

    /// Renders the template with the current bindings and runs it.
    ///
    /// On failure the rows and cursor of the previous execution are left as they were.
    pub fn execute<B>(&mut self, backend: &B) -> Result<()>
    where
        B: Backend + ?Sized,
    {
        let sql = build_query(&self.sql, &self.bindings, &BackendQuoter(backend))?;
        let kind = StatementKind::classify(&sql);
        log::debug!("Running {}: {}", kind, sql);
        let rows = match kind {
            StatementKind::Read => backend.run_query(&sql),
            StatementKind::Write => backend.run_command(&sql),
        }
        .inspect_err(|e| log::error!("{:#}", e))?;
        log::trace!("Cursor reset over {} rows", rows.len());
        self.result = Some(ResultSet {
            kind,
            rows,
            position: 0,
        });
        Ok(())
    }

    /// Merges execute-time arguments into the bindings, then executes.
    ///
    /// Arguments override earlier values at the same key and keep their declared type.
    pub fn execute_with<B, I, K, V>(&mut self, backend: &B, args: I) -> Result<()>
    where
        B: Backend + ?Sized,
        I: IntoIterator<Item = (K, V)>,
        K: Into<Key>,
        V: Into<Value>,
    {
        self.bindings
            .merge(args.into_iter().map(|(k, v)| (k.into(), v.into())))?;
        self.execute(backend)
    }

    pub fn fetch_mode(&self) -> FetchMode {
        self.fetch_mode
    }

    pub fn set_fetch_mode(&mut self, mode: FetchMode) {
        self.fetch_mode = mode;
    }

    /// Reads the next row in the default fetch mode; `None` once the rows are exhausted.
    pub fn fetch(&mut self) -> Result<Option<Fetched>> {
        self.fetch_with(self.fetch_mode)
    }

    /// Reads the next row in `mode`.
    ///
    /// The cursor only moves when the row could be shaped.
    pub fn fetch_with(&mut self, mode: FetchMode) -> Result<Option<Fetched>> {
        self.next_row(|row| project(row, mode))
    }

    /// Shapes every row of the last execution, regardless of the cursor position.
    pub fn fetch_all(&self) -> Result<Vec<Fetched>> {
        self.fetch_all_with(self.fetch_mode)
    }

    pub fn fetch_all_with(&self, mode: FetchMode) -> Result<Vec<Fetched>> {
        self.rows().iter().map(|row| project(row, mode)).collect()
    }

    /// Reads column `index` (default 0) of the next row.
    pub fn fetch_column(&mut self, index: Option<usize>) -> Result<Option<Value>> {
        let index = index.unwrap_or(0);
        self.next_row(|row| {
            row.get_index(index).cloned().ok_or_else(|| {
                Error::Projection(format!(
                    "column {index} is out of range, the row has {} columns",
                    row.len()
                ))
            })
        })
    }

    /// Reads the next row into `T`.
    pub fn fetch_as<T: FromRow>(&mut self) -> Result<Option<T>> {
        self.next_row(T::from_row)
    }

    /// Reads every row of the last execution into `T`.
    pub fn fetch_all_as<T: FromRow>(&self) -> Result<Vec<T>> {
        self.rows().iter().map(T::from_row).collect()
    }

    /// 1 after a write, the number of rows after a read, 0 without a result.
    ///
    /// The backend reports no affected-row count, so writes always report 1.
    pub fn row_count(&self) -> usize {
        match &self.result {
            Some(ResultSet {
                kind: StatementKind::Write,
                ..
            }) => 1,
            Some(result) => result.rows.len(),
            None => 0,
        }
    }

    /// Width of the first row of the last execution, 0 if there is none.
    pub fn column_count(&self) -> usize {
        self.rows().first().map_or(0, Row::len)
    }

    /// Discards the rows and cursor; the statement stays executable.
    pub fn close_cursor(&mut self) {
        self.result = None;
    }

    pub fn error_code(&self) -> Result<String> {
        Err(Error::Unimplemented("error_code"))
    }

    pub fn error_info(&self) -> Result<Vec<String>> {
        Err(Error::Unimplemented("error_info"))
    }

    fn rows(&self) -> &[Row] {
        self.result
            .as_ref()
            .map(|r| r.rows.as_slice())
            .unwrap_or_default()
    }

    fn next_row<T, F>(&mut self, read: F) -> Result<Option<T>>
    where
        F: FnOnce(&Row) -> Result<T>,
    {
        let Some(result) = self.result.as_mut() else {
            return Ok(None);
        };
        let Some(row) = result.rows.get(result.position) else {
            return Ok(None);
        };
        let output = read(row)?;
        result.position += 1;
        Ok(Some(output))
    }
}
