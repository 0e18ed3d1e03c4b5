use literal_bind::prelude::*;
use literal_bind::{MixedRow, RowKey};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Records every rendered statement and answers queries from a queue of row sets.
#[derive(Default)]
struct Recorder {
    queries: RefCell<Vec<String>>,
    commands: RefCell<Vec<String>>,
    results: RefCell<VecDeque<Result<RowSet>>>,
}

impl Recorder {
    fn with_results(results: Vec<Result<RowSet>>) -> Self {
        Self {
            results: RefCell::new(results.into()),
            ..Default::default()
        }
    }

    fn last_query(&self) -> Option<String> {
        self.queries.borrow().last().cloned()
    }

    fn last_command(&self) -> Option<String> {
        self.commands.borrow().last().cloned()
    }

    fn next_result(&self) -> Result<RowSet> {
        self.results.borrow_mut().pop_front().unwrap_or(Ok(Vec::new()))
    }
}

impl Backend for Recorder {
    fn run_query(&self, sql: &str) -> Result<RowSet> {
        self.queries.borrow_mut().push(sql.to_owned());
        self.next_result()
    }

    fn run_command(&self, sql: &str) -> Result<RowSet> {
        self.commands.borrow_mut().push(sql.to_owned());
        self.next_result()
    }
}

fn rows(data: &[&[(&str, i64)]]) -> RowSet {
    data.iter()
        .map(|row| row.iter().map(|(n, v)| (*n, *v)).collect())
        .collect()
}

fn ab_rows() -> RowSet {
    rows(&[&[("a", 1), ("b", 2)], &[("a", 3), ("b", 4)]])
}

fn numeric(values: &[i64]) -> Option<Fetched> {
    Some(Fetched::Numeric(values.iter().copied().map(Value::Int).collect()))
}

#[test]
fn test_execute_renders_named_template() {
    init_logs();
    let backend = Recorder::default();
    let mut stmt = Statement::new("SELECT * FROM users WHERE id = :id AND name = :name");
    stmt.bind_value("id", 42).unwrap();
    stmt.bind_value(":name", "O'Neil").unwrap();
    stmt.execute(&backend).unwrap();

    assert_eq!(
        backend.last_query().as_deref(),
        Some("SELECT * FROM users WHERE id = 42 AND name = 'O''Neil'")
    );
    assert_eq!(stmt.sql(), "SELECT * FROM users WHERE id = :id AND name = :name");
}

#[test]
fn test_execute_dispatches_by_leading_keyword() {
    init_logs();
    let backend = Recorder::default();
    for sql in ["select 1", "  SHOW TABLES", "describe users"] {
        Statement::new(sql).execute(&backend).unwrap();
    }
    for sql in ["INSERT INTO t VALUES (1)", "OPTIMIZE TABLE t"] {
        Statement::new(sql).execute(&backend).unwrap();
    }
    assert_eq!(backend.queries.borrow().len(), 3);
    assert_eq!(backend.commands.borrow().len(), 2);
}

#[test]
fn test_fetch_numeric_walks_rows_once() {
    init_logs();
    let backend = Recorder::with_results(vec![Ok(ab_rows())]);
    let mut stmt = Statement::new("SELECT a, b FROM t");
    stmt.execute(&backend).unwrap();

    assert_eq!(stmt.fetch_with(FetchMode::Numeric).unwrap(), numeric(&[1, 2]));
    assert_eq!(stmt.fetch_with(FetchMode::Numeric).unwrap(), numeric(&[3, 4]));
    assert_eq!(stmt.fetch_with(FetchMode::Numeric).unwrap(), None);
    assert_eq!(stmt.fetch().unwrap(), None);
}

#[test]
fn test_fetch_uses_configured_mode() {
    init_logs();
    let backend = Recorder::with_results(vec![Ok(ab_rows())]);
    let mut stmt = Statement::new("SELECT a, b FROM t").with_fetch_mode(FetchMode::Associative);
    stmt.execute(&backend).unwrap();

    let first = stmt.fetch().unwrap().and_then(Fetched::into_associative).unwrap();
    assert_eq!(first.get("b"), Some(&Value::Int(2)));

    stmt.set_fetch_mode(FetchMode::StandardObject);
    let second = stmt.fetch().unwrap().and_then(Fetched::into_object).unwrap();
    assert_eq!(second.field("a"), Some(&Value::Int(3)));
}

#[test]
fn test_fetch_all_ignores_cursor() {
    init_logs();
    let backend = Recorder::with_results(vec![Ok(ab_rows())]);
    let mut stmt = Statement::new("SELECT a, b FROM t");
    stmt.execute(&backend).unwrap();
    stmt.fetch().unwrap();

    let all = stmt.fetch_all_with(FetchMode::Numeric).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(Some(all[0].clone()), numeric(&[1, 2]));

    // The cursor is still on the second row.
    assert_eq!(stmt.fetch_with(FetchMode::Numeric).unwrap(), numeric(&[3, 4]));
}

#[test]
fn test_fetch_all_mixed() {
    init_logs();
    let backend = Recorder::with_results(vec![Ok(rows(&[&[("a", 1), ("b", 2)]]))]);
    let mut stmt = Statement::new("SELECT a, b FROM t");
    stmt.execute(&backend).unwrap();

    let all = stmt.fetch_all().unwrap();
    let row: MixedRow = all.into_iter().next().and_then(Fetched::into_mixed).unwrap();
    assert_eq!(row.get(&RowKey::Index(0)), Some(&Value::Int(1)));
    assert_eq!(row.get(&RowKey::Index(1)), Some(&Value::Int(2)));
    assert_eq!(row.get_name("a"), Some(&Value::Int(1)));
    assert_eq!(row.get_name("b"), Some(&Value::Int(2)));
}

#[test]
fn test_fetch_key_pair() {
    init_logs();
    let backend = Recorder::with_results(vec![
        Ok(rows(&[&[("a", 1), ("b", 2)]])),
        Ok(rows(&[&[("a", 1)]])),
    ]);
    let mut stmt = Statement::new("SELECT a, b FROM t");
    stmt.execute(&backend).unwrap();
    assert_eq!(
        stmt.fetch_with(FetchMode::KeyPair).unwrap(),
        Some(Fetched::KeyPair {
            key: Value::Int(1),
            value: Value::Int(2)
        })
    );

    stmt.execute(&backend).unwrap();
    assert!(matches!(
        stmt.fetch_with(FetchMode::KeyPair),
        Err(Error::Projection(..))
    ));
    // A failed projection leaves the row unread.
    assert_eq!(stmt.fetch_with(FetchMode::Numeric).unwrap(), numeric(&[1]));
}

#[test]
fn test_fetch_column() {
    init_logs();
    let backend = Recorder::with_results(vec![Ok(ab_rows())]);
    let mut stmt = Statement::new("SELECT a, b FROM t");
    stmt.execute(&backend).unwrap();

    assert_eq!(stmt.fetch_column(None).unwrap(), Some(Value::Int(1)));
    assert_eq!(stmt.fetch_column(Some(1)).unwrap(), Some(Value::Int(4)));
    assert_eq!(stmt.fetch_column(None).unwrap(), None);
}

#[test]
fn test_fetch_column_out_of_range() {
    init_logs();
    let backend = Recorder::with_results(vec![Ok(ab_rows())]);
    let mut stmt = Statement::new("SELECT a, b FROM t");
    stmt.execute(&backend).unwrap();
    assert!(matches!(stmt.fetch_column(Some(5)), Err(Error::Projection(..))));
}

#[test]
fn test_reexecute_replaces_rows_and_cursor() {
    init_logs();
    let backend = Recorder::with_results(vec![
        Ok(ab_rows()),
        Ok(rows(&[&[("a", 10), ("b", 20)]])),
    ]);
    let mut stmt = Statement::new("SELECT a, b FROM t");
    stmt.execute(&backend).unwrap();
    stmt.fetch().unwrap();

    stmt.execute(&backend).unwrap();
    assert_eq!(stmt.fetch_with(FetchMode::Numeric).unwrap(), numeric(&[10, 20]));
    assert_eq!(stmt.fetch().unwrap(), None);
}

#[test]
fn test_failed_execute_keeps_previous_rows() {
    init_logs();
    let backend = Recorder::with_results(vec![
        Ok(ab_rows()),
        Err(Error::execution("connection reset")),
    ]);
    let mut stmt = Statement::new("SELECT a, b FROM t");
    stmt.execute(&backend).unwrap();
    stmt.fetch().unwrap();

    assert!(matches!(stmt.execute(&backend), Err(Error::Execution(..))));
    assert_eq!(stmt.fetch_with(FetchMode::Numeric).unwrap(), numeric(&[3, 4]));
    assert_eq!(stmt.row_count(), 2);
}

#[test]
fn test_encoding_error_keeps_previous_rows() {
    init_logs();
    let backend = Recorder::with_results(vec![Ok(ab_rows())]);
    let mut stmt = Statement::new("SELECT a, b FROM t WHERE a = ?");
    stmt.bind_value(0, 1).unwrap();
    stmt.execute(&backend).unwrap();

    stmt.bind_value_as(0, 1, ParamType::Null).unwrap();
    assert!(matches!(stmt.execute(&backend), Err(Error::UnsupportedValue(..))));
    assert_eq!(backend.queries.borrow().len(), 1);
    assert_eq!(stmt.fetch_with(FetchMode::Numeric).unwrap(), numeric(&[1, 2]));
}

#[test]
fn test_null_under_declared_boolean_is_not_sent() {
    init_logs();
    let backend = Recorder::default();
    let mut stmt = Statement::new("UPDATE t SET active = :flag");
    stmt.bind_value_as("flag", None::<i32>, ParamType::Boolean).unwrap();
    assert!(matches!(stmt.execute(&backend), Err(Error::UnsupportedValue(..))));
    assert_eq!(backend.last_command(), None);
}

#[test]
fn test_row_count_and_column_count() {
    init_logs();
    let backend = Recorder::with_results(vec![Ok(ab_rows()), Ok(Vec::new())]);
    let mut stmt = Statement::new("SELECT a, b FROM t");
    stmt.execute(&backend).unwrap();
    assert_eq!(stmt.row_count(), 2);
    assert_eq!(stmt.column_count(), 2);

    let mut insert = Statement::new("INSERT INTO t SELECT * FROM big");
    insert.execute(&backend).unwrap();
    assert_eq!(insert.row_count(), 1);
    assert_eq!(insert.column_count(), 0);
}

#[test]
fn test_close_cursor_then_reexecute() {
    init_logs();
    let backend = Recorder::with_results(vec![Ok(ab_rows()), Ok(ab_rows())]);
    let mut stmt = Statement::new("SELECT a, b FROM t");
    stmt.execute(&backend).unwrap();

    stmt.close_cursor();
    assert_eq!(stmt.fetch().unwrap(), None);
    assert_eq!(stmt.row_count(), 0);
    assert!(stmt.fetch_all().unwrap().is_empty());

    stmt.execute(&backend).unwrap();
    assert_eq!(stmt.fetch_with(FetchMode::Numeric).unwrap(), numeric(&[1, 2]));
}

#[test]
fn test_execute_with_arguments_override_bindings() {
    init_logs();
    let backend = Recorder::default();
    let mut stmt = Statement::new("UPDATE t SET active = :active WHERE id = :id");
    stmt.bind_value_as("active", true, ParamType::Boolean).unwrap();
    stmt.bind_value("id", 1).unwrap();

    stmt.execute_with(&backend, [("active", 0), ("id", 9)]).unwrap();
    assert_eq!(
        backend.last_command().as_deref(),
        Some("UPDATE t SET active = 0 WHERE id = 9")
    );

    // Arguments persist as bindings.
    stmt.execute(&backend).unwrap();
    assert_eq!(
        backend.last_command().as_deref(),
        Some("UPDATE t SET active = 0 WHERE id = 9")
    );
}

#[test]
fn test_execute_with_positional_arguments() {
    init_logs();
    let backend = Recorder::default();
    let mut stmt = Statement::new("SELECT * FROM t WHERE a = ? AND b = ?");
    stmt.execute_with(&backend, vec![(0, Value::from("x")), (1, Value::from(2.5))])
        .unwrap();
    assert_eq!(
        backend.last_query().as_deref(),
        Some("SELECT * FROM t WHERE a = 'x' AND b = 2.5")
    );
}

#[test]
fn test_execute_with_mixed_arguments_fails() {
    init_logs();
    let backend = Recorder::default();
    let mut stmt = Statement::new("SELECT * FROM t WHERE a = :a");
    stmt.bind_value("a", 1).unwrap();
    let result = stmt.execute_with(&backend, [(Key::Index(0), 2)]);
    assert!(matches!(result, Err(Error::MixedPlaceholderStyle { .. })));
    assert!(backend.queries.borrow().is_empty());
}

#[test]
fn test_bind_param_reads_cell_at_execute_time() {
    init_logs();
    let backend = Recorder::default();
    let limit = Rc::new(RefCell::new(10));
    let mut stmt = Statement::new("SELECT * FROM t LIMIT ?");
    stmt.bind_param_cell(0, limit.clone()).unwrap();

    *limit.borrow_mut() = 25;
    stmt.execute(&backend).unwrap();
    assert_eq!(backend.last_query().as_deref(), Some("SELECT * FROM t LIMIT 25"));

    *limit.borrow_mut() = 50;
    stmt.execute(&backend).unwrap();
    assert_eq!(backend.last_query().as_deref(), Some("SELECT * FROM t LIMIT 50"));
}

#[test]
fn test_bind_param_accessor_with_declared_type() {
    init_logs();
    let backend = Recorder::default();
    let flag = Rc::new(RefCell::new(String::from("yes")));
    let source = flag.clone();
    let mut stmt = Statement::new("DELETE FROM t WHERE archived = :archived");
    stmt.bind_param_as("archived", move || source.borrow().clone(), ParamType::Boolean)
        .unwrap();
    stmt.execute(&backend).unwrap();
    assert_eq!(
        backend.last_command().as_deref(),
        Some("DELETE FROM t WHERE archived = 1")
    );

    flag.borrow_mut().clear();
    stmt.execute(&backend).unwrap();
    assert_eq!(
        backend.last_command().as_deref(),
        Some("DELETE FROM t WHERE archived = 0")
    );
}

#[test]
fn test_array_literals() {
    init_logs();
    let backend = Recorder::default();
    let mut stmt = Statement::new("SELECT * FROM t WHERE has(:ids, id) AND has(:tags, tag)");
    stmt.bind_value("ids", vec![1, 2, 3]).unwrap();
    stmt.bind_value("tags", vec!["a", "b"]).unwrap();
    stmt.execute(&backend).unwrap();
    assert_eq!(
        backend.last_query().as_deref(),
        Some("SELECT * FROM t WHERE has([1, 2, 3], id) AND has([ 'a', 'b' ], tag)")
    );

    stmt.bind_value("ids", Value::Array(vec![Value::Int(1), Value::from("a")]))
        .unwrap();
    assert!(matches!(stmt.execute(&backend), Err(Error::UnsupportedValue(..))));
}

#[test]
fn test_backend_quoting_is_used() {
    struct Backslash;

    impl Backend for Backslash {
        fn run_query(&self, _sql: &str) -> Result<RowSet> {
            Ok(Vec::new())
        }

        fn run_command(&self, sql: &str) -> Result<RowSet> {
            assert_eq!(sql, r"INSERT INTO t VALUES ('it\'s')");
            Ok(Vec::new())
        }

        fn quote_literal(&self, value: &str) -> String {
            format!("'{}'", value.replace('\'', r"\'"))
        }
    }

    init_logs();
    let mut stmt = Statement::new("INSERT INTO t VALUES (?)");
    stmt.bind_value(0, "it's").unwrap();
    stmt.execute(&Backslash).unwrap();
}

#[test]
fn test_fetch_as() {
    struct Pair {
        a: i64,
        b: i64,
    }

    impl FromRow for Pair {
        fn from_row(row: &Row) -> Result<Self> {
            Ok(Pair {
                a: row.try_get("a")?,
                b: row.try_get("b")?,
            })
        }
    }

    init_logs();
    let backend = Recorder::with_results(vec![Ok(ab_rows())]);
    let mut stmt = Statement::new("SELECT a, b FROM t");
    stmt.execute(&backend).unwrap();

    let first = stmt.fetch_as::<Pair>().unwrap().unwrap();
    assert_eq!((first.a, first.b), (1, 2));
    let all = stmt.fetch_all_as::<Pair>().unwrap();
    assert_eq!(all.iter().map(|p| p.a + p.b).collect::<Vec<_>>(), vec![3, 7]);
}
