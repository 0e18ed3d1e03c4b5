//! # literal-bind
//!
//! Prepared-statement emulation for query backends that have no native parameter binding.
//!
//! Statements are written with placeholders, values are bound to them, and on every
//! execution the template is rendered into fully literal SQL before it reaches the backend.
//! Rows come back through a forward-only cursor that can shape each row in several ways.
//!
//! ## Features
//!
//! - **Two placeholder styles**: positional `?` or named `:param_name`, one style per statement
//! - **Type-directed literals**: numbers, booleans, quoted strings and array literals, with
//!   optional declared types overriding inference
//! - **Deferred binding**: bind an accessor or a shared cell that is read at execute time
//! - **Fetch modes**: associative, numeric, mixed, record and key-pair rows
//! - **Pluggable backends**: implement [`Backend`] for any transport; a sqlx MySQL backend
//!   ships behind the `mysql` feature
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! literal-bind = { version = "0.1", features = ["mysql"] }
//! ```
//!
//! ## Examples
//!
//! ### Named placeholders
//!
//! ```rust
//! use literal_bind::{Backend, Result, RowSet, Statement};
//!
//! struct Log;
//!
//! impl Backend for Log {
//!     fn run_query(&self, sql: &str) -> Result<RowSet> {
//!         println!("query: {sql}");
//!         Ok(Vec::new())
//!     }
//!
//!     fn run_command(&self, sql: &str) -> Result<RowSet> {
//!         println!("command: {sql}");
//!         Ok(Vec::new())
//!     }
//! }
//!
//! let mut stmt = Statement::new("INSERT INTO users (id, name) VALUES (:id, :name)");
//! stmt.bind_value("id", 42)?.bind_value("name", "John Doe")?;
//! stmt.execute(&Log)?;
//! assert_eq!(stmt.row_count(), 1);
//! # Ok::<(), literal_bind::Error>(())
//! ```
//!
//! ### Positional placeholders and deferred values
//!
//! ```rust
//! use literal_bind::{AnsiQuoter, Key, ParamType};
//! use literal_bind::builder::{build_query, Bindings};
//!
//! let mut bindings = Bindings::new();
//! bindings.insert(Key::Index(0), true.into(), Some(ParamType::Boolean))?;
//! bindings.insert_deferred(Key::Index(1), || vec!["a", "b"].into(), None)?;
//!
//! let sql = build_query("SELECT * FROM t WHERE active = ? AND tag IN ?", &bindings, &AnsiQuoter)?;
//! assert_eq!(sql, "SELECT * FROM t WHERE active = 1 AND tag IN [ 'a', 'b' ]");
//! # Ok::<(), literal_bind::Error>(())
//! ```
//!
//! ## How It Works
//!
//! 1. **Bind**: values (or accessors) are stored per key, in insertion order
//! 2. **Render**: each binding is encoded once and substituted into the template
//! 3. **Dispatch**: `SELECT`, `SHOW` and `DESCRIBE` go to [`Backend::run_query`], everything
//!    else to [`Backend::run_command`]
//! 4. **Fetch**: the returned rows replace the previous ones and the cursor restarts
//!
//! ## Limitations
//!
//! - There is no `NULL` literal: binding `NULL` fails
//! - Placeholder names must match `[a-zA-Z0-9_]+`
//! - `?` inside string literals is treated as a placeholder
//! - A positional placeholder without a bound value is dropped from the rendered SQL
//! - Writes always report a row count of 1
//! - Array literals use `[..]` syntax, which the MySQL backend does not accept
//!
//! ## License
//!
//! Licensed under either of Apache License, Version 2.0 or MIT license at your option.

pub mod backend;
pub mod builder;
pub mod encode;
pub mod error;
pub mod fetch;
#[cfg(feature = "mysql")]
pub mod mysql;
pub mod row;
pub mod statement;
pub mod value;

pub use backend::Backend;
pub use encode::{encode_value, AnsiQuoter, Quoter};
pub use error::{Error, Result};
pub use fetch::{FetchMode, Fetched, MixedRow, Record, RowKey};
pub use row::{FromRow, FromValue, Row, RowSet};
pub use statement::{Statement, StatementKind};
pub use value::{Key, ParamType, Value};

/// Convenience re-exports for common use cases
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::{Backend, FetchMode, Fetched, FromRow, Key, ParamType, Row, RowSet};
    pub use crate::{Statement, Value};
}
