use crate::encode::{AnsiQuoter, Quoter};
use crate::{Result, RowSet};

/// Query backend without native parameter binding.
///
/// Implementations execute fully literal SQL and report failures as
/// [`Error::Execution`](crate::Error::Execution). Calls are blocking; timeouts,
/// retries and connection handling belong to the implementation.
pub trait Backend {
    /// Runs a statement expected to return rows (`SELECT`, `SHOW`, `DESCRIBE`).
    fn run_query(&self, sql: &str) -> Result<RowSet>;

    /// Runs any other statement. The returned rows are usually empty.
    fn run_command(&self, sql: &str) -> Result<RowSet>;

    /// Quotes a string literal for this backend.
    fn quote_literal(&self, value: &str) -> String {
        AnsiQuoter.quote_literal(value)
    }
}

impl<B: Backend + ?Sized> Backend for &B {
    fn run_query(&self, sql: &str) -> Result<RowSet> {
        (**self).run_query(sql)
    }

    fn run_command(&self, sql: &str) -> Result<RowSet> {
        (**self).run_command(sql)
    }

    fn quote_literal(&self, value: &str) -> String {
        (**self).quote_literal(value)
    }
}

/// Adapts a backend's quoting to the [`Quoter`] used by the encoder.
pub(crate) struct BackendQuoter<'a, B: ?Sized>(pub(crate) &'a B);

impl<B: Backend + ?Sized> Quoter for BackendQuoter<'_, B> {
    fn quote_literal(&self, value: &str) -> String {
        self.0.quote_literal(value)
    }
}
