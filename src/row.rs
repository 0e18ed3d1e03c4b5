use crate::Value;

/// One result row: column names mapped to values, in backend order.
///
/// Column names are unique; pushing an existing name replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

/// Rows produced by one execution.
pub type RowSet = Vec<Row>;

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.columns.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find_map(|(n, v)| (n == name).then_some(v))
    }

    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.columns.get(index).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.columns.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl<K, V> FromIterator<(K, V)> for Row
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (name, value) in iter {
            row.push(name, value);
        }
        row
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter()
    }
}

/// Conversion from a result row into a caller type.
///
/// Implemented by types fetched through [`Statement::fetch_as`](crate::Statement::fetch_as).
///
/// ```
/// use literal_bind::{Error, FromRow, Result, Row};
///
/// struct User {
///     id: i64,
///     name: String,
/// }
///
/// impl FromRow for User {
///     fn from_row(row: &Row) -> Result<Self> {
///         Ok(User {
///             id: row.try_get("id")?,
///             name: row.try_get("name")?,
///         })
///     }
/// }
///
/// let row: Row = [("id", literal_bind::Value::Int(7)), ("name", "Ann".into())]
///     .into_iter()
///     .collect();
/// let user = User::from_row(&row)?;
/// assert_eq!((user.id, user.name.as_str()), (7, "Ann"));
/// # Ok::<(), Error>(())
/// ```
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> crate::Result<Self>;
}

impl FromRow for Row {
    fn from_row(row: &Row) -> crate::Result<Self> {
        Ok(row.clone())
    }
}

/// Conversion from a single cell value, used by [`Row::try_get`].
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64()
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(v) => Some(*v),
            Value::Int(v) => Some(*v != 0),
            _ => None,
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null | Value::Array(..) => None,
            v => Some(v.to_string()),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            v => T::from_value(v).map(Some),
        }
    }
}

impl Row {
    /// Reads column `name` as `T`, failing when it is missing or of another type.
    pub fn try_get<T: FromValue>(&self, name: &str) -> crate::Result<T> {
        let value = self
            .get(name)
            .ok_or_else(|| crate::Error::Projection(format!("no column named '{name}'")))?;
        T::from_value(value).ok_or_else(|| {
            crate::Error::Projection(format!(
                "column '{name}' holds {value:?}, which cannot be read as {}",
                std::any::type_name::<T>()
            ))
        })
    }
}
