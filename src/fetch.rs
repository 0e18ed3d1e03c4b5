use crate::{Error, Result, Row, Value};
use std::fmt::{self, Display, Formatter};

/// Output shape requested when reading a row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FetchMode {
    /// Column name to value, in column order
    Associative,
    /// Values only, in column order
    Numeric,
    /// Addressable by position and by column name
    #[default]
    Mixed,
    /// Record with one field per column
    StandardObject,
    /// First column mapped to the second
    KeyPair,
}

/// A row shaped by [`project`].
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    Associative(Row),
    Numeric(Vec<Value>),
    Mixed(MixedRow),
    Object(Record),
    KeyPair { key: Value, value: Value },
}

impl Fetched {
    pub fn mode(&self) -> FetchMode {
        match self {
            Fetched::Associative(..) => FetchMode::Associative,
            Fetched::Numeric(..) => FetchMode::Numeric,
            Fetched::Mixed(..) => FetchMode::Mixed,
            Fetched::Object(..) => FetchMode::StandardObject,
            Fetched::KeyPair { .. } => FetchMode::KeyPair,
        }
    }

    pub fn into_numeric(self) -> Option<Vec<Value>> {
        match self {
            Fetched::Numeric(values) => Some(values),
            _ => None,
        }
    }

    pub fn into_associative(self) -> Option<Row> {
        match self {
            Fetched::Associative(row) => Some(row),
            _ => None,
        }
    }

    pub fn into_mixed(self) -> Option<MixedRow> {
        match self {
            Fetched::Mixed(row) => Some(row),
            _ => None,
        }
    }

    pub fn into_object(self) -> Option<Record> {
        match self {
            Fetched::Object(record) => Some(record),
            _ => None,
        }
    }

    pub fn into_key_pair(self) -> Option<(Value, Value)> {
        match self {
            Fetched::KeyPair { key, value } => Some((key, value)),
            _ => None,
        }
    }
}

/// Key of a [`MixedRow`] entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RowKey {
    Index(usize),
    Name(String),
}

impl Display for RowKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RowKey::Index(i) => write!(f, "{i}"),
            RowKey::Name(name) => f.write_str(name),
        }
    }
}

/// Row holding both a positional and a named entry per column.
///
/// Positional entries come first. A column whose name is the decimal text of
/// a position gets no named entry: the positional one wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MixedRow {
    entries: Vec<(RowKey, Value)>,
}

impl MixedRow {
    pub fn get(&self, key: &RowKey) -> Option<&Value> {
        self.entries
            .iter()
            .find_map(|(k, v)| (k == key).then_some(v))
    }

    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.get(&RowKey::Index(index))
    }

    pub fn get_name(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find_map(|(k, v)| match k {
            RowKey::Name(n) if n == name => Some(v),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RowKey, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

/// Fixed-shape record whose fields are the row's column names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find_map(|(n, v)| (n == name).then_some(v))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Shapes `row` according to `mode`.
///
/// Only [`FetchMode::KeyPair`] can fail, when the row has fewer than two columns.
pub fn project(row: &Row, mode: FetchMode) -> Result<Fetched> {
    Ok(match mode {
        FetchMode::Associative => Fetched::Associative(row.clone()),
        FetchMode::Numeric => Fetched::Numeric(row.values().cloned().collect()),
        FetchMode::Mixed => Fetched::Mixed(mixed(row)),
        FetchMode::StandardObject => Fetched::Object(Record {
            fields: row.iter().map(|(n, v)| (n.to_owned(), v.clone())).collect(),
        }),
        FetchMode::KeyPair => {
            let (Some(key), Some(value)) = (row.get_index(0), row.get_index(1)) else {
                return Err(Error::Projection(format!(
                    "key-pair fetch needs at least 2 columns, the row has {}",
                    row.len()
                )));
            };
            Fetched::KeyPair {
                key: key.clone(),
                value: value.clone(),
            }
        }
    })
}

fn mixed(row: &Row) -> MixedRow {
    let width = row.len();
    let mut entries = Vec::with_capacity(width * 2);
    entries.extend(
        row.values()
            .enumerate()
            .map(|(i, v)| (RowKey::Index(i), v.clone())),
    );
    entries.extend(
        row.iter()
            .filter(|(name, _)| {
                !name
                    .parse::<usize>()
                    .is_ok_and(|i| i < width && i.to_string() == *name)
            })
            .map(|(name, v)| (RowKey::Name(name.to_owned()), v.clone())),
    );
    MixedRow { entries }
}
