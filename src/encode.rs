use crate::{Error, ParamType, Result, Value};

/// Produces a backend-safe quoted string literal.
///
/// Escaping is entirely the quoter's responsibility; the encoder never inspects
/// the text it hands over.
pub trait Quoter {
    fn quote_literal(&self, value: &str) -> String;
}

/// Standard SQL quoting: single quotes, embedded quotes doubled.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnsiQuoter;

impl Quoter for AnsiQuoter {
    fn quote_literal(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len() + 2);
        out.push('\'');
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == '\'' {
                out.push_str(&value[position..i]);
                out.push_str("''");
                position = i + 1;
            }
        }
        out.push_str(&value[position..]);
        out.push('\'');
        out
    }
}

impl<F> Quoter for F
where
    F: Fn(&str) -> String,
{
    fn quote_literal(&self, value: &str) -> String {
        self(value)
    }
}

/// Renders `value` as SQL literal text.
///
/// A declared type takes precedence over inference: `Integer` emits decimal text,
/// `Boolean` emits `1`/`0`, `Null` is rejected and every other type is quoted.
/// Without a declared type, numbers are emitted raw, booleans as `1`/`0`,
/// arrays as bracketed lists and everything else is quoted. `NULL` is rejected
/// whatever the declared type.
///
/// Arrays whose first element is not numeric quote every element, so booleans
/// inside them become `'1'` and `'0'`.
///
/// # Examples
///
/// ```
/// use literal_bind::{encode_value, AnsiQuoter, ParamType, Value};
///
/// assert_eq!(encode_value(&Value::Bool(true), Some(ParamType::Boolean), &AnsiQuoter)?, "1");
/// assert_eq!(encode_value(&vec![1, 2, 3].into(), None, &AnsiQuoter)?, "[1, 2, 3]");
/// assert_eq!(encode_value(&"it's".into(), None, &AnsiQuoter)?, "'it''s'");
/// assert!(encode_value(&Value::Int(1), Some(ParamType::Null), &AnsiQuoter).is_err());
/// # Ok::<(), literal_bind::Error>(())
/// ```
pub fn encode_value(
    value: &Value,
    ty: Option<ParamType>,
    quoter: &dyn Quoter,
) -> Result<String> {
    if value.is_null() {
        return Err(Error::UnsupportedValue(
            "NULL cannot be bound, the backend has no NULL literal".into(),
        ));
    }
    match ty {
        Some(ParamType::Null) => {
            Err(Error::UnsupportedValue("the backend has no NULL literal".into()))
        }
        Some(ParamType::Integer) => encode_integer(value),
        Some(ParamType::Boolean) => Ok(encode_bool(truthy(value))),
        Some(ParamType::String | ParamType::LargeObject) => encode_quoted(value, quoter),
        None => match value {
            Value::Bool(v) => Ok(encode_bool(*v)),
            Value::Int(..) | Value::Float(..) => encode_number(value),
            Value::Array(values) => encode_array(values, quoter),
            _ => encode_quoted(value, quoter),
        },
    }
}

fn encode_bool(value: bool) -> String {
    (if value { "1" } else { "0" }).to_owned()
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(v) => *v,
        Value::Int(v) => *v != 0,
        Value::Float(v) => *v != 0.0,
        Value::String(v) => !v.is_empty() && v != "0",
        Value::Array(v) => !v.is_empty(),
    }
}

fn encode_integer(value: &Value) -> Result<String> {
    match value {
        Value::Int(v) => Ok(v.to_string()),
        Value::Bool(v) => Ok(encode_bool(*v)),
        Value::Float(v) if v.is_finite() => Ok(v.to_string()),
        Value::String(v) => v
            .trim()
            .parse::<i64>()
            .map(|v| v.to_string())
            .map_err(|_| Error::UnsupportedValue(format!("'{v}' is not an integer"))),
        v => Err(Error::UnsupportedValue(format!("{v:?} cannot be bound as an integer"))),
    }
}

fn encode_number(value: &Value) -> Result<String> {
    match value {
        Value::Int(v) => Ok(v.to_string()),
        Value::Float(v) if v.is_finite() => Ok(v.to_string()),
        v => Err(Error::UnsupportedValue(format!("{v:?} has no numeric literal"))),
    }
}

fn encode_quoted(value: &Value, quoter: &dyn Quoter) -> Result<String> {
    match value {
        Value::Null => Err(Error::UnsupportedValue(
            "NULL cannot be bound, the backend has no NULL literal".into(),
        )),
        Value::Array(..) => Err(Error::UnsupportedValue(
            "an array cannot be bound as a string".into(),
        )),
        Value::String(v) => Ok(quoter.quote_literal(v)),
        v => Ok(quoter.quote_literal(&v.to_string())),
    }
}

fn encode_array(values: &[Value], quoter: &dyn Quoter) -> Result<String> {
    let numeric = values.first().map_or(true, Value::is_numeric);
    if values.iter().any(|v| v.is_numeric() != numeric) {
        return Err(Error::UnsupportedValue(
            "array elements must be either all numeric or all non-numeric".into(),
        ));
    }
    if numeric {
        let items = values
            .iter()
            .map(encode_number)
            .collect::<Result<Vec<_>>>()?;
        Ok(format!("[{}]", items.join(", ")))
    } else {
        let items = values
            .iter()
            .map(|v| match v {
                Value::Array(..) => Err(Error::UnsupportedValue(
                    "nested arrays are not supported".into(),
                )),
                v => encode_quoted(v, quoter),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(format!("[ {} ]", items.join(", ")))
    }
}
