use crate::encode::{encode_value, Quoter};
use crate::{Error, Key, ParamType, Result, Value};
use regex::Regex;
use std::fmt::{self, Debug, Formatter};

/// Placeholder style of a statement, fixed by the first key bound to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `?` markers addressed by 0-based position
    Positional,
    /// `:name` markers addressed by name
    Named,
}

impl PlaceholderStyle {
    fn of(key: &Key) -> Self {
        match key {
            Key::Index(..) => PlaceholderStyle::Positional,
            Key::Name(..) => PlaceholderStyle::Named,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            PlaceholderStyle::Positional => "positional",
            PlaceholderStyle::Named => "named",
        }
    }
}

enum Source {
    Value(Value),
    Deferred(Box<dyn Fn() -> Value>),
}

/// A value (or an accessor read at execute time) plus its optional declared type.
pub struct Binding {
    source: Source,
    ty: Option<ParamType>,
}

impl Binding {
    pub fn ty(&self) -> Option<ParamType> {
        self.ty
    }

    /// Current value; deferred bindings call their accessor on every read.
    pub fn value(&self) -> Value {
        match &self.source {
            Source::Value(v) => v.clone(),
            Source::Deferred(accessor) => accessor(),
        }
    }
}

impl Debug for Binding {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Binding");
        match &self.source {
            Source::Value(v) => s.field("value", v),
            Source::Deferred(..) => s.field("value", &format_args!("<deferred>")),
        };
        s.field("ty", &self.ty).finish()
    }
}

/// Keyed bindings of one statement, kept in insertion order.
///
/// All keys share one [`PlaceholderStyle`]; binding a key of the other style
/// fails with [`Error::MixedPlaceholderStyle`].
#[derive(Debug, Default)]
pub struct Bindings {
    style: Option<PlaceholderStyle>,
    entries: Vec<(Key, Binding)>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn style(&self) -> Option<PlaceholderStyle> {
        self.style
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &Key) -> Option<&Binding> {
        self.entries
            .iter()
            .find_map(|(k, b)| (k == key).then_some(b))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Binding)> {
        self.entries.iter().map(|(k, b)| (k, b))
    }

    /// Binds `value` to `key`, replacing an earlier binding in place.
    pub fn insert(&mut self, key: Key, value: Value, ty: Option<ParamType>) -> Result<()> {
        self.set(key, Source::Value(value), ty)
    }

    /// Binds an accessor that is read when the statement executes.
    pub fn insert_deferred<F>(
        &mut self,
        key: Key,
        accessor: F,
        ty: Option<ParamType>,
    ) -> Result<()>
    where
        F: Fn() -> Value + 'static,
    {
        self.set(key, Source::Deferred(Box::new(accessor)), ty)
    }

    /// Overrides values from execute-time arguments.
    ///
    /// Existing keys keep their declared type. Nothing is merged if any key has
    /// the wrong style.
    pub fn merge<I>(&mut self, args: I) -> Result<()>
    where
        I: IntoIterator<Item = (Key, Value)>,
    {
        let args: Vec<_> = args.into_iter().collect();
        let mut style = self.style;
        for (key, _) in &args {
            style = Some(check_style(style, key)?);
        }
        for (key, value) in args {
            let ty = self.get(&key).and_then(Binding::ty);
            self.set(key, Source::Value(value), ty)?;
        }
        Ok(())
    }

    fn set(&mut self, key: Key, source: Source, ty: Option<ParamType>) -> Result<()> {
        self.style = Some(check_style(self.style, &key)?);
        let binding = Binding { source, ty };
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = binding,
            None => self.entries.push((key, binding)),
        }
        Ok(())
    }
}

fn check_style(current: Option<PlaceholderStyle>, key: &Key) -> Result<PlaceholderStyle> {
    let got = PlaceholderStyle::of(key);
    match current {
        Some(expected) if expected != got => Err(Error::MixedPlaceholderStyle {
            key: key.to_string(),
            expected: expected.as_str(),
            got: got.as_str(),
        }),
        _ => Ok(got),
    }
}

/// Renders `template` into literal SQL by substituting every bound value.
///
/// Every binding is read and encoded exactly once. Positional templates are
/// split on `?` and the literal for position `i` follows fragment `i`; a `?`
/// with no binding is dropped. Named templates substitute, for each binding in
/// insertion order, the first not yet substituted `:name` token matching the
/// key case-insensitively. Unknown keys are ignored and unbound tokens are
/// left as written. Literals are never rescanned for placeholders.
///
/// # Examples
///
/// ```
/// use literal_bind::builder::{build_query, Bindings};
/// use literal_bind::{AnsiQuoter, Key};
///
/// let mut bindings = Bindings::new();
/// bindings.insert(Key::name("id"), 42.into(), None)?;
/// bindings.insert(Key::name("name"), "O'Neil".into(), None)?;
///
/// let sql = build_query(
///     "SELECT * FROM users WHERE id = :id AND name = :NAME",
///     &bindings,
///     &AnsiQuoter,
/// )?;
/// assert_eq!(sql, "SELECT * FROM users WHERE id = 42 AND name = 'O''Neil'");
/// # Ok::<(), literal_bind::Error>(())
/// ```
pub fn build_query(template: &str, bindings: &Bindings, quoter: &dyn Quoter) -> Result<String> {
    let literals = bindings
        .iter()
        .map(|(key, binding)| -> Result<_> {
            Ok((key, encode_value(&binding.value(), binding.ty(), quoter)?))
        })
        .collect::<Result<Vec<_>>>()?;

    match bindings.style() {
        None => Ok(template.to_owned()),
        Some(PlaceholderStyle::Positional) => Ok(build_positional(template, &literals)),
        Some(PlaceholderStyle::Named) => build_named(template, &literals),
    }
}

fn build_positional(template: &str, literals: &[(&Key, String)]) -> String {
    let mut fragments = template.split('?').enumerate().peekable();
    let mut sql = String::with_capacity(template.len());
    while let Some((i, fragment)) = fragments.next() {
        sql.push_str(fragment);
        if fragments.peek().is_none() {
            break;
        }
        match literals.iter().find(|(k, _)| **k == Key::Index(i)) {
            Some((_, literal)) => sql.push_str(literal),
            None => log::warn!("Placeholder {} has no bound value and was dropped", i),
        }
    }
    sql
}

fn build_named(template: &str, literals: &[(&Key, String)]) -> Result<String> {
    let regex = Regex::new(r":([a-zA-Z0-9_]+)")?;
    let tokens: Vec<_> = regex
        .captures_iter(template)
        .filter_map(|c| Some((c.get(0)?.range(), c.get(1)?.as_str())))
        .collect();

    let mut substituted: Vec<Option<&str>> = vec![None; tokens.len()];
    for (key, literal) in literals {
        let Key::Name(name) = key else { continue };
        let slot = tokens
            .iter()
            .zip(substituted.iter())
            .position(|((_, token), done)| done.is_none() && token.eq_ignore_ascii_case(name));
        if let Some(slot) = slot {
            substituted[slot] = Some(literal.as_str());
        }
    }

    let mut sql = String::with_capacity(template.len());
    let mut position = 0;
    for ((range, _), literal) in tokens.iter().zip(substituted) {
        if let Some(literal) = literal {
            sql.push_str(&template[position..range.start]);
            sql.push_str(literal);
            position = range.end;
        }
    }
    sql.push_str(&template[position..]);
    Ok(sql)
}
