//! Parameter collection.
//!
//! A [`Params`] collector is created by the root of a compilation and
//! threaded by mutable reference through every node of the tree. Each node
//! that binds a value asks the collector for a fresh marker, so the
//! collector ends up holding every marker of the statement in the order it
//! appears in the SQL text.

use std::collections::HashMap;
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::dialect::Driver;
use crate::error::Result;
use crate::value::SqlValue;

/// How markers are rendered in compiled SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamStyle {
    /// `:name1` style markers, unique per statement.
    #[default]
    Named,
    /// `?` markers bound by position.
    Positional,
}

/// Bind type tag attached to every parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ParamType {
    /// SQL NULL.
    Null,
    /// Integer (also used for booleans).
    Int,
    /// String (also used for floats).
    String,
    /// Large object / binary.
    Lob,
}

/// Identifies a bound parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamKey {
    /// A named marker, including its leading colon.
    Named(String),
    /// A 1-based position.
    Position(usize),
}

impl ParamKey {
    /// The marker as it appears in SQL text.
    #[must_use]
    pub fn marker(&self) -> &str {
        match self {
            Self::Named(marker) => marker,
            Self::Position(_) => "?",
        }
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(marker) => f.write_str(marker),
            Self::Position(position) => write!(f, "?{position}"),
        }
    }
}

impl Serialize for ParamKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Named(marker) => serializer.serialize_str(marker),
            Self::Position(position) => serializer.serialize_u64(*position as u64),
        }
    }
}

/// A value bound to a marker.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParam {
    key: ParamKey,
    value: SqlValue,
    param_type: ParamType,
}

impl BoundParam {
    /// The key of this parameter.
    #[must_use]
    pub const fn key(&self) -> &ParamKey {
        &self.key
    }

    /// The bound value.
    #[must_use]
    pub const fn value(&self) -> &SqlValue {
        &self.value
    }

    /// The bind type.
    #[must_use]
    pub const fn param_type(&self) -> ParamType {
        self.param_type
    }
}

#[derive(Serialize)]
struct WireParam<'a> {
    value: &'a SqlValue,
    #[serde(rename = "type")]
    param_type: ParamType,
}

/// Collects parameters produced while compiling a statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    style: ParamStyle,
    entries: Vec<BoundParam>,
    index: HashMap<String, usize>,
    counters: HashMap<String, usize>,
}

impl Params {
    /// Creates an empty collector.
    #[must_use]
    pub fn new(style: ParamStyle) -> Self {
        Self {
            style,
            ..Self::default()
        }
    }

    /// Creates an empty collector of named markers.
    #[must_use]
    pub fn named() -> Self {
        Self::new(ParamStyle::Named)
    }

    /// Creates an empty collector of positional markers.
    #[must_use]
    pub fn positional() -> Self {
        Self::new(ParamStyle::Positional)
    }

    /// The marker style of this collector.
    #[must_use]
    pub const fn style(&self) -> ParamStyle {
        self.style
    }

    /// Records a value and returns the marker to put in the SQL text.
    ///
    /// In named mode the marker is `:{hint}{n}` where `n` counts the uses
    /// of `hint`; in positional mode it is always `?`. Without an explicit
    /// `param_type` the type is inferred from the value.
    pub fn create(
        &mut self,
        value: SqlValue,
        param_type: Option<ParamType>,
        hint: Option<&str>,
    ) -> String {
        let param_type = param_type.unwrap_or_else(|| value.param_type());
        match self.style {
            ParamStyle::Positional => {
                let position = self.entries.len() + 1;
                self.entries.push(BoundParam {
                    key: ParamKey::Position(position),
                    value,
                    param_type,
                });
                String::from("?")
            }
            ParamStyle::Named => {
                let marker = self.next_marker(&sanitize_hint(hint.unwrap_or("param")));
                self.index.insert(marker.clone(), self.entries.len());
                self.entries.push(BoundParam {
                    key: ParamKey::Named(marker.clone()),
                    value,
                    param_type,
                });
                marker
            }
        }
    }

    // `:eq1` from hint `eq` and `:eq11` from hint `eq1` could collide, so
    // the counter skips markers that already exist.
    fn next_marker(&mut self, hint: &str) -> String {
        let counter = self.counters.entry(String::from(hint)).or_insert(0);
        loop {
            *counter += 1;
            let marker = format!(":{hint}{counter}");
            if !self.index.contains_key(&marker) {
                return marker;
            }
        }
    }

    /// Returns true if no parameter has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of recorded parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Looks up a named parameter by marker (`":eq1"`).
    #[must_use]
    pub fn get(&self, marker: &str) -> Option<&BoundParam> {
        self.index.get(marker).map(|&i| &self.entries[i])
    }

    /// Looks up a positional parameter by 1-based position.
    #[must_use]
    pub fn get_position(&self, position: usize) -> Option<&BoundParam> {
        match self.style {
            ParamStyle::Positional => position.checked_sub(1).and_then(|i| self.entries.get(i)),
            ParamStyle::Named => None,
        }
    }

    /// Iterates over parameters in first-use order.
    pub fn iter(&self) -> std::slice::Iter<'_, BoundParam> {
        self.entries.iter()
    }

    /// Iterates over the bound values in first-use order.
    pub fn values(&self) -> impl Iterator<Item = &SqlValue> {
        self.entries.iter().map(BoundParam::value)
    }

    /// Runs `compile` against this collector and discards every parameter
    /// it recorded if it fails.
    ///
    /// # Errors
    ///
    /// Returns the error of `compile`.
    pub fn atomic<T>(&mut self, compile: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let len = self.entries.len();
        let counters = self.counters.clone();
        let result = compile(self);
        if result.is_err() {
            for entry in self.entries.drain(len..) {
                if let ParamKey::Named(marker) = entry.key {
                    self.index.remove(&marker);
                }
            }
            self.counters = counters;
        }
        result
    }

    /// Renders `sql` with every marker replaced by its quoted value.
    ///
    /// Markers inside quoted strings or quoted identifiers are left alone.
    /// Intended for logging and debugging; executing the result gives up
    /// the protection of bound parameters.
    ///
    /// # Errors
    ///
    /// Fails if the driver cannot quote one of the values, typically a
    /// string value on a driver without a connection.
    pub fn inline(&self, sql: &str, driver: &dyn Driver) -> Result<String> {
        let (left, right) = driver.identifier_quotes();
        let mut out = String::with_capacity(sql.len());
        let mut chars = sql.char_indices().peekable();
        let mut next_position = 1;
        let mut previous = None;

        while let Some((i, c)) = chars.next() {
            if c == '\'' || c == left {
                let close = if c == '\'' { '\'' } else { right };
                out.push(c);
                for (_, inner) in chars.by_ref() {
                    out.push(inner);
                    if inner == close {
                        break;
                    }
                }
                previous = Some(close);
                continue;
            }

            match (self.style, c) {
                (ParamStyle::Positional, '?') => {
                    match self.get_position(next_position) {
                        Some(param) => out.push_str(&driver.quote_value(param.value())?),
                        None => out.push('?'),
                    }
                    next_position += 1;
                }
                (ParamStyle::Named, ':')
                    if previous != Some(':')
                        && chars
                            .peek()
                            .is_some_and(|&(_, n)| n.is_ascii_alphabetic() || n == '_') =>
                {
                    let mut end = i + 1;
                    while let Some(&(j, n)) = chars.peek() {
                        if n.is_ascii_alphanumeric() || n == '_' {
                            end = j + n.len_utf8();
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    let marker = &sql[i..end];
                    match self.get(marker) {
                        Some(param) => out.push_str(&driver.quote_value(param.value())?),
                        None => out.push_str(marker),
                    }
                    previous = marker.chars().last();
                    continue;
                }
                _ => out.push(c),
            }
            previous = Some(c);
        }

        Ok(out)
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = &'a BoundParam;
    type IntoIter = std::slice::Iter<'a, BoundParam>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for Params {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(
                &entry.key,
                &WireParam {
                    value: &entry.value,
                    param_type: entry.param_type,
                },
            )?;
        }
        map.end()
    }
}

fn sanitize_hint(hint: &str) -> String {
    let mut sanitized: String = hint
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if sanitized.is_empty() {
        return String::from("param");
    }
    if sanitized.starts_with(|c: char| c.is_ascii_digit()) {
        sanitized.insert(0, 'p');
    }
    sanitized
}
