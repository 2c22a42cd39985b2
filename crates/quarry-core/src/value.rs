// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Boxed runtime values.
//!
//! Every argument handed to a repository method and every bind value produced
//! by the translators is a [`Value`]. There are no unboxed primitives, so
//! "is null" is always observable.
//!
//! # Textual Form
//!
//! Condition patterns and literal SQL rendering work on the textual form
//! produced by `Display`:
//!
//! | Variant | Textual form |
//! |---------|--------------|
//! | `Null` | `null` |
//! | `Bool(true)` | `true` |
//! | `Int(18)` | `18` |
//! | `Float(1.5)` | `1.5` |
//! | `Text("a")` | `a` |
//! | `List([..])` | `"AA","BB","CC"` |

use std::fmt;

use serde::{Deserialize, Serialize};

/// A boxed, nullable runtime value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL `NULL` / absent argument.
    #[default]
    Null,

    /// Boolean.
    Bool(bool),

    /// Any integer width, widened.
    Int(i64),

    /// Any float width, widened.
    Float(f64),

    /// Text.
    Text(String),

    /// Sequence of values, typically for `IN (...)` lists.
    List(Vec<Value>)
}

impl Value {
    /// Check if this value is `Null`.
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check if this value is the empty string.
    ///
    /// Only `Text("")` counts; an empty list is not empty text.
    pub fn is_empty_text(&self) -> bool {
        matches!(self, Self::Text(s) if s.is_empty())
    }

    /// Render as an embedded SQL literal.
    ///
    /// Null becomes `NULL`, everything else is single-quoted with every `'`
    /// doubled. No other character is escaped.
    ///
    /// ```rust
    /// use quarry_core::Value;
    ///
    /// assert_eq!(Value::from("松'鼠").sql_literal(), "'松''鼠'");
    /// assert_eq!(Value::from(18).sql_literal(), "'18'");
    /// assert_eq!(Value::Null.sql_literal(), "NULL");
    /// ```
    pub fn sql_literal(&self) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            other => format!("'{}'", escape(&other.to_string()))
        }
    }
}

/// Double every single quote.
pub fn escape(text: &str) -> String {
    text.replace('\'', "''")
}

/// Render a sequence as comma-joined double-quoted items.
///
/// ```rust
/// use quarry_core::value::render_list;
///
/// assert_eq!(render_list(["AA", "BB", "CC"]), "\"AA\",\"BB\",\"CC\"");
/// ```
pub fn render_list<I, T>(items: I) -> String
where
    I: IntoIterator<Item = T>,
    T: Into<Value>
{
    items
        .into_iter()
        .map(|item| format!("\"{}\"", item.into()))
        .collect::<Vec<_>>()
        .join(",")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
            Self::List(items) => f.write_str(&render_list(items.iter().cloned()))
        }
    }
}

macro_rules! int_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::Int(i64::from(v))
                }
            }
        )*
    };
}

int_from!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(i) => Self::Int(i),
            Err(_) => Self::Text(v.to_string())
        }
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Self::from(v as u64)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Self::Text(v.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}
