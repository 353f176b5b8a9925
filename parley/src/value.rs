/*!
The dynamic value model. Every resolved parameter value, default, and
handler return value is a [`Value`]; [`FromValue`] gets ordinary Rust types
back out of one.
 */

use std::{fmt, path::PathBuf};

use joinery::JoinableIterator;

/// A resolved (or not yet converted) parameter value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// No value at all, such as an optional option that wasn't given
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Path(PathBuf),

    /// A fixed-arity group of values, from `nargs > 1` or a tuple type
    Tuple(Vec<Value>),

    /// An accumulated group of values, from `multiple` or a variadic argument
    List(Vec<Value>),
}

impl Value {
    #[inline]
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match *self {
            Value::Int(i) => Some(i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    /// Get the items of a list or tuple
    #[must_use]
    pub fn as_slice(&self) -> Option<&[Value]> {
        match self {
            Value::Tuple(items) | Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Convert this value into some other type, if it has a compatible shape.
    #[inline]
    #[must_use]
    pub fn get<T: FromValue>(&self) -> Option<T> {
        T::from_value(self)
    }

    /// Break a value into its items. Lists and tuples give their contents,
    /// `None` gives nothing, and anything else is a single item.
    #[must_use]
    pub fn into_items(self) -> Vec<Value> {
        match self {
            Value::None => Vec::new(),
            Value::Tuple(items) | Value::List(items) => items,
            value => Vec::from([value]),
        }
    }

    /// True for `None` and for empty lists and tuples
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Value::None => true,
            Value::Tuple(items) | Value::List(items) => items.is_empty(),
            _ => false,
        }
    }

    /// The name of the kind of this value, for diagnostics
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Path(_) => "path",
            Value::Tuple(_) => "tuple",
            Value::List(_) => "list",
        }
    }
}

/// Values print the way they'd be typed on the command line. Lists and
/// tuples are comma separated; this is how defaults appear in help text.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::Path(path) => write!(f, "{}", path.display()),
            Value::Tuple(items) | Value::List(items) => {
                write!(f, "{}", items.iter().join_with(", "))
            }
        }
    }
}

/**
Types that can be extracted from a resolved [`Value`].

This is the typed view over the dynamic model: handlers usually read their
parameters with `ctx.get::<i64>("count")` rather than matching on [`Value`]
by hand. Implementations are lenient only where no information is lost (an
`Int` can be read as an `f64`, a `Str` as a `PathBuf`).
*/
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! from_primitive {
    ($($variant:ident($type:ty)),* $(,)?) => {$(
        impl From<$type> for Value {
            #[inline]
            fn from(value: $type) -> Self {
                Value::$variant(value.into())
            }
        }
    )*};
}

from_primitive! {
    Bool(bool),
    Int(i64),
    Int(i32),
    Int(u32),
    Int(u16),
    Int(u8),
    Float(f64),
    Float(f32),
    Str(String),
    Str(&str),
    Path(PathBuf),
    Path(&std::path::Path),
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

impl<A: Into<Value>, B: Into<Value>> From<(A, B)> for Value {
    fn from((a, b): (A, B)) -> Self {
        Value::Tuple(Vec::from([a.into(), b.into()]))
    }
}

impl<A: Into<Value>, B: Into<Value>, C: Into<Value>> From<(A, B, C)> for Value {
    fn from((a, b, c): (A, B, C)) -> Self {
        Value::Tuple(Vec::from([a.into(), b.into(), c.into()]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_collections() {
        let value = Value::List(Vec::from([Value::Int(1), Value::Str("two".into())]));
        assert_eq!(value.to_string(), "1, two");
        assert_eq!(Value::None.to_string(), "");
    }

    #[test]
    fn into_items() {
        assert_eq!(Value::None.into_items(), Vec::new());
        assert_eq!(Value::Int(3).into_items(), Vec::from([Value::Int(3)]));
        assert_eq!(
            Value::List(Vec::from([Value::Bool(true)])).into_items(),
            Vec::from([Value::Bool(true)])
        );
    }

    #[test]
    fn conversions_into_value() {
        assert_eq!(Value::from(3u8), Value::Int(3));
        assert_eq!(Value::from(Some("x")), Value::Str("x".into()));
        assert_eq!(Value::from(None::<i64>), Value::None);
        assert_eq!(
            Value::from(("a", 1)),
            Value::Tuple(Vec::from([Value::Str("a".into()), Value::Int(1)]))
        );
    }
}
