/*!
Implementations of [`FromValue`] for various primitive and standard library
types
 */

use std::path::PathBuf;

use crate::value::{FromValue, Value};

macro_rules! integers {
    ($($type:ident)*) => {
        $(
            impl FromValue for $type {
                #[inline]
                fn from_value(value: &Value) -> Option<Self> {
                    match *value {
                        Value::Int(i) => i.try_into().ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

integers! {
    u8 u16 u32 u64 u128 usize
    i8 i16 i32 i64 i128 isize
}

impl FromValue for f64 {
    #[inline]
    fn from_value(value: &Value) -> Option<Self> {
        match *value {
            Value::Float(x) => Some(x),
            Value::Int(i) => Some(i as f64),
            _ => None,
        }
    }
}

impl FromValue for f32 {
    #[inline]
    fn from_value(value: &Value) -> Option<Self> {
        f64::from_value(value).map(|x| x as f32)
    }
}

impl FromValue for bool {
    #[inline]
    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for String {
    #[inline]
    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_owned)
    }
}

impl FromValue for PathBuf {
    #[inline]
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Path(path) => Some(path.clone()),
            Value::Str(s) => Some(PathBuf::from(s)),
            _ => None,
        }
    }
}

impl FromValue for Value {
    #[inline]
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

/// `None` is a successfully extracted absent value; anything else must
/// extract as `T`.
impl<T: FromValue> FromValue for Option<T> {
    #[inline]
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::None => Some(None),
            value => T::from_value(value).map(Some),
        }
    }
}

/// Lists and tuples extract item-wise; `None` is an empty vector, so that
/// unsupplied `multiple` parameters read naturally.
impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::None => Some(Vec::new()),
            Value::List(items) | Value::Tuple(items) => items.iter().map(T::from_value).collect(),
            _ => None,
        }
    }
}

macro_rules! tuples {
    ($($len:literal => ($($name:ident)+),)+) => {$(
        impl<$($name: FromValue),+> FromValue for ($($name,)+) {
            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::Tuple(items) | Value::List(items) if items.len() == $len => {
                        let mut items = items.iter();
                        Some(($($name::from_value(items.next()?)?,)+))
                    }
                    _ => None,
                }
            }
        }
    )+};
}

tuples! {
    1 => (A),
    2 => (A B),
    3 => (A B C),
    4 => (A B C D),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_check_range() {
        assert_eq!(u8::from_value(&Value::Int(255)), Some(255));
        assert_eq!(u8::from_value(&Value::Int(256)), None);
        assert_eq!(i64::from_value(&Value::Str("3".into())), None);
    }

    #[test]
    fn options_and_vectors() {
        assert_eq!(Option::<i64>::from_value(&Value::None), Some(None));
        assert_eq!(Option::<i64>::from_value(&Value::Int(2)), Some(Some(2)));
        assert_eq!(Vec::<i64>::from_value(&Value::None), Some(Vec::new()));
        assert_eq!(
            Vec::<String>::from_value(&Value::List(Vec::from([
                Value::Str("a".into()),
                Value::Str("b".into())
            ]))),
            Some(Vec::from(["a".to_owned(), "b".to_owned()]))
        );
    }

    #[test]
    fn tuples_require_exact_length() {
        let value = Value::Tuple(Vec::from([Value::Str("x".into()), Value::Int(1)]));
        assert_eq!(
            <(String, i64)>::from_value(&value),
            Some(("x".to_owned(), 1))
        );
        assert_eq!(<(String, i64, i64)>::from_value(&value), None);
    }
}
