//! Typed extraction from [`Value`]s

use std::path::PathBuf;

use crate::error::{CastError, Result};
use crate::value::{Value, Vector};

/// Conversion from a cast value into a concrete Rust type
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self>;
}

fn mismatch(expected: &'static str, value: &Value) -> CastError {
    CastError::Type {
        expected,
        found: value.type_name(),
    }
}

/// Convert a setter argument. A one-element tuple is unpacked when the
/// target type does not accept the tuple itself.
pub fn from_arg<T: FromValue>(value: Value) -> Result<T> {
    match value {
        Value::Tuple(mut items) if items.len() == 1 => {
            match T::from_value(Value::Tuple(items.clone())) {
                Ok(converted) => Ok(converted),
                Err(_) => T::from_value(items.remove(0)),
            }
        }
        other => T::from_value(other),
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch("bool", &other)),
        }
    }
}

macro_rules! impl_from_value_int {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self> {
                    match value {
                        Value::Int(n) => <$ty>::try_from(n).map_err(|_| {
                            CastError::Value(format!("{} out of range for {}", n, stringify!($ty)))
                        }),
                        Value::BitMask(mask) => <$ty>::try_from(mask).map_err(|_| {
                            CastError::Value(format!("{} out of range for {}", mask, stringify!($ty)))
                        }),
                        other => Err(mismatch("int", &other)),
                    }
                }
            }
        )*
    };
}

impl_from_value_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self> {
        value.as_float().ok_or_else(|| mismatch("float", &value))
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self> {
        f64::from_value(value).map(|f| f as f32)
    }
}

impl FromValue for String {
    /// Strings, plus scalars rendered as text
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            Value::Int(_) | Value::Float(_) | Value::Bool(_) => Ok(value.to_string()),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl FromValue for PathBuf {
    fn from_value(value: Value) -> Result<Self> {
        String::from_value(value).map(PathBuf::from)
    }
}

impl FromValue for Vector {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Vector(v) => Ok(v),
            other => Err(mismatch("vector", &other)),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::List(items) | Value::Tuple(items) => {
                items.into_iter().map(T::from_value).collect()
            }
            other => Err(mismatch("list", &other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::None => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

macro_rules! impl_from_value_tuple {
    ($len:expr; $($name:ident),+) => {
        impl<$($name: FromValue),+> FromValue for ($($name,)+) {
            fn from_value(value: Value) -> Result<Self> {
                match value {
                    Value::Tuple(items) | Value::List(items) if items.len() == $len => {
                        let mut items = items.into_iter();
                        Ok(($(
                            $name::from_value(items.next().ok_or_else(|| {
                                CastError::Value("tuple too short".to_string())
                            })?)?,
                        )+))
                    }
                    Value::Tuple(items) | Value::List(items) => Err(CastError::Value(format!(
                        "expected {} elements, found {}",
                        $len,
                        items.len()
                    ))),
                    other => Err(mismatch("tuple", &other)),
                }
            }
        }
    };
}

impl_from_value_tuple!(1; A);
impl_from_value_tuple!(2; A, B);
impl_from_value_tuple!(3; A, B, C);
impl_from_value_tuple!(4; A, B, C, D);
