use super::PersistValue;
use crate::error::{PersistError, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// 从持久化值构造字段值
pub trait FromPersistValue: Sized {
    fn from_persist_value(value: &PersistValue) -> Result<Self>;
}

/// 将字段值转换为持久化值
pub trait ToPersistValue {
    fn to_persist_value(&self) -> PersistValue;
}

fn mismatch<T>(expected: &str, value: &PersistValue) -> Result<T> {
    Err(PersistError::marshal(format!(
        "期望 {expected}，实际为 {}: {value:?}",
        value.kind()
    )))
}

impl FromPersistValue for bool {
    fn from_persist_value(value: &PersistValue) -> Result<Self> {
        match value {
            PersistValue::Bool(b) => Ok(*b),
            PersistValue::Int64(i) => Ok(*i != 0),
            other => mismatch("Bool", other),
        }
    }
}

impl FromPersistValue for i64 {
    fn from_persist_value(value: &PersistValue) -> Result<Self> {
        match value {
            PersistValue::Int64(i) => Ok(*i),
            PersistValue::Bool(b) => Ok(i64::from(*b)),
            other => mismatch("Int64", other),
        }
    }
}

impl FromPersistValue for i32 {
    fn from_persist_value(value: &PersistValue) -> Result<Self> {
        let wide = i64::from_persist_value(value)?;
        i32::try_from(wide)
            .map_err(|_| PersistError::marshal(format!("整数 {wide} 超出 Int32 范围")))
    }
}

impl FromPersistValue for f64 {
    fn from_persist_value(value: &PersistValue) -> Result<Self> {
        match value {
            PersistValue::Double(d) => Ok(*d),
            PersistValue::Int64(i) => Ok(*i as f64),
            other => mismatch("Double", other),
        }
    }
}

impl FromPersistValue for String {
    fn from_persist_value(value: &PersistValue) -> Result<Self> {
        match value {
            PersistValue::Text(s) => Ok(s.clone()),
            PersistValue::Bytes(b) => String::from_utf8(b.clone())
                .map_err(|e| PersistError::marshal(format!("字节不是有效的UTF-8: {e}"))),
            other => mismatch("Text", other),
        }
    }
}

impl FromPersistValue for Vec<u8> {
    fn from_persist_value(value: &PersistValue) -> Result<Self> {
        match value {
            PersistValue::Bytes(b) => Ok(b.clone()),
            PersistValue::Text(s) => Ok(s.as_bytes().to_vec()),
            other => mismatch("Bytes", other),
        }
    }
}

impl FromPersistValue for NaiveDate {
    fn from_persist_value(value: &PersistValue) -> Result<Self> {
        match value {
            PersistValue::Date(d) => Ok(*d),
            PersistValue::DateTime(dt) => Ok(dt.date()),
            other => mismatch("Date", other),
        }
    }
}

impl FromPersistValue for NaiveTime {
    fn from_persist_value(value: &PersistValue) -> Result<Self> {
        match value {
            PersistValue::TimeOfDay(t) => Ok(*t),
            other => mismatch("TimeOfDay", other),
        }
    }
}

impl FromPersistValue for NaiveDateTime {
    fn from_persist_value(value: &PersistValue) -> Result<Self> {
        match value {
            PersistValue::DateTime(dt) => Ok(*dt),
            other => mismatch("DateTime", other),
        }
    }
}

impl<T: FromPersistValue> FromPersistValue for Option<T> {
    fn from_persist_value(value: &PersistValue) -> Result<Self> {
        match value {
            PersistValue::Null => Ok(None),
            other => T::from_persist_value(other).map(Some),
        }
    }
}

macro_rules! impl_to_persist_value {
    ($($ty:ty => |$v:ident| $body:expr),* $(,)?) => {
        $(
            impl ToPersistValue for $ty {
                fn to_persist_value(&self) -> PersistValue {
                    let $v = self;
                    $body
                }
            }
        )*
    };
}

impl_to_persist_value! {
    bool => |v| PersistValue::Bool(*v),
    i32 => |v| PersistValue::Int64(i64::from(*v)),
    i64 => |v| PersistValue::Int64(*v),
    f64 => |v| PersistValue::Double(*v),
    String => |v| PersistValue::Text(v.clone()),
    Vec<u8> => |v| PersistValue::Bytes(v.clone()),
    NaiveDate => |v| PersistValue::Date(*v),
    NaiveTime => |v| PersistValue::TimeOfDay(*v),
    NaiveDateTime => |v| PersistValue::DateTime(*v),
}

impl<T: ToPersistValue> ToPersistValue for Option<T> {
    fn to_persist_value(&self) -> PersistValue {
        match self {
            Some(v) => v.to_persist_value(),
            None => PersistValue::Null,
        }
    }
}
