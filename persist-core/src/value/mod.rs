// 值类型模块
//
// PersistValue 是在数据库原生列值与实体字段之间流转的统一表示：
// - codec: PersistValue 与 MySQL 原生参数/列值之间的转换
// - convert: PersistValue 与 Rust 基础类型之间的转换

mod codec;
mod convert;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

pub use codec::{NativeParam, NativeType, decode, encode, render_literal};
pub use convert::{FromPersistValue, ToPersistValue};

/// 带标签的持久化值
#[derive(Debug, Clone, PartialEq)]
pub enum PersistValue {
    Null,
    Bool(bool),
    Int64(i64),
    Double(f64),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    TimeOfDay(NaiveTime),
    DateTime(NaiveDateTime),
    List(Vec<PersistValue>),
    Map(Vec<(String, PersistValue)>),
    ObjectId(Vec<u8>),
}

impl PersistValue {
    /// 变体名称，用于错误信息
    pub fn kind(&self) -> &'static str {
        match self {
            PersistValue::Null => "Null",
            PersistValue::Bool(_) => "Bool",
            PersistValue::Int64(_) => "Int64",
            PersistValue::Double(_) => "Double",
            PersistValue::Text(_) => "Text",
            PersistValue::Bytes(_) => "Bytes",
            PersistValue::Date(_) => "Date",
            PersistValue::TimeOfDay(_) => "TimeOfDay",
            PersistValue::DateTime(_) => "DateTime",
            PersistValue::List(_) => "List",
            PersistValue::Map(_) => "Map",
            PersistValue::ObjectId(_) => "ObjectId",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PersistValue::Null)
    }

    /// 文本值；TEXT 类列在驱动层以字节形式返回，按 UTF-8 视为文本
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PersistValue::Text(s) => Some(s),
            PersistValue::Bytes(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }
}

impl From<&str> for PersistValue {
    fn from(value: &str) -> Self {
        PersistValue::Text(value.to_string())
    }
}

impl From<String> for PersistValue {
    fn from(value: String) -> Self {
        PersistValue::Text(value)
    }
}

impl From<i64> for PersistValue {
    fn from(value: i64) -> Self {
        PersistValue::Int64(value)
    }
}
