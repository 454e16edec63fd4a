use super::PersistValue;
use crate::error::{PersistError, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S%.f";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// MySQL 原生列类型标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeType {
    Tiny,
    Bit,
    Short,
    Int24,
    Long,
    LongLong,
    Year,
    Float,
    Double,
    Decimal,
    NewDecimal,
    VarChar,
    VarString,
    String,
    Enum,
    Set,
    Json,
    TinyBlob,
    MediumBlob,
    LongBlob,
    Blob,
    Date,
    NewDate,
    Time,
    DateTime,
    Timestamp,
    Null,
    Geometry,
}

impl NativeType {
    /// 根据驱动报告的类型名确定原生类型
    pub fn from_type_name(name: &str) -> Result<Self> {
        let upper = name.trim().to_ascii_uppercase();
        let base = upper.split_whitespace().next().unwrap_or_default();

        let native = match base {
            "TINYINT" | "BOOLEAN" | "BOOL" => NativeType::Tiny,
            "BIT" => NativeType::Bit,
            "SMALLINT" => NativeType::Short,
            "MEDIUMINT" => NativeType::Int24,
            "INT" | "INTEGER" => NativeType::Long,
            "BIGINT" => NativeType::LongLong,
            "YEAR" => NativeType::Year,
            "FLOAT" => NativeType::Float,
            "DOUBLE" => NativeType::Double,
            "DECIMAL" => NativeType::NewDecimal,
            "VARCHAR" => NativeType::VarChar,
            "CHAR" => NativeType::String,
            "ENUM" => NativeType::Enum,
            "SET" => NativeType::Set,
            "JSON" => NativeType::Json,
            "TINYBLOB" | "TINYTEXT" => NativeType::TinyBlob,
            "MEDIUMBLOB" | "MEDIUMTEXT" => NativeType::MediumBlob,
            "LONGBLOB" | "LONGTEXT" => NativeType::LongBlob,
            "BLOB" | "TEXT" | "BINARY" | "VARBINARY" => NativeType::Blob,
            "DATE" => NativeType::Date,
            "TIME" => NativeType::Time,
            "DATETIME" => NativeType::DateTime,
            "TIMESTAMP" => NativeType::Timestamp,
            "NULL" => NativeType::Null,
            "GEOMETRY" => NativeType::Geometry,
            _ => {
                return Err(PersistError::marshal(format!(
                    "无法识别的原生列类型: {name}"
                )));
            }
        };
        Ok(native)
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// 绑定到语句上的原生参数
#[derive(Debug, Clone, PartialEq)]
pub enum NativeParam {
    Null,
    Int(i64),
    Double(f64),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
}

/// 将持久化值编码为原生参数
///
/// List、Map、ObjectId 在该后端上没有对应的参数形式，属于调用方的编程错误，
/// 直接返回错误而不做任何转换。
pub fn encode(value: &PersistValue) -> Result<NativeParam> {
    match value {
        PersistValue::Null => Ok(NativeParam::Null),
        PersistValue::Bool(b) => Ok(NativeParam::Int(i64::from(*b))),
        PersistValue::Int64(i) => Ok(NativeParam::Int(*i)),
        PersistValue::Double(d) => Ok(NativeParam::Double(*d)),
        PersistValue::Text(s) => Ok(NativeParam::Text(s.clone())),
        PersistValue::Bytes(b) => Ok(NativeParam::Bytes(b.clone())),
        PersistValue::Date(d) => Ok(NativeParam::Date(*d)),
        PersistValue::TimeOfDay(t) => Ok(NativeParam::Time(*t)),
        PersistValue::DateTime(dt) => Ok(NativeParam::DateTime(*dt)),
        PersistValue::List(_) | PersistValue::Map(_) | PersistValue::ObjectId(_) => {
            Err(PersistError::marshal(format!(
                "MySQL 不支持 {} 类型的参数",
                value.kind()
            )))
        }
    }
}

/// 将文本协议返回的列值解码为持久化值
///
/// `raw` 为 `None` 表示 SQL NULL，无论列类型如何都解码为 `PersistValue::Null`。
pub fn decode(native: NativeType, raw: Option<&[u8]>) -> Result<PersistValue> {
    let Some(bytes) = raw else {
        return Ok(PersistValue::Null);
    };

    match native {
        NativeType::Tiny => Ok(PersistValue::Bool(parse_int(native, bytes)? != 0)),
        NativeType::Bit => Ok(PersistValue::Bool(bytes.iter().any(|b| *b != 0))),
        NativeType::Short
        | NativeType::Int24
        | NativeType::Long
        | NativeType::LongLong
        | NativeType::Year => Ok(PersistValue::Int64(parse_int(native, bytes)?)),
        NativeType::Float | NativeType::Double | NativeType::Decimal | NativeType::NewDecimal => {
            let text = as_utf8(native, bytes)?;
            text.trim()
                .parse::<f64>()
                .map(PersistValue::Double)
                .map_err(|e| PersistError::marshal(format!("{native} 列值 '{text}' 不是浮点数: {e}")))
        }
        NativeType::VarChar
        | NativeType::VarString
        | NativeType::String
        | NativeType::Enum
        | NativeType::Set
        | NativeType::Json => Ok(PersistValue::Text(as_utf8(native, bytes)?.to_string())),
        NativeType::TinyBlob | NativeType::MediumBlob | NativeType::LongBlob | NativeType::Blob => {
            Ok(PersistValue::Bytes(bytes.to_vec()))
        }
        NativeType::Date | NativeType::NewDate => {
            let text = as_utf8(native, bytes)?;
            NaiveDate::parse_from_str(text, DATE_FORMAT)
                .map(PersistValue::Date)
                .map_err(|e| PersistError::marshal(format!("{native} 列值 '{text}' 不是日期: {e}")))
        }
        NativeType::Time => {
            let text = as_utf8(native, bytes)?;
            NaiveTime::parse_from_str(text, TIME_FORMAT)
                .map(PersistValue::TimeOfDay)
                .map_err(|e| PersistError::marshal(format!("{native} 列值 '{text}' 不是时间: {e}")))
        }
        NativeType::DateTime | NativeType::Timestamp => {
            let text = as_utf8(native, bytes)?;
            NaiveDateTime::parse_from_str(text, DATETIME_FORMAT)
                .map(PersistValue::DateTime)
                .map_err(|e| {
                    PersistError::marshal(format!("{native} 列值 '{text}' 不是日期时间: {e}"))
                })
        }
        NativeType::Null => Ok(PersistValue::Null),
        NativeType::Geometry => Err(PersistError::marshal(format!(
            "不支持的原生列类型: {native}"
        ))),
    }
}

/// 将原生参数渲染为可直接内联到语句中的SQL字面量
pub fn render_literal(param: &NativeParam) -> String {
    match param {
        NativeParam::Null => "NULL".to_string(),
        NativeParam::Int(i) => i.to_string(),
        NativeParam::Double(d) => d.to_string(),
        NativeParam::Text(s) => quote_string(s),
        NativeParam::Bytes(b) => {
            let hex: String = b.iter().map(|byte| format!("{byte:02X}")).collect();
            format!("X'{hex}'")
        }
        NativeParam::Date(d) => quote_string(&d.format(DATE_FORMAT).to_string()),
        NativeParam::Time(t) => quote_string(&t.format(TIME_FORMAT).to_string()),
        NativeParam::DateTime(dt) => quote_string(&dt.format(DATETIME_FORMAT).to_string()),
    }
}

fn quote_string(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "''"))
}

fn as_utf8(native: NativeType, bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes)
        .map_err(|e| PersistError::marshal(format!("{native} 列值不是有效的UTF-8: {e}")))
}

fn parse_int(native: NativeType, bytes: &[u8]) -> Result<i64> {
    let text = as_utf8(native, bytes)?;
    text.trim()
        .parse::<i64>()
        .map_err(|e| PersistError::marshal(format!("{native} 列值 '{text}' 不是整数: {e}")))
}
