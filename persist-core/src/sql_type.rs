use crate::constants::ddl::DEFAULT_VARCHAR_LENGTH;
use crate::error::{PersistError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 抽象列类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlType {
    Bool,
    Int32,
    Int64,
    Real,
    String,
    Blob,
    Day,
    TimeOfDay,
    DayTime,
}

impl SqlType {
    pub const ALL: [SqlType; 9] = [
        SqlType::Bool,
        SqlType::Int32,
        SqlType::Int64,
        SqlType::Real,
        SqlType::String,
        SqlType::Blob,
        SqlType::Day,
        SqlType::TimeOfDay,
        SqlType::DayTime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SqlType::Bool => "Bool",
            SqlType::Int32 => "Int32",
            SqlType::Int64 => "Int64",
            SqlType::Real => "Real",
            SqlType::String => "String",
            SqlType::Blob => "Blob",
            SqlType::Day => "Day",
            SqlType::TimeOfDay => "TimeOfDay",
            SqlType::DayTime => "DayTime",
        }
    }

    /// 只有字符串列的长度参与结构比较
    pub fn uses_max_len(&self) -> bool {
        matches!(self, SqlType::String)
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 按模型文件中的类型名解析（区分大小写，与 `as_str` 对应）
impl FromStr for SqlType {
    type Err = PersistError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Bool" => Ok(SqlType::Bool),
            "Int32" => Ok(SqlType::Int32),
            "Int64" | "Integer" => Ok(SqlType::Int64),
            "Real" | "Double" => Ok(SqlType::Real),
            "String" | "Text" => Ok(SqlType::String),
            "Blob" | "Bytes" => Ok(SqlType::Blob),
            "Day" | "Date" => Ok(SqlType::Day),
            "TimeOfDay" | "Time" => Ok(SqlType::TimeOfDay),
            "DayTime" | "DateTime" => Ok(SqlType::DayTime),
            _ => Err(PersistError::UnknownType(s.to_string())),
        }
    }
}

/// 生成DDL中使用的MySQL列类型
pub fn render(sql_type: SqlType, max_len: Option<u32>) -> String {
    match sql_type {
        SqlType::Bool => "TINYINT(1)".to_string(),
        SqlType::Int32 => "INT".to_string(),
        SqlType::Int64 => "BIGINT".to_string(),
        SqlType::Real => "DOUBLE".to_string(),
        SqlType::String => format!("VARCHAR({})", max_len.unwrap_or(DEFAULT_VARCHAR_LENGTH)),
        SqlType::Blob => "BLOB".to_string(),
        SqlType::Day => "DATE".to_string(),
        SqlType::TimeOfDay => "TIME".to_string(),
        SqlType::DayTime => "DATETIME".to_string(),
    }
}

/// 解析从 INFORMATION_SCHEMA 或建表语句读到的类型名
///
/// 忽略括号内的参数和其后的修饰（`unsigned`、`character set ...`），
/// 例如 `tinyint(1)`、`VARCHAR(255)`、`int unsigned` 都可以识别。
pub fn parse(type_name: &str) -> Result<SqlType> {
    let normalized = type_name.trim().to_ascii_lowercase();
    let base = normalized
        .split(|c: char| c == '(' || c.is_whitespace())
        .next()
        .unwrap_or_default();

    match base {
        "tinyint" | "bit" | "bool" | "boolean" => Ok(SqlType::Bool),
        "smallint" | "mediumint" | "int" | "integer" => Ok(SqlType::Int32),
        "bigint" => Ok(SqlType::Int64),
        "float" | "double" | "real" | "decimal" | "numeric" => Ok(SqlType::Real),
        "char" | "varchar" | "tinytext" | "text" | "mediumtext" | "longtext" | "enum" | "set"
        | "json" => Ok(SqlType::String),
        "binary" | "varbinary" | "tinyblob" | "blob" | "mediumblob" | "longblob" => {
            Ok(SqlType::Blob)
        }
        "date" | "year" => Ok(SqlType::Day),
        "time" => Ok(SqlType::TimeOfDay),
        "datetime" | "timestamp" => Ok(SqlType::DayTime),
        _ => Err(PersistError::UnknownType(type_name.to_string())),
    }
}
