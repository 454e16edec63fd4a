use crate::constants::ddl::DEFAULT_ID_COLUMN;
use crate::error::{PersistError, Result};
use crate::sql_type::SqlType;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// 字段的抽象类型
///
/// 可空性由 `Nullable` 包装表示；`Reference` 指向另一个已声明实体，
/// 以 BIGINT 存储并附带外键。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldType {
    Sql(SqlType),
    Reference(String),
    Nullable(Box<FieldType>),
}

impl FieldType {
    pub fn nullable(inner: FieldType) -> Self {
        FieldType::Nullable(Box::new(inner))
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, FieldType::Nullable(_))
    }

    /// 去掉可空包装后的类型
    pub fn base(&self) -> &FieldType {
        match self {
            FieldType::Nullable(inner) => inner.base(),
            other => other,
        }
    }

    /// 列的存储类型
    pub fn sql_type(&self) -> SqlType {
        match self.base() {
            FieldType::Sql(sql_type) => *sql_type,
            _ => SqlType::Int64,
        }
    }

    /// 引用的实体名
    pub fn reference(&self) -> Option<&str> {
        match self.base() {
            FieldType::Reference(entity) => Some(entity),
            _ => None,
        }
    }
}

/// 文本形式：`<类型>` 或 `<类型>?`，类型为 SqlType 名称或实体名
impl FromStr for FieldType {
    type Err = PersistError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(inner) = s.strip_suffix('?') {
            let inner = inner.parse::<FieldType>()?;
            if inner.is_nullable() {
                return Err(PersistError::model_parse(format!("重复的可空标记: {s}")));
            }
            return Ok(FieldType::nullable(inner));
        }
        if s.is_empty() || !s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(PersistError::model_parse(format!("无效的字段类型: '{s}'")));
        }
        match s.parse::<SqlType>() {
            Ok(sql_type) => Ok(FieldType::Sql(sql_type)),
            Err(_) => Ok(FieldType::Reference(s.to_string())),
        }
    }
}

impl TryFrom<String> for FieldType {
    type Error = PersistError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Sql(sql_type) => write!(f, "{sql_type}"),
            FieldType::Reference(entity) => f.write_str(entity),
            FieldType::Nullable(inner) => write!(f, "{inner}?"),
        }
    }
}

/// 字段定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    /// 列名，缺省时与字段名相同
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// 默认值文本（未加引号的值，或 NULL / CURRENT_TIMESTAMP）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_len: Option<u32>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            column: None,
            field_type,
            default: None,
            max_len: None,
        }
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_max_len(mut self, max_len: u32) -> Self {
        self.max_len = Some(max_len);
        self
    }

    pub fn column_name(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.name)
    }

    pub fn is_nullable(&self) -> bool {
        self.field_type.is_nullable()
    }
}

/// 唯一约束定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniqueDef {
    pub name: String,
    /// 参与约束的字段名（声明顺序）
    pub fields: Vec<String>,
}

impl UniqueDef {
    pub fn new(name: impl Into<String>, fields: &[&str]) -> Self {
        Self {
            name: name.into(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// 复合主键定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompositeDef {
    pub fields: Vec<String>,
}

/// 实体定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDef {
    pub name: String,
    pub table: String,
    #[serde(default = "default_id_column")]
    pub id_column: String,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<CompositeDef>,
    #[serde(default)]
    pub uniques: Vec<UniqueDef>,
}

fn default_id_column() -> String {
    DEFAULT_ID_COLUMN.to_string()
}

impl EntityDef {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            id_column: default_id_column(),
            fields: Vec::new(),
            primary_key: None,
            uniques: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_unique(mut self, unique: UniqueDef) -> Self {
        self.uniques.push(unique);
        self
    }

    pub fn with_composite_key(mut self, fields: &[&str]) -> Self {
        self.primary_key = Some(CompositeDef {
            fields: fields.iter().map(|f| f.to_string()).collect(),
        });
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// 字段名对应的列名
    pub fn column_of_field(&self, field_name: &str) -> Result<&str> {
        self.field(field_name)
            .map(FieldDef::column_name)
            .ok_or_else(|| {
                PersistError::inconsistency(format!(
                    "实体 {} 中不存在字段 {field_name}",
                    self.name
                ))
            })
    }
}

/// 一组实体定义（模型文件的内容）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSet {
    #[serde(default)]
    pub entities: Vec<EntityDef>,
}

impl ModelSet {
    pub fn new(entities: Vec<EntityDef>) -> Self {
        Self { entities }
    }

    /// 从指定文件加载模型
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let models = Self::from_toml_str(&content)?;
        tracing::info!(
            "从 {} 加载了 {} 个实体定义",
            path.as_ref().display(),
            models.entities.len()
        );
        Ok(models)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let models: ModelSet = toml::from_str(content)?;
        models.validate()?;
        Ok(models)
    }

    pub fn find(&self, name: &str) -> Option<&EntityDef> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn get(&self, name: &str) -> Result<&EntityDef> {
        self.find(name)
            .ok_or_else(|| PersistError::inconsistency(format!("未声明的实体: {name}")))
    }

    /// 检查模型内部的一致性：引用、唯一约束字段、复合主键字段、重复列名
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for entity in &self.entities {
            if !names.insert(entity.name.as_str()) {
                return Err(PersistError::inconsistency(format!(
                    "重复的实体名: {}",
                    entity.name
                )));
            }

            let mut columns = HashSet::new();
            for field in &entity.fields {
                let column = field.column_name();
                if column == entity.id_column && entity.primary_key.is_none() {
                    return Err(PersistError::inconsistency(format!(
                        "实体 {} 的字段 {} 与主键列同名",
                        entity.name, field.name
                    )));
                }
                if !columns.insert(column) {
                    return Err(PersistError::inconsistency(format!(
                        "实体 {} 中存在重复列 {column}",
                        entity.name
                    )));
                }
                if let Some(target) = field.field_type.reference() {
                    let target_def = self.get(target)?;
                    if target_def.primary_key.is_some() {
                        return Err(PersistError::inconsistency(format!(
                            "字段 {}.{} 不能引用复合主键实体 {target}",
                            entity.name, field.name
                        )));
                    }
                }
            }

            for unique in &entity.uniques {
                for field_name in &unique.fields {
                    entity.column_of_field(field_name)?;
                }
            }

            if let Some(composite) = &entity.primary_key {
                if composite.fields.is_empty() {
                    return Err(PersistError::inconsistency(format!(
                        "实体 {} 的复合主键为空",
                        entity.name
                    )));
                }
                for field_name in &composite.fields {
                    entity.column_of_field(field_name)?;
                }
            }
        }
        Ok(())
    }
}
