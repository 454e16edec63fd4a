// 表结构读取模块
//
// SchemaSource 是迁移规划读取"实际表结构"的入口：
// - Introspector: 通过 QueryRunner 查询 INFORMATION_SCHEMA（在线数据库）
// - DumpSchema: 解析 CREATE TABLE 导出文件（离线规划）
//
// 读取结果是逐行带成功/失败标记的序列，某一列的类型无法识别时只让这一行失败，
// 由迁移规划统一决定是否继续。

mod dump;
#[cfg(test)]
pub(crate) mod testing;

use crate::error::{PersistError, Result};
use crate::model::EntityDef;
use crate::schema::{Column, ColumnReference, UniqueGroup};
use crate::sql_type;
use crate::value::PersistValue;
use async_trait::async_trait;
use tracing::{debug, info};

pub use dump::DumpSchema;

/// 查询执行协作方
#[async_trait]
pub trait QueryRunner: Send + Sync {
    /// 执行查询并按列顺序返回每一行的值
    async fn run_query(&self, sql: &str, params: &[PersistValue])
    -> Result<Vec<Vec<PersistValue>>>;

    /// 执行不返回结果集的语句，返回受影响行数
    async fn execute(&self, sql: &str) -> Result<u64>;
}

/// 读取到的一项表结构
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaEntry {
    Column(Column),
    Unique(UniqueGroup),
}

/// 单行读取结果，失败时携带错误描述
pub type IntrospectedRow = std::result::Result<SchemaEntry, String>;

/// 实际表结构的来源
#[async_trait]
pub trait SchemaSource: Send + Sync {
    /// 读取实体对应表的结构；返回空列表表示表不存在
    async fn introspect(&self, entity: &EntityDef) -> Result<Vec<IntrospectedRow>>;
}

const COLUMNS_QUERY: &str = r#"
    SELECT
        CAST(COLUMN_NAME AS CHAR(255)) AS COLUMN_NAME,
        CAST(IS_NULLABLE AS CHAR(3)) AS IS_NULLABLE,
        CAST(DATA_TYPE AS CHAR(255)) AS DATA_TYPE,
        CAST(COLUMN_DEFAULT AS CHAR) AS COLUMN_DEFAULT,
        CAST(CHARACTER_MAXIMUM_LENGTH AS CHAR) AS CHARACTER_MAXIMUM_LENGTH
    FROM INFORMATION_SCHEMA.COLUMNS
    WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? AND COLUMN_NAME <> ?
    ORDER BY ORDINAL_POSITION
"#;

const UNIQUE_QUERY: &str = r#"
    SELECT
        CAST(CONSTRAINT_NAME AS CHAR(255)) AS CONSTRAINT_NAME,
        CAST(COLUMN_NAME AS CHAR(255)) AS COLUMN_NAME
    FROM INFORMATION_SCHEMA.KEY_COLUMN_USAGE
    WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? AND COLUMN_NAME <> ?
      AND CONSTRAINT_NAME <> 'PRIMARY'
      AND REFERENCED_TABLE_SCHEMA IS NULL
    ORDER BY CONSTRAINT_NAME, COLUMN_NAME
"#;

const REFERENCE_QUERY: &str = r#"
    SELECT
        CAST(REFERENCED_TABLE_NAME AS CHAR(255)) AS REFERENCED_TABLE_NAME,
        CAST(REFERENCED_COLUMN_NAME AS CHAR(255)) AS REFERENCED_COLUMN_NAME,
        CAST(CONSTRAINT_NAME AS CHAR(255)) AS CONSTRAINT_NAME
    FROM INFORMATION_SCHEMA.KEY_COLUMN_USAGE
    WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? AND COLUMN_NAME = ?
      AND REFERENCED_TABLE_SCHEMA = ?
    ORDER BY CONSTRAINT_NAME
"#;

/// 在线数据库表结构读取器
pub struct Introspector<R> {
    runner: R,
    schema: String,
}

impl<R: QueryRunner> Introspector<R> {
    /// `schema` 为 INFORMATION_SCHEMA 中的 TABLE_SCHEMA（数据库名）
    pub fn new(runner: R, schema: impl Into<String>) -> Self {
        Self {
            runner,
            schema: schema.into(),
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// 读取全部非主键列
    async fn load_columns(&self, entity: &EntityDef) -> Result<Vec<IntrospectedRow>> {
        let params = [
            PersistValue::from(self.schema.as_str()),
            PersistValue::from(entity.table.as_str()),
            PersistValue::from(entity.id_column.as_str()),
        ];
        let rows = self.runner.run_query(COLUMNS_QUERY, &params).await?;

        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let [name, is_nullable, data_type, default, max_len] = row_values::<5>(row, "列定义")?;
            let name = expect_text(&name, "COLUMN_NAME")?.to_string();
            let nullable = expect_text(&is_nullable, "IS_NULLABLE")? == "YES";
            let data_type = expect_text(&data_type, "DATA_TYPE")?;
            let default = decode_default(&name, &default)?;

            let sql_type = match sql_type::parse(data_type) {
                Ok(sql_type) => sql_type,
                Err(e) => {
                    debug!("列 {} 的类型无法识别: {}", name, data_type);
                    results.push(Err(format!("列 {}.{}: {e}", entity.table, name)));
                    continue;
                }
            };

            let max_len = if sql_type.uses_max_len() {
                decode_max_len(&name, &max_len)?
            } else {
                None
            };

            let reference = self.load_reference(entity, &name).await?;

            results.push(Ok(SchemaEntry::Column(Column {
                name,
                nullable,
                sql_type,
                default,
                max_len,
                reference,
            })));
        }
        Ok(results)
    }

    /// 查询列参与的外键：0 行表示无引用，1 行为引用，多行说明结构不一致
    async fn load_reference(
        &self,
        entity: &EntityDef,
        column: &str,
    ) -> Result<Option<ColumnReference>> {
        let params = [
            PersistValue::from(self.schema.as_str()),
            PersistValue::from(entity.table.as_str()),
            PersistValue::from(column),
            PersistValue::from(self.schema.as_str()),
        ];
        let mut rows = self.runner.run_query(REFERENCE_QUERY, &params).await?;

        match rows.len() {
            0 => Ok(None),
            1 => {
                let [table, ref_column, constraint] =
                    row_values::<3>(rows.remove(0), "外键定义")?;
                Ok(Some(ColumnReference {
                    table: expect_text(&table, "REFERENCED_TABLE_NAME")?.to_string(),
                    column: expect_text(&ref_column, "REFERENCED_COLUMN_NAME")?.to_string(),
                    constraint: expect_text(&constraint, "CONSTRAINT_NAME")?.to_string(),
                }))
            }
            n => Err(PersistError::inconsistency(format!(
                "列 {}.{} 存在 {n} 个外键约束",
                entity.table, column
            ))),
        }
    }

    /// 读取非外键的唯一约束，按约束名分组
    async fn load_uniques(&self, entity: &EntityDef) -> Result<Vec<IntrospectedRow>> {
        let params = [
            PersistValue::from(self.schema.as_str()),
            PersistValue::from(entity.table.as_str()),
            PersistValue::from(entity.id_column.as_str()),
        ];
        let rows = self.runner.run_query(UNIQUE_QUERY, &params).await?;

        let mut pairs = Vec::with_capacity(rows.len());
        for row in rows {
            let [constraint, column] = row_values::<2>(row, "唯一约束")?;
            pairs.push((
                expect_text(&constraint, "CONSTRAINT_NAME")?.to_string(),
                expect_text(&column, "COLUMN_NAME")?.to_string(),
            ));
        }

        Ok(group_adjacent(pairs)
            .into_iter()
            .map(|group| Ok(SchemaEntry::Unique(group)))
            .collect())
    }
}

#[async_trait]
impl<R: QueryRunner> SchemaSource for Introspector<R> {
    async fn introspect(&self, entity: &EntityDef) -> Result<Vec<IntrospectedRow>> {
        let mut rows = self.load_columns(entity).await?;
        rows.extend(self.load_uniques(entity).await?);
        info!("读取表结构: {} ({} 项)", entity.table, rows.len());
        Ok(rows)
    }
}

/// 将已按约束名排序的 (约束名, 列名) 序列按相邻的相同约束名分组
pub fn group_adjacent(pairs: Vec<(String, String)>) -> Vec<UniqueGroup> {
    let mut groups: Vec<UniqueGroup> = Vec::new();
    for (constraint, column) in pairs {
        match groups.last_mut() {
            Some(group) if group.name == constraint => group.columns.push(column),
            _ => groups.push(UniqueGroup::new(constraint, vec![column])),
        }
    }
    groups
}

fn row_values<const N: usize>(row: Vec<PersistValue>, what: &str) -> Result<[PersistValue; N]> {
    let len = row.len();
    row.try_into().map_err(|_| {
        PersistError::marshal(format!("{what}查询应返回 {N} 列，实际为 {len} 列"))
    })
}

fn expect_text<'a>(value: &'a PersistValue, column: &str) -> Result<&'a str> {
    value.as_text().ok_or_else(|| {
        PersistError::marshal(format!("{column} 应为文本，实际为 {}", value.kind()))
    })
}

/// 默认值：Null 表示无默认值，文本为默认值，其他类型无法解析
fn decode_default(column: &str, value: &PersistValue) -> Result<Option<String>> {
    match value {
        PersistValue::Null => Ok(None),
        PersistValue::Text(_) | PersistValue::Bytes(_) => match value.as_text() {
            Some(text) => Ok(Some(text.to_string())),
            None => Err(PersistError::marshal(format!(
                "列 {column} 的默认值不是有效的UTF-8"
            ))),
        },
        other => Err(PersistError::marshal(format!(
            "列 {column} 的默认值无法解析: {other:?}"
        ))),
    }
}

fn decode_max_len(column: &str, value: &PersistValue) -> Result<Option<u32>> {
    match value {
        PersistValue::Null => Ok(None),
        PersistValue::Int64(n) => u32::try_from(*n).map(Some).map_err(|_| {
            PersistError::marshal(format!("列 {column} 的长度超出范围: {n}"))
        }),
        PersistValue::Text(_) | PersistValue::Bytes(_) => {
            let text = value.as_text().unwrap_or_default();
            text.trim().parse::<u32>().map(Some).map_err(|e| {
                PersistError::marshal(format!("列 {column} 的长度 '{text}' 无法解析: {e}"))
            })
        }
        other => Err(PersistError::marshal(format!(
            "列 {column} 的长度无法解析: {other:?}"
        ))),
    }
}
