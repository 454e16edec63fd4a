use crate::schema::Column;

/// 列级变更
#[derive(Debug, Clone, PartialEq)]
pub enum AlterColumn {
    Add(Column),
    /// 修改类型/可空性，整列重新定义
    Change(Column),
    Drop,
    SetDefault(String),
    ClearDefault,
    /// 将现有 NULL 值更新为给定默认值（改为 NOT NULL 之前执行）
    SetAllNullToValue(String),
    AddForeignKey { table: String, column: String },
    /// 按约束名删除外键
    DropForeignKey(String),
}

/// 表级变更
#[derive(Debug, Clone, PartialEq)]
pub enum AlterTable {
    AddUniqueConstraint { name: String, columns: Vec<String> },
    DropUniqueConstraint(String),
}

/// 一项数据库变更
#[derive(Debug, Clone, PartialEq)]
pub enum AlterDb {
    /// 携带完整的 CREATE TABLE 语句
    CreateTable(String),
    AlterColumn {
        table: String,
        column: String,
        action: AlterColumn,
    },
    AlterTable { table: String, action: AlterTable },
}

impl AlterDb {
    /// 只有删除列会丢失数据
    pub fn is_unsafe(&self) -> bool {
        matches!(
            self,
            AlterDb::AlterColumn {
                action: AlterColumn::Drop,
                ..
            }
        )
    }
}

/// 渲染后的迁移语句
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatement {
    pub is_unsafe: bool,
    pub sql: String,
}

impl MigrationStatement {
    pub fn new(is_unsafe: bool, sql: impl Into<String>) -> Self {
        Self {
            is_unsafe,
            sql: sql.into(),
        }
    }
}

/// 单个实体的规划结果
#[derive(Debug)]
pub struct EntityPlan {
    pub entity: String,
    pub result: crate::error::Result<Vec<MigrationStatement>>,
}

/// 一次迁移执行的汇总
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub executed: Vec<String>,
    pub skipped: Vec<String>,
}
