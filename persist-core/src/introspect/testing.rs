//! 测试用的脚本化查询执行器，按表名返回预先准备好的元数据行

use super::{COLUMNS_QUERY, QueryRunner, REFERENCE_QUERY, UNIQUE_QUERY};
use crate::error::{PersistError, Result};
use crate::value::PersistValue;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default, Clone)]
pub(crate) struct TableScript {
    columns: Vec<Vec<PersistValue>>,
    uniques: Vec<Vec<PersistValue>>,
    references: HashMap<String, Vec<Vec<PersistValue>>>,
}

impl TableScript {
    pub(crate) fn column(
        self,
        name: &str,
        nullable: bool,
        data_type: &str,
        default: Option<&str>,
        max_len: Option<u32>,
    ) -> Self {
        self.raw_column(vec![
            name.into(),
            PersistValue::from(if nullable { "YES" } else { "NO" }),
            data_type.into(),
            default.map_or(PersistValue::Null, PersistValue::from),
            max_len.map_or(PersistValue::Null, |n| PersistValue::Text(n.to_string())),
        ])
    }

    pub(crate) fn raw_column(mut self, row: Vec<PersistValue>) -> Self {
        self.columns.push(row);
        self
    }

    /// 按调用顺序追加，调用方负责按 (约束名, 列名) 排序
    pub(crate) fn unique(mut self, constraint: &str, column: &str) -> Self {
        self.uniques.push(vec![constraint.into(), column.into()]);
        self
    }

    pub(crate) fn reference(
        mut self,
        column: &str,
        table: &str,
        ref_column: &str,
        constraint: &str,
    ) -> Self {
        self.references
            .entry(column.to_string())
            .or_default()
            .push(vec![table.into(), ref_column.into(), constraint.into()]);
        self
    }
}

#[derive(Debug, Default)]
pub(crate) struct ScriptedRunner {
    tables: HashMap<String, TableScript>,
    executed: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub(crate) fn with_table(mut self, table: &str, script: TableScript) -> Self {
        self.tables.insert(table.to_string(), script);
        self
    }

    pub(crate) fn executed(&self) -> Vec<String> {
        self.executed.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

fn text_param(params: &[PersistValue], index: usize) -> Result<&str> {
    params
        .get(index)
        .and_then(PersistValue::as_text)
        .ok_or_else(|| PersistError::custom(format!("缺少第 {index} 个文本参数")))
}

#[async_trait]
impl QueryRunner for ScriptedRunner {
    async fn run_query(
        &self,
        sql: &str,
        params: &[PersistValue],
    ) -> Result<Vec<Vec<PersistValue>>> {
        let table = text_param(params, 1)?;
        let Some(script) = self.tables.get(table) else {
            return Ok(Vec::new());
        };

        if sql == COLUMNS_QUERY {
            Ok(script.columns.clone())
        } else if sql == UNIQUE_QUERY {
            Ok(script.uniques.clone())
        } else if sql == REFERENCE_QUERY {
            let column = text_param(params, 2)?;
            Ok(script.references.get(column).cloned().unwrap_or_default())
        } else {
            Err(PersistError::custom(format!("未预期的查询: {sql}")))
        }
    }

    async fn execute(&self, sql: &str) -> Result<u64> {
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(sql.to_string());
        }
        Ok(1)
    }
}
