mod differ;
mod generator;
mod types;

#[cfg(test)]
mod tests;

use crate::error::Result;
use crate::introspect::{Introspector, QueryRunner, SchemaSource};
use crate::model::EntityDef;
use futures::future::join_all;
use tracing::{info, warn};

// 重新导出公共接口
pub use differ::{plan_actions, plan_table};
pub use generator::{foreign_key_name, quote_ident, render, render_column, render_create_table};
pub use types::{
    AlterColumn, AlterDb, AlterTable, EntityPlan, MigrationReport, MigrationStatement,
};

/// 迁移规划器：读取实际表结构，与实体声明比较后生成迁移语句
pub struct Migrator<S> {
    source: S,
}

impl<S: SchemaSource> Migrator<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// 为单个实体生成迁移语句，`all_defs` 用于解析引用字段
    pub async fn plan(
        &self,
        all_defs: &[EntityDef],
        entity: &EntityDef,
    ) -> Result<Vec<MigrationStatement>> {
        let rows = self.source.introspect(entity).await?;
        plan_table(all_defs, entity, rows)
    }

    /// 并发规划全部实体，每个实体的结果独立返回
    pub async fn plan_all(&self, all_defs: &[EntityDef]) -> Vec<EntityPlan> {
        join_all(all_defs.iter().map(|entity| async move {
            EntityPlan {
                entity: entity.name.clone(),
                result: self.plan(all_defs, entity).await,
            }
        }))
        .await
    }

    async fn plan_all_actions(&self, all_defs: &[EntityDef]) -> Result<Vec<AlterDb>> {
        let results = join_all(all_defs.iter().map(|entity| async move {
            let rows = self.source.introspect(entity).await;
            rows.and_then(|rows| plan_actions(all_defs, entity, rows))
        }))
        .await;

        let mut actions = Vec::new();
        for result in results {
            actions.extend(result?);
        }
        Ok(actions)
    }
}

/// 调整多个实体合并后的执行顺序：新增外键移到最后，其余保持原顺序
pub fn execution_order(actions: Vec<AlterDb>) -> Vec<AlterDb> {
    let (foreign_keys, mut others): (Vec<_>, Vec<_>) = actions.into_iter().partition(|action| {
        matches!(
            action,
            AlterDb::AlterColumn {
                action: AlterColumn::AddForeignKey { .. },
                ..
            }
        )
    });
    others.extend(foreign_keys);
    others
}

impl<R: QueryRunner> Migrator<Introspector<R>> {
    /// 规划并执行全部实体的迁移
    ///
    /// 新增外键统一放到最后执行，保证被引用的表已经创建。
    /// 未开启 `allow_unsafe` 时跳过会丢失数据的语句并记录在报告中。
    pub async fn migrate(
        &self,
        all_defs: &[EntityDef],
        allow_unsafe: bool,
    ) -> Result<MigrationReport> {
        let actions = execution_order(self.plan_all_actions(all_defs).await?);

        let mut report = MigrationReport::default();
        for statement in actions.iter().map(render) {
            if statement.is_unsafe && !allow_unsafe {
                warn!("跳过不安全的语句: {}", statement.sql);
                report.skipped.push(statement.sql);
                continue;
            }
            info!("执行: {}", statement.sql);
            self.source.runner().execute(&statement.sql).await?;
            report.executed.push(statement.sql);
        }

        info!(
            "迁移完成: 执行 {} 条，跳过 {} 条",
            report.executed.len(),
            report.skipped.len()
        );
        Ok(report)
    }
}
