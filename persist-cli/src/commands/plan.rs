use crate::app::CliApp;
use persist_core::{
    error::{PersistError, Result},
    introspect::{DumpSchema, SchemaSource},
    migration::{EntityPlan, MigrationStatement, Migrator},
    model::EntityDef,
};
use std::path::Path;
use tracing::{error, info};

/// 输出迁移计划，`snapshot` 指定时从导出文件读取表结构
pub async fn run_plan(app: &CliApp, entity: Option<&str>, snapshot: Option<&Path>) -> Result<()> {
    let defs = &app.models.entities;
    let only = entity.map(|name| app.models.get(name)).transpose()?;

    let plans = match snapshot {
        Some(path) => {
            let migrator = Migrator::new(DumpSchema::load_from_file(path)?);
            plan_entities(&migrator, defs, only).await
        }
        None => {
            let migrator = app.connect().await?;
            let plans = plan_entities(&migrator, defs, only).await;
            migrator.source().runner().close().await;
            plans
        }
    };

    let mut failed = 0;
    for plan in plans {
        match plan.result {
            Ok(statements) => print!("{}", format_plan(&plan.entity, &statements)),
            Err(e) => {
                failed += 1;
                error!("❌ 实体 {} 规划失败: {}", plan.entity, e);
                for detail in e.introspection_errors() {
                    error!("   - {}", detail);
                }
            }
        }
    }

    if failed > 0 {
        return Err(PersistError::custom(format!("{failed} 个实体规划失败")));
    }
    info!("✅ 规划完成");
    Ok(())
}

async fn plan_entities<S: SchemaSource>(
    migrator: &Migrator<S>,
    defs: &[EntityDef],
    only: Option<&EntityDef>,
) -> Vec<EntityPlan> {
    match only {
        Some(entity) => vec![EntityPlan {
            entity: entity.name.clone(),
            result: migrator.plan(defs, entity).await,
        }],
        None => migrator.plan_all(defs).await,
    }
}

/// 单个实体的计划文本，不安全语句前加注释标记
pub fn format_plan(entity: &str, statements: &[MigrationStatement]) -> String {
    let mut out = format!("-- {entity}\n");
    if statements.is_empty() {
        out.push_str("-- 无需变更\n");
    }
    for statement in statements {
        if statement.is_unsafe {
            out.push_str("-- [不安全] 会丢失数据\n");
        }
        out.push_str(&statement.sql);
        out.push_str(";\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_plan_marks_unsafe() {
        let text = format_plan(
            "Person",
            &[
                MigrationStatement::new(false, "ALTER TABLE `person` ADD COLUMN `age` INT NULL"),
                MigrationStatement::new(true, "ALTER TABLE `person` DROP COLUMN `legacy`"),
            ],
        );
        assert_eq!(
            text,
            "-- Person\n\
             ALTER TABLE `person` ADD COLUMN `age` INT NULL;\n\
             -- [不安全] 会丢失数据\n\
             ALTER TABLE `person` DROP COLUMN `legacy`;\n"
        );
    }

    #[test]
    fn test_format_empty_plan() {
        assert_eq!(format_plan("Pet", &[]), "-- Pet\n-- 无需变更\n");
    }
}
