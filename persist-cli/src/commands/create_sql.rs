use crate::app::CliApp;
use persist_core::{
    error::Result,
    migration::{execution_order, plan_actions, render},
    model::EntityDef,
};
use tracing::info;

/// 输出全部实体的建表语句
pub fn run_create_sql(app: &CliApp) -> Result<()> {
    print!("{}", render_create_sql(&app.models.entities)?);
    info!("✅ 已生成 {} 个实体的建表语句", app.models.entities.len());
    Ok(())
}

/// 按空库规划全部实体，外键语句统一放在最后
pub fn render_create_sql(defs: &[EntityDef]) -> Result<String> {
    let mut actions = Vec::new();
    for entity in defs {
        actions.extend(plan_actions(defs, entity, Vec::new())?);
    }

    let mut out = String::new();
    for statement in execution_order(actions).iter().map(render) {
        out.push_str(&statement.sql);
        out.push_str(";\n");
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use persist_core::model::{FieldDef, FieldType};
    use persist_core::sql_type::SqlType;

    #[test]
    fn test_create_sql_orders_foreign_keys_last() {
        let defs = vec![
            EntityDef::new("Pet", "pet").with_field(
                FieldDef::new("owner", FieldType::Reference("Person".into()))
                    .with_column("owner_id"),
            ),
            EntityDef::new("Person", "person")
                .with_field(FieldDef::new("name", FieldType::Sql(SqlType::String))),
        ];

        let sql = render_create_sql(&defs).unwrap();
        let lines: Vec<&str> = sql.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "CREATE TABLE `pet`(`id` BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY, `owner_id` BIGINT NOT NULL);"
        );
        assert!(lines[1].starts_with("CREATE TABLE `person`"));
        assert_eq!(
            lines[2],
            "ALTER TABLE `pet` ADD CONSTRAINT `pet_owner_id_fkey` FOREIGN KEY(`owner_id`) REFERENCES `person`(`id`);"
        );
    }
}
