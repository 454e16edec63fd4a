use super::*;
use crate::error::PersistError;
use crate::introspect::DumpSchema;
use crate::introspect::testing::{ScriptedRunner, TableScript};
use crate::model::{FieldDef, FieldType, UniqueDef};
use crate::sql_type::SqlType;

fn person() -> EntityDef {
    EntityDef::new("Person", "person")
        .with_field(FieldDef::new("name", FieldType::Sql(SqlType::String)))
        .with_field(FieldDef::new(
            "age",
            FieldType::nullable(FieldType::Sql(SqlType::Int32)),
        ))
}

fn pet() -> EntityDef {
    EntityDef::new("Pet", "pet")
        .with_field(FieldDef::new("nick", FieldType::Sql(SqlType::String)).with_max_len(32))
        .with_field(
            FieldDef::new("owner", FieldType::Reference("Person".into())).with_column("owner_id"),
        )
}

/// 与 person() 声明完全一致的表结构
fn person_table() -> TableScript {
    TableScript::default()
        .column("name", false, "varchar", None, Some(255))
        .column("age", true, "int", None, None)
}

fn migrator(runner: ScriptedRunner) -> Migrator<Introspector<ScriptedRunner>> {
    Migrator::new(Introspector::new(runner, "app"))
}

fn sqls(statements: &[MigrationStatement]) -> Vec<&str> {
    statements.iter().map(|s| s.sql.as_str()).collect()
}

#[tokio::test]
async fn test_create_person_table() {
    let defs = vec![person()];
    let statements = migrator(ScriptedRunner::default())
        .plan(&defs, &defs[0])
        .await
        .unwrap();

    assert_eq!(
        statements,
        vec![MigrationStatement::new(
            false,
            "CREATE TABLE `person`(`id` BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY, `name` VARCHAR(255) NOT NULL, `age` INT NULL)"
        )]
    );
}

#[tokio::test]
async fn test_create_table_with_unique_and_reference() {
    let defs = vec![
        person().with_unique(UniqueDef::new("uniq_name_age", &["name", "age"])),
        pet(),
    ];
    let migrator = migrator(ScriptedRunner::default());

    let person_plan = migrator.plan(&defs, &defs[0]).await.unwrap();
    assert_eq!(person_plan.len(), 2);
    assert!(person_plan[0].sql.starts_with("CREATE TABLE `person`"));
    assert_eq!(
        person_plan[1].sql,
        "ALTER TABLE `person` ADD CONSTRAINT `uniq_name_age` UNIQUE(`name`,`age`)"
    );

    let pet_plan = migrator.plan(&defs, &defs[1]).await.unwrap();
    assert_eq!(
        sqls(&pet_plan),
        vec![
            "CREATE TABLE `pet`(`id` BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY, `nick` VARCHAR(32) NOT NULL, `owner_id` BIGINT NOT NULL)",
            "ALTER TABLE `pet` ADD CONSTRAINT `pet_owner_id_fkey` FOREIGN KEY(`owner_id`) REFERENCES `person`(`id`)",
        ]
    );
    assert!(pet_plan.iter().all(|s| !s.is_unsafe));
}

#[tokio::test]
async fn test_create_composite_key_table() {
    let membership = EntityDef::new("Membership", "membership")
        .with_field(FieldDef::new("group_id", FieldType::Sql(SqlType::Int64)))
        .with_field(FieldDef::new("user_id", FieldType::Sql(SqlType::Int64)))
        .with_composite_key(&["group_id", "user_id"]);
    let defs = vec![membership];

    let statements = migrator(ScriptedRunner::default())
        .plan(&defs, &defs[0])
        .await
        .unwrap();
    assert_eq!(
        sqls(&statements),
        vec![
            "CREATE TABLE `membership`(`group_id` BIGINT NOT NULL, `user_id` BIGINT NOT NULL, PRIMARY KEY (`group_id`, `user_id`))"
        ]
    );
}

#[tokio::test]
async fn test_identical_table_needs_nothing() {
    let defs = vec![person()];
    let migrator = migrator(ScriptedRunner::default().with_table("person", person_table()));

    assert!(migrator.plan(&defs, &defs[0]).await.unwrap().is_empty());
    // 再次规划结果相同
    assert!(migrator.plan(&defs, &defs[0]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_age_becomes_nullable() {
    let defs = vec![person()];
    let runner = ScriptedRunner::default().with_table(
        "person",
        TableScript::default()
            .column("name", false, "varchar", None, Some(255))
            .column("age", false, "int", None, None),
    );

    let statements = migrator(runner).plan(&defs, &defs[0]).await.unwrap();
    assert_eq!(
        sqls(&statements),
        vec!["ALTER TABLE `person` CHANGE `age` `age` INT NULL"]
    );
    assert!(!statements[0].is_unsafe);
}

#[tokio::test]
async fn test_type_change_is_single_change() {
    let defs = vec![person()];
    let runner = ScriptedRunner::default().with_table(
        "person",
        TableScript::default()
            .column("name", true, "text", None, Some(65_535))
            .column("age", true, "int", None, None),
    );

    let statements = migrator(runner).plan(&defs, &defs[0]).await.unwrap();
    assert_eq!(
        sqls(&statements),
        vec!["ALTER TABLE `person` CHANGE `name` `name` VARCHAR(255) NOT NULL"]
    );
}

#[tokio::test]
async fn test_drop_unique_constraint() {
    let defs = vec![person()];
    let runner = ScriptedRunner::default().with_table(
        "person",
        person_table().unique("uniq_email", "name"),
    );

    let statements = migrator(runner).plan(&defs, &defs[0]).await.unwrap();
    assert_eq!(
        statements,
        vec![MigrationStatement::new(
            false,
            "ALTER TABLE `person` DROP INDEX `uniq_email`"
        )]
    );
}

#[tokio::test]
async fn test_unique_columns_changed() {
    let defs = vec![person().with_unique(UniqueDef::new("uniq_person", &["name", "age"]))];
    let runner = ScriptedRunner::default().with_table(
        "person",
        person_table().unique("uniq_person", "name"),
    );

    let statements = migrator(runner).plan(&defs, &defs[0]).await.unwrap();
    assert_eq!(
        sqls(&statements),
        vec![
            "ALTER TABLE `person` DROP INDEX `uniq_person`",
            "ALTER TABLE `person` ADD CONSTRAINT `uniq_person` UNIQUE(`name`,`age`)",
        ]
    );
}

#[tokio::test]
async fn test_matching_unique_is_kept() {
    let defs = vec![person().with_unique(UniqueDef::new("uniq_person", &["name", "age"]))];
    let runner = ScriptedRunner::default().with_table(
        "person",
        person_table()
            .unique("uniq_person", "age")
            .unique("uniq_person", "name"),
    );

    let statements = migrator(runner).plan(&defs, &defs[0]).await.unwrap();
    assert!(statements.is_empty());
}

#[tokio::test]
async fn test_removed_column_is_unsafe() {
    let defs = vec![person()];
    let runner = ScriptedRunner::default().with_table(
        "person",
        person_table().column("legacy", true, "varchar", None, Some(10)),
    );

    let statements = migrator(runner).plan(&defs, &defs[0]).await.unwrap();
    assert_eq!(
        statements,
        vec![MigrationStatement::new(
            true,
            "ALTER TABLE `person` DROP COLUMN `legacy`"
        )]
    );
}

#[tokio::test]
async fn test_not_null_with_default_fills_nulls_first() {
    let defs = vec![
        EntityDef::new("Person", "person")
            .with_field(FieldDef::new("name", FieldType::Sql(SqlType::String)))
            .with_field(FieldDef::new("age", FieldType::Sql(SqlType::Int32)).with_default("0")),
    ];
    let runner = ScriptedRunner::default().with_table("person", person_table());

    let statements = migrator(runner).plan(&defs, &defs[0]).await.unwrap();
    assert_eq!(
        sqls(&statements),
        vec![
            "UPDATE `person` SET `age`='0' WHERE `age` IS NULL",
            "ALTER TABLE `person` CHANGE `age` `age` INT NOT NULL DEFAULT '0'",
            "ALTER TABLE `person` ALTER COLUMN `age` SET DEFAULT '0'",
        ]
    );
}

#[tokio::test]
async fn test_default_removed() {
    let defs = vec![person()];
    let runner = ScriptedRunner::default().with_table(
        "person",
        TableScript::default()
            .column("name", false, "varchar", Some("anon"), Some(255))
            .column("age", true, "int", None, None),
    );

    let statements = migrator(runner).plan(&defs, &defs[0]).await.unwrap();
    assert_eq!(
        sqls(&statements),
        vec!["ALTER TABLE `person` ALTER COLUMN `name` DROP DEFAULT"]
    );
}

#[tokio::test]
async fn test_reference_retargeted() {
    let defs = vec![person(), pet()];
    let runner = ScriptedRunner::default().with_table(
        "pet",
        TableScript::default()
            .column("nick", false, "varchar", None, Some(32))
            .column("owner_id", false, "bigint", None, None)
            .column("vet_id", true, "bigint", None, None)
            .reference("owner_id", "vet", "id", "fk_owner_old")
            .reference("vet_id", "vet", "id", "pet_vet_id_fkey"),
    );

    let statements = migrator(runner).plan(&defs, &defs[1]).await.unwrap();
    assert_eq!(
        sqls(&statements),
        vec![
            "ALTER TABLE `pet` DROP FOREIGN KEY `fk_owner_old`",
            "ALTER TABLE `pet` DROP FOREIGN KEY `pet_vet_id_fkey`",
            "ALTER TABLE `pet` DROP COLUMN `vet_id`",
            "ALTER TABLE `pet` ADD CONSTRAINT `pet_owner_id_fkey` FOREIGN KEY(`owner_id`) REFERENCES `person`(`id`)",
        ]
    );
    let unsafe_count = statements.iter().filter(|s| s.is_unsafe).count();
    assert_eq!(unsafe_count, 1);
}

#[tokio::test]
async fn test_added_reference_column() {
    let defs = vec![person(), pet()];
    let runner = ScriptedRunner::default().with_table(
        "pet",
        TableScript::default().column("nick", false, "varchar", None, Some(32)),
    );

    let statements = migrator(runner).plan(&defs, &defs[1]).await.unwrap();
    assert_eq!(
        sqls(&statements),
        vec![
            "ALTER TABLE `pet` ADD COLUMN `owner_id` BIGINT NOT NULL",
            "ALTER TABLE `pet` ADD CONSTRAINT `pet_owner_id_fkey` FOREIGN KEY(`owner_id`) REFERENCES `person`(`id`)",
        ]
    );
}

#[tokio::test]
async fn test_matching_reference_is_kept() {
    let defs = vec![person(), pet()];
    let runner = ScriptedRunner::default().with_table(
        "pet",
        TableScript::default()
            .column("nick", false, "varchar", None, Some(32))
            .column("owner_id", false, "bigint", None, None)
            .reference("owner_id", "person", "id", "pet_owner_id_fkey"),
    );

    let statements = migrator(runner).plan(&defs, &defs[1]).await.unwrap();
    assert!(statements.is_empty(), "{:?}", sqls(&statements));
}

#[tokio::test]
async fn test_created_tables_replan_to_nothing() {
    let defs = vec![
        person().with_unique(UniqueDef::new("uniq_name_age", &["name", "age"])),
        pet(),
    ];

    let created = migrator(ScriptedRunner::default());
    let report = created.migrate(&defs, false).await.unwrap();
    assert!(report.skipped.is_empty());
    assert_eq!(
        report.executed,
        vec![
            "CREATE TABLE `person`(`id` BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY, `name` VARCHAR(255) NOT NULL, `age` INT NULL)".to_string(),
            "ALTER TABLE `person` ADD CONSTRAINT `uniq_name_age` UNIQUE(`name`,`age`)".to_string(),
            "CREATE TABLE `pet`(`id` BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY, `nick` VARCHAR(32) NOT NULL, `owner_id` BIGINT NOT NULL)".to_string(),
            "ALTER TABLE `pet` ADD CONSTRAINT `pet_owner_id_fkey` FOREIGN KEY(`owner_id`) REFERENCES `person`(`id`)".to_string(),
        ]
    );

    // 按上面语句执行后数据库回报的元数据
    let runner = ScriptedRunner::default()
        .with_table(
            "person",
            person_table()
                .unique("uniq_name_age", "age")
                .unique("uniq_name_age", "name"),
        )
        .with_table(
            "pet",
            TableScript::default()
                .column("nick", false, "varchar", None, Some(32))
                .column("owner_id", false, "bigint", None, None)
                .reference("owner_id", "person", "id", "pet_owner_id_fkey"),
        );
    let replanned = migrator(runner);

    for plan in replanned.plan_all(&defs).await {
        let statements = plan.result.unwrap();
        assert!(statements.is_empty(), "{}: {:?}", plan.entity, sqls(&statements));
    }
    let report = replanned.migrate(&defs, false).await.unwrap();
    assert!(report.executed.is_empty());
    assert!(report.skipped.is_empty());
}

#[tokio::test]
async fn test_keyword_default_is_case_insensitive() {
    let log = EntityDef::new("Log", "log").with_field(
        FieldDef::new("created", FieldType::Sql(SqlType::DayTime)).with_default("current_timestamp"),
    );
    let defs = vec![log];

    let create = migrator(ScriptedRunner::default())
        .plan(&defs, &defs[0])
        .await
        .unwrap();
    assert_eq!(
        sqls(&create),
        vec![
            "CREATE TABLE `log`(`id` BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY, `created` DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP)"
        ]
    );

    let runner = ScriptedRunner::default().with_table(
        "log",
        TableScript::default().column("created", false, "datetime", Some("CURRENT_TIMESTAMP"), None),
    );
    let statements = migrator(runner).plan(&defs, &defs[0]).await.unwrap();
    assert!(statements.is_empty(), "{:?}", sqls(&statements));
}

#[tokio::test]
async fn test_introspection_errors_abort_plan() {
    let defs = vec![person()];
    let runner = ScriptedRunner::default().with_table(
        "person",
        person_table()
            .column("shape", true, "geometry", None, None)
            .column("area", true, "polygon", None, None),
    );

    let err = migrator(runner).plan(&defs, &defs[0]).await.unwrap_err();
    let PersistError::Introspection(errors) = &err else {
        panic!("应为读取错误: {err:?}");
    };
    assert_eq!(errors.len(), 2);
    assert!(errors[0].contains("geometry"));
    assert!(errors[1].contains("polygon"));
}

#[tokio::test]
async fn test_unknown_reference_target() {
    let defs = vec![pet()];
    let err = migrator(ScriptedRunner::default())
        .plan(&defs, &defs[0])
        .await
        .unwrap_err();
    assert!(matches!(err, PersistError::Inconsistency(_)));
}

#[tokio::test]
async fn test_plan_all_reports_each_entity() {
    let defs = vec![person(), pet()];
    let runner = ScriptedRunner::default().with_table(
        "pet",
        TableScript::default().column("shape", true, "geometry", None, None),
    );

    let plans = migrator(runner).plan_all(&defs).await;
    assert_eq!(plans.len(), 2);
    assert_eq!(plans[0].entity, "Person");
    assert_eq!(plans[0].result.as_ref().unwrap().len(), 1);
    assert_eq!(plans[1].entity, "Pet");
    assert!(plans[1].result.is_err());
}

#[tokio::test]
async fn test_migrate_skips_unsafe_statements() {
    let defs = vec![person()];
    let runner = ScriptedRunner::default().with_table(
        "person",
        TableScript::default()
            .column("name", false, "varchar", None, Some(255))
            .column("legacy", true, "int", None, None),
    );
    let migrator = migrator(runner);

    let report = migrator.migrate(&defs, false).await.unwrap();
    assert_eq!(
        report.executed,
        vec!["ALTER TABLE `person` ADD COLUMN `age` INT NULL".to_string()]
    );
    assert_eq!(
        report.skipped,
        vec!["ALTER TABLE `person` DROP COLUMN `legacy`".to_string()]
    );
    assert_eq!(migrator.source().runner().executed(), report.executed);
}

#[tokio::test]
async fn test_migrate_allow_unsafe() {
    let defs = vec![person()];
    let runner = ScriptedRunner::default().with_table(
        "person",
        person_table().column("legacy", true, "int", None, None),
    );
    let migrator = migrator(runner);

    let report = migrator.migrate(&defs, true).await.unwrap();
    assert!(report.skipped.is_empty());
    assert_eq!(
        migrator.source().runner().executed(),
        vec!["ALTER TABLE `person` DROP COLUMN `legacy`".to_string()]
    );
}

#[tokio::test]
async fn test_migrate_adds_foreign_keys_last() {
    // pet 在 person 之前声明，外键仍然在两张表都创建后才添加
    let defs = vec![pet(), person()];
    let migrator = migrator(ScriptedRunner::default());

    migrator.migrate(&defs, false).await.unwrap();
    let executed = migrator.source().runner().executed();
    assert_eq!(executed.len(), 3);
    assert!(executed[0].starts_with("CREATE TABLE `pet`"));
    assert!(executed[1].starts_with("CREATE TABLE `person`"));
    assert!(executed[2].contains("FOREIGN KEY(`owner_id`)"));
}

#[tokio::test]
async fn test_plan_against_dump_snapshot() {
    let dump = DumpSchema::from_sql(
        r#"
CREATE TABLE `person` (
    `id` BIGINT NOT NULL AUTO_INCREMENT,
    `name` VARCHAR(255) NOT NULL,
    `age` INT NOT NULL,
    PRIMARY KEY (`id`),
    UNIQUE KEY `uniq_email` (`name`)
) ENGINE=InnoDB;
"#,
    )
    .unwrap();
    let defs = vec![person()];

    let statements = Migrator::new(dump).plan(&defs, &defs[0]).await.unwrap();
    assert_eq!(
        sqls(&statements),
        vec![
            "ALTER TABLE `person` CHANGE `age` `age` INT NULL",
            "ALTER TABLE `person` DROP INDEX `uniq_email`",
        ]
    );
}
