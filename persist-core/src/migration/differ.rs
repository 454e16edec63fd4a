use super::generator::{foreign_key_name, render, render_create_table};
use super::types::{AlterColumn, AlterDb, AlterTable, MigrationStatement};
use crate::constants::ddl::BARE_DEFAULT_KEYWORDS;
use crate::error::{PersistError, Result};
use crate::introspect::{IntrospectedRow, SchemaEntry};
use crate::model::EntityDef;
use crate::schema::{Column, ColumnReference, UniqueGroup};
use tracing::{debug, info};

/// 声明的唯一约束：比较用已排序列名，新增时按声明顺序输出
struct DeclaredUnique {
    name: String,
    sorted: Vec<String>,
    columns: Vec<String>,
}

/// 根据读取到的表结构生成渲染好的迁移语句
pub fn plan_table(
    all_defs: &[EntityDef],
    entity: &EntityDef,
    rows: Vec<IntrospectedRow>,
) -> Result<Vec<MigrationStatement>> {
    let actions = plan_actions(all_defs, entity, rows)?;
    Ok(actions.iter().map(render).collect())
}

/// 生成有序的变更列表
pub fn plan_actions(
    all_defs: &[EntityDef],
    entity: &EntityDef,
    rows: Vec<IntrospectedRow>,
) -> Result<Vec<AlterDb>> {
    let (entries, errors): (Vec<_>, Vec<_>) = rows.into_iter().partition(|row| row.is_ok());
    if !errors.is_empty() {
        let errors: Vec<String> = errors.into_iter().filter_map(|row| row.err()).collect();
        return Err(PersistError::Introspection(errors));
    }

    let declared_columns = declared_columns(all_defs, entity)?;
    let declared_uniques = declared_uniques(entity)?;

    if entries.is_empty() {
        info!("表 {} 不存在，生成建表语句", entity.table);
        return create_actions(entity, &declared_columns, &declared_uniques);
    }

    let mut actual_columns = Vec::new();
    let mut actual_uniques = Vec::new();
    for entry in entries.into_iter().flatten() {
        match entry {
            SchemaEntry::Column(column) => actual_columns.push(column),
            SchemaEntry::Unique(group) => actual_uniques.push(group),
        }
    }

    let mut actions = column_actions(&entity.table, &declared_columns, &actual_columns);
    actions.extend(unique_actions(&entity.table, &declared_uniques, &actual_uniques));

    info!("表 {} 需要 {} 项变更", entity.table, actions.len());
    Ok(actions)
}

/// 字段声明转换为列定义，引用字段解析到目标实体的主键列
fn declared_columns(all_defs: &[EntityDef], entity: &EntityDef) -> Result<Vec<Column>> {
    entity
        .fields
        .iter()
        .map(|field| {
            let column_name = field.column_name();
            let sql_type = field.field_type.sql_type();
            let mut column = Column::new(column_name, sql_type, field.is_nullable());
            column.default = field
                .default
                .as_deref()
                .filter(|d| !d.eq_ignore_ascii_case("NULL"))
                .map(normalize_default);
            if sql_type.uses_max_len() {
                column.max_len = field.max_len;
            }
            if let Some(target) = field.field_type.reference() {
                let target_def = all_defs.iter().find(|e| e.name == target).ok_or_else(|| {
                    PersistError::inconsistency(format!(
                        "字段 {}.{} 引用了未声明的实体 {target}",
                        entity.name, field.name
                    ))
                })?;
                column.reference = Some(ColumnReference {
                    table: target_def.table.clone(),
                    column: target_def.id_column.clone(),
                    constraint: foreign_key_name(&entity.table, column_name),
                });
            }
            Ok(column)
        })
        .collect()
}

/// 关键字默认值统一为大写，与数据库回报的形式一致
fn normalize_default(default: &str) -> String {
    let upper = default.to_ascii_uppercase();
    if BARE_DEFAULT_KEYWORDS.contains(&upper.as_str()) {
        upper
    } else {
        default.to_string()
    }
}

fn declared_uniques(entity: &EntityDef) -> Result<Vec<DeclaredUnique>> {
    entity
        .uniques
        .iter()
        .map(|unique| {
            let columns = unique
                .fields
                .iter()
                .map(|f| entity.column_of_field(f).map(str::to_string))
                .collect::<Result<Vec<_>>>()?;
            let mut sorted = columns.clone();
            sorted.sort();
            Ok(DeclaredUnique {
                name: unique.name.clone(),
                sorted,
                columns,
            })
        })
        .collect()
}

fn create_actions(
    entity: &EntityDef,
    columns: &[Column],
    uniques: &[DeclaredUnique],
) -> Result<Vec<AlterDb>> {
    let composite_key = entity
        .primary_key
        .as_ref()
        .map(|key| {
            key.fields
                .iter()
                .map(|f| entity.column_of_field(f).map(str::to_string))
                .collect::<Result<Vec<_>>>()
        })
        .transpose()?;

    let mut actions = vec![AlterDb::CreateTable(render_create_table(
        &entity.table,
        &entity.id_column,
        columns,
        composite_key.as_deref(),
    ))];

    actions.extend(uniques.iter().map(|unique| AlterDb::AlterTable {
        table: entity.table.clone(),
        action: AlterTable::AddUniqueConstraint {
            name: unique.name.clone(),
            columns: unique.columns.clone(),
        },
    }));

    actions.extend(columns.iter().filter_map(|column| {
        column
            .reference
            .as_ref()
            .map(|reference| add_foreign_key(&entity.table, &column.name, reference))
    }));

    Ok(actions)
}

/// 列变更按以下顺序输出：删除外键、填充NULL、增删改列、默认值、新增外键
fn column_actions(table: &str, declared: &[Column], actual: &[Column]) -> Vec<AlterDb> {
    let mut drop_fks = Vec::new();
    let mut fill_nulls = Vec::new();
    let mut structural = Vec::new();
    let mut defaults = Vec::new();
    let mut add_fks = Vec::new();

    let alter = |column: &str, action: AlterColumn| AlterDb::AlterColumn {
        table: table.to_string(),
        column: column.to_string(),
        action,
    };

    for column in declared {
        let Some(existing) = actual.iter().find(|c| c.name == column.name) else {
            debug!("新增列: {}.{}", table, column.name);
            structural.push(alter(&column.name, AlterColumn::Add(column.clone())));
            if let Some(reference) = &column.reference {
                add_fks.push(add_foreign_key(table, &column.name, reference));
            }
            continue;
        };

        match (&column.reference, &existing.reference) {
            (Some(wanted), Some(current)) if wanted.same_target(current) => {}
            (wanted, current) => {
                if let Some(current) = current {
                    drop_fks.push(alter(
                        &column.name,
                        AlterColumn::DropForeignKey(current.constraint.clone()),
                    ));
                }
                if let Some(wanted) = wanted {
                    add_fks.push(add_foreign_key(table, &column.name, wanted));
                }
            }
        }

        if !column.same_shape(existing) {
            debug!("修改列: {}.{}", table, column.name);
            if existing.nullable && !column.nullable {
                if let Some(default) = &column.default {
                    fill_nulls.push(alter(
                        &column.name,
                        AlterColumn::SetAllNullToValue(default.clone()),
                    ));
                }
            }
            structural.push(alter(&column.name, AlterColumn::Change(column.clone())));
        }

        if column.default != existing.default {
            let action = match &column.default {
                Some(default) => AlterColumn::SetDefault(default.clone()),
                None => AlterColumn::ClearDefault,
            };
            defaults.push(alter(&column.name, action));
        }
    }

    for existing in actual
        .iter()
        .filter(|c| !declared.iter().any(|d| d.name == c.name))
    {
        debug!("删除列: {}.{}", table, existing.name);
        if let Some(reference) = &existing.reference {
            drop_fks.push(alter(
                &existing.name,
                AlterColumn::DropForeignKey(reference.constraint.clone()),
            ));
        }
        structural.push(alter(&existing.name, AlterColumn::Drop));
    }

    let mut actions = drop_fks;
    actions.extend(fill_nulls);
    actions.extend(structural);
    actions.extend(defaults);
    actions.extend(add_fks);
    actions
}

fn unique_actions(table: &str, declared: &[DeclaredUnique], actual: &[UniqueGroup]) -> Vec<AlterDb> {
    let mut actions = Vec::new();
    let alter = |action: AlterTable| AlterDb::AlterTable {
        table: table.to_string(),
        action,
    };

    for unique in declared {
        match actual.iter().find(|group| group.name == unique.name) {
            Some(group) if group.columns == unique.sorted => {}
            Some(_) => {
                debug!("唯一约束列变化: {}.{}", table, unique.name);
                actions.push(alter(AlterTable::DropUniqueConstraint(unique.name.clone())));
                actions.push(alter(AlterTable::AddUniqueConstraint {
                    name: unique.name.clone(),
                    columns: unique.columns.clone(),
                }));
            }
            None => actions.push(alter(AlterTable::AddUniqueConstraint {
                name: unique.name.clone(),
                columns: unique.columns.clone(),
            })),
        }
    }

    for group in actual
        .iter()
        .filter(|group| !declared.iter().any(|d| d.name == group.name))
    {
        actions.push(alter(AlterTable::DropUniqueConstraint(group.name.clone())));
    }

    actions
}

fn add_foreign_key(table: &str, column: &str, reference: &ColumnReference) -> AlterDb {
    AlterDb::AlterColumn {
        table: table.to_string(),
        column: column.to_string(),
        action: AlterColumn::AddForeignKey {
            table: reference.table.clone(),
            column: reference.column.clone(),
        },
    }
}
