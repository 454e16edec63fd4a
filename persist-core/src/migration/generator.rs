use super::types::{AlterColumn, AlterDb, AlterTable, MigrationStatement};
use crate::constants::ddl::{BARE_DEFAULT_KEYWORDS, FOREIGN_KEY_SUFFIX};
use crate::schema::Column;
use crate::sql_type;
use crate::value::{NativeParam, render_literal};

/// 外键约束名，新增与删除外键共用
pub fn foreign_key_name(table: &str, column: &str) -> String {
    format!("{table}_{column}_{FOREIGN_KEY_SUFFIX}")
}

/// 反引号包裹标识符，内部反引号加倍
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// 默认值字面量
pub fn render_default(default: &str) -> String {
    if BARE_DEFAULT_KEYWORDS
        .iter()
        .any(|keyword| default.eq_ignore_ascii_case(keyword))
    {
        default.to_ascii_uppercase()
    } else {
        render_literal(&NativeParam::Text(default.to_string()))
    }
}

/// 列定义：名称、类型、可空性和默认值
pub fn render_column(column: &Column) -> String {
    let mut sql = format!(
        "{} {} {}",
        quote_ident(&column.name),
        sql_type::render(column.sql_type, column.max_len),
        if column.nullable { "NULL" } else { "NOT NULL" }
    );
    if let Some(default) = &column.default {
        sql.push_str(" DEFAULT ");
        sql.push_str(&render_default(default));
    }
    sql
}

/// CREATE TABLE 语句
///
/// 没有复合主键时加入自增的 BIGINT 主键列，否则以 PRIMARY KEY 子句声明复合主键。
pub fn render_create_table(
    table: &str,
    id_column: &str,
    columns: &[Column],
    composite_key: Option<&[String]>,
) -> String {
    let mut parts = Vec::with_capacity(columns.len() + 1);
    if composite_key.is_none() {
        parts.push(format!(
            "{} BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY",
            quote_ident(id_column)
        ));
    }
    parts.extend(columns.iter().map(render_column));
    if let Some(key) = composite_key {
        let key_columns: Vec<String> = key.iter().map(|c| quote_ident(c)).collect();
        parts.push(format!("PRIMARY KEY ({})", key_columns.join(", ")));
    }
    format!("CREATE TABLE {}({})", quote_ident(table), parts.join(", "))
}

/// 将一项变更渲染为可执行的MySQL语句
pub fn render(alter: &AlterDb) -> MigrationStatement {
    let sql = match alter {
        AlterDb::CreateTable(sql) => sql.clone(),
        AlterDb::AlterColumn {
            table,
            column,
            action,
        } => render_alter_column(table, column, action),
        AlterDb::AlterTable { table, action } => render_alter_table(table, action),
    };
    MigrationStatement::new(alter.is_unsafe(), sql)
}

fn render_alter_column(table: &str, column: &str, action: &AlterColumn) -> String {
    let t = quote_ident(table);
    let c = quote_ident(column);
    match action {
        AlterColumn::Add(col) => format!("ALTER TABLE {t} ADD COLUMN {}", render_column(col)),
        AlterColumn::Change(col) => format!("ALTER TABLE {t} CHANGE {c} {}", render_column(col)),
        AlterColumn::Drop => format!("ALTER TABLE {t} DROP COLUMN {c}"),
        AlterColumn::SetDefault(default) => format!(
            "ALTER TABLE {t} ALTER COLUMN {c} SET DEFAULT {}",
            render_default(default)
        ),
        AlterColumn::ClearDefault => format!("ALTER TABLE {t} ALTER COLUMN {c} DROP DEFAULT"),
        AlterColumn::SetAllNullToValue(value) => {
            format!("UPDATE {t} SET {c}={} WHERE {c} IS NULL", render_default(value))
        }
        AlterColumn::AddForeignKey {
            table: ref_table,
            column: ref_column,
        } => format!(
            "ALTER TABLE {t} ADD CONSTRAINT {} FOREIGN KEY({c}) REFERENCES {}({})",
            quote_ident(&foreign_key_name(table, column)),
            quote_ident(ref_table),
            quote_ident(ref_column)
        ),
        AlterColumn::DropForeignKey(name) => {
            format!("ALTER TABLE {t} DROP FOREIGN KEY {}", quote_ident(name))
        }
    }
}

fn render_alter_table(table: &str, action: &AlterTable) -> String {
    let t = quote_ident(table);
    match action {
        AlterTable::AddUniqueConstraint { name, columns } => {
            let columns: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
            format!(
                "ALTER TABLE {t} ADD CONSTRAINT {} UNIQUE({})",
                quote_ident(name),
                columns.join(",")
            )
        }
        AlterTable::DropUniqueConstraint(name) => {
            format!("ALTER TABLE {t} DROP INDEX {}", quote_ident(name))
        }
    }
}
