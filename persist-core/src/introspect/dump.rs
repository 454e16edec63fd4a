use super::{IntrospectedRow, SchemaEntry, SchemaSource};
use crate::error::{PersistError, Result};
use crate::model::EntityDef;
use crate::schema::{Column, ColumnReference, UniqueGroup};
use crate::sql_type;
use async_trait::async_trait;
use regex::Regex;
use sqlparser::ast::{ColumnDef, ColumnOption, Statement, TableConstraint};
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// 从 CREATE TABLE 导出文件读取表结构，用于不连接数据库的离线规划
#[derive(Debug, Clone, Default)]
pub struct DumpSchema {
    tables: HashMap<String, DumpTable>,
}

#[derive(Debug, Clone, Default)]
struct DumpTable {
    columns: Vec<DumpColumn>,
    uniques: Vec<UniqueGroup>,
}

#[derive(Debug, Clone)]
struct DumpColumn {
    name: String,
    data_type: String,
    nullable: bool,
    default: Option<String>,
    reference: Option<ColumnReference>,
}

impl DumpSchema {
    /// 从导出文件加载
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        info!("读取结构导出文件: {}", path.as_ref().display());
        Self::from_sql(&content)
    }

    /// 解析SQL文本中的全部 CREATE TABLE 语句
    pub fn from_sql(sql_content: &str) -> Result<Self> {
        let dialect = MySqlDialect {};
        let mut tables = HashMap::new();

        for create_sql in extract_create_tables(sql_content)? {
            debug!("解析 CREATE TABLE 语句: {}", create_sql);
            let statements = Parser::parse_sql(&dialect, &create_sql).map_err(|e| {
                PersistError::model_parse(format!("解析建表语句失败: {e}\n{create_sql}"))
            })?;

            for statement in statements {
                if let Statement::CreateTable(create_table) = statement {
                    let table_name = object_name(&create_table.name.to_string());
                    let table = parse_table(&table_name, &create_table.columns, &create_table.constraints);
                    debug!("解析表: {} ({} 列)", table_name, table.columns.len());
                    tables.insert(table_name, table);
                }
            }
        }

        info!("成功解析 {} 个表", tables.len());
        Ok(Self { tables })
    }

    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[async_trait]
impl SchemaSource for DumpSchema {
    async fn introspect(&self, entity: &EntityDef) -> Result<Vec<IntrospectedRow>> {
        let Some(table) = self.tables.get(&entity.table) else {
            return Ok(Vec::new());
        };

        let mut rows = Vec::new();
        for column in table.columns.iter().filter(|c| c.name != entity.id_column) {
            let row = match sql_type::parse(&column.data_type) {
                Ok(sql_type) => Ok(SchemaEntry::Column(Column {
                    name: column.name.clone(),
                    nullable: column.nullable,
                    sql_type,
                    default: column.default.clone(),
                    max_len: if sql_type.uses_max_len() {
                        character_length(&column.data_type)
                    } else {
                        None
                    },
                    reference: column.reference.clone(),
                })),
                Err(e) => Err(format!("列 {}.{}: {e}", entity.table, column.name)),
            };
            rows.push(row);
        }

        for unique in &table.uniques {
            let columns: Vec<String> = unique
                .columns
                .iter()
                .filter(|c| **c != entity.id_column)
                .cloned()
                .collect();
            if !columns.is_empty() {
                rows.push(Ok(SchemaEntry::Unique(UniqueGroup::new(
                    unique.name.clone(),
                    columns,
                ))));
            }
        }
        Ok(rows)
    }
}

fn parse_table(
    table_name: &str,
    column_defs: &[ColumnDef],
    constraints: &[TableConstraint],
) -> DumpTable {
    let mut table = DumpTable::default();
    let mut unnamed_fk = 0;

    for column_def in column_defs {
        let (column, unique) = parse_column(table_name, column_def, &mut unnamed_fk);
        if unique {
            table
                .uniques
                .push(UniqueGroup::new(column.name.clone(), vec![column.name.clone()]));
        }
        table.columns.push(column);
    }

    for constraint in constraints {
        match constraint {
            TableConstraint::Unique {
                name,
                index_name,
                columns,
                ..
            } => {
                let columns: Vec<String> = columns.iter().map(|c| unquote(&c.to_string())).collect();
                let constraint_name = index_name
                    .as_ref()
                    .or(name.as_ref())
                    .map(|n| unquote(&n.to_string()))
                    .or_else(|| columns.first().cloned())
                    .unwrap_or_default();
                table.uniques.push(UniqueGroup::new(constraint_name, columns));
            }
            TableConstraint::ForeignKey {
                name,
                columns,
                foreign_table,
                referred_columns,
                ..
            } => {
                let constraint_name = match name {
                    Some(name) => unquote(&name.to_string()),
                    None => {
                        unnamed_fk += 1;
                        format!("{table_name}_ibfk_{unnamed_fk}")
                    }
                };
                let target_table = object_name(&foreign_table.to_string());
                for (column_name, ref_column) in columns.iter().zip(referred_columns) {
                    let column_name = unquote(&column_name.to_string());
                    if let Some(column) = table.columns.iter_mut().find(|c| c.name == column_name) {
                        column.reference = Some(ColumnReference {
                            table: target_table.clone(),
                            column: unquote(&ref_column.to_string()),
                            constraint: constraint_name.clone(),
                        });
                    }
                }
            }
            _ => {}
        }
    }

    // 与 INFORMATION_SCHEMA 查询的排序保持一致
    for unique in &mut table.uniques {
        unique.columns.sort();
    }
    table.uniques.sort_by(|a, b| a.name.cmp(&b.name));
    table
}

fn parse_column(table_name: &str, column_def: &ColumnDef, unnamed_fk: &mut usize) -> (DumpColumn, bool) {
    let mut column = DumpColumn {
        name: unquote(&column_def.name.to_string()),
        data_type: column_def.data_type.to_string(),
        nullable: true,
        default: None,
        reference: None,
    };
    let mut unique = false;

    for option in &column_def.options {
        match &option.option {
            ColumnOption::NotNull => column.nullable = false,
            ColumnOption::Null => column.nullable = true,
            ColumnOption::Default(expr) => column.default = default_text(&expr.to_string()),
            ColumnOption::Unique { is_primary, .. } => {
                if *is_primary {
                    column.nullable = false;
                } else {
                    unique = true;
                }
            }
            ColumnOption::ForeignKey {
                foreign_table,
                referred_columns,
                ..
            } => {
                *unnamed_fk += 1;
                column.reference = Some(ColumnReference {
                    table: object_name(&foreign_table.to_string()),
                    column: referred_columns
                        .first()
                        .map(|c| unquote(&c.to_string()))
                        .unwrap_or_default(),
                    constraint: format!("{table_name}_ibfk_{unnamed_fk}"),
                });
            }
            _ => {}
        }
    }

    (column, unique)
}

/// 默认值表达式转换为 INFORMATION_SCHEMA.COLUMN_DEFAULT 的形式
fn default_text(expr: &str) -> Option<String> {
    let expr = expr.trim();
    if expr.eq_ignore_ascii_case("NULL") {
        return None;
    }
    match expr.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        Some(inner) => Some(inner.replace("''", "'").replace("\\\\", "\\")),
        None => Some(expr.to_string()),
    }
}

/// 与 CHARACTER_MAXIMUM_LENGTH 一致的字符长度
fn character_length(data_type: &str) -> Option<u32> {
    let lower = data_type.to_ascii_lowercase();
    if let Some(start) = lower.find('(') {
        let digits: String = lower[start + 1..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        return digits.parse().ok();
    }
    match lower.split_whitespace().next().unwrap_or_default() {
        "tinytext" => Some(255),
        "text" => Some(65_535),
        "mediumtext" => Some(16_777_215),
        "longtext" => Some(u32::MAX),
        "char" => Some(1),
        _ => None,
    }
}

fn unquote(ident: &str) -> String {
    let ident = ident.trim();
    for quote in ['`', '"'] {
        if let Some(inner) = ident
            .strip_prefix(quote)
            .and_then(|s| s.strip_suffix(quote))
        {
            let doubled = format!("{quote}{quote}");
            return inner.replace(&doubled, &quote.to_string());
        }
    }
    ident.to_string()
}

/// 去掉库名前缀，只保留表名
fn object_name(name: &str) -> String {
    let last = name.rsplit('.').next().unwrap_or(name);
    unquote(last)
}

/// 找到 USE 语句（如果有）之后的所有 CREATE TABLE 语句
fn extract_create_tables(sql_content: &str) -> Result<Vec<String>> {
    let use_regex = Regex::new(r"(?i)^\s*USE\s+[^;]+;\s*$")
        .map_err(|e| PersistError::custom(format!("正则表达式编译失败: {e}")))?;
    let create_regex = Regex::new(r"(?i)^\s*CREATE\s+TABLE")
        .map_err(|e| PersistError::custom(format!("正则表达式编译失败: {e}")))?;

    let lines: Vec<&str> = sql_content.lines().collect();
    let start = lines
        .iter()
        .position(|line| use_regex.is_match(line))
        .map(|idx| idx + 1)
        .unwrap_or(0);
    if start == 0 {
        debug!("未找到 USE 语句，从头开始解析整个文件");
    }

    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_create = false;
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escape_next = false;

    for line in &lines[start..] {
        let trimmed = line.trim();
        if quote.is_none()
            && (trimmed.is_empty() || trimmed.starts_with("--") || trimmed.starts_with("/*"))
        {
            continue;
        }

        if !in_create {
            if !create_regex.is_match(line) {
                continue;
            }
            in_create = true;
            current.clear();
            depth = 0;
        }

        current.push_str(line);
        current.push('\n');

        for ch in line.chars() {
            if escape_next {
                escape_next = false;
                continue;
            }
            match (quote, ch) {
                (Some(_), '\\') => escape_next = true,
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '\'' | '"' | '`') => quote = Some(ch),
                (None, '(') => depth += 1,
                (None, ')') => depth -= 1,
                (None, ';') if depth <= 0 => {
                    statements.push(current.trim().to_string());
                    current.clear();
                    in_create = false;
                    break;
                }
                _ => {}
            }
        }
    }

    if in_create && !current.trim().is_empty() {
        statements.push(current.trim().to_string());
    }

    debug!("提取到 {} 个 CREATE TABLE 语句", statements.len());
    Ok(statements)
}
