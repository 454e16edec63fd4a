use crate::sql_type::SqlType;

/// 外键引用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnReference {
    /// 被引用的表
    pub table: String,
    /// 被引用的列
    pub column: String,
    /// 约束名
    pub constraint: String,
}

impl ColumnReference {
    /// 两个引用是否指向同一目标（约束名不参与比较）
    pub fn same_target(&self, other: &ColumnReference) -> bool {
        self.table == other.table && self.column == other.column
    }
}

/// 表列定义（声明的或从数据库读取的）
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub nullable: bool,
    pub sql_type: SqlType,
    pub default: Option<String>,
    pub max_len: Option<u32>,
    pub reference: Option<ColumnReference>,
}

impl Column {
    pub fn new(name: impl Into<String>, sql_type: SqlType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            nullable,
            sql_type,
            default: None,
            max_len: None,
            reference: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_max_len(mut self, max_len: u32) -> Self {
        self.max_len = Some(max_len);
        self
    }

    pub fn with_reference(mut self, reference: ColumnReference) -> Self {
        self.reference = Some(reference);
        self
    }

    /// 类型与可空性（字符串列还包括长度）是否一致
    pub fn same_shape(&self, other: &Column) -> bool {
        if self.sql_type != other.sql_type || self.nullable != other.nullable {
            return false;
        }
        if self.sql_type.uses_max_len() {
            return self.effective_max_len() == other.effective_max_len();
        }
        true
    }

    fn effective_max_len(&self) -> u32 {
        self.max_len
            .unwrap_or(crate::constants::ddl::DEFAULT_VARCHAR_LENGTH)
    }
}

/// 唯一约束（约束名 + 有序列名）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueGroup {
    pub name: String,
    pub columns: Vec<String>,
}

impl UniqueGroup {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }
}
