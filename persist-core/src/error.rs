use thiserror::Error;

pub type Result<T> = std::result::Result<T, PersistError>;

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("配置错误: {0}")]
    Config(#[from] toml::de::Error),

    #[error("MySQL数据库错误: {0}")]
    Database(String),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 值无法编码/解码（不支持的变体、未知原生类型、错误的默认值）
    #[error("值编解码错误: {0}")]
    Marshal(String),

    #[error("无法识别的列类型: {0}")]
    UnknownType(String),

    /// 表结构读取期间收集到的逐列错误
    #[error("表结构读取失败: {}", .0.join("; "))]
    Introspection(Vec<String>),

    /// 声明的实体模型自相矛盾（引用了不存在的实体或字段）
    #[error("实体模型不一致: {0}")]
    Inconsistency(String),

    #[error("行数据转换失败: {0}")]
    Materialize(String),

    #[error("模型定义解析失败: {0}")]
    ModelParse(String),

    #[error("存在 {0} 条未执行的不安全语句")]
    UnsafeStatementsSkipped(usize),

    #[error("自定义错误: {0}")]
    Custom(String),

    #[error("配置文件未找到")]
    ConfigNotFound,
}

// 为sqlx错误实现From trait
impl From<sqlx::Error> for PersistError {
    fn from(err: sqlx::Error) -> Self {
        PersistError::Database(err.to_string())
    }
}

impl PersistError {
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    pub fn marshal(msg: impl Into<String>) -> Self {
        Self::Marshal(msg.into())
    }

    pub fn inconsistency(msg: impl Into<String>) -> Self {
        Self::Inconsistency(msg.into())
    }

    pub fn materialize(msg: impl Into<String>) -> Self {
        Self::Materialize(msg.into())
    }

    pub fn model_parse(msg: impl Into<String>) -> Self {
        Self::ModelParse(msg.into())
    }

    /// 表结构读取错误列表（其他错误返回空切片）
    pub fn introspection_errors(&self) -> &[String] {
        match self {
            Self::Introspection(errors) => errors,
            _ => &[],
        }
    }
}
