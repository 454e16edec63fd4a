/// DDL生成相关常量
pub mod ddl {
    /// 未指定长度时字符串列使用的 VARCHAR 长度
    pub const DEFAULT_VARCHAR_LENGTH: u32 = 255;

    /// 默认主键列名
    pub const DEFAULT_ID_COLUMN: &str = "id";

    /// 外键约束名后缀，完整格式为 `{table}_{column}_fkey`
    pub const FOREIGN_KEY_SUFFIX: &str = "fkey";

    /// 默认值中不加引号直接输出的关键字
    pub const BARE_DEFAULT_KEYWORDS: &[&str] = &["NULL", "CURRENT_TIMESTAMP"];
}

/// 配置文件相关常量
pub mod config {
    /// 默认配置文件名
    pub const CONFIG_FILE_NAME: &str = "persist.toml";

    /// 按优先级查找的配置文件名
    pub const CONFIG_FILE_CANDIDATES: &[&str] = &["persist.toml", ".persist.toml"];

    /// 默认实体模型文件
    pub const DEFAULT_MODELS_FILE: &str = "models.toml";
}

/// 数据库连接相关常量
pub mod database {
    use std::time::Duration;

    /// 默认连接地址
    pub const DEFAULT_URL: &str = "mysql://root@127.0.0.1:3306/app";

    /// 默认数据库（TABLE_SCHEMA）
    pub const DEFAULT_SCHEMA: &str = "app";

    /// 连接池最大连接数
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 4;

    /// 获取连接超时
    pub const POOL_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);
}

/// 版本信息
pub mod version {
    /// 核心库版本（自动从 Cargo.toml 同步）
    pub const CORE_VERSION: &str = env!("CARGO_PKG_VERSION");
}
