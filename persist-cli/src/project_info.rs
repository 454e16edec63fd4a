/// Persist CLI 项目信息模块
///
/// persist-cli 是面向用户的主程序，项目元数据统一在这里定义，
/// persist-core 作为内部库，只提供技术性常量

/// 项目元数据（自动从 persist-cli 的 Cargo.toml 同步）
pub mod metadata {
    /// 项目名称
    pub const PROJECT_NAME: &str = env!("CARGO_PKG_NAME");

    /// 项目描述
    pub const PROJECT_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

    /// 项目作者
    pub const PROJECT_AUTHORS: &str = env!("CARGO_PKG_AUTHORS");

    pub mod display {
        /// 项目详细描述（比 Cargo.toml 中的描述更详细）
        pub const DESCRIPTION_LONG: &str = "根据实体模型文件读取 MySQL 实际表结构，生成并执行自动迁移语句；删除列等会丢失数据的语句默认只报告不执行";
    }
}

/// 版本信息
pub mod version_info {
    /// CLI 版本
    pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

    /// 核心库版本
    pub const CORE_VERSION: &str = persist_core::constants::version::CORE_VERSION;
}
