use crate::project_info::{metadata, version_info};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Persist CLI - MySQL 实体模型自动迁移工具
#[derive(Parser, Debug)]
#[command(name = "persist-cli")]
#[command(about = metadata::PROJECT_DESCRIPTION)]
#[command(version = version_info::CLI_VERSION)]
#[command(long_about = metadata::display::DESCRIPTION_LONG)]
#[command(author = metadata::PROJECT_AUTHORS)]
pub struct Cli {
    /// 配置文件路径（默认依次查找 persist.toml、.persist.toml）
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 详细输出
    #[arg(short, long)]
    pub verbose: bool,

    /// 数据库连接地址，覆盖配置文件中的 database.url
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// 创建默认配置文件和示例模型文件
    Init {
        /// 如果配置文件已存在，强制覆盖
        #[arg(long)]
        force: bool,
    },
    /// 输出迁移计划（不执行）
    Plan {
        /// 只规划指定实体
        #[arg(long)]
        entity: Option<String>,
        /// 使用建表语句导出文件代替在线数据库
        #[arg(long, value_name = "FILE")]
        snapshot: Option<PathBuf>,
    },
    /// 规划并执行迁移
    Migrate {
        /// 同时执行会丢失数据的语句（删除列）
        #[arg(long)]
        allow_unsafe: bool,
    },
    /// 输出全部实体的建表语句（不连接数据库）
    CreateSql,
}
