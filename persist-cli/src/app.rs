use persist_core::{
    config::AppConfig,
    db::MySqlRunner,
    error::{PersistError, Result},
    introspect::Introspector,
    migration::Migrator,
    model::ModelSet,
};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::cli::Commands;
use crate::commands;

pub struct CliApp {
    pub config: AppConfig,
    pub config_path: PathBuf,
    pub models: ModelSet,
}

impl CliApp {
    /// 加载配置文件和模型文件，`database_url` 覆盖配置中的连接地址
    pub fn load(config_path: &Path, database_url: Option<String>) -> Result<Self> {
        let mut config = AppConfig::load_from_file(config_path)?;
        if let Some(url) = database_url {
            config.database.url = url;
        }

        let models = ModelSet::load_from_file(config.models_path(config_path))?;

        Ok(Self {
            config,
            config_path: config_path.to_path_buf(),
            models,
        })
    }

    /// 连接数据库并创建在线迁移规划器
    pub async fn connect(&self) -> Result<Migrator<Introspector<MySqlRunner>>> {
        let runner =
            MySqlRunner::connect(&self.config.database.url, self.config.database.max_connections)
                .await?;
        info!("已连接数据库，读取结构: {}", self.config.database.schema);
        Ok(Migrator::new(Introspector::new(
            runner,
            self.config.database.schema.clone(),
        )))
    }

    /// 运行应用命令
    pub async fn run(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Init { .. } => Err(PersistError::custom("init 命令不需要加载配置")),
            Commands::Plan { entity, snapshot } => {
                commands::run_plan(self, entity.as_deref(), snapshot.as_deref()).await
            }
            Commands::Migrate { allow_unsafe } => commands::run_migrate(self, allow_unsafe).await,
            Commands::CreateSql => commands::run_create_sql(self),
        }
    }
}
