use crate::constants::{config, database};
use crate::error::{PersistError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 应用配置结构
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub models: ModelsConfig,
}

/// 数据库连接配置
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub url: String,
    pub schema: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// 实体模型配置
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ModelsConfig {
    pub path: String,
}

fn default_max_connections() -> u32 {
    database::DEFAULT_MAX_CONNECTIONS
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: database::DEFAULT_URL.to_string(),
                schema: database::DEFAULT_SCHEMA.to_string(),
                max_connections: database::DEFAULT_MAX_CONNECTIONS,
            },
            models: ModelsConfig {
                path: config::DEFAULT_MODELS_FILE.to_string(),
            },
        }
    }
}

impl AppConfig {
    /// 按优先级查找配置文件：persist.toml -> .persist.toml
    pub fn find_config_file() -> Result<PathBuf> {
        for config_file in config::CONFIG_FILE_CANDIDATES {
            if Path::new(config_file).exists() {
                tracing::info!("找到配置文件: {}", config_file);
                return Ok(PathBuf::from(config_file));
            }
        }
        Err(PersistError::ConfigNotFound)
    }

    /// 从指定文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        if !path.as_ref().exists() {
            return Err(PersistError::ConfigNotFound);
        }
        let content = fs::read_to_string(&path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_toml_with_comments();
        fs::write(&path, content)?;
        Ok(())
    }

    /// 生成带注释的TOML配置
    fn to_toml_with_comments(&self) -> String {
        const TEMPLATE: &str = include_str!("../templates/persist.toml.template");

        TEMPLATE
            .replace("{database_url}", &self.database.url)
            .replace("{database_schema}", &self.database.schema)
            .replace(
                "{max_connections}",
                &self.database.max_connections.to_string(),
            )
            .replace("{models_path}", &self.models.path)
    }

    /// 模型文件路径，相对路径以配置文件所在目录为基准
    pub fn models_path(&self, config_path: &Path) -> PathBuf {
        let path = PathBuf::from(&self.models.path);
        if path.is_absolute() {
            return path;
        }
        match config_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.join(path),
            _ => path,
        }
    }
}
