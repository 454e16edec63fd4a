use persist_core::{config::AppConfig, error::Result};
use std::path::Path;
use tracing::{info, warn};

const MODELS_TEMPLATE: &str = include_str!("../templates/models.toml.template");

/// 创建默认配置文件，模型文件不存在时写入示例模型
pub async fn run_init(config_path: &Path, force: bool) -> Result<()> {
    info!("Persist 初始化");

    if !force && config_path.exists() {
        warn!("检测到已存在的配置文件: {}", config_path.display());
        info!("如果您要重新初始化，请使用 --force 参数");
        return Ok(());
    }

    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let config = AppConfig::default();
    config.save_to_file(config_path)?;
    info!("   ✅ 创建配置文件: {}", config_path.display());

    let models_path = config.models_path(config_path);
    if models_path.exists() {
        info!("   模型文件已存在，保持不变: {}", models_path.display());
    } else {
        tokio::fs::write(&models_path, MODELS_TEMPLATE).await?;
        info!("   ✅ 创建示例模型文件: {}", models_path.display());
    }

    info!("下一步: 修改 {} 中的数据库地址，然后运行 persist-cli plan", config_path.display());
    Ok(())
}
