use clap::Parser;
use persist_cli::{Cli, CliApp, Commands, project_info::version_info, run_init, setup_logging};
use persist_core::{PersistError, config::AppConfig, constants::config::CONFIG_FILE_NAME};
use std::path::PathBuf;
use tracing::{debug, error};

#[tokio::main]
async fn main() {
    // 解析命令行参数
    let cli = Cli::parse();

    // 设置日志记录
    setup_logging(cli.verbose);
    debug!(
        "persist-cli {} (persist-core {})",
        version_info::CLI_VERSION,
        version_info::CORE_VERSION
    );

    // `init` 命令是特例，它不需要预先加载配置
    if let Commands::Init { force } = cli.command {
        let config_path = cli.config.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
        if let Err(e) = run_init(&config_path, force).await {
            error!("❌ 初始化失败: {}", e);
            std::process::exit(1);
        }
        return;
    }

    let config_path = match cli.config.clone() {
        Some(path) => Ok(path),
        None => AppConfig::find_config_file(),
    };
    let app = match config_path.and_then(|path| CliApp::load(&path, cli.database_url.clone())) {
        Ok(app) => app,
        Err(PersistError::ConfigNotFound) => {
            let shown = cli
                .config
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| CONFIG_FILE_NAME.to_string());
            error!("❌ 配置文件 '{}' 未找到。", shown);
            error!("👉 请先运行 'persist-cli init' 命令来创建配置文件。");
            std::process::exit(1);
        }
        Err(e) => {
            error!("❌ 应用初始化失败: {}", e);
            std::process::exit(1);
        }
    };

    // 运行命令
    if let Err(e) = app.run(cli.command).await {
        error!("❌ 操作失败: {}", e);
        std::process::exit(1);
    }
}
