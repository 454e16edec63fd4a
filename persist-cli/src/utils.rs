/// # Persist CLI 日志系统使用说明
///
/// 1. **库代码只使用 `tracing` 宏**：`info!()`, `warn!()`, `error!()`, `debug!()`
/// 2. **应用入口控制日志配置**：在 `main.rs` 中调用 `setup_logging()`
/// 3. **SQL 输出与日志分离**：plan / create-sql 的语句写到标准输出，便于重定向
///
/// ## 日志配置选项
/// - `-v, --verbose`：启用详细日志模式（DEBUG 级别）
/// - `RUST_LOG`：标准的 Rust 日志级别控制
/// - `PERSIST_LOG_FILE`：日志文件路径，设置后日志输出到文件而非终端
///
/// ```bash
/// PERSIST_LOG_FILE=persist.log persist-cli migrate
/// RUST_LOG=persist_core::migration=debug persist-cli plan
/// ```
pub fn setup_logging(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let log_file = std::env::var("PERSIST_LOG_FILE").ok().and_then(|path| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| eprintln!("无法打开日志文件 {path}: {e}，改为输出到终端"))
            .ok()
    });

    if let Some(file) = log_file {
        // 输出到文件 - 使用详细格式便于调试
        fmt()
            .with_env_filter(env_filter)
            .with_writer(file)
            .with_target(true)
            .with_thread_names(true)
            .with_line_number(true)
            .with_ansi(false)
            .init();
    } else {
        // 输出到终端（stderr），不干扰标准输出中的SQL
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false)
            .without_time()
            .compact()
            .init();
    }
}
