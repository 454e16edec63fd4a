use crate::app::CliApp;
use persist_core::error::{PersistError, Result};
use tracing::{info, warn};

/// 规划并执行迁移
pub async fn run_migrate(app: &CliApp, allow_unsafe: bool) -> Result<()> {
    info!("开始迁移 ({} 个实体)", app.models.entities.len());
    let migrator = app.connect().await?;

    let result = migrator.migrate(&app.models.entities, allow_unsafe).await;
    migrator.source().runner().close().await;
    let report = result?;

    if report.executed.is_empty() && report.skipped.is_empty() {
        info!("✅ 数据库结构已是最新");
        return Ok(());
    }
    info!("✅ 已执行 {} 条语句", report.executed.len());

    if !report.skipped.is_empty() {
        for sql in &report.skipped {
            warn!("⚠️  未执行: {}", sql);
        }
        warn!("👉 确认可以丢失这些数据后，使用 --allow-unsafe 重新运行");
        return Err(PersistError::UnsafeStatementsSkipped(report.skipped.len()));
    }
    Ok(())
}
