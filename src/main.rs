// ==========================================
// 注塑模具排机系统 - CLI 主入口
// ==========================================
// 用法: injection-molding-aps <snapshot.json> [config.json] [策略档案名]
// 输入: JSON 排机快照
// 输出: 标准输出打印最终排程 + 分配矩阵 + 诊断报告 (JSON)
// ==========================================

use injection_molding_aps::{
    ConfigManager, JsonSnapshotRepository, PlanningOrchestrator,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    injection_molding_aps::logging::init();

    tracing::info!("==================================================");
    tracing::info!("注塑模具排机系统 - 决策支持系统");
    tracing::info!("系统版本: {}", injection_molding_aps::VERSION);
    tracing::info!("==================================================");

    let args: Vec<String> = std::env::args().collect();
    let snapshot_path = match args.get(1) {
        Some(path) => path.clone(),
        None => {
            eprintln!("用法: injection-molding-aps <snapshot.json> [config.json] [策略档案名]");
            std::process::exit(2);
        }
    };

    // 配置文件: 指定路径或系统默认路径, 文件缺失回退默认配置
    let manager = match args.get(2) {
        Some(path) => ConfigManager::new(path),
        None => ConfigManager::with_default_path()?,
    };
    let config = manager.load()?;
    let profile = args.get(3).map(String::as_str);

    tracing::info!(snapshot = %snapshot_path, config = %manager.path().display(), "输入就绪");

    let repository = Arc::new(JsonSnapshotRepository::new(&snapshot_path));
    let orchestrator = PlanningOrchestrator::new(repository, config);
    let outcome = orchestrator.run(profile).await?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
