// ==========================================
// 注塑模具排机系统 - 配置层
// ==========================================
// 职责: 排机配置管理, 支持策略档案按名覆盖
// 存储: JSON 配置文件
// ==========================================

pub mod config_manager;
pub mod strategy_profile;

// 重导出核心配置管理器
pub use config_manager::{
    ConfigError, ConfigManager, ConfigResult, PlanningConfig, ResolvedPlanningOptions,
};
pub use strategy_profile::{CustomStrategyParameters, CustomStrategyProfile};
