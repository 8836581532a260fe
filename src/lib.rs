// ==========================================
// 注塑模具排机系统 - 核心库
// ==========================================
// 系统定位: 决策支持系统 (人工最终控制权)
// 核心能力: 吨位兼容 + 历史优先 + 负荷均衡的两层贪心排机
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 快照端口
pub mod repository;

// 引擎层 - 排机算法
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{PlanningState, RowSource, SortKey, SortStrategy};

// 领域实体
pub use domain::{
    AssignmentMatrix, CompatibilityMatrix, LoadTable, Machine, Mold, MoldAssignment,
    PendingJob, PinnedPair, PriorityMatrix, ProducingJob, ScheduleRow, ScheduleTable,
};

// 引擎
pub use engine::{
    CompatibilityMatrixBuilder, PlanningError, PlanningOrchestrator, PlanningOutcome,
    PlanningReport, PlanningResult, ScheduleMaterializer, TierOneOptimizer, TierTwoOptimizer,
};

// 配置
pub use config::{ConfigManager, PlanningConfig, ResolvedPlanningOptions};

// 仓储
pub use repository::{
    InMemorySnapshotRepository, JsonSnapshotRepository, PlanningSnapshot,
    PlanningSnapshotRepository, PriorityRank,
};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "注塑模具排机系统";

// ==========================================
// 预编译检查
// ==========================================
