// ==========================================
// 注塑模具排机系统 - 快照仓储层
// ==========================================
// 职责: 提供排机输入快照的读取端口与实现
// 红线: Repository 不含业务逻辑
// ==========================================

pub mod error;
pub mod snapshot;

// 重导出核心仓储
pub use error::{SnapshotError, SnapshotResult};
pub use snapshot::{
    InMemorySnapshotRepository, JsonSnapshotRepository, PlanningSnapshot,
    PlanningSnapshotRepository, PriorityRank,
};
