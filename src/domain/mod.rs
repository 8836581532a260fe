// ==========================================
// 注塑模具排机系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、矩阵与负荷环境、排程输出结构
// 红线: 不含数据访问逻辑, 不含引擎逻辑
// ==========================================

pub mod job;
pub mod load;
pub mod machine;
pub mod matrix;
pub mod mold;
pub mod schedule;
pub mod types;

// 重导出核心类型
pub use job::{PendingJob, PinnedPair, ProducingJob};
pub use load::{LoadCommit, LoadTable};
pub use machine::Machine;
pub use matrix::{
    AssignmentMatrix, CompatibilityMatrix, MoldAssignment, MoldMachineGrid, PriorityMatrix,
};
pub use mold::{parse_tonnage_spec, Mold};
pub use schedule::{ScheduleRow, ScheduleTable};
pub use types::{PlanningState, RowSource, SortKey, SortStrategy};
