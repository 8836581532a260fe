// ==========================================
// 注塑模具排机系统 - 引擎层
// ==========================================
// 职责: 实现排机算法引擎, 不做任何 IO
// 红线: 引擎无状态, 所有落位决策必须输出 reason
// ==========================================

pub mod compatibility;
pub mod error;
pub mod materializer;
pub mod orchestrator;
pub mod report;
pub mod tier1;
pub mod tier2;

// 重导出核心引擎
pub use compatibility::{CompatibilityBuildResult, CompatibilityMatrixBuilder};
pub use error::{EngineError, EngineResult, PlanningError, PlanningResult};
pub use materializer::ScheduleMaterializer;
pub use orchestrator::{PlanningOrchestrator, PlanningOutcome};
pub use report::PlanningReport;
pub use tier1::{TierOneOptimizer, TierOneResult};
pub use tier2::{TierTwoOptimizer, TierTwoResult};
