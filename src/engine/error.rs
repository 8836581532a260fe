// ==========================================
// 注塑模具排机系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分层: EngineError 为单个引擎的致命配置错误;
//       PlanningError 为编排层汇总错误
// ==========================================

use thiserror::Error;

/// 引擎层错误类型
///
/// 仅覆盖致命配置错误; 业务性失败（模具无兼容机台、
/// 超过负荷阈值）不是错误, 以结果字段与 reason 表达
#[derive(Error, Debug)]
pub enum EngineError {
    // ===== 主数据错误 =====
    #[error("机台主数据为空, 无法构建矩阵")]
    EmptyMachineSet,

    #[error("模具主数据为空, 无法构建矩阵")]
    EmptyMoldSet,

    // ===== 矩阵错误 =====
    #[error("优先级矩阵为空或缺失: {0}")]
    EmptyPriorityMatrix(String),

    #[error("矩阵结构异常 (field={field}): {message}")]
    MalformedMatrix { field: String, message: String },

    // ===== 策略错误 =====
    #[error("未知排序策略: {0}")]
    UnknownStrategy(String),
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;

/// 编排层错误类型
///
/// 汇总下层错误并保留 anyhow 透传出口
#[derive(Error, Debug)]
pub enum PlanningError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Snapshot(#[from] crate::repository::SnapshotError),

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result 类型别名
pub type PlanningResult<T> = Result<T, PlanningError>;
