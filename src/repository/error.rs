// ==========================================
// 注塑模具排机系统 - 快照仓储错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 快照仓储层错误类型
#[derive(Error, Debug)]
pub enum SnapshotError {
    // ===== 文件错误 =====
    #[error("快照文件读取失败 (path={path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // ===== 数据错误 =====
    #[error("快照反序列化失败: {0}")]
    Deserialize(String),

    #[error("快照数据校验失败 (field={field}): {message}")]
    FieldValueError { field: String, message: String },

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result 类型别名
pub type SnapshotResult<T> = Result<T, SnapshotError>;
