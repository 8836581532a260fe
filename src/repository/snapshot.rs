// ==========================================
// 注塑模具排机系统 - 排机快照仓储
// ==========================================
// 职责: 定义快照读取端口与两种实现
// - InMemorySnapshotRepository: 测试与嵌入调用
// - JsonSnapshotRepository: CLI 从 JSON 文件读取
// 红线: 仓储只做读取与基础校验, 不做业务推导
// ==========================================

use crate::domain::{Machine, Mold, PendingJob, PinnedPair, ProducingJob};
use crate::repository::error::{SnapshotError, SnapshotResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

// ==========================================
// PriorityRank - 历史优先级记录
// ==========================================
// 历史绩效评分组件的产出, 一条记录一个 (模具, 机台) 评级
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityRank {
    pub mold_id: String,
    pub machine_code: String,
    /// 1 = 历史最优, 数值越大越差; 0 视为不可行
    pub rank: u32,
}

// ==========================================
// PlanningSnapshot - 排机输入快照
// ==========================================
// 一次排机运行的全部外部输入, 运行开始时一次性读取
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlanningSnapshot {
    /// 机台主数据
    #[serde(default)]
    pub machines: Vec<Machine>,
    /// 模具主数据
    #[serde(default)]
    pub molds: Vec<Mold>,
    /// 历史优先级记录（可为空, 表示无历史数据）
    #[serde(default)]
    pub priority_ranks: Vec<PriorityRank>,
    /// 模具周期表: mold_id → 完成待产数量所需天数
    #[serde(default)]
    pub lead_times: HashMap<String, f64>,
    /// 待产订单
    #[serde(default)]
    pub pending_jobs: Vec<PendingJob>,
    /// 在产作业
    #[serde(default)]
    pub producing_jobs: Vec<ProducingJob>,
    /// item → mold 映射
    #[serde(default)]
    pub item_to_mold: HashMap<String, String>,
    /// 显式钉选对（在产作业之外的人工钉选）
    #[serde(default)]
    pub pins: Vec<PinnedPair>,
}

// ==========================================
// 快照仓储端口
// ==========================================

/// 排机快照读取端口
///
/// 引擎层只依赖此 trait, 不关心快照被谁、从哪里装载
#[async_trait]
pub trait PlanningSnapshotRepository: Send + Sync {
    /// 读取一次完整的排机输入快照
    async fn load_snapshot(&self) -> SnapshotResult<PlanningSnapshot>;
}

// ==========================================
// 内存实现
// ==========================================

/// 内存快照仓储, 测试与嵌入式调用使用
#[derive(Debug, Clone)]
pub struct InMemorySnapshotRepository {
    snapshot: PlanningSnapshot,
}

impl InMemorySnapshotRepository {
    pub fn new(snapshot: PlanningSnapshot) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl PlanningSnapshotRepository for InMemorySnapshotRepository {
    async fn load_snapshot(&self) -> SnapshotResult<PlanningSnapshot> {
        Ok(self.snapshot.clone())
    }
}

// ==========================================
// JSON 文件实现
// ==========================================

/// JSON 文件快照仓储, CLI 入口使用
#[derive(Debug, Clone)]
pub struct JsonSnapshotRepository {
    path: PathBuf,
}

impl JsonSnapshotRepository {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// 基础数据校验: 数值字段必须有限且非负
    fn validate(snapshot: &PlanningSnapshot) -> SnapshotResult<()> {
        for job in &snapshot.producing_jobs {
            if !job.remaining_days.is_finite() || job.remaining_days < 0.0 {
                return Err(SnapshotError::FieldValueError {
                    field: "producing_jobs.remaining_days".to_string(),
                    message: format!(
                        "机台 {} 模具 {} 的剩余天数非法: {}",
                        job.machine_code, job.mold_id, job.remaining_days
                    ),
                });
            }
        }
        for (mold_id, days) in &snapshot.lead_times {
            if !days.is_finite() || *days < 0.0 {
                return Err(SnapshotError::FieldValueError {
                    field: "lead_times".to_string(),
                    message: format!("模具 {} 的周期天数非法: {}", mold_id, days),
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl PlanningSnapshotRepository for JsonSnapshotRepository {
    async fn load_snapshot(&self) -> SnapshotResult<PlanningSnapshot> {
        debug!(path = %self.path.display(), "读取排机快照文件");
        let content =
            tokio::fs::read_to_string(&self.path)
                .await
                .map_err(|source| SnapshotError::Io {
                    path: self.path.display().to_string(),
                    source,
                })?;
        let snapshot: PlanningSnapshot =
            serde_json::from_str(&content).map_err(|e| SnapshotError::Deserialize(e.to_string()))?;
        Self::validate(&snapshot)?;
        info!(
            machines = snapshot.machines.len(),
            molds = snapshot.molds.len(),
            priority_ranks = snapshot.priority_ranks.len(),
            pending_jobs = snapshot.pending_jobs.len(),
            producing_jobs = snapshot.producing_jobs.len(),
            "排机快照读取完成"
        );
        Ok(snapshot)
    }
}
