// ==========================================
// 注塑模具排机系统 - 兼容性兜底层优化器
// ==========================================
// 红线: 不做溢出强制落位, 放不下的模具丢弃并标记
// ==========================================
// 职责: 历史优先层未覆盖模具的吨位兼容分配
// - 按排序策略（兼容性/周期/数量的六种排列）决定处理顺序
// - 候选 = 兼容矩阵行内为 1 的机台, 取阈值内最闲一台
// - 仅在模具丢弃时, 当前负荷严格超阈值的候选记入过载集合
// ==========================================

use crate::domain::{AssignmentMatrix, CompatibilityMatrix, LoadTable, SortKey, SortStrategy};
use crate::engine::error::{EngineError, EngineResult};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, instrument, warn};

// ==========================================
// TierTwoOptimizer - 兼容性兜底层优化器
// ==========================================
pub struct TierTwoOptimizer {
    /// 兜底池处理顺序策略
    strategy: SortStrategy,
    /// 机台负荷阈值（天）, None = 不设上限
    max_load_threshold: Option<f64>,
}

/// 兜底层运行结果
#[derive(Debug, Clone)]
pub struct TierTwoResult {
    /// 兜底池模具 × 全量机台的分配矩阵
    pub assignment: AssignmentMatrix,
    /// 落位成功的模具, 按处理顺序
    pub assigned_molds: Vec<String>,
    /// 丢弃的模具（矩阵缺行、无兼容机台或全部超阈值）, 缺行的在前
    pub unassigned_molds: Vec<String>,
    /// 模具丢弃时当前负荷严格超过阈值的候选机台
    pub overloaded_machines: BTreeSet<String>,
    /// 运行后的共享负荷表
    pub load: LoadTable,
}

/// 排序用的单模具度量
struct MoldMetrics {
    mold_id: String,
    /// 兼容矩阵行号
    row: usize,
    /// 兼容机台数, 越少越先处理
    compat_count: usize,
    lead_time_days: f64,
    /// 待产总量, 缺失排最后
    quantity: Option<i64>,
}

impl TierTwoOptimizer {
    pub fn new(strategy: SortStrategy, max_load_threshold: Option<f64>) -> Self {
        Self {
            strategy,
            max_load_threshold,
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 对兜底池执行兼容性分配
    ///
    /// # 参数
    /// - `pool`: 历史优先层未覆盖的模具
    /// - `compatibility`: 全量模具 × 全量机台的兼容矩阵
    /// - `lead_times`: 模具周期表, 缺失按 0 天处理
    /// - `quantities`: 模具待产总量, 缺失视为无数据
    /// - `load`: 共享负荷表, 含历史优先层提交后的状态
    #[instrument(skip_all, fields(
        pool_size = pool.len(),
        strategy = %self.strategy
    ))]
    pub fn run(
        &self,
        pool: &[String],
        compatibility: &CompatibilityMatrix,
        lead_times: &HashMap<String, f64>,
        quantities: &HashMap<String, i64>,
        mut load: LoadTable,
    ) -> EngineResult<TierTwoResult> {
        if compatibility.machine_count() == 0 {
            return Err(EngineError::EmptyMachineSet);
        }
        let machine_codes: Vec<String> = compatibility.machine_codes().to_vec();
        let mut assignment = AssignmentMatrix::new(pool.to_vec(), machine_codes.clone());
        let mut assigned_molds = Vec::new();
        let mut unassigned_molds = Vec::new();
        let mut overloaded_machines = BTreeSet::new();

        // ===== 按策略键排序兜底池 =====
        let (ordered, missing_rows) = self.sort_pool(pool, compatibility, lead_times, quantities);
        unassigned_molds.extend(missing_rows);

        // ===== 逐模具落位 =====
        for metrics in &ordered {
            let candidate_cols: Vec<usize> = compatibility.nonzero_cols_in_row(metrics.row);
            if candidate_cols.is_empty() {
                warn!(mold_id = %metrics.mold_id, "无兼容机台, 模具丢弃");
                unassigned_molds.push(metrics.mold_id.clone());
                continue;
            }

            // 稳定排序: 负荷相同时保持矩阵列序
            let mut candidates: Vec<(String, f64)> = candidate_cols
                .iter()
                .map(|&c| {
                    let code = machine_codes[c].clone();
                    let current = load.load_of(&code).unwrap_or(0.0);
                    (code, current)
                })
                .collect();
            candidates.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

            let chosen = candidates
                .iter()
                .find(|(_, current)| self.fits(current + metrics.lead_time_days));
            match chosen {
                Some((machine_code, _)) => {
                    assignment.assign(&metrics.mold_id, machine_code, metrics.lead_time_days);
                    load.commit(machine_code, metrics.lead_time_days, "COMPAT_LEAST_LOADED");
                    assigned_molds.push(metrics.mold_id.clone());
                    debug!(
                        mold_id = %metrics.mold_id,
                        machine_code = %machine_code,
                        lead_time_days = metrics.lead_time_days,
                        "兜底落位"
                    );
                }
                None => {
                    // 本层不强制落位; 过载标记只随丢弃产生
                    if let Some(threshold) = self.max_load_threshold {
                        for (code, current) in &candidates {
                            if *current > threshold {
                                overloaded_machines.insert(code.clone());
                            }
                        }
                    }
                    warn!(
                        mold_id = %metrics.mold_id,
                        candidates = candidates.len(),
                        threshold = ?self.max_load_threshold,
                        "全部兼容机台投影负荷超阈值, 模具丢弃"
                    );
                    unassigned_molds.push(metrics.mold_id.clone());
                }
            }
        }

        info!(
            assigned = assigned_molds.len(),
            unassigned = unassigned_molds.len(),
            overloaded = overloaded_machines.len(),
            load_version = load.version(),
            "兼容性兜底层完成"
        );
        Ok(TierTwoResult {
            assignment,
            assigned_molds,
            unassigned_molds,
            overloaded_machines,
            load,
        })
    }

    // ==========================================
    // 内部方法
    // ==========================================

    /// 采集度量并按策略键排序, 稳定排序保持池内原序
    ///
    /// # 返回
    /// (排序后的度量, 兼容矩阵缺行的模具) - 缺行模具直接计入未落位
    fn sort_pool(
        &self,
        pool: &[String],
        compatibility: &CompatibilityMatrix,
        lead_times: &HashMap<String, f64>,
        quantities: &HashMap<String, i64>,
    ) -> (Vec<MoldMetrics>, Vec<String>) {
        let mut missing_rows = Vec::new();
        let mut metrics: Vec<MoldMetrics> = pool
            .iter()
            .filter_map(|mold_id| {
                let row = match compatibility.mold_index_of(mold_id) {
                    Some(row) => row,
                    None => {
                        warn!(mold_id = %mold_id, "兼容矩阵缺少该模具行, 计入未落位");
                        missing_rows.push(mold_id.clone());
                        return None;
                    }
                };
                Some(MoldMetrics {
                    mold_id: mold_id.clone(),
                    row,
                    compat_count: compatibility.nonzero_count_in_row(row),
                    lead_time_days: lead_times.get(mold_id).copied().unwrap_or(0.0),
                    quantity: quantities.get(mold_id).copied(),
                })
            })
            .collect();

        let keys = self.strategy.keys();
        metrics.sort_by(|a, b| compare_by_keys(a, b, &keys));
        (metrics, missing_rows)
    }

    fn fits(&self, projected: f64) -> bool {
        match self.max_load_threshold {
            Some(threshold) => projected <= threshold,
            None => true,
        }
    }
}

/// 按策略键序逐键比较, 全部相等时返回 Equal 交给稳定排序
fn compare_by_keys(a: &MoldMetrics, b: &MoldMetrics, keys: &[SortKey; 3]) -> Ordering {
    for key in keys {
        let ordering = match key {
            // 兼容机台越少越紧迫
            SortKey::MachineCompatibility => a.compat_count.cmp(&b.compat_count),
            // 周期长的先占位
            SortKey::MoldLeadTime => b
                .lead_time_days
                .partial_cmp(&a.lead_time_days)
                .unwrap_or(Ordering::Equal),
            // 数量小的先落位, 缺失排最后
            SortKey::TotalQuantity => match (a.quantity, b.quantity) {
                (Some(qa), Some(qb)) => qa.cmp(&qb),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
