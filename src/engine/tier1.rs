// ==========================================
// 注塑模具排机系统 - 历史优先层优化器
// ==========================================
// 红线: 三轮次序不可调换, 负荷提交必须立即生效
// ==========================================
// 职责: 基于历史优先级矩阵的三轮贪心分配
// - Round 1a: 唯一匹配直接落位（确定性, 与处理顺序无关）
// - Round 1b: 约束贪心循环（机台候选数恰为 1 时落位, 迭代收敛）
// - Round 2: 负荷均衡在线分配（超阈值时强制落位到最闲机台）
// 输出: 合并分配矩阵 + 已分配/未分配划分
// ==========================================

use crate::domain::{AssignmentMatrix, LoadTable, PriorityMatrix};
use crate::engine::error::{EngineError, EngineResult};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument, warn};

// ==========================================
// TierOneOptimizer - 历史优先层优化器
// ==========================================
pub struct TierOneOptimizer {
    /// 机台负荷阈值（天）, None = 不设上限
    max_load_threshold: Option<f64>,
    /// 约束贪心循环的迭代硬上限
    iteration_limit: usize,
}

/// 历史优先层运行结果
#[derive(Debug, Clone)]
pub struct TierOneResult {
    /// 三轮合并后的分配矩阵（全量模具 × 全量机台）
    pub assignment: AssignmentMatrix,
    /// 已分配模具, 按模具主数据顺序
    pub assigned_molds: Vec<String>,
    /// 未分配模具（交给兜底层）, 按模具主数据顺序
    pub unassigned_molds: Vec<String>,
    pub round1a_count: usize,
    pub round1b_count: usize,
    pub round2_count: usize,
    /// 约束贪心循环实际执行的迭代数
    pub round1b_iterations: usize,
    /// 运行后的共享负荷表
    pub load: LoadTable,
}

impl TierOneOptimizer {
    pub fn new(max_load_threshold: Option<f64>, iteration_limit: usize) -> Self {
        Self {
            max_load_threshold,
            iteration_limit,
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 执行历史优先层三轮分配
    ///
    /// # 参数
    /// - `mold_ids`: 全量模具标识（分配矩阵行序）
    /// - `machine_codes`: 全量机台代码（分配矩阵列序）
    /// - `priority`: 历史优先级矩阵, 行列可为全量集合的子集
    /// - `lead_times`: 模具周期表, 缺失按 0 天处理
    /// - `load`: 共享负荷表, 调用方已提交在产基线
    ///
    /// # 返回
    /// 运行结果; 优先级矩阵结构为空时返回致命配置错误
    #[instrument(skip_all, fields(
        mold_count = mold_ids.len(),
        machine_count = machine_codes.len(),
        priority_molds = priority.mold_count()
    ))]
    pub fn run(
        &self,
        mold_ids: &[String],
        machine_codes: &[String],
        priority: &PriorityMatrix,
        lead_times: &HashMap<String, f64>,
        mut load: LoadTable,
    ) -> EngineResult<TierOneResult> {
        if machine_codes.is_empty() {
            return Err(EngineError::EmptyMachineSet);
        }
        if mold_ids.is_empty() {
            return Err(EngineError::EmptyMoldSet);
        }
        if priority.is_empty_shape() {
            return Err(EngineError::EmptyPriorityMatrix(
                "矩阵行列存在空集".to_string(),
            ));
        }

        let mold_universe: HashSet<&str> = mold_ids.iter().map(String::as_str).collect();
        let machine_universe: HashSet<&str> = machine_codes.iter().map(String::as_str).collect();

        // 优先级矩阵中不在全量集合内的行列整体忽略
        let skip_row: Vec<bool> = priority
            .mold_ids()
            .iter()
            .map(|id| {
                let unknown = !mold_universe.contains(id.as_str());
                if unknown {
                    warn!(mold_id = %id, "优先级矩阵包含未知模具, 整行忽略");
                }
                unknown
            })
            .collect();
        let skip_col: Vec<bool> = priority
            .machine_codes()
            .iter()
            .map(|code| {
                let unknown = !machine_universe.contains(code.as_str());
                if unknown {
                    warn!(machine_code = %code, "优先级矩阵包含未知机台, 整列忽略");
                }
                unknown
            })
            .collect();

        let mut assignment = AssignmentMatrix::new(mold_ids.to_vec(), machine_codes.to_vec());
        let mut assigned: HashSet<String> = HashSet::new();

        // ===== Round 1a: 唯一匹配直接落位 =====
        let round1a_count = self.round_1a(
            priority,
            &skip_row,
            &skip_col,
            lead_times,
            &mut assignment,
            &mut load,
            &mut assigned,
        );
        info!(assigned = round1a_count, "Round 1a 唯一匹配完成");

        // ===== Round 1b: 约束贪心循环 =====
        let (round1b_count, round1b_iterations) = self.round_1b(
            priority,
            &skip_row,
            &skip_col,
            lead_times,
            &mut assignment,
            &mut load,
            &mut assigned,
        );
        info!(
            assigned = round1b_count,
            iterations = round1b_iterations,
            "Round 1b 约束贪心完成"
        );

        // ===== Round 2: 负荷均衡在线分配 =====
        let round2_count = self.round_2(
            priority,
            &skip_row,
            &skip_col,
            lead_times,
            &mut assignment,
            &mut load,
            &mut assigned,
        );
        info!(assigned = round2_count, "Round 2 负荷均衡完成");

        // 划分性质: assigned ∪ unassigned = 全量模具, 两集合不相交
        let assigned_molds: Vec<String> = mold_ids
            .iter()
            .filter(|id| assigned.contains(*id))
            .cloned()
            .collect();
        let unassigned_molds: Vec<String> = mold_ids
            .iter()
            .filter(|id| !assigned.contains(*id))
            .cloned()
            .collect();

        info!(
            total = mold_ids.len(),
            assigned = assigned_molds.len(),
            unassigned = unassigned_molds.len(),
            load_version = load.version(),
            "历史优先层完成"
        );
        Ok(TierOneResult {
            assignment,
            assigned_molds,
            unassigned_molds,
            round1a_count,
            round1b_count,
            round2_count,
            round1b_iterations,
            load,
        })
    }

    // ==========================================
    // Round 1a - 唯一匹配
    // ==========================================

    /// 优先级行中恰有一个非零单元格的模具直接落位, 无竞争
    #[allow(clippy::too_many_arguments)]
    fn round_1a(
        &self,
        priority: &PriorityMatrix,
        skip_row: &[bool],
        skip_col: &[bool],
        lead_times: &HashMap<String, f64>,
        assignment: &mut AssignmentMatrix,
        load: &mut LoadTable,
        assigned: &mut HashSet<String>,
    ) -> usize {
        let mut count = 0;
        for row in 0..priority.mold_count() {
            if skip_row[row] {
                continue;
            }
            let mold_id = &priority.mold_ids()[row];
            if assigned.contains(mold_id) {
                continue;
            }
            let cols: Vec<usize> = priority
                .nonzero_cols_in_row(row)
                .into_iter()
                .filter(|c| !skip_col[*c])
                .collect();
            if cols.len() != 1 {
                continue;
            }
            let machine_code = &priority.machine_codes()[cols[0]];
            let lead = lead_of(lead_times, mold_id);
            assignment.assign(mold_id, machine_code, lead);
            load.commit(machine_code, lead, "UNIQUE_PRIORITY_MATCH");
            assigned.insert(mold_id.clone());
            count += 1;
            debug!(
                mold_id = %mold_id,
                machine_code = %machine_code,
                lead_time_days = lead,
                "唯一匹配落位"
            );
        }
        count
    }

    // ==========================================
    // Round 1b - 约束贪心循环
    // ==========================================

    /// 周期加权矩阵上的迭代收敛
    ///
    /// 仅 rank==1 的单元格参与加权; 每次迭代提交候选数恰为 1 的机台,
    /// 提交后清空模具整行再进入下一次迭代
    ///
    /// # 返回
    /// (本轮落位数, 实际迭代数)
    #[allow(clippy::too_many_arguments)]
    fn round_1b(
        &self,
        priority: &PriorityMatrix,
        skip_row: &[bool],
        skip_col: &[bool],
        lead_times: &HashMap<String, f64>,
        assignment: &mut AssignmentMatrix,
        load: &mut LoadTable,
        assigned: &mut HashSet<String>,
    ) -> (usize, usize) {
        let rows = priority.mold_count();
        let cols = priority.machine_count();

        // 周期加权矩阵: rank==1 单元格 × 模具周期天数
        let mut weighted = vec![vec![0.0f64; cols]; rows];
        for (row, weighted_row) in weighted.iter_mut().enumerate() {
            if skip_row[row] {
                continue;
            }
            let mold_id = &priority.mold_ids()[row];
            if assigned.contains(mold_id) {
                continue;
            }
            let lead = lead_of(lead_times, mold_id);
            for (col, cell) in weighted_row.iter_mut().enumerate() {
                if !skip_col[col] && priority.get_by_index(row, col) == 1 {
                    *cell = lead;
                }
            }
        }

        // 迭代硬上限, 循环/歧义图上保证终止
        let cap = (2 * rows).min(self.iteration_limit).max(1);
        let mut iterations = 0;
        let mut count = 0;
        while iterations < cap {
            iterations += 1;

            // 快照本次迭代中候选数恰为 1 的机台及其候选模具
            let mut single_candidates: Vec<(usize, usize)> = Vec::new();
            for col in 0..cols {
                if skip_col[col] {
                    continue;
                }
                let mut candidate_row = None;
                let mut candidate_count = 0;
                for (row, weighted_row) in weighted.iter().enumerate() {
                    if weighted_row[col] != 0.0 {
                        candidate_count += 1;
                        candidate_row = Some(row);
                    }
                }
                if candidate_count == 1 {
                    if let Some(row) = candidate_row {
                        single_candidates.push((col, row));
                    }
                }
            }

            let mut committed_this_pass = 0;
            for (col, row) in single_candidates {
                // 同一模具可能同时是多台机台的唯一候选, 先到先得
                if weighted[row][col] == 0.0 {
                    continue;
                }
                let mold_id = priority.mold_ids()[row].clone();
                let machine_code = &priority.machine_codes()[col];
                let lead = weighted[row][col];
                assignment.assign(&mold_id, machine_code, lead);
                load.commit(machine_code, lead, "CONSTRAINED_SINGLE_CANDIDATE");
                assigned.insert(mold_id.clone());
                for cell in &mut weighted[row] {
                    *cell = 0.0;
                }
                committed_this_pass += 1;
                count += 1;
                debug!(
                    mold_id = %mold_id,
                    machine_code = %machine_code,
                    lead_time_days = lead,
                    iteration = iterations,
                    "约束贪心落位"
                );
            }

            if committed_this_pass == 0 {
                break;
            }
        }

        if iterations >= cap {
            warn!(iterations, cap, "约束贪心循环达到迭代上限, 提前收束");
        }
        (count, iterations)
    }

    // ==========================================
    // Round 2 - 负荷均衡在线分配
    // ==========================================

    /// 剩余模具按矩阵行序逐个落位
    ///
    /// 候选 = 优先级行内非零单元格对应机台, 按当前负荷升序;
    /// 投影负荷不超阈值的第一台落位, 全部超限时强制落到最闲机台
    /// （溢出兜底, 本层从不丢模具）; 每次落位立即提交负荷
    #[allow(clippy::too_many_arguments)]
    fn round_2(
        &self,
        priority: &PriorityMatrix,
        skip_row: &[bool],
        skip_col: &[bool],
        lead_times: &HashMap<String, f64>,
        assignment: &mut AssignmentMatrix,
        load: &mut LoadTable,
        assigned: &mut HashSet<String>,
    ) -> usize {
        let mut count = 0;
        for row in 0..priority.mold_count() {
            if skip_row[row] {
                continue;
            }
            let mold_id = &priority.mold_ids()[row];
            if assigned.contains(mold_id) {
                continue;
            }
            let candidate_cols: Vec<usize> = priority
                .nonzero_cols_in_row(row)
                .into_iter()
                .filter(|c| !skip_col[*c])
                .collect();
            if candidate_cols.is_empty() {
                // 无任何优先级候选, 留给兜底层
                continue;
            }

            let lead = lead_of(lead_times, mold_id);
            // 稳定排序: 负荷相同时保持矩阵列序
            let mut candidates: Vec<(String, f64)> = candidate_cols
                .iter()
                .map(|&c| {
                    let code = priority.machine_codes()[c].clone();
                    let current = load.load_of(&code).unwrap_or(0.0);
                    (code, current)
                })
                .collect();
            candidates.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

            let chosen = candidates
                .iter()
                .find(|(_, current)| self.fits(current + lead));
            let (machine_code, reason) = match chosen {
                Some((code, _)) => (code.clone(), "LOAD_BALANCED"),
                None => {
                    // 溢出兜底: 强制落到最闲机台, 不丢模具
                    let (code, current) = &candidates[0];
                    warn!(
                        mold_id = %mold_id,
                        machine_code = %code,
                        projected = current + lead,
                        threshold = ?self.max_load_threshold,
                        "投影负荷超过阈值, 强制落位到最闲机台"
                    );
                    (code.clone(), "OVERFLOW_FALLBACK")
                }
            };

            assignment.assign(mold_id, &machine_code, lead);
            load.commit(&machine_code, lead, reason);
            assigned.insert(mold_id.clone());
            count += 1;
            debug!(
                mold_id = %mold_id,
                machine_code = %machine_code,
                lead_time_days = lead,
                reason,
                "负荷均衡落位"
            );
        }
        count
    }

    fn fits(&self, projected: f64) -> bool {
        match self.max_load_threshold {
            Some(threshold) => projected <= threshold,
            None => true,
        }
    }
}

fn lead_of(lead_times: &HashMap<String, f64>, mold_id: &str) -> f64 {
    lead_times.get(mold_id).copied().unwrap_or(0.0)
}
