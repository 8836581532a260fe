// ==========================================
// 注塑模具排机系统 - 排机编排器
// ==========================================
// 红线: 层内算法严格顺序执行; 并行只允许出现在准备阶段
// ==========================================
// 用途: 协调一次完整排机运行
// - 快照加载与主数据校验
// - 并行准备（优先级矩阵构建 + 需求/周期分析, 可降级顺序）
// - 两层兜底组合: 历史优先层 → 按需兼容兜底层
// - 分层物化、合并重编号、钉选覆盖
// - 状态机 NotStarted → Tier1Done → Tier2Done → Merged
// ==========================================

use crate::config::PlanningConfig;
use crate::domain::{
    AssignmentMatrix, LoadTable, Mold, PendingJob, PinnedPair, PlanningState, PriorityMatrix,
    RowSource, ScheduleTable,
};
use crate::engine::compatibility::CompatibilityMatrixBuilder;
use crate::engine::error::{EngineError, EngineResult, PlanningError, PlanningResult};
use crate::engine::materializer::ScheduleMaterializer;
use crate::engine::report::PlanningReport;
use crate::engine::tier1::{TierOneOptimizer, TierOneResult};
use crate::engine::tier2::{TierTwoOptimizer, TierTwoResult};
use crate::repository::{PlanningSnapshot, PlanningSnapshotRepository, PriorityRank};
use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 准备阶段固定两个分析任务
const PREPARE_TASKS: usize = 2;

// ==========================================
// PlanningOutcome - 排机运行产出
// ==========================================

#[derive(Debug, Clone, Serialize)]
pub struct PlanningOutcome {
    /// 运行诊断报告
    pub report: PlanningReport,

    /// 合并并施加钉选后的最终排程表
    pub schedule: ScheduleTable,

    /// 两层按标识并入后的最终分配矩阵
    pub assignment: AssignmentMatrix,
}

// ==========================================
// 准备阶段中间产物
// ==========================================

/// 需求与周期分析结果
///
/// 周期表在此补全（缺失模具记 0 天）, 后续各层直接查表
#[derive(Debug, Clone)]
struct DemandAnalysis {
    lead_times: HashMap<String, f64>,
    /// 模具待产总量, 只统计有数量数据的订单
    mold_quantities: HashMap<String, i64>,
    /// 产品项目没有模具映射的订单号
    orders_without_mold: Vec<String>,
}

/// 工作任务的统一产物, join_all 收集后按变体归位
enum PreparedPart {
    Priority(EngineResult<PriorityMatrix>),
    Demand(DemandAnalysis),
}

struct PreparedInputs {
    priority: EngineResult<PriorityMatrix>,
    demand: DemandAnalysis,
}

// ==========================================
// PlanningOrchestrator - 排机编排器
// ==========================================

pub struct PlanningOrchestrator<R>
where
    R: PlanningSnapshotRepository,
{
    repository: Arc<R>,
    config: PlanningConfig,
    compat_builder: CompatibilityMatrixBuilder,
    materializer: ScheduleMaterializer,
}

impl<R> PlanningOrchestrator<R>
where
    R: PlanningSnapshotRepository,
{
    /// 创建新的编排器实例
    ///
    /// # 参数
    /// - repository: 快照仓储端口
    /// - config: 排机配置
    pub fn new(repository: Arc<R>, config: PlanningConfig) -> Self {
        Self {
            repository,
            config,
            compat_builder: CompatibilityMatrixBuilder::new(),
            materializer: ScheduleMaterializer::new(),
        }
    }

    /// 执行一次完整排机运行
    ///
    /// # 参数
    /// - profile_name: 本次运行生效的策略档案名, None 用全局配置
    ///
    /// # 返回
    /// 最终排程表、分配矩阵与诊断报告
    pub async fn run(&self, profile_name: Option<&str>) -> PlanningResult<PlanningOutcome> {
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        let mut state = PlanningState::NotStarted;

        info!(run_id = %run_id, state = %state, profile = ?profile_name, "开始排机运行");

        // ==========================================
        // 步骤1: 快照加载与主数据校验
        // ==========================================
        debug!("步骤1: 加载排机快照");

        let snapshot = self.repository.load_snapshot().await?;
        if snapshot.machines.is_empty() {
            return Err(PlanningError::Engine(EngineError::EmptyMachineSet));
        }
        if snapshot.molds.is_empty() {
            return Err(PlanningError::Engine(EngineError::EmptyMoldSet));
        }
        let machine_codes: Vec<String> = snapshot
            .machines
            .iter()
            .map(|m| m.machine_code.clone())
            .collect();
        let mold_ids: Vec<String> = snapshot.molds.iter().map(|m| m.mold_id.clone()).collect();
        let options = self.config.resolve_profile(profile_name);

        info!(
            machines = machine_codes.len(),
            molds = mold_ids.len(),
            pending_jobs = snapshot.pending_jobs.len(),
            producing_jobs = snapshot.producing_jobs.len(),
            threshold = ?options.max_load_threshold,
            strategy = %options.tier2_strategy,
            "快照加载完成"
        );

        // ==========================================
        // 步骤2: 并行准备阶段
        // ==========================================
        debug!("步骤2: 准备优先级矩阵与需求分析");

        let PreparedInputs { priority, demand } = self.prepare_inputs(&snapshot).await;

        // ==========================================
        // 步骤3: 兼容矩阵构建
        // ==========================================
        debug!("步骤3: 构建吨位兼容矩阵");

        let compat = self
            .compat_builder
            .build(&snapshot.molds, &snapshot.machines)?;

        // ==========================================
        // 步骤4: 历史优先层
        // ==========================================
        debug!("步骤4: 执行历史优先层");

        // 共享负荷表: 先入账在产基线, 之后各层在同一张表上提交
        let mut load = LoadTable::new(&machine_codes);
        for job in &snapshot.producing_jobs {
            if load
                .commit(&job.machine_code, job.remaining_days, "BASELINE_IN_FLIGHT")
                .is_none()
            {
                warn!(
                    machine_code = %job.machine_code,
                    mold_id = %job.mold_id,
                    "在产作业引用未知机台, 基线负荷忽略"
                );
            }
        }

        // 优先级输入异常不中止运行: 历史优先层跳过, 全部模具进入兜底池
        let (tier1, tier1_skipped) = match priority {
            Ok(matrix) if !matrix.is_empty_shape() => {
                let optimizer = TierOneOptimizer::new(
                    options.max_load_threshold,
                    options.round1b_iteration_limit,
                );
                let result = optimizer.run(
                    &mold_ids,
                    &machine_codes,
                    &matrix,
                    &demand.lead_times,
                    load,
                )?;
                (result, false)
            }
            Ok(_) => {
                warn!("优先级矩阵结构为空, 历史优先层跳过");
                (skipped_tier_one(&mold_ids, &machine_codes, load), true)
            }
            Err(error) => {
                warn!(%error, "优先级输入异常, 历史优先层跳过");
                (skipped_tier_one(&mold_ids, &machine_codes, load), true)
            }
        };
        let TierOneResult {
            assignment: tier1_assignment,
            assigned_molds: tier1_assigned,
            unassigned_molds: tier1_unassigned,
            round1b_iterations,
            load,
            ..
        } = tier1;

        state = PlanningState::Tier1Done;
        info!(
            state = %state,
            assigned = tier1_assigned.len(),
            unassigned = tier1_unassigned.len(),
            skipped = tier1_skipped,
            "历史优先层阶段结束"
        );

        // ==========================================
        // 步骤5: 兜底层决策与执行
        // ==========================================
        debug!("步骤5: 兜底层决策");

        let mut tier2_executed = false;
        let mut tier2_assigned: Vec<String> = Vec::new();
        let mut tier2_unassigned: Vec<String> = Vec::new();
        let mut overloaded_machines: BTreeSet<String> = BTreeSet::new();
        let mut tier2_assignment: Option<AssignmentMatrix> = None;

        // 决策规则: 一层有漏网模具才运行兜底层
        let load = if tier1_unassigned.is_empty() {
            info!("历史优先层全量覆盖, 兜底层跳过");
            load
        } else {
            let optimizer =
                TierTwoOptimizer::new(options.tier2_strategy, options.max_load_threshold);
            let result = optimizer.run(
                &tier1_unassigned,
                &compat.matrix,
                &demand.lead_times,
                &demand.mold_quantities,
                load,
            )?;
            let TierTwoResult {
                assignment,
                assigned_molds,
                unassigned_molds,
                overloaded_machines: overloaded,
                load,
            } = result;
            tier2_executed = true;
            tier2_assigned = assigned_molds;
            tier2_unassigned = unassigned_molds;
            overloaded_machines = overloaded;
            tier2_assignment = Some(assignment);
            load
        };

        // 跳过兜底层也要经过 Tier2Done, 状态上报口径统一
        state = PlanningState::Tier2Done;
        info!(
            state = %state,
            executed = tier2_executed,
            assigned = tier2_assigned.len(),
            unassigned = tier2_unassigned.len(),
            "兜底层阶段结束"
        );

        // ==========================================
        // 步骤6: 分层物化与合并重编号
        // ==========================================
        debug!("步骤6: 物化并合并两层排程");

        let tier1_schedule = self.materializer.materialize(
            &tier1_assignment,
            &snapshot.pending_jobs,
            &snapshot.item_to_mold,
            &[],
            RowSource::Tier1,
        );
        let tier2_schedule = match &tier2_assignment {
            Some(assignment) => self.materializer.materialize(
                assignment,
                &snapshot.pending_jobs,
                &snapshot.item_to_mold,
                &[],
                RowSource::Tier2,
            ),
            None => ScheduleTable::new(),
        };
        let mut schedule = merge_schedules(tier1_schedule, tier2_schedule);

        let mut final_assignment = tier1_assignment;
        if let Some(assignment) = &tier2_assignment {
            let absorbed = final_assignment.absorb(assignment);
            debug!(absorbed, "兜底层分配并入最终矩阵");
        }

        // ==========================================
        // 步骤7: 钉选覆盖
        // ==========================================
        debug!("步骤7: 施加在产钉选");

        let pins = effective_pins(&snapshot);
        self.materializer.apply_pinning(&mut schedule, &pins);

        state = PlanningState::Merged;
        info!(state = %state, pins = pins.len(), rows = schedule.len(), "排程合并完成");

        // ==========================================
        // 步骤8: 诊断汇总
        // ==========================================
        debug!("步骤8: 汇总运行诊断");

        let assigned_union: HashSet<&String> =
            tier1_assigned.iter().chain(tier2_assigned.iter()).collect();
        let mut unmatched_orders = demand.orders_without_mold.clone();
        for job in &snapshot.pending_jobs {
            if let Some(mold_id) = snapshot.item_to_mold.get(&job.item_name) {
                if !assigned_union.contains(mold_id) {
                    unmatched_orders.push(job.order_id.clone());
                }
            }
        }
        let unassigned_molds = if tier2_executed {
            tier2_unassigned.clone()
        } else {
            tier1_unassigned.clone()
        };

        let report = PlanningReport {
            run_id,
            created_at: Utc::now(),
            state,
            molds_total: mold_ids.len(),
            tier1_assigned: tier1_assigned.len(),
            tier1_unassigned: tier1_unassigned.len(),
            tier1_skipped,
            tier2_executed,
            tier2_assigned: tier2_assigned.len(),
            tier2_unassigned: tier2_unassigned.len(),
            unassigned_molds,
            round1b_iterations,
            overloaded_machines,
            unmatched_orders,
            elapsed_ms: started.elapsed().as_millis() as u64,
            machine_loads: load.snapshot(),
            load_version: load.version(),
        };
        info!(summary = %report.summary_cn(), "排机运行完成");

        Ok(PlanningOutcome {
            report,
            schedule,
            assignment: final_assignment,
        })
    }

    // ==========================================
    // 并行准备阶段
    // ==========================================

    /// 资源探测: 并行可行时返回工作任务数, 否则 None
    fn probe_workers(&self) -> Option<usize> {
        if !self.config.parallel_enabled {
            return None;
        }
        if self.config.parallel_max_workers < PREPARE_TASKS {
            debug!(
                max_workers = self.config.parallel_max_workers,
                "配置工作任务数不足两个, 准备阶段顺序执行"
            );
            return None;
        }
        match std::thread::available_parallelism() {
            Ok(cores) if cores.get() >= self.config.parallel_min_cores => {
                Some(self.config.parallel_max_workers.min(PREPARE_TASKS))
            }
            Ok(cores) => {
                info!(
                    cores = cores.get(),
                    min_cores = self.config.parallel_min_cores,
                    "逻辑核数不足, 准备阶段降级为顺序执行"
                );
                None
            }
            Err(error) => {
                warn!(%error, "无法探测逻辑核数, 准备阶段降级为顺序执行");
                None
            }
        }
    }

    /// 两个独立输入分析的 fork-join
    ///
    /// 任一任务崩溃时整段降级为顺序重算, 不影响后续各层;
    /// 任务各自持有输入副本, 顺序与并行路径产出一致
    async fn prepare_inputs(&self, snapshot: &PlanningSnapshot) -> PreparedInputs {
        if let Some(workers) = self.probe_workers() {
            info!(workers, "并行准备阶段启动");
            let ranks = snapshot.priority_ranks.clone();
            let molds = snapshot.molds.clone();
            let lead_times = snapshot.lead_times.clone();
            let pending = snapshot.pending_jobs.clone();
            let mapping = snapshot.item_to_mold.clone();

            let handles = vec![
                tokio::spawn(async move { PreparedPart::Priority(build_priority_matrix(&ranks)) }),
                tokio::spawn(async move {
                    PreparedPart::Demand(analyze_demand(&molds, lead_times, &pending, &mapping))
                }),
            ];

            let mut priority = None;
            let mut demand = None;
            let mut worker_failed = false;
            for joined in join_all(handles).await {
                match joined {
                    Ok(PreparedPart::Priority(result)) => priority = Some(result),
                    Ok(PreparedPart::Demand(analysis)) => demand = Some(analysis),
                    Err(error) => {
                        warn!(%error, "并行准备任务崩溃, 整段降级为顺序重算");
                        worker_failed = true;
                    }
                }
            }
            if !worker_failed {
                if let (Some(priority), Some(demand)) = (priority, demand) {
                    return PreparedInputs { priority, demand };
                }
            }
        }

        debug!("准备阶段顺序执行");
        PreparedInputs {
            priority: build_priority_matrix(&snapshot.priority_ranks),
            demand: analyze_demand(
                &snapshot.molds,
                snapshot.lead_times.clone(),
                &snapshot.pending_jobs,
                &snapshot.item_to_mold,
            ),
        }
    }
}

// ==========================================
// 模块级辅助
// ==========================================

/// 优先级评级表 → 优先级矩阵
///
/// 行列按首次出现顺序; 同一 (模具, 机台) 单元格重复视为上游数据异常
fn build_priority_matrix(ranks: &[PriorityRank]) -> EngineResult<PriorityMatrix> {
    let mut mold_ids: Vec<String> = Vec::new();
    let mut machine_codes: Vec<String> = Vec::new();
    let mut seen_molds: HashSet<String> = HashSet::new();
    let mut seen_machines: HashSet<String> = HashSet::new();
    for rank in ranks {
        if seen_molds.insert(rank.mold_id.clone()) {
            mold_ids.push(rank.mold_id.clone());
        }
        if seen_machines.insert(rank.machine_code.clone()) {
            machine_codes.push(rank.machine_code.clone());
        }
    }

    let mut matrix = PriorityMatrix::new(mold_ids, machine_codes);
    let mut seen_cells: HashSet<(String, String)> = HashSet::new();
    for rank in ranks {
        if !seen_cells.insert((rank.mold_id.clone(), rank.machine_code.clone())) {
            return Err(EngineError::MalformedMatrix {
                field: "priority_ranks".to_string(),
                message: format!("单元格重复: {} × {}", rank.mold_id, rank.machine_code),
            });
        }
        if rank.rank > 0 {
            matrix.set(&rank.mold_id, &rank.machine_code, rank.rank);
        }
    }
    Ok(matrix)
}

/// 需求与周期分析
///
/// 补全周期表并汇总每模具待产总量; 无模具映射的订单单独记录
fn analyze_demand(
    molds: &[Mold],
    mut lead_times: HashMap<String, f64>,
    pending_jobs: &[PendingJob],
    item_to_mold: &HashMap<String, String>,
) -> DemandAnalysis {
    for mold in molds {
        if !lead_times.contains_key(&mold.mold_id) {
            warn!(mold_id = %mold.mold_id, "模具缺少周期数据, 按 0 天处理");
            lead_times.insert(mold.mold_id.clone(), 0.0);
        }
    }

    let mut mold_quantities: HashMap<String, i64> = HashMap::new();
    let mut orders_without_mold: Vec<String> = Vec::new();
    for job in pending_jobs {
        match item_to_mold.get(&job.item_name) {
            Some(mold_id) => {
                if let Some(quantity) = job.quantity {
                    *mold_quantities.entry(mold_id.clone()).or_insert(0) += quantity;
                }
            }
            None => {
                warn!(order_id = %job.order_id, item_name = %job.item_name, "订单产品无模具映射");
                orders_without_mold.push(job.order_id.clone());
            }
        }
    }
    DemandAnalysis {
        lead_times,
        mold_quantities,
        orders_without_mold,
    }
}

/// 历史优先层跳过时的空产出: 全部模具进入兜底池
fn skipped_tier_one(
    mold_ids: &[String],
    machine_codes: &[String],
    load: LoadTable,
) -> TierOneResult {
    TierOneResult {
        assignment: AssignmentMatrix::new(mold_ids.to_vec(), machine_codes.to_vec()),
        assigned_molds: Vec::new(),
        unassigned_molds: mold_ids.to_vec(),
        round1a_count: 0,
        round1b_count: 0,
        round2_count: 0,
        round1b_iterations: 0,
        load,
    }
}

/// 两层排程合并
///
/// 每机台二层行保持相对顺序, 序号顺延在该机台一层最大序号之后
fn merge_schedules(tier1: ScheduleTable, tier2: ScheduleTable) -> ScheduleTable {
    let mut merged = tier1;
    let offsets: HashMap<String, i32> = tier2
        .machine_codes()
        .iter()
        .map(|code| (code.clone(), merged.max_rank_of(code)))
        .collect();
    for mut row in tier2.rows {
        if !row.is_empty_order() {
            if let Some(offset) = offsets.get(&row.machine_code) {
                row.priority_rank += offset;
            }
        }
        merged.rows.push(row);
    }
    merged.normalize_row_order();
    merged
}

/// 生效钉选 = 显式钉选 + 在产作业派生钉选
///
/// 显式钉选先行并按模具压制派生项, 同对去重
fn effective_pins(snapshot: &PlanningSnapshot) -> Vec<PinnedPair> {
    let mut seen: HashSet<PinnedPair> = HashSet::new();
    let mut explicit_molds: HashSet<String> = HashSet::new();
    let mut pins: Vec<PinnedPair> = Vec::new();
    for pin in &snapshot.pins {
        if seen.insert(pin.clone()) {
            explicit_molds.insert(pin.mold_id.clone());
            pins.push(pin.clone());
        }
    }
    for job in &snapshot.producing_jobs {
        let pin = PinnedPair::from(job);
        if explicit_molds.contains(&pin.mold_id) {
            continue;
        }
        if seen.insert(pin.clone()) {
            pins.push(pin);
        }
    }
    pins
}
