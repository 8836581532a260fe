// ==========================================
// 注塑模具排机系统 - 排程物化器
// ==========================================
// 红线: 空订单行永远 rank 0 且垫底; 钉选迁移必须带走模具全部行
// ==========================================
// 职责: 分配矩阵 → 逐机台有序排程表
// - 连接: 模具 × (item → mold 映射命中的待产订单), 无订单保留空行
// - 排序: 钉选 > 交货期 > 周期 > 数量, 缺失值每键垫底
// - 序号: 机台内非空订单行稠密 1..k, 空行恒 0
// - 钉选覆盖: 在产 (机台, 模具) 对的迁移与重排
// ==========================================

use crate::domain::{AssignmentMatrix, PendingJob, PinnedPair, RowSource, ScheduleRow, ScheduleTable};
use serde_json::json;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info, instrument, warn};

// ==========================================
// ScheduleMaterializer - 排程物化器
// ==========================================
pub struct ScheduleMaterializer {
    // 无状态引擎, 不需要注入依赖
}

impl ScheduleMaterializer {
    pub fn new() -> Self {
        Self {}
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 把分配矩阵展开成逐订单排程行并完成机台内排序
    ///
    /// # 参数
    /// - `assignment`: 单层产出的分配矩阵
    /// - `pending_jobs`: 待产订单全集
    /// - `item_to_mold`: 产品项目 → 模具号映射
    /// - `pins`: 在产钉选对, 仅用于行上的钉选标志
    /// - `source`: 本次物化的行来源层
    #[instrument(skip_all, fields(pending = pending_jobs.len(), source = %source))]
    pub fn materialize(
        &self,
        assignment: &AssignmentMatrix,
        pending_jobs: &[PendingJob],
        item_to_mold: &HashMap<String, String>,
        pins: &[PinnedPair],
        source: RowSource,
    ) -> ScheduleTable {
        let mut by_machine: BTreeMap<String, Vec<ScheduleRow>> = BTreeMap::new();

        for placed in assignment.assignments() {
            let pinned = pins
                .iter()
                .any(|p| p.machine_code == placed.machine_code && p.mold_id == placed.mold_id);
            let orders: Vec<&PendingJob> = pending_jobs
                .iter()
                .filter(|job| item_to_mold.get(&job.item_name) == Some(&placed.mold_id))
                .collect();

            let machine_rows = by_machine.entry(placed.machine_code.clone()).or_default();
            if orders.is_empty() {
                // 模具已落位但没有任何订单挂上来, 保留一行空订单行
                debug!(mold_id = %placed.mold_id, "模具无对应待产订单, 生成空订单行");
                machine_rows.push(ScheduleRow {
                    machine_code: placed.machine_code.clone(),
                    mold_id: Some(placed.mold_id.clone()),
                    order_id: None,
                    item_name: None,
                    quantity: None,
                    due_date: None,
                    lead_time_days: Some(placed.lead_time_days),
                    priority_rank: 0,
                    pinned,
                    source,
                    assign_reason: None,
                });
                continue;
            }
            for job in orders {
                machine_rows.push(ScheduleRow {
                    machine_code: placed.machine_code.clone(),
                    mold_id: Some(placed.mold_id.clone()),
                    order_id: Some(job.order_id.clone()),
                    item_name: Some(job.item_name.clone()),
                    quantity: job.quantity,
                    due_date: job.due_date,
                    lead_time_days: Some(placed.lead_time_days),
                    priority_rank: 0,
                    pinned,
                    source,
                    assign_reason: None,
                });
            }
        }

        let mut rows = Vec::new();
        for (_, mut machine_rows) in by_machine {
            machine_rows.sort_by(compare_rows);
            resequence(&mut machine_rows);
            rows.extend(machine_rows);
        }

        let table = ScheduleTable { rows };
        info!(rows = table.len(), machines = table.machine_codes().len(), "排程物化完成");
        table
    }

    // ==========================================
    // 钉选覆盖
    // ==========================================

    /// 对合并后的排程表施加在产钉选
    ///
    /// 逐对处理: 模具已在目标机台则不动;
    /// 否则把该模具的全部行迁到目标机台最前并重排受影响机台
    #[instrument(skip_all, fields(pins = pins.len()))]
    pub fn apply_pinning(&self, table: &mut ScheduleTable, pins: &[PinnedPair]) {
        for pin in pins {
            let mold_present = table
                .rows
                .iter()
                .any(|r| r.mold_id.as_deref() == Some(pin.mold_id.as_str()));
            if !mold_present {
                warn!(
                    machine_code = %pin.machine_code,
                    mold_id = %pin.mold_id,
                    "钉选模具不在排程中, 跳过"
                );
                continue;
            }

            let already_on_target = table.rows.iter().any(|r| {
                r.machine_code == pin.machine_code
                    && r.mold_id.as_deref() == Some(pin.mold_id.as_str())
            });
            if already_on_target {
                debug!(
                    machine_code = %pin.machine_code,
                    mold_id = %pin.mold_id,
                    "钉选已满足, 排程保持不变"
                );
                continue;
            }

            self.relocate(table, pin);
        }
        table.normalize_row_order();
    }

    /// 迁移钉选模具的全部行到目标机台
    fn relocate(&self, table: &mut ScheduleTable, pin: &PinnedPair) {
        let mut moved: Vec<ScheduleRow> = Vec::new();
        let mut kept: Vec<ScheduleRow> = Vec::new();
        let mut source_machines: BTreeSet<String> = BTreeSet::new();
        for row in table.rows.drain(..) {
            if row.mold_id.as_deref() == Some(pin.mold_id.as_str()) {
                source_machines.insert(row.machine_code.clone());
                moved.push(row);
            } else {
                kept.push(row);
            }
        }

        for row in &mut moved {
            let from = std::mem::replace(&mut row.machine_code, pin.machine_code.clone());
            row.pinned = true;
            row.assign_reason =
                Some(json!({ "pinned": true, "relocated_from": from }).to_string());
        }
        info!(
            machine_code = %pin.machine_code,
            mold_id = %pin.mold_id,
            moved_rows = moved.len(),
            source_machines = ?source_machines,
            "钉选迁移"
        );

        // 目标机台: 迁入行占最低序号, 原有行按现序顺延
        let mut target_existing: Vec<ScheduleRow> = Vec::new();
        let mut others: Vec<ScheduleRow> = Vec::new();
        for row in kept {
            if row.machine_code == pin.machine_code {
                target_existing.push(row);
            } else {
                others.push(row);
            }
        }
        // 目标机台有了真实行, 残留的占位行退场
        target_existing.retain(|r| r.source != RowSource::Placeholder);
        let mut target_rows = moved;
        target_rows.extend(target_existing);
        resequence(&mut target_rows);

        // 失行机台: 剩余行重排, 清空的补一行占位
        let mut rebuilt = others;
        rebuilt.extend(target_rows);
        for machine_code in &source_machines {
            if machine_code == &pin.machine_code {
                continue;
            }
            let mut source_rows: Vec<ScheduleRow> = Vec::new();
            let mut rest: Vec<ScheduleRow> = Vec::new();
            for row in rebuilt.drain(..) {
                if &row.machine_code == machine_code {
                    source_rows.push(row);
                } else {
                    rest.push(row);
                }
            }
            rebuilt = rest;
            if source_rows.is_empty() {
                rebuilt.push(ScheduleRow::placeholder(machine_code));
            } else {
                resequence(&mut source_rows);
                rebuilt.extend(source_rows);
            }
        }

        table.rows = rebuilt;
    }
}

impl Default for ScheduleMaterializer {
    fn default() -> Self {
        Self::new()
    }
}

/// 机台内行比较器
///
/// 空订单行强制垫底, 其余按 钉选 > 交货期 > 周期 > 数量,
/// 缺失值在每个键上都排最后, 全键相等时稳定排序保持输入顺序
fn compare_rows(a: &ScheduleRow, b: &ScheduleRow) -> Ordering {
    a.is_empty_order()
        .cmp(&b.is_empty_order())
        .then_with(|| b.pinned.cmp(&a.pinned))
        .then_with(|| cmp_option_asc(&a.due_date, &b.due_date))
        .then_with(|| cmp_option_asc(&a.lead_time_days, &b.lead_time_days))
        .then_with(|| cmp_option_asc(&a.quantity, &b.quantity))
}

fn cmp_option_asc<T: PartialOrd>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// 当前行序上重发稠密序号: 非空订单行 1..k 并补排序依据, 空行归 0 移到队尾
fn resequence(rows: &mut Vec<ScheduleRow>) {
    let mut ranked: Vec<ScheduleRow> = Vec::with_capacity(rows.len());
    let mut empty: Vec<ScheduleRow> = Vec::new();
    for row in rows.drain(..) {
        if row.is_empty_order() {
            empty.push(row);
        } else {
            ranked.push(row);
        }
    }
    for (index, row) in ranked.iter_mut().enumerate() {
        row.priority_rank = (index + 1) as i32;
        if row.assign_reason.is_none() {
            row.assign_reason = Some(
                json!({
                    "pinned": row.pinned,
                    "due_date": row.due_date,
                    "lead_time_days": row.lead_time_days,
                    "quantity": row.quantity,
                })
                .to_string(),
            );
        }
    }
    for row in &mut empty {
        row.priority_rank = 0;
    }
    rows.extend(ranked);
    rows.extend(empty);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn job(order: &str, item: &str, qty: Option<i64>, due: Option<NaiveDate>) -> PendingJob {
        let mut j = PendingJob::new(order, item);
        j.quantity = qty;
        j.due_date = due;
        j
    }

    fn single_assignment(mold: &str, machine: &str, lead: f64) -> AssignmentMatrix {
        let mut m = AssignmentMatrix::new(
            vec![mold.to_string()],
            vec![machine.to_string()],
        );
        assert!(m.assign(mold, machine, lead));
        m
    }

    #[test]
    fn test_join_and_due_date_order() {
        let assignment = single_assignment("MD001", "J201", 4.0);
        let mut mapping = HashMap::new();
        mapping.insert("ITEM-A".to_string(), "MD001".to_string());
        let jobs = vec![
            job("PO2", "ITEM-A", Some(30), Some(date(2026, 9, 20))),
            job("PO1", "ITEM-A", Some(10), Some(date(2026, 9, 5))),
        ];

        let table = ScheduleMaterializer::new().materialize(
            &assignment,
            &jobs,
            &mapping,
            &[],
            RowSource::Tier1,
        );

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].order_id.as_deref(), Some("PO1"));
        assert_eq!(table.rows[0].priority_rank, 1);
        assert_eq!(table.rows[1].order_id.as_deref(), Some("PO2"));
        assert_eq!(table.rows[1].priority_rank, 2);
    }

    #[test]
    fn test_mold_without_orders_keeps_rank_zero() {
        let assignment = single_assignment("MD001", "J201", 4.0);
        let table = ScheduleMaterializer::new().materialize(
            &assignment,
            &[],
            &HashMap::new(),
            &[],
            RowSource::Tier2,
        );
        assert_eq!(table.len(), 1);
        assert!(table.rows[0].is_empty_order());
        assert_eq!(table.rows[0].priority_rank, 0);
        assert_eq!(table.rows[0].mold_id.as_deref(), Some("MD001"));
    }

    #[test]
    fn test_missing_due_date_sorts_last() {
        let assignment = single_assignment("MD001", "J201", 4.0);
        let mut mapping = HashMap::new();
        mapping.insert("ITEM-A".to_string(), "MD001".to_string());
        let jobs = vec![
            job("PO1", "ITEM-A", Some(10), None),
            job("PO2", "ITEM-A", Some(30), Some(date(2026, 9, 20))),
        ];

        let table = ScheduleMaterializer::new().materialize(
            &assignment,
            &jobs,
            &mapping,
            &[],
            RowSource::Tier1,
        );
        assert_eq!(table.rows[0].order_id.as_deref(), Some("PO2"));
        assert_eq!(table.rows[1].order_id.as_deref(), Some("PO1"));
        assert_eq!(table.rows[1].priority_rank, 2);
    }

    #[test]
    fn test_pin_already_on_machine_is_noop() {
        let assignment = single_assignment("MD001", "J201", 4.0);
        let mut mapping = HashMap::new();
        mapping.insert("ITEM-A".to_string(), "MD001".to_string());
        let jobs = vec![job("PO1", "ITEM-A", Some(10), Some(date(2026, 9, 5)))];
        let materializer = ScheduleMaterializer::new();
        let pins = vec![PinnedPair::new("J201", "MD001")];

        let mut table =
            materializer.materialize(&assignment, &jobs, &mapping, &pins, RowSource::Tier1);
        let before = table.clone();
        materializer.apply_pinning(&mut table, &pins);
        assert_eq!(table, before);
    }

    #[test]
    fn test_pin_relocates_all_rows_and_leaves_placeholder() {
        // MD001 两张订单在 J201, J202 原有一张订单; 钉选 (J202, MD001)
        let mut assignment = AssignmentMatrix::new(
            vec!["MD001".to_string(), "MD002".to_string()],
            vec!["J201".to_string(), "J202".to_string()],
        );
        assert!(assignment.assign("MD001", "J201", 4.0));
        assert!(assignment.assign("MD002", "J202", 2.0));
        let mut mapping = HashMap::new();
        mapping.insert("ITEM-A".to_string(), "MD001".to_string());
        mapping.insert("ITEM-B".to_string(), "MD002".to_string());
        let jobs = vec![
            job("PO1", "ITEM-A", Some(10), Some(date(2026, 9, 5))),
            job("PO2", "ITEM-A", Some(20), Some(date(2026, 9, 8))),
            job("PO3", "ITEM-B", Some(5), Some(date(2026, 9, 1))),
        ];
        let materializer = ScheduleMaterializer::new();
        let mut table =
            materializer.materialize(&assignment, &jobs, &mapping, &[], RowSource::Tier1);

        materializer.apply_pinning(&mut table, &[PinnedPair::new("J202", "MD001")]);

        // J202: 迁入行 PO1, PO2 占 1..2, 原有 PO3 顺延到 3
        let j202: Vec<(Option<String>, i32)> = table
            .rows_of_machine("J202")
            .iter()
            .map(|r| (r.order_id.clone(), r.priority_rank))
            .collect();
        assert_eq!(
            j202,
            vec![
                (Some("PO1".to_string()), 1),
                (Some("PO2".to_string()), 2),
                (Some("PO3".to_string()), 3),
            ]
        );
        assert!(table.rows_of_machine("J202")[0].pinned);

        // J201 清空 → 单行占位, rank 0
        let j201 = table.rows_of_machine("J201");
        assert_eq!(j201.len(), 1);
        assert_eq!(j201[0].source, RowSource::Placeholder);
        assert_eq!(j201[0].priority_rank, 0);
    }

    #[test]
    fn test_pin_for_unknown_mold_is_skipped() {
        let assignment = single_assignment("MD001", "J201", 4.0);
        let mut mapping = HashMap::new();
        mapping.insert("ITEM-A".to_string(), "MD001".to_string());
        let jobs = vec![job("PO1", "ITEM-A", Some(10), Some(date(2026, 9, 5)))];
        let materializer = ScheduleMaterializer::new();
        let mut table =
            materializer.materialize(&assignment, &jobs, &mapping, &[], RowSource::Tier1);
        let before = table.clone();

        materializer.apply_pinning(&mut table, &[PinnedPair::new("J201", "MD999")]);
        assert_eq!(table, before);
    }
}
