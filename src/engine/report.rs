// ==========================================
// 注塑模具排机系统 - 排机运行诊断报告
// ==========================================
// 职责: 汇总一次运行的计数、耗时、过载与终态,
// 文本格式化由下游完成, 本层只产出结构化字段
// ==========================================

use crate::domain::PlanningState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

// ==========================================
// PlanningReport - 排机运行诊断报告
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanningReport {
    /// 运行标识
    pub run_id: Uuid,

    /// 报告生成时间 (UTC)
    pub created_at: DateTime<Utc>,

    /// 状态机终态
    pub state: PlanningState,

    /// 参与排机的模具总数
    pub molds_total: usize,

    /// 历史优先层落位数
    pub tier1_assigned: usize,

    /// 历史优先层未覆盖数（进入兜底池）
    pub tier1_unassigned: usize,

    /// 历史优先层是否被跳过（优先级矩阵缺失/为空）
    pub tier1_skipped: bool,

    /// 兜底层是否实际执行
    pub tier2_executed: bool,

    /// 兜底层落位数
    pub tier2_assigned: usize,

    /// 兜底层丢弃数
    pub tier2_unassigned: usize,

    /// 最终未分配模具
    pub unassigned_molds: Vec<String>,

    /// Round 1b 实际迭代数
    pub round1b_iterations: usize,

    /// 兜底层丢弃模具时标记的过载机台
    pub overloaded_machines: BTreeSet<String>,

    /// 未匹配订单号（产品无模具映射或模具未落位）
    pub unmatched_orders: Vec<String>,

    /// 运行耗时（毫秒）
    pub elapsed_ms: u64,

    /// 各机台最终累计负荷（天）
    pub machine_loads: BTreeMap<String, f64>,

    /// 负荷表终版本号（提交总数）
    pub load_version: u64,
}

impl PlanningReport {
    /// 单行摘要, 给文本日志用
    pub fn summary_cn(&self) -> String {
        format!(
            "运行 {} [{}] 模具 {} 副: 一层落位 {} / 二层落位 {} / 未分配 {}, 过载机台 {}, 耗时 {}ms",
            self.run_id,
            self.state,
            self.molds_total,
            self.tier1_assigned,
            self.tier2_assigned,
            self.unassigned_molds.len(),
            self.overloaded_machines.len(),
            self.elapsed_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_serializes_with_screaming_state() {
        let report = PlanningReport {
            run_id: Uuid::nil(),
            created_at: Utc::now(),
            state: PlanningState::Merged,
            molds_total: 3,
            tier1_assigned: 2,
            tier1_unassigned: 1,
            tier1_skipped: false,
            tier2_executed: true,
            tier2_assigned: 1,
            tier2_unassigned: 0,
            unassigned_molds: vec![],
            round1b_iterations: 2,
            overloaded_machines: BTreeSet::new(),
            unmatched_orders: vec![],
            elapsed_ms: 12,
            machine_loads: BTreeMap::new(),
            load_version: 5,
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"state\":\"MERGED\""));
        assert!(report.summary_cn().contains("模具 3 副"));
    }
}
