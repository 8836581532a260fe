// ==========================================
// 注塑模具排机系统 - 排程表
// ==========================================
// 分配矩阵物化后的逐行排程: 一行 = 一张订单挂在一副模具上,
// 无订单的模具保留一行空订单行（rank 0）
// ==========================================

use crate::domain::types::RowSource;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ==========================================
// ScheduleRow - 排程行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    // ===== 落位 =====
    pub machine_code: String,        // 机台代码
    pub mold_id: Option<String>,     // 模具号, 占位行为 None

    // ===== 订单快照字段 =====
    pub order_id: Option<String>,    // 采购订单号
    pub item_name: Option<String>,   // 产品项目名
    pub quantity: Option<i64>,       // 订单数量
    pub due_date: Option<NaiveDate>, // 交货期
    pub lead_time_days: Option<f64>, // 模具周期天数

    // ===== 排序结果 =====
    pub priority_rank: i32,          // 机台内稠密序号, 0 = 未参与排序
    pub pinned: bool,                // 在产钉选标志

    // ===== 可解释性 =====
    pub source: RowSource,           // 行来源层
    pub assign_reason: Option<String>, // 排序依据（JSON）
}

impl ScheduleRow {
    /// 订单字段为空的行不参与稠密排序, rank 恒为 0
    pub fn is_empty_order(&self) -> bool {
        self.order_id.is_none()
    }

    /// 钉选迁移清空机台后的占位行
    pub fn placeholder(machine_code: &str) -> Self {
        Self {
            machine_code: machine_code.to_string(),
            mold_id: None,
            order_id: None,
            item_name: None,
            quantity: None,
            due_date: None,
            lead_time_days: None,
            priority_rank: 0,
            pinned: false,
            source: RowSource::Placeholder,
            assign_reason: Some("PINNED_RELOCATION_EMPTIED".to_string()),
        }
    }
}

// ==========================================
// ScheduleTable - 排程表
// ==========================================
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScheduleTable {
    pub rows: Vec<ScheduleRow>,
}

impl ScheduleTable {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 出现过的机台代码, 升序
    pub fn machine_codes(&self) -> BTreeSet<String> {
        self.rows.iter().map(|r| r.machine_code.clone()).collect()
    }

    pub fn rows_of_machine(&self, machine_code: &str) -> Vec<&ScheduleRow> {
        self.rows
            .iter()
            .filter(|r| r.machine_code == machine_code)
            .collect()
    }

    /// 机台内最大稠密序号, 无行或仅空行时为 0
    pub fn max_rank_of(&self, machine_code: &str) -> i32 {
        self.rows
            .iter()
            .filter(|r| r.machine_code == machine_code)
            .map(|r| r.priority_rank)
            .max()
            .unwrap_or(0)
    }

    /// 按 (机台升序, rank 升序, 空行垫底) 重排行序, 输出稳定
    pub fn normalize_row_order(&mut self) {
        self.rows.sort_by(|a, b| {
            a.machine_code
                .cmp(&b.machine_code)
                .then_with(|| a.is_empty_order().cmp(&b.is_empty_order()))
                .then_with(|| a.priority_rank.cmp(&b.priority_rank))
        });
    }
}
