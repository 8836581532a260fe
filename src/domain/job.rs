// ==========================================
// 注塑模具排机系统 - 作业领域模型
// ==========================================
// 待产订单与在产作业均来自运行开始时的外部快照,
// 排机过程中只读
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// PendingJob - 待产订单
// ==========================================
// 订单通过 item → mold 映射挂到模具, 多个订单可共享一副模具
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingJob {
    // ===== 主键 =====
    pub order_id: String, // 采购订单号

    // ===== 订单信息 =====
    pub item_name: String,         // 产品项目名
    pub quantity: Option<i64>,     // 订单数量, 源数据可能缺失
    pub due_date: Option<NaiveDate>, // 交货期
}

impl PendingJob {
    pub fn new(order_id: &str, item_name: &str) -> Self {
        Self {
            order_id: order_id.to_string(),
            item_name: item_name.to_string(),
            quantity: None,
            due_date: None,
        }
    }
}

// ==========================================
// ProducingJob - 在产作业
// ==========================================
// 两个用途: 机台基线负荷的来源; 钉选覆盖的默认来源
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducingJob {
    pub machine_code: String,  // 正在生产的机台
    pub mold_id: String,       // 正在使用的模具
    pub remaining_days: f64,   // 剩余生产天数
}

impl ProducingJob {
    pub fn new(machine_code: &str, mold_id: &str, remaining_days: f64) -> Self {
        Self {
            machine_code: machine_code.to_string(),
            mold_id: mold_id.to_string(),
            remaining_days,
        }
    }
}

// ==========================================
// PinnedPair - 钉选对
// ==========================================
// 要求某模具立即留在/迁移到指定机台的 (机台, 模具) 对
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PinnedPair {
    pub machine_code: String,
    pub mold_id: String,
}

impl PinnedPair {
    pub fn new(machine_code: &str, mold_id: &str) -> Self {
        Self {
            machine_code: machine_code.to_string(),
            mold_id: mold_id.to_string(),
        }
    }
}

impl From<&ProducingJob> for PinnedPair {
    fn from(job: &ProducingJob) -> Self {
        Self {
            machine_code: job.machine_code.clone(),
            mold_id: job.mold_id.clone(),
        }
    }
}
