// ==========================================
// 注塑模具排机系统 - 机台主数据
// ==========================================
// 机台吨位为单值; 在排机运行中机台主数据只读,
// 累计负荷由 LoadTable 单独维护
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// Machine - 注塑机主数据
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    // ===== 主键 =====
    pub machine_code: String, // 机台代码（如 J201）

    // ===== 基础信息 =====
    pub machine_name: Option<String>, // 机台名称

    // ===== 物理约束 =====
    pub tonnage: Option<u32>, // 锁模力吨位等级, 缺失按不兼容处理
}

impl Machine {
    pub fn new(machine_code: &str, tonnage: u32) -> Self {
        Self {
            machine_code: machine_code.to_string(),
            machine_name: None,
            tonnage: Some(tonnage),
        }
    }

    pub fn without_tonnage(machine_code: &str) -> Self {
        Self {
            machine_code: machine_code.to_string(),
            machine_name: None,
            tonnage: None,
        }
    }
}
