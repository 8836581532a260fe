// ==========================================
// 注塑模具排机系统 - 机台负荷表
// ==========================================
// 贪心循环中的共享可变负荷状态
// 显式版本号 + 只增提交日志, 每次分配决策可审计
// 红线: 同一轮内严格串行提交, 不并发读写
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// LoadCommit - 负荷提交记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadCommit {
    /// 提交序号, 即提交后的表版本号
    pub version: u64,
    pub machine_code: String,
    /// 本次提交增加的天数
    pub delta_days: f64,
    /// 提交后该机台的累计负荷
    pub load_after: f64,
    /// 提交原因（BASELINE_IN_FLIGHT / UNIQUE_PRIORITY_MATCH / ...）
    pub note: String,
}

// ==========================================
// LoadTable - 机台累计负荷表
// ==========================================
// machine_code → 累计承诺天数（在产基线 + 新分配）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadTable {
    loads: BTreeMap<String, f64>,
    version: u64,
    journal: Vec<LoadCommit>,
}

impl LoadTable {
    /// 为给定机台集合创建零负荷表
    pub fn new(machine_codes: &[String]) -> Self {
        let loads = machine_codes
            .iter()
            .map(|code| (code.clone(), 0.0))
            .collect();
        Self {
            loads,
            version: 0,
            journal: Vec::new(),
        }
    }

    /// 向机台提交一笔负荷
    ///
    /// # 返回
    /// 提交后的累计负荷; 机台未知时返回 None 且不产生提交
    pub fn commit(&mut self, machine_code: &str, delta_days: f64, note: &str) -> Option<f64> {
        let load = self.loads.get_mut(machine_code)?;
        *load += delta_days;
        let load_after = *load;
        self.version += 1;
        self.journal.push(LoadCommit {
            version: self.version,
            machine_code: machine_code.to_string(),
            delta_days,
            load_after,
            note: note.to_string(),
        });
        Some(load_after)
    }

    pub fn load_of(&self, machine_code: &str) -> Option<f64> {
        self.loads.get(machine_code).copied()
    }

    pub fn contains(&self, machine_code: &str) -> bool {
        self.loads.contains_key(machine_code)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn journal(&self) -> &[LoadCommit] {
        &self.journal
    }

    /// 当前负荷快照, 诊断输出用
    pub fn snapshot(&self) -> BTreeMap<String, f64> {
        self.loads.clone()
    }
}
