// ==========================================
// 注塑模具排机系统 - 领域类型定义
// ==========================================
// 排序策略为封闭枚举: 三个排序键的全部排列,
// 每个键的方向固定, 构造时一次性解析为键序列
// ==========================================

use crate::engine::error::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 排序键 (Sort Key)
// ==========================================
// 方向随键固定, 与键在策略中的位置无关:
// - MachineCompatibility 升序 (兼容机台越少越先排)
// - MoldLeadTime 降序 (长任务先排)
// - TotalQuantity 升序 (小批量先排)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    MachineCompatibility,
    MoldLeadTime,
    TotalQuantity,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::MachineCompatibility => "machine_compatibility",
            SortKey::MoldLeadTime => "mold_lead_time",
            SortKey::TotalQuantity => "total_quantity",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 兜底层排序策略 (Sort Strategy)
// ==========================================
// 兼容层优化器的模具排序策略, 变体名按键顺序命名
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortStrategy {
    CompatibilityLeadTimeQuantity,
    CompatibilityQuantityLeadTime,
    LeadTimeCompatibilityQuantity,
    LeadTimeQuantityCompatibility,
    QuantityCompatibilityLeadTime,
    QuantityLeadTimeCompatibility,
}

impl SortStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortStrategy::CompatibilityLeadTimeQuantity => "compatibility_lead_time_quantity",
            SortStrategy::CompatibilityQuantityLeadTime => "compatibility_quantity_lead_time",
            SortStrategy::LeadTimeCompatibilityQuantity => "lead_time_compatibility_quantity",
            SortStrategy::LeadTimeQuantityCompatibility => "lead_time_quantity_compatibility",
            SortStrategy::QuantityCompatibilityLeadTime => "quantity_compatibility_lead_time",
            SortStrategy::QuantityLeadTimeCompatibility => "quantity_lead_time_compatibility",
        }
    }

    pub fn title_cn(&self) -> &'static str {
        match self {
            SortStrategy::CompatibilityLeadTimeQuantity => "兼容性优先",
            SortStrategy::CompatibilityQuantityLeadTime => "兼容性-批量优先",
            SortStrategy::LeadTimeCompatibilityQuantity => "周期优先",
            SortStrategy::LeadTimeQuantityCompatibility => "周期-批量优先",
            SortStrategy::QuantityCompatibilityLeadTime => "批量优先",
            SortStrategy::QuantityLeadTimeCompatibility => "批量-周期优先",
        }
    }

    /// 解析为有序键序列, 构造时调用一次, 不在每次比较时重新解释
    pub fn keys(&self) -> [SortKey; 3] {
        use SortKey::{MachineCompatibility, MoldLeadTime, TotalQuantity};
        match self {
            SortStrategy::CompatibilityLeadTimeQuantity => {
                [MachineCompatibility, MoldLeadTime, TotalQuantity]
            }
            SortStrategy::CompatibilityQuantityLeadTime => {
                [MachineCompatibility, TotalQuantity, MoldLeadTime]
            }
            SortStrategy::LeadTimeCompatibilityQuantity => {
                [MoldLeadTime, MachineCompatibility, TotalQuantity]
            }
            SortStrategy::LeadTimeQuantityCompatibility => {
                [MoldLeadTime, TotalQuantity, MachineCompatibility]
            }
            SortStrategy::QuantityCompatibilityLeadTime => {
                [TotalQuantity, MachineCompatibility, MoldLeadTime]
            }
            SortStrategy::QuantityLeadTimeCompatibility => {
                [TotalQuantity, MoldLeadTime, MachineCompatibility]
            }
        }
    }
}

impl Default for SortStrategy {
    fn default() -> Self {
        SortStrategy::CompatibilityLeadTimeQuantity
    }
}

impl fmt::Display for SortStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SortStrategy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            // 历史配置沿用编号别名
            "compatibility_lead_time_quantity" | "priority_order_1" => {
                Ok(SortStrategy::CompatibilityLeadTimeQuantity)
            }
            "compatibility_quantity_lead_time" | "priority_order_2" => {
                Ok(SortStrategy::CompatibilityQuantityLeadTime)
            }
            "lead_time_compatibility_quantity" | "priority_order_3" => {
                Ok(SortStrategy::LeadTimeCompatibilityQuantity)
            }
            "lead_time_quantity_compatibility" | "priority_order_4" => {
                Ok(SortStrategy::LeadTimeQuantityCompatibility)
            }
            "quantity_compatibility_lead_time" | "priority_order_5" => {
                Ok(SortStrategy::QuantityCompatibilityLeadTime)
            }
            "quantity_lead_time_compatibility" | "priority_order_6" => {
                Ok(SortStrategy::QuantityLeadTimeCompatibility)
            }
            other => Err(EngineError::UnknownStrategy(other.to_string())),
        }
    }
}

// ==========================================
// 排产运行状态 (Planning State)
// ==========================================
// 两层兜底组合的显式状态机, 跳过兜底层时也会经过 Tier2Done
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanningState {
    NotStarted,
    Tier1Done,
    Tier2Done,
    Merged,
}

impl fmt::Display for PlanningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanningState::NotStarted => write!(f, "NOT_STARTED"),
            PlanningState::Tier1Done => write!(f, "TIER1_DONE"),
            PlanningState::Tier2Done => write!(f, "TIER2_DONE"),
            PlanningState::Merged => write!(f, "MERGED"),
        }
    }
}

// ==========================================
// 排程行来源 (Row Source)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowSource {
    /// 历史优先层产出
    Tier1,
    /// 兼容兜底层产出
    Tier2,
    /// 钉选迁移后清空机台的占位行
    Placeholder,
}

impl fmt::Display for RowSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowSource::Tier1 => write!(f, "TIER1"),
            RowSource::Tier2 => write!(f, "TIER2"),
            RowSource::Placeholder => write!(f, "PLACEHOLDER"),
        }
    }
}
