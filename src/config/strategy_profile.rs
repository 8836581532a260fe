use serde::{Deserialize, Serialize};

/// 自定义策略档案（配置文件 strategy_profiles 段的值对象）
///
/// 在不改全局配置的前提下, 按档案名覆盖一次运行的排机参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomStrategyProfile {
    /// 显示名称（中文）
    pub title: String,

    /// 说明（可选）
    #[serde(default)]
    pub description: Option<String>,

    /// 参数覆盖（缺省字段沿用全局配置）
    #[serde(default)]
    pub parameters: CustomStrategyParameters,
}

/// 自定义策略参数（轻量版: 只覆盖无需查库的排机微调维度）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CustomStrategyParameters {
    /// 机台负荷阈值（天）覆盖; None 沿用全局值
    #[serde(default)]
    pub max_load_threshold: Option<f64>,

    /// 阈值显式置空: true 表示该档案不设负荷上限
    #[serde(default)]
    pub unlimited_load: bool,

    /// 兜底层排序策略覆盖（snake_case 或 priority_order_N 编号别名）
    #[serde(default)]
    pub tier2_strategy: Option<String>,

    /// 兜底迭代上限覆盖
    #[serde(default)]
    pub round1b_iteration_limit: Option<usize>,
}
