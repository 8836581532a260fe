// ==========================================
// 注塑模具排机系统 - 配置管理器
// ==========================================
// 职责: 排机配置加载、保存、策略档案解析
// 存储: JSON 配置文件（默认路径位于系统配置目录）
// 约定: 文件缺失回退默认配置; 单键缺失回退单键默认值
// ==========================================

use crate::config::strategy_profile::CustomStrategyProfile;
use crate::domain::types::SortStrategy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{info, warn};

/// 配置层错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败 (path={path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("配置解析失败: {0}")]
    Parse(String),

    #[error("无法定位系统配置目录")]
    MissingConfigDir,
}

/// Result 类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;

// ==========================================
// PlanningConfig - 排机配置
// ==========================================

fn default_max_load_threshold() -> Option<f64> {
    Some(30.0)
}

fn default_parallel_enabled() -> bool {
    true
}

fn default_parallel_min_cores() -> usize {
    2
}

fn default_parallel_max_workers() -> usize {
    2
}

fn default_round1b_iteration_limit() -> usize {
    1000
}

/// 排机运行配置
///
/// 单键缺失取默认值; `max_load_threshold` 显式写 null 表示不设负荷上限
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningConfig {
    /// 机台负荷阈值（天）, None = 不设上限
    #[serde(default = "default_max_load_threshold")]
    pub max_load_threshold: Option<f64>,

    /// 兜底层排序策略
    #[serde(default)]
    pub tier2_strategy: SortStrategy,

    /// 是否允许编排层并行准备阶段
    #[serde(default = "default_parallel_enabled")]
    pub parallel_enabled: bool,

    /// 并行准备所需的最小逻辑核数
    #[serde(default = "default_parallel_min_cores")]
    pub parallel_min_cores: usize,

    /// 并行准备的最大工作任务数
    #[serde(default = "default_parallel_max_workers")]
    pub parallel_max_workers: usize,

    /// 约束贪心循环的迭代硬上限
    #[serde(default = "default_round1b_iteration_limit")]
    pub round1b_iteration_limit: usize,

    /// 命名策略档案（按名覆盖一次运行的参数）
    #[serde(default)]
    pub strategy_profiles: HashMap<String, CustomStrategyProfile>,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            max_load_threshold: default_max_load_threshold(),
            tier2_strategy: SortStrategy::default(),
            parallel_enabled: default_parallel_enabled(),
            parallel_min_cores: default_parallel_min_cores(),
            parallel_max_workers: default_parallel_max_workers(),
            round1b_iteration_limit: default_round1b_iteration_limit(),
            strategy_profiles: HashMap::new(),
        }
    }
}

// ==========================================
// ResolvedPlanningOptions - 档案解析结果
// ==========================================
// 全局配置 + 档案覆盖合并后的本次运行生效参数
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedPlanningOptions {
    pub max_load_threshold: Option<f64>,
    pub tier2_strategy: SortStrategy,
    pub round1b_iteration_limit: usize,
    /// 生效的档案名, None 表示纯全局配置
    pub profile: Option<String>,
}

impl PlanningConfig {
    /// 解析策略档案, 得到本次运行的生效参数
    ///
    /// 档案不存在或字段非法时告警并沿用全局值, 不中断运行
    pub fn resolve_profile(&self, profile_name: Option<&str>) -> ResolvedPlanningOptions {
        let mut options = ResolvedPlanningOptions {
            max_load_threshold: self.max_load_threshold,
            tier2_strategy: self.tier2_strategy,
            round1b_iteration_limit: self.round1b_iteration_limit,
            profile: None,
        };

        let name = match profile_name.map(str::trim) {
            Some(n) if !n.is_empty() => n,
            _ => return options,
        };

        let profile = match self.strategy_profiles.get(name) {
            Some(p) => p,
            None => {
                warn!(profile = %name, "未找到策略档案, 沿用全局配置");
                return options;
            }
        };

        options.profile = Some(name.to_string());
        let params = &profile.parameters;

        if params.unlimited_load {
            options.max_load_threshold = None;
        } else if let Some(threshold) = params.max_load_threshold {
            options.max_load_threshold = Some(threshold);
        }

        if let Some(raw) = params.tier2_strategy.as_deref() {
            match SortStrategy::from_str(raw) {
                Ok(strategy) => options.tier2_strategy = strategy,
                Err(reason) => {
                    warn!(profile = %name, %reason, "档案排序策略非法, 沿用全局配置");
                }
            }
        }

        if let Some(limit) = params.round1b_iteration_limit {
            options.round1b_iteration_limit = limit;
        }

        info!(
            profile = %name,
            strategy = %options.tier2_strategy.as_str(),
            threshold = ?options.max_load_threshold,
            "策略档案解析完成"
        );
        options
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    /// 创建指定路径的 ConfigManager 实例
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// 使用系统配置目录下的默认路径
    ///
    /// 路径: {config_dir}/injection-molding-aps/config.json
    pub fn with_default_path() -> ConfigResult<Self> {
        let base = dirs::config_dir().ok_or(ConfigError::MissingConfigDir)?;
        Ok(Self {
            path: base.join("injection-molding-aps").join("config.json"),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 加载配置
    ///
    /// 文件不存在时回退默认配置并告警; 存在但非法时报错
    pub fn load(&self) -> ConfigResult<PlanningConfig> {
        if !self.path.exists() {
            warn!(path = %self.path.display(), "配置文件不存在, 使用默认配置");
            return Ok(PlanningConfig::default());
        }
        let content = std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        let config: PlanningConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        info!(
            path = %self.path.display(),
            strategy = %config.tier2_strategy.as_str(),
            threshold = ?config.max_load_threshold,
            profiles = config.strategy_profiles.len(),
            "配置加载完成"
        );
        Ok(config)
    }

    /// 保存配置（自动创建父目录）
    pub fn save(&self, config: &PlanningConfig) -> ConfigResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }
        let content = serde_json::to_string_pretty(config)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(&self.path, content).map_err(|source| ConfigError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        info!(path = %self.path.display(), "配置保存完成");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::strategy_profile::CustomStrategyParameters;

    #[test]
    fn test_default_config_values() {
        let config = PlanningConfig::default();
        assert_eq!(config.max_load_threshold, Some(30.0));
        assert_eq!(
            config.tier2_strategy,
            SortStrategy::CompatibilityLeadTimeQuantity
        );
        assert!(config.parallel_enabled);
        assert_eq!(config.round1b_iteration_limit, 1000);
    }

    #[test]
    fn test_partial_json_falls_back_per_key() {
        let config: PlanningConfig =
            serde_json::from_str(r#"{"tier2_strategy": "lead_time_compatibility_quantity"}"#)
                .unwrap();
        assert_eq!(
            config.tier2_strategy,
            SortStrategy::LeadTimeCompatibilityQuantity
        );
        assert_eq!(config.max_load_threshold, Some(30.0));
    }

    #[test]
    fn test_null_threshold_means_no_ceiling() {
        let config: PlanningConfig =
            serde_json::from_str(r#"{"max_load_threshold": null}"#).unwrap();
        assert_eq!(config.max_load_threshold, None);
    }

    #[test]
    fn test_resolve_unknown_profile_keeps_global() {
        let config = PlanningConfig::default();
        let options = config.resolve_profile(Some("no_such_profile"));
        assert_eq!(options.profile, None);
        assert_eq!(options.max_load_threshold, Some(30.0));
    }

    #[test]
    fn test_resolve_profile_overrides() {
        let mut config = PlanningConfig::default();
        config.strategy_profiles.insert(
            "rush_season".to_string(),
            CustomStrategyProfile {
                title: "旺季档案".to_string(),
                description: None,
                parameters: CustomStrategyParameters {
                    max_load_threshold: Some(45.0),
                    unlimited_load: false,
                    tier2_strategy: Some("priority_order_3".to_string()),
                    round1b_iteration_limit: Some(500),
                },
            },
        );
        let options = config.resolve_profile(Some("rush_season"));
        assert_eq!(options.profile.as_deref(), Some("rush_season"));
        assert_eq!(options.max_load_threshold, Some(45.0));
        assert_eq!(
            options.tier2_strategy,
            SortStrategy::LeadTimeCompatibilityQuantity
        );
        assert_eq!(options.round1b_iteration_limit, 500);
    }

    #[test]
    fn test_resolve_profile_unlimited_load() {
        let mut config = PlanningConfig::default();
        config.strategy_profiles.insert(
            "no_ceiling".to_string(),
            CustomStrategyProfile {
                title: "不限负荷".to_string(),
                description: None,
                parameters: CustomStrategyParameters {
                    unlimited_load: true,
                    ..CustomStrategyParameters::default()
                },
            },
        );
        let options = config.resolve_profile(Some("no_ceiling"));
        assert_eq!(options.max_load_threshold, None);
    }
}
