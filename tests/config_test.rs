// ==========================================
// ConfigManager 集成测试
// ==========================================
// 测试目标: 配置文件读写、缺省回退、策略档案解析
// ==========================================

use injection_molding_aps::config::{
    ConfigManager, CustomStrategyParameters, CustomStrategyProfile, PlanningConfig,
};
use injection_molding_aps::domain::types::SortStrategy;
use tempfile::TempDir;

fn manager_in(dir: &TempDir) -> ConfigManager {
    ConfigManager::new(dir.path().join("config.json"))
}

// ==========================================
// 读写与缺省回退
// ==========================================

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let manager = manager_in(&dir);

    let config = manager.load().unwrap();
    assert_eq!(config, PlanningConfig::default());
    assert_eq!(config.max_load_threshold, Some(30.0));
    assert_eq!(
        config.tier2_strategy,
        SortStrategy::CompatibilityLeadTimeQuantity
    );
}

#[test]
fn test_save_then_load_round_trips() {
    let dir = TempDir::new().unwrap();
    let manager = manager_in(&dir);

    let mut config = PlanningConfig {
        max_load_threshold: Some(15.0),
        tier2_strategy: SortStrategy::LeadTimeCompatibilityQuantity,
        parallel_enabled: false,
        round1b_iteration_limit: 64,
        ..PlanningConfig::default()
    };
    config.strategy_profiles.insert(
        "rush".to_string(),
        CustomStrategyProfile {
            title: "赶工档案".to_string(),
            description: Some("旺季赶工用".to_string()),
            parameters: CustomStrategyParameters {
                max_load_threshold: Some(50.0),
                ..CustomStrategyParameters::default()
            },
        },
    );

    manager.save(&config).unwrap();
    let loaded = manager.load().unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_partial_json_fills_missing_keys_with_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "max_load_threshold": 12.5 }"#).unwrap();

    let config = ConfigManager::new(&path).load().unwrap();
    assert_eq!(config.max_load_threshold, Some(12.5));
    // 其余键落回默认值
    assert_eq!(config.tier2_strategy, SortStrategy::default());
    assert!(config.parallel_enabled);
    assert_eq!(config.round1b_iteration_limit, 1000);
}

#[test]
fn test_explicit_null_threshold_means_unlimited() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "max_load_threshold": null }"#).unwrap();

    let config = ConfigManager::new(&path).load().unwrap();
    assert_eq!(config.max_load_threshold, None);
}

#[test]
fn test_malformed_json_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(ConfigManager::new(&path).load().is_err());
}

// ==========================================
// 策略档案解析
// ==========================================

fn config_with_profile(name: &str, parameters: CustomStrategyParameters) -> PlanningConfig {
    let mut config = PlanningConfig::default();
    config.strategy_profiles.insert(
        name.to_string(),
        CustomStrategyProfile {
            title: format!("{} 档案", name),
            description: None,
            parameters,
        },
    );
    config
}

#[test]
fn test_profile_overrides_threshold_and_strategy() {
    let config = config_with_profile(
        "rush",
        CustomStrategyParameters {
            max_load_threshold: Some(50.0),
            tier2_strategy: Some("lead_time_compatibility_quantity".to_string()),
            round1b_iteration_limit: Some(200),
            ..CustomStrategyParameters::default()
        },
    );

    let options = config.resolve_profile(Some("rush"));
    assert_eq!(options.profile.as_deref(), Some("rush"));
    assert_eq!(options.max_load_threshold, Some(50.0));
    assert_eq!(
        options.tier2_strategy,
        SortStrategy::LeadTimeCompatibilityQuantity
    );
    assert_eq!(options.round1b_iteration_limit, 200);
}

#[test]
fn test_unlimited_load_profile_clears_threshold() {
    let config = config_with_profile(
        "open",
        CustomStrategyParameters {
            // unlimited_load 优先于同档案里的阈值覆盖
            max_load_threshold: Some(99.0),
            unlimited_load: true,
            ..CustomStrategyParameters::default()
        },
    );

    let options = config.resolve_profile(Some("open"));
    assert_eq!(options.max_load_threshold, None);
}

#[test]
fn test_profile_accepts_numbered_strategy_alias() {
    let config = config_with_profile(
        "legacy",
        CustomStrategyParameters {
            tier2_strategy: Some("priority_order_5".to_string()),
            ..CustomStrategyParameters::default()
        },
    );

    let options = config.resolve_profile(Some("legacy"));
    assert_eq!(
        options.tier2_strategy,
        SortStrategy::QuantityCompatibilityLeadTime
    );
}

#[test]
fn test_unknown_profile_keeps_global_options() {
    let config = PlanningConfig::default();
    let options = config.resolve_profile(Some("no_such_profile"));

    assert_eq!(options.profile, None);
    assert_eq!(options.max_load_threshold, Some(30.0));
    assert_eq!(options.tier2_strategy, SortStrategy::default());
}

#[test]
fn test_invalid_profile_strategy_keeps_global_strategy() {
    let config = config_with_profile(
        "typo",
        CustomStrategyParameters {
            tier2_strategy: Some("fastest_first".to_string()),
            ..CustomStrategyParameters::default()
        },
    );

    let options = config.resolve_profile(Some("typo"));
    // 档案本身生效, 非法策略字段被忽略
    assert_eq!(options.profile.as_deref(), Some("typo"));
    assert_eq!(options.tier2_strategy, SortStrategy::default());
}
