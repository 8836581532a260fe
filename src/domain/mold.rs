// ==========================================
// 注塑模具排机系统 - 模具主数据
// ==========================================
// 吨位规格为原始字符串, 允许 "100/200" 形式列出多个可接受吨位
// 用途: 快照层写入, 引擎层只读
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ==========================================
// Mold - 模具主数据
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mold {
    // ===== 主键 =====
    pub mold_id: String, // 模具唯一标识（模具号）

    // ===== 基础信息 =====
    pub mold_name: Option<String>, // 模具名称

    // ===== 物理约束 =====
    pub tonnage_spec: Option<String>, // 吨位规格（源字段, "100" 或 "100/200"）
}

impl Mold {
    pub fn new(mold_id: &str) -> Self {
        Self {
            mold_id: mold_id.to_string(),
            mold_name: None,
            tonnage_spec: None,
        }
    }

    /// 解析吨位规格
    ///
    /// # 返回
    /// (可接受吨位集合, 无法解析的片段列表)
    /// 规格缺失时两者均为空
    pub fn tonnage_options(&self) -> (BTreeSet<u32>, Vec<String>) {
        match &self.tonnage_spec {
            Some(spec) => parse_tonnage_spec(spec),
            None => (BTreeSet::new(), Vec::new()),
        }
    }
}

/// 解析 "100/200" 形式的吨位规格字符串
///
/// 容忍空白与空片段; 兼容 Excel 来源的整数浮点写法（"100.0"）;
/// 其余无法解析的片段原样收集, 由调用方告警
pub fn parse_tonnage_spec(spec: &str) -> (BTreeSet<u32>, Vec<String>) {
    let mut options = BTreeSet::new();
    let mut invalid = Vec::new();

    for fragment in spec.split('/') {
        let trimmed = fragment.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Ok(tonnage) = trimmed.parse::<u32>() {
            options.insert(tonnage);
            continue;
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64 => {
                options.insert(value as u32);
            }
            _ => invalid.push(trimmed.to_string()),
        }
    }

    (options, invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_tonnage() {
        let (options, invalid) = parse_tonnage_spec("100");
        assert_eq!(options.into_iter().collect::<Vec<_>>(), vec![100]);
        assert!(invalid.is_empty());
    }

    #[test]
    fn test_parse_multi_tonnage() {
        let (options, invalid) = parse_tonnage_spec("100/200");
        assert_eq!(options.into_iter().collect::<Vec<_>>(), vec![100, 200]);
        assert!(invalid.is_empty());
    }

    #[test]
    fn test_parse_tolerates_whitespace_and_float_form() {
        let (options, invalid) = parse_tonnage_spec(" 100 / 200.0 ");
        assert_eq!(options.into_iter().collect::<Vec<_>>(), vec![100, 200]);
        assert!(invalid.is_empty());
    }

    #[test]
    fn test_parse_collects_invalid_fragments() {
        let (options, invalid) = parse_tonnage_spec("100/abc/200");
        assert_eq!(options.into_iter().collect::<Vec<_>>(), vec![100, 200]);
        assert_eq!(invalid, vec!["abc".to_string()]);
    }

    #[test]
    fn test_missing_spec_yields_empty() {
        let mold = Mold::new("MD001");
        let (options, invalid) = mold.tonnage_options();
        assert!(options.is_empty());
        assert!(invalid.is_empty());
    }
}
