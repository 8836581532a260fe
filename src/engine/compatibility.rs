// ==========================================
// 注塑模具排机系统 - 兼容矩阵构建引擎
// ==========================================
// 红线: 吨位缺失按不兼容处理并告警, 不作为错误
// ==========================================
// 职责: 由吨位规格推导二进制兼容关系
// 输入: 机台主数据 + 模具主数据
// 输出: 模具×机台二进制矩阵, 本次运行内不再变更
// ==========================================

use crate::domain::{CompatibilityMatrix, Machine, Mold};
use crate::engine::error::{EngineError, EngineResult};
use std::collections::HashSet;
use tracing::{info, instrument, warn};

// ==========================================
// CompatibilityMatrixBuilder - 兼容矩阵构建器
// ==========================================
pub struct CompatibilityMatrixBuilder {
    // 无状态引擎, 不需要注入依赖
}

/// 兼容矩阵构建结果
#[derive(Debug, Clone)]
pub struct CompatibilityBuildResult {
    pub matrix: CompatibilityMatrix,
    /// 缺吨位规格（或规格全部无法解析）的模具
    pub molds_without_tonnage: Vec<String>,
    /// 缺吨位的机台
    pub machines_without_tonnage: Vec<String>,
}

impl CompatibilityMatrixBuilder {
    pub fn new() -> Self {
        Self {}
    }

    /// 构建二进制兼容矩阵
    ///
    /// 单元格为 1 当且仅当模具的可接受吨位集合包含机台吨位
    ///
    /// # 参数
    /// - `molds`: 模具主数据（行序 = 传入顺序）
    /// - `machines`: 机台主数据（列序 = 传入顺序）
    ///
    /// # 返回
    /// 构建结果; 任一主数据为空或存在重复标识时返回致命配置错误
    #[instrument(skip(self, molds, machines), fields(
        mold_count = molds.len(),
        machine_count = machines.len()
    ))]
    pub fn build(
        &self,
        molds: &[Mold],
        machines: &[Machine],
    ) -> EngineResult<CompatibilityBuildResult> {
        if machines.is_empty() {
            return Err(EngineError::EmptyMachineSet);
        }
        if molds.is_empty() {
            return Err(EngineError::EmptyMoldSet);
        }

        let mold_ids: Vec<String> = molds.iter().map(|m| m.mold_id.clone()).collect();
        let machine_codes: Vec<String> = machines.iter().map(|m| m.machine_code.clone()).collect();
        Self::ensure_unique(&mold_ids, "mold_id")?;
        Self::ensure_unique(&machine_codes, "machine_code")?;

        let mut matrix = CompatibilityMatrix::new(mold_ids, machine_codes);
        let mut molds_without_tonnage = Vec::new();
        let mut machines_without_tonnage = Vec::new();

        for machine in machines {
            if machine.tonnage.is_none() {
                warn!(machine_code = %machine.machine_code, "机台缺少吨位, 整列按不兼容处理");
                machines_without_tonnage.push(machine.machine_code.clone());
            }
        }

        let mut compatible_cells = 0usize;
        for (row, mold) in molds.iter().enumerate() {
            let (options, invalid) = mold.tonnage_options();
            for fragment in &invalid {
                warn!(
                    mold_id = %mold.mold_id,
                    fragment = %fragment,
                    "吨位规格片段无法解析, 已跳过"
                );
            }
            if options.is_empty() {
                warn!(mold_id = %mold.mold_id, "模具缺少可用吨位规格, 整行按不兼容处理");
                molds_without_tonnage.push(mold.mold_id.clone());
                continue;
            }
            for (col, machine) in machines.iter().enumerate() {
                if let Some(tonnage) = machine.tonnage {
                    if options.contains(&tonnage) {
                        matrix.set_by_index(row, col, 1);
                        compatible_cells += 1;
                    }
                }
            }
        }

        info!(
            molds = matrix.mold_count(),
            machines = matrix.machine_count(),
            compatible_cells,
            molds_without_tonnage = molds_without_tonnage.len(),
            "兼容矩阵构建完成"
        );
        Ok(CompatibilityBuildResult {
            matrix,
            molds_without_tonnage,
            machines_without_tonnage,
        })
    }

    fn ensure_unique(ids: &[String], field: &str) -> EngineResult<()> {
        let mut seen = HashSet::new();
        for id in ids {
            if !seen.insert(id.as_str()) {
                return Err(EngineError::MalformedMatrix {
                    field: field.to_string(),
                    message: format!("标识重复: {}", id),
                });
            }
        }
        Ok(())
    }
}

impl Default for CompatibilityMatrixBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mold_with_spec(mold_id: &str, spec: &str) -> Mold {
        Mold {
            mold_id: mold_id.to_string(),
            mold_name: None,
            tonnage_spec: Some(spec.to_string()),
        }
    }

    #[test]
    fn test_multi_tonnage_spec_intersection() {
        // "100/200" 对 100/200/300 吨机台 → [1, 1, 0]
        let molds = vec![mold_with_spec("MD001", "100/200")];
        let machines = vec![
            Machine::new("J201", 100),
            Machine::new("J202", 200),
            Machine::new("J203", 300),
        ];
        let result = CompatibilityMatrixBuilder::new()
            .build(&molds, &machines)
            .unwrap();
        assert_eq!(result.matrix.row(0), &[1, 1, 0]);
    }

    #[test]
    fn test_empty_inputs_are_fatal() {
        let builder = CompatibilityMatrixBuilder::new();
        let molds = vec![mold_with_spec("MD001", "100")];
        let machines = vec![Machine::new("J201", 100)];

        let err = builder.build(&molds, &[]).unwrap_err();
        assert!(matches!(err, EngineError::EmptyMachineSet));

        let err = builder.build(&[], &machines).unwrap_err();
        assert!(matches!(err, EngineError::EmptyMoldSet));
    }

    #[test]
    fn test_missing_tonnage_is_incompatible_not_error() {
        let molds = vec![Mold::new("MD001"), mold_with_spec("MD002", "100")];
        let machines = vec![Machine::new("J201", 100), Machine::without_tonnage("J202")];
        let result = CompatibilityMatrixBuilder::new()
            .build(&molds, &machines)
            .unwrap();
        assert_eq!(result.matrix.row(0), &[0, 0]);
        assert_eq!(result.matrix.row(1), &[1, 0]);
        assert_eq!(result.molds_without_tonnage, vec!["MD001".to_string()]);
        assert_eq!(result.machines_without_tonnage, vec!["J202".to_string()]);
    }

    #[test]
    fn test_unparsable_spec_fragments_are_skipped() {
        let molds = vec![mold_with_spec("MD001", "100/x200")];
        let machines = vec![Machine::new("J201", 100), Machine::new("J202", 200)];
        let result = CompatibilityMatrixBuilder::new()
            .build(&molds, &machines)
            .unwrap();
        assert_eq!(result.matrix.row(0), &[1, 0]);
        assert!(result.molds_without_tonnage.is_empty());
    }

    #[test]
    fn test_duplicate_mold_id_is_malformed() {
        let molds = vec![mold_with_spec("MD001", "100"), mold_with_spec("MD001", "200")];
        let machines = vec![Machine::new("J201", 100)];
        let err = CompatibilityMatrixBuilder::new()
            .build(&molds, &machines)
            .unwrap_err();
        assert!(matches!(err, EngineError::MalformedMatrix { .. }));
    }
}
