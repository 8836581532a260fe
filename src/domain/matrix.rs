// ==========================================
// 注塑模具排机系统 - 模具×机台矩阵
// ==========================================
// 三种矩阵共用同一稠密网格:
// - CompatibilityMatrix: u8, 1 表示吨位兼容
// - PriorityMatrix: u32, 0 表示不可行, 1 为历史最优
// - AssignmentMatrix: f64, 非零单元格为承诺的生产周期天数
// 不变量: AssignmentMatrix 每行最多一个非零单元格
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// MoldMachineGrid - 稠密行主序网格
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoldMachineGrid<T> {
    mold_ids: Vec<String>,
    machine_codes: Vec<String>,
    /// 行主序单元格, 长度 = 模具数 × 机台数
    cells: Vec<T>,
    #[serde(skip)]
    mold_index: HashMap<String, usize>,
    #[serde(skip)]
    machine_index: HashMap<String, usize>,
}

impl<T: Copy + Default + PartialEq> MoldMachineGrid<T> {
    /// 创建全零网格, 行列顺序保持传入顺序
    pub fn new(mold_ids: Vec<String>, machine_codes: Vec<String>) -> Self {
        let mold_index = mold_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();
        let machine_index = machine_codes
            .iter()
            .enumerate()
            .map(|(i, code)| (code.clone(), i))
            .collect();
        let cells = vec![T::default(); mold_ids.len() * machine_codes.len()];
        Self {
            mold_ids,
            machine_codes,
            cells,
            mold_index,
            machine_index,
        }
    }

    pub fn mold_ids(&self) -> &[String] {
        &self.mold_ids
    }

    pub fn machine_codes(&self) -> &[String] {
        &self.machine_codes
    }

    pub fn mold_count(&self) -> usize {
        self.mold_ids.len()
    }

    pub fn machine_count(&self) -> usize {
        self.machine_codes.len()
    }

    /// 行或列为空即视为结构空
    pub fn is_empty_shape(&self) -> bool {
        self.mold_ids.is_empty() || self.machine_codes.is_empty()
    }

    pub fn mold_index_of(&self, mold_id: &str) -> Option<usize> {
        self.mold_index.get(mold_id).copied()
    }

    pub fn machine_index_of(&self, machine_code: &str) -> Option<usize> {
        self.machine_index.get(machine_code).copied()
    }

    pub fn get(&self, mold_id: &str, machine_code: &str) -> Option<T> {
        let row = self.mold_index_of(mold_id)?;
        let col = self.machine_index_of(machine_code)?;
        Some(self.get_by_index(row, col))
    }

    pub fn get_by_index(&self, row: usize, col: usize) -> T {
        self.cells[row * self.machine_codes.len() + col]
    }

    pub fn set_by_index(&mut self, row: usize, col: usize, value: T) {
        let width = self.machine_codes.len();
        self.cells[row * width + col] = value;
    }

    /// 按标识写入; 任一标识未知时返回 false 且不写入
    pub fn set(&mut self, mold_id: &str, machine_code: &str, value: T) -> bool {
        match (self.mold_index_of(mold_id), self.machine_index_of(machine_code)) {
            (Some(row), Some(col)) => {
                self.set_by_index(row, col, value);
                true
            }
            _ => false,
        }
    }

    pub fn row(&self, row: usize) -> &[T] {
        let width = self.machine_codes.len();
        &self.cells[row * width..(row + 1) * width]
    }

    pub fn clear_row(&mut self, row: usize) {
        let width = self.machine_codes.len();
        for cell in &mut self.cells[row * width..(row + 1) * width] {
            *cell = T::default();
        }
    }

    /// 行内非零单元格的列下标, 按列序
    pub fn nonzero_cols_in_row(&self, row: usize) -> Vec<usize> {
        self.row(row)
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != T::default())
            .map(|(col, _)| col)
            .collect()
    }

    pub fn nonzero_count_in_row(&self, row: usize) -> usize {
        self.row(row)
            .iter()
            .filter(|v| **v != T::default())
            .count()
    }
}

// ==========================================
// 矩阵别名
// ==========================================

/// 二进制兼容矩阵: 1 = 吨位兼容
pub type CompatibilityMatrix = MoldMachineGrid<u8>;

/// 历史优先级矩阵: 0 = 不可行, 1 = 历史最优, 数值越大越差
pub type PriorityMatrix = MoldMachineGrid<u32>;

/// 分配矩阵: 非零单元格为该模具承诺给机台的周期天数
pub type AssignmentMatrix = MoldMachineGrid<f64>;

// ==========================================
// 分配结果的稀疏视图
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoldAssignment {
    pub mold_id: String,
    pub machine_code: String,
    pub lead_time_days: f64,
}

impl AssignmentMatrix {
    /// 将模具分配到机台并记录周期天数
    ///
    /// 写入前清空整行, 维持每行最多一个非零单元格的不变量;
    /// 任一标识未知时返回 false
    pub fn assign(&mut self, mold_id: &str, machine_code: &str, lead_time_days: f64) -> bool {
        match (
            self.mold_index_of(mold_id),
            self.machine_index_of(machine_code),
        ) {
            (Some(row), Some(col)) => {
                self.clear_row(row);
                self.set_by_index(row, col, lead_time_days);
                true
            }
            _ => false,
        }
    }

    /// 模具当前分配到的机台与周期天数
    pub fn assigned_machine_of(&self, mold_id: &str) -> Option<(&str, f64)> {
        let row = self.mold_index_of(mold_id)?;
        self.nonzero_cols_in_row(row)
            .first()
            .map(|&col| (self.machine_codes()[col].as_str(), self.get_by_index(row, col)))
    }

    /// 非零单元格的稀疏列表, 按行序
    pub fn assignments(&self) -> Vec<MoldAssignment> {
        let mut result = Vec::new();
        for row in 0..self.mold_count() {
            for col in self.nonzero_cols_in_row(row) {
                result.push(MoldAssignment {
                    mold_id: self.mold_ids()[row].clone(),
                    machine_code: self.machine_codes()[col].clone(),
                    lead_time_days: self.get_by_index(row, col),
                });
            }
        }
        result
    }

    /// 按标识吸收另一矩阵的非零单元格（两层结果合并用）
    ///
    /// 行列按标识对齐, 形状可以不同; 本矩阵不认识的标识跳过
    ///
    /// # 返回
    /// 实际吸收的单元格数
    pub fn absorb(&mut self, other: &AssignmentMatrix) -> usize {
        let mut absorbed = 0;
        for placed in other.assignments() {
            if self.assign(&placed.mold_id, &placed.machine_code, placed.lead_time_days) {
                absorbed += 1;
            }
        }
        absorbed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> AssignmentMatrix {
        AssignmentMatrix::new(
            vec!["MD001".into(), "MD002".into()],
            vec!["J201".into(), "J202".into(), "J203".into()],
        )
    }

    #[test]
    fn test_new_grid_is_all_zero() {
        let g = grid();
        assert_eq!(g.mold_count(), 2);
        assert_eq!(g.machine_count(), 3);
        for row in 0..g.mold_count() {
            assert_eq!(g.nonzero_count_in_row(row), 0);
        }
    }

    #[test]
    fn test_assign_keeps_single_nonzero_per_row() {
        let mut g = grid();
        assert!(g.assign("MD001", "J201", 3.0));
        assert!(g.assign("MD001", "J203", 5.0));
        assert_eq!(g.nonzero_count_in_row(0), 1);
        assert_eq!(g.assigned_machine_of("MD001"), Some(("J203", 5.0)));
    }

    #[test]
    fn test_assign_unknown_id_is_rejected() {
        let mut g = grid();
        assert!(!g.assign("MD999", "J201", 3.0));
        assert!(!g.assign("MD001", "J999", 3.0));
        assert!(g.assignments().is_empty());
    }

    #[test]
    fn test_absorb_aligns_by_identifier() {
        // 兜底层矩阵只有池内行, 按标识并入全量矩阵
        let mut g = grid();
        let mut pool = AssignmentMatrix::new(
            vec!["MD002".into(), "MD999".into()],
            vec!["J201".into(), "J202".into(), "J203".into()],
        );
        pool.assign("MD002", "J202", 4.0);
        pool.assign("MD999", "J201", 2.0);
        // MD999 不在全量矩阵中, 跳过
        assert_eq!(g.absorb(&pool), 1);
        assert_eq!(g.assigned_machine_of("MD002"), Some(("J202", 4.0)));
    }
}
