// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use chrono::NaiveDate;
use injection_molding_aps::domain::job::{PendingJob, PinnedPair, ProducingJob};
use injection_molding_aps::domain::machine::Machine;
use injection_molding_aps::domain::mold::Mold;
use injection_molding_aps::repository::{PlanningSnapshot, PriorityRank};

/// 构造测试日期
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

// ==========================================
// Mold 构建器
// ==========================================

pub struct MoldBuilder {
    mold_id: String,
    mold_name: Option<String>,
    tonnage_spec: Option<String>,
}

impl MoldBuilder {
    pub fn new(mold_id: &str) -> Self {
        Self {
            mold_id: mold_id.to_string(),
            mold_name: None,
            tonnage_spec: None,
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.mold_name = Some(name.to_string());
        self
    }

    pub fn tonnage_spec(mut self, spec: &str) -> Self {
        self.tonnage_spec = Some(spec.to_string());
        self
    }

    pub fn build(self) -> Mold {
        Mold {
            mold_id: self.mold_id,
            mold_name: self.mold_name,
            tonnage_spec: self.tonnage_spec,
        }
    }
}

// ==========================================
// PendingJob 构建器
// ==========================================

pub struct PendingJobBuilder {
    order_id: String,
    item_name: String,
    quantity: Option<i64>,
    due_date: Option<NaiveDate>,
}

impl PendingJobBuilder {
    pub fn new(order_id: &str, item_name: &str) -> Self {
        Self {
            order_id: order_id.to_string(),
            item_name: item_name.to_string(),
            quantity: None,
            due_date: None,
        }
    }

    pub fn quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn due_date(mut self, due: NaiveDate) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn build(self) -> PendingJob {
        PendingJob {
            order_id: self.order_id,
            item_name: self.item_name,
            quantity: self.quantity,
            due_date: self.due_date,
        }
    }
}

// ==========================================
// PlanningSnapshot 构建器
// ==========================================
// 逐步挂接机台/模具/优先级/周期/订单, 最终产出一份完整快照

pub struct SnapshotBuilder {
    snapshot: PlanningSnapshot,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self {
            snapshot: PlanningSnapshot::default(),
        }
    }

    pub fn machine(mut self, machine_code: &str, tonnage: u32) -> Self {
        self.snapshot.machines.push(Machine::new(machine_code, tonnage));
        self
    }

    pub fn machine_without_tonnage(mut self, machine_code: &str) -> Self {
        self.snapshot
            .machines
            .push(Machine::without_tonnage(machine_code));
        self
    }

    pub fn mold(mut self, mold_id: &str, tonnage_spec: &str) -> Self {
        self.snapshot
            .molds
            .push(MoldBuilder::new(mold_id).tonnage_spec(tonnage_spec).build());
        self
    }

    pub fn mold_without_tonnage(mut self, mold_id: &str) -> Self {
        self.snapshot.molds.push(Mold::new(mold_id));
        self
    }

    pub fn rank(mut self, mold_id: &str, machine_code: &str, rank: u32) -> Self {
        self.snapshot.priority_ranks.push(PriorityRank {
            mold_id: mold_id.to_string(),
            machine_code: machine_code.to_string(),
            rank,
        });
        self
    }

    pub fn lead(mut self, mold_id: &str, days: f64) -> Self {
        self.snapshot.lead_times.insert(mold_id.to_string(), days);
        self
    }

    pub fn job(mut self, job: PendingJob) -> Self {
        self.snapshot.pending_jobs.push(job);
        self
    }

    pub fn map_item(mut self, item_name: &str, mold_id: &str) -> Self {
        self.snapshot
            .item_to_mold
            .insert(item_name.to_string(), mold_id.to_string());
        self
    }

    pub fn producing(mut self, machine_code: &str, mold_id: &str, remaining_days: f64) -> Self {
        self.snapshot
            .producing_jobs
            .push(ProducingJob::new(machine_code, mold_id, remaining_days));
        self
    }

    pub fn pin(mut self, machine_code: &str, mold_id: &str) -> Self {
        self.snapshot
            .pins
            .push(PinnedPair::new(machine_code, mold_id));
        self
    }

    pub fn build(self) -> PlanningSnapshot {
        self.snapshot
    }
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}
