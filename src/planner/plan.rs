use serde::Serialize;

use crate::model::{InstanceId, RegionIndex, StaticId};
use crate::planner::target::Target;

/// One region selected for parallelization
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanRecord {
    pub instance_id: InstanceId,
    pub static_id: StaticId,
    /// Arena index in the graph the plan was computed on
    #[serde(skip)]
    pub index: RegionIndex,
    pub core_count: u32,
    /// Predicted reduction of program time, in percent
    pub time_save: f64,
}

/// Ranked, non-nested set of regions to parallelize on one target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    records: Vec<PlanRecord>,
    total_reduction: f64,
    serial_time: f64,
    target: Target,
}

impl Plan {
    pub(crate) fn new(records: Vec<PlanRecord>, target: Target, total_reduction: f64, serial_time: f64) -> Self {
        Self {
            records,
            total_reduction,
            serial_time,
            target,
        }
    }

    /// Records ordered by descending time save
    pub fn records(&self) -> &[PlanRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Average work of the root instance
    pub fn serial_time(&self) -> f64 {
        self.serial_time
    }

    /// Predicted program time reduction, in percent
    pub fn time_reduction(&self) -> f64 {
        self.total_reduction
    }

    pub fn parallel_time(&self) -> f64 {
        self.serial_time * 0.01 * (100.0 - self.total_reduction)
    }

    pub fn speedup(&self) -> f64 {
        100.0 / (100.0 - self.total_reduction)
    }

    /// Records whose time save exceeds `threshold` percent
    pub fn records_above(&self, threshold: f64) -> Vec<&PlanRecord> {
        self.records
            .iter()
            .filter(|record| record.time_save > threshold)
            .collect()
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.records.iter().any(|record| record.instance_id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(reduction: f64) -> Plan {
        let record = PlanRecord {
            instance_id: 2,
            static_id: 7,
            index: 1,
            core_count: 4,
            time_save: reduction,
        };
        Plan::new(vec![record], Target::new(4, 0.0).unwrap(), reduction, 1000.0)
    }

    #[test]
    fn test_parallel_time_and_speedup() {
        let plan = plan(60.0);
        assert!((plan.parallel_time() - 400.0).abs() < 1e-9);
        assert!((plan.speedup() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_records_above_threshold() {
        let plan = plan(5.0);
        assert_eq!(plan.records_above(1.0).len(), 1);
        assert!(plan.records_above(5.0).is_empty());
        assert!(plan.contains(2));
    }
}
