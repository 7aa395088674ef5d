// Parallelism model
// Derived per-instance metrics: self-parallelism, exclusive work and the
// parallelism classification.

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::graph::RegionGraph;
use crate::model::{
    InstanceId, ParallelismKind, RegionIndex, RegionInstance, RegionKind, RegionStat, StatsPayload,
};

/// Compute self-parallelism for every instance.
///
/// Runs after weight propagation, reading only finished statistics, so the
/// instances can be evaluated in parallel.
pub(crate) fn compute_self_parallelism(instances: &[RegionInstance]) -> Result<Vec<f64>> {
    instances.par_iter().map(self_parallelism_of).collect()
}

/// Self-parallelism of one instance, clamped to at least 1.0
pub fn self_parallelism_of(instance: &RegionInstance) -> Result<f64> {
    let value = match &instance.stats {
        StatsPayload::Normal { stat } => depth_self_parallelism(instance.id, 0, stat)?,
        StatsPayload::Recursive { stats, .. } => fold_recursive_self_parallelism(instance.id, stats)?,
    };

    if !value.is_finite() || value <= 0.0 {
        return Err(Error::MalformedGraph(format!(
            "instance {} has non-finite self-parallelism {}",
            instance.id, value
        )));
    }
    Ok(value.max(1.0))
}

/// Fold per-depth statistics from the deepest level upward.
///
/// Each level absorbs the saving of the level below it, discounted by its
/// recursion weight; the depth-0 saving yields the overall figure.
pub fn fold_recursive_self_parallelism(id: InstanceId, stats: &[RegionStat]) -> Result<f64> {
    let first = stats.first().ok_or_else(|| {
        Error::MalformedGraph(format!("instance {} has no statistics records", id))
    })?;

    let mut saving = 0.0;
    for (depth, stat) in stats.iter().enumerate().rev() {
        let self_p = depth_self_parallelism(id, depth, stat)?;
        let total = stat.total_work as f64;
        let adjusted = total - saving * stat.recursion_weight;
        saving = total - adjusted / self_p;
    }

    let total = first.total_work as f64;
    Ok(total / (total - saving))
}

fn depth_self_parallelism(id: InstanceId, depth: usize, stat: &RegionStat) -> Result<f64> {
    if stat.serial_work == 0 {
        return Err(Error::MalformedGraph(format!(
            "instance {} has zero serial work at depth {}",
            id, depth
        )));
    }
    Ok(stat.work_ratio())
}

impl RegionInstance {
    /// Lower self-parallelism bound
    pub fn min_self_parallelism(&self) -> f64 {
        match &self.stats {
            StatsPayload::Normal { stat } => stat.min_self_p,
            StatsPayload::Recursive { stats, .. } => stats
                .iter()
                .map(RegionStat::work_ratio)
                .fold(f64::MAX, f64::min),
        }
    }

    /// Upper self-parallelism bound
    pub fn max_self_parallelism(&self) -> f64 {
        match &self.stats {
            StatsPayload::Normal { stat } => stat.max_self_p,
            StatsPayload::Recursive { stats, .. } => stats
                .iter()
                .map(RegionStat::work_ratio)
                .fold(1.0, f64::max),
        }
    }

    /// Work over critical path; undefined for recursive instances
    pub fn total_parallelism(&self) -> Option<f64> {
        match &self.stats {
            StatsPayload::Normal { stat } if stat.critical_path > 0 => {
                Some(stat.total_work as f64 / stat.critical_path as f64)
            }
            _ => None,
        }
    }

    /// Work per dynamic instance
    pub fn average_work(&self) -> Result<f64> {
        self.region_stat().average_work().ok_or_else(|| {
            Error::MalformedGraph(format!("instance {} has a zero instance count", self.id))
        })
    }

    pub fn average_iterations(&self) -> Option<f64> {
        self.region_stat().average_iterations()
    }

    pub fn iteration_bounds(&self) -> (u64, u64) {
        let stat = self.region_stat();
        (stat.min_iterations, stat.max_iterations)
    }

    pub fn parallelism_kind(&self) -> ParallelismKind {
        if self.is_leaf() {
            return ParallelismKind::Ilp;
        }
        match self.region.kind {
            RegionKind::Loop if self.parallel_bit => ParallelismKind::Doall,
            RegionKind::Loop => ParallelismKind::Doacross,
            _ => ParallelismKind::Tlp,
        }
    }
}

impl RegionGraph {
    /// Work done in an instance but not in any of its direct children
    pub fn exclusive_work(&self, index: RegionIndex) -> i128 {
        let instance = self.instance(index);
        let children: i128 = instance
            .children()
            .iter()
            .map(|&child| i128::from(self.instance(child).total_work()))
            .sum();
        i128::from(instance.total_work()) - children
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(work: u64, serial: u64, weight: f64) -> RegionStat {
        RegionStat {
            instance_count: 1,
            total_work: work,
            critical_path: serial,
            serial_work: serial,
            min_self_p: 1.0,
            max_self_p: 1.0,
            total_iterations: 0,
            min_iterations: 0,
            max_iterations: 0,
            recursion_weight: weight,
        }
    }

    #[test]
    fn test_fold_single_level_matches_ratio() {
        let value = fold_recursive_self_parallelism(1, &[stat(900, 300, 0.0)]).unwrap();
        assert!((value - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_fold_absorbs_weighted_savings() {
        // depth 1: saving = 400 - 400 / 2 = 200
        // depth 0: adjusted = 1000 - 200 * 1.0 = 800, saving = 1000 - 800 / 4 = 800
        let stats = [stat(1000, 250, 1.0), stat(400, 200, 1.0)];
        let value = fold_recursive_self_parallelism(1, &stats).unwrap();
        assert!((value - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_fold_without_weights_ignores_deeper_levels() {
        let stats = [stat(1000, 250, 0.0), stat(400, 200, 0.0)];
        let value = fold_recursive_self_parallelism(1, &stats).unwrap();
        assert!((value - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_serial_work_is_malformed() {
        let err = fold_recursive_self_parallelism(9, &[stat(10, 0, 0.0)]).unwrap_err();
        assert!(matches!(err, Error::MalformedGraph(_)));
    }
}
