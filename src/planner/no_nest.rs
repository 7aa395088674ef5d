use std::collections::{HashSet, VecDeque};

use log::{debug, info};

use crate::error::{Error, Result};
use crate::graph::RegionGraph;
use crate::model::{InstanceId, RecursionKind, RegionIndex};
use crate::planner::plan::{Plan, PlanRecord};
use crate::planner::target::Target;

/// Best choice recorded for the subtree under one instance
#[derive(Debug, Clone, Default)]
struct SubtreeChoice {
    point: f64,
    chosen: Vec<RegionIndex>,
}

/// Bottom-up planner choosing a set of regions with no ancestor/descendant pair.
///
/// Every instance is retired once all of its children are. A retired instance
/// keeps either itself alone or the union of its children's choices,
/// whichever saves more program time; ties go to the children.
pub struct NoNestPlanner<'g> {
    graph: &'g RegionGraph,
    target: Target,
}

impl<'g> NoNestPlanner<'g> {
    pub fn new(graph: &'g RegionGraph, target: &Target) -> Self {
        Self {
            graph,
            target: target.clone(),
        }
    }

    /// Work of one average dynamic instance
    fn serial_time(&self, index: RegionIndex) -> Result<f64> {
        self.graph.instance(index).average_work()
    }

    fn parallel_time(&self, index: RegionIndex) -> Result<f64> {
        let instance = self.graph.instance(index);
        let cores = f64::from(self.target.core_count()).min(instance.self_parallelism());
        Ok(self.serial_time(index)? / cores + self.target.overhead())
    }

    fn speedup(&self, index: RegionIndex) -> Result<f64> {
        let serial = self.serial_time(index)?;
        let parallel = self.parallel_time(index)?;
        let speedup = serial / parallel;
        if parallel > serial || !speedup.is_finite() {
            return Ok(1.0);
        }
        Ok(speedup)
    }

    /// Program time saved by parallelizing this instance alone, in percent
    pub fn self_point(&self, index: RegionIndex, excluded: &HashSet<InstanceId>) -> Result<f64> {
        let instance = self.graph.instance(index);
        if excluded.contains(&instance.id()) || instance.recursion_kind() == RecursionKind::Sink {
            return Ok(0.0);
        }

        let coverage = self.graph.coverage(index);
        let point = coverage - coverage / self.speedup(index)?;
        Ok(point.max(0.0))
    }

    /// Compute the plan, skipping every instance in `excluded`
    pub fn plan(&self, excluded: &HashSet<InstanceId>) -> Result<Plan> {
        let graph = self.graph;
        let mut choices: Vec<Option<SubtreeChoice>> = vec![None; graph.len()];
        let mut pending: Vec<usize> = graph.iter().map(|(_, instance)| instance.children().len()).collect();
        let mut ready: VecDeque<RegionIndex> = graph.leaves().into();
        let mut retired = 0usize;

        while let Some(current) = ready.pop_front() {
            let instance = graph.instance(current);
            let mut children_point = 0.0;
            for &child in instance.children() {
                let choice = choices[child].as_ref().ok_or_else(|| {
                    Error::MalformedGraph(format!(
                        "instance {} retired before its child {}",
                        instance.id(),
                        graph.instance(child).id()
                    ))
                })?;
                children_point += choice.point;
            }

            let self_point = self.self_point(current, excluded)?;
            let choice = if self_point > children_point {
                SubtreeChoice {
                    point: self_point,
                    chosen: vec![current],
                }
            } else {
                let chosen = instance
                    .children()
                    .iter()
                    .filter_map(|&child| choices[child].take())
                    .flat_map(|choice| choice.chosen)
                    .collect();
                SubtreeChoice {
                    point: children_point,
                    chosen,
                }
            };
            choices[current] = Some(choice);
            retired += 1;

            if let Some(parent) = instance.parent() {
                pending[parent] -= 1;
                if pending[parent] == 0 {
                    ready.push_back(parent);
                }
            }
        }

        let root = graph.root_index();
        let best = match choices[root].take() {
            Some(best) => best,
            None => {
                return Err(Error::MalformedGraph(format!(
                    "planner stalled with {} of {} instances retired",
                    retired,
                    graph.len()
                )))
            }
        };
        debug!("planner retired {} instances", retired);

        let mut records = Vec::with_capacity(best.chosen.len());
        for index in best.chosen {
            let instance = graph.instance(index);
            records.push(PlanRecord {
                instance_id: instance.id(),
                static_id: instance.static_region().id,
                index,
                core_count: self.target.core_count(),
                time_save: self.self_point(index, excluded)?,
            });
        }
        records.sort_by(|a, b| b.time_save.total_cmp(&a.time_save).then(a.index.cmp(&b.index)));

        info!(
            "plan for {}: {} regions, {:.2}% time reduction",
            self.target,
            records.len(),
            best.point
        );

        Ok(Plan::new(records, self.target.clone(), best.point, self.serial_time(root)?))
    }
}
