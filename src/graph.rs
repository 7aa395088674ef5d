use std::collections::HashMap;

use serde::Serialize;

use crate::model::{InstanceId, RegionIndex, RegionInstance, RegionKind, StaticId};

/// Arena of region instances forming a single-rooted tree.
///
/// Produced by `GraphBuilder`; read-only afterwards. Parent and child links
/// are arena indices, so the graph owns every instance exactly once.
#[derive(Debug, Clone)]
pub struct RegionGraph {
    pub(crate) instances: Vec<RegionInstance>,
    pub(crate) index: HashMap<InstanceId, RegionIndex>,
    pub(crate) by_static: HashMap<StaticId, Vec<RegionIndex>>,
    pub(crate) root: RegionIndex,
}

/// Region counts by static kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegionCounts {
    pub total: usize,
    pub loops: usize,
    pub functions: usize,
    pub bodies: usize,
}

impl RegionGraph {
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn root_index(&self) -> RegionIndex {
        self.root
    }

    pub fn root(&self) -> &RegionInstance {
        &self.instances[self.root]
    }

    /// Instance at an arena index handed out by this graph
    pub fn instance(&self, index: RegionIndex) -> &RegionInstance {
        &self.instances[index]
    }

    pub fn get(&self, index: RegionIndex) -> Option<&RegionInstance> {
        self.instances.get(index)
    }

    pub fn index_of(&self, id: InstanceId) -> Option<RegionIndex> {
        self.index.get(&id).copied()
    }

    pub fn by_id(&self, id: InstanceId) -> Option<&RegionInstance> {
        self.index_of(id).map(|index| &self.instances[index])
    }

    /// Instances in trace order, with their arena indices
    pub fn iter(&self) -> impl Iterator<Item = (RegionIndex, &RegionInstance)> {
        self.instances.iter().enumerate()
    }

    pub fn leaves(&self) -> Vec<RegionIndex> {
        self.iter()
            .filter(|(_, instance)| instance.is_leaf())
            .map(|(index, _)| index)
            .collect()
    }

    /// All instances profiled for one static region
    pub fn instances_of(&self, static_id: StaticId) -> Vec<&RegionInstance> {
        self.by_static
            .get(&static_id)
            .map(|indices| indices.iter().map(|&i| &self.instances[i]).collect())
            .unwrap_or_default()
    }

    /// Walk parent links upward, excluding the start instance
    pub fn ancestors(&self, index: RegionIndex) -> Ancestors<'_> {
        Ancestors {
            graph: self,
            next: self.instances[index].parent,
        }
    }

    /// Whether `ancestor` lies strictly above `descendant`
    pub fn is_ancestor(&self, ancestor: RegionIndex, descendant: RegionIndex) -> bool {
        self.ancestors(descendant).any(|index| index == ancestor)
    }

    /// Percentage of program work spent in an instance
    pub fn coverage(&self, index: RegionIndex) -> f64 {
        let root_work = self.root().total_work() as f64;
        self.instances[index].total_work() as f64 * 100.0 / root_work
    }

    /// Ideal time reduction with unbounded cores and no overhead
    pub fn time_reduction(&self, index: RegionIndex) -> f64 {
        let self_p = self.instances[index].self_parallelism();
        self.coverage(index) * (1.0 - 1.0 / self_p)
    }

    /// Instances whose ideal time reduction exceeds `threshold`, best first
    pub fn ranked_by_time_reduction(&self, threshold: f64) -> Vec<RegionIndex> {
        let mut ranked: Vec<(RegionIndex, f64)> = self
            .iter()
            .map(|(index, _)| (index, self.time_reduction(index)))
            .filter(|&(_, reduction)| reduction > threshold)
            .collect();

        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.into_iter().map(|(index, _)| index).collect()
    }

    pub fn region_counts(&self) -> RegionCounts {
        let mut counts = RegionCounts::default();
        for instance in &self.instances {
            counts.total += 1;
            match instance.static_region().kind {
                RegionKind::Loop => counts.loops += 1,
                RegionKind::Function => counts.functions += 1,
                _ => counts.bodies += 1,
            }
        }
        counts
    }
}

/// Iterator over the ancestors of an instance, nearest first
pub struct Ancestors<'g> {
    graph: &'g RegionGraph,
    next: Option<RegionIndex>,
}

impl<'g> Iterator for Ancestors<'g> {
    type Item = RegionIndex;

    fn next(&mut self) -> Option<RegionIndex> {
        let current = self.next?;
        self.next = self.graph.instances[current].parent;
        Some(current)
    }
}
