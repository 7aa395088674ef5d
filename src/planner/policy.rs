use std::collections::HashSet;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::graph::RegionGraph;
use crate::model::{InstanceId, RegionKind};

/// Rule deciding which instances a backend can never parallelize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExclusionPolicy {
    /// Every instance is a candidate
    #[default]
    Unrestricted,
    /// Only loops whose parallel bit is set
    DoallLoops,
    /// Only function regions
    Functions,
    /// Only non-loop regions with no loop or function below them
    LeafBodies,
}

impl ExclusionPolicy {
    /// Ids of the instances this policy rules out
    pub fn excluded(&self, graph: &RegionGraph) -> HashSet<InstanceId> {
        let excluded: HashSet<InstanceId> = match self {
            ExclusionPolicy::Unrestricted => HashSet::new(),
            ExclusionPolicy::DoallLoops => graph
                .iter()
                .filter(|(_, instance)| !(instance.static_region().is_loop() && instance.parallel_bit()))
                .map(|(_, instance)| instance.id())
                .collect(),
            ExclusionPolicy::Functions => graph
                .iter()
                .filter(|(_, instance)| !instance.static_region().is_function())
                .map(|(_, instance)| instance.id())
                .collect(),
            ExclusionPolicy::LeafBodies => Self::non_leaf_bodies(graph),
        };

        debug!("{:?} excludes {} of {} instances", self, excluded.len(), graph.len());
        excluded
    }

    /// Per-region overhead the policy's backend is assumed to pay, if it fixes one
    pub fn preset_overhead(&self, core_count: u32) -> Option<f64> {
        match self {
            ExclusionPolicy::LeafBodies => Some((2.0 * f64::from(core_count).ln()).floor().max(0.0)),
            _ => None,
        }
    }

    fn non_leaf_bodies(graph: &RegionGraph) -> HashSet<InstanceId> {
        let mut excluded = HashSet::new();
        for (index, instance) in graph.iter() {
            let kind = instance.static_region().kind;
            if kind == RegionKind::Loop {
                excluded.insert(instance.id());
            }
            if matches!(kind, RegionKind::Loop | RegionKind::Function) {
                for ancestor in graph.ancestors(index) {
                    if !excluded.insert(graph.instance(ancestor).id()) {
                        // Everything above was marked by an earlier walk
                        break;
                    }
                }
            }
        }
        excluded
    }
}
