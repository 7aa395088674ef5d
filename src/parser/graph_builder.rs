use std::collections::{HashMap, HashSet, VecDeque};

use log::{debug, info, warn};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::analysis::parallelism;
use crate::catalog::RegionCatalog;
use crate::error::{Error, Result};
use crate::graph::RegionGraph;
use crate::model::{InstanceId, RecursionKind, RegionIndex, RegionInstance, StaticId, StatsPayload};
use crate::parser::recursion;
use crate::parser::trace_reader::TraceRecord;

/// Graph builder responsible for turning decoded records into a region tree
pub struct GraphBuilder;

impl GraphBuilder {
    /// Build the region graph from decoded trace records.
    ///
    /// Runs recursion retagging, instance construction, linkage, recursion
    /// target resolution, weight propagation and finally the eager
    /// self-parallelism pass. The returned graph is immutable.
    pub fn build_graph(mut records: Vec<TraceRecord>, catalog: &dyn RegionCatalog) -> Result<RegionGraph> {
        if records.is_empty() {
            return Err(Error::MalformedGraph("trace contains no records".to_string()));
        }

        let index = Self::index_records(&records)?;

        // Retagging must finish before construction reads the kinds
        let retagged = Self::retag_with_index(&mut records, &index)?;
        debug!("retagged {} records as recursion descendants", retagged);

        let mut instances = Self::create_instances(&mut records, catalog)?;
        let root = Self::link_instances(&mut instances, &records, &index)?;
        Self::check_acyclic(&instances)?;
        Self::resolve_recursion_targets(&mut instances, &records, &index)?;

        if instances[root].total_work() == 0 {
            return Err(Error::MalformedGraph(format!(
                "root instance {} has zero total work",
                instances[root].id
            )));
        }
        Self::check_work_bounded_by_root(&instances, root)?;

        let weights = recursion::propagate_recursion_weights(&mut instances)?;
        debug!("set {} recursion weights", weights);

        let self_p = parallelism::compute_self_parallelism(&instances)?;
        for (instance, value) in instances.iter_mut().zip(self_p) {
            instance.self_parallelism = value;
        }

        let mut by_static: HashMap<StaticId, Vec<RegionIndex>> = HashMap::new();
        for (i, instance) in instances.iter().enumerate() {
            by_static.entry(instance.region.id).or_default().push(i);
        }

        info!(
            "region graph built: {} instances, root {}",
            instances.len(),
            instances[root].id
        );

        Ok(RegionGraph {
            instances,
            index,
            by_static,
            root,
        })
    }

    /// Map instance ids to record positions, rejecting duplicates
    pub fn index_records(records: &[TraceRecord]) -> Result<HashMap<InstanceId, RegionIndex>> {
        let mut index = HashMap::with_capacity(records.len());
        for (position, record) in records.iter().enumerate() {
            if index.insert(record.uid, position).is_some() {
                return Err(Error::MalformedGraph(format!(
                    "instance id {} appears in more than one record",
                    record.uid
                )));
            }
        }
        Ok(index)
    }

    /// Retag every normal record reachable from a recursion init as a
    /// recursion descendant. Returns the number of records retagged.
    ///
    /// Retagging is idempotent: a second run finds nothing left to change.
    pub fn retag_recursion(records: &mut [TraceRecord]) -> Result<usize> {
        let index = Self::index_records(records)?;
        Self::retag_with_index(records, &index)
    }

    fn retag_with_index(records: &mut [TraceRecord], index: &HashMap<InstanceId, RegionIndex>) -> Result<usize> {
        let inits: Vec<RegionIndex> = records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.recursion == RecursionKind::Init)
            .map(|(position, _)| position)
            .collect();

        let mut retagged = 0;
        for start in inits {
            let mut visited = HashSet::new();
            let mut queue = VecDeque::from([start]);

            while let Some(current) = queue.pop_front() {
                if !visited.insert(current) {
                    continue;
                }

                let record = &mut records[current];
                if record.recursion == RecursionKind::Normal {
                    record.recursion = RecursionKind::Descendant;
                    retagged += 1;
                }

                for child in &records[current].children {
                    let position = index.get(child).ok_or_else(|| {
                        Error::MalformedGraph(format!(
                            "record {} lists unknown child {}",
                            records[current].uid, child
                        ))
                    })?;
                    queue.push_back(*position);
                }
            }
        }

        Ok(retagged)
    }

    /// Create one instance per record, in record order
    fn create_instances(records: &mut [TraceRecord], catalog: &dyn RegionCatalog) -> Result<Vec<RegionInstance>> {
        let mut instances = Vec::with_capacity(records.len());

        for record in records.iter_mut() {
            let region = catalog.resolve(record.static_id)?;
            let call_site = if record.call_site_id != 0 {
                Some(catalog.resolve_call_site(record.call_site_id)?)
            } else {
                None
            };

            if record.recursion_target != 0 && record.recursion != RecursionKind::Sink {
                warn!(
                    "record {} is not a recursion sink but names target {}; ignored",
                    record.uid, record.recursion_target
                );
            }

            let stats = std::mem::take(&mut record.stats);
            let payload = match record.recursion {
                RecursionKind::Normal => {
                    if stats.len() != 1 {
                        return Err(Error::MalformedGraph(format!(
                            "normal instance {} carries {} statistics records, expected 1",
                            record.uid,
                            stats.len()
                        )));
                    }
                    let mut stats = stats;
                    StatsPayload::Normal {
                        stat: stats.remove(0),
                    }
                }
                _ => {
                    if stats.is_empty() {
                        return Err(Error::MalformedGraph(format!(
                            "{} instance {} carries no statistics records",
                            record.recursion, record.uid
                        )));
                    }
                    StatsPayload::Recursive { stats, target: None }
                }
            };

            instances.push(RegionInstance {
                id: record.uid,
                region,
                call_site,
                recursion: record.recursion,
                instance_count: record.instance_count,
                parallel_bit: record.parallel_bit,
                parent: None,
                children: Vec::with_capacity(record.children.len()),
                stats: payload,
                self_parallelism: 1.0,
            });
        }

        Ok(instances)
    }

    /// Wire parent and child links; returns the index of the unique root
    fn link_instances(
        instances: &mut [RegionInstance],
        records: &[TraceRecord],
        index: &HashMap<InstanceId, RegionIndex>,
    ) -> Result<RegionIndex> {
        for (parent, record) in records.iter().enumerate() {
            for child_id in &record.children {
                let child = *index.get(child_id).ok_or_else(|| {
                    Error::MalformedGraph(format!("record {} lists unknown child {}", record.uid, child_id))
                })?;

                if let Some(existing) = instances[child].parent {
                    return Err(Error::MalformedGraph(format!(
                        "instance {} is claimed by parents {} and {}",
                        child_id, instances[existing].id, record.uid
                    )));
                }
                instances[child].parent = Some(parent);
                instances[parent].children.push(child);
            }
        }

        let roots: Vec<RegionIndex> = instances
            .iter()
            .enumerate()
            .filter(|(_, instance)| instance.parent.is_none())
            .map(|(i, _)| i)
            .collect();

        match roots.as_slice() {
            [root] => Ok(*root),
            [] => Err(Error::MalformedGraph(
                "no root instance: every instance has a parent".to_string(),
            )),
            many => {
                let ids: Vec<String> = many.iter().map(|&i| instances[i].id.to_string()).collect();
                Err(Error::MalformedGraph(format!(
                    "multiple root instances: {}",
                    ids.join(", ")
                )))
            }
        }
    }

    /// Reject parent/child cycles
    fn check_acyclic(instances: &[RegionInstance]) -> Result<()> {
        let mut graph: DiGraph<RegionIndex, ()> = DiGraph::with_capacity(instances.len(), instances.len());
        let nodes: Vec<NodeIndex> = (0..instances.len()).map(|i| graph.add_node(i)).collect();

        for (parent, instance) in instances.iter().enumerate() {
            for &child in &instance.children {
                graph.add_edge(nodes[parent], nodes[child], ());
            }
        }

        toposort(&graph, None).map(|_| ()).map_err(|cycle| {
            let offending = graph[cycle.node_id()];
            Error::MalformedGraph(format!(
                "parent/child cycle through instance {}",
                instances[offending].id
            ))
        })
    }

    /// Reject instances claiming more work than the whole program
    fn check_work_bounded_by_root(instances: &[RegionInstance], root: RegionIndex) -> Result<()> {
        let root_work = instances[root].total_work();
        match instances.iter().find(|instance| instance.total_work() > root_work) {
            Some(instance) => Err(Error::MalformedGraph(format!(
                "instance {} has total work {} above the root's {}",
                instance.id,
                instance.total_work(),
                root_work
            ))),
            None => Ok(()),
        }
    }

    /// Point every sink at the init that started its recursive chain
    fn resolve_recursion_targets(
        instances: &mut [RegionInstance],
        records: &[TraceRecord],
        index: &HashMap<InstanceId, RegionIndex>,
    ) -> Result<()> {
        for (position, record) in records.iter().enumerate() {
            if record.recursion != RecursionKind::Sink {
                continue;
            }

            let unresolved = || Error::UnresolvedRecursionTarget {
                sink: record.uid,
                target: record.recursion_target,
            };
            let target = *index.get(&record.recursion_target).ok_or_else(unresolved)?;
            if instances[target].recursion != RecursionKind::Init {
                return Err(unresolved());
            }

            if let StatsPayload::Recursive { target: slot, .. } = &mut instances[position].stats {
                *slot = Some(target);
            }
        }
        Ok(())
    }
}
