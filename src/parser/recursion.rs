use std::collections::{BTreeMap, HashMap, HashSet};

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::model::{RecursionKind, RegionIndex, RegionInstance};

/// Set depth-indexed recursion weights on the ancestors of every sink.
///
/// For each init and each depth `d`, every instance on the path from a sink's
/// parent up to the init receives `acc(instance, d) / acc(init, d)`, where
/// `acc` sums the depth-`d` total work of the sinks whose walk passes the
/// instance. The denominator is the init's accumulated sink work, not the
/// init's own depth-`d` total work. A weight is written once per
/// (instance, depth); later writers are ignored. Returns the number of
/// weights written.
pub(crate) fn propagate_recursion_weights(instances: &mut [RegionInstance]) -> Result<usize> {
    // Step 1: group sinks under their init, in trace order
    let mut sinks_by_init: BTreeMap<RegionIndex, Vec<RegionIndex>> = instances
        .iter()
        .enumerate()
        .filter(|(_, instance)| instance.recursion == RecursionKind::Init)
        .map(|(i, _)| (i, Vec::new()))
        .collect();

    for (i, instance) in instances.iter().enumerate() {
        if instance.recursion != RecursionKind::Sink {
            continue;
        }
        if let Some(init) = instance.recursion_target() {
            sinks_by_init.entry(init).or_default().push(i);
        }
    }

    // Step 2: fold sink work into ancestor weights per init
    let mut written = HashSet::new();
    for (init, sinks) in &sinks_by_init {
        if sinks.is_empty() {
            debug!("recursion init {} has no sinks", instances[*init].id);
            continue;
        }
        set_weights_for_init(instances, *init, sinks, &mut written)?;
    }

    Ok(written.len())
}

fn set_weights_for_init(
    instances: &mut [RegionInstance],
    init: RegionIndex,
    sinks: &[RegionIndex],
    written: &mut HashSet<(RegionIndex, usize)>,
) -> Result<()> {
    let max_depth = sinks
        .iter()
        .map(|&sink| instances[sink].recursion_depth())
        .max()
        .unwrap_or(0);
    let stop = instances[init].parent;

    for depth in 0..max_depth {
        let mut accumulated: HashMap<RegionIndex, u64> = HashMap::new();
        let mut order = Vec::new();

        for &sink in sinks {
            let work = match instances[sink].stats.at_depth(depth) {
                Some(stat) => stat.total_work,
                None => continue,
            };

            let mut passed_init = false;
            let mut current = instances[sink].parent;
            while current != stop {
                let ancestor = current.ok_or_else(|| {
                    Error::MalformedGraph(format!(
                        "recursion sink {} is not a descendant of its init {}",
                        instances[sink].id, instances[init].id
                    ))
                })?;

                let sum = accumulated.entry(ancestor).or_insert_with(|| {
                    order.push(ancestor);
                    0
                });
                *sum = sum.saturating_add(work);

                passed_init |= ancestor == init;
                current = instances[ancestor].parent;
            }

            if !passed_init {
                return Err(Error::MalformedGraph(format!(
                    "recursion sink {} is not a descendant of its init {}",
                    instances[sink].id, instances[init].id
                )));
            }
        }

        let init_total = accumulated.get(&init).copied().unwrap_or(0);
        if init_total == 0 {
            return Err(Error::MalformedGraph(format!(
                "recursion init {} accumulates no sink work at depth {}",
                instances[init].id, depth
            )));
        }

        for ancestor in order {
            let weight = accumulated[&ancestor] as f64 / init_total as f64;
            if !written.insert((ancestor, depth)) {
                warn!(
                    "recursion weight of instance {} at depth {} already set; keeping the first value",
                    instances[ancestor].id, depth
                );
                continue;
            }

            let id = instances[ancestor].id;
            let stat = instances[ancestor].stats.at_depth_mut(depth).ok_or_else(|| {
                Error::MalformedGraph(format!(
                    "instance {} has no statistics at recursion depth {}",
                    id, depth
                ))
            })?;
            stat.recursion_weight = weight;
        }
    }

    Ok(())
}
