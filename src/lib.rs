pub mod analysis;
pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod graph;
pub mod model;
pub mod parser;
pub mod planner;

use std::collections::HashSet;
use std::path::Path;

// Re-export commonly used types
pub use catalog::{CatalogFormat, CatalogReader, RegionCatalog, StaticRegionTable};
pub use config::{PlannerOptions, PlanningMode};
pub use error::{Error, Result};
pub use export::{export_plan, export_plan_to_path, ExportFormat, PlanRow};
pub use graph::{RegionCounts, RegionGraph};
pub use model::{
    InstanceId, ParallelismKind, RecursionKind, RegionIndex, RegionInstance, RegionKind, RegionStat,
    StaticId, StaticRegion, StatsPayload,
};
pub use parser::{GraphBuilder, TraceReader, TraceRecord, TraceWriter};
pub use planner::{ExclusionPolicy, NoNestPlanner, Plan, PlanRecord, Target};

/// Decode a trace file and build its region graph against a catalog
pub fn load_graph(trace: &Path, catalog: &dyn RegionCatalog) -> Result<RegionGraph> {
    let records = TraceReader::load(trace)?;
    GraphBuilder::build_graph(records, catalog)
}

/// Plan a built graph with the target and exclusion policy the options select
pub fn plan_with_options(graph: &RegionGraph, options: &PlannerOptions) -> Result<Plan> {
    let target = options.target()?;
    let excluded: HashSet<InstanceId> = options.mode.exclusion_policy().excluded(graph);
    let plan = NoNestPlanner::new(graph, &target).plan(&excluded)?;

    if options.verbose {
        for record in plan.records_above(options.min_time_reduction) {
            log::info!("{:6.2}% {}", record.time_save, graph.instance(record.index));
        }
    }
    Ok(plan)
}

/// Instances of the static region named by `options.query_region`
pub fn query_instances<'g>(graph: &'g RegionGraph, options: &PlannerOptions) -> Result<Vec<&'g RegionInstance>> {
    let region = options
        .query_region
        .ok_or_else(|| Error::InvalidOption("query mode needs a static region id".to_string()))?;
    Ok(graph.instances_of(region))
}

/// Profiler ranking: regions above the configured time-reduction threshold
pub fn rank_regions(graph: &RegionGraph, options: &PlannerOptions) -> Vec<RegionIndex> {
    graph.ranked_by_time_reduction(options.min_time_reduction)
}
