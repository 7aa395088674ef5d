// Plan export
// Writes a plan joined with its region descriptors as JSON or CSV.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::debug;
use serde::Serialize;
use strum::{Display, EnumString};

use crate::error::{Error, Result};
use crate::graph::RegionGraph;
use crate::model::{InstanceId, StaticId};
use crate::planner::{Plan, Target};

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
}

/// One exported plan region, flattened for tabular output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanRow {
    pub instance_id: InstanceId,
    pub static_id: StaticId,
    pub kind: String,
    pub module: String,
    pub function: String,
    pub start_line: u32,
    pub end_line: u32,
    pub core_count: u32,
    pub time_save: f64,
}

const CSV_HEADER: [&str; 9] = [
    "instance_id",
    "static_id",
    "kind",
    "module",
    "function",
    "start_line",
    "end_line",
    "core_count",
    "time_save",
];

#[derive(Serialize)]
struct PlanDocument<'a> {
    target: &'a Target,
    serial_time: f64,
    parallel_time: f64,
    time_reduction: f64,
    speedup: f64,
    regions: Vec<PlanRow>,
}

/// Join plan records with the descriptors of the graph they were planned on
pub fn plan_rows(plan: &Plan, graph: &RegionGraph) -> Result<Vec<PlanRow>> {
    plan.records()
        .iter()
        .map(|record| {
            let instance = graph.by_id(record.instance_id).ok_or_else(|| {
                Error::MalformedGraph(format!(
                    "plan names instance {} which is not in the graph",
                    record.instance_id
                ))
            })?;
            let region = instance.static_region();
            Ok(PlanRow {
                instance_id: record.instance_id,
                static_id: region.id,
                kind: region.kind.to_string(),
                module: region.module.clone(),
                function: region.function.clone(),
                start_line: region.start_line,
                end_line: region.end_line,
                core_count: record.core_count,
                time_save: record.time_save,
            })
        })
        .collect()
}

/// Write a plan to any writer
pub fn export_plan<W: Write>(plan: &Plan, graph: &RegionGraph, format: ExportFormat, mut writer: W) -> Result<()> {
    let rows = plan_rows(plan, graph)?;
    debug!("exporting {} plan regions as {}", rows.len(), format);

    match format {
        ExportFormat::Json => {
            let document = PlanDocument {
                target: plan.target(),
                serial_time: plan.serial_time(),
                parallel_time: plan.parallel_time(),
                time_reduction: plan.time_reduction(),
                speedup: plan.speedup(),
                regions: rows,
            };
            serde_json::to_writer_pretty(&mut writer, &document)?;
            writeln!(writer)?;
        }
        ExportFormat::Csv => {
            let mut csv_writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(&mut writer);
            // Header written explicitly so an empty plan still yields one
            csv_writer.write_record(CSV_HEADER)?;
            for row in &rows {
                csv_writer.serialize(row)?;
            }
            csv_writer.flush()?;
        }
    }

    Ok(())
}

/// Write a plan to a file, replacing any existing content
pub fn export_plan_to_path(plan: &Plan, graph: &RegionGraph, format: ExportFormat, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    export_plan(plan, graph, format, &mut writer)?;
    writer.flush()?;
    Ok(())
}
