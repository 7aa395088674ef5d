mod common;

use std::collections::HashSet;
use std::fs;

use anyhow::Result;
use kremlin_planner::{export_plan, export_plan_to_path, ExportFormat, GraphBuilder, NoNestPlanner, Target};
use serde_json::Value;

use common::*;

fn planned() -> Result<(kremlin_planner::RegionGraph, kremlin_planner::Plan)> {
    let graph = GraphBuilder::build_graph(
        vec![
            normal(1, 0, 1000, 1000, vec![2, 3]),
            normal(2, LOOP_A, 500, 125, vec![]),
            normal(3, FUNC_WORK, 300, 100, vec![]),
        ],
        &catalog(),
    )?;
    let plan = NoNestPlanner::new(&graph, &Target::new(4, 0.0)?).plan(&HashSet::new())?;
    Ok((graph, plan))
}

#[test]
fn test_json_export_to_file() -> Result<()> {
    let (graph, plan) = planned()?;
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("plan.json");

    export_plan_to_path(&plan, &graph, ExportFormat::Json, &path)?;

    let document: Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
    assert_eq!(document["target"]["core_count"], 4);
    assert_eq!(document["regions"][0]["instance_id"], 2);
    assert_eq!(document["regions"][0]["kind"], "loop");
    assert_eq!(document["regions"][1]["function"], "work");
    assert_eq!(document["time_reduction"].as_f64(), Some(57.5));
    Ok(())
}

#[test]
fn test_csv_export() -> Result<()> {
    let (graph, plan) = planned()?;
    let mut buffer = Vec::new();

    export_plan(&plan, &graph, ExportFormat::Csv, &mut buffer)?;

    let text = String::from_utf8(buffer)?;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines[0],
        "instance_id,static_id,kind,module,function,start_line,end_line,core_count,time_save"
    );
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("2,1,loop,kernel.c,main,10,30,4,"));
    assert!(lines[2].starts_with("3,7,func,kernel.c,work,45,70,4,"));
    Ok(())
}

#[test]
fn test_empty_plan_csv_has_header_only() -> Result<()> {
    let graph = GraphBuilder::build_graph(vec![normal(1, 0, 1000, 1000, vec![])], &catalog())?;
    let plan = NoNestPlanner::new(&graph, &Target::new(4, 0.0)?).plan(&HashSet::new())?;

    let mut buffer = Vec::new();
    export_plan(&plan, &graph, ExportFormat::Csv, &mut buffer)?;
    assert_eq!(String::from_utf8(buffer)?.lines().count(), 1);
    Ok(())
}

#[test]
fn test_format_names_parse() {
    assert_eq!("JSON".parse::<ExportFormat>().ok(), Some(ExportFormat::Json));
    assert_eq!("csv".parse::<ExportFormat>().ok(), Some(ExportFormat::Csv));
    assert!("xml".parse::<ExportFormat>().is_err());
}
