#![allow(dead_code)]

use kremlin_planner::{RecursionKind, RegionKind, RegionStat, StaticRegion, StaticRegionTable, TraceRecord};
use rand::rngs::StdRng;
use rand::Rng;

pub const LOOP_A: u64 = 1;
pub const LOOP_B: u64 = 2;
pub const LOOP_C: u64 = 3;
pub const FUNC_MAIN: u64 = 6;
pub const FUNC_WORK: u64 = 7;
pub const BODY_A: u64 = 9;
pub const BODY_B: u64 = 10;

/// Catalog with a handful of loops, functions and loop bodies
pub fn catalog() -> StaticRegionTable {
    let mut table = StaticRegionTable::new();
    table.insert(StaticRegion::new(LOOP_A, RegionKind::Loop, "kernel.c", "main", 10, 30));
    table.insert(StaticRegion::new(LOOP_B, RegionKind::Loop, "kernel.c", "main", 12, 28));
    table.insert(StaticRegion::new(LOOP_C, RegionKind::Loop, "kernel.c", "work", 50, 60));
    table.insert(StaticRegion::new(FUNC_MAIN, RegionKind::Function, "kernel.c", "main", 5, 90));
    table.insert(StaticRegion::new(FUNC_WORK, RegionKind::Function, "kernel.c", "work", 45, 70));
    table.insert(StaticRegion::new(BODY_A, RegionKind::LoopBody, "kernel.c", "main", 11, 29));
    table.insert(StaticRegion::new(BODY_B, RegionKind::LoopBody, "kernel.c", "work", 51, 59));
    table
}

pub fn stat(work: u64, serial: u64) -> RegionStat {
    RegionStat {
        instance_count: 1,
        total_work: work,
        critical_path: serial,
        serial_work: serial,
        min_self_p: 1.0,
        max_self_p: (work as f64 / serial as f64 * 100.0).round() / 100.0,
        total_iterations: 0,
        min_iterations: 0,
        max_iterations: 0,
        recursion_weight: 0.0,
    }
}

/// Normal record with a single statistics tuple
pub fn normal(uid: u64, static_id: u64, work: u64, serial: u64, children: Vec<u64>) -> TraceRecord {
    TraceRecord {
        uid,
        static_id,
        call_site_id: 0,
        recursion: RecursionKind::Normal,
        recursion_target: 0,
        instance_count: 1,
        parallel_bit: true,
        children,
        stats: vec![stat(work, serial)],
    }
}

/// Record carrying one statistics tuple per recursion depth
pub fn recursive(
    uid: u64,
    static_id: u64,
    kind: RecursionKind,
    target: u64,
    depths: &[(u64, u64)],
    children: Vec<u64>,
) -> TraceRecord {
    TraceRecord {
        uid,
        static_id,
        call_site_id: 0,
        recursion: kind,
        recursion_target: target,
        instance_count: 1,
        parallel_bit: false,
        children,
        stats: depths.iter().map(|&(work, serial)| stat(work, serial)).collect(),
    }
}

/// Root, init, a record the retagging pass turns into a descendant, and a
/// sink two levels below the init; plus a plain leaf beside the init.
///
/// ```text
/// 1 (root) ── 2 (init) ── 3 ── 4 (sink -> 2)
///          └─ 5
/// ```
pub fn recursive_chain() -> Vec<TraceRecord> {
    vec![
        normal(1, 0, 1000, 1000, vec![2, 5]),
        recursive(2, FUNC_WORK, RecursionKind::Init, 0, &[(800, 200), (300, 100)], vec![3]),
        recursive(3, LOOP_C, RecursionKind::Normal, 0, &[(600, 150), (250, 100)], vec![4]),
        recursive(4, FUNC_WORK, RecursionKind::Sink, 2, &[(500, 100), (200, 100)], vec![]),
        normal(5, LOOP_A, 100, 50, vec![]),
    ]
}

/// Random single-rooted tree whose parents always cover their children
pub fn random_tree(rng: &mut StdRng, size: usize) -> Vec<TraceRecord> {
    const STATIC_IDS: [u64; 7] = [LOOP_A, LOOP_B, LOOP_C, FUNC_MAIN, FUNC_WORK, BODY_A, BODY_B];

    let parents: Vec<Option<usize>> = (0..size)
        .map(|i| if i == 0 { None } else { Some(rng.gen_range(0..i)) })
        .collect();

    let mut children: Vec<Vec<u64>> = vec![Vec::new(); size];
    for (i, parent) in parents.iter().enumerate() {
        if let Some(parent) = parent {
            children[*parent].push(i as u64 + 1);
        }
    }

    let mut work = vec![0u64; size];
    for i in (0..size).rev() {
        work[i] += rng.gen_range(1..1000);
        if let Some(parent) = parents[i] {
            work[parent] += work[i];
        }
    }

    (0..size)
        .map(|i| {
            let static_id = if i == 0 { 0 } else { STATIC_IDS[rng.gen_range(0..STATIC_IDS.len())] };
            let serial = (work[i] / rng.gen_range(1..=8)).max(1);
            let mut record = normal(i as u64 + 1, static_id, work[i], serial, children[i].clone());
            record.parallel_bit = rng.gen_bool(0.5);
            record
        })
        .collect()
}
