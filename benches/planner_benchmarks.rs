use std::collections::HashSet;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;

use kremlin_planner::{
    GraphBuilder, NoNestPlanner, RecursionKind, RegionKind, RegionStat, StaticRegion, StaticRegionTable, Target,
    TraceReader, TraceRecord, TraceWriter,
};

// =====================================================================
// Synthetic traces
// =====================================================================

const STATIC_REGIONS: u64 = 32;

fn catalog() -> StaticRegionTable {
    let mut table = StaticRegionTable::new();
    for id in 1..=STATIC_REGIONS {
        let kind = match id % 3 {
            0 => RegionKind::Function,
            1 => RegionKind::Loop,
            _ => RegionKind::LoopBody,
        };
        table.insert(StaticRegion::new(id, kind, "bench.c", "f", id as u32, id as u32 + 10));
    }
    table
}

/// Random tree with `size` instances; parents always cover their children
fn synthetic_trace(size: usize, seed: u64) -> Vec<TraceRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let parents: Vec<usize> = (0..size).map(|i| if i == 0 { 0 } else { rng.gen_range(0..i) }).collect();

    let mut children = vec![Vec::new(); size];
    let mut work = vec![0u64; size];
    for i in (0..size).rev() {
        work[i] += rng.gen_range(1..10_000);
        if i > 0 {
            children[parents[i]].push(i as u64 + 1);
            work[parents[i]] += work[i];
        }
    }

    (0..size)
        .map(|i| {
            let serial = (work[i] / rng.gen_range(1..=16)).max(1);
            TraceRecord {
                uid: i as u64 + 1,
                static_id: if i == 0 { 0 } else { rng.gen_range(1..=STATIC_REGIONS) },
                call_site_id: 0,
                recursion: RecursionKind::Normal,
                recursion_target: 0,
                instance_count: 1,
                parallel_bit: rng.gen_bool(0.5),
                children: std::mem::take(&mut children[i]),
                stats: vec![RegionStat {
                    instance_count: 1,
                    total_work: work[i],
                    critical_path: serial,
                    serial_work: serial,
                    min_self_p: 1.0,
                    max_self_p: 1.0,
                    total_iterations: 0,
                    min_iterations: 0,
                    max_iterations: 0,
                    recursion_weight: 0.0,
                }],
            }
        })
        .collect()
}

// =====================================================================
// Criterion Benchmark Functions
// =====================================================================

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("planner");
    let catalog = catalog();
    let target = Target::new(8, 10.0).expect("valid target");

    for size in [1_000usize, 10_000, 100_000] {
        let records = synthetic_trace(size, 42);
        let bytes = TraceWriter::encode(&records);

        group.bench_function(BenchmarkId::new("decode", size), |b| {
            b.iter(|| TraceReader::decode(&bytes).expect("decode"));
        });

        group.bench_function(BenchmarkId::new("build_graph", size), |b| {
            b.iter(|| GraphBuilder::build_graph(records.clone(), &catalog).expect("build"));
        });

        let graph = GraphBuilder::build_graph(records.clone(), &catalog).expect("build");
        let excluded = HashSet::new();
        group.bench_function(BenchmarkId::new("plan", size), |b| {
            b.iter(|| NoNestPlanner::new(&graph, &target).plan(&excluded).expect("plan"));
        });
    }

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
