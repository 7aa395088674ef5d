use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier of a profiled region instance, as written in the trace
pub type InstanceId = u64;

/// Identifier of a static region or call site in the region catalog
pub type StaticId = u64;

/// Stable arena index of an instance inside a `RegionGraph`
pub type RegionIndex = usize;

/// Static id reserved for the synthetic program root
pub const ROOT_STATIC_ID: StaticId = 0;

/// Kind of a static program region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
pub enum RegionKind {
    #[strum(to_string = "func")]
    Function,
    #[strum(to_string = "loop")]
    Loop,
    #[strum(to_string = "loop-body", serialize = "loop_body")]
    LoopBody,
    #[strum(to_string = "callsiteId")]
    CallSite,
}

/// Immutable description of a lexical region, supplied by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticRegion {
    pub id: StaticId,
    pub kind: RegionKind,
    pub module: String,
    pub function: String,
    pub start_line: u32,
    pub end_line: u32,
}

impl StaticRegion {
    pub fn new(
        id: StaticId,
        kind: RegionKind,
        module: impl Into<String>,
        function: impl Into<String>,
        start_line: u32,
        end_line: u32,
    ) -> Self {
        Self {
            id,
            kind,
            module: module.into(),
            function: function.into(),
            start_line,
            end_line,
        }
    }

    /// The synthetic region every catalog carries for the program root
    pub fn root() -> Self {
        Self::new(ROOT_STATIC_ID, RegionKind::Loop, "root", "root", 0, 0)
    }

    pub fn is_function(&self) -> bool {
        self.kind == RegionKind::Function
    }

    pub fn is_loop(&self) -> bool {
        self.kind == RegionKind::Loop
    }
}

impl fmt::Display for StaticRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>10} {:>10} [{:4} - {:4}]: {:>10}",
            self.kind, self.module, self.start_line, self.end_line, self.function
        )
    }
}

/// Recursion classification of an instance.
///
/// The trace only carries `Normal`, `Init` and `Sink`; `Descendant` is
/// assigned by the graph builder to every normal record reachable from an init.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum RecursionKind {
    #[strum(to_string = "Norm")]
    Normal,
    #[strum(to_string = "RInit")]
    Init,
    #[strum(to_string = "RSink")]
    Sink,
    #[strum(to_string = "RNorm")]
    Descendant,
}

impl RecursionKind {
    /// Map a wire tag to a kind. Only tags 0..=2 appear on the wire.
    pub fn from_wire(tag: u64) -> Option<Self> {
        match tag {
            0 => Some(RecursionKind::Normal),
            1 => Some(RecursionKind::Init),
            2 => Some(RecursionKind::Sink),
            _ => None,
        }
    }

    pub fn wire_tag(self) -> u64 {
        match self {
            RecursionKind::Normal => 0,
            RecursionKind::Init => 1,
            RecursionKind::Sink => 2,
            RecursionKind::Descendant => 3,
        }
    }

    /// Whether instances of this kind carry a depth-indexed statistics sequence
    pub fn is_recursive(self) -> bool {
        self != RecursionKind::Normal
    }
}

/// Kind of parallelism a region instance exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "UPPERCASE")]
pub enum ParallelismKind {
    Doall,
    Doacross,
    Tlp,
    Ilp,
}

/// Profiled statistics for one region instance at one recursion depth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionStat {
    /// Number of dynamic instances folded into this record
    pub instance_count: u64,
    /// Total work in platform-independent work units
    pub total_work: u64,
    /// Critical path length
    pub critical_path: u64,
    /// Work projected under a serial schedule of the children
    pub serial_work: u64,
    /// Lower bound of observed self-parallelism
    pub min_self_p: f64,
    /// Upper bound of observed self-parallelism
    pub max_self_p: f64,
    pub total_iterations: u64,
    pub min_iterations: u64,
    pub max_iterations: u64,
    /// Recursion weight, written once during weight propagation
    #[serde(default)]
    pub recursion_weight: f64,
}

impl RegionStat {
    /// Raw `work / serial_work` ratio; callers check finiteness
    pub fn work_ratio(&self) -> f64 {
        self.total_work as f64 / self.serial_work as f64
    }

    pub fn average_work(&self) -> Option<f64> {
        if self.instance_count == 0 {
            return None;
        }
        Some(self.total_work as f64 / self.instance_count as f64)
    }

    pub fn average_iterations(&self) -> Option<f64> {
        if self.instance_count == 0 {
            return None;
        }
        Some(self.total_iterations as f64 / self.instance_count as f64)
    }
}

/// Statistics carried by an instance.
///
/// Recursive payloads are never empty; the graph builder rejects records that
/// would produce one.
#[derive(Debug, Clone, PartialEq)]
pub enum StatsPayload {
    Normal {
        stat: RegionStat,
    },
    Recursive {
        stats: Vec<RegionStat>,
        /// Resolved init instance, present only for sinks
        target: Option<RegionIndex>,
    },
}

impl StatsPayload {
    /// Statistics at depth 0
    pub fn primary(&self) -> &RegionStat {
        match self {
            StatsPayload::Normal { stat } => stat,
            StatsPayload::Recursive { stats, .. } => &stats[0],
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            StatsPayload::Normal { .. } => 1,
            StatsPayload::Recursive { stats, .. } => stats.len(),
        }
    }

    pub fn at_depth(&self, depth: usize) -> Option<&RegionStat> {
        match self {
            StatsPayload::Normal { stat } if depth == 0 => Some(stat),
            StatsPayload::Normal { .. } => None,
            StatsPayload::Recursive { stats, .. } => stats.get(depth),
        }
    }

    pub(crate) fn at_depth_mut(&mut self, depth: usize) -> Option<&mut RegionStat> {
        match self {
            StatsPayload::Normal { stat } if depth == 0 => Some(stat),
            StatsPayload::Normal { .. } => None,
            StatsPayload::Recursive { stats, .. } => stats.get_mut(depth),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegionStat> {
        let slice = match self {
            StatsPayload::Normal { stat } => std::slice::from_ref(stat),
            StatsPayload::Recursive { stats, .. } => stats.as_slice(),
        };
        slice.iter()
    }
}

/// One profiled occurrence-class of a static region ("CRegion")
#[derive(Debug, Clone)]
pub struct RegionInstance {
    pub(crate) id: InstanceId,
    pub(crate) region: Arc<StaticRegion>,
    pub(crate) call_site: Option<Arc<StaticRegion>>,
    pub(crate) recursion: RecursionKind,
    pub(crate) instance_count: u64,
    pub(crate) parallel_bit: bool,
    pub(crate) parent: Option<RegionIndex>,
    pub(crate) children: Vec<RegionIndex>,
    pub(crate) stats: StatsPayload,
    pub(crate) self_parallelism: f64,
}

impl RegionInstance {
    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn static_region(&self) -> &Arc<StaticRegion> {
        &self.region
    }

    pub fn call_site(&self) -> Option<&Arc<StaticRegion>> {
        self.call_site.as_ref()
    }

    pub fn recursion_kind(&self) -> RecursionKind {
        self.recursion
    }

    pub fn instance_count(&self) -> u64 {
        self.instance_count
    }

    /// Profiler's own parallelizability signal
    pub fn parallel_bit(&self) -> bool {
        self.parallel_bit
    }

    pub fn parent(&self) -> Option<RegionIndex> {
        self.parent
    }

    pub fn children(&self) -> &[RegionIndex] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn stats(&self) -> &StatsPayload {
        &self.stats
    }

    /// Statistics record at depth 0
    pub fn region_stat(&self) -> &RegionStat {
        self.stats.primary()
    }

    pub fn recursion_depth(&self) -> usize {
        self.stats.depth()
    }

    /// Init instance a sink folds into
    pub fn recursion_target(&self) -> Option<RegionIndex> {
        match &self.stats {
            StatsPayload::Recursive { target, .. } => *target,
            StatsPayload::Normal { .. } => None,
        }
    }

    pub fn total_work(&self) -> u64 {
        self.region_stat().total_work
    }

    /// Self-parallelism computed when the graph was built; always >= 1.0
    pub fn self_parallelism(&self) -> f64 {
        self.self_parallelism
    }
}

impl fmt::Display for RegionInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} work = {}, sp = {:.2}, children = {}",
            self.id,
            self.region,
            self.total_work(),
            self.self_parallelism,
            self.children.len()
        )?;
        if let (Some(site), true) = (&self.call_site, self.region.is_function()) {
            write!(f, "\tcalled from {} line {}", site.module, site.start_line)?;
        }
        Ok(())
    }
}
