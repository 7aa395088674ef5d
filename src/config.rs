use std::str::FromStr;

use serde::Deserialize;
use strum::{Display, EnumString};

use crate::error::{Error, Result};
use crate::model::StaticId;
use crate::planner::{ExclusionPolicy, Target};

/// Kind of report a planning run produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Deserialize)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[serde(try_from = "String")]
pub enum PlanningMode {
    /// Rank every region by ideal time reduction
    #[default]
    Profiler,
    /// Report the instances of one static region
    Query,
    /// Parallel loops only
    #[strum(serialize = "openmp", serialize = "omp")]
    OpenMp,
    /// Function-level task parallelism
    Cilk,
    /// Loop-free leaf bodies with a core-scaled overhead
    #[strum(serialize = "leafbodies", serialize = "raw")]
    LeafBodies,
}

impl TryFrom<String> for PlanningMode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        PlanningMode::from_str(&value)
            .map_err(|_| Error::InvalidOption(format!("unknown planning mode '{}'", value)))
    }
}

impl PlanningMode {
    pub fn exclusion_policy(&self) -> ExclusionPolicy {
        match self {
            PlanningMode::Profiler | PlanningMode::Query => ExclusionPolicy::Unrestricted,
            PlanningMode::OpenMp => ExclusionPolicy::DoallLoops,
            PlanningMode::Cilk => ExclusionPolicy::Functions,
            PlanningMode::LeafBodies => ExclusionPolicy::LeafBodies,
        }
    }
}

/// Options for one planning run
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlannerOptions {
    /// Cores on the target machine
    pub core_count: u32,
    /// Per-region parallelization overhead in work units
    pub overhead: f64,
    /// Minimum time reduction, in percent, for a region to be reported
    pub min_time_reduction: f64,
    pub mode: PlanningMode,
    /// Static region looked up in query mode
    pub query_region: Option<StaticId>,
    pub verbose: bool,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            core_count: 4,
            overhead: 0.0,
            min_time_reduction: 0.0,
            mode: PlanningMode::Profiler,
            query_region: None,
            verbose: false,
        }
    }
}

impl PlannerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read options from a JSON document; missing fields keep their defaults
    pub fn from_json(text: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(text)?;
        Ok(options)
    }

    pub fn set_core_count(mut self, core_count: u32) -> Self {
        self.core_count = core_count;
        self
    }

    pub fn set_overhead(mut self, overhead: f64) -> Self {
        self.overhead = overhead;
        self
    }

    pub fn set_min_time_reduction(mut self, threshold: f64) -> Self {
        self.min_time_reduction = threshold;
        self
    }

    pub fn set_mode(mut self, mode: PlanningMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn set_query_region(mut self, region: StaticId) -> Self {
        self.query_region = Some(region);
        self
    }

    pub fn enable_verbose(mut self, enable: bool) -> Self {
        self.verbose = enable;
        self
    }

    /// Validated target for these options.
    ///
    /// The leaf-body mode replaces the configured overhead with its own
    /// core-scaled preset.
    pub fn target(&self) -> Result<Target> {
        let overhead = self
            .mode
            .exclusion_policy()
            .preset_overhead(self.core_count)
            .unwrap_or(self.overhead);
        Target::new(self.core_count, overhead)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing_ignores_case() {
        assert_eq!("OpenMP".parse::<PlanningMode>().unwrap(), PlanningMode::OpenMp);
        assert_eq!("CILK".parse::<PlanningMode>().unwrap(), PlanningMode::Cilk);
        assert_eq!("raw".parse::<PlanningMode>().unwrap(), PlanningMode::LeafBodies);
        assert!("greedy".parse::<PlanningMode>().is_err());
    }

    #[test]
    fn test_json_keeps_defaults() {
        let options = PlannerOptions::from_json(r#"{"core_count": 16, "mode": "OMP"}"#).unwrap();
        assert_eq!(options.core_count, 16);
        assert_eq!(options.mode, PlanningMode::OpenMp);
        assert_eq!(options.overhead, 0.0);
        assert!(options.query_region.is_none());
    }

    #[test]
    fn test_unknown_mode_in_json_is_an_error() {
        assert!(PlannerOptions::from_json(r#"{"mode": "greedy"}"#).is_err());
    }

    #[test]
    fn test_leaf_bodies_overhead_preset() {
        let options = PlannerOptions::new()
            .set_core_count(8)
            .set_overhead(100.0)
            .set_mode(PlanningMode::LeafBodies);
        // floor(2 * ln 8) = 4
        assert_eq!(options.target().unwrap().overhead(), 4.0);
    }

    #[test]
    fn test_zero_cores_rejected() {
        let options = PlannerOptions::new().set_core_count(0);
        assert!(matches!(options.target(), Err(Error::InvalidTarget(_))));
    }
}
