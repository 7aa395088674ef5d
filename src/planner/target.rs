use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};

/// Machine model a plan is computed for.
///
/// Clock, bandwidth and cache are informational; planning only reads the
/// core count and the per-region overhead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Target {
    core_count: u32,
    overhead: f64,
    clock_mhz: Option<u32>,
    bandwidth_mb: Option<u32>,
    cache_mb: Option<u32>,
}

impl Target {
    /// Create a target, rejecting zero cores and negative or non-finite overhead
    pub fn new(core_count: u32, overhead: f64) -> Result<Self> {
        if core_count == 0 {
            return Err(Error::InvalidTarget("core count must be positive".to_string()));
        }
        if !overhead.is_finite() || overhead < 0.0 {
            return Err(Error::InvalidTarget(format!(
                "overhead must be a non-negative finite value, got {}",
                overhead
            )));
        }

        Ok(Self {
            core_count,
            overhead,
            clock_mhz: None,
            bandwidth_mb: None,
            cache_mb: None,
        })
    }

    pub fn with_clock_mhz(mut self, clock_mhz: u32) -> Self {
        self.clock_mhz = Some(clock_mhz);
        self
    }

    pub fn with_bandwidth_mb(mut self, bandwidth_mb: u32) -> Self {
        self.bandwidth_mb = Some(bandwidth_mb);
        self
    }

    pub fn with_cache_mb(mut self, cache_mb: u32) -> Self {
        self.cache_mb = Some(cache_mb);
        self
    }

    pub fn core_count(&self) -> u32 {
        self.core_count
    }

    /// Fixed cost paid once per parallelized region, in work units
    pub fn overhead(&self) -> f64 {
        self.overhead
    }

    pub fn clock_mhz(&self) -> Option<u32> {
        self.clock_mhz
    }

    pub fn bandwidth_mb(&self) -> Option<u32> {
        self.bandwidth_mb
    }

    pub fn cache_mb(&self) -> Option<u32> {
        self.cache_mb
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NumCore = {}, Overhead = {}, Cache = {} MB, BW = {} MB/s",
            self.core_count,
            self.overhead,
            self.cache_mb.unwrap_or(0),
            self.bandwidth_mb.unwrap_or(0)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_cores_rejected() {
        assert!(matches!(Target::new(0, 0.0), Err(Error::InvalidTarget(_))));
    }

    #[test]
    fn test_bad_overhead_rejected() {
        assert!(matches!(Target::new(4, -1.0), Err(Error::InvalidTarget(_))));
        assert!(matches!(Target::new(4, f64::NAN), Err(Error::InvalidTarget(_))));
    }

    #[test]
    fn test_display() {
        let target = Target::new(8, 2.0).unwrap().with_cache_mb(16).with_bandwidth_mb(800);
        assert_eq!(
            target.to_string(),
            "NumCore = 8, Overhead = 2, Cache = 16 MB, BW = 800 MB/s"
        );
    }
}
