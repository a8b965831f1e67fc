//! TraceCollection - manager for many independently-owned traces
//!
//! This module provides the high-level API for loading several GPX files,
//! optionally into one shared planar frame, with parallel bulk loading and
//! incrementally-updated aggregate statistics.

use crate::{GeoSample, Result, Trace};

use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration applied to every trace the collection creates
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Shared fixed reference point. When set, every loaded trace is
    /// projected relative to it, placing all traces into one common planar
    /// frame. When unset, each trace derives its own reference from its
    /// first sample and the frames are unrelated.
    pub origin: Option<GeoSample>,
}

/// Information about the trace collection
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CollectionInfo {
    /// Number of traces loaded
    pub trace_count: usize,
    /// Total number of projected points
    pub total_points: usize,
    /// Total planar path length in meters
    pub total_distance_meters: f64,
}

/// Cached statistics for the collection
///
/// Updated incrementally when traces are added, avoiding recalculation.
///
/// No aggregate bounding box is kept: traces loaded without a shared
/// configured origin live in unrelated planar frames, so a union box would
/// be geometrically meaningless. Per-trace boxes are exposed instead.
#[derive(Debug, Clone, Default)]
struct CachedStats {
    total_points: usize,
    total_distance: f64,
}

/// Top-level manager for all loaded traces
///
/// Each trace is independently owned; nothing is shared across instances, so
/// parallel loading needs no cross-trace synchronization.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceCollection {
    /// All loaded traces
    traces: Vec<Trace>,
    /// Configuration settings
    config: Config,
    /// Cached statistics (incrementally updated)
    #[cfg_attr(feature = "serde", serde(skip, default))]
    cached_stats: CachedStats,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl TraceCollection {
    /// Create a new trace collection with the given configuration
    pub fn new(config: Config) -> Self {
        Self {
            traces: Vec::new(),
            config,
            cached_stats: CachedStats::default(),
        }
    }

    /// Create an empty trace configured like this collection's traces.
    fn new_trace(config: Config) -> Trace {
        match config.origin {
            Some(origin) => Trace::with_origin(origin),
            None => Trace::new(),
        }
    }

    /// Add an already-loaded trace to the collection.
    pub fn add_trace(&mut self, trace: Trace) {
        self.cached_stats.total_points += trace.len();
        self.cached_stats.total_distance += trace.total_distance();
        self.traces.push(trace);
    }

    /// Load one GPX file into a new trace.
    ///
    /// Returns the accepted point count. On failure nothing is added.
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        // Profile single-file ingestion (IO, parsing, projection)
        #[cfg(feature = "profiling")]
        profiling::scope!("collection::load_file");

        let mut trace = Self::new_trace(self.config);
        let count = trace.load(path)?;
        self.add_trace(trace);
        Ok(count)
    }

    /// Load GPX files in parallel, one independent trace per file.
    ///
    /// All-or-nothing: if any file fails, the error is returned and the
    /// collection is left unchanged.
    pub fn load_from_files<P: AsRef<Path> + Send + Sync>(&mut self, paths: Vec<P>) -> Result<()> {
        // Profile bulk file loading (parallel IO + parsing + projection)
        #[cfg(feature = "profiling")]
        profiling::scope!("collection::load_from_files");

        let config = self.config;
        let loaded: Result<Vec<Trace>> = paths
            .into_par_iter()
            .map(|path| {
                let mut trace = Self::new_trace(config);
                trace.load(path.as_ref())?;
                Ok(trace)
            })
            .collect();

        for trace in loaded? {
            self.add_trace(trace);
        }

        Ok(())
    }

    /// Get total number of traces
    #[inline]
    pub fn trace_count(&self) -> usize {
        self.traces.len()
    }

    /// Get total number of points across all traces
    ///
    /// This is O(1) as the value is cached and updated incrementally.
    #[inline]
    pub fn total_points(&self) -> usize {
        self.cached_stats.total_points
    }

    /// Get total planar path length across all traces in meters
    ///
    /// This is O(1) as the value is cached and updated incrementally.
    #[inline]
    pub fn total_distance(&self) -> f64 {
        self.cached_stats.total_distance
    }

    /// Get collection information
    ///
    /// This is O(1) as all values are cached.
    #[inline]
    pub fn get_info(&self) -> CollectionInfo {
        CollectionInfo {
            trace_count: self.traces.len(),
            total_points: self.cached_stats.total_points,
            total_distance_meters: self.cached_stats.total_distance,
        }
    }

    /// Get a reference to the configuration
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get a reference to a specific trace by index
    #[inline]
    pub fn get_trace(&self, index: usize) -> Option<&Trace> {
        self.traces.get(index)
    }

    /// Get all traces
    #[inline]
    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }

    /// Check if the collection is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    /// Clear all traces from the collection
    pub fn clear(&mut self) {
        self.traces.clear();
        self.cached_stats = CachedStats::default();
    }
}
