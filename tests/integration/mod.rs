//! Integration tests for the xps-fit library
//!
//! These run the pipeline end to end on synthetic instrument exports.

// Single- and multi-component pipeline runs
pub mod pipeline;

// Energy axis recalibration and shift invariance
pub mod recalibration;

// Caller-visible failures
pub mod errors;

// Reading exports from disk and batch runs
pub mod export;
