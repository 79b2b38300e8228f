//! # fwbuild - Firmware Example Build Orchestrator
//!
//! fwbuild (`fwb`) drives CI builds for a large tree of firmware example
//! projects. It discovers every buildable (project, target, configuration)
//! combination under a set of roots, applies inclusion policy, slices the
//! result into deterministic shards for parallel CI jobs, builds its own
//! shard with keep-going failure isolation, and reports a single exit
//! status plus optional size telemetry.
//!
//! ## Pipeline
//!
//! ```text
//! discover → classify → select → shard → execute → report
//! ```
//!
//! Data flows strictly left to right; each stage is independently testable.
//! The core is single-threaded: parallelism comes from the CI system
//! launching several `fwb` processes with the same inputs and distinct
//! `--parallel-index` values.

/// Marked-unit classification (pytest harness membership).
pub mod classify;

/// Project discovery across root paths.
pub mod discover;

/// Keep-going shard execution and warning reclassification.
pub mod executor;

/// Manifest rule files (target applicability, config renames).
pub mod manifest;

/// Aggregation of outcomes into an exit status.
pub mod report;

/// Configuration-rule string parsing and expansion.
pub mod rules;

/// Inclusion policy over the discovered list.
pub mod select;

/// Deterministic slicing across parallel CI jobs.
pub mod shard;

/// Size telemetry sink (JSON lines).
pub mod size;

/// Toolchain invocation seam.
pub mod toolchain;

/// Terminal table output.
pub mod ui;

/// Build units and outcomes.
pub mod unit;
