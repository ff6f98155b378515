//! # Event-Relative Performance Analytics
//!
//! This crate provides the algorithmic core of the pipeline: alignment of raw
//! samples onto a daily axis, market-event detection, per-event performance
//! windowing, and cross-event averaging.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of
//!   external systems. It depends only on `core-types` (Layer 0).
//! - **Stateless Calculation:** Every component is a stateless calculator: it
//!   takes owned data in and produces a new structure out. Re-running with
//!   identical upstream data yields identical output curves.
//!
//! ## Public API
//!
//! - `SeriesAligner`: raw `(timestamp, value)` samples → daily series.
//! - `EventDetector`: aggregate series → event dates (drawdown or anchor).
//! - `PerformanceWindower`: (series, event) → rebased forward window.
//! - `CrossEventAverager`: tagged windows → per-class aggregated curves.

// Declare the modules that constitute this crate.
pub mod aligner;
pub mod averager;
pub mod detector;
pub mod error;
pub mod windower;

// Re-export the key components to create a clean, public-facing API.
pub use aligner::{aggregate_sum, covering_range, subtract, SeriesAligner};
pub use averager::CrossEventAverager;
pub use detector::EventDetector;
pub use error::AnalyticsError;
pub use windower::PerformanceWindower;
