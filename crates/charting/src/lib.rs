//! # Chart Artifact Generation
//!
//! This crate turns aggregated analytics output into renderer-agnostic chart
//! artifacts: named traces with style metadata and a layout descriptor,
//! persisted as self-contained JSON documents for an external frontend to
//! draw.
//!
//! ## Architectural Principles
//!
//! - **No Rendering:** This crate never rasterizes anything. It describes
//!   charts; a frontend renders them.
//! - **Layer 1 Logic:** Depends only on `core-types` plus serialization. It
//!   has no knowledge of where the data came from.
//!
//! ## Public API
//!
//! - `Chart`, `TraceSeries`, `LineStyle`, `Axis`, `XValue`: the artifact model.
//! - `drawdown_chart`, `anchor_chart`, `snapshot_scatter`: builders for the
//!   three chart shapes the pipeline produces.
//! - `format_price`, `format_market_cap`: label formatting helpers.

// Declare the modules that constitute this crate.
pub mod builders;
pub mod chart;
pub mod error;
pub mod format;

// Re-export the key components to create a clean, public-facing API.
pub use builders::{anchor_chart, drawdown_chart, snapshot_scatter, ScatterEntry};
pub use chart::{Axis, Chart, LineStyle, TraceSeries, XValue};
pub use error::ChartError;
pub use format::{format_market_cap, format_price};
