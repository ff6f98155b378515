use crate::error::ChartError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// An x-axis value. The drawdown chart plots day offsets, the anchor chart
/// calendar dates, and the snapshot scatter market caps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum XValue {
    Day(u32),
    Date(NaiveDate),
    Value(f64),
}

/// How the renderer should draw a trace. Pure metadata; the core never
/// interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    pub color: String,
    pub width: f64,
    pub dash: bool,
    pub markers: bool,
}

impl LineStyle {
    pub fn solid(color: &str) -> Self {
        Self {
            color: color.to_string(),
            width: 2.0,
            dash: false,
            markers: false,
        }
    }

    pub fn with_markers(mut self) -> Self {
        self.markers = true;
        self
    }
}

/// One named series of `(x, y)` pairs plus style metadata.
///
/// `labels`, when non-empty, carries one hover/annotation string per point
/// (used by the snapshot scatter).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceSeries {
    pub name: String,
    pub style: LineStyle,
    pub points: Vec<(XValue, f64)>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

/// An axis descriptor for the layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub title: String,
    #[serde(default)]
    pub log_scale: bool,
}

impl Axis {
    pub fn linear(title: &str) -> Self {
        Self {
            title: title.to_string(),
            log_scale: false,
        }
    }

    pub fn log(title: &str) -> Self {
        Self {
            title: title.to_string(),
            log_scale: true,
        }
    }
}

/// The complete chart artifact handed to the external renderer: traces plus
/// a layout descriptor, persisted as a self-contained JSON document.
///
/// The core generates these; the renderer just draws them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub title: String,
    pub x_axis: Axis,
    pub y_axis: Axis,
    /// Whether the renderer should draw a dashed horizontal guide at y = 0.
    pub zero_line: bool,
    pub traces: Vec<TraceSeries>,
}

impl Chart {
    /// Writes the artifact as JSON, creating parent directories as needed.
    pub fn write_json(&self, path: &Path) -> Result<(), ChartError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ChartError::Persist(format!("{}: {}", path.display(), e)))?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ChartError::Persist(format!("serialize: {}", e)))?;
        std::fs::write(path, json)
            .map_err(|e| ChartError::Persist(format!("{}: {}", path.display(), e)))?;
        tracing::info!(path = %path.display(), traces = self.traces.len(), "Chart artifact written");
        Ok(())
    }
}
