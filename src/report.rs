//! Structured report payload - the debate's final conclusion.
//!
//! The host emits an open map of report fields. Known geospatial fields
//! are typed so the render hand-off can draw them; everything else is kept
//! in a passthrough map so a round-trip to the renderer never silently
//! drops fields.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A proposed drill hole. Only the coordinates are required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrillSite {
    /// Hole designation, e.g. "ZK-1".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub lat: f64,
    pub lng: f64,
    /// Planned depth; the host emits either a number or text like "800m".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<Value>,
    /// Why this location was chosen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// A geophysical or geochemical anomaly rendered as a heat point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyPoint {
    pub lat: f64,
    pub lng: f64,
    /// Halo radius in meters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    /// Anomaly type, e.g. "Mag" or "Grav".
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Indicator element for geochemical anomalies, e.g. "Cu".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
    /// Measured intensity or concentration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// The structured conclusion of a debate.
///
/// Every field is optional; consumers must not assume any is present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportPayload {
    /// Predicted target area as a polygon of lat/lng pairs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_area: Option<Vec<[f64; 2]>>,
    /// Recommended drill-hole deployment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drill_sites: Option<Vec<DrillSite>>,
    /// Geophysical anomalies (magnetic, gravity).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_anomalies: Option<Vec<AnomalyPoint>>,
    /// Geochemical anomalies (element concentration centers).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chem_anomalies: Option<Vec<AnomalyPoint>>,
    /// Probability/rationale fields and anything else the host emitted.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl ReportPayload {
    /// Whether the payload carries anything the map layer should draw.
    ///
    /// Presence of the field is what counts, matching the render layer's
    /// own check; an empty list still opens the map.
    pub fn has_geometry(&self) -> bool {
        self.target_area.is_some() || self.drill_sites.is_some()
    }

    /// Compact single-line summary for logs.
    pub fn summary_line(&self) -> String {
        format!(
            "target_area={} drill_sites={} geo_anomalies={} chem_anomalies={} extra_fields={}",
            self.target_area.as_ref().map_or(0, Vec::len),
            self.drill_sites.as_ref().map_or(0, Vec::len),
            self.geo_anomalies.as_ref().map_or(0, Vec::len),
            self.chem_anomalies.as_ref().map_or(0, Vec::len),
            self.extra.len(),
        )
    }
}
